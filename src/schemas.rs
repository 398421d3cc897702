//! Field validation shared by the server routes and the composer.
//!
//! Every check of a field runs, so a single bad value can report several
//! problems at once. The collected messages are joined with `", "` when shown.

use thiserror::Error;

pub const USERNAME_MIN: usize = 2;
pub const USERNAME_MAX: usize = 20;
pub const CONTENT_MIN: usize = 10;
pub const CONTENT_MAX: usize = 300;
pub const PASSWORD_MIN: usize = 6;
pub const VERIFY_CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", joined(.messages))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

fn joined(messages: &[String]) -> String {
    if messages.is_empty() {
        "Invalid query parameters".to_owned()
    } else {
        messages.join(", ")
    }
}

#[derive(Default)]
struct Checks(Vec<String>);

impl Checks {
    fn require(&mut self, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.0.push(message.to_owned());
        }
        self
    }

    fn finish(&mut self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                messages: std::mem::take(&mut self.0),
            })
        }
    }
}

fn len(s: &str) -> usize {
    s.chars().count()
}

fn username_checks(checks: &mut Checks, username: Option<&str>) {
    let Some(username) = username else {
        checks.require(false, "Username is required");
        return;
    };

    checks
        .require(
            len(username) >= USERNAME_MIN,
            "Username must be at least 2 characters",
        )
        .require(
            len(username) <= USERNAME_MAX,
            "Username must be no more than 20 characters",
        )
        .require(
            !username.is_empty()
                && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
            "Username must not contain special characters",
        );
}

/// The handle format used by sign-up and the availability check.
pub fn validate_username(username: Option<&str>) -> Result<(), ValidationError> {
    let mut checks = Checks::default();
    username_checks(&mut checks, username);
    checks.finish()
}

pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    Checks::default()
        .require(
            len(content) >= CONTENT_MIN,
            "Content must be at least 10 characters",
        )
        .require(
            len(content) <= CONTENT_MAX,
            "Content must not be longer than 300 characters",
        )
        .finish()
}

pub fn validate_sign_up(username: &str, email: &str, password: &str) -> Result<(), ValidationError> {
    let mut checks = Checks::default();
    username_checks(&mut checks, Some(username));
    checks
        .require(is_email(email), "Invalid email address")
        .require(
            len(password) >= PASSWORD_MIN,
            "Password must be at least 6 characters",
        )
        .finish()
}

pub fn validate_verify_code(code: &str) -> Result<(), ValidationError> {
    Checks::default()
        .require(
            code.len() == VERIFY_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()),
            "Verification code must be 6 digits",
        )
        .finish()
}

fn is_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_handles() {
        assert!(validate_username(Some("alice")).is_ok());
        assert!(validate_username(Some("a_1")).is_ok());
        assert!(validate_username(Some("ab")).is_ok());
        assert!(validate_username(Some("abcdefghij0123456789")).is_ok());
    }

    #[test]
    fn collects_every_username_problem() {
        let err = validate_username(Some("")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Username must be at least 2 characters, Username must not contain special characters"
        );

        let err = validate_username(Some("al ice!")).unwrap_err();
        assert_eq!(err.messages, vec!["Username must not contain special characters"]);

        let err = validate_username(Some(&"x".repeat(21))).unwrap_err();
        assert_eq!(err.messages, vec!["Username must be no more than 20 characters"]);
    }

    #[test]
    fn missing_username_is_reported() {
        let err = validate_username(None).unwrap_err();
        assert_eq!(err.to_string(), "Username is required");
    }

    #[test]
    fn empty_error_list_uses_the_generic_message() {
        let err = ValidationError { messages: vec![] };
        assert_eq!(err.to_string(), "Invalid query parameters");
    }

    #[test]
    fn content_bounds() {
        assert!(validate_content("").is_err());
        assert!(validate_content("too short").is_err());
        assert!(validate_content("just right").is_ok());
        assert!(validate_content(&"y".repeat(300)).is_ok());
        assert_eq!(
            validate_content(&"y".repeat(301)).unwrap_err().to_string(),
            "Content must not be longer than 300 characters"
        );
    }

    #[test]
    fn sign_up_fields() {
        assert!(validate_sign_up("alice", "alice@example.com", "hunter2").is_ok());

        let err = validate_sign_up("a", "not-an-email", "123").unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "Username must be at least 2 characters",
                "Invalid email address",
                "Password must be at least 6 characters",
            ]
        );
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a@.co"));
        assert!(!is_email("a@b."));
        assert!(!is_email("a b@c.de"));
        assert!(!is_email("a@b@c.de"));
    }

    #[test]
    fn verify_code_is_six_digits() {
        assert!(validate_verify_code("123456").is_ok());
        assert!(validate_verify_code("12345").is_err());
        assert!(validate_verify_code("12345a").is_err());
    }
}
