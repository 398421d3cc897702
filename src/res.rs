use std::ops::Deref;

use axum::response::{Html, IntoResponse, Response};

#[macro_export]
macro_rules! include_res {
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

pub struct Markdown<T>(pub T);

impl<T> IntoResponse for Markdown<T>
where
    T: Deref<Target = str>
{
    fn into_response(self) -> Response {
        use pulldown_cmark::{Parser, Options};

        let parser = Parser::new_ext(&self.0, Options::ENABLE_TABLES);

        let mut body = String::new();
        pulldown_cmark::html::push_html(&mut body, parser);
        Html(
            include_res!(str, "/pages/layout.html")
                .replace("{title}", "hushnote")
                .replace("{body}", &body)
        ).into_response()
    }
}

/// Escapes text for use inside HTML element content and quoted attributes.
/// Braces are escaped too, so the result can never form a template
/// placeholder.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encodes a query parameter value.
pub fn encode_query(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(b as char)
            }
            b' ' => encoded.push('+'),
            b => encoded.push_str(&format!("%{b:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<b>"hi" & 'bye'</b>"#), "&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;");
    }

    #[test]
    fn escaped_text_cannot_name_a_placeholder() {
        let filled = "<p>{content}</p>{username}"
            .replace("{content}", &escape("Hi {username}"))
            .replace("{username}", "alice");
        assert_eq!(filled, "<p>Hi &#123;username&#125;</p>alice");
    }

    #[test]
    fn encodes_queries() {
        assert_eq!(encode_query("What's up?"), "What%27s+up%3F");
        assert_eq!(encode_query("a_b-c.d~"), "a_b-c.d~");
    }
}
