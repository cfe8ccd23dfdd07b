// src/services/normalize.rs

//! Item normalizer.
//!
//! Strips markup from free-text fields and builds the display author string.

use scraper::Html;

/// Elements whose whole content is dropped, not just their tags.
const OPAQUE_ELEMENTS: [&str; 10] = [
    "script", "style", "title", "iframe", "noscript", "noembed", "noframes", "frame", "frameset",
    "object",
];

/// Remove all markup from `text`, keeping only its text content.
///
/// Nothing is allowed through: tags and comments are dropped, everything
/// inside an opaque element (`script`, `iframe`, ...) is discarded, and the
/// remaining text is re-escaped so
/// that no markup-significant character survives unescaped. The function is
/// idempotent.
pub fn sanitize(text: &str) -> String {
    let fragment = Html::parse_fragment(text);
    let mut plain = String::with_capacity(text.len());

    for node in fragment.root_element().descendants() {
        let Some(fragment_text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| OPAQUE_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            plain.push_str(&fragment_text.text);
        }
    }

    escape(&plain)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Remove CDATA wrappers, wherever they appear in the line.
pub fn strip_cdata(text: &str) -> String {
    text.replace("<![CDATA[", "").replace("]]>", "")
}

/// Join author names for display.
///
/// `[]` gives `""`, `[A]` gives `"A"`, `[A, B]` gives `"A, and B"` and
/// `[A, B, C]` gives `"A, B, and C"`.
pub fn join_authors<S: AsRef<str>>(authors: &[S]) -> String {
    match authors {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head = init
                .iter()
                .map(|name| name.as_ref())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}, and {}", head, last.as_ref())
        }
    }
}
