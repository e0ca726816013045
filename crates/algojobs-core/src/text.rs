//! Markdown flattening for free-text inputs.
//!
//! Job descriptions usually arrive as markdown authored in an editor. The
//! markup carries no meaning for the embedding model, so it is stripped while
//! the visible text is kept.

use std::sync::LazyLock;

use regex::Regex;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).expect("markdown pattern is valid"),
        replacement,
    }
}

// Order matters: list bullets go before emphasis, images before links.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"```[A-Za-z0-9_+-]*", ""),
        rule(r"(?m)^[ \t]*#{1,6}[ \t]*", ""),
        rule(r"(?m)^[ \t]*[-*+][ \t]+", ""),
        rule(r"!\[([^\]]*)\]\([^)]*\)", "${1}"),
        rule(r"\[([^\]]*)\]\([^)]*\)", "${1}"),
        rule(r"\*\*(.+?)\*\*", "${1}"),
        rule(r"__(.+?)__", "${1}"),
        rule(r"\*([^*\n]+)\*", "${1}"),
        rule(r"~~(.+?)~~", "${1}"),
        rule(r"`([^`]+)`", "${1}"),
    ]
});

/// Removes markdown markup, keeping the readable text.
pub fn strip_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    RULES.iter().fold(text.to_string(), |acc, r| {
        r.pattern.replace_all(&acc, r.replacement).into_owned()
    })
}
