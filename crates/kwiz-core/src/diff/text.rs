//! Word-level rendering of text changes

use similar::{ChangeTag, TextDiff};

/// Render a word diff in `[-removed-]{+added+}` notation.
///
/// Used to show how a question's wording changed without dumping both
/// versions in full.
pub fn inline_text_diff(old: &str, new: &str) -> String {
    if old == new {
        return old.to_string();
    }

    let diff = TextDiff::from_words(old, new);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => out.push_str(change.value()),
            ChangeTag::Delete => {
                out.push_str("[-");
                out.push_str(change.value());
                out.push_str("-]");
            }
            ChangeTag::Insert => {
                out.push_str("{+");
                out.push_str(change.value());
                out.push_str("+}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_is_unchanged() {
        assert_eq!(inline_text_diff("same", "same"), "same");
    }

    #[test]
    fn marks_replaced_word() {
        let rendered = inline_text_diff("What is Rust", "What is Go");
        assert!(rendered.starts_with("What is "));
        assert!(rendered.contains("[-Rust-]"));
        assert!(rendered.contains("{+Go+}"));
    }
}
