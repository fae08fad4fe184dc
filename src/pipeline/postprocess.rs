//! Post-processing: deterministic cleanup of model-generated code.
//!
//! The prompt asks for bare code, but Gemini and Claude still wrap their
//! answer in a ```` ```html ```` … ```` ``` ```` block a good share of the
//! time. The rules here undo that without touching the code itself:
//!
//! 1. Strip one outer fence pair and the whitespace around it
//! 2. Drop a leading byte-order mark
//!
//! Text without an outer fence pair passes through unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to raw model output.
pub fn clean_code(input: &str) -> String {
    let s = strip_code_fences(input);
    strip_leading_bom(&s).to_string()
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

/// An opening fence with an optional info string (`html`, `jsx`, `tsx`, …),
/// the body, and a closing fence at the very end.
static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A```[A-Za-z0-9_+.#-]*[ \t]*\r?\n(.*?)\r?\n?```\z").unwrap()
});

/// Remove a single leading/trailing fence pair and surrounding whitespace.
///
/// Text that is not wrapped in a fence pair is returned as is. Inside a
/// fenced block only the line break after the opening fence and the one
/// before the closing fence are dropped.
pub fn strip_code_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Drop leading BOM ─────────────────────────────────────────────────

fn strip_leading_bom(input: &str) -> &str {
    input.strip_prefix('\u{FEFF}').unwrap_or(input)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_with_lang() {
        let input = "```html\n<div>\n  <p>Hi</p>\n</div>\n```";
        assert_eq!(strip_code_fences(input), "<div>\n  <p>Hi</p>\n</div>");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\nconst x = 1;\n```";
        assert_eq!(strip_code_fences(input), "const x = 1;");
    }

    #[test]
    fn test_strip_fences_surrounding_whitespace() {
        let input = "\n\n  ```jsx\nexport default function App() {}\n```  \n";
        assert_eq!(strip_code_fences(input), "export default function App() {}");
    }

    #[test]
    fn test_strip_fences_crlf() {
        let input = "```html\r\n<p>x</p>\r\n```";
        assert_eq!(strip_code_fences(input), "<p>x</p>");
    }

    #[test]
    fn test_no_fences_passthrough() {
        let input = "<!DOCTYPE html>\n<html></html>";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_clean_input_returned_unchanged() {
        let inputs = [
            "<div>\n  <p>x</p>\n</div>\n",
            "<div></div>",
            "  padded  ",
            "\n\n<main></main>\n\n",
            "",
        ];
        for input in inputs {
            assert_eq!(strip_code_fences(input), input, "input: {input:?}");
        }
    }

    #[test]
    fn test_fenced_first_line_keeps_indentation() {
        let input = "```html\n    <div>x</div>\n```";
        assert_eq!(strip_code_fences(input), "    <div>x</div>");
    }

    #[test]
    fn test_fenced_trailing_blank_lines_kept() {
        let input = "```\nconst x = 1;\n\n\n```";
        assert_eq!(strip_code_fences(input), "const x = 1;\n\n");
    }

    #[test]
    fn test_empty_fence_pair() {
        assert_eq!(strip_code_fences("```\n\n```"), "");
        assert_eq!(strip_code_fences("```\n```"), "");
    }

    #[test]
    fn test_interior_preserved_byte_for_byte() {
        let interior = "<style>\n  .a { color: #fff; }\t\n</style>\n\n<div class=\"a\">é ✓</div>";
        let wrapped = format!("```html\n{interior}\n```");
        assert_eq!(strip_code_fences(&wrapped), interior);
    }

    #[test]
    fn test_inner_fence_kept_when_not_outer_pair() {
        // A fence in the middle of otherwise clean text is not an outer pair.
        let input = "const md = `\n```js\nx\n```\n`;\nexport default md;";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_unclosed_fence_untouched() {
        let input = "```html\n<div></div>";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_clean_code_drops_bom() {
        assert_eq!(clean_code("\u{FEFF}<p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn test_clean_code_full_pipeline() {
        let input = "```tsx\nimport React from 'react';\n\nexport default function C() {\n  return <div />;\n}\n```\n";
        let out = clean_code(input);
        assert!(out.starts_with("import React"));
        assert!(out.ends_with('}'));
        assert_eq!(clean_code(&out), out);
    }
}
