//! Instruction prompts for screenshot-to-code generation.
//!
//! Every prompt lives here so the wording can be changed in one place and
//! inspected in unit tests without calling a provider. [`build_prompt`] is a
//! pure function of the selected [`Framework`].

use crate::config::Framework;

/// Requirements shared by every framework.
const COMMON_REQUIREMENTS: &[&str] = &[
    "Clean and readable code",
    "Semantic HTML structure",
    "Responsive layout",
    "Match colors, spacing, and typography as closely as possible",
    "Include all visible elements and text",
];

/// Closing instruction. Models still add fences now and then; those are
/// removed by [`crate::pipeline::postprocess::strip_code_fences`].
const OUTPUT_INSTRUCTION: &str =
    "Return ONLY the code without any explanation or markdown formatting.";

/// Human-readable label for the target framework.
pub fn framework_label(framework: Framework) -> &'static str {
    match framework {
        Framework::Html => "HTML + CSS",
        Framework::Tailwind => "HTML with Tailwind CSS",
        Framework::React => "React component with Tailwind CSS",
    }
}

/// Requirements that only apply to one framework.
fn framework_clauses(framework: Framework) -> &'static [&'static str] {
    match framework {
        Framework::Html => &["Include CSS in a <style> tag"],
        Framework::Tailwind => &[
            "Use Tailwind utility classes",
            "Load Tailwind from the CDN script tag",
        ],
        Framework::React => &[
            "Functional React component with hooks only where state is needed",
            "Style with Tailwind classes in className",
            "Export the component as the default export",
        ],
    }
}

/// Build the instruction sent alongside the screenshot.
///
/// Deterministic: the same framework always yields the same text.
pub fn build_prompt(framework: Framework) -> String {
    let mut prompt = format!(
        "Analyze this UI screenshot and generate {} code that recreates the UI.\n\nRequirements:\n",
        framework_label(framework)
    );
    for line in COMMON_REQUIREMENTS
        .iter()
        .chain(framework_clauses(framework).iter())
    {
        prompt.push_str("- ");
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push('\n');
    prompt.push_str(OUTPUT_INSTRUCTION);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_deterministic() {
        for fw in Framework::ALL {
            assert_eq!(build_prompt(fw), build_prompt(fw));
        }
    }

    #[test]
    fn html_prompt_uses_plain_label() {
        let p = build_prompt(Framework::Html);
        assert!(p.contains("HTML + CSS"));
        assert!(p.contains("<style> tag"));
        assert!(!p.contains("utility classes"));
    }

    #[test]
    fn utility_clause_only_for_tailwind_markup() {
        let p = build_prompt(Framework::Tailwind);
        assert!(p.contains("HTML with Tailwind CSS"));
        assert!(p.contains("- Use Tailwind utility classes\n"));
        assert!(!build_prompt(Framework::Html).contains("Use Tailwind utility classes"));
        assert!(!build_prompt(Framework::React).contains("Use Tailwind utility classes"));
    }

    #[test]
    fn react_prompt_asks_for_component() {
        let p = build_prompt(Framework::React);
        assert!(p.contains("React component"));
        assert!(p.contains("Functional React component"));
        assert!(p.contains("- Style with Tailwind classes in className\n"));
    }

    #[test]
    fn every_prompt_ends_with_output_instruction() {
        for fw in Framework::ALL {
            assert!(build_prompt(fw).ends_with(OUTPUT_INSTRUCTION));
        }
    }
}
