//! Static suggestions used when no model is configured or its output is unusable.

use crate::types::{
    CodeExamples, Complexity, Issue, PrGuidelines, ProblemAnalysis, Resources, SolutionApproach,
    Suggestions,
};

pub const NOT_CONFIGURED_RAW_RESPONSE: &str = "Fallback response - AI backend not configured";

const NOT_CONFIGURED_SUMMARY: &str = "AI analysis is not available. Please configure the \
    GEMINI_API_KEY environment variable to enable AI-powered issue analysis.";
const UNPARSED_SUMMARY: &str = "AI analysis completed, but the response could not be \
    converted into a structured plan. See the raw response for the full text.";

const PREVIEW_CHARS: usize = 50;

const GENERIC_STEPS: &[&str] = &[
    "Read the issue description carefully",
    "Understand the problem requirements",
    "Plan your implementation approach",
    "Write and test your solution",
];

const GENERIC_CHECKLIST: &[&str] = &[
    "Code follows project style guidelines",
    "All tests pass",
    "Documentation is updated if needed",
    "Changes are properly tested",
];

const GENERIC_TIPS: &[&str] = &[
    "Read the issue description thoroughly",
    "Ask questions if anything is unclear",
    "Test your changes before submitting",
    "Follow the project's contribution guidelines",
];

/// Suggestions returned when no model credential is configured.
pub fn not_configured(issue: &Issue) -> Suggestions {
    generic(
        NOT_CONFIGURED_SUMMARY,
        "AI analysis not available",
        format!("Fix: {}", issue.title),
        "Please provide a detailed description of your changes and how they address the issue.",
    )
}

/// Suggestions for model output that no repair strategy could parse.
/// `raw` is kept verbatim in `rawResponse`.
pub fn unparsed(raw: &str) -> Suggestions {
    let preview: String = raw.chars().take(PREVIEW_CHARS).collect();
    let mut suggestions = generic(
        UNPARSED_SUMMARY,
        "Model response was not valid JSON",
        format!("Fix: {}...", preview),
        "Please provide a detailed description of your changes.",
    );
    suggestions.raw_response = Some(raw.to_string());
    suggestions
}

fn generic(summary: &str, challenge: &str, title: String, description: &str) -> Suggestions {
    Suggestions {
        problem_analysis: ProblemAnalysis {
            summary: summary.to_string(),
            complexity: Complexity::Unknown,
            estimated_time: "unknown".to_string(),
            key_challenges: vec![challenge.to_string()],
        },
        solution_approach: SolutionApproach {
            steps: to_strings(GENERIC_STEPS),
            technologies: Vec::new(),
            files_to_modify: Vec::new(),
        },
        code_examples: CodeExamples::default(),
        pr_guidelines: PrGuidelines {
            title,
            description: description.to_string(),
            checklist: to_strings(GENERIC_CHECKLIST),
        },
        resources: Resources::default(),
        contribution_tips: to_strings(GENERIC_TIPS),
        raw_response: None,
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(title: &str) -> Issue {
        Issue {
            title: title.to_string(),
            body: None,
            labels: Vec::new(),
            comments: 0,
        }
    }

    #[test]
    fn test_not_configured_uses_issue_title() {
        let suggestions = not_configured(&issue("Button misaligned on mobile"));

        assert_eq!(suggestions.pr_guidelines.title, "Fix: Button misaligned on mobile");
        assert_eq!(suggestions.problem_analysis.complexity, Complexity::Unknown);
        assert!(suggestions.problem_analysis.summary.contains("not available"));
        assert_eq!(suggestions.solution_approach.steps.len(), 4);
        assert_eq!(suggestions.pr_guidelines.checklist.len(), 4);
        assert_eq!(suggestions.contribution_tips.len(), 4);
        assert!(suggestions.code_examples.snippets.is_empty());
        assert!(suggestions.raw_response.is_none());
    }

    #[test]
    fn test_unparsed_truncates_title_by_chars() {
        let raw = "é".repeat(80);
        let suggestions = unparsed(&raw);

        let expected = format!("Fix: {}...", "é".repeat(50));
        assert_eq!(suggestions.pr_guidelines.title, expected);
        assert_eq!(suggestions.raw_response.as_deref(), Some(raw.as_str()));
    }

    #[test]
    fn test_unparsed_short_input() {
        let suggestions = unparsed("no json here at all");
        assert_eq!(suggestions.pr_guidelines.title, "Fix: no json here at all...");
        assert_eq!(suggestions.raw_response.as_deref(), Some("no json here at all"));
    }

    #[test]
    fn test_fallbacks_share_guidance() {
        let a = not_configured(&issue("x"));
        let b = unparsed("x");
        assert_eq!(a.solution_approach, b.solution_approach);
        assert_eq!(a.contribution_tips, b.contribution_tips);
        assert_eq!(a.pr_guidelines.checklist, b.pr_guidelines.checklist);
    }
}
