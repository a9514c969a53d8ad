use crate::ai::AnalysisContext;

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert software engineer and open source contributor. \
    Respond ONLY with the requested JSON object.";

const RESPONSE_SCHEMA: &str = r#"{
  "problemAnalysis": {
    "summary": "Brief summary of what the issue is about",
    "complexity": "easy|medium|hard",
    "estimatedTime": "1-2 hours|1-2 days|1-2 weeks|unknown",
    "keyChallenges": ["challenge1", "challenge2", "challenge3"]
  },
  "solutionApproach": {
    "steps": [
      "Step 1: Description",
      "Step 2: Description",
      "Step 3: Description"
    ],
    "technologies": ["tech1", "tech2", "tech3"],
    "filesToModify": ["file1.js", "file2.js"]
  },
  "codeExamples": {
    "snippets": [
      {
        "language": "javascript",
        "code": "// Example code snippet",
        "description": "What this code does"
      }
    ]
  },
  "prGuidelines": {
    "title": "Suggested PR title",
    "description": "Suggested PR description template",
    "checklist": [
      "Checklist item 1",
      "Checklist item 2",
      "Checklist item 3"
    ]
  },
  "resources": {
    "documentation": ["link1", "link2"],
    "examples": ["example1", "example2"],
    "relatedIssues": ["issue1", "issue2"]
  },
  "contributionTips": [
    "Tip 1 for contributing",
    "Tip 2 for contributing",
    "Tip 3 for contributing"
  ]
}"#;

pub fn build_analysis_prompt(context: &AnalysisContext) -> String {
    let issue = &context.issue;
    format!(
        r#"You are an expert software engineer and open source contributor. Analyze this GitHub issue and provide helpful suggestions for solving it.

Repository: {repository}
Language: {language}
Issue Title: {title}
Issue Body: {body}
Labels: {labels}
Comments: {comments}

Please provide a structured analysis in the following JSON format:

{schema}

Focus on practical, actionable advice. If this is a good first issue, provide extra guidance for beginners. If it's complex, break it down into manageable steps.
"#,
        repository = context.repository,
        language = context.language,
        title = issue.title,
        body = issue.body_text(),
        labels = issue.label_names().join(", "),
        comments = issue.comments,
        schema = RESPONSE_SCHEMA,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Issue, Label, Suggestions};

    fn sample_context() -> AnalysisContext {
        AnalysisContext::new(
            Issue {
                title: "Panic when config file is empty".to_string(),
                body: Some("Running with an empty config crashes.".to_string()),
                labels: vec![Label::named("bug"), Label::named("good first issue")],
                comments: 4,
            },
            "acme/widgets",
        )
        .with_language("Rust")
    }

    #[test]
    fn test_prompt_embeds_issue_context() {
        let prompt = build_analysis_prompt(&sample_context());

        assert!(prompt.contains("Repository: acme/widgets"));
        assert!(prompt.contains("Language: Rust"));
        assert!(prompt.contains("Issue Title: Panic when config file is empty"));
        assert!(prompt.contains("Issue Body: Running with an empty config crashes."));
        assert!(prompt.contains("Labels: bug, good first issue"));
        assert!(prompt.contains("Comments: 4"));
        assert!(prompt.contains("break it down into manageable steps"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let context = sample_context();
        assert_eq!(build_analysis_prompt(&context), build_analysis_prompt(&context));
    }

    #[test]
    fn test_schema_matches_suggestions_shape() {
        let schema: Suggestions = serde_json::from_str(RESPONSE_SCHEMA).unwrap();
        assert_eq!(schema.code_examples.snippets.len(), 1);
        assert_eq!(schema.solution_approach.files_to_modify.len(), 2);
        assert_eq!(schema.resources.related_issues.len(), 2);
        assert_eq!(schema.contribution_tips.len(), 3);
    }

    #[test]
    fn test_unknown_language_and_missing_body() {
        let context = AnalysisContext::new(
            Issue {
                title: "Docs typo".to_string(),
                body: None,
                labels: Vec::new(),
                comments: 0,
            },
            "acme/docs",
        );
        let prompt = build_analysis_prompt(&context);
        assert!(prompt.contains("Language: Unknown"));
        assert!(prompt.contains("Issue Body: \n"));
        assert!(prompt.contains("Labels: \n"));
    }
}
