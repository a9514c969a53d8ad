//! Model response normalization
//!
//! Turns free-text model output into [`Suggestions`] without ever failing.
//! Strategies run in order and the first successful parse wins:
//! - strict parse of the outermost `{ ... }` span
//! - regex repair (comments, trailing commas, bare keys) then parse
//! - drop comment-looking lines then parse
//! - static fallback carrying the raw text
//!
//! Every parsed object goes through [`coerce`] so missing or mistyped fields
//! come back as defaults instead of errors.

use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ai::fallback;
use crate::types::{
    CodeExamples, CodeSnippet, Complexity, PrGuidelines, ProblemAnalysis, Resources,
    SolutionApproach, Suggestions,
};

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```json\s*").unwrap());
static BARE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```\s*").unwrap());
static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)//.*$").unwrap());
static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());
static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([{,]\s*)(\w+):").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Strict,
    Repaired,
    LineFiltered,
    Fallback,
}

impl ParseStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseStrategy::Strict => "strict",
            ParseStrategy::Repaired => "repaired",
            ParseStrategy::LineFiltered => "line_filtered",
            ParseStrategy::Fallback => "fallback",
        }
    }
}

pub fn normalize(raw: &str) -> Suggestions {
    normalize_with_strategy(raw).0
}

/// Same as [`normalize`], also reporting which strategy produced the value.
pub fn normalize_with_strategy(raw: &str) -> (Suggestions, ParseStrategy) {
    match panic::catch_unwind(AssertUnwindSafe(|| run_strategies(raw))) {
        Ok(result) => result,
        Err(payload) => {
            let detail = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            warn!("Response normalization panicked, using fallback: {}", detail);
            (fallback::unparsed(raw), ParseStrategy::Fallback)
        }
    }
}

fn run_strategies(raw: &str) -> (Suggestions, ParseStrategy) {
    let cleaned = strip_code_fences(raw.trim());

    let Some(candidate) = isolate_object(&cleaned) else {
        debug!("No JSON object boundaries in model response");
        return (fallback::unparsed(raw), ParseStrategy::Fallback);
    };

    if let Some(value) = parse(candidate) {
        return (coerce(&value), ParseStrategy::Strict);
    }

    debug!("Strict parse failed, attempting regex repair");
    if let Some(value) = parse(&repair(candidate)) {
        return (coerce(&value), ParseStrategy::Repaired);
    }

    debug!("Repaired parse failed, dropping comment lines");
    if let Some(value) = parse(&drop_comment_lines(candidate)) {
        return (coerce(&value), ParseStrategy::LineFiltered);
    }

    warn!(
        "Model response could not be parsed ({} chars), using fallback",
        raw.len()
    );
    (fallback::unparsed(raw), ParseStrategy::Fallback)
}

fn parse(s: &str) -> Option<Value> {
    serde_json::from_str::<Value>(s).ok()
}

pub fn strip_code_fences(text: &str) -> String {
    let without_json = JSON_FENCE.replace_all(text, "");
    BARE_FENCE.replace_all(&without_json, "").into_owned()
}

/// Span from the first `{` to the last `}`, if they are in that order.
pub fn isolate_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Textual repairs applied in order. The bare-key rewrite can also touch
/// string values that contain `, word:`; a corrupted result simply fails to
/// parse and the next strategy runs.
pub fn repair(json: &str) -> String {
    let s = LINE_COMMENT.replace_all(json, "");
    let s = BLOCK_COMMENT.replace_all(&s, "");
    let s = TRAILING_COMMA.replace_all(&s, "${1}");
    let s = BARE_KEY.replace_all(&s, "${1}\"${2}\":");
    s.trim().to_string()
}

pub fn drop_comment_lines(json: &str) -> String {
    json.lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty()
                && !trimmed.starts_with("//")
                && !trimmed.starts_with("/*")
                && !trimmed.starts_with('*')
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build fully populated [`Suggestions`] from any parsed JSON value.
pub fn coerce(value: &Value) -> Suggestions {
    let analysis = value.get("problemAnalysis");
    let approach = value.get("solutionApproach");
    let examples = value.get("codeExamples");
    let guidelines = value.get("prGuidelines");
    let resources = value.get("resources");

    Suggestions {
        problem_analysis: ProblemAnalysis {
            summary: text_at(analysis, "summary"),
            complexity: Complexity::parse(&text_at(analysis, "complexity")),
            estimated_time: text_at(analysis, "estimatedTime"),
            key_challenges: list_at(analysis, "keyChallenges"),
        },
        solution_approach: SolutionApproach {
            steps: list_at(approach, "steps"),
            technologies: list_at(approach, "technologies"),
            files_to_modify: list_at(approach, "filesToModify"),
        },
        code_examples: CodeExamples {
            snippets: snippets_at(examples),
        },
        pr_guidelines: PrGuidelines {
            title: text_at(guidelines, "title"),
            description: text_at(guidelines, "description"),
            checklist: list_at(guidelines, "checklist"),
        },
        resources: Resources {
            documentation: list_at(resources, "documentation"),
            examples: list_at(resources, "examples"),
            related_issues: list_at(resources, "relatedIssues"),
        },
        contribution_tips: list_at(Some(value), "contributionTips"),
        raw_response: None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_at(parent: Option<&Value>, key: &str) -> String {
    parent
        .and_then(|p| p.get(key))
        .and_then(scalar_text)
        .unwrap_or_default()
}

fn list_at(parent: Option<&Value>, key: &str) -> Vec<String> {
    match parent.and_then(|p| p.get(key)) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn snippets_at(examples: Option<&Value>) -> Vec<CodeSnippet> {
    let Some(Value::Array(items)) = examples.and_then(|e| e.get("snippets")) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| CodeSnippet {
            language: text_at(Some(item), "language"),
            code: text_at(Some(item), "code"),
            description: text_at(Some(item), "description"),
        })
        .collect()
}
