//! Heuristic issue difficulty from labels and discussion size.

use crate::types::{Difficulty, Label};

const BEGINNER_LABELS: &[&str] = &[
    "good first issue",
    "beginner",
    "first-timers-only",
    "easy",
    "help wanted",
];
const EXPERT_LABELS: &[&str] = &["hard", "complex", "advanced", "expert", "difficult"];
const WORK_TYPE_LABELS: &[&str] = &["bug", "enhancement", "feature", "improvement"];
const HIGH_PRIORITY_LABELS: &[&str] = &["priority: high", "priority: critical", "urgent"];
const LOW_PRIORITY_LABELS: &[&str] = &["priority: low", "nice to have"];

/// Label rules in priority order; the first group with a hit decides.
const LABEL_RULES: &[(&[&str], Difficulty)] = &[
    (BEGINNER_LABELS, Difficulty::Easy),
    (EXPERT_LABELS, Difficulty::Hard),
    (WORK_TYPE_LABELS, Difficulty::Medium),
    (HIGH_PRIORITY_LABELS, Difficulty::Hard),
    (LOW_PRIORITY_LABELS, Difficulty::Easy),
];

const HARD_COMMENT_THRESHOLD: u32 = 15;
const MEDIUM_COMMENT_THRESHOLD: u32 = 5;
const MANY_LABELS_THRESHOLD: usize = 5;

pub fn classify<S: AsRef<str>>(label_names: &[S], comments: u32) -> Difficulty {
    let lowered: Vec<String> = label_names
        .iter()
        .map(|name| name.as_ref().to_lowercase())
        .collect();

    for (group, difficulty) in LABEL_RULES {
        if lowered.iter().any(|name| group.contains(&name.as_str())) {
            return *difficulty;
        }
    }

    if comments > HARD_COMMENT_THRESHOLD {
        Difficulty::Hard
    } else if comments > MEDIUM_COMMENT_THRESHOLD {
        Difficulty::Medium
    } else if label_names.len() > MANY_LABELS_THRESHOLD {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

pub fn classify_labels(labels: &[Label], comments: u32) -> Difficulty {
    let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
    classify(&names, comments)
}
