//! RepoVibe API: GitHub issue discovery with difficulty heuristics and
//! AI-generated solution plans.

pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod favorites;
pub mod github;
pub mod llm;
pub mod orchestrator;
pub mod types;
