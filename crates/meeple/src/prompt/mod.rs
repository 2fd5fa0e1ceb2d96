//! Task templates.
//!
//! Each [`Task`] has one fixed template producing a [`Prompt`]: a system
//! instruction plus the user turn. Session history is inserted between the
//! two by the generation backend.

mod builder;
pub mod templates;

pub use builder::SystemPromptBuilder;

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three supported tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Recommend,
    RuleQuestion,
    Summary,
}

impl Task {
    /// Korean label used in user-facing error messages.
    pub fn label(self) -> &'static str {
        match self {
            Task::Recommend => "게임 추천",
            Task::RuleQuestion => "룰 질문 답변",
            Task::Summary => "룰 요약",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Task::Recommend => "recommend",
            Task::RuleQuestion => "rule_question",
            Task::Summary => "summary",
        };
        f.write_str(s)
    }
}

/// A rendered template, ready for a [`Generator`](crate::generation::Generator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub task: Task,
    pub system: String,
    pub user: String,
}
