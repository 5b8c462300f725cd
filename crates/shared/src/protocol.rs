//! JSON bodies exchanged with the LearnBot backend. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::domain::{GradeLevel, Role, SessionId};

pub const DEFAULT_PRACTICE_MODE: &str = "add20";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub grade_level: GradeLevel,
    pub topic: String,
    pub session_id: Option<SessionId>,
    pub step_by_step: bool,
    pub persona: String,
    pub mini_lecture: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeRequest {
    pub grade_level: GradeLevel,
    pub topic: String,
    pub step_by_step: bool,
    pub persona: String,
}

/// Shared by `/api/chat` and `/api/chat-welcome`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidedStartRequest {
    pub topic: String,
    pub grade: GradeLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedNextRequest {
    pub session_id: SessionId,
    pub user_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedStepResponse {
    #[serde(default)]
    pub bot_message: Option<String>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStartRequest {
    pub topic: String,
    pub grade_level: GradeLevel,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswerRequest {
    pub session_id: SessionId,
    pub user_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswerResponse {
    pub correct: bool,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub next: Option<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeProblem {
    pub question: String,
    #[serde(default)]
    pub correct_answer: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerRequest {
    pub question: String,
    pub user_answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeStats {
    #[serde(default)]
    pub total_answered: u32,
    #[serde(default)]
    pub total_correct: u32,
    #[serde(default)]
    pub best_streak: u32,
}

impl PracticeStats {
    /// Whole-percent accuracy, `None` until something has been answered.
    pub fn accuracy_percent(&self) -> Option<u32> {
        if self.total_answered == 0 {
            return None;
        }
        let ratio = f64::from(self.total_correct) / f64::from(self.total_answered);
        Some((ratio * 100.0).round() as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerResponse {
    pub correct: bool,
    #[serde(default)]
    pub correct_answer: Option<serde_json::Value>,
    #[serde(default)]
    pub stats: Option<PracticeStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintRequest {
    pub problem: String,
    pub user_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    #[serde(default)]
    pub hint_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    #[serde(alias = "text")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Turn {
    pub fn role(&self) -> Role {
        Role::from_wire(&self.role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub id: SessionId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub turns: Vec<Turn>,
    #[serde(default)]
    pub messages: Vec<Turn>,
}

impl SessionDetail {
    /// Pages send either `turns` or `messages`; `turns` wins when both are filled.
    pub fn transcript(&self) -> &[Turn] {
        if !self.turns.is_empty() {
            &self.turns
        } else {
            &self.messages
        }
    }
}

/// Renders an answer value the backend sent as either a number or a string.
pub fn answer_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
