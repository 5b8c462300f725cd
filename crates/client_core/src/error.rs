use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Everything a round trip to the backend can fail with.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("HTTP {status}: {}", .body.message)]
    Status { status: u16, body: ApiError },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    pub fn status(status: u16, raw_body: &str) -> Self {
        ClientError::Status {
            status,
            body: ApiError::from_response_body(status, raw_body),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Status { body, .. } => body.code,
            ClientError::Transport(_) | ClientError::Malformed(_) => ErrorCode::Internal,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ClientError::status(status.as_u16(), "")
        } else if err.is_decode() {
            ClientError::Malformed(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// The user-facing context an action failed in. Each context has exactly one
/// apology; the technical cause is only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionContext {
    Chat,
    Welcome,
    Quiz,
    Guided,
    LoadProblems,
    CheckAnswer,
    Hint,
    ListSessions,
    DeleteSession,
}

impl ActionContext {
    pub fn apology(self) -> &'static str {
        match self {
            ActionContext::Chat => "Oops, I had trouble answering. Please try again.",
            ActionContext::Welcome => {
                "Hi! I'm LearnBot. Ask me any math question to get started!"
            }
            ActionContext::Quiz => "Oops, the quiz got stuck. Please try again.",
            ActionContext::Guided => "Oops, I lost my place in the lesson. Please try again.",
            ActionContext::LoadProblems => {
                "Oops, I couldn't load your problems. Please try again."
            }
            ActionContext::CheckAnswer => "Something went wrong. Please try again.",
            ActionContext::Hint => "I couldn't get a hint right now. Please try again.",
            ActionContext::ListSessions => {
                "Sorry, I couldn't load your sessions. Please try again later."
            }
            ActionContext::DeleteSession => {
                "Sorry, I couldn't delete that session. Please try again."
            }
        }
    }
}
