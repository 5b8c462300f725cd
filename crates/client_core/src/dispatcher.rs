//! Action bookkeeping: which controls are disabled, and which response is still wanted.
//!
//! Every user action goes `idle -> pending -> {success, failure} -> idle`.
//! [`ActionDispatcher::begin`] refuses a second submission from a control that
//! is already pending, and stamps the request with a monotonically increasing
//! token for the region its response writes to. [`ActionDispatcher::finish`]
//! re-enables the control no matter how the request ended and reports whether
//! a newer request for the same region has superseded this one.

use std::collections::HashMap;

use shared::domain::SessionId;
use tracing::{debug, error};

use crate::error::{ActionContext, ClientError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    SendChat,
    Welcome,
    SelectTopic,
    ResumeSession,
    StartQuiz,
    AnswerQuiz,
    StartGuided,
    NextGuided,
    LoadProblems,
    CheckAnswer,
    Hint,
    ListSessions,
    DeleteSession,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::SendChat => "send_chat",
            ActionKind::Welcome => "welcome",
            ActionKind::SelectTopic => "select_topic",
            ActionKind::ResumeSession => "resume_session",
            ActionKind::StartQuiz => "start_quiz",
            ActionKind::AnswerQuiz => "answer_quiz",
            ActionKind::StartGuided => "start_guided",
            ActionKind::NextGuided => "next_guided",
            ActionKind::LoadProblems => "load_problems",
            ActionKind::CheckAnswer => "check_answer",
            ActionKind::Hint => "hint",
            ActionKind::ListSessions => "list_sessions",
            ActionKind::DeleteSession => "delete_session",
        }
    }

    pub fn context(self) -> ActionContext {
        match self {
            ActionKind::SendChat | ActionKind::SelectTopic => ActionContext::Chat,
            ActionKind::Welcome | ActionKind::ResumeSession => ActionContext::Welcome,
            ActionKind::StartQuiz | ActionKind::AnswerQuiz => ActionContext::Quiz,
            ActionKind::StartGuided | ActionKind::NextGuided => ActionContext::Guided,
            ActionKind::LoadProblems => ActionContext::LoadProblems,
            ActionKind::CheckAnswer => ActionContext::CheckAnswer,
            ActionKind::Hint => ActionContext::Hint,
            ActionKind::ListSessions => ActionContext::ListSessions,
            ActionKind::DeleteSession => ActionContext::DeleteSession,
        }
    }
}

/// The page area a response writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Conversation,
    Lecture,
    Quiz,
    Guided,
    Problems,
    Problem(usize),
    ProblemHint(usize),
    Sessions,
    Session(SessionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    Idle,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub kind: ActionKind,
    pub target: Target,
    pub token: u64,
}

#[derive(Debug, Default)]
pub struct ActionDispatcher {
    next_token: u64,
    latest: HashMap<Target, u64>,
    pending: HashMap<(ActionKind, Target), u64>,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means the triggering control is disabled because the same
    /// action is still in flight.
    pub fn begin(&mut self, kind: ActionKind, target: Target) -> Option<Ticket> {
        if self.pending.contains_key(&(kind, target)) {
            debug!(action = kind.as_str(), ?target, "ignoring duplicate submission");
            return None;
        }

        self.next_token += 1;
        let token = self.next_token;
        self.latest.insert(target, token);
        self.pending.insert((kind, target), token);
        debug!(action = kind.as_str(), ?target, token, "action pending");

        Some(Ticket {
            kind,
            target,
            token,
        })
    }

    /// Releases the control unconditionally. Returns `false` when a newer
    /// request for the same target was issued after this one.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        if self.pending.get(&(ticket.kind, ticket.target)) == Some(&ticket.token) {
            self.pending.remove(&(ticket.kind, ticket.target));
        }

        let fresh = self.latest.get(&ticket.target) == Some(&ticket.token);
        if !fresh {
            debug!(
                action = ticket.kind.as_str(),
                target = ?ticket.target,
                token = ticket.token,
                "discarding superseded response"
            );
        }
        fresh
    }

    /// Marks every response still in flight for `target` as stale and
    /// re-enables its controls without starting a new action. Returns the
    /// token now current for it.
    pub fn supersede(&mut self, target: Target) -> u64 {
        self.pending.retain(|(_, pending_target), _| *pending_target != target);
        self.next_token += 1;
        self.latest.insert(target, self.next_token);
        debug!(?target, token = self.next_token, "superseding in-flight responses");
        self.next_token
    }

    pub fn phase(&self, kind: ActionKind, target: Target) -> ActionPhase {
        if self.pending.contains_key(&(kind, target)) {
            ActionPhase::Pending
        } else {
            ActionPhase::Idle
        }
    }

    pub fn is_enabled(&self, kind: ActionKind, target: Target) -> bool {
        self.phase(kind, target) == ActionPhase::Idle
    }

    pub fn any_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Logs the technical cause and returns the apology shown to the student.
pub fn report_failure(ticket: &Ticket, err: &ClientError) -> &'static str {
    error!(
        action = ticket.kind.as_str(),
        target = ?ticket.target,
        token = ticket.token,
        error = %err,
        "action failed"
    );
    ticket.kind.context().apology()
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
