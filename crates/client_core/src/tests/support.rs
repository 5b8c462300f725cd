//! Scripted `TutorApi` for page tests: canned responses per endpoint, every call recorded.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::SessionId,
    protocol::{
        ChatRequest, ChatResponse, CheckAnswerRequest, CheckAnswerResponse, GuidedNextRequest,
        GuidedStartRequest, GuidedStepResponse, HintRequest, HintResponse, PracticeProblem,
        QuizAnswerRequest, QuizAnswerResponse, QuizQuestion, QuizStartRequest, SessionDetail,
        SessionSummary, WelcomeRequest,
    },
};

use crate::{ApiResult, ClientError, TutorApi};

pub const CHAT: &str = "POST /api/chat";
pub const WELCOME: &str = "POST /api/chat-welcome";
pub const GUIDED_START: &str = "POST /api/chat-step/start";
pub const GUIDED_NEXT: &str = "POST /api/chat-step/next";
pub const QUIZ_START: &str = "POST /api/mc/start";
pub const QUIZ_ANSWER: &str = "POST /api/mc/answer";
pub const NEXT_PROBLEM: &str = "GET /api/practice/next";
pub const CHECK: &str = "POST /api/practice/check";
pub const HINT: &str = "POST /api/practice/hint";
pub const SESSIONS: &str = "GET /api/sessions";

pub fn session_key(method: &str, id: SessionId) -> String {
    format!("{method} /api/sessions/{id}")
}

#[derive(Default)]
pub struct FakeApi {
    canned: Mutex<HashMap<String, VecDeque<ApiResult<Value>>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, endpoint: impl Into<String>, body: Value) -> Self {
        self.push(endpoint.into(), Ok(body));
        self
    }

    pub fn fail(self, endpoint: impl Into<String>, err: ClientError) -> Self {
        self.push(endpoint.into(), Err(err));
        self
    }

    fn push(&self, endpoint: String, response: ApiResult<Value>) {
        self.canned
            .lock()
            .expect("canned lock")
            .entry(endpoint)
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == endpoint).count()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<Value> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn reply<T: DeserializeOwned>(&self, endpoint: String, body: impl Serialize) -> ApiResult<T> {
        let body = serde_json::to_value(body).unwrap_or(Value::Null);
        self.calls
            .lock()
            .expect("calls lock")
            .push((endpoint.clone(), body));

        let next = self
            .canned
            .lock()
            .expect("canned lock")
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(value)) => serde_json::from_value(value)
                .map_err(|err| ClientError::Malformed(err.to_string())),
            Some(Err(err)) => Err(err),
            None => Err(ClientError::Transport(format!("no canned response for {endpoint}"))),
        }
    }
}

pub fn offline() -> ClientError {
    ClientError::Transport("connection refused".into())
}

#[async_trait]
impl TutorApi for FakeApi {
    async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatResponse> {
        self.reply(CHAT.into(), request)
    }

    async fn chat_welcome(&self, request: &WelcomeRequest) -> ApiResult<ChatResponse> {
        self.reply(WELCOME.into(), request)
    }

    async fn guided_start(&self, request: &GuidedStartRequest) -> ApiResult<GuidedStepResponse> {
        self.reply(GUIDED_START.into(), request)
    }

    async fn guided_next(&self, request: &GuidedNextRequest) -> ApiResult<GuidedStepResponse> {
        self.reply(GUIDED_NEXT.into(), request)
    }

    async fn quiz_start(&self, request: &QuizStartRequest) -> ApiResult<QuizQuestion> {
        self.reply(QUIZ_START.into(), request)
    }

    async fn quiz_answer(&self, request: &QuizAnswerRequest) -> ApiResult<QuizAnswerResponse> {
        self.reply(QUIZ_ANSWER.into(), request)
    }

    async fn next_problem(&self, mode: &str) -> ApiResult<PracticeProblem> {
        self.reply(NEXT_PROBLEM.into(), serde_json::json!({ "mode": mode }))
    }

    async fn check_answer(&self, request: &CheckAnswerRequest) -> ApiResult<CheckAnswerResponse> {
        self.reply(CHECK.into(), request)
    }

    async fn hint(&self, request: &HintRequest) -> ApiResult<HintResponse> {
        self.reply(HINT.into(), request)
    }

    async fn list_sessions(&self) -> ApiResult<Vec<SessionSummary>> {
        self.reply(SESSIONS.into(), Value::Null)
    }

    async fn get_session(&self, id: SessionId) -> ApiResult<SessionDetail> {
        self.reply(session_key("GET", id), Value::Null)
    }

    async fn delete_session(&self, id: SessionId) -> ApiResult<()> {
        self.reply::<Value>(session_key("DELETE", id), Value::Null)
            .map(|_| ())
    }
}
