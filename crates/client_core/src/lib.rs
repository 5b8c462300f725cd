use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::SessionId,
    protocol::{
        ChatRequest, ChatResponse, CheckAnswerRequest, CheckAnswerResponse, GuidedNextRequest,
        GuidedStartRequest, GuidedStepResponse, HintRequest, HintResponse, PracticeProblem,
        QuizAnswerRequest, QuizAnswerResponse, QuizQuestion, QuizStartRequest, SessionDetail,
        SessionSummary, WelcomeRequest,
    },
};
use tracing::{debug, warn};

pub mod dispatcher;
pub mod error;
pub mod learn_page;
pub mod practice_page;
pub mod sessions_page;
pub mod state;
pub mod view;

pub use dispatcher::{ActionDispatcher, ActionKind, ActionPhase, Ticket};
pub use error::{ActionContext, ClientError};
pub use learn_page::LearnPage;
pub use practice_page::PracticePage;
pub use sessions_page::{Prompter, SessionsPage};
pub use state::{
    FilePreferences, Location, MemoryLocation, MemoryPreferences, PreferenceStore,
    SelectionState, SessionController, ThemeController,
};

pub type ApiResult<T> = std::result::Result<T, ClientError>;

/// One method per backend endpoint. Each call is exactly one HTTP round trip.
#[async_trait]
pub trait TutorApi: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatResponse>;
    async fn chat_welcome(&self, request: &WelcomeRequest) -> ApiResult<ChatResponse>;
    async fn guided_start(&self, request: &GuidedStartRequest) -> ApiResult<GuidedStepResponse>;
    async fn guided_next(&self, request: &GuidedNextRequest) -> ApiResult<GuidedStepResponse>;
    async fn quiz_start(&self, request: &QuizStartRequest) -> ApiResult<QuizQuestion>;
    async fn quiz_answer(&self, request: &QuizAnswerRequest) -> ApiResult<QuizAnswerResponse>;
    async fn next_problem(&self, mode: &str) -> ApiResult<PracticeProblem>;
    async fn check_answer(&self, request: &CheckAnswerRequest) -> ApiResult<CheckAnswerResponse>;
    async fn hint(&self, request: &HintRequest) -> ApiResult<HintResponse>;
    async fn list_sessions(&self) -> ApiResult<Vec<SessionSummary>>;
    async fn get_session(&self, id: SessionId) -> ApiResult<SessionDetail>;
    async fn delete_session(&self, id: SessionId) -> ApiResult<()>;
}

pub struct HttpTutorClient {
    http: Client,
    server_url: String,
}

impl HttpTutorClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { http, server_url }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> ApiResult<reqwest::Response> {
        debug!(path, "sending backend request");
        let res = request.send().await.map_err(|err| {
            warn!(path, error = %err, "backend request failed before a response");
            ClientError::from(err)
        })?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        warn!(path, status = status.as_u16(), "backend returned non-success status");
        Err(ClientError::status(status.as_u16(), &body))
    }

    async fn decode<R: DeserializeOwned>(path: &str, res: reqwest::Response) -> ApiResult<R> {
        let bytes = res.bytes().await.map_err(ClientError::from)?;
        serde_json::from_slice(&bytes).map_err(|err| {
            warn!(path, error = %err, "backend payload did not decode");
            ClientError::Malformed(format!("{path}: {err}"))
        })
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let res = self
            .send(path, self.http.post(self.endpoint(path)).json(body))
            .await?;
        Self::decode(path, res).await
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> ApiResult<R> {
        let res = self.send(path, self.http.get(self.endpoint(path))).await?;
        Self::decode(path, res).await
    }
}

#[async_trait]
impl TutorApi for HttpTutorClient {
    async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatResponse> {
        self.post_json("/api/chat", request).await
    }

    async fn chat_welcome(&self, request: &WelcomeRequest) -> ApiResult<ChatResponse> {
        self.post_json("/api/chat-welcome", request).await
    }

    async fn guided_start(&self, request: &GuidedStartRequest) -> ApiResult<GuidedStepResponse> {
        self.post_json("/api/chat-step/start", request).await
    }

    async fn guided_next(&self, request: &GuidedNextRequest) -> ApiResult<GuidedStepResponse> {
        self.post_json("/api/chat-step/next", request).await
    }

    async fn quiz_start(&self, request: &QuizStartRequest) -> ApiResult<QuizQuestion> {
        self.post_json("/api/mc/start", request).await
    }

    async fn quiz_answer(&self, request: &QuizAnswerRequest) -> ApiResult<QuizAnswerResponse> {
        self.post_json("/api/mc/answer", request).await
    }

    async fn next_problem(&self, mode: &str) -> ApiResult<PracticeProblem> {
        let path = "/api/practice/next";
        let res = self
            .send(
                path,
                self.http.get(self.endpoint(path)).query(&[("mode", mode)]),
            )
            .await?;
        Self::decode(path, res).await
    }

    async fn check_answer(&self, request: &CheckAnswerRequest) -> ApiResult<CheckAnswerResponse> {
        self.post_json("/api/practice/check", request).await
    }

    async fn hint(&self, request: &HintRequest) -> ApiResult<HintResponse> {
        self.post_json("/api/practice/hint", request).await
    }

    async fn list_sessions(&self) -> ApiResult<Vec<SessionSummary>> {
        self.get_json("/api/sessions").await
    }

    async fn get_session(&self, id: SessionId) -> ApiResult<SessionDetail> {
        self.get_json(&format!("/api/sessions/{id}")).await
    }

    async fn delete_session(&self, id: SessionId) -> ApiResult<()> {
        let path = format!("/api/sessions/{id}");
        self.send(&path, self.http.delete(self.endpoint(&path))).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
