//! Learn page chat: welcome, resume, free-form questions and mini-lectures.

use shared::{
    domain::{GradeLevel, Persona, Role, SessionId},
    protocol::{ChatRequest, ChatResponse, WelcomeRequest},
    topics::{topics_for_grade, DEFAULT_TOPIC, WELCOME_TOPIC},
};
use tracing::{info, warn};

use crate::{
    dispatcher::{report_failure, ActionDispatcher, ActionKind, Target, Ticket},
    error::ClientError,
    state::{Location, MemoryLocation, MemoryPreferences, PreferenceStore, SessionController},
    view::{bubble, pending_bubble, render_transcript, set_bubble_text, Region},
    ApiResult, TutorApi,
};

pub const THINKING_TEXT: &str = "Let me think about that...";
pub const LOADING_TEXT: &str = "Loading LearnBot...";
pub const LECTURE_PENDING_TEXT: &str = "Getting a mini-lesson ready...";

#[derive(Debug, Clone)]
enum ChatCall {
    Chat(ChatRequest),
    Welcome(WelcomeRequest),
}

/// A chat-region request that has been shown as pending but not yet sent.
/// The page is not borrowed while it is on the wire.
#[derive(Debug, Clone)]
pub struct ChatDispatch {
    ticket: Ticket,
    pending_id: String,
    call: ChatCall,
}

impl ChatDispatch {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub async fn execute(&self, api: &dyn TutorApi) -> ApiResult<ChatResponse> {
        match &self.call {
            ChatCall::Chat(request) => api.chat(request).await,
            ChatCall::Welcome(request) => api.chat_welcome(request).await,
        }
    }
}

pub struct LearnPage<L: Location = MemoryLocation, P: PreferenceStore = MemoryPreferences> {
    controller: SessionController<L, P>,
    dispatcher: ActionDispatcher,
    chat: Region,
    /// Token of the newest response that has assigned the session id.
    session_token: u64,
}

impl<L: Location, P: PreferenceStore> LearnPage<L, P> {
    pub fn new(controller: SessionController<L, P>) -> Self {
        Self {
            controller,
            dispatcher: ActionDispatcher::new(),
            chat: Region::default(),
            session_token: 0,
        }
    }

    pub fn chat(&self) -> &Region {
        &self.chat
    }

    pub fn controller(&self) -> &SessionController<L, P> {
        &self.controller
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn topics(&self) -> &'static [&'static str] {
        topics_for_grade(self.controller.state().grade_level)
    }

    /// Page load: replay the session named in the URL, or greet and start a new one.
    pub async fn open(&mut self, api: &dyn TutorApi) {
        match self.controller.session_id() {
            Some(session_id) => self.resume(api, session_id).await,
            None => self.welcome(api).await,
        }
    }

    pub async fn resume(&mut self, api: &dyn TutorApi, session_id: SessionId) {
        let Some(ticket) = self
            .dispatcher
            .begin(ActionKind::ResumeSession, Target::Conversation)
        else {
            return;
        };
        let pending_id = format!("pending-{}", ticket.token);
        self.chat.append(pending_bubble(pending_id.clone(), LOADING_TEXT));

        let result = api.get_session(session_id).await;
        if !self.dispatcher.finish(ticket) {
            self.chat.remove(&pending_id);
            return;
        }

        match result {
            Ok(detail) => {
                self.controller.set_session_id(Some(detail.id));
                self.session_token = self.session_token.max(ticket.token);
                if self.controller.state().topic.is_none() {
                    self.controller.set_topic(detail.topic.clone());
                }

                let turns = detail.transcript();
                if turns.is_empty() {
                    self.chat.clear();
                    self.welcome(api).await;
                    return;
                }
                info!(session_id = %detail.id, turns = turns.len(), "resumed session");
                self.chat.replace(render_transcript(turns));
                self.chat.scroll_to_end = true;
            }
            Err(err) => {
                report_failure(&ticket, &err);
                self.chat.remove(&pending_id);
                self.welcome(api).await;
            }
        }
    }

    pub fn begin_welcome(&mut self) -> Option<ChatDispatch> {
        let ticket = self
            .dispatcher
            .begin(ActionKind::Welcome, Target::Conversation)?;
        let state = self.controller.state();
        let request = WelcomeRequest {
            grade_level: state.grade_level,
            topic: state
                .topic
                .clone()
                .unwrap_or_else(|| WELCOME_TOPIC.to_string()),
            step_by_step: state.step_mode,
            persona: state.persona.to_string(),
        };
        Some(self.stage(ticket, LOADING_TEXT, ChatCall::Welcome(request)))
    }

    /// `None` for blank input or while the previous message is still pending;
    /// nothing is appended in either case.
    pub fn begin_send(&mut self, text: &str) -> Option<ChatDispatch> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let ticket = self
            .dispatcher
            .begin(ActionKind::SendChat, Target::Conversation)?;
        self.chat.append(bubble(Role::User, text));
        let request = self.chat_request(text.to_string(), false);
        Some(self.stage(ticket, THINKING_TEXT, ChatCall::Chat(request)))
    }

    pub fn begin_select_topic(&mut self, topic: &str) -> Option<ChatDispatch> {
        if topic.trim().is_empty() {
            return None;
        }
        let ticket = self
            .dispatcher
            .begin(ActionKind::SelectTopic, Target::Lecture)?;
        self.controller.set_topic(Some(topic.to_string()));
        let request = self.chat_request(String::new(), true);
        Some(self.stage(ticket, LECTURE_PENDING_TEXT, ChatCall::Chat(request)))
    }

    fn chat_request(&self, message: String, mini_lecture: bool) -> ChatRequest {
        let state = self.controller.state();
        ChatRequest {
            message,
            grade_level: state.grade_level,
            topic: state
                .topic
                .clone()
                .unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            session_id: state.session_id,
            step_by_step: state.step_mode,
            persona: state.persona.to_string(),
            mini_lecture,
        }
    }

    fn stage(&mut self, ticket: Ticket, pending_text: &str, call: ChatCall) -> ChatDispatch {
        let pending_id = format!("pending-{}", ticket.token);
        self.chat
            .append(pending_bubble(pending_id.clone(), pending_text));
        ChatDispatch {
            ticket,
            pending_id,
            call,
        }
    }

    /// Applies a response. Controls are released whatever the outcome;
    /// superseded responses are dropped without touching state.
    pub fn finish(&mut self, dispatch: ChatDispatch, result: ApiResult<ChatResponse>) {
        let ChatDispatch {
            ticket, pending_id, ..
        } = dispatch;

        if !self.dispatcher.finish(ticket) {
            self.drop_superseded(ticket, &pending_id);
            return;
        }

        let reply = result.and_then(|response| match response.reply {
            Some(reply) if !reply.trim().is_empty() => Ok((reply, response.session_id)),
            _ => Err(ClientError::Malformed("response carried no reply".into())),
        });

        match reply {
            Ok((reply, session_id)) => {
                if let Some(node) = self.chat.find_mut(&pending_id) {
                    set_bubble_text(node, &reply);
                    node.id = None;
                } else {
                    self.chat.append(bubble(Role::Assistant, &reply));
                }
                self.chat.scroll_to_end = true;

                if let Some(session_id) = session_id {
                    if ticket.token > self.session_token {
                        self.session_token = ticket.token;
                        self.controller.set_session_id(Some(session_id));
                    }
                }
            }
            Err(err) => {
                let apology = report_failure(&ticket, &err);
                if let Some(node) = self.chat.find_mut(&pending_id) {
                    set_bubble_text(node, apology);
                    node.id = None;
                }
            }
        }
    }

    /// A superseded question still gets an answer bubble; other pending
    /// bubbles just disappear.
    fn drop_superseded(&mut self, ticket: Ticket, pending_id: &str) {
        match (ticket.kind, self.chat.find_mut(pending_id)) {
            (ActionKind::SendChat, Some(node)) => {
                set_bubble_text(node, ticket.kind.context().apology());
                node.id = None;
            }
            _ => {
                self.chat.remove(pending_id);
            }
        }
    }

    pub async fn welcome(&mut self, api: &dyn TutorApi) {
        if let Some(dispatch) = self.begin_welcome() {
            let result = dispatch.execute(api).await;
            self.finish(dispatch, result);
        }
    }

    /// Returns whether a request was sent.
    pub async fn send_message(&mut self, api: &dyn TutorApi, text: &str) -> bool {
        let Some(dispatch) = self.begin_send(text) else {
            return false;
        };
        let result = dispatch.execute(api).await;
        self.finish(dispatch, result);
        true
    }

    pub async fn select_topic(&mut self, api: &dyn TutorApi, topic: &str) -> bool {
        let Some(dispatch) = self.begin_select_topic(topic) else {
            return false;
        };
        let result = dispatch.execute(api).await;
        self.finish(dispatch, result);
        true
    }

    /// Forgets the current session and asks the backend to open a fresh one.
    /// Responses still in flight for the old session are discarded.
    pub async fn new_session(&mut self, api: &dyn TutorApi) {
        self.reset_session();
        self.welcome(api).await;
    }

    pub fn reset_session(&mut self) {
        self.dispatcher.supersede(Target::Conversation);
        self.session_token = self.dispatcher.supersede(Target::Lecture);
        self.chat.clear();
        self.controller.set_session_id(None);
    }

    pub fn set_grade_level(&mut self, grade_level: GradeLevel) {
        if let Err(err) = self.controller.set_grade_level(grade_level) {
            warn!(error = %err, "failed to persist grade level");
        }
    }

    pub fn set_step_mode(&mut self, step_mode: bool) {
        if let Err(err) = self.controller.set_step_mode(step_mode) {
            warn!(error = %err, "failed to persist step mode");
        }
    }

    pub fn set_persona(&mut self, persona: Persona) {
        self.controller.set_persona(persona);
    }
}

#[cfg(test)]
#[path = "tests/learn_page_tests.rs"]
mod tests;
