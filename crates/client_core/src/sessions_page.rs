use shared::{domain::SessionId, protocol::SessionSummary};
use tracing::info;
use url::Url;

use crate::{
    dispatcher::{report_failure, ActionDispatcher, ActionKind, Target},
    state::{Location, GRADE_PARAM, SESSION_ID_PARAM, TOPIC_PARAM},
    view::{
        error_notice, loading_notice, render_session_list, Node, NodeKind, Region,
        LOADING_SESSIONS_NOTICE,
    },
    TutorApi,
};

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this Math Mission?";
pub const LEARN_PATH: &str = "/learn";

/// Blocking yes/no and notification dialogs owned by the host.
pub trait Prompter {
    fn confirm(&mut self, message: &str) -> bool;
    fn alert(&mut self, message: &str);
}

#[derive(Debug, Default)]
pub struct SessionsPage {
    dispatcher: ActionDispatcher,
    sessions: Vec<SessionSummary>,
    list: Region,
}

impl SessionsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    pub fn list(&self) -> &Region {
        &self.list
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub async fn load(&mut self, api: &dyn TutorApi) {
        let Some(ticket) = self
            .dispatcher
            .begin(ActionKind::ListSessions, Target::Sessions)
        else {
            return;
        };
        self.list
            .replace(vec![status_item(loading_notice(LOADING_SESSIONS_NOTICE))]);

        let result = api.list_sessions().await;
        if !self.dispatcher.finish(ticket) {
            return;
        }

        match result {
            Ok(sessions) => {
                info!(count = sessions.len(), "loaded past sessions");
                self.list.replace(render_session_list(&sessions));
                self.sessions = sessions;
            }
            Err(err) => {
                let apology = report_failure(&ticket, &err);
                self.sessions.clear();
                self.list.replace(vec![status_item(error_notice(apology))]);
            }
        }
    }

    /// Returns whether the session was removed. Nothing is sent unless the
    /// prompter confirms.
    pub async fn delete(
        &mut self,
        api: &dyn TutorApi,
        id: SessionId,
        prompter: &mut dyn Prompter,
    ) -> bool {
        if !prompter.confirm(DELETE_CONFIRMATION) {
            return false;
        }
        let Some(ticket) = self
            .dispatcher
            .begin(ActionKind::DeleteSession, Target::Session(id))
        else {
            return false;
        };
        let button = format!("session-{id}-delete");
        self.set_enabled(&button, false);

        let result = api.delete_session(id).await;
        self.dispatcher.finish(ticket);

        match result {
            Ok(()) => {
                self.sessions.retain(|summary| summary.id != id);
                self.list.remove(&format!("session-{id}"));
                if self.sessions.is_empty() {
                    self.list.replace(render_session_list(&self.sessions));
                }
                info!(%id, "deleted session");
                true
            }
            Err(err) => {
                self.set_enabled(&button, true);
                prompter.alert(report_failure(&ticket, &err));
                false
            }
        }
    }

    /// The learn page URL that resumes `id`, relative to `base`.
    pub fn learn_url(&self, base: &Url, id: SessionId) -> Option<Url> {
        let summary = self.sessions.iter().find(|summary| summary.id == id)?;
        let mut url = base.clone();
        url.set_path(LEARN_PATH);
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(SESSION_ID_PARAM, &id.to_string());
            if let Some(topic) = non_blank(summary.topic.as_deref()) {
                query.append_pair(TOPIC_PARAM, topic);
            }
            if let Some(grade) = non_blank(summary.grade_level.as_deref()) {
                query.append_pair(GRADE_PARAM, grade);
            }
        }
        Some(url)
    }

    /// Navigates to the learn page for a listed session.
    pub fn open<L: Location + ?Sized>(&self, id: SessionId, location: &mut L) -> bool {
        let Some(url) = self.learn_url(location.href(), id) else {
            return false;
        };
        info!(%id, url = %url, "opening session");
        location.assign(url);
        true
    }

    fn set_enabled(&mut self, id: &str, enabled: bool) {
        if let Some(node) = self.list.find_mut(id) {
            node.enabled = enabled;
        }
    }
}

fn status_item(notice: Node) -> Node {
    Node::new(NodeKind::ListItem)
        .with_class("session-item")
        .with_child(notice)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "tests/sessions_page_tests.rs"]
mod tests;
