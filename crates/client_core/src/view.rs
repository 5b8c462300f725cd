//! Pure rendering from server payloads to a small retained node tree.
//!
//! Nothing here touches the network. Page controllers own one [`Region`] per
//! area of the page and swap node lists in and out of it.

use chrono::{DateTime, NaiveDateTime};
use rand::{seq::SliceRandom, Rng};
use shared::{
    domain::{Role, Theme},
    protocol::{answer_text, PracticeProblem, PracticeStats, QuizQuestion, SessionSummary, Turn},
};

/// Cosmetic markers one of which may decorate a quiz question.
pub const QUESTION_MARKERS: [&str; 4] = ["🤓", "🧠", "✏️", "⭐"];
const CHOICE_COLORS: [&str; 4] = ["mc-blue", "mc-yellow", "mc-pink", "mc-green"];

pub const NO_CHOICES_NOTICE: &str =
    "I couldn't find answer choices for this question. Please try another one.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Heading,
    Paragraph,
    Bubble,
    Text,
    LineBreak,
    Button,
    Input,
    Notice,
    ListItem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub text: String,
    pub enabled: bool,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            classes: Vec::new(),
            text: String::new(),
            enabled: true,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self.kind, NodeKind::Button | NodeKind::Input)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    /// Swaps the `text-*` tone class for `class`.
    pub fn set_tone(&mut self, class: &str) {
        self.classes.retain(|c| !c.starts_with("text-"));
        self.add_class(class);
    }

    pub fn id_is(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id_is(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id_is(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    pub fn count(&self, pred: &dyn Fn(&Node) -> bool) -> usize {
        usize::from(pred(self)) + self.children.iter().map(|c| c.count(pred)).sum::<usize>()
    }

    pub fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.for_each_mut(f);
        }
    }
}

/// An area of the page whose contents are replaced wholesale or appended to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    pub nodes: Vec<Node>,
    pub scroll_to_end: bool,
}

impl Region {
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.scroll_to_end = false;
    }

    pub fn replace(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
        self.scroll_to_end = false;
    }

    /// Appends and scrolls to the new last entry.
    pub fn append(&mut self, node: Node) {
        self.nodes.push(node);
        self.scroll_to_end = true;
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find_map(|node| node.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find_map(|node| node.find_mut(id))
    }

    /// Removes a top-level node.
    pub fn remove(&mut self, id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|node| node.id_is(id))?;
        Some(self.nodes.remove(index))
    }

    pub fn count(&self, pred: &dyn Fn(&Node) -> bool) -> usize {
        self.nodes.iter().map(|node| node.count(pred)).sum()
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.count(&|node| node.kind == kind)
    }

    pub fn set_enabled_where(&mut self, pred: &dyn Fn(&Node) -> bool, enabled: bool) {
        for node in &mut self.nodes {
            node.for_each_mut(&mut |n| {
                if pred(n) {
                    n.enabled = enabled;
                }
            });
        }
    }
}

pub fn notice(tone: &str, text: impl Into<String>) -> Node {
    Node::new(NodeKind::Notice).with_class(tone).with_text(text)
}

pub fn loading_notice(text: impl Into<String>) -> Node {
    notice("text-muted", text)
}

pub fn error_notice(text: impl Into<String>) -> Node {
    notice("text-danger", text)
}

/// A chat bubble. Embedded newlines become line-break nodes.
pub fn bubble(role: Role, text: &str) -> Node {
    let mut node = Node::new(NodeKind::Bubble)
        .with_class("chat-message")
        .with_class(role.css_class())
        .with_text(text);
    node.children = text_lines(text);
    node
}

pub fn pending_bubble(id: impl Into<String>, text: &str) -> Node {
    bubble(Role::Assistant, text)
        .with_id(id)
        .with_class("pending")
}

fn text_lines(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            nodes.push(Node::new(NodeKind::LineBreak));
        }
        if !line.is_empty() {
            nodes.push(Node::new(NodeKind::Text).with_text(line));
        }
    }
    nodes
}

/// Overwrites a bubble's text in place, keeping its id and role.
pub fn set_bubble_text(node: &mut Node, text: &str) {
    node.text = text.to_string();
    node.children = text_lines(text);
    node.classes.retain(|c| c != "pending");
}

pub fn render_transcript(turns: &[Turn]) -> Vec<Node> {
    turns
        .iter()
        .map(|turn| bubble(turn.role(), &turn.content))
        .collect()
}

pub fn pick_marker<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    QUESTION_MARKERS.choose(rng).copied().unwrap_or("✨")
}

/// `A`, `B`, ... then numbers past `Z`.
pub fn choice_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(offset) if offset < 26 => char::from(b'A' + offset).to_string(),
        _ => (index + 1).to_string(),
    }
}

pub fn choice_id(index: usize) -> String {
    format!("choice-{index}")
}

pub fn render_question(question: &QuizQuestion, marker: Option<&str>) -> Vec<Node> {
    let heading = match marker {
        Some(marker) => format!("{marker} {}", question.question),
        None => question.question.clone(),
    };
    let mut nodes = vec![Node::new(NodeKind::Heading)
        .with_id("mc-question")
        .with_text(heading)];

    if question.choices.is_empty() {
        nodes.push(notice("text-muted", NO_CHOICES_NOTICE).with_id("mc-empty"));
        return nodes;
    }

    let mut choices = Node::new(NodeKind::Container).with_id("mc-choices");
    for (index, choice) in question.choices.iter().enumerate() {
        choices.children.push(
            Node::new(NodeKind::Button)
                .with_id(choice_id(index))
                .with_class("mc-card")
                .with_class(CHOICE_COLORS[index % CHOICE_COLORS.len()])
                .with_text(format!("{}. {choice}", choice_label(index))),
        );
    }
    nodes.push(choices);
    nodes
}

pub fn render_guided_step(message: &str) -> Vec<Node> {
    vec![
        Node::new(NodeKind::Heading)
            .with_id("guided-message")
            .with_text(format!("👣 {message}")),
        Node::new(NodeKind::Container)
            .with_class("input-group")
            .with_child(
                Node::new(NodeKind::Input)
                    .with_id("guided-input")
                    .with_text("Your answer…"),
            )
            .with_child(
                Node::new(NodeKind::Button)
                    .with_id("guided-next")
                    .with_text("➡️ Next"),
            ),
    ]
}

pub fn problem_id(number: usize) -> String {
    format!("problem-{number}")
}

pub fn problem_card(problem: &PracticeProblem, number: usize) -> Node {
    let id = problem_id(number);
    Node::new(NodeKind::Container)
        .with_id(id.clone())
        .with_class("problem-card")
        .with_child(Node::new(NodeKind::Heading).with_text(format!("Problem #{number}")))
        .with_child(
            Node::new(NodeKind::Paragraph)
                .with_id(format!("{id}-question"))
                .with_text(problem.question.clone()),
        )
        .with_child(Node::new(NodeKind::Input).with_id(format!("{id}-answer")))
        .with_child(
            Node::new(NodeKind::Button)
                .with_id(format!("{id}-check"))
                .with_text("Check"),
        )
        .with_child(
            Node::new(NodeKind::Button)
                .with_id(format!("{id}-hint"))
                .with_text("Need a hint? 💡"),
        )
        .with_child(Node::new(NodeKind::Paragraph).with_id(format!("{id}-feedback")))
        .with_child(
            Node::new(NodeKind::Paragraph)
                .with_id(format!("{id}-hint-box"))
                .with_class("text-muted"),
        )
}

pub fn render_problem_set(problems: &[PracticeProblem]) -> Vec<Node> {
    problems
        .iter()
        .enumerate()
        .map(|(index, problem)| problem_card(problem, index + 1))
        .collect()
}

/// Feedback for a graded problem, e.g. `Nice job! ✅ 3 + 4 = 7.`
pub fn correct_feedback(question: &str, correct_answer: Option<&serde_json::Value>) -> String {
    let stem = question.replacen('?', "", 1);
    let stem = stem.trim_end();
    match correct_answer {
        Some(answer) => format!("Nice job! ✅ {stem} {}.", answer_text(answer)),
        None => format!("Nice job! ✅ {stem}."),
    }
}

pub fn render_stats(stats: &PracticeStats) -> Vec<Node> {
    let accuracy = stats
        .accuracy_percent()
        .map(|pct| format!("{pct}%"))
        .unwrap_or_else(|| "—".to_string());
    let stat = |id: &str, label: &str, value: String| {
        Node::new(NodeKind::Paragraph)
            .with_id(id)
            .with_text(format!("{label}: {value}"))
    };
    vec![
        stat("stats-total", "Answered", stats.total_answered.to_string()),
        stat("stats-correct", "Correct", stats.total_correct.to_string()),
        stat("stats-accuracy", "Accuracy", accuracy),
        stat("stats-best-streak", "Best streak", stats.best_streak.to_string()),
    ]
}

pub const NO_SESSIONS_NOTICE: &str = "You don’t have any sessions yet. Try asking LearnBot a math question on the Teacher Mode page!";
pub const LOADING_SESSIONS_NOTICE: &str = "Loading your Math Missions…";

pub fn session_item_id(summary: &SessionSummary) -> String {
    format!("session-{}", summary.id)
}

/// Backend timestamps are `LocalDateTime` strings; anything unparseable is shown as sent.
pub fn format_created_at(raw: &str) -> String {
    let raw = raw.trim();
    let formatted = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()));
    match formatted {
        Some(dt) => dt.format("%b %-d, %Y %-I:%M %p").to_string(),
        None => raw.to_string(),
    }
}

pub fn session_label(summary: &SessionSummary) -> String {
    let title = [summary.title.as_deref(), summary.topic.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or("Math practice");
    match summary.created_at.as_deref().map(str::trim) {
        Some(created) if !created.is_empty() => {
            format!("{title} — {}", format_created_at(created))
        }
        _ => title.to_string(),
    }
}

pub fn render_session_list(sessions: &[SessionSummary]) -> Vec<Node> {
    if sessions.is_empty() {
        return vec![Node::new(NodeKind::ListItem)
            .with_class("session-item")
            .with_child(notice("text-muted", NO_SESSIONS_NOTICE))];
    }

    sessions
        .iter()
        .map(|summary| {
            let id = session_item_id(summary);
            let mut item = Node::new(NodeKind::ListItem)
                .with_id(id.clone())
                .with_class("session-item")
                .with_child(
                    Node::new(NodeKind::Button)
                        .with_id(format!("{id}-open"))
                        .with_class("session-pill")
                        .with_text(session_label(summary)),
                )
                .with_child(
                    Node::new(NodeKind::Button)
                        .with_id(format!("{id}-delete"))
                        .with_class("session-delete-btn")
                        .with_text("Delete"),
                );
            if let Some(text) = summary.summary.as_deref().filter(|s| !s.trim().is_empty()) {
                item.children
                    .push(Node::new(NodeKind::Paragraph).with_class("text-muted").with_text(text));
            }
            item
        })
        .collect()
}

pub fn theme_label(theme: Theme) -> String {
    format!("Current theme: {}", theme.display_name())
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
