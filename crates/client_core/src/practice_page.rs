//! Practice book page: a grid of practice problems plus multiple-choice and guided modes.

use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::{
    domain::{GradeLevel, SessionId},
    protocol::{
        CheckAnswerRequest, GuidedNextRequest, GuidedStartRequest, HintRequest, PracticeProblem,
        PracticeStats, QuizAnswerRequest, QuizQuestion, QuizStartRequest, DEFAULT_PRACTICE_MODE,
    },
};
use tracing::info;

use crate::{
    dispatcher::{report_failure, ActionDispatcher, ActionKind, Target},
    error::ClientError,
    view::{
        choice_id, correct_feedback, error_notice, loading_notice, notice, pick_marker,
        problem_id, render_guided_step, render_problem_set, render_question, render_stats, Node,
        Region,
    },
    TutorApi,
};

pub const DEFAULT_PROBLEM_COUNT: usize = 6;

pub const LOADING_PROBLEMS_TEXT: &str = "Loading practice problems...";
pub const EMPTY_ANSWER_TEXT: &str = "Try typing an answer first!";
pub const NOT_QUITE_TEXT: &str = "Not quite yet. Try again!";
pub const HINT_PENDING_TEXT: &str = "Thinking of a hint... 💭";
pub const QUIZ_LOADING_TEXT: &str = "Picking a question...";
pub const QUIZ_CORRECT_TEXT: &str = "⭐😊 Great job!";
pub const QUIZ_WRONG_TEXT: &str = "❌😅 Try again!";
pub const GUIDED_LOADING_TEXT: &str = "Setting up your guided lesson...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeView {
    Problems,
    Quiz,
    Guided,
}

pub struct PracticePage<R: Rng = StdRng> {
    dispatcher: ActionDispatcher,
    mode: String,
    view: PracticeView,
    problems: Vec<PracticeProblem>,
    problem_region: Region,
    stats: Option<PracticeStats>,
    stats_region: Region,
    quiz: Option<QuizQuestion>,
    quiz_region: Region,
    quiz_feedback: Region,
    guided_session: Option<SessionId>,
    guided_region: Region,
    rng: R,
}

impl PracticePage<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for PracticePage<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PracticePage<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            dispatcher: ActionDispatcher::new(),
            mode: DEFAULT_PRACTICE_MODE.to_string(),
            view: PracticeView::Problems,
            problems: Vec::new(),
            problem_region: Region::default(),
            stats: None,
            stats_region: Region::default(),
            quiz: None,
            quiz_region: Region::default(),
            quiz_feedback: Region::default(),
            guided_session: None,
            guided_region: Region::default(),
            rng,
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn view(&self) -> PracticeView {
        self.view
    }

    pub fn problems(&self) -> &[PracticeProblem] {
        &self.problems
    }

    pub fn problem_region(&self) -> &Region {
        &self.problem_region
    }

    pub fn stats(&self) -> Option<&PracticeStats> {
        self.stats.as_ref()
    }

    pub fn stats_region(&self) -> &Region {
        &self.stats_region
    }

    pub fn quiz(&self) -> Option<&QuizQuestion> {
        self.quiz.as_ref()
    }

    pub fn quiz_region(&self) -> &Region {
        &self.quiz_region
    }

    pub fn quiz_feedback(&self) -> &Region {
        &self.quiz_feedback
    }

    pub fn guided_region(&self) -> &Region {
        &self.guided_region
    }

    pub fn guided_session(&self) -> Option<SessionId> {
        self.guided_session
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Fetches `count` problems one after another. Any failure discards the
    /// whole batch and leaves a single error notice.
    pub async fn load_problems(&mut self, api: &dyn TutorApi, count: usize) {
        let Some(ticket) = self
            .dispatcher
            .begin(ActionKind::LoadProblems, Target::Problems)
        else {
            return;
        };
        self.view = PracticeView::Problems;
        self.problem_region
            .replace(vec![loading_notice(LOADING_PROBLEMS_TEXT)]);

        let mut batch = Vec::with_capacity(count);
        let mut failure = None;
        for _ in 0..count {
            match api.next_problem(&self.mode).await {
                Ok(problem) => batch.push(problem),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if !self.dispatcher.finish(ticket) {
            return;
        }

        match failure {
            None => {
                info!(count = batch.len(), mode = %self.mode, "loaded practice problems");
                self.problem_region.replace(render_problem_set(&batch));
                self.problems = batch;
            }
            Some(err) => {
                let apology = report_failure(&ticket, &err);
                self.problems.clear();
                self.problem_region.replace(vec![error_notice(apology)]);
            }
        }
    }

    /// `number` is the 1-based card number shown to the student.
    pub async fn check_answer(&mut self, api: &dyn TutorApi, number: usize, answer: &str) {
        let Some(question) = self.problem_question(number) else {
            return;
        };
        let id = problem_id(number);
        let answer = answer.trim().to_string();
        if let Some(input) = self.problem_region.find_mut(&format!("{id}-answer")) {
            input.text = answer.clone();
        }

        if answer.is_empty() {
            self.set_problem_line(&format!("{id}-feedback"), "text-danger", EMPTY_ANSWER_TEXT);
            return;
        }

        let Some(ticket) = self
            .dispatcher
            .begin(ActionKind::CheckAnswer, Target::Problem(number))
        else {
            return;
        };
        let check_id = format!("{id}-check");
        self.set_control_enabled(&check_id, false);

        let result = api
            .check_answer(&CheckAnswerRequest {
                question: question.clone(),
                user_answer: answer,
            })
            .await;

        let fresh = self.dispatcher.finish(ticket);
        self.set_control_enabled(&check_id, true);
        if !fresh {
            return;
        }

        let feedback_id = format!("{id}-feedback");
        match result {
            Ok(checked) => {
                if checked.correct {
                    let text = correct_feedback(&question, checked.correct_answer.as_ref());
                    self.set_problem_line(&feedback_id, "text-success", &text);
                } else {
                    self.set_problem_line(&feedback_id, "text-danger", NOT_QUITE_TEXT);
                }
                if let Some(stats) = checked.stats {
                    self.stats_region.replace(render_stats(&stats));
                    self.stats = Some(stats);
                }
            }
            Err(err) => {
                let apology = report_failure(&ticket, &err);
                self.set_problem_line(&feedback_id, "text-danger", apology);
            }
        }
    }

    pub async fn request_hint(&mut self, api: &dyn TutorApi, number: usize) {
        let Some(question) = self.problem_question(number) else {
            return;
        };
        let Some(ticket) = self
            .dispatcher
            .begin(ActionKind::Hint, Target::ProblemHint(number))
        else {
            return;
        };
        let id = problem_id(number);
        let hint_id = format!("{id}-hint-box");
        let hint_button = format!("{id}-hint");
        let user_answer = self
            .problem_region
            .find(&format!("{id}-answer"))
            .map(|input| input.text.trim().to_string())
            .unwrap_or_default();

        self.set_problem_line(&hint_id, "text-muted", HINT_PENDING_TEXT);
        self.set_control_enabled(&hint_button, false);

        let result = api
            .hint(&HintRequest {
                problem: question,
                user_answer,
            })
            .await;

        let fresh = self.dispatcher.finish(ticket);
        self.set_control_enabled(&hint_button, true);
        if !fresh {
            return;
        }

        let hint = result.and_then(|res| {
            res.hint_text
                .filter(|text| !text.trim().is_empty())
                .ok_or_else(|| ClientError::Malformed("hint response carried no text".into()))
        });
        match hint {
            Ok(text) => self.set_problem_line(&hint_id, "text-muted", &text),
            Err(err) => {
                let apology = report_failure(&ticket, &err);
                self.set_problem_line(&hint_id, "text-danger", apology);
            }
        }
    }

    pub async fn start_quiz(&mut self, api: &dyn TutorApi, topic: &str, grade_level: GradeLevel) {
        let Some(ticket) = self.dispatcher.begin(ActionKind::StartQuiz, Target::Quiz) else {
            return;
        };
        self.view = PracticeView::Quiz;
        self.quiz_feedback.clear();
        self.quiz_region
            .replace(vec![loading_notice(QUIZ_LOADING_TEXT)]);

        let result = api
            .quiz_start(&QuizStartRequest {
                topic: topic.to_string(),
                grade_level,
            })
            .await;

        if !self.dispatcher.finish(ticket) {
            return;
        }

        match result {
            Ok(question) => self.show_question(question),
            Err(err) => {
                let apology = report_failure(&ticket, &err);
                self.quiz = None;
                self.quiz_region.replace(vec![error_notice(apology)]);
            }
        }
    }

    /// Choices are disabled while the answer is graded and released afterwards,
    /// whatever the outcome. A failed submission leaves the question as it was.
    pub async fn answer_quiz(&mut self, api: &dyn TutorApi, choice_index: usize) {
        let Some(question) = self.quiz.as_ref() else {
            return;
        };
        let Some(choice) = question.choices.get(choice_index).cloned() else {
            return;
        };
        let session_id = question.session_id;
        let Some(ticket) = self.dispatcher.begin(ActionKind::AnswerQuiz, Target::Quiz) else {
            return;
        };
        self.set_choices_enabled(false);

        let result = match session_id {
            Some(session_id) => {
                api.quiz_answer(&QuizAnswerRequest {
                    session_id,
                    user_answer: choice,
                })
                .await
            }
            None => Err(ClientError::Malformed("question carried no session id".into())),
        };

        let fresh = self.dispatcher.finish(ticket);
        self.set_choices_enabled(true);
        if !fresh {
            return;
        }

        match result {
            Ok(graded) => {
                let (class, tone, text) = if graded.correct {
                    ("mc-correct", "text-success", QUIZ_CORRECT_TEXT.to_string())
                } else if graded.explanation.trim().is_empty() {
                    ("mc-wrong", "text-danger", QUIZ_WRONG_TEXT.to_string())
                } else {
                    (
                        "mc-wrong",
                        "text-danger",
                        format!("{QUIZ_WRONG_TEXT}\n\n{}", graded.explanation.trim()),
                    )
                };
                if let Some(card) = self.quiz_region.find_mut(&choice_id(choice_index)) {
                    card.add_class(class);
                }
                self.quiz_feedback.replace(vec![notice(tone, text)]);
                if let Some(next) = graded.next {
                    self.show_question(next);
                }
            }
            Err(err) => {
                let apology = report_failure(&ticket, &err);
                self.quiz_feedback.replace(vec![error_notice(apology)]);
            }
        }
    }

    pub fn exit_quiz(&mut self) {
        self.view = PracticeView::Problems;
    }

    pub async fn start_guided(&mut self, api: &dyn TutorApi, topic: &str, grade: GradeLevel) {
        let Some(ticket) = self
            .dispatcher
            .begin(ActionKind::StartGuided, Target::Guided)
        else {
            return;
        };
        self.view = PracticeView::Guided;
        self.guided_region
            .replace(vec![loading_notice(GUIDED_LOADING_TEXT)]);

        let result = api
            .guided_start(&GuidedStartRequest {
                topic: topic.to_string(),
                grade,
            })
            .await;

        if !self.dispatcher.finish(ticket) {
            return;
        }

        let step = result.and_then(|res| match res.bot_message {
            Some(message) if !message.trim().is_empty() => Ok((message, res.session_id)),
            _ => Err(ClientError::Malformed("guided step carried no message".into())),
        });
        match step {
            Ok((message, session_id)) => {
                self.guided_session = session_id;
                self.guided_region.replace(render_guided_step(&message));
            }
            Err(err) => {
                let apology = report_failure(&ticket, &err);
                self.guided_session = None;
                self.guided_region.replace(vec![error_notice(apology)]);
            }
        }
    }

    /// Returns whether a request was sent. Blank answers are ignored.
    pub async fn submit_guided(&mut self, api: &dyn TutorApi, message: &str) -> bool {
        let message = message.trim();
        if message.is_empty() {
            return false;
        }
        let Some(session_id) = self.guided_session else {
            return false;
        };
        let Some(ticket) = self
            .dispatcher
            .begin(ActionKind::NextGuided, Target::Guided)
        else {
            return false;
        };
        self.guided_region.remove("guided-error");
        if let Some(input) = self.guided_region.find_mut("guided-input") {
            input.text = message.to_string();
        }
        self.set_guided_enabled(false);

        let result = api
            .guided_next(&GuidedNextRequest {
                session_id,
                user_message: message.to_string(),
            })
            .await;

        let fresh = self.dispatcher.finish(ticket);
        self.set_guided_enabled(true);
        if !fresh {
            return true;
        }

        let step = result.and_then(|res| match res.bot_message {
            Some(message) if !message.trim().is_empty() => Ok((message, res.session_id)),
            _ => Err(ClientError::Malformed("guided step carried no message".into())),
        });
        match step {
            Ok((message, next_session)) => {
                if let Some(next_session) = next_session {
                    self.guided_session = Some(next_session);
                }
                self.guided_region.replace(render_guided_step(&message));
            }
            Err(err) => {
                let apology = report_failure(&ticket, &err);
                self.guided_region
                    .append(error_notice(apology).with_id("guided-error"));
            }
        }
        true
    }

    fn problem_question(&self, number: usize) -> Option<String> {
        number
            .checked_sub(1)
            .and_then(|index| self.problems.get(index))
            .map(|problem| problem.question.clone())
    }

    fn set_problem_line(&mut self, id: &str, tone: &str, text: &str) {
        if let Some(node) = self.problem_region.find_mut(id) {
            node.set_tone(tone);
            node.text = text.to_string();
        }
    }

    fn set_control_enabled(&mut self, id: &str, enabled: bool) {
        if let Some(node) = self.problem_region.find_mut(id) {
            node.enabled = enabled;
        }
    }

    fn set_choices_enabled(&mut self, enabled: bool) {
        self.quiz_region
            .set_enabled_where(&|node: &Node| node.has_class("mc-card"), enabled);
    }

    fn set_guided_enabled(&mut self, enabled: bool) {
        self.guided_region
            .set_enabled_where(&Node::is_interactive, enabled);
    }

    fn show_question(&mut self, question: QuizQuestion) {
        let marker = pick_marker(&mut self.rng);
        self.quiz_region
            .replace(render_question(&question, Some(marker)));
        self.quiz = Some(question);
    }
}

#[cfg(test)]
#[path = "tests/practice_page_tests.rs"]
mod tests;
