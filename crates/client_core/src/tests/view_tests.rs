use super::*;
use rand::{rngs::StdRng, SeedableRng};
use shared::domain::SessionId;

fn question(choices: &[&str]) -> QuizQuestion {
    QuizQuestion {
        question: "What is 3 + 4?".into(),
        choices: choices.iter().map(|c| c.to_string()).collect(),
        session_id: Some(SessionId(5)),
    }
}

fn region(nodes: Vec<Node>) -> Region {
    let mut region = Region::default();
    region.replace(nodes);
    region
}

#[test]
fn question_renders_one_lettered_button_per_choice() {
    let rendered = region(render_question(&question(&["6", "7", "8"]), Some("🤓")));

    assert_eq!(rendered.count(&Node::is_interactive), 3);
    assert_eq!(
        rendered.find("mc-question").map(|n| n.text.as_str()),
        Some("🤓 What is 3 + 4?")
    );
    assert_eq!(rendered.find(&choice_id(0)).map(|n| n.text.as_str()), Some("A. 6"));
    assert_eq!(rendered.find(&choice_id(2)).map(|n| n.text.as_str()), Some("C. 8"));
    assert!(rendered
        .find(&choice_id(1))
        .is_some_and(|n| n.has_class("mc-card") && n.has_class("mc-yellow")));
}

#[test]
fn question_without_choices_renders_fallback_notice_only() {
    let rendered = region(render_question(&question(&[]), None));

    assert_eq!(rendered.count(&Node::is_interactive), 0);
    assert_eq!(rendered.count_kind(NodeKind::Notice), 1);
    assert_eq!(
        rendered.find("mc-empty").map(|n| n.text.as_str()),
        Some(NO_CHOICES_NOTICE)
    );
}

#[test]
fn picked_marker_comes_from_the_fixed_set() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..16 {
        assert!(QUESTION_MARKERS.contains(&pick_marker(&mut rng)));
    }
}

#[test]
fn choice_labels_are_sequential_letters() {
    assert_eq!(choice_label(0), "A");
    assert_eq!(choice_label(25), "Z");
    assert_eq!(choice_label(26), "27");
}

#[test]
fn transcript_keeps_order_and_line_breaks() {
    let turns = vec![
        Turn {
            role: "user".into(),
            content: "help with 12 - 5".into(),
            timestamp: None,
        },
        Turn {
            role: "bot".into(),
            content: "Step 1: count back\nStep 2: land on 7".into(),
            timestamp: None,
        },
    ];
    let nodes = render_transcript(&turns);

    assert_eq!(nodes.len(), 2);
    assert!(nodes[0].has_class("user-message"));
    assert!(nodes[1].has_class("bot-message"));
    let kinds: Vec<NodeKind> = nodes[1].children.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Text, NodeKind::LineBreak, NodeKind::Text]
    );
}

#[test]
fn append_scrolls_to_latest_entry() {
    let mut chat = Region::default();
    chat.append(bubble(Role::User, "hi"));
    assert!(chat.scroll_to_end);

    chat.clear();
    assert!(!chat.scroll_to_end);
    assert!(chat.is_empty());
}

#[test]
fn pending_bubble_text_can_be_replaced_in_place() {
    let mut chat = Region::default();
    chat.append(pending_bubble("pending-1", "Let me think about that..."));

    let node = chat.find_mut("pending-1").expect("pending bubble");
    set_bubble_text(node, "Seven!");

    let node = chat.find("pending-1").expect("pending bubble");
    assert_eq!(node.text, "Seven!");
    assert!(!node.has_class("pending"));
}

#[test]
fn problem_card_carries_check_and_hint_controls() {
    let problem = PracticeProblem {
        question: "8 + 5 = ?".into(),
        correct_answer: Some(serde_json::json!(13)),
    };
    let card = problem_card(&problem, 2);

    assert_eq!(card.id.as_deref(), Some("problem-2"));
    assert!(card.find("problem-2-check").is_some());
    assert!(card.find("problem-2-hint").is_some());
    assert!(card.find("problem-2-feedback").is_some());
    assert_eq!(
        card.find("problem-2-question").map(|n| n.text.as_str()),
        Some("8 + 5 = ?")
    );
}

#[test]
fn correct_feedback_strips_question_mark() {
    assert_eq!(
        correct_feedback("8 + 5 = ?", Some(&serde_json::json!(13))),
        "Nice job! ✅ 8 + 5 = 13."
    );
}

#[test]
fn stats_show_dash_until_something_is_answered() {
    let empty = region(render_stats(&PracticeStats::default()));
    assert_eq!(
        empty.find("stats-accuracy").map(|n| n.text.as_str()),
        Some("Accuracy: —")
    );

    let filled = region(render_stats(&PracticeStats {
        total_answered: 4,
        total_correct: 3,
        best_streak: 2,
    }));
    assert_eq!(
        filled.find("stats-accuracy").map(|n| n.text.as_str()),
        Some("Accuracy: 75%")
    );
    assert_eq!(
        filled.find("stats-best-streak").map(|n| n.text.as_str()),
        Some("Best streak: 2")
    );
}

fn summary(id: i64, title: Option<&str>, topic: Option<&str>, created: Option<&str>) -> SessionSummary {
    SessionSummary {
        id: shared::domain::SessionId(id),
        title: title.map(str::to_string),
        topic: topic.map(str::to_string),
        created_at: created.map(str::to_string),
        grade_level: None,
        summary: None,
    }
}

#[test]
fn session_label_falls_back_to_topic_then_default() {
    assert_eq!(
        session_label(&summary(1, Some("Fractions fun"), Some("Fractions"), None)),
        "Fractions fun"
    );
    assert_eq!(session_label(&summary(2, None, Some("Money"), None)), "Money");
    assert_eq!(session_label(&summary(3, Some(" "), None, None)), "Math practice");
}

#[test]
fn session_label_formats_backend_timestamps() {
    assert_eq!(
        session_label(&summary(1, Some("Shapes"), None, Some("2024-05-01T14:05:09.123"))),
        "Shapes — May 1, 2024 2:05 PM"
    );
    assert_eq!(
        session_label(&summary(1, Some("Shapes"), None, Some("yesterday"))),
        "Shapes — yesterday"
    );
}

#[test]
fn session_list_renders_open_and_delete_per_item() {
    let rendered = region(render_session_list(&[
        summary(1, Some("A"), None, None),
        summary(2, Some("B"), None, None),
    ]));

    assert_eq!(rendered.count_kind(NodeKind::ListItem), 2);
    assert!(rendered.find("session-1-open").is_some());
    assert!(rendered.find("session-2-delete").is_some());
}

#[test]
fn empty_session_list_invites_the_student() {
    let rendered = region(render_session_list(&[]));

    assert_eq!(rendered.count(&Node::is_interactive), 0);
    assert_eq!(rendered.count_kind(NodeKind::Notice), 1);
}

#[test]
fn theme_label_names_current_theme() {
    assert_eq!(theme_label(Theme::Dark), "Current theme: Dark");
}
