use super::*;

#[test]
fn chat_lines_without_slash_are_messages() {
    assert_eq!(
        ChatCommand::parse("what is 5 + 5?"),
        ChatCommand::Message("what is 5 + 5?".into())
    );
    assert_eq!(
        ChatCommand::parse("/topic Place value"),
        ChatCommand::Topic("Place value".into())
    );
    assert_eq!(
        ChatCommand::parse("/grade 3rd grade"),
        ChatCommand::Grade(GradeLevel::Third)
    );
    assert_eq!(ChatCommand::parse("/steps off"), ChatCommand::Steps(false));
    assert_eq!(ChatCommand::parse("/new"), ChatCommand::NewSession);
    assert_eq!(ChatCommand::parse("/quit"), ChatCommand::Quit);
}

#[test]
fn malformed_chat_commands_are_reported() {
    assert_eq!(
        ChatCommand::parse("/grade 9th grade"),
        ChatCommand::Unknown("/grade 9th grade".into())
    );
    assert_eq!(ChatCommand::parse("/topic"), ChatCommand::Unknown("/topic".into()));
    assert_eq!(ChatCommand::parse("/persona  "), ChatCommand::Unknown("/persona  ".into()));
}

#[test]
fn practice_commands_take_card_numbers() {
    assert_eq!(
        PracticeCommand::parse("check 2 1 2"),
        PracticeCommand::Check(2, "1 2".into())
    );
    assert_eq!(PracticeCommand::parse("hint 4"), PracticeCommand::Hint(4));
    assert_eq!(PracticeCommand::parse("hint"), PracticeCommand::Unknown);
    assert_eq!(PracticeCommand::parse("new"), PracticeCommand::NewSet);
}

#[test]
fn choices_accept_letters_and_numbers() {
    assert_eq!(parse_choice("A"), Some(0));
    assert_eq!(parse_choice(" c "), Some(2));
    assert_eq!(parse_choice("2"), Some(1));
    assert_eq!(parse_choice("0"), None);
    assert_eq!(parse_choice("AB"), None);
}

#[test]
fn learn_url_carries_resume_context() {
    let url = learn_url(&ChatArgs {
        session: Some(SessionId(42)),
        topic: Some("Fractions".into()),
        grade: Some(GradeLevel::Third),
    })
    .expect("url");

    let location = MemoryLocation::new(url);
    assert_eq!(location.query_param(SESSION_ID_PARAM).as_deref(), Some("42"));
    assert_eq!(location.query_param(TOPIC_PARAM).as_deref(), Some("Fractions"));
    assert_eq!(location.query_param(GRADE_PARAM).as_deref(), Some("3rd grade"));

    let bare = learn_url(&ChatArgs::default()).expect("url");
    assert_eq!(bare.query(), None);
}

#[test]
fn cli_parses_subcommands() {
    let cli = Cli::try_parse_from([
        "learnbot",
        "--server-url",
        "http://tutor.test",
        "quiz",
        "Fractions",
        "--grade",
        "4th grade",
    ])
    .expect("parse");

    assert_eq!(cli.server_url.as_deref(), Some("http://tutor.test"));
    match cli.command {
        Command::Quiz(lesson) => {
            assert_eq!(lesson.topic, "Fractions");
            assert_eq!(lesson.grade, Some(GradeLevel::Fourth));
        }
        other => panic!("unexpected command {other:?}"),
    }

    let cli = Cli::try_parse_from(["learnbot", "theme", "--set", "dark"]).expect("parse");
    assert!(matches!(
        cli.command,
        Command::Theme { toggle: false, set: Some(Theme::Dark) }
    ));
    assert!(Cli::try_parse_from(["learnbot", "theme", "--set", "sepia"]).is_err());
    assert!(Cli::try_parse_from(["learnbot", "chat", "--session", "abc"]).is_err());
}
