use super::*;

fn learn_location(query: &str) -> MemoryLocation {
    MemoryLocation::parse(&format!("http://localhost:8080/learn{query}")).expect("url")
}

#[test]
fn url_params_decide_session_identity() {
    let controller = SessionController::resolve(
        learn_location("?sessionId=42&topic=Fractions"),
        MemoryPreferences::new(),
    );

    assert_eq!(controller.session_id(), Some(SessionId(42)));
    assert_eq!(controller.state().topic.as_deref(), Some("Fractions"));
}

#[test]
fn percent_encoded_topic_is_decoded() {
    let controller = SessionController::resolve(
        learn_location("?topic=Telling%20time"),
        MemoryPreferences::new(),
    );
    assert_eq!(controller.state().topic.as_deref(), Some("Telling time"));
}

#[test]
fn malformed_params_fall_back_to_defaults() {
    let controller = SessionController::resolve(
        learn_location("?sessionId=abc&topic=%20%20&grade=12th"),
        MemoryPreferences::new(),
    );

    assert_eq!(controller.state(), &SelectionState::default());
    assert!(controller.state().step_mode);
    assert_eq!(controller.state().grade_level, GradeLevel::First);
}

#[test]
fn persisted_preferences_apply_without_url_override() {
    let prefs = MemoryPreferences::new()
        .with(GRADE_LEVEL_KEY, "4th grade")
        .with(STEP_MODE_KEY, "false");
    let controller = SessionController::resolve(learn_location(""), prefs);

    assert_eq!(controller.state().grade_level, GradeLevel::Fourth);
    assert!(!controller.state().step_mode);
}

#[test]
fn url_grade_overrides_persisted_grade() {
    let prefs = MemoryPreferences::new().with(GRADE_LEVEL_KEY, "4th grade");
    let controller =
        SessionController::resolve(learn_location("?sessionId=3&grade=2nd%20grade"), prefs);

    assert_eq!(controller.state().grade_level, GradeLevel::Second);
}

#[test]
fn corrupt_persisted_values_are_ignored() {
    let prefs = MemoryPreferences::new()
        .with(GRADE_LEVEL_KEY, "grade nine")
        .with(STEP_MODE_KEY, "maybe");
    let controller = SessionController::resolve(learn_location(""), prefs);

    assert_eq!(controller.state().grade_level, GradeLevel::default());
    assert_eq!(controller.state().step_mode, DEFAULT_STEP_MODE);
}

#[test]
fn set_session_id_rewrites_url_without_navigation() {
    let mut controller =
        SessionController::resolve(learn_location("?topic=Shapes"), MemoryPreferences::new());

    controller.set_session_id(Some(SessionId(42)));

    let location = controller.location();
    assert_eq!(
        location.query_param(SESSION_ID_PARAM).as_deref(),
        Some("42")
    );
    assert_eq!(location.query_param(TOPIC_PARAM).as_deref(), Some("Shapes"));
    assert_eq!(location.navigations(), 0);
    assert_eq!(location.history_len(), 1);
    assert_eq!(controller.session_id(), Some(SessionId(42)));
}

#[test]
fn clearing_session_id_removes_the_param() {
    let mut controller =
        SessionController::resolve(learn_location("?sessionId=9"), MemoryPreferences::new());

    controller.set_session_id(None);

    assert_eq!(controller.session_id(), None);
    assert_eq!(controller.location().href().query(), None);
    assert_eq!(controller.location().navigations(), 0);
}

#[test]
fn replacing_a_param_keeps_its_position() {
    let url = Url::parse("http://localhost/learn?sessionId=1&topic=Money").expect("url");
    let next = with_query_param(&url, SESSION_ID_PARAM, Some("2"));
    assert_eq!(next.query(), Some("sessionId=2&topic=Money"));

    let removed = with_query_param(&next, TOPIC_PARAM, None);
    assert_eq!(removed.query(), Some("sessionId=2"));
}

#[test]
fn grade_and_step_mode_are_persisted() {
    let mut controller = SessionController::resolve(learn_location(""), MemoryPreferences::new());

    controller
        .set_grade_level(GradeLevel::Third)
        .expect("persist grade");
    controller.set_step_mode(false).expect("persist step mode");

    assert_eq!(
        controller.prefs().get(GRADE_LEVEL_KEY).as_deref(),
        Some("3rd grade")
    );
    assert_eq!(controller.prefs().get(STEP_MODE_KEY).as_deref(), Some("false"));
    assert_eq!(controller.state().grade_level, GradeLevel::Third);
    assert!(!controller.state().step_mode);
}

#[test]
fn grade_change_updates_an_existing_url_override() {
    let mut controller = SessionController::resolve(
        learn_location("?grade=1st%20grade"),
        MemoryPreferences::new(),
    );

    controller
        .set_grade_level(GradeLevel::Fifth)
        .expect("persist grade");

    assert_eq!(
        controller.location().query_param(GRADE_PARAM).as_deref(),
        Some("5th grade")
    );
}

#[test]
fn file_preferences_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join(FilePreferences::FILE_NAME);

    let mut prefs = FilePreferences::open(&path).expect("open");
    assert_eq!(prefs.get(THEME_KEY), None);
    prefs.set(THEME_KEY, "dark").expect("set");
    prefs.set(STEP_MODE_KEY, "false").expect("set");

    let reopened = FilePreferences::open(&path).expect("reopen");
    assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("dark"));
    assert_eq!(reopened.get(STEP_MODE_KEY).as_deref(), Some("false"));
}

#[test]
fn corrupt_preferences_file_starts_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(FilePreferences::FILE_NAME);
    fs::write(&path, "{not json").expect("write");

    let prefs = FilePreferences::open(&path).expect("open");
    assert_eq!(prefs.get(THEME_KEY), None);
}

#[test]
fn theme_prefers_saved_then_system_then_light() {
    let saved = ThemeController::resolve(MemoryPreferences::new().with(THEME_KEY, "light"), true);
    assert_eq!(saved.theme(), Theme::Light);

    let system = ThemeController::resolve(MemoryPreferences::new(), true);
    assert_eq!(system.theme(), Theme::Dark);

    let fallback = ThemeController::resolve(MemoryPreferences::new(), false);
    assert_eq!(fallback.theme(), Theme::Light);
}

#[test]
fn theme_toggle_persists_choice() {
    let mut controller = ThemeController::resolve(MemoryPreferences::new(), false);

    let next = controller.toggle().expect("toggle");

    assert_eq!(next, Theme::Dark);
    assert_eq!(controller.prefs().get(THEME_KEY).as_deref(), Some("dark"));
}
