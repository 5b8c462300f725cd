//! Session/selection state and its reconciliation with the URL and persisted preferences.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use shared::domain::{GradeLevel, Persona, SessionId, Theme};
use tracing::{debug, warn};
use url::Url;

pub const THEME_KEY: &str = "learnbot-theme";
pub const GRADE_LEVEL_KEY: &str = "learnbot-grade-level";
pub const STEP_MODE_KEY: &str = "learnbot-step-mode";

pub const SESSION_ID_PARAM: &str = "sessionId";
pub const TOPIC_PARAM: &str = "topic";
pub const GRADE_PARAM: &str = "grade";

pub const DEFAULT_STEP_MODE: bool = true;

/// The page address a session can be resumed from.
pub trait Location: Send {
    fn href(&self) -> &Url;

    /// Rewrites the address in place: no reload and no new history entry.
    fn replace_state(&mut self, url: Url);

    /// Leaves the current page for `url`.
    fn assign(&mut self, url: Url);

    fn query_param(&self, name: &str) -> Option<String> {
        self.href()
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryLocation {
    current: Url,
    history: Vec<Url>,
    navigations: usize,
}

impl MemoryLocation {
    pub fn new(url: Url) -> Self {
        Self {
            history: vec![url.clone()],
            current: url,
            navigations: 0,
        }
    }

    pub fn parse(href: &str) -> Result<Self> {
        let url = Url::parse(href).with_context(|| format!("invalid page url '{href}'"))?;
        Ok(Self::new(url))
    }

    pub fn navigations(&self) -> usize {
        self.navigations
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> &Url {
        &self.current
    }

    fn replace_state(&mut self, url: Url) {
        if let Some(top) = self.history.last_mut() {
            *top = url.clone();
        }
        self.current = url;
    }

    fn assign(&mut self, url: Url) {
        self.navigations += 1;
        self.history.push(url.clone());
        self.current = url;
    }
}

/// Returns `url` with `name` set to `value` (kept in its original position) or removed.
pub fn with_query_param(url: &Url, name: &str, value: Option<&str>) -> Url {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    match value {
        Some(value) => {
            let mut replaced = false;
            pairs.retain_mut(|(key, existing)| {
                if key != name {
                    return true;
                }
                if replaced {
                    return false;
                }
                replaced = true;
                *existing = value.to_string();
                true
            });
            if !replaced {
                pairs.push((name.to_string(), value.to_string()));
            }
        }
        None => pairs.retain(|(key, _)| key != name),
    }

    let mut next = url.clone();
    if pairs.is_empty() {
        next.set_query(None);
    } else {
        next.query_pairs_mut().clear().extend_pairs(pairs);
    }
    next
}

/// Small key/value store that survives reloads.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk, rewritten whole on every change.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferences {
    pub const FILE_NAME: &'static str = "preferences.json";

    /// A missing file starts empty. A corrupt file is ignored and later overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(values) => values,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring unreadable preferences file");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read preferences '{}'", path.display()))
            }
        };
        Ok(Self { path, values })
    }

    pub fn open_in(data_dir: &Path) -> Result<Self> {
        Self::open(data_dir.join(Self::FILE_NAME))
    }

    pub fn default_dir() -> Result<PathBuf> {
        let base = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("unable to resolve local app data dir"))?;
        Ok(base.join("learnbot"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create preferences dir '{}'", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write preferences '{}'", self.path.display()))
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let previous = self.values.insert(key.to_string(), value.to_string());
        if let Err(err) = self.flush() {
            match previous {
                Some(previous) => self.values.insert(key.to_string(), previous),
                None => self.values.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub session_id: Option<SessionId>,
    pub grade_level: GradeLevel,
    pub topic: Option<String>,
    pub persona: Persona,
    pub step_mode: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            session_id: None,
            grade_level: GradeLevel::default(),
            topic: None,
            persona: Persona::default(),
            step_mode: DEFAULT_STEP_MODE,
        }
    }
}

fn parse_step_mode(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Some(true),
        "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Owns the page's selection state. Memory, the URL and the preference store
/// agree once each setter returns.
pub struct SessionController<L: Location = MemoryLocation, P: PreferenceStore = MemoryPreferences> {
    state: SelectionState,
    location: L,
    prefs: P,
}

impl<L: Location, P: PreferenceStore> SessionController<L, P> {
    /// Page-load resolution. The URL decides session identity and may
    /// override the grade; persisted values decide grade and step mode
    /// otherwise; anything malformed counts as absent.
    pub fn resolve(location: L, prefs: P) -> Self {
        let session_id = location
            .query_param(SESSION_ID_PARAM)
            .and_then(|raw| raw.parse::<SessionId>().ok());
        let topic = non_blank(location.query_param(TOPIC_PARAM));

        let grade_level = location
            .query_param(GRADE_PARAM)
            .and_then(|raw| GradeLevel::from_label(&raw))
            .or_else(|| {
                prefs
                    .get(GRADE_LEVEL_KEY)
                    .and_then(|raw| GradeLevel::from_label(&raw))
            })
            .unwrap_or_default();

        let step_mode = prefs
            .get(STEP_MODE_KEY)
            .and_then(|raw| parse_step_mode(&raw))
            .unwrap_or(DEFAULT_STEP_MODE);

        let state = SelectionState {
            session_id,
            grade_level,
            topic,
            persona: Persona::default(),
            step_mode,
        };
        debug!(?state, "resolved selection state");

        Self {
            state,
            location,
            prefs,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.state.session_id
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut L {
        &mut self.location
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn set_session_id(&mut self, session_id: Option<SessionId>) {
        self.state.session_id = session_id;
        let value = session_id.map(|id| id.to_string());
        self.replace_param(SESSION_ID_PARAM, value.as_deref());
    }

    pub fn set_topic(&mut self, topic: Option<String>) {
        self.state.topic = non_blank(topic);
        let value = self.state.topic.clone();
        self.replace_param(TOPIC_PARAM, value.as_deref());
    }

    /// Persists first so a failed write leaves memory untouched.
    pub fn set_grade_level(&mut self, grade_level: GradeLevel) -> Result<()> {
        self.prefs.set(GRADE_LEVEL_KEY, grade_level.label())?;
        self.state.grade_level = grade_level;
        if self.location.query_param(GRADE_PARAM).is_some() {
            self.replace_param(GRADE_PARAM, Some(grade_level.label()));
        }
        Ok(())
    }

    pub fn set_step_mode(&mut self, step_mode: bool) -> Result<()> {
        self.prefs
            .set(STEP_MODE_KEY, if step_mode { "true" } else { "false" })?;
        self.state.step_mode = step_mode;
        Ok(())
    }

    pub fn set_persona(&mut self, persona: Persona) {
        self.state.persona = persona;
    }

    fn replace_param(&mut self, name: &str, value: Option<&str>) {
        let next = with_query_param(self.location.href(), name, value);
        if &next != self.location.href() {
            self.location.replace_state(next);
        }
    }
}

/// Light/dark toggle persisted under [`THEME_KEY`].
pub struct ThemeController<P: PreferenceStore = MemoryPreferences> {
    theme: Theme,
    prefs: P,
}

impl<P: PreferenceStore> ThemeController<P> {
    /// Saved choice, then the system preference, then light.
    pub fn resolve(prefs: P, system_prefers_dark: bool) -> Self {
        let theme = prefs
            .get(THEME_KEY)
            .and_then(|raw| Theme::from_label(&raw))
            .unwrap_or(if system_prefers_dark {
                Theme::Dark
            } else {
                Theme::Light
            });
        Self { theme, prefs }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.prefs.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
