use serde::Deserialize;
use time::macros::format_description;
use time::{Date, Time};

/// Fixed glyphs for the icon cell. The primary glyph stands in for a
/// loadable icon reference; anything unusable falls back to the default,
/// recomputed on every render so the substitution survives cell rewrites.
pub const ICON_PRIMARY: &str = "◆";
pub const ICON_FALLBACK: &str = "·";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Active,
    Idle,
}

impl SessionType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Idle => "idle",
        }
    }
}

fn default_session_type() -> SessionType {
    SessionType::Active
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub game_name: String,
    #[serde(default)]
    pub icon_path: String,
    pub duration_minutes: u32,
    pub start_date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type", default = "default_session_type")]
    pub session_type: SessionType,
}

impl Session {
    /// Icon glyph for this record; unusable references draw the fallback.
    pub fn icon_glyph(&self) -> &'static str {
        if self.icon_path.trim().is_empty() {
            ICON_FALLBACK
        } else {
            ICON_PRIMARY
        }
    }

    pub fn start_date_key(&self) -> Option<Date> {
        parse_date(&self.start_date)
    }

    pub fn start_time_key(&self) -> Option<Time> {
        parse_time(&self.start_time)
    }

    pub fn end_time_key(&self) -> Option<Time> {
        parse_time(&self.end_time)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
}

/// The fully materialized collections the backend renders a page from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageData {
    pub sessions: Vec<Session>,
    pub profiles: Vec<Profile>,
    pub current_profile_id: Option<i64>,
}

/// The profile a session can be reassigned to: the first profile whose id
/// differs from the current one. Only offered when the current profile is
/// known and more than one profile exists. With three or more profiles the
/// target is deterministic but may not be the one the user would pick;
/// that first-match behavior is kept as-is.
pub fn eligible_other_profile(profiles: &[Profile], current: Option<i64>) -> Option<&Profile> {
    let current = current?;
    if profiles.len() < 2 {
        return None;
    }
    profiles.iter().find(|profile| profile.id != current)
}

/// Logical gestures a row responds to. Gesture dispatch resolves through
/// this enum rather than matching on rendered labels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowAction {
    Edit,
    Save,
    Cancel,
    Delete,
    ConvertToActive,
    SwitchProfile,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Save => "save",
            Self::Cancel => "cancel",
            Self::Delete => "delete",
            Self::ConvertToActive => "convert",
            Self::SwitchProfile => "switch",
        }
    }
}

/// The view-mode action set for a row, derived from the session type.
/// Idle rows can be converted to active; active rows can be handed to the
/// other profile when one is eligible. Neither set ever contains the other
/// type's action.
pub fn view_actions(session_type: SessionType, switch_available: bool) -> Vec<RowAction> {
    match session_type {
        SessionType::Idle => vec![RowAction::Edit, RowAction::ConvertToActive, RowAction::Delete],
        SessionType::Active if switch_available => {
            vec![RowAction::Edit, RowAction::SwitchProfile, RowAction::Delete]
        }
        SessionType::Active => vec![RowAction::Edit, RowAction::Delete],
    }
}

fn parse_date(text: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(text.trim(), &format).ok()
}

fn parse_time(text: &str) -> Option<Time> {
    let trimmed = text.trim();
    let with_seconds = format_description!("[hour]:[minute]:[second]");
    if let Ok(time) = Time::parse(trimmed, &with_seconds) {
        return Some(time);
    }
    let without_seconds = format_description!("[hour]:[minute]");
    Time::parse(trimmed, &without_seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: i64, name: &str) -> Profile {
        Profile {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn other_profile_requires_known_current_and_a_second_profile() {
        let one = vec![profile(1, "Family")];
        assert_eq!(eligible_other_profile(&one, Some(1)), None);

        let two = vec![profile(1, "Family"), profile(2, "Guest")];
        assert_eq!(eligible_other_profile(&two, None), None);
        assert_eq!(eligible_other_profile(&two, Some(1)), Some(&two[1]));
    }

    #[test]
    fn other_profile_is_first_non_current_even_with_three() {
        let three = vec![profile(1, "A"), profile(2, "B"), profile(3, "C")];
        assert_eq!(eligible_other_profile(&three, Some(1)), Some(&three[1]));
        assert_eq!(eligible_other_profile(&three, Some(2)), Some(&three[0]));
    }

    #[test]
    fn idle_actions_never_include_switch() {
        let actions = view_actions(SessionType::Idle, true);
        assert!(!actions.contains(&RowAction::SwitchProfile));
        assert!(actions.contains(&RowAction::ConvertToActive));
    }

    #[test]
    fn active_actions_never_include_convert() {
        for switch_available in [false, true] {
            let actions = view_actions(SessionType::Active, switch_available);
            assert!(!actions.contains(&RowAction::ConvertToActive));
            assert_eq!(actions.contains(&RowAction::SwitchProfile), switch_available);
        }
    }

    #[test]
    fn date_and_time_keys_parse_or_default() {
        let session = Session {
            id: "s1".to_string(),
            game_name: "Portal".to_string(),
            icon_path: "resources/images/portal.png".to_string(),
            duration_minutes: 95,
            start_date: "2026-08-20".to_string(),
            start_time: "21:40".to_string(),
            end_time: "23:15:30".to_string(),
            session_type: SessionType::Active,
        };
        assert!(session.start_date_key().is_some());
        assert!(session.start_time_key().is_some());
        assert!(session.end_time_key().is_some());
        assert_eq!(session.icon_glyph(), ICON_PRIMARY);

        let mut blank = session.clone();
        blank.start_date = "yesterday".to_string();
        blank.icon_path = "  ".to_string();
        assert!(blank.start_date_key().is_none());
        assert_eq!(blank.icon_glyph(), ICON_FALLBACK);
    }
}
