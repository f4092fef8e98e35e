mod duration;
mod parse;
mod types;

pub use duration::{format_minutes, parse_duration_text, parse_numeric_field};
pub use parse::{PageDataError, page_data_from_value, parse_page_data};
pub use types::{
    ICON_FALLBACK, ICON_PRIMARY, PageData, Profile, RowAction, Session, SessionType,
    eligible_other_profile, view_actions,
};
