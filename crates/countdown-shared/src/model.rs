//! The countdown record, as owned by the primary store.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::CountdownError;
use crate::types::{BackgroundStyle, CountdownId, FontStyle, PeerRef};

/// A single countdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Countdown {
    /// Stable identity, never reused.
    pub id: CountdownId,
    /// Display title, never empty.
    pub title: String,
    /// The instant being counted down to.
    pub target_at: DateTime<Utc>,
    /// IANA time zone used for display arithmetic.
    pub time_zone: String,
    pub font_style: FontStyle,
    pub background: BackgroundStyle,
    /// Hex RGB color such as `#FF8800`.
    pub color_hex: Option<String>,
    /// Opaque background image bytes.
    pub image: Option<Vec<u8>>,
    pub is_archived: bool,
    pub is_shared: bool,
    pub peers: Vec<PeerRef>,
    /// Signed minute offsets relative to `target_at`.
    pub reminder_offsets: Vec<i32>,
    pub last_edited_at: DateTime<Utc>,
}

impl Countdown {
    /// Create a fresh, unarchived countdown with a color background.
    pub fn new(
        title: impl Into<String>,
        target_at: DateTime<Utc>,
        time_zone: impl Into<String>,
    ) -> Self {
        Self {
            id: CountdownId::new(),
            title: title.into(),
            target_at,
            time_zone: time_zone.into(),
            font_style: FontStyle::Default,
            background: BackgroundStyle::Color,
            color_hex: None,
            image: None,
            is_archived: false,
            is_shared: false,
            peers: Vec::new(),
            reminder_offsets: Vec::new(),
            last_edited_at: Utc::now(),
        }
    }

    /// Check the invariants every stored or imported record must hold.
    pub fn validate(&self) -> Result<(), CountdownError> {
        if self.title.trim().is_empty() {
            return Err(CountdownError::Invalid("title is empty".into()));
        }
        if parse_time_zone(&self.time_zone).is_none() {
            return Err(CountdownError::Invalid(format!(
                "unknown time zone '{}'",
                self.time_zone
            )));
        }
        if let Some(color) = &self.color_hex {
            if !is_hex_color(color) {
                return Err(CountdownError::Invalid(format!("bad color '{color}'")));
            }
        }
        Ok(())
    }

    /// Whether the target carries a time of day other than midnight in its
    /// own time zone.
    pub fn has_custom_time(&self) -> bool {
        let tz = parse_time_zone(&self.time_zone).unwrap_or(Tz::UTC);
        let local = self.target_at.with_timezone(&tz);
        local.num_seconds_from_midnight() != 0 || local.nanosecond() != 0
    }
}

pub fn parse_time_zone(name: &str) -> Option<Tz> {
    name.parse::<Tz>().ok()
}

/// Accepts `#RRGGBB` or `RRGGBB`.
pub fn is_hex_color(s: &str) -> bool {
    let digits = s.strip_prefix('#').unwrap_or(s);
    digits.len() == 6 && hex::decode(digits).is_ok()
}
