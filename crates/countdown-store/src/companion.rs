//! Read side used by companion processes (widgets, complications).
//!
//! Companions read the same projection file the app writes; they never
//! touch the database and never derive thumbnails. When nothing has been
//! written yet, or the shared container is unavailable, they get a single
//! placeholder so they never render empty.

use chrono::{DateTime, Duration, Utc};
use countdown_shared::constants::{PLACEHOLDER_DAYS_AHEAD, PLACEHOLDER_TITLE};
use countdown_shared::{CountdownId, FontStyle};
use serde::{Deserialize, Serialize};

use crate::bridge::SharedContainer;
use crate::config::StorageConfig;
use crate::projection::{read_projection, ProjectionEntry};

/// The companion's picker/query model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionEntity {
    pub id: CountdownId,
    pub title: String,
    pub target_at: DateTime<Utc>,
    pub time_zone: String,
    pub font_style: FontStyle,
}

impl From<&ProjectionEntry> for CompanionEntity {
    fn from(entry: &ProjectionEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            target_at: entry.target_at,
            time_zone: entry.time_zone.clone(),
            font_style: entry.font_style,
        }
    }
}

impl CompanionEntity {
    /// Stand-in shown before any countdown exists.
    pub fn placeholder(now: DateTime<Utc>, time_zone: &str) -> Self {
        Self {
            id: CountdownId::nil(),
            title: PLACEHOLDER_TITLE.to_string(),
            target_at: now + Duration::days(PLACEHOLDER_DAYS_AHEAD),
            time_zone: time_zone.to_string(),
            font_style: FontStyle::Default,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == CountdownId::nil()
    }
}

#[derive(Debug, Clone)]
pub struct CompanionReader {
    container: Option<SharedContainer>,
    device_time_zone: String,
}

impl CompanionReader {
    /// Open the shared container only; a companion has no private copy of
    /// the app's data to fall back to.
    pub fn open(config: &StorageConfig) -> Self {
        let container = SharedContainer::open_existing(config);
        if container.is_none() {
            tracing::info!("no shared container, companion will show placeholder");
        }
        Self::with_container(container, config.device_time_zone.clone())
    }

    pub fn with_container(container: Option<SharedContainer>, device_time_zone: String) -> Self {
        Self {
            container,
            device_time_zone,
        }
    }

    fn entries(&self) -> Vec<ProjectionEntry> {
        self.container
            .as_ref()
            .map(read_projection)
            .unwrap_or_default()
    }

    pub fn placeholder(&self, now: DateTime<Utc>) -> CompanionEntity {
        CompanionEntity::placeholder(now, &self.device_time_zone)
    }

    /// Every known countdown, or just the placeholder if there are none.
    pub fn fetch_all(&self) -> Vec<CompanionEntity> {
        self.fetch_all_at(Utc::now())
    }

    pub fn fetch_all_at(&self, now: DateTime<Utc>) -> Vec<CompanionEntity> {
        let entries = self.entries();
        if entries.is_empty() {
            return vec![self.placeholder(now)];
        }
        entries.iter().map(CompanionEntity::from).collect()
    }

    /// Countdowns whose id is in `ids`, in projection order. Falls back to
    /// the placeholder only when there is no data at all.
    pub fn fetch_by_ids(&self, ids: &[CountdownId]) -> Vec<CompanionEntity> {
        self.fetch_by_ids_at(ids, Utc::now())
    }

    pub fn fetch_by_ids_at(
        &self,
        ids: &[CountdownId],
        now: DateTime<Utc>,
    ) -> Vec<CompanionEntity> {
        let entries = self.entries();
        if entries.is_empty() {
            return vec![self.placeholder(now)];
        }
        entries
            .iter()
            .filter(|entry| ids.contains(&entry.id))
            .map(CompanionEntity::from)
            .collect()
    }
}
