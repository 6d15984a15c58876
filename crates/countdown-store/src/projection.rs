//! The snapshot projector.
//!
//! Companion processes cannot open the database, so after every mutation the
//! app hands the full record set to [`ProjectionService::refresh_projection`],
//! which keeps the soonest few countdowns, shrinks their images and replaces
//! the projection file in the shared container.
//!
//! The projection is a read replica. Refreshes that race each other may land
//! out of order; whichever rename happens last wins, and the next mutation
//! rewrites it anyway.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use countdown_shared::constants::PROJECTION_FILE_NAME;
use countdown_shared::thumbnail::make_thumbnail;
use countdown_shared::{BackgroundStyle, Countdown, CountdownId, FontStyle};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::bridge::SharedContainer;
use crate::config::StorageConfig;
use crate::error::Result;

/// One countdown as seen by widgets and complications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionEntry {
    pub id: CountdownId,
    pub title: String,
    pub target_at: DateTime<Utc>,
    pub time_zone: String,
    pub has_custom_time: bool,
    /// Color hex, `"image"` or `"default"`.
    pub theme: String,
    pub has_image: bool,
    /// Base64 JPEG, longer edge at most 256px.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub last_edited_at: DateTime<Utc>,
    #[serde(default)]
    pub font_style: FontStyle,
}

impl ProjectionEntry {
    pub fn from_countdown(countdown: &Countdown) -> Self {
        let image = countdown.image.as_deref().filter(|bytes| !bytes.is_empty());

        let thumbnail = image.and_then(|bytes| match make_thumbnail(bytes) {
            Ok(thumb) => Some(thumb.to_base64()),
            Err(e) => {
                debug!(id = %countdown.id, error = %e, "skipping thumbnail");
                None
            }
        });

        Self {
            id: countdown.id,
            title: countdown.title.clone(),
            target_at: countdown.target_at,
            time_zone: countdown.time_zone.clone(),
            has_custom_time: countdown.has_custom_time(),
            theme: theme_tag(countdown),
            has_image: image.is_some(),
            thumbnail,
            last_edited_at: countdown.last_edited_at,
            font_style: countdown.font_style,
        }
    }
}

fn theme_tag(countdown: &Countdown) -> String {
    match (countdown.background, &countdown.color_hex) {
        (BackgroundStyle::Image, _) => "image".to_string(),
        (BackgroundStyle::Color, Some(hex)) => hex.clone(),
        (BackgroundStyle::Color, None) => "default".to_string(),
    }
}

/// Pick the `limit` soonest countdowns and derive their entries.
///
/// Ties on the target instant are broken by id so the output only depends
/// on the input set, not its order.
pub fn project(records: &[Countdown], limit: usize) -> Vec<ProjectionEntry> {
    let mut sorted: Vec<&Countdown> = records.iter().collect();
    sorted.sort_by(|a, b| a.target_at.cmp(&b.target_at).then_with(|| a.id.cmp(&b.id)));

    sorted
        .into_iter()
        .take(limit)
        .map(ProjectionEntry::from_countdown)
        .collect()
}

/// Project `records` and replace the projection file. Returns the number of
/// entries written.
pub fn write_projection(
    container: &SharedContainer,
    records: &[Countdown],
    limit: usize,
) -> Result<usize> {
    let entries = project(records, limit);
    container.write_json(PROJECTION_FILE_NAME, &entries)?;
    Ok(entries.len())
}

/// Read the projection file; empty when missing or unreadable.
pub fn read_projection(container: &SharedContainer) -> Vec<ProjectionEntry> {
    container.read_list(PROJECTION_FILE_NAME)
}

/// Runs projections off the caller's task.
#[derive(Debug, Clone)]
pub struct ProjectionService {
    container: Arc<SharedContainer>,
    limit: usize,
}

impl ProjectionService {
    pub fn new(container: SharedContainer, limit: usize) -> Self {
        Self {
            container: Arc::new(container),
            limit,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let container = SharedContainer::resolve(config)?;
        Ok(Self::new(container, config.projection_limit))
    }

    pub fn container(&self) -> &SharedContainer {
        &self.container
    }

    /// Recompute and rewrite the projection on a blocking worker thread.
    ///
    /// Fire-and-forget: failures are logged and never reach the caller. The
    /// handle may be dropped; awaiting it only tells you the run is over.
    /// Returns `None` (and skips the refresh) outside a tokio runtime.
    pub fn refresh_projection(&self, records: Vec<Countdown>) -> Option<JoinHandle<()>> {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "no async runtime, projection refresh skipped");
                return None;
            }
        };

        let container = Arc::clone(&self.container);
        let limit = self.limit;

        Some(runtime.spawn_blocking(move || {
            match write_projection(&container, &records, limit) {
                Ok(count) => info!(
                    entries = count,
                    shared = container.is_shared(),
                    "projection refreshed"
                ),
                Err(e) => error!(error = %e, "projection refresh failed"),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use image::{ImageBuffer, ImageFormat, Rgb};
    use tempfile::TempDir;

    fn at(days: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, 0, 0, 0).unwrap() + Duration::days(days)
    }

    fn countdown(title: &str, days: i64) -> Countdown {
        let mut c = Countdown::new(title, at(days), "UTC");
        c.last_edited_at = at(-100);
        c
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, _| Rgb([(x % 256) as u8, 10, 200]));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    fn service() -> (ProjectionService, TempDir) {
        let dir = TempDir::new().unwrap();
        let container = SharedContainer::at(dir.path().join("shared"), true).unwrap();
        (ProjectionService::new(container, 5), dir)
    }

    #[test]
    fn test_empty_input_projects_empty_list() {
        assert!(project(&[], 5).is_empty());
    }

    #[test]
    fn test_single_record() {
        let entries = project(&[countdown("Solo", 3)], 5);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Solo");
    }

    #[test]
    fn test_sorted_ascending_regardless_of_input_order() {
        let records = vec![countdown("T3", 30), countdown("T1", 1), countdown("T2", 10)];
        let titles: Vec<_> = project(&records, 5).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn test_capped_at_limit() {
        let records: Vec<_> = (0..9).rev().map(|d| countdown(&format!("D{d}"), d)).collect();
        let entries = project(&records, 5);
        assert_eq!(entries.len(), 5);
        let titles: Vec<_> = entries.into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["D0", "D1", "D2", "D3", "D4"]);
    }

    #[test]
    fn test_archived_records_are_included() {
        let mut archived = countdown("Archived", 1);
        archived.is_archived = true;
        let entries = project(&[archived, countdown("Live", 2)], 5);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Archived");
    }

    #[test]
    fn test_theme_and_flags() {
        let mut colored = countdown("Colored", 1);
        colored.color_hex = Some("#FF8800".into());
        colored.target_at += Duration::hours(9);

        let mut pictured = countdown("Pictured", 2);
        pictured.background = BackgroundStyle::Image;
        pictured.image = Some(jpeg(800, 600));

        let entries = project(&[colored, pictured, countdown("Plain", 3)], 5);

        assert_eq!(entries[0].theme, "#FF8800");
        assert!(entries[0].has_custom_time);
        assert!(!entries[0].has_image);
        assert!(entries[0].thumbnail.is_none());

        assert_eq!(entries[1].theme, "image");
        assert!(!entries[1].has_custom_time);
        assert!(entries[1].has_image);
        assert!(entries[1].thumbnail.is_some());

        assert_eq!(entries[2].theme, "default");
    }

    #[test]
    fn test_thumbnail_is_bounded_jpeg() {
        use base64::Engine;

        let mut c = countdown("Big picture", 1);
        c.background = BackgroundStyle::Image;
        c.image = Some(jpeg(1200, 900));

        let entry = ProjectionEntry::from_countdown(&c);
        let encoded = entry.thumbnail.expect("thumbnail expected");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        let thumb = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (256, 192));
    }

    #[test]
    fn test_bad_image_omits_thumbnail_only() {
        let mut c = countdown("Broken picture", 1);
        c.background = BackgroundStyle::Image;
        c.image = Some(b"not really a picture".to_vec());

        let entry = ProjectionEntry::from_countdown(&c);
        assert!(entry.has_image);
        assert!(entry.thumbnail.is_none());
        assert_eq!(entry.title, "Broken picture");
    }

    #[test]
    fn test_write_is_idempotent() {
        let (service, _dir) = service();
        let mut pictured = countdown("Pictured", 2);
        pictured.image = Some(jpeg(300, 300));
        let records = vec![countdown("A", 5), pictured, countdown("B", 1)];

        write_projection(service.container(), &records, 5).unwrap();
        let first = std::fs::read(service.container().path_of(PROJECTION_FILE_NAME)).unwrap();

        let mut reversed = records.clone();
        reversed.reverse();
        write_projection(service.container(), &reversed, 5).unwrap();
        let second = std::fs::read(service.container().path_of(PROJECTION_FILE_NAME)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_read_back() {
        let (service, _dir) = service();
        let records = vec![countdown("One", 1), countdown("Two", 2)];
        write_projection(service.container(), &records, 5).unwrap();

        let entries = read_projection(service.container());
        assert_eq!(entries, project(&records, 5));
    }

    #[tokio::test]
    async fn test_refresh_writes_file() {
        let (service, _dir) = service();
        service
            .refresh_projection(vec![countdown("Async", 4)])
            .expect("inside a runtime")
            .await
            .unwrap();

        let entries = read_projection(service.container());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Async");
    }

    #[tokio::test]
    async fn test_refresh_with_no_records_writes_empty_list() {
        let (service, _dir) = service();
        service
            .refresh_projection(Vec::new())
            .expect("inside a runtime")
            .await
            .unwrap();

        let raw = std::fs::read_to_string(service.container().path_of(PROJECTION_FILE_NAME)).unwrap();
        assert_eq!(raw.trim(), "[]");
    }

    #[test]
    fn test_refresh_outside_runtime_is_skipped() {
        let (service, _dir) = service();
        assert!(service
            .refresh_projection(vec![countdown("Sync caller", 1)])
            .is_none());
        assert!(!service.container().path_of(PROJECTION_FILE_NAME).exists());
    }
}
