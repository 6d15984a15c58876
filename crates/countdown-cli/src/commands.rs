use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use countdown_shared::{export_locator, BackgroundStyle, Countdown, CountdownId, FontStyle};
use countdown_store::{
    CompanionReader, CountdownRepository, Database, ProjectionService, StorageConfig,
};
use tracing::{info, warn};

/// Fields collected by `add` before they become a [`Countdown`].
#[derive(Debug)]
pub struct Draft {
    pub title: String,
    pub at: String,
    pub time_zone: String,
    pub font: String,
    pub color: Option<String>,
    pub image: Option<PathBuf>,
    pub reminders: Vec<i32>,
}

impl Draft {
    fn into_countdown(self) -> Result<Countdown> {
        let target_at = parse_target(&self.at)?;
        let font_style = parse_font(&self.font)?;

        let mut countdown = Countdown::new(self.title, target_at, self.time_zone);
        countdown.font_style = font_style;
        countdown.color_hex = self.color;
        countdown.reminder_offsets = self.reminders;

        if let Some(path) = self.image {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            countdown.background = BackgroundStyle::Image;
            countdown.image = Some(bytes);
        }

        countdown.validate()?;
        Ok(countdown)
    }
}

fn parse_target(s: &str) -> Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("'{s}' is not an RFC 3339 timestamp"))?;
    Ok(dt.with_timezone(&Utc))
}

fn parse_font(s: &str) -> Result<FontStyle> {
    let font = FontStyle::from_tag(s);
    if font.as_tag() != s {
        bail!("unknown font style '{s}'");
    }
    Ok(font)
}

fn parse_id(s: &str) -> Result<CountdownId> {
    CountdownId::parse(s).with_context(|| format!("'{s}' is not a countdown id"))
}

/// Re-run the projection after a mutation. The mutation has already been
/// committed, so nothing here is allowed to fail the command.
async fn refresh_after_mutation(config: &StorageConfig, db: &Database) {
    let records = match db.all_countdowns() {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "could not load countdowns for projection");
            return;
        }
    };

    let service = match ProjectionService::from_config(config) {
        Ok(service) => service,
        Err(e) => {
            warn!(error = %e, "could not resolve projection storage");
            return;
        }
    };

    if let Some(handle) = service.refresh_projection(records) {
        if let Err(e) = handle.await {
            warn!(error = %e, "projection task did not complete");
        }
    }
}

pub async fn add(config: &StorageConfig, draft: Draft) -> Result<()> {
    let db = Database::new(config)?;
    let countdown = draft.into_countdown()?;
    db.insert_countdown(&countdown)?;
    info!(id = %countdown.id, "countdown created");
    println!("{}", countdown.id);

    refresh_after_mutation(config, &db).await;
    Ok(())
}

pub fn list(config: &StorageConfig, include_archived: bool) -> Result<()> {
    let db = Database::new(config)?;
    let countdowns = if include_archived {
        db.list_countdowns()?
    } else {
        db.list_active_countdowns()?
    };

    for c in countdowns {
        let archived = if c.is_archived { " [archived]" } else { "" };
        println!(
            "{}  {}  {} ({}){}",
            c.id,
            c.target_at.to_rfc3339(),
            c.title,
            c.time_zone,
            archived
        );
    }
    Ok(())
}

pub fn export(config: &StorageConfig, id: &str) -> Result<()> {
    let db = Database::new(config)?;
    let countdown = db.get_countdown(parse_id(id)?)?;

    match export_locator(&countdown) {
        Some(url) => {
            println!("{url}");
            Ok(())
        }
        None => bail!("Could not create a share link for this countdown"),
    }
}

pub async fn import(config: &StorageConfig, locator: &str) -> Result<()> {
    let db = Database::new(config)?;
    let countdown = db.import_shared_countdown(locator)?;
    println!("{}", countdown.id);

    refresh_after_mutation(config, &db).await;
    Ok(())
}

pub async fn archive(config: &StorageConfig, id: &str, archived: bool) -> Result<()> {
    let db = Database::new(config)?;
    if !db.set_archived(parse_id(id)?, archived)? {
        bail!("No countdown with id {id}");
    }

    refresh_after_mutation(config, &db).await;
    Ok(())
}

pub async fn delete(config: &StorageConfig, id: &str) -> Result<()> {
    let db = Database::new(config)?;
    if !db.delete_countdown(parse_id(id)?)? {
        bail!("No countdown with id {id}");
    }

    refresh_after_mutation(config, &db).await;
    Ok(())
}

pub async fn refresh(config: &StorageConfig) -> Result<()> {
    let db = Database::new(config)?;
    refresh_after_mutation(config, &db).await;
    Ok(())
}

pub fn widget(config: &StorageConfig, ids: &[String]) -> Result<()> {
    let reader = CompanionReader::open(config);
    let entities = if ids.is_empty() {
        reader.fetch_all()
    } else {
        let ids = ids
            .iter()
            .map(|s| parse_id(s))
            .collect::<Result<Vec<_>>>()?;
        reader.fetch_by_ids(&ids)
    };

    println!("{}", serde_json::to_string_pretty(&entities)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Draft {
        Draft {
            title: "Concert".into(),
            at: "2030-08-15T20:30:00+02:00".into(),
            time_zone: "Europe/Madrid".into(),
            font: "rounded".into(),
            color: Some("#AA00FF".into()),
            image: None,
            reminders: vec![-120],
        }
    }

    #[test]
    fn test_draft_into_countdown() {
        let c = draft().into_countdown().unwrap();
        assert_eq!(c.target_at.to_rfc3339(), "2030-08-15T18:30:00+00:00");
        assert_eq!(c.font_style, FontStyle::Rounded);
        assert_eq!(c.reminder_offsets, vec![-120]);
        assert_eq!(c.background, BackgroundStyle::Color);
    }

    #[test]
    fn test_draft_rejects_unknown_font() {
        let mut d = draft();
        d.font = "gothic".into();
        assert!(d.into_countdown().is_err());
    }

    #[test]
    fn test_draft_rejects_bad_timestamp() {
        let mut d = draft();
        d.at = "next tuesday".into();
        assert!(d.into_countdown().is_err());
    }

    #[test]
    fn test_draft_reads_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let mut d = draft();
        d.color = None;
        d.image = Some(path);
        let c = d.into_countdown().unwrap();
        assert_eq!(c.background, BackgroundStyle::Image);
        assert_eq!(c.image, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_add_then_widget_sees_it() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: Some(dir.path().join("local")),
            shared_dir: Some(dir.path().join("group")),
            ..StorageConfig::default()
        };

        add(&config, draft()).await.unwrap();

        let all = CompanionReader::open(&config).fetch_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Concert");
    }
}
