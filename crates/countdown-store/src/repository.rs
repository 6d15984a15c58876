//! The seam between the share/snapshot core and whatever owns the records.

use countdown_shared::{interchange, Countdown};

use crate::database::Database;
use crate::error::Result;

/// What the core needs from the primary store: the full record set, and a
/// way to persist a freshly imported record.
pub trait CountdownRepository {
    /// Every live countdown, archived ones included.
    fn all_countdowns(&self) -> Result<Vec<Countdown>>;

    /// Insert and commit a newly constructed countdown.
    fn persist_countdown(&self, countdown: &Countdown) -> Result<()>;
}

impl CountdownRepository for Database {
    fn all_countdowns(&self) -> Result<Vec<Countdown>> {
        self.list_countdowns()
    }

    fn persist_countdown(&self, countdown: &Countdown) -> Result<()> {
        self.insert_countdown(countdown)
    }
}

/// Decode a share locator and persist the result as a new record.
///
/// Nothing is written unless the whole locator decodes; the returned error
/// keeps the invalid-link versus unreadable-payload distinction.
pub fn import_shared<R>(repo: &R, locator: &str) -> Result<Countdown>
where
    R: CountdownRepository + ?Sized,
{
    let countdown = interchange::import_record(locator)?;
    repo.persist_countdown(&countdown)?;
    tracing::info!(id = %countdown.id, "imported shared countdown");
    Ok(countdown)
}

impl Database {
    /// See [`import_shared`].
    pub fn import_shared_countdown(&self, locator: &str) -> Result<Countdown> {
        import_shared(self, locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use chrono::{TimeZone, Utc};
    use countdown_shared::{export_locator, InterchangeError};

    #[test]
    fn test_import_persists_new_record() {
        let db = Database::open_in_memory().unwrap();
        let mut original = Countdown::new(
            "Marathon",
            Utc.with_ymd_and_hms(2030, 10, 12, 8, 0, 0).unwrap(),
            "Europe/Berlin",
        );
        original.reminder_offsets = vec![-60];
        db.insert_countdown(&original).unwrap();

        let locator = export_locator(&original).unwrap();
        let imported = db.import_shared_countdown(locator.as_str()).unwrap();

        assert_ne!(imported.id, original.id);
        let all = db.all_countdowns().unwrap();
        assert_eq!(all.len(), 2);

        let stored = db.get_countdown(imported.id).unwrap();
        assert_eq!(stored.title, "Marathon");
        assert!(stored.reminder_offsets.is_empty());
    }

    #[test]
    fn test_failed_import_writes_nothing() {
        let db = Database::open_in_memory().unwrap();

        let err = db.import_shared_countdown("https://example.com?data=abc").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Interchange(InterchangeError::InvalidLocator(_))
        ));
        assert!(db.all_countdowns().unwrap().is_empty());
    }
}
