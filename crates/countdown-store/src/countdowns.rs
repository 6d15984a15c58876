//! CRUD operations for [`Countdown`] records.

use chrono::{DateTime, SecondsFormat, Utc};
use countdown_shared::{BackgroundStyle, Countdown, CountdownId, FontStyle, PeerRef};
use rusqlite::{params, Connection};

use crate::database::Database;
use crate::error::{Result, StoreError};

const SELECT_COLUMNS: &str = "SELECT id, title, target_at, time_zone, font_style, background,
            color_hex, image, is_archived, is_shared, last_edited_at
     FROM countdowns";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new countdown together with its reminders and peers.
    pub fn insert_countdown(&self, countdown: &Countdown) -> Result<()> {
        countdown.validate()?;

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO countdowns (id, title, target_at, time_zone, font_style, background,
                                     color_hex, image, is_archived, is_shared, last_edited_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                countdown.id.to_string(),
                countdown.title,
                timestamp(&countdown.target_at),
                countdown.time_zone,
                countdown.font_style.as_tag(),
                countdown.background.as_tag(),
                countdown.color_hex,
                countdown.image.as_deref(),
                countdown.is_archived as i32,
                countdown.is_shared as i32,
                timestamp(&countdown.last_edited_at),
            ],
        )?;
        write_children(&tx, countdown)?;
        tx.commit()?;

        tracing::debug!(id = %countdown.id, "inserted countdown");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single countdown by id.
    pub fn get_countdown(&self, id: CountdownId) -> Result<Countdown> {
        let mut countdown = self
            .conn()
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.to_string()],
                row_to_countdown,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;
        load_children(self.conn(), &mut countdown)?;
        Ok(countdown)
    }

    /// List every countdown, archived included, ordered by target ascending.
    pub fn list_countdowns(&self) -> Result<Vec<Countdown>> {
        self.query_countdowns(&format!("{SELECT_COLUMNS} ORDER BY target_at ASC, id ASC"))
    }

    /// List countdowns that are not archived, ordered by target ascending.
    pub fn list_active_countdowns(&self) -> Result<Vec<Countdown>> {
        self.query_countdowns(&format!(
            "{SELECT_COLUMNS} WHERE is_archived = 0 ORDER BY target_at ASC, id ASC"
        ))
    }

    fn query_countdowns(&self, sql: &str) -> Result<Vec<Countdown>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map([], row_to_countdown)?;

        let mut countdowns = Vec::new();
        for row in rows {
            let mut countdown = row?;
            load_children(self.conn(), &mut countdown)?;
            countdowns.push(countdown);
        }
        Ok(countdowns)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace a stored countdown with `countdown`, matched by id.
    pub fn update_countdown(&self, countdown: &Countdown) -> Result<()> {
        countdown.validate()?;

        let tx = self.conn().unchecked_transaction()?;
        let affected = tx.execute(
            "UPDATE countdowns
             SET title = ?2, target_at = ?3, time_zone = ?4, font_style = ?5, background = ?6,
                 color_hex = ?7, image = ?8, is_archived = ?9, is_shared = ?10,
                 last_edited_at = ?11
             WHERE id = ?1",
            params![
                countdown.id.to_string(),
                countdown.title,
                timestamp(&countdown.target_at),
                countdown.time_zone,
                countdown.font_style.as_tag(),
                countdown.background.as_tag(),
                countdown.color_hex,
                countdown.image.as_deref(),
                countdown.is_archived as i32,
                countdown.is_shared as i32,
                timestamp(&countdown.last_edited_at),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        let id = countdown.id.to_string();
        tx.execute("DELETE FROM countdown_reminders WHERE countdown_id = ?1", params![id])?;
        tx.execute("DELETE FROM countdown_peers WHERE countdown_id = ?1", params![id])?;
        write_children(&tx, countdown)?;
        tx.commit()?;
        Ok(())
    }

    /// Archive or unarchive a countdown.  Returns `true` if a row changed.
    pub fn set_archived(&self, id: CountdownId, archived: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE countdowns SET is_archived = ?2, last_edited_at = ?3 WHERE id = ?1",
            params![id.to_string(), archived as i32, timestamp(&Utc::now())],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a countdown by id.  Returns `true` if a row was deleted.
    pub fn delete_countdown(&self, id: CountdownId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM countdowns WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

// Fixed-width so that text ordering matches chronological ordering.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn write_children(conn: &Connection, countdown: &Countdown) -> Result<()> {
    let id = countdown.id.to_string();
    for (position, offset) in countdown.reminder_offsets.iter().enumerate() {
        conn.execute(
            "INSERT INTO countdown_reminders (countdown_id, position, offset_minutes)
             VALUES (?1, ?2, ?3)",
            params![id, position as i64, offset],
        )?;
    }
    for (position, peer) in countdown.peers.iter().enumerate() {
        conn.execute(
            "INSERT INTO countdown_peers (countdown_id, position, peer) VALUES (?1, ?2, ?3)",
            params![id, position as i64, peer.0],
        )?;
    }
    Ok(())
}

fn load_children(conn: &Connection, countdown: &mut Countdown) -> Result<()> {
    let id = countdown.id.to_string();

    let mut stmt = conn.prepare(
        "SELECT offset_minutes FROM countdown_reminders
         WHERE countdown_id = ?1 ORDER BY position ASC",
    )?;
    let offsets = stmt.query_map(params![id], |row| row.get::<_, i32>(0))?;
    countdown.reminder_offsets = offsets.collect::<rusqlite::Result<_>>()?;

    let mut stmt = conn.prepare(
        "SELECT peer FROM countdown_peers WHERE countdown_id = ?1 ORDER BY position ASC",
    )?;
    let peers = stmt.query_map(params![id], |row| row.get::<_, String>(0).map(PeerRef))?;
    countdown.peers = peers.collect::<rusqlite::Result<_>>()?;

    Ok(())
}

fn conversion_error<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_timestamp(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

/// Map a `rusqlite::Row` to a [`Countdown`] without its child rows.
fn row_to_countdown(row: &rusqlite::Row<'_>) -> rusqlite::Result<Countdown> {
    let id_str: String = row.get(0)?;
    let title: String = row.get(1)?;
    let target_str: String = row.get(2)?;
    let time_zone: String = row.get(3)?;
    let font_tag: String = row.get(4)?;
    let background_tag: String = row.get(5)?;
    let color_hex: Option<String> = row.get(6)?;
    let image: Option<Vec<u8>> = row.get(7)?;
    let is_archived: i32 = row.get(8)?;
    let is_shared: i32 = row.get(9)?;
    let edited_str: String = row.get(10)?;

    let id = CountdownId::parse(&id_str).map_err(|e| conversion_error(0, e))?;

    Ok(Countdown {
        id,
        title,
        target_at: parse_timestamp(2, &target_str)?,
        time_zone,
        font_style: FontStyle::from_tag(&font_tag),
        background: BackgroundStyle::from_tag(&background_tag),
        color_hex,
        image,
        is_archived: is_archived != 0,
        is_shared: is_shared != 0,
        peers: Vec::new(),
        reminder_offsets: Vec::new(),
        last_edited_at: parse_timestamp(10, &edited_str)?,
    })
}
