//! v001 -- Initial schema creation.
//!
//! Creates `countdowns` plus the two child tables holding reminder offsets
//! and peer references.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Countdowns
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS countdowns (
    id             TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    title          TEXT NOT NULL,
    target_at      TEXT NOT NULL,               -- RFC-3339, fixed nanosecond width
    time_zone      TEXT NOT NULL,               -- IANA zone id
    font_style     TEXT NOT NULL,
    background     TEXT NOT NULL,               -- 'color' | 'image'
    color_hex      TEXT,
    image          BLOB,
    is_archived    INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    is_shared      INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    last_edited_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_countdowns_target_at ON countdowns(target_at);

-- ----------------------------------------------------------------
-- Reminder offsets (minutes relative to target_at)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS countdown_reminders (
    countdown_id   TEXT NOT NULL,               -- FK -> countdowns(id)
    position       INTEGER NOT NULL,
    offset_minutes INTEGER NOT NULL,

    PRIMARY KEY (countdown_id, position),
    FOREIGN KEY (countdown_id) REFERENCES countdowns(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Peers the countdown is shared with
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS countdown_peers (
    countdown_id TEXT NOT NULL,                 -- FK -> countdowns(id)
    position     INTEGER NOT NULL,
    peer         TEXT NOT NULL,

    PRIMARY KEY (countdown_id, position),
    FOREIGN KEY (countdown_id) REFERENCES countdowns(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
