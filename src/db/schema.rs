/// Schema for the local database.
///
/// `stories` is a whole-feed snapshot: it is emptied and refilled on every
/// successful feed fetch. `session` holds at most one row.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    photo_url TEXT NOT NULL,
    created_at TEXT NOT NULL,
    lat REAL,
    lon REAL,
    position INTEGER NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_stories_position ON stories(position);

CREATE TABLE IF NOT EXISTS session (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    token TEXT NOT NULL,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    logged_in_at TEXT NOT NULL
);
"#;
