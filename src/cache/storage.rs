//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;

use crate::api::types::Story;
use crate::db::Database;

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Replace the whole cache with `stories`, atomically.
  fn replace_all(&self, stories: &[Story]) -> Result<()>;

  /// All cached stories, in the order they were stored.
  fn load_all(&self) -> Result<Vec<Story>>;

  /// A single cached story by id.
  fn get(&self, id: &str) -> Result<Option<Story>>;

  /// When the current snapshot was written, if there is one.
  fn cached_at(&self) -> Result<Option<DateTime<Utc>>>;

  /// Drop every cached story.
  fn clear(&self) -> Result<()>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  db: Arc<Database>,
}

impl SqliteStorage {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }
}

const STORY_COLUMNS: &str = "id, name, description, photo_url, created_at, lat, lon";

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<Story> {
  Ok(Story {
    id: row.get(0)?,
    name: row.get(1)?,
    description: row.get(2)?,
    photo_url: row.get(3)?,
    created_at: row.get(4)?,
    lat: row.get(5)?,
    lon: row.get(6)?,
  })
}

impl CacheStorage for SqliteStorage {
  fn replace_all(&self, stories: &[Story]) -> Result<()> {
    let mut conn = self.db.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute("DELETE FROM stories", [])
      .map_err(|e| eyre!("Failed to clear cached stories: {}", e))?;

    {
      let mut stmt = tx
        .prepare(
          "INSERT OR REPLACE INTO stories
             (id, name, description, photo_url, created_at, lat, lon, position, cached_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, datetime('now'))",
        )
        .map_err(|e| eyre!("Failed to prepare insert: {}", e))?;

      for (position, story) in stories.iter().enumerate() {
        stmt
          .execute(params![
            story.id,
            story.name,
            story.description,
            story.photo_url,
            story.created_at,
            story.lat,
            story.lon,
            position as i64,
          ])
          .map_err(|e| eyre!("Failed to store story {}: {}", story.id, e))?;
      }
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn load_all(&self) -> Result<Vec<Story>> {
    let conn = self.db.lock()?;

    let mut stmt = conn
      .prepare(&format!(
        "SELECT {} FROM stories ORDER BY position",
        STORY_COLUMNS
      ))
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let stories = stmt
      .query_map([], story_from_row)
      .map_err(|e| eyre!("Failed to query cached stories: {}", e))?
      .collect::<rusqlite::Result<Vec<Story>>>()
      .map_err(|e| eyre!("Failed to read cached story: {}", e))?;

    Ok(stories)
  }

  fn get(&self, id: &str) -> Result<Option<Story>> {
    let conn = self.db.lock()?;

    conn
      .query_row(
        &format!("SELECT {} FROM stories WHERE id = ?", STORY_COLUMNS),
        params![id],
        story_from_row,
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cached story {}: {}", id, e))
  }

  fn cached_at(&self) -> Result<Option<DateTime<Utc>>> {
    let conn = self.db.lock()?;

    let cached_at: Option<String> = conn
      .query_row("SELECT MAX(cached_at) FROM stories", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to read cache timestamp: {}", e))?;

    cached_at.as_deref().map(parse_datetime).transpose()
  }

  fn clear(&self) -> Result<()> {
    let conn = self.db.lock()?;
    conn
      .execute("DELETE FROM stories", [])
      .map_err(|e| eyre!("Failed to clear cached stories: {}", e))?;
    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn storage() -> SqliteStorage {
    SqliteStorage::new(Arc::new(Database::open_in_memory().unwrap()))
  }

  fn story(id: &str, description: &str) -> Story {
    Story {
      id: id.to_string(),
      name: "Dimas".to_string(),
      description: description.to_string(),
      photo_url: format!("https://example.com/{}.jpg", id),
      created_at: "2024-03-01T10:00:00.000Z".to_string(),
      lat: None,
      lon: None,
    }
  }

  #[test]
  fn test_empty_cache() {
    let storage = storage();
    assert!(storage.load_all().unwrap().is_empty());
    assert_eq!(storage.cached_at().unwrap(), None);
    assert_eq!(storage.get("story-1").unwrap(), None);
  }

  #[test]
  fn test_replace_keeps_server_order() {
    let storage = storage();
    let stories = vec![story("c", "3"), story("a", "1"), story("b", "2")];
    storage.replace_all(&stories).unwrap();

    assert_eq!(storage.load_all().unwrap(), stories);
    assert!(storage.cached_at().unwrap().is_some());
  }

  #[test]
  fn test_replace_drops_stale_records() {
    let storage = storage();
    storage
      .replace_all(&[story("old-1", "x"), story("old-2", "y")])
      .unwrap();
    storage.replace_all(&[story("new-1", "z")]).unwrap();

    let ids: Vec<String> = storage.load_all().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["new-1"]);
    assert_eq!(storage.get("old-1").unwrap(), None);
  }

  #[test]
  fn test_replace_with_empty_list_empties_cache() {
    let storage = storage();
    storage.replace_all(&[story("a", "1")]).unwrap();
    storage.replace_all(&[]).unwrap();
    assert!(storage.load_all().unwrap().is_empty());
  }

  #[test]
  fn test_duplicate_ids_last_write_wins() {
    let storage = storage();
    storage
      .replace_all(&[story("a", "first"), story("a", "second")])
      .unwrap();

    let stories = storage.load_all().unwrap();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].description, "second");
  }

  #[test]
  fn test_coordinates_round_trip_through_nullable_columns() {
    let storage = storage();
    let mut located = story("located", "map me");
    located.lat = Some(-6.2);
    located.lon = Some(106.8);
    storage.replace_all(&[located.clone(), story("plain", "")]).unwrap();

    assert_eq!(storage.get("located").unwrap(), Some(located));
    assert_eq!(storage.get("plain").unwrap().unwrap().lat, None);
  }

  #[test]
  fn test_clear() {
    let storage = storage();
    storage.replace_all(&[story("a", "1")]).unwrap();
    storage.clear().unwrap();
    assert!(storage.load_all().unwrap().is_empty());
  }

  #[test]
  fn test_parse_datetime() {
    let dt = parse_datetime("2024-03-01 10:15:30").unwrap();
    assert_eq!(dt.to_rfc3339(), "2024-03-01T10:15:30+00:00");
    assert!(parse_datetime("yesterday").is_err());
  }
}
