//! Persisted login session.
//!
//! The session is a single row: logging in replaces it, logging out or an
//! HTTP 401 deletes it.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use crate::api::types::LoginResult;
use crate::db::Database;

/// The currently logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token: String,
  pub user_id: String,
  pub name: String,
  pub logged_in_at: DateTime<Utc>,
}

/// Handle to the session row. Cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
  db: Arc<Database>,
}

impl SessionStore {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }

  /// Replace any existing session with a fresh login.
  pub fn save(&self, login: &LoginResult) -> Result<()> {
    let conn = self.db.lock()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO session (id, token, user_id, name, logged_in_at)
         VALUES (1, ?, ?, ?, ?)",
        params![
          login.token,
          login.user_id,
          login.name,
          Utc::now().to_rfc3339()
        ],
      )
      .map_err(|e| eyre!("Failed to save session: {}", e))?;
    Ok(())
  }

  pub fn current(&self) -> Result<Option<Session>> {
    let conn = self.db.lock()?;
    let row: Option<(String, String, String, String)> = conn
      .query_row(
        "SELECT token, user_id, name, logged_in_at FROM session WHERE id = 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read session: {}", e))?;

    match row {
      Some((token, user_id, name, logged_in_at)) => {
        let logged_in_at = DateTime::parse_from_rfc3339(&logged_in_at)
          .map_err(|e| eyre!("Failed to parse session timestamp '{}': {}", logged_in_at, e))?
          .with_timezone(&Utc);
        Ok(Some(Session {
          token,
          user_id,
          name,
          logged_in_at,
        }))
      }
      None => Ok(None),
    }
  }

  /// The auth token, if a non-empty one is stored.
  pub fn token(&self) -> Result<Option<String>> {
    Ok(
      self
        .current()?
        .map(|s| s.token)
        .filter(|token| !token.is_empty()),
    )
  }

  pub fn is_logged_in(&self) -> Result<bool> {
    Ok(self.token()?.is_some())
  }

  pub fn clear(&self) -> Result<()> {
    let conn = self.db.lock()?;
    conn
      .execute("DELETE FROM session", [])
      .map_err(|e| eyre!("Failed to clear session: {}", e))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store() -> SessionStore {
    SessionStore::new(Arc::new(Database::open_in_memory().unwrap()))
  }

  fn login(token: &str) -> LoginResult {
    LoginResult {
      user_id: "user-1".to_string(),
      name: "Arif".to_string(),
      token: token.to_string(),
    }
  }

  #[test]
  fn test_empty_store_is_logged_out() {
    let store = store();
    assert_eq!(store.current().unwrap(), None);
    assert!(!store.is_logged_in().unwrap());
  }

  #[test]
  fn test_save_then_read() {
    let store = store();
    store.save(&login("token-a")).unwrap();

    let session = store.current().unwrap().unwrap();
    assert_eq!(session.token, "token-a");
    assert_eq!(session.name, "Arif");
    assert!(store.is_logged_in().unwrap());
  }

  #[test]
  fn test_second_login_replaces_first() {
    let store = store();
    store.save(&login("token-a")).unwrap();
    store.save(&login("token-b")).unwrap();

    assert_eq!(store.token().unwrap().as_deref(), Some("token-b"));
  }

  #[test]
  fn test_clear() {
    let store = store();
    store.save(&login("token-a")).unwrap();
    store.clear().unwrap();

    assert_eq!(store.token().unwrap(), None);
    // Clearing twice is fine
    store.clear().unwrap();
  }

  #[test]
  fn test_empty_token_counts_as_logged_out() {
    let store = store();
    store.save(&login("")).unwrap();
    assert!(!store.is_logged_in().unwrap());
  }
}
