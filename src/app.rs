use color_eyre::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::types::{NewStory, Registration};
use crate::api::StoryClient;
use crate::cache::SqliteStorage;
use crate::commands::{CacheCommand, Command};
use crate::config::Config;
use crate::db::Database;
use crate::diff::FeedDiff;
use crate::outcome::Outcome;
use crate::render;
use crate::repository::StoryRepository;
use crate::session::SessionStore;

/// Wires configuration, storage and the HTTP client together and runs one command
pub struct App {
  config: Config,
  repository: StoryRepository<StoryClient, SqliteStorage>,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let db = Arc::new(Database::open(&config.data_dir()?)?);
    let session = SessionStore::new(Arc::clone(&db));
    let client = StoryClient::new(&config.api, session.clone())?;
    let repository = StoryRepository::new(client, SqliteStorage::new(db), session);

    Ok(Self { config, repository })
  }

  /// Run a command, printing its result. Returns whether it succeeded.
  pub async fn run(&self, command: Command) -> Result<bool> {
    info!(command = command.name(), "running");
    let had_session =
      !matches!(command, Command::Logout) && self.repository.session().is_logged_in()?;

    let ok = match command {
      Command::Register {
        name,
        email,
        password,
      } => {
        report("Registering", &Outcome::<()>::Loading);
        let form = Registration {
          name,
          email,
          password,
        };
        let outcome = self.repository.register(&form).await;
        report_with(&outcome, |message| format!("{}\n", message))
      }
      Command::Login { email, password } => {
        report("Logging in", &Outcome::<()>::Loading);
        let outcome = self.repository.login(&email, &password).await;
        report_with(&outcome, |result| format!("Logged in as {}\n", result.name))
      }
      Command::Logout => {
        let outcome = self.repository.logout();
        report_with(&outcome, |_| "Logged out\n".to_string())
      }
      Command::Whoami => match self.repository.session().current()? {
        Some(session) => {
          println!(
            "{} ({}) on {}, logged in {}",
            session.name,
            session.user_id,
            render::extract_domain(&self.config.api.base_url),
            session.logged_in_at.format("%Y-%m-%d %H:%M UTC")
          );
          true
        }
        None => {
          eprintln!("Not logged in");
          false
        }
      },
      Command::Stories { page, size } => {
        let size = size.unwrap_or(self.config.feed.page_size);
        let previous = self.repository.cached_stories();

        report("Loading stories", &Outcome::<()>::Loading);
        let outcome = self.repository.feed(page, size).await;
        report_with(&outcome, |stories| {
          let diff = FeedDiff::between(&previous, stories);
          format!("{}\n{}\n", render::feed(stories), diff.summary())
        })
      }
      Command::Show { id } => {
        report("Loading story", &Outcome::<()>::Loading);
        let outcome = self.repository.story_detail(&id).await;
        report_with(&outcome, render::story)
      }
      Command::Add {
        photo,
        description,
        lat,
        lon,
      } => {
        report("Uploading story", &Outcome::<()>::Loading);
        let story = NewStory {
          photo,
          description,
          lat,
          lon,
        };
        let outcome = self.repository.add_story(&story).await;
        report_with(&outcome, |message| format!("{}\n", message))
      }
      Command::Map => {
        report("Loading story locations", &Outcome::<()>::Loading);
        let outcome = self.repository.stories_with_location().await;
        report_with(&outcome, |stories| render::map(stories))
      }
      Command::ResetPassword { email } => {
        report("Requesting reset link", &Outcome::<()>::Loading);
        let outcome = self.repository.reset_password(&email).await;
        report_with(&outcome, |message| format!("{}\n", message))
      }
      Command::Cache {
        action: CacheCommand::Clear,
      } => {
        let outcome = self.repository.clear_cache();
        report_with(&outcome, |_| "Cache cleared\n".to_string())
      }
    };

    if let Some(notice) = self.session_notice(had_session)? {
      eprintln!("{}", notice);
    }

    Ok(ok)
  }

  /// A 401 clears the session mid-command; reads may still succeed from the cache.
  fn session_notice(&self, had_session: bool) -> Result<Option<&'static str>> {
    if had_session && !self.repository.session().is_logged_in()? {
      warn!("session cleared during command");
      return Ok(Some(SESSION_EXPIRED));
    }
    Ok(None)
  }
}

const SESSION_EXPIRED: &str = "Session expired. Please login again.";

/// Status lines (loading, errors) go to stderr so stdout stays pipeable.
fn report<T>(label: &str, outcome: &Outcome<T>) {
  match outcome {
    Outcome::Loading => eprintln!("{}...", label),
    Outcome::Error(message) => eprintln!("{}: {}", label, message),
    Outcome::Success(_) => {}
  }
}

fn report_with<T>(outcome: &Outcome<T>, render: impl FnOnce(&T) -> String) -> bool {
  match outcome.data() {
    Some(data) => print!("{}", render(data)),
    None => report("Error", outcome),
  }
  outcome.is_success()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::LoginResult;

  fn app(dir: &tempfile::TempDir) -> App {
    let config = Config {
      data_dir: Some(dir.path().to_path_buf()),
      ..Config::default()
    };
    App::new(config).unwrap()
  }

  fn login(app: &App) {
    app
      .repository
      .session()
      .save(&LoginResult {
        user_id: "user-1".to_string(),
        name: "Arif".to_string(),
        token: "secret".to_string(),
      })
      .unwrap();
  }

  #[test]
  fn test_notice_when_session_cleared_mid_command() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    login(&app);

    app.repository.session().clear().unwrap();

    assert_eq!(app.session_notice(true).unwrap(), Some(SESSION_EXPIRED));
  }

  #[test]
  fn test_no_notice_while_session_survives() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    login(&app);

    assert_eq!(app.session_notice(true).unwrap(), None);
  }

  #[test]
  fn test_no_notice_without_prior_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    assert_eq!(app.session_notice(false).unwrap(), None);
  }

  #[tokio::test]
  async fn test_logout_clears_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    login(&app);

    assert!(app.run(Command::Logout).await.unwrap());
    assert!(!app.repository.session().is_logged_in().unwrap());
  }

  #[tokio::test]
  async fn test_cache_clear_keeps_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    login(&app);

    let action = CacheCommand::Clear;
    assert!(app.run(Command::Cache { action }).await.unwrap());
    assert_eq!(app.session_notice(true).unwrap(), None);
  }
}
