//! Single entry point for everything the CLI does.
//!
//! Every operation reports its result as an [`Outcome`]; failures never
//! escape as `Err`.

use tracing::{info, warn};

use crate::api::types::{LoginResult, NewStory, Registration, Story, StoryQuery};
use crate::api::StoryApi;
use crate::cache::{CacheLayer, CacheResult, CacheSource, CacheStorage};
use crate::outcome::Outcome;
use crate::session::SessionStore;

const MISSING_TOKEN: &str = "Token is missing or expired";

pub struct StoryRepository<A: StoryApi, S: CacheStorage> {
  api: A,
  cache: CacheLayer<S>,
  session: SessionStore,
}

impl<A: StoryApi, S: CacheStorage> StoryRepository<A, S> {
  pub fn new(api: A, storage: S, session: SessionStore) -> Self {
    Self {
      api,
      cache: CacheLayer::new(storage),
      session,
    }
  }

  pub fn session(&self) -> &SessionStore {
    &self.session
  }

  pub async fn register(&self, form: &Registration) -> Outcome<String> {
    self.api.register(form).await.into()
  }

  /// Log in and persist the returned token.
  pub async fn login(&self, email: &str, password: &str) -> Outcome<LoginResult> {
    if self.session.is_logged_in().unwrap_or(false) {
      info!("replacing existing session");
    }

    match self.api.login(email, password).await {
      Ok(result) => match self.session.save(&result) {
        Ok(()) => {
          info!(user_id = %result.user_id, "logged in");
          Outcome::Success(result)
        }
        Err(e) => Outcome::error(format!("Login failed: {}", e)),
      },
      Err(e) => Outcome::Error(e.to_string()),
    }
  }

  pub fn logout(&self) -> Outcome<()> {
    match self.session.clear() {
      Ok(()) => Outcome::Success(()),
      Err(e) => Outcome::error(format!("Logout failed: {}", e)),
    }
  }

  /// Fetch one page of the feed with an explicit token.
  ///
  /// Network first; on success the local cache is replaced with exactly the
  /// returned stories. On failure the cached feed is served if it has any
  /// stories, otherwise the failure is reported.
  pub async fn fetch_stories(&self, token: &str, page: u32, page_size: u32) -> Outcome<Vec<Story>> {
    let result = self
      .cache
      .fetch_list(|| self.api.list_stories(token, StoryQuery::page(page, page_size)))
      .await;

    result.map(log_source).into()
  }

  /// Fetch one page of the feed for the logged-in user.
  pub async fn feed(&self, page: u32, page_size: u32) -> Outcome<Vec<Story>> {
    match self.token() {
      Some(token) => self.fetch_stories(&token, page, page_size).await,
      None => Outcome::error(MISSING_TOKEN),
    }
  }

  /// Stories that carry coordinates. Never written to the cache.
  pub async fn stories_with_location(&self) -> Outcome<Vec<Story>> {
    let token = match self.token() {
      Some(token) => token,
      None => return Outcome::error(MISSING_TOKEN),
    };

    let result = self
      .cache
      .fetch_filtered(
        || self.api.list_stories(&token, StoryQuery::with_location()),
        |story| story.location().is_some(),
      )
      .await;

    result
      .map(log_source)
      .map(|stories| {
        stories
          .into_iter()
          .filter(|s| s.location().is_some())
          .collect::<Vec<Story>>()
      })
      .into()
  }

  pub async fn story_detail(&self, id: &str) -> Outcome<Story> {
    let token = match self.token() {
      Some(token) => token,
      None => return Outcome::error(MISSING_TOKEN),
    };

    let result = self
      .cache
      .fetch_one(id, || self.api.story_detail(&token, id))
      .await;

    result.map(log_source).into()
  }

  /// Upload a story. The cache is not touched; the next feed fetch picks it up.
  pub async fn add_story(&self, story: &NewStory) -> Outcome<String> {
    match self.token() {
      Some(token) => self.api.add_story(&token, story).await.into(),
      None => Outcome::error(MISSING_TOKEN),
    }
  }

  pub async fn reset_password(&self, email: &str) -> Outcome<String> {
    self.api.reset_password(email).await.into()
  }

  /// The cached feed as it stands, for comparing against a fresh fetch.
  pub fn cached_stories(&self) -> Vec<Story> {
    self.cache.storage().load_all().unwrap_or_else(|e| {
      warn!("Failed to read story cache: {}", e);
      Vec::new()
    })
  }

  pub fn clear_cache(&self) -> Outcome<()> {
    match self.cache.storage().clear() {
      Ok(()) => Outcome::Success(()),
      Err(e) => Outcome::error(format!("Failed to clear cache: {}", e)),
    }
  }

  fn token(&self) -> Option<String> {
    self.session.token().unwrap_or_else(|e| {
      warn!("Failed to read session: {}", e);
      None
    })
  }
}

fn log_source<T>(result: CacheResult<T>) -> T {
  if result.source == CacheSource::Offline {
    match result.cached_at {
      Some(at) => info!("network unavailable, serving cache from {}", at),
      None => info!("network unavailable, serving cache"),
    }
  }
  result.data
}
