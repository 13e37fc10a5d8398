//! Remote access to the story service.

pub mod api_types;
pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::StoryClient;
pub use error::ApiError;
use types::{LoginResult, NewStory, Registration, Story, StoryQuery};

/// One call per service endpoint. Each call is a single attempt.
#[async_trait]
pub trait StoryApi: Send + Sync {
  /// Create an account. Returns the service's confirmation message.
  async fn register(&self, form: &Registration) -> Result<String, ApiError>;

  async fn login(&self, email: &str, password: &str) -> Result<LoginResult, ApiError>;

  async fn list_stories(&self, token: &str, query: StoryQuery) -> Result<Vec<Story>, ApiError>;

  async fn story_detail(&self, token: &str, id: &str) -> Result<Story, ApiError>;

  /// Upload a new story. Returns the service's confirmation message.
  async fn add_story(&self, token: &str, story: &NewStory) -> Result<String, ApiError>;

  /// Ask the service to e-mail a password reset link.
  async fn reset_password(&self, email: &str) -> Result<String, ApiError>;
}
