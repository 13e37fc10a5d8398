//! Serde types matching the story service's JSON payloads.
//!
//! These types are separate from domain types to allow lenient deserialization
//! while keeping domain types focused on application needs.

use serde::{Deserialize, Serialize};

use super::types::{LoginResult, Story};

/// Every response carries an `error` flag and a `message`, even on HTTP 200.
pub trait Envelope {
  fn is_error(&self) -> bool;
  fn message(&self) -> &str;
}

macro_rules! impl_envelope {
  ($($ty:ty),* $(,)?) => {
    $(
      impl Envelope for $ty {
        fn is_error(&self) -> bool {
          self.error
        }

        fn message(&self) -> &str {
          &self.message
        }
      }
    )*
  };
}

impl_envelope!(
  ApiMessageResponse,
  ApiLoginResponse,
  ApiStoriesResponse,
  ApiStoryDetailResponse,
);

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiRegisterRequest<'a> {
  pub name: &'a str,
  pub email: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ApiLoginRequest<'a> {
  pub email: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ApiResetPasswordRequest<'a> {
  pub email: &'a str,
}

// ============================================================================
// Responses
// ============================================================================

/// Response with no payload beyond the envelope (register, add story, reset)
#[derive(Debug, Deserialize)]
pub struct ApiMessageResponse {
  #[serde(default)]
  pub error: bool,
  #[serde(default)]
  pub message: String,
}

/// Body of a non-2xx response; only the message is of interest
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginResult {
  #[serde(rename = "userId", default)]
  pub user_id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginResponse {
  #[serde(default)]
  pub error: bool,
  #[serde(default)]
  pub message: String,
  #[serde(rename = "loginResult")]
  pub login_result: Option<ApiLoginResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiStory {
  pub id: Option<String>,
  pub name: Option<String>,
  pub description: Option<String>,
  #[serde(rename = "photoUrl")]
  pub photo_url: Option<String>,
  #[serde(rename = "createdAt")]
  pub created_at: Option<String>,
  pub lat: Option<f64>,
  pub lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiStoriesResponse {
  #[serde(default)]
  pub error: bool,
  #[serde(default)]
  pub message: String,
  #[serde(rename = "listStory", default)]
  pub list_story: Vec<ApiStory>,
}

#[derive(Debug, Deserialize)]
pub struct ApiStoryDetailResponse {
  #[serde(default)]
  pub error: bool,
  #[serde(default)]
  pub message: String,
  pub story: Option<ApiStory>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiStory> for Story {
  fn from(api: ApiStory) -> Self {
    Story {
      id: api.id.unwrap_or_default(),
      name: api.name.unwrap_or_default(),
      description: api.description.unwrap_or_default(),
      photo_url: api.photo_url.unwrap_or_default(),
      created_at: api.created_at.unwrap_or_default(),
      lat: api.lat,
      lon: api.lon,
    }
  }
}

impl From<ApiLoginResult> for LoginResult {
  fn from(api: ApiLoginResult) -> Self {
    LoginResult {
      user_id: api.user_id,
      name: api.name,
      token: api.token,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stories_response_with_missing_fields() {
    let json = r#"{
      "error": false,
      "message": "Stories fetched successfully",
      "listStory": [
        {"id": "story-1", "name": "Dimas", "description": "Lorem", "photoUrl": "https://x/1.jpg",
         "createdAt": "2022-01-08T06:34:18.598Z", "lat": -10.212, "lon": -16.002},
        {"id": "story-2", "name": "Ayu"}
      ]
    }"#;

    let response: ApiStoriesResponse = serde_json::from_str(json).unwrap();
    assert!(!response.is_error());

    let stories: Vec<Story> = response.list_story.into_iter().map(Story::from).collect();
    assert_eq!(stories[0].location(), Some((-10.212, -16.002)));
    assert_eq!(stories[1].description, "");
    assert_eq!(stories[1].lat, None);
  }

  #[test]
  fn test_login_response() {
    let json = r#"{"error": false, "message": "success",
      "loginResult": {"userId": "user-1", "name": "Arif", "token": "abc.def"}}"#;

    let response: ApiLoginResponse = serde_json::from_str(json).unwrap();
    let result: LoginResult = response.login_result.unwrap().into();
    assert_eq!(result.token, "abc.def");
    assert_eq!(result.user_id, "user-1");
  }

  #[test]
  fn test_error_envelope() {
    let response: ApiMessageResponse =
      serde_json::from_str(r#"{"error": true, "message": "Email is already taken"}"#).unwrap();
    assert!(response.is_error());
    assert_eq!(response.message(), "Email is already taken");
  }
}
