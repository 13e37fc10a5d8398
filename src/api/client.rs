use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::session::SessionStore;

use super::api_types::{
  ApiErrorBody, ApiLoginRequest, ApiLoginResponse, ApiMessageResponse, ApiRegisterRequest,
  ApiResetPasswordRequest, ApiStoriesResponse, ApiStoryDetailResponse, Envelope,
};
use super::error::ApiError;
use super::types::{LoginResult, NewStory, Registration, Story, StoryQuery};
use super::StoryApi;

/// HTTP client for the story service
#[derive(Clone)]
pub struct StoryClient {
  http: reqwest::Client,
  base_url: Url,
  session: SessionStore,
}

impl StoryClient {
  pub fn new(config: &ApiConfig, session: SessionStore) -> Result<Self> {
    let http = reqwest::Client::builder()
      .connect_timeout(config.connect_timeout())
      .timeout(config.timeout())
      .user_agent(concat!("storyteller/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let base_url = parse_base_url(&config.base_url)?;

    Ok(Self {
      http,
      base_url,
      session,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base_url
      .join(path)
      .map_err(|e| ApiError::Unexpected(format!("Invalid endpoint {}: {}", path, e)))
  }

  /// `stories/{id}` with the id percent-encoded as a single path segment.
  fn story_endpoint(&self, id: &str) -> Result<Url, ApiError> {
    // `.` and `..` would be dropped by the segment encoder and hit `stories/`
    if id.is_empty() || id == "." || id == ".." {
      return Err(ApiError::Unexpected(format!("Invalid story id '{}'", id)));
    }

    let mut url = self.endpoint("stories/")?;
    url
      .path_segments_mut()
      .map_err(|_| ApiError::Unexpected(format!("Base URL {} cannot hold a path", self.base_url)))?
      .pop_if_empty()
      .push(id);
    Ok(url)
  }

  /// Send a request and turn whatever comes back into a typed envelope.
  async fn send<T>(&self, request: RequestBuilder) -> Result<T, ApiError>
  where
    T: DeserializeOwned + Envelope,
  {
    let response = request.send().await.map_err(|e| {
      warn!("Request failed: {}", e);
      ApiError::from(e)
    })?;

    let status = response.status();
    debug!(url = %response.url(), %status, "response");

    let body = response.bytes().await.map_err(ApiError::from)?;
    self.read_response(status, &body)
  }

  /// Classify a response by status code, then parse the body.
  ///
  /// A 401 clears the stored session before the error is returned.
  fn read_response<T>(&self, status: StatusCode, body: &[u8]) -> Result<T, ApiError>
  where
    T: DeserializeOwned + Envelope,
  {
    if status.is_success() {
      return parse_envelope(body);
    }

    match status {
      StatusCode::UNAUTHORIZED => {
        if let Err(e) = self.session.clear() {
          warn!("Failed to clear session after 401: {}", e);
        }
        Err(ApiError::Unauthorized)
      }
      StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
      _ => {
        let message = error_message(status, body);
        warn!(%status, "API error: {}", message);
        Err(ApiError::Api(message))
      }
    }
  }
}

#[async_trait]
impl StoryApi for StoryClient {
  async fn register(&self, form: &Registration) -> Result<String, ApiError> {
    let url = self.endpoint("register")?;
    debug!(%url, "POST register");

    let body = ApiRegisterRequest {
      name: &form.name,
      email: &form.email,
      password: &form.password,
    };
    let response: ApiMessageResponse = self.send(self.http.post(url).json(&body)).await?;
    Ok(response.message)
  }

  async fn login(&self, email: &str, password: &str) -> Result<LoginResult, ApiError> {
    let url = self.endpoint("login")?;
    debug!(%url, "POST login");

    let body = ApiLoginRequest { email, password };
    let response: ApiLoginResponse = self.send(self.http.post(url).json(&body)).await?;

    response
      .login_result
      .filter(|result| !result.token.is_empty())
      .map(LoginResult::from)
      .ok_or_else(|| ApiError::Api("Login failed: Token is missing".to_string()))
  }

  async fn list_stories(&self, token: &str, query: StoryQuery) -> Result<Vec<Story>, ApiError> {
    let url = self.endpoint("stories")?;
    debug!(%url, ?query, "GET stories");

    let request = self
      .http
      .get(url)
      .bearer_auth(token)
      .query(&query.to_pairs());
    let response: ApiStoriesResponse = self.send(request).await?;

    Ok(response.list_story.into_iter().map(Story::from).collect())
  }

  async fn story_detail(&self, token: &str, id: &str) -> Result<Story, ApiError> {
    let url = self.story_endpoint(id)?;
    debug!(%url, "GET story detail");

    let response: ApiStoryDetailResponse = self
      .send(self.http.get(url).bearer_auth(token))
      .await?;

    response
      .story
      .map(Story::from)
      .ok_or_else(|| ApiError::Api("Story data is empty".to_string()))
  }

  async fn add_story(&self, token: &str, story: &NewStory) -> Result<String, ApiError> {
    let url = self.endpoint("stories")?;
    debug!(%url, photo = %story.photo.display(), "POST stories");

    let form = story_form(story).await?;
    let response: ApiMessageResponse = self
      .send(self.http.post(url).bearer_auth(token).multipart(form))
      .await?;
    Ok(response.message)
  }

  async fn reset_password(&self, email: &str) -> Result<String, ApiError> {
    let url = self.endpoint("auth/reset-password")?;
    debug!(%url, "POST reset password");

    let body = ApiResetPasswordRequest { email };
    let response: ApiMessageResponse = self.send(self.http.post(url).json(&body)).await?;
    Ok(response.message)
  }
}

/// Parse the base URL, making sure relative endpoint paths append to it.
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut raw = raw.trim().to_string();
  if !raw.ends_with('/') {
    raw.push('/');
  }
  Url::parse(&raw).map_err(|e| eyre!("Invalid API base URL '{}': {}", raw, e))
}

fn parse_envelope<T>(body: &[u8]) -> Result<T, ApiError>
where
  T: DeserializeOwned + Envelope,
{
  if body.iter().all(u8::is_ascii_whitespace) {
    return Err(ApiError::EmptyBody);
  }

  let parsed: T = serde_json::from_slice(body)
    .map_err(|e| ApiError::Unexpected(format!("Failed to parse response: {}", e)))?;

  if parsed.is_error() {
    return Err(ApiError::Api(parsed.message().to_string()));
  }

  Ok(parsed)
}

/// Best-effort message for a non-2xx response.
fn error_message(status: StatusCode, body: &[u8]) -> String {
  serde_json::from_slice::<ApiErrorBody>(body)
    .ok()
    .and_then(|b| b.message)
    .filter(|m| !m.trim().is_empty())
    .or_else(|| status.canonical_reason().map(String::from))
    .unwrap_or_else(|| "Unknown error occurred".to_string())
}

async fn story_form(story: &NewStory) -> Result<Form, ApiError> {
  let bytes = tokio::fs::read(&story.photo).await.map_err(|e| {
    ApiError::Unexpected(format!(
      "Failed to read photo {}: {}",
      story.photo.display(),
      e
    ))
  })?;

  let file_name = story
    .photo
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "photo.jpg".to_string());

  let photo = Part::bytes(bytes)
    .file_name(file_name)
    .mime_str(photo_mime(&story.photo))
    .map_err(|e| ApiError::Unexpected(e.to_string()))?;

  let mut form = Form::new()
    .part("photo", photo)
    .text("description", story.description.clone());

  if let Some(lat) = story.lat {
    form = form.text("lat", lat.to_string());
  }
  if let Some(lon) = story.lon {
    form = form.text("lon", lon.to_string());
  }

  Ok(form)
}

fn photo_mime(path: &std::path::Path) -> &'static str {
  let ext = path
    .extension()
    .map(|e| e.to_string_lossy().to_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "webp" => "image/webp",
    "gif" => "image/gif",
    _ => "application/octet-stream",
  }
}
