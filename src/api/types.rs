use std::path::PathBuf;

/// A single story from the feed
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
  pub id: String,
  pub name: String,
  pub description: String,
  pub photo_url: String,
  pub created_at: String,
  pub lat: Option<f64>,
  pub lon: Option<f64>,
}

impl Story {
  /// Both coordinates, if the story was posted with a location
  pub fn location(&self) -> Option<(f64, f64)> {
    match (self.lat, self.lon) {
      (Some(lat), Some(lon)) => Some((lat, lon)),
      _ => None,
    }
  }
}

/// Session data returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
  pub user_id: String,
  pub name: String,
  pub token: String,
}

/// Account registration form
#[derive(Debug, Clone)]
pub struct Registration {
  pub name: String,
  pub email: String,
  pub password: String,
}

/// A story about to be uploaded
#[derive(Debug, Clone)]
pub struct NewStory {
  pub photo: PathBuf,
  pub description: String,
  pub lat: Option<f64>,
  pub lon: Option<f64>,
}

/// Paging and filtering for the feed endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoryQuery {
  pub page: Option<u32>,
  pub size: Option<u32>,
  /// Only return stories that carry coordinates
  pub location_only: bool,
}

impl StoryQuery {
  pub fn page(page: u32, size: u32) -> Self {
    Self {
      page: Some(page),
      size: Some(size),
      location_only: false,
    }
  }

  pub fn with_location() -> Self {
    Self {
      location_only: true,
      ..Self::default()
    }
  }

  /// Query-string pairs in the form the service expects
  pub fn to_pairs(self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(page) = self.page {
      pairs.push(("page", page.to_string()));
    }
    if let Some(size) = self.size {
      pairs.push(("size", size.to_string()));
    }
    if self.location_only {
      pairs.push(("location", "1".to_string()));
    }
    pairs
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn story(lat: Option<f64>, lon: Option<f64>) -> Story {
    Story {
      id: "story-1".to_string(),
      name: "Dimas".to_string(),
      description: "Sunset".to_string(),
      photo_url: "https://example.com/1.jpg".to_string(),
      created_at: "2024-01-01T00:00:00Z".to_string(),
      lat,
      lon,
    }
  }

  #[test]
  fn test_location_requires_both_coordinates() {
    assert_eq!(story(Some(1.5), Some(2.5)).location(), Some((1.5, 2.5)));
    assert_eq!(story(Some(1.5), None).location(), None);
    assert_eq!(story(None, None).location(), None);
  }

  #[test]
  fn test_query_pairs() {
    assert_eq!(
      StoryQuery::page(2, 10).to_pairs(),
      vec![("page", "2".to_string()), ("size", "10".to_string())]
    );
    assert_eq!(
      StoryQuery::with_location().to_pairs(),
      vec![("location", "1".to_string())]
    );
    assert!(StoryQuery::default().to_pairs().is_empty());
  }
}
