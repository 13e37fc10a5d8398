//! Plain-text rendering of stories for the terminal.

use std::fmt::Write;

use crate::api::types::Story;

const DESCRIPTION_WIDTH: usize = 60;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Extract the host from the API base URL
pub fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

pub fn format_location(story: &Story) -> String {
  match story.location() {
    Some((lat, lon)) => format!("{:.5}, {:.5}", lat, lon),
    None => "-".to_string(),
  }
}

/// One line per story: id, author, and a shortened description
pub fn feed(stories: &[Story]) -> String {
  if stories.is_empty() {
    return "No stories yet.\n".to_string();
  }

  let id_width = stories.iter().map(|s| s.id.chars().count()).max().unwrap_or(0);
  let name_width = stories
    .iter()
    .map(|s| s.name.chars().count())
    .max()
    .unwrap_or(0);

  let mut out = String::new();
  for story in stories {
    // Multi-line descriptions would break the one-line-per-story layout
    let description = story.description.replace(['\r', '\n'], " ");
    let _ = writeln!(
      out,
      "{:id_width$}  {:name_width$}  {}",
      story.id,
      story.name,
      truncate(&description, DESCRIPTION_WIDTH),
      id_width = id_width,
      name_width = name_width,
    );
  }
  out
}

/// Full detail view of a single story
pub fn story(story: &Story) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}", story.name);
  let _ = writeln!(out, "  id:       {}", story.id);
  let _ = writeln!(out, "  created:  {}", story.created_at);
  let _ = writeln!(out, "  photo:    {}", story.photo_url);
  let _ = writeln!(out, "  location: {}", format_location(story));
  let _ = writeln!(out);
  let _ = writeln!(out, "{}", story.description);
  out
}

/// Stories as map pins: coordinates first, then who posted what
pub fn map(stories: &[Story]) -> String {
  let pins: Vec<&Story> = stories.iter().filter(|s| s.location().is_some()).collect();
  if pins.is_empty() {
    return "No stories with a location.\n".to_string();
  }

  let mut out = String::new();
  for story in pins {
    let _ = writeln!(
      out,
      "[{}]  {}: {}",
      format_location(story),
      story.name,
      truncate(&story.description, DESCRIPTION_WIDTH)
    );
  }
  out
}
