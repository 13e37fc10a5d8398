//! Id-keyed comparison of two feed snapshots.
//!
//! Two stories are the same item when their ids match, and the same content
//! when every field matches.

use std::collections::HashMap;

use crate::api::types::Story;

/// What changed between an old and a new list of stories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDiff {
  /// Ids only in the new list, in new-list order
  pub inserted: Vec<String>,
  /// Ids only in the old list, in old-list order
  pub removed: Vec<String>,
  /// Ids in both lists whose contents differ, in new-list order
  pub changed: Vec<String>,
}

impl FeedDiff {
  pub fn between(old: &[Story], new: &[Story]) -> Self {
    let old_by_id: HashMap<&str, &Story> = old.iter().map(|s| (s.id.as_str(), s)).collect();
    let new_by_id: HashMap<&str, &Story> = new.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut diff = FeedDiff::default();

    for story in new {
      match old_by_id.get(story.id.as_str()) {
        None => push_unique(&mut diff.inserted, &story.id),
        Some(previous) if *previous != story => push_unique(&mut diff.changed, &story.id),
        Some(_) => {}
      }
    }

    for story in old {
      if !new_by_id.contains_key(story.id.as_str()) {
        push_unique(&mut diff.removed, &story.id);
      }
    }

    diff
  }

  pub fn is_empty(&self) -> bool {
    self.inserted.is_empty() && self.removed.is_empty() && self.changed.is_empty()
  }

  /// One-line summary for the terminal
  pub fn summary(&self) -> String {
    if self.is_empty() {
      return "no changes".to_string();
    }
    format!(
      "{} new, {} updated, {} removed",
      self.inserted.len(),
      self.changed.len(),
      self.removed.len()
    )
  }
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
  if !ids.iter().any(|existing| existing == id) {
    ids.push(id.to_string());
  }
}
