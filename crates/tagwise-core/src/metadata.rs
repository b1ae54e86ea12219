//! Tag provenance for a single todo

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Actor that asserted a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSource {
    User,
    Ai,
}

/// A todo's tags plus the provenance of each one.
///
/// `category_tags` keeps insertion order for display; `tag_sources` holds exactly
/// one entry per listed tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    category_tags: Vec<String>,
    #[serde(default)]
    tag_sources: BTreeMap<String, TagSource>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// All tags in display order
    pub fn tags(&self) -> &[String] {
        &self.category_tags
    }

    pub fn len(&self) -> usize {
        self.category_tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.category_tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tag_sources.contains_key(tag.trim())
    }

    pub fn source_of(&self, tag: &str) -> Option<TagSource> {
        self.tag_sources.get(tag.trim()).copied()
    }

    /// Merge an analysis result with the user's own tags.
    ///
    /// AI tags are only added when neither the user list nor the existing record
    /// already names them. User tags are then recorded as `User`, replacing any
    /// earlier source for the same name.
    pub fn merge_tags<A, U>(&mut self, ai_tags: &[A], user_tags: &[U])
    where
        A: AsRef<str>,
        U: AsRef<str>,
    {
        let user_set: HashSet<&str> = user_tags.iter().map(|t| t.as_ref().trim()).collect();

        for tag in ai_tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() || user_set.contains(tag) || self.contains(tag) {
                continue;
            }
            self.add_tag(tag, TagSource::Ai);
        }

        for tag in user_tags {
            self.add_tag(tag.as_ref(), TagSource::User);
        }
    }

    /// Replace every tag with exactly `tags`, all attributed to the user
    pub fn set_user_tags<T: AsRef<str>>(&mut self, tags: &[T]) {
        self.category_tags.clear();
        self.tag_sources.clear();
        for tag in tags {
            self.add_tag(tag.as_ref(), TagSource::User);
        }
    }

    /// Add a tag, or update the source of one already present
    pub fn add_tag(&mut self, tag: &str, source: TagSource) {
        let tag = tag.trim();
        if tag.is_empty() {
            return;
        }
        if self.tag_sources.insert(tag.to_string(), source).is_none() {
            self.category_tags.push(tag.to_string());
        }
    }

    /// Remove a tag; absent tags are ignored
    pub fn remove_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if self.tag_sources.remove(tag).is_some() {
            self.category_tags.retain(|t| t != tag);
        }
    }

    pub fn user_tags(&self) -> Vec<String> {
        self.tags_from(TagSource::User)
    }

    pub fn ai_tags(&self) -> Vec<String> {
        self.tags_from(TagSource::Ai)
    }

    fn tags_from(&self, source: TagSource) -> Vec<String> {
        self.category_tags
            .iter()
            .filter(|t| self.tag_sources.get(t.as_str()) == Some(&source))
            .cloned()
            .collect()
    }

    /// Check that the tag list and source map describe the same set of names
    pub fn is_consistent(&self) -> bool {
        let unique: HashSet<&String> = self.category_tags.iter().collect();
        unique.len() == self.category_tags.len()
            && self.category_tags.len() == self.tag_sources.len()
            && self
                .category_tags
                .iter()
                .all(|t| self.tag_sources.contains_key(t))
    }
}
