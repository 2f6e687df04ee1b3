//! Fetch options for single-story and multi-story requests.
//!
//! All dimensions are optional; `params` turns them into query pairs.
//! Fields are public so callers can use struct-update syntax:
//! `StoriesQuery { page: Some(2), ..Default::default() }`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::query::{FilterTerm, RelationDirective, SortSpec};

/// Content version to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Version {
    Draft,
    Published,
}

impl Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Version::Draft => "draft",
            Version::Published => "published",
        }
    }
}

/// The one field a single story is looked up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorySelector {
    FullSlug(String),
    Id(u64),
    Uuid(Uuid),
}

impl StorySelector {
    /// Path segment after `stories/`.
    pub fn path_segment(&self) -> String {
        match self {
            StorySelector::FullSlug(slug) => slug.trim_matches('/').to_string(),
            StorySelector::Id(id) => id.to_string(),
            StorySelector::Uuid(uuid) => uuid.to_string(),
        }
    }
}

/// Options for fetching one story. Exactly one of `full_slug`, `id`, `uuid`
/// must be set; `selector()` enforces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryQuery {
    pub full_slug: Option<String>,
    pub id: Option<u64>,
    pub uuid: Option<Uuid>,
    pub version: Option<Version>,
    pub resolve_links: Option<bool>,
    pub resolve_relations: Vec<RelationDirective>,
    pub from_release: Option<u64>,
    pub language: Option<String>,
    pub fallback_language: Option<String>,
}

impl StoryQuery {
    pub fn by_slug(full_slug: impl Into<String>) -> Self {
        Self {
            full_slug: Some(full_slug.into()),
            ..Default::default()
        }
    }

    pub fn by_id(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_uuid(uuid: Uuid) -> Self {
        Self {
            uuid: Some(uuid),
            ..Default::default()
        }
    }

    /// Resolve the single selector, rejecting zero or several.
    pub fn selector(&self) -> Result<StorySelector> {
        let set = [self.full_slug.is_some(), self.id.is_some(), self.uuid.is_some()]
            .iter()
            .filter(|s| **s)
            .count();
        if set > 1 {
            return Err(ApiError::invalid(
                "a story is selected by exactly one of full_slug, id or uuid",
            ));
        }
        if let Some(slug) = &self.full_slug {
            if slug.trim_matches('/').is_empty() {
                return Err(ApiError::invalid("full_slug must not be empty"));
            }
            return Ok(StorySelector::FullSlug(slug.clone()));
        }
        if let Some(id) = self.id {
            return Ok(StorySelector::Id(id));
        }
        if let Some(uuid) = self.uuid {
            return Ok(StorySelector::Uuid(uuid));
        }
        Err(ApiError::invalid("a story needs a full_slug, id or uuid"))
    }
}

/// Options for listing stories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoriesQuery {
    pub version: Option<Version>,
    pub resolve_links: Option<bool>,
    pub resolve_relations: Vec<RelationDirective>,
    pub from_release: Option<u64>,
    pub language: Option<String>,
    pub fallback_lang: Option<String>,
    pub starts_with: Option<String>,
    pub by_uuids: Vec<Uuid>,
    pub by_uuids_ordered: Vec<Uuid>,
    pub excluding_ids: Vec<u64>,
    pub excluding_fields: Vec<String>,
    pub search_term: Option<String>,
    pub is_startpage: Option<bool>,
    pub with_tag: Vec<String>,
    pub filters: Vec<FilterTerm>,
    pub sort_by: Option<SortSpec>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
