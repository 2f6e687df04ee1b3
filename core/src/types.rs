//! Response entities of the delivery API.
//!
//! # Design
//! Plain serde records. Only the identifying fields are required; list-like
//! fields the API omits for some stories (`tag_list`, `alternates`,
//! `translated_slugs`) default to empty, everything else is optional.
//! `content` stays a raw JSON value because its shape is user-defined.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published or draft content entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    pub uuid: Uuid,
    pub name: String,
    pub slug: String,
    pub full_slug: String,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub first_published_at: Option<String>,
    #[serde(default)]
    pub sort_by_date: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub tag_list: Vec<String>,
    #[serde(default)]
    pub is_startpage: bool,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub release_id: Option<u64>,
    #[serde(default)]
    pub default_full_slug: Option<String>,
    #[serde(default)]
    pub alternates: Vec<Alternate>,
    #[serde(default)]
    pub translated_slugs: Vec<TranslatedSlug>,
}

/// Same story in another folder or language tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternate {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub full_slug: String,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub parent_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedSlug {
    pub path: String,
    pub name: Option<String>,
    pub lang: String,
}

/// One page of a multi-story fetch.
///
/// `total` and `per_page` come from the `Total` and `Per-Page` response
/// headers and are 0 when the header is absent or not a number.
#[derive(Debug, Clone, PartialEq)]
pub struct StoriesPage {
    pub stories: Vec<Story>,
    pub rels: Vec<Story>,
    pub total: u64,
    pub per_page: u64,
}

/// `{"story": {...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct StoryEnvelope {
    pub story: Story,
}

/// `{"stories": [...], "rels": [...]}`
#[derive(Debug, Deserialize)]
pub(crate) struct StoriesEnvelope {
    pub stories: Vec<Story>,
    #[serde(default)]
    pub rels: Vec<Story>,
}

/// `{"space": {"version": 42, ...}}`. The version may arrive as a number or
/// a string.
#[derive(Debug, Deserialize)]
pub(crate) struct SpaceEnvelope {
    pub space: Space,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Space {
    pub version: Option<serde_json::Value>,
}
