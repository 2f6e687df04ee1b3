//! Typed client for a headless CMS content-delivery API.
//!
//! # Overview
//! Turns structured query objects (filters, sort specs, relation hints,
//! pagination) into the API's flat query parameters, fetches stories, and
//! decodes them into typed values. A client-scoped cache version (`cv`) is
//! attached to content requests so the CDN bypasses stale cache entries.
//!
//! # Design
//! - `query` holds the immutable term types; values are rendered to wire
//!   strings when a term is constructed.
//! - `params` maps options and terms to a key-unique parameter map.
//! - `DeliveryApi` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse` (host-does-IO pattern).
//! - `ContentClient` drives those through a `Transport` and owns the
//!   `CacheVersion` state.
//!
//! ```no_run
//! use cdn_core::{ClientConfig, ContentClient, StoriesQuery, StoryQuery};
//!
//! # fn main() -> cdn_core::Result<()> {
//! let client = ContentClient::new(ClientConfig::new("my-token"))?;
//! client.invalidate()?;
//! let home = client.fetch_one(&StoryQuery::by_slug("home"))?;
//! let page = client.fetch_multiple(&StoriesQuery {
//!     starts_with: Some("blog/".into()),
//!     per_page: Some(10),
//!     ..Default::default()
//! })?;
//! println!("{} and {} of {} posts", home.name, page.stories.len(), page.total);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod options;
pub mod params;
pub mod query;
pub mod types;

pub use cache::{CacheState, CacheVersion};
pub use client::DeliveryApi;
pub use config::{CacheRefreshFailure, ClientConfig};
pub use error::{ApiError, Result};
pub use fetcher::ContentClient;
#[cfg(feature = "ureq")]
pub use http::UreqTransport;
pub use http::{HttpRequest, HttpResponse, Transport};
pub use options::{StoriesQuery, StoryQuery, StorySelector, Version};
pub use params::QueryParams;
pub use query::{
    EnsureType, FilterOperation, FilterTerm, RelationDirective, SortField, SortOrder, SortSpec,
    SortType,
};
pub use types::{Alternate, StoriesPage, Story, TranslatedSlug};
