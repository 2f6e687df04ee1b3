//! Parameter serializer: options and query terms to query-string pairs.
//!
//! # Design
//! `QueryParams` is a key-unique map with last-write-wins semantics, so
//! overlapping options never fail. Iteration order is the sorted key order,
//! which keeps generated URLs deterministic.
//!
//! An empty value is never sent. Joining an empty list yields `""`, and the
//! `insert_*` helpers drop empty values, so "present but empty" behaves
//! exactly like "absent".
//!
//! Key names are a wire contract with the delivery API.

use std::collections::BTreeMap;

use crate::options::{StoriesQuery, StoryQuery, StorySelector};
use crate::query::{FilterTerm, RelationDirective, SortSpec};

pub const TOKEN: &str = "token";
pub const CACHE_VERSION: &str = "cv";
pub const FIND_BY: &str = "find_by";
pub const VERSION: &str = "version";
pub const RESOLVE_LINKS: &str = "resolve_links";
pub const RESOLVE_RELATIONS: &str = "resolve_relations";
pub const FROM_RELEASE: &str = "from_release";
pub const LANGUAGE: &str = "language";
pub const FALLBACK_LANGUAGE: &str = "fallback_language";
pub const FALLBACK_LANG: &str = "fallback_lang";
pub const STARTS_WITH: &str = "starts_with";
pub const BY_UUIDS: &str = "by_uuids";
pub const BY_UUIDS_ORDERED: &str = "by_uuids_ordered";
pub const EXCLUDING_IDS: &str = "excluding_ids";
pub const EXCLUDING_FIELDS: &str = "excluding_fields";
pub const SEARCH_TERM: &str = "search_term";
pub const IS_STARTPAGE: &str = "is_startpage";
pub const WITH_TAG: &str = "with_tag";
pub const PAGE: &str = "page";
pub const PER_PAGE: &str = "per_page";
pub const SORT_BY: &str = "sort_by";

/// Join list elements with a single comma. Empty input yields `""`.
pub fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(item.as_ref());
    }
    out
}

/// `"1"` / `"0"`.
pub fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Value of `resolve_relations`: each directive followed by a comma,
/// including the last one (`author.ref,`). Empty input yields `""`.
pub fn relations_value(directives: &[RelationDirective]) -> String {
    directives.iter().map(|d| format!("{d},")).collect()
}

/// Key-unique query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value. Empty values are
    /// dropped and leave a previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.entries.insert(key.into(), value);
    }

    pub fn insert_opt<V: ToString>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value.to_string());
        }
    }

    pub fn insert_flag(&mut self, key: &str, value: Option<bool>) {
        if let Some(value) = value {
            self.insert(key, flag(value));
        }
    }

    pub fn insert_list<I, S>(&mut self, key: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(key, join_list(items));
    }

    pub fn insert_filter(&mut self, term: &FilterTerm) {
        self.insert(term.key(), term.value());
    }

    pub fn insert_sort(&mut self, spec: &SortSpec) {
        self.insert(SORT_BY, spec.value());
    }

    pub fn insert_relations(&mut self, directives: &[RelationDirective]) {
        self.insert(RESOLVE_RELATIONS, relations_value(directives));
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries.into_iter().collect()
    }
}

/// Parameters for a single-story fetch addressed by `selector`, which the
/// caller resolved with `StoryQuery::selector`.
pub fn story_params(query: &StoryQuery, selector: &StorySelector) -> QueryParams {
    let mut params = QueryParams::new();
    if let StorySelector::Uuid(_) = selector {
        params.insert(FIND_BY, "uuid");
    }
    params.insert_opt(VERSION, query.version.map(|v| v.as_str()));
    params.insert_flag(RESOLVE_LINKS, query.resolve_links);
    params.insert_relations(&query.resolve_relations);
    params.insert_opt(FROM_RELEASE, query.from_release);
    params.insert_opt(LANGUAGE, query.language.as_deref());
    params.insert_opt(FALLBACK_LANGUAGE, query.fallback_language.as_deref());
    params
}

/// Parameters for a multi-story fetch.
pub fn stories_params(query: &StoriesQuery) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert_opt(VERSION, query.version.map(|v| v.as_str()));
    params.insert_flag(RESOLVE_LINKS, query.resolve_links);
    params.insert_relations(&query.resolve_relations);
    params.insert_opt(FROM_RELEASE, query.from_release);
    params.insert_opt(LANGUAGE, query.language.as_deref());
    params.insert_opt(FALLBACK_LANG, query.fallback_lang.as_deref());
    params.insert_opt(STARTS_WITH, query.starts_with.as_deref());
    params.insert_list(BY_UUIDS, query.by_uuids.iter().map(|u| u.to_string()));
    params.insert_list(
        BY_UUIDS_ORDERED,
        query.by_uuids_ordered.iter().map(|u| u.to_string()),
    );
    params.insert_list(EXCLUDING_IDS, query.excluding_ids.iter().map(|i| i.to_string()));
    params.insert_list(EXCLUDING_FIELDS, &query.excluding_fields);
    params.insert_opt(SEARCH_TERM, query.search_term.as_deref());
    params.insert_flag(IS_STARTPAGE, query.is_startpage);
    params.insert_list(WITH_TAG, &query.with_tag);
    for term in &query.filters {
        params.insert_filter(term);
    }
    if let Some(spec) = &query.sort_by {
        params.insert_sort(spec);
    }
    params.insert_opt(PAGE, query.page);
    params.insert_opt(PER_PAGE, query.per_page);
    params
}
