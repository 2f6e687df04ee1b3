//! Query term value objects: filter conditions, sort specs and
//! relation-resolution directives.
//!
//! # Design
//! Terms are immutable and built through named constructors. A constructor
//! either rejects its input with `ApiError::InvalidArgument` or renders the
//! typed payload (date, integer, float, list) into the exact wire string
//! right away, so the serializer never inspects value types.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::params::join_list;

/// Wire pattern for date filter values: `YYYY-MM-DD HH:mm`, 24-hour clock.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render a date the way date filters expect it.
pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Operation of a filter term. The string form is part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperation {
    Is,
    In,
    NotIn,
    Like,
    NotLike,
    AllInArray,
    InArray,
    GtDate,
    LtDate,
    GtInt,
    LtInt,
    GtFloat,
    LtFloat,
}

impl FilterOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperation::Is => "is",
            FilterOperation::In => "in",
            FilterOperation::NotIn => "not_in",
            FilterOperation::Like => "like",
            FilterOperation::NotLike => "not_like",
            FilterOperation::AllInArray => "all_in_array",
            FilterOperation::InArray => "in_array",
            FilterOperation::GtDate => "gt_date",
            FilterOperation::LtDate => "lt_date",
            FilterOperation::GtInt => "gt_int",
            FilterOperation::LtInt => "lt_int",
            FilterOperation::GtFloat => "gt_float",
            FilterOperation::LtFloat => "lt_float",
        }
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape check used by the `is` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnsureType {
    EmptyString,
    NotEmptyString,
    EmptyArray,
    NotEmptyArray,
    TrueBoolean,
    FalseBoolean,
}

impl EnsureType {
    pub fn as_str(self) -> &'static str {
        match self {
            EnsureType::EmptyString => "empty_string",
            EnsureType::NotEmptyString => "not_empty_string",
            EnsureType::EmptyArray => "empty_array",
            EnsureType::NotEmptyArray => "not_empty_array",
            EnsureType::TrueBoolean => "true_boolean",
            EnsureType::FalseBoolean => "false_boolean",
        }
    }
}

/// One `filter_query[<attribute>][<operation>]=<value>` condition.
///
/// The value is already in wire form. An empty value (for instance an
/// `in_array` over no elements) makes the term produce no parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    attribute: String,
    operation: FilterOperation,
    value: String,
}

impl FilterTerm {
    fn build(attribute: &str, operation: FilterOperation, value: String) -> Result<Self> {
        if attribute.trim().is_empty() {
            return Err(ApiError::invalid(format!(
                "filter `{operation}` needs a non-empty attribute"
            )));
        }
        Ok(Self {
            attribute: attribute.to_string(),
            operation,
            value,
        })
    }

    /// `is`: the attribute has the given shape.
    pub fn is(attribute: &str, ensure: EnsureType) -> Result<Self> {
        Self::build(attribute, FilterOperation::Is, ensure.as_str().to_string())
    }

    /// `in`: the attribute equals `value`.
    pub fn contains(attribute: &str, value: impl Into<String>) -> Result<Self> {
        Self::build(attribute, FilterOperation::In, value.into())
    }

    pub fn not_in(attribute: &str, value: impl Into<String>) -> Result<Self> {
        Self::build(attribute, FilterOperation::NotIn, value.into())
    }

    /// `like`: `*` in `pattern` is a wildcard on the server side.
    pub fn like(attribute: &str, pattern: impl Into<String>) -> Result<Self> {
        Self::build(attribute, FilterOperation::Like, pattern.into())
    }

    pub fn not_like(attribute: &str, pattern: impl Into<String>) -> Result<Self> {
        Self::build(attribute, FilterOperation::NotLike, pattern.into())
    }

    /// `all_in_array`: every element must be present in the array attribute.
    /// Elements are comma-joined verbatim; commas inside elements are not escaped.
    pub fn all_in_array<I, S>(attribute: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(attribute, FilterOperation::AllInArray, join_list(values))
    }

    /// `in_array`: at least one element must be present in the array attribute.
    pub fn in_array<I, S>(attribute: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(attribute, FilterOperation::InArray, join_list(values))
    }

    pub fn greater_than_date(attribute: &str, date: NaiveDateTime) -> Result<Self> {
        Self::build(attribute, FilterOperation::GtDate, format_date(&date))
    }

    pub fn less_than_date(attribute: &str, date: NaiveDateTime) -> Result<Self> {
        Self::build(attribute, FilterOperation::LtDate, format_date(&date))
    }

    pub fn greater_than_int(attribute: &str, value: i64) -> Result<Self> {
        Self::build(attribute, FilterOperation::GtInt, value.to_string())
    }

    pub fn less_than_int(attribute: &str, value: i64) -> Result<Self> {
        Self::build(attribute, FilterOperation::LtInt, value.to_string())
    }

    pub fn greater_than_float(attribute: &str, value: f64) -> Result<Self> {
        Self::build(attribute, FilterOperation::GtFloat, format_float(value)?)
    }

    pub fn less_than_float(attribute: &str, value: f64) -> Result<Self> {
        Self::build(attribute, FilterOperation::LtFloat, format_float(value)?)
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn operation(&self) -> FilterOperation {
        self.operation
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Parameter key: `filter_query[<attribute>][<operation>]`.
    pub fn key(&self) -> String {
        format!("filter_query[{}][{}]", self.attribute, self.operation)
    }
}

/// `f64`'s `Display` never switches to exponent notation, which is what the
/// API expects. Non-finite values have no decimal form.
fn format_float(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(ApiError::invalid(format!(
            "float filter value must be finite, got {value}"
        )));
    }
    Ok(value.to_string())
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Field a sort applies to: a top-level story attribute or a content field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    Attribute(String),
    Content(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// How the server should compare values of the sorted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortType {
    String,
    Int,
    Float,
}

impl SortType {
    pub fn as_str(self) -> &'static str {
        match self {
            SortType::String => "string",
            SortType::Int => "int",
            SortType::Float => "float",
        }
    }
}

/// `sort_by=<field>[:<order>][:<type>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    field: SortField,
    order: Option<SortOrder>,
    sort_type: Option<SortType>,
}

impl SortSpec {
    /// Build from the two mutually exclusive field slots. Exactly one must be set.
    pub fn new(attribute_field: Option<&str>, content_field: Option<&str>) -> Result<Self> {
        match (attribute_field, content_field) {
            (Some(_), Some(_)) => Err(ApiError::invalid(
                "sort spec takes either an attribute field or a content field, not both",
            )),
            (None, None) => Err(ApiError::invalid(
                "sort spec needs an attribute field or a content field",
            )),
            (Some(name), None) => Self::by_attribute(name),
            (None, Some(name)) => Self::by_content(name),
        }
    }

    pub fn by_attribute(name: &str) -> Result<Self> {
        Self::with_field(SortField::Attribute(non_empty(name, "sort attribute field")?))
    }

    pub fn by_content(name: &str) -> Result<Self> {
        Self::with_field(SortField::Content(non_empty(name, "sort content field")?))
    }

    fn with_field(field: SortField) -> Result<Self> {
        Ok(Self {
            field,
            order: None,
            sort_type: None,
        })
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn sort_type(mut self, sort_type: SortType) -> Self {
        self.sort_type = Some(sort_type);
        self
    }

    pub fn field(&self) -> &SortField {
        &self.field
    }

    /// Bare attribute name, or `content.<name>`.
    pub fn field_ref(&self) -> String {
        match &self.field {
            SortField::Attribute(name) => name.clone(),
            SortField::Content(name) => format!("content.{name}"),
        }
    }

    /// Wire value of the `sort_by` parameter.
    pub fn value(&self) -> String {
        let mut out = self.field_ref();
        if let Some(order) = self.order {
            out.push(':');
            out.push_str(order.as_str());
        }
        if let Some(sort_type) = self.sort_type {
            out.push(':');
            out.push_str(sort_type.as_str());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Relation resolution
// ---------------------------------------------------------------------------

/// Ask the server to inline the stories referenced by
/// `<component_name>.<field_name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelationDirective {
    component_name: String,
    field_name: String,
}

impl RelationDirective {
    pub fn new(component_name: &str, field_name: &str) -> Result<Self> {
        Ok(Self {
            component_name: non_empty(component_name, "relation component name")?,
            field_name: non_empty(field_name, "relation field name")?,
        })
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }
}

impl fmt::Display for RelationDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component_name, self.field_name)
    }
}

impl FromStr for RelationDirective {
    type Err = ApiError;

    /// Parses `component.field`; the field part may itself contain dots.
    fn from_str(s: &str) -> Result<Self> {
        let (component, field) = s.split_once('.').ok_or_else(|| {
            ApiError::invalid(format!("relation `{s}` is not of the form component.field"))
        })?;
        Self::new(component, field)
    }
}

impl TryFrom<String> for RelationDirective {
    type Error = ApiError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RelationDirective> for String {
    fn from(directive: RelationDirective) -> Self {
        directive.to_string()
    }
}

fn non_empty(value: &str, what: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!("{what} must not be empty")));
    }
    Ok(value.to_string())
}
