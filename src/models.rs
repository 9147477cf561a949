// Core data structures for the sitewatch monitor engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// How a field value is read from its matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldKind {
    /// Trimmed text content of the element
    #[default]
    #[serde(rename = "text")]
    Text,
    /// Value of one attribute of the element
    #[serde(rename = "attr", alias = "attribute")]
    Attribute,
}

impl FieldKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Attribute => "attr",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute read by an `Attribute` field when none is configured
pub const DEFAULT_ATTRIBUTE: &str = "href";

/// Defines how to pull one scalar value out of an item root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Key of the value in the extracted item
    pub name: String,

    /// CSS selector evaluated against the item root
    pub selector: String,

    /// Attribute name for `Attribute` fields (defaults to `href`)
    #[serde(
        rename = "attr",
        alias = "attribute",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attribute: Option<String>,

    /// Value source
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: FieldKind,

    /// Named transform applied to the raw value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

impl FieldSpec {
    /// Text field
    pub fn text(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            attribute: None,
            kind: FieldKind::Text,
            transform: None,
        }
    }

    /// Attribute field
    pub fn attribute(
        name: impl Into<String>,
        selector: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            attribute: Some(attribute.into()),
            kind: FieldKind::Attribute,
            transform: None,
        }
    }

    /// Set transform
    pub fn with_transform(mut self, transform: impl Into<String>) -> Self {
        self.transform = Some(transform.into());
        self
    }

    /// Attribute actually read for `Attribute` fields
    pub fn attribute_name(&self) -> &str {
        self.attribute
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(DEFAULT_ATTRIBUTE)
    }
}

/// Selector-based description of how to turn markup into items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    /// Scopes the search
    pub container: String,

    /// Repeated element inside the container; absent means the container is the item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,

    /// Ordered field definitions
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl ExtractionSchema {
    /// Create a schema
    pub fn new(container: impl Into<String>, item: Option<&str>, fields: Vec<FieldSpec>) -> Self {
        Self {
            container: container.into(),
            item: item.map(str::to_string),
            fields,
        }
    }

    /// Item selector, treating an empty string as absent
    pub fn item_selector(&self) -> Option<&str> {
        self.item.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// One observed entity, e.g. one forum post
///
/// Field names are unique; iteration order is by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedItem(BTreeMap<String, String>);

impl ExtractedItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field value, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Value used to recognize the same item across checks.
    ///
    /// `title` when present and non-empty, else a non-empty `name`.
    pub fn identity_key(&self) -> Option<&str> {
        self.get("title")
            .filter(|v| !v.is_empty())
            .or_else(|| self.get("name").filter(|v| !v.is_empty()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtractedItem {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Full state of a site at the last successful check
pub type Snapshot = Vec<ExtractedItem>;

/// Live status of one monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub name: String,
    pub url: String,
    pub is_running: bool,
    pub last_check: Option<DateTime<Utc>>,
    /// Duration of the last check in milliseconds
    pub last_duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    pub updates_count: u64,
    pub next_check: Option<DateTime<Utc>>,
    pub check_interval_secs: u64,
    pub total_checks: u64,
    pub consecutive_failures: u32,
}

impl MonitorStatus {
    /// Status of a monitor that has never been checked
    pub fn new(name: impl Into<String>, url: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            is_running: false,
            last_check: None,
            last_duration_ms: 0,
            last_error: None,
            last_update: None,
            updates_count: 0,
            next_check: None,
            check_interval_secs: interval.as_secs(),
            total_checks: 0,
            consecutive_failures: 0,
        }
    }

    /// Whether at least one check finished
    pub fn has_checked(&self) -> bool {
        self.last_check.is_some()
    }
}
