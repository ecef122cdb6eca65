//! Template records and the caller-facing shapes used to create and edit them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::placeholder::extract_variables;

/// Prefix of every template id.
pub const TEMPLATE_ID_PREFIX: &str = "tpl_";

/// Number of random characters after the prefix.
const TEMPLATE_ID_SUFFIX_LEN: usize = 20;

/// Fixed set of template categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Refactoring,
    Debugging,
    Testing,
    Documentation,
    Optimization,
    General,
}

impl TemplateCategory {
    /// Every category, in display order.
    pub const ALL: [TemplateCategory; 6] = [
        Self::Refactoring,
        Self::Debugging,
        Self::Testing,
        Self::Documentation,
        Self::Optimization,
        Self::General,
    ];

    /// Lowercase name as stored on disk.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Refactoring => "refactoring",
            Self::Debugging => "debugging",
            Self::Testing => "testing",
            Self::Documentation => "documentation",
            Self::Optimization => "optimization",
            Self::General => "general",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown category '{s}' (expected one of: refactoring, debugging, testing, \
                     documentation, optimization, general)"
                )
            })
    }
}

/// A `{{name:description:default}}` slot found in template content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `Some("")` for an explicitly empty default, `None` when no default was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// A stored prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Assigned by the store, never changes.
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub category: TemplateCategory,

    pub content: String,

    /// Cached placeholder metadata. May be empty; see [`Template::placeholders`].
    #[serde(default)]
    pub variables: Vec<Placeholder>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub use_count: u64,
}

impl Template {
    /// Builds a fresh record from caller input with a new id and both
    /// timestamps set to now.
    #[must_use]
    pub fn from_new(new: NewTemplate) -> Self {
        let now = Utc::now();
        Self {
            id: generate_template_id(),
            name: new.name,
            description: new.description,
            category: new.category,
            content: new.content,
            variables: new.variables,
            tags: new.tags,
            created_at: now,
            updated_at: now,
            use_count: 0,
        }
    }

    /// Placeholders of this template.
    ///
    /// Uses the cached `variables` when present and otherwise extracts them
    /// from `content`.
    #[must_use]
    pub fn placeholders(&self) -> Vec<Placeholder> {
        if self.variables.is_empty() {
            extract_variables(&self.content)
        } else {
            self.variables.clone()
        }
    }

    /// Case-insensitive substring match over name, description, tags and content.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
            || self.content.to_lowercase().contains(needle)
    }
}

/// Fields a caller supplies when creating a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: TemplateCategory,
    pub content: String,
    #[serde(default)]
    pub variables: Vec<Placeholder>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewTemplate {
    /// Starts a template with no description, variables or tags.
    pub fn new(
        name: impl Into<String>,
        category: TemplateCategory,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            category,
            content: content.into(),
            variables: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Caches the placeholders found in `content`.
    #[must_use]
    pub fn with_extracted_variables(mut self) -> Self {
        self.variables = extract_variables(&self.content);
        self
    }
}

/// Partial edit of a template. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub category: Option<TemplateCategory>,
    pub content: Option<String>,
    pub variables: Option<Vec<Placeholder>>,
    pub tags: Option<Vec<String>>,
}

impl TemplateUpdate {
    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the set fields over `template`. Timestamps are the caller's job.
    pub(crate) fn apply_to(self, template: &mut Template) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(description) = self.description {
            template.description = description;
        }
        if let Some(category) = self.category {
            template.category = category;
        }
        if let Some(content) = self.content {
            template.content = content;
        }
        if let Some(variables) = self.variables {
            template.variables = variables;
        }
        if let Some(tags) = self.tags {
            template.tags = tags;
        }
    }
}

/// Generates an id of the form `tpl_` followed by 20 lowercase alphanumerics.
pub(crate) fn generate_template_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::rng();
    let suffix: String = (0..TEMPLATE_ID_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("{TEMPLATE_ID_PREFIX}{suffix}")
}
