//! The template library.
//!
//! [`TemplateStore`] keeps the whole collection in memory and writes all of
//! it back through its [`KeyValueStore`] after every change. Two keys are
//! used: one for the collection and one flag recording that the starter
//! templates were seeded. The flag is never cleared, so deleting every
//! template does not bring the defaults back.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::defaults::default_templates;
use super::model::{NewTemplate, Template, TemplateCategory, TemplateUpdate};
use super::placeholder::substitute_variables;
use crate::persistence::{KeyValueStore, PersistenceError};

/// Key holding the template collection.
pub const TEMPLATES_KEY: &str = "cursorHelper.promptTemplates";

/// Key holding the "defaults were seeded" flag.
pub const INITIALIZED_KEY: &str = "cursorHelper.templatesInitialized";

/// Errors returned by [`TemplateStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// No template has the given id.
    #[error("template not found: {0}")]
    NotFound(String),

    /// The persistence layer failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The stored collection does not have the expected shape.
    #[error("stored templates are malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// CRUD, search and usage tracking over a persisted template collection.
#[derive(Debug)]
pub struct TemplateStore<P: KeyValueStore> {
    persistence: P,
    templates: Vec<Template>,
}

impl<P: KeyValueStore> TemplateStore<P> {
    /// Loads the collection, seeding the default templates on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be read or decoded,
    /// or if seeding cannot be persisted.
    pub fn open(persistence: P) -> Result<Self> {
        let templates = match persistence.get(TEMPLATES_KEY)? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };

        let mut store = Self {
            persistence,
            templates,
        };

        let initialized = matches!(
            store.persistence.get(INITIALIZED_KEY)?,
            Some(Value::Bool(true))
        );
        if !initialized {
            let defaults = default_templates();
            let count = defaults.len();
            for template in defaults {
                store.templates.push(Template::from_new(template));
            }
            store.save()?;
            store.persistence.set(INITIALIZED_KEY, Value::Bool(true))?;
            info!(count, "Initialized default templates");
        }

        debug!(count = store.templates.len(), "Template library loaded");
        Ok(store)
    }

    /// Adds a template with a fresh id, timestamps set to now and a zero use count.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be persisted.
    pub fn create(&mut self, new: NewTemplate) -> Result<Template> {
        let template = Template::from_new(new);
        self.templates.push(template.clone());
        self.save()?;

        info!(id = %template.id, name = %template.name, "Created template");
        Ok(template)
    }

    /// Merges `changes` into the template and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id, or an error if the
    /// collection cannot be persisted.
    pub fn update(&mut self, id: &str, changes: TemplateUpdate) -> Result<Template> {
        let template = self
            .templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        changes.apply_to(template);
        template.updated_at = Utc::now().max(template.created_at);
        let updated = template.clone();
        self.save()?;

        info!(id, name = %updated.name, "Updated template");
        Ok(updated)
    }

    /// Removes one template.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id, or an error if the
    /// collection cannot be persisted.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let index = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        self.templates.remove(index);
        self.save()?;

        info!(id, "Deleted template");
        Ok(())
    }

    /// Looks up a template by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Every template, in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Template] {
        &self.templates
    }

    /// Number of stored templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when the library holds no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates in `category`.
    #[must_use]
    pub fn by_category(&self, category: TemplateCategory) -> Vec<&Template> {
        self.templates
            .iter()
            .filter(|t| t.category == category)
            .collect()
    }

    /// Case-insensitive substring search over name, description, tags and content.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Template> {
        let needle = query.to_lowercase();
        self.templates
            .iter()
            .filter(|t| t.matches_lowercase(&needle))
            .collect()
    }

    /// Bumps the use count and `updated_at`. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be persisted.
    pub fn increment_use_count(&mut self, id: &str) -> Result<()> {
        let Some(template) = self.templates.iter_mut().find(|t| t.id == id) else {
            debug!(id, "Use count not incremented, template missing");
            return Ok(());
        };

        template.use_count = template.use_count.saturating_add(1);
        template.updated_at = Utc::now().max(template.created_at);
        self.save()
    }

    /// Up to `count` templates, most recently updated first.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&Template> {
        let mut sorted: Vec<&Template> = self.templates.iter().collect();
        sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sorted.truncate(count);
        sorted
    }

    /// Up to `count` templates, most used first.
    #[must_use]
    pub fn popular(&self, count: usize) -> Vec<&Template> {
        let mut sorted: Vec<&Template> = self.templates.iter().collect();
        sorted.sort_by(|a, b| b.use_count.cmp(&a.use_count));
        sorted.truncate(count);
        sorted
    }

    /// A copy of the whole collection.
    #[must_use]
    pub fn export(&self) -> Vec<Template> {
        self.templates.clone()
    }

    /// Adds every template whose id is not already present and returns how
    /// many were added.
    ///
    /// Existing records are never overwritten, so importing the same batch
    /// twice adds nothing the second time. Within the batch the first record
    /// for an id wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be persisted.
    pub fn import(&mut self, batch: Vec<Template>) -> Result<usize> {
        let mut ids: HashSet<String> = self.templates.iter().map(|t| t.id.clone()).collect();
        let before = self.templates.len();

        for template in batch {
            if ids.insert(template.id.clone()) {
                self.templates.push(template);
            } else {
                debug!(id = %template.id, "Skipping imported template with existing id");
            }
        }

        let added = self.templates.len() - before;
        if added > 0 {
            self.save()?;
            info!(count = added, "Imported templates");
        }
        Ok(added)
    }

    /// Substitutes `values` into the template and counts it as used.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id, or an error if the
    /// use count cannot be persisted.
    pub fn render(&mut self, id: &str, values: &HashMap<String, String>) -> Result<String> {
        let template = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let text = substitute_variables(&template.content, values);
        self.increment_use_count(id)?;
        Ok(text)
    }

    /// Gives back the persistence handle.
    pub fn into_inner(self) -> P {
        self.persistence
    }

    fn save(&mut self) -> Result<()> {
        let value = serde_json::to_value(&self.templates)?;
        self.persistence.set(TEMPLATES_KEY, value)?;
        Ok(())
    }
}
