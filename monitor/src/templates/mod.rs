//! Prompt templates: the record types, the `{{...}}` placeholder engine,
//! the starter set and the persisted library.

pub mod defaults;
pub mod model;
pub mod placeholder;
pub mod store;

pub use defaults::default_templates;
pub use model::{NewTemplate, Placeholder, Template, TemplateCategory, TemplateUpdate};
pub use placeholder::{default_values, extract_variables, substitute_variables};
pub use store::{StoreError, TemplateStore, INITIALIZED_KEY, TEMPLATES_KEY};
