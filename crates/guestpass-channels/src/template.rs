//! Per-language HTML templates (`template-<lang>.html`).
//!
//! Templates are read on every render so edits apply without a restart.
//! A missing template is a delivery failure for that guest only.

use std::path::{Path, PathBuf};

use guestpass_core::error::{GuestPassError, Result};
use guestpass_core::types::Language;
use minijinja::{Environment, context};

pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(language: Language) -> String {
        format!("template-{}.html", language.code())
    }

    /// Render the template for `language`. Variables: `unique_id`, `name`.
    pub async fn render(&self, language: Language, unique_id: &str, name: &str) -> Result<String> {
        let file_name = Self::file_name(language);
        let path = self.dir.join(&file_name);
        let source = tokio::fs::read_to_string(&path).await.map_err(|e| {
            GuestPassError::Delivery(format!("Template {} unavailable: {e}", path.display()))
        })?;

        // The .html name turns on HTML auto-escaping.
        let env = Environment::new();
        let template = env
            .template_from_named_str(&file_name, &source)
            .map_err(|e| GuestPassError::Delivery(format!("Template {file_name} invalid: {e}")))?;
        template
            .render(context! { unique_id => unique_id, name => name })
            .map_err(|e| GuestPassError::Delivery(format!("Template {file_name} render: {e}")))
    }
}
