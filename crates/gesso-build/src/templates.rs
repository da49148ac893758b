//! Handlebars template rendering.
//!
//! Top-level `*.hbs` files in the site directory are entry templates; each one
//! becomes an output page. Files under `partials/` are registered as shared
//! fragments and referenced with `{{> name}}`. All templates render against
//! the context from `data.json`.

use std::fs;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde_json::Value;
use walkdir::WalkDir;

use crate::builder::BuildError;

/// Template engine wrapping a handlebars registry.
pub struct TemplateEngine {
    registry: Handlebars<'static>,
    entries: Vec<String>,
}

impl TemplateEngine {
    /// Register every entry template and partial found under `site_dir`.
    pub fn from_site(site_dir: &Path) -> Result<Self, BuildError> {
        let mut registry = Handlebars::new();
        let mut entries = Vec::new();

        let dir = fs::read_dir(site_dir).map_err(|e| BuildError::Read {
            path: site_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("hbs")
            })
            .collect();
        paths.sort();

        for path in &paths {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("index")
                .to_string();
            registry
                .register_template_file(&name, path)
                .map_err(|e| BuildError::Template {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            entries.push(name);
        }

        let partials_dir = site_dir.join("partials");
        if partials_dir.exists() {
            for entry in WalkDir::new(&partials_dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file()
                    || path.extension().and_then(|e| e.to_str()) != Some("hbs")
                {
                    continue;
                }

                let name = partial_name(&partials_dir, path);
                registry
                    .register_template_file(&name, path)
                    .map_err(|e| BuildError::Template {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })?;
            }
        }

        if entries.is_empty() {
            tracing::warn!("No entry templates (*.hbs) found in {}", site_dir.display());
        }

        Ok(Self { registry, entries })
    }

    /// Entry template names, in deterministic order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Render one entry template against the site data.
    pub fn render(&self, name: &str, data: &Value) -> Result<String, BuildError> {
        self.registry
            .render(name, data)
            .map_err(|e| BuildError::Template {
                path: format!("{name}.hbs"),
                message: e.to_string(),
            })
    }
}

/// Load the template context from `data.json`.
///
/// A missing data file renders templates against an empty object.
pub fn load_data(path: &Path) -> Result<Value, BuildError> {
    if !path.exists() {
        tracing::warn!(
            "{} not found, rendering templates with empty data",
            path.display()
        );
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let content = fs::read_to_string(path).map_err(|e| BuildError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| BuildError::Data {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Partial name: path relative to `partials/`, extension stripped, forward
/// slashes regardless of platform.
fn partial_name(partials_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(partials_dir).unwrap_or(path);
    relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
