//! Site builder.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use xxhash_rust::xxh3::xxh3_64;

use crate::assets::AssetManifest;
use crate::report::{BuildStats, OutputAsset};
use crate::{minify, scripts, styles, templates};

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source site directory
    pub site_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Template context file, relative to the site directory
    pub data_file: String,

    /// Script entries: output name -> path relative to the site directory
    pub script_entries: BTreeMap<String, String>,

    /// Stylesheet entries, relative to the site directory. Empty means
    /// top-level stylesheets are discovered automatically.
    pub style_entries: Vec<String>,

    /// Append the minification stage
    pub minify: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let mut script_entries = BTreeMap::new();
        script_entries.insert("main".to_string(), "main.js".to_string());

        Self {
            site_dir: PathBuf::from("website"),
            output_dir: PathBuf::from("_target"),
            data_file: "data.json".to_string(),
            script_entries,
            style_entries: Vec::new(),
            minify: false,
        }
    }
}

/// One step of the build pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fingerprint images and fonts
    Assets,

    /// Render Handlebars entry templates
    Templates,

    /// Compile stylesheet entries
    Styles,

    /// Emit script entries
    Scripts,

    /// Rewrite emitted JS/CSS minified (only with `minify`)
    Minify,
}

/// Errors that can occur during a build pass.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse data file {path}: {message}")]
    Data { path: String, message: String },

    #[error("Failed to render template {path}: {message}")]
    Template { path: String, message: String },

    #[error("Failed to compile stylesheet {path}: {message}")]
    Style { path: String, message: String },

    #[error("Failed to compile script {path}: {message}")]
    Script { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },
}

/// Static site builder.
pub struct SiteBuilder {
    config: BuildConfig,
}

impl SiteBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The ordered stage list for this configuration. `minify` appends
    /// exactly one stage at the end.
    pub fn pipeline(&self) -> Vec<Stage> {
        let mut stages = vec![
            Stage::Assets,
            Stage::Templates,
            Stage::Styles,
            Stage::Scripts,
        ];
        if self.config.minify {
            stages.push(Stage::Minify);
        }
        stages
    }

    /// Run one build pass.
    pub async fn build(&self) -> Result<BuildStats, BuildError> {
        let start = Instant::now();
        let config = &self.config;

        if !config.site_dir.exists() {
            return Err(BuildError::Read {
                path: config.site_dir.display().to_string(),
                message: "site directory not found".to_string(),
            });
        }

        fs::create_dir_all(&config.output_dir).map_err(|e| BuildError::Write {
            path: config.output_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut emitted: Vec<OutputAsset> = Vec::new();
        let mut manifest = AssetManifest::default();

        for stage in self.pipeline() {
            match stage {
                Stage::Assets => {
                    let (collected, assets) =
                        AssetManifest::collect(&config.site_dir, &config.output_dir)?;
                    manifest = collected;
                    emitted.extend(assets);
                }
                Stage::Templates => emitted.extend(self.build_templates()?),
                Stage::Styles => emitted.extend(self.build_styles(&manifest)?),
                Stage::Scripts => emitted.extend(self.build_scripts()?),
                Stage::Minify => minify::run(&config.output_dir, &mut emitted)?,
            }
        }

        let stats = BuildStats::new(emitted, start.elapsed().as_millis() as u64);

        tracing::info!(
            "Built {} assets in {}ms",
            stats.assets.len(),
            stats.duration_ms
        );

        Ok(stats)
    }

    /// Render every entry template to `[name].html`.
    fn build_templates(&self) -> Result<Vec<OutputAsset>, BuildError> {
        let engine = templates::TemplateEngine::from_site(&self.config.site_dir)?;
        let data = templates::load_data(&self.config.site_dir.join(&self.config.data_file))?;

        let rendered: Vec<Result<(String, String), BuildError>> = engine
            .entries()
            .par_iter()
            .map(|name| engine.render(name, &data).map(|html| (name.clone(), html)))
            .collect();

        let mut emitted = Vec::new();
        for result in rendered {
            let (name, html) = result?;
            emitted.push(self.write_output(&format!("{name}.html"), html.as_bytes())?);
        }

        Ok(emitted)
    }

    /// Compile every stylesheet entry to `assets/[name].css`.
    fn build_styles(&self, manifest: &AssetManifest) -> Result<Vec<OutputAsset>, BuildError> {
        let mut emitted = Vec::new();

        for entry in self.style_entries() {
            let path = self.config.site_dir.join(&entry);
            if !path.exists() {
                tracing::warn!("Stylesheet entry not found: {}", path.display());
                continue;
            }

            let name = Path::new(&entry)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("main");
            let css = styles::compile(&path, &self.config.site_dir, manifest)?;
            emitted.push(self.write_output(&format!("assets/{name}.css"), css.as_bytes())?);
        }

        Ok(emitted)
    }

    /// Configured stylesheet entries, or the top-level stylesheets next to
    /// the templates when none are configured.
    fn style_entries(&self) -> Vec<String> {
        if !self.config.style_entries.is_empty() {
            return self.config.style_entries.clone();
        }

        let mut found = Vec::new();
        if let Ok(dir) = fs::read_dir(&self.config.site_dir) {
            for entry in dir.filter_map(|e| e.ok()) {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if matches!(ext, "scss" | "sass" | "less" | "css") {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        // Underscore-prefixed SCSS partials are imports,
                        // not entries.
                        if name.starts_with('_') {
                            continue;
                        }
                        found.push(name.to_string());
                    }
                }
            }
        }
        found.sort();
        found
    }

    /// Emit every script entry to `assets/[name].js`.
    fn build_scripts(&self) -> Result<Vec<OutputAsset>, BuildError> {
        let mut emitted = Vec::new();

        for (name, entry) in &self.config.script_entries {
            let path = self.config.site_dir.join(entry);
            if !path.exists() {
                tracing::warn!("Script entry not found: {}", path.display());
                continue;
            }

            let source = scripts::compile(&path)?;
            emitted.push(self.write_output(&format!("assets/{name}.js"), source.as_bytes())?);
        }

        Ok(emitted)
    }

    fn write_output(&self, relative: &str, contents: &[u8]) -> Result<OutputAsset, BuildError> {
        let target = self.config.output_dir.join(relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::Write {
                path: parent.display().to_string(),
                message: e.to_string(),
            })?;
        }
        fs::write(&target, contents).map_err(|e| BuildError::Write {
            path: target.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(OutputAsset {
            path: relative.to_string(),
            size: contents.len() as u64,
            hash: xxh3_64(contents),
        })
    }
}
