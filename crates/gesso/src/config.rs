//! Site configuration file (site.toml).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use gesso_build::BuildConfig;
use serde::Deserialize;

/// Configuration file structure (site.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    site: SiteSection,
    #[serde(default)]
    scripts: ScriptsSection,
    #[serde(default)]
    styles: StylesSection,
    #[serde(default)]
    build: BuildSection,
}

#[derive(Debug, Deserialize)]
struct SiteSection {
    #[serde(default = "default_site_dir")]
    dir: String,
    #[serde(default = "default_output")]
    output: String,
    #[serde(default = "default_data")]
    data: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            dir: default_site_dir(),
            output: default_output(),
            data: default_data(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ScriptsSection {
    /// Output name -> entry path relative to the site directory
    entries: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize, Default)]
struct StylesSection {
    /// Stylesheet entry paths relative to the site directory
    entries: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct BuildSection {
    #[serde(default)]
    minify: bool,
}

fn default_site_dir() -> String {
    "website".to_string()
}
fn default_output() -> String {
    "_target".to_string()
}
fn default_data() -> String {
    "data.json".to_string()
}

/// Load configuration from site.toml if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

impl ConfigFile {
    /// Resolve the file values plus CLI overrides into a `BuildConfig`.
    pub fn into_build_config(self, output: Option<PathBuf>, minimize: bool) -> BuildConfig {
        let defaults = BuildConfig::default();

        BuildConfig {
            site_dir: PathBuf::from(self.site.dir),
            output_dir: output.unwrap_or_else(|| PathBuf::from(self.site.output)),
            data_file: self.site.data,
            script_entries: self.scripts.entries.unwrap_or(defaults.script_entries),
            style_entries: self.styles.entries.unwrap_or_default(),
            minify: minimize || self.build.minify,
        }
    }
}
