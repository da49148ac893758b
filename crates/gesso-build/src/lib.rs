//! Build pipeline for gesso static sites.
//!
//! Compiles a Handlebars-templated source directory (templates, SCSS/LESS/CSS
//! stylesheets, script entries, image and font assets) into a static output
//! directory.

pub mod assets;
pub mod builder;
pub mod minify;
pub mod report;
pub mod scripts;
pub mod styles;
pub mod templates;

pub use builder::{BuildConfig, BuildError, SiteBuilder, Stage};
pub use report::{BuildStats, OutputAsset};
