//! Gesso CLI - Handlebars static site build tool.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use gesso_build::SiteBuilder;
use tracing_subscriber::{fmt, EnvFilter};

mod config;

#[derive(Parser)]
#[command(name = "gesso")]
#[command(about = "Compile a Handlebars-templated website into a static output directory")]
#[command(version)]
pub struct Cli {
    /// Rebuild continuously as source files change
    #[arg(long)]
    watch: bool,

    /// Append a minification pass for emitted JS and CSS
    #[arg(long)]
    minimize: bool,

    /// Path to site.toml config file
    #[arg(short, long, default_value = "site.toml")]
    config: PathBuf,

    /// Output directory (defaults to config or "_target")
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let file_config = config::load(&cli.config)?;
    let build_config = file_config.into_build_config(cli.output, cli.minimize);

    let builder = SiteBuilder::new(build_config);

    if cli.watch {
        gesso_watch::rebuild_on_change(builder, |stats| println!("{stats}")).await?;
    } else {
        let stats = builder.build().await?;
        println!("{stats}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_default_to_off() {
        let cli = Cli::try_parse_from(["gesso"]).unwrap();

        assert!(!cli.watch);
        assert!(!cli.minimize);
        assert!(!cli.verbose);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(cli.output.is_none());
    }

    #[test]
    fn flags_are_presence_only_and_order_independent() {
        let a = Cli::try_parse_from(["gesso", "--watch", "--minimize"]).unwrap();
        let b = Cli::try_parse_from(["gesso", "--minimize", "--watch"]).unwrap();

        assert!(a.watch && a.minimize);
        assert!(b.watch && b.minimize);

        // Presence-only: a value is rejected.
        assert!(Cli::try_parse_from(["gesso", "--watch=yes"]).is_err());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["gesso", "--uglify"]).is_err());
    }
}
