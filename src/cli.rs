// CLI module - command-line argument parsing and config handlers
//
// Subcommands:
// - serve: static dev server over the site directory
// - render: run the full headless pipeline and report loading stats
// - bundle: assemble dist/ (dev|build|prod)
// - config: --show / --reset / --path management

use crate::bundle::BundleMode;
use crate::config::{Config, VERSION};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Agora - headless component engine for a discussion page
#[derive(Parser)]
#[command(name = "agora")]
#[command(version = VERSION)]
#[command(about = "Component engine and dev tooling for a discussion page", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the site directory over HTTP
    Serve {
        /// Port to bind (falls forward when taken)
        #[arg(long)]
        port: Option<u16>,

        /// Site directory to serve
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Load every component headlessly and print the loading report
    Render {
        /// Site directory to load from
        #[arg(long, conflicts_with = "url")]
        dir: Option<PathBuf>,

        /// Base URL of a served site to load over HTTP instead
        #[arg(long)]
        url: Option<String>,
    },

    /// Assemble the site into dist/
    Bundle {
        /// Build flavor
        #[arg(value_enum, default_value = "build")]
        mode: ModeArg,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(ValueEnum, Clone, Copy)]
pub enum ModeArg {
    Dev,
    Build,
    Prod,
}

impl From<ModeArg> for BundleMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Dev => BundleMode::Dev,
            ModeArg::Build => BundleMode::Build,
            ModeArg::Prod => BundleMode::Prod,
        }
    }
}

/// Handle the config subcommand. Returns true when something was done.
pub fn handle_config(show: bool, reset: bool, path: bool) -> bool {
    let config_path = Config::config_path();

    if path {
        println!("{}", config_path.display());
        return true;
    }

    if reset {
        if let Some(parent) = config_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::write(&config_path, Config::default().to_toml()) {
            Ok(()) => println!("Config reset: {}", config_path.display()),
            Err(error) => eprintln!("Failed to reset config: {error}"),
        }
        return true;
    }

    if show {
        println!("{}", Config::from_env().to_toml());
        return true;
    }

    false
}
