//! Command-line configuration for the `roster` binary.

use crate::infrastructure::DEFAULT_DATA_FILE;
use clap::Parser;
use std::path::PathBuf;

/// Student roster: grades, attendance and a JSON data file.
#[derive(Debug, Clone, Parser)]
#[command(name = "roster", version, about)]
pub struct Cli {
    /// Path of the JSON data file
    #[arg(long, env = "ROSTER_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Use the text menu instead of the terminal UI
    #[arg(long)]
    pub menu: bool,

    /// Add demo students if the roster is empty
    #[arg(long)]
    pub demo: bool,

    /// Write log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Which front end to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontEnd {
    Terminal,
    Menu,
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub front_end: FrontEnd,
    pub seed_demo: bool,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl AppConfig {
    /// The terminal UI always logs to a file, next to the data file unless
    /// one was given.
    pub fn from_cli(cli: Cli) -> Self {
        let front_end = if cli.menu { FrontEnd::Menu } else { FrontEnd::Terminal };
        let log_file = match (cli.log_file, front_end) {
            (Some(path), _) => Some(path),
            (None, FrontEnd::Terminal) => Some(default_log_file(&cli.data_file)),
            (None, FrontEnd::Menu) => None,
        };
        Self {
            data_file: cli.data_file,
            front_end,
            seed_demo: cli.demo,
            log_file,
            verbose: cli.verbose,
        }
    }
}

fn default_log_file(data_file: &std::path::Path) -> PathBuf {
    data_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join("roster.log"))
        .unwrap_or_else(|| PathBuf::from("roster.log"))
}
