use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use winbridge_common::WindowRole;

/// winbridge: window lifecycle and parameter bridge driven by JSON events on stdin.
#[derive(Parser, Debug)]
#[command(name = "winbridge", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter directive override (e.g. `debug`, `winbridge_core=trace`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Label of the window this process acts as. Defaults to the configured
    /// main label.
    #[arg(long)]
    pub label: Option<String>,

    /// Role of that window. Derived from the label when omitted.
    #[arg(long, value_enum)]
    pub role: Option<RoleArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Main,
    Secondary,
}

impl From<RoleArg> for WindowRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Main => WindowRole::Main,
            RoleArg::Secondary => WindowRole::Secondary,
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
