pub mod commands;
pub mod prompt;

use clap::ValueEnum;

#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum CliFormat {
    /// One human-readable status line per action
    Text,
    /// One JSON object per action, then the run report
    Json,
}
