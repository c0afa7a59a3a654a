// SPDX-License-Identifier: Apache-2.0

use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced to the caller while constructing a parser.
#[derive(Error, Debug)]
pub enum OomParserError {
    #[error("'{}' does not exist; unable to parse for OOM events", .0.display())]
    SourceUnavailable(PathBuf),

    #[error("I/O error opening {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, OomParserError>;

/// Why a line that looked like a "Killed process" line could not be turned
/// into an event. Never fatal; only reported through diagnostics.
#[derive(Error, Debug)]
pub enum TerminalLineError {
    #[error("failed to parse timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("timestamp '{0}' does not exist in the local timezone")]
    NonexistentLocalTime(String),

    #[error("failed to parse pid '{value}': {source}")]
    Pid {
        value: String,
        #[source]
        source: ParseIntError,
    },
}
