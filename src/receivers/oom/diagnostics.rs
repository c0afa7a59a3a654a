// SPDX-License-Identifier: Apache-2.0

//! Diagnostics raised while scanning.
//!
//! None of these stop the parser except [`Diagnostic::SourceTerminated`],
//! which is reported exactly once when the line source runs dry. The parser
//! reports through a [`DiagnosticSink`] it owns, so callers decide where the
//! messages go; [`TracingDiagnostics`] is the default.

use crate::receivers::oom::error::TerminalLineError;
use tracing::{error, warn};

#[derive(Debug)]
pub enum Diagnostic<'a> {
    /// A non-continuation line without the `;` envelope delimiter.
    MalformedEnvelope { line: &'a str },
    /// A line matched the "Killed process" shape but its fields did not parse.
    MalformedTerminalLine {
        line: &'a str,
        error: &'a TerminalLineError,
    },
    /// An OOM report was still open when the source ended; it is discarded.
    IncompleteEvent { container_name: &'a str },
    /// The consumer dropped its end of the event queue.
    ConsumerDisconnected,
    /// The line source ended. `error` is None for a clean end-of-stream.
    SourceTerminated { error: Option<&'a std::io::Error> },
}

pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic<'_>);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic<'_>) {
        match diagnostic {
            Diagnostic::MalformedEnvelope { line } => {
                warn!(line, "unrecognized kmsg line, expected a ';'");
            }
            Diagnostic::MalformedTerminalLine { line, error } => {
                error!(line, error = %error, "failed to parse killed process line");
            }
            Diagnostic::IncompleteEvent { container_name } => {
                warn!(
                    container_name,
                    "source ended inside an OOM report, discarding it"
                );
            }
            Diagnostic::ConsumerDisconnected => {
                warn!("OOM event consumer went away, OOM events will not be reported");
            }
            Diagnostic::SourceTerminated { error: Some(e) } => {
                warn!(error = %e, "OOM parser exited, OOM events will not be reported");
            }
            Diagnostic::SourceTerminated { error: None } => {
                warn!("OOM parser exited, OOM events will not be reported");
            }
        }
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn report(&self, diagnostic: Diagnostic<'_>) {
        (**self).report(diagnostic)
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn report(&self, diagnostic: Diagnostic<'_>) {
        (**self).report(diagnostic)
    }
}
