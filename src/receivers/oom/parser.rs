// SPDX-License-Identifier: Apache-2.0

//! OOM report state machine.
//!
//! The kernel logs an OOM kill as several lines:
//!
//! ```text
//! 6,123,456,-;ruby invoked oom-killer: gfp_mask=0x201da, order=0
//! ...
//! 6,124,456,-;Task in /mem2 killed as a result of limit of /mem3
//! ...
//! 6,125,456,-;Jun 13 12:34:56 Killed process 4821 (ruby)
//! ```
//!
//! The parser looks for the `invoked oom-killer:` line in envelope-stripped
//! text. From there on every raw line is checked for the attribution line
//! (last one wins) and the "Killed process" line, which completes the event.
//! Lines consumed while an event is open are never checked for a new start.

use crate::bounded_channel::BoundedSender;
use crate::receivers::oom::config::OomParserConfig;
use crate::receivers::oom::diagnostics::{Diagnostic, DiagnosticSink, TracingDiagnostics};
use crate::receivers::oom::error::{OomParserError, Result};
use crate::receivers::oom::framing::{Framed, strip_envelope};
use crate::receivers::oom::instance::{OomInstance, ROOT_CONTAINER};
use crate::receivers::oom::rules::{
    KilledProcess, KilledProcessLine, is_oom_start, match_container_attribution,
    match_killed_process,
};
use crate::receivers::oom::source::LineSource;
use chrono::{Datelike, Local};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

enum SourceState {
    Open,
    /// Ended with the given error, or cleanly on None; not yet reported.
    Ended(Option<io::Error>),
    Reported,
}

/// An OOM report between its start line and its "Killed process" line.
struct PendingOom {
    container_name: String,
    victim_container_name: String,
}

impl PendingOom {
    fn new() -> Self {
        Self {
            container_name: ROOT_CONTAINER.to_string(),
            victim_container_name: String::new(),
        }
    }

    fn apply_attribution(&mut self, line: &str) {
        if let Some(attribution) = match_container_attribution(line) {
            self.container_name = attribution.container_name;
            self.victim_container_name = attribution.victim_container_name;
        }
    }

    fn finish(self, killed: KilledProcess) -> OomInstance {
        OomInstance {
            pid: killed.pid,
            process_name: killed.process_name,
            time_of_death: killed.time_of_death,
            container_name: self.container_name,
            victim_container_name: self.victim_container_name,
        }
    }
}

/// Reads OOM kill events out of a kernel log stream.
pub struct OomParser<R, D = TracingDiagnostics> {
    lines: LineSource<R>,
    state: SourceState,
    diagnostics: D,
}

impl OomParser<File> {
    /// Opens `/dev/kmsg` and scans it from the start of the ring buffer.
    pub fn new() -> Result<Self> {
        Self::open(&OomParserConfig::default())
    }

    pub fn open(config: &OomParserConfig) -> Result<Self> {
        config.validate().map_err(OomParserError::Configuration)?;
        let file = open_source(&config.device_path, config.read_existing)?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> OomParser<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: LineSource::new(reader),
            state: SourceState::Open,
            diagnostics: TracingDiagnostics,
        }
    }
}

impl<R: Read, D: DiagnosticSink> OomParser<R, D> {
    /// Replaces where diagnostics are reported.
    pub fn with_diagnostics<S: DiagnosticSink>(self, diagnostics: S) -> OomParser<R, S> {
        OomParser {
            lines: self.lines,
            state: self.state,
            diagnostics,
        }
    }

    /// Blocks until the next complete OOM event. Returns None once the source
    /// has ended; the end is reported to the diagnostic sink exactly once.
    pub fn next_oom(&mut self) -> Option<OomInstance> {
        while let Some(line) = self.pull() {
            if !self.starts_report(&line) {
                continue;
            }
            if let Some(instance) = self.extract() {
                return Some(instance);
            }
        }

        self.report_termination();
        None
    }

    /// Pushes every event into `out` until the source ends, blocking while the
    /// queue is full. Never closes the consumer's receiving end.
    pub fn stream_ooms(mut self, out: BoundedSender<OomInstance>) {
        while let Some(instance) = self.next_oom() {
            debug!(
                pid = instance.pid,
                process_name = %instance.process_name,
                container_name = %instance.container_name,
                "OOM event parsed"
            );
            if out.send_blocking(instance).is_err() {
                self.diagnostics.report(Diagnostic::ConsumerDisconnected);
                return;
            }
        }
    }

    fn pull(&mut self) -> Option<String> {
        if !matches!(self.state, SourceState::Open) {
            return None;
        }
        match self.lines.next() {
            Some(Ok(line)) => Some(line),
            Some(Err(e)) => {
                self.state = SourceState::Ended(Some(e));
                None
            }
            None => {
                self.state = SourceState::Ended(None);
                None
            }
        }
    }

    fn report_termination(&mut self) {
        if let SourceState::Ended(error) = std::mem::replace(&mut self.state, SourceState::Reported)
        {
            self.diagnostics.report(Diagnostic::SourceTerminated {
                error: error.as_ref(),
            });
        }
    }

    fn starts_report(&self, line: &str) -> bool {
        let framed = strip_envelope(line);
        if let Framed::Unframed(line) = framed {
            self.diagnostics
                .report(Diagnostic::MalformedEnvelope { line });
        }
        is_oom_start(framed.message())
    }

    /// Consumes raw lines until one completes the open report.
    fn extract(&mut self) -> Option<OomInstance> {
        let mut pending = PendingOom::new();

        while let Some(line) = self.pull() {
            pending.apply_attribution(&line);

            let Some(matched) = killed_process_line(&line) else {
                continue;
            };
            match matched.resolve(Local::now().year()) {
                Ok(killed) => return Some(pending.finish(killed)),
                Err(error) => self.diagnostics.report(Diagnostic::MalformedTerminalLine {
                    line: &line,
                    error: &error,
                }),
            }
        }

        self.diagnostics.report(Diagnostic::IncompleteEvent {
            container_name: &pending.container_name,
        });
        None
    }
}

impl<R: Read, D: DiagnosticSink> Iterator for OomParser<R, D> {
    type Item = OomInstance;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_oom()
    }
}

/// The "Killed process" line is anchored at the start of the line. Syslog
/// style lines match as-is; `/dev/kmsg` lines match once the envelope is
/// removed.
fn killed_process_line(line: &str) -> Option<KilledProcessLine<'_>> {
    match_killed_process(line).or_else(|| match strip_envelope(line) {
        Framed::Message { message, .. } => match_killed_process(message),
        _ => None,
    })
}

fn open_source(path: &Path, read_existing: bool) -> Result<File> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => OomParserError::SourceUnavailable(path.to_path_buf()),
        _ => OomParserError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    if !read_existing {
        file.seek(SeekFrom::End(0))
            .map_err(|e| OomParserError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(device_path = %path.display(), "Seeked to end of kernel log");
    }

    Ok(file)
}
