// SPDX-License-Identifier: Apache-2.0

//! Kernel OOM killer event receiver
//!
//! Scans the kernel message stream (`/dev/kmsg` by default) for OOM killer
//! reports and turns each one into an [`OomInstance`]. The scan runs as a
//! single blocking loop; events are handed to the consumer one at a time, in
//! the order the kernel logged them.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod framing;
pub mod instance;
pub mod parser;
pub mod receiver;
pub mod rules;
pub mod source;

pub use config::OomParserConfig;
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingDiagnostics};
pub use error::{OomParserError, Result};
pub use instance::OomInstance;
pub use parser::OomParser;
pub use receiver::OomReceiver;
