// SPDX-License-Identifier: Apache-2.0

use crate::receivers::oom::config::{DEFAULT_CHANNEL_SIZE, KMSG_DEVICE_PATH, OomParserConfig};
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Args, Clone, Deserialize)]
#[serde(default)]
pub struct OomReceiverArgs {
    /// Kernel log device to scan for OOM killer reports
    #[arg(long, env = "OOMWATCH_DEVICE_PATH", default_value = KMSG_DEVICE_PATH)]
    pub oom_device_path: PathBuf,

    /// Scan messages already in the kernel ring buffer on startup
    #[arg(
        long,
        env = "OOMWATCH_READ_EXISTING",
        default_value = "true",
        action = clap::ArgAction::Set
    )]
    pub oom_read_existing: bool,

    /// Number of parsed events that may queue before the scan loop blocks (default: 100)
    #[arg(long, env = "OOMWATCH_CHANNEL_SIZE")]
    pub oom_channel_size: Option<usize>,
}

impl Default for OomReceiverArgs {
    fn default() -> Self {
        Self {
            oom_device_path: PathBuf::from(KMSG_DEVICE_PATH),
            oom_read_existing: true,
            oom_channel_size: None,
        }
    }
}

impl OomReceiverArgs {
    pub fn build_config(&self) -> OomParserConfig {
        OomParserConfig::default()
            .with_device_path(self.oom_device_path.clone())
            .with_read_existing(self.oom_read_existing)
            .with_channel_size(self.oom_channel_size.unwrap_or(DEFAULT_CHANNEL_SIZE))
    }
}
