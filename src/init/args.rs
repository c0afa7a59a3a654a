// SPDX-License-Identifier: Apache-2.0

use crate::init::oom_receiver::OomReceiverArgs;
use clap::{Args, ValueEnum};
use serde::Deserialize;

#[derive(Debug, Args, Clone)]
pub struct AgentRun {
    /// How each OOM event is written to stdout
    #[arg(
        value_enum,
        long,
        env = "OOMWATCH_OUTPUT_FORMAT",
        default_value = "json"
    )]
    pub output_format: OutputFormat,

    #[command(flatten)]
    pub oom_receiver: OomReceiverArgs,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// One `key=value` line per event
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        run: AgentRun,
    }

    #[test]
    fn test_parse_flags() {
        let cli = TestCli::parse_from([
            "oomwatch",
            "--output-format",
            "text",
            "--oom-device-path",
            "/tmp/kmsg",
            "--oom-read-existing",
            "false",
            "--oom-channel-size",
            "16",
        ]);

        assert_eq!(cli.run.output_format, OutputFormat::Text);
        let config = cli.run.oom_receiver.build_config();
        assert_eq!(config.device_path, PathBuf::from("/tmp/kmsg"));
        assert!(!config.read_existing);
        assert_eq!(config.channel_size, 16);
    }
}
