// SPDX-License-Identifier: Apache-2.0

//! Runs the blocking OOM scan loop alongside an async agent.

use crate::BoxError;
use crate::bounded_channel::BoundedSender;
use crate::receivers::oom::config::OomParserConfig;
use crate::receivers::oom::error::Result;
use crate::receivers::oom::instance::OomInstance;
use crate::receivers::oom::parser::OomParser;
use std::fs::File;
use std::path::PathBuf;
use tokio::task::JoinSet;
use tracing::info;

pub struct OomReceiver {
    device_path: PathBuf,
    parser: OomParser<File>,
    output: BoundedSender<OomInstance>,
}

impl OomReceiver {
    /// Opens the configured device. Fails before anything is spawned if the
    /// device is missing or cannot be opened.
    pub fn new(config: OomParserConfig, output: BoundedSender<OomInstance>) -> Result<Self> {
        let parser = OomParser::open(&config)?;

        info!(
            device_path = %config.device_path.display(),
            read_existing = config.read_existing,
            channel_size = config.channel_size,
            "OOM receiver initialized"
        );

        Ok(Self {
            device_path: config.device_path,
            parser,
            output,
        })
    }

    /// Moves the scan loop onto the blocking pool. The task finishes when the
    /// device stops producing lines or the consumer goes away.
    pub fn start(self, task_set: &mut JoinSet<std::result::Result<(), BoxError>>) {
        info!(device_path = %self.device_path.display(), "OOM receiver starting");

        let parser = self.parser;
        let output = self.output;
        task_set.spawn_blocking(move || {
            parser.stream_ooms(output);
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounded_channel::bounded;
    use crate::receivers::oom::error::OomParserError;
    use std::io::Write;

    #[tokio::test]
    async fn test_receiver_streams_file_events() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "6,1,10,-;invoked oom-killer: gfp_mask=0x201da").unwrap();
        writeln!(
            file,
            "6,2,20,-;Task in /docker/abc killed as a result of limit of /docker/abc"
        )
        .unwrap();
        writeln!(file, "6,3,30,-;Jun 13 12:34:56 Killed process 314 (java)").unwrap();
        file.flush().unwrap();

        let (tx, mut rx) = bounded(4);
        let config = OomParserConfig::default().with_device_path(file.path());
        let receiver = OomReceiver::new(config, tx).unwrap();

        let mut task_set = JoinSet::new();
        receiver.start(&mut task_set);

        let event = rx.next().await.unwrap();
        assert_eq!(event.pid, 314);
        assert_eq!(event.process_name, "java");
        assert_eq!(event.container_name, "/docker/abc");

        // The loop exits at end of file and drops its sender.
        assert!(task_set.join_next().await.unwrap().unwrap().is_ok());
        assert!(rx.next().await.is_none());
    }

    #[test]
    fn test_receiver_missing_device() {
        let (tx, _rx) = bounded(1);
        let config = OomParserConfig::default().with_device_path("/nonexistent/kmsg");
        assert!(matches!(
            OomReceiver::new(config, tx),
            Err(OomParserError::SourceUnavailable(_))
        ));
    }
}
