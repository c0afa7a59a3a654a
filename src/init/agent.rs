// SPDX-License-Identifier: Apache-2.0

use crate::BoxError;
use crate::bounded_channel::bounded;
use crate::init::args::{AgentRun, OutputFormat};
use crate::init::wait;
use crate::receivers::oom::{OomInstance, OomReceiver};
use std::io::Write;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// How long to wait for the scan loop once its queue has closed.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

pub struct Agent {
    config: Box<AgentRun>,
}

impl Agent {
    pub fn new(config: Box<AgentRun>) -> Self {
        Self { config }
    }

    /// Streams OOM events from the configured device to `out` until the
    /// device stops producing lines.
    pub async fn run<W: Write>(self, out: &mut W) -> Result<(), BoxError> {
        let oom_config = self.config.oom_receiver.build_config();
        let (events_tx, mut events_rx) = bounded(oom_config.channel_size);

        let receiver = OomReceiver::new(oom_config, events_tx)?;
        let mut task_set = JoinSet::new();
        receiver.start(&mut task_set);

        let mut emitted: u64 = 0;
        while let Some(event) = events_rx.next().await {
            write_event(out, &event, self.config.output_format)?;
            emitted += 1;
            debug!(emitted, "OOM event written");
        }

        info!(emitted, "OOM event stream ended");
        wait::wait_for_tasks_with_timeout(&mut task_set, SHUTDOWN_TIMEOUT).await
    }
}

pub fn write_event<W: Write>(
    out: &mut W,
    event: &OomInstance,
    format: OutputFormat,
) -> Result<(), BoxError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, event)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            writeln!(
                out,
                "time_of_death={} pid={} process_name={} container_name={} victim_container_name={}",
                event.time_of_death.to_rfc3339(),
                event.pid,
                event.process_name,
                event.container_name,
                event.victim_container_name,
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::oom_receiver::OomReceiverArgs;
    use chrono::{Local, TimeZone};

    fn event() -> OomInstance {
        OomInstance {
            pid: 4821,
            process_name: "worker".to_string(),
            time_of_death: Local.with_ymd_and_hms(2024, 6, 13, 12, 34, 56).unwrap(),
            container_name: "/kubepods/podA".to_string(),
            victim_container_name: "/kubepods/podA/containerX".to_string(),
        }
    }

    #[test]
    fn test_write_event_json() {
        let mut out = Vec::new();
        write_event(&mut out, &event(), OutputFormat::Json).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        let back: OomInstance = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(back, event());
    }

    #[test]
    fn test_write_event_text() {
        let mut out = Vec::new();
        write_event(&mut out, &event(), OutputFormat::Text).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("time_of_death=2024-06-13T12:34:56"));
        assert!(text.contains(" pid=4821 process_name=worker "));
        assert!(text.trim_end().ends_with(
            "container_name=/kubepods/podA victim_container_name=/kubepods/podA/containerX"
        ));
    }

    #[tokio::test]
    async fn test_agent_writes_events_until_source_ends() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "6,1,10,-;invoked oom-killer: gfp_mask=0x201da\n\
             6,2,20,-;Jun 13 12:34:56 Killed process 1 (a)\n\
             6,3,30,-;invoked oom-killer: gfp_mask=0x201da\n\
             6,4,40,-;Jun 13 12:35:56 Killed process 2 (b)\n"
        )
        .unwrap();
        file.flush().unwrap();

        let config = AgentRun {
            output_format: OutputFormat::Json,
            oom_receiver: OomReceiverArgs {
                oom_device_path: file.path().to_path_buf(),
                oom_read_existing: true,
                oom_channel_size: Some(1),
            },
        };

        let mut out = Vec::new();
        Agent::new(Box::new(config)).run(&mut out).await.unwrap();

        let pids: Vec<u32> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<OomInstance>(l).unwrap().pid)
            .collect();
        assert_eq!(pids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_agent_fails_on_missing_device() {
        let config = AgentRun {
            output_format: OutputFormat::Json,
            oom_receiver: OomReceiverArgs {
                oom_device_path: "/nonexistent/kmsg".into(),
                ..Default::default()
            },
        };

        let mut out = Vec::new();
        let err = Agent::new(Box::new(config)).run(&mut out).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
