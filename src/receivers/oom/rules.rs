// SPDX-License-Identifier: Apache-2.0

//! The three line patterns that make up an OOM report, compiled once and
//! shared by every parser.

use crate::receivers::oom::error::TerminalLineError;
use crate::receivers::oom::instance::absolute_container_name;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use regex::Regex;
use std::sync::LazyLock;

static OOM_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"invoked oom-killer:").expect("valid OOM start pattern"));

static CONTAINER_ATTRIBUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Task in (.*) killed as a result of limit of (.*)")
        .expect("valid container attribution pattern")
});

// The text between the timestamp and "Killed process" (hostname, kernel
// uptime) may be absent.
static KILLED_PROCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Z][a-z]{2} .*[0-9]{1,2} [0-9]{1,2}:[0-9]{2}:[0-9]{2}) (?:.* )?Killed process ([0-9]+) \((\w+)\)",
    )
    .expect("valid killed process pattern")
});

/// `Jan _2 15:04:05` with the year appended
const TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S %Y";

/// Whether the message text opens an OOM report.
pub fn is_oom_start(message: &str) -> bool {
    OOM_START.is_match(message)
}

/// Containers named by a "Task in ... killed as a result of limit of ..." line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerAttribution {
    pub container_name: String,
    pub victim_container_name: String,
}

pub fn match_container_attribution(line: &str) -> Option<ContainerAttribution> {
    let caps = CONTAINER_ATTRIBUTION.captures(line)?;
    Some(ContainerAttribution {
        container_name: absolute_container_name(&caps[1]),
        victim_container_name: absolute_container_name(&caps[2]),
    })
}

/// Fields of a line that has the "Killed process" shape, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KilledProcessLine<'a> {
    pub timestamp: &'a str,
    pub pid: &'a str,
    pub process_name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KilledProcess {
    pub pid: u32,
    pub process_name: String,
    pub time_of_death: DateTime<Local>,
}

pub fn match_killed_process(line: &str) -> Option<KilledProcessLine<'_>> {
    let caps = KILLED_PROCESS.captures(line)?;
    Some(KilledProcessLine {
        timestamp: caps.get(1)?.as_str(),
        pid: caps.get(2)?.as_str(),
        process_name: caps.get(3)?.as_str(),
    })
}

impl KilledProcessLine<'_> {
    /// Parses the timestamp in the local timezone, assuming it was logged
    /// during `year`, and the pid.
    pub fn resolve(&self, year: i32) -> Result<KilledProcess, TerminalLineError> {
        let value = format!("{} {}", self.timestamp, year);
        let naive = NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT).map_err(|e| {
            TerminalLineError::Timestamp {
                value: value.clone(),
                source: e,
            }
        })?;
        let time_of_death = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| TerminalLineError::NonexistentLocalTime(value.clone()))?;

        let pid = self
            .pid
            .parse::<u32>()
            .map_err(|e| TerminalLineError::Pid {
                value: self.pid.to_string(),
                source: e,
            })?;

        Ok(KilledProcess {
            pid,
            process_name: self.process_name.to_string(),
            time_of_death,
        })
    }
}
