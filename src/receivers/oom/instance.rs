// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Root container, used when an OOM report carries no attribution line.
pub const ROOT_CONTAINER: &str = "/";

/// A single OOM kill reported by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OomInstance {
    /// Process id of the killed process
    pub pid: u32,
    /// Name of the killed process, as truncated by the kernel
    pub process_name: String,
    /// When the process was reported killed. The kernel line has no year, so
    /// the year is the wall-clock year at parse time.
    pub time_of_death: DateTime<Local>,
    /// Absolute name of the container that hit its memory limit
    pub container_name: String,
    /// Absolute name of the container whose process was killed; empty when
    /// the report had no attribution line
    pub victim_container_name: String,
}

/// Normalizes a container name to an absolute, lexically clean path:
/// duplicate separators and `.` segments are dropped, `..` never climbs past
/// the root and trailing separators are removed.
pub fn absolute_container_name(name: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return ROOT_CONTAINER.to_string();
    }

    let mut path = String::with_capacity(name.len() + 1);
    for segment in segments {
        path.push('/');
        path.push_str(segment);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_absolute_container_name() {
        assert_eq!(absolute_container_name("/kubepods/podA"), "/kubepods/podA");
        assert_eq!(absolute_container_name("docker/abc123"), "/docker/abc123");
        assert_eq!(absolute_container_name("/"), "/");
        assert_eq!(absolute_container_name(""), "/");
        assert_eq!(absolute_container_name("//a//b/"), "/a/b");
        assert_eq!(absolute_container_name("a/./b/../c"), "/a/c");
        assert_eq!(absolute_container_name("../../escape"), "/escape");
    }

    #[test]
    fn test_serializes_with_snake_case_fields() {
        let instance = OomInstance {
            pid: 4821,
            process_name: "worker".to_string(),
            time_of_death: Local.with_ymd_and_hms(2024, 6, 13, 12, 34, 56).unwrap(),
            container_name: "/kubepods/podA".to_string(),
            victim_container_name: "/kubepods/podA/containerX".to_string(),
        };

        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["pid"], 4821);
        assert_eq!(json["process_name"], "worker");
        assert_eq!(json["container_name"], "/kubepods/podA");
        assert_eq!(json["victim_container_name"], "/kubepods/podA/containerX");
        assert!(
            json["time_of_death"]
                .as_str()
                .unwrap()
                .starts_with("2024-06-13T12:34:56")
        );

        let back: OomInstance = serde_json::from_value(json).unwrap();
        assert_eq!(back, instance);
    }
}
