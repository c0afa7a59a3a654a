// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Path to the kernel message device
pub const KMSG_DEVICE_PATH: &str = "/dev/kmsg";

/// Default number of finished events that may wait for the consumer before
/// the scan loop blocks
pub const DEFAULT_CHANNEL_SIZE: usize = 100;

/// Configuration for opening an OOM parser over a kernel log device
#[derive(Debug, Clone)]
pub struct OomParserConfig {
    /// Device (or file) to read newline-delimited kernel messages from
    pub device_path: PathBuf,

    /// Whether to scan messages already in the kernel ring buffer on startup.
    /// If false, the source is positioned at the end and only new messages are read.
    pub read_existing: bool,

    /// Capacity of the event queue between the scan loop and its consumer
    pub channel_size: usize,
}

impl Default for OomParserConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(KMSG_DEVICE_PATH),
            read_existing: true,
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }
}

impl OomParserConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.device_path.as_os_str().is_empty() {
            return Err("Device path must not be empty".to_string());
        }

        if self.channel_size == 0 {
            return Err("Channel size must be at least 1, got 0".to_string());
        }

        Ok(())
    }

    pub fn with_device_path(mut self, device_path: impl Into<PathBuf>) -> Self {
        self.device_path = device_path.into();
        self
    }

    pub fn with_read_existing(mut self, read_existing: bool) -> Self {
        self.read_existing = read_existing;
        self
    }

    pub fn with_channel_size(mut self, channel_size: usize) -> Self {
        self.channel_size = channel_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OomParserConfig::default();
        assert_eq!(config.device_path, PathBuf::from("/dev/kmsg"));
        assert!(config.read_existing);
        assert_eq!(config.channel_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = OomParserConfig::default()
            .with_device_path("/var/log/kern.log")
            .with_read_existing(false)
            .with_channel_size(8);

        assert_eq!(config.device_path, PathBuf::from("/var/log/kern.log"));
        assert!(!config.read_existing);
        assert_eq!(config.channel_size, 8);
    }

    #[test]
    fn test_validate_invalid_channel_size() {
        let config = OomParserConfig::default().with_channel_size(0);
        assert_eq!(
            config.validate(),
            Err("Channel size must be at least 1, got 0".to_string())
        );
    }

    #[test]
    fn test_validate_empty_device_path() {
        let config = OomParserConfig::default().with_device_path("");
        assert_eq!(
            config.validate(),
            Err("Device path must not be empty".to_string())
        );
    }
}
