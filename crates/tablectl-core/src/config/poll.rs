//! Polling defaults stored per profile
//!
//! Kept in the profile so a slow project can wait longer without every
//! command needing `--wait-timeout`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::progress::PollOptions;

/// Poll interval and wait bound for a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between status reads
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seconds before giving up; 0 waits until cancelled
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PollConfig {
    pub fn to_options(&self) -> PollOptions {
        let timeout = match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        PollOptions::new(Duration::from_secs(self.interval_secs.max(1)), timeout)
    }
}

// Default value functions for serde
fn default_interval_secs() -> u64 {
    2
}

fn default_timeout_secs() -> u64 {
    600
}
