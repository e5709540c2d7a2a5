use core::fmt;

use serde::{Deserialize, Serialize};

/// Ground-truth state of the monitored agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Hypothesis {
    Safe = 0,
    Hacking = 1,
}

impl Hypothesis {
    pub const ALL: [Hypothesis; 2] = [Hypothesis::Safe, Hypothesis::Hacking];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Hypothesis::Safe => "SAFE",
            Hypothesis::Hacking => "HACKING",
        };
        f.write_str(label)
    }
}

/// Behavioural signal seen by the monitor at one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Observation {
    Suspicious = 0,
    Normal = 1,
}

impl Observation {
    pub const ALL: [Observation; 2] = [Observation::Suspicious, Observation::Normal];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_suspicious(self) -> bool {
        matches!(self, Observation::Suspicious)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Observation::Suspicious => "SUSPICIOUS",
            Observation::Normal => "NORMAL",
        };
        f.write_str(label)
    }
}
