//! Closed value sets of the experiment: hidden modes, detector tags, the
//! mode-correlation policy and the per-trial outcome record.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Hidden per-trial variable coupling the two channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Detection probability of PLUS is cos²(φ).
    A,
    /// Detection probability of PLUS is sin²(φ).
    B,
}

impl Mode {
    /// The other mode.
    pub fn negate(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Outcome reported by one detector channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorTag {
    Plus,
    Minus,
}

impl DetectorTag {
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Plus => 0,
            Self::Minus => 1,
        }
    }
}

impl std::fmt::Display for DetectorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
        }
    }
}

/// Detector channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    One,
    Two,
}

/// How channel 2's mode is derived from channel 1's mode on each trial.
///
/// Has no `Default`; callers must name a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModePolicy {
    /// Both channels see the identical mode.
    Shared,
    /// Channel 2 sees the negation of channel 1's mode.
    Complementary,
}

impl ModePolicy {
    /// Channel 2's mode given channel 1's mode.
    pub fn second_mode(self, first: Mode) -> Mode {
        match self {
            Self::Shared => first,
            Self::Complementary => first.negate(),
        }
    }
}

impl std::fmt::Display for ModePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Complementary => write!(f, "complementary"),
        }
    }
}

impl std::str::FromStr for ModePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" | "same" => Ok(Self::Shared),
            "complementary" | "negated" | "opposite" => Ok(Self::Complementary),
            "" => Err(Error::MissingPolicy),
            other => Err(Error::UnknownPolicy(other.to_string())),
        }
    }
}

/// One trial: channel 1's mode plus both detector tags.
///
/// Channel 2's mode is not stored; it follows from the policy the trial was
/// generated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomePair {
    pub mode: Mode,
    pub tag1: DetectorTag,
    pub tag2: DetectorTag,
}

impl OutcomePair {
    pub fn new(mode: Mode, tag1: DetectorTag, tag2: DetectorTag) -> Self {
        Self { mode, tag1, tag2 }
    }

    /// Tag observed on `channel`.
    pub fn tag(&self, channel: Channel) -> DetectorTag {
        match channel {
            Channel::One => self.tag1,
            Channel::Two => self.tag2,
        }
    }
}
