//! Build profile resolution
//!
//! A build selects exactly one profile, once, before any flag is composed.
//! The profile drives the conditional flag rule: debug builds disable
//! optimization, release builds disable logging output.

use crate::error::{BuildError, BuildResult};
use serde::{Serialize, Serializer};
use std::str::FromStr;

/// Build profile
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Unoptimized build with logging (default)
    Debug,
    /// Build with logging compiled out
    Release,
    /// Any other value, kept verbatim; neither conditional flag rule fires
    Unrecognized(String),
}

impl Profile {
    /// Get profile name
    pub fn name(&self) -> &str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Check if this is one of the supported profiles
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Debug | Self::Release)
    }
}

impl FromStr for Profile {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            _ => Err(BuildError::UnknownProfile(s.to_string())),
        }
    }
}

#[allow(clippy::derivable_impls)]
impl Default for Profile {
    fn default() -> Self {
        Self::Debug
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Profile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// What to do with a profile value that is neither `debug` nor `release`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownProfilePolicy {
    /// Keep the raw value; neither conditional flag rule fires
    #[default]
    PassThrough,
    /// Fail with a configuration error
    Reject,
}

/// Resolves the active profile from an optional external parameter
#[derive(Debug, Clone, Default)]
pub struct ProfileResolver {
    policy: UnknownProfilePolicy,
}

impl ProfileResolver {
    /// Create a resolver that passes unknown profiles through
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unknown-profile policy
    pub fn with_policy(mut self, policy: UnknownProfilePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Get the unknown-profile policy
    pub fn policy(&self) -> UnknownProfilePolicy {
        self.policy
    }

    /// Resolve the profile; an absent parameter means debug
    pub fn resolve(&self, raw: Option<&str>) -> BuildResult<Profile> {
        let Some(raw) = raw else {
            return Ok(Profile::Debug);
        };

        match raw.parse::<Profile>() {
            Ok(profile) => Ok(profile),
            Err(err) => match self.policy {
                UnknownProfilePolicy::Reject => Err(err),
                UnknownProfilePolicy::PassThrough => {
                    log::warn!(
                        "unrecognized profile '{}': no profile-specific flags will be added",
                        raw
                    );
                    Ok(Profile::Unrecognized(raw.to_string()))
                }
            },
        }
    }
}
