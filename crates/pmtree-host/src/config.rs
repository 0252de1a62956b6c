use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Settings for one hosted tree. Missing fields take their defaults, so
/// `{}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Prefix of generated node tags.
    pub tag_prefix: String,
    pub root_tag: String,
    /// Indent snapshots written by [`PmHost::save_json`].
    ///
    /// [`PmHost::save_json`]: crate::PmHost::save_json
    pub pretty_snapshots: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tag_prefix: String::from("pm"),
            root_tag: String::from("root"),
            pretty_snapshots: false,
        }
    }
}

impl HostConfig {
    pub fn from_json(text: &str) -> Result<Self, HostError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(HostError::io("read", path))?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
