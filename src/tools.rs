//! External tool detection.

use crate::{Error, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Command;

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// The set of encoder names the local ffmpeg build offers.
///
/// Detected once and passed to command builders so that builder output is a
/// pure function of its inputs. Tests construct inventories from fixed name
/// lists instead of probing.
#[derive(Debug, Clone, Default)]
pub struct EncoderInventory {
    available: HashSet<String>,
}

impl EncoderInventory {
    /// Probe the local ffmpeg for its encoder list.
    ///
    /// Returns an empty inventory when ffmpeg is missing or the listing
    /// fails; builders then fall back to generic encoder names.
    pub fn detect() -> Self {
        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .output();

        let Ok(output) = output else {
            return Self::default();
        };
        if !output.status.success() {
            return Self::default();
        }

        Self::parse_encoder_listing(&String::from_utf8_lossy(&output.stdout))
    }

    /// Build an inventory from explicit encoder names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the named encoder is available.
    pub fn contains(&self, name: &str) -> bool {
        self.available.contains(name)
    }

    // `ffmpeg -encoders` lines look like " V....D libx264   H.264 ...";
    // the second column is the encoder name.
    fn parse_encoder_listing(listing: &str) -> Self {
        let mut available = HashSet::new();
        let mut in_table = false;
        for line in listing.lines() {
            if !in_table {
                // The listing header ends with a "------" separator.
                if line.trim_start().starts_with("---") {
                    in_table = true;
                }
                continue;
            }
            let mut cols = line.split_whitespace();
            let (Some(flags), Some(name)) = (cols.next(), cols.next()) else {
                continue;
            };
            if flags.len() >= 6 {
                available.insert(name.to_string());
            }
        }
        Self { available }
    }
}
