//! Shared credentials/config file parsing (`~/.aws/credentials`, `~/.aws/config`).

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Profile name → key → value.
pub(crate) type Profiles = HashMap<String, HashMap<String, String>>;

/// Which shared file is being read. Section naming differs between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProfileFile {
    /// `~/.aws/config`: `[default]` and `[profile name]`.
    Config,
    /// `~/.aws/credentials`: `[name]` only.
    Credentials,
}

/// Parse the INI-style profile format.
///
/// Comments start with `#` or `;`. Keys are lowercased.
pub(crate) fn parse_profiles(content: &str, file: ProfileFile) -> Profiles {
    let mut profiles = Profiles::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let section = section.trim();
            let name = match file {
                ProfileFile::Config => section
                    .strip_prefix("profile ")
                    .map(str::trim)
                    .unwrap_or(section),
                ProfileFile::Credentials => section,
            };
            profiles.entry(name.to_string()).or_default();
            current = Some(name.to_string());
            continue;
        }

        let (Some(profile), Some((key, value))) = (&current, line.split_once('=')) else {
            continue;
        };
        profiles
            .entry(profile.clone())
            .or_default()
            .insert(key.trim().to_lowercase(), value.trim().to_string());
    }

    profiles
}

/// Read and parse a profile file.
pub(crate) fn load_profiles(
    path: &Path,
    file: ProfileFile,
    on_error: fn(String) -> Error,
) -> Result<Profiles> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| on_error(format!("cannot read {}: {}", path.display(), e)))?;
    Ok(parse_profiles(&content, file))
}
