//! Initial flag snapshots stored as TOML.
//!
//! ```toml
//! [flags]
//! LAMP_LIT = true
//! COINS = 12
//! PLAYER_NAME = "Ada"
//! ```
//!
//! Names are upper-cased on load and must match `[A-Z0-9_]+`.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::interpreter::checked_label;
use crate::value::Value;

/// Environment variable naming a default flag file.
pub const FLAGS_ENV_VAR: &str = "TUNASCRIPT_FLAGS";

/// On-disk layout of a flag file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FlagFile {
    #[serde(default)]
    flags: BTreeMap<String, Value>,
}

/// Load a flag snapshot from `path`.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid TOML, or names a
/// flag that does not match `[A-Z0-9_]+`.
pub fn load_flag_file(path: &Path) -> Result<HashMap<String, Value>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading flags from '{}'", path.display()))?;
    let flags = parse_flag_toml(&text).with_context(|| format!("parsing flags from '{}'", path.display()))?;
    info!("{} initial flag(s) loaded from '{}'", flags.len(), path.display());
    Ok(flags)
}

/// Parse flag-file TOML.
///
/// # Errors
/// Returns an error for invalid TOML or an invalid flag name.
pub fn parse_flag_toml(text: &str) -> Result<HashMap<String, Value>> {
    let file: FlagFile = toml::from_str(text)?;
    file.flags
        .into_iter()
        .map(|(name, value)| -> Result<(String, Value)> { Ok((checked_label(&name)?, value)) })
        .collect()
}

/// Render flags as flag-file TOML, sorted by name.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_flag_toml(flags: &HashMap<String, Value>) -> Result<String> {
    let file = FlagFile {
        flags: flags.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    };
    toml::to_string(&file).context("serializing flags")
}

/// The flag file named by `TUNASCRIPT_FLAGS`, if set and non-empty.
pub fn flags_path_from_env() -> Option<PathBuf> {
    env::var_os(FLAGS_ENV_VAR).filter(|v| !v.is_empty()).map(PathBuf::from)
}
