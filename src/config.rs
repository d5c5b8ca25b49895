//! Shim configuration file
//!
//! One `key=value` option per line, split at the first `=`:
//! - `runtime=<name>`: base name of the chained runtime module, resolved next
//!   to the shim with the platform's native module extension appended
//! - `maskExtension=<name>`: hide one instance extension (repeatable)
//!
//! Bad lines are logged with their line number and skipped. Loading never fails:
//! a missing file is an empty configuration.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a configuration line was ignored
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueKind {
    #[error("Unrecognized option `{0}'")]
    UnknownKey(String),

    #[error("Improperly formatted option")]
    MissingSeparator,

    #[error("Empty value for `{0}'")]
    EmptyValue(String),

    #[error("Parsing error: {0}")]
    Unreadable(String),
}

/// A skipped line, with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub line: usize,
    pub kind: ConfigIssueKind,
}

/// Parsed shim configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShimConfig {
    /// Base name of the chained runtime (None = nothing to forward to)
    pub runtime: Option<String>,

    /// Extensions to hide, in file order, duplicates kept
    pub masked_extensions: Vec<String>,

    /// Lines that were skipped
    pub issues: Vec<ConfigIssue>,
}

impl ShimConfig {
    /// Load the configuration file at `path`.
    ///
    /// An unreadable file is logged and yields the empty configuration.
    pub fn load(path: &Path) -> Self {
        match File::open(path) {
            Ok(file) => Self::parse(BufReader::new(file)),
            Err(e) => {
                tracing::warn!("Failed to open file `{}': {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse configuration lines from any reader.
    pub fn parse<R: BufRead>(reader: R) -> Self {
        let mut config = Self::default();

        for (index, raw) in reader.split(b'\n').enumerate() {
            let line_number = index + 1;

            // A read error repeats on every call, so stop at the first one.
            let bytes = match raw {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Failed to read configuration at L{}: {}", line_number, e);
                    break;
                }
            };

            let result = match String::from_utf8(bytes) {
                Ok(line) => config.apply_line(&line),
                Err(e) => Err(ConfigIssueKind::Unreadable(e.to_string())),
            };

            if let Err(kind) = result {
                tracing::warn!("L{}: {}", line_number, kind);
                config.issues.push(ConfigIssue {
                    line: line_number,
                    kind,
                });
            }
        }

        config
    }

    fn apply_line(&mut self, line: &str) -> Result<(), ConfigIssueKind> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return Ok(());
        }

        let (name, value) = line
            .split_once('=')
            .ok_or(ConfigIssueKind::MissingSeparator)?;

        match name {
            "runtime" => {
                if value.is_empty() {
                    return Err(ConfigIssueKind::EmptyValue(name.to_string()));
                }
                self.runtime = Some(value.to_string());
            }
            "maskExtension" => {
                tracing::info!("Masking extension: {}", value);
                self.masked_extensions.push(value.to_string());
            }
            _ => return Err(ConfigIssueKind::UnknownKey(name.to_string())),
        }

        Ok(())
    }

    /// Path of the chained runtime module, resolved against `module_dir`.
    pub fn runtime_path(&self, module_dir: &Path) -> Option<PathBuf> {
        self.runtime
            .as_ref()
            .map(|name| module_dir.join(format!("{}.{}", name, std::env::consts::DLL_EXTENSION)))
    }
}
