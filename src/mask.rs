//! Extension masking
//!
//! Decides which instance extensions are hidden from enumeration and applies
//! that decision to a materialized list of records.

use crate::xr::XrExtensionProperties;

/// Set of extension names to hide (empty = transparent passthrough)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionMask {
    /// Names in configuration order, duplicates kept
    names: Vec<String>,
}

impl ExtensionMask {
    /// A mask that hides nothing
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check whether an extension name (raw bytes, no NUL) is hidden
    pub fn should_mask(&self, extension_name: &[u8]) -> bool {
        self.names.iter().any(|name| name.as_bytes() == extension_name)
    }

    /// Remove every masked record, keeping the relative order of the rest
    pub fn apply(&self, properties: &mut Vec<XrExtensionProperties>) {
        if self.is_empty() {
            return;
        }
        properties.retain(|props| !self.should_mask(props.name_bytes()));
    }
}
