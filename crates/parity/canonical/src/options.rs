use serde::{Deserialize, Serialize};

/// Knobs for the canonical form builder.
///
/// The defaults describe the OpenMM system XML layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanonicalOptions {
    /// Prefix of particle-reference keys (`p1`, `p2`, ...).
    pub ordinal_prefix: String,

    /// Key holding the named, repeated sub-blocks.
    pub block_key: String,

    /// Field carrying a block's type.
    pub block_type_field: String,

    /// Field carrying a block's name.
    pub block_name_field: String,

    /// Block types removed before comparison.
    pub block_denylist: Vec<String>,

    /// Keys whose values are version strings and never coerced to numbers.
    pub version_keys: Vec<String>,
}

impl Default for CanonicalOptions {
    fn default() -> Self {
        Self {
            ordinal_prefix: "p".to_string(),
            block_key: "Forces".to_string(),
            block_type_field: "type".to_string(),
            block_name_field: "name".to_string(),
            block_denylist: vec!["CMMotionRemover".to_string()],
            version_keys: vec!["openmmVersion".to_string()],
        }
    }
}

impl CanonicalOptions {
    pub fn with_denied_block(mut self, block_type: impl Into<String>) -> Self {
        self.block_denylist.push(block_type.into());
        self
    }

    pub fn with_version_key(mut self, key: impl Into<String>) -> Self {
        self.version_keys.push(key.into());
        self
    }

    pub fn is_version_key(&self, key: &str) -> bool {
        self.version_keys.iter().any(|k| k == key)
    }

    pub fn is_denied(&self, block_type: &str) -> bool {
        self.block_denylist.iter().any(|t| t == block_type)
    }
}
