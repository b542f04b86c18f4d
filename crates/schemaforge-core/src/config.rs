use serde::{Deserialize, Serialize};

/// Inclusive character-count bounds for a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

/// Name length bounds per entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingRules {
    pub schema: LengthBounds,
    pub table: LengthBounds,
    pub column: LengthBounds,
    pub index: LengthBounds,
    pub constraint: LengthBounds,
    pub relationship: LengthBounds,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            schema: LengthBounds::new(1, 64),
            table: LengthBounds::new(1, 20),
            column: LengthBounds::new(1, 64),
            index: LengthBounds::new(1, 64),
            constraint: LengthBounds::new(1, 64),
            relationship: LengthBounds::new(1, 64),
        }
    }
}

/// Tunable behavior of the [`SchemaEditor`](crate::SchemaEditor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub naming: NamingRules,
    /// When false, deleting the only schema of a database is rejected.
    pub allow_delete_last_schema: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            naming: NamingRules::default(),
            allow_delete_last_schema: true,
        }
    }
}
