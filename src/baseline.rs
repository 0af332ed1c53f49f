// Write-once baseline shared between the aggregator (sole writer) and the poll workers.

use std::sync::OnceLock;

#[derive(Debug, Default)]
pub struct BaselineCell {
    value: OnceLock<String>,
}

impl BaselineCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded baseline; an empty string leaves the cell unset.
    pub fn with_value(value: Option<String>) -> Self {
        let cell = Self::new();
        if let Some(v) = value {
            cell.set_if_unset(&v);
        }
        cell
    }

    /// Empty until the first non-empty value is set.
    pub fn get(&self) -> &str {
        self.value.get().map(String::as_str).unwrap_or("")
    }

    pub fn is_set(&self) -> bool {
        self.value.get().is_some()
    }

    /// Sets the baseline if it is unset and `value` is non-empty. Returns true if this call set it.
    pub fn set_if_unset(&self, value: &str) -> bool {
        if value.is_empty() || self.is_set() {
            return false;
        }
        self.value.set(value.to_string()).is_ok()
    }

    /// A value counts as changed only against a known baseline.
    pub fn differs(&self, observed: &str) -> bool {
        let baseline = self.get();
        !baseline.is_empty() && !observed.is_empty() && observed != baseline
    }
}
