// ── Aggregator object registry ──

use std::collections::HashMap;

use tracing::debug;

use super::variants::{OBJECT_KEYWORD, collect_variants};

/// Object name of the aggregator's own manager.
pub const MANAGER_OBJECT: &str = "oams_manager";

/// Known aggregator objects, indexed by every lower-cased spelling.
#[derive(Debug, Default, Clone)]
pub struct ObjectRegistry {
    manager_available: bool,
    lookup: HashMap<String, String>,
}

impl ObjectRegistry {
    /// Replace the registry contents with the objects found in `names`.
    pub fn register_objects<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.manager_available = false;
        self.lookup.clear();

        for name in names {
            let name = name.as_ref();
            if name.eq_ignore_ascii_case(MANAGER_OBJECT) {
                self.manager_available = true;
                continue;
            }
            let is_unit_object = name
                .split_whitespace()
                .next()
                .is_some_and(|first| first.eq_ignore_ascii_case(OBJECT_KEYWORD));
            if !is_unit_object {
                continue;
            }
            for variant in collect_variants(name) {
                self.lookup
                    .entry(variant.to_lowercase())
                    .or_insert_with(|| name.to_owned());
            }
        }
        debug!(
            manager = self.manager_available,
            spellings = self.lookup.len(),
            "aggregator objects registered"
        );
    }

    /// Registered object name for a loosely spelled reference.
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        collect_variants(raw)
            .iter()
            .find_map(|variant| self.lookup.get(&variant.to_lowercase()))
            .map(String::as_str)
    }

    pub fn manager_available(&self) -> bool {
        self.manager_available
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}
