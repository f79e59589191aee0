//! Unique display names within a scene

use crate::core::uuid::Uuid;
use std::collections::HashMap;

/// Live entity names plus a per-base hint for the next free " (n)" suffix.
///
/// The hint is only a starting point: every suffix below it is known to be in
/// use, and each candidate is still checked against the live names.
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    live: HashMap<String, Uuid>,
    next_suffix: HashMap<String, u32>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.live.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<Uuid> {
        self.live.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Smallest free name for `base`: `base` itself, else "base (n)"
    pub fn unique_name(&mut self, base: &str) -> String {
        if !self.live.contains_key(base) {
            return base.to_string();
        }

        let mut suffix = self.next_suffix.get(base).copied().unwrap_or(1).max(1);
        loop {
            let candidate = format!("{base} ({suffix})");
            if !self.live.contains_key(&candidate) {
                self.next_suffix.insert(base.to_string(), suffix + 1);
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Register a name, de-duplicating it first; returns the name actually used
    pub fn claim(&mut self, base: &str, uuid: Uuid) -> String {
        let name = self.unique_name(base);
        self.live.insert(name.clone(), uuid);
        name
    }

    /// Register a name verbatim, e.g. one restored from a scene document
    pub fn insert(&mut self, name: String, uuid: Uuid) {
        self.live.insert(name, uuid);
    }

    pub fn release(&mut self, name: &str) {
        if self.live.remove(name).is_none() {
            return;
        }

        if let Some((base, suffix)) = split_suffix(name) {
            if let Some(hint) = self.next_suffix.get_mut(base) {
                if suffix < *hint {
                    *hint = suffix;
                }
            }
        }

        self.prune();
    }

    /// Drop hints whose base no longer prefixes any live name
    fn prune(&mut self) {
        let live = &self.live;
        self.next_suffix
            .retain(|base, _| live.keys().any(|name| name.starts_with(base.as_str())));
    }
}

/// Split "base (n)" into its base and suffix
fn split_suffix(name: &str) -> Option<(&str, u32)> {
    let (base, rest) = name.strip_suffix(')')?.rsplit_once(" (")?;
    let suffix = rest.parse().ok()?;
    Some((base, suffix))
}
