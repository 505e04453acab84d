//! Expansion and checkbox state
//!
//! `TreeState` is loaded once from the workspace memento when the provider
//! is built and written through on every mutation. Mutations are
//! idempotent: setting a value that is already current neither changes the
//! state nor writes to the memento.

use crate::item::CheckboxState;
use gh_pr_config::Memento;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Memento key of the expanded category set
pub const EXPANDED_QUERIES_KEY: &str = "expandedQueries";
/// Memento key of the checkbox map
pub const CHECKED_FILES_KEY: &str = "checkedFiles";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Workspace-scoped tree state
pub struct TreeState {
    memento: Arc<dyn Memento>,
    expanded: Mutex<BTreeSet<String>>,
    checked: Mutex<BTreeMap<String, bool>>,
}

impl TreeState {
    /// Read both state keys from the memento
    ///
    /// Malformed values are ignored so a corrupt entry never blocks the tree.
    pub fn load(memento: Arc<dyn Memento>) -> Self {
        let expanded: BTreeSet<String> = match memento.get(EXPANDED_QUERIES_KEY) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("TreeState: ignoring malformed {}: {}", EXPANDED_QUERIES_KEY, e);
                BTreeSet::new()
            }),
            None => BTreeSet::new(),
        };
        let checked: BTreeMap<String, bool> = match memento.get(CHECKED_FILES_KEY) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("TreeState: ignoring malformed {}: {}", CHECKED_FILES_KEY, e);
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };

        log::debug!(
            "TreeState: loaded {} expanded categories, {} checkbox states",
            expanded.len(),
            checked.len()
        );

        Self {
            memento,
            expanded: Mutex::new(expanded),
            checked: Mutex::new(checked),
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        lock(&self.expanded).contains(id)
    }

    /// Snapshot of the expanded category ids
    pub fn expanded(&self) -> BTreeSet<String> {
        lock(&self.expanded).clone()
    }

    /// Add or remove a category id, writing through when the set changed
    ///
    /// Returns whether the set changed.
    pub fn set_expanded(&self, id: &str, expanded: bool) -> anyhow::Result<bool> {
        let mut set = lock(&self.expanded);
        if set.contains(id) == expanded {
            return Ok(false);
        }

        // Memory follows storage: a failed write leaves the set untouched
        let mut next = set.clone();
        if expanded {
            next.insert(id.to_string());
        } else {
            next.remove(id);
        }
        self.memento
            .update(EXPANDED_QUERIES_KEY, serde_json::to_value(&next)?)?;
        *set = next;

        log::debug!("TreeState: {} {}", if expanded { "expanded" } else { "collapsed" }, id);
        Ok(true)
    }

    /// Checkbox state of a node, `Unchecked` when never set
    pub fn checkbox(&self, id: &str) -> CheckboxState {
        CheckboxState::from(lock(&self.checked).get(id).copied().unwrap_or(false))
    }

    /// Record a checkbox state, writing through when it changed
    ///
    /// Returns whether the state changed.
    pub fn set_checkbox(&self, id: &str, state: CheckboxState) -> anyhow::Result<bool> {
        let mut map = lock(&self.checked);
        if map.get(id).copied().unwrap_or(false) == state.is_checked() {
            return Ok(false);
        }

        let mut next = map.clone();
        if state.is_checked() {
            next.insert(id.to_string(), true);
        } else {
            next.remove(id);
        }
        self.memento
            .update(CHECKED_FILES_KEY, serde_json::to_value(&next)?)?;
        *map = next;
        Ok(true)
    }

    /// Raw memento value of the expansion set, for diagnostics
    pub fn persisted_expansion(&self) -> Option<Value> {
        self.memento.get(EXPANDED_QUERIES_KEY)
    }
}

impl std::fmt::Debug for TreeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeState")
            .field("expanded", &*lock(&self.expanded))
            .field("checked", &lock(&self.checked).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gh_pr_config::MemoryMemento;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memento whose writes fail until `recover` is called
    #[derive(Default)]
    struct FlakyMemento {
        inner: MemoryMemento,
        recovered: AtomicBool,
    }

    impl FlakyMemento {
        fn recover(&self) {
            self.recovered.store(true, Ordering::SeqCst);
        }
    }

    impl Memento for FlakyMemento {
        fn get(&self, key: &str) -> Option<Value> {
            self.inner.get(key)
        }

        fn update(&self, key: &str, value: Value) -> anyhow::Result<()> {
            if !self.recovered.load(Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            self.inner.update(key, value)
        }

        fn keys(&self) -> Vec<String> {
            self.inner.keys()
        }
    }

    fn state_with(memento: &Arc<MemoryMemento>) -> TreeState {
        let dyn_memento: Arc<dyn Memento> = memento.clone();
        TreeState::load(dyn_memento)
    }

    #[test]
    fn test_load_restores_expansion() {
        let memento = Arc::new(MemoryMemento::new());
        memento
            .update(EXPANDED_QUERIES_KEY, json!(["All Open", "Created By Me"]))
            .unwrap();

        let state = state_with(&memento);
        assert!(state.is_expanded("All Open"));
        assert!(state.is_expanded("Created By Me"));
        assert!(!state.is_expanded("Assigned To Me"));
    }

    #[test]
    fn test_load_ignores_malformed_values() {
        let memento = Arc::new(MemoryMemento::new());
        memento.update(EXPANDED_QUERIES_KEY, json!(42)).unwrap();
        memento.update(CHECKED_FILES_KEY, json!("nope")).unwrap();

        let state = state_with(&memento);
        assert!(state.expanded().is_empty());
        assert_eq!(state.checkbox("x"), CheckboxState::Unchecked);
    }

    #[test]
    fn test_expand_collapse_round_trip() {
        let memento = Arc::new(MemoryMemento::new());
        memento
            .update(EXPANDED_QUERIES_KEY, json!(["All Open"]))
            .unwrap();
        let state = state_with(&memento);
        let before = memento.get(EXPANDED_QUERIES_KEY);

        assert!(state.set_expanded("Mine", true).unwrap());
        assert!(state.set_expanded("Mine", false).unwrap());

        assert_eq!(memento.get(EXPANDED_QUERIES_KEY), before);
    }

    #[test]
    fn test_expand_twice_is_expand_once() {
        let memento = Arc::new(MemoryMemento::new());
        let state = state_with(&memento);

        assert!(state.set_expanded("Mine", true).unwrap());
        let writes = memento.write_count();
        assert!(!state.set_expanded("Mine", true).unwrap());

        assert_eq!(memento.write_count(), writes);
        assert_eq!(memento.get(EXPANDED_QUERIES_KEY), Some(json!(["Mine"])));
    }

    #[test]
    fn test_checkbox_idempotent() {
        let memento = Arc::new(MemoryMemento::new());
        let state = state_with(&memento);

        assert!(state
            .set_checkbox("pr/src/lib.rs", CheckboxState::Checked)
            .unwrap());
        assert!(!state
            .set_checkbox("pr/src/lib.rs", CheckboxState::Checked)
            .unwrap());
        assert_eq!(state.checkbox("pr/src/lib.rs"), CheckboxState::Checked);
        assert_eq!(
            memento.get(CHECKED_FILES_KEY),
            Some(json!({"pr/src/lib.rs": true}))
        );

        assert!(state
            .set_checkbox("pr/src/lib.rs", CheckboxState::Unchecked)
            .unwrap());
        assert_eq!(memento.get(CHECKED_FILES_KEY), Some(json!({})));
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let memento = Arc::new(FlakyMemento::default());
        let state = TreeState::load(memento.clone());

        assert!(state.set_expanded("Mine", true).is_err());
        assert!(!state.is_expanded("Mine"));
        assert!(state.set_checkbox("pr/README.md", CheckboxState::Checked).is_err());
        assert_eq!(state.checkbox("pr/README.md"), CheckboxState::Unchecked);

        memento.recover();
        assert!(state.set_expanded("Mine", true).unwrap());
        assert!(state
            .set_checkbox("pr/README.md", CheckboxState::Checked)
            .unwrap());

        assert_eq!(memento.get(EXPANDED_QUERIES_KEY), Some(json!(["Mine"])));
        assert_eq!(
            memento.get(CHECKED_FILES_KEY),
            Some(json!({"pr/README.md": true}))
        );
    }
}
