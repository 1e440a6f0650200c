//! Interned dimension names.
//!
//! Two `Dimension`s are equal iff their names are equal; names are interned
//! process-wide so equality and hashing are cheap and `SpacePart` keys
//! dedupe for free across independently-constructed `Dimension`s.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use serde::{Deserialize, Serialize};

fn interner() -> &'static RwLock<HashSet<Arc<str>>> {
    static INTERNER: OnceLock<RwLock<HashSet<Arc<str>>>> = OnceLock::new();
    INTERNER.get_or_init(|| RwLock::new(HashSet::new()))
}

fn intern(name: &str) -> Arc<str> {
    if let Some(existing) = interner().read().expect("interner poisoned").get(name) {
        return Arc::clone(existing);
    }
    let mut table = interner().write().expect("interner poisoned");
    if let Some(existing) = table.get(name) {
        return Arc::clone(existing);
    }
    let arc: Arc<str> = Arc::from(name);
    table.insert(Arc::clone(&arc));
    arc
}

/// A named axis of the key space.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimension(Arc<str>);

impl Dimension {
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(intern(name.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        // Interned, but compare by value: two `Dimension`s built in
        // different processes (deserialized from the wire) share no
        // interner, yet must still compare equal by name.
        self.0.as_ref() == other.0.as_ref()
    }
}
impl Eq for Dimension {}

impl std::hash::Hash for Dimension {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state);
    }
}

impl PartialOrd for Dimension {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Dimension {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.as_ref().cmp(other.0.as_ref())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Dimension {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
impl From<String> for Dimension {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
