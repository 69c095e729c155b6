//! Entity trait: identity + continuity across state changes.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Collections persisted through the storage facade.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Quotes,
    Orders,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Quotes, RecordKind::Orders];

    /// Collection name used by every storage backend.
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Quotes => "quotes",
            RecordKind::Orders => "orders",
        }
    }

    pub fn from_collection(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.collection() == name)
    }
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.collection())
    }
}

/// An entity that is stored as a JSON document in one collection.
pub trait Record: Entity + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: RecordKind;

    /// Document key within the collection.
    fn key(&self) -> String {
        self.id().to_string()
    }
}
