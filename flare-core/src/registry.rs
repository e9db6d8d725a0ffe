//! Reserved-key registry for extendable payloads.
//!
//! For a [`PayloadKind`] the registry folds the kind's own declarations and
//! those of every ancestor into one [`ReservedKeySet`]. Sets are computed on
//! first use and cached for the life of the registry; a cached set is never
//! replaced.
//!
//! ## Schema authoring errors
//!
//! Two levels of one lineage binding the same key to *different* fields is a
//! bug in the schema table, reported as [`SchemaViolation`]. Re-declaring a
//! key for the same field is tolerated and attributed to the topmost level.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde_json::Value;

use crate::payload::ExtendablePayload;
use crate::schema::PayloadKind;

/// Two levels of one lineage bind the same reserved key to different fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "payload kind `{kind}`: reserved key `{key}` is bound to `{first_owner}.{first_field}` \
     and to `{second_owner}.{second_field}`"
)]
pub struct SchemaViolation {
    /// Kind whose lineage was being folded
    pub kind: &'static str,
    /// Conflicting reserved key
    pub key: &'static str,
    pub first_owner: &'static str,
    pub first_field: &'static str,
    pub second_owner: &'static str,
    pub second_field: &'static str,
}

/// Handle to one schema field slot, found through its reserved key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldAccessor {
    /// Kind that declared the key (topmost level if declared more than once)
    pub declared_by: &'static str,
    /// Reserved wire key
    pub key: &'static str,
    /// Schema slot name
    pub field: &'static str,
}

impl FieldAccessor {
    /// Read the slot on `payload`.
    pub fn get<'a>(&self, payload: &'a ExtendablePayload) -> Option<&'a Value> {
        payload.slot(self.field)
    }

    /// Write the slot on `payload`, returning the previous value.
    pub fn set(&self, payload: &mut ExtendablePayload, value: Value) -> Option<Value> {
        payload.set_slot(*self, value)
    }

    /// Clear the slot on `payload`.
    pub fn take(&self, payload: &mut ExtendablePayload) -> Option<Value> {
        payload.take_slot(self.field)
    }
}

/// Every reserved key of one kind, inherited keys included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedKeySet {
    kind: &'static str,
    by_key: BTreeMap<&'static str, FieldAccessor>,
}

impl ReservedKeySet {
    /// Kind this set was built for.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Accessor for a reserved key.
    pub fn get(&self, key: &str) -> Option<&FieldAccessor> {
        self.by_key.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Accessor for a schema slot name.
    pub fn by_field(&self, field: &str) -> Option<&FieldAccessor> {
        self.by_key.values().find(|accessor| accessor.field == field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_key.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldAccessor> + '_ {
        self.by_key.values()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Whether every key of `other` is reserved here too.
    pub fn is_superset_of(&self, other: &ReservedKeySet) -> bool {
        other.keys().all(|key| self.contains(key))
    }

    fn fold(kind: &'static PayloadKind) -> Result<Self, SchemaViolation> {
        let mut by_key = BTreeMap::new();

        for level in kind.lineage() {
            for decl in level.fields {
                let accessor = FieldAccessor {
                    declared_by: level.name,
                    key: decl.key,
                    field: decl.field,
                };
                match by_key.entry(decl.key) {
                    btree_map::Entry::Vacant(slot) => {
                        slot.insert(accessor);
                    }
                    btree_map::Entry::Occupied(mut slot) if slot.get().field == decl.field => {
                        // Lineage is walked bottom-up: the ancestor owns the key.
                        slot.insert(accessor);
                    }
                    btree_map::Entry::Occupied(slot) => {
                        let existing = slot.get();
                        return Err(SchemaViolation {
                            kind: kind.name,
                            key: decl.key,
                            first_owner: existing.declared_by,
                            first_field: existing.field,
                            second_owner: level.name,
                            second_field: decl.field,
                        });
                    }
                }
            }
        }

        Ok(Self {
            kind: kind.name,
            by_key,
        })
    }
}

/// Lazily populated, read-mostly cache of [`ReservedKeySet`]s keyed by kind.
#[derive(Debug, Default)]
pub struct ReservationRegistry {
    cache: RwLock<HashMap<&'static str, Arc<ReservedKeySet>>>,
}

impl ReservationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by payload construction.
    pub fn global() -> &'static ReservationRegistry {
        static GLOBAL: OnceLock<ReservationRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ReservationRegistry::new)
    }

    /// Reserved keys of `kind` and all its ancestors.
    ///
    /// Concurrent first calls for one kind may each fold the lineage, but only
    /// the first insert is kept and every caller receives that same set.
    pub fn reserved_keys_for(
        &self,
        kind: &'static PayloadKind,
    ) -> Result<Arc<ReservedKeySet>, SchemaViolation> {
        if let Some(set) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind.name)
        {
            return Ok(Arc::clone(set));
        }

        let folded = Arc::new(ReservedKeySet::fold(kind)?);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let set = cache.entry(kind.name).or_insert(folded);

        #[cfg(feature = "telemetry")]
        tracing::debug!(kind = kind.name, keys = set.len(), "reserved key set cached");

        Ok(Arc::clone(set))
    }

    /// Build and cache every listed kind, stopping at the first violation.
    pub fn validate<I>(&self, kinds: I) -> Result<(), SchemaViolation>
    where
        I: IntoIterator<Item = &'static PayloadKind>,
    {
        for kind in kinds {
            self.reserved_keys_for(kind)?;
        }
        Ok(())
    }

    /// Number of kinds cached so far.
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
