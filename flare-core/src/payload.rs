//! Extendable payloads: a fixed schema part plus free-form custom data.
//!
//! Every write goes through one routing rule. A key reserved by the payload's
//! kind (or any ancestor kind) sets the schema field it is bound to; any other
//! key lands in the custom map. A reserved key therefore never appears among
//! the custom entries, whatever the depth of the kind.
//!
//! Serialized, a payload is one flat JSON object: schema fields under their
//! reserved keys followed by the custom entries in insertion order.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde_json::{Map, Value};

use crate::registry::{FieldAccessor, ReservationRegistry, ReservedKeySet, SchemaViolation};
use crate::schema::PayloadKind;

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    key: &'static str,
    value: Value,
}

/// A payload of one [`PayloadKind`] carrying schema fields and custom data.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendablePayload {
    kind: &'static PayloadKind,
    reserved: Arc<ReservedKeySet>,
    slots: BTreeMap<&'static str, Slot>,
    custom: Map<String, Value>,
}

impl ExtendablePayload {
    /// An empty payload of `kind`, resolved against the global registry.
    pub fn new(kind: &'static PayloadKind) -> Result<Self, SchemaViolation> {
        Self::with_registry(kind, ReservationRegistry::global())
    }

    /// An empty payload of `kind`, resolved against `registry`.
    pub fn with_registry(
        kind: &'static PayloadKind,
        registry: &ReservationRegistry,
    ) -> Result<Self, SchemaViolation> {
        let reserved = registry.reserved_keys_for(kind)?;
        Ok(Self {
            kind,
            reserved,
            slots: BTreeMap::new(),
            custom: Map::new(),
        })
    }

    /// Build a payload from schema values and caller-supplied custom fields.
    ///
    /// Schema values are applied first, then custom fields, both through
    /// [`insert`](Self::insert). A custom field naming a reserved key
    /// therefore overwrites the schema value for that key. Fails only when the
    /// kind's lineage is itself inconsistent.
    pub fn build<'a, S>(
        kind: &'static PayloadKind,
        schema_values: S,
        custom_fields: Map<String, Value>,
    ) -> Result<Self, SchemaViolation>
    where
        S: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut payload = Self::new(kind)?;
        for (key, value) in schema_values {
            payload.insert(key, value);
        }
        payload.merge_custom(custom_fields);
        Ok(payload)
    }

    pub fn kind(&self) -> &'static PayloadKind {
        self.kind
    }

    /// Reserved keys in effect for this payload.
    pub fn reserved(&self) -> &ReservedKeySet {
        &self.reserved
    }

    /// Write `key`, routing reserved keys into their schema field.
    ///
    /// Returns the value previously stored under `key`, if any. Writing
    /// `Value::Null` to a reserved key clears the field.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.reserved.get(&key) {
            Some(accessor) => {
                let accessor = *accessor;
                self.set_slot(accessor, value)
            }
            None => self.custom.insert(key, value),
        }
    }

    /// Apply every entry of `fields` with [`insert`](Self::insert).
    pub fn merge_custom(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.insert(key, value);
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Read `key` from the schema field or the custom map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.reserved.get(key) {
            Some(accessor) => accessor.get(self),
            None => self.custom.get(key),
        }
    }

    /// Read a schema field by its reserved key; custom data is not consulted.
    pub fn schema_field(&self, key: &str) -> Option<&Value> {
        self.reserved.get(key).and_then(|accessor| accessor.get(self))
    }

    /// Remove `key` from wherever it is stored.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match self.reserved.get(key) {
            Some(accessor) => {
                let accessor = *accessor;
                accessor.take(self)
            }
            None => self.custom.shift_remove(key),
        }
    }

    /// Free-form custom entries, in insertion order.
    pub fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }

    /// Number of populated schema fields.
    pub fn schema_len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.custom.is_empty()
    }

    /// Flatten into a JSON object.
    pub fn into_value(self) -> Value {
        let mut object = Map::with_capacity(self.slots.len() + self.custom.len());
        for slot in self.slots.into_values() {
            object.insert(slot.key.to_string(), slot.value);
        }
        object.extend(self.custom);
        Value::Object(object)
    }

    pub(crate) fn slot(&self, field: &str) -> Option<&Value> {
        self.slots.get(field).map(|slot| &slot.value)
    }

    pub(crate) fn set_slot(&mut self, accessor: FieldAccessor, value: Value) -> Option<Value> {
        if value.is_null() {
            return self.take_slot(accessor.field);
        }
        self.slots
            .insert(
                accessor.field,
                Slot {
                    key: accessor.key,
                    value,
                },
            )
            .map(|previous| previous.value)
    }

    pub(crate) fn take_slot(&mut self, field: &str) -> Option<Value> {
        self.slots.remove(field).map(|slot| slot.value)
    }
}

impl serde::Serialize for ExtendablePayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.slots.len() + self.custom.len()))?;
        for slot in self.slots.values() {
            map.serialize_entry(slot.key, &slot.value)?;
        }
        for (key, value) in &self.custom {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl From<ExtendablePayload> for Value {
    fn from(payload: ExtendablePayload) -> Self {
        payload.into_value()
    }
}
