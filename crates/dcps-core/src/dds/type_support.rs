// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry and instance keys.
//!
//! A [`TypeSupport`] describes a sample type to the middleware: its
//! registered name, its shape (ordered field descriptors plus key fields) and
//! how to extract the instance key from a sample. Shapes are what content
//! filters are validated against; keys are what instances are identified by.
//!
//! # Example
//!
//! ```ignore
//! let support = TypeSupport::<Temperature>::new(
//!     "Temperature",
//!     TypeShape::new()
//!         .field("sensor_id", FieldKind::String)
//!         .field("degrees", FieldKind::Int32)
//!         .key("sensor_id"),
//! );
//! participant.register_type(support)?;
//! ```

use super::filter::FieldValue;
use super::{DdsType, Error, Result};
use crate::config::{FNV_OFFSET_BASIS, FNV_PRIME};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Primitive kind of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    Octet,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    /// Enumeration, exposed to filters by enumerator name.
    Enum,
}

/// `name: kind` pair of a type shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

/// Ordered field descriptors plus the names of the key fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeShape {
    fields: Vec<FieldDescriptor>,
    key_fields: Vec<String>,
}

impl TypeShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field descriptor.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
        });
        self
    }

    /// Mark a field as part of the instance key (order is significant).
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.key_fields.push(name.into());
        self
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    /// True when the type declares at least one key field.
    pub fn is_keyed(&self) -> bool {
        !self.key_fields.is_empty()
    }

    fn validate(&self, type_name: &str) -> Result<()> {
        for (idx, field) in self.fields.iter().enumerate() {
            if self.fields[..idx].iter().any(|f| f.name == field.name) {
                return Err(Error::InvalidType(format!(
                    "{}: duplicate field '{}'",
                    type_name, field.name
                )));
            }
        }
        for key in &self.key_fields {
            match self.field_kind(key) {
                None => {
                    return Err(Error::InvalidType(format!(
                        "{}: key field '{}' is not declared",
                        type_name, key
                    )))
                }
                Some(FieldKind::Float32 | FieldKind::Float64) => {
                    return Err(Error::InvalidType(format!(
                        "{}: floating point key field '{}'",
                        type_name, key
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// One component of an instance key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Integer(i64),
    Unsigned(u64),
    String(String),
    Boolean(bool),
}

impl KeyValue {
    fn hash_into(&self, mut hash: u64) -> u64 {
        let mut feed = |bytes: &[u8]| {
            for &b in bytes {
                hash ^= u64::from(b);
                hash = hash.wrapping_mul(FNV_PRIME);
            }
        };
        match self {
            KeyValue::Integer(v) => {
                feed(&[0x01]);
                feed(&v.to_le_bytes());
            }
            KeyValue::Unsigned(v) => {
                feed(&[0x02]);
                feed(&v.to_le_bytes());
            }
            KeyValue::String(s) => {
                feed(&[0x03]);
                feed(&(s.len() as u64).to_le_bytes());
                feed(s.as_bytes());
            }
            KeyValue::Boolean(b) => {
                feed(&[0x04, u8::from(*b)]);
            }
        }
        hash
    }
}

impl TryFrom<FieldValue> for KeyValue {
    type Error = FieldValue;

    fn try_from(value: FieldValue) -> std::result::Result<Self, Self::Error> {
        match value {
            FieldValue::Integer(v) => Ok(KeyValue::Integer(v)),
            // Non-negative signed and unsigned values hash identically.
            FieldValue::Unsigned(v) => Ok(i64::try_from(v)
                .map(KeyValue::Integer)
                .unwrap_or(KeyValue::Unsigned(v))),
            FieldValue::String(s) => Ok(KeyValue::String(s)),
            FieldValue::Boolean(b) => Ok(KeyValue::Boolean(b)),
            other @ FieldValue::Float(_) => Err(other),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Integer(v) => write!(f, "{}", v),
            KeyValue::Unsigned(v) => write!(f, "{}", v),
            KeyValue::String(s) => write!(f, "'{}'", s),
            KeyValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Ordered tuple of key field values. Equal tuples identify the same instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InstanceKey(Vec<KeyValue>);

impl InstanceKey {
    pub fn new(values: Vec<KeyValue>) -> Self {
        Self(values)
    }

    /// Key of a keyless type (single implicit instance).
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deterministic 16-byte handle (FNV-1a over the key tuple).
    ///
    /// The empty key maps to the nil handle.
    pub fn handle(&self) -> InstanceHandle {
        if self.0.is_empty() {
            return InstanceHandle::nil();
        }

        let low = self
            .0
            .iter()
            .fold(FNV_OFFSET_BASIS, |hash, value| value.hash_into(hash));
        // Second lane: same stream salted with the first lane's result.
        let high = self
            .0
            .iter()
            .fold(FNV_OFFSET_BASIS ^ low.rotate_left(29), |hash, value| {
                value.hash_into(hash)
            });

        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&low.to_be_bytes());
        bytes[8..].copy_from_slice(&high.to_be_bytes());
        if bytes == [0u8; 16] {
            bytes[15] = 1;
        }
        InstanceHandle(bytes)
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

impl From<KeyValue> for InstanceKey {
    fn from(value: KeyValue) -> Self {
        Self(vec![value])
    }
}

/// Instance handle for keyed topics (16-byte key hash).
///
/// For keyless topics, this is all zeros.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct InstanceHandle(pub [u8; 16]);

impl InstanceHandle {
    /// Create a new instance handle from a key hash.
    pub const fn new(key_hash: [u8; 16]) -> Self {
        Self(key_hash)
    }

    /// Create a nil (all zeros) instance handle for keyless topics.
    pub const fn nil() -> Self {
        Self([0u8; 16])
    }

    /// Check if this is a nil handle.
    pub fn is_nil(&self) -> bool {
        self.0 == [0u8; 16]
    }

    /// Get the raw key hash bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceHandle({})", self)
    }
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..8] {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

type KeyFn<T> = Arc<dyn Fn(&T) -> InstanceKey + Send + Sync>;

/// Registration record for a sample type.
pub struct TypeSupport<T: DdsType> {
    type_name: String,
    shape: TypeShape,
    key_of: Option<KeyFn<T>>,
}

impl<T: DdsType> TypeSupport<T> {
    /// Key extracted from the shape's key fields through [`DdsType::field`].
    pub fn new(type_name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            type_name: type_name.into(),
            shape,
            key_of: None,
        }
    }

    /// Supply an explicit key extraction function.
    pub fn with_key_fn<F>(mut self, key_of: F) -> Self
    where
        F: Fn(&T) -> InstanceKey + Send + Sync + 'static,
    {
        self.key_of = Some(Arc::new(key_of));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// Extract the instance key of a sample.
    pub fn key_of(&self, sample: &T) -> Result<InstanceKey> {
        if let Some(key_of) = &self.key_of {
            return Ok(key_of(sample));
        }

        let mut values = Vec::with_capacity(self.shape.key_fields.len());
        for field in &self.shape.key_fields {
            let value = sample.field(field).ok_or_else(|| Error::InvalidKey {
                type_name: self.type_name.clone(),
                field: field.clone(),
            })?;
            let value = KeyValue::try_from(value).map_err(|_| Error::InvalidKey {
                type_name: self.type_name.clone(),
                field: field.clone(),
            })?;
            values.push(value);
        }
        Ok(InstanceKey(values))
    }
}

impl<T: DdsType> Clone for TypeSupport<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name.clone(),
            shape: self.shape.clone(),
            key_of: self.key_of.clone(),
        }
    }
}

impl<T: DdsType> fmt::Debug for TypeSupport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSupport")
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .field("explicit_key_fn", &self.key_of.is_some())
            .finish()
    }
}

struct RegisteredType {
    shape: TypeShape,
    type_id: TypeId,
    rust_type: &'static str,
    support: Arc<dyn Any + Send + Sync>,
}

/// Participant-wide table of registered types, keyed by type name.
#[derive(Default)]
pub struct TypeRegistry {
    types: DashMap<String, RegisteredType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type support.
    ///
    /// Registering the same name again with an identical shape and Rust type
    /// is a no-op; anything else fails with `DuplicateType`.
    pub fn register<T: DdsType>(&self, support: TypeSupport<T>) -> Result<()> {
        support.shape.validate(&support.type_name)?;

        match self.types.entry(support.type_name.clone()) {
            Entry::Occupied(existing) => {
                let existing = existing.get();
                if existing.type_id == TypeId::of::<T>() && existing.shape == support.shape {
                    log::debug!(
                        "[TYPES] '{}' already registered, ignoring",
                        support.type_name
                    );
                    Ok(())
                } else {
                    Err(Error::DuplicateType(support.type_name))
                }
            }
            Entry::Vacant(slot) => {
                log::debug!(
                    "[TYPES] registered '{}' ({} fields, key={:?})",
                    support.type_name,
                    support.shape.fields.len(),
                    support.shape.key_fields
                );
                slot.insert(RegisteredType {
                    shape: support.shape.clone(),
                    type_id: TypeId::of::<T>(),
                    rust_type: std::any::type_name::<T>(),
                    support: Arc::new(support),
                });
                Ok(())
            }
        }
    }

    /// Shape registered under `type_name`.
    pub fn lookup(&self, type_name: &str) -> Option<TypeShape> {
        self.types.get(type_name).map(|t| t.shape.clone())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Typed support for `type_name`; `topic` is only used for error context.
    pub(crate) fn support<T: DdsType>(
        &self,
        type_name: &str,
        topic: &str,
    ) -> Result<Arc<TypeSupport<T>>> {
        let registered = self
            .types
            .get(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;

        Arc::clone(&registered.support)
            .downcast::<TypeSupport<T>>()
            .map_err(|_| Error::TypeMismatch {
                topic: topic.to_string(),
                expected: registered.rust_type.to_string(),
                found: std::any::type_name::<T>().to_string(),
            })
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.types.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}
