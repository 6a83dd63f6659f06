//! The field-set capability every mappable object exposes
//!
//! Rust has no runtime reflection, so types opt in by implementing [`Object`]:
//! enumerate field names, read a field as a [`Field`], and optionally accept
//! assignments. [`Namespace`] is the generic untyped container used whenever
//! no target type is known.
//!
//! Copyright (c) 2025 Recordmap Team
//! Licensed under the Apache-2.0 license

use crate::error::SetFieldError;
use crate::types::{Dynamic, Field};
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;

/// How an object stores its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldLayout {
    /// Every listed field is always present
    #[default]
    Dense,
    /// Fixed, named slots that may be unset
    Slots,
    /// No enumerable fields; flattens to an empty record
    Opaque,
}

/// Type-erasure plumbing, implemented automatically for every `Object + Clone`
pub trait ObjectBase: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_object(&self) -> Box<dyn Object>;
}

impl<T: Object + Clone> ObjectBase for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_object(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }
}

/// A composite value that can be flattened into, and rebuilt from, a record
///
/// `field` returning `None` means "field not set" (an empty slot); the
/// flattener skips such fields.
pub trait Object: ObjectBase + fmt::Debug {
    /// Declared name of the type, used for scope lookups and diagnostics
    fn type_name(&self) -> &str;

    /// Storage layout of the field set
    fn layout(&self) -> FieldLayout {
        FieldLayout::Dense
    }

    /// Names of the fields in declaration order
    fn field_names(&self) -> Vec<String>;

    /// Read a field by name
    fn field(&self, name: &str) -> Option<Field<'_>>;

    /// Whether the object currently exposes a field with this name
    fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Assign a field after construction
    ///
    /// The default rejects everything, which suits types whose fields are all
    /// fixed by their constructor.
    fn set_field(&mut self, name: &str, _value: Dynamic) -> Result<(), SetFieldError> {
        Err(SetFieldError::Unknown(name.to_string()))
    }
}

impl Clone for Box<dyn Object> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

impl dyn Object {
    /// Check the concrete type
    pub fn is<T: Object>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow as a concrete type
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow as a concrete type
    pub fn downcast_mut<T: Object>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Take ownership as a concrete type, handing the box back on mismatch
    pub fn downcast<T: Object>(self: Box<Self>) -> Result<Box<T>, Box<dyn Object>> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.into_any().downcast::<T>() {
            Ok(typed) => Ok(typed),
            Err(_) => unreachable!("concrete type checked above"),
        }
    }
}

/// Generic untyped container produced when no target type is known
///
/// Fields keep insertion order and any name can be assigned.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    fields: IndexMap<String, Dynamic>,
}

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field
    pub fn get(&self, name: &str) -> Option<&Dynamic> {
        self.fields.get(name)
    }

    /// Get a string field
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Dynamic::as_str)
    }

    /// Get a nested namespace field
    pub fn get_namespace(&self, name: &str) -> Option<&Namespace> {
        self.get(name)
            .and_then(|value| value.downcast_ref::<Namespace>())
    }

    /// Insert or replace a field
    pub fn insert(&mut self, name: impl Into<String>, value: Dynamic) -> Option<Dynamic> {
        self.fields.insert(name.into(), value)
    }

    /// Remove a field
    pub fn remove(&mut self, name: &str) -> Option<Dynamic> {
        self.fields.shift_remove(name)
    }

    /// Check for a field
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the namespace has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Dynamic)> {
        self.fields.iter()
    }
}

impl Object for Namespace {
    fn type_name(&self) -> &str {
        "namespace"
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        self.fields.get(name).map(Dynamic::to_field)
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn set_field(&mut self, name: &str, value: Dynamic) -> Result<(), SetFieldError> {
        self.fields.insert(name.to_string(), value);
        Ok(())
    }
}
