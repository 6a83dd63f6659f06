//! Object graph to plain record conversion
//!
//! The flattener walks an object's field set and replaces every nested
//! object, at any depth, with its own flattened record. Strings are plain
//! values and are never split into characters.
//!
//! Copyright (c) 2025 Recordmap Team
//! Licensed under the Apache-2.0 license

use crate::config::MapperConfig;
use crate::error::{Error, Result};
use crate::object::{FieldLayout, Object};
use crate::types::{Field, Record};
use serde_json::Value;
use std::any::TypeId;

/// Identity of an object on the current ancestry path
type Visit = (usize, TypeId);

/// Converts objects into plain records
pub struct Flattener<'a> {
    config: &'a MapperConfig,
}

impl<'a> Flattener<'a> {
    /// Create a new flattener
    pub fn new(config: &'a MapperConfig) -> Self {
        Self { config }
    }

    /// Flatten an object into a record
    ///
    /// Fails only when the graph loops back onto an object that is still
    /// being flattened, or nests deeper than `max_depth`.
    pub fn flatten(&self, object: &dyn Object) -> Result<Record> {
        let mut ancestry = Vec::new();
        self.flatten_object(object, &mut ancestry, "$", 0)
    }

    /// Flatten an optional object; `None` gives an empty record
    pub fn flatten_optional(&self, object: Option<&dyn Object>) -> Result<Record> {
        match object {
            Some(object) => self.flatten(object),
            None => Ok(Record::new()),
        }
    }

    fn flatten_object(
        &self,
        object: &dyn Object,
        ancestry: &mut Vec<Visit>,
        path: &str,
        depth: usize,
    ) -> Result<Record> {
        self.check_depth(path, depth)?;

        let visit = (
            object as *const dyn Object as *const () as usize,
            object.as_any().type_id(),
        );
        if ancestry.contains(&visit) {
            return Err(Error::CycleDetected {
                type_name: object.type_name().to_string(),
                path: path.to_string(),
            });
        }

        ancestry.push(visit);
        let result = self.flatten_fields(object, ancestry, path, depth);
        ancestry.pop();
        result
    }

    fn flatten_fields(
        &self,
        object: &dyn Object,
        ancestry: &mut Vec<Visit>,
        path: &str,
        depth: usize,
    ) -> Result<Record> {
        let mut output = Record::new();
        let layout = object.layout();

        if layout == FieldLayout::Opaque {
            log::debug!(
                "{} at {} exposes no field set, flattening to an empty record",
                object.type_name(),
                path
            );
            return Ok(output);
        }

        for name in object.field_names() {
            let Some(field) = object.field(&name) else {
                if layout == FieldLayout::Dense {
                    log::debug!("{}.{} is listed but unreadable", object.type_name(), name);
                }
                continue;
            };

            let field_path = format!("{}.{}", path, name);
            let value = self.flatten_field(field, ancestry, &field_path, depth + 1)?;
            if self.config.omit_null && value.is_null() {
                continue;
            }
            output.insert(name, value);
        }

        Ok(output)
    }

    fn flatten_field(
        &self,
        field: Field<'_>,
        ancestry: &mut Vec<Visit>,
        path: &str,
        depth: usize,
    ) -> Result<Value> {
        self.check_depth(path, depth)?;

        let value = match field {
            Field::Null => Value::Null,
            Field::Value(value) => value,
            Field::Object(object) => {
                Value::Object(self.flatten_object(object, ancestry, path, depth)?)
            }
            Field::Record(entries) => {
                let mut record = Record::new();
                for (key, entry) in entries {
                    let entry_path = format!("{}.{}", path, key);
                    let value = self.flatten_field(entry, ancestry, &entry_path, depth + 1)?;
                    record.insert(key, value);
                }
                Value::Object(record)
            }
            Field::Sequence(items) | Field::Set(items) => {
                let mut sequence = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let item_path = format!("{}[{}]", path, index);
                    sequence.push(self.flatten_field(item, ancestry, &item_path, depth + 1)?);
                }
                Value::Array(sequence)
            }
        };

        Ok(value)
    }

    fn check_depth(&self, path: &str, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(Error::DepthExceeded {
                max_depth: self.config.max_depth,
                path: path.to_string(),
            });
        }
        Ok(())
    }
}
