//! Constructor parameter binding
//!
//! Walks a descriptor's parameters in declaration order, rehydrates
//! annotated nested values against their resolved types, and splits the
//! record into constructor arguments and leftover entries.

use super::report::RehydrationReport;
use super::{ConstructionStatus, Rehydrator};
use crate::annotation::TypeRef;
use crate::descriptor::{Arguments, ParamKind, Parameter, TypeDescriptor};
use crate::error::{ReportCode, Result};
use crate::types::{Dynamic, Record};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

/// Where a constructor argument came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Origin {
    /// The record's own entry for the parameter
    Record,
    /// The parameter default, or the absence value
    Default,
    /// Spread out of a variadic entry
    Variadic,
}

/// Result of binding one record to one descriptor
#[derive(Debug, Default)]
pub(super) struct Binding {
    /// Arguments for the constructor
    pub args: Arguments,
    /// Positional parameter values taken from the record, kept for bare-instance fallback
    pub bound: Vec<(String, Dynamic)>,
    /// Consumed variadic entries under their original key, with the raw value
    pub variadics: Vec<(String, Dynamic)>,
    /// Origin of every keyword argument
    pub keyword_origins: HashMap<String, Origin>,
    /// Variadic keyword names relaxation moved into the leftovers
    pub relaxed_spread: Vec<String>,
    /// Paths of nested objects that fell back to a bare instance
    pub nested_abandoned: Vec<String>,
    /// Entries no parameter consumed, in record order
    pub leftovers: IndexMap<String, Dynamic>,
}

impl Binding {
    pub fn keyword_origin(&self, name: &str) -> Origin {
        self.keyword_origins
            .get(name)
            .copied()
            .unwrap_or(Origin::Default)
    }
}

impl<'a> Rehydrator<'a> {
    pub(super) fn bind(
        &self,
        record: Record,
        target: &TypeDescriptor,
        scope: Option<&str>,
        path: &str,
        depth: usize,
        report: &mut RehydrationReport,
    ) -> Result<Binding> {
        let mut binding = Binding {
            leftovers: record
                .into_iter()
                .map(|(key, value)| (key, Dynamic::Value(value)))
                .collect(),
            ..Binding::default()
        };

        for param in target.params() {
            if param.kind == ParamKind::Receiver {
                continue;
            }

            if let Some(annotation) = &param.annotation {
                self.resolve_nested(&mut binding, param, annotation, scope, path, depth, report)?;
            }

            let pending = &mut binding.leftovers;

            match param.kind {
                ParamKind::Receiver => {}
                ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword => {
                    let (value, origin) = take_or_default(pending, param);
                    if origin == Origin::Record {
                        binding.bound.push((param.name.clone(), value.clone()));
                    }
                    binding.args.push_positional(value);
                }
                ParamKind::KeywordOnly => {
                    let (value, origin) = take_or_default(pending, param);
                    binding.keyword_origins.insert(param.name.clone(), origin);
                    binding.args.insert_keyword(param.name.clone(), value);
                }
                ParamKind::VarPositional => {
                    let keys = [self.config.args_key.as_str(), param.name.as_str()];
                    let Some((key, entry)) = take_variadic(pending, keys, is_sequence) else {
                        continue;
                    };
                    match entry.clone() {
                        Dynamic::Value(Value::Array(items)) => binding
                            .args
                            .extend_positional(items.into_iter().map(Dynamic::Value)),
                        Dynamic::Sequence(items) => binding.args.extend_positional(items),
                        _ => {}
                    }
                    binding.variadics.push((key, entry));
                }
                ParamKind::VarKeyword => {
                    let keys = [self.config.kwargs_key.as_str(), param.name.as_str()];
                    let Some((key, entry)) = take_variadic(pending, keys, is_record) else {
                        continue;
                    };
                    if let Dynamic::Value(Value::Object(extra)) = &entry {
                        for (name, value) in extra.clone() {
                            binding.keyword_origins.insert(name.clone(), Origin::Variadic);
                            binding.args.insert_keyword(name, Dynamic::Value(value));
                        }
                    }
                    binding.variadics.push((key, entry));
                }
            }
        }

        Ok(binding)
    }

    /// Replace an annotated entry with its rehydrated form when the type resolves
    #[allow(clippy::too_many_arguments)]
    fn resolve_nested(
        &self,
        binding: &mut Binding,
        param: &Parameter,
        annotation: &TypeRef,
        scope: Option<&str>,
        path: &str,
        depth: usize,
        report: &mut RehydrationReport,
    ) -> Result<()> {
        let Some(slot) = binding.leftovers.get_mut(&param.name) else {
            return Ok(());
        };
        if slot.is_null() {
            return Ok(());
        }

        let field_path = format!("{}.{}", path, param.name);
        let nested = self
            .resolver
            .as_ref()
            .and_then(|resolver| resolver.resolve_ref(annotation, scope));

        match nested {
            Some(descriptor) => {
                let value = std::mem::replace(slot, Dynamic::null());
                *slot = self.rehydrate_nested(
                    value,
                    annotation,
                    &descriptor,
                    scope,
                    &field_path,
                    depth,
                    &mut binding.nested_abandoned,
                    report,
                )?;
            }
            None if holds_records(slot) => {
                report.record(
                    ReportCode::Unresolved,
                    &field_path,
                    format!("No type found for annotation '{}'", annotation),
                    None,
                );
            }
            None => {}
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn rehydrate_nested(
        &self,
        value: Dynamic,
        annotation: &TypeRef,
        descriptor: &TypeDescriptor,
        scope: Option<&str>,
        path: &str,
        depth: usize,
        abandoned: &mut Vec<String>,
        report: &mut RehydrationReport,
    ) -> Result<Dynamic> {
        let mut build = |record: Record, path: &str| -> Result<Dynamic> {
            let (object, status) = self.typed(record, descriptor, scope, path, depth + 1, report)?;
            match status {
                ConstructionStatus::Abandoned { .. } => abandoned.push(path.to_string()),
                ConstructionStatus::NestedAbandoned { paths } => abandoned.extend(paths),
                _ => {}
            }
            Ok(Dynamic::Object(object))
        };

        match value {
            Dynamic::Value(Value::Object(record)) => build(record, path),
            Dynamic::Value(Value::Array(items)) if annotation.is_sequence() => {
                let mut rebuilt = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let item_path = format!("{}[{}]", path, index);
                    rebuilt.push(match item {
                        Value::Object(record) => build(record, &item_path)?,
                        other => Dynamic::Value(other),
                    });
                }
                Ok(Dynamic::Sequence(rebuilt))
            }
            other => {
                log::debug!(
                    "Leaving {} at {} raw for annotation '{}'",
                    other.kind(),
                    path,
                    annotation
                );
                Ok(other)
            }
        }
    }
}

/// Pop a parameter's entry, falling back to its default or the absence value
fn take_or_default(
    pending: &mut IndexMap<String, Dynamic>,
    param: &Parameter,
) -> (Dynamic, Origin) {
    match pending.shift_remove(&param.name) {
        Some(value) => (value, Origin::Record),
        None => {
            let value = param.default.clone().unwrap_or_else(Dynamic::null);
            (value, Origin::Default)
        }
    }
}

/// Pop the first variadic entry of the right shape, reserved key before parameter name
fn take_variadic(
    pending: &mut IndexMap<String, Dynamic>,
    keys: [&str; 2],
    accept: fn(&Dynamic) -> bool,
) -> Option<(String, Dynamic)> {
    let key = keys
        .into_iter()
        .find(|key| pending.get(*key).is_some_and(accept))?;
    pending.shift_remove_entry(key)
}

fn is_sequence(value: &Dynamic) -> bool {
    matches!(
        value,
        Dynamic::Value(Value::Array(_)) | Dynamic::Sequence(_)
    )
}

fn is_record(value: &Dynamic) -> bool {
    matches!(value, Dynamic::Value(Value::Object(_)))
}

fn holds_records(value: &Dynamic) -> bool {
    match value {
        Dynamic::Value(Value::Object(_)) => true,
        Dynamic::Value(Value::Array(items)) => items.iter().any(Value::is_object),
        _ => false,
    }
}
