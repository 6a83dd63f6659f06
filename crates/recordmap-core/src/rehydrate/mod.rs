//! Plain record to object graph conversion
//!
//! The rehydrator binds a record to a descriptor's constructor parameters,
//! rebuilds annotated nested values against their resolved types, invokes
//! the constructor with keyword relaxation on failure, and finally attaches
//! whatever the constructor did not consume. Without a target type the record
//! becomes a [`Namespace`].
//!
//! Every deviation from a clean construction is written to a
//! [`RehydrationReport`] and reflected in the [`ConstructionStatus`].
//!
//! Copyright (c) 2025 Recordmap Team
//! Licensed under the Apache-2.0 license

mod binding;
pub mod report;

pub use report::{RehydrationReport, ReportItem, ReportSummary};

use crate::config::MapperConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::{ConstructError, Error, ReportCode, Result, StrictMode};
use crate::object::{Namespace, Object};
use crate::scope::{Resolver, ScopeProvider};
use crate::types::{Dynamic, Record};
use binding::{Binding, Origin};
use indexmap::IndexMap;
use serde_json::Value;

/// How the top-level object came to be
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructionStatus {
    /// No target type; the object is a [`Namespace`]
    Untyped,
    /// The constructor accepted every bound argument
    Complete,
    /// The constructor succeeded after dropping these keyword arguments
    Relaxed { dropped: Vec<String> },
    /// The constructor never succeeded; the object is a bare instance
    Abandoned { error: ConstructError },
    /// The constructor succeeded, but nested objects at these paths were abandoned
    NestedAbandoned { paths: Vec<String> },
}

impl ConstructionStatus {
    /// Whether this object or anything nested in it fell back to a bare instance
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            ConstructionStatus::Abandoned { .. } | ConstructionStatus::NestedAbandoned { .. }
        )
    }
}

/// Result of one rehydration call
#[derive(Debug, Clone)]
pub struct Rehydrated {
    pub object: Box<dyn Object>,
    pub status: ConstructionStatus,
    pub report: RehydrationReport,
}

impl Rehydrated {
    /// Borrow the object as a concrete type
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Take the object as a concrete type, handing it back boxed on mismatch
    pub fn into_inner<T: Object>(self) -> std::result::Result<T, Box<dyn Object>> {
        self.object.downcast::<T>().map(|typed| *typed)
    }

    /// Take the type-erased object
    pub fn into_object(self) -> Box<dyn Object> {
        self.object
    }

    /// Whether every constructor in the graph ran to completion, possibly relaxed
    pub fn is_constructed(&self) -> bool {
        matches!(
            self.status,
            ConstructionStatus::Complete | ConstructionStatus::Relaxed { .. }
        )
    }
}

/// Rebuilds objects from plain records
pub struct Rehydrator<'a> {
    config: &'a MapperConfig,
    resolver: Option<Resolver<'a>>,
}

impl<'a> Rehydrator<'a> {
    /// Create a rehydrator with no scopes; annotations never resolve
    pub fn new(config: &'a MapperConfig) -> Self {
        Self {
            config,
            resolver: None,
        }
    }

    /// Create a rehydrator that resolves annotations through a scope provider
    pub fn with_scopes(config: &'a MapperConfig, provider: &'a dyn ScopeProvider) -> Self {
        Self {
            config,
            resolver: Some(Resolver::new(provider)),
        }
    }

    /// Rebuild an object from a record
    ///
    /// The record is copied, never modified. Without a target the result is
    /// an untyped [`Namespace`]. Missing and extra data never fail the call.
    /// Errors come from nesting deeper than `max_depth`, or from
    /// [`StrictMode::Strict`] when construction is abandoned or a field is
    /// rejected.
    pub fn rehydrate(
        &self,
        record: &Record,
        target: Option<&TypeDescriptor>,
        scope: Option<&str>,
    ) -> Result<Rehydrated> {
        let record = record.clone();
        let mut report = RehydrationReport::new();

        let (object, status) = match target {
            None => (
                Box::new(self.untyped(record, "$", 0)?) as Box<dyn Object>,
                ConstructionStatus::Untyped,
            ),
            Some(target) => self.typed(record, target, scope, "$", 0, &mut report)?,
        };

        Ok(Rehydrated {
            object,
            status,
            report,
        })
    }

    /// Build a namespace, turning nested records into nested namespaces
    fn untyped(&self, record: Record, path: &str, depth: usize) -> Result<Namespace> {
        self.check_depth(path, depth)?;

        let mut namespace = Namespace::new();
        for (key, value) in record {
            let value = match value {
                Value::Object(nested) => {
                    let nested_path = format!("{}.{}", path, key);
                    Dynamic::Object(Box::new(self.untyped(nested, &nested_path, depth + 1)?))
                }
                other => Dynamic::Value(other),
            };
            namespace.insert(key, value);
        }
        Ok(namespace)
    }

    fn typed(
        &self,
        record: Record,
        target: &TypeDescriptor,
        scope: Option<&str>,
        path: &str,
        depth: usize,
        report: &mut RehydrationReport,
    ) -> Result<(Box<dyn Object>, ConstructionStatus)> {
        self.check_depth(path, depth)?;

        let mut binding = self.bind(record, target, scope, path, depth, report)?;
        let (mut object, mut status) = self.construct(target, &mut binding, path, report)?;
        self.attach(object.as_mut(), binding.leftovers, path, depth, report)?;

        if !binding.nested_abandoned.is_empty() && !status.is_partial() {
            status = ConstructionStatus::NestedAbandoned {
                paths: binding.nested_abandoned,
            };
        }
        Ok((object, status))
    }

    /// Invoke the constructor, dropping keyword arguments from the back on failure
    fn construct(
        &self,
        target: &TypeDescriptor,
        binding: &mut Binding,
        path: &str,
        report: &mut RehydrationReport,
    ) -> Result<(Box<dyn Object>, ConstructionStatus)> {
        let mut dropped = Vec::new();
        let mut attempts = 0;

        let error = loop {
            attempts += 1;
            let mut args = binding.args.clone();
            let error = match target.construct(&mut args) {
                Ok(object) => {
                    let status = if dropped.is_empty() {
                        ConstructionStatus::Complete
                    } else {
                        ConstructionStatus::Relaxed { dropped }
                    };
                    return Ok((object, status));
                }
                Err(error) => error,
            };

            log::debug!(
                "Constructing {} at {} failed on attempt {}: {}",
                target.name(),
                path,
                attempts,
                error
            );
            if attempts >= self.config.max_construct_attempts {
                break error;
            }
            let Some((name, value)) = binding.args.pop_keyword() else {
                break error;
            };

            report.record(
                ReportCode::Relaxed,
                &format!("{}.{}", path, name),
                format!("Dropped keyword argument '{}' after: {}", name, error),
                value.as_value().cloned(),
            );
            dropped.push(name.clone());
            // defaults were never data, so only supplied values go back
            let origin = binding.keyword_origin(&name);
            if origin != Origin::Default && !binding.leftovers.contains_key(&name) {
                if origin == Origin::Variadic {
                    binding.relaxed_spread.push(name.clone());
                }
                binding.leftovers.insert(name, value);
            }
        };

        self.abandon(target, binding, error, path, report)
    }

    fn abandon(
        &self,
        target: &TypeDescriptor,
        binding: &mut Binding,
        error: ConstructError,
        path: &str,
        report: &mut RehydrationReport,
    ) -> Result<(Box<dyn Object>, ConstructionStatus)> {
        if self.config.strict_mode == StrictMode::Strict {
            return Err(Error::Construction {
                type_name: target.name().to_string(),
                message: error.to_string(),
                source: Some(error),
            });
        }

        let message = format!(
            "Constructor of {} never succeeded: {}",
            target.name(),
            error
        );
        match self.config.strict_mode {
            StrictMode::Warn => log::warn!("{} at {}", message, path),
            _ => log::debug!("{} at {}", message, path),
        }
        report.record(ReportCode::Abandoned, path, message, None);

        // Record values go back to the leftovers so the bare instance still carries them.
        // Variadic entries return whole under their own key.
        for name in binding.relaxed_spread.drain(..) {
            binding.leftovers.shift_remove(&name);
        }
        for (name, value) in binding.bound.drain(..) {
            binding.leftovers.entry(name).or_insert(value);
        }
        for (name, value) in binding.args.extra_keywords() {
            if binding.keyword_origin(&name) == Origin::Record {
                binding.leftovers.entry(name).or_insert(value);
            }
        }
        for (key, value) in binding.variadics.drain(..) {
            binding.leftovers.entry(key).or_insert(value);
        }

        let object = target.bare().unwrap_or_else(|| {
            log::debug!(
                "{} has no bare instance, falling back to a namespace",
                target.name()
            );
            Box::new(Namespace::new())
        });
        Ok((object, ConstructionStatus::Abandoned { error }))
    }

    /// Assign every unconsumed entry onto the object
    fn attach(
        &self,
        object: &mut dyn Object,
        leftovers: IndexMap<String, Dynamic>,
        path: &str,
        depth: usize,
        report: &mut RehydrationReport,
    ) -> Result<()> {
        for (name, value) in leftovers {
            let field_path = format!("{}.{}", path, name);
            let value = match value {
                Dynamic::Value(Value::Object(nested)) if !object.has_field(&name) => {
                    Dynamic::Object(Box::new(self.untyped(nested, &field_path, depth + 1)?))
                }
                other => other,
            };
            let raw = value.as_value().cloned();

            match object.set_field(&name, value) {
                Ok(()) => report.record(
                    ReportCode::Attached,
                    &field_path,
                    format!("Attached '{}' after construction", name),
                    None,
                ),
                Err(e) => {
                    if self.config.strict_mode == StrictMode::Strict {
                        return Err(Error::AttachRejected {
                            type_name: object.type_name().to_string(),
                            field: name,
                            message: e.to_string(),
                        });
                    }
                    log::debug!("{} rejected {}: {}", object.type_name(), field_path, e);
                    report.record(ReportCode::Rejected, &field_path, e.to_string(), raw);
                }
            }
        }
        Ok(())
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
