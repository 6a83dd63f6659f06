//! Mapper facade
//!
//! Bundles a [`MapperConfig`] with a [`TypeRegistry`] so callers can flatten
//! and rehydrate without wiring the flattener, rehydrator and resolver by hand.
//!
//! Copyright (c) 2025 Recordmap Team
//! Licensed under the Apache-2.0 license

use crate::config::MapperConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::flatten::Flattener;
use crate::object::Object;
use crate::rehydrate::{Rehydrated, Rehydrator};
use crate::scope::TypeRegistry;
use crate::types::Record;
use std::path::Path;

/// Configured entry point for both directions
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    config: MapperConfig,
    registry: TypeRegistry,
}

impl Mapper {
    /// Create a mapper with the given configuration and no registered types
    pub fn new(config: MapperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: TypeRegistry::new(),
        })
    }

    /// Create a mapper from a JSON or YAML configuration file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Self::new(MapperConfig::load(path)?)
    }

    /// Use an existing registry
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register a type under a scope
    pub fn register(&mut self, scope: &str, descriptor: TypeDescriptor) -> &mut Self {
        self.registry.register(scope, descriptor);
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Flatten an object into a record
    pub fn flatten(&self, object: &dyn Object) -> Result<Record> {
        Flattener::new(&self.config).flatten(object)
    }

    /// Rehydrate a record against an optional target descriptor
    pub fn rehydrate(
        &self,
        record: &Record,
        target: Option<&TypeDescriptor>,
        scope: Option<&str>,
    ) -> Result<Rehydrated> {
        Rehydrator::with_scopes(&self.config, &self.registry)
            .rehydrate(record, target, scope)
    }

    /// Rehydrate a record against a type registered in `scope`
    pub fn rehydrate_named(
        &self,
        record: &Record,
        type_name: &str,
        scope: &str,
    ) -> Result<Rehydrated> {
        let descriptor = self
            .registry
            .scope(scope)
            .and_then(|types| types.find(type_name))
            .ok_or_else(|| Error::Configuration {
                message: format!(
                    "type '{}' is not registered in scope '{}'",
                    type_name, scope
                ),
                source: None,
            })?;
        self.rehydrate(record, Some(&*descriptor), Some(scope))
    }

    /// Rehydrate and take the result as a concrete type
    pub fn rehydrate_as<T: Object>(
        &self,
        record: &Record,
        type_name: &str,
        scope: &str,
    ) -> Result<T> {
        let rehydrated = self.rehydrate_named(record, type_name, scope)?;
        rehydrated.into_inner::<T>().map_err(|object| Error::Construction {
            type_name: type_name.to_string(),
            message: format!("rehydrated into {} instead", object.type_name()),
            source: None,
        })
    }
}
