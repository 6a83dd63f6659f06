//! Recordmap Core - Bidirectional mapping between object graphs and plain records
//!
//! This crate converts objects into plain nested records ("flatten") and
//! rebuilds object graphs from such records ("rehydrate") without per-type
//! conversion code beyond a small field-set implementation and a
//! constructor descriptor.
//!
//! # Main Components
//!
//! - **Field sets**: the [`Object`] trait, [`Field`] views and [`Dynamic`] values
//! - **Flattener**: recursive object to record conversion with cycle and depth guards
//! - **Rehydrator**: constructor binding, keyword relaxation and post-construction attachment
//! - **Type Resolver**: annotation parsing and scope lookup
//! - **Error Handling**: error types using `thiserror` and `anyhow`
//!
//! # Example
//!
//! ```no_run
//! use recordmap_core::{flatten, rehydrate, MapperConfig, Namespace, Result};
//!
//! fn example() -> Result<()> {
//!     let config = MapperConfig::default();
//!     let record = serde_json::json!({"name": "Joe", "data": {"name": "John"}});
//!     let record = record.as_object().cloned().unwrap_or_default();
//!
//!     let rebuilt = rehydrate(&record, None, None, &config)?;
//!     let ns = rebuilt.downcast_ref::<Namespace>().expect("untyped result");
//!     assert_eq!(ns.get_str("name"), Some("Joe"));
//!
//!     assert_eq!(flatten(ns, &config)?, record);
//!     Ok(())
//! }
//! ```

pub mod annotation;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod flatten;
pub mod mapper;
pub mod object;
pub mod rehydrate;
pub mod scope;
pub mod types;

// Re-export main types for convenience
pub use annotation::{AnnotationError, TypeRef};
pub use config::MapperConfig;
pub use descriptor::{
    Arguments, DescriptorError, ParamKind, Parameter, TypeDescriptor, TypeDescriptorBuilder,
};
pub use error::{ConstructError, Error, ReportCode, Result, SetFieldError, Severity, StrictMode};
pub use flatten::Flattener;
pub use mapper::Mapper;
pub use object::{FieldLayout, Namespace, Object};
pub use rehydrate::{
    ConstructionStatus, Rehydrated, RehydrationReport, Rehydrator, ReportItem, ReportSummary,
};
pub use scope::{Resolver, ScopeError, ScopeProvider, TypeRegistry, TypeScope};
pub use types::{Dynamic, Field, FromDynamic, Record, ToField};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Flatten an object into a plain record
pub fn flatten(object: &dyn Object, config: &MapperConfig) -> Result<Record> {
    Flattener::new(config).flatten(object)
}

/// Rehydrate a record, resolving nested annotations through `provider` when given
pub fn rehydrate(
    record: &Record,
    target: Option<&TypeDescriptor>,
    scope: Option<(&dyn ScopeProvider, &str)>,
    config: &MapperConfig,
) -> Result<Rehydrated> {
    let rehydrator = match scope {
        Some((provider, _)) => Rehydrator::with_scopes(config, provider),
        None => Rehydrator::new(config),
    };
    rehydrator.rehydrate(record, target, scope.map(|(_, id)| id))
}
