//! Constructor descriptors for rehydratable types
//!
//! A [`TypeDescriptor`] is the explicit, registered replacement for runtime
//! signature introspection: the ordered parameter list of a type's
//! constructor, the constructor itself, and optionally a factory for a
//! bare instance that is used when construction is abandoned.
//!
//! Copyright (c) 2025 Recordmap Team
//! Licensed under the Apache-2.0 license

use crate::annotation::{AnnotationError, TypeRef};
use crate::error::ConstructError;
use crate::object::Object;
use crate::types::{Dynamic, FromDynamic};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building a descriptor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("descriptor '{type_name}' has no constructor")]
    MissingConstructor { type_name: String },

    #[error("descriptor '{type_name}' declares parameter '{name}' twice")]
    DuplicateParameter { type_name: String, name: String },

    #[error("descriptor '{type_name}' declares more than one {kind:?} parameter")]
    DuplicateVariadic { type_name: String, kind: ParamKind },

    #[error("descriptor '{type_name}': {source}")]
    Annotation {
        type_name: String,
        #[source]
        source: AnnotationError,
    },
}

impl From<DescriptorError> for crate::Error {
    fn from(err: DescriptorError) -> Self {
        crate::Error::Configuration {
            message: err.to_string(),
            source: Some(err.into()),
        }
    }
}

/// How a constructor parameter receives its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// Implicit receiver, never bound from data
    Receiver,
    PositionalOnly,
    PositionalOrKeyword,
    KeywordOnly,
    /// Collects excess positional arguments
    VarPositional,
    /// Collects excess named arguments
    VarKeyword,
}

/// One constructor parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<TypeRef>,
    pub default: Option<Dynamic>,
}

impl Parameter {
    /// Create a parameter of the given kind
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotation: None,
            default: None,
        }
    }

    /// Implicit receiver (`self`)
    pub fn receiver() -> Self {
        Self::new("self", ParamKind::Receiver)
    }

    /// Positional-or-keyword parameter
    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::PositionalOrKeyword)
    }

    /// Positional-only parameter
    pub fn positional_only(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::PositionalOnly)
    }

    /// Keyword-only parameter
    pub fn keyword_only(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::KeywordOnly)
    }

    /// Variadic positional parameter
    pub fn var_positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VarPositional)
    }

    /// Variadic keyword parameter
    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VarKeyword)
    }

    /// Attach a structured annotation
    pub fn annotated(mut self, annotation: TypeRef) -> Self {
        self.annotation = Some(annotation);
        self
    }

    /// Attach a textual annotation such as `Optional[List[Data]]`
    pub fn typed(self, annotation: &str) -> Result<Self, AnnotationError> {
        Ok(self.annotated(TypeRef::parse(annotation)?))
    }

    /// Declare a default used when the record has no entry
    pub fn with_default(mut self, default: impl Into<Dynamic>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Arguments assembled for one constructor invocation
///
/// The rehydrator fills it; the constructor drains it with the typed
/// accessors and calls [`Arguments::finish`] to reject leftovers.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    positional: VecDeque<Dynamic>,
    keyword: IndexMap<String, Dynamic>,
}

impl Arguments {
    /// Create empty arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn push_positional(&mut self, value: Dynamic) {
        self.positional.push_back(value);
    }

    /// Append several positional arguments
    pub fn extend_positional(&mut self, values: impl IntoIterator<Item = Dynamic>) {
        self.positional.extend(values);
    }

    /// Add or replace a keyword argument; replacing keeps the original position
    pub fn insert_keyword(&mut self, name: impl Into<String>, value: Dynamic) -> Option<Dynamic> {
        self.keyword.insert(name.into(), value)
    }

    /// Remove the most recently added keyword argument
    pub fn pop_keyword(&mut self) -> Option<(String, Dynamic)> {
        self.keyword.pop()
    }

    /// Keyword argument names in insertion order
    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        self.keyword.keys().map(String::as_str)
    }

    /// Take the next positional argument
    ///
    /// A missing argument reads as null, so `Option<T>` parameters become
    /// `None` and everything else fails with `MissingArgument`.
    pub fn next<T: FromDynamic>(&mut self, name: &str) -> Result<T, ConstructError> {
        let value = self.positional.pop_front().unwrap_or_else(Dynamic::null);
        convert(name, value)
    }

    /// Take a keyword argument by name
    pub fn keyword<T: FromDynamic>(&mut self, name: &str) -> Result<T, ConstructError> {
        let value = self
            .keyword
            .shift_remove(name)
            .unwrap_or_else(Dynamic::null);
        convert(name, value)
    }

    /// Take every remaining positional argument
    pub fn rest<T: FromDynamic>(&mut self, name: &str) -> Result<Vec<T>, ConstructError> {
        self.positional
            .drain(..)
            .collect::<Vec<_>>()
            .into_iter()
            .enumerate()
            .map(|(index, value)| convert(&format!("{}[{}]", name, index), value))
            .collect()
    }

    /// Take every remaining keyword argument
    pub fn extra_keywords(&mut self) -> IndexMap<String, Dynamic> {
        std::mem::take(&mut self.keyword)
    }

    /// Fail if anything was left unconsumed
    pub fn finish(self) -> Result<(), ConstructError> {
        if let Some(name) = self.keyword.keys().next() {
            return Err(ConstructError::UnexpectedKeyword { name: name.clone() });
        }
        if !self.positional.is_empty() {
            return Err(ConstructError::UnexpectedPositional {
                count: self.positional.len(),
            });
        }
        Ok(())
    }
}

fn convert<T: FromDynamic>(name: &str, value: Dynamic) -> Result<T, ConstructError> {
    T::from_dynamic(value).map_err(|found| {
        if found.is_null() {
            ConstructError::MissingArgument {
                name: name.to_string(),
            }
        } else {
            ConstructError::TypeMismatch {
                name: name.to_string(),
                expected: T::expected(),
                found: found.kind(),
            }
        }
    })
}

/// Constructor closure stored in a descriptor
pub type Constructor =
    Arc<dyn Fn(&mut Arguments) -> Result<Box<dyn Object>, ConstructError> + Send + Sync>;

/// Factory for an instance created without running the constructor
pub type BareFactory = Arc<dyn Fn() -> Box<dyn Object> + Send + Sync>;

/// Everything needed to rebuild one type from a record
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    params: Vec<Parameter>,
    constructor: Constructor,
    bare: Option<BareFactory>,
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("bare", &self.bare.is_some())
            .finish()
    }
}

impl TypeDescriptor {
    /// Start building a descriptor
    pub fn builder(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder::new(name)
    }

    /// Declared type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constructor parameters in declaration order
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Invoke the constructor
    pub fn construct(&self, args: &mut Arguments) -> Result<Box<dyn Object>, ConstructError> {
        (self.constructor)(args)
    }

    /// Create a bare instance, if the type supports it
    pub fn bare(&self) -> Option<Box<dyn Object>> {
        self.bare.as_ref().map(|factory| factory())
    }
}

/// Fluent builder for [`TypeDescriptor`]
pub struct TypeDescriptorBuilder {
    name: String,
    params: Vec<Parameter>,
    constructor: Option<Constructor>,
    bare: Option<BareFactory>,
}

impl TypeDescriptorBuilder {
    /// Create a builder for the named type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            constructor: None,
            bare: None,
        }
    }

    /// Append a parameter
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Append several parameters
    pub fn params(mut self, params: impl IntoIterator<Item = Parameter>) -> Self {
        self.params.extend(params);
        self
    }

    /// Append a parameter with a textual annotation
    pub fn typed_param(
        mut self,
        param: Parameter,
        annotation: &str,
    ) -> Result<Self, DescriptorError> {
        let param = param.typed(annotation).map_err(|source| DescriptorError::Annotation {
            type_name: self.name.clone(),
            source,
        })?;
        self.params.push(param);
        Ok(self)
    }

    /// Set the constructor
    pub fn constructor<T, F>(mut self, constructor: F) -> Self
    where
        T: Object,
        F: Fn(&mut Arguments) -> Result<T, ConstructError> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move |args: &mut Arguments| {
            constructor(args).map(|object| Box::new(object) as Box<dyn Object>)
        }));
        self
    }

    /// Set the bare-instance factory
    pub fn bare<T, F>(mut self, factory: F) -> Self
    where
        T: Object,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bare = Some(Arc::new(move || Box::new(factory()) as Box<dyn Object>));
        self
    }

    /// Use `T::default()` as the bare instance
    pub fn bare_default<T: Object + Default>(self) -> Self {
        self.bare(T::default)
    }

    /// Validate and build the descriptor
    pub fn build(self) -> Result<TypeDescriptor, DescriptorError> {
        let constructor = self.constructor.ok_or_else(|| DescriptorError::MissingConstructor {
            type_name: self.name.clone(),
        })?;

        let mut seen = HashSet::new();
        let mut variadics = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                return Err(DescriptorError::DuplicateParameter {
                    type_name: self.name.clone(),
                    name: param.name.clone(),
                });
            }
            if matches!(param.kind, ParamKind::VarPositional | ParamKind::VarKeyword)
                && !variadics.insert(param.kind)
            {
                return Err(DescriptorError::DuplicateVariadic {
                    type_name: self.name.clone(),
                    kind: param.kind,
                });
            }
        }

        Ok(TypeDescriptor {
            name: self.name,
            params: self.params,
            constructor,
            bare: self.bare,
        })
    }
}
