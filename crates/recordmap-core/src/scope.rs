//! Type scopes and annotation resolution
//!
//! A scope is a named set of type descriptors, the stand-in for a module or
//! namespace. The resolver turns an annotation plus an optional scope id into
//! a descriptor; every failure (no scope, unloadable scope, unknown name)
//! reads as "not found" and never reaches the caller as an error.

use crate::annotation::TypeRef;
use crate::descriptor::TypeDescriptor;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors a scope provider may report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("scope '{0}' not found")]
    NotFound(String),

    #[error("failed to load scope '{scope}': {message}")]
    Load { scope: String, message: String },
}

/// An ordered set of type definitions visible under one scope id
#[derive(Debug, Clone, Default)]
pub struct TypeScope {
    id: String,
    types: Vec<Arc<TypeDescriptor>>,
}

impl TypeScope {
    /// Create an empty scope
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            types: Vec::new(),
        }
    }

    /// Builder-style registration
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Add a descriptor at the end of the scan order
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.push(Arc::new(descriptor));
    }

    /// Scope id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// First descriptor whose name matches exactly, in scan order
    pub fn find(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.iter().find(|d| d.name() == name).cloned()
    }

    /// Names of the registered types in scan order
    pub fn names(&self) -> Vec<&str> {
        self.types.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Source of type scopes
///
/// Loading and caching scopes is the provider's business; the rehydrator
/// only reads from what it returns.
pub trait ScopeProvider: Send + Sync {
    fn load(&self, scope: &str) -> Result<Arc<TypeScope>, ScopeError>;
}

/// In-process scope provider keyed by scope id
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    scopes: HashMap<String, Arc<TypeScope>>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a whole scope
    pub fn insert_scope(&mut self, scope: TypeScope) {
        self.scopes.insert(scope.id.clone(), Arc::new(scope));
    }

    /// Register a descriptor under a scope, creating the scope if needed
    pub fn register(&mut self, scope: &str, descriptor: TypeDescriptor) {
        let entry = self
            .scopes
            .entry(scope.to_string())
            .or_insert_with(|| Arc::new(TypeScope::new(scope)));
        Arc::make_mut(entry).register(descriptor);
    }

    /// Get a scope
    pub fn scope(&self, scope: &str) -> Option<Arc<TypeScope>> {
        self.scopes.get(scope).cloned()
    }

    /// Registered scope ids
    pub fn scope_ids(&self) -> Vec<&str> {
        self.scopes.keys().map(String::as_str).collect()
    }
}

impl ScopeProvider for TypeRegistry {
    fn load(&self, scope: &str) -> Result<Arc<TypeScope>, ScopeError> {
        self.scope(scope)
            .ok_or_else(|| ScopeError::NotFound(scope.to_string()))
    }
}

/// Resolves annotations to descriptors
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    provider: &'a dyn ScopeProvider,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a scope provider
    pub fn new(provider: &'a dyn ScopeProvider) -> Self {
        Self { provider }
    }

    /// Resolve a textual annotation such as `List[Foo]`
    pub fn resolve(&self, annotation: &str, scope: Option<&str>) -> Option<Arc<TypeDescriptor>> {
        match TypeRef::parse(annotation) {
            Ok(type_ref) => self.resolve_ref(&type_ref, scope),
            Err(e) => {
                log::debug!("Unresolvable annotation '{}': {}", annotation, e);
                None
            }
        }
    }

    /// Resolve a structured annotation
    pub fn resolve_ref(
        &self,
        type_ref: &TypeRef,
        scope: Option<&str>,
    ) -> Option<Arc<TypeDescriptor>> {
        let name = type_ref.element_name()?;
        let scope = scope?;

        let loaded = match self.provider.load(scope) {
            Ok(loaded) => loaded,
            Err(e) => {
                log::debug!("Cannot resolve '{}': {}", name, e);
                return None;
            }
        };

        let found = loaded.find(name);
        if found.is_none() {
            log::debug!("Type '{}' not found in scope '{}'", name, scope);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Arguments;
    use crate::object::Namespace;

    fn descriptor(name: &str, tag: &'static str) -> TypeDescriptor {
        TypeDescriptor::builder(name)
            .constructor(move |_args: &mut Arguments| {
                let mut ns = Namespace::new();
                ns.insert("tag", serde_json::json!(tag).into());
                Ok(ns)
            })
            .build()
            .unwrap()
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register("models", descriptor("Data", "first"));
        registry.register("models", descriptor("Other", "other"));
        registry.register("models", descriptor("Data", "second"));
        registry
    }

    fn tag_of(descriptor: &TypeDescriptor) -> String {
        let object = descriptor.construct(&mut Arguments::new()).unwrap();
        let ns = object.downcast_ref::<Namespace>().unwrap();
        ns.get_str("tag").unwrap().to_string()
    }

    #[test]
    fn test_resolve_plain_and_wrapped_names() {
        let registry = registry();
        let resolver = Resolver::new(&registry);

        for annotation in ["Data", "List[Data]", "Optional[list[Data]]", "Vec<Data>"] {
            let found = resolver.resolve(annotation, Some("models")).unwrap();
            assert_eq!(found.name(), "Data");
        }
    }

    #[test]
    fn test_first_match_wins() {
        let registry = registry();
        let resolver = Resolver::new(&registry);
        let found = resolver.resolve("Data", Some("models")).unwrap();
        assert_eq!(tag_of(&found), "first");
    }

    #[test]
    fn test_missing_scope_is_not_found() {
        let registry = registry();
        let resolver = Resolver::new(&registry);
        let cases = [
            ("Data", None),
            ("Data", Some("elsewhere")),
            ("Missing", Some("models")),
            ("Dict[str, Data]", Some("models")),
            ("List[", Some("models")),
        ];
        for (annotation, scope) in cases {
            assert!(
                resolver.resolve(annotation, scope).is_none(),
                "{}",
                annotation
            );
        }
    }

    #[test]
    fn test_failing_provider_is_not_found() {
        struct Broken;

        impl ScopeProvider for Broken {
            fn load(&self, scope: &str) -> Result<Arc<TypeScope>, ScopeError> {
                Err(ScopeError::Load {
                    scope: scope.to_string(),
                    message: "import failed".to_string(),
                })
            }
        }

        let resolver = Resolver::new(&Broken);
        assert!(resolver.resolve("Data", Some("models")).is_none());
    }

    #[test]
    fn test_scope_listing() {
        let scope = TypeScope::new("models")
            .with(descriptor("A", "a"))
            .with(descriptor("B", "b"));
        assert_eq!(scope.names(), vec!["A", "B"]);
        assert_eq!(scope.len(), 2);

        let mut registry = TypeRegistry::new();
        registry.insert_scope(scope);
        assert_eq!(registry.scope_ids(), vec!["models"]);
    }
}
