//! Structured type annotations
//!
//! Constructor parameters carry a [`TypeRef`] instead of a raw string. The
//! element relation is explicit, so `List[Foo]` is a sequence of `Foo` and
//! resolves to `Foo` without string surgery at lookup time. Textual
//! annotations in either bracket style (`Optional[list[Foo]]`,
//! `Option<Vec<Foo>>`) are parsed once with [`TypeRef::parse`].

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while parsing a textual annotation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("empty type annotation")]
    Empty,

    #[error("malformed type annotation '{annotation}'")]
    Malformed { annotation: String },
}

/// A declared parameter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A plain type name, e.g. `Foo`
    Named(String),
    /// A value that may be absent, e.g. `Optional[Foo]`
    Optional(Box<TypeRef>),
    /// A homogeneous collection, e.g. `List[Foo]`
    Sequence(Box<TypeRef>),
    /// Any other generic, e.g. `Dict[str, Foo]`
    Generic { outer: String, args: Vec<TypeRef> },
}

const SEQUENCE_OUTERS: &[&str] = &[
    "list",
    "List",
    "Sequence",
    "Vec",
    "set",
    "Set",
    "frozenset",
    "FrozenSet",
    "Iterable",
];
const OPTIONAL_OUTERS: &[&str] = &["Optional", "Option"];

fn generic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][\w.:]*)\s*(?:\[(.*)\]|<(.*)>)$")
            .expect("valid generic pattern")
    })
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][\w.:]*$").expect("valid pattern"))
}

impl TypeRef {
    /// Plain named type
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// Optional wrapper
    pub fn optional(inner: TypeRef) -> Self {
        TypeRef::Optional(Box::new(inner))
    }

    /// Sequence wrapper
    pub fn sequence(inner: TypeRef) -> Self {
        TypeRef::Sequence(Box::new(inner))
    }

    /// Parse a textual annotation
    pub fn parse(annotation: &str) -> Result<Self, AnnotationError> {
        let trimmed = annotation
            .trim()
            .trim_matches(|c: char| c == '\'' || c == '"')
            .trim();
        if trimmed.is_empty() {
            return Err(AnnotationError::Empty);
        }

        // PEP 604 unions: `Foo | None`
        let alternatives = split_top_level(trimmed, '|');
        if alternatives.len() > 1 {
            let present: Vec<&str> = alternatives
                .iter()
                .map(|alt| alt.trim())
                .filter(|alt| *alt != "None")
                .collect();
            let has_none = present.len() < alternatives.len();
            return match (present.as_slice(), has_none) {
                ([single], true) => Ok(TypeRef::optional(TypeRef::parse(single)?)),
                _ => Ok(TypeRef::Generic {
                    outer: "Union".to_string(),
                    args: present
                        .iter()
                        .map(|alt| TypeRef::parse(alt))
                        .collect::<Result<_, _>>()?,
                }),
            };
        }

        if let Some(captures) = generic_pattern().captures(trimmed) {
            let outer = captures[1].to_string();
            let inner = captures
                .get(2)
                .or_else(|| captures.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let mut args = split_top_level(inner, ',')
                .into_iter()
                .map(TypeRef::parse)
                .collect::<Result<Vec<_>, _>>()?;

            let short = short_name(&outer);
            let is_optional = OPTIONAL_OUTERS.contains(&short);
            let is_sequence = SEQUENCE_OUTERS.contains(&short);
            if args.len() == 1 && (is_optional || is_sequence) {
                let single = args.remove(0);
                return Ok(if is_optional {
                    TypeRef::optional(single)
                } else {
                    TypeRef::sequence(single)
                });
            }
            return Ok(TypeRef::Generic { outer, args });
        }

        if name_pattern().is_match(trimmed) {
            return Ok(TypeRef::Named(trimmed.to_string()));
        }

        Err(AnnotationError::Malformed {
            annotation: annotation.to_string(),
        })
    }

    /// The type name a scope lookup should use
    ///
    /// Optional, sequence and single-argument generic wrappers unwrap to
    /// their element; generics with several arguments have no single name.
    pub fn element_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(short_name(name)),
            TypeRef::Optional(inner) | TypeRef::Sequence(inner) => inner.element_name(),
            TypeRef::Generic { args, .. } => match args.as_slice() {
                [single] => single.element_name(),
                _ => None,
            },
        }
    }

    /// Whether values of this type are collections to be mapped element-wise
    pub fn is_sequence(&self) -> bool {
        match self {
            TypeRef::Sequence(_) => true,
            TypeRef::Optional(inner) => inner.is_sequence(),
            _ => false,
        }
    }
}

impl FromStr for TypeRef {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeRef::parse(s)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Optional(inner) => write!(f, "Optional[{}]", inner),
            TypeRef::Sequence(inner) => write!(f, "List[{}]", inner),
            TypeRef::Generic { outer, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{}[{}]", outer, args.join(", "))
            }
        }
    }
}

/// Last path segment of a qualified name: `models.Foo` and `models::Foo` give `Foo`
fn short_name(name: &str) -> &str {
    name.rsplit(|c: char| c == '.' || c == ':')
        .next()
        .unwrap_or(name)
}

/// Split on `separator` outside of any bracket pair
fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, c) in input.char_indices() {
        match c {
            '[' | '<' | '(' => depth += 1,
            ']' | '>' | ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(input[start..index].trim());
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}
