//! Type descriptors used in place of runtime reflection. An activity declares its parameters and
//! results as [TypeTag]s when it is registered, and call sites are checked against those tags.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Which flavor of execution context a leading function parameter represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    /// The context handed to running activity code
    Activity,
    /// The context handed to workflow code
    Workflow,
}

/// Describes the declared type of a parameter or result, or the runtime type of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    Int,
    UInt,
    Float,
    String,
    Bytes,
    /// Homogeneous list of the inner type
    List(Box<TypeTag>),
    /// String-keyed map with values of the inner type
    Map(Box<TypeTag>),
    /// Named structure. Conformance is by name.
    Struct(String),
    /// Either null or the inner type
    Optional(Box<TypeTag>),
    /// Accepts any value
    Any,
    /// Error-like result slot
    Error,
    /// Execution context capability
    Context(ContextKind),
    Function(Box<FunctionSignature>),
    Channel(Box<TypeTag>),
    Variadic(Box<TypeTag>),
    RawPointer,
}

impl TypeTag {
    pub fn list(inner: TypeTag) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn map(inner: TypeTag) -> Self {
        Self::Map(Box::new(inner))
    }

    pub fn optional(inner: TypeTag) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::Struct(name.into())
    }

    pub fn function(sig: FunctionSignature) -> Self {
        Self::Function(Box::new(sig))
    }

    /// Returns true if values of this type can be carried in a payload. Callables, channels,
    /// variadic markers, raw pointers, contexts and errors cannot, nor can containers of them.
    pub fn is_serializable(&self) -> bool {
        match self {
            TypeTag::Bool
            | TypeTag::Int
            | TypeTag::UInt
            | TypeTag::Float
            | TypeTag::String
            | TypeTag::Bytes
            | TypeTag::Struct(_)
            | TypeTag::Any => true,
            TypeTag::List(t) | TypeTag::Map(t) | TypeTag::Optional(t) => t.is_serializable(),
            TypeTag::Error
            | TypeTag::Context(_)
            | TypeTag::Function(_)
            | TypeTag::Channel(_)
            | TypeTag::Variadic(_)
            | TypeTag::RawPointer => false,
        }
    }

    pub fn is_context(&self, kind: ContextKind) -> bool {
        matches!(self, TypeTag::Context(k) if *k == kind)
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::Int => f.write_str("int"),
            TypeTag::UInt => f.write_str("uint"),
            TypeTag::Float => f.write_str("float"),
            TypeTag::String => f.write_str("string"),
            TypeTag::Bytes => f.write_str("bytes"),
            TypeTag::List(t) => write!(f, "list<{}>", t),
            TypeTag::Map(t) => write!(f, "map<string, {}>", t),
            TypeTag::Struct(name) => write!(f, "struct {}", name),
            TypeTag::Optional(t) => write!(f, "option<{}>", t),
            TypeTag::Any => f.write_str("any"),
            TypeTag::Error => f.write_str("error"),
            TypeTag::Context(ContextKind::Activity) => f.write_str("activity context"),
            TypeTag::Context(ContextKind::Workflow) => f.write_str("workflow context"),
            TypeTag::Function(sig) => write!(f, "{}", sig),
            TypeTag::Channel(t) => write!(f, "channel<{}>", t),
            TypeTag::Variadic(t) => write!(f, "...{}", t),
            TypeTag::RawPointer => f.write_str("raw pointer"),
        }
    }
}

/// Declared shape of a callable: its stable name, parameter types and result types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<TypeTag>,
    pub results: Vec<TypeTag>,
}

impl FunctionSignature {
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = TypeTag>,
        results: impl IntoIterator<Item = TypeTag>,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
            results: results.into_iter().collect(),
        }
    }
}

impl Display for FunctionSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn {}({})", self.name, self.params.iter().format(", "))?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {}", single),
            many => write!(f, " -> ({})", many.iter().format(", ")),
        }
    }
}

/// The two result layouts an activity may declare
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    /// Only an error slot
    ErrorOnly,
    /// A result value followed by an error slot
    ResultAndError(TypeTag),
}

impl ReturnShape {
    pub fn result_type(&self) -> Option<&TypeTag> {
        match self {
            ReturnShape::ErrorOnly => None,
            ReturnShape::ResultAndError(t) => Some(t),
        }
    }
}
