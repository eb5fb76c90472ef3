//! Type references

use serde::Serialize;
use std::fmt;

/// Primitive value types of the target language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Reference type used in generic positions
    pub fn boxed_name(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Int => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
        }
    }
}

/// A reference to a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    Void,
    Primitive { primitive: Primitive },
    /// Class, interface or enum by (qualified) name, with type arguments
    Named { name: String, args: Vec<TypeRef> },
    /// Type variable declared by the enclosing declaration
    Variable { name: String },
    /// `?` in a type-argument position
    Wildcard,
    Array { element: Box<TypeRef> },
}

impl TypeRef {
    pub fn void() -> Self {
        Self::Void
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self::Primitive { primitive }
    }

    pub fn boolean() -> Self {
        Self::primitive(Primitive::Boolean)
    }

    pub fn int() -> Self {
        Self::primitive(Primitive::Int)
    }

    pub fn long() -> Self {
        Self::primitive(Primitive::Long)
    }

    pub fn float() -> Self {
        Self::primitive(Primitive::Float)
    }

    pub fn double() -> Self {
        Self::primitive(Primitive::Double)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    pub fn string() -> Self {
        Self::named("String")
    }

    pub fn object() -> Self {
        Self::named("Object")
    }

    pub fn byte_string() -> Self {
        Self::named("com.google.protobuf.ByteString")
    }

    pub fn bytes_array() -> Self {
        Self::Array {
            element: Box::new(Self::named("byte")),
        }
    }

    pub fn list(element: TypeRef) -> Self {
        Self::generic("java.util.List", vec![element.boxed()])
    }

    pub fn array_list(element: TypeRef) -> Self {
        Self::generic("java.util.ArrayList", vec![element.boxed()])
    }

    /// Same type with primitives replaced by their boxed form
    pub fn boxed(self) -> Self {
        match self {
            Self::Primitive { primitive } => Self::named(primitive.boxed_name()),
            other => other,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive { .. })
    }

    /// Name without type arguments, if this is a named type
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            Self::Variable { name } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Primitive { primitive } => f.write_str(primitive.as_str()),
            Self::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            Self::Variable { name } => f.write_str(name),
            Self::Wildcard => f.write_str("?"),
            Self::Array { element } => write!(f, "{}[]", element),
        }
    }
}

/// Type parameter on a class or method (`P extends Message`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeParam {
    pub name: String,
    pub bound: Option<TypeRef>,
}

impl TypeParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: None,
        }
    }

    pub fn bounded(name: impl Into<String>, bound: TypeRef) -> Self {
        Self {
            name: name.into(),
            bound: Some(bound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TypeRef::list(TypeRef::long()).to_string(), "java.util.List<Long>");
        assert_eq!(
            TypeRef::generic("AbstractOrder", vec![TypeRef::Wildcard]).to_string(),
            "AbstractOrder<?>"
        );
        assert_eq!(TypeRef::bytes_array().to_string(), "byte[]");
    }
}
