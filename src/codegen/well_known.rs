//! Well-known types
//!
//! `google.protobuf.*` messages that map onto standard types when
//! `convert_well_known` is enabled, plus the shared `WellKnownConversions`
//! helper class that performs the mapping.

use crate::descriptor::ScalarType;
use crate::ir::{Expr, MethodDecl, Modifier, ConstructorDecl, Stmt, TypeDecl, TypeRef};

const PREFIX: &str = "google.protobuf.";

/// A recognized `google.protobuf` message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WellKnown {
    Timestamp,
    Duration,
    /// Single-value wrapper (`Int32Value`, `StringValue`, ...)
    Wrapper(ScalarType),
    /// Recognized but passed through unchanged (`Any`, `Struct`, `Empty`, ...)
    Other(String),
}

const WRAPPERS: &[(&str, ScalarType)] = &[
    ("DoubleValue", ScalarType::Double),
    ("FloatValue", ScalarType::Float),
    ("Int64Value", ScalarType::Int64),
    ("UInt64Value", ScalarType::Uint64),
    ("Int32Value", ScalarType::Int32),
    ("UInt32Value", ScalarType::Uint32),
    ("BoolValue", ScalarType::Bool),
    ("StringValue", ScalarType::String),
    ("BytesValue", ScalarType::Bytes),
];

impl WellKnown {
    /// Recognize a message type reference
    pub fn lookup(type_name: &str) -> Option<Self> {
        let name = type_name.strip_prefix(PREFIX)?;
        if name.is_empty() || name.contains('.') {
            return None;
        }
        let known = match name {
            "Timestamp" => Self::Timestamp,
            "Duration" => Self::Duration,
            other => match WRAPPERS.iter().find(|(n, _)| *n == other) {
                Some((_, scalar)) => Self::Wrapper(*scalar),
                None => Self::Other(other.to_string()),
            },
        };
        Some(known)
    }

    pub fn simple_name(&self) -> &str {
        match self {
            Self::Timestamp => "Timestamp",
            Self::Duration => "Duration",
            Self::Wrapper(scalar) => WRAPPERS
                .iter()
                .find(|(_, s)| s == scalar)
                .map(|(n, _)| *n)
                .unwrap_or("Value"),
            Self::Other(name) => name,
        }
    }

    pub fn native_type(&self) -> TypeRef {
        TypeRef::named(format!("com.google.protobuf.{}", self.simple_name()))
    }

    /// Whether a standard counterpart exists
    pub fn is_convertible(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Standard type exposed to callers when converting
    pub fn converted_type(&self) -> TypeRef {
        match self {
            Self::Timestamp => TypeRef::named("java.time.Instant"),
            Self::Duration => TypeRef::named("java.time.Duration"),
            Self::Wrapper(scalar) => wrapper_value_type(*scalar),
            Self::Other(_) => self.native_type(),
        }
    }

    fn read_method(&self) -> String {
        match self {
            Self::Timestamp => "toInstant".to_string(),
            Self::Duration => "toJavaDuration".to_string(),
            other => format!("from{}", other.simple_name()),
        }
    }

    fn write_method(&self) -> String {
        match self {
            Self::Timestamp => "toTimestamp".to_string(),
            Self::Duration => "toProtoDuration".to_string(),
            other => format!("to{}", other.simple_name()),
        }
    }

    /// Native value -> standard value
    pub fn read(&self, conversions: &TypeRef, value: Expr) -> Expr {
        if !self.is_convertible() {
            return value;
        }
        Expr::static_call(conversions.clone(), self.read_method(), vec![value])
    }

    /// Standard value -> native value
    pub fn write(&self, conversions: &TypeRef, value: Expr) -> Expr {
        if !self.is_convertible() {
            return value;
        }
        Expr::static_call(conversions.clone(), self.write_method(), vec![value])
    }
}

fn wrapper_value_type(scalar: ScalarType) -> TypeRef {
    match scalar {
        ScalarType::Double => TypeRef::named("Double"),
        ScalarType::Float => TypeRef::named("Float"),
        ScalarType::Int32 => TypeRef::named("Integer"),
        ScalarType::Bool => TypeRef::named("Boolean"),
        ScalarType::String => TypeRef::string(),
        ScalarType::Bytes => TypeRef::byte_string(),
        _ => TypeRef::named("Long"),
    }
}

/// Static helper class converting between well-known and standard types
pub fn conversions_class(package: &str) -> TypeDecl {
    let timestamp = WellKnown::Timestamp.native_type();
    let duration = WellKnown::Duration.native_type();
    let instant = TypeRef::named("java.time.Instant");
    let java_duration = TypeRef::named("java.time.Duration");
    let value = || Expr::var("value");

    let mut decl = TypeDecl::class("WellKnownConversions")
        .in_package(package)
        .modifiers(&[Modifier::Public, Modifier::Final])
        .doc("Conversions between google.protobuf well-known types and standard types.")
        .constructor(ConstructorDecl::new(&[Modifier::Private]))
        .method(
            static_method("toInstant", instant.clone(), timestamp.clone()).returning(Expr::static_call(
                instant.clone(),
                "ofEpochSecond",
                vec![value().call("getSeconds", vec![]), value().call("getNanos", vec![])],
            )),
        )
        .method(
            static_method("toTimestamp", timestamp.clone(), instant).returning(
                Expr::static_call(timestamp, "newBuilder", vec![])
                    .call("setSeconds", vec![value().call("getEpochSecond", vec![])])
                    .call("setNanos", vec![value().call("getNano", vec![])])
                    .call("build", vec![]),
            ),
        )
        .method(
            static_method("toJavaDuration", java_duration.clone(), duration.clone()).returning(Expr::static_call(
                java_duration.clone(),
                "ofSeconds",
                vec![value().call("getSeconds", vec![]), value().call("getNanos", vec![])],
            )),
        )
        .method(
            static_method("toProtoDuration", duration.clone(), java_duration).returning(
                Expr::static_call(duration, "newBuilder", vec![])
                    .call("setSeconds", vec![value().call("getSeconds", vec![])])
                    .call("setNanos", vec![value().call("getNano", vec![])])
                    .call("build", vec![]),
            ),
        );

    for (_, scalar) in WRAPPERS {
        let known = WellKnown::Wrapper(*scalar);
        let native = known.native_type();
        let standard = known.converted_type();

        let unwrapped = match scalar {
            ScalarType::Uint32 => Expr::static_call(
                TypeRef::named("Integer"),
                "toUnsignedLong",
                vec![value().call("getValue", vec![])],
            ),
            _ => value().call("getValue", vec![]),
        };
        let wrapped_arg = match scalar {
            ScalarType::Uint32 => Expr::cast(TypeRef::int(), value()),
            _ => value(),
        };

        decl = decl
            .method(static_method(&known.read_method(), standard.clone(), native.clone()).body(vec![
                Stmt::if_then(value().equals(Expr::null()), vec![Stmt::ret(Expr::null())]),
                Stmt::ret(unwrapped),
            ]))
            .method(static_method(&known.write_method(), native.clone(), standard).body(vec![
                Stmt::if_then(value().equals(Expr::null()), vec![Stmt::ret(Expr::null())]),
                Stmt::ret(Expr::static_call(native, "of", vec![wrapped_arg])),
            ]));
    }
    decl
}

fn static_method(name: &str, returns: TypeRef, param: TypeRef) -> MethodDecl {
    MethodDecl::new(name, returns)
        .modifiers(&[Modifier::Public, Modifier::Static])
        .param("value", param)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(WellKnown::lookup("google.protobuf.Timestamp"), Some(WellKnown::Timestamp));
        assert_eq!(
            WellKnown::lookup("google.protobuf.UInt32Value"),
            Some(WellKnown::Wrapper(ScalarType::Uint32))
        );
        assert_eq!(WellKnown::lookup("google.protobuf.Any"), Some(WellKnown::Other("Any".into())));
        assert_eq!(WellKnown::lookup("Timestamp"), None);
        assert_eq!(WellKnown::lookup("google.protobuf.compiler.Version"), None);
    }

    #[test]
    fn test_conversions_class_covers_every_wrapper() {
        let decl = conversions_class("org.acme");
        assert_eq!(decl.qualified_name(), "org.acme.WellKnownConversions");
        assert!(decl.has_method("toInstant"));
        assert!(decl.has_method("toProtoDuration"));
        assert!(decl.has_method("fromStringValue"));
        assert!(decl.has_method("toUInt64Value"));
        assert_eq!(decl.methods.len(), 4 + 2 * WRAPPERS.len());
    }

    #[test]
    fn test_passthrough_types_are_not_converted() {
        let conversions = TypeRef::named("org.acme.WellKnownConversions");
        let any = WellKnown::Other("Any".into());
        assert_eq!(any.read(&conversions, Expr::var("x")), Expr::var("x"));
        assert_eq!(any.converted_type(), TypeRef::named("com.google.protobuf.Any"));
    }
}
