//! Type-conflict classification
//!
//! A fixed table keyed on the (old, new) declared type kinds of a field.
//! Each entry says whether generated code can still expose one accessor,
//! and at which severity the change is reported.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::breaking::Severity;
use crate::descriptor::{FieldType, ScalarType};

/// How a field's type changed between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeConflict {
    /// Integer <-> enum
    IntEnum,
    /// Enum <-> a different enum
    EnumEnum,
    /// 32-bit integer -> 64-bit integer
    Widening,
    /// 64-bit integer -> 32-bit integer
    Narrowing,
    /// Signed <-> unsigned of the same width
    SignedUnsigned,
    /// Same width and signedness, different wire encoding (int32 <-> sint32)
    IntegerEncoding,
    /// float <-> double
    FloatDouble,
    /// string <-> bytes
    StringBytes,
    /// Scalar <-> message
    PrimitiveMessage,
    /// Anything else: bool <-> int, enum <-> message, message <-> message at another path
    Incompatible,
}

impl TypeConflict {
    /// Classify a type change. Returns `None` when both types have the same shape.
    pub fn classify(old: &FieldType, new: &FieldType) -> Option<Self> {
        if old.same_shape(new) {
            return None;
        }

        let conflict = match (old, new) {
            (FieldType::Scalar(s), FieldType::Enum(_)) | (FieldType::Enum(_), FieldType::Scalar(s))
                if s.is_integer() =>
            {
                Self::IntEnum
            }
            (FieldType::Enum(_), FieldType::Enum(_)) => Self::EnumEnum,
            (FieldType::Scalar(a), FieldType::Scalar(b)) => classify_scalars(*a, *b),
            (FieldType::Scalar(_), FieldType::Message(_)) | (FieldType::Message(_), FieldType::Scalar(_)) => {
                Self::PrimitiveMessage
            }
            _ => Self::Incompatible,
        };
        Some(conflict)
    }

    /// Whether generated code can expose one unified accessor
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::PrimitiveMessage | Self::Incompatible)
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::IntEnum => Severity::Info,
            Self::EnumEnum
            | Self::Widening
            | Self::Narrowing
            | Self::SignedUnsigned
            | Self::IntegerEncoding
            | Self::FloatDouble
            | Self::StringBytes => Severity::Warning,
            Self::PrimitiveMessage | Self::Incompatible => Severity::Error,
        }
    }

    /// What generated code does about the conflict
    pub fn note(&self) -> &'static str {
        match self {
            Self::IntEnum => "unified as int with an enum helper accessor",
            Self::EnumEnum => "unified as int for cross-version access",
            Self::Widening => "unified as the wider type (long)",
            Self::Narrowing => "unified as the wider type (long); values may not fit the narrower version",
            Self::SignedUnsigned => "unified as long for unsigned safety",
            Self::IntegerEncoding => "same accessor type; wire encoding differs between versions",
            Self::FloatDouble => "unified as double",
            Self::StringBytes => "unified as bytes; decode text explicitly",
            Self::PrimitiveMessage => "no single accessor can return both a scalar and a message",
            Self::Incompatible => "types have no common representation",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntEnum => "INT_ENUM",
            Self::EnumEnum => "ENUM_ENUM",
            Self::Widening => "WIDENING",
            Self::Narrowing => "NARROWING",
            Self::SignedUnsigned => "SIGNED_UNSIGNED",
            Self::IntegerEncoding => "INTEGER_ENCODING",
            Self::FloatDouble => "FLOAT_DOUBLE",
            Self::StringBytes => "STRING_BYTES",
            Self::PrimitiveMessage => "PRIMITIVE_MESSAGE",
            Self::Incompatible => "INCOMPATIBLE",
        }
    }
}

impl fmt::Display for TypeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn classify_scalars(a: ScalarType, b: ScalarType) -> TypeConflict {
    match (a.integer_width(), b.integer_width()) {
        (Some(wa), Some(wb)) => {
            if wa == wb && a.is_unsigned() != b.is_unsigned() {
                TypeConflict::SignedUnsigned
            } else if wa < wb {
                TypeConflict::Widening
            } else if wa > wb {
                TypeConflict::Narrowing
            } else {
                TypeConflict::IntegerEncoding
            }
        }
        _ if a.is_floating() && b.is_floating() => TypeConflict::FloatDouble,
        _ if matches!(
            (a, b),
            (ScalarType::String, ScalarType::Bytes) | (ScalarType::Bytes, ScalarType::String)
        ) =>
        {
            TypeConflict::StringBytes
        }
        _ => TypeConflict::Incompatible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(s: ScalarType) -> FieldType {
        FieldType::Scalar(s)
    }

    #[test]
    fn test_same_shape_is_not_a_conflict() {
        assert_eq!(TypeConflict::classify(&scalar(ScalarType::Int32), &scalar(ScalarType::Int32)), None);
        assert_eq!(
            TypeConflict::classify(&FieldType::Enum("Order.Status".into()), &FieldType::Enum("Status".into())),
            None
        );
    }

    #[test]
    fn test_integer_table() {
        let cases = [
            (ScalarType::Int32, ScalarType::Int64, TypeConflict::Widening),
            (ScalarType::Uint32, ScalarType::Int64, TypeConflict::Widening),
            (ScalarType::Int64, ScalarType::Int32, TypeConflict::Narrowing),
            (ScalarType::Int32, ScalarType::Uint32, TypeConflict::SignedUnsigned),
            (ScalarType::Fixed64, ScalarType::Sfixed64, TypeConflict::SignedUnsigned),
            (ScalarType::Int32, ScalarType::Sint32, TypeConflict::IntegerEncoding),
            (ScalarType::Float, ScalarType::Double, TypeConflict::FloatDouble),
            (ScalarType::Bytes, ScalarType::String, TypeConflict::StringBytes),
            (ScalarType::Bool, ScalarType::Int32, TypeConflict::Incompatible),
        ];
        for (old, new, expected) in cases {
            assert_eq!(TypeConflict::classify(&scalar(old), &scalar(new)), Some(expected), "{} -> {}", old, new);
        }
    }

    #[test]
    fn test_reference_table() {
        let money = FieldType::Message("Money".into());
        let status = FieldType::Enum("Status".into());

        assert_eq!(
            TypeConflict::classify(&scalar(ScalarType::Int32), &money),
            Some(TypeConflict::PrimitiveMessage)
        );
        assert_eq!(
            TypeConflict::classify(&scalar(ScalarType::Int32), &status),
            Some(TypeConflict::IntEnum)
        );
        assert_eq!(
            TypeConflict::classify(&scalar(ScalarType::String), &status),
            Some(TypeConflict::Incompatible)
        );
        assert_eq!(
            TypeConflict::classify(&status, &FieldType::Enum("Priority".into())),
            Some(TypeConflict::EnumEnum)
        );
        assert_eq!(TypeConflict::classify(&status, &money), Some(TypeConflict::Incompatible));
        assert_eq!(
            TypeConflict::classify(&money, &FieldType::Message("Price".into())),
            Some(TypeConflict::Incompatible)
        );
    }

    #[test]
    fn test_message_moved_between_scopes_is_incompatible() {
        let nested = FieldType::Message("Order.Item".into());
        let top = FieldType::Message("Item".into());
        let conflict = TypeConflict::classify(&nested, &top);
        assert_eq!(conflict, Some(TypeConflict::Incompatible));
        assert_eq!(conflict.map(|c| c.severity()), Some(Severity::Error));
    }

    #[test]
    fn test_severity_follows_generator_capability() {
        assert_eq!(TypeConflict::IntEnum.severity(), Severity::Info);
        assert_eq!(TypeConflict::Widening.severity(), Severity::Warning);
        assert_eq!(TypeConflict::PrimitiveMessage.severity(), Severity::Error);
        assert!(TypeConflict::Narrowing.is_handled());
        assert!(!TypeConflict::Incompatible.is_handled());
    }
}
