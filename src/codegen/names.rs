//! Name Derivation
//!
//! Maps schema names onto target-language identifiers:
//! - accessor names follow the native message API (`order_id` -> `getOrderId`)
//! - enum constants use SCREAMING_CASE
//! - local identifiers avoid reserved words
//!
//! Accessor names must match what the native per-version classes expose,
//! so casing mirrors the schema compiler's own rule rather than a
//! dictionary-driven one.

use std::collections::HashSet;

use once_cell::sync::Lazy;

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
        "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
        "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long", "native",
        "new", "package", "private", "protected", "public", "return", "short", "static", "strictfp",
        "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try", "void",
        "volatile", "while", "true", "false", "null", "var", "record", "yield",
    ]
    .into_iter()
    .collect()
});

/// `order_id` -> `OrderId`, `field1a` -> `Field1A`
///
/// Underscores start a new word; a letter following a digit is capitalized.
pub fn to_pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut capitalize_next = true;
    for c in name.chars() {
        if c == '_' || c == '-' || c == ' ' {
            capitalize_next = true;
        } else if c.is_ascii_digit() {
            result.push(c);
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

/// `order_id` -> `orderId`
pub fn to_camel_case(name: &str) -> String {
    let pascal = to_pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
    }
}

/// `shippingAddress` / `shipping_address` -> `SHIPPING_ADDRESS`
pub fn to_constant_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !result.ends_with('_') && !result.is_empty() {
                result.push('_');
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower {
            result.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        result.push(c.to_ascii_uppercase());
    }
    result
}

/// Local variable or parameter name that is never a reserved word
pub fn local_name(name: &str) -> String {
    let camel = to_camel_case(name);
    if RESERVED.contains(camel.as_str()) {
        format!("{}_", camel)
    } else {
        camel
    }
}

pub fn getter(field: &str) -> String {
    format!("get{}", to_pascal_case(field))
}

/// Accessor for repeated fields on the native API
pub fn list_getter(field: &str) -> String {
    format!("get{}List", to_pascal_case(field))
}

pub fn has(field: &str) -> String {
    format!("has{}", to_pascal_case(field))
}

/// Version-guard predicate for non-universal fields
pub fn supports(field: &str) -> String {
    format!("supports{}", to_pascal_case(field))
}

pub fn setter(field: &str) -> String {
    format!("set{}", to_pascal_case(field))
}

pub fn clearer(field: &str) -> String {
    format!("clear{}", to_pascal_case(field))
}

/// Repeated-field append on the native builder
pub fn adder(field: &str) -> String {
    format!("addAll{}", to_pascal_case(field))
}

/// Raw-number accessor used for enum-typed fields
pub fn value_getter(field: &str) -> String {
    format!("get{}Value", to_pascal_case(field))
}

/// Protected extraction hook on the shared base class
pub fn extractor(field: &str) -> String {
    format!("extract{}", to_pascal_case(field))
}

/// Discriminant enum for a oneof (`payment_method` -> `PaymentMethodCase`)
pub fn oneof_case_enum(oneof: &str) -> String {
    format!("{}Case", to_pascal_case(oneof))
}

pub fn oneof_case_getter(oneof: &str) -> String {
    format!("get{}Case", to_pascal_case(oneof))
}

/// Sentinel constant for "no member set" (`payment_method` -> `PAYMENT_METHOD_NOT_SET`)
pub fn oneof_not_set(oneof: &str) -> String {
    format!("{}_NOT_SET", to_constant_case(oneof))
}

/// Contract interface name for a message
pub fn contract_name(message: &str) -> String {
    to_pascal_case(message)
}

/// Shared base class name for a message
pub fn base_name(message: &str) -> String {
    format!("Abstract{}", to_pascal_case(message))
}

/// Outer class the schema compiler derives from a source file
/// (`order_service.proto` -> `OrderService`)
pub fn outer_class_name(source_file: &str) -> String {
    let file = source_file.rsplit('/').next().unwrap_or(source_file);
    let stem = file.strip_suffix(".proto").unwrap_or(file);
    to_pascal_case(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case_matches_native_accessors() {
        assert_eq!(to_pascal_case("order_id"), "OrderId");
        assert_eq!(to_pascal_case("field1a"), "Field1A");
        assert_eq!(to_pascal_case("Order"), "Order");
        assert_eq!(getter("total_amount"), "getTotalAmount");
        assert_eq!(list_getter("items"), "getItemsList");
        assert_eq!(supports("status"), "supportsStatus");
    }

    #[test]
    fn test_camel_and_constant_case() {
        assert_eq!(to_camel_case("shipping_address"), "shippingAddress");
        assert_eq!(to_constant_case("shipping_address"), "SHIPPING_ADDRESS");
        assert_eq!(to_constant_case("shippingAddress"), "SHIPPING_ADDRESS");
        assert_eq!(oneof_not_set("payment"), "PAYMENT_NOT_SET");
        assert_eq!(oneof_case_enum("payment_method"), "PaymentMethodCase");
    }

    #[test]
    fn test_reserved_words_are_escaped() {
        assert_eq!(local_name("class"), "class_");
        assert_eq!(local_name("default"), "default_");
        assert_eq!(local_name("order_id"), "orderId");
    }

    #[test]
    fn test_outer_class_name() {
        assert_eq!(outer_class_name("order_service.proto"), "OrderService");
        assert_eq!(outer_class_name("v1/common.proto"), "Common");
    }
}
