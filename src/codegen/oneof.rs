//! Oneof discriminants
//!
//! Every merged oneof gets a `XCase` enum listing the union of its members
//! plus an `X_NOT_SET` sentinel. Constant names match the native case enum,
//! so per-version classes translate by name.

use indexmap::IndexMap;

use super::names;
use crate::ir::{EnumConstant, Expr, Modifier, TypeDecl, TypeRef};
use crate::model::{MergedMessage, MergedOneof};

/// Oneof groups per member field, first-seen order.
///
/// A field can sit in different oneofs in different versions; it still gets
/// a single `hasX()` predicate.
pub(crate) fn groups_by_member(message: &MergedMessage) -> IndexMap<&str, Vec<&MergedOneof>> {
    let mut members: IndexMap<&str, Vec<&MergedOneof>> = IndexMap::new();
    for group in message.oneofs() {
        for member in group.members() {
            members.entry(member.as_str()).or_default().push(group);
        }
    }
    members
}

/// `getACase() == ACase.X || getBCase() == BCase.X`
pub(crate) fn is_member_set(surface_path: &str, member: &str, groups: &[&MergedOneof]) -> Expr {
    let mut checks = groups.iter().map(|group| {
        Expr::invoke(names::oneof_case_getter(group.name()), vec![])
            .equals(case_constant(&case_type(surface_path, group.name()), member))
    });
    let first = checks.next().unwrap_or_else(|| Expr::bool(false));
    checks.fold(first, Expr::or)
}

pub(crate) fn case_enum(message: &MergedMessage, oneof: &MergedOneof) -> TypeDecl {
    let mut decl = TypeDecl::enumeration(names::oneof_case_enum(oneof.name()))
        .modifiers(&[Modifier::Public])
        .doc(format!("Which member of `{}` is set. Present in versions {}.", oneof.name(), oneof.versions()));

    for member in oneof.members() {
        let mut constant = EnumConstant::new(names::to_constant_case(member), Vec::new());
        if let Some(field) = message.field(member) {
            let versions = field.versions();
            if versions.len() < message.versions().len() {
                constant.doc.push(format!("Member in {}.", versions));
            }
        }
        decl = decl.constant(constant);
    }
    decl.constant(EnumConstant::new(names::oneof_not_set(oneof.name()), Vec::new()))
}

/// `XCase.MEMBER` on the surface type
pub(crate) fn case_constant(case_type: &TypeRef, member: &str) -> Expr {
    Expr::static_field(case_type.clone(), names::to_constant_case(member))
}

pub(crate) fn not_set(case_type: &TypeRef, oneof: &str) -> Expr {
    Expr::static_field(case_type.clone(), names::oneof_not_set(oneof))
}

/// Case enum type, nested in the message's surface type
pub(crate) fn case_type(surface_path: &str, oneof: &str) -> TypeRef {
    TypeRef::named(format!("{}.{}", surface_path, names::oneof_case_enum(oneof)))
}

/// `XCase.valueOf(proto.getXCase().name())`
pub(crate) fn from_native(case_type: &TypeRef, oneof: &str, proto: Expr) -> Expr {
    Expr::static_call(
        case_type.clone(),
        "valueOf",
        vec![proto.call(names::oneof_case_getter(oneof), vec![]).call("name", vec![])],
    )
}
