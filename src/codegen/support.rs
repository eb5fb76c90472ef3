//! Shared support types and unified enums

use super::Generator;
use crate::ir::{
    ConstructorDecl, EnumConstant, Expr, FieldDecl, MethodDecl, Modifier, Stmt, TypeDecl, TypeRef,
};
use crate::model::EnumId;
use crate::version::constant_name;

pub(crate) const EXCEPTION: &str = "VersionNotSupportedException";
pub(crate) const VERSIONS: &str = "ProtocolVersions";

/// Exception type and version constants, always emitted first
pub(crate) fn support_types(gen: &Generator<'_>) -> Vec<TypeDecl> {
    vec![exception(gen), versions(gen)]
}

fn exception(gen: &Generator<'_>) -> TypeDecl {
    let string = TypeRef::string();
    let this = || Expr::this();

    TypeDecl::class(EXCEPTION)
        .in_package(&gen.options().base_package)
        .modifiers(&[Modifier::Public])
        .extends(TypeRef::named("RuntimeException"))
        .doc("Thrown when an accessor is used on a version that does not declare the element.")
        .field(FieldDecl::new("element", string.clone()).modifiers(&[Modifier::Private, Modifier::Final]))
        .field(FieldDecl::new("version", string.clone()).modifiers(&[Modifier::Private, Modifier::Final]))
        .constructor(
            ConstructorDecl::new(&[Modifier::Public])
                .param("element", string.clone())
                .param("version", string.clone())
                .body(vec![
                    Stmt::expr(Expr::invoke(
                        "super",
                        vec![Expr::var("element")
                            .concat(Expr::string(" is not available in protocol version "))
                            .concat(Expr::var("version"))],
                    )),
                    Stmt::assign(this().field("element"), Expr::var("element")),
                    Stmt::assign(this().field("version"), Expr::var("version")),
                ]),
        )
        .method(
            MethodDecl::new("getElement", string.clone())
                .modifiers(&[Modifier::Public])
                .returning(this().field("element")),
        )
        .method(
            MethodDecl::new("getVersion", string)
                .modifiers(&[Modifier::Public])
                .returning(this().field("version")),
        )
}

fn versions(gen: &Generator<'_>) -> TypeDecl {
    let constant = &[Modifier::Public, Modifier::Static, Modifier::Final];
    let mut decl = TypeDecl::class(VERSIONS)
        .in_package(&gen.options().base_package)
        .modifiers(&[Modifier::Public, Modifier::Final])
        .doc("Protocol version identifiers.")
        .constructor(ConstructorDecl::new(&[Modifier::Private]));

    for version in gen.schema().versions() {
        decl = decl.field(
            FieldDecl::new(constant_name(version), TypeRef::string())
                .modifiers(constant)
                .init(Expr::string(version.as_str())),
        );
    }
    decl.field(
        FieldDecl::new("DEFAULT", TypeRef::string())
            .modifiers(constant)
            .init(Expr::var(constant_name(gen.default_version())))
            .doc("Version used when a caller does not pick one."),
    )
}

/// One enum covering the values of every version.
///
/// Each constant carries the number it was first seen with; `fromNumber`
/// maps wire numbers back and returns null for unknown ones.
pub(crate) fn unified_enum(gen: &Generator<'_>, id: EnumId) -> TypeDecl {
    let enumeration = gen.schema().enumeration(id);
    let name = enumeration.name().to_string();
    let self_type = TypeRef::named(name.clone());
    let all_versions = enumeration.versions();

    let mut decl = TypeDecl::enumeration(&name)
        .modifiers(&[Modifier::Public])
        .doc(format!("{} across versions {}.", gen.schema().enum_path(id), all_versions));

    for value in enumeration.values() {
        let mut constant = EnumConstant::new(value.name(), vec![Expr::int(value.first_number() as i64)]);
        let present = value.versions();
        if present.len() < all_versions.len() {
            constant.doc.push(format!("Only in {}.", present));
        }
        if value.has_number_conflict() {
            let numbers: Vec<String> = value.numbers().map(|(v, n)| format!("{} in {}", n, v)).collect();
            constant.doc.push(format!("Numbered {}.", numbers.join(", ")));
        }
        decl = decl.constant(constant);
    }

    let number = || Expr::var("number");
    decl.field(FieldDecl::new("number", TypeRef::int()).modifiers(&[Modifier::Private, Modifier::Final]))
        .constructor(
            ConstructorDecl::new(&[])
                .param("number", TypeRef::int())
                .body(vec![Stmt::assign(Expr::this().field("number"), number())]),
        )
        .method(
            MethodDecl::new("getNumber", TypeRef::int())
                .modifiers(&[Modifier::Public])
                .returning(Expr::this().field("number")),
        )
        .method(
            MethodDecl::new("fromNumber", self_type.clone())
                .modifiers(&[Modifier::Public, Modifier::Static])
                .param("number", TypeRef::int())
                .body(vec![
                    Stmt::for_each(
                        self_type.clone(),
                        "value",
                        Expr::invoke("values", vec![]),
                        vec![Stmt::if_then(
                            Expr::var("value").field("number").equals(number()),
                            vec![Stmt::ret(Expr::var("value"))],
                        )],
                    ),
                    Stmt::ret(Expr::null()),
                ]),
        )
        .method(
            MethodDecl::new("fromName", self_type.clone())
                .modifiers(&[Modifier::Public, Modifier::Static])
                .param("name", TypeRef::string())
                .body(vec![
                    Stmt::for_each(
                        self_type,
                        "value",
                        Expr::invoke("values", vec![]),
                        vec![Stmt::if_then(
                            Expr::var("value").call("name", vec![]).call("equals", vec![Expr::var("name")]),
                            vec![Stmt::ret(Expr::var("value"))],
                        )],
                    ),
                    Stmt::ret(Expr::null()),
                ]),
        )
}
