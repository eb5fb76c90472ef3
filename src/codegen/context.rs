//! Version contexts
//!
//! `VersionContext` is the runtime entry point for callers that only know a
//! version id: it wraps native messages, parses bytes and hands out empty
//! builders without naming any per-version class. Each version gets a
//! singleton `VersionContextV1`-style implementation.

use super::{names, Generator};
use crate::ir::{ConstructorDecl, Expr, FieldDecl, MethodDecl, Modifier, Stmt, TypeDecl, TypeRef};
use crate::model::MessageId;
use crate::version::VersionSet;

pub(crate) const CONTEXT: &str = "VersionContext";

const INSTANCE: &str = "INSTANCE";

fn native_message() -> TypeRef {
    TypeRef::named("com.google.protobuf.Message")
}

fn parse_error() -> TypeRef {
    TypeRef::named("com.google.protobuf.InvalidProtocolBufferException")
}

fn wrap_name(message: &str) -> String {
    format!("wrap{}", names::contract_name(message))
}

fn parse_name(message: &str) -> String {
    format!("parse{}FromBytes", names::contract_name(message))
}

/// `newOrderItemBuilder` for `Order.Item`
fn builder_factory_name(gen: &Generator<'_>, id: MessageId) -> String {
    let joined: String = gen
        .lineage(id)
        .into_iter()
        .map(|m| names::contract_name(gen.schema().message(m).name()))
        .collect();
    format!("new{}Builder", joined)
}

/// A message and every message nested in it, parents first
fn with_descendants(gen: &Generator<'_>, root: MessageId) -> Vec<MessageId> {
    let mut out = vec![root];
    let mut index = 0;
    while index < out.len() {
        out.extend(gen.schema().nested_messages(out[index]));
        index += 1;
    }
    out
}

/// Interface with the static lookup by version id
pub(crate) fn context_interface(gen: &Generator<'_>, units: &[MessageId]) -> TypeDecl {
    let schema = gen.schema();
    let context = gen.context_ref();
    let all_versions = schema.versions().len();

    let mut lookup = Vec::new();
    for version in schema.versions() {
        lookup.push(Stmt::if_then(
            gen.version_constant(version).call("equals", vec![Expr::var("versionId")]),
            vec![Stmt::ret(Expr::static_field(gen.context_impl_ref(version), INSTANCE))],
        ));
    }
    lookup.push(Stmt::throw(Expr::new_instance(
        TypeRef::named("IllegalArgumentException"),
        vec![Expr::string("Unknown protocol version: ").concat(Expr::var("versionId"))],
    )));

    let mut decl = TypeDecl::interface(CONTEXT)
        .in_package(&gen.options().base_package)
        .modifiers(&[Modifier::Public])
        .doc("Entry point for wrapping native messages of a version picked at runtime.")
        .method(
            MethodDecl::new("forVersion", context.clone())
                .modifiers(&[Modifier::Public, Modifier::Static])
                .param("versionId", TypeRef::string())
                .doc("@throws IllegalArgumentException for ids not listed in ProtocolVersions")
                .body(lookup),
        )
        .method(
            MethodDecl::new("getDefault", context)
                .modifiers(&[Modifier::Public, Modifier::Static])
                .returning(Expr::invoke(
                    "forVersion",
                    vec![Expr::static_field(gen.versions_ref(), "DEFAULT")],
                )),
        )
        .method(MethodDecl::new("getVersionId", TypeRef::string()).doc("Protocol version this context produces."));

    let only_in = |versions: &VersionSet, method: MethodDecl, element: &str| {
        if versions.len() == all_versions {
            method
        } else {
            method
                .modifiers(&[Modifier::Default])
                .doc(format!("Available in {}.", versions))
                .body(vec![gen.unsupported(element, Expr::invoke("getVersionId", vec![]))])
        }
    };

    for &id in units {
        let message = schema.message(id);
        let surface = gen.contract_ref(id);
        decl = decl
            .method(only_in(
                message.versions(),
                MethodDecl::new(wrap_name(message.name()), surface.clone())
                    .param("proto", native_message())
                    .doc(format!("Wraps a native {}; null stays null.", message.name())),
                message.name(),
            ))
            .method(only_in(
                message.versions(),
                MethodDecl::new(parse_name(message.name()), surface)
                    .param("bytes", TypeRef::bytes_array())
                    .throws(parse_error()),
                message.name(),
            ));
    }

    if gen.options().emit_builders {
        for &root in units {
            for id in with_descendants(gen, root) {
                let path = schema.message_path(id);
                decl = decl.method(only_in(
                    schema.message(id).versions(),
                    MethodDecl::new(builder_factory_name(gen, id), gen.builder_ref(id)),
                    path.as_str(),
                ));
            }
        }
    }
    decl
}

/// Singleton implementation for one version
pub(crate) fn context_impl(gen: &Generator<'_>, units: &[MessageId], version: &str) -> TypeDecl {
    let schema = gen.schema();
    let self_type = gen.context_impl_ref(version);
    let self_name = gen.options().impl_name(CONTEXT, version);

    let mut decl = TypeDecl::class(&self_name)
        .in_package(gen.options().impl_package(version))
        .modifiers(&[Modifier::Public, Modifier::Final])
        .implements(gen.context_ref())
        .doc(format!("{} for {}.", CONTEXT, version))
        .field(
            FieldDecl::new(INSTANCE, self_type.clone())
                .modifiers(&[Modifier::Public, Modifier::Static, Modifier::Final])
                .init(Expr::new_instance(self_type, vec![])),
        )
        .constructor(ConstructorDecl::new(&[Modifier::Private]))
        .method(
            MethodDecl::new("getVersionId", TypeRef::string())
                .modifiers(&[Modifier::Public])
                .overrides()
                .returning(gen.version_constant(version)),
        );

    for &id in units {
        let message = schema.message(id);
        if !message.is_present_in(version) {
            continue;
        }
        let impl_type = TypeRef::named(gen.impl_path(id, version));
        let surface = gen.contract_ref(id);
        decl = decl
            .method(
                MethodDecl::new(wrap_name(message.name()), surface.clone())
                    .modifiers(&[Modifier::Public])
                    .overrides()
                    .param("proto", native_message())
                    .body(vec![
                        Stmt::if_then(
                            Expr::var("proto").equals(Expr::null()),
                            vec![Stmt::ret(Expr::null())],
                        ),
                        Stmt::ret(Expr::new_instance(
                            impl_type.clone(),
                            vec![Expr::cast(gen.native_ref(id, version), Expr::var("proto"))],
                        )),
                    ]),
            )
            .method(
                MethodDecl::new(parse_name(message.name()), surface)
                    .modifiers(&[Modifier::Public])
                    .overrides()
                    .param("bytes", TypeRef::bytes_array())
                    .throws(parse_error())
                    .returning(Expr::static_call(impl_type, "parseFrom", vec![Expr::var("bytes")])),
            );
    }

    if gen.options().emit_builders {
        for &root in units {
            for id in with_descendants(gen, root) {
                if !schema.message(id).is_present_in(version) {
                    continue;
                }
                decl = decl.method(
                    MethodDecl::new(builder_factory_name(gen, id), gen.builder_ref(id))
                        .modifiers(&[Modifier::Public])
                        .overrides()
                        .returning(Expr::static_call(
                            TypeRef::named(gen.impl_path(id, version)),
                            "newBuilder",
                            vec![],
                        )),
                );
            }
        }
    }
    decl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GeneratorOptions;
    use crate::descriptor::{DescriptorSet, FieldDescriptor, FieldType, MessageDescriptor, ScalarType};
    use crate::merge::build_merged_schema;
    use crate::model::MergedSchema;

    fn schema() -> MergedSchema {
        let id = || FieldDescriptor::new("id", 1, FieldType::Scalar(ScalarType::String));
        let v1 = DescriptorSet::new().message(
            MessageDescriptor::new("Order")
                .field(id())
                .nested_message(MessageDescriptor::new("Item").field(id())),
        );
        let v2 = DescriptorSet::new()
            .message(MessageDescriptor::new("Order").field(id()))
            .message(MessageDescriptor::new("Refund").field(id()));
        build_merged_schema(&["v1", "v2"], &[v1, v2]).unwrap()
    }

    fn units(schema: &MergedSchema) -> Vec<MessageId> {
        schema.top_level_messages().collect()
    }

    #[test]
    fn test_interface_lists_wrappers_and_lookup() {
        let schema = schema();
        let options = GeneratorOptions::default();
        let gen = Generator::new(&schema, &options).unwrap();
        let decl = context_interface(&gen, &units(&schema));

        assert_eq!(decl.qualified_name(), "com.example.model.VersionContext");
        let lookup = decl.find_method("forVersion").unwrap();
        let body = lookup.body.as_ref().unwrap();
        assert_eq!(body.len(), 3);
        assert!(matches!(body.last(), Some(Stmt::Throw { .. })));
        assert!(decl.has_method("getDefault"));

        let wrap = decl.find_method("wrapOrder").unwrap();
        assert!(wrap.is_abstract());
        assert_eq!(wrap.return_type.to_string(), "com.example.model.Order");
        assert!(decl.find_method("parseOrderFromBytes").unwrap().is_abstract());

        // Refund only exists in v2
        let refund = decl.find_method("wrapRefund").unwrap();
        assert!(refund.modifiers.contains(&Modifier::Default));
        assert!(!refund.is_abstract());
        assert!(!decl.has_method("newOrderBuilder"));
    }

    #[test]
    fn test_impl_covers_present_messages() {
        let schema = schema();
        let options = GeneratorOptions::default();
        let gen = Generator::new(&schema, &options).unwrap();

        let v1 = context_impl(&gen, &units(&schema), "v1");
        assert_eq!(v1.qualified_name(), "com.example.model.impl.VersionContextV1");
        assert!(v1.has_method("wrapOrder"));
        assert!(!v1.has_method("wrapRefund"));
        assert_eq!(v1.fields[0].name, "INSTANCE");

        let v2 = context_impl(&gen, &units(&schema), "v2");
        let parse = v2.find_method("parseRefundFromBytes").unwrap();
        assert_eq!(
            parse.body,
            Some(vec![Stmt::ret(Expr::static_call(
                TypeRef::named("com.example.model.impl.RefundV2"),
                "parseFrom",
                vec![Expr::var("bytes")],
            ))])
        );
    }

    #[test]
    fn test_builder_factories_follow_nesting() {
        let schema = schema();
        let options = GeneratorOptions::default().with_builders(true);
        let gen = Generator::new(&schema, &options).unwrap();

        let decl = context_interface(&gen, &units(&schema));
        assert!(decl.find_method("newOrderBuilder").unwrap().is_abstract());
        let item = decl.find_method("newOrderItemBuilder").unwrap();
        assert_eq!(item.return_type.to_string(), "com.example.model.Order.Item.Builder");
        assert!(item.modifiers.contains(&Modifier::Default));

        let v1 = context_impl(&gen, &units(&schema), "v1");
        assert!(v1.has_method("newOrderItemBuilder"));
        let v2 = context_impl(&gen, &units(&schema), "v2");
        assert!(!v2.has_method("newOrderItemBuilder"));
        assert!(v2.has_method("newRefundBuilder"));
    }
}
