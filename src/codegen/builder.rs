//! Builders
//!
//! A `Builder` contract nested in each surface type, and one implementation
//! per version wrapping the native builder. Setters convert unified values
//! back to the version's declared types; setting a field the version lacks
//! throws, clearing it is a no-op.

use super::plan::{FieldPlan, JavaScalar, MessagePlan, Resolved, ValueType};
use super::version_impl::native_element;
use super::{names, Generator};
use crate::descriptor::ScalarType;
use crate::ir::{ConstructorDecl, Expr, FieldDecl, MethodDecl, Modifier, Stmt, TypeDecl, TypeRef};
use crate::model::MessageId;

const BUILDER: &str = "Builder";

pub(crate) fn builder_contract(gen: &Generator<'_>, plan: &MessagePlan<'_>) -> TypeDecl {
    let message = gen.schema().message(plan.id);
    let builder = gen.builder_ref(plan.id);

    let mut decl = TypeDecl::interface(BUILDER).doc(format!("Mutable builder for {}.", plan.path));
    for field in &plan.fields {
        let mut setter = MethodDecl::new(names::setter(field.name()), builder.clone())
            .param("value", gen.accessor_type(field));
        if !field.universal {
            setter = setter.doc(format!(
                "@throws VersionNotSupportedException on versions without `{}`",
                field.name()
            ));
        }
        decl = decl
            .method(setter)
            .method(MethodDecl::new(names::clearer(field.name()), builder.clone()));
    }
    for group in message.oneofs() {
        decl = decl.method(
            MethodDecl::new(names::clearer(group.name()), builder.clone())
                .doc(format!("Clears whichever member of `{}` is set.", group.name())),
        );
    }
    decl.method(MethodDecl::new("build", gen.contract_ref(plan.id)))
}

pub(crate) fn builder_impl(gen: &Generator<'_>, plan: &MessagePlan<'_>, id: MessageId, version: &str) -> TypeDecl {
    let message = gen.schema().message(id);
    let native_builder = gen.native_builder_ref(id, version);
    let builder_type = gen.builder_ref(id);
    let this = || Expr::this();
    let target = || Expr::this().field("builder");

    let mut decl = TypeDecl::class(BUILDER)
        .modifiers(&[Modifier::Public, Modifier::Static, Modifier::Final])
        .implements(builder_type.clone())
        .field(FieldDecl::new("builder", native_builder.clone()).modifiers(&[Modifier::Private, Modifier::Final]))
        .constructor(
            ConstructorDecl::new(&[])
                .param("builder", native_builder)
                .body(vec![Stmt::assign(target(), Expr::var("builder"))]),
        );

    for field in &plan.fields {
        let setter = MethodDecl::new(names::setter(field.name()), builder_type.clone())
            .modifiers(&[Modifier::Public])
            .overrides()
            .param("value", gen.accessor_type(field));
        let clearer = MethodDecl::new(names::clearer(field.name()), builder_type.clone())
            .modifiers(&[Modifier::Public])
            .overrides();

        if field.is_present_in(version) {
            decl = decl
                .method(setter.body(set_body(gen, field, version)))
                .method(clearer.body(vec![
                    Stmt::expr(target().call(names::clearer(field.name()), vec![])),
                    Stmt::ret(this()),
                ]));
        } else {
            decl = decl
                .method(setter.body(vec![gen.unsupported(&field.path, gen.version_constant(version))]))
                .method(clearer.returning(this()));
        }
    }

    for group in message.oneofs() {
        let mut body = Vec::new();
        if group.versions().contains(version) {
            body.push(Stmt::expr(target().call(names::clearer(group.name()), vec![])));
        }
        body.push(Stmt::ret(this()));
        decl = decl.method(
            MethodDecl::new(names::clearer(group.name()), builder_type.clone())
                .modifiers(&[Modifier::Public])
                .overrides()
                .body(body),
        );
    }

    decl.method(
        MethodDecl::new("build", gen.contract_ref(id))
            .modifiers(&[Modifier::Public])
            .overrides()
            .returning(Expr::new_instance(
                TypeRef::named(gen.impl_path(id, version)),
                vec![target().call("build", vec![])],
            )),
    )
}

fn set_body(gen: &Generator<'_>, field: &FieldPlan<'_>, version: &str) -> Vec<Stmt> {
    let name = field.name();
    let resolved = &field.native[version];
    let native_enum = matches!(resolved, Resolved::Enum(_));
    let repeated_here = field
        .field
        .snapshot(version)
        .is_some_and(|s| s.cardinality.is_repeated());
    let target = || Expr::this().field("builder");
    let native_setter = if native_enum {
        format!("{}Value", names::setter(name))
    } else {
        names::setter(name)
    };

    if !field.repeated {
        return vec![
            Stmt::expr(target().call(native_setter, vec![convert_write(gen, field, resolved, version, Expr::var("value"))])),
            Stmt::ret(Expr::this()),
        ];
    }

    let element = gen.value_ref(&field.value).boxed();
    let item = Expr::var("item");
    let converted = convert_write(gen, field, resolved, version, item.clone());
    let mut body = vec![Stmt::expr(target().call(names::clearer(name), vec![]))];

    if !repeated_here {
        // last element wins on versions where the field is singular
        body.push(Stmt::for_each(
            element,
            "item",
            Expr::var("value"),
            vec![Stmt::expr(target().call(native_setter, vec![converted]))],
        ));
    } else {
        let adder = if native_enum {
            format!("{}Value", names::adder(name))
        } else {
            names::adder(name)
        };
        if converted == item {
            body.push(Stmt::expr(target().call(adder, vec![Expr::var("value")])));
        } else {
            let native = native_element(gen, resolved, version);
            body.push(Stmt::var(
                TypeRef::list(native.clone()),
                "converted",
                Expr::new_instance(TypeRef::array_list(native), vec![]),
            ));
            body.push(Stmt::for_each(
                element,
                "item",
                Expr::var("value"),
                vec![Stmt::expr(Expr::var("converted").call("add", vec![converted]))],
            ));
            body.push(Stmt::expr(target().call(adder, vec![Expr::var("converted")])));
        }
    }
    body.push(Stmt::ret(Expr::this()));
    body
}

/// Accessor value -> native value
fn convert_write(gen: &Generator<'_>, field: &FieldPlan<'_>, resolved: &Resolved, version: &str, expr: Expr) -> Expr {
    match (&field.value, resolved) {
        (ValueType::Scalar(target), Resolved::Scalar(scalar)) => scalar_write(*target, *scalar, expr),
        (ValueType::Scalar(JavaScalar::Long), Resolved::Enum(_)) => Expr::cast(TypeRef::int(), expr),
        (ValueType::Enum(_), Resolved::Enum(_)) => expr.call("getNumber", vec![]),
        (ValueType::Message(_), Resolved::Message(id)) => {
            Expr::static_call(TypeRef::named(gen.impl_path(*id, version)), "toNative", vec![expr])
        }
        (ValueType::WellKnown(known), Resolved::WellKnown(_)) if gen.options().convert_well_known => {
            known.write(&gen.conversions_ref(), expr)
        }
        _ => expr,
    }
}

fn scalar_write(target: JavaScalar, scalar: ScalarType, expr: Expr) -> Expr {
    let native = JavaScalar::of(scalar);
    if native == target {
        return expr;
    }
    match native {
        JavaScalar::Int => Expr::cast(TypeRef::int(), expr),
        JavaScalar::Float => Expr::cast(TypeRef::float(), expr),
        JavaScalar::String => expr.call("toStringUtf8", vec![]),
        _ => expr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GeneratorOptions;
    use crate::descriptor::{DescriptorSet, EnumDescriptor, FieldDescriptor, FieldType, MessageDescriptor};
    use crate::merge::build_merged_schema;
    use crate::model::MergedSchema;

    fn schema() -> MergedSchema {
        let status = EnumDescriptor::new("Status").value("UNKNOWN", 0).value("PAID", 1);
        let v1 = DescriptorSet::new()
            .message(
                MessageDescriptor::new("Order")
                    .field(FieldDescriptor::new("qty", 1, FieldType::Scalar(ScalarType::Int32)))
                    .field(FieldDescriptor::new("status", 2, FieldType::Enum("Status".into())))
                    .field(FieldDescriptor::new("memo", 3, FieldType::Scalar(ScalarType::String))),
            )
            .enumeration(status.clone());
        let v2 = DescriptorSet::new()
            .message(
                MessageDescriptor::new("Order")
                    .field(FieldDescriptor::new("qty", 1, FieldType::Scalar(ScalarType::Int64)))
                    .field(FieldDescriptor::new("status", 2, FieldType::Enum("Status".into())))
                    .field(FieldDescriptor::new("memo", 3, FieldType::Scalar(ScalarType::Bytes)))
                    .field(FieldDescriptor::new("tags", 4, FieldType::Scalar(ScalarType::String)).repeated()),
            )
            .enumeration(status);
        build_merged_schema(&["v1", "v2"], &[v1, v2]).unwrap()
    }

    fn builder_for(schema: &MergedSchema, version: &str) -> TypeDecl {
        let options = GeneratorOptions::default().with_builders(true);
        let gen = Generator::new(schema, &options).unwrap();
        let id = schema.find_message("Order").unwrap();
        let plans = gen.plan_unit(id).unwrap();
        builder_impl(&gen, plans.get(id), id, version)
    }

    fn first_stmt(decl: &TypeDecl, method: &str) -> Stmt {
        decl.find_method(method).unwrap().body.as_ref().unwrap()[0].clone()
    }

    #[test]
    fn test_narrowing_and_enum_writes() {
        let schema = schema();
        let v1 = builder_for(&schema, "v1");
        let builder = || Expr::this().field("builder");

        assert_eq!(
            first_stmt(&v1, "setQty"),
            Stmt::expr(builder().call("setQty", vec![Expr::cast(TypeRef::int(), Expr::var("value"))]))
        );
        assert_eq!(
            first_stmt(&v1, "setStatus"),
            Stmt::expr(builder().call("setStatusValue", vec![Expr::var("value").call("getNumber", vec![])]))
        );
        assert_eq!(
            first_stmt(&v1, "setMemo"),
            Stmt::expr(builder().call("setMemo", vec![Expr::var("value").call("toStringUtf8", vec![])]))
        );
    }

    #[test]
    fn test_missing_field_setter_throws_and_clear_is_noop() {
        let schema = schema();
        let v1 = builder_for(&schema, "v1");
        assert!(matches!(first_stmt(&v1, "setTags"), Stmt::Throw { .. }));
        assert_eq!(
            v1.find_method("clearTags").unwrap().body,
            Some(vec![Stmt::ret(Expr::this())])
        );
    }

    #[test]
    fn test_repeated_setter_replaces_contents() {
        let schema = schema();
        let v2 = builder_for(&schema, "v2");
        let body = v2.find_method("setTags").unwrap().body.clone().unwrap();
        let builder = || Expr::this().field("builder");
        assert_eq!(
            body,
            vec![
                Stmt::expr(builder().call("clearTags", vec![])),
                Stmt::expr(builder().call("addAllTags", vec![Expr::var("value")])),
                Stmt::ret(Expr::this()),
            ]
        );
    }

    #[test]
    fn test_build_wraps_native_result() {
        let schema = schema();
        let v2 = builder_for(&schema, "v2");
        assert_eq!(v2.implements[0].to_string(), "com.example.model.Order.Builder");
        assert!(v2.has_method("build"));
    }
}
