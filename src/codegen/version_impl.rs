//! Per-version implementation classes
//!
//! `OrderV1 extends AbstractOrder<NativeOrder>` overrides the extraction
//! hooks for the fields its version declares and converts native values
//! into the unified accessor types.

use super::plan::{FieldPlan, JavaScalar, Resolved, ValueType};
use super::{builder, names, oneof, Generator, UnitPlans};
use crate::descriptor::ScalarType;
use crate::ir::{ConstructorDecl, Expr, MethodDecl, Modifier, Stmt, TypeDecl, TypeRef};
use crate::model::MessageId;

pub(crate) fn impl_class(gen: &Generator<'_>, plans: &UnitPlans<'_>, id: MessageId, version: &str) -> TypeDecl {
    let plan = plans.get(id);
    let message = gen.schema().message(id);
    let native = gen.native_ref(id, version);
    let self_name = gen.options().impl_name(&names::contract_name(message.name()), version);
    let self_type = TypeRef::named(gen.impl_path(id, version));

    let mut decl = TypeDecl::class(&self_name)
        .modifiers(if message.is_nested() {
            &[Modifier::Public, Modifier::Static, Modifier::Final][..]
        } else {
            &[Modifier::Public, Modifier::Final][..]
        })
        .extends(TypeRef::generic(gen.base_path(id), vec![native.clone()]))
        .doc(format!("{} backed by the {} native message.", plan.path, version))
        .constructor(
            ConstructorDecl::new(&[Modifier::Public])
                .param("proto", native.clone())
                .body(vec![Stmt::expr(Expr::invoke("super", vec![Expr::var("proto")]))]),
        )
        .method(
            MethodDecl::new("parseFrom", self_type.clone())
                .modifiers(&[Modifier::Public, Modifier::Static])
                .param("bytes", TypeRef::bytes_array())
                .throws(TypeRef::named("com.google.protobuf.InvalidProtocolBufferException"))
                .returning(Expr::new_instance(
                    self_type.clone(),
                    vec![Expr::static_call(native.clone(), "parseFrom", vec![Expr::var("bytes")])],
                )),
        )
        .method(
            MethodDecl::new("getVersionId", TypeRef::string())
                .modifiers(&[Modifier::Public])
                .overrides()
                .returning(gen.version_constant(version)),
        );

    for field in plan.fields.iter().filter(|f| f.is_present_in(version)) {
        for method in field_overrides(gen, field, version, &native) {
            decl = decl.method(method);
        }
    }

    let surface = gen.surface_path(id);
    for group in message.oneofs() {
        let case_type = oneof::case_type(&surface, group.name());
        let value = if group.versions().contains(version) {
            oneof::from_native(&case_type, group.name(), Expr::var("proto"))
        } else {
            oneof::not_set(&case_type, group.name())
        };
        decl = decl.method(
            MethodDecl::new(format!("extract{}Case", names::to_pascal_case(group.name())), case_type)
                .modifiers(&[Modifier::Protected])
                .overrides()
                .param("proto", native.clone())
                .returning(value),
        );
    }

    if gen.options().emit_builders {
        let builder_type = gen.builder_ref(id);
        let local_builder = TypeRef::named("Builder");
        decl = decl
            .method(
                MethodDecl::new("toBuilder", builder_type.clone())
                    .modifiers(&[Modifier::Public])
                    .overrides()
                    .returning(Expr::new_instance(
                        local_builder.clone(),
                        vec![Expr::this().field("proto").call("toBuilder", vec![])],
                    )),
            )
            .method(
                MethodDecl::new("newBuilder", builder_type)
                    .modifiers(&[Modifier::Public, Modifier::Static])
                    .returning(Expr::new_instance(
                        local_builder,
                        vec![Expr::static_call(native.clone(), "newBuilder", vec![])],
                    )),
            )
            .method(to_native(gen, id, version, &self_type, &native))
            .nested_type(builder::builder_impl(gen, plan, id, version));
    }

    for child in gen.schema().nested_messages(id) {
        if gen.schema().message(child).is_present_in(version) {
            decl = decl.nested_type(impl_class(gen, plans, child, version));
        }
    }
    decl
}

/// Unwraps a contract value of this version back to its native message
fn to_native(gen: &Generator<'_>, id: MessageId, version: &str, self_type: &TypeRef, native: &TypeRef) -> MethodDecl {
    let value = || Expr::var("value");
    MethodDecl::new("toNative", native.clone())
        .modifiers(&[Modifier::Public, Modifier::Static])
        .param("value", gen.contract_ref(id))
        .body(vec![
            Stmt::if_then(
                value().instance_of(self_type.clone()),
                vec![Stmt::ret(Expr::cast(self_type.clone(), value()).call("getTypedProto", vec![]))],
            ),
            Stmt::throw(Expr::new_instance(
                TypeRef::named("IllegalArgumentException"),
                vec![Expr::string(format!("expected a {} value, got version ", version))
                    .concat(value().call("getVersionId", vec![]))],
            )),
        ])
}

fn field_overrides(gen: &Generator<'_>, field: &FieldPlan<'_>, version: &str, native: &TypeRef) -> Vec<MethodDecl> {
    let name = field.name();
    let mut methods = Vec::new();

    if !field.universal {
        methods.push(
            MethodDecl::new(names::supports(name), TypeRef::boolean())
                .modifiers(&[Modifier::Public])
                .overrides()
                .returning(Expr::bool(true)),
        );
    }

    methods.push(
        MethodDecl::new(names::extractor(name), gen.extract_type(field))
            .modifiers(&[Modifier::Protected])
            .overrides()
            .param("proto", native.clone())
            .body(read_body(gen, field, version)),
    );

    if field.has_presence() {
        methods.push(
            MethodDecl::new(format!("extractHas{}", names::to_pascal_case(name)), TypeRef::boolean())
                .modifiers(&[Modifier::Protected])
                .overrides()
                .param("proto", native.clone())
                .returning(Expr::var("proto").call(names::has(name), vec![])),
        );
    }
    methods
}

fn collections() -> TypeRef {
    TypeRef::named("java.util.Collections")
}

/// Body of `extractX(proto)` for one version
fn read_body(gen: &Generator<'_>, field: &FieldPlan<'_>, version: &str) -> Vec<Stmt> {
    let name = field.name();
    let resolved = &field.native[version];
    let native_enum = matches!(resolved, Resolved::Enum(_));
    let repeated_here = field
        .field
        .snapshot(version)
        .is_some_and(|s| s.cardinality.is_repeated());
    let proto = Expr::var("proto");

    if repeated_here {
        let getter = if native_enum {
            format!("{}ValueList", names::getter(name))
        } else {
            names::list_getter(name)
        };
        let list = proto.call(getter, vec![]);
        let element = Expr::var("item");
        let converted = convert_read(gen, field, resolved, version, element.clone());
        if converted == element {
            return vec![Stmt::ret(list)];
        }
        let element = gen.extract_type(field);
        return vec![
            Stmt::var(element.clone(), "result", Expr::new_instance(array_list_of(&element), vec![])),
            Stmt::for_each(
                native_element(gen, resolved, version),
                "item",
                list,
                vec![Stmt::expr(Expr::var("result").call("add", vec![converted]))],
            ),
            Stmt::ret(Expr::var("result")),
        ];
    }

    let getter = if native_enum {
        names::value_getter(name)
    } else {
        names::getter(name)
    };
    let value = convert_read(gen, field, resolved, version, proto.clone().call(getter, vec![]));
    if !field.repeated {
        return vec![Stmt::ret(value)];
    }

    let single = Stmt::ret(Expr::static_call(collections(), "singletonList", vec![value]));
    if matches!(resolved, Resolved::Message(_) | Resolved::WellKnown(_)) {
        vec![
            Stmt::if_then(
                Expr::not(proto.call(names::has(name), vec![])),
                vec![Stmt::ret(Expr::static_call(collections(), "emptyList", vec![]))],
            ),
            single,
        ]
    } else {
        vec![single]
    }
}

/// `java.util.ArrayList<E>` for a `java.util.List<E>`
fn array_list_of(list: &TypeRef) -> TypeRef {
    match list {
        TypeRef::Named { args, .. } => TypeRef::generic("java.util.ArrayList", args.clone()),
        other => other.clone(),
    }
}

/// Element type the native API hands out for a field
pub(crate) fn native_element(gen: &Generator<'_>, resolved: &Resolved, version: &str) -> TypeRef {
    match resolved {
        Resolved::Scalar(scalar) => gen.value_ref(&ValueType::Scalar(JavaScalar::of(*scalar))).boxed(),
        Resolved::Enum(_) => TypeRef::named("Integer"),
        Resolved::Message(id) => gen.native_ref(*id, version),
        Resolved::WellKnown(known) => known.native_type(),
    }
}

/// Native value -> accessor value
fn convert_read(gen: &Generator<'_>, field: &FieldPlan<'_>, resolved: &Resolved, version: &str, expr: Expr) -> Expr {
    match (&field.value, resolved) {
        (ValueType::Scalar(target), Resolved::Scalar(scalar)) => scalar_read(*target, *scalar, expr),
        (ValueType::Scalar(JavaScalar::Long), Resolved::Enum(_)) => Expr::cast(TypeRef::long(), expr),
        (ValueType::Message(_), Resolved::Message(id)) => {
            Expr::new_instance(TypeRef::named(gen.impl_path(*id, version)), vec![expr])
        }
        (ValueType::WellKnown(known), Resolved::WellKnown(_)) if gen.options().convert_well_known => {
            known.read(&gen.conversions_ref(), expr)
        }
        _ => expr,
    }
}

fn scalar_read(target: JavaScalar, scalar: ScalarType, expr: Expr) -> Expr {
    if JavaScalar::of(scalar) == target {
        return expr;
    }
    match target {
        JavaScalar::Long if scalar.is_unsigned() => {
            Expr::static_call(TypeRef::named("Integer"), "toUnsignedLong", vec![expr])
        }
        JavaScalar::Long => Expr::cast(TypeRef::long(), expr),
        JavaScalar::Double => Expr::cast(TypeRef::double(), expr),
        JavaScalar::Bytes => Expr::static_call(TypeRef::byte_string(), "copyFromUtf8", vec![expr]),
        _ => expr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GeneratorOptions;
    use crate::descriptor::{DescriptorSet, FieldDescriptor, FieldType, MessageDescriptor};
    use crate::merge::build_merged_schema;
    use crate::model::MergedSchema;

    fn scalar(s: ScalarType) -> FieldType {
        FieldType::Scalar(s)
    }

    fn schema() -> MergedSchema {
        let v1 = DescriptorSet::new().message(
            MessageDescriptor::new("Order")
                .from_file("order_service.proto")
                .field(FieldDescriptor::new("qty", 1, scalar(ScalarType::Uint32)))
                .field(FieldDescriptor::new("label", 2, scalar(ScalarType::String)))
                .field(FieldDescriptor::new("ratio", 3, scalar(ScalarType::Float)))
                .oneof("payment")
                .field(FieldDescriptor::new("card", 4, scalar(ScalarType::String)).in_oneof("payment"))
                .nested_message(MessageDescriptor::new("Item").field(FieldDescriptor::new("sku", 1, scalar(ScalarType::String)))),
        );
        let v2 = DescriptorSet::new().message(
            MessageDescriptor::new("Order")
                .from_file("order_service.proto")
                .field(FieldDescriptor::new("qty", 1, scalar(ScalarType::Int64)))
                .field(FieldDescriptor::new("label", 2, scalar(ScalarType::String)).repeated())
                .field(FieldDescriptor::new("ratio", 3, scalar(ScalarType::Double)))
                .field(FieldDescriptor::new("items", 5, FieldType::Message("Order.Item".into())).repeated())
                .nested_message(MessageDescriptor::new("Item").field(FieldDescriptor::new("sku", 1, scalar(ScalarType::String)))),
        );
        build_merged_schema(&["v1", "v2"], &[v1, v2]).unwrap()
    }

    fn order_impl(schema: &MergedSchema, options: &GeneratorOptions, version: &str) -> TypeDecl {
        let gen = Generator::new(schema, options).unwrap();
        let id = schema.find_message("Order").unwrap();
        let plans = gen.plan_unit(id).unwrap();
        impl_class(&gen, &plans, id, version)
    }

    fn returned(method: &MethodDecl) -> &Expr {
        match method.body.as_deref() {
            Some([Stmt::Return { value: Some(value) }]) => value,
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_class_shape() {
        let schema = schema();
        let decl = order_impl(&schema, &GeneratorOptions::default(), "v1");

        assert_eq!(decl.name, "OrderV1");
        assert_eq!(
            decl.extends[0].to_string(),
            "com.example.model.impl.AbstractOrder<com.example.proto.v1.OrderService.Order>"
        );
        assert!(decl.has_method("parseFrom"));
        assert_eq!(
            returned(decl.find_method("getVersionId").unwrap()),
            &Expr::static_field(TypeRef::named("com.example.model.ProtocolVersions"), "V1")
        );
        assert_eq!(decl.find_nested("ItemV1").map(|n| n.name.as_str()), Some("ItemV1"));
    }

    #[test]
    fn test_unsigned_widening_read() {
        let schema = schema();
        let decl = order_impl(&schema, &GeneratorOptions::default(), "v1");
        let expected = Expr::static_call(
            TypeRef::named("Integer"),
            "toUnsignedLong",
            vec![Expr::var("proto").call("getQty", vec![])],
        );
        assert_eq!(returned(decl.find_method("extractQty").unwrap()), &expected);
        assert_eq!(
            returned(decl.find_method("extractRatio").unwrap()),
            &Expr::cast(TypeRef::double(), Expr::var("proto").call("getRatio", vec![]))
        );
    }

    #[test]
    fn test_singular_version_of_repeated_field() {
        let schema = schema();
        let v1 = order_impl(&schema, &GeneratorOptions::default(), "v1");
        let expected = Expr::static_call(
            TypeRef::named("java.util.Collections"),
            "singletonList",
            vec![Expr::var("proto").call("getLabel", vec![])],
        );
        assert_eq!(returned(v1.find_method("extractLabel").unwrap()), &expected);

        let v2 = order_impl(&schema, &GeneratorOptions::default(), "v2");
        assert_eq!(
            returned(v2.find_method("extractLabel").unwrap()),
            &Expr::var("proto").call("getLabelList", vec![])
        );
    }

    #[test]
    fn test_version_specific_overrides() {
        let schema = schema();
        let v1 = order_impl(&schema, &GeneratorOptions::default(), "v1");
        assert!(!v1.has_method("extractItems"));
        assert!(!v1.has_method("supportsItems"));
        assert!(v1.has_method("supportsCard"));

        let v2 = order_impl(&schema, &GeneratorOptions::default(), "v2");
        assert_eq!(returned(v2.find_method("supportsItems").unwrap()), &Expr::bool(true));
        let items = v2.find_method("extractItems").unwrap();
        assert!(matches!(items.body.as_deref(), Some([Stmt::VarDecl { .. }, Stmt::ForEach { .. }, Stmt::Return { .. }])));
    }

    #[test]
    fn test_oneof_case_translation() {
        let schema = schema();
        let case = TypeRef::named("com.example.model.Order.PaymentCase");
        let v1 = order_impl(&schema, &GeneratorOptions::default(), "v1");
        assert_eq!(
            returned(v1.find_method("extractPaymentCase").unwrap()),
            &oneof::from_native(&case, "payment", Expr::var("proto"))
        );
        let v2 = order_impl(&schema, &GeneratorOptions::default(), "v2");
        assert_eq!(
            returned(v2.find_method("extractPaymentCase").unwrap()),
            &Expr::static_field(case, "PAYMENT_NOT_SET")
        );
    }

    #[test]
    fn test_builders_add_factory_methods() {
        let schema = schema();
        let decl = order_impl(&schema, &GeneratorOptions::default().with_builders(true), "v2");
        assert!(decl.has_method("toBuilder"));
        assert!(decl.has_method("newBuilder"));
        assert!(decl.has_method("toNative"));
        assert!(decl.find_nested("Builder").is_some());
    }
}
