//! Contract interfaces
//!
//! The version-agnostic surface callers program against. Universal fields
//! get plain getters; version-specific fields get a `supportsX()` guard and
//! a getter documented to fail fast on versions that lack the field.

use super::plan::{FieldPlan, MessagePlan};
use super::{builder, names, oneof, Generator, UnitPlans};
use crate::ir::{MethodDecl, Modifier, TypeDecl, TypeRef};
use crate::model::MessageId;

pub(crate) fn contract(gen: &Generator<'_>, plans: &UnitPlans<'_>, id: MessageId) -> TypeDecl {
    let plan = plans.get(id);
    let message = gen.schema().message(id);

    let mut decl = TypeDecl::interface(names::contract_name(message.name()));
    decl.doc = type_doc(gen, plan);
    decl.doc.push(format!("Implemented by {} subclasses.", names::base_name(message.name())));
    if !message.is_nested() {
        decl = decl.modifiers(&[Modifier::Public]);
    }

    for method in surface_methods(gen, plan) {
        decl = decl.method(method);
    }
    for nested in surface_types(gen, plans, id) {
        decl = decl.nested_type(nested);
    }
    for child in gen.schema().nested_messages(id) {
        decl = decl.nested_type(contract(gen, plans, child));
    }
    decl
}

/// Type-level documentation shared by the contract and a contract-less base
pub(crate) fn type_doc(gen: &Generator<'_>, plan: &MessagePlan<'_>) -> crate::ir::Doc {
    let message = gen.schema().message(plan.id);
    let mut doc = crate::ir::Doc::line(format!("Version-agnostic view of {}.", plan.path));
    doc.push(format!("Available in versions {}.", message.versions()));
    for skipped in &plan.unsupported {
        doc.push(format!(
            "Field `{}` has no unified accessor: {}.",
            skipped.field, skipped.reason
        ));
    }
    doc
}

/// Abstract accessor signatures of the surface
pub(crate) fn surface_methods(gen: &Generator<'_>, plan: &MessagePlan<'_>) -> Vec<MethodDecl> {
    let message = gen.schema().message(plan.id);
    let surface = gen.surface_path(plan.id);
    let mut methods = Vec::new();

    for field in &plan.fields {
        methods.extend(field_methods(gen, field));
    }

    for group in message.oneofs() {
        let case_type = oneof::case_type(&surface, group.name());
        methods.push(
            MethodDecl::new(names::oneof_case_getter(group.name()), case_type)
                .doc(format!("Set member of `{}`, or {} on versions without it.", group.name(), names::oneof_not_set(group.name()))),
        );
    }
    for member in oneof::groups_by_member(message).keys() {
        methods.push(MethodDecl::new(names::has(member), TypeRef::boolean()));
    }

    methods.push(MethodDecl::new("getVersionId", TypeRef::string()).doc("Protocol version of the wrapped message."));
    methods.push(MethodDecl::new("toBytes", TypeRef::bytes_array()));
    if gen.options().emit_builders {
        methods.push(MethodDecl::new("toBuilder", gen.builder_ref(plan.id)));
    }
    methods
}

fn field_methods(gen: &Generator<'_>, field: &FieldPlan<'_>) -> Vec<MethodDecl> {
    let name = field.name();
    let mut methods = Vec::new();

    if !field.universal {
        methods.push(
            MethodDecl::new(names::supports(name), TypeRef::boolean())
                .doc(format!("Whether the wrapped version declares `{}`.", name)),
        );
    }

    let mut getter = MethodDecl::new(names::getter(name), gen.accessor_type(field));
    if let Some(conflict) = field.conflict {
        let types: Vec<String> = field.field.distinct_types().iter().map(|t| t.to_string()).collect();
        getter = getter.doc(format!("Declared as {} across versions ({}).", types.join(" / "), conflict.note()));
    }
    if !field.universal {
        getter = getter
            .doc(format!("Declared in {}.", field.field.versions()))
            .doc(format!(
                "@throws VersionNotSupportedException if {}() is false",
                names::supports(name)
            ));
    }
    methods.push(getter);

    if field.has_presence() {
        methods.push(MethodDecl::new(names::has(name), TypeRef::boolean()));
    }
    if let Some(enum_id) = field.enum_helper {
        methods.push(
            MethodDecl::new(format!("{}Enum", names::getter(name)), gen.enum_ref(enum_id))
                .doc("Enum view of the numeric value; null for numbers the enum does not define."),
        );
    }
    methods
}

/// Oneof case enums, nested enums and the builder contract
pub(crate) fn surface_types(gen: &Generator<'_>, plans: &UnitPlans<'_>, id: MessageId) -> Vec<TypeDecl> {
    let schema = gen.schema();
    let message = schema.message(id);
    let mut types = Vec::new();

    for group in message.oneofs() {
        types.push(oneof::case_enum(message, group));
    }
    for enum_id in schema.nested_enums(id) {
        if schema.equivalent_top_level(&schema.enum_path(enum_id)).is_some() {
            continue;
        }
        types.push(super::support::unified_enum(gen, enum_id));
    }
    if gen.options().emit_builders {
        types.push(builder::builder_contract(gen, plans.get(id)));
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GeneratorOptions;
    use crate::descriptor::{DescriptorSet, EnumDescriptor, FieldDescriptor, FieldType, MessageDescriptor, ScalarType};
    use crate::merge::build_merged_schema;
    use crate::model::MergedSchema;

    fn schema() -> MergedSchema {
        let status = EnumDescriptor::new("Status").value("UNKNOWN", 0).value("PAID", 1);
        let v1 = DescriptorSet::new()
            .message(
                MessageDescriptor::new("Order")
                    .field(FieldDescriptor::new("id", 1, FieldType::Scalar(ScalarType::String)))
                    .field(FieldDescriptor::new("status", 2, FieldType::Enum("Order.Status".into())))
                    .nested_enum(status.clone()),
            )
            .enumeration(status.clone());
        let v2 = DescriptorSet::new()
            .message(
                MessageDescriptor::new("Order")
                    .field(FieldDescriptor::new("id", 1, FieldType::Scalar(ScalarType::String)))
                    .field(FieldDescriptor::new("status", 2, FieldType::Enum("Status".into())))
                    .field(FieldDescriptor::new("note", 3, FieldType::Scalar(ScalarType::String)))
                    .field(FieldDescriptor::new("customer", 4, FieldType::Message("Customer".into())))
                    .oneof("payment")
                    .field(FieldDescriptor::new("card", 5, FieldType::Scalar(ScalarType::String)).in_oneof("payment")),
            )
            .message(MessageDescriptor::new("Customer").field(FieldDescriptor::new("name", 1, FieldType::Scalar(ScalarType::String))))
            .enumeration(status);
        build_merged_schema(&["v1", "v2"], &[v1, v2]).unwrap()
    }

    fn order_contract(schema: &MergedSchema, options: &GeneratorOptions) -> TypeDecl {
        let gen = Generator::new(schema, options).unwrap();
        let id = schema.find_message("Order").unwrap();
        let plans = gen.plan_unit(id).unwrap();
        contract(&gen, &plans, id)
    }

    #[test]
    fn test_guarded_and_universal_accessors() {
        let schema = schema();
        let decl = order_contract(&schema, &GeneratorOptions::default());

        assert!(decl.has_method("getId"));
        assert!(!decl.has_method("supportsId"));
        assert!(decl.has_method("supportsNote"));
        let note = decl.find_method("getNote").unwrap();
        assert!(note.doc.lines().iter().any(|l| l.contains("@throws VersionNotSupportedException")));
        assert!(decl.has_method("hasCustomer"));
        assert!(!decl.has_method("hasNote"));
        assert!(decl.has_method("getVersionId"));
        assert!(decl.has_method("toBytes"));
        assert!(!decl.has_method("toBuilder"));
    }

    #[test]
    fn test_equivalent_nested_enum_uses_top_level_type() {
        let schema = schema();
        let decl = order_contract(&schema, &GeneratorOptions::default());

        let status = decl.find_method("getStatus").unwrap();
        assert_eq!(status.return_type.to_string(), "com.example.model.Status");
        assert!(decl.find_nested("Status").is_none());
    }

    #[test]
    fn test_oneof_surface() {
        let schema = schema();
        let decl = order_contract(&schema, &GeneratorOptions::default());

        let case = decl.find_method("getPaymentCase").unwrap();
        assert_eq!(case.return_type.to_string(), "com.example.model.Order.PaymentCase");
        assert!(decl.has_method("hasCard"));
        assert!(decl.find_nested("PaymentCase").is_some());
    }

    #[test]
    fn test_member_moved_between_oneofs_has_one_predicate() {
        let card = || FieldDescriptor::new("card", 1, FieldType::Scalar(ScalarType::String));
        let schema = build_merged_schema(
            &["v1", "v2"],
            &[
                DescriptorSet::new().message(MessageDescriptor::new("Order").oneof("a").field(card().in_oneof("a"))),
                DescriptorSet::new().message(MessageDescriptor::new("Order").oneof("b").field(card().in_oneof("b"))),
            ],
        )
        .unwrap();

        let decl = order_contract(&schema, &GeneratorOptions::default());
        assert_eq!(decl.methods.iter().filter(|m| m.name == "hasCard").count(), 1);
        assert!(decl.has_method("getACase"));
        assert!(decl.has_method("getBCase"));

        let options = GeneratorOptions::default();
        let gen = Generator::new(&schema, &options).unwrap();
        let id = schema.find_message("Order").unwrap();
        let plans = gen.plan_unit(id).unwrap();
        let base = crate::codegen::base::base_class(&gen, &plans, id);
        assert_eq!(base.methods.iter().filter(|m| m.name == "hasCard").count(), 1);
    }

    #[test]
    fn test_builder_contract_is_nested_when_enabled() {
        let schema = schema();
        let decl = order_contract(&schema, &GeneratorOptions::default().with_builders(true));
        assert!(decl.has_method("toBuilder"));
        let builder = decl.find_nested("Builder").unwrap();
        assert!(builder.has_method("setNote"));
        assert!(builder.has_method("clearPayment"));
        assert!(builder.has_method("build"));
    }
}
