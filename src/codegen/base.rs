//! Shared abstract base classes
//!
//! `AbstractOrder<P extends Message>` holds the wrapped native message and
//! implements every accessor on top of protected `extractX(P)` hooks. Hooks
//! for universal fields are abstract; hooks for version-specific fields
//! default to failing so that only versions declaring the field override
//! them. Enum fields arrive from the hooks as numbers and are mapped here.

use super::plan::{FieldPlan, JavaScalar, MessagePlan, ValueType};
use super::{contract, names, oneof, Generator, UnitPlans};
use crate::ir::{
    ConstructorDecl, Expr, FieldDecl, MethodDecl, Modifier, Stmt, TypeDecl, TypeParam, TypeRef,
};
use crate::model::MessageId;

const PROTO: &str = "proto";

pub(crate) fn proto_param() -> TypeRef {
    TypeRef::variable("P")
}

pub(crate) fn base_class(gen: &Generator<'_>, plans: &UnitPlans<'_>, id: MessageId) -> TypeDecl {
    let plan = plans.get(id);
    let message = gen.schema().message(id);
    let contract = gen.options().emit_contract;
    let proto = || Expr::this().field(PROTO);

    let mut decl = TypeDecl::class(names::base_name(message.name()))
        .modifiers(if message.is_nested() {
            &[Modifier::Public, Modifier::Abstract, Modifier::Static][..]
        } else {
            &[Modifier::Public, Modifier::Abstract][..]
        })
        .type_param(TypeParam::bounded("P", TypeRef::named("com.google.protobuf.Message")));

    if contract {
        decl = decl
            .implements(gen.contract_ref(id))
            .doc(format!("Shared implementation of {} over a native message.", plan.path));
    } else {
        decl.doc = contract::type_doc(gen, plan);
    }

    decl = decl
        .field(FieldDecl::new(PROTO, proto_param()).modifiers(&[Modifier::Protected, Modifier::Final]))
        .constructor(
            ConstructorDecl::new(&[Modifier::Protected])
                .param(PROTO, proto_param())
                .body(vec![Stmt::assign(proto(), Expr::var(PROTO))]),
        )
        .method(
            MethodDecl::new("getTypedProto", proto_param())
                .modifiers(&[Modifier::Public])
                .doc("The wrapped native message.")
                .returning(proto()),
        )
        .method(public(contract, MethodDecl::new("toBytes", TypeRef::bytes_array())).returning(proto().call("toByteArray", vec![])));

    if !contract {
        decl = decl.method(
            MethodDecl::new("getVersionId", TypeRef::string()).modifiers(&[Modifier::Public, Modifier::Abstract]),
        );
        if gen.options().emit_builders {
            decl = decl.method(
                MethodDecl::new("toBuilder", gen.builder_ref(id)).modifiers(&[Modifier::Public, Modifier::Abstract]),
            );
        }
    }

    for field in &plan.fields {
        for method in field_methods(gen, field, contract) {
            decl = decl.method(method);
        }
    }
    for method in oneof_methods(gen, plan, contract) {
        decl = decl.method(method);
    }

    if !contract {
        for surface in contract::surface_methods(gen, plan) {
            if let Some(method) = decl.methods.iter_mut().find(|m| m.name == surface.name) {
                if method.doc.is_empty() {
                    method.doc = surface.doc;
                }
            }
        }
        for nested in contract::surface_types(gen, plans, id) {
            decl = decl.nested_type(nested);
        }
    }
    for child in gen.schema().nested_messages(id) {
        decl = decl.nested_type(base_class(gen, plans, child));
    }
    decl
}

/// Public method, annotated when it implements the contract
fn public(contract: bool, method: MethodDecl) -> MethodDecl {
    let method = method.modifiers(&[Modifier::Public]);
    if contract {
        method.overrides()
    } else {
        method
    }
}

fn hook(name: String, returns: TypeRef) -> MethodDecl {
    MethodDecl::new(name, returns)
        .modifiers(&[Modifier::Protected])
        .param(PROTO, proto_param())
}

fn presence_hook(field: &str) -> String {
    format!("extractHas{}", names::to_pascal_case(field))
}

fn field_methods(gen: &Generator<'_>, field: &FieldPlan<'_>, contract: bool) -> Vec<MethodDecl> {
    let name = field.name();
    let extractor = names::extractor(name);
    let guard = |body: Vec<Stmt>| -> Vec<Stmt> {
        if field.universal {
            return body;
        }
        let mut guarded = vec![Stmt::if_then(
            Expr::not(Expr::invoke(names::supports(name), vec![])),
            vec![gen.unsupported(&field.path, Expr::invoke("getVersionId", vec![]))],
        )];
        guarded.extend(body);
        guarded
    };

    let mut methods = Vec::new();

    let extract = hook(extractor.clone(), gen.extract_type(field));
    methods.push(if field.universal {
        extract.modifiers(&[Modifier::Abstract])
    } else {
        extract.body(vec![gen.unsupported(&field.path, Expr::invoke("getVersionId", vec![]))])
    });

    if !field.universal {
        methods.push(
            public(contract, MethodDecl::new(names::supports(name), TypeRef::boolean())).returning(Expr::bool(false)),
        );
    }

    let extracted = Expr::invoke(extractor, vec![Expr::this().field(PROTO)]);
    methods.push(
        public(contract, MethodDecl::new(names::getter(name), gen.accessor_type(field)))
            .body(guard(wrap_extracted(gen, field, extracted))),
    );

    if field.has_presence() {
        let has_hook = hook(presence_hook(name), TypeRef::boolean());
        methods.push(if field.universal {
            has_hook.modifiers(&[Modifier::Abstract])
        } else {
            has_hook.returning(Expr::bool(false))
        });
        let present = Expr::invoke(presence_hook(name), vec![Expr::this().field(PROTO)]);
        let condition = if field.universal {
            present
        } else {
            Expr::invoke(names::supports(name), vec![]).and(present)
        };
        methods.push(public(contract, MethodDecl::new(names::has(name), TypeRef::boolean())).returning(condition));
    }

    if let Some(enum_id) = field.enum_helper {
        let enum_type = gen.enum_ref(enum_id);
        let mut number = Expr::invoke(names::getter(name), vec![]);
        if field.value == ValueType::Scalar(JavaScalar::Long) {
            number = Expr::cast(TypeRef::int(), number);
        }
        methods.push(
            public(contract, MethodDecl::new(format!("{}Enum", names::getter(name)), enum_type.clone()))
                .returning(Expr::static_call(enum_type, "fromNumber", vec![number])),
        );
    }
    methods
}

/// Map the hook result onto the accessor type
fn wrap_extracted(gen: &Generator<'_>, field: &FieldPlan<'_>, extracted: Expr) -> Vec<Stmt> {
    let ValueType::Enum(enum_id) = field.value else {
        return vec![Stmt::ret(extracted)];
    };
    let enum_type = gen.enum_ref(enum_id);
    if !field.repeated {
        return vec![Stmt::ret(Expr::static_call(enum_type, "fromNumber", vec![extracted]))];
    }
    vec![
        Stmt::var(
            TypeRef::list(enum_type.clone()),
            "result",
            Expr::new_instance(TypeRef::array_list(enum_type.clone()), vec![]),
        ),
        Stmt::for_each(
            TypeRef::named("Integer"),
            "number",
            extracted,
            vec![Stmt::expr(Expr::var("result").call(
                "add",
                vec![Expr::static_call(enum_type, "fromNumber", vec![Expr::var("number")])],
            ))],
        ),
        Stmt::ret(Expr::var("result")),
    ]
}

fn oneof_methods(gen: &Generator<'_>, plan: &MessagePlan<'_>, contract: bool) -> Vec<MethodDecl> {
    let message = gen.schema().message(plan.id);
    let surface = gen.surface_path(plan.id);
    let mut methods = Vec::new();

    for group in message.oneofs() {
        let case_type = oneof::case_type(&surface, group.name());
        let hook_name = format!("extract{}Case", names::to_pascal_case(group.name()));
        methods.push(hook(hook_name.clone(), case_type.clone()).modifiers(&[Modifier::Abstract]));
        methods.push(
            public(contract, MethodDecl::new(names::oneof_case_getter(group.name()), case_type.clone()))
                .returning(Expr::invoke(hook_name, vec![Expr::this().field(PROTO)])),
        );
    }
    for (member, groups) in oneof::groups_by_member(message) {
        methods.push(
            public(contract, MethodDecl::new(names::has(member), TypeRef::boolean()))
                .returning(oneof::is_member_set(&surface, member, &groups)),
        );
    }
    methods
}
