//! Code Generation
//!
//! Turns a merged schema into declarations for a version-agnostic API.
//!
//! Architecture:
//! - Generator: immutable context (schema, options, naming) shared by all emitters
//! - MessagePlan: per-message projection with every field's unified type decided
//! - Emitters: contract, base, version_impl, builder, context, support; each consumes
//!   plans and never re-reads raw descriptors
//!
//! Per message the output is a contract interface, a shared abstract base and
//! one implementation class per version the message exists in. Top-level
//! messages are independent units and are emitted in parallel; results are
//! collected in schema order.

pub mod config;
pub mod names;
pub mod well_known;

mod base;
mod builder;
mod context;
mod contract;
mod oneof;
mod plan;
mod support;
mod version_impl;

pub use config::{GeneratorOptions, VersionLayout};
pub use well_known::WellKnown;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::ir::{Expr, Stmt, TypeDecl, TypeRef};
use crate::model::{EntityId, EnumId, MergedSchema, MessageId};
use crate::version::constant_name;
use plan::{MessagePlan, ValueType};

/// Generate declarations for every included message and every top-level enum.
///
/// Order: shared support types and the `VersionContext` interface, then each
/// schema root in first-seen order (a message contributes its contract, base
/// and per-version implementations), then one context class per version.
pub fn generate(schema: &MergedSchema, options: &GeneratorOptions) -> Result<Vec<TypeDecl>> {
    Generator::new(schema, options)?.generate()
}

// =============================================================================
// Generator
// =============================================================================

/// Immutable generation context
pub(crate) struct Generator<'s> {
    schema: &'s MergedSchema,
    options: &'s GeneratorOptions,
    default_version: String,
}

/// Plans for one top-level message and everything nested in it
pub(crate) struct UnitPlans<'s> {
    plans: IndexMap<MessageId, MessagePlan<'s>>,
}

impl<'s> UnitPlans<'s> {
    pub(crate) fn get(&self, id: MessageId) -> &MessagePlan<'s> {
        &self.plans[&id]
    }
}

impl<'s> Generator<'s> {
    pub(crate) fn new(schema: &'s MergedSchema, options: &'s GeneratorOptions) -> Result<Self> {
        options.validate(schema)?;
        let default_version = options
            .resolve_default_version(schema)
            .map(str::to_string)
            .ok_or_else(|| crate::error::WrapgenError::InvalidInput("schema has no versions".into()))?;
        Ok(Self {
            schema,
            options,
            default_version,
        })
    }

    pub(crate) fn schema(&self) -> &'s MergedSchema {
        self.schema
    }

    pub(crate) fn options(&self) -> &'s GeneratorOptions {
        self.options
    }

    pub(crate) fn generate(&self) -> Result<Vec<TypeDecl>> {
        let units: Vec<MessageId> = self
            .schema
            .top_level_messages()
            .filter(|id| self.options.includes(self.schema.message(*id).name()))
            .collect();

        let generated: Vec<Vec<TypeDecl>> = units.par_iter().map(|id| self.message_unit(*id)).collect::<Result<_>>()?;
        let mut by_message: IndexMap<MessageId, Vec<TypeDecl>> = units.iter().copied().zip(generated).collect();

        let mut out = support::support_types(self);
        out.push(context::context_interface(self, &units));
        if self.options.convert_well_known && self.uses_convertible_well_known() {
            out.push(well_known::conversions_class(&self.options.base_package));
        }
        for root in self.schema.roots() {
            match root {
                EntityId::Enum(id) => out.push(support::unified_enum(self, *id).in_package(&self.options.base_package)),
                EntityId::Message(id) => {
                    if let Some(decls) = by_message.shift_remove(id) {
                        out.extend(decls);
                    }
                }
            }
        }
        for version in self.schema.versions() {
            out.push(context::context_impl(self, &units, version));
        }

        let types: usize = out.iter().map(TypeDecl::count_types).sum();
        info!(
            top_level = out.len(),
            types,
            versions = self.schema.versions().len(),
            "generated wrapper declarations"
        );
        Ok(out)
    }

    fn message_unit(&self, id: MessageId) -> Result<Vec<TypeDecl>> {
        let plans = self.plan_unit(id)?;
        let message = self.schema.message(id);

        let mut decls = Vec::new();
        if self.options.emit_contract {
            decls.push(contract::contract(self, &plans, id).in_package(&self.options.base_package));
        }
        decls.push(base::base_class(self, &plans, id).in_package(self.options.base_class_package()));
        for version in message.versions().iter() {
            decls.push(version_impl::impl_class(self, &plans, id, version).in_package(self.options.impl_package(version)));
        }
        debug!(message = message.name(), declarations = decls.len(), "generated message unit");
        Ok(decls)
    }

    fn plan_unit(&self, root: MessageId) -> Result<UnitPlans<'s>> {
        let mut plans = IndexMap::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            plans.insert(id, MessagePlan::build(self.schema, self.options, id)?);
            pending.extend(self.schema.nested_messages(id));
        }
        Ok(UnitPlans { plans })
    }

    fn uses_convertible_well_known(&self) -> bool {
        self.schema
            .all_messages()
            .into_iter()
            .filter(|id| self.options.includes(self.top_level_name(*id)))
            .flat_map(|id| self.schema.message(id).fields())
            .flat_map(|field| field.snapshots().map(|(_, s)| s.field_type.clone()))
            .any(|ty| match ty {
                crate::descriptor::FieldType::Message(path) => {
                    self.schema.find_message(&path).is_none()
                        && WellKnown::lookup(&path).is_some_and(|known| known.is_convertible())
                }
                _ => false,
            })
    }

    // =========================================================================
    // Naming
    // =========================================================================

    /// Message ids from the top-level ancestor down to `id`
    fn lineage(&self, id: MessageId) -> Vec<MessageId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.schema.message(current).parent() {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    fn top_level_name(&self, id: MessageId) -> &'s str {
        let top = self.lineage(id)[0];
        self.schema.message(top).name()
    }

    fn joined(&self, id: MessageId, name: impl Fn(&str) -> String) -> String {
        self.lineage(id)
            .into_iter()
            .map(|m| name(self.schema.message(m).name()))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Qualified name of the version-agnostic type for a message: the
    /// contract interface, or the base class without a contract layer
    pub(crate) fn surface_path(&self, id: MessageId) -> String {
        if self.options.emit_contract {
            format!("{}.{}", self.options.base_package, self.joined(id, names::contract_name))
        } else {
            self.base_path(id)
        }
    }

    /// Type callers see for a message-typed value
    pub(crate) fn contract_ref(&self, id: MessageId) -> TypeRef {
        if self.options.emit_contract {
            TypeRef::named(self.surface_path(id))
        } else {
            TypeRef::generic(self.base_path(id), vec![TypeRef::Wildcard])
        }
    }

    pub(crate) fn builder_ref(&self, id: MessageId) -> TypeRef {
        TypeRef::named(format!("{}.Builder", self.surface_path(id)))
    }

    pub(crate) fn base_path(&self, id: MessageId) -> String {
        format!("{}.{}", self.options.base_class_package(), self.joined(id, names::base_name))
    }

    pub(crate) fn impl_path(&self, id: MessageId, version: &str) -> String {
        format!(
            "{}.{}",
            self.options.impl_package(version),
            self.joined(id, |name| self.options.impl_name(&names::contract_name(name), version))
        )
    }

    /// Native per-version class for a message
    pub(crate) fn native_ref(&self, id: MessageId, version: &str) -> TypeRef {
        let lineage = self.lineage(id);
        let top = self.schema.message(lineage[0]);
        let mut path = self.options.proto_package(version);
        if let Some(file) = top.source_file(version) {
            let mut outer = names::outer_class_name(file);
            if outer == top.name() {
                outer.push_str("OuterClass");
            }
            path.push('.');
            path.push_str(&outer);
        }
        for m in lineage {
            path.push('.');
            path.push_str(self.schema.message(m).name());
        }
        TypeRef::named(path)
    }

    pub(crate) fn native_builder_ref(&self, id: MessageId, version: &str) -> TypeRef {
        let native = self.native_ref(id, version);
        TypeRef::named(format!("{}.Builder", native.name().unwrap_or_default()))
    }

    /// Generated enum type; nested enums live inside their owner's surface
    pub(crate) fn enum_ref(&self, id: EnumId) -> TypeRef {
        let enumeration = self.schema.enumeration(id);
        match enumeration.parent() {
            Some(parent) => TypeRef::named(format!("{}.{}", self.surface_path(parent), enumeration.name())),
            None => TypeRef::named(format!("{}.{}", self.options.base_package, enumeration.name())),
        }
    }

    pub(crate) fn exception_ref(&self) -> TypeRef {
        TypeRef::named(format!("{}.{}", self.options.base_package, support::EXCEPTION))
    }

    pub(crate) fn versions_ref(&self) -> TypeRef {
        TypeRef::named(format!("{}.{}", self.options.base_package, support::VERSIONS))
    }

    pub(crate) fn context_ref(&self) -> TypeRef {
        TypeRef::named(format!("{}.{}", self.options.base_package, context::CONTEXT))
    }

    /// Singleton context class of one version
    pub(crate) fn context_impl_ref(&self, version: &str) -> TypeRef {
        TypeRef::named(format!(
            "{}.{}",
            self.options.impl_package(version),
            self.options.impl_name(context::CONTEXT, version)
        ))
    }

    pub(crate) fn conversions_ref(&self) -> TypeRef {
        TypeRef::named(format!("{}.WellKnownConversions", self.options.base_package))
    }

    pub(crate) fn default_version(&self) -> &str {
        &self.default_version
    }

    /// `ProtocolVersions.V1`
    pub(crate) fn version_constant(&self, version: &str) -> Expr {
        Expr::static_field(self.versions_ref(), constant_name(version))
    }

    /// `throw new VersionNotSupportedException("Order.note", version)`
    pub(crate) fn unsupported(&self, element: &str, version: Expr) -> Stmt {
        Stmt::throw(Expr::new_instance(
            self.exception_ref(),
            vec![Expr::string(element), version],
        ))
    }

    // =========================================================================
    // Accessor types
    // =========================================================================

    /// Element type exposed for a unified value
    pub(crate) fn value_ref(&self, value: &ValueType) -> TypeRef {
        use plan::JavaScalar;
        match value {
            ValueType::Scalar(JavaScalar::Int) => TypeRef::int(),
            ValueType::Scalar(JavaScalar::Long) => TypeRef::long(),
            ValueType::Scalar(JavaScalar::Float) => TypeRef::float(),
            ValueType::Scalar(JavaScalar::Double) => TypeRef::double(),
            ValueType::Scalar(JavaScalar::Boolean) => TypeRef::boolean(),
            ValueType::Scalar(JavaScalar::String) => TypeRef::string(),
            ValueType::Scalar(JavaScalar::Bytes) => TypeRef::byte_string(),
            ValueType::Enum(id) => self.enum_ref(*id),
            ValueType::Message(id) => self.contract_ref(*id),
            ValueType::WellKnown(known) if self.options.convert_well_known => known.converted_type(),
            ValueType::WellKnown(known) => known.native_type(),
        }
    }

    /// Getter return type, list-wrapped for repeated fields
    pub(crate) fn accessor_type(&self, plan: &plan::FieldPlan<'_>) -> TypeRef {
        let element = self.value_ref(&plan.value);
        if plan.repeated {
            TypeRef::list(element)
        } else {
            element
        }
    }

    /// Return type of the per-version extraction hook. Enums travel as
    /// numbers; the base class maps them.
    pub(crate) fn extract_type(&self, plan: &plan::FieldPlan<'_>) -> TypeRef {
        let element = match plan.value {
            ValueType::Enum(_) => TypeRef::int(),
            ref other => self.value_ref(other),
        };
        if plan.repeated {
            TypeRef::list(element)
        } else {
            element
        }
    }
}
