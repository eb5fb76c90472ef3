//! Declarations
//!
//! Types, fields, constructors and methods. A declaration owns its members,
//! nested types and statement bodies; the tree has no back-references.

use serde::Serialize;

use super::expr::Expr;
use super::stmt::Stmt;
use super::types::{TypeParam, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
    Default,
}

/// `@Name` or `@Name("value")`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Annotation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn override_() -> Self {
        Self::new("Override")
    }
}

/// Documentation comment, one entry per line
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Doc(pub Vec<String>);

impl Doc {
    pub fn line(text: impl Into<String>) -> Self {
        Self(vec![text.into()])
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.0.push(text.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

// =============================================================================
// Members
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldDecl {
    #[serde(skip_serializing_if = "Doc::is_empty")]
    pub doc: Doc,
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub name: String,
    pub init: Option<Expr>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            doc: Doc::default(),
            modifiers: Vec::new(),
            ty,
            name: name.into(),
            init: None,
        }
    }

    pub fn modifiers(mut self, modifiers: &[Modifier]) -> Self {
        self.modifiers.extend_from_slice(modifiers);
        self
    }

    pub fn init(mut self, value: Expr) -> Self {
        self.init = Some(value);
        self
    }

    pub fn doc(mut self, text: impl Into<String>) -> Self {
        self.doc.push(text);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodDecl {
    #[serde(skip_serializing_if = "Doc::is_empty")]
    pub doc: Doc,
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<Modifier>,
    pub type_params: Vec<TypeParam>,
    pub return_type: TypeRef,
    pub name: String,
    pub params: Vec<Parameter>,
    pub throws: Vec<TypeRef>,
    /// `None` for abstract and interface methods
    pub body: Option<Vec<Stmt>>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            doc: Doc::default(),
            annotations: Vec::new(),
            modifiers: Vec::new(),
            type_params: Vec::new(),
            return_type,
            name: name.into(),
            params: Vec::new(),
            throws: Vec::new(),
            body: None,
        }
    }

    pub fn modifiers(mut self, modifiers: &[Modifier]) -> Self {
        self.modifiers.extend_from_slice(modifiers);
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(Parameter { name: name.into(), ty });
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn overrides(self) -> Self {
        self.annotate(Annotation::override_())
    }

    pub fn throws(mut self, ty: TypeRef) -> Self {
        self.throws.push(ty);
        self
    }

    pub fn body(mut self, stmts: Vec<Stmt>) -> Self {
        self.body = Some(stmts);
        self
    }

    /// Body consisting of a single `return`
    pub fn returning(self, value: Expr) -> Self {
        self.body(vec![Stmt::ret(value)])
    }

    pub fn doc(mut self, text: impl Into<String>) -> Self {
        self.doc.push(text);
        self
    }

    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConstructorDecl {
    #[serde(skip_serializing_if = "Doc::is_empty")]
    pub doc: Doc,
    pub modifiers: Vec<Modifier>,
    pub params: Vec<Parameter>,
    pub body: Vec<Stmt>,
}

impl ConstructorDecl {
    pub fn new(modifiers: &[Modifier]) -> Self {
        Self {
            doc: Doc::default(),
            modifiers: modifiers.to_vec(),
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(Parameter { name: name.into(), ty });
        self
    }

    pub fn body(mut self, stmts: Vec<Stmt>) -> Self {
        self.body = stmts;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnumConstant {
    pub name: String,
    pub args: Vec<Expr>,
    #[serde(skip_serializing_if = "Doc::is_empty")]
    pub doc: Doc,
}

impl EnumConstant {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
            doc: Doc::default(),
        }
    }
}

// =============================================================================
// Type Declarations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
}

/// A class, interface or enum with its members and nested types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeDecl {
    /// Set on top-level declarations only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub kind: TypeKind,
    pub name: String,
    #[serde(skip_serializing_if = "Doc::is_empty")]
    pub doc: Doc,
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<Modifier>,
    pub type_params: Vec<TypeParam>,
    /// Superclass for classes, super-interfaces for interfaces
    pub extends: Vec<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub constants: Vec<EnumConstant>,
    pub fields: Vec<FieldDecl>,
    pub constructors: Vec<ConstructorDecl>,
    pub methods: Vec<MethodDecl>,
    pub nested: Vec<TypeDecl>,
}

impl TypeDecl {
    fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            package: None,
            kind,
            name: name.into(),
            doc: Doc::default(),
            annotations: Vec::new(),
            modifiers: Vec::new(),
            type_params: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            constants: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Class, name)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Interface, name)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Enum, name)
    }

    pub fn in_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn modifiers(mut self, modifiers: &[Modifier]) -> Self {
        self.modifiers.extend_from_slice(modifiers);
        self
    }

    pub fn type_param(mut self, param: TypeParam) -> Self {
        self.type_params.push(param);
        self
    }

    pub fn extends(mut self, ty: TypeRef) -> Self {
        self.extends.push(ty);
        self
    }

    pub fn implements(mut self, ty: TypeRef) -> Self {
        self.implements.push(ty);
        self
    }

    pub fn doc(mut self, text: impl Into<String>) -> Self {
        self.doc.push(text);
        self
    }

    pub fn constant(mut self, constant: EnumConstant) -> Self {
        self.constants.push(constant);
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorDecl) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn nested_type(mut self, decl: TypeDecl) -> Self {
        self.nested.push(decl);
        self
    }

    /// Fully qualified name for top-level declarations, simple name otherwise
    pub fn qualified_name(&self) -> String {
        match &self.package {
            Some(package) if !package.is_empty() => format!("{}.{}", package, self.name),
            _ => self.name.clone(),
        }
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.find_method(name).is_some()
    }

    pub fn find_nested(&self, name: &str) -> Option<&TypeDecl> {
        self.nested.iter().find(|n| n.name == name)
    }

    pub fn constant_names(&self) -> Vec<&str> {
        self.constants.iter().map(|c| c.name.as_str()).collect()
    }

    /// Total declarations in this tree, nested types included
    pub fn count_types(&self) -> usize {
        1 + self.nested.iter().map(TypeDecl::count_types).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_compose() {
        let decl = TypeDecl::class("OrderV1")
            .in_package("com.example.impl")
            .modifiers(&[Modifier::Public, Modifier::Final])
            .method(
                MethodDecl::new("getVersionId", TypeRef::string())
                    .modifiers(&[Modifier::Public])
                    .overrides()
                    .returning(Expr::string("v1")),
            )
            .nested_type(TypeDecl::class("Builder"));

        assert_eq!(decl.qualified_name(), "com.example.impl.OrderV1");
        assert!(decl.has_method("getVersionId"));
        assert!(!decl.find_method("getVersionId").unwrap().is_abstract());
        assert_eq!(decl.count_types(), 2);
    }
}
