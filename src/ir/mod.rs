//! Code IR
//!
//! A small structural model of the emitted source: type references,
//! expressions, statements and declarations. Generation builds a fresh tree
//! per run; rendering to text happens outside this crate.

pub mod decl;
pub mod expr;
pub mod stmt;
pub mod types;

pub use decl::{
    Annotation, ConstructorDecl, Doc, EnumConstant, FieldDecl, MethodDecl, Modifier, Parameter, TypeDecl, TypeKind,
};
pub use expr::{BinaryOp, Expr, Literal};
pub use stmt::Stmt;
pub use types::{Primitive, TypeParam, TypeRef};
