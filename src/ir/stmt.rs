//! Statements

use serde::Serialize;

use super::expr::Expr;
use super::types::TypeRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Expr { expr: Expr },
    Return { value: Option<Expr> },
    Assign { target: Expr, value: Expr },
    VarDecl { ty: TypeRef, name: String, init: Option<Expr> },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    ForEach {
        ty: TypeRef,
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Throw { value: Expr },
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Self::Expr { expr }
    }

    pub fn ret(value: Expr) -> Self {
        Self::Return { value: Some(value) }
    }

    pub fn ret_void() -> Self {
        Self::Return { value: None }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::Assign { target, value }
    }

    pub fn var(ty: TypeRef, name: impl Into<String>, init: Expr) -> Self {
        Self::VarDecl {
            ty,
            name: name.into(),
            init: Some(init),
        }
    }

    pub fn if_then(condition: Expr, then_branch: Vec<Stmt>) -> Self {
        Self::If {
            condition,
            then_branch,
            else_branch: Vec::new(),
        }
    }

    pub fn if_else(condition: Expr, then_branch: Vec<Stmt>, else_branch: Vec<Stmt>) -> Self {
        Self::If {
            condition,
            then_branch,
            else_branch,
        }
    }

    pub fn for_each(ty: TypeRef, var: impl Into<String>, iterable: Expr, body: Vec<Stmt>) -> Self {
        Self::ForEach {
            ty,
            var: var.into(),
            iterable,
            body,
        }
    }

    pub fn throw(value: Expr) -> Self {
        Self::Throw { value }
    }
}
