//! Expressions

use serde::Serialize;

use super::types::TypeRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Long(i64),
    Bool(bool),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    Ne,
    And,
    Or,
    Add,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Add => "+",
        }
    }
}

/// An expression tree. Each node owns its operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Literal { value: Literal },
    Null,
    This,
    /// Local variable or parameter
    Var { name: String },
    FieldAccess { target: Box<Expr>, name: String },
    /// Static member of a type (`ProtocolVersions.V1`, `Status.ACTIVE`)
    StaticField { owner: TypeRef, name: String },
    /// Method call; `target: None` calls on the implicit receiver
    MethodCall {
        target: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },
    StaticCall { owner: TypeRef, name: String, args: Vec<Expr> },
    New { class: TypeRef, args: Vec<Expr> },
    Cast { to: TypeRef, expr: Box<Expr> },
    InstanceOf { expr: Box<Expr>, class: TypeRef },
    Not { expr: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Self::Literal {
            value: Literal::Int(value),
        }
    }

    pub fn long(value: i64) -> Self {
        Self::Literal {
            value: Literal::Long(value),
        }
    }

    pub fn bool(value: bool) -> Self {
        Self::Literal {
            value: Literal::Bool(value),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal {
            value: Literal::String(value.into()),
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Var { name: name.into() }
    }

    pub fn this() -> Self {
        Self::This
    }

    pub fn null() -> Self {
        Self::Null
    }

    /// Call on the implicit receiver
    pub fn invoke(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::MethodCall {
            target: None,
            name: name.into(),
            args,
        }
    }

    pub fn static_call(owner: TypeRef, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::StaticCall {
            owner,
            name: name.into(),
            args,
        }
    }

    pub fn static_field(owner: TypeRef, name: impl Into<String>) -> Self {
        Self::StaticField {
            owner,
            name: name.into(),
        }
    }

    pub fn new_instance(class: TypeRef, args: Vec<Expr>) -> Self {
        Self::New { class, args }
    }

    pub fn cast(to: TypeRef, expr: Expr) -> Self {
        Self::Cast {
            to,
            expr: Box::new(expr),
        }
    }

    pub fn not(expr: Expr) -> Self {
        Self::Not { expr: Box::new(expr) }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `self.name(args)`
    pub fn call(self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::MethodCall {
            target: Some(Box::new(self)),
            name: name.into(),
            args,
        }
    }

    /// `self.name`
    pub fn field(self, name: impl Into<String>) -> Self {
        Self::FieldAccess {
            target: Box::new(self),
            name: name.into(),
        }
    }

    pub fn instance_of(self, class: TypeRef) -> Self {
        Self::InstanceOf {
            expr: Box::new(self),
            class,
        }
    }

    pub fn equals(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    pub fn and(self, other: Expr) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    pub fn or(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Or, self, other)
    }

    pub fn concat(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Add, self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_calls_nest_left_to_right() {
        let expr = Expr::var("proto").call("getCustomer", vec![]).call("getName", vec![]);
        match expr {
            Expr::MethodCall { target: Some(target), name, .. } => {
                assert_eq!(name, "getName");
                assert!(matches!(*target, Expr::MethodCall { ref name, .. } if name == "getCustomer"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
