//! Predicate builder for WHERE clauses.
//!
//! A [`Where`] is a tree of comparisons and boolean connectives over column
//! names. It serializes to an SQL boolean expression plus a strictly ordered
//! parameter sequence matching the `?` placeholders left to right; values
//! are never inlined into the expression text.

use std::fmt;

use crate::value::{SqlValue, ToSqlValue};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
        }
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Comparison {
        column: String,
        op: CompareOp,
        value: SqlValue,
    },
    InList {
        column: String,
        values: Vec<SqlValue>,
    },
    Like {
        column: String,
        pattern: String,
    },
    IsNull {
        column: String,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

/// A boolean predicate over columns.
///
/// # Example
///
/// ```
/// use tabula_core::Where;
///
/// let (sql, params) = Where::eq("id", 1).and(Where::gt("age", 18)).build();
/// assert_eq!(sql, "(id = ?) AND (age > ?)");
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Where {
    expr: Expr,
}

impl Where {
    fn comparison<V: ToSqlValue>(column: &str, op: CompareOp, value: V) -> Self {
        Self {
            expr: Expr::Comparison {
                column: column.to_string(),
                op,
                value: value.to_sql_value(),
            },
        }
    }

    /// `column = value`
    pub fn eq<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::comparison(column, CompareOp::Eq, value)
    }

    /// `column != value`
    pub fn ne<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::comparison(column, CompareOp::Ne, value)
    }

    /// `column > value`
    pub fn gt<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::comparison(column, CompareOp::Gt, value)
    }

    /// `column >= value`
    pub fn gte<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::comparison(column, CompareOp::Gte, value)
    }

    /// `column < value`
    pub fn lt<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::comparison(column, CompareOp::Lt, value)
    }

    /// `column <= value`
    pub fn lte<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::comparison(column, CompareOp::Lte, value)
    }

    /// `column IN (values...)`
    pub fn in_list<V: ToSqlValue>(column: &str, values: Vec<V>) -> Self {
        Self {
            expr: Expr::InList {
                column: column.to_string(),
                values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            },
        }
    }

    /// `column LIKE pattern` (use `%` for wildcards; bound as a parameter).
    pub fn like(column: &str, pattern: &str) -> Self {
        Self {
            expr: Expr::Like {
                column: column.to_string(),
                pattern: pattern.to_string(),
            },
        }
    }

    /// `column IS NULL`
    pub fn is_null(column: &str) -> Self {
        Self {
            expr: Expr::IsNull {
                column: column.to_string(),
            },
        }
    }

    /// Combines two predicates with AND.
    #[must_use]
    pub fn and(self, other: Where) -> Where {
        Where {
            expr: Expr::And(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Combines two predicates with OR.
    #[must_use]
    pub fn or(self, other: Where) -> Where {
        Where {
            expr: Expr::Or(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Negates the predicate.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Where {
        Where {
            expr: Expr::Not(Box::new(self.expr)),
        }
    }

    /// Serializes to an SQL boolean expression and its ordered parameters.
    #[must_use]
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        build_expr(&self.expr)
    }
}

fn build_expr(expr: &Expr) -> (String, Vec<SqlValue>) {
    match expr {
        Expr::Comparison { column, op, value } => {
            (format!("{column} {op} ?"), vec![value.clone()])
        }
        Expr::InList { column, values } => {
            let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
            (
                format!("{column} IN ({})", placeholders.join(", ")),
                values.clone(),
            )
        }
        Expr::Like { column, pattern } => (
            format!("{column} LIKE ?"),
            vec![SqlValue::Text(pattern.clone())],
        ),
        Expr::IsNull { column } => (format!("{column} IS NULL"), vec![]),
        Expr::And(left, right) => {
            let (left_sql, mut params) = build_expr(left);
            let (right_sql, right_params) = build_expr(right);
            params.extend(right_params);
            (format!("({left_sql}) AND ({right_sql})"), params)
        }
        Expr::Or(left, right) => {
            let (left_sql, mut params) = build_expr(left);
            let (right_sql, right_params) = build_expr(right);
            params.extend(right_params);
            (format!("({left_sql}) OR ({right_sql})"), params)
        }
        Expr::Not(inner) => {
            let (sql, params) = build_expr(inner);
            (format!("NOT ({sql})"), params)
        }
    }
}
