//! Expression model for the exchange planner.
//!
//! Only the forms the planner actually carries: resolved grouping-column
//! references, the minimal scalar expressions that scan push-downs hold,
//! and aggregate function calls. Full expression binding/evaluation lives
//! in the frontend and executor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A resolved reference to a base-table column.
///
/// `index` is the column's position in the table schema; the rendered
/// form `table.name (#index)` is part of the textual plan contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub name: String,
    pub index: usize,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, name: impl Into<String>, index: usize) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            index,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} (#{})", self.table, self.name, self.index)
    }
}

/// Comparison operator in a push-down filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        f.write_str(s)
    }
}

/// Minimal scalar expression, as carried by scan push-downs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarExpr {
    Column(ColumnRef),
    Literal(i64),
    Compare {
        op: CompareOp,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Column(c) => write!(f, "{}", c.name),
            ScalarExpr::Literal(v) => write!(f, "{}", v),
            ScalarExpr::Compare { op, left, right } => write!(f, "{} {} {}", left, op, right),
        }
    }
}

/// An aggregate function call, e.g. `SUM(amount)` or `COUNT(DISTINCT id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateFunction {
    pub name: String,
    pub args: Vec<ScalarExpr>,
    pub distinct: bool,
}

impl AggregateFunction {
    pub fn new(name: impl Into<String>, args: Vec<ScalarExpr>) -> Self {
        Self {
            name: name.into(),
            args,
            distinct: false,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        if self.distinct {
            write!(f, "{}(DISTINCT {})", self.name, args.join(", "))
        } else {
            write!(f, "{}({})", self.name, args.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_ref_display() {
        let col = ColumnRef::new("numbers_mt", "number", 0);
        assert_eq!(col.to_string(), "numbers_mt.number (#0)");
    }

    #[test]
    fn test_aggregate_function_display() {
        let col = ScalarExpr::Column(ColumnRef::new("orders", "amount", 2));
        assert_eq!(
            AggregateFunction::new("SUM", vec![col.clone()]).to_string(),
            "SUM(amount)"
        );
        assert_eq!(
            AggregateFunction::new("COUNT", vec![col]).distinct().to_string(),
            "COUNT(DISTINCT amount)"
        );
    }

    #[test]
    fn test_filter_display() {
        let filter = ScalarExpr::Compare {
            op: CompareOp::Gt,
            left: Box::new(ScalarExpr::Column(ColumnRef::new("t", "a", 0))),
            right: Box::new(ScalarExpr::Literal(10)),
        };
        assert_eq!(filter.to_string(), "a > 10");
    }
}
