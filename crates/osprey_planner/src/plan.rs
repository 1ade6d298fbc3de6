//! Physical plan node model.
//!
//! The planner builds an owned, strictly tree-shaped chain of operators:
//! each node exclusively owns its single child, there is no sharing and
//! no cycle, and trees are value-comparable (`PartialEq`) so consumers
//! can assert exact shapes.

use std::fmt;

use osprey_common::error::{OspreyResult, PlannerError};
use serde::{Deserialize, Serialize};

use crate::expr::{AggregateFunction, ColumnRef, ScalarExpr};
use crate::shuffle::ExchangeKind;

/// Qualified table name, rendered as `database.table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableName {
    pub database: String,
    pub table: String,
}

impl TableName {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// Filter and limit conditions pushed down into the scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PushDowns {
    pub filters: Vec<ScalarExpr>,
    pub limit: Option<u64>,
}

impl fmt::Display for PushDowns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<String> = self.filters.iter().map(|e| e.to_string()).collect();
        let limit = match self.limit {
            Some(n) => n.to_string(),
            None => "NONE".to_string(),
        };
        write!(f, "[filters: [{}], limit: {}]", filters.join(", "), limit)
    }
}

/// Physical execution plan — the tree of operators the planner emits.
///
/// `estimated_rows` is an opaque per-node display/cost attribute computed
/// upstream; exchange and aggregation-stage wrapping propagate it
/// unchanged (this subsystem does not model cardinality reduction from
/// grouping).
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    /// Leaf: a partitioned table scan with push-down information.
    TableScan {
        table: TableName,
        read_rows: u64,
        read_bytes: u64,
        partitions_total: u64,
        partitions_scanned: u64,
        push_downs: PushDowns,
        estimated_rows: f64,
    },
    /// Per-worker local aggregation producing intermediate states.
    AggregatePartial {
        group_by: Vec<ColumnRef>,
        aggregate_functions: Vec<AggregateFunction>,
        estimated_rows: f64,
        input: Box<PlanNode>,
    },
    /// Merges same-group partial states into the final answer.
    ///
    /// Carries the same `group_by` and `aggregate_functions` as its
    /// partner `AggregatePartial` — the split is physical, not semantic.
    AggregateFinal {
        group_by: Vec<ColumnRef>,
        aggregate_functions: Vec<AggregateFunction>,
        estimated_rows: f64,
        input: Box<PlanNode>,
    },
    /// Network data-movement boundary between workers.
    Exchange {
        kind: ExchangeKind,
        input: Box<PlanNode>,
    },
}

impl PlanNode {
    /// Checked `TableScan` constructor.
    #[allow(clippy::too_many_arguments)]
    pub fn table_scan(
        table: TableName,
        read_rows: u64,
        read_bytes: u64,
        partitions_total: u64,
        partitions_scanned: u64,
        push_downs: PushDowns,
        estimated_rows: f64,
    ) -> OspreyResult<PlanNode> {
        if partitions_scanned > partitions_total {
            return Err(PlannerError::InconsistentPlanShape(format!(
                "TableScan on {}: partitions_scanned {} exceeds partitions_total {}",
                table, partitions_scanned, partitions_total
            ))
            .into());
        }
        Ok(PlanNode::TableScan {
            table,
            read_rows,
            read_bytes,
            partitions_total,
            partitions_scanned,
            push_downs,
            estimated_rows,
        })
    }

    /// Operator name as rendered in plan text.
    pub fn name(&self) -> &'static str {
        match self {
            PlanNode::TableScan { .. } => "TableScan",
            PlanNode::AggregatePartial { .. } => "AggregatePartial",
            PlanNode::AggregateFinal { .. } => "AggregateFinal",
            PlanNode::Exchange { .. } => "Exchange",
        }
    }

    /// The single child, if any. Exchanges and aggregation stages have
    /// exactly one; scans have none.
    pub fn child(&self) -> Option<&PlanNode> {
        match self {
            PlanNode::TableScan { .. } => None,
            PlanNode::AggregatePartial { input, .. }
            | PlanNode::AggregateFinal { input, .. }
            | PlanNode::Exchange { input, .. } => Some(input),
        }
    }

    /// Estimated output rows. Exchanges move rows without changing the
    /// estimate, so they report their child's value.
    pub fn estimated_rows(&self) -> f64 {
        match self {
            PlanNode::TableScan { estimated_rows, .. }
            | PlanNode::AggregatePartial { estimated_rows, .. }
            | PlanNode::AggregateFinal { estimated_rows, .. } => *estimated_rows,
            PlanNode::Exchange { input, .. } => input.estimated_rows(),
        }
    }

    /// Iterate the chain from this node down to the leaf.
    pub fn iter(&self) -> PlanNodeIter<'_> {
        PlanNodeIter { next: Some(self) }
    }
}

/// Root-to-leaf iterator over a (single-child) plan chain.
pub struct PlanNodeIter<'a> {
    next: Option<&'a PlanNode>,
}

impl<'a> Iterator for PlanNodeIter<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.child();
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_scan_partition_invariant() {
        let err = PlanNode::table_scan(
            TableName::new("default", "t"),
            100,
            800,
            2,
            3,
            PushDowns::default(),
            100.0,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_push_downs_display() {
        assert_eq!(
            PushDowns::default().to_string(),
            "[filters: [], limit: NONE]"
        );
        let pd = PushDowns {
            filters: vec![],
            limit: Some(10),
        };
        assert_eq!(pd.to_string(), "[filters: [], limit: 10]");
    }

    #[test]
    fn test_iter_walks_to_leaf() {
        let scan = PlanNode::table_scan(
            TableName::new("default", "t"),
            100,
            800,
            1,
            1,
            PushDowns::default(),
            100.0,
        )
        .unwrap();
        let partial = PlanNode::AggregatePartial {
            group_by: vec![],
            aggregate_functions: vec![],
            estimated_rows: 100.0,
            input: Box::new(scan),
        };
        let names: Vec<_> = partial.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["AggregatePartial", "TableScan"]);
    }
}
