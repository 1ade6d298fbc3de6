//! Distributed-aggregation exchange planner.
//!
//! Given a logical `GROUP BY` over a partitioned table, decides where
//! rows must be hash-shuffled across workers relative to the two
//! physical aggregation stages, builds the physical operator tree, and
//! renders it for inspection.

pub mod builder;
pub mod explain;
pub mod expr;
pub mod plan;
pub mod shuffle;

pub use builder::{build_aggregation, plan_aggregation, validate_plan, AggregationRequest};
pub use explain::render_plan;
pub use expr::{AggregateFunction, ColumnRef, CompareOp, ScalarExpr};
pub use plan::{PlanNode, PushDowns, TableName};
pub use shuffle::{ExchangeKind, ExchangePlacement, HashKey, ShuffleMode, ShufflePosition};
