//! Aggregation stage builder.
//!
//! Splits a logical `GROUP BY` aggregation into the physical
//! `AggregatePartial`/`AggregateFinal` pair and wires the exchanges
//! according to the session's shuffle mode:
//!
//! - `before_partial`: `Merge ← Final ← Partial ← Hash(columns) ← input`
//! - `before_merge`:   `Merge ← Final ← Hash(_group_by_key) ← Partial ← input`
//!
//! Construction is synchronous and pure: the mode is read once at the top
//! of the build, and either a complete validated tree is returned or an
//! error — no partially built plan ever escapes.

use std::collections::HashSet;

use osprey_common::error::{OspreyResult, PlannerError};
use osprey_common::settings::Settings;
use tracing::debug;

use crate::expr::{AggregateFunction, ColumnRef};
use crate::plan::PlanNode;
use crate::shuffle::{ExchangeKind, ExchangePlacement, ShuffleMode, ShufflePosition};

/// Logical aggregation request: the plan-build input of one `GROUP BY`.
///
/// `input` already reflects scan push-downs and partition counts;
/// `estimated_rows` is the post-group estimate computed upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    pub group_by: Vec<ColumnRef>,
    pub aggregate_functions: Vec<AggregateFunction>,
    pub input: PlanNode,
    pub estimated_rows: f64,
}

/// Build a distributed aggregation, reading the shuffle mode from the
/// session settings exactly once.
pub fn plan_aggregation(settings: &Settings, request: AggregationRequest) -> OspreyResult<PlanNode> {
    let mode = ShuffleMode::from_settings(settings)?;
    build_aggregation(
        request.group_by,
        request.aggregate_functions,
        request.input,
        mode,
        request.estimated_rows,
    )
}

/// Build the physical two-stage aggregation tree for one logical
/// `GROUP BY` under the given shuffle mode.
///
/// An empty `group_by` together with empty `aggregate_functions` is legal
/// (a distinct-rows-preserving pass); it still follows the same shuffle
/// rule, since grouping without aggregate functions needs the same key
/// co-location.
pub fn build_aggregation(
    group_by: Vec<ColumnRef>,
    aggregate_functions: Vec<AggregateFunction>,
    input: PlanNode,
    mode: ShuffleMode,
    estimated_rows: f64,
) -> OspreyResult<PlanNode> {
    validate_request(&group_by)?;

    debug!(
        mode = %mode,
        group_by = group_by.len(),
        aggregate_functions = aggregate_functions.len(),
        "building distributed aggregation"
    );

    let placement = ExchangePlacement::for_mode(mode, &group_by);

    let plan = match placement.position {
        ShufflePosition::AboveInput => {
            // Route raw rows to the worker owning their group, then both
            // stages run with global grouping already established.
            let shuffled = PlanNode::Exchange {
                kind: ExchangeKind::Hash(placement.key),
                input: Box::new(input),
            };
            let partial = PlanNode::AggregatePartial {
                group_by: group_by.clone(),
                aggregate_functions: aggregate_functions.clone(),
                estimated_rows,
                input: Box::new(shuffled),
            };
            PlanNode::AggregateFinal {
                group_by,
                aggregate_functions,
                estimated_rows,
                input: Box::new(partial),
            }
        }
        ShufflePosition::AbovePartial => {
            // Each worker aggregates its local rows first (valid: partial
            // aggregation is associative/commutative per worker), then
            // one partial state per distinct group per worker is shuffled
            // by the derived key for the final merge.
            let partial = PlanNode::AggregatePartial {
                group_by: group_by.clone(),
                aggregate_functions: aggregate_functions.clone(),
                estimated_rows,
                input: Box::new(input),
            };
            let shuffled = PlanNode::Exchange {
                kind: ExchangeKind::Hash(placement.key),
                input: Box::new(partial),
            };
            PlanNode::AggregateFinal {
                group_by,
                aggregate_functions,
                estimated_rows,
                input: Box::new(shuffled),
            }
        }
    };

    // Coordinator gather.
    let plan = PlanNode::Exchange {
        kind: ExchangeKind::Merge,
        input: Box::new(plan),
    };

    validate_plan(&plan)?;
    Ok(plan)
}

/// Reject malformed group-by lists before any tree is constructed.
fn validate_request(group_by: &[ColumnRef]) -> OspreyResult<()> {
    let mut seen_names = HashSet::new();
    let mut seen_indexes = HashSet::new();
    for col in group_by {
        if !seen_names.insert((col.table.as_str(), col.name.as_str())) {
            return Err(PlannerError::InvalidAggregationRequest(format!(
                "duplicate group-by column: {}",
                col
            ))
            .into());
        }
        if !seen_indexes.insert(col.index) {
            return Err(PlannerError::InvalidAggregationRequest(format!(
                "duplicate group-by column index: #{}",
                col.index
            ))
            .into());
        }
    }
    Ok(())
}

/// Defensive structural check on a freshly built tree. Never expected to
/// fail in correct operation.
pub fn validate_plan(plan: &PlanNode) -> OspreyResult<()> {
    if !matches!(
        plan,
        PlanNode::Exchange {
            kind: ExchangeKind::Merge,
            ..
        }
    ) {
        return Err(shape_error("Merge exchange is not the outermost node"));
    }

    let mut merges = 0usize;
    let mut hashes = 0usize;
    let mut partial: Option<(&[ColumnRef], &[AggregateFunction])> = None;
    let mut finals: Option<(&[ColumnRef], &[AggregateFunction])> = None;

    for node in plan.iter() {
        match node {
            PlanNode::Exchange { kind, input } => {
                match kind {
                    ExchangeKind::Merge => merges += 1,
                    ExchangeKind::Hash(_) => {
                        hashes += 1;
                        if matches!(
                            input.as_ref(),
                            PlanNode::Exchange {
                                kind: ExchangeKind::Merge,
                                ..
                            }
                        ) {
                            return Err(shape_error("Hash exchange directly above a Merge"));
                        }
                    }
                }
            }
            PlanNode::AggregatePartial {
                group_by,
                aggregate_functions,
                ..
            } => {
                if partial
                    .replace((group_by.as_slice(), aggregate_functions.as_slice()))
                    .is_some()
                {
                    return Err(shape_error("more than one AggregatePartial"));
                }
                // Root-to-leaf walk: Final must already have been seen.
                if finals.is_none() {
                    return Err(shape_error("AggregatePartial above AggregateFinal"));
                }
            }
            PlanNode::AggregateFinal {
                group_by,
                aggregate_functions,
                ..
            } => {
                if finals
                    .replace((group_by.as_slice(), aggregate_functions.as_slice()))
                    .is_some()
                {
                    return Err(shape_error("more than one AggregateFinal"));
                }
            }
            PlanNode::TableScan { .. } => {}
        }
    }

    if merges != 1 {
        return Err(shape_error(&format!("{} Merge exchanges in tree", merges)));
    }
    if hashes != 1 {
        return Err(shape_error(&format!("{} Hash exchanges in tree", hashes)));
    }
    match (partial, finals) {
        (Some(p), Some(f)) => {
            if p != f {
                return Err(shape_error(
                    "AggregatePartial and AggregateFinal carry different group-by or \
                     aggregate-function lists",
                ));
            }
        }
        _ => return Err(shape_error("missing aggregation stage")),
    }

    Ok(())
}

fn shape_error(msg: &str) -> osprey_common::OspreyError {
    PlannerError::InconsistentPlanShape(msg.to_string()).into()
}
