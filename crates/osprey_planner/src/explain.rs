//! Read-only plan-to-text rendering.
//!
//! The output is a stable external contract consumed by snapshot-style
//! tests: box-drawing connectors, one attribute per line, each child
//! indented one level, attributes in a fixed order per node type.

use crate::expr::{AggregateFunction, ColumnRef};
use crate::plan::PlanNode;

/// Render a plan tree as indented text.
///
/// The rendering is a faithful, lossless projection of every attribute
/// the node model defines; two plans render identically iff they are
/// equal.
pub fn render_plan(plan: &PlanNode) -> String {
    render_node(plan).join("\n")
}

fn render_node(plan: &PlanNode) -> Vec<String> {
    match plan {
        PlanNode::TableScan {
            table,
            read_rows,
            read_bytes,
            partitions_total,
            partitions_scanned,
            push_downs,
            estimated_rows,
        } => vec![
            "TableScan".to_string(),
            format!("├── table: {}", table),
            format!("├── read rows: {}", read_rows),
            format!("├── read bytes: {}", read_bytes),
            format!("├── partitions total: {}", partitions_total),
            format!("├── partitions scanned: {}", partitions_scanned),
            format!("├── push downs: {}", push_downs),
            format!("└── estimated rows: {:.2}", estimated_rows),
        ],
        PlanNode::AggregatePartial {
            group_by,
            aggregate_functions,
            estimated_rows,
            input,
        }
        | PlanNode::AggregateFinal {
            group_by,
            aggregate_functions,
            estimated_rows,
            input,
        } => {
            let mut lines = vec![
                plan.name().to_string(),
                format!("├── group by: [{}]", group_by_list(group_by)),
                format!(
                    "├── aggregate functions: [{}]",
                    aggregate_list(aggregate_functions)
                ),
                format!("├── estimated rows: {:.2}", estimated_rows),
            ];
            attach_child(&mut lines, render_node(input));
            lines
        }
        PlanNode::Exchange { kind, input } => {
            let mut lines = vec![
                "Exchange".to_string(),
                format!("├── exchange type: {}", kind),
            ];
            attach_child(&mut lines, render_node(input));
            lines
        }
    }
}

/// Append a child block: `└──` on its first line, then one level of
/// indentation for the rest.
fn attach_child(lines: &mut Vec<String>, child: Vec<String>) {
    let mut child = child.into_iter();
    if let Some(first) = child.next() {
        lines.push(format!("└── {}", first));
        for line in child {
            lines.push(format!("    {}", line));
        }
    }
}

fn group_by_list(group_by: &[ColumnRef]) -> String {
    let names: Vec<&str> = group_by.iter().map(|c| c.name.as_str()).collect();
    names.join(", ")
}

fn aggregate_list(aggregate_functions: &[AggregateFunction]) -> String {
    let calls: Vec<String> = aggregate_functions.iter().map(|f| f.to_string()).collect();
    calls.join(", ")
}
