// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path Resolver: expands a path expression's wildcards,
//! boolean filters, ordered filters and reference segments against live
//! instance state into the set of concrete paths it denotes.

use uspa_core::path::{FilterClause, FilterOp, PathExpr, Segment};
use uspa_core::UspError;
use uspa_storage::MaterializedState;

/// Resolve `expr` against `state`, returning every concrete path it denotes,
/// sorted in natural numeric order of instance numbers. An empty result for
/// a wildcard/filter segment whose owning table has no instances is not an
/// error — it is an empty match set.
pub fn resolve(expr: &PathExpr, state: &MaterializedState) -> Result<Vec<String>, UspError> {
    let mut out = Vec::new();
    let mut acc = Vec::new();
    expand(&expr.segments, 0, &mut acc, state, &mut out)?;
    out.sort_by(|a, b| a.iter().map(segment_key).cmp(b.iter().map(segment_key)));
    out.dedup();
    let paths = out
        .into_iter()
        .map(|segs| {
            let mut s = segs.join(".");
            if expr.trailing_dot {
                s.push('.');
            }
            s
        })
        .collect();
    Ok(paths)
}

/// Orders path segments in natural numeric order for instance numbers
/// (`"2"` before `"10"`) rather than lexical string order, matching the
/// agent's own instance-number ordering instead of a byte-wise comparison.
fn segment_key(segment: &String) -> (bool, u32, &str) {
    match segment.parse::<u32>() {
        Ok(n) => (false, n, segment.as_str()),
        Err(_) => (true, 0, segment.as_str()),
    }
}

fn expand(
    segments: &[Segment],
    idx: usize,
    acc: &mut Vec<String>,
    state: &MaterializedState,
    out: &mut Vec<Vec<String>>,
) -> Result<(), UspError> {
    if idx == segments.len() {
        out.push(acc.clone());
        return Ok(());
    }
    match &segments[idx] {
        Segment::Name(name) => {
            acc.push(name.clone());
            expand(segments, idx + 1, acc, state, out)?;
            acc.pop();
        }
        Segment::Instance(i) => {
            acc.push(i.to_string());
            expand(segments, idx + 1, acc, state, out)?;
            acc.pop();
        }
        Segment::Wildcard => {
            let table_path = format!("{}.", acc.join("."));
            for instance in state.instances_of(&table_path) {
                acc.push(instance.to_string());
                expand(segments, idx + 1, acc, state, out)?;
                acc.pop();
            }
        }
        Segment::Filter { expr, ordered } => {
            let table_path = format!("{}.", acc.join("."));
            let mut instances: Vec<u32> = state
                .instances_of(&table_path)
                .iter()
                .copied()
                .filter(|instance| {
                    let instance_prefix = format!("{table_path}{instance}.");
                    expr.clauses.iter().all(|clause| match_clause(state, &instance_prefix, clause))
                })
                .collect();
            if *ordered {
                instances.sort_unstable();
            }
            for instance in instances {
                acc.push(instance.to_string());
                expand(segments, idx + 1, acc, state, out)?;
                acc.pop();
            }
        }
        Segment::Reference(name) => {
            let ref_path = format!("{}.{name}", acc.join("."));
            let target = state
                .param(&ref_path)
                .ok_or_else(|| UspError::ResolveTargetNotFound(ref_path.clone()))?;
            let trimmed = target.trim_end_matches('.');
            if trimmed.is_empty() {
                return Err(UspError::ResolveTargetNotFound(ref_path));
            }
            let pushed: Vec<&str> = trimmed.split('.').collect();
            for seg in &pushed {
                acc.push((*seg).to_string());
            }
            expand(segments, idx + 1, acc, state, out)?;
            for _ in &pushed {
                acc.pop();
            }
        }
    }
    Ok(())
}

fn match_clause(state: &MaterializedState, instance_prefix: &str, clause: &FilterClause) -> bool {
    let full_path = format!("{instance_prefix}{}", clause.name);
    let Some(value) = state.param(&full_path) else {
        return false;
    };
    match clause.op {
        FilterOp::Eq => value == clause.literal,
        FilterOp::Ne => value != clause.literal,
        FilterOp::Gt | FilterOp::Lt | FilterOp::Ge | FilterOp::Le => {
            match (value.parse::<f64>(), clause.literal.parse::<f64>()) {
                (Ok(a), Ok(b)) => match clause.op {
                    FilterOp::Gt => a > b,
                    FilterOp::Lt => a < b,
                    FilterOp::Ge => a >= b,
                    FilterOp::Le => a <= b,
                    FilterOp::Eq | FilterOp::Ne => unreachable!(),
                },
                _ => false,
            }
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
