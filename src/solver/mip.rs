//! A thin, solver-agnostic façade over [good_lp] for the binary-program
//! formulations used by [super::exact] and [super::hybrid].
//!
//! Both solvers follow the same shape: declare one binary variable per
//! candidate (ordering or crossing), add linear constraints over them,
//! minimize a linear objective, then read back which variables came out at
//! 1. This module gives that shape a name so the two solvers don't each
//! re-derive the [good_lp] builder calls.

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use good_lp::{
    constraint::Constraint, variable, Expression, ProblemVariables, Solution, SolverModel,
    Variable,
};
use thiserror::Error;

use crate::graph::Edge;

/// A binary program under construction: variables are declared up front via
/// [MipModel::add_binary], referred to afterwards by the string key they
/// were declared with.
pub struct MipModel {
    vars: ProblemVariables,
    handles: HashMap<String, Variable>,
    constraints: Vec<Constraint>,
}

/// Outcome of [MipModel::minimize].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipStatus {
    Optimal,
    TimeLimitReached,
    Infeasible,
}

#[derive(Error, Debug)]
pub enum MipError {
    #[error("solver reported infeasible")]
    Infeasible,
    #[error("solve did not complete within the time limit")]
    TimeLimitExceeded,
    #[error("underlying solver error: {0}")]
    Solver(String),
}

/// A solved [MipModel]: which binary variables ended up at 1, plus status.
pub struct MipSolution {
    values: HashMap<String, f64>,
    pub status: MipStatus,
}

impl MipSolution {
    /// Whether the named binary variable is set (using the conventional
    /// `> 0.5` threshold for a relaxed/near-binary LP solution).
    pub fn is_set(&self, key: &str) -> bool {
        self.values.get(key).copied().unwrap_or(0.0) > 0.5
    }
}

impl Default for MipModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MipModel {
    pub fn new() -> Self {
        MipModel {
            vars: ProblemVariables::new(),
            handles: HashMap::new(),
            constraints: Vec::new(),
        }
    }

    /// Declare a binary variable under `key`, returning its [Variable]
    /// handle for use in constraint/objective expressions.
    pub fn add_binary(&mut self, key: impl Into<String>) -> Variable {
        let v = self.vars.add(variable().binary());
        self.handles.insert(key.into(), v);
        v
    }

    pub fn var(&self, key: &str) -> Variable {
        self.handles[key]
    }

    pub fn add_constraint(&mut self, c: Constraint) {
        self.constraints.push(c);
    }

    /// Minimize `objective`, respecting `time_limit` if given.
    ///
    /// [good_lp]'s `microlp` backend has no native time-limit parameter, so
    /// the solve runs on a background thread and the limit is enforced by
    /// [mpsc::Receiver::recv_timeout]. A timeout with no [good_lp] cancel
    /// hook can't recover a partial incumbent, so it surfaces as
    /// [MipError::TimeLimitExceeded] rather than [MipStatus::TimeLimitReached]
    /// with a usable solution — callers that can tolerate a worse-but-usable
    /// answer on timeout should size `time_limit` generously or fall back to
    /// the heuristic solver instead.
    pub fn minimize(
        self,
        objective: Expression,
        time_limit: Option<Duration>,
    ) -> Result<MipSolution, MipError> {
        let MipModel {
            vars,
            handles,
            constraints,
        } = self;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut model = vars.minimise(objective).using(good_lp::microlp);
            for c in constraints {
                model = model.with(c);
            }
            let result = model
                .solve()
                .map(|solution| {
                    handles
                        .iter()
                        .map(|(k, v)| (k.clone(), solution.value(*v)))
                        .collect::<HashMap<_, _>>()
                })
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
        });

        let result = match time_limit {
            Some(limit) => rx
                .recv_timeout(limit)
                .map_err(|_| MipError::TimeLimitExceeded)?,
            None => rx.recv().map_err(|e| MipError::Solver(e.to_string()))?,
        };

        let values = result.map_err(|e| {
            if e.to_lowercase().contains("infeasible") {
                MipError::Infeasible
            } else {
                MipError::Solver(e)
            }
        })?;

        Ok(MipSolution {
            values,
            status: MipStatus::Optimal,
        })
    }
}

/// The eight order-variable inequalities that force `crossing` to 1 whenever
/// edges `(a,b)` and `(c,d)` interleave under the solved order, one for each
/// of the eight ways two disjoint pairs can interleave. Shared by
/// [super::exact] (over the whole node set) and [super::hybrid] (over one
/// cluster's leaves).
///
/// No-op if `e1` and `e2` share an endpoint (they can never cross).
pub(crate) fn add_crossing_constraints(
    model: &mut MipModel,
    order_key: &impl Fn(&str, &str) -> String,
    crossing: Variable,
    e1: &Edge,
    e2: &Edge,
) {
    let a = e1.source.as_str();
    let b = e1.target.as_str();
    let c = e2.source.as_str();
    let d = e2.target.as_str();

    if a == c || a == d || b == c || b == d {
        return;
    }

    let x = |u: &str, v: &str| model.var(&order_key(u, v));

    model.add_constraint((x(a, c) + x(c, b) + x(b, d)).leq(crossing + 2.0));
    model.add_constraint((x(b, c) + x(c, a) + x(a, d)).leq(crossing + 2.0));
    model.add_constraint((x(a, d) + x(d, b) + x(b, c)).leq(crossing + 2.0));
    model.add_constraint((x(b, d) + x(d, a) + x(a, c)).leq(crossing + 2.0));
    model.add_constraint((x(c, a) + x(a, d) + x(d, b)).leq(crossing + 2.0));
    model.add_constraint((x(c, b) + x(b, d) + x(d, a)).leq(crossing + 2.0));
    model.add_constraint((x(d, a) + x(a, c) + x(c, b)).leq(crossing + 2.0));
    model.add_constraint((x(d, b) + x(b, c) + x(c, a)).leq(crossing + 2.0));
}

/// Decode a solved tournament (`order_key(u, v)` set iff `u` precedes `v`)
/// into a total order over `ids`, via topological sort. `None` if the
/// solved x-values contain a cycle (shouldn't happen: the transitivity
/// constraints force acyclicity, but a time-limited incumbent can be
/// fractional/inconsistent).
pub(crate) fn decode_tournament(
    ids: &[String],
    solution: &MipSolution,
    order_key: &impl Fn(&str, &str) -> String,
) -> Option<Vec<String>> {
    use itertools::Itertools;
    use std::collections::HashMap;

    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = ids.iter().map(|n| (n.as_str(), 0)).collect();
    for pair in ids.iter().combinations(2) {
        let (u, v) = (pair[0], pair[1]);
        if solution.is_set(&order_key(u, v)) {
            successors.entry(u).or_default().push(v);
            *in_degree.get_mut(v.as_str()).unwrap() += 1;
        } else {
            successors.entry(v).or_default().push(u);
            *in_degree.get_mut(u.as_str()).unwrap() += 1;
        }
    }

    let mut queue: Vec<&str> = ids
        .iter()
        .map(String::as_str)
        .filter(|n| in_degree[n] == 0)
        .collect();
    queue.sort();

    let mut order = Vec::with_capacity(ids.len());
    let mut i = 0;
    while i < queue.len() {
        let u = queue[i];
        i += 1;
        order.push(u.to_string());
        if let Some(succs) = successors.get(u) {
            let mut newly_free = Vec::new();
            for &v in succs {
                let d = in_degree.get_mut(v).unwrap();
                *d -= 1;
                if *d == 0 {
                    newly_free.push(v);
                }
            }
            newly_free.sort();
            queue.extend(newly_free);
        }
    }

    if order.len() == ids.len() {
        Some(order)
    } else {
        None
    }
}
