//! Role indexing, edge derivation, and the linear operator order.

use indexmap::IndexMap;
use sigsim_core::{BaseId, SignalTable, View};
use sigsim_ops::NamedOp;
use smallvec::SmallVec;
use tracing::debug;

use crate::alias::{overlap, AliasPolicy, Overlap};
use crate::error::ScheduleError;
use crate::graph::DependencyGraph;

/// Operators touching one distinct view, grouped by role.
#[derive(Debug, Default)]
struct RoleEntry {
    sets: SmallVec<[usize; 1]>,
    incs: SmallVec<[usize; 2]>,
    reads: SmallVec<[usize; 2]>,
}

impl RoleEntry {
    fn writers(&self) -> impl Iterator<Item = usize> + '_ {
        self.sets.iter().chain(self.incs.iter()).copied()
    }

    /// Whether pairing this entry with `other` could produce an edge.
    fn orders_against(&self, other: &RoleEntry) -> bool {
        let writes = |e: &RoleEntry| !e.sets.is_empty() || !e.incs.is_empty();
        (!self.sets.is_empty() && !other.incs.is_empty())
            || (!other.sets.is_empty() && !self.incs.is_empty())
            || (writes(self) && !other.reads.is_empty())
            || (writes(other) && !self.reads.is_empty())
    }
}

/// The execution order of a model, computed once at build time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Schedule {
    order: Vec<usize>,
    graph: DependencyGraph,
}

impl Schedule {
    /// Operator indices in execution order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// The dependency graph the order was sorted from.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Number of scheduled operators.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the schedule is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position of an operator within the order.
    pub fn position(&self, op: usize) -> Option<usize> {
        self.order.iter().position(|&o| o == op)
    }
}

/// Derive the execution order for `ops`.
///
/// Steps:
///
/// 1. Index operators by role on every distinct view.
/// 2. Reject views with more than one setter.
/// 3. For each base, compare every pair of its views (including a view with
///    itself). Aliased pairs contribute `set → inc` and
///    `(set ∪ inc) → read` edges; aliased setters from different
///    operators are rejected like two setters of one view.
/// 4. Topologically sort, breaking ties by insertion order.
///
/// `table` is only used to name views in errors.
pub fn build_schedule(
    ops: &[NamedOp],
    table: &SignalTable,
    policy: AliasPolicy,
) -> Result<Schedule, ScheduleError> {
    // 1. Role index
    let mut roles: IndexMap<&View, RoleEntry> = IndexMap::new();
    for (i, named) in ops.iter().enumerate() {
        let op_roles = named.op.roles();
        for view in op_roles.sets {
            roles.entry(view).or_default().sets.push(i);
        }
        for view in op_roles.incs {
            roles.entry(view).or_default().incs.push(i);
        }
        for view in op_roles.reads {
            roles.entry(view).or_default().reads.push(i);
        }
    }

    // 2. One setter per view
    for (view, entry) in &roles {
        if entry.sets.len() > 1 {
            return Err(ScheduleError::MultipleWriters {
                view: table.describe(view),
                writers: entry.sets.iter().map(|&i| ops[i].name.clone()).collect(),
            });
        }
    }

    // 3. Aliasing closure per base
    let entries: Vec<(&View, RoleEntry)> = roles.into_iter().collect();
    let mut by_base: IndexMap<BaseId, Vec<usize>> = IndexMap::new();
    for (index, (view, _)) in entries.iter().enumerate() {
        by_base.entry(view.base).or_default().push(index);
    }

    let mut graph = DependencyGraph::new(ops.iter().map(|o| o.name.clone()).collect());
    for (base, members) in &by_base {
        let mut aliased_pairs = 0usize;
        for (x, &i) in members.iter().enumerate() {
            for &j in &members[x..] {
                let (vi, ei) = &entries[i];
                let (vj, ej) = &entries[j];
                let relation = if i == j {
                    Overlap::Overlapping
                } else {
                    overlap(vi, vj)
                };
                match relation {
                    Overlap::Disjoint => continue,
                    Overlap::Overlapping => {}
                    Overlap::Unknown => {
                        let both_set = !ei.sets.is_empty() && !ej.sets.is_empty();
                        let strict_hit =
                            policy == AliasPolicy::Strict && ei.orders_against(ej);
                        if both_set || strict_hit {
                            let mut operators: Vec<usize> = ei
                                .sets
                                .iter()
                                .chain(&ei.incs)
                                .chain(&ei.reads)
                                .chain(&ej.sets)
                                .chain(&ej.incs)
                                .chain(&ej.reads)
                                .copied()
                                .collect();
                            operators.sort_unstable();
                            operators.dedup();
                            return Err(ScheduleError::UnsupportedAliasing {
                                first: table.describe(vi),
                                second: table.describe(vj),
                                operators: operators
                                    .into_iter()
                                    .map(|k| ops[k].name.clone())
                                    .collect(),
                            });
                        }
                    }
                }
                aliased_pairs += 1;

                if i != j {
                    if let (Some(&a), Some(&b)) = (ei.sets.first(), ej.sets.first()) {
                        if a != b {
                            return Err(ScheduleError::MultipleWriters {
                                view: format!(
                                    "{} (aliases {})",
                                    table.describe(vi),
                                    table.describe(vj)
                                ),
                                writers: vec![
                                    ops[a.min(b)].name.clone(),
                                    ops[a.max(b)].name.clone(),
                                ],
                            });
                        }
                    }
                }

                add_edges(&mut graph, ei, ej);
                if i != j {
                    add_edges(&mut graph, ej, ei);
                }
            }
        }
        debug!(
            base = %table.name_of(*base),
            views = members.len(),
            aliased_pairs,
            "aliasing analyzed"
        );
    }

    // 4. Topological order
    let order = graph
        .toposort()
        .map_err(|stuck| ScheduleError::CyclicDependency {
            operators: stuck.into_iter().map(|i| ops[i].name.clone()).collect(),
        })?;
    debug!(
        operators = order.len(),
        edges = graph.edge_count(),
        "schedule derived"
    );
    Ok(Schedule { order, graph })
}

/// Edges induced by `from`'s writers on `to`'s incrementers and readers.
fn add_edges(graph: &mut DependencyGraph, from: &RoleEntry, to: &RoleEntry) {
    for &setter in &from.sets {
        for &inc in &to.incs {
            graph.add_edge(setter, inc);
        }
    }
    for writer in from.writers() {
        for &reader in &to.reads {
            graph.add_edge(writer, reader);
        }
    }
}
