//! End-to-end scheduling of small operator pipelines.

use sigsim_core::{BaseSignal, SignalTable, View};
use sigsim_ops::{Direct, NamedOp, Operator};
use sigsim_sched::{build_schedule, AliasPolicy, ScheduleError};

struct Signals {
    table: SignalTable,
    u: View,
    w: View,
    x: View,
    y: View,
    out: View,
}

fn signals() -> Signals {
    let mut table = SignalTable::new();
    let u = table.add(BaseSignal::from_values("u", vec![1.0, -1.0])).unwrap();
    let w = table
        .add(BaseSignal::from_values("w", vec![0.5, 0.0, 0.0, 0.5]))
        .unwrap();
    let x = table.add(BaseSignal::zeros("x", 2)).unwrap();
    let y = table.add(BaseSignal::zeros("y", 2)).unwrap();
    let out = table.add(BaseSignal::zeros("out", 2)).unwrap();
    Signals {
        u: table.whole(u).unwrap(),
        w: table.make_contiguous_view(w, &[2, 2], 0).unwrap(),
        x: table.whole(x).unwrap(),
        y: table.whole(y).unwrap(),
        out: table.whole(out).unwrap(),
        table,
    }
}

fn relu(output: View, input: View) -> Operator {
    Operator::nonlin(output, input, Direct::elementwise("relu", |v| v.max(0.0)), 0.001).unwrap()
}

fn names<'a>(ops: &'a [NamedOp], order: &[usize]) -> Vec<&'a str> {
    order.iter().map(|&i| ops[i].name.as_str()).collect()
}

#[test]
fn feedforward_chain_sorts_regardless_of_insertion() {
    let s = signals();
    let ops = vec![
        NamedOp::new("probe-copy", Operator::copy(s.out.clone(), s.y.clone()).unwrap()),
        NamedOp::new("relu", relu(s.y.clone(), s.x.clone())),
        NamedOp::new(
            "encode",
            Operator::dot_inc(s.w.clone(), s.u.clone(), s.x.clone(), false).unwrap(),
        ),
        NamedOp::new("clear-x", Operator::reset(s.x.clone(), 0.0)),
    ];
    let schedule = build_schedule(&ops, &s.table, AliasPolicy::Conservative).unwrap();
    assert_eq!(
        names(&ops, schedule.order()),
        vec!["clear-x", "encode", "relu", "probe-copy"]
    );

    let dot = schedule.graph().to_dot();
    assert!(dot.contains("op3 [label=\"clear-x\"];"));
    assert!(dot.contains("op3 -> op2;"));
    assert!(dot.contains("op2 -> op1;"));
    assert!(dot.contains("op1 -> op0;"));
}

#[test]
fn same_tick_feedback_is_a_cycle() {
    let s = signals();
    // x feeds y through relu, and y feeds back into x within the same tick.
    let ops = vec![
        NamedOp::new("clear-x", Operator::reset(s.x.clone(), 0.0)),
        NamedOp::new("relu", relu(s.y.clone(), s.x.clone())),
        NamedOp::new(
            "feedback",
            Operator::dot_inc(s.w.clone(), s.y.clone(), s.x.clone(), false).unwrap(),
        ),
    ];
    let err = build_schedule(&ops, &s.table, AliasPolicy::Conservative).unwrap_err();
    assert_eq!(
        err,
        ScheduleError::CyclicDependency {
            operators: vec!["relu".into(), "feedback".into()],
        }
    );
    assert!(err.to_string().contains("relu, feedback"));
}

#[test]
fn delayed_feedback_through_a_copy_schedules() {
    let s = signals();
    // Feedback reads `out`, which no operator in this tick writes.
    let ops = vec![
        NamedOp::new("clear-x", Operator::reset(s.x.clone(), 0.0)),
        NamedOp::new(
            "feedback",
            Operator::dot_inc(s.w.clone(), s.out.clone(), s.x.clone(), false).unwrap(),
        ),
        NamedOp::new("relu", relu(s.y.clone(), s.x.clone())),
    ];
    let schedule = build_schedule(&ops, &s.table, AliasPolicy::Strict).unwrap();
    assert_eq!(
        names(&ops, schedule.order()),
        vec!["clear-x", "feedback", "relu"]
    );
    assert_eq!(schedule.graph().edge_count(), 3);
}
