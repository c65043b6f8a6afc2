//! Base-call flow analysis
//!
//! A callin method is expected to call its base method exactly once on
//! every path that completes normally. The analysis runs over the body's
//! control-flow skeleton and tracks, per program point, which base-call
//! counts (none, one, several) are possible. Paths ending in `throw` do not
//! count. A `catch` handler is entered with any count seen inside its `try`
//! body, and a `finally` block runs on every exit of its `try`.

use roleweave_diagnostics::id::{
    DEFINITELY_DUPLICATE_BASE_CALL, DEFINITELY_MISSING_BASE_CALL, POTENTIALLY_DUPLICATE_BASE_CALL,
    POTENTIALLY_MISSING_BASE_CALL,
};
use roleweave_diagnostics::ProblemId;

use crate::binding::MethodOrigin;
use crate::decl::FlowNode;
use crate::environment::LookupEnvironment;
use crate::ids::MethodId;

/// Set of possible base-call counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts(u8);

impl CallCounts {
    /// No path
    pub const EMPTY: CallCounts = CallCounts(0);
    /// Base was not called
    pub const ZERO: CallCounts = CallCounts(1);
    /// Base was called once
    pub const ONE: CallCounts = CallCounts(2);
    /// Base was called more than once
    pub const MANY: CallCounts = CallCounts(4);

    /// Whether every count in `other` is possible here
    pub fn contains(self, other: CallCounts) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no path reaches this point
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn union(self, other: CallCounts) -> CallCounts {
        CallCounts(self.0 | other.0)
    }

    /// Counts after one more base call
    fn called(self) -> CallCounts {
        let mut next = CallCounts::EMPTY;
        if self.contains(CallCounts::ZERO) {
            next = next.union(CallCounts::ONE);
        }
        if self.intersects(CallCounts::ONE.union(CallCounts::MANY)) {
            next = next.union(CallCounts::MANY);
        }
        next
    }

    fn intersects(self, other: CallCounts) -> bool {
        self.0 & other.0 != 0
    }
}

/// Counts on the exits of a flow node, plus every count seen inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Exits {
    fallthrough: CallCounts,
    returned: CallCounts,
    thrown: CallCounts,
    broken: CallCounts,
    continued: CallCounts,
    reachable: CallCounts,
}

/// Ways of leaving a node
#[derive(Debug, Clone, Copy)]
enum Exit {
    Fallthrough,
    Returned,
    Thrown,
    Broken,
    Continued,
}

impl Exit {
    const ALL: [Exit; 5] = [
        Exit::Fallthrough,
        Exit::Returned,
        Exit::Thrown,
        Exit::Broken,
        Exit::Continued,
    ];
}

impl Exits {
    fn only(exit: Exit, counts: CallCounts) -> Exits {
        let mut exits = Exits {
            reachable: counts,
            ..Exits::default()
        };
        *exits.slot(exit) = counts;
        exits
    }

    fn slot(&mut self, exit: Exit) -> &mut CallCounts {
        match exit {
            Exit::Fallthrough => &mut self.fallthrough,
            Exit::Returned => &mut self.returned,
            Exit::Thrown => &mut self.thrown,
            Exit::Broken => &mut self.broken,
            Exit::Continued => &mut self.continued,
        }
    }

    fn at(mut self, exit: Exit) -> CallCounts {
        *self.slot(exit)
    }

    fn join(self, other: Exits) -> Exits {
        Exits {
            fallthrough: self.fallthrough.union(other.fallthrough),
            returned: self.returned.union(other.returned),
            thrown: self.thrown.union(other.thrown),
            broken: self.broken.union(other.broken),
            continued: self.continued.union(other.continued),
            reachable: self.reachable.union(other.reachable),
        }
    }
}

fn analyze(node: &FlowNode, incoming: CallCounts) -> Exits {
    match node {
        FlowNode::Stmt => Exits::only(Exit::Fallthrough, incoming),
        FlowNode::BaseCall => {
            let after = incoming.called();
            Exits {
                reachable: incoming.union(after),
                ..Exits::only(Exit::Fallthrough, after)
            }
        }
        FlowNode::Return => Exits::only(Exit::Returned, incoming),
        FlowNode::Throw => Exits::only(Exit::Thrown, incoming),
        FlowNode::Break => Exits::only(Exit::Broken, incoming),
        FlowNode::Continue => Exits::only(Exit::Continued, incoming),
        FlowNode::Seq(nodes) => {
            let mut exits = Exits::only(Exit::Fallthrough, incoming);
            for node in nodes {
                if exits.fallthrough.is_empty() {
                    break;
                }
                let inner = analyze(node, exits.fallthrough);
                exits.fallthrough = CallCounts::EMPTY;
                exits = exits.join(inner);
            }
            exits
        }
        FlowNode::Branch(alternatives) if alternatives.is_empty() => {
            Exits::only(Exit::Fallthrough, incoming)
        }
        FlowNode::Branch(alternatives) => alternatives
            .iter()
            .map(|alt| analyze(alt, incoming))
            .fold(Exits::default(), Exits::join),
        FlowNode::Loop(body) => {
            // the lattice has three bits, so this settles within three rounds
            let mut state = incoming;
            let mut rounds = Exits::default();
            loop {
                let round = analyze(body, state);
                rounds = rounds.join(round);
                let next = state.union(round.fallthrough).union(round.continued);
                if next == state {
                    break;
                }
                state = next;
            }
            Exits {
                fallthrough: state.union(rounds.broken),
                returned: rounds.returned,
                thrown: rounds.thrown,
                broken: CallCounts::EMPTY,
                continued: CallCounts::EMPTY,
                reachable: rounds.reachable.union(incoming),
            }
        }
        FlowNode::Try {
            body,
            catches,
            finally,
        } => {
            let protected = analyze(body, incoming);
            // a handler may be entered from any point of the protected body;
            // exceptions it does not match keep propagating
            let entry = protected.reachable;
            let handled = catches
                .iter()
                .map(|handler| analyze(handler, entry))
                .fold(protected, Exits::join);
            match finally {
                Some(finally) => through_finally(finally, handled),
                None => handled,
            }
        }
    }
}

/// Run `finally` on every pending exit; completing normally resumes that exit
fn through_finally(finally: &FlowNode, pending: Exits) -> Exits {
    let mut out = Exits {
        reachable: pending.reachable,
        ..Exits::default()
    };
    for exit in Exit::ALL {
        let counts = pending.at(exit);
        if counts.is_empty() {
            continue;
        }
        let mut ran = analyze(finally, counts);
        let resumed = ran.fallthrough;
        ran.fallthrough = CallCounts::EMPTY;
        out = out.join(ran);
        let slot = out.slot(exit);
        *slot = slot.union(resumed);
    }
    out
}

/// Base-call counts on the normally completing paths through `body`
pub fn base_call_counts(body: &FlowNode) -> CallCounts {
    let exits = analyze(body, CallCounts::ZERO);
    exits.fallthrough.union(exits.returned)
}

/// Problems the base-call counts of a callin body call for
pub fn base_call_problems(counts: CallCounts) -> Vec<ProblemId> {
    let mut problems = Vec::new();
    if counts.is_empty() {
        return problems;
    }
    if counts == CallCounts::ZERO {
        problems.push(DEFINITELY_MISSING_BASE_CALL);
    } else if counts.contains(CallCounts::ZERO) {
        problems.push(POTENTIALLY_MISSING_BASE_CALL);
    }
    if counts == CallCounts::MANY {
        problems.push(DEFINITELY_DUPLICATE_BASE_CALL);
    } else if counts.contains(CallCounts::MANY) {
        problems.push(POTENTIALLY_DUPLICATE_BASE_CALL);
    }
    problems
}

impl LookupEnvironment {
    /// Check the base calls of a callin method declared in source
    pub fn check_base_calls(&mut self, method: MethodId) {
        let m = self.method(method);
        if !m.is_callin() {
            return;
        }
        let MethodOrigin::Source(decl) = &m.origin else {
            return;
        };
        let Some(body) = &decl.body_flow else {
            return;
        };
        let problems = base_call_problems(base_call_counts(body));
        let declaring = m.declaring;
        let span = m.span;
        let shown = self.method_display(method);
        for problem in problems {
            self.report_for(declaring, problem, span, [shown.clone()]);
        }
    }
}
