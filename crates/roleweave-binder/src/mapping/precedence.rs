//! Callin precedence
//!
//! Callins of different roles that intercept the same base method run in an
//! order fixed by `precedence` declarations of the team, its roles and its
//! super-teams. Callins of one role default to their declaration order.
//! Declarations that disagree are reported and never reconciled silently.

use std::rc::Rc;

use roleweave_descriptor::CallinKind;
use roleweave_diagnostics::id::{
    DUPLICATE_CALLIN_LABEL, INCOMPATIBLE_PRECEDENCE, PRECEDENCE_REQUIRED, UNKNOWN_PRECEDENCE_ELEMENT,
};
use roleweave_diagnostics::Span;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::binding::BindingOrigin;
use crate::decl::PrecedenceDecl;
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, MappingId, MethodId};

/// Callins intercepting one base method with one callin kind, in execution
/// order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPoint {
    base_method: MethodId,
    kind: CallinKind,
    order: Vec<MappingId>,
}

impl JoinPoint {
    /// Intercepted base method
    pub fn base_method(&self) -> MethodId {
        self.base_method
    }

    /// Callin kind shared by every binding here
    pub fn kind(&self) -> CallinKind {
        self.kind
    }

    /// Bindings, highest precedence first
    pub fn order(&self) -> &[MappingId] {
        &self.order
    }
}

/// Resolved precedence of a team
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceTable {
    team: BindingId,
    join_points: Vec<JoinPoint>,
}

impl PrecedenceTable {
    /// Team the table belongs to
    pub fn team(&self) -> BindingId {
        self.team
    }

    /// Join points in discovery order
    pub fn join_points(&self) -> &[JoinPoint] {
        &self.join_points
    }

    /// Order of the bindings of `kind` on `base_method`
    pub fn order_for(&self, base_method: MethodId, kind: CallinKind) -> Option<&[MappingId]> {
        self.join_points
            .iter()
            .find(|jp| jp.base_method == base_method && jp.kind == kind)
            .map(|jp| jp.order.as_slice())
    }
}

/// A callin taking part in a team's precedence
#[derive(Debug, Clone)]
struct Entry {
    mapping: MappingId,
    /// Simple name of the team's role the callin belongs to
    role: String,
    label: Option<String>,
    inherited: bool,
}

/// `high` runs before `low`
#[derive(Debug, Clone, Copy)]
struct Edge {
    high: MappingId,
    low: MappingId,
    after_only: bool,
    span: Span,
}

/// Precedence declaration together with the role it was declared in
struct Declared {
    decl: PrecedenceDecl,
    role: Option<String>,
    own: bool,
}

impl LookupEnvironment {
    /// Precedence of the callins of `team`
    pub fn precedence(&mut self, team: BindingId) -> Result<Rc<PrecedenceTable>, SessionAbort> {
        if let Some(table) = self.precedence.get(&team) {
            return Ok(table.clone());
        }
        let table = if self.binding(team).is_team() {
            debug!(binding = %self.binding(team).name, "resolving callin precedence");
            self.compute_precedence(team)?
        } else {
            PrecedenceTable {
                team,
                join_points: Vec::new(),
            }
        };
        let table = Rc::new(table);
        self.precedence.insert(team, table.clone());
        Ok(table)
    }

    fn compute_precedence(&mut self, team: BindingId) -> Result<PrecedenceTable, SessionAbort> {
        let entries = self.precedence_entries(team)?;
        self.check_duplicate_labels(&entries);

        let mut edges = Vec::new();
        for declared in self.precedence_decls(team)? {
            let elements: Vec<Vec<MappingId>> = declared
                .decl
                .elements
                .iter()
                .filter_map(|element| {
                    let found = resolve_element(&entries, element, declared.role.as_deref());
                    if found.is_none() && declared.own {
                        self.report_for(team, UNKNOWN_PRECEDENCE_ELEMENT, declared.decl.span, [element.clone()]);
                    }
                    found
                })
                .collect();
            let flat: Vec<MappingId> = elements.into_iter().flatten().collect();
            for (i, a) in flat.iter().enumerate() {
                for b in &flat[i + 1..] {
                    if a == b {
                        continue;
                    }
                    let (high, low) = if declared.decl.after { (*b, *a) } else { (*a, *b) };
                    edges.push(Edge {
                        high,
                        low,
                        after_only: declared.decl.after,
                        span: declared.decl.span,
                    });
                }
            }
        }

        let mut reported = FxHashSet::default();
        self.check_opposite_edges(team, &edges, false, &mut reported);
        self.check_opposite_edges(team, &edges, true, &mut reported);

        let mut join_points: Vec<JoinPoint> = Vec::new();
        for entry in &entries {
            let mapping = self.mapping(entry.mapping);
            let Some(kind) = mapping.kind.callin() else {
                continue;
            };
            for base in mapping.base_methods.clone() {
                match join_points
                    .iter_mut()
                    .find(|jp| jp.base_method == base && jp.kind == kind)
                {
                    Some(jp) => {
                        if !jp.order.contains(&entry.mapping) {
                            jp.order.push(entry.mapping);
                        }
                    }
                    None => join_points.push(JoinPoint {
                        base_method: base,
                        kind,
                        order: vec![entry.mapping],
                    }),
                }
            }
        }

        for jp in &mut join_points {
            jp.order = self.order_join_point(team, jp, &entries, &edges, &mut reported);
            trace!(base = jp.base_method.index(), bindings = jp.order.len(), "ordered join point");
        }

        Ok(PrecedenceTable { team, join_points })
    }

    /// Callins of the team's roles, with those of tsuper roles whose label
    /// the role does not redefine
    fn precedence_entries(&mut self, team: BindingId) -> Result<Vec<Entry>, SessionAbort> {
        let mut entries = Vec::new();
        let members = self.member_types(team)?;
        for role in members.iter().copied() {
            if !self.binding(role).is_role() {
                continue;
            }
            let simple = self.binding(role).simple_name.clone();
            let own = self.callins(role)?;
            let own_labels: Vec<Option<String>> = own.iter().map(|m| self.mapping(*m).label.clone()).collect();
            for mapping in own {
                entries.push(Entry {
                    mapping,
                    role: simple.clone(),
                    label: self.mapping(mapping).label.clone(),
                    inherited: false,
                });
            }
            for tsuper in self.tsuper_roles(role)?.iter().copied() {
                for mapping in self.callins(tsuper)? {
                    let label = self.mapping(mapping).label.clone();
                    let redefined = label.is_some() && own_labels.contains(&label);
                    let seen = entries
                        .iter()
                        .any(|e| e.role == simple && e.label.is_some() && e.label == label);
                    if redefined || seen {
                        continue;
                    }
                    entries.push(Entry {
                        mapping,
                        role: simple.clone(),
                        label,
                        inherited: true,
                    });
                }
            }
        }
        Ok(entries)
    }

    fn check_duplicate_labels(&mut self, entries: &[Entry]) {
        let mut seen: FxHashMap<(&str, &str), MappingId> = FxHashMap::default();
        for entry in entries.iter().filter(|e| !e.inherited) {
            let Some(label) = entry.label.as_deref() else {
                continue;
            };
            if seen.insert((entry.role.as_str(), label), entry.mapping).is_some() {
                let mapping = self.mapping(entry.mapping);
                let (role, span) = (mapping.role, mapping.span);
                self.report_for(role, DUPLICATE_CALLIN_LABEL, span, [format!("{}.{}", entry.role, label)]);
            }
        }
    }

    /// Precedence declarations of `team`, its roles and its super-teams,
    /// the team's own first
    fn precedence_decls(&mut self, team: BindingId) -> Result<Vec<Declared>, SessionAbort> {
        let mut found = Vec::new();
        let mut visited = FxHashSet::default();
        let mut current = Some(team);
        while let Some(t) = current {
            if !visited.insert(t) || !self.binding(t).is_team() {
                break;
            }
            let own = t == team;
            match self.binding(t).origin.clone() {
                BindingOrigin::Source { decl, .. } => {
                    found.extend(decl.precedences.iter().map(|p| Declared {
                        decl: p.clone(),
                        role: None,
                        own,
                    }));
                    for member in &decl.member_types {
                        found.extend(member.precedences.iter().map(|p| Declared {
                            decl: p.clone(),
                            role: Some(member.name.clone()),
                            own,
                        }));
                    }
                }
                BindingOrigin::Binary(desc) => {
                    if let Some(attrs) = desc.extension.attributes() {
                        found.extend(attrs.precedences.iter().map(|p| Declared {
                            decl: PrecedenceDecl {
                                after: p.after,
                                elements: p.labels.clone(),
                                span: Span::none(),
                            },
                            role: None,
                            own,
                        }));
                    }
                }
                BindingOrigin::Problem(_) => {}
            }
            current = self.superclass(t)?.and_then(|s| self.binding_of_type(s));
        }
        Ok(found)
    }

    fn check_opposite_edges(
        &mut self,
        team: BindingId,
        edges: &[Edge],
        with_after: bool,
        reported: &mut FxHashSet<(MappingId, MappingId)>,
    ) {
        let active: Vec<&Edge> = edges.iter().filter(|e| with_after || !e.after_only).collect();
        let pairs: FxHashSet<(MappingId, MappingId)> = active.iter().map(|e| (e.high, e.low)).collect();
        for edge in active {
            if !pairs.contains(&(edge.low, edge.high)) {
                continue;
            }
            let key = ordered_pair(edge.high, edge.low);
            if reported.insert(key) {
                let shown = [self.mapping_display(key.0), self.mapping_display(key.1)];
                self.report_for(team, INCOMPATIBLE_PRECEDENCE, edge.span, shown);
            }
        }
    }

    fn order_join_point(
        &mut self,
        team: BindingId,
        jp: &JoinPoint,
        entries: &[Entry],
        edges: &[Edge],
        reported: &mut FxHashSet<(MappingId, MappingId)>,
    ) -> Vec<MappingId> {
        let members = &jp.order;
        let n = members.len();
        let position = |m: MappingId| members.iter().position(|x| *x == m);
        let mut succ = vec![FxHashSet::<usize>::default(); n];
        let with_after = jp.kind == CallinKind::After;
        for edge in edges.iter().filter(|e| with_after || !e.after_only) {
            if let (Some(h), Some(l)) = (position(edge.high), position(edge.low)) {
                succ[h].insert(l);
            }
        }
        let role_of = |m: MappingId| entries.iter().find(|e| e.mapping == m).map(|e| e.role.as_str());

        // same-role defaults first, then every pair still unordered spans two roles
        let mut reach = closure(&succ);
        for i in 0..n {
            for j in i + 1..n {
                let unordered = !reach[i].contains(&j) && !reach[j].contains(&i);
                if unordered && role_of(members[i]) == role_of(members[j]) {
                    add_edge(&mut succ, &mut reach, i, j);
                }
            }
        }
        for i in 0..n {
            for j in i + 1..n {
                if reach[i].contains(&j) || reach[j].contains(&i) {
                    continue;
                }
                let base = self.method_display(jp.base_method);
                let a = self.mapping_display(members[i]);
                let b = self.mapping_display(members[j]);
                let span = self.mapping(members[j]).span;
                self.report_for(team, PRECEDENCE_REQUIRED, span, [base, a, b]);
            }
        }

        // Kahn, breaking ties by discovery order
        let mut indegree = vec![0usize; n];
        for targets in &succ {
            for t in targets {
                indegree[*t] += 1;
            }
        }
        let mut done = vec![false; n];
        let mut order = Vec::with_capacity(n);
        while let Some(next) = (0..n).find(|i| !done[*i] && indegree[*i] == 0) {
            done[next] = true;
            order.push(members[next]);
            for t in &succ[next] {
                indegree[*t] -= 1;
            }
        }
        let leftover: Vec<usize> = (0..n).filter(|i| !done[*i]).collect();
        if let (Some(first), Some(last)) = (leftover.first(), leftover.last()) {
            let key = ordered_pair(members[*first], members[*last]);
            let already = leftover.iter().any(|a| {
                leftover
                    .iter()
                    .any(|b| reported.contains(&ordered_pair(members[*a], members[*b])))
            });
            if !already && reported.insert(key) {
                let shown = [self.mapping_display(key.0), self.mapping_display(key.1)];
                let span = self.mapping(members[*first]).span;
                self.report_for(team, INCOMPATIBLE_PRECEDENCE, span, shown);
            }
            order.extend(leftover.iter().map(|i| members[*i]));
        }
        order
    }

    /// `Role.label` of a callin, or `Role.roleMethod` when it has no label
    pub fn mapping_display(&self, id: MappingId) -> String {
        let mapping = self.mapping(id);
        let role = &self.binding(mapping.role).simple_name;
        match (&mapping.label, mapping.role_method) {
            (Some(label), _) => format!("{}.{}", role, label),
            (None, Some(m)) => format!("{}.{}", role, self.method(m).name),
            (None, None) => role.clone(),
        }
    }
}

/// Callins a precedence element stands for
fn resolve_element(entries: &[Entry], element: &str, scope: Option<&str>) -> Option<Vec<MappingId>> {
    let matching = |role: Option<&str>, label: &str| -> Vec<MappingId> {
        entries
            .iter()
            .filter(|e| role.map_or(true, |r| e.role == r) && e.label.as_deref() == Some(label))
            .map(|e| e.mapping)
            .collect()
    };
    let found = match element.rsplit_once('.') {
        Some((role, label)) => matching(Some(role), label),
        None => {
            let scoped = scope.map(|r| matching(Some(r), element)).unwrap_or_default();
            if !scoped.is_empty() {
                scoped
            } else {
                let labelled = matching(None, element);
                if !labelled.is_empty() {
                    labelled
                } else {
                    entries
                        .iter()
                        .filter(|e| e.role == element)
                        .map(|e| e.mapping)
                        .collect()
                }
            }
        }
    };
    (!found.is_empty()).then_some(found)
}

fn ordered_pair(a: MappingId, b: MappingId) -> (MappingId, MappingId) {
    if a.index() <= b.index() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Insert `from -> to` and extend the reachability of every node that
/// reaches `from`
fn add_edge(succ: &mut [FxHashSet<usize>], reach: &mut [FxHashSet<usize>], from: usize, to: usize) {
    succ[from].insert(to);
    let mut gained = reach[to].clone();
    gained.insert(to);
    for node in 0..reach.len() {
        if node == from || reach[node].contains(&from) {
            reach[node].extend(gained.iter().copied());
        }
    }
}

/// Transitive successors of every node
fn closure(succ: &[FxHashSet<usize>]) -> Vec<FxHashSet<usize>> {
    (0..succ.len())
        .map(|start| {
            let mut seen = FxHashSet::default();
            let mut stack: Vec<usize> = succ[start].iter().copied().collect();
            while let Some(node) = stack.pop() {
                if seen.insert(node) {
                    stack.extend(succ[node].iter().copied());
                }
            }
            seen
        })
        .collect()
}
