use std::time::Instant;

use im::OrdSet;
use tracing::{debug, trace};

use crate::{
    solver::{domain::Domain, stats::SearchStats},
    store::{Fact, FactIndex, NodeId, Pattern},
};

/// The index of a solver variable, in the caller-supplied search order.
pub type VarIndex = usize;

/// One position of a constraint triplet: either a concrete node or a
/// variable to be solved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    Node(NodeId),
    Var(VarIndex),
}

/// A constraint triplet. It is *ground* when all three positions are nodes,
/// *parametric* when at least one holds a variable.
pub type Constraint = [Term; 3];

/// The fact a ground constraint asserts, or `None` if it is parametric.
pub(crate) fn ground_fact(constraint: &Constraint) -> Option<Fact> {
    match constraint {
        [Term::Node(a), Term::Node(b), Term::Node(c)] => Some([*a, *b, *c]),
        _ => None,
    }
}

/// A depth-first backtracking enumerator of satisfying assignments.
///
/// Given a [`FactIndex`], a variable count, an ordered list of constraint
/// triplets, and a per-variable set of earlier peers it may equal, a `Solver`
/// lazily produces every assignment of nodes to variables under which each
/// constraint's substitution is a stored fact. Variables are solved strictly
/// in index order; any ordering heuristic runs before construction.
///
/// On entering a variable the solver intersects, over every constraint
/// mentioning it, the set of nodes some matching fact offers for it, then
/// strikes out nodes already taken by earlier variables it must differ from.
/// Constraints are kept in a working copy in which assigned variables have
/// been substituted, so each lookup pattern is read off directly.
///
/// The solver holds a shared borrow of the index for its whole lifetime;
/// facts cannot change mid-enumeration.
#[derive(Debug)]
pub struct Solver<'a> {
    index: &'a FactIndex,
    n_variables: usize,
    valid: bool,
    /// Parametric constraints in their original form.
    constraints: Vec<Constraint>,
    /// The same constraints with assigned variables replaced by their nodes.
    working: Vec<Constraint>,
    var_to_constraints: Vec<Vec<usize>>,
    may_equal: Vec<OrdSet<VarIndex>>,
    assignment: Vec<NodeId>,
    states: Vec<Domain>,
    /// The variable currently being assigned. Equal to `n_variables` exactly
    /// when a complete assignment is in hand.
    current: usize,
    stats: SearchStats,
}

impl<'a> Solver<'a> {
    /// Builds a solver over `index`.
    ///
    /// `constraints` may mix ground and parametric triplets. Ground ones are
    /// checked once: if any is not a fact the instance is unsatisfiable and
    /// [`is_valid`] reports `false`. A variable mentioned by no constraint
    /// gets an empty domain, which also renders the instance unsatisfiable.
    ///
    /// `may_equal[k]` lists the variables `j < k` that `k` is permitted to
    /// coincide with; every other earlier variable must take a different
    /// node. The relation is consulted on the later variable's side only, so
    /// symmetric intent must be supplied in this upper-triangular form.
    ///
    /// # Panics
    ///
    /// Panics if `n_variables` is zero, if a constraint mentions a variable
    /// index `>= n_variables`, if `may_equal` is not `n_variables` long, or
    /// if `may_equal[k]` contains an index `>= k`.
    ///
    /// [`is_valid`]: Solver::is_valid
    pub fn new(
        index: &'a FactIndex,
        n_variables: usize,
        constraints: &[Constraint],
        may_equal: Vec<OrdSet<VarIndex>>,
    ) -> Self {
        assert!(n_variables > 0, "solver needs at least one variable");
        assert_eq!(
            may_equal.len(),
            n_variables,
            "may_equal must have one entry per variable"
        );
        for (later, peers) in may_equal.iter().enumerate() {
            for &earlier in peers {
                assert!(
                    earlier < later,
                    "may_equal[{later}] names ?{earlier}, which does not precede it"
                );
            }
        }

        let mut valid = true;
        let mut parametric = Vec::new();
        let mut var_to_constraints = vec![Vec::new(); n_variables];
        for constraint in constraints {
            for term in constraint {
                if let Term::Node(node) = *term {
                    assert!(node > 0, "constraint names the reserved node id 0");
                }
            }
            match ground_fact(constraint) {
                Some(fact) => {
                    if !index.is_true(fact) {
                        valid = false;
                        break;
                    }
                }
                None => {
                    for term in constraint {
                        if let Term::Var(k) = *term {
                            assert!(
                                k < n_variables,
                                "constraint mentions ?{k} but only {n_variables} variable(s) exist"
                            );
                            var_to_constraints[k].push(parametric.len());
                        }
                    }
                    parametric.push(*constraint);
                }
            }
        }

        let mut solver = Solver {
            index,
            n_variables,
            valid,
            working: parametric.clone(),
            constraints: parametric,
            var_to_constraints,
            may_equal,
            assignment: vec![0; n_variables],
            states: vec![Domain::default(); n_variables],
            current: 0,
            stats: SearchStats::default(),
        };
        if solver.valid {
            solver.get_options();
        }
        solver
    }

    /// Whether the instance may still produce assignments.
    ///
    /// `false` after construction means a ground constraint failed; `false`
    /// later means enumeration is exhausted. Callers use it to tell an
    /// unsatisfiable instance apart from a drained one before pulling.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn n_variables(&self) -> usize {
        self.n_variables
    }

    /// Statistics gathered so far.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Produces the next satisfying assignment, or `None` when the instance
    /// is unsatisfiable or drained. Slot `k` of the result is the node
    /// assigned to variable `k`.
    pub fn next_assignment(&mut self) -> Option<Vec<NodeId>> {
        if !self.valid {
            return None;
        }
        loop {
            match self.states[self.current].next_candidate() {
                None => {
                    // Out of candidates here; retreat. Retreating past the
                    // root means the whole tree has been explored.
                    if !self.unassign() {
                        debug!("search space exhausted");
                        self.valid = false;
                        return None;
                    }
                }
                Some(candidate) => {
                    self.assign(candidate);
                    if self.current == self.n_variables {
                        let complete = self.assignment.clone();
                        self.stats.solutions += 1;
                        self.unassign();
                        return Some(complete);
                    }
                    self.get_options();
                }
            }
        }
    }

    /// Binds the current variable to `node`, substituting it into every
    /// working constraint that mentions the variable, and descends.
    fn assign(&mut self, node: NodeId) {
        self.assignment[self.current] = node;
        let var = Term::Var(self.current);
        for &i in &self.var_to_constraints[self.current] {
            for slot in self.working[i].iter_mut() {
                if *slot == var {
                    *slot = Term::Node(node);
                }
            }
        }
        self.stats.nodes_visited += 1;
        self.current += 1;
    }

    /// Retreats one level, restoring the variable's slots in the working
    /// constraints from the originals. Returns `false` when already at the
    /// root, i.e. the search is finished.
    fn unassign(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        self.stats.backtracks += 1;
        let var = Term::Var(self.current);
        for &i in &self.var_to_constraints[self.current] {
            let original = &self.constraints[i];
            for (slot, restored) in self.working[i].iter_mut().zip(original) {
                if *restored == var {
                    *slot = *restored;
                }
            }
        }
        true
    }

    /// Computes the candidate domain for the variable at the current level
    /// and freezes it behind a fresh cursor.
    fn get_options(&mut self) {
        let started = Instant::now();
        let level = self.current;
        let var = Term::Var(level);

        // Running intersection of each mentioning constraint's local options.
        // The first constraint seeds the set; a variable mentioned by no
        // constraint therefore ends up with an empty domain.
        let mut options: OrdSet<NodeId> = OrdSet::new();
        let mut initialized = false;
        for &ci in &self.var_to_constraints[level] {
            // Wildcard every position still holding a variable, remembering
            // which holes are pinned to *this* variable. A hole belonging to
            // a later variable matches anything.
            let mut slots = [None; 3];
            let mut hole_is_var = [false; 3];
            for (j, term) in self.working[ci].iter().enumerate() {
                match *term {
                    Term::Node(node) => slots[j] = Some(node),
                    Term::Var(_) => hole_is_var[j] = *term == var,
                }
            }

            let mut local: OrdSet<NodeId> = OrdSet::new();
            for fact in self.index.lookup(Pattern(slots)) {
                // All holes pinned to this variable must agree on one node.
                // On the first disagreement the fact is discarded outright.
                let mut choice = 0;
                for j in 0..3 {
                    if !hole_is_var[j] {
                        continue;
                    } else if choice == 0 {
                        choice = fact[j];
                    } else if choice != fact[j] {
                        choice = 0;
                        break;
                    }
                }
                if choice > 0 && (!initialized || options.contains(&choice)) {
                    local.insert(choice);
                }
            }
            options = local;
            initialized = true;
            if options.is_empty() {
                break;
            }
        }

        // Strike out nodes held by earlier variables this one must differ
        // from. Only the later variable's may-equal set is consulted.
        let mut prunings = 0;
        for earlier in 0..level {
            if !self.may_equal[level].contains(&earlier)
                && options.remove(&self.assignment[earlier]).is_some()
            {
                prunings += 1;
            }
        }

        let domain = Domain::freeze(options);
        trace!("variable ?{} has {} candidate(s)", level, domain.len());
        let variable_stats = self.stats.variable_stats.entry(level).or_default();
        variable_stats.domains_computed += 1;
        variable_stats.candidates += domain.len() as u64;
        variable_stats.inequality_prunings += prunings;
        variable_stats.time_spent_micros += started.elapsed().as_micros() as u64;
        self.states[level] = domain;
    }
}

impl Iterator for Solver<'_> {
    type Item = Vec<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_assignment()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use im::{ordset, OrdSet};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn index_of(facts: &[Fact]) -> FactIndex {
        let mut index = FactIndex::new();
        for &fact in facts {
            index.add(fact);
        }
        index
    }

    fn no_equalities(n: usize) -> Vec<OrdSet<VarIndex>> {
        vec![OrdSet::new(); n]
    }

    const V0: Term = Term::Var(0);
    const V1: Term = Term::Var(1);

    #[test]
    fn single_variable_shared_across_positions() {
        let index = index_of(&[[1, 1, 1]]);
        let mut solver = Solver::new(&index, 1, &[[V0, V0, V0]], no_equalities(1));

        assert!(solver.is_valid());
        assert_eq!(solver.next_assignment(), Some(vec![1]));
        assert_eq!(solver.next_assignment(), None);
        assert!(!solver.is_valid());
    }

    #[test]
    fn domains_intersect_across_constraints() {
        let index = index_of(&[[1, 2, 3], [1, 2, 4], [5, 2, 3]]);
        let constraints = [
            [V0, Term::Node(2), V1],
            [V0, Term::Node(2), Term::Node(3)],
        ];
        let solver = Solver::new(&index, 2, &constraints, no_equalities(2));

        let assignments: Vec<_> = solver.collect();
        assert_eq!(assignments, vec![vec![1, 3], vec![1, 4], vec![5, 3]]);
    }

    #[test]
    fn failed_ground_constraint_invalidates_the_instance() {
        let index = index_of(&[[1, 1, 1]]);
        let constraints = [
            [Term::Node(2), Term::Node(2), Term::Node(2)],
            [V0, V0, V0],
        ];
        let mut solver = Solver::new(&index, 1, &constraints, no_equalities(1));

        assert!(!solver.is_valid());
        assert_eq!(solver.next_assignment(), None);
    }

    #[test]
    fn satisfied_ground_constraints_are_dropped_from_the_search() {
        let index = index_of(&[[1, 1, 1], [2, 2, 2]]);
        let constraints = [[Term::Node(2), Term::Node(2), Term::Node(2)], [V0, V0, V0]];
        let solver = Solver::new(&index, 1, &constraints, no_equalities(1));

        let assignments: Vec<_> = solver.collect();
        assert_eq!(assignments, vec![vec![1], vec![2]]);
    }

    #[test]
    fn distinct_variables_must_take_distinct_nodes() {
        let index = index_of(&[[1, 2, 1], [1, 2, 2], [2, 2, 1]]);
        let solver = Solver::new(&index, 2, &[[V0, Term::Node(2), V1]], no_equalities(2));

        let assignments: Vec<_> = solver.collect();
        assert_eq!(assignments, vec![vec![1, 2], vec![2, 1]]);
    }

    #[test]
    fn repeated_holes_only_accept_agreeing_facts() {
        let index = index_of(&[[3, 3, 3], [3, 4, 3], [4, 4, 5]]);
        let solver = Solver::new(&index, 1, &[[V0, V0, V0]], no_equalities(1));

        let assignments: Vec<_> = solver.collect();
        assert_eq!(assignments, vec![vec![3]]);
    }

    #[test]
    fn may_equal_waives_the_inequality_filter() {
        let index = index_of(&[[1, 1, 1]]);
        let constraints = [[V0, V0, V0], [V1, V1, V1]];
        let solver = Solver::new(&index, 2, &constraints, vec![OrdSet::new(), ordset![0]]);

        let assignments: Vec<_> = solver.collect();
        assert_eq!(assignments, vec![vec![1, 1]]);
    }

    #[test]
    fn unmentioned_variable_has_an_empty_domain() {
        let index = index_of(&[[1, 1, 1]]);
        let mut solver = Solver::new(&index, 2, &[[V0, V0, V0]], no_equalities(2));

        assert!(solver.is_valid());
        assert_eq!(solver.next_assignment(), None);
        assert!(!solver.is_valid());
    }

    #[test]
    fn enumeration_is_deterministic_across_runs() {
        let index = index_of(&[[1, 2, 3], [1, 2, 4], [5, 2, 3], [4, 2, 4]]);
        let constraints = [[V0, Term::Node(2), V1]];
        let first: Vec<_> = Solver::new(&index, 2, &constraints, no_equalities(2)).collect();
        let second: Vec<_> = Solver::new(&index, 2, &constraints, no_equalities(2)).collect();

        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn drained_solver_stays_drained() {
        let index = index_of(&[[1, 1, 1]]);
        let mut solver = Solver::new(&index, 1, &[[V0, V0, V0]], no_equalities(1));
        while solver.next_assignment().is_some() {}

        assert_eq!(solver.next_assignment(), None);
        assert_eq!(solver.next_assignment(), None);
    }

    #[test]
    fn stats_count_solutions_and_work() {
        let index = index_of(&[[1, 2, 1], [1, 2, 2], [2, 2, 1]]);
        let mut solver = Solver::new(&index, 2, &[[V0, Term::Node(2), V1]], no_equalities(2));
        while solver.next_assignment().is_some() {}

        assert_eq!(solver.n_variables(), 2);
        let stats = solver.stats();
        assert_eq!(stats.solutions, 2);
        assert!(stats.nodes_visited > 0);
        assert!(stats.backtracks > 0);
        assert!(stats.variable_stats[&1].inequality_prunings > 0);
    }

    #[test]
    #[should_panic(expected = "at least one variable")]
    fn zero_variables_is_a_contract_violation() {
        let index = FactIndex::new();
        Solver::new(&index, 0, &[], Vec::new());
    }

    #[test]
    #[should_panic(expected = "variable(s) exist")]
    fn out_of_range_variable_is_a_contract_violation() {
        let index = FactIndex::new();
        Solver::new(&index, 1, &[[V0, V1, V0]], no_equalities(1));
    }

    #[test]
    #[should_panic(expected = "does not precede")]
    fn forward_may_equal_reference_is_a_contract_violation() {
        let index = FactIndex::new();
        Solver::new(&index, 2, &[[V0, V1, V0]], vec![ordset![1], OrdSet::new()]);
    }

    /// Exhaustive substitution check over the whole candidate universe.
    fn brute_force(
        index: &FactIndex,
        n: usize,
        constraints: &[Constraint],
        may_equal: &[OrdSet<VarIndex>],
        universe: &[NodeId],
    ) -> Vec<Vec<NodeId>> {
        let mut mentioned = vec![false; n];
        for constraint in constraints {
            for term in constraint {
                if let Term::Var(k) = *term {
                    mentioned[k] = true;
                }
            }
        }
        // An unmentioned variable has an empty domain by convention.
        if mentioned.contains(&false) {
            return Vec::new();
        }

        let mut satisfying = Vec::new();
        for tuple in 0..universe.len().pow(n as u32) {
            let mut remainder = tuple;
            let mut assignment = vec![0; n];
            for slot in assignment.iter_mut() {
                *slot = universe[remainder % universe.len()];
                remainder /= universe.len();
            }

            let holds = constraints.iter().all(|constraint| {
                let fact = constraint.map(|term| match term {
                    Term::Node(node) => node,
                    Term::Var(k) => assignment[k],
                });
                index.is_true(fact)
            });
            let separated = (0..n).all(|k| {
                (0..k).all(|j| {
                    may_equal[k].contains(&j) || assignment[j] != assignment[k]
                })
            });
            if holds && separated {
                satisfying.push(assignment);
            }
        }
        satisfying.sort();
        satisfying
    }

    fn term(n: usize) -> impl Strategy<Value = Term> {
        prop_oneof![
            (1u32..=4).prop_map(Term::Node),
            (0..n).prop_map(Term::Var),
        ]
    }

    type Instance = (HashSet<Fact>, usize, Vec<Constraint>, Vec<OrdSet<VarIndex>>);

    fn instance() -> impl Strategy<Value = Instance> {
        (1usize..=3).prop_flat_map(|n| {
            let facts =
                proptest::collection::hash_set([1u32..=4, 1u32..=4, 1u32..=4], 0..12);
            let constraints = proptest::collection::vec([term(n), term(n), term(n)], 1..=3);
            let pair_bits = proptest::collection::vec(any::<bool>(), (n * (n - 1)) / 2);
            (Just(n), facts, constraints, pair_bits).prop_map(
                |(n, facts, constraints, pair_bits)| {
                    let mut may_equal = vec![OrdSet::new(); n];
                    let mut bit = 0;
                    for later in 0..n {
                        for earlier in 0..later {
                            if pair_bits[bit] {
                                may_equal[later].insert(earlier);
                            }
                            bit += 1;
                        }
                    }
                    (facts, n, constraints, may_equal)
                },
            )
        })
    }

    proptest! {
        #[test]
        fn enumeration_matches_brute_force((facts, n, constraints, may_equal) in instance()) {
            let mut index = FactIndex::new();
            for &fact in &facts {
                index.add(fact);
            }

            let solver = Solver::new(&index, n, &constraints, may_equal.clone());
            let mut enumerated: Vec<Vec<NodeId>> = solver.collect();
            enumerated.sort();

            let expected = brute_force(&index, n, &constraints, &may_equal, &[1, 2, 3, 4]);
            prop_assert_eq!(enumerated, expected);
        }
    }
}
