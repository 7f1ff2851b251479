//! Compilation of symbolic queries into solver instances.
//!
//! A query is written against interned node *names* and caller-chosen
//! variable *tokens*. Compilation picks a search order for the variables,
//! renumbers them densely, translates names through a [`NodeInterner`], and
//! normalizes a symmetric may-equal relation into the upper-triangular form
//! the solver consults. Running the compiled query translates each raw
//! assignment back into token-keyed [`Bindings`].

pub mod ordering;

use std::collections::HashMap;

use im::OrdSet;

use crate::{
    error::{QueryError, Result},
    query::ordering::VariableOrdering,
    solver::{engine::ground_fact, stats::SearchStats, Constraint, Solver, Term, VarIndex},
    store::{FactIndex, NodeId, NodeInterner},
};

/// One position of a query triplet before compilation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryAtom {
    /// A concrete node, referenced by its interned name.
    Name(String),
    /// A caller-chosen variable token; equal tokens denote the same variable.
    Var(u32),
}

impl QueryAtom {
    pub fn name(name: impl Into<String>) -> Self {
        QueryAtom::Name(name.into())
    }

    pub fn var(token: u32) -> Self {
        QueryAtom::Var(token)
    }
}

/// A query triplet mixing node names and variable tokens.
pub type QueryTriplet = [QueryAtom; 3];

/// A satisfying assignment, keyed by the query's own variable tokens.
pub type Bindings = HashMap<u32, NodeId>;

/// A compiled existential query, ready to run against any [`FactIndex`]
/// sharing the vocabulary it was compiled for.
#[derive(Debug, Clone)]
pub struct Query {
    constraints: Vec<Constraint>,
    /// search_order[k] is the token of the variable at solver index k.
    search_order: Vec<u32>,
    may_equal: Vec<OrdSet<VarIndex>>,
}

impl Query {
    /// Compiles `triplets` into a solver instance.
    ///
    /// `may_equal_pairs` lists unordered pairs of variable tokens that are
    /// permitted to take the same node; every other pair of variables is
    /// forced apart. Node names are resolved through `interner`; `ordering`
    /// decides the search order.
    pub fn compile(
        triplets: &[QueryTriplet],
        may_equal_pairs: &[(u32, u32)],
        interner: &NodeInterner,
        ordering: &dyn VariableOrdering,
    ) -> Result<Query> {
        if triplets.is_empty() {
            return Err(QueryError::EmptyQuery.into());
        }

        let mut tokens: Vec<u32> = triplets
            .iter()
            .flat_map(|triplet| triplet.iter())
            .filter_map(|atom| match atom {
                QueryAtom::Var(token) => Some(*token),
                QueryAtom::Name(_) => None,
            })
            .collect();
        tokens.sort_unstable();
        tokens.dedup();

        for &(a, b) in may_equal_pairs {
            for token in [a, b] {
                if !tokens.contains(&token) {
                    return Err(QueryError::UnknownVariable(token).into());
                }
            }
        }

        let search_order = ordering.order(triplets, &tokens);
        debug_assert_eq!(search_order.len(), tokens.len());
        let position: HashMap<u32, VarIndex> = search_order
            .iter()
            .enumerate()
            .map(|(index, &token)| (token, index))
            .collect();

        let mut constraints = Vec::with_capacity(triplets.len());
        for triplet in triplets {
            let mut terms = Vec::with_capacity(3);
            for atom in triplet {
                terms.push(match atom {
                    QueryAtom::Name(name) => Term::Node(
                        interner
                            .get(name)
                            .ok_or_else(|| QueryError::UnknownNode(name.clone()))?,
                    ),
                    QueryAtom::Var(token) => Term::Var(position[token]),
                });
            }
            constraints.push([terms[0], terms[1], terms[2]]);
        }

        let mut may_equal = vec![OrdSet::new(); search_order.len()];
        for &(a, b) in may_equal_pairs {
            let (ka, kb) = (position[&a], position[&b]);
            if ka == kb {
                continue;
            }
            let (earlier, later) = if ka < kb { (ka, kb) } else { (kb, ka) };
            may_equal[later].insert(earlier);
        }

        Ok(Query {
            constraints,
            search_order,
            may_equal,
        })
    }

    /// The query's variable tokens in the order they are searched.
    pub fn search_order(&self) -> &[u32] {
        &self.search_order
    }

    /// Lazily enumerates the bindings satisfying this query against `index`.
    pub fn run<'a>(&self, index: &'a FactIndex) -> Assignments<'a> {
        if self.search_order.is_empty() {
            // No variables: the query degenerates to a membership test and
            // yields a single empty binding when every triplet is a fact.
            let facts: Vec<_> = self.constraints.iter().filter_map(ground_fact).collect();
            return Assignments {
                search_order: Vec::new(),
                state: AssignmentsState::Ground {
                    pending: index.all_true(&facts),
                },
            };
        }
        Assignments {
            search_order: self.search_order.clone(),
            state: AssignmentsState::Search(Solver::new(
                index,
                self.search_order.len(),
                &self.constraints,
                self.may_equal.clone(),
            )),
        }
    }
}

/// A lazy stream of [`Bindings`] produced by [`Query::run`].
pub struct Assignments<'a> {
    search_order: Vec<u32>,
    state: AssignmentsState<'a>,
}

enum AssignmentsState<'a> {
    Ground { pending: bool },
    Search(Solver<'a>),
}

impl Assignments<'_> {
    /// Statistics for the underlying search, if one was needed.
    pub fn stats(&self) -> Option<&SearchStats> {
        match &self.state {
            AssignmentsState::Search(solver) => Some(solver.stats()),
            AssignmentsState::Ground { .. } => None,
        }
    }
}

impl Iterator for Assignments<'_> {
    type Item = Bindings;

    fn next(&mut self) -> Option<Bindings> {
        match &mut self.state {
            AssignmentsState::Ground { pending } => {
                if *pending {
                    *pending = false;
                    Some(Bindings::new())
                } else {
                    None
                }
            }
            AssignmentsState::Search(solver) => {
                let assignment = solver.next_assignment()?;
                Some(self.search_order.iter().copied().zip(assignment).collect())
            }
        }
    }
}
