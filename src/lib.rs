//! Ternio is a backtracking solver for existential queries over a ternary
//! fact store.
//!
//! Facts are ordered triples of positive node identifiers, held in a
//! [`FactIndex`] that answers partial-pattern lookups in one bucket probe.
//! A [`Solver`] takes an ordered list of constraint triplets mixing nodes
//! and variables and lazily enumerates every assignment of nodes to
//! variables under which each constraint is a stored fact, with pairwise
//! inequality enforced between variables unless explicitly waived.
//!
//! # Core Concepts
//!
//! - **[`FactIndex`]**: the fact set plus an eight-way inverted index, one
//!   bucket per subset of pinned triplet positions.
//! - **[`Solver`]**: the depth-first enumerator. It consumes a finished
//!   problem instance: variables are searched in the order given.
//! - **[`Query`]**: the convenience front end. It compiles triplets written
//!   against node names and free-form variable tokens into a solver
//!   instance, choosing the search order via a [`VariableOrdering`].
//!
//! # Example: Grandparents
//!
//! ```
//! use ternio::query::ordering::MostConstrainedFirst;
//! use ternio::query::{Query, QueryAtom};
//! use ternio::store::{FactIndex, NodeInterner};
//!
//! // 1. Intern the vocabulary and assert some facts.
//! let mut interner = NodeInterner::new();
//! let parent = interner.intern("parent-of");
//! let alice = interner.intern("alice");
//! let bob = interner.intern("bob");
//! let carol = interner.intern("carol");
//!
//! let mut index = FactIndex::new();
//! index.add([alice, parent, bob]);
//! index.add([bob, parent, carol]);
//!
//! // 2. Ask for grandparent chains: ?0 -parent-> ?1 -parent-> ?2.
//! let triplets = [
//!     [QueryAtom::var(0), QueryAtom::name("parent-of"), QueryAtom::var(1)],
//!     [QueryAtom::var(1), QueryAtom::name("parent-of"), QueryAtom::var(2)],
//! ];
//! let query = Query::compile(&triplets, &[], &interner, &MostConstrainedFirst).unwrap();
//!
//! // 3. Enumerate bindings lazily.
//! let bindings: Vec<_> = query.run(&index).collect();
//! assert_eq!(bindings.len(), 1);
//! assert_eq!(bindings[0][&0], alice);
//! assert_eq!(bindings[0][&2], carol);
//! ```
//!
//! The solver can also be driven directly with pre-encoded constraints when
//! the caller manages its own node vocabulary and variable order; see
//! [`Solver::new`].
//!
//! [`FactIndex`]: store::FactIndex
//! [`Solver`]: solver::Solver
//! [`Solver::new`]: solver::Solver::new
//! [`Query`]: query::Query
//! [`VariableOrdering`]: query::ordering::VariableOrdering

pub mod error;
pub mod query;
pub mod solver;
pub mod store;
