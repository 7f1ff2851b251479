//! Queries a small family tree for grandparent and co-parent pairs.

use ternio::query::ordering::MostConstrainedFirst;
use ternio::query::{Query, QueryAtom, QueryTriplet};
use ternio::solver::render_stats_table;
use ternio::store::{FactIndex, NodeInterner};

fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut interner = NodeInterner::new();
    let mut index = FactIndex::new();

    let parent = interner.intern("parent-of");
    let pairs = [
        ("ingrid", "alice"),
        ("ingrid", "bob"),
        ("alice", "carol"),
        ("alice", "dave"),
        ("erik", "carol"),
        ("erik", "dave"),
        ("bob", "frida"),
    ];
    for (from, to) in pairs {
        let from = interner.intern(from);
        let to = interner.intern(to);
        index.add([from, parent, to]);
    }

    let grandparent: Vec<QueryTriplet> = vec![
        [
            QueryAtom::var(0),
            QueryAtom::name("parent-of"),
            QueryAtom::var(1),
        ],
        [
            QueryAtom::var(1),
            QueryAtom::name("parent-of"),
            QueryAtom::var(2),
        ],
    ];
    let query = Query::compile(&grandparent, &[], &interner, &MostConstrainedFirst)
        .expect("query compiles");

    println!("Grandparent pairs:");
    let mut assignments = query.run(&index);
    for bindings in assignments.by_ref() {
        let resolve = |token| interner.resolve(bindings[&token]).unwrap_or("?");
        println!("  {} -> {} -> {}", resolve(0), resolve(1), resolve(2));
    }
    if let Some(stats) = assignments.stats() {
        println!("\nSearch statistics:\n{}", render_stats_table(stats));
    }

    // Two distinct parents of the same child.
    let co_parents: Vec<QueryTriplet> = vec![
        [
            QueryAtom::var(0),
            QueryAtom::name("parent-of"),
            QueryAtom::var(2),
        ],
        [
            QueryAtom::var(1),
            QueryAtom::name("parent-of"),
            QueryAtom::var(2),
        ],
    ];
    let query =
        Query::compile(&co_parents, &[], &interner, &MostConstrainedFirst).expect("query compiles");

    println!("Co-parent pairs:");
    for bindings in query.run(&index) {
        let resolve = |token| interner.resolve(bindings[&token]).unwrap_or("?");
        println!("  {} & {} of {}", resolve(0), resolve(1), resolve(2));
    }
}
