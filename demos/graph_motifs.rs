//! Finds directed triangles in a small graph stored as edge facts.
//!
//! Each edge `u -> v` is the fact `(u, edge, v)`, so a triangle is three
//! chained edge constraints closing back on the first variable.

use ternio::query::ordering::MostConstrainedFirst;
use ternio::query::{Query, QueryAtom, QueryTriplet};
use ternio::store::{FactIndex, NodeInterner};

fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut interner = NodeInterner::new();
    let mut index = FactIndex::new();

    let edge = interner.intern("edge");
    let edges = [
        ("a", "b"),
        ("b", "c"),
        ("c", "a"),
        ("b", "d"),
        ("d", "c"),
        ("d", "a"),
        ("a", "d"),
    ];
    for (from, to) in edges {
        let from = interner.intern(from);
        let to = interner.intern(to);
        index.add([from, edge, to]);
    }

    let triangle: Vec<QueryTriplet> = vec![
        [QueryAtom::var(0), QueryAtom::name("edge"), QueryAtom::var(1)],
        [QueryAtom::var(1), QueryAtom::name("edge"), QueryAtom::var(2)],
        [QueryAtom::var(2), QueryAtom::name("edge"), QueryAtom::var(0)],
    ];
    let query =
        Query::compile(&triangle, &[], &interner, &MostConstrainedFirst).expect("query compiles");

    println!("Directed triangles (each rotation listed once per start):");
    for bindings in query.run(&index) {
        let resolve = |token| interner.resolve(bindings[&token]).unwrap_or("?");
        println!("  {} -> {} -> {} -> back", resolve(0), resolve(1), resolve(2));
    }
}
