use crate::query::{QueryAtom, QueryTriplet};

/// A strategy for choosing the order in which a query's variables are
/// searched.
///
/// The solver commits to a fixed order at construction, so ordering is
/// decided here, during compilation. A good order pins down highly
/// constrained triplets early and keeps lookup patterns selective.
pub trait VariableOrdering {
    /// Returns the query's variable tokens in search order.
    ///
    /// `tokens` holds every distinct token mentioned by `triplets`, in
    /// ascending order. The result must be a permutation of `tokens`.
    fn order(&self, triplets: &[QueryTriplet], tokens: &[u32]) -> Vec<u32>;
}

/// Searches variables in ascending token order.
pub struct InputOrder;

impl VariableOrdering for InputOrder {
    fn order(&self, _triplets: &[QueryTriplet], tokens: &[u32]) -> Vec<u32> {
        tokens.to_vec()
    }
}

/// Greedily takes the next variable from the triplet with the most pinned
/// positions, counting named nodes and already ordered variables as pinned.
///
/// Picking from the most pinned triplet keeps every lookup pattern as
/// selective as the ordering so far allows.
pub struct MostConstrainedFirst;

impl VariableOrdering for MostConstrainedFirst {
    fn order(&self, triplets: &[QueryTriplet], tokens: &[u32]) -> Vec<u32> {
        let mut pinned: Vec<usize> = triplets
            .iter()
            .map(|triplet| {
                triplet
                    .iter()
                    .filter(|atom| matches!(atom, QueryAtom::Name(_)))
                    .count()
            })
            .collect();

        let mut order: Vec<u32> = Vec::with_capacity(tokens.len());
        while order.len() < tokens.len() {
            let next = triplets
                .iter()
                .enumerate()
                .filter_map(|(i, triplet)| {
                    first_unordered(triplet, &order).map(|token| (pinned[i], i, token))
                })
                // Most pinned wins; ties go to the earliest triplet.
                .max_by_key(|&(count, i, _)| (count, std::cmp::Reverse(i)))
                .map(|(_, _, token)| token)
                .expect("every variable token occurs in some triplet");
            for (i, triplet) in triplets.iter().enumerate() {
                if mentions(triplet, next) {
                    pinned[i] += 1;
                }
            }
            order.push(next);
        }
        order
    }
}

fn first_unordered(triplet: &QueryTriplet, ordered: &[u32]) -> Option<u32> {
    triplet.iter().find_map(|atom| match atom {
        QueryAtom::Var(token) if !ordered.contains(token) => Some(*token),
        _ => None,
    })
}

fn mentions(triplet: &QueryTriplet, token: u32) -> bool {
    triplet
        .iter()
        .any(|atom| matches!(atom, QueryAtom::Var(t) if *t == token))
}
