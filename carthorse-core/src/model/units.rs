use std::fmt::Display;

use derive_more::{Add, Div, Mul, Neg, Sum};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// the scalar weight a search algorithm accumulates along a path.
///
/// Carries no units of its own; it is built from a [`super::network::Edge`]'s
/// `cost`/`reverse_cost` fields (kilometers, by default the edge length),
/// which lets the Route Enumerator sum and order paths without f64's lack
/// of a total order getting in the way of the priority queue.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Add, Mul, Div, Sum, Neg, Serialize, Deserialize,
)]
pub struct Cost(pub OrderedFloat<f64>);

impl Cost {
    pub const ZERO: Cost = Cost(OrderedFloat(0.0));
    pub const INFINITY: Cost = Cost(OrderedFloat(f64::MAX));

    pub fn new(value: f64) -> Cost {
        Cost(OrderedFloat(value))
    }
}

impl From<f64> for Cost {
    fn from(value: f64) -> Self {
        Cost::new(value)
    }
}

impl From<Cost> for f64 {
    fn from(value: Cost) -> Self {
        value.0.into_inner()
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
