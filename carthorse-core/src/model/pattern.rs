use serde::{Deserialize, Serialize};

use super::route::RouteShape;

/// one requested route pattern: a target distance/elevation profile and
/// shape the Route Enumerator searches the graph for (spec.md §4.7, §6).
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RoutePattern {
    pub shape: RouteShape,
    pub target_km: f64,
    pub target_gain_m: f64,
    pub tolerance_pct: f64,
    pub max_depth: usize,
}

impl RoutePattern {
    pub fn new(
        shape: RouteShape,
        target_km: f64,
        target_gain_m: f64,
        tolerance_pct: f64,
        max_depth: usize,
    ) -> Self {
        RoutePattern {
            shape,
            target_km,
            target_gain_m,
            tolerance_pct,
            max_depth,
        }
    }

    pub fn min_km(&self) -> f64 {
        self.target_km * (1.0 - self.tolerance_pct / 100.0)
    }

    pub fn max_km(&self) -> f64 {
        self.target_km * (1.0 + self.tolerance_pct / 100.0)
    }

    pub fn accepts_distance(&self, distance_km: f64) -> bool {
        distance_km >= self.min_km() && distance_km <= self.max_km()
    }

    /// similarity in [0, 1] between an actual distance/gain pair and this
    /// pattern's targets (spec.md §4.7 Scoring).
    pub fn similarity(&self, actual_km: f64, actual_gain_m: f64) -> f64 {
        if self.target_km <= 0.0 {
            return 0.0;
        }
        let distance_term = (actual_km - self.target_km).abs() / self.target_km;
        let gain_term = if self.target_gain_m <= 0.0 {
            // a flat-route pattern: any gain at all is a mismatch, capped
            // so a single steep pitch doesn't swamp the distance term.
            actual_gain_m.abs().min(1.0)
        } else {
            (actual_gain_m - self.target_gain_m).abs() / self.target_gain_m
        };
        (1.0 - (distance_term + gain_term) / 2.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_route_pattern_scores_a_flat_candidate_highly() {
        let pattern = RoutePattern::new(RouteShape::Loop, 5.0, 0.0, 20.0, 10);
        assert_eq!(pattern.similarity(5.0, 0.0), 1.0);
        assert!(pattern.similarity(5.0, 40.0) < 1.0);
    }

    #[test]
    fn zero_target_distance_is_never_similar() {
        let pattern = RoutePattern::new(RouteShape::PointToPoint, 0.0, 0.0, 20.0, 10);
        assert_eq!(pattern.similarity(5.0, 0.0), 0.0);
    }
}
