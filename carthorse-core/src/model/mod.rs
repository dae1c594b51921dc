pub mod intersection;
pub mod network;
pub mod pattern;
pub mod route;
pub mod trail;
pub mod trail_id;
pub mod units;

pub use intersection::{IntersectionCandidate, IntersectionClass, SplitInstruction};
pub use pattern::RoutePattern;
pub use route::{RouteCandidate, RouteShape};
pub use trail::{ElevationProfile, Trail, TrailOrigin};
pub use trail_id::TrailId;
pub use units::Cost;
