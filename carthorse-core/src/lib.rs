//! Trail topology and routing pipeline core for Carthorse.
//!
//! This crate turns a set of overlapping, near-miss, partially
//! self-crossing 3D trail polylines into a deduplicated, planar-noded,
//! elevation-aware routable graph, and enumerates loop / K-shortest-path /
//! out-and-back route candidates against it. It owns no I/O: callers
//! stream raw trails in through [`pipeline::PipelineContext`] and read
//! results back out of the [`workspace::Workspace`].

pub mod algorithm;
pub mod model;
pub mod pipeline;
pub mod util;
pub mod workspace;
