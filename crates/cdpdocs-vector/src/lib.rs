//! cdpdocs-vector
//!
//! In-memory exact L2 nearest-neighbour index whose insertion positions double
//! as document ids, plus JSON snapshots for restarts.

pub mod distance;
pub mod flat;
pub mod snapshot;

pub use distance::{l2_distance, similarity};
pub use flat::FlatL2Index;
