pub mod distance;
pub mod graph;

pub use distance::*;
pub use graph::*;
