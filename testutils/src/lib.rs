mod cluster;
mod constants;
mod fake;
mod objs;
mod tree;

pub use cluster::*;
pub use constants::*;
pub use fake::*;
pub use objs::*;
pub use tree::*;
