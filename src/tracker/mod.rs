mod builder;
mod discovery;
mod objects;
mod router;
#[allow(clippy::module_inception)]
mod tracker;

pub use builder::*;
pub use tracker::*;
