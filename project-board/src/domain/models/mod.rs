mod filter;
mod ids;
mod project;
mod status;
mod summary;

pub use filter::*;
pub use ids::*;
pub use project::*;
pub use status::*;
pub use summary::*;
