mod project_accessor;

pub use project_accessor::*;
