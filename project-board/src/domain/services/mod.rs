mod projects;

pub use projects::{CachedQuery, ProjectServiceImpl};
