pub mod query_cache;

pub use query_cache::{QueryCache, QueryCacheConfig, QueryFamily, QueryKey};
