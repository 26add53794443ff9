pub mod error;
pub mod keys;
mod memory;
mod redis_cache;
mod trait_def;

pub use error::CacheError;
pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;
pub use trait_def::Cache;
