pub mod recommendation_cache;
pub mod redis;
pub mod store;

mod macros;

pub use recommendation_cache::{compute_key, CacheLookup, RecommendationCache};
pub use self::redis::create_redis_client;
pub use self::redis::RedisStore;
pub use store::{FileStore, KeyValueStore, MemoryStore};
