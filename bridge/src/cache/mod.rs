//! Generic async cache contract (spec §4.6), adapted directly from the teacher's
//! `loom/src/cache/mod.rs`. `httpCall` is the only built-in consumer, but the trait is exposed
//! publicly so a host can plug in a different store (spec: "the store is pluggable through an
//! interface with `get(key)` and `set(key, value, ttlSeconds)`").

mod error;
mod in_memory;

pub use error::CacheError;
pub use in_memory::InMemoryCache;

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, CacheError>;
    async fn set(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &K) -> Result<(), CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn boxed_cache_trait_object_works() {
        let cache: Box<dyn Cache<String, String>> = Box::new(InMemoryCache::new(8));
        cache.set("k".to_string(), "v".to_string(), None).await.unwrap();
        assert_eq!(cache.get(&"k".to_string()).await.unwrap(), Some("v".to_string()));
    }
}
