use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedValue<V> {
    value: V,
    stored_at: Instant,
    seq: u64,
}

#[derive(Debug)]
struct Entries<K, V> {
    map: HashMap<K, CachedValue<V>>,
    next_seq: u64,
}

/// Process-local cache whose entries expire `ttl` after insertion. Holds at most `max_entries`
/// values; inserting into a full cache evicts the oldest entry.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    max_entries: usize,
    entries: tokio::sync::Mutex<Entries<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: tokio::sync::Mutex::new(Entries {
                map: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.map.len()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.entries.lock().await;
        let entries = &mut guard.map;
        let fresh = entries
            .get(key)
            .map(|cached| cached.stored_at.elapsed() < self.ttl)?;
        if !fresh {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|cached| cached.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut guard = self.entries.lock().await;
        let Entries { map, next_seq } = &mut *guard;

        let ttl = self.ttl;
        map.retain(|_, cached| cached.stored_at.elapsed() < ttl);

        if !map.contains_key(&key) && map.len() >= self.max_entries {
            let oldest = map
                .iter()
                .min_by_key(|(_, cached)| cached.seq)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                map.remove(&oldest);
            }
        }

        *next_seq += 1;
        map.insert(
            key,
            CachedValue {
                value,
                stored_at: Instant::now(),
                seq: *next_seq,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_fresh_values() {
        let cache = TtlCache::new(Duration::from_secs(60), 8);
        cache.insert("all", 7).await;
        assert_eq!(cache.get(&"all").await, Some(7));
        assert_eq!(cache.get(&"6").await, None);
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_millis(20), 8);
        cache.insert(1u32, "v".to_string()).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get(&1).await, None);
    }

    #[tokio::test]
    async fn zero_ttl_never_hits() {
        let cache = TtlCache::new(Duration::ZERO, 8);
        cache.insert(1u32, 1u32).await;
        assert_eq!(cache.get(&1).await, None);
    }

    #[tokio::test]
    async fn insert_overwrites_existing_key() {
        let cache = TtlCache::new(Duration::from_secs(60), 1);
        cache.insert(1u32, 1u32).await;
        cache.insert(1u32, 2u32).await;
        assert_eq!(cache.get(&1).await, Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn many_distinct_keys_stay_bounded() {
        let cache = TtlCache::new(Duration::from_secs(60), 16);
        for key in 1..=500u32 {
            cache.insert(key, key).await;
        }
        assert_eq!(cache.len().await, 16);
        // Oldest keys were evicted first.
        assert_eq!(cache.get(&1).await, None);
        assert_eq!(cache.get(&500).await, Some(500));
    }

    #[tokio::test]
    async fn insert_sweeps_expired_entries() {
        let cache = TtlCache::new(Duration::from_millis(20), 16);
        cache.insert(1u32, 1u32).await;
        cache.insert(2u32, 2u32).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.insert(3u32, 3u32).await;
        assert_eq!(cache.len().await, 1);
    }
}
