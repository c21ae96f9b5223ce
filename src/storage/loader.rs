//! Image loading: fetch, decode, and a time-bounded cache of decoded
//! arrays, so repeated analysis of the same frame skips the round trip.
//!
//! The loader is constructed once at startup and handed to handlers
//! through the shared application state; callers cannot tell a cached
//! image from a freshly fetched one.

use crate::error::AppError;
use crate::fits;
use crate::storage::client::ObjectStoreClient;
use ndarray::Array2;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub struct ImageLoader {
    store: ObjectStoreClient,
    cache: RwLock<ImageCache>,
}

impl ImageLoader {
    pub fn new(store: ObjectStoreClient, ttl: Duration, max_entries: usize) -> Self {
        Self {
            store,
            cache: RwLock::new(ImageCache::new(ttl, max_entries)),
        }
    }

    pub async fn exists(&self, filename: &str) -> Result<bool, AppError> {
        self.store.exists(filename).await
    }

    /// Resolve a filename to its decoded 2-D intensity grid.
    pub async fn load(&self, filename: &str) -> Result<Arc<Array2<f64>>, AppError> {
        if let Some(image) = self.cache.read().await.get(filename) {
            tracing::debug!(filename, "image cache hit");
            return Ok(image);
        }

        let bytes = self.store.fetch(filename).await?;

        // FITS decoding is CPU-bound; keep it off the async workers.
        let image = tokio::task::spawn_blocking(move || fits::decode_image(&bytes))
            .await
            .map_err(|e| AppError::Internal(format!("decode task failed: {e}")))?
            .map_err(AppError::DecodeError)?;

        let image = Arc::new(image);
        self.cache
            .write()
            .await
            .insert(filename.to_string(), image.clone());

        Ok(image)
    }
}

/// TTL-bounded map of decoded images. Entries expire after the TTL and
/// the oldest entry is evicted once the cap is reached.
struct ImageCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

struct CacheEntry {
    image: Arc<Array2<f64>>,
    fetched_at: Instant,
}

impl ImageCache {
    fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    fn get(&self, filename: &str) -> Option<Arc<Array2<f64>>> {
        self.entries
            .get(filename)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.image.clone())
    }

    fn insert(&mut self, filename: String, image: Arc<Array2<f64>>) {
        self.entries
            .retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);

        if self.entries.len() >= self.max_entries {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at)
                .map(|(key, _)| key.clone())
            {
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(
            filename,
            CacheEntry {
                image,
                fetched_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image(value: f64) -> Arc<Array2<f64>> {
        Arc::new(Array2::from_elem((2, 2), value))
    }

    #[test]
    fn fresh_entries_are_served_from_cache() {
        let mut cache = ImageCache::new(Duration::from_secs(3600), 4);
        cache.insert("a.fits".to_string(), test_image(1.0));

        let hit = cache.get("a.fits").expect("entry should be fresh");
        assert_eq!(hit[[0, 0]], 1.0);
    }

    #[test]
    fn expired_entries_are_not_served() {
        let mut cache = ImageCache::new(Duration::ZERO, 4);
        cache.insert("a.fits".to_string(), test_image(1.0));

        assert!(cache.get("a.fits").is_none());
    }

    #[test]
    fn cap_evicts_the_oldest_entry() {
        let mut cache = ImageCache::new(Duration::from_secs(3600), 2);
        cache.insert("a.fits".to_string(), test_image(1.0));
        cache.insert("b.fits".to_string(), test_image(2.0));
        cache.insert("c.fits".to_string(), test_image(3.0));

        assert_eq!(cache.entries.len(), 2);
        assert!(cache.get("c.fits").is_some());
    }
}
