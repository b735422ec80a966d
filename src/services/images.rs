use lru::LruCache;
use reqwest::Client;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Image host returned {0}")]
    BadStatus(u16),

    #[error("Image exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Byte cache for card images, bounded by entry count and total size.
///
/// Least recently used entries are evicted until both limits hold. An image
/// larger than the byte budget on its own is never stored.
pub struct ImageCache {
    entries: LruCache<String, Arc<Vec<u8>>>,
    max_bytes: usize,
    total_bytes: usize,
}

impl ImageCache {
    pub fn new(max_entries: NonZeroUsize, max_bytes: usize) -> Self {
        Self {
            entries: LruCache::new(max_entries),
            max_bytes,
            total_bytes: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn get(&mut self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.entries.get(url).cloned()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains(url)
    }

    /// Store `bytes` for `url`. Returns false if the image exceeds the byte budget.
    pub fn insert(&mut self, url: String, bytes: Arc<Vec<u8>>) -> bool {
        let size = bytes.len();
        if size > self.max_bytes {
            return false;
        }

        if let Some(old) = self.entries.pop(&url) {
            self.total_bytes -= old.len();
        }

        while self.total_bytes + size > self.max_bytes {
            match self.entries.pop_lru() {
                Some((evicted, old)) => {
                    tracing::trace!("Evicting image {} ({} bytes)", evicted, old.len());
                    self.total_bytes -= old.len();
                }
                None => break,
            }
        }

        // push evicts by count when at capacity
        if let Some((evicted, old)) = self.entries.push(url, bytes) {
            self.total_bytes -= old.len();
            tracing::trace!("Evicting image {} ({} bytes)", evicted, old.len());
        }
        self.total_bytes += size;
        true
    }
}

/// Fetches card images through an owned [`ImageCache`].
///
/// Downloads are capped at the cache's byte budget; anything larger is
/// rejected without being buffered in full.
pub struct ImageLoader {
    client: Client,
    max_bytes: usize,
    cache: Mutex<ImageCache>,
}

impl ImageLoader {
    pub fn new(cache: ImageCache) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            max_bytes: cache.max_bytes(),
            cache: Mutex::new(cache),
        }
    }

    pub async fn load(&self, url: &str) -> Result<Arc<Vec<u8>>, ImageError> {
        if let Some(bytes) = self.cache.lock().await.get(url) {
            tracing::trace!("Image cache hit: {}", url);
            return Ok(bytes);
        }

        tracing::debug!("Fetching image: {}", url);

        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ImageError::BadStatus(response.status().as_u16()));
        }

        let limit = self.max_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(ImageError::TooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(ImageError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        let bytes = Arc::new(body);

        if !self.cache.lock().await.insert(url.to_string(), bytes.clone()) {
            tracing::debug!("Image {} too large to cache ({} bytes)", url, bytes.len());
        }

        Ok(bytes)
    }

    pub async fn cached_bytes(&self) -> usize {
        self.cache.lock().await.total_bytes()
    }
}
