use crate::envelope::KeyMeta;
use crate::error::Result;
use crate::key::CryptoKey;
use crate::policy::CryptoPolicy;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// A cached CryptoKey, closed exactly once its last outstanding handle is dropped
pub struct CachedCryptoKey {
    /// The underlying CryptoKey
    pub crypto_key: Arc<CryptoKey>,

    /// Set once the underlying secret has actually been wiped
    closed: AtomicBool,
}

impl CachedCryptoKey {
    /// Wraps a freshly loaded key
    pub fn new(key: CryptoKey) -> Self {
        Self {
            crypto_key: Arc::new(key),
            closed: AtomicBool::new(false),
        }
    }

    /// True while a caller other than the cache's own slot still holds this key
    fn in_use(self: &Arc<Self>) -> bool {
        Arc::strong_count(self) > 1
    }

    /// Wipes the underlying secret. Idempotent.
    fn seal(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        log::debug!("closing cached key: {:p}", self.crypto_key);
        self.crypto_key.close()
    }
}

impl Drop for CachedCryptoKey {
    fn drop(&mut self) {
        // Backstop: guarantees the secret is wiped even if a caller bypassed retire().
        if let Err(e) = self.seal() {
            log::debug!("error sealing cached key on drop: {}", e);
        }
    }
}

/// Entry in the key cache
#[derive(Clone)]
struct CacheEntry {
    /// Time when this entry was loaded
    loaded_at: DateTime<Utc>,
    
    /// The cached key
    key: Arc<CachedCryptoKey>,
}

impl CacheEntry {
    /// Creates a new CacheEntry with the current time
    fn new(key: CryptoKey) -> Self {
        Self {
            loaded_at: Utc::now(),
            key: Arc::new(CachedCryptoKey::new(key)),
        }
    }
}

/// Cache key type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKeyType {
    /// Cache for system keys
    SystemKeys,
    
    /// Cache for intermediate keys
    IntermediateKeys,
}

impl std::fmt::Display for CacheKeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKeyType::SystemKeys => write!(f, "system"),
            CacheKeyType::IntermediateKeys => write!(f, "intermediate"),
        }
    }
}

/// Functions to cache and retrieve keys
#[async_trait::async_trait]
pub trait KeyCacher: Send + Sync {
    /// Gets a key from the cache or loads it using the provided function
    async fn get_or_load<F, Fut>(&self, 
        meta: KeyMeta, 
        loader: F
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send;
    
    /// Gets the latest key from the cache or loads it using the provided function
    async fn get_or_load_latest<F, Fut>(&self, 
        id: &str, 
        loader: F
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send;
        
    /// Closes the cache
    async fn close(&self) -> Result<()>;
}

/// Format key for cache
fn cache_key(id: &str, created: i64) -> String {
    format!("{}{}", id, created)
}

/// Implements a cache with an LRU eviction policy
pub struct KeyCache {
    /// The crypto policy
    policy: Arc<CryptoPolicy>,

    /// The actual cache using string keys
    keys: RwLock<HashMap<String, CacheEntry>>,

    /// Map from ID to latest key metadata
    latest: RwLock<HashMap<String, KeyMeta>>,

    /// Type of keys stored in this cache
    cache_type: CacheKeyType,

    /// Keys replaced or evicted while a caller still held a handle to them.
    /// Swept on subsequent cache operations and sealed once their last handle drops.
    orphaned: Mutex<Vec<Arc<CachedCryptoKey>>>,

    /// IDs with a background rotation currently in flight (queued rotation strategy)
    rotating: Mutex<HashSet<String>>,

    /// Set once `close()` has run; rejects further acquires
    closed: AtomicBool,
}

/// Parse a string cache policy name to a CachePolicy enum
pub fn parse_cache_policy(policy_str: &str) -> Option<crate::cache::CachePolicy> {
    match policy_str.to_lowercase().as_str() {
        "lru" => Some(crate::cache::CachePolicy::LRU),
        "lfu" => Some(crate::cache::CachePolicy::LFU),
        "tlfu" => Some(crate::cache::CachePolicy::TLFU),
        "slru" => Some(crate::cache::CachePolicy::SLRU),
        "simple" => Some(crate::cache::CachePolicy::Simple),
        _ => None,
    }
}

impl KeyCache {
    /// Creates a new KeyCache with the given policy and cache type
    pub fn new(cache_type: CacheKeyType, policy: Arc<CryptoPolicy>) -> Self {
        Self {
            policy,
            keys: RwLock::new(HashMap::new()),
            latest: RwLock::new(HashMap::new()),
            cache_type,
            orphaned: Mutex::new(Vec::new()),
            rotating: Mutex::new(HashSet::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// True once `close()` has been called; a closed cache refuses new acquires.
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(crate::error::Error::InvalidKeyState(format!(
                "{} key cache is closed",
                self.cache_type
            )));
        }
        Ok(())
    }

    /// Claims exclusive right to rotate `id` in the background. Returns false if a
    /// rotation for this id is already in flight.
    fn begin_rotation(&self, id: &str) -> bool {
        self.rotating.lock().unwrap().insert(id.to_string())
    }

    fn end_rotation(&self, id: &str) {
        self.rotating.lock().unwrap().remove(id);
    }

    /// Like `get_or_load_latest`, but for the "queued" rotation strategy: when the
    /// cached entry is stale it is returned immediately and `loader` is run on a
    /// spawned task instead of inline, with the refreshed key written back into the
    /// cache once it completes. At most one background rotation per id runs at a time.
    pub async fn get_or_load_latest_queued<F, Fut>(
        self: &Arc<Self>,
        id: &str,
        loader: F,
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send + 'static,
    {
        self.ensure_open()?;
        self.sweep_orphans();

        let meta = KeyMeta {
            id: id.to_string(),
            created: 0,
        };

        if let Some(key) = self.get_fresh(&meta) {
            if !self.is_invalid(&key.crypto_key) {
                return Ok(key);
            }

            if self.begin_rotation(id) {
                let cache = Arc::clone(self);
                let id_owned = id.to_string();

                tokio::spawn(async move {
                    let rotate_meta = KeyMeta {
                        id: id_owned.clone(),
                        created: 0,
                    };

                    match loader(rotate_meta.clone()).await {
                        Ok(new_key) => {
                            cache.write(rotate_meta, CacheEntry::new(new_key));
                        }
                        Err(e) => {
                            log::debug!(
                                "{} background rotation failed for {}: {}",
                                cache.cache_type,
                                id_owned,
                                e
                            );
                        }
                    }

                    cache.end_rotation(&id_owned);
                });
            }

            return Ok(key);
        }

        // No cached entry to serve stale: the first load for an id must be synchronous
        // regardless of rotation strategy.
        self.get_or_load_latest(id, loader).await
    }

    /// Retires a key that is no longer current in the cache. Seals it immediately
    /// if no caller holds a handle, otherwise defers sealing until `sweep_orphans`
    /// observes it has no remaining holders.
    fn retire(&self, key: Arc<CachedCryptoKey>) {
        if key.in_use() {
            log::debug!("{} orphaning key still in use: {:p}", self.cache_type, key);
            self.orphaned.lock().unwrap().push(key);
        } else if let Err(e) = key.seal() {
            log::debug!("{} error sealing retired key: {}", self.cache_type, e);
        }
    }

    /// Seals any previously orphaned keys whose last handle has since dropped
    fn sweep_orphans(&self) {
        let mut orphaned = self.orphaned.lock().unwrap();
        orphaned.retain(|key| {
            if key.in_use() {
                return true;
            }
            if let Err(e) = key.seal() {
                log::debug!("{} error sealing orphaned key: {}", self.cache_type, e);
            }
            false
        });
    }

    /// Checks if a key needs to be reloaded based on the check interval
    fn is_reload_required(&self, entry: &CacheEntry) -> bool {
        if entry.key.crypto_key.is_revoked() {
            // No need to reload a revoked key
            return false;
        }
        
        let check_interval = Duration::from_std(self.policy.revoke_check_interval).unwrap_or_default();
        entry.loaded_at + check_interval < Utc::now()
    }
    
    /// Resolves the `KeyMeta` used to look something up into the flat string key the
    /// cache is actually indexed by, following the "latest" pointer when applicable.
    fn resolve_cache_key(&self, meta: &KeyMeta) -> String {
        if meta.is_latest() {
            if let Some(latest) = self.get_latest_key_meta(&meta.id) {
                cache_key(&latest.id, latest.created)
            } else {
                cache_key(&meta.id, meta.created)
            }
        } else {
            cache_key(&meta.id, meta.created)
        }
    }

    /// Gets a fresh key from the cache
    fn get_fresh(&self, meta: &KeyMeta) -> Option<Arc<CachedCryptoKey>> {
        let keys = self.keys.read().unwrap();
        let cache_key_str = self.resolve_cache_key(meta);

        // Get the entry
        if let Some(entry) = keys.get(&cache_key_str) {
            if !self.is_reload_required(entry) {
                let key = Arc::clone(&entry.key);
                return Some(key);
            } else {
                log::debug!("{} stale -- id: {}-{}", 
                    self.cache_type, meta.id, entry.key.crypto_key.created());
                return None;
            }
        }
        
        None
    }
    
    /// Gets the latest key metadata for an ID
    fn get_latest_key_meta(&self, id: &str) -> Option<KeyMeta> {
        let latest = self.latest.read().unwrap();
        latest.get(&cache_key(id, 0)).cloned()
    }
    
    /// Maps the latest key metadata to an ID
    fn map_latest_key_meta(&self, id: &str, latest: KeyMeta) {
        let mut latest_map = self.latest.write().unwrap();
        latest_map.insert(cache_key(id, 0), latest);
    }
    
    /// Reads an entry from the cache
    fn read(&self, meta: &KeyMeta) -> Option<CacheEntry> {
        let keys = self.keys.read().unwrap();
        let id = self.resolve_cache_key(meta);

        keys.get(&id).cloned()
    }

    /// Re-confirms a cached entry against a freshly loaded key: updates the cached
    /// entry's revocation flag and refreshes `loaded_at` in place so the next
    /// `revoke_check_interval` is measured from now, not from the original load.
    fn revalidate(&self, meta: &KeyMeta, fresh: &CryptoKey) -> Option<Arc<CachedCryptoKey>> {
        let mut keys = self.keys.write().unwrap();
        let id = self.resolve_cache_key(meta);

        let entry = keys.get_mut(&id)?;
        entry.key.crypto_key.set_revoked(fresh.is_revoked());
        entry.loaded_at = Utc::now();

        Some(Arc::clone(&entry.key))
    }

    /// Writes an entry to the cache. A no-op (aside from sealing the entry that was
    /// about to be written) once the cache has been closed.
    fn write(&self, meta: KeyMeta, entry: CacheEntry) {
        if self.is_closed() {
            self.retire(entry.key);
            return;
        }

        let mut keys = self.keys.write().unwrap();

        if meta.is_latest() {
            let updated_meta = KeyMeta {
                id: meta.id.clone(),
                created: entry.key.crypto_key.created(),
            };
            
            self.map_latest_key_meta(&meta.id, updated_meta.clone());
        } else if let Some(latest) = self.get_latest_key_meta(&meta.id) {
            if latest.created < entry.key.crypto_key.created() {
                self.map_latest_key_meta(&meta.id, meta.clone());
            }
        }
        
        let id = cache_key(&meta.id, meta.created);

        log::debug!("{} write -> key: {:p}, id: {}",
            self.cache_type, entry.key, id);

        if let Some(replaced) = keys.insert(id, entry) {
            drop(keys);
            self.retire(replaced.key);
        }
    }
    
    /// Checks if a key is invalid (revoked or expired)
    fn is_invalid(&self, key: &Arc<CryptoKey>) -> bool {
        key.is_revoked() || 
        crate::policy::is_key_expired(key.created(), self.policy.expire_key_after)
    }
}

#[async_trait::async_trait]
impl KeyCacher for KeyCache {
    async fn get_or_load<F, Fut>(&self, 
        meta: KeyMeta, 
        loader: F
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send
    {
        self.ensure_open()?;
        self.sweep_orphans();

        // Try to get a fresh key first with a read lock
        if let Some(key) = self.get_fresh(&meta) {
            return Ok(key);
        }

        // If not found or stale, we need to load it
        let key = loader(meta.clone()).await?;

        // If we already have an entry, re-confirm it in place rather than replacing it --
        // this refreshes loaded_at so is_reload_required doesn't fire again immediately.
        if let Some(cached) = self.revalidate(&meta, &key) {
            return Ok(cached);
        }

        // Create a new entry
        let entry = CacheEntry::new(key);
        let result = Arc::clone(&entry.key);

        // Store in cache
        self.write(meta.clone(), entry);

        // Update latest if this was a latest request
        if meta.is_latest() {
            let mut latest = self.latest.write().unwrap();
            latest.insert(meta.id.clone(), KeyMeta {
                id: meta.id,
                created: result.crypto_key.created(),
            });
        }

        Ok(result)
    }
    
    async fn get_or_load_latest<F, Fut>(&self, 
        id: &str, 
        loader: F
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send
    {
        let meta = KeyMeta {
            id: id.to_string(),
            created: 0, // Latest
        };

        self.ensure_open()?;
        self.sweep_orphans();

        // Try to get a fresh key
        if let Some(key) = self.get_fresh(&meta) {
            if !self.is_invalid(&key.crypto_key) {
                return Ok(key);
            }
        }

        // Load the key
        let key = loader(meta.clone()).await?;

        // Create a new entry and return it
        let entry = CacheEntry::new(key);
        let new_meta = KeyMeta {
            id: id.to_string(),
            created: entry.key.crypto_key.created(),
        };

        // Update the latest mapping
        {
            let mut latest = self.latest.write().unwrap();
            latest.insert(id.to_string(), new_meta.clone());
        }

        let result = Arc::clone(&entry.key);
        self.write(new_meta, entry);

        Ok(result)
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        log::debug!("{} closing", self.cache_type);

        let mut keys = self.keys.write().unwrap();

        for (_, entry) in keys.drain() {
            self.retire(entry.key);
        }

        drop(keys);
        self.sweep_orphans();

        Ok(())
    }
}

/// A cache implementation that never caches, always loads
pub struct NeverCache;

/// Wrapper enum for different cache implementations
#[derive(Clone)]
pub enum AnyCache {
    KeyCache(Arc<KeyCache>),
    NeverCache(Arc<NeverCache>),
}

impl AnyCache {
    /// Queued-rotation variant of `get_or_load_latest`; see `KeyCache::get_or_load_latest_queued`.
    /// `NeverCache` has nothing to serve stale, so it always loads inline.
    pub async fn get_or_load_latest_queued<F, Fut>(
        &self,
        id: &str,
        loader: F,
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send + 'static,
    {
        match self {
            AnyCache::KeyCache(cache) => cache.get_or_load_latest_queued(id, loader).await,
            AnyCache::NeverCache(cache) => cache.get_or_load_latest(id, loader).await,
        }
    }
}

#[async_trait::async_trait]
impl KeyCacher for AnyCache {
    async fn get_or_load<F, Fut>(&self, 
        meta: KeyMeta, 
        loader: F
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send
    {
        match self {
            AnyCache::KeyCache(cache) => cache.get_or_load(meta, loader).await,
            AnyCache::NeverCache(cache) => cache.get_or_load(meta, loader).await,
        }
    }
    
    async fn get_or_load_latest<F, Fut>(&self, 
        id: &str, 
        loader: F
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send
    {
        match self {
            AnyCache::KeyCache(cache) => cache.get_or_load_latest(id, loader).await,
            AnyCache::NeverCache(cache) => cache.get_or_load_latest(id, loader).await,
        }
    }
    
    async fn close(&self) -> Result<()> {
        match self {
            AnyCache::KeyCache(cache) => cache.close().await,
            AnyCache::NeverCache(_) => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl KeyCacher for NeverCache {
    async fn get_or_load<F, Fut>(&self, 
        meta: KeyMeta, 
        loader: F
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send
    {
        let key = loader(meta).await?;
        Ok(Arc::new(CachedCryptoKey::new(key)))
    }
    
    async fn get_or_load_latest<F, Fut>(&self, 
        id: &str, 
        loader: F
    ) -> Result<Arc<CachedCryptoKey>>
    where
        F: FnOnce(KeyMeta) -> Fut + Send,
        Fut: std::future::Future<Output = Result<CryptoKey>> + Send
    {
        let meta = KeyMeta {
            id: id.to_string(),
            created: 0,
        };
        
        let key = loader(meta).await?;
        Ok(Arc::new(CachedCryptoKey::new(key)))
    }
    
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
