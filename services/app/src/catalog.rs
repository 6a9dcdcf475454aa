//! services/app/src/catalog.rs
//!
//! The animal listing as the app sees it: one fetch from the `AnimalSource`
//! reused until it is older than the configured TTL.

use adoption_core::domain::{Animal, Species, User};
use adoption_core::ports::{AnimalSource, PortError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Animal not found: {0}")]
    NotFound(String),
    #[error("Could not load the animal listing: {0}")]
    Source(#[from] PortError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

struct CachedListing {
    fetched_at: Instant,
    animals: Arc<Vec<Animal>>,
}

pub struct AnimalService {
    source: Arc<dyn AnimalSource>,
    ttl: Duration,
    cache: Mutex<Option<CachedListing>>,
}

impl AnimalService {
    pub fn new(source: Arc<dyn AnimalSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// Every listed animal, served from the cache while it is fresh.
    pub async fn list(&self) -> CatalogResult<Arc<Vec<Animal>>> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!("Animal listing served from cache.");
                return Ok(cached.animals.clone());
            }
        }
        let animals = self.fetch().await?;
        *cache = Some(CachedListing {
            fetched_at: Instant::now(),
            animals: animals.clone(),
        });
        Ok(animals)
    }

    /// Drops the cached listing and fetches a new one.
    pub async fn refresh(&self) -> CatalogResult<Arc<Vec<Animal>>> {
        self.cache.lock().await.take();
        self.list().await
    }

    pub async fn get(&self, id: &str) -> CatalogResult<Animal> {
        self.list()
            .await?
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// The user's favorited animals in listing order. Favorites pointing at
    /// animals no longer listed are skipped.
    pub async fn favorites_of(&self, user: &User) -> CatalogResult<Vec<Animal>> {
        let animals = self.list().await?;
        Ok(animals
            .iter()
            .filter(|a| user.is_favorite(&a.id))
            .cloned()
            .collect())
    }

    pub async fn by_species(&self, species: Species) -> CatalogResult<Vec<Animal>> {
        let animals = self.list().await?;
        Ok(animals
            .iter()
            .filter(|a| a.species == species)
            .cloned()
            .collect())
    }

    async fn fetch(&self) -> CatalogResult<Arc<Vec<Animal>>> {
        match self.source.fetch_all().await {
            Ok(animals) => {
                info!(count = animals.len(), "Animal listing fetched.");
                Ok(Arc::new(animals))
            }
            Err(e) => {
                error!("Failed to fetch the animal listing: {:?}", e);
                Err(e.into())
            }
        }
    }
}
