use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::error;

use crate::{Dissector, EngineError, EngineMetrics, EngineResult};

/// A fixed-size pool of [`Dissector`] instances. Callers `acquire` an
/// instance (blocking up to a configured timeout) and get it back via the
/// guard's `Drop`, which resets the instance before returning it to the
/// free-list.
///
/// `Semaphore` bounds concurrent checkouts; the free-list itself is a
/// `parking_lot::Mutex<Vec<Dissector>>`, since the semaphore permit already
/// guarantees a slot is available whenever the mutex is taken.
pub struct EnginePool {
    free_list: Mutex<Vec<Dissector>>,
    semaphore: Arc<Semaphore>,
    acquire_timeout: Duration,
    metrics: Arc<EngineMetrics>,
}

impl EnginePool {
    pub fn new(instances: Vec<Dissector>, acquire_timeout: Duration, metrics: Arc<EngineMetrics>) -> Self {
        let size = instances.len();
        Self {
            free_list: Mutex::new(instances),
            semaphore: Arc::new(Semaphore::new(size)),
            acquire_timeout,
            metrics,
        }
    }

    /// Check out one instance, waiting up to the configured timeout.
    pub async fn acquire(&self) -> EngineResult<PooledDissector<'_>> {
        let permit = tokio::time::timeout(self.acquire_timeout, self.semaphore.acquire())
            .await
            .map_err(|_| {
                self.metrics.pool_acquire_timeouts.inc();
                error!("engine pool exhausted: acquire timed out");
                EngineError::PoolExhausted
            })?
            .expect("semaphore is never closed while the pool is alive");

        let dissector = self
            .free_list
            .lock()
            .pop()
            .expect("a semaphore permit guarantees a free instance");

        permit.forget();
        Ok(PooledDissector {
            pool: self,
            dissector: Some(dissector),
        })
    }
}

/// A checked-out [`Dissector`]. Returns it to the pool and releases the
/// semaphore permit when dropped.
pub struct PooledDissector<'a> {
    pool: &'a EnginePool,
    dissector: Option<Dissector>,
}

impl std::ops::Deref for PooledDissector<'_> {
    type Target = Dissector;

    fn deref(&self) -> &Dissector {
        self.dissector.as_ref().expect("dissector taken only on drop")
    }
}

impl Drop for PooledDissector<'_> {
    fn drop(&mut self) {
        if let Some(dissector) = self.dissector.take() {
            self.pool.free_list.lock().push(dissector);
            self.pool.semaphore.add_permits(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use filewhisperer_extractors::FlavorRegistry;
    use filewhisperer_identity::IdAllocator;

    use super::*;
    use crate::Dissector;

    fn make_pool(size: usize) -> EnginePool {
        let registry = Arc::new(FlavorRegistry::standard());
        let mut metrics_registry = prometheus_client::registry::Registry::default();
        let metrics = Arc::new(crate::EngineMetrics::new(&mut metrics_registry));
        let instances = (0..size)
            .map(|_| Dissector::new(registry.clone(), IdAllocator::new(), metrics.clone()))
            .collect();
        EnginePool::new(instances, Duration::from_millis(200), metrics)
    }

    #[tokio::test]
    async fn acquire_and_release_recycles_the_same_instance_count() {
        let pool = make_pool(1);
        {
            let _guard = pool.acquire().await.unwrap();
            assert_eq!(pool.free_list.lock().len(), 0);
        }
        assert_eq!(pool.free_list.lock().len(), 1);
    }

    #[tokio::test]
    async fn exhaustion_times_out() {
        let pool = make_pool(1);
        let _held = pool.acquire().await.unwrap();
        let result = pool.acquire().await;
        assert!(matches!(result, Err(EngineError::PoolExhausted)));
    }
}
