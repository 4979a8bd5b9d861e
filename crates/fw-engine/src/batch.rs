use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use filewhisperer_extractors::{ExtractInput, FlavorRegistry};
use filewhisperer_types::{ExtractResult, Flavor, MetaMap, Payload};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::metrics::ExtractorLabels;
use crate::{EngineMetrics, NodeId};

/// One flavor's process-level worker pool: a bound on concurrent native
/// extractor invocations, plus whether the pool accepts work at all.
#[derive(Clone, Copy, Debug)]
pub struct FlavorPoolConfig {
    pub enabled: bool,
    pub workers: usize,
}

impl Default for FlavorPoolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            workers: 4,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BatchConfig {
    pub ocr: FlavorPoolConfig,
    pub word: FlavorPoolConfig,
    pub pdf: FlavorPoolConfig,
}

fn deadline_for(flavor: Flavor) -> Duration {
    match flavor {
        Flavor::Image => Duration::from_secs(120),
        Flavor::Doc | Flavor::Docx | Flavor::Pdf => Duration::from_secs(300),
        _ => Duration::from_secs(300),
    }
}

/// Input for one child submitted to a batch; carries only its own bytes and
/// inherited limits, matching the per-task contract.
pub struct BatchItem {
    pub child_id: NodeId,
    pub flavor: Flavor,
    pub payload: Payload,
    pub passwords: Vec<String>,
    pub pdf_max_pages: u32,
    pub word_max_pages: u32,
}

/// Runs one extractor invocation per item concurrently, bounded by a
/// per-flavor semaphore, with a per-flavor deadline. A missing entry in the
/// returned map means the item should fall through to ordinary per-child
/// digest (pool disabled, submission failed, or deadline exceeded).
pub struct BatchProcessor {
    registry: Arc<FlavorRegistry>,
    semaphores: HashMap<Flavor, Arc<Semaphore>>,
    config: BatchConfig,
    metrics: Arc<EngineMetrics>,
}

impl BatchProcessor {
    pub fn new(registry: Arc<FlavorRegistry>, config: BatchConfig, metrics: Arc<EngineMetrics>) -> Self {
        let mut semaphores = HashMap::new();
        if config.ocr.enabled {
            semaphores.insert(Flavor::Image, Arc::new(Semaphore::new(config.ocr.workers.max(1))));
        }
        if config.word.enabled {
            let permits = Arc::new(Semaphore::new(config.word.workers.max(1)));
            semaphores.insert(Flavor::Doc, permits.clone());
            semaphores.insert(Flavor::Docx, permits);
        }
        if config.pdf.enabled {
            semaphores.insert(Flavor::Pdf, Arc::new(Semaphore::new(config.pdf.workers.max(1))));
        }
        Self {
            registry,
            semaphores,
            config,
            metrics,
        }
    }

    fn pool_enabled(&self, flavor: Flavor) -> bool {
        match flavor {
            Flavor::Image => self.config.ocr.enabled,
            Flavor::Doc | Flavor::Docx => self.config.word.enabled,
            Flavor::Pdf => self.config.pdf.enabled,
            _ => false,
        }
    }

    /// Submit a flavor-homogeneous group. Returns `None` for every item if
    /// the flavor's pool is disabled or the group is too small to bother
    /// batching; otherwise returns one outcome slot per item, `None` where
    /// that specific item should fall through to regular digest.
    pub async fn run_group(
        &self,
        flavor: Flavor,
        items: Vec<BatchItem>,
    ) -> HashMap<NodeId, Option<ExtractResult<Vec<Payload>>>> {
        let mut outcomes = HashMap::new();
        if items.len() < 2 || !self.pool_enabled(flavor) {
            return outcomes;
        }
        let Some(semaphore) = self.semaphores.get(&flavor).cloned() else {
            return outcomes;
        };

        let deadline = deadline_for(flavor);
        let registry = self.registry.clone();
        let metrics = self.metrics.clone();
        let mut join_set = JoinSet::new();

        for item in items {
            let semaphore = semaphore.clone();
            let registry = registry.clone();
            let metrics = metrics.clone();
            let child_id = item.child_id;
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = tokio::time::timeout(
                    deadline,
                    tokio::task::spawn_blocking(move || run_one(&registry, &metrics, &item)),
                )
                .await;
                match result {
                    Ok(Ok((_, outcome))) => (child_id, Some(outcome)),
                    Ok(Err(_)) | Err(_) => {
                        warn!(?flavor, "batch item timed out or its worker task panicked");
                        (child_id, None)
                    }
                }
            });
        }

        while let Some(joined) = join_set.join_next().await {
            if let Ok((child_id, outcome)) = joined {
                outcomes.insert(child_id, outcome);
            }
        }
        outcomes
    }
}

fn run_one(
    registry: &FlavorRegistry,
    metrics: &EngineMetrics,
    item: &BatchItem,
) -> (NodeId, ExtractResult<Vec<Payload>>) {
    let flavor = item.flavor;
    let mut meta = MetaMap::new();
    let mut input = ExtractInput {
        payload: &item.payload,
        passwords: &item.passwords,
        pdf_max_pages: item.pdf_max_pages,
        word_max_pages: item.word_max_pages,
        meta: &mut meta,
    };

    let mut combined = Vec::new();
    let mut last_err = None;
    for extractor in registry.extractors_for(flavor) {
        let started = std::time::Instant::now();
        let result = extractor.extract(&mut input);
        let labels = ExtractorLabels {
            flavor: format!("{flavor:?}"),
            extractor: extractor.name().to_owned(),
        };
        metrics
            .extractor_duration
            .get_or_create(&labels)
            .observe(started.elapsed().as_micros() as f64);
        match result {
            Ok(children) => combined.extend(children),
            Err(e) if e.is_fatal() => {
                metrics.extractor_errors.get_or_create(&labels).inc();
                last_err = Some(e);
                break;
            }
            Err(e) => {
                metrics.extractor_errors.get_or_create(&labels).inc();
                input.meta.append_error(extractor.name(), e.message());
            }
        }
    }

    (
        item.child_id,
        match last_err {
            Some(e) => Err(e),
            None => Ok(combined),
        },
    )
}
