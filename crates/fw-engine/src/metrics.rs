use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ExtractorLabels {
    pub flavor: String,
    pub extractor: String,
}

#[derive(Clone, Debug)]
pub struct EngineMetrics {
    pub extractor_duration: Family<ExtractorLabels, Histogram>,
    pub extractor_errors: Family<ExtractorLabels, Counter>,
    pub pool_acquire_timeouts: Counter,
}

impl EngineMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let engine_registry = registry.sub_registry_with_prefix("engine");

        let extractor_duration =
            Family::<ExtractorLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(1.0, 2.0, 10))
            });
        engine_registry.register(
            "extractor_duration_microseconds",
            "Per-extractor wall-clock duration",
            extractor_duration.clone(),
        );

        let extractor_errors = Family::<ExtractorLabels, Counter>::default();
        engine_registry.register(
            "extractor_errors_total",
            "Recoverable and fatal extractor failures",
            extractor_errors.clone(),
        );

        let pool_acquire_timeouts = Counter::default();
        engine_registry.register(
            "pool_acquire_timeouts_total",
            "EnginePool acquire calls that exhausted their timeout",
            pool_acquire_timeouts.clone(),
        );

        Self {
            extractor_duration,
            extractor_errors,
            pool_acquire_timeouts,
        }
    }
}
