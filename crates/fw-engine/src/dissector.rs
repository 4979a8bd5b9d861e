use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use filewhisperer_classify::{classify_and_hash, data_flavor, detect_encoding, file_flavor};
use filewhisperer_extractors::{ExtractInput, FlavorRegistry};
use filewhisperer_identity::IdAllocator;
use filewhisperer_types::{Flavor, Node, NodeId, Payload, Tree};
use tracing::{debug, error};

use crate::batch::BatchItem;
use crate::metrics::ExtractorLabels;
use crate::{BatchProcessor, EngineError, EngineMetrics, EngineResult};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs the digest algorithm over one subtree: classify, analyze, extract,
/// batch-accelerate eligible siblings, and recurse. Holds no per-request
/// state of its own beyond the flavor registry and id allocator, so one
/// instance is reused across requests by [`crate::EnginePool`].
pub struct Dissector {
    registry: Arc<FlavorRegistry>,
    ids: IdAllocator,
    batch: Option<Arc<BatchProcessor>>,
    metrics: Arc<EngineMetrics>,
}

impl Dissector {
    pub fn new(registry: Arc<FlavorRegistry>, ids: IdAllocator, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            registry,
            ids,
            batch: None,
            metrics,
        }
    }

    pub fn with_batch_processor(mut self, batch: Arc<BatchProcessor>) -> Self {
        self.batch = Some(batch);
        self
    }

    /// Digest a fresh request into a populated [`Tree`]. `root_id`, when
    /// given, is used verbatim instead of allocating a fresh snowflake id.
    pub async fn dissect(
        &self,
        payload: Payload,
        passwords: Vec<String>,
        pdf_max_pages: u32,
        word_max_pages: u32,
        root_id: Option<i64>,
    ) -> EngineResult<Tree> {
        let mut tree = Tree::new();
        let mut root = Node::root(payload, passwords, pdf_max_pages, word_max_pages);
        if let Some(id) = root_id {
            root.id = id;
        }
        let root_node_id = tree.insert_root(root);
        self.digest_node(&mut tree, root_node_id, false).await?;
        Ok(tree)
    }

    /// Classify a node in place (step 3): compute hashes/MIME for a file, or
    /// run encoding detection for a data fragment, and set its flavor.
    fn classify(&self, tree: &mut Tree, id: NodeId) {
        let node = tree.get_mut(id);
        if node.id == 0 {
            node.id = self.ids.next_id();
        }
        match &mut node.payload {
            Payload::File(file) => {
                classify_and_hash(file);
                node.flavor = file_flavor(file);
            }
            Payload::Data(data) => {
                let outcome = detect_encoding(&data.content);
                node.meta.strings.insert("encoding".to_owned(), outcome.encoding);
                node.meta.numbers.insert("encoding_confidence".to_owned(), outcome.confidence);
                if let Some(reason) = outcome.detect_msg {
                    node.meta.strings.insert("encoding_detect_message".to_owned(), reason);
                }
                node.flavor = data_flavor(data);
            }
        }
    }

    /// Run every analyzer and extractor registered for `id`'s flavor (steps
    /// 5–6), returning the child payloads the extractors produced. Never
    /// recurses and never inserts children — the caller does both.
    fn analyze_and_extract(&self, tree: &mut Tree, id: NodeId) -> EngineResult<Vec<Payload>> {
        let node = tree.get(id);
        let flavor = node.flavor;
        let passwords = node.passwords.clone();
        let pdf_max_pages = node.pdf_max_pages;
        let word_max_pages = node.word_max_pages;

        let analyzers = self.registry.analyzers_for(flavor).to_vec();
        let extractors = self.registry.extractors_for(flavor).to_vec();

        let node = tree.get_mut(id);
        let payload = node.payload.clone();
        let mut meta = std::mem::take(&mut node.meta);

        for analyzer in &analyzers {
            let started = Instant::now();
            let mut input = ExtractInput {
                payload: &payload,
                passwords: &passwords,
                pdf_max_pages,
                word_max_pages,
                meta: &mut meta,
            };
            let result = analyzer.analyze(&mut input);
            let labels = ExtractorLabels {
                flavor: format!("{flavor:?}"),
                extractor: analyzer.name().to_owned(),
            };
            self.metrics
                .extractor_duration
                .get_or_create(&labels)
                .observe(started.elapsed().as_micros() as f64);
            meta.record_duration(analyzer.name(), started.elapsed().as_micros() as i64);
            if let Err(e) = result {
                self.metrics.extractor_errors.get_or_create(&labels).inc();
                meta.append_error(analyzer.name(), e.message());
            }
        }

        let mut children = Vec::new();
        let mut fatal = None;
        for extractor in &extractors {
            let started = Instant::now();
            let mut input = ExtractInput {
                payload: &payload,
                passwords: &passwords,
                pdf_max_pages,
                word_max_pages,
                meta: &mut meta,
            };
            let result = extractor.extract(&mut input);
            let labels = ExtractorLabels {
                flavor: format!("{flavor:?}"),
                extractor: extractor.name().to_owned(),
            };
            self.metrics
                .extractor_duration
                .get_or_create(&labels)
                .observe(started.elapsed().as_micros() as f64);
            meta.record_duration(extractor.name(), started.elapsed().as_micros() as i64);
            match result {
                Ok(produced) => children.extend(produced),
                Err(e) if e.is_fatal() => {
                    self.metrics.extractor_errors.get_or_create(&labels).inc();
                    error!(node_id = tree.get(id).id, flavor = ?flavor, extractor = extractor.name(), "fatal extractor failure");
                    fatal = Some(e);
                    break;
                }
                Err(e) => {
                    self.metrics.extractor_errors.get_or_create(&labels).inc();
                    meta.append_error(extractor.name(), e.message());
                }
            }
        }

        tree.get_mut(id).meta = meta;

        if let Some(e) = fatal {
            return Err(EngineError::Fatal(e));
        }
        Ok(children)
    }

    /// `already_classified` lets the caller skip step 3 when it already ran
    /// classification up front to learn a child's flavor for batching.
    fn digest_node<'a>(
        &'a self,
        tree: &'a mut Tree,
        id: NodeId,
        already_classified: bool,
    ) -> BoxFuture<'a, EngineResult<()>> {
        Box::pin(async move {
            let started = Instant::now();
            if !already_classified {
                self.classify(tree, id);
            }
            let children = self.analyze_and_extract(tree, id)?;

            let mut child_ids = Vec::with_capacity(children.len());
            for child_payload in children {
                let parent = tree.get(id).clone();
                let child = Node::child_of(&parent, child_payload);
                child_ids.push(tree.insert_child(id, child));
            }

            for &child_id in &child_ids {
                self.classify(tree, child_id);
            }

            let mut expanded: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
            if let Some(batch) = &self.batch {
                let mut groups: HashMap<Flavor, Vec<NodeId>> = HashMap::new();
                for &child_id in &child_ids {
                    let flavor = tree.get(child_id).flavor;
                    if flavor.batch_eligible() {
                        groups.entry(flavor).or_default().push(child_id);
                    }
                }

                for (flavor, members) in groups {
                    if members.len() < 2 {
                        continue;
                    }
                    let items: Vec<BatchItem> = members
                        .iter()
                        .map(|&child_id| {
                            let node = tree.get(child_id);
                            BatchItem {
                                child_id,
                                flavor,
                                payload: node.payload.clone(),
                                passwords: node.passwords.clone(),
                                pdf_max_pages: node.pdf_max_pages,
                                word_max_pages: node.word_max_pages,
                            }
                        })
                        .collect();

                    let outcomes = batch.run_group(flavor, items).await;
                    for (child_id, outcome) in outcomes {
                        if let Some(Ok(grandchildren)) = outcome {
                            let mut grandchild_ids = Vec::with_capacity(grandchildren.len());
                            for grandchild_payload in grandchildren {
                                let parent = tree.get(child_id).clone();
                                let grandchild = Node::child_of(&parent, grandchild_payload);
                                let grandchild_id = tree.insert_child(child_id, grandchild);
                                self.classify(tree, grandchild_id);
                                grandchild_ids.push(grandchild_id);
                            }
                            expanded.insert(child_id, grandchild_ids);
                        }
                    }
                }
            }

            for &child_id in &child_ids {
                if let Some(grandchild_ids) = expanded.get(&child_id) {
                    for &grandchild_id in grandchild_ids {
                        self.digest_node(tree, grandchild_id, true).await?;
                    }
                    continue;
                }
                self.digest_node(tree, child_id, true).await?;
            }

            debug!(
                node_id = tree.get(id).id,
                flavor = ?tree.get(id).flavor,
                elapsed_us = started.elapsed().as_micros() as i64,
                "digested node"
            );
            Ok(())
        })
    }
}
