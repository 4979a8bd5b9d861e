//! The digest algorithm (classify → analyze → extract → batch → recurse),
//! a bounded pool of reusable [`Dissector`] instances, and the per-flavor
//! batch accelerator that runs heavy extractors concurrently for groups of
//! batch-eligible siblings.

mod batch;
mod dissector;
mod error;
mod metrics;
mod pool;

pub use batch::{BatchConfig, BatchItem, BatchProcessor, FlavorPoolConfig};
pub use dissector::Dissector;
pub use error::{EngineError, EngineResult};
pub use metrics::{EngineMetrics, ExtractorLabels};
pub use pool::{EnginePool, PooledDissector};

pub use filewhisperer_types::NodeId;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use filewhisperer_extractors::FlavorRegistry;
    use filewhisperer_identity::IdAllocator;
    use filewhisperer_types::{FilePayload, Flavor, Payload};

    use super::*;

    fn test_metrics() -> Arc<EngineMetrics> {
        let mut registry = prometheus_client::registry::Registry::default();
        Arc::new(EngineMetrics::new(&mut registry))
    }

    fn dissector() -> Dissector {
        Dissector::new(Arc::new(FlavorRegistry::standard()), IdAllocator::new(), test_metrics())
    }

    #[tokio::test]
    async fn text_plain_with_urls_emits_two_ordered_children() {
        let payload = Payload::File(FilePayload::new(
            "note.txt",
            b"visit https://a.test and http://b.test/x".to_vec(),
        ));
        let tree = dissector()
            .dissect(payload, Vec::new(), 10, 10, None)
            .await
            .unwrap();

        let root_id = tree.root().unwrap();
        let root = tree.get(root_id);
        assert_eq!(root.children.len(), 2);

        let first = tree.get(root.children[0]).payload.as_data().unwrap();
        let second = tree.get(root.children[1]).payload.as_data().unwrap();
        assert_eq!(String::from_utf8_lossy(&first.content), "https://a.test");
        assert_eq!(String::from_utf8_lossy(&second.content), "http://b.test/x");
    }

    #[tokio::test]
    async fn unclassifiable_bytes_become_a_single_leaf_node() {
        let payload = Payload::File(FilePayload::new("blob.bin", vec![0xDE, 0xAD, 0xBE, 0xEF]));
        let tree = dissector()
            .dissect(payload, Vec::new(), 10, 10, None)
            .await
            .unwrap();

        assert_eq!(tree.len(), 1);
        let root = tree.get(tree.root().unwrap());
        assert!(root.children.is_empty());
    }

    #[tokio::test]
    async fn empty_file_hashes_the_empty_string() {
        let payload = Payload::File(FilePayload::new("empty.txt", Vec::new()));
        let tree = dissector()
            .dissect(payload, Vec::new(), 10, 10, None)
            .await
            .unwrap();

        let root = tree.get(tree.root().unwrap());
        let file = root.payload.as_file().unwrap();
        assert_eq!(file.size, 0);
        assert_eq!(file.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(root.flavor, Flavor::Other);
        assert!(root.children.is_empty());
    }

    #[tokio::test]
    async fn children_inherit_passwords_and_page_limits_verbatim() {
        let payload = Payload::File(FilePayload::new("note.html", b"<a href='https://x'>x</a>".to_vec()));
        let tree = dissector()
            .dissect(payload, vec!["secret".to_owned()], 3, 7, None)
            .await
            .unwrap();

        let root = tree.get(tree.root().unwrap());
        for &child_id in &root.children {
            let child = tree.get(child_id);
            assert_eq!(child.passwords, vec!["secret".to_owned()]);
            assert_eq!(child.pdf_max_pages, 3);
            assert_eq!(child.word_max_pages, 7);
        }
    }

    fn make_docx(text: &str) -> Vec<u8> {
        use std::io::Write;
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
            zip.start_file("word/document.xml", options).unwrap();
            let xml = format!(
                r#"<?xml version="1.0"?><w:document xmlns:w="ns"><w:body><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:body></w:document>"#
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    fn make_archive(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
        use std::io::Write;
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
            for (name, content) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    #[tokio::test]
    async fn batch_processed_grandchildren_get_classified_and_recursed_into() {
        let doc_a = make_docx("first document");
        let doc_b = make_docx("second document");
        let archive = make_archive(&[("a.docx", doc_a), ("b.docx", doc_b)]);

        let registry = Arc::new(FlavorRegistry::standard());
        let metrics = test_metrics();
        let batch_config = BatchConfig {
            word: FlavorPoolConfig {
                enabled: true,
                workers: 2,
            },
            ..Default::default()
        };
        let batch = Arc::new(BatchProcessor::new(registry.clone(), batch_config, metrics.clone()));
        let dissector =
            Dissector::new(registry, IdAllocator::new(), metrics).with_batch_processor(batch);

        let payload = Payload::File(FilePayload::new("bundle.zip", archive));
        let tree = dissector
            .dissect(payload, Vec::new(), 10, 10, None)
            .await
            .unwrap();

        let mut seen_ids = std::collections::HashSet::new();
        for id in tree.bfs_order() {
            let node = tree.get(id);
            assert_ne!(node.id, 0, "every digested node must get a non-zero id");
            assert!(seen_ids.insert(node.id), "node ids must be unique within a reply");
        }

        let root = tree.get(tree.root().unwrap());
        assert_eq!(root.children.len(), 2);
        for &child_id in &root.children {
            let child = tree.get(child_id);
            assert_eq!(child.flavor, Flavor::Docx);
            assert_eq!(child.children.len(), 1, "batch-processed TEXT grandchild must be inserted");
            let grandchild = tree.get(child.children[0]);
            assert_eq!(grandchild.flavor, Flavor::TextPlain);
            assert_ne!(grandchild.id, 0, "grandchild must be classified, not left at id 0");
        }
    }

    #[tokio::test]
    async fn explicit_root_id_is_used_verbatim() {
        let payload = Payload::File(FilePayload::new("a.txt", b"hello".to_vec()));
        let tree = dissector()
            .dissect(payload, Vec::new(), 10, 10, Some(42))
            .await
            .unwrap();

        assert_eq!(tree.get(tree.root().unwrap()).id, 42);
    }
}
