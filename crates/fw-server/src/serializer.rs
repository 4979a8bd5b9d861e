use std::path::Path;

use filewhisperer_types::{Payload, Tree};

use crate::error::ServiceError;
use crate::proto;

/// Breadth-first walk of a digested [`Tree`] into the wire reply. File
/// payload bytes are written to `<output_dir>/<uuid>` as a side effect;
/// the wire node carries that UUID as its path, never the bytes inline.
pub fn serialize(tree: &Tree, output_dir: &Path) -> Result<proto::DissectReply, ServiceError> {
    std::fs::create_dir_all(output_dir)?;

    let mut nodes = Vec::with_capacity(tree.len());
    for node_id in tree.bfs_order() {
        let node = tree.get(node_id);
        let parent_id = node.parent.map(|p| tree.get(p).id).unwrap_or(0);
        let children: Vec<i64> = node.children.iter().map(|&c| tree.get(c).id).collect();

        let payload = match &node.payload {
            Payload::File(file) => {
                let dest = output_dir.join(&node.uuid);
                std::fs::write(&dest, &file.content)?;
                proto::node::Payload::File(proto::FileMsg {
                    path: node.uuid.clone(),
                    name: file.name.clone(),
                    extension: file.extension.clone(),
                    size: file.size,
                    mime_type: file.mime_type.clone(),
                    md5: file.md5.clone(),
                    sha1: file.sha1.clone(),
                    sha256: file.sha256.clone(),
                })
            }
            Payload::Data(data) => proto::node::Payload::Data(proto::DataMsg {
                r#type: data.kind.clone(),
                content: data.content.clone(),
            }),
        };

        nodes.push(proto::Node {
            id: node.id,
            parent_id,
            children,
            payload: Some(payload),
            meta: Some(proto::MetaMsg {
                map_string: node.meta.strings.clone().into_iter().collect(),
                map_number: node.meta.numbers.clone().into_iter().collect(),
                map_bool: node.meta.booleans.clone().into_iter().collect(),
            }),
        });
    }

    Ok(proto::DissectReply { tree: nodes })
}

#[cfg(test)]
mod tests {
    use filewhisperer_types::{FilePayload, MetaMap, Node};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn file_bytes_land_at_output_dir_slash_uuid() {
        let mut tree = Tree::new();
        let payload = Payload::File(FilePayload::new("a.txt", b"hello".to_vec()));
        let mut root = Node::root(payload, Vec::new(), 10, 10);
        root.id = 1;
        let uuid = root.uuid.clone();
        root.meta = MetaMap::new();
        tree.insert_root(root);

        let dir = tempdir().unwrap();
        let reply = serialize(&tree, dir.path()).unwrap();

        assert_eq!(reply.tree.len(), 1);
        let written = std::fs::read(dir.path().join(&uuid)).unwrap();
        assert_eq!(written, b"hello");
    }
}
