//! A `BlockStore` that reads each block from its own file in a directory,
//! named after the block's CID. This is the store the command-line front
//! end uses when there's no richer backend available: one file per block,
//! written with [`encode_node`] ahead of time.

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use dagsplitter_core::cancel::CancelToken;
use dagsplitter_core::cid::Cid;
use dagsplitter_core::error::{Result, SplitError};
use dagsplitter_core::node::{Link, Node, NodeKind, RawNode, StructuredNode};
use dagsplitter_core::store::BlockStore;

/// Reads blocks lazily from `root`, one file per CID, and never caches them.
pub struct FileBlockStore {
    root: PathBuf,
}

impl FileBlockStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileBlockStore { root: root.into() }
    }

    fn path_for(&self, cid: &Cid) -> PathBuf {
        self.root.join(file_name(cid))
    }
}

impl BlockStore for FileBlockStore {
    fn get(&self, cid: &Cid, _cancel: &CancelToken) -> Result<Node> {
        let path = self.path_for(cid);
        let bytes = fs::read(&path).map_err(|e| SplitError::FetchFailure {
            cid: cid.to_string(),
            source: anyhow::anyhow!(e).context(format!("reading {}", path.display())),
        })?;
        decode_node(&bytes).map_err(|e| SplitError::FetchFailure {
            cid: cid.to_string(),
            source: anyhow::anyhow!(e),
        })
    }
}

fn file_name(cid: &Cid) -> String {
    format!("{:016x}-{}", cid.codec(), hex(cid.digest()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Writes a block's on-disk representation for [`FileBlockStore`] to read
/// back later. Exposed so callers populating a directory (the CLI, or
/// tests) don't need to duplicate the wire format.
pub fn write_block_file(dir: &Path, cid: &Cid, node: &Node) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(file_name(cid)), encode_node(node)?)?;
    Ok(())
}

fn encode_node(node: &Node) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    match node {
        Node::Raw(raw) => {
            out.write_u8(0)?;
            out.write_u64::<LittleEndian>(raw.payload.len() as u64)?;
            out.extend_from_slice(&raw.payload);
        }
        Node::Structured(s) => {
            out.write_u8(1)?;
            out.write_u8(kind_tag(s.kind))?;
            out.write_u64::<LittleEndian>(s.encoded_len)?;
            match s.subtree_size {
                Some(size) => {
                    out.write_u8(1)?;
                    out.write_u64::<LittleEndian>(size)?;
                }
                None => out.write_u8(0)?,
            }
            out.write_u32::<LittleEndian>(s.links.len() as u32)?;
            for link in &s.links {
                let name = link.name.as_bytes();
                out.write_u16::<LittleEndian>(name.len() as u16)?;
                out.extend_from_slice(name);
                out.write_u64::<LittleEndian>(link.target.codec())?;
                let digest = link.target.digest();
                out.write_u32::<LittleEndian>(digest.len() as u32)?;
                out.extend_from_slice(digest);
            }
        }
    }
    Ok(out)
}

fn decode_node(bytes: &[u8]) -> anyhow::Result<Node> {
    let mut cursor = bytes;
    match cursor.read_u8()? {
        0 => {
            let len = cursor.read_u64::<LittleEndian>()? as usize;
            let mut payload = vec![0u8; len];
            std::io::Read::read_exact(&mut cursor, &mut payload)?;
            Ok(Node::Raw(RawNode::new(payload)))
        }
        1 => {
            let kind = kind_from_tag(cursor.read_u8()?)?;
            let encoded_len = cursor.read_u64::<LittleEndian>()?;
            let subtree_size = match cursor.read_u8()? {
                0 => None,
                _ => Some(cursor.read_u64::<LittleEndian>()?),
            };
            let link_count = cursor.read_u32::<LittleEndian>()?;
            let mut links = Vec::with_capacity(link_count as usize);
            for _ in 0..link_count {
                let name_len = cursor.read_u16::<LittleEndian>()? as usize;
                let mut name_bytes = vec![0u8; name_len];
                std::io::Read::read_exact(&mut cursor, &mut name_bytes)?;
                let name = String::from_utf8(name_bytes)?;
                let codec = cursor.read_u64::<LittleEndian>()?;
                let digest_len = cursor.read_u32::<LittleEndian>()? as usize;
                let mut digest = vec![0u8; digest_len];
                std::io::Read::read_exact(&mut cursor, &mut digest)?;
                links.push(Link::new(name, Cid::new(codec, digest)));
            }
            Ok(Node::Structured(StructuredNode {
                kind,
                encoded_len,
                subtree_size,
                links,
            }))
        }
        other => anyhow::bail!("unknown block file tag {other}"),
    }
}

fn kind_tag(kind: NodeKind) -> u8 {
    match kind {
        NodeKind::File => 0,
        NodeKind::RawLeaf => 1,
        NodeKind::Directory => 2,
        NodeKind::HamtShard => 3,
        NodeKind::Metadata => 4,
        NodeKind::Symlink => 5,
    }
}

fn kind_from_tag(tag: u8) -> anyhow::Result<NodeKind> {
    match tag {
        0 => Ok(NodeKind::File),
        1 => Ok(NodeKind::RawLeaf),
        2 => Ok(NodeKind::Directory),
        3 => Ok(NodeKind::HamtShard),
        4 => Ok(NodeKind::Metadata),
        5 => Ok(NodeKind::Symlink),
        other => anyhow::bail!("unknown node kind tag {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_raw_block_through_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cid = Cid::new(0x55, vec![9, 9]);
        let node = Node::Raw(RawNode::new(vec![1, 2, 3, 4]));
        write_block_file(dir.path(), &cid, &node).unwrap();

        let store = FileBlockStore::new(dir.path());
        let fetched = store.get(&cid, &CancelToken::new()).unwrap();
        assert_eq!(fetched, node);
    }

    #[test]
    fn round_trips_a_structured_block_with_links() {
        let dir = tempfile::tempdir().unwrap();
        let cid = Cid::new(0x70, vec![1]);
        let child = Cid::new(0x55, vec![2]);
        let node = Node::Structured(StructuredNode {
            kind: NodeKind::Directory,
            encoded_len: 40,
            subtree_size: Some(140),
            links: vec![Link::new("child", child)],
        });
        write_block_file(dir.path(), &cid, &node).unwrap();

        let store = FileBlockStore::new(dir.path());
        let fetched = store.get(&cid, &CancelToken::new()).unwrap();
        assert_eq!(fetched, node);
    }

    #[test]
    fn missing_file_is_a_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlockStore::new(dir.path());
        let cid = Cid::new(0x55, vec![0]);
        assert!(matches!(
            store.get(&cid, &CancelToken::new()),
            Err(SplitError::FetchFailure { .. })
        ));
    }
}
