//! Serializes a single box's reachable blocks into one archive file: a list
//! of root CIDs followed by every internally-reachable block, each carrying
//! enough of its decoded form to be replayed without the original store.
//!
//! The archive format itself is unspecified by the splitting algorithm; this
//! is one concrete encoding, not a format other tools are expected to read.

use std::collections::HashSet;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use thiserror::Error;

use dagsplitter_core::archive::internal_links;
use dagsplitter_core::cid::Cid;
use dagsplitter_core::node::{Link, Node, NodeKind, RawNode, StructuredNode};
use dagsplitter_core::packer::DagBox;
use dagsplitter_core::store::BlockStore;
use dagsplitter_core::CancelToken;

const MAGIC: &[u8; 4] = b"DSA1";

#[derive(Debug, Error)]
pub enum ArchiveWriteFailure {
    #[error("failed to fetch block {cid} while writing archive: {source}")]
    FetchFailure {
        cid: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("i/o error writing archive: {0}")]
    Io(#[from] io::Error),

    #[error("archive is corrupt: {0}")]
    Corrupt(String),
}

type Result<T> = std::result::Result<T, ArchiveWriteFailure>;

/// Writes `dag_box` to `sink`: its roots, then every block reachable from
/// them through links the splitter considers internal to this box. Blocks
/// are visited depth-first from the roots in order, each written once.
pub fn write_archive<S: BlockStore, W: Write>(
    store: &S,
    dag_box: &DagBox,
    cancel: &CancelToken,
    sink: &mut W,
) -> Result<()> {
    sink.write_all(MAGIC)?;
    write_cid_list(sink, &dag_box.roots)?;

    let mut seen: HashSet<Cid> = HashSet::new();
    let mut records: Vec<(Cid, Node)> = Vec::new();
    let mut stack = dag_box.roots.clone();

    while let Some(cid) = stack.pop() {
        if !seen.insert(cid.clone()) {
            continue;
        }
        cancel.check().map_err(|e| ArchiveWriteFailure::Corrupt(e.to_string()))?;
        let node = store.get(&cid, cancel).map_err(|e| ArchiveWriteFailure::FetchFailure {
            cid: cid.to_string(),
            source: anyhow::anyhow!(e),
        })?;
        for link in internal_links(dag_box, &node) {
            stack.push(link.target.clone());
        }
        records.push((cid, node));
    }

    debug!("writing archive with {} blocks", records.len());
    sink.write_u32::<LittleEndian>(records.len() as u32)?;
    for (cid, node) in &records {
        write_cid(sink, cid)?;
        write_node(sink, node)?;
    }

    Ok(())
}

/// Reads back an archive written by [`write_archive`]. Used by tests and by
/// callers that want to verify a box round-trips without re-fetching from
/// the original store.
pub fn read_archive<R: Read>(source: &mut R) -> Result<(Vec<Cid>, Vec<(Cid, Node)>)> {
    let mut magic = [0u8; 4];
    source.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(ArchiveWriteFailure::Corrupt("bad magic".into()));
    }

    let roots = read_cid_list(source)?;
    let block_count = source.read_u32::<LittleEndian>()?;
    let mut records = Vec::with_capacity(block_count as usize);
    for _ in 0..block_count {
        let cid = read_cid(source)?;
        let node = read_node(source)?;
        records.push((cid, node));
    }

    Ok((roots, records))
}

fn write_cid<W: Write>(sink: &mut W, cid: &Cid) -> Result<()> {
    sink.write_u64::<LittleEndian>(cid.codec())?;
    let digest = cid.digest();
    sink.write_u32::<LittleEndian>(digest.len() as u32)?;
    sink.write_all(digest)?;
    Ok(())
}

fn read_cid<R: Read>(source: &mut R) -> Result<Cid> {
    let codec = source.read_u64::<LittleEndian>()?;
    let len = source.read_u32::<LittleEndian>()? as usize;
    let mut digest = vec![0u8; len];
    source.read_exact(&mut digest)?;
    Ok(Cid::new(codec, digest))
}

fn write_cid_list<W: Write>(sink: &mut W, cids: &[Cid]) -> Result<()> {
    sink.write_u32::<LittleEndian>(cids.len() as u32)?;
    for cid in cids {
        write_cid(sink, cid)?;
    }
    Ok(())
}

fn read_cid_list<R: Read>(source: &mut R) -> Result<Vec<Cid>> {
    let count = source.read_u32::<LittleEndian>()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(read_cid(source)?);
    }
    Ok(out)
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

fn kind_from_tag(tag: u8) -> Result<NodeKind> {
    match tag {
        0 => Ok(NodeKind::File),
        1 => Ok(NodeKind::RawLeaf),
        2 => Ok(NodeKind::Directory),
        3 => Ok(NodeKind::HamtShard),
        4 => Ok(NodeKind::Metadata),
        5 => Ok(NodeKind::Symlink),
        other => Err(ArchiveWriteFailure::Corrupt(format!("unknown node kind tag {other}"))),
    }
}

fn write_node<W: Write>(sink: &mut W, node: &Node) -> Result<()> {
    match node {
        Node::Raw(raw) => {
            sink.write_u8(0)?;
            sink.write_u64::<LittleEndian>(raw.payload.len() as u64)?;
            sink.write_all(&raw.payload)?;
        }
        Node::Structured(s) => {
            sink.write_u8(1)?;
            sink.write_u8(kind_tag(s.kind))?;
            sink.write_u64::<LittleEndian>(s.encoded_len)?;
            match s.subtree_size {
                Some(size) => {
                    sink.write_u8(1)?;
                    sink.write_u64::<LittleEndian>(size)?;
                }
                None => sink.write_u8(0)?,
            }
            sink.write_u32::<LittleEndian>(s.links.len() as u32)?;
            for link in &s.links {
                let name_bytes = link.name.as_bytes();
                sink.write_u16::<LittleEndian>(name_bytes.len() as u16)?;
                sink.write_all(name_bytes)?;
                write_cid(sink, &link.target)?;
            }
        }
    }
    Ok(())
}

fn read_node<R: Read>(source: &mut R) -> Result<Node> {
    let tag = source.read_u8()?;
    match tag {
        0 => {
            let len = source.read_u64::<LittleEndian>()? as usize;
            let mut payload = vec![0u8; len];
            source.read_exact(&mut payload)?;
            Ok(Node::Raw(RawNode::new(payload)))
        }
        1 => {
            let kind = kind_from_tag(source.read_u8()?)?;
            let encoded_len = source.read_u64::<LittleEndian>()?;
            let subtree_size = match source.read_u8()? {
                0 => None,
                _ => Some(source.read_u64::<LittleEndian>()?),
            };
            let link_count = source.read_u32::<LittleEndian>()?;
            let mut links = Vec::with_capacity(link_count as usize);
            for _ in 0..link_count {
                let name_len = source.read_u16::<LittleEndian>()? as usize;
                let mut name_bytes = vec![0u8; name_len];
                source.read_exact(&mut name_bytes)?;
                let name = String::from_utf8(name_bytes)
                    .map_err(|e| ArchiveWriteFailure::Corrupt(e.to_string()))?;
                let target = read_cid(source)?;
                links.push(Link::new(name, target));
            }
            Ok(Node::Structured(StructuredNode {
                kind,
                encoded_len,
                subtree_size,
                links,
            }))
        }
        other => Err(ArchiveWriteFailure::Corrupt(format!("unknown node tag {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagsplitter_core::error::{Result as CoreResult, SplitError};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct FixtureStore(HashMap<Cid, Node>);

    impl BlockStore for FixtureStore {
        fn get(&self, cid: &Cid, _cancel: &CancelToken) -> CoreResult<Node> {
            self.0.get(cid).cloned().ok_or_else(|| SplitError::FetchFailure {
                cid: cid.to_string(),
                source: anyhow::anyhow!("missing"),
            })
        }
    }

    #[test]
    fn round_trips_a_small_box() {
        let root = Cid::new(0x70, vec![0]);
        let child = Cid::new(0x55, vec![1]);
        let external = Cid::new(0x70, vec![2]);

        let mut blocks = HashMap::new();
        blocks.insert(
            root.clone(),
            Node::Structured(StructuredNode {
                kind: NodeKind::Directory,
                encoded_len: 50,
                subtree_size: Some(150),
                links: vec![
                    Link::new("child", child.clone()),
                    Link::new("external", external.clone()),
                ],
            }),
        );
        blocks.insert(child.clone(), Node::Raw(RawNode::new(vec![7u8; 100])));
        let store = FixtureStore(blocks);

        let dag_box = DagBox {
            roots: vec![root.clone()],
            external: vec![external],
        };

        let mut buf = Vec::new();
        write_archive(&store, &dag_box, &CancelToken::new(), &mut buf).unwrap();

        let (roots, records) = read_archive(&mut &buf[..]).unwrap();
        assert_eq!(roots, vec![root.clone()]);
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|(cid, _)| *cid == root));
        assert!(records.iter().any(|(cid, _)| *cid == child));
    }

    #[test]
    fn rejects_a_buffer_with_bad_magic() {
        let buf = vec![0u8; 4];
        assert!(matches!(
            read_archive(&mut &buf[..]),
            Err(ArchiveWriteFailure::Corrupt(_))
        ));
    }

    #[test]
    fn writes_to_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box-0.archive");
        let root = Cid::new(0x55, vec![9]);
        let mut blocks = HashMap::new();
        blocks.insert(root.clone(), Node::Raw(RawNode::new(vec![1, 2, 3])));
        let store = FixtureStore(blocks);
        let dag_box = DagBox {
            roots: vec![root],
            external: vec![],
        };

        let mut file = std::fs::File::create(&path).unwrap();
        write_archive(&store, &dag_box, &CancelToken::new(), &mut file).unwrap();
        drop(file);

        let mut file = std::fs::File::open(&path).unwrap();
        let (roots, records) = read_archive(&mut file).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(records.len(), 1);
    }
}
