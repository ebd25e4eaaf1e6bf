//! Command-line front end: parses a root CID and a box size budget, splits
//! the DAG rooted there, and writes one archive file per box.

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use human_size::{Byte, Size, SpecificSize};
use log::info;

use dagsplitter_archive::write_archive;
use dagsplitter_core::cid::Cid;
use dagsplitter_core::config::{Config, TraversalOrder};
use dagsplitter_core::walker::DagWalker;
use dagsplitter_core::CancelToken;
use dagsplitter_store::FileBlockStore;

/// Splits a content-addressed DAG into a sequence of size-bounded archive files.
#[derive(Parser, Debug)]
#[command(name = "dagsplitter")]
struct Cli {
    /// CID of the DAG's root node, as `<codec-hex>-<digest-hex>`.
    root_cid: String,

    /// Maximum size of each archive, accepting suffixes like `4M` or `512K`.
    max_size: String,

    /// Directory to read per-block files from (see `dagsplitter-store::FileBlockStore`).
    #[arg(long, default_value = "dagsplitter-blocks")]
    blocks_dir: PathBuf,

    /// Directory archives are written into.
    #[arg(long, default_value = "dagsplitter-car-files")]
    output_dir: PathBuf,

    /// Below this subtree size, a too-big node is deferred whole rather than split.
    #[arg(long, default_value_t = 0)]
    min_subgraph_size: u64,

    /// Reserved; selecting it is an `InvalidConfiguration` failure.
    #[arg(long)]
    breadth_first: bool,
}

fn parse_root_cid(s: &str) -> Result<Cid> {
    let (codec, digest) = s
        .split_once('-')
        .context("root-cid must be formatted as <codec-hex>-<digest-hex>")?;
    let codec = u64::from_str_radix(codec, 16).context("root-cid codec is not valid hex")?;
    let digest = hex_decode(digest).context("root-cid digest is not valid hex")?;
    Ok(Cid::new(codec, digest))
}

fn hex_decode(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        bail!("hex string has odd length");
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(Into::into))
        .collect()
}

fn ensure_output_dir(path: &std::path::Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        bail!("output path {} exists and is not a directory", path.display());
    }
    fs::create_dir_all(path)
        .with_context(|| format!("creating output directory {}", path.display()))?;
    Ok(())
}

fn box_file_name(root_cid: &str, index: usize, box_count: usize) -> String {
    let width = ((box_count.max(1) as f64).log10().ceil() as usize) + 1;
    format!("box-{}-{:0width$}.archive", root_cid, index, width = width)
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let traversal_order = if cli.breadth_first {
        TraversalOrder::BreadthFirst
    } else {
        TraversalOrder::DepthFirst
    };

    let max_size: Size = cli
        .max_size
        .parse()
        .map_err(|e| anyhow::anyhow!("{:?}", e))
        .context("max-size must be a byte count with an optional K/M/G suffix")?;
    let max_size_bytes: SpecificSize<Byte> = max_size.into();
    let box_max_size = max_size_bytes.value().round() as u64;

    let config = Config::new(box_max_size, cli.min_subgraph_size, traversal_order)
        .context("invalid configuration")?;

    let root = parse_root_cid(&cli.root_cid)?;
    ensure_output_dir(&cli.output_dir)?;

    let store = FileBlockStore::new(&cli.blocks_dir);
    let cancel = CancelToken::new();
    let boxes = DagWalker::new(&store, config, cancel.clone())
        .split(root.clone())
        .context("splitting DAG")?;

    info!("split into {} box(es)", boxes.len());
    let box_count = boxes.len();
    for (index, dag_box) in boxes.iter().enumerate() {
        let name = box_file_name(&cli.root_cid, index, box_count);
        let path = cli.output_dir.join(&name);
        let mut file =
            File::create(&path).with_context(|| format!("creating archive {}", path.display()))?;
        write_archive(&store, dag_box, &cancel, &mut file)
            .with_context(|| format!("writing archive {}", path.display()))?;
        info!("wrote {} ({} root(s), {} external)", name, dag_box.roots.len(), dag_box.external.len());
    }

    Ok(())
}

fn main() {
    fil_logger::init();

    if let Err(err) = run() {
        eprintln!("dagsplitter: {err:#}");
        std::process::exit(1);
    }
}
