//! Debugging/inspection CLI: loads a raw detections document and a page-size
//! table from disk, builds a `Model`, and prints one accessor's output as
//! pretty JSON. Not a pipeline — there is no PDF decoder here, only the
//! reconciliation stage.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use layout_reconcile::entities::raw::RawPageDetections;
use layout_reconcile::{InMemoryDataset, Model};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect layout-reconcile's output for a detections document")]
struct Args {
    /// Path to a JSON document: either a single `RawPageDetections` object or
    /// an array of them (one per page).
    #[arg(long)]
    detections: PathBuf,

    /// Path to a JSON array of `{"page_no": N, "width": W, "height": H}`
    /// entries, the true page dimensions a PDF decoder would supply.
    #[arg(long)]
    page_sizes: PathBuf,

    #[command(subcommand)]
    query: Query,
}

#[derive(Subcommand, Debug)]
enum Query {
    /// Image compounds via the legacy (v1) grouper.
    Images { page: usize },
    /// Image compounds via the canonical (v2) grouper.
    ImagesV2 { page: usize },
    /// Table compounds via the legacy (v1) grouper.
    Tables { page: usize },
    /// Table compounds via the canonical (v2) grouper.
    TablesV2 { page: usize },
    /// Embedded/interline/isolated equations.
    Equations { page: usize },
    /// Discarded (abandoned) blocks.
    Discarded { page: usize },
    /// Plain text blocks.
    Text { page: usize },
    /// Title blocks.
    Titles { page: usize },
    /// OCR text spans.
    Ocr { page: usize },
    /// The unified span view (`Model::get_all_spans`).
    Spans { page: usize },
}

#[derive(Debug, Deserialize)]
struct RawPageSize {
    page_no: usize,
    width: f64,
    height: f64,
}

fn load_detections(path: &PathBuf) -> anyhow::Result<Vec<RawPageDetections>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if let Ok(pages) = serde_json::from_str::<Vec<RawPageDetections>>(&text) {
        return Ok(pages);
    }
    let page: RawPageDetections = serde_json::from_str(&text).with_context(|| format!("parsing {} as detections", path.display()))?;
    Ok(vec![page])
}

fn load_dataset(path: &PathBuf) -> anyhow::Result<InMemoryDataset> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let sizes: Vec<RawPageSize> = serde_json::from_str(&text).with_context(|| format!("parsing {} as page sizes", path.display()))?;
    Ok(sizes.into_iter().map(|s| (s.page_no, layout_reconcile::PageInfo { w: s.width, h: s.height })).collect())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let raw_pages = load_detections(&args.detections)?;
    let page_count = raw_pages.len();
    let dataset = load_dataset(&args.page_sizes)?;
    let model = Model::new(raw_pages, &dataset);
    eprintln!("{} {page_count} page(s) reconciled", "✓".green());

    let output = match args.query {
        Query::Images { page } => serde_json::to_value(model.get_imgs(page)?)?,
        Query::ImagesV2 { page } => serde_json::to_value(model.get_imgs_v2(page)?)?,
        Query::Tables { page } => serde_json::to_value(model.get_tables(page)?)?,
        Query::TablesV2 { page } => serde_json::to_value(model.get_tables_v2(page)?)?,
        Query::Equations { page } => serde_json::to_value(model.get_equations(page)?)?,
        Query::Discarded { page } => serde_json::to_value(model.get_discarded(page)?)?,
        Query::Text { page } => serde_json::to_value(model.get_text_blocks(page)?)?,
        Query::Titles { page } => serde_json::to_value(model.get_title_blocks(page)?)?,
        Query::Ocr { page } => serde_json::to_value(model.get_ocr_text(page)?)?,
        Query::Spans { page } => serde_json::to_value(model.get_all_spans(page)?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
