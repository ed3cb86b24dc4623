//! `weft retrieve` — run the hybrid retrieval pipeline over the files under
//! a directory and print the ranked chunks. One chunk per file; a real
//! deployment would chunk by IR node via the overlay filesystem's symbol
//! table instead of by whole file.

use std::path::Path;

use anyhow::Result;
use weft_retrieval::{QueryIntent, RetrievalChunk, RetrievalConfig, RetrievalPipeline};

pub struct RetrieveArgs {
    pub query: String,
    pub root: std::path::PathBuf,
}

pub fn run(args: RetrieveArgs) -> Result<()> {
    let corpus = load_corpus(&args.root)?;
    let pipeline = RetrievalPipeline::new(RetrievalConfig::default());
    let vocab = weft_retrieval::expansion::Vocabulary::new();
    let mut cache = weft_retrieval::cross_encoder::CrossEncoderCache::new(256);

    let (results, latencies) = pipeline.run(&args.query, QueryIntent::General, &corpus, &vocab, &mut cache)?;

    println!("top {} results for {:?} ({:?} total):", results.len(), args.query, latencies.multi_strategy_retrieval + latencies.cross_encoder);
    for (rank, scored) in results.iter().enumerate() {
        println!("{:>2}. {:.4}  {}", rank + 1, scored.score, scored.chunk.file_path);
    }
    Ok(())
}

fn load_corpus(root: &Path) -> Result<Vec<RetrievalChunk>> {
    let mut corpus = Vec::new();
    for entry in walk(root)? {
        let content = std::fs::read_to_string(&entry).unwrap_or_default();
        if content.is_empty() {
            continue;
        }
        let id = entry.display().to_string();
        corpus.push(RetrievalChunk::new(id, entry.display().to_string(), content));
    }
    Ok(corpus)
}

fn walk(root: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut out = Vec::new();
    if root.is_file() {
        out.push(root.to_path_buf());
        return Ok(out);
    }
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
    Ok(out)
}
