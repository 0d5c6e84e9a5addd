use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rank_rank::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSONL question bank.
    #[arg(long, global = true, default_value = "bank.jsonl")]
    bank: PathBuf,

    #[command(flatten)]
    tuning: Tuning,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct Tuning {
    #[arg(long)]
    bm25_top_k: Option<usize>,
    #[arg(long)]
    rerank_top_m: Option<usize>,
    #[arg(long)]
    final_top_n: Option<usize>,
    #[arg(long)]
    near_duplicate_threshold: Option<f32>,
    #[arg(long)]
    duplicate_threshold: Option<f32>,
}

impl Tuning {
    fn apply(self, mut config: RAGConfig) -> RAGConfig {
        if let Some(v) = self.bm25_top_k {
            config.bm25_top_k = v;
        }
        if let Some(v) = self.rerank_top_m {
            config.rerank_top_m = v;
        }
        if let Some(v) = self.final_top_n {
            config.final_top_n = v;
        }
        if let Some(v) = self.near_duplicate_threshold {
            config.near_duplicate_threshold = v;
        }
        if let Some(v) = self.duplicate_threshold {
            config.duplicate_threshold = v;
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest questions from a JSON file (an `IngestionInput` document) into the bank.
    Ingest {
        /// Path to a JSON file containing an `IngestionInput` payload.
        input: PathBuf,
    },
    /// Run a single retrieval query against the bank.
    Retrieve {
        /// Free-text query.
        text: String,
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Evaluate the bank against a JSON file of `EvalRecord`s.
    Eval {
        /// Path to a JSON file containing a list of `{query_qid, relevant_qids}` records.
        records: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.tuning.apply(RAGConfig::default());
    let mut engine = Engine::new(config);
    engine.load_local_bank(&cli.bank).with_context(|| format!("loading bank at {}", cli.bank.display()))?;

    match cli.command {
        Commands::Ingest { input } => {
            let raw = std::fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
            let payload: IngestionInput = serde_json::from_str(&raw).context("parsing ingestion input")?;
            let results = engine.ingest(payload);
            for r in &results {
                println!("{} -> {:?} (matched={:?})", r.question.qid, r.status, r.matched_qid);
            }
            engine.save_local_bank(&cli.bank).context("saving bank")?;
            println!("ingested {} questions, bank now has {} documents", results.len(), engine.doc_count());
        }
        Commands::Retrieve { text, top_n } => {
            let query = QueryInput { text: Some(text), top_n, ..Default::default() };
            let response = engine.retrieve(query);
            println!("{}", serde_json::to_string_pretty(&response).context("serializing response")?);
        }
        Commands::Eval { records } => {
            let raw = std::fs::read_to_string(&records).with_context(|| format!("reading {}", records.display()))?;
            #[derive(serde::Deserialize)]
            struct RawEvalRecord {
                query_qid: String,
                relevant_qids: Vec<String>,
            }
            let raw_records: Vec<RawEvalRecord> = serde_json::from_str(&raw).context("parsing eval records")?;
            let records: Vec<EvalRecord> = raw_records.into_iter().map(|r| EvalRecord { query_qid: r.query_qid, relevant_qids: r.relevant_qids }).collect();
            let metrics = engine.evaluate(&records);
            println!("{}", serde_json::to_string_pretty(&metrics).context("serializing metrics")?);
        }
    }
    Ok(())
}
