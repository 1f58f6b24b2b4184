use blockdag_consensus::consensus::BlockDag;
use blockdag_consensus_core::{
    BlockId, BlockIds, KType,
    block::Block,
    config::params::{GHOSTDAG_TAIL_DELTA, NETWORK_DELAY_BOUND, Params},
    errors::{block::RuleError, config::ConfigError, consensus::ConsensusError},
};
use blockdag_core::log::*;
use clap::Parser;
use itertools::Itertools;
use serde::Serialize;
use std::{fs::File, io::BufReader, path::PathBuf, process::ExitCode};
use thiserror::Error;

/// Blockdag consensus inspector: loads a topology and prints its GHOSTDAG view
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON topology: an array of `{"id", "timestamp", "parents"}` blocks in topological order
    #[arg(short, long)]
    input: PathBuf,

    /// GHOSTDAG k. Out of range values are clamped
    #[arg(short, long, allow_negative_numbers = true, conflicts_with = "bps")]
    k: Option<i64>,

    /// Derive k from this block rate (blocks per second)
    #[arg(short, long)]
    bps: Option<f64>,

    /// Network delay bound (seconds), used with --bps
    #[arg(short, long, default_value_t = NETWORK_DELAY_BOUND)]
    delay: f64,

    /// Tolerated probability of anticones larger than k, used with --bps
    #[arg(long, default_value_t = GHOSTDAG_TAIL_DELTA)]
    delta: f64,

    /// Logging level for all subsystems {off, error, warn, info, debug, trace}
    ///  -- You may also specify `<subsystem>=<level>,<subsystem2>=<level>,...` to set the log level for individual subsystems
    #[arg(long = "loglevel", default_value = "info")]
    log_level: String,

    /// Directory to write log files to
    #[arg(long = "logdir")]
    log_dir: Option<String>,

    /// Dump per-block consensus data as JSON instead of the summary
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Error)]
enum InspectError {
    #[error("cannot read topology: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed topology: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),
}

type InspectResult<T> = Result<T, InspectError>;

#[derive(Serialize)]
struct BlockReport {
    id: BlockId,
    timestamp: u64,
    parents: BlockIds,
    selected_parent: Option<BlockId>,
    blue_score: u64,
    merge_set: Vec<BlockId>,
    mergeset_blues: BlockIds,
    mergeset_reds: BlockIds,
}

#[derive(Serialize)]
struct VirtualReport {
    tips: Vec<BlockId>,
    sink: BlockId,
    blue_score: u64,
    blues: Vec<BlockId>,
    reds: Vec<BlockId>,
    consensus_order: Vec<BlockId>,
}

#[derive(Serialize)]
struct Report {
    k: KType,
    blocks: Vec<BlockReport>,
    #[serde(rename = "virtual")]
    virtual_block: VirtualReport,
}

fn clamp_k(k: i64) -> KType {
    match KType::try_from(k) {
        Ok(k) => k,
        Err(_) if k < 0 => {
            warn!("k={} is negative, using k=0", k);
            0
        }
        Err(_) => {
            warn!("k={} is too large, using k={}", k, KType::MAX);
            KType::MAX
        }
    }
}

fn resolve_params(args: &Args) -> InspectResult<Params> {
    let params = match (args.k, args.bps) {
        (Some(k), _) => Params::new(clamp_k(k)),
        (None, Some(bps)) => {
            let params = Params::from_network(bps, args.delay, args.delta)?;
            info!("{} BPS with a {}s delay bound (delta={}) yields GHOSTDAG K={}", bps, args.delay, args.delta, params.k);
            params
        }
        (None, None) => Params::default(),
    };
    Ok(params)
}

fn load_topology(args: &Args) -> InspectResult<Vec<Block>> {
    let reader = BufReader::new(File::open(&args.input)?);
    Ok(serde_json::from_reader(reader)?)
}

fn build_report(dag: &mut BlockDag) -> InspectResult<Report> {
    let blocks = dag
        .blocks()
        .to_vec()
        .into_iter()
        .map(|id| -> InspectResult<BlockReport> {
            let info = dag.block(id)?;
            Ok(BlockReport {
                id,
                timestamp: info.timestamp,
                parents: info.parents.clone(),
                selected_parent: info.selected_parent(),
                blue_score: info.blue_score(),
                merge_set: dag.sorted_merge_set_without_sp(id)?,
                mergeset_blues: info.ghostdag.mergeset_blues.clone(),
                mergeset_reds: info.ghostdag.mergeset_reds.clone(),
            })
        })
        .collect::<InspectResult<Vec<_>>>()?;

    let tips = dag.current_tips()?;
    let sink = dag.find_sink()?;
    let (blue_score, blues, reds, consensus_order) =
        dag.with_virtual(|v| v.consensus_order().map(|order| (v.blue_score(), v.blue_blocks(), v.red_blocks(), order)))??;

    Ok(Report { k: dag.k(), blocks, virtual_block: VirtualReport { tips, sink, blue_score, blues, reds, consensus_order } })
}

fn print_summary(report: &Report) {
    let virtual_block = &report.virtual_block;
    println!("Blocks: {} (k={})", report.blocks.len(), report.k);
    println!("Sink: {}", virtual_block.sink);
    println!("Tips: {}", virtual_block.tips.iter().join(", "));
    println!("Virtual blue score: {}", virtual_block.blue_score);
    println!("Blue blocks ({}): {}", virtual_block.blues.len(), virtual_block.blues.iter().join(", "));
    println!("Red blocks ({}): {}", virtual_block.reds.len(), virtual_block.reds.iter().join(", "));
    println!("Consensus order: {}", virtual_block.consensus_order.iter().join(", "));
}

fn run(args: &Args) -> InspectResult<()> {
    let params = resolve_params(args)?;
    let blocks = load_topology(args)?;
    info!("Loaded {} blocks from {}", blocks.len(), args.input.display());

    let mut dag = BlockDag::new(params);
    dag.add_blocks(blocks)?;
    let report = build_report(&mut dag)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_logger(args.log_dir.as_deref(), &args.log_level) {
        eprintln!("failed to initialize logger: {}", err);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
