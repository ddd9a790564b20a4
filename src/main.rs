use std::path::{Path, PathBuf};
use std::sync::Arc;

use addr_link::config::MatchConfig;
use addr_link::engine::MatchEngine;
use addr_link::review::ReviewQueue;
use addr_link::store::AddressStore;
use anyhow::Context;
use clap::Parser;
use tracing::info;

/// 地址匹配：加载标准/待匹配地址文件，执行一轮完整匹配并输出报告
#[derive(Parser)]
#[command(name = "addr-link", version, about)]
struct Args {
    /// 标准地址文件（每行一条）
    canonical: PathBuf,
    /// 待匹配地址文件（每行一条）
    secondary: PathBuf,
    /// TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,
    /// 每批行数（覆盖配置文件）
    #[arg(long)]
    batch_size: Option<usize>,
    /// 匹配线程数，0 表示自适应（覆盖配置文件）
    #[arg(long)]
    workers: Option<usize>,
    /// 以 JSON 输出报告
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let store = Arc::new(AddressStore::new());
    store.extend_canonical(read_address_lines(&args.canonical)?);
    store.extend_secondary(read_address_lines(&args.secondary)?);
    info!(
        "已加载标准地址 {} 条, 待匹配地址 {} 条",
        store.canonical_count(),
        store.secondary_count()
    );

    let engine = MatchEngine::new(store.clone(), config);
    let report = engine.run_full_match()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{report}");

    let review = ReviewQueue::new(store);
    let pending = review.list_pending();
    if !pending.is_empty() {
        println!("待人工复核 {} 条（前 10 条）:", pending.len());
        for record in pending.iter().take(10) {
            println!("  [{}] {}", record.id, record.raw);
        }
    }
    Ok(())
}

fn read_address_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("读取地址文件失败: {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
