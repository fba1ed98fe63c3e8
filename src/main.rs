use nft_searcher::client::InsightClient;
use nft_searcher::config::Config;
use nft_searcher::filter::TraitSelector;
use nft_searcher::insight::InsightService;
use nft_searcher::metadata::NftRecord;
use nft_searcher::openai::OpenAiBackend;
use nft_searcher::orchestrator::SearchOrchestrator;
use nft_searcher::server;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "nft-searcher", version, about = "NFT search results with AI collection insights")]
struct Cli {
    /// 設定ファイル（なければ既定値）
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 解説プロキシ（POST /api/openai）を起動する
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// 検索ウィジェットの取得結果を読み込んで表示する
    Search(SearchArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// ウィジェットが返した NFT の JSON（配列または1件）
    records: PathBuf,

    /// 接続中チェーンの略称
    #[arg(long)]
    chain: Option<String>,

    #[arg(long = "trait", requires = "value")]
    trait_type: Option<String>,

    #[arg(long, requires = "trait_type")]
    value: Option<String>,

    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// カードの代わりに JSON をそのまま出す
    #[arg(long)]
    console: bool,

    #[arg(long)]
    toggle_theme: bool,

    #[arg(long)]
    no_insight: bool,

    /// 解説プロキシの URL（設定ファイルより優先）
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.parse().unwrap_or_default()),
        )
        .init();

    let cfg = load_config(&cli.config)?;

    match cli.command {
        Command::Serve { bind } => serve(&cfg, bind).await,
        Command::Search(args) => search(&cfg, args).await,
    }
}

/// 設定ファイルがなければ既定値で動かす
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    let path_str = path.to_string_lossy();
    Config::load(&path_str)
        .with_context(|| format!("設定ファイルの読み込みに失敗しました: {}", path_str))
}

async fn serve(cfg: &Config, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
    let api_key = cfg.openai.api_key();
    if api_key.is_none() {
        tracing::warn!(env = %cfg.openai.api_key_env, "API key is not set; insight requests will fail");
    }

    let backend = OpenAiBackend::new(
        cfg.openai.base_url.clone(),
        api_key,
        cfg.openai.api_key_env.clone(),
        cfg.openai.timeout(),
    )
    .context("HTTP クライアントの初期化に失敗しました")?;
    let service = Arc::new(InsightService::new(Arc::new(backend), cfg.openai.model.clone()));

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("待ち受けアドレスにバインドできません: {}", bind))?;
    server::serve(listener, service)
        .await
        .context("解説プロキシが異常終了しました")?;
    Ok(())
}

async fn search(cfg: &Config, args: SearchArgs) -> Result<()> {
    let text = fs::read_to_string(&args.records)
        .with_context(|| format!("NFT JSON が読めません: {:?}", args.records))?;
    let records = parse_records(&text)
        .with_context(|| format!("NFT JSON パース失敗: {:?}", args.records))?;

    let mut orch = SearchOrchestrator::new(cfg.search.widget());
    if let Some(chain) = &args.chain {
        orch.widget_mut().set_chain(chain);
    }
    if args.toggle_theme {
        orch.widget_mut().toggle_theme();
    }
    debug!(widget = ?orch.widget(), "search widget configured");

    let mut request = orch.on_nfts_fetched(records);
    info!(records = orch.all_records().len(), "results loaded");

    print_trait_control(&orch);

    if let (Some(trait_type), Some(value)) = (args.trait_type, args.value) {
        request = orch.select_trait(TraitSelector::new(trait_type, value), args.offset);
    }

    print_results(&orch, args.console)?;

    if args.no_insight {
        return Ok(());
    }

    println!("==============================");
    println!(" Collection Insights");
    println!("==============================");

    let Some(request) = request else {
        println!("Search a collection to generate insights...");
        return Ok(());
    };

    let endpoint = args.endpoint.unwrap_or_else(|| cfg.client.endpoint.clone());
    let client = InsightClient::new(endpoint, Duration::from_secs(cfg.client.timeout_secs))
        .context("HTTP クライアントの初期化に失敗しました")?;

    if orch.is_loading() {
        println!("Loading insight for {:?}...", request.subject.name);
    }
    match client.summarize(&request.subject).await {
        Ok(data) => {
            orch.on_insight(request.token, data);
        }
        Err(err) => {
            orch.on_insight_failed(request.token, err.to_string());
        }
    }

    if let Some(data) = orch.insight() {
        let tree = data
            .render()
            .context("解説の JSON パースに失敗しました")?;
        print!("{}", tree);
    } else if let Some(message) = orch.insight_error() {
        println!("❌ {}", message);
    }

    Ok(())
}

/// 配列なら各要素を、それ以外は1件として扱う
fn parse_records(text: &str) -> Result<Vec<NftRecord>> {
    let value: Value = serde_json::from_str(text)?;
    Ok(match value {
        Value::Array(items) => items.into_iter().map(NftRecord).collect(),
        other => vec![NftRecord(other)],
    })
}

/// trait / 値 の選択肢一覧
fn print_trait_control(orch: &SearchOrchestrator) {
    println!("==============================");
    println!(" Filter by trait");
    println!("==============================");
    if orch.attributes().is_empty() {
        println!("(no traits found)");
    }
    for (trait_type, values) in orch.attributes().iter() {
        println!("▶ {}: {}", trait_type, values.join(", "));
    }
    println!();
}

fn print_results(orch: &SearchOrchestrator, console: bool) -> Result<()> {
    let displayed = orch.displayed();
    println!("==============================");
    println!(
        " NFTs: {} / {}",
        displayed.len(),
        orch.all_records().len()
    );
    println!("==============================");

    if displayed.is_empty() {
        println!("No NFTs fetched yet...");
    }

    for record in displayed {
        if console {
            let json = serde_json::to_string_pretty(record)
                .context("NFT の JSON シリアライズに失敗しました")?;
            println!("{}", json);
            continue;
        }

        println!("▶ {}", record.name().unwrap_or("(unnamed)"));
        for attr in record.attributes() {
            println!("  {:20} {}", attr.trait_type, attr.value);
        }
    }
    println!();
    Ok(())
}
