use anyhow::{Context, Result};
use clap::Parser;
use nft_searcher::attributes::count_traits;
use nft_searcher::metadata::NftRecord;
use rayon::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "traits", about = "Trait rarity report over a directory of NFT metadata JSON")]
struct Cli {
    /// メタデータ JSON のディレクトリ
    #[arg(default_value = "output/metadata")]
    metadata_dir: PathBuf,
}

fn main() -> Result<()> {
    let Cli { metadata_dir } = Cli::parse();

    let files = collect_json_files(&metadata_dir)
        .with_context(|| format!("metadata ディレクトリが読めません: {:?}", metadata_dir))?;

    // ファイル順を保ったまま並列に読む
    let parsed: Vec<(PathBuf, Result<Vec<NftRecord>>)> = files
        .into_par_iter()
        .map(|path| {
            let records = load_records(&path);
            (path, records)
        })
        .collect();

    let mut records: Vec<NftRecord> = Vec::new();
    let mut failures: Vec<(String, String)> = Vec::new();
    let max_examples = 20usize;

    for (path, result) in parsed {
        match result {
            Ok(mut batch) => records.append(&mut batch),
            Err(err) => {
                if failures.len() < max_examples {
                    let file = path
                        .file_name()
                        .and_then(|s| s.to_str())
                        .unwrap_or("<unknown>")
                        .to_string();
                    failures.push((file, format!("{:#}", err)));
                }
            }
        }
    }

    let stats = count_traits(&records);
    let total = records.len();

    println!("==============================");
    println!(" NFT Trait Report");
    println!(" Total tokens: {}", total);
    println!("==============================\n");

    for (trait_type, values) in stats {
        println!("▶ Trait: {}", trait_type);

        let mut sorted: Vec<_> = values.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));

        for (value, count) in sorted {
            let ratio = count as f64 / total as f64 * 100.0;
            println!("  {:30} {:5} ({:.2}%)", value, count, ratio);
        }
        println!();
    }

    if failures.is_empty() {
        println!("✅ すべてのファイルを読み込みました");
    } else {
        println!("❌ 読み込めないファイルがありました（最大 {} 件表示）:", max_examples);
        for (file, msg) in &failures {
            println!("  - {} : {}", file, msg);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// ディレクトリ以下の JSON ファイルを名前順に列挙
fn collect_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            files.push(path);
        }
    }
    Ok(files)
}

/// 1ファイル分（配列なら複数件）
fn load_records(path: &Path) -> Result<Vec<NftRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("JSON 読み込み失敗: {:?}", path))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("JSON パース失敗: {:?}", path))?;
    Ok(match value {
        Value::Array(items) => items.into_iter().map(NftRecord).collect(),
        other => vec![NftRecord(other)],
    })
}
