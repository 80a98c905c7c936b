use crate::GlobalArgs;
use crate::context;
use crate::output;
use colored::Colorize;
use infraflow_config::Settings;
use std::path::PathBuf;

pub async fn handle(
    settings: &Settings,
    args: &GlobalArgs,
    files: &[PathBuf],
) -> anyhow::Result<bool> {
    let json = args.output.is_json();
    let resources = context::load_resources(files, json)?;

    // --dry-run は削除対象（記録のあるもの）を削除順に表示するだけ
    if args.dry_run {
        let engine = context::build_offline_engine(settings);
        let mut targets = Vec::new();
        for resource in engine.ordering().reverse_order(&resources) {
            let id = resource.id();
            if engine.store().load(&id).await?.is_some() {
                targets.push(id);
            }
        }

        if json {
            output::print_json(&targets)?;
        } else {
            println!("{}", "[dry-run] プロバイダーは呼び出しません".yellow());
            println!("{}", "削除対象:".bold());
            for id in &targets {
                println!("  {} {}", "-".red().bold(), id.to_string().red());
            }
        }
        return Ok(true);
    }

    let engine = context::build_engine(settings)?;
    if !json {
        println!(
            "{}",
            format!("{} 個のリソースを削除中...", resources.len()).yellow()
        );
    }

    let cancel = context::cancellation_token(args.timeout);
    let result = engine.delete(&resources, &cancel).await;

    if json {
        output::print_json(&result)?;
        return Ok(result.is_success());
    }

    for id in &result.deleted {
        println!("  {} {}", "✓".green().bold(), id);
    }
    output::print_skipped(&result.skipped);
    output::print_failed(&result.failed);
    if !result.failed.is_empty() {
        eprintln!(
            "{}",
            "失敗したリソースの状態は保持されています。再実行すると残りを削除します".yellow()
        );
    }

    println!();
    let summary = format!(
        "削除 {} / スキップ {} / 失敗 {} ({} ms)",
        result.deleted.len(),
        result.skipped.len(),
        result.failed.len(),
        result.duration_ms
    );
    if result.is_success() {
        println!("{}", summary.green().bold());
    } else {
        eprintln!("{}", summary.red().bold());
    }
    Ok(result.is_success())
}
