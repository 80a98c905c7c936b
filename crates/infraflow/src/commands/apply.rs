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

    // --dry-run は plan と同じ
    if args.dry_run {
        let plan = context::build_offline_engine(settings).plan(&resources).await?;
        if json {
            output::print_json(&plan)?;
        } else {
            println!("{}", "[dry-run] プロバイダーは呼び出しません".yellow());
            output::print_plan(&plan);
        }
        return Ok(true);
    }

    let engine = context::build_engine(settings)?;
    if !json {
        println!(
            "{}",
            format!("{} 個のリソースを適用中...", resources.len()).blue()
        );
    }

    let cancel = context::cancellation_token(args.timeout);
    let result = engine.apply(&resources, &cancel).await;

    if json {
        output::print_json(&result)?;
        return Ok(result.is_success());
    }

    for id in &result.created {
        println!("  {} {}", "✓".green().bold(), id.to_string().green());
        if let Some(state) = engine.store().load(id).await? {
            println!("      {}", engine.describe(&state).dimmed());
        }
    }
    output::print_skipped(&result.skipped);
    output::print_failed(&result.failed);

    println!();
    let summary = format!(
        "作成 {} / スキップ {} / 失敗 {} ({} ms)",
        result.created.len(),
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
