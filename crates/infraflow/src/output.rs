//! 出力形式

use clap::ValueEnum;
use colored::Colorize;
use infraflow_cloud::{FailedResource, PlanResult, SkippedResource};
use serde::Serialize;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_plan(plan: &PlanResult) {
    println!("{}", "実行計画:".bold());
    for id in &plan.to_create {
        println!("  {} {}", "+".green().bold(), id.to_string().green());
    }
    for id in &plan.no_change {
        println!("  {} {}", "=".dimmed(), id.to_string().dimmed());
    }
    println!();
    println!("{}", plan.summary());
}

pub fn print_skipped(skipped: &[SkippedResource]) {
    for skip in skipped {
        println!(
            "  {} {} ({})",
            "-".yellow(),
            skip.resource.to_string().yellow(),
            skip.reason
        );
    }
}

pub fn print_failed(failed: &[FailedResource]) {
    for failure in failed {
        eprintln!(
            "  {} {}: {}",
            "✗".red().bold(),
            failure.resource.to_string().red(),
            failure.error
        );
        for step in &failure.steps {
            eprintln!("      {} {} → {}", step.key, step.provider_id, step.outcome);
        }
    }
}
