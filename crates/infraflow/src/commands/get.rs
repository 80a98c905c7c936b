use crate::GlobalArgs;
use crate::context;
use crate::output;
use colored::Colorize;
use infraflow_config::Settings;

pub async fn handle(
    settings: &Settings,
    args: &GlobalArgs,
    kind: Option<&str>,
) -> anyhow::Result<bool> {
    let engine = context::build_offline_engine(settings);
    let states = engine.get(kind).await?;

    if args.output.is_json() {
        output::print_json(&states)?;
        return Ok(true);
    }

    if states.is_empty() {
        println!("{}", "記録されたリソースはありません".dimmed());
        return Ok(true);
    }

    for state in &states {
        let phase = state
            .status
            .get("phase")
            .and_then(|p| p.as_str())
            .unwrap_or("-");
        let phase = match phase {
            "Ready" => phase.green(),
            "Failed" => phase.red(),
            _ => phase.normal(),
        };
        println!(
            "{}  {}  {}",
            state.id().to_string().cyan(),
            phase,
            engine.describe(state)
        );
    }
    Ok(true)
}
