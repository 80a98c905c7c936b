use crate::GlobalArgs;
use crate::context;
use crate::output;
use infraflow_config::Settings;
use std::path::PathBuf;

pub async fn handle(
    settings: &Settings,
    args: &GlobalArgs,
    files: &[PathBuf],
) -> anyhow::Result<bool> {
    let resources = context::load_resources(files, args.output.is_json())?;
    let engine = context::build_offline_engine(settings);
    let plan = engine.plan(&resources).await?;

    if args.output.is_json() {
        output::print_json(&plan)?;
    } else {
        output::print_plan(&plan);
    }
    Ok(true)
}
