use std::path::PathBuf;

use clap::Parser;

/// Run a declarative FMU co-simulation workflow.
#[derive(Debug, Parser)]
#[command(name = "cads-runner", version)]
struct Options {
    /// Workflow document (YAML).
    workflow: PathBuf,

    /// Root directory for resolving relative FMU and result paths.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Print the collected result store to stdout as JSON.
    #[arg(long)]
    print: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::parse();
    let results = cads_flow::run_workflow(&options.workflow, &options.root)?;

    log::info!("workflow finished with {} steps", results.len());
    if options.print {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}
