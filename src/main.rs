use anyhow::Context;
use clap::Parser;
use hopper::app::run_headless;
use hopper::io::cli::Cli;
use log::info;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config().context("could not load configuration")?;
    let summary = run_headless(&config, &cli.script()).context("game run failed")?;

    info!(
        "Done: {} frames, {} saved to '{}'",
        summary.frames,
        summary.saved,
        config.render.output_dir.display()
    );
    Ok(())
}
