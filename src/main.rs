use clap::Parser;
use gl_sandbox::engine::config::Cli;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    log::info!("Running '{}' demo ({}x{})", config.demo, config.window.width, config.window.height);

    gl_sandbox::app::run(config)
}
