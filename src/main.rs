use anyhow::Result;
use clap::Parser;
use console::style;
use log::{error, info};
use screenlist::cli::Cli;
use screenlist::component::ContactSheetGenerator;
use screenlist::config::Config;
use screenlist::init;
use screenlist::signal::setup_shutdown_signal;
use screenlist::tools::{SystemToolLocator, Toolchain};

fn main() {
    let cli = Cli::parse();
    init::init(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("Program error: {e:#}");
        eprintln!("{} {e:#}", style("錯誤:").red().bold());
        std::process::exit(1);
    }

    info!("Program exited normally");
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::from_optional_path(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    // 找不到 ffmpeg / ffprobe 時，在處理任何影片前就結束
    let locator = SystemToolLocator::new(
        config.settings.ffmpeg_path.clone(),
        config.settings.ffprobe_path.clone(),
    );
    let toolchain = Toolchain::resolve(&locator)?;

    let shutdown_signal = setup_shutdown_signal()?;
    let target = cli.scan_target();

    let generator = ContactSheetGenerator::new(config, toolchain, shutdown_signal);
    generator.run(&target)?;
    Ok(())
}
