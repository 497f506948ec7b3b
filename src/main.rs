use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::init();

    let cfg = vizhost::config::Config::parse();
    if cfg.list_devices {
        vizhost::audio::list_input_devices()?;
        return Ok(());
    }

    vizhost::app::run(cfg)
}
