use anyhow::Context;

use duck_panel::{app::App, Gateway, PanelCore};
use duck_proto::{platform, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("panel.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // stdout belongs to the terminal UI; everything goes to the file.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("duckpanel log: {}", log_path.display());
    tracing::info!("duckpanel starting…");

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config load failed, using defaults: {:#}", e);
        let mut config = Config::default();
        if let Some(url) = platform::device_url_override() {
            config.device.base_url = url;
        }
        config
    });
    tracing::info!("device at {}", config.device.base_url);

    let gateway = Gateway::new(&config.device.base_url)
        .with_context(|| format!("bad device URL in {}", Config::config_path().display()))?;
    let (panel, panel_rx) = PanelCore::new(config, gateway);

    if let Err(e) = App::new(panel, panel_rx).run().await {
        tracing::error!("duckpanel exited with error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
