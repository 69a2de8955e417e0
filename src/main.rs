use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use layout_shift_gif::{
    rendering, DeviceProfile, GifOptions, InspectConfig, Inspector, NetworkConditions,
    WindowingMode,
};
use log::debug;

/// Capture layout shifts on a page and render them as an animated GIF
#[derive(Parser, Debug)]
#[command(name = "layout-shift-gif", version, about)]
#[command(
    after_help = "Example: layout-shift-gif --url https://example.com/ --device mobile --output layoutshift.gif"
)]
struct Cli {
    /// Website url
    #[arg(long)]
    url: String,

    /// Device type [mobile|desktop]
    #[arg(long, default_value_t = DeviceProfile::Mobile)]
    device: DeviceProfile,

    /// Override device viewport width
    #[arg(long)]
    width: Option<u32>,

    /// Override device viewport height
    #[arg(long)]
    height: Option<u32>,

    /// JSON file with the cookies to send with the request
    #[arg(long)]
    cookies: Option<PathBuf>,

    /// Output filename
    #[arg(long, default_value = "layoutshift.gif")]
    output: PathBuf,

    /// How shifts are grouped [session-windowed|unbounded]
    #[arg(long, default_value_t = WindowingMode::SessionWindowed)]
    windowing: WindowingMode,

    /// Also write a JSON report of the shifted elements to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Page load timeout in milliseconds
    #[arg(long, default_value_t = layout_shift_gif::DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// CPU slowdown factor (1 disables throttling)
    #[arg(long, default_value_t = 4.0)]
    cpu_throttle: f64,

    /// Load over an unthrottled network instead of Good 3G
    #[arg(long)]
    no_network_throttle: bool,
}

impl Cli {
    fn config(&self) -> InspectConfig {
        InspectConfig {
            device: self.device,
            width: self.width,
            height: self.height,
            user_agent: None,
            cookie_file: self.cookies.clone(),
            windowing: self.windowing,
            timeout_ms: self.timeout_ms,
            // 1 means "off"; anything else, including invalid rates, is left to validation
            cpu_throttle: (self.cpu_throttle != 1.0).then_some(self.cpu_throttle),
            network: (!self.no_network_throttle).then_some(NetworkConditions::GOOD_3G),
            gif: GifOptions::default(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Warnings by default, RUST_LOG overrides
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    debug!("configuration: {:?}", config);
    config.validate().context("invalid options")?;
    layout_shift_gif::parse_target_url(&cli.url).context("invalid --url")?;

    let inspector = Inspector::new(Some(config.clone()))
        .await
        .context("failed to start the browser")?;
    let inspected = inspector.inspect(&cli.url).await;
    if let Err(e) = inspector.close().await {
        debug!("closing the browser failed: {}", e);
    }
    let inspection = inspected.with_context(|| format!("failed to inspect {}", cli.url))?;

    let gif = layout_shift_gif::render_inspection(&inspection, &config.gif)
        .context("failed to render frames")?;
    layout_shift_gif::write_outputs(&inspection, &gif, &cli.output, cli.report.as_deref())
        .context("failed to write outputs")?;

    println!("{}", rendering::badge_label(inspection.report.cumulative_score));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv = std::iter::once("layout-shift-gif").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_throttle_cpu_and_network() {
        let config = parse(&["--url", "https://example.com/"]).config();
        assert_eq!(config.cpu_throttle, Some(4.0));
        assert_eq!(config.network, Some(NetworkConditions::GOOD_3G));
        assert_eq!(config.device, DeviceProfile::Mobile);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn throttle_of_one_disables_it() {
        let config = parse(&[
            "--url",
            "https://example.com/",
            "--cpu-throttle",
            "1",
            "--no-network-throttle",
        ])
        .config();
        assert_eq!(config.cpu_throttle, None);
        assert_eq!(config.network, None);
    }

    #[test]
    fn fractional_throttle_is_rejected() {
        let config = parse(&["--url", "https://example.com/", "--cpu-throttle", "0.5"]).config();
        assert!(matches!(config.validate(), Err(layout_shift_gif::Error::ConfigError(_))));
    }
}
