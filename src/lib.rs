//! Layout Shift GIF
//!
//! Measures cumulative layout shift (CLS) while a page loads and renders the
//! shifted elements as a two-frame animated GIF: the "after" frame outlines
//! where elements ended up, the "before" frame (dashed) where they started.
//! Each frame carries a badge with the score, colored by severity.
//!
//! # Features
//!
//! - **CDP Backend** (default): drives headless Chrome through the DevTools Protocol
//! - **Pure core**: shift windowing and frame rendering have no browser dependency
//!   and can be fed synthetic data
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "cdp")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use layout_shift_gif::{DeviceProfile, InspectConfig, PageInspector};
//!
//! let config = InspectConfig {
//!     device: DeviceProfile::Desktop,
//!     ..Default::default()
//! };
//!
//! let mut inspector = layout_shift_gif::new_inspector(config.clone())?;
//! let inspection = inspector.inspect("https://example.com")?;
//! let gif = layout_shift_gif::render_inspection(&inspection, &config.gif)?;
//! let output = std::path::Path::new("layoutshift.gif");
//! layout_shift_gif::write_outputs(&inspection, &gif, output, None)?;
//! println!("{}", layout_shift_gif::rendering::badge_label(inspection.report.cumulative_score));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "cdp"))]
//! # fn main() {}
//! ```

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod animation;
pub mod collector;
pub mod cookies;
pub mod device;
pub mod rendering;
pub mod report;

#[cfg(feature = "cdp")]
pub mod cdp;

// Async-friendly facade (worker thread owning the browser)
#[cfg(feature = "cdp")]
pub mod async_api;

#[cfg(feature = "cdp")]
pub use async_api::Inspector;

pub use animation::GifOptions;
pub use collector::{ShiftEvent, ShiftReport, ShiftSource, WindowingMode};
pub use device::{DeviceMetrics, DeviceProfile, NetworkConditions};
pub use report::ReportArtifact;

/// Default navigation timeout, generous because the CPU and network are throttled
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Configuration for a page inspection
///
/// Defaults mirror the command line tool: a mobile device on a throttled CPU
/// and a Good 3G link, session windowing and a two-minute load timeout.
///
/// # Examples
///
/// ```
/// let cfg = layout_shift_gif::InspectConfig::default();
/// assert_eq!(cfg.metrics().width, 412);
/// assert_eq!(cfg.gif.frame_delay_ms, 500);
/// ```
#[derive(Debug, Clone)]
pub struct InspectConfig {
    /// Device to emulate
    pub device: DeviceProfile,
    /// Viewport width override in CSS pixels
    pub width: Option<u32>,
    /// Viewport height override in CSS pixels
    pub height: Option<u32>,
    /// User agent override (otherwise the device's)
    pub user_agent: Option<String>,
    /// JSON cookie file injected before navigation
    pub cookie_file: Option<PathBuf>,
    /// How shifts are grouped into the score
    pub windowing: WindowingMode,
    /// Navigation (load event) timeout in milliseconds
    pub timeout_ms: u64,
    /// CPU slowdown factor, `None` disables throttling
    pub cpu_throttle: Option<f64>,
    /// Emulated network link, `None` leaves the network unthrottled
    pub network: Option<NetworkConditions>,
    /// Animation settings
    pub gif: GifOptions,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            device: DeviceProfile::default(),
            width: None,
            height: None,
            user_agent: None,
            cookie_file: None,
            windowing: WindowingMode::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cpu_throttle: Some(4.0),
            network: Some(NetworkConditions::GOOD_3G),
            gif: GifOptions::default(),
        }
    }
}

impl InspectConfig {
    /// Effective device metrics after overrides
    pub fn metrics(&self) -> DeviceMetrics {
        let mut m = self.device.metrics().with_viewport(self.width, self.height);
        if let Some(ua) = &self.user_agent {
            m.user_agent = Some(ua.clone());
        }
        m
    }

    pub fn validate(&self) -> Result<()> {
        self.metrics().validate()?;
        if self.timeout_ms == 0 {
            return Err(Error::ConfigError("timeout must be greater than zero".into()));
        }
        if let Some(rate) = self.cpu_throttle {
            if !rate.is_finite() || rate < 1.0 {
                return Err(Error::ConfigError(format!(
                    "CPU throttle rate must be >= 1, got {}",
                    rate
                )));
            }
        }
        if let Some(network) = &self.network {
            network.validate()?;
        }
        Ok(())
    }
}

/// Check that `input` is an absolute URL a browser can navigate to
pub fn parse_target_url(input: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(input)
        .map_err(|e| Error::ConfigError(format!("invalid url '{}': {}", input, e)))?;
    match parsed.scheme() {
        "http" | "https" | "file" => Ok(parsed),
        other => Err(Error::ConfigError(format!("unsupported url scheme '{}'", other))),
    }
}

/// Parameters for setting a cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieParam {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub http_only: Option<bool>,
    #[serde(default)]
    pub same_site: Option<String>,
    /// Seconds since the epoch, negative for session cookies
    #[serde(default)]
    pub expires: Option<f64>,
}

/// Everything captured from one page load
#[derive(Debug, Clone)]
pub struct Inspection {
    /// Final URL after redirects
    pub url: String,
    pub report: ShiftReport,
    /// Screenshot taken after the load event
    pub screenshot_png: Vec<u8>,
    /// Device pixel ratio of the screenshot
    pub scale_factor: f64,
}

/// Core trait for browser backends that can measure a page
pub trait PageInspector {
    /// Create a backend instance with the given configuration
    fn new(config: InspectConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load `url` with the shift recorder installed, wait for the load event,
    /// then return the collected report and a screenshot
    fn inspect(&mut self, url: &str) -> Result<Inspection>;

    /// Close the backend and clean up resources
    fn close(self) -> Result<()>;
}

/// Create an inspector with the default (CDP) backend
#[cfg(feature = "cdp")]
pub fn new_inspector(config: InspectConfig) -> Result<impl PageInspector> {
    cdp::CdpInspector::new(config)
}

/// Render an inspection into GIF bytes (after frame, then before frame)
pub fn render_inspection(inspection: &Inspection, gif: &GifOptions) -> Result<Vec<u8>> {
    let background = rendering::decode_background(&inspection.screenshot_png)?;
    let frames = rendering::render_diff(&background, &inspection.report, inspection.scale_factor)?;
    animation::encode_diff(&frames, gif)
}

/// Write the GIF and, when asked, the JSON report.
///
/// Both files are staged next to their destination and only renamed into
/// place once every write succeeded, so a failed run leaves neither behind.
pub fn write_outputs(
    inspection: &Inspection,
    gif: &[u8],
    output: &Path,
    report: Option<&Path>,
) -> Result<()> {
    let artifact = ReportArtifact::new(&inspection.url, &inspection.report);
    let report_json = report
        .map(|path| artifact.to_json().map(|json| (path, json)))
        .transpose()?;

    let gif_staged = staged_path(output);
    std::fs::write(&gif_staged, gif).map_err(|e| discard(&[gif_staged.as_path()], e))?;

    let report_staged = match &report_json {
        Some((path, json)) => {
            let staged = staged_path(path);
            std::fs::write(&staged, json)
                .map_err(|e| discard(&[gif_staged.as_path(), staged.as_path()], e))?;
            Some((*path, staged))
        }
        None => None,
    };

    if let Err(e) = std::fs::rename(&gif_staged, output) {
        let mut leftovers = vec![gif_staged.as_path()];
        if let Some((_, staged)) = &report_staged {
            leftovers.push(staged.as_path());
        }
        return Err(discard(&leftovers, e));
    }
    info!("wrote {} ({} bytes)", output.display(), gif.len());

    if let Some((path, staged)) = report_staged {
        std::fs::rename(&staged, path).map_err(|e| discard(&[staged.as_path(), output], e))?;
        info!("wrote report {}", path.display());
    }
    Ok(())
}

// `.name.partial` in the destination directory, so the final rename stays on one filesystem
fn staged_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

fn discard(paths: &[&Path], err: std::io::Error) -> Error {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("could not remove {}: {}", path.display(), e);
            }
        }
    }
    Error::Io(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InspectConfig::default();
        assert_eq!(config.device, DeviceProfile::Mobile);
        assert_eq!(config.windowing, WindowingMode::SessionWindowed);
        assert_eq!(config.timeout_ms, 120_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_viewport_override() {
        let config = InspectConfig {
            device: DeviceProfile::Desktop,
            width: Some(1280),
            height: Some(720),
            user_agent: Some("custom-agent".into()),
            ..Default::default()
        };
        let m = config.metrics();
        assert_eq!((m.width, m.height), (1280, 720));
        assert_eq!(m.user_agent.as_deref(), Some("custom-agent"));
    }

    #[test]
    fn test_invalid_throttle() {
        let config = InspectConfig {
            cpu_throttle: Some(0.5),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_target_url() {
        assert!(parse_target_url("https://example.com/page").is_ok());
        assert!(parse_target_url("example.com").is_err());
        assert!(parse_target_url("ftp://example.com").is_err());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("layout-shift-gif-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn inspection() -> Inspection {
        Inspection {
            url: "https://example.com/".into(),
            report: ShiftReport::default(),
            screenshot_png: Vec::new(),
            scale_factor: 1.0,
        }
    }

    #[test]
    fn test_failed_report_leaves_no_gif() {
        let dir = scratch_dir("no-partial");
        let gif_path = dir.join("out.gif");
        let report_path = dir.join("missing-dir").join("report.json");

        let result = write_outputs(&inspection(), b"GIF89a", &gif_path, Some(&report_path));
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!gif_path.exists());
        assert!(!staged_path(&gif_path).exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_outputs_replace_previous_files() {
        let dir = scratch_dir("replace");
        let gif_path = dir.join("out.gif");
        let report_path = dir.join("report.json");
        std::fs::write(&gif_path, b"old").unwrap();

        write_outputs(&inspection(), b"GIF89a", &gif_path, Some(&report_path)).unwrap();
        assert_eq!(std::fs::read(&gif_path).unwrap(), b"GIF89a");
        assert!(report_path.exists());
        assert!(!staged_path(&gif_path).exists());
        assert!(!staged_path(&report_path).exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
