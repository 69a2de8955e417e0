//! Chrome DevTools Protocol backend

use crate::collector::script::{
    parse_recording, READ_EXPRESSION, RECORDER_SOURCE, WAIT_FOR_LOAD_EXPRESSION,
};
use crate::collector::{collect, selector, ShiftReport};
use crate::cookies::load_cookie_file;
use crate::{
    parse_target_url, CookieParam, DeviceMetrics, Error, InspectConfig, Inspection, PageInspector,
    Result,
};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::types::Method;
use headless_chrome::protocol::cdp::{Emulation, Network, Page};
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// CDP-based inspector (uses the `headless_chrome` crate)
///
/// Launches a headless Chrome sized to the emulated device, installs the
/// shift recorder on a single tab and reads it back after the load event.
pub struct CdpInspector {
    browser: Browser,
    tab: Arc<Tab>,
    config: InspectConfig,
    metrics: DeviceMetrics,
}

fn load_error(err: anyhow::Error, timeout_ms: u64) -> Error {
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        Error::Timeout(timeout_ms)
    } else {
        Error::LoadError(msg)
    }
}

/// Send a protocol command built from its wire parameters.
///
/// Going through JSON leaves optional fields added by newer protocol
/// revisions at their defaults.
fn send<C>(tab: &Tab, params: serde_json::Value) -> Result<()>
where
    C: Method + Serialize + DeserializeOwned + std::fmt::Debug,
{
    let name = std::any::type_name::<C>();
    let method: C = serde_json::from_value(params)
        .map_err(|e| Error::CdpError(format!("invalid parameters for {}: {}", name, e)))?;
    tab.call_method(method)
        .map_err(|e| Error::InitializationError(format!("{} failed: {}", name, e)))?;
    Ok(())
}

impl CdpInspector {
    fn set_cookies(&self, cookies: Vec<CookieParam>) -> Result<()> {
        use headless_chrome::protocol::cdp::Network::CookieParam as NetCookieParam;
        use headless_chrome::protocol::cdp::Network::CookieSameSite;
        let net_cookies = cookies
            .into_iter()
            .map(|c| NetCookieParam {
                name: c.name,
                value: c.value,
                url: c.url,
                domain: c.domain,
                path: c.path,
                secure: c.secure,
                http_only: c.http_only,
                same_site: c.same_site.and_then(|s| match s.as_str() {
                    "Strict" | "strict" => Some(CookieSameSite::Strict),
                    "Lax" | "lax" => Some(CookieSameSite::Lax),
                    "None" | "none" => Some(CookieSameSite::None),
                    _ => None,
                }),
                // session cookies are exported with a negative expiry
                expires: c.expires.filter(|v| *v >= 0.0),
                priority: None,
                same_party: None,
                source_scheme: None,
                source_port: None,
                partition_key: None,
            })
            .collect();

        self.tab
            .set_cookies(net_cookies)
            .map_err(|e| Error::InitializationError(format!("Failed to set cookies: {}", e)))?;
        Ok(())
    }

    fn evaluate_string(&self, expression: &str) -> Result<String> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| Error::ScriptError(format!("Evaluation failed: {}", e)))?;

        match result.value {
            Some(serde_json::Value::String(s)) => Ok(s),
            Some(other) => Err(Error::ScriptError(format!("Expected a string, got {}", other))),
            None => Err(Error::ScriptError("No value returned from evaluation".into())),
        }
    }

    /// Log shifted elements that no longer resolve in the loaded DOM
    fn check_selectors(&self, report: &ShiftReport) {
        let html = match self.evaluate_string("document.documentElement.outerHTML") {
            Ok(html) => html,
            Err(e) => {
                warn!("Could not snapshot DOM for selector check: {}", e);
                return;
            }
        };
        let document = scraper::Html::parse_document(&html);
        let missing = selector::unresolved(
            &document,
            report.shifts.iter().filter_map(|s| s.source_selector.as_deref()),
        );
        for sel in &missing {
            debug!("shifted element no longer in the page: {}", sel);
        }
        if !missing.is_empty() {
            info!(
                "{} of {} shifted elements were removed or changed after shifting",
                missing.len(),
                report.shifts.len()
            );
        }
    }
}

impl PageInspector for CdpInspector {
    fn new(config: InspectConfig) -> Result<Self>
    where
        Self: Sized,
    {
        config.validate()?;

        // Cookie problems must surface before a browser is launched
        let cookies = match &config.cookie_file {
            Some(path) => load_cookie_file(path)?,
            None => Vec::new(),
        };

        let metrics = config.metrics();
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some((metrics.width, metrics.height)))
            .idle_browser_timeout(
                Duration::from_millis(config.timeout_ms) + Duration::from_secs(30),
            )
            .args(vec![OsStr::new("--hide-scrollbars")])
            .build()
            .map_err(|e| {
                Error::InitializationError(format!("Failed to build launch options: {}", e))
            })?;

        // Launch the browser
        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        if let Some(ua) = &metrics.user_agent {
            tab.set_user_agent(ua, None, None)
                .map_err(|e| {
                    Error::InitializationError(format!("Failed to set user agent: {}", e))
                })?;
        }

        let inspector = Self {
            browser,
            tab,
            config,
            metrics,
        };

        if !cookies.is_empty() {
            inspector.set_cookies(cookies)?;
        }

        // Viewport, pixel ratio and the mobile layout viewport
        send::<Emulation::SetDeviceMetricsOverride>(
            &inspector.tab,
            inspector.metrics.override_params(),
        )?;
        if let Some(touch) = inspector.metrics.touch_params() {
            send::<Emulation::SetTouchEmulationEnabled>(&inspector.tab, touch)?;
        }

        // Slow the network and CPU down so shifts have a chance to be observed
        if let Some(network) = inspector.config.network {
            send::<Network::Enable>(&inspector.tab, serde_json::json!({}))?;
            send::<Network::EmulateNetworkConditions>(&inspector.tab, network.emulation_params())?;
        }
        if let Some(rate) = inspector.config.cpu_throttle {
            inspector
                .tab
                .call_method(Emulation::SetCPUThrottlingRate { rate })
                .map_err(|e| Error::InitializationError(format!("Failed to throttle CPU: {}", e)))?;
        }

        // The recorder has to be in place before any page script runs
        inspector
            .tab
            .call_method(Page::AddScriptToEvaluateOnNewDocument {
                source: RECORDER_SOURCE.to_string(),
                world_name: None,
                include_command_line_api: None,
                run_immediately: None,
            })
            .map_err(|e| Error::ScriptError(format!("Failed to install shift recorder: {}", e)))?;

        debug!(
            "inspector ready: {}x{} @{}x, windowing {}",
            inspector.metrics.width,
            inspector.metrics.height,
            inspector.metrics.dpr,
            inspector.config.windowing
        );
        Ok(inspector)
    }

    fn inspect(&mut self, url: &str) -> Result<Inspection> {
        let target = parse_target_url(url)?;
        let timeout_ms = self.config.timeout_ms;
        info!("loading {}", target);

        self.tab
            .navigate_to(target.as_str())
            .map_err(|e| load_error(e, timeout_ms))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| load_error(e, timeout_ms))?;

        // Suspend until the load event so the recorder has disconnected
        self.tab
            .evaluate(WAIT_FOR_LOAD_EXPRESSION, true)
            .map_err(|e| load_error(e, timeout_ms))?;

        let payload = self.evaluate_string(READ_EXPRESSION)?;
        let notifications = parse_recording(&payload)?;
        debug!("read {} layout-shift notifications", notifications.len());

        let report = collect(notifications, self.config.windowing);
        self.check_selectors(&report);

        let screenshot_png = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| Error::RenderError(format!("Screenshot failed: {}", e)))?;

        info!(
            "CLS {:.3} from {} shifted elements",
            report.cumulative_score,
            report.shifts.len()
        );

        Ok(Inspection {
            url: self.tab.get_url(),
            report,
            screenshot_png,
            scale_factor: self.metrics.dpr,
        })
    }

    fn close(self) -> Result<()> {
        // Drop explicitly so the child process is terminated promptly
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
