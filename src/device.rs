//! Device emulation profiles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{Error, Result};

/// User agent of the emulated phone (Nexus 5X)
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 8.0.0; Nexus 5X Build/OPR4.170623.006) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/75.0.3765.0 Mobile Safari/537.36";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetrics {
    pub width: u32,
    pub height: u32,
    /// Device pixel ratio, also the renderer's scale factor
    pub dpr: f64,
    pub mobile: bool,
    /// User agent to send, `None` keeps the browser default
    pub user_agent: Option<String>,
}

impl DeviceMetrics {
    /// Replace the viewport size while keeping the pixel ratio
    pub fn with_viewport(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        if let Some(w) = width {
            self.width = w;
        }
        if let Some(h) = height {
            self.height = h;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.dpr.is_finite() || self.dpr < 1.0 {
            return Err(Error::ConfigError(format!(
                "device pixel ratio must be >= 1, got {}",
                self.dpr
            )));
        }
        Ok(())
    }
}

impl DeviceMetrics {
    /// Parameters for `Emulation.setDeviceMetricsOverride`
    pub fn override_params(&self) -> Value {
        json!({
            "width": self.width,
            "height": self.height,
            "deviceScaleFactor": self.dpr,
            "mobile": self.mobile,
        })
    }

    /// Parameters for `Emulation.setTouchEmulationEnabled`, phones only
    pub fn touch_params(&self) -> Option<Value> {
        self.mobile.then(|| json!({ "enabled": true, "maxTouchPoints": 5 }))
    }
}

/// Emulated network link
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkConditions {
    /// Added round-trip latency in milliseconds
    pub latency_ms: f64,
    pub download_bytes_per_sec: f64,
    pub upload_bytes_per_sec: f64,
}

impl NetworkConditions {
    /// 1.5 Mbps down, 750 Kbps up, 40ms latency
    pub const GOOD_3G: NetworkConditions = NetworkConditions {
        latency_ms: 40.0,
        download_bytes_per_sec: 1.5 * 1024.0 * 1024.0 / 8.0,
        upload_bytes_per_sec: 750.0 * 1024.0 / 8.0,
    };

    pub fn validate(&self) -> Result<()> {
        let fields = [self.latency_ms, self.download_bytes_per_sec, self.upload_bytes_per_sec];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::ConfigError(format!("invalid network conditions {:?}", self)));
        }
        Ok(())
    }

    /// Parameters for `Network.emulateNetworkConditions`
    pub fn emulation_params(&self) -> Value {
        json!({
            "offline": false,
            "latency": self.latency_ms,
            "downloadThroughput": self.download_bytes_per_sec,
            "uploadThroughput": self.upload_bytes_per_sec,
        })
    }
}

impl Default for NetworkConditions {
    fn default() -> Self {
        Self::GOOD_3G
    }
}

/// Built-in device profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    /// Nexus 5X phone
    #[default]
    Mobile,
    /// 1920x1080 desktop window
    Desktop,
}

impl DeviceProfile {
    pub fn metrics(self) -> DeviceMetrics {
        match self {
            DeviceProfile::Mobile => DeviceMetrics {
                width: 412,
                height: 732,
                dpr: 2.625,
                mobile: true,
                user_agent: Some(MOBILE_USER_AGENT.to_string()),
            },
            DeviceProfile::Desktop => DeviceMetrics {
                width: 1920,
                height: 1080,
                dpr: 1.0,
                mobile: false,
                user_agent: None,
            },
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceProfile::Mobile => f.write_str("mobile"),
            DeviceProfile::Desktop => f.write_str("desktop"),
        }
    }
}

impl FromStr for DeviceProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(DeviceProfile::Mobile),
            "desktop" => Ok(DeviceProfile::Desktop),
            other => Err(Error::ConfigError(format!(
                "unknown device '{}' (expected mobile or desktop)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_keep_pixel_ratio() {
        let m = DeviceProfile::Mobile.metrics().with_viewport(Some(800), None);
        assert_eq!(m.width, 800);
        assert_eq!(m.height, 732);
        assert_eq!(m.dpr, 2.625);
        assert!(m.mobile);
    }

    #[test]
    fn desktop_is_unscaled() {
        let m = DeviceProfile::Desktop.metrics();
        assert_eq!((m.width, m.height), (1920, 1080));
        assert_eq!(m.dpr, 1.0);
        assert!(m.user_agent.is_none());
    }

    #[test]
    fn validation_rejects_bad_metrics() {
        assert!(DeviceProfile::Desktop.metrics().with_viewport(Some(0), None).validate().is_err());
        let mut m = DeviceProfile::Desktop.metrics();
        m.dpr = 0.5;
        assert!(m.validate().is_err());
        assert!(DeviceProfile::Mobile.metrics().validate().is_ok());
    }

    #[test]
    fn mobile_profile_emulates_a_phone() {
        let params = DeviceProfile::Mobile
            .metrics()
            .with_viewport(Some(600), None)
            .override_params();
        assert_eq!(params["width"], 600);
        assert_eq!(params["height"], 732);
        assert_eq!(params["deviceScaleFactor"], 2.625);
        assert_eq!(params["mobile"], true);
        assert_eq!(DeviceProfile::Mobile.metrics().touch_params().unwrap()["enabled"], true);
    }

    #[test]
    fn desktop_profile_has_no_touch() {
        let m = DeviceProfile::Desktop.metrics();
        assert_eq!(m.override_params()["mobile"], false);
        assert!(m.touch_params().is_none());
    }

    #[test]
    fn good_3g_matches_the_tool() {
        let params = NetworkConditions::default().emulation_params();
        assert_eq!(params["offline"], false);
        assert_eq!(params["latency"], 40.0);
        assert_eq!(params["downloadThroughput"], 196_608.0);
        assert_eq!(params["uploadThroughput"], 96_000.0);
        assert!(NetworkConditions::GOOD_3G.validate().is_ok());

        let broken = NetworkConditions { latency_ms: -1.0, ..NetworkConditions::GOOD_3G };
        assert!(matches!(broken.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn parses_profile_names() {
        assert_eq!("Desktop".parse::<DeviceProfile>().unwrap(), DeviceProfile::Desktop);
        assert!("tablet".parse::<DeviceProfile>().is_err());
    }
}
