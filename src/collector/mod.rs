//! Layout shift collection
//!
//! The page-side recorder (see [`script`]) buffers every `layout-shift`
//! performance entry it sees until the load event. Those raw notifications are
//! folded here, outside the page, by [`ShiftCollector`]: input-driven shifts are
//! dropped, the windowing policy decides when a new session starts, and the
//! surviving geometry is kept index-aligned with the shift values.
//!
//! ```
//! use layout_shift_gif::collector::{
//!     collect, AffectedElement, Rect, ShiftNotification, WindowingMode,
//! };
//!
//! let moved = AffectedElement {
//!     previous_rect: Rect::new(0.0, 0.0, 100.0, 50.0),
//!     current_rect: Rect::new(0.0, 40.0, 100.0, 50.0),
//!     selector: Some("html > body > div".to_string()),
//! };
//! let report = collect(
//!     vec![ShiftNotification::new(0.04, 120.0, vec![moved])],
//!     WindowingMode::SessionWindowed,
//! );
//! assert_eq!(report.shifts.len(), 1);
//! assert!((report.cumulative_score - 0.04).abs() < 1e-9);
//! ```

pub mod script;
pub mod selector;

use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::Receiver;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Largest gap between two consecutive shifts of one session, in milliseconds
pub const SESSION_GAP_MS: f64 = 1000.0;

/// Largest span from the first shift of a session to any later one, in milliseconds
pub const SESSION_SPAN_MS: f64 = 5000.0;

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The same rectangle in device pixels
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// One element moved by a layout shift, as reported by the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedElement {
    pub previous_rect: Rect,
    pub current_rect: Rect,
    /// CSS path of the element, `None` when the node was already detached
    #[serde(default)]
    pub selector: Option<String>,
}

/// A raw `layout-shift` performance entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftNotification {
    pub value: f64,
    /// Milliseconds since navigation start
    pub start_time: f64,
    #[serde(default)]
    pub had_recent_input: bool,
    #[serde(default)]
    pub sources: Vec<AffectedElement>,
}

impl ShiftNotification {
    pub fn new(value: f64, start_time: f64, sources: Vec<AffectedElement>) -> Self {
        Self {
            value,
            start_time,
            had_recent_input: false,
            sources,
        }
    }

    /// Mark the notification as caused by user input
    pub fn with_recent_input(mut self) -> Self {
        self.had_recent_input = true;
        self
    }
}

/// One (notification, element) pair kept in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftEvent {
    pub value: f64,
    pub previous_rect: Rect,
    pub current_rect: Rect,
    pub source_selector: Option<String>,
}

/// Attribution record written to the optional JSON report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSource {
    pub value: f64,
    pub elements: Vec<Option<String>>,
}

/// Final snapshot of the measured session, handed to the renderer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub cumulative_score: f64,
    pub shifts: Vec<ShiftEvent>,
    pub sources: Vec<ShiftSource>,
}

impl ShiftReport {
    pub fn previous_rects(&self) -> Vec<Rect> {
        self.shifts.iter().map(|s| s.previous_rect).collect()
    }

    pub fn current_rects(&self) -> Vec<Rect> {
        self.shifts.iter().map(|s| s.current_rect).collect()
    }

    /// Per-shift values, parallel to both rect views
    pub fn values(&self) -> Vec<f64> {
        self.shifts.iter().map(|s| s.value).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }
}

/// How consecutive shifts are grouped into a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowingMode {
    /// Only the latest session window counts (1s gap, 5s span)
    #[default]
    SessionWindowed,
    /// Every shift until load counts
    Unbounded,
}

impl fmt::Display for WindowingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowingMode::SessionWindowed => f.write_str("session-windowed"),
            WindowingMode::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl FromStr for WindowingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session-windowed" | "session" | "windowed" => Ok(WindowingMode::SessionWindowed),
            "unbounded" | "all" => Ok(WindowingMode::Unbounded),
            other => Err(Error::ConfigError(format!(
                "unknown windowing mode '{}' (expected session-windowed or unbounded)",
                other
            ))),
        }
    }
}

/// Accumulates shift notifications into a [`ShiftReport`]
///
/// The collector is consumed by [`ShiftCollector::finish`], so nothing can be
/// added once the report has been taken.
#[derive(Debug, Clone, Default)]
pub struct ShiftCollector {
    mode: WindowingMode,
    score: f64,
    shifts: Vec<ShiftEvent>,
    sources: Vec<ShiftSource>,
    first_timestamp_in_session: Option<f64>,
    previous_timestamp: Option<f64>,
}

impl ShiftCollector {
    pub fn new(mode: WindowingMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> WindowingMode {
        self.mode
    }

    /// Running score of the current session
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Fold one notification in. Returns whether it contributed to the score.
    pub fn push(&mut self, notification: &ShiftNotification) -> bool {
        if notification.had_recent_input {
            debug!(
                "ignoring input-driven shift at {:.1}ms (value {})",
                notification.start_time, notification.value
            );
            return false;
        }
        if !notification.value.is_finite() || notification.value < 0.0 {
            debug!("ignoring shift with invalid value {}", notification.value);
            return false;
        }

        if self.mode == WindowingMode::SessionWindowed
            && self.starts_new_session(notification.start_time)
        {
            if !self.shifts.is_empty() {
                debug!(
                    "session window closed at {:.1}ms, discarding score {:.4}",
                    notification.start_time, self.score
                );
            }
            self.score = 0.0;
            self.shifts.clear();
            self.sources.clear();
            self.first_timestamp_in_session = Some(notification.start_time);
        }
        self.previous_timestamp = Some(notification.start_time);

        for element in &notification.sources {
            self.shifts.push(ShiftEvent {
                value: notification.value,
                previous_rect: element.previous_rect,
                current_rect: element.current_rect,
                source_selector: element.selector.clone(),
            });
            self.sources.push(ShiftSource {
                value: notification.value,
                elements: vec![element.selector.clone()],
            });
        }
        self.score += notification.value;
        true
    }

    fn starts_new_session(&self, start_time: f64) -> bool {
        match (self.first_timestamp_in_session, self.previous_timestamp) {
            (Some(first), Some(previous)) => {
                start_time - first > SESSION_SPAN_MS || start_time - previous > SESSION_GAP_MS
            }
            _ => true,
        }
    }

    /// Stop collecting and take the report
    pub fn finish(self) -> ShiftReport {
        ShiftReport {
            cumulative_score: self.score,
            shifts: self.shifts,
            sources: self.sources,
        }
    }
}

/// Fold a finished sequence of notifications
pub fn collect<I>(notifications: I, mode: WindowingMode) -> ShiftReport
where
    I: IntoIterator<Item = ShiftNotification>,
{
    let mut collector = ShiftCollector::new(mode);
    for n in notifications {
        collector.push(&n);
    }
    collector.finish()
}

/// Fold notifications from a channel until every sender is dropped.
///
/// Dropping the last sender plays the role of the page load event.
pub fn observe(notifications: Receiver<ShiftNotification>, mode: WindowingMode) -> ShiftReport {
    let mut collector = ShiftCollector::new(mode);
    while let Ok(n) = notifications.recv() {
        collector.push(&n);
    }
    collector.finish()
}
