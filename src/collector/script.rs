//! In-page recorder for `layout-shift` entries
//!
//! [`RECORDER_SOURCE`] is installed with `Page.addScriptToEvaluateOnNewDocument`
//! so it runs before any page script. It only buffers raw entries; windowing
//! happens in [`crate::collector::ShiftCollector`] once the host has read the
//! buffer back with [`READ_EXPRESSION`].

use log::warn;
use serde::Deserialize;

use super::ShiftNotification;
use crate::{Error, Result};

/// Global the recorder keeps its state under
pub const RECORDER_GLOBAL: &str = "__layoutShiftRecorder";

/// Recorder installed before navigation.
///
/// Selector rules match [`crate::collector::selector::css_path`].
pub const RECORDER_SOURCE: &str = r#"(function () {
  if (window.__layoutShiftRecorder) return;
  var state = { supported: false, loaded: false, notifications: [] };
  window.__layoutShiftRecorder = state;

  if (typeof PerformanceObserver === 'undefined' ||
      (PerformanceObserver.supportedEntryTypes || []).indexOf('layout-shift') === -1) {
    return;
  }
  state.supported = true;

  function escapeIdent(s) {
    return (window.CSS && CSS.escape) ? CSS.escape(s) : s;
  }

  function cssPath(node) {
    if (!node || node.nodeType !== 1 || !node.isConnected) return null;
    var root = document.documentElement;
    var parts = [];
    var el = node;
    while (el && el !== root) {
      var parent = el.parentElement;
      if (!parent) return null;
      var tag = el.localName;
      var part = tag;
      if (el.id) part += '#' + escapeIdent(el.id);
      for (var i = 0; i < el.classList.length; i++) part += '.' + escapeIdent(el.classList[i]);
      var same = 0, index = 0;
      for (var j = 0; j < parent.children.length; j++) {
        if (parent.children[j].localName === tag) same++;
        if (parent.children[j] === el) index = j + 1;
      }
      if (same > 1) part += ':nth-child(' + index + ')';
      parts.unshift(part);
      el = parent;
    }
    parts.unshift(root.localName);
    return parts.join(' > ');
  }

  function copyRect(r) {
    return { x: r.x, y: r.y, width: r.width, height: r.height };
  }

  function record(entries) {
    if (state.loaded) return;
    entries.forEach(function (entry) {
      state.notifications.push({
        value: entry.value,
        startTime: entry.startTime,
        hadRecentInput: entry.hadRecentInput,
        sources: (entry.sources || []).map(function (s) {
          return {
            previousRect: copyRect(s.previousRect),
            currentRect: copyRect(s.currentRect),
            selector: cssPath(s.node)
          };
        })
      });
    });
  }

  var observer = new PerformanceObserver(function (list) { record(list.getEntries()); });
  observer.observe({ type: 'layout-shift', buffered: true });
  window.addEventListener('load', function () {
    record(observer.takeRecords());
    observer.disconnect();
    state.loaded = true;
  });
})();"#;

/// Resolves once the load event has fired (awaited as a promise)
pub const WAIT_FOR_LOAD_EXPRESSION: &str = r#"new Promise(function (resolve) {
  if (document.readyState === 'complete') { resolve(true); return; }
  window.addEventListener('load', function () { resolve(true); });
})"#;

/// One synchronous read of the recorder state, as a JSON string
pub const READ_EXPRESSION: &str = r#"JSON.stringify(window.__layoutShiftRecorder ||
  { supported: false, loaded: false, notifications: [], missing: true })"#;

/// Recorder state as read back from the page
#[derive(Debug, Clone, Deserialize)]
pub struct Recording {
    pub supported: bool,
    #[serde(default)]
    pub loaded: bool,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub notifications: Vec<ShiftNotification>,
}

/// Parse the output of [`READ_EXPRESSION`] into raw notifications
pub fn parse_recording(payload: &str) -> Result<Vec<ShiftNotification>> {
    let recording: Recording = serde_json::from_str(payload)
        .map_err(|e| Error::ScriptError(format!("Malformed recorder payload: {}", e)))?;

    if recording.missing {
        return Err(Error::ScriptError(format!(
            "recorder global {} was never installed",
            RECORDER_GLOBAL
        )));
    }
    if !recording.supported {
        return Err(Error::Unsupported(
            "PerformanceObserver with 'layout-shift' entries is not available in this page".into(),
        ));
    }
    if !recording.loaded {
        warn!("reading layout shifts before the load event; the report may be incomplete");
    }
    Ok(recording.notifications)
}
