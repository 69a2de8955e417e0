//! Cookie file loading
//!
//! The file is a JSON array of cookie objects as exported by browser tooling
//! (`name`, `value`, plus optional `url`, `domain`, `path`, `expires`,
//! `httpOnly`, `secure`, `sameSite`). Unknown keys are ignored.

use std::path::Path;

use log::debug;

use crate::{CookieParam, Error, Result};

/// Read and validate a cookie file. Runs before any browser is started.
pub fn load_cookie_file(path: &Path) -> Result<Vec<CookieParam>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::CookieError(format!("{}: {}", path.display(), e)))?;
    let cookies = parse_cookies(&raw).map_err(|e| match e {
        Error::CookieError(msg) => Error::CookieError(format!("{}: {}", path.display(), msg)),
        other => other,
    })?;
    debug!("loaded {} cookies from {}", cookies.len(), path.display());
    Ok(cookies)
}

pub fn parse_cookies(raw: &str) -> Result<Vec<CookieParam>> {
    let cookies: Vec<CookieParam> = serde_json::from_str(raw)
        .map_err(|e| Error::CookieError(format!("malformed JSON: {}", e)))?;

    for (i, c) in cookies.iter().enumerate() {
        if c.name.is_empty() {
            return Err(Error::CookieError(format!("cookie #{} has an empty name", i)));
        }
        if c.url.is_none() && c.domain.is_none() {
            return Err(Error::CookieError(format!(
                "cookie '{}' needs a url or a domain",
                c.name
            )));
        }
    }
    Ok(cookies)
}
