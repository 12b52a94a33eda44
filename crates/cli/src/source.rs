//! Input acquisition: target CSV from disk, reference CSV from disk or HTTP.

use std::path::Path;
use std::time::Duration;

use carjoin_recon::config::ReferenceConfig;
use carjoin_recon::JoinError;

pub const USER_AGENT: &str = concat!("carjoin/", env!("CARGO_PKG_VERSION"));

/// Read the target CSV. Errors are `Io` so they map to the target exit code.
pub fn read_target(path: &Path) -> Result<String, JoinError> {
    std::fs::read_to_string(path)
        .map(strip_bom)
        .map_err(|e| JoinError::Io(format!("cannot read {}: {e}", path.display())))
}

/// Read the reference CSV, resolving local paths against `base_dir`.
///
/// Remote sources are fetched with a single GET bounded by
/// `timeout_secs`; exceeding it is `LoadTimeout`, any other failure is
/// `ReferenceLoad`.
pub fn read_reference(config: &ReferenceConfig, base_dir: &Path) -> Result<String, JoinError> {
    if config.is_remote() {
        return fetch_remote(&config.source, config.timeout_secs);
    }

    let path = base_dir.join(&config.source);
    std::fs::read_to_string(&path)
        .map(strip_bom)
        .map_err(|e| JoinError::ReferenceLoad(format!("cannot read {}: {e}", path.display())))
}

fn fetch_remote(source: &str, timeout_secs: u64) -> Result<String, JoinError> {
    let url = url::Url::parse(source)
        .map_err(|e| JoinError::ReferenceLoad(format!("invalid URL '{source}': {e}")))?;

    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| JoinError::ReferenceLoad(format!("failed to build HTTP client: {e}")))?;

    tracing::info!(url = %url, timeout_secs, "fetching reference data");

    let response = http
        .get(url.as_str())
        .send()
        .map_err(|e| classify(e, source, timeout_secs))?;

    let status = response.status();
    if !status.is_success() {
        return Err(JoinError::ReferenceLoad(format!(
            "{source} returned HTTP {}",
            status.as_u16()
        )));
    }

    let body = response.text().map_err(|e| classify(e, source, timeout_secs))?;
    Ok(strip_bom(body))
}

fn classify(err: reqwest::Error, source: &str, timeout_secs: u64) -> JoinError {
    if err.is_timeout() {
        JoinError::LoadTimeout { source: source.to_string(), seconds: timeout_secs }
    } else {
        JoinError::ReferenceLoad(format!("{source}: {err}"))
    }
}

fn strip_bom(text: String) -> String {
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}
