//! `approvetap status`: asks a running collector about its session.

use anyhow::Result;
use approvetap_config::CollectorSettings;
use serde_json::Value;

/// Wildcard binds are reached over loopback.
pub fn status_url(settings: &CollectorSettings) -> String {
    let host = match settings.bind.as_str() {
        "0.0.0.0" | "::" | "" => "127.0.0.1",
        other => other,
    };
    if host.contains(':') {
        format!("http://[{host}]:{}/status", settings.port)
    } else {
        format!("http://{host}:{}/status", settings.port)
    }
}

pub async fn run(settings: &CollectorSettings) -> Result<()> {
    let url = status_url(settings);
    match reqwest::get(&url).await {
        Ok(resp) => {
            let body: Value = resp.error_for_status()?.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(_) => {
            println!("approvetap collector is not running at {url}");
        }
    }
    Ok(())
}
