//! HTTP probe executor.

use std::time::Duration;

use super::ProbeOutcome;

/// Probe an HTTP endpoint with a fixed timeout and a bounded retry count.
///
/// Retries apply to transport-level failures only (connect errors, timeouts,
/// truncated bodies). A response with any status code, success or not, settles
/// the probe immediately; the collector decides what the code means.
pub async fn probe_http(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    retries: u32,
) -> ProbeOutcome {
    tracing::debug!(url = %url, "probing");

    let mut timed_out = false;
    for attempt in 0..=retries {
        let result = client.get(url).timeout(timeout).send().await;
        match result {
            Ok(response) => {
                let status_code = response.status().as_u16();
                match response.text().await {
                    Ok(body) => {
                        return ProbeOutcome {
                            reachable: true,
                            timed_out: false,
                            status_code,
                            body,
                        };
                    }
                    Err(e) => {
                        timed_out = e.is_timeout();
                        tracing::debug!(url = %url, attempt, error = %e, "probe body read failed");
                    }
                }
            }
            Err(e) => {
                timed_out = e.is_timeout();
                tracing::debug!(url = %url, attempt, error = %e, "probe request failed");
            }
        }
    }

    ProbeOutcome {
        reachable: false,
        timed_out,
        status_code: 0,
        body: String::new(),
    }
}
