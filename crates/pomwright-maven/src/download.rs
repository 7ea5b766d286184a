//! Blocking HTTP fetches from Maven repositories.
//!
//! Transforms run synchronously on worker threads, so fetches use the
//! blocking reqwest client. Server errors, timeouts and connection failures
//! are retried with a linear backoff; a 404 is "not in this repository".

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use pomwright_util::errors::PomwrightError;

use crate::repository::MavenRepository;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Build a shared blocking client for repository fetches.
pub fn build_client() -> miette::Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("pomwright/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            PomwrightError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// Fetch a text file (POM, metadata) with authentication and retries.
///
/// Returns `Ok(None)` for 404.
pub fn download_text(
    client: &Client,
    repo: &MavenRepository,
    url: &str,
) -> miette::Result<Option<String>> {
    let mut last_err = String::new();

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            std::thread::sleep(RETRY_DELAY * attempt);
            tracing::debug!("Retrying {url} (attempt {})", attempt + 1);
        }

        let request = repo.authorize(client.get(url));
        match request.send() {
            Ok(resp) => {
                let status = resp.status();
                if status == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(PomwrightError::Network {
                        message: format!("HTTP {status} fetching {url}"),
                    }
                    .into());
                }
                let text = resp.text().map_err(|e| PomwrightError::Network {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                return Ok(Some(text));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = e.to_string();
                continue;
            }
            Err(e) => {
                return Err(PomwrightError::Network {
                    message: format!("Request to {url} failed: {e}"),
                }
                .into());
            }
        }
    }

    Err(PomwrightError::Network {
        message: format!("Failed after {MAX_RETRIES} attempts for {url}: {last_err}"),
    }
    .into())
}
