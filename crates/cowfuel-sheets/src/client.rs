//! HTTP client for the published sheet CSV export.

use std::future::Future;
use std::time::Duration;

use reqwest::{redirect, Client, Url};

use crate::error::FetchError;

/// Something that can produce the raw CSV text of the fuel plan.
///
/// [`SheetClient`] is the production implementation; the cache only sees
/// this trait so tests can substitute canned text or failures.
pub trait SheetSource: Send + Sync {
    fn fetch_csv(&self) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Fetches a published spreadsheet export over HTTP.
///
/// Google serves published sheets through one or more redirects to a
/// short-lived content host. Redirects are followed here rather than by
/// `reqwest` so the hop limit and missing-`Location` cases surface as typed
/// errors.
pub struct SheetClient {
    client: Client,
    sheet_url: Url,
    max_redirects: usize,
}

impl SheetClient {
    /// Creates a client for `sheet_url` with a request timeout and hop limit.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if `sheet_url` does not parse.
    /// - [`FetchError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        sheet_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_redirects: usize,
    ) -> Result<Self, FetchError> {
        let sheet_url = Url::parse(sheet_url).map_err(|e| FetchError::InvalidUrl {
            url: sheet_url.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            sheet_url,
            max_redirects,
        })
    }

    /// Builds a client from the application config.
    ///
    /// # Errors
    ///
    /// Same as [`SheetClient::new`].
    pub fn from_config(config: &cowfuel_core::AppConfig) -> Result<Self, FetchError> {
        Self::new(
            &config.sheet_url,
            config.fetch_timeout_secs,
            &config.user_agent,
            config.max_redirects,
        )
    }

    #[must_use]
    pub fn sheet_url(&self) -> &Url {
        &self.sheet_url
    }

    /// Downloads the CSV body, following up to `max_redirects` redirects.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] on network, TLS or timeout failure.
    /// - [`FetchError::MissingLocation`] for a 3xx without a usable `Location`.
    /// - [`FetchError::TooManyRedirects`] when the hop limit is exceeded.
    /// - [`FetchError::InvalidUrl`] if a `Location` cannot be resolved.
    /// - [`FetchError::UnexpectedStatus`] for any other non-2xx final status.
    pub async fn fetch_text(&self) -> Result<String, FetchError> {
        let mut url = self.sheet_url.clone();
        let mut hops = 0usize;

        loop {
            let response = self
                .client
                .get(url.clone())
                .header(
                    reqwest::header::ACCEPT,
                    "text/csv,text/plain;q=0.9,*/*;q=0.8",
                )
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .send()
                .await?;
            let status = response.status();

            if status.is_redirection() {
                if hops >= self.max_redirects {
                    return Err(FetchError::TooManyRedirects {
                        url: self.sheet_url.to_string(),
                        max_redirects: self.max_redirects,
                    });
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| FetchError::MissingLocation {
                        status: status.as_u16(),
                        url: url.to_string(),
                    })?;

                // Location may be relative to the URL that issued it.
                let next = url.join(location).map_err(|e| FetchError::InvalidUrl {
                    url: location.to_owned(),
                    reason: e.to_string(),
                })?;

                hops += 1;
                tracing::debug!(from = %url, to = %next, hops, "following sheet redirect");
                url = next;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let body = response.text().await?;
            return Ok(strip_bom(body));
        }
    }
}

impl SheetSource for SheetClient {
    fn fetch_csv(&self) -> impl Future<Output = Result<String, FetchError>> + Send {
        self.fetch_text()
    }
}

fn strip_bom(body: String) -> String {
    match body.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_owned(),
        None => body,
    }
}
