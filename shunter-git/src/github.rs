//! GitHub pull-request provider.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;

use shunter_core::CancelToken;

use crate::error::ProviderError;
use crate::provider::HostProvider;

const ERR_CTX: &str = "creating github pull request";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the GitHub provider.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// User or organisation that owns the repository.
    pub repo_owner: String,
    /// Repository name, without the owner.
    pub repo: String,
    /// Personal access token or app token.
    pub access_token: String,
    /// Optional GitHub Enterprise hostname (e.g. `git.corp.example.com`).
    /// Leave empty for github.com.
    pub enterprise_host: String,
}

/// Creates pull requests on GitHub.
pub struct Provider {
    client: Client,
    base_url: String,
    repo_owner: String,
    repo: String,
    access_token: String,
}

#[derive(Serialize)]
struct NewPullRequest<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

impl Provider {
    /// Validate `cfg` and build a provider ready to create pull requests.
    pub fn new(cfg: Config) -> Result<Self, ProviderError> {
        const CTX: &str = "creating github provider";

        if cfg.repo_owner.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "repo owner",
            });
        }
        if cfg.repo.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "repo",
            });
        }
        if cfg.access_token.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "access token",
            });
        }

        let base_url = if cfg.enterprise_host.is_empty() {
            "https://api.github.com".to_string()
        } else {
            format!("https://{}/api/v3", cfg.enterprise_host)
        };

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent("shunter")
            .build()
            .map_err(|source| ProviderError::Http {
                context: CTX,
                source,
            })?;

        Ok(Self {
            client,
            base_url,
            repo_owner: cfg.repo_owner,
            repo: cfg.repo,
            access_token: cfg.access_token,
        })
    }
}

impl HostProvider for Provider {
    /// Create a pull request from branch `from` into branch `to`.
    ///
    /// A 422 response means a PR already exists for this head/base pair and
    /// is treated as success.
    fn create_pr(
        &self,
        cancel: &CancelToken,
        from: &str,
        to: &str,
        title: &str,
        body: &str,
    ) -> Result<(), ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let url = format!(
            "{}/repos/{}/{}/pulls",
            self.base_url, self.repo_owner, self.repo
        );
        let payload = NewPullRequest {
            title,
            head: from,
            base: to,
            body,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/vnd.github+json")
            .json(&payload)
            .send()
            .map_err(|source| ProviderError::Http {
                context: ERR_CTX,
                source,
            })?;

        match resp.status() {
            StatusCode::CREATED => {
                tracing::info!("created pull request");
                Ok(())
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                tracing::info!("reusing existing pull request");
                Ok(())
            }
            other => {
                match resp.text() {
                    Ok(text) => tracing::warn!(body = %text, "github response"),
                    Err(err) => tracing::warn!(error = %err, "cannot read response body"),
                }
                Err(ProviderError::UnexpectedStatus {
                    context: ERR_CTX,
                    status: other.as_u16(),
                })
            }
        }
    }
}
