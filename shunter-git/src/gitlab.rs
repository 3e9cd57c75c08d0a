//! GitLab merge-request provider.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;

use shunter_core::CancelToken;

use crate::error::ProviderError;
use crate::provider::HostProvider;

const ERR_CTX: &str = "creating gitlab merge request";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the GitLab provider.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Base URL of the GitLab instance. Empty means `https://gitlab.com`.
    pub host: String,
    /// Full project path (e.g. `org/project`).
    pub repo: String,
    /// Personal or project access token.
    pub access_token: String,
}

/// Creates merge requests on GitLab. The PR body is accepted but unused;
/// merge requests are created title-only.
pub struct Provider {
    client: Client,
    host: String,
    repo: String,
    access_token: String,
}

#[derive(Serialize)]
struct NewMergeRequest<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
}

impl Provider {
    /// Validate `cfg` and build a provider ready to create merge requests.
    pub fn new(cfg: Config) -> Result<Self, ProviderError> {
        const CTX: &str = "creating gitlab provider";

        if cfg.access_token.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "access token",
            });
        }
        if cfg.repo.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "repo",
            });
        }

        let host = if cfg.host.is_empty() {
            "https://gitlab.com".to_string()
        } else {
            cfg.host
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
            host,
            repo: cfg.repo,
            access_token: cfg.access_token,
        })
    }
}

impl HostProvider for Provider {
    /// Create a merge request from branch `from` into branch `to`.
    ///
    /// A 409 response means a MR already exists for this source branch and
    /// is treated as success.
    fn create_pr(
        &self,
        cancel: &CancelToken,
        from: &str,
        to: &str,
        title: &str,
        _body: &str,
    ) -> Result<(), ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        // Project paths are addressed URL-encoded in the v4 API.
        let project = self.repo.replace('/', "%2F");
        let url = format!("{}/api/v4/projects/{project}/merge_requests", self.host);

        let payload = NewMergeRequest {
            source_branch: from,
            target_branch: to,
            title,
        };

        let resp = self
            .client
            .post(&url)
            .header("PRIVATE-TOKEN", &self.access_token)
            .json(&payload)
            .send()
            .map_err(|source| ProviderError::Http {
                context: ERR_CTX,
                source,
            })?;

        match resp.status() {
            StatusCode::CREATED => {
                tracing::info!("created merge request");
                Ok(())
            }
            StatusCode::CONFLICT => {
                tracing::info!("reusing existing merge request");
                Ok(())
            }
            other => {
                match resp.text() {
                    Ok(text) => tracing::warn!(body = %text, "gitlab response"),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::serve_once;

    fn config(host: &str) -> Config {
        Config {
            host: host.to_string(),
            repo: "acme/manifests".to_string(),
            access_token: "token".to_string(),
        }
    }

    #[test]
    fn new_rejects_missing_fields() {
        let mut cfg = config("");
        cfg.access_token.clear();
        assert!(Provider::new(cfg).is_err());

        let mut cfg = config("");
        cfg.repo.clear();
        assert!(Provider::new(cfg).is_err());
    }

    #[test]
    fn empty_host_defaults_to_public_gitlab() {
        let provider = Provider::new(config("")).unwrap();
        assert_eq!(provider.host, "https://gitlab.com");
    }

    #[test]
    fn created_is_success() {
        let (host, handle) = serve_once(201, r#"{"web_url":"https://gitlab.com/mr/1"}"#);
        let provider = Provider::new(config(&host)).unwrap();
        let cancel = CancelToken::new();

        provider
            .create_pr(&cancel, "deploy/prod", "main", "GitOps deployment", "ignored")
            .unwrap();

        let request = handle.join().unwrap();
        assert!(request.contains("POST /api/v4/projects/acme%2Fmanifests/merge_requests"));
        assert!(request.contains("\"source_branch\":\"deploy/prod\""));
        assert!(request.contains("\"target_branch\":\"main\""));
        // Title-only platform: the body must not be sent.
        assert!(!request.contains("ignored"));
    }

    #[test]
    fn conflict_is_idempotent_success() {
        let (host, handle) = serve_once(409, r#"{"message":"merge request already exists"}"#);
        let provider = Provider::new(config(&host)).unwrap();
        let cancel = CancelToken::new();

        provider
            .create_pr(&cancel, "deploy/prod", "main", "t", "b")
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn other_status_fails() {
        let (host, handle) = serve_once(401, r#"{"message":"401 Unauthorized"}"#);
        let provider = Provider::new(config(&host)).unwrap();
        let cancel = CancelToken::new();

        let err = provider
            .create_pr(&cancel, "deploy/prod", "main", "t", "b")
            .unwrap_err();
        handle.join().unwrap();

        assert!(matches!(
            err,
            ProviderError::UnexpectedStatus { status: 401, .. }
        ));
    }
}
