//! Bitbucket Server pull-request provider.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;

use shunter_core::CancelToken;

use crate::error::ProviderError;
use crate::provider::HostProvider;

const ERR_CTX: &str = "creating bitbucket pull request";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the Bitbucket Server provider.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Full REST API URL for pull requests, including project and repo
    /// path (e.g. `https://bb.example.com/rest/api/1.0/projects/PROJ/repos/repo/pull-requests`).
    pub api_endpoint: String,
    /// Project key referenced by the PR refs.
    pub project_key: String,
    /// Repository slug referenced by the PR refs.
    pub repo_slug: String,
    /// API username.
    pub user: String,
    /// API password or personal access token.
    pub password: String,
}

/// Creates pull requests on Bitbucket Server.
pub struct Provider {
    client: Client,
    endpoint: String,
    project_key: String,
    repo_slug: String,
    user: String,
    password: String,
}

#[derive(Serialize)]
struct Project<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct Repository<'a> {
    slug: &'a str,
    project: Project<'a>,
}

#[derive(Serialize)]
struct PullRequestRef<'a> {
    id: String,
    repository: Repository<'a>,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    title: &'a str,
    description: &'a str,
    state: &'a str,
    open: bool,
    closed: bool,
    #[serde(rename = "fromRef")]
    from_ref: PullRequestRef<'a>,
    #[serde(rename = "toRef")]
    to_ref: PullRequestRef<'a>,
    locked: bool,
    reviewers: [(); 0],
}

impl Provider {
    /// Validate `cfg` and build a provider ready to create pull requests.
    pub fn new(cfg: Config) -> Result<Self, ProviderError> {
        const CTX: &str = "creating bitbucket provider";

        if cfg.api_endpoint.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "api endpoint",
            });
        }
        if cfg.project_key.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "project key",
            });
        }
        if cfg.repo_slug.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "repo slug",
            });
        }
        if cfg.user.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "user",
            });
        }
        if cfg.password.is_empty() {
            return Err(ProviderError::Config {
                context: CTX,
                field: "password",
            });
        }

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
            endpoint: cfg.api_endpoint,
            project_key: cfg.project_key,
            repo_slug: cfg.repo_slug,
            user: cfg.user,
            password: cfg.password,
        })
    }

    fn pr_ref(&self, branch: &str) -> PullRequestRef<'_> {
        PullRequestRef {
            id: format!("refs/heads/{branch}"),
            repository: Repository {
                slug: &self.repo_slug,
                project: Project {
                    key: &self.project_key,
                },
            },
        }
    }
}

impl HostProvider for Provider {
    /// Create a pull request from branch `from` into branch `to`.
    ///
    /// Succeeds on 201 (created) and 409 (already exists).
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

        let payload = PullRequest {
            title,
            description: body,
            state: "OPEN",
            open: true,
            closed: false,
            from_ref: self.pr_ref(from),
            to_ref: self.pr_ref(to),
            locked: false,
            reviewers: [],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&payload)
            .send()
            .map_err(|source| ProviderError::Http {
                context: ERR_CTX,
                source,
            })?;

        let status = resp.status();
        match resp.text() {
            Ok(text) => tracing::info!(status = %status, body = %text, "bitbucket response"),
            Err(err) => tracing::warn!(error = %err, "cannot read response body"),
        }

        match status {
            StatusCode::CREATED => {
                tracing::info!("pull request created");
                Ok(())
            }
            StatusCode::CONFLICT => {
                tracing::info!("reusing existing pull request");
                Ok(())
            }
            other => Err(ProviderError::UnexpectedStatus {
                context: ERR_CTX,
                status: other.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::serve_once;

    fn config(endpoint: &str) -> Config {
        Config {
            api_endpoint: endpoint.to_string(),
            project_key: "DEPLOY".to_string(),
            repo_slug: "manifests".to_string(),
            user: "bot".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn new_rejects_missing_fields() {
        for field in ["api_endpoint", "project_key", "repo_slug", "user", "password"] {
            let mut cfg = config("https://bb.example.com/rest/api/1.0/x");
            match field {
                "api_endpoint" => cfg.api_endpoint.clear(),
                "project_key" => cfg.project_key.clear(),
                "repo_slug" => cfg.repo_slug.clear(),
                "user" => cfg.user.clear(),
                "password" => cfg.password.clear(),
                _ => unreachable!(),
            }
            assert!(Provider::new(cfg).is_err(), "expected error for empty {field}");
        }
    }

    #[test]
    fn created_is_success() {
        let (endpoint, handle) = serve_once(201, "{}");
        let provider = Provider::new(config(&endpoint)).unwrap();
        let cancel = CancelToken::new();

        provider
            .create_pr(&cancel, "deploy/prod", "main", "GitOps deployment", "body")
            .unwrap();

        let request = handle.join().unwrap();
        assert!(request.contains("POST"));
        assert!(request.contains("refs/heads/deploy/prod"));
        assert!(request.contains("\"state\":\"OPEN\""));
        assert!(request.contains("\"key\":\"DEPLOY\""));
        assert!(request.contains("\"slug\":\"manifests\""));
    }

    #[test]
    fn conflict_is_idempotent_success() {
        let (endpoint, handle) = serve_once(409, r#"{"errors":[{"message":"already exists"}]}"#);
        let provider = Provider::new(config(&endpoint)).unwrap();
        let cancel = CancelToken::new();

        provider
            .create_pr(&cancel, "deploy/prod", "main", "t", "b")
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn other_status_fails_with_status() {
        let (endpoint, handle) = serve_once(500, "boom");
        let provider = Provider::new(config(&endpoint)).unwrap();
        let cancel = CancelToken::new();

        let err = provider
            .create_pr(&cancel, "deploy/prod", "main", "t", "b")
            .unwrap_err();
        handle.join().unwrap();

        match err {
            ProviderError::UnexpectedStatus { status, .. } => assert_eq!(status, 500),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cancelled_token_short_circuits() {
        let provider = Provider::new(config("http://127.0.0.1:1/unreachable")).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = provider
            .create_pr(&cancel, "deploy/prod", "main", "t", "b")
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }
}
