//! Pull-request strategy: one operation, three platform implementations.

use shunter_core::CancelToken;

use crate::error::ProviderError;

/// Creates pull requests on a git hosting platform.
///
/// Implementations are stateless beyond their validated credentials and
/// must map the platform's "a PR from `from` to `to` already exists"
/// response to success, so reruns converge.
pub trait HostProvider: Send + Sync {
    fn create_pr(
        &self,
        cancel: &CancelToken,
        from: &str,
        to: &str,
        title: &str,
        body: &str,
    ) -> Result<(), ProviderError>;
}

/// Adapts a plain function to [`HostProvider`]. When `body` is empty the
/// title is substituted.
pub struct ProviderFn<F>(pub F);

impl<F> HostProvider for ProviderFn<F>
where
    F: Fn(&CancelToken, &str, &str, &str, &str) -> Result<(), ProviderError> + Send + Sync,
{
    fn create_pr(
        &self,
        cancel: &CancelToken,
        from: &str,
        to: &str,
        title: &str,
        body: &str,
    ) -> Result<(), ProviderError> {
        let body = if body.is_empty() { title } else { body };
        (self.0)(cancel, from, to, title, body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn fn_adapter_passes_arguments_through() {
        let seen = Mutex::new(Vec::new());
        let provider = ProviderFn(|_: &CancelToken, from: &str, to: &str, title: &str, body: &str| {
            seen.lock().unwrap().push(format!("{from}|{to}|{title}|{body}"));
            Ok(())
        });

        let cancel = CancelToken::new();
        provider
            .create_pr(&cancel, "deploy/prod", "main", "title", "body")
            .unwrap();

        assert_eq!(
            seen.into_inner().unwrap(),
            vec!["deploy/prod|main|title|body".to_string()]
        );
    }

    #[test]
    fn fn_adapter_substitutes_title_for_empty_body() {
        let provider = ProviderFn(|_: &CancelToken, _: &str, _: &str, title: &str, body: &str| {
            assert_eq!(body, title);
            Ok(())
        });

        let cancel = CancelToken::new();
        provider
            .create_pr(&cancel, "deploy/prod", "main", "GitOps deployment", "")
            .unwrap();
    }
}
