//! Pairwise subject type validation and sector identifier derivation
//!
//! Pairwise subjects give every sector a different `sub` value; the sector is
//! identified by a hostname. Two configurations exist:
//!
//! - without `sector_identifier_uri`: all redirect URIs must be https and
//!   share a single host, which becomes the sector identifier;
//! - with `sector_identifier_uri`: the URI must be absolute https, its JSON
//!   document (an array of redirect URIs) must list only https URIs that are
//!   a subset of the registered redirect URIs, and the URI's own host becomes
//!   the sector identifier.
//!
//! This is the pipeline's only validator with a derived output, and the only
//! one performing network I/O — its position after the cheap syntactic
//! checks means an obviously bad request never triggers the fetch.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::RegistrationError;
use crate::fetch::MetadataFetcher;
use crate::registration::{Checked, RegistrationValidator};
use crate::types::{ClientRegistrationRequest, SubjectType};
use crate::uri;

/// Validates pairwise subject configuration and derives the sector
/// identifier.
pub struct SubjectTypeValidator {
    fetcher: Arc<dyn MetadataFetcher>,
}

impl SubjectTypeValidator {
    /// Validator fetching sector identifier documents through `fetcher`.
    pub fn new(fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self { fetcher }
    }

    fn sector_from_redirect_uris(
        request: &ClientRegistrationRequest,
    ) -> Result<String, RegistrationError> {
        let mut hosts = BTreeSet::new();
        for raw in &request.redirect_uris {
            let Some(url) = uri::parse_absolute(raw) else {
                return Err(RegistrationError::invalid_redirect_uri(format!(
                    "redirect_uri '{raw}' must be an absolute URI"
                )));
            };
            if !uri::is_https(&url) {
                return Err(RegistrationError::invalid_redirect_uri(format!(
                    "pairwise subject type requires https redirect URIs, got '{raw}'"
                )));
            }
            let Some(host) = url.host_str() else {
                return Err(RegistrationError::invalid_redirect_uri(format!(
                    "redirect_uri '{raw}' has no host"
                )));
            };
            hosts.insert(host.to_string());
        }

        let mut hosts = hosts.into_iter();
        match (hosts.next(), hosts.next()) {
            (Some(host), None) => Ok(host),
            _ => Err(RegistrationError::invalid_redirect_uri(
                "pairwise subject type without a sector_identifier_uri requires redirect URIs \
                 sharing a single host, but they use different hosts",
            )),
        }
    }

    async fn sector_from_document(
        &self,
        request: &ClientRegistrationRequest,
        raw: &str,
    ) -> Result<String, RegistrationError> {
        let url = uri::parse_absolute(raw).filter(uri::is_https).ok_or_else(|| {
            RegistrationError::invalid_client_metadata(format!(
                "sector_identifier_uri '{raw}' must be an absolute https URI"
            ))
        })?;

        let document = self.fetcher.fetch_json(&url).await.map_err(|e| {
            debug!(url = %url, error = %e, "Sector identifier document fetch failed");
            RegistrationError::invalid_client_metadata(format!(
                "failed to fetch the sector identifier document from '{raw}': {e}"
            ))
        })?;

        let uris: Vec<String> = serde_json::from_value(document).map_err(|_| {
            RegistrationError::invalid_client_metadata(format!(
                "the sector identifier document at '{raw}' must be a JSON array of redirect URIs"
            ))
        })?;

        for sector_uri in &uris {
            let valid = uri::parse_absolute(sector_uri).is_some_and(|url| uri::is_https(&url));
            if !valid {
                return Err(RegistrationError::invalid_client_metadata(format!(
                    "the sector identifier document lists '{sector_uri}', which is not an \
                     absolute https URI"
                )));
            }
            if !request.redirect_uris.contains(sector_uri) {
                return Err(RegistrationError::invalid_client_metadata(format!(
                    "the sector identifier document lists '{sector_uri}', which is not among \
                     the registered redirect URIs"
                )));
            }
        }

        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| {
                RegistrationError::invalid_client_metadata(format!(
                    "sector_identifier_uri '{raw}' has no host"
                ))
            })
    }
}

#[async_trait]
impl RegistrationValidator for SubjectTypeValidator {
    fn name(&self) -> &'static str {
        "subject_type"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        if request.subject_type != SubjectType::Pairwise {
            return Checked::ok();
        }

        let sector = match &request.sector_identifier_uri {
            None => Self::sector_from_redirect_uris(request)?,
            Some(raw) => self.sector_from_document(request, raw).await?,
        };

        debug!(sector = %sector, "Derived pairwise sector identifier");
        Ok(Checked::with_sector_identifier(sector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistrationErrorCode;
    use crate::fetch::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    struct FixedFetcher {
        document: Result<serde_json::Value, FetchError>,
        calls: AtomicUsize,
    }

    impl FixedFetcher {
        fn returning(document: serde_json::Value) -> Self {
            Self {
                document: Ok(document),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                document: Err(FetchError::Network("connection refused".into())),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MetadataFetcher for FixedFetcher {
        async fn fetch_json(&self, _url: &Url) -> Result<serde_json::Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.document.clone()
        }
    }

    fn pairwise_request(redirect_uris: &[&str]) -> ClientRegistrationRequest {
        ClientRegistrationRequest {
            redirect_uris: redirect_uris.iter().map(|s| (*s).to_string()).collect(),
            subject_type: SubjectType::Pairwise,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn public_subject_type_is_a_noop() {
        let fetcher = Arc::new(FixedFetcher::failing());
        let validator = SubjectTypeValidator::new(fetcher.clone());

        let mut request = pairwise_request(&["http://even-invalid"]);
        request.subject_type = SubjectType::Public;

        let checked = validator.check(&request).await.unwrap();
        assert!(checked.sector_identifier.is_none());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_host_becomes_sector_identifier() {
        let validator = SubjectTypeValidator::new(Arc::new(FixedFetcher::failing()));
        let request = pairwise_request(&[
            "https://app.example.com/cb",
            "https://app.example.com/cb2",
        ]);

        let checked = validator.check(&request).await.unwrap();
        assert_eq!(checked.sector_identifier.as_deref(), Some("app.example.com"));
    }

    #[tokio::test]
    async fn different_hosts_rejected_without_sector_uri() {
        let validator = SubjectTypeValidator::new(Arc::new(FixedFetcher::failing()));
        let request = pairwise_request(&[
            "https://one.example.com/cb",
            "https://two.example.com/cb",
        ]);

        let error = validator.check(&request).await.unwrap_err();
        assert_eq!(error.code, RegistrationErrorCode::InvalidRedirectUri);
        assert!(error.description.contains("different hosts"));
    }

    #[tokio::test]
    async fn http_redirect_uri_rejected_for_pairwise() {
        let validator = SubjectTypeValidator::new(Arc::new(FixedFetcher::failing()));
        let request = pairwise_request(&["http://app.example.com/cb"]);

        let error = validator.check(&request).await.unwrap_err();
        assert_eq!(error.code, RegistrationErrorCode::InvalidRedirectUri);
    }

    #[tokio::test]
    async fn sector_document_must_be_subset_of_redirect_uris() {
        let fetcher = Arc::new(FixedFetcher::returning(serde_json::json!([
            "https://app.example.com/cb",
            "https://rogue.example.com/cb"
        ])));
        let validator = SubjectTypeValidator::new(fetcher);

        let mut request = pairwise_request(&["https://app.example.com/cb"]);
        request.sector_identifier_uri =
            Some("https://sector.example.com/redirects.json".to_string());

        let error = validator.check(&request).await.unwrap_err();
        assert!(error.description.contains("rogue.example.com"));
    }

    #[tokio::test]
    async fn sector_document_host_becomes_identifier() {
        let fetcher = Arc::new(FixedFetcher::returning(serde_json::json!([
            "https://app.example.com/cb"
        ])));
        let validator = SubjectTypeValidator::new(fetcher);

        let mut request = pairwise_request(&[
            "https://app.example.com/cb",
            "https://other.example.net/cb",
        ]);
        request.sector_identifier_uri =
            Some("https://sector.example.com/redirects.json".to_string());

        let checked = validator.check(&request).await.unwrap();
        assert_eq!(
            checked.sector_identifier.as_deref(),
            Some("sector.example.com")
        );
    }

    #[tokio::test]
    async fn sector_uri_must_be_https() {
        let validator = SubjectTypeValidator::new(Arc::new(FixedFetcher::failing()));
        let mut request = pairwise_request(&["https://app.example.com/cb"]);
        request.sector_identifier_uri = Some("http://sector.example.com/r.json".to_string());

        let error = validator.check(&request).await.unwrap_err();
        assert_eq!(error.code, RegistrationErrorCode::InvalidClientMetadata);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported() {
        let validator = SubjectTypeValidator::new(Arc::new(FixedFetcher::failing()));
        let mut request = pairwise_request(&["https://app.example.com/cb"]);
        request.sector_identifier_uri = Some("https://sector.example.com/r.json".to_string());

        let error = validator.check(&request).await.unwrap_err();
        assert!(error.description.contains("failed to fetch"));
    }
}
