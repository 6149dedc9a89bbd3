use std::{collections::HashMap, fmt::Debug, sync::Arc};

use axum::http::HeaderMap;
use tracing::warn;

/// Prefix of the user guid generated for invited users before they sign in through Siteminder.
pub(crate) const PLACEHOLDER_USER_GUID_PREFIX: &str = "esm-";

struct IdentityField {
    header: &'static str,
    path_param: &'static str,
    query_param: &'static str,
}

const USER_GUID: IdentityField =
    IdentityField { header: "smgov_userguid", path_param: "userguid", query_param: "smgov_userguid" };
const USER_TYPE: IdentityField =
    IdentityField { header: "smgov_usertype", path_param: "usertype", query_param: "smgov_usertype" };
const UNIVERSAL_ID: IdentityField =
    IdentityField { header: "sm_universalid", path_param: "sm_universalid", query_param: "sm_universalid" };

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SiteminderAssertion {
    pub user_guid: String,
    pub user_type: Option<String>,
    pub universal_id: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct RequestMetadata {
    headers: HeaderMap,
    path_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
}

impl RequestMetadata {
    pub fn new(
        headers: HeaderMap,
        path_params: HashMap<String, String>,
        query_params: HashMap<String, String>,
    ) -> Self {
        Self { headers, path_params, query_params }
    }

    fn header(&self, field: &IdentityField) -> Option<String> {
        self.headers.get(field.header).and_then(|value| value.to_str().ok()).and_then(non_empty)
    }

    fn parameter(&self, field: &IdentityField) -> Option<String> {
        self.path_params
            .get(field.path_param)
            .and_then(|value| non_empty(value))
            .or_else(|| self.query_params.get(field.query_param).and_then(|value| non_empty(value)))
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

pub(crate) trait AssertionExtractor: Send + Sync + Debug {
    fn extract(&self, metadata: &RequestMetadata) -> Result<SiteminderAssertion>;
}

/// Reads the identity only from the headers injected by the Siteminder agent.
#[derive(Debug, Clone, Default)]
pub(crate) struct HeaderAssertionExtractor;

impl AssertionExtractor for HeaderAssertionExtractor {
    fn extract(&self, metadata: &RequestMetadata) -> Result<SiteminderAssertion> {
        Ok(SiteminderAssertion {
            user_guid: metadata.header(&USER_GUID).ok_or(Error::MissingIdentity)?,
            user_type: metadata.header(&USER_TYPE),
            universal_id: metadata.header(&UNIVERSAL_ID),
        })
    }
}

/// Falls back to path then query parameters for every field the headers lack.
///
/// The parameters are supplied by the caller, not by Siteminder, so this must stay limited to
/// test and staging deployments.
#[derive(Debug, Clone, Default)]
pub(crate) struct OverridableAssertionExtractor;

impl AssertionExtractor for OverridableAssertionExtractor {
    fn extract(&self, metadata: &RequestMetadata) -> Result<SiteminderAssertion> {
        let resolve = |field: &IdentityField| {
            metadata.header(field).or_else(|| {
                let value = metadata.parameter(field);
                if value.is_some() {
                    warn!(field = field.header, "siteminder field overridden by request parameter");
                }
                value
            })
        };

        Ok(SiteminderAssertion {
            user_guid: resolve(&USER_GUID).ok_or(Error::MissingIdentity)?,
            user_type: resolve(&USER_TYPE),
            universal_id: resolve(&UNIVERSAL_ID),
        })
    }
}

pub(crate) fn assertion_extractor(allow_override: bool) -> Arc<dyn AssertionExtractor> {
    if allow_override {
        warn!("siteminder override is enabled, identity may be taken from request parameters");
        Arc::new(OverridableAssertionExtractor)
    } else {
        Arc::new(HeaderAssertionExtractor)
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error("could not find user information from siteminder")]
    MissingIdentity,
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
