//! Subject access reviews against the cluster API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use authz_resolver_sdk::{AccessReviewRequest, AccessReviewStatus, AccessReviewer, ReviewError};
use carrier_http::{ClusterClient, ClusterError};
use serde::{Deserialize, Serialize};

const SUBJECT_ACCESS_REVIEW_PATH: &str = "/apis/authorization.k8s.io/v1/subjectaccessreviews";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubjectAccessReview<'a> {
    api_version: &'static str,
    kind: &'static str,
    spec: ReviewSpec<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewSpec<'a> {
    resource_attributes: ResourceAttributes<'a>,
    user: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    groups: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    uid: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::<String, Vec<String>>::is_empty")]
    extra: &'a BTreeMap<String, Vec<String>>,
}

#[derive(Serialize)]
struct ResourceAttributes<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
    verb: &'static str,
    group: &'a str,
    version: &'a str,
    resource: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Deserialize)]
struct ReviewResponse {
    #[serde(default)]
    status: AccessReviewStatus,
}

/// Asks the cluster's `SubjectAccessReview` API.
#[derive(Debug, Clone)]
pub struct HttpAccessReviewer {
    client: ClusterClient,
}

impl HttpAccessReviewer {
    #[must_use]
    pub fn new(client: ClusterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AccessReviewer for HttpAccessReviewer {
    async fn review(&self, request: &AccessReviewRequest) -> Result<AccessReviewStatus, ReviewError> {
        let body = SubjectAccessReview {
            api_version: "authorization.k8s.io/v1",
            kind: "SubjectAccessReview",
            spec: ReviewSpec {
                resource_attributes: ResourceAttributes {
                    namespace: request.namespace.as_deref(),
                    verb: request.verb.as_str(),
                    group: &request.resource.group,
                    version: &request.resource.version,
                    resource: &request.resource.resource,
                    name: request.name.as_deref(),
                },
                user: &request.user,
                groups: &request.groups,
                uid: &request.uid,
                extra: &request.extra,
            },
        };

        let response: ReviewResponse = self
            .client
            .post_json(SUBJECT_ACCESS_REVIEW_PATH, &body)
            .await
            .map_err(|e| match e {
                ClusterError::Decode(msg) => ReviewError::Malformed(msg),
                other => ReviewError::Transport(other.to_string()),
            })?;
        Ok(response.status)
    }
}
