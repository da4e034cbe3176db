//! HTTP client for the Ory Keto read and write APIs.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::RelationTupleClient;
use crate::config::KetoConfig;
use crate::error::{AuthzError, Result};
use crate::models::{RelationTuple, Subject};

#[derive(Debug, Serialize)]
struct CheckRequest<'a> {
    namespace: &'a str,
    object: &'a str,
    relation: &'a str,
    subject: SubjectId<'a>,
}

#[derive(Debug, Serialize)]
struct SubjectId<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    allowed: bool,
}

#[derive(Debug, Serialize)]
struct SubjectSetBody<'a> {
    namespace: &'a str,
    object: &'a str,
    relation: &'a str,
}

#[derive(Debug, Serialize)]
struct RelationTupleBody<'a> {
    namespace: &'a str,
    object: &'a str,
    relation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_set: Option<SubjectSetBody<'a>>,
}

impl<'a> From<&'a RelationTuple> for RelationTupleBody<'a> {
    fn from(tuple: &'a RelationTuple) -> Self {
        let (subject_id, subject_set) = match &tuple.subject {
            Subject::Id(id) => (Some(id.as_str()), None),
            Subject::Set(set) => (
                None,
                Some(SubjectSetBody {
                    namespace: &set.namespace,
                    object: &set.object,
                    relation: &set.relation,
                }),
            ),
        };
        Self {
            namespace: &tuple.namespace,
            object: &tuple.object,
            relation: &tuple.relation,
            subject_id,
            subject_set,
        }
    }
}

fn delete_query(tuple: &RelationTuple) -> Vec<(&'static str, &str)> {
    let mut query = vec![
        ("namespace", tuple.namespace.as_str()),
        ("object", tuple.object.as_str()),
        ("relation", tuple.relation.as_str()),
    ];
    match &tuple.subject {
        Subject::Id(id) => query.push(("subject_id", id.as_str())),
        Subject::Set(set) => {
            query.push(("subject_set.namespace", set.namespace.as_str()));
            query.push(("subject_set.object", set.object.as_str()));
            query.push(("subject_set.relation", set.relation.as_str()));
        }
    }
    query
}

fn endpoint(base: &Url, suffix: &str) -> Url {
    let mut url = base.clone();
    let path = format!("{}/{suffix}", base.path().trim_end_matches('/'));
    url.set_path(&path);
    url
}

/// Keto client over `reqwest`. Cheap to clone; holds only immutable settings.
#[derive(Debug, Clone)]
pub struct KetoClient {
    http: reqwest::Client,
    read_endpoint: Url,
    write_endpoint: Option<Url>,
}

impl KetoClient {
    /// # Errors
    ///
    /// Returns [`AuthzError::Configuration`] for invalid remotes or when the
    /// HTTP client cannot be built.
    pub fn new(config: &KetoConfig) -> Result<Self> {
        let read_endpoint = config.read_endpoint()?;
        let write_endpoint = config.write_endpoint()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuthzError::Configuration(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            read_endpoint,
            write_endpoint,
        })
    }

    pub fn has_write_endpoint(&self) -> bool {
        self.write_endpoint.is_some()
    }

    fn write_url(&self) -> Result<Url> {
        self.write_endpoint
            .as_ref()
            .map(|base| endpoint(base, "relation-tuples"))
            .ok_or_else(|| AuthzError::Configuration("keto write endpoint not configured".to_string()))
    }
}

#[async_trait]
impl RelationTupleClient for KetoClient {
    async fn check(
        &self,
        namespace: &str,
        object: &str,
        relation: &str,
        subject_id: &str,
    ) -> Result<bool> {
        let body = CheckRequest {
            namespace,
            object,
            relation,
            subject: SubjectId { id: subject_id },
        };

        let response = self
            .http
            .post(endpoint(&self.read_endpoint, "relation-tuples/check"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            warn!(namespace, object, relation, status = status.as_u16(), "keto check failed");
            return Err(AuthzError::EngineStatus {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::NOT_FOUND {
            debug!(namespace, object, relation, "keto check found no tuple");
            return Ok(false);
        }
        if status != StatusCode::OK {
            warn!(namespace, object, relation, status = status.as_u16(), "unexpected keto check status");
            return Err(AuthzError::EngineStatus {
                status: status.as_u16(),
            });
        }

        let decoded: CheckResponse = response
            .json()
            .await
            .map_err(|e| AuthzError::Decode(e.to_string()))?;
        Ok(decoded.allowed)
    }

    async fn upsert_relation(&self, tuple: &RelationTuple) -> Result<()> {
        let url = self.write_url()?;
        let response = self
            .http
            .put(url)
            .json(&RelationTupleBody::from(tuple))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            warn!(tuple = %tuple, status = status.as_u16(), "keto write rejected");
            return Err(AuthzError::EngineStatus {
                status: status.as_u16(),
            });
        }

        debug!(tuple = %tuple, "relation tuple written");
        Ok(())
    }

    async fn delete_relation(&self, tuple: &RelationTuple) -> Result<()> {
        let url = self.write_url()?;
        let response = self
            .http
            .delete(url)
            .query(&delete_query(tuple))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(tuple = %tuple, "relation tuple already absent");
            return Ok(());
        }
        if status.is_client_error() || status.is_server_error() {
            warn!(tuple = %tuple, status = status.as_u16(), "keto delete rejected");
            return Err(AuthzError::EngineStatus {
                status: status.as_u16(),
            });
        }

        debug!(tuple = %tuple, "relation tuple deleted");
        Ok(())
    }
}
