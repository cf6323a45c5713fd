//! Firestore REST document store.

use reqwest::{Client, Url};
use serde_json::{Map, Value, json};
use tokio::sync::watch;
use tracing::debug;

use super::store::{Document, DocumentStore};
use crate::auth::AuthState;
use crate::{Error, Result};

/// Default Firestore REST endpoint.
pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

/// Document store writing to Cloud Firestore over its REST API.
///
/// Set-with-merge maps to a `PATCH` whose update mask lists exactly the
/// fields being written, so fields outside the mask are left untouched.
/// Requests carry the signed-in user's ID token.
pub struct FirestoreStore {
    client: Client,
    endpoint: String,
    project_id: String,
    auth: watch::Receiver<AuthState>,
}

impl FirestoreStore {
    /// Create a store for the given project using the session's auth state.
    #[must_use]
    pub fn new(project_id: impl Into<String>, auth: watch::Receiver<AuthState>) -> Self {
        Self {
            client: Client::new(),
            endpoint: FIRESTORE_ENDPOINT.to_string(),
            project_id: project_id.into(),
            auth,
        }
    }

    /// Override the REST endpoint, e.g. for the local emulator.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// URL of a document, with the update mask for `fields`.
    fn document_url(&self, collection: &str, key: &str, fields: &Document) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| Error::Config(format!("invalid Firestore endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| Error::Config("Firestore endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                collection,
                key,
            ]);
        {
            let mut query = url.query_pairs_mut();
            for name in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(name));
            }
        }
        Ok(url)
    }
}

impl DocumentStore for FirestoreStore {
    async fn set_merge(&self, collection: &str, key: &str, fields: &Document) -> Result<()> {
        let token = self
            .auth
            .borrow()
            .id_token()
            .map(str::to_string)
            .ok_or_else(|| Error::Auth("not signed in".to_string()))?;

        let url = self.document_url(collection, key, fields)?;
        let body = json!({ "fields": encode_fields(fields) });

        let response = self
            .client
            .patch(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("{status}: {text}")));
        }

        debug!(collection, key, "Merged document into Firestore");
        Ok(())
    }
}

/// Quote a field name for an update mask when it is not a simple identifier.
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

/// Encode a document body as Firestore typed values.
#[must_use]
pub fn encode_fields(fields: &Document) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::MessageRecord;

    #[test]
    fn encodes_record_fields() {
        let mut record = MessageRecord::new("5").with_address("555");
        record.date = 1_700_000_000_000;
        let encoded = encode_fields(&record.to_document().unwrap());

        assert_eq!(encoded["id"], json!({ "stringValue": "5" }));
        assert_eq!(encoded["address"], json!({ "stringValue": "555" }));
        assert_eq!(encoded["body"], json!({ "nullValue": null }));
        assert_eq!(encoded["read"], json!({ "integerValue": "0" }));
        assert_eq!(
            encoded["date"],
            json!({ "integerValue": "1700000000000" })
        );
    }

    #[test]
    fn encodes_nested_values() {
        let value = json!({ "a": [true, 1.5], "b": { "c": "d" } });
        let Value::Object(map) = value else {
            unreachable!()
        };
        let encoded = encode_fields(&map);
        assert_eq!(
            encoded["a"],
            json!({ "arrayValue": { "values": [{ "booleanValue": true }, { "doubleValue": 1.5 }] } })
        );
        assert_eq!(
            encoded["b"],
            json!({ "mapValue": { "fields": { "c": { "stringValue": "d" } } } })
        );
    }

    #[test]
    fn field_paths_are_quoted_when_needed() {
        assert_eq!(field_path("dateSent"), "dateSent");
        assert_eq!(field_path("_id"), "_id");
        assert_eq!(field_path("my-field"), "`my-field`");
        assert_eq!(field_path("9lives"), "`9lives`");
    }

    #[test]
    fn document_url_contains_path_and_mask() {
        let (_tx, rx) = watch::channel(AuthState::Unauthenticated);
        let store = FirestoreStore::new("demo-project", rx);
        let fields = MessageRecord::new("12").to_document().unwrap();
        let url = store.document_url("messages", "12", &fields).unwrap();

        assert_eq!(
            url.path(),
            "/v1/projects/demo-project/databases/(default)/documents/messages/12"
        );
        let masks: Vec<_> = url
            .query_pairs()
            .filter(|(k, _)| k == "updateMask.fieldPaths")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(masks.len(), fields.len());
        assert!(masks.contains(&"dateSent".to_string()));
    }

    #[tokio::test]
    async fn refuses_to_write_without_session() {
        let (_tx, rx) = watch::channel(AuthState::Unauthenticated);
        let store = FirestoreStore::new("demo-project", rx);
        let fields = MessageRecord::new("1").to_document().unwrap();
        let err = store.set_merge("messages", "1", &fields).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
