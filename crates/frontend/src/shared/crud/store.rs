//! Data store adapter: list/create/update/delete against one remote
//! collection.
//!
//! `RestStore` maps the standard `{ success, data?, err: { msg } }`
//! envelope onto the `CrudError` taxonomy. Idempotence and stale-
//! response handling live above this layer: the orchestrator guards
//! every `list` call with a `SequenceGuard`.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use contracts::shared::envelope::{ApiResponse, PagingData};
use contracts::shared::error::CrudError;
use contracts::shared::query::QueryState;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Store futures run on the single UI thread; deliberately not `Send`.
pub type StoreFuture<T> = Pin<Box<dyn Future<Output = Result<T, CrudError>>>>;

/// One fetched page of records.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub items: Vec<Value>,
    pub total: u64,
}

/// Abstraction over a remote collection. Implementations must be
/// idempotent for identical `QueryState` and safe to call while an
/// earlier call is still in flight. The futures they return run on the
/// single UI thread, so only the adapter itself must be shareable.
pub trait DataStore: Send + Sync {
    fn list(&self, query: &QueryState) -> StoreFuture<ListPage>;
    fn create(&self, record: Value) -> StoreFuture<Value>;
    fn update(&self, id: &str, record: Value) -> StoreFuture<Value>;
    fn delete(&self, id: &str) -> StoreFuture<()>;
}

/// REST adapter for one collection endpoint:
/// `GET base?pageNo=…`, `POST base`, `PUT base/{id}`, `DELETE base/{id}`.
#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: String,
    extra_query: BTreeMap<String, String>,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            extra_query: BTreeMap::new(),
        }
    }

    /// Fixed parameters appended to every list request (org id, scope).
    pub fn with_extra_query(
        mut self,
        extra: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.extra_query = extra
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    fn list_url(&self, query: &QueryState) -> String {
        let mut params = query.to_param_map();
        for (key, value) in &self.extra_query {
            params.entry(key.clone()).or_insert_with(|| value.clone());
        }
        match serde_qs::to_string(&params) {
            Ok(qs) if !qs.is_empty() => format!("{}?{}", self.base_url, qs),
            _ => self.base_url.clone(),
        }
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(id))
    }
}

fn transport(err: gloo_net::Error) -> CrudError {
    CrudError::Transport(err.to_string())
}

/// Decode an envelope response, mapping HTTP status onto the taxonomy
/// first: 404 is a vanished target, other non-2xx bodies are still
/// tried as envelopes (server-side validation answers 4xx with one)
/// before degrading to a transport error.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<ApiResponse<T>, CrudError> {
    let status = response.status();
    if status == 404 {
        return Err(CrudError::NotFound);
    }
    match response.json::<ApiResponse<T>>().await {
        Ok(envelope) => Ok(envelope),
        Err(_) if !(200..300).contains(&status) => {
            Err(CrudError::Transport(format!("HTTP {status}")))
        }
        Err(err) => Err(transport(err)),
    }
}

impl DataStore for RestStore {
    fn list(&self, query: &QueryState) -> StoreFuture<ListPage> {
        let url = self.list_url(query);
        Box::pin(async move {
            let response = Request::get(&url).send().await.map_err(transport)?;
            let page: PagingData = decode(response).await?.into_result()?;
            Ok(ListPage {
                items: page.list,
                total: page.total,
            })
        })
    }

    fn create(&self, record: Value) -> StoreFuture<Value> {
        let url = self.base_url.clone();
        Box::pin(async move {
            let response = Request::post(&url)
                .json(&record)
                .map_err(transport)?
                .send()
                .await
                .map_err(transport)?;
            decode::<Value>(response).await?.into_result()
        })
    }

    fn update(&self, id: &str, record: Value) -> StoreFuture<Value> {
        let url = self.item_url(id);
        Box::pin(async move {
            let response = Request::put(&url)
                .json(&record)
                .map_err(transport)?
                .send()
                .await
                .map_err(transport)?;
            decode::<Value>(response).await?.into_result()
        })
    }

    fn delete(&self, id: &str) -> StoreFuture<()> {
        let url = self.item_url(id);
        Box::pin(async move {
            let response = Request::delete(&url).send().await.map_err(transport)?;
            decode::<Value>(response).await?.into_unit_result()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::query::FilterValue;

    #[test]
    fn test_list_url_carries_pagination_filters_and_extra_query() {
        let store = RestStore::new("/api/certificates")
            .with_extra_query([("orgId", "12")]);
        let mut query = QueryState::default();
        query.apply_filter("q", Some(FilterValue::Text("ios".into())));
        let url = store.list_url(&query);
        assert!(url.starts_with("/api/certificates?"));
        assert!(url.contains("pageNo=1"));
        assert!(url.contains("pageSize=15"));
        assert!(url.contains("q=ios"));
        assert!(url.contains("orgId=12"));
    }

    #[test]
    fn test_item_url_escapes_id() {
        let store = RestStore::new("/api/releases");
        assert_eq!(store.item_url("a b"), "/api/releases/a%20b");
    }
}
