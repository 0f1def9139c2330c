//! Resilient API client
//!
//! [`ApiClient::call`] is the single choke point for authenticated
//! requests: it attaches the current access token, and on a 401 refreshes
//! the pair (falling back to a full re-authentication if the refresh is
//! rejected) and retries the original request exactly once. The thin
//! per-resource accessors below all route through it.

use bytes::Bytes;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::error::{ApiError, Result};
use super::models::{FileRecord, OrderRecord, OrderStatus, Page};
use super::session::{Credentials, Session};
use super::transport::{ApiRequest, ApiResponse, Transport};

const DEFAULT_RETRY_BUDGET: u32 = 1;

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Session,
    retry_budget: u32,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self {
            transport,
            session: Session::new(credentials),
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }

    pub async fn authenticate(&mut self) -> Result<()> {
        self.session.authenticate(self.transport.as_ref()).await
    }

    /// Issue a request through the refresh-on-401 wrapper.
    ///
    /// A 401 consumes the retry budget: refresh the token pair (any refresh
    /// failure falls back to full re-authentication with the stored
    /// credentials), then reissue the request once with the new token. Any
    /// other error status propagates immediately; so does a 401 on the
    /// retried request.
    pub async fn call(&mut self, request: ApiRequest) -> Result<ApiResponse> {
        let mut response = self.send(request.clone()).await?;

        for _ in 0..self.retry_budget {
            if response.status != StatusCode::UNAUTHORIZED {
                break;
            }
            warn!(path = %request.path, "received 401, refreshing token pair");
            if let Err(err) = self.session.refresh(self.transport.as_ref()).await {
                warn!(error = %err, "refresh failed, falling back to re-authentication");
                self.session.authenticate(self.transport.as_ref()).await?;
            }
            response = self.send(request.clone()).await?;
        }

        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                body: response.text_lossy(),
            });
        }
        Ok(response)
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let request = match self.session.access_token() {
            Some(token) => request.bearer(token),
            None => request,
        };
        Ok(self.transport.execute(request).await?)
    }

    // --- files ---

    /// Direct multipart upload; returns the server-assigned file id.
    pub async fn upload_file(&mut self, file_name: &str, content: Bytes) -> Result<Uuid> {
        #[derive(Deserialize)]
        struct Uploaded {
            id: Uuid,
        }

        let request = ApiRequest::post("data/files/upload").multipart(file_name, content);
        let uploaded: Uploaded = self.call(request).await?.json()?;
        Ok(uploaded.id)
    }

    pub async fn list_files(&mut self, query: &FileQuery) -> Result<Page<FileRecord>> {
        let request = query.apply(ApiRequest::get("data/files"));
        Ok(self.call(request).await?.json()?)
    }

    /// Newest server-side file carrying the given name, if any.
    pub async fn find_newest_file_by_name(&mut self, name: &str) -> Result<Option<FileRecord>> {
        let page = self
            .list_files(&FileQuery {
                file: Some(name.to_string()),
                ..FileQuery::default()
            })
            .await?;
        Ok(page
            .results
            .into_iter()
            .max_by_key(|record| record.created_at))
    }

    pub async fn file_status(&mut self, id: Uuid) -> Result<Option<FileRecord>> {
        let page = self
            .list_files(&FileQuery {
                file: Some(id.to_string()),
                ..FileQuery::default()
            })
            .await?;
        Ok(page.results.into_iter().next())
    }

    // --- orders ---

    /// Submit an order for a validated file; returns the new order id.
    pub async fn submit_order(
        &mut self,
        source_file_id: Uuid,
        model_name: &str,
        tags_ids: &[Uuid],
    ) -> Result<Uuid> {
        #[derive(Deserialize)]
        struct OrderRef {
            id: Uuid,
        }

        // The endpoint answers with either a single order object or a
        // one-element list, depending on the platform version.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Submitted {
            Many(Vec<OrderRef>),
            One(OrderRef),
        }

        let request = ApiRequest::post("exec/orders").json(json!({
            "source_file_id": source_file_id,
            "model_name": model_name,
            "tags_ids": tags_ids,
        }));

        match self.call(request).await?.json()? {
            Submitted::One(order) => Ok(order.id),
            Submitted::Many(orders) => orders
                .into_iter()
                .next()
                .map(|order| order.id)
                .ok_or_else(|| ApiError::Payload("empty order submission response".to_string())),
        }
    }

    pub async fn list_orders(&mut self, query: &OrderQuery) -> Result<Page<OrderRecord>> {
        let request = query.apply(ApiRequest::get("exec/orders"));
        Ok(self.call(request).await?.json()?)
    }

    /// Look an order up by its id (the endpoint also accepts a file id).
    pub async fn find_order(&mut self, order_id: Uuid) -> Result<Option<OrderRecord>> {
        let page = self
            .list_orders(&OrderQuery {
                filter: Some(order_id.to_string()),
                ..OrderQuery::default()
            })
            .await?;
        Ok(page.results.into_iter().next())
    }

    // --- results ---

    /// Fetch one result artifact for a finished order.
    pub async fn download_result(
        &mut self,
        order_id: Uuid,
        result_type: &str,
    ) -> Result<ResultDownload> {
        let request = ApiRequest::get(format!("data/results/{order_id}/download"))
            .query("result_type", result_type);
        let response = self.call(request).await?;
        Ok(ResultDownload {
            content_disposition: response.content_disposition,
            content: response.body,
        })
    }

    // --- account ---

    /// Organization block of the authenticated account.
    pub async fn organization(&mut self) -> Result<serde_json::Value> {
        #[derive(Deserialize)]
        struct Me {
            org: Option<serde_json::Value>,
        }

        let me: Me = self.call(ApiRequest::get("users/me")).await?.json()?;
        me.org
            .ok_or_else(|| ApiError::Payload("account has no organization".to_string()))
    }
}

/// A downloaded result body plus the server's naming hint.
#[derive(Debug, Clone)]
pub struct ResultDownload {
    pub content_disposition: Option<String>,
    pub content: Bytes,
}

/// Filters for the file list endpoint.
#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    pub page: Option<u32>,
    /// File name or file id.
    pub file: Option<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub only_acceptable: Option<bool>,
    pub show_virtual: Option<bool>,
}

impl FileQuery {
    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(page) = self.page {
            request = request.query("page", page);
        }
        if let Some(file) = &self.file {
            request = request.query("file", file);
        }
        if let Some(min_date) = self.min_date {
            request = request.query("min_date", min_date);
        }
        if let Some(max_date) = self.max_date {
            request = request.query("max_date", max_date);
        }
        if let Some(only_acceptable) = self.only_acceptable {
            request = request.query("only_acceptable", only_acceptable);
        }
        if let Some(show_virtual) = self.show_virtual {
            request = request.query("show_virtual", show_virtual);
        }
        request
    }
}

/// Filters for the order list endpoint.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub page: Option<u32>,
    /// Order id, file id, or file name.
    pub filter: Option<String>,
    pub status: Option<OrderStatus>,
    pub model_name: Option<String>,
    pub tags: Vec<Uuid>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl OrderQuery {
    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(page) = self.page {
            request = request.query("page", page);
        }
        if let Some(filter) = &self.filter {
            request = request.query("filter", filter);
        }
        if let Some(status) = self.status {
            request = request.query("status", status);
        }
        if let Some(model_name) = &self.model_name {
            request = request.query("model_name", model_name);
        }
        for tag in &self.tags {
            request = request.query("tags_ids", tag);
        }
        if let Some(min_date) = self.min_date {
            request = request.query("min_date", min_date);
        }
        if let Some(max_date) = self.max_date {
            request = request.query("max_date", max_date);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::TransportError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers requests from a fixed script and records everything sent.
    struct Scripted {
        responses: Mutex<Vec<ApiResponse>>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<ApiResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<ApiRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn execute(
            &self,
            request: ApiRequest,
        ) -> std::result::Result<ApiResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            let mut responses = self.responses.lock().unwrap();
            assert!(!responses.is_empty(), "transport script exhausted");
            Ok(responses.remove(0))
        }
    }

    fn response(status: StatusCode, body: &str) -> ApiResponse {
        ApiResponse {
            status,
            content_disposition: None,
            body: Bytes::from(body.to_string()),
        }
    }

    fn ok(body: &str) -> ApiResponse {
        response(StatusCode::OK, body)
    }

    fn client(transport: Arc<Scripted>) -> ApiClient {
        ApiClient::new(
            transport,
            Credentials {
                username: "user@example.com".to_string(),
                password: "hunter2".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn a_401_triggers_one_refresh_and_one_retry() {
        let transport = Scripted::new(vec![
            ok(r#"{"access":"a1","refresh":"r1"}"#),
            response(StatusCode::UNAUTHORIZED, "{}"),
            ok(r#"{"access":"a2","refresh":"r2"}"#),
            ok(r#"{"count":0,"results":[]}"#),
        ]);
        let mut client = client(transport.clone());
        client.authenticate().await.unwrap();

        let page = client.list_files(&FileQuery::default()).await.unwrap();
        assert_eq!(page.count, 0);

        let seen = transport.seen();
        let paths: Vec<&str> = seen.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["users/auth", "data/files", "users/refresh", "data/files"]
        );
        // The retried request carries the refreshed token.
        assert_eq!(seen[3].bearer.as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn refresh_failure_falls_back_to_full_reauth() {
        let transport = Scripted::new(vec![
            ok(r#"{"access":"a1","refresh":"r1"}"#),
            response(StatusCode::UNAUTHORIZED, "{}"),
            response(StatusCode::BAD_REQUEST, r#"{"detail":"refresh expired"}"#),
            ok(r#"{"access":"a3","refresh":"r3"}"#),
            ok(r#"{"count":0,"results":[]}"#),
        ]);
        let mut client = client(transport.clone());
        client.authenticate().await.unwrap();

        client.list_files(&FileQuery::default()).await.unwrap();

        let paths: Vec<String> = transport.seen().iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                "users/auth",
                "data/files",
                "users/refresh",
                "users/auth",
                "data/files"
            ]
        );
        assert_eq!(transport.seen()[4].bearer.as_deref(), Some("a3"));
    }

    #[tokio::test]
    async fn a_second_401_propagates_instead_of_retrying_again() {
        let transport = Scripted::new(vec![
            ok(r#"{"access":"a1","refresh":"r1"}"#),
            response(StatusCode::UNAUTHORIZED, "{}"),
            ok(r#"{"access":"a2","refresh":"r2"}"#),
            response(StatusCode::UNAUTHORIZED, "{}"),
        ]);
        let mut client = client(transport.clone());
        client.authenticate().await.unwrap();

        let err = client.list_files(&FileQuery::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Http {
                status: StatusCode::UNAUTHORIZED,
                ..
            }
        ));
        // auth, request, refresh, retry; nothing more.
        assert_eq!(transport.seen().len(), 4);
    }

    #[tokio::test]
    async fn non_401_errors_propagate_without_retry() {
        let transport = Scripted::new(vec![
            ok(r#"{"access":"a1","refresh":"r1"}"#),
            response(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        ]);
        let mut client = client(transport.clone());
        client.authenticate().await.unwrap();

        let err = client.list_files(&FileQuery::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                ..
            }
        ));
        assert_eq!(transport.seen().len(), 2);
    }

    #[tokio::test]
    async fn find_newest_picks_the_maximum_created_at() {
        let transport = Scripted::new(vec![ok(r#"{
            "count": 3,
            "results": [
                {"id":"0a6e7e7e-0000-4000-8000-000000000001","name":"cohort.vcf","created_at":"2026-01-10T00:00:00Z"},
                {"id":"0a6e7e7e-0000-4000-8000-000000000003","name":"cohort.vcf","created_at":"2026-03-01T12:30:00Z"},
                {"id":"0a6e7e7e-0000-4000-8000-000000000002","name":"cohort.vcf","created_at":"2026-02-20T08:00:00Z"}
            ]
        }"#)]);
        let mut client = client(transport.clone());

        let newest = client
            .find_newest_file_by_name("cohort.vcf")
            .await
            .unwrap()
            .expect("a match");
        assert_eq!(
            newest.id,
            "0a6e7e7e-0000-4000-8000-000000000003".parse::<Uuid>().unwrap()
        );

        let request = &transport.seen()[0];
        assert_eq!(request.path, "data/files");
        assert_eq!(
            request.query,
            vec![("file".to_string(), "cohort.vcf".to_string())]
        );
    }

    #[tokio::test]
    async fn submit_order_accepts_list_and_object_responses() {
        let file_id: Uuid = "1b2e7e7e-0000-4000-8000-00000000000a".parse().unwrap();

        let transport = Scripted::new(vec![ok(
            r#"[{"id":"2c3e7e7e-0000-4000-8000-00000000000b"}]"#,
        )]);
        let mut api = client(transport.clone());
        let id = api.submit_order(file_id, "skywalker", &[]).await.unwrap();
        assert_eq!(id, "2c3e7e7e-0000-4000-8000-00000000000b".parse::<Uuid>().unwrap());

        let transport = Scripted::new(vec![ok(r#"{"id":"2c3e7e7e-0000-4000-8000-00000000000c"}"#)]);
        let mut api = client(transport.clone());
        let id = api.submit_order(file_id, "skywalker", &[]).await.unwrap();
        assert_eq!(id, "2c3e7e7e-0000-4000-8000-00000000000c".parse::<Uuid>().unwrap());
    }
}
