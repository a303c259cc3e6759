use super::auth::Session;
use super::store::{DepartmentStore, DocumentStore, StoreError};
use crate::domain::{DakDocument, Department, DocumentInsert, DocumentPatch};
use hyper::client::connect::Connect;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const DOCUMENT_SELECT: &str = "*,departments(name,code)";

/// Error body shape used by PostgREST.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Document and department tables served over a PostgREST-style HTTP API
/// (the `/rest/v1` surface of a hosted Supabase project, or a bare PostgREST).
///
/// Generic over the hyper connector so an HTTPS connector can be plugged in.
pub struct RestStore<C = HttpConnector> {
    client: Client<C>,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestStore<HttpConnector> {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }
}

impl<C> RestStore<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    pub fn with_client(client: Client<C>, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: None,
        }
    }

    /// Send requests on behalf of a signed-in user instead of the anonymous key.
    pub fn with_session(mut self, session: &Session) -> Self {
        self.access_token = Some(session.access_token.clone());
        self
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<String>,
    ) -> Result<T, StoreError> {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        let single = body.is_some();

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(format!("{}/rest/v1/{}", self.base_url, path_and_query))
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json");

        if single {
            builder = builder
                .header("accept", "application/vnd.pgrst.object+json")
                .header("prefer", "return=representation");
        }

        let request = builder.body(body.map(Body::from).unwrap_or_else(Body::empty))?;

        log::debug!("{} /rest/v1/{}", method, path_and_query);
        let response = self.client.request(request).await?;
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await?;

        if !status.is_success() {
            let err = api_error(status, &bytes);
            log::warn!("Store rejected {} {}: {}", method, path_and_query, err);
            return Err(err);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn api_error(status: StatusCode, bytes: &[u8]) -> StoreError {
    match serde_json::from_slice::<ApiErrorBody>(bytes) {
        Ok(body) => StoreError::Api {
            status: status.as_u16(),
            message: body
                .message
                .unwrap_or_else(|| format!("Request failed: HTTP {}", status)),
            code: body.code,
            details: body.details,
            hint: body.hint,
        },
        Err(_) => StoreError::Api {
            status: status.as_u16(),
            message: format!(
                "Request failed: HTTP {} {}",
                status,
                String::from_utf8_lossy(bytes).trim()
            )
            .trim_end()
            .to_string(),
            code: None,
            details: None,
            hint: None,
        },
    }
}

/// Characters left as-is in a filter value: alphanumerics and `-_.~`.
const FILTER_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, FILTER_VALUE).to_string()
}

impl<C> DocumentStore for RestStore<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    async fn list_documents(&self, limit: usize) -> Result<Vec<DakDocument>, StoreError> {
        self.send(
            Method::GET,
            &format!(
                "dak_documents?select={}&order=created_at.desc&limit={}",
                DOCUMENT_SELECT, limit
            ),
            None,
        )
        .await
    }

    async fn insert_document(&self, row: &DocumentInsert) -> Result<DakDocument, StoreError> {
        let body = serde_json::to_string(row)?;
        self.send(
            Method::POST,
            &format!("dak_documents?select={}", DOCUMENT_SELECT),
            Some(body),
        )
        .await
    }

    async fn update_document(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> Result<DakDocument, StoreError> {
        let body = serde_json::to_string(patch)?;
        let result = self
            .send(
                Method::PATCH,
                &format!("dak_documents?id=eq.{}&select={}", encode(id), DOCUMENT_SELECT),
                Some(body),
            )
            .await;

        match result {
            // Single-object responses with zero rows come back as 406.
            Err(StoreError::Api { status: 406, .. }) => Err(StoreError::NotFound),
            other => other,
        }
    }
}

impl<C> DepartmentStore for RestStore<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    async fn list_active_departments(&self) -> Result<Vec<Department>, StoreError> {
        self.send(
            Method::GET,
            "departments?select=*&is_active=eq.true&order=name.asc",
            None,
        )
        .await
    }
}
