use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "test-anon-key";
pub const ACCESS_TOKEN: &str = "test-access-token";
pub const EMAIL: &str = "clerk@example.org";
pub const PASSWORD: &str = "correct-horse";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub prefer: Option<String>,
    pub accept: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct Tables {
    documents: Vec<Value>,
    departments: Vec<Value>,
    failure: Option<(u16, String)>,
}

/// In-memory stand-in for a hosted backend: a `/rest/v1` table API and an
/// `/auth/v1/token` password grant.
#[derive(Clone)]
pub struct MockBackend {
    tables: Arc<Mutex<Tables>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn start(&self) -> String {
        let backend = self.clone();

        let make_svc = make_service_fn(move |_conn| {
            let backend = backend.clone();

            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let backend = backend.clone();
                    async move { backend.handle(req).await }
                }))
            }
        });

        // Bind to random port
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let server = Server::bind(&addr).serve(make_svc);
        let actual_addr = server.local_addr();

        tokio::spawn(async move {
            if let Err(e) = server.await {
                eprintln!("Mock server error: {}", e);
            }
        });

        format!("http://{}", actual_addr)
    }

    pub fn add_department(&self, id: &str, name: &str, code: &str, active: bool) {
        let now = chrono::Utc::now().to_rfc3339();
        self.tables.lock().unwrap().departments.push(json!({
            "id": id,
            "name": name,
            "code": code,
            "head_name": null,
            "head_email": null,
            "branch": "main",
            "is_active": active,
            "created_at": now,
            "updated_at": now,
        }));
    }

    /// Answer every table request with this status and body until cleared.
    pub fn fail_with(&self, status: u16, body: &str) {
        self.tables.lock().unwrap().failure = Some((status, body.to_string()));
    }

    pub fn recover(&self) {
        self.tables.lock().unwrap().failure = None;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn document_count(&self) -> usize {
        self.tables.lock().unwrap().documents.len()
    }

    async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, Infallible> {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let mut recorded = RecordedRequest {
            method: req.method().clone(),
            uri: req.uri().to_string(),
            apikey: header("apikey"),
            authorization: header("authorization"),
            prefer: header("prefer"),
            accept: header("accept"),
            body: String::new(),
        };
        let path = req.uri().path().to_string();
        let query = req.uri().query().unwrap_or("").to_string();

        let body_bytes = hyper::body::to_bytes(req.into_body())
            .await
            .unwrap_or_default();
        recorded.body = String::from_utf8_lossy(&body_bytes).to_string();
        let method = recorded.method.clone();
        let body = recorded.body.clone();
        self.requests.lock().unwrap().push(recorded);

        if path == "/auth/v1/token" {
            return Ok(self.sign_in(&body));
        }

        if let Some((status, body)) = self.tables.lock().unwrap().failure.clone() {
            return Ok(respond(status, body));
        }

        let response = match (method, path.as_str()) {
            (Method::GET, "/rest/v1/departments") => self.list_departments(),
            (Method::GET, "/rest/v1/dak_documents") => self.list_documents(&query),
            (Method::POST, "/rest/v1/dak_documents") => self.insert_document(&body),
            (Method::PATCH, "/rest/v1/dak_documents") => self.update_document(&query, &body),
            _ => respond(404, "Not Found".to_string()),
        };
        Ok(response)
    }

    fn sign_in(&self, body: &str) -> Response<Body> {
        let creds: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        if creds["email"] == EMAIL && creds["password"] == PASSWORD {
            respond(
                200,
                json!({
                    "access_token": ACCESS_TOKEN,
                    "token_type": "bearer",
                    "expires_in": 3600,
                    "refresh_token": "refresh",
                    "user": { "id": "user-1", "email": EMAIL, "role": "authenticated" }
                })
                .to_string(),
            )
        } else {
            respond(
                400,
                json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid login credentials"
                })
                .to_string(),
            )
        }
    }

    fn list_departments(&self) -> Response<Body> {
        let tables = self.tables.lock().unwrap();
        let mut active: Vec<Value> = tables
            .departments
            .iter()
            .filter(|d| d["is_active"] == true)
            .cloned()
            .collect();
        active.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
        respond(200, Value::Array(active).to_string())
    }

    fn list_documents(&self, query: &str) -> Response<Body> {
        let limit = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("limit="))
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(usize::MAX);

        let tables = self.tables.lock().unwrap();
        let newest_first: Vec<Value> = tables.documents.iter().rev().take(limit).cloned().collect();
        respond(200, Value::Array(newest_first).to_string())
    }

    fn insert_document(&self, body: &str) -> Response<Body> {
        let mut row: Value = match serde_json::from_str(body) {
            Ok(row) => row,
            Err(e) => return respond(400, json!({ "message": e.to_string() }).to_string()),
        };

        let mut tables = self.tables.lock().unwrap();
        let serial = tables.documents.len() + 1;
        let prefix = if row["type"] == "outward" { "OUT" } else { "IN" };
        let now = chrono::Utc::now().to_rfc3339();

        row["id"] = json!(format!("doc-{}", serial));
        row["dak_number"] = json!(format!("DAK/{}/{:04}", prefix, serial));
        row["created_at"] = json!(now);
        row["updated_at"] = json!(now);
        let embed = department_embed(&tables.departments, &row["department_id"]);
        row["departments"] = embed;

        tables.documents.push(row.clone());
        respond(201, row.to_string())
    }

    fn update_document(&self, query: &str, body: &str) -> Response<Body> {
        let id = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("id=eq."))
            .unwrap_or("")
            .to_string();
        let patch: Value = serde_json::from_str(body).unwrap_or(Value::Null);

        let mut tables = self.tables.lock().unwrap();
        let departments = tables.departments.clone();
        let Some(row) = tables.documents.iter_mut().find(|d| d["id"] == id.as_str()) else {
            return respond(
                406,
                json!({
                    "code": "PGRST116",
                    "message": "JSON object requested, multiple (or no) rows returned",
                    "details": "The result contains 0 rows",
                    "hint": null
                })
                .to_string(),
            );
        };

        if let Some(fields) = patch.as_object() {
            for (key, value) in fields {
                row[key.as_str()] = value.clone();
            }
        }
        row["updated_at"] = json!(chrono::Utc::now().to_rfc3339());
        let embed = department_embed(&departments, &row["department_id"]);
        row["departments"] = embed;

        respond(200, row.to_string())
    }
}

fn department_embed(departments: &[Value], department_id: &Value) -> Value {
    departments
        .iter()
        .find(|d| &d["id"] == department_id)
        .map(|d| json!({ "name": d["name"], "code": d["code"] }))
        .unwrap_or(Value::Null)
}

fn respond(status: u16, body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockBackend::new();
        let url = server.start().await;

        assert!(url.starts_with("http://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_mock_server_unknown_path_is_404() {
        let server = MockBackend::new();
        let url = server.start().await;

        let client = hyper::Client::new();
        let response = client
            .get(format!("{}/nowhere", url).parse().unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(server.requests().len(), 1);
    }
}
