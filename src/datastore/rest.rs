//! Client for the hosted, PostgREST-compatible data service.
//!
//! Every call carries the public API key both as `apikey` and as a bearer
//! token. Writes ask for `return=representation` so that an update or delete
//! that matched no row can be told apart from one that succeeded.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{
    AdminCredential, ContactSubmission, DataError, DataResult, DataService, DeveloperProfile,
    DeveloperRecord,
};

const ADMIN_USERS: &str = "admin_users";
const DEVELOPERS: &str = "developers";
const CONTACTS: &str = "contacts";

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: Option<String>,
    details: Option<String>,
}

pub struct RestDataService {
    rest_url: String,
    api_key: String,
    client: Client,
}

impl RestDataService {
    /// `url` is the project endpoint (e.g. `https://abc.supabase.co`); the
    /// REST root is derived from it.
    pub fn new(url: &str, api_key: &str) -> anyhow::Result<Self> {
        let base = reqwest::Url::parse(url.trim())?;
        let rest_url = format!("{}/rest/v1", base.as_str().trim_end_matches('/'));

        Ok(Self {
            rest_url,
            api_key: api_key.trim().to_string(),
            client: Client::new(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    /// Send and decode a JSON array response.
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> DataResult<Vec<T>> {
        let response = check_status(builder.send().await?).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: Response) -> DataResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ServiceErrorBody>(&body) {
        Ok(parsed) => parsed.message.or(parsed.details).unwrap_or_default(),
        Err(_) => body,
    };

    tracing::debug!(status = %status, message = %message, "Data service returned an error");
    Err(DataError::Service {
        status: status.as_u16(),
        message,
    })
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl DataService for RestDataService {
    async fn find_active_admin(&self, email: &str) -> DataResult<Option<AdminCredential>> {
        let builder = self.request(Method::GET, ADMIN_USERS).query(&[
            ("select", "*".to_string()),
            ("email", eq(email)),
            ("is_active", eq("true")),
            ("limit", "1".to_string()),
        ]);

        let rows: Vec<AdminCredential> = self.fetch(builder).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_developers(&self) -> DataResult<Vec<DeveloperProfile>> {
        let builder = self
            .request(Method::GET, DEVELOPERS)
            .query(&[("select", "*"), ("order", "created_at.desc")]);

        self.fetch(builder).await
    }

    async fn insert_developer(&self, record: &DeveloperRecord) -> DataResult<DeveloperProfile> {
        let builder = self
            .request(Method::POST, DEVELOPERS)
            .header("Prefer", "return=representation")
            .json(&[record]);

        let rows: Vec<DeveloperProfile> = self.fetch(builder).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DataError::Missing("Insert returned no row".to_string()))
    }

    async fn update_developer(
        &self,
        id: &str,
        record: &DeveloperRecord,
    ) -> DataResult<DeveloperProfile> {
        let builder = self
            .request(Method::PATCH, DEVELOPERS)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(record);

        let rows: Vec<DeveloperProfile> = self.fetch(builder).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DataError::Missing("Developer not found".to_string()))
    }

    async fn delete_developer(&self, id: &str) -> DataResult<()> {
        let builder = self
            .request(Method::DELETE, DEVELOPERS)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation");

        let rows: Vec<serde_json::Value> = self.fetch(builder).await?;
        if rows.is_empty() {
            return Err(DataError::Missing("Developer not found".to_string()));
        }
        Ok(())
    }

    async fn insert_contact(&self, submission: &ContactSubmission) -> DataResult<()> {
        let response = self
            .request(Method::POST, CONTACTS)
            .header("Prefer", "return=minimal")
            .json(&[submission])
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::RawQuery,
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("apikey").and_then(|v| v.to_str().ok()) == Some("anon-key")
            && headers.get("authorization").and_then(|v| v.to_str().ok())
                == Some("Bearer anon-key")
    }

    fn developer_row(id: &str, name: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "full_name": name,
            "skills": ["Rust"],
            "availability_status": "available",
            "experience_years": 3,
            "hourly_rate": 30,
            "projects_completed": 12,
            "rating": 4.5,
            "created_at": created_at
        })
    }

    #[tokio::test]
    async fn test_list_developers_sends_key_and_order() {
        let router = Router::new().route(
            "/rest/v1/developers",
            get(|headers: HeaderMap, RawQuery(query): RawQuery| async move {
                let query = query.unwrap_or_default();
                if !authorized(&headers) || !query.contains("order=created_at.desc") {
                    return (StatusCode::BAD_REQUEST, Json(json!({"message": "bad request"})));
                }
                (
                    StatusCode::OK,
                    Json(json!([
                        developer_row("2", "Newer", "2024-06-01T00:00:00+00:00"),
                        developer_row("1", "Older", "2024-01-01T00:00:00+00:00"),
                    ])),
                )
            }),
        );
        let base = spawn_stub(router).await;

        let service = RestDataService::new(&base, "anon-key").unwrap();
        let developers = service.list_developers().await.unwrap();

        assert_eq!(developers.len(), 2);
        assert_eq!(developers[0].record.full_name, "Newer");
        assert_eq!(developers[1].id, "1");
    }

    #[tokio::test]
    async fn test_find_active_admin_filters() {
        let router = Router::new().route(
            "/rest/v1/admin_users",
            get(|RawQuery(query): RawQuery| async move {
                let query = query.unwrap_or_default();
                if query.contains("email=eq.admin%40example.com")
                    && query.contains("is_active=eq.true")
                {
                    Json(json!([{
                        "id": "a-1",
                        "email": "admin@example.com",
                        "password_hash": "$argon2id$stub",
                        "is_active": true,
                        "full_name": "Site Admin",
                        "role": "admin"
                    }]))
                } else {
                    Json(json!([]))
                }
            }),
        );
        let base = spawn_stub(router).await;
        let service = RestDataService::new(&format!("{}/", base), "anon-key").unwrap();

        let found = service.find_active_admin("admin@example.com").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some("a-1".to_string()));

        let missing = service.find_active_admin("nobody@example.com").await.unwrap();
        assert!(missing.is_none());
    }

    fn sample_record() -> DeveloperRecord {
        DeveloperRecord {
            full_name: "Hodan Ali".to_string(),
            email: Some("hodan@example.com".to_string()),
            phone: None,
            location: Some("Mogadishu, Somalia".to_string()),
            bio: None,
            skills: vec!["React".to_string(), "Node.js".to_string()],
            photo_url: None,
            github_url: None,
            linkedin_url: None,
            portfolio_url: None,
            availability_status: crate::datastore::Availability::Busy,
            experience_years: 5,
            hourly_rate: 45,
            projects_completed: 20,
            rating: 4.9,
        }
    }

    fn wants_representation(headers: &HeaderMap) -> bool {
        headers.get("prefer").and_then(|v| v.to_str().ok()) == Some("return=representation")
    }

    #[tokio::test]
    async fn test_insert_developer_posts_array_body() {
        let router = Router::new().route(
            "/rest/v1/developers",
            axum::routing::post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let rows = body.as_array().cloned().unwrap_or_default();
                if !authorized(&headers) || !wants_representation(&headers) || rows.len() != 1 {
                    return (StatusCode::BAD_REQUEST, Json(json!({"message": "bad insert"})));
                }

                let mut row = rows[0].clone();
                row["id"] = json!(17);
                row["created_at"] = json!("2024-07-01T00:00:00+00:00");
                (StatusCode::CREATED, Json(json!([row])))
            }),
        );
        let base = spawn_stub(router).await;
        let service = RestDataService::new(&base, "anon-key").unwrap();

        let created = service.insert_developer(&sample_record()).await.unwrap();
        assert_eq!(created.id, "17");
        assert_eq!(created.record, sample_record());
        assert_eq!(created.created_at.as_deref(), Some("2024-07-01T00:00:00+00:00"));
    }

    #[tokio::test]
    async fn test_update_developer_filters_by_id() {
        let router = Router::new().route(
            "/rest/v1/developers",
            axum::routing::patch(
                |headers: HeaderMap, RawQuery(query): RawQuery, Json(body): Json<Value>| async move {
                    let query = query.unwrap_or_default();
                    if !authorized(&headers) || !wants_representation(&headers) || !body.is_object() {
                        return (StatusCode::BAD_REQUEST, Json(json!({"message": "bad update"})));
                    }
                    if query != "id=eq.d-1" {
                        return (StatusCode::OK, Json(json!([])));
                    }

                    let mut row = body;
                    row["id"] = json!("d-1");
                    (StatusCode::OK, Json(json!([row])))
                },
            ),
        );
        let base = spawn_stub(router).await;
        let service = RestDataService::new(&base, "anon-key").unwrap();

        let updated = service.update_developer("d-1", &sample_record()).await.unwrap();
        assert_eq!(updated.id, "d-1");
        assert_eq!(updated.record.skills, vec!["React", "Node.js"]);

        let err = service
            .update_developer("missing", &sample_record())
            .await
            .unwrap_err();
        match err {
            DataError::Missing(message) => assert_eq!(message, "Developer not found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_of_missing_row_is_an_error() {
        let router = Router::new().route(
            "/rest/v1/developers",
            axum::routing::delete(|| async { Json(json!([])) }),
        );
        let base = spawn_stub(router).await;
        let service = RestDataService::new(&base, "anon-key").unwrap();

        let err = service.delete_developer("does-not-exist").await.unwrap_err();
        assert!(matches!(err, DataError::Missing(_)));
    }

    #[tokio::test]
    async fn test_service_error_message_is_preserved() {
        let router = Router::new().route(
            "/rest/v1/contacts",
            axum::routing::post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "code": "42501",
                        "message": "new row violates row-level security policy"
                    })),
                )
            }),
        );
        let base = spawn_stub(router).await;
        let service = RestDataService::new(&base, "anon-key").unwrap();

        let err = service
            .insert_contact(&ContactSubmission {
                name: "Hodan".to_string(),
                email: "hodan@example.com".to_string(),
                message: "Hello".to_string(),
            })
            .await
            .unwrap_err();

        match err {
            DataError::Service { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "new row violates row-level security policy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rest_url_derivation() {
        let service = RestDataService::new("https://abc.supabase.co/", "k").unwrap();
        assert_eq!(service.rest_url, "https://abc.supabase.co/rest/v1");

        assert!(RestDataService::new("not a url", "k").is_err());
    }
}
