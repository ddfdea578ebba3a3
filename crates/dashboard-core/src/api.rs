//! HTTP client for the records API (JSONPlaceholder-compatible).
//!
//! Endpoints:
//! - `GET /users`, `GET /users/{id}`
//! - `GET /posts`, `GET /posts/{id}`, `GET /posts?userId={id}`
//! - `GET /comments?postId={id}`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {url} failed (HTTP {status})")]
    Status { url: String, status: u16 },
    #[error("Failed to parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub lat: String,
    pub lng: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub catch_phrase: String,
    #[serde(default)]
    pub bs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub name: String,
    pub email: String,
    pub body: String,
}

/// Thin wrapper over `reqwest::Client` bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Builds a client from config (base URL override and timeout).
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Client)?;
        Self::with_client(http, &config.effective_base_url())
    }

    /// # Errors
    /// Returns an error if `base_url` is not a valid URL.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        // Trailing slash so `join` appends instead of replacing the last segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|source| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|source| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                source,
            })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let display_url = url.to_string();

        let response = self
            .http
            .get(url)
            .header("Content-Type", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: display_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: display_url,
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|source| ApiError::Decode {
                url: display_url,
                source,
            })
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not a user list.
    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        tracing::debug!("fetching users");
        let users: Vec<User> = self.get_json("users", &[]).await?;
        tracing::debug!(count = users.len(), "users fetched");
        Ok(users)
    }

    /// # Errors
    /// Returns an error if the request fails or the user does not exist.
    pub async fn user(&self, id: u64) -> Result<User, ApiError> {
        tracing::debug!(id, "fetching user");
        self.get_json(&format!("users/{id}"), &[]).await
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not a post list.
    pub async fn posts(&self) -> Result<Vec<Post>, ApiError> {
        tracing::debug!("fetching posts");
        let posts: Vec<Post> = self.get_json("posts", &[]).await?;
        tracing::debug!(count = posts.len(), "posts fetched");
        Ok(posts)
    }

    /// # Errors
    /// Returns an error if the request fails or the post does not exist.
    pub async fn post(&self, id: u64) -> Result<Post, ApiError> {
        tracing::debug!(id, "fetching post");
        self.get_json(&format!("posts/{id}"), &[]).await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn posts_by_user(&self, user_id: u64) -> Result<Vec<Post>, ApiError> {
        tracing::debug!(user_id, "fetching posts by user");
        self.get_json("posts", &[("userId", user_id.to_string())]).await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn comments_by_post(&self, post_id: u64) -> Result<Vec<Comment>, ApiError> {
        tracing::debug!(post_id, "fetching comments");
        self.get_json("comments", &[("postId", post_id.to_string())]).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::with_client(reqwest::Client::new(), &server.uri()).unwrap()
    }

    fn user_json(id: u64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "username": "Bret",
            "email": "Sincere@april.biz",
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "address": {
                "street": "Kulas Light",
                "suite": "Apt. 556",
                "city": "Gwenborough",
                "zipcode": "92998-3874",
                "geo": { "lat": "-37.3159", "lng": "81.1496" }
            },
            "company": {
                "name": "Romaguera-Crona",
                "catchPhrase": "Multi-layered client-server neural-net",
                "bs": "harness real-time e-markets"
            }
        })
    }

    #[test]
    fn test_base_url_with_path_keeps_prefix() {
        let client =
            ApiClient::with_client(reqwest::Client::new(), "http://localhost:8080/api/").unwrap();
        assert_eq!(
            client.endpoint("users/1").unwrap().as_str(),
            "http://localhost:8080/api/users/1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiClient::with_client(reqwest::Client::new(), "not a url").unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));
    }

    #[tokio::test]
    async fn test_users_parses_nested_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([user_json(1, "Leanne Graham")])),
            )
            .mount(&server)
            .await;

        let users = client(&server).users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Leanne Graham");
        let company = users[0].company.as_ref().unwrap();
        assert_eq!(company.catch_phrase, "Multi-layered client-server neural-net");
        let geo = users[0].address.as_ref().unwrap().geo.as_ref().unwrap();
        assert_eq!(geo.lat, "-37.3159");
    }

    #[tokio::test]
    async fn test_posts_by_user_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("userId", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 21, "userId": 3, "title": "t", "body": "b" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let posts = client(&server).posts_by_user(3).await.unwrap();
        assert_eq!(posts[0].id, 21);
        assert_eq!(posts[0].user_id, 3);
    }

    #[tokio::test]
    async fn test_comments_by_post_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments"))
            .and(query_param("postId", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "postId": 7, "name": "n", "email": "e@x.io", "body": "nice" }
            ])))
            .mount(&server)
            .await;

        let comments = client(&server).comments_by_post(7).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "nice");
    }

    #[tokio::test]
    async fn test_not_found_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = client(&server).post(999).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).user(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
