use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::models::{
    Article, ArticleDetail, Category, Source, Token, TopCategory, User, UserPreference,
};

/// Errors surfaced to the user by the client pipeline. Timeouts, unreachable
/// servers, and server responses with a status are kept distinct so each can
/// get its own user-facing copy.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,

    #[error("could not reach the server: {0}")]
    Connect(String),

    /// The backend answered with an error status; `detail` is its message,
    /// surfaced verbatim.
    #[error("{detail}")]
    Api { status: u16, detail: String },

    #[error("{0}")]
    Validation(String),

    #[error("please log in to perform this action")]
    NotLoggedIn,

    #[error("failed to decode server response: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Connect(err.to_string())
        }
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

/// Typed client for the news API. A bearer token, once set, is attached to
/// every request; mutations refuse to fire without one.
pub struct ApiClient {
    base_url: String,
    http: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            http,
            token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Guards mutations: fail fast with a login prompt instead of sending a
    /// request that can only come back 401.
    fn require_login(&self) -> ClientResult<()> {
        if self.token.is_none() {
            return Err(ClientError::NotLoggedIn);
        }
        Ok(())
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()))
        } else {
            Err(Self::api_error(status, response).await)
        }
    }

    async fn parse_empty(response: Response) -> ClientResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::api_error(status, response).await)
        }
    }

    async fn api_error(status: reqwest::StatusCode, response: Response) -> ClientError {
        let detail = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        ClientError::Api {
            status: status.as_u16(),
            detail,
        }
    }

    // ----- authentication -----

    pub async fn register(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> ClientResult<User> {
        let response = self
            .http
            .post(self.url("/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Logs in and remembers the bearer token for subsequent requests
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<Token> {
        let response = self
            .http
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let token: Token = Self::parse(response).await?;
        self.token = Some(token.access_token.clone());
        Ok(token)
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.require_login()?;
        let response = self.with_auth(self.http.get(self.url("/users/me"))).send().await?;
        Self::parse(response).await
    }

    // ----- catalog -----

    pub async fn articles(
        &self,
        category_id: Option<i64>,
        skip: i64,
        limit: i64,
    ) -> ClientResult<Vec<ArticleDetail>> {
        let mut params = vec![("skip", skip.to_string()), ("limit", limit.to_string())];
        if let Some(id) = category_id {
            params.push(("category_id", id.to_string()));
        }

        let response = self
            .with_auth(self.http.get(self.url("/articles")).query(&params))
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Searches articles. Queries shorter than two effective characters are
    /// rejected locally, before any network call.
    pub async fn search(&self, query: &str, limit: i64) -> ClientResult<Vec<ArticleDetail>> {
        let trimmed = query.trim();
        if trimmed.chars().count() < 2 {
            return Err(ClientError::Validation(
                "Search query must be at least 2 characters".to_string(),
            ));
        }

        let response = self
            .with_auth(
                self.http
                    .get(self.url("/search"))
                    .query(&[("query", trimmed), ("limit", &limit.to_string())]),
            )
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn categories(&self) -> ClientResult<Vec<Category>> {
        let response = self.http.get(self.url("/categories")).send().await?;
        Self::parse(response).await
    }

    pub async fn sources(&self) -> ClientResult<Vec<Source>> {
        let response = self.http.get(self.url("/sources")).send().await?;
        Self::parse(response).await
    }

    // ----- preferences -----

    pub async fn preferences(&self, user_id: i64) -> ClientResult<Vec<UserPreference>> {
        self.require_login()?;
        let response = self
            .with_auth(self.http.get(self.url(&format!("/users/{}/preferences", user_id))))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn update_preference(
        &self,
        category_id: i64,
        score: Option<i64>,
        blacklisted: Option<bool>,
    ) -> ClientResult<UserPreference> {
        self.require_login()?;
        let response = self
            .with_auth(
                self.http
                    .put(self.url(&format!("/users/me/preferences/{}", category_id)))
                    .json(&serde_json::json!({
                        "score": score,
                        "blacklisted": blacklisted,
                    })),
            )
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn top_categories(&self, limit: i64) -> ClientResult<Vec<TopCategory>> {
        self.require_login()?;
        let response = self
            .with_auth(
                self.http
                    .get(self.url("/users/me/top-categories"))
                    .query(&[("limit", limit.to_string())]),
            )
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn track_read(&self, article_id: i64) -> ClientResult<UserPreference> {
        self.require_login()?;
        let response = self
            .with_auth(self.http.post(self.url(&format!("/articles/{}/read", article_id))))
            .send()
            .await?;
        Self::parse(response).await
    }

    // ----- favorites -----

    pub async fn favorite_articles(&self) -> ClientResult<Vec<ArticleDetail>> {
        self.require_login()?;
        let response = self
            .with_auth(self.http.get(self.url("/users/me/favorite-articles")))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn add_favorite(&self, article_id: i64) -> ClientResult<Article> {
        self.require_login()?;
        let response = self
            .with_auth(
                self.http
                    .post(self.url("/users/me/favorite-articles"))
                    .json(&serde_json::json!({ "article_id": article_id })),
            )
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn remove_favorite(&self, article_id: i64) -> ClientResult<()> {
        self.require_login()?;
        let response = self
            .with_auth(
                self.http
                    .delete(self.url(&format!("/users/me/favorite-articles/{}", article_id))),
            )
            .send()
            .await?;
        Self::parse_empty(response).await
    }

    // ----- blacklists -----

    pub async fn blacklisted_articles(&self) -> ClientResult<Vec<ArticleDetail>> {
        self.require_login()?;
        let response = self
            .with_auth(self.http.get(self.url("/users/me/blacklisted-articles")))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn hide_article(&self, article_id: i64) -> ClientResult<Article> {
        self.require_login()?;
        let response = self
            .with_auth(
                self.http
                    .post(self.url("/users/me/blacklisted-articles"))
                    .json(&serde_json::json!({ "article_id": article_id })),
            )
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn unhide_article(&self, article_id: i64) -> ClientResult<()> {
        self.require_login()?;
        let response = self
            .with_auth(
                self.http
                    .delete(self.url(&format!("/users/me/blacklisted-articles/{}", article_id))),
            )
            .send()
            .await?;
        Self::parse_empty(response).await
    }

    pub async fn blacklisted_sources(&self) -> ClientResult<Vec<Source>> {
        self.require_login()?;
        let response = self
            .with_auth(self.http.get(self.url("/users/me/blacklisted-sources")))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn block_source(&self, source_id: i64) -> ClientResult<Source> {
        self.require_login()?;
        let response = self
            .with_auth(
                self.http
                    .post(self.url("/users/me/blacklisted-sources"))
                    .json(&serde_json::json!({ "source_id": source_id })),
            )
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn unblock_source(&self, source_id: i64) -> ClientResult<()> {
        self.require_login()?;
        let response = self
            .with_auth(
                self.http
                    .delete(self.url(&format!("/users/me/blacklisted-sources/{}", source_id))),
            )
            .send()
            .await?;
        Self::parse_empty(response).await
    }
}
