//! WordPress REST API client
//!
//! Talks to `{site}/wp-json/wp/v2` with basic auth (username + application
//! password). Used both for publishing documents and for the proxy endpoints
//! that surface categories, tags and authors to the frontend.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default timeout for WordPress requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Post statuses WordPress accepts
pub const POST_STATUSES: [&str; 5] = ["publish", "future", "draft", "pending", "private"];

#[derive(Debug, Error)]
pub enum WordPressError {
    #[error("WordPress request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("WordPress returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// A created or fetched WordPress post
#[derive(Debug, Clone, Deserialize)]
pub struct WordPressPost {
    pub id: i64,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    title: &'a str,
    content: &'a str,
    status: &'a str,
}

#[derive(Debug, Serialize)]
struct NewTerm<'a> {
    name: &'a str,
}

/// WordPress client bound to one site's credentials
#[derive(Clone)]
pub struct WordPressClient {
    http_client: Client,
    base_url: String,
    username: String,
    app_password: String,
}

impl WordPressClient {
    pub fn new(
        site_url: &str,
        username: String,
        app_password: String,
    ) -> Result<Self, WordPressError> {
        let base_url = format!("{}/wp-json/wp/v2", site_url.trim_end_matches('/'));

        Ok(Self {
            http_client: Client::builder().timeout(DEFAULT_TIMEOUT).build()?,
            base_url,
            username,
            app_password,
        })
    }

    /// Verify the credentials by fetching the authenticated user.
    pub async fn test_connection(&self) -> Result<(), WordPressError> {
        debug!(base_url = %self.base_url, "Testing WordPress connection");
        self.get_json(&format!("{}/users/me", self.base_url))
            .await
            .map(|_: Value| ())
    }

    /// Create a post with the given status.
    pub async fn create_post(
        &self,
        title: &str,
        content: &str,
        status: &str,
    ) -> Result<WordPressPost, WordPressError> {
        debug!(base_url = %self.base_url, status, "Creating WordPress post");

        let response = self
            .http_client
            .post(format!("{}/posts", self.base_url))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&NewPost {
                title,
                content,
                status,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WordPressError::Status(response.status()));
        }

        Ok(response.json().await?)
    }

    /// Fetch one post by id.
    pub async fn get_post(&self, post_id: i64) -> Result<Value, WordPressError> {
        self.get_json(&format!("{}/posts/{}", self.base_url, post_id))
            .await
    }

    /// Update fields of an existing post.
    pub async fn update_post(&self, post_id: i64, fields: &Value) -> Result<Value, WordPressError> {
        let response = self
            .http_client
            .post(format!("{}/posts/{}", self.base_url, post_id))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(fields)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WordPressError::Status(response.status()));
        }

        Ok(response.json().await?)
    }

    /// Delete a post (moves to trash unless force is set server-side).
    pub async fn delete_post(&self, post_id: i64) -> Result<Value, WordPressError> {
        let response = self
            .http_client
            .delete(format!("{}/posts/{}", self.base_url, post_id))
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WordPressError::Status(response.status()));
        }

        Ok(response.json().await?)
    }

    pub async fn list_categories(&self) -> Result<Value, WordPressError> {
        self.get_json(&format!("{}/categories?per_page=100", self.base_url))
            .await
    }

    pub async fn create_category(&self, name: &str) -> Result<Value, WordPressError> {
        self.post_json(&format!("{}/categories", self.base_url), &NewTerm { name })
            .await
    }

    pub async fn list_tags(&self) -> Result<Value, WordPressError> {
        self.get_json(&format!("{}/tags?per_page=100", self.base_url))
            .await
    }

    pub async fn create_tag(&self, name: &str) -> Result<Value, WordPressError> {
        self.post_json(&format!("{}/tags", self.base_url), &NewTerm { name })
            .await
    }

    pub async fn list_authors(&self) -> Result<Value, WordPressError> {
        self.get_json(&format!("{}/users?per_page=100", self.base_url))
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, WordPressError> {
        let response = self
            .http_client
            .get(url)
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WordPressError::Status(response.status()));
        }

        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize>(&self, url: &str, body: &B) -> Result<Value, WordPressError> {
        let response = self
            .http_client
            .post(url)
            .basic_auth(&self.username, Some(&self.app_password))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WordPressError::Status(response.status()));
        }

        Ok(response.json().await?)
    }
}
