//! Shopify Admin API client
//!
//! Talks to `https://{shop}/admin/api/{version}` with the
//! `X-Shopify-Access-Token` header. Articles live under a Shopify blog, so
//! publishing resolves a target blog id first.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default timeout for Shopify requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("Shopify request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Shopify returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Shop has no blogs to publish into")]
    NoBlogs,
}

impl ShopifyError {
    /// True when the shop answered but the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShopifyError::Status(code) if *code == reqwest::StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyBlog {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub handle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyArticle {
    pub id: i64,
    pub blog_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlogsEnvelope {
    blogs: Vec<ShopifyBlog>,
}

#[derive(Debug, Deserialize)]
struct BlogEnvelope {
    blog: ShopifyBlog,
}

#[derive(Debug, Deserialize)]
struct ArticlesEnvelope {
    articles: Vec<ShopifyArticle>,
}

#[derive(Debug, Deserialize)]
struct ArticleEnvelope {
    article: ShopifyArticle,
}

/// Shopify Admin client bound to one shop's credentials
#[derive(Clone)]
pub struct ShopifyClient {
    http_client: Client,
    base_url: String,
    access_token: String,
}

impl ShopifyClient {
    pub fn new(
        shop_domain: &str,
        access_token: String,
        api_version: &str,
    ) -> Result<Self, ShopifyError> {
        let domain = shop_domain
            .trim_end_matches('/')
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let base_url = format!("https://{}/admin/api/{}", domain, api_version);

        Ok(Self {
            http_client: Client::builder().timeout(DEFAULT_TIMEOUT).build()?,
            base_url,
            access_token,
        })
    }

    /// Verify the token by fetching shop info.
    pub async fn test_connection(&self) -> Result<(), ShopifyError> {
        debug!(base_url = %self.base_url, "Testing Shopify connection");
        self.get_json(&format!("{}/shop.json", self.base_url))
            .await
            .map(|_: Value| ())
    }

    pub async fn list_blogs(&self) -> Result<Vec<ShopifyBlog>, ShopifyError> {
        let envelope: BlogsEnvelope = self
            .get_json(&format!("{}/blogs.json", self.base_url))
            .await?;
        Ok(envelope.blogs)
    }

    pub async fn create_blog(&self, title: &str) -> Result<ShopifyBlog, ShopifyError> {
        let envelope: BlogEnvelope = self
            .post_json(
                &format!("{}/blogs.json", self.base_url),
                &json!({"blog": {"title": title}}),
            )
            .await?;
        Ok(envelope.blog)
    }

    pub async fn list_articles(&self, blog_id: i64) -> Result<Vec<ShopifyArticle>, ShopifyError> {
        let envelope: ArticlesEnvelope = self
            .get_json(&format!(
                "{}/blogs/{}/articles.json?limit=250",
                self.base_url, blog_id
            ))
            .await?;
        Ok(envelope.articles)
    }

    pub async fn get_article(
        &self,
        blog_id: i64,
        article_id: i64,
    ) -> Result<ShopifyArticle, ShopifyError> {
        let envelope: ArticleEnvelope = self
            .get_json(&format!(
                "{}/blogs/{}/articles/{}.json",
                self.base_url, blog_id, article_id
            ))
            .await?;
        Ok(envelope.article)
    }

    /// Create an article under a blog. `published` false leaves it as a draft.
    pub async fn create_article(
        &self,
        blog_id: i64,
        title: &str,
        body_html: &str,
        published: bool,
    ) -> Result<ShopifyArticle, ShopifyError> {
        debug!(blog_id, published, "Creating Shopify article");

        let envelope: ArticleEnvelope = self
            .post_json(
                &format!("{}/blogs/{}/articles.json", self.base_url, blog_id),
                &json!({
                    "article": {
                        "title": title,
                        "body_html": body_html,
                        "handle": handle_from_title(title),
                        "published": published,
                    }
                }),
            )
            .await?;
        Ok(envelope.article)
    }

    pub async fn update_article(
        &self,
        blog_id: i64,
        article_id: i64,
        fields: &Value,
    ) -> Result<ShopifyArticle, ShopifyError> {
        let response = self
            .http_client
            .put(format!(
                "{}/blogs/{}/articles/{}.json",
                self.base_url, blog_id, article_id
            ))
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&json!({"article": fields}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ShopifyError::Status(response.status()));
        }

        let envelope: ArticleEnvelope = response.json().await?;
        Ok(envelope.article)
    }

    pub async fn delete_article(&self, blog_id: i64, article_id: i64) -> Result<(), ShopifyError> {
        let response = self
            .http_client
            .delete(format!(
                "{}/blogs/{}/articles/{}.json",
                self.base_url, blog_id, article_id
            ))
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ShopifyError::Status(response.status()));
        }

        Ok(())
    }

    /// Distinct article authors across every blog in the shop.
    pub async fn list_authors(&self) -> Result<Vec<String>, ShopifyError> {
        let mut authors = BTreeSet::new();
        for blog in self.list_blogs().await? {
            for article in self.list_articles(blog.id).await? {
                if let Some(author) = article.author {
                    if !author.is_empty() {
                        authors.insert(author);
                    }
                }
            }
        }
        Ok(authors.into_iter().collect())
    }

    /// Distinct tags aggregated across every article in the shop.
    pub async fn list_tags(&self) -> Result<Vec<String>, ShopifyError> {
        let mut tags = BTreeSet::new();
        for blog in self.list_blogs().await? {
            for article in self.list_articles(blog.id).await? {
                for tag in article.tags.split(',') {
                    let tag = tag.trim();
                    if !tag.is_empty() {
                        tags.insert(tag.to_string());
                    }
                }
            }
        }
        Ok(tags.into_iter().collect())
    }

    /// First blog in the shop, used as the default publish target.
    pub async fn default_blog_id(&self) -> Result<i64, ShopifyError> {
        self.list_blogs()
            .await?
            .first()
            .map(|blog| blog.id)
            .ok_or(ShopifyError::NoBlogs)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ShopifyError> {
        let response = self
            .http_client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ShopifyError::Status(response.status()));
        }

        Ok(response.json().await?)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<T, ShopifyError> {
        let response = self
            .http_client
            .post(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ShopifyError::Status(response.status()));
        }

        Ok(response.json().await?)
    }
}

/// Derive a URL handle from an article title.
pub fn handle_from_title(title: &str) -> String {
    let mut handle = String::with_capacity(title.len());
    let mut last_dash = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            handle.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            handle.push('-');
            last_dash = true;
        }
    }
    handle.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_from_title() {
        assert_eq!(handle_from_title("10 Best SEO Tips!"), "10-best-seo-tips");
        assert_eq!(handle_from_title("  Hello,   World  "), "hello-world");
        assert_eq!(handle_from_title("---"), "");
    }

    #[test]
    fn test_is_not_found_only_for_404() {
        assert!(ShopifyError::Status(reqwest::StatusCode::NOT_FOUND).is_not_found());
        assert!(!ShopifyError::Status(reqwest::StatusCode::UNAUTHORIZED).is_not_found());
        assert!(!ShopifyError::NoBlogs.is_not_found());
    }

    #[test]
    fn test_base_url_normalizes_domain() {
        let client =
            ShopifyClient::new("https://demo.myshopify.com/", "token".into(), "2024-01").unwrap();
        assert_eq!(
            client.base_url,
            "https://demo.myshopify.com/admin/api/2024-01"
        );
    }
}
