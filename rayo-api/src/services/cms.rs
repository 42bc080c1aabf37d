//! CMS detection and the publish abstraction
//!
//! A project's `cms_config` blob records which platform the site runs on.
//! Detection is a substring match over the serialized config, so both
//! `{"type": "wordpress"}` and scraper output like
//! `{"generator": "WordPress 6.4"}` resolve correctly.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::shopify::{ShopifyClient, ShopifyError};
use super::wordpress::{WordPressClient, WordPressError};

/// Platforms recognized in a project's cms_config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmsKind {
    WordPress,
    Shopify,
    Drupal,
    Joomla,
    Unknown,
}

/// Classify a project's cms_config blob.
pub fn detect_cms(cms_config: Option<&Value>) -> CmsKind {
    let Some(config) = cms_config else {
        return CmsKind::Unknown;
    };

    let haystack = config.to_string().to_lowercase();
    if haystack.contains("wordpress") {
        CmsKind::WordPress
    } else if haystack.contains("shopify") {
        CmsKind::Shopify
    } else if haystack.contains("drupal") {
        CmsKind::Drupal
    } else if haystack.contains("joomla") {
        CmsKind::Joomla
    } else {
        CmsKind::Unknown
    }
}

#[derive(Debug, Error)]
pub enum CmsError {
    #[error(transparent)]
    WordPress(#[from] WordPressError),

    #[error(transparent)]
    Shopify(#[from] ShopifyError),
}

/// Result of pushing one document to a CMS
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub platform: &'static str,
    pub remote_id: i64,
    pub link: Option<String>,
}

/// Publish one document's title and HTML to a CMS.
///
/// `status` is a WordPress post status; platforms without an equivalent map
/// it to their own publish switch.
#[async_trait]
pub trait CmsPublisher: Send + Sync {
    async fn publish(
        &self,
        title: &str,
        html: &str,
        status: &str,
    ) -> Result<PublishOutcome, CmsError>;
}

#[async_trait]
impl CmsPublisher for WordPressClient {
    async fn publish(
        &self,
        title: &str,
        html: &str,
        status: &str,
    ) -> Result<PublishOutcome, CmsError> {
        let post = self.create_post(title, html, status).await?;

        Ok(PublishOutcome {
            platform: "wordpress",
            remote_id: post.id,
            link: (!post.link.is_empty()).then_some(post.link),
        })
    }
}

/// Only "publish" goes live on Shopify; every other status lands as a draft.
fn shopify_published(status: &str) -> bool {
    status == "publish"
}

#[async_trait]
impl CmsPublisher for ShopifyClient {
    async fn publish(
        &self,
        title: &str,
        html: &str,
        status: &str,
    ) -> Result<PublishOutcome, CmsError> {
        let blog_id = self.default_blog_id().await?;
        let article = self
            .create_article(blog_id, title, html, shopify_published(status))
            .await?;

        Ok(PublishOutcome {
            platform: "shopify",
            remote_id: article.id,
            link: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_cms_from_type_field() {
        let config = json!({"type": "wordpress", "site_url": "https://example.com"});
        assert_eq!(detect_cms(Some(&config)), CmsKind::WordPress);
    }

    #[test]
    fn test_detect_cms_from_scraper_output() {
        let config = json!({"generator": "Shopify eCommerce"});
        assert_eq!(detect_cms(Some(&config)), CmsKind::Shopify);
        let config = json!({"generator": "Drupal 10"});
        assert_eq!(detect_cms(Some(&config)), CmsKind::Drupal);
        let config = json!({"generator": "Joomla! CMS"});
        assert_eq!(detect_cms(Some(&config)), CmsKind::Joomla);
    }

    #[test]
    fn test_shopify_published_only_for_publish() {
        assert!(shopify_published("publish"));
        assert!(!shopify_published("pending"));
        assert!(!shopify_published("draft"));
        assert!(!shopify_published("private"));
    }

    #[test]
    fn test_detect_cms_unknown() {
        assert_eq!(detect_cms(None), CmsKind::Unknown);
        let config = json!({"generator": "Hand-rolled HTML"});
        assert_eq!(detect_cms(Some(&config)), CmsKind::Unknown);
    }
}
