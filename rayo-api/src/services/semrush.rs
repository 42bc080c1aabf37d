//! SEMrush keyword analytics client
//!
//! Uses the `phrase_this` report: semicolon-joined phrases in one request,
//! semicolon-separated response lines with a header row. A body starting with
//! `ERROR` means the phrases have no data, not a transport failure.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// SEMrush analytics API base URL
const SEMRUSH_API_URL: &str = "https://api.semrush.com/";

/// Default timeout for SEMrush requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Columns requested: phrase, volume, cpc, competition, difficulty, intent
const EXPORT_COLUMNS: &str = "Ph,Nq,Cp,Co,Kd,In";

#[derive(Debug, Error)]
pub enum SemrushError {
    #[error("SEMrush request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SEMrush returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Metrics for one phrase as reported by SEMrush
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMetrics {
    pub phrase: String,
    pub search_volume: i64,
    pub cpc: f64,
    pub competition: f64,
    pub difficulty: i64,
    pub intent: String,
}

/// SEMrush client
#[derive(Clone)]
pub struct SemrushClient {
    http_client: Client,
    api_key: String,
}

impl SemrushClient {
    pub fn new(api_key: String) -> Result<Self, SemrushError> {
        Ok(Self {
            http_client: Client::builder().timeout(DEFAULT_TIMEOUT).build()?,
            api_key,
        })
    }

    /// Fetch metrics for a batch of phrases against a country database.
    ///
    /// Phrases with no data are absent from the result; an all-`ERROR` body
    /// yields an empty vector.
    pub async fn fetch_metrics(
        &self,
        phrases: &[String],
        country: &str,
    ) -> Result<Vec<KeywordMetrics>, SemrushError> {
        if phrases.is_empty() {
            return Ok(Vec::new());
        }

        let database = country.to_lowercase();
        debug!(count = phrases.len(), database = %database, "Fetching SEMrush metrics");

        let response = self
            .http_client
            .get(SEMRUSH_API_URL)
            .query(&[
                ("type", "phrase_this"),
                ("key", &self.api_key),
                ("phrase", &phrases.join(";")),
                ("export_columns", EXPORT_COLUMNS),
                ("database", &database),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SemrushError::Status(response.status()));
        }

        let body = response.text().await?;
        Ok(parse_report(&body))
    }
}

/// Parse the semicolon-separated report body, skipping the header row.
fn parse_report(body: &str) -> Vec<KeywordMetrics> {
    if body.trim_start().starts_with("ERROR") {
        return Vec::new();
    }

    body.lines()
        .skip(1)
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<KeywordMetrics> {
    let parts: Vec<&str> = line.trim().split(';').collect();
    if parts.len() < 6 {
        return None;
    }

    Some(KeywordMetrics {
        phrase: parts[0].trim().to_string(),
        search_volume: parts[1].trim().parse().unwrap_or(0),
        cpc: parse_decimal(parts[2]),
        competition: parse_decimal(parts[3]),
        difficulty: parse_decimal(parts[4]).round() as i64,
        intent: intent_label(parts[5].trim()).to_string(),
    })
}

/// SEMrush reports decimals with either `.` or `,` separators.
fn parse_decimal(raw: &str) -> f64 {
    raw.trim().replace(',', ".").parse().unwrap_or(0.0)
}

/// Map the numeric intent code to its label.
pub fn intent_label(code: &str) -> &'static str {
    match code {
        "0" => "commercial",
        "1" => "informational",
        "2" => "navigational",
        "3" => "transactional",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_skips_header() {
        let body = "Ph;Nq;Cp;Co;Kd;In\nrust web framework;1900;1.25;0.33;42;1\n";
        let metrics = parse_report(body);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].phrase, "rust web framework");
        assert_eq!(metrics[0].search_volume, 1900);
        assert_eq!(metrics[0].intent, "informational");
    }

    #[test]
    fn test_parse_report_error_body_is_empty() {
        let body = "ERROR 50 :: NOTHING FOUND";
        assert!(parse_report(body).is_empty());
    }

    #[test]
    fn test_parse_comma_decimal_separator() {
        let body = "Ph;Nq;Cp;Co;Kd;In\nzapatos;880;0,45;0,12;35;0\n";
        let metrics = parse_report(body);
        assert_eq!(metrics[0].cpc, 0.45);
        assert_eq!(metrics[0].competition, 0.12);
        assert_eq!(metrics[0].intent, "commercial");
    }

    #[test]
    fn test_intent_label_blank_is_unknown() {
        assert_eq!(intent_label(""), "unknown");
        assert_eq!(intent_label("3"), "transactional");
    }

    #[test]
    fn test_parse_line_short_row_is_dropped() {
        assert!(parse_line("only;three;fields").is_none());
    }
}
