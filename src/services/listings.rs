//! Listing page scraper for talentd.in feeds.
//!
//! Fetches each category's feed pages and extracts listing cards using
//! configured CSS selectors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::{ScraperConfig, SelectorConfig};
use crate::error::{AppError, Result};
use crate::models::{Category, RawPosting};
use crate::services::JobFetcher;

/// Compiled selector set for one listing card.
pub struct CardSelectors {
    card: Selector,
    title: Selector,
    company_location: Selector,
    salary: Selector,
    posted: Selector,
    skills: Selector,
    eligible_years: Selector,
    apply_link: Selector,
    company_logo: Selector,
    pagination: Selector,
}

impl CardSelectors {
    /// Compile the configured selector strings, failing on the first
    /// invalid one.
    pub fn compile(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            card: parse_selector(&config.card)?,
            title: parse_selector(&config.title)?,
            company_location: parse_selector(&config.company_location)?,
            salary: parse_selector(&config.salary)?,
            posted: parse_selector(&config.posted)?,
            skills: parse_selector(&config.skills)?,
            eligible_years: parse_selector(&config.eligible_years)?,
            apply_link: parse_selector(&config.apply_link)?,
            company_logo: parse_selector(&config.company_logo)?,
            pagination: parse_selector(&config.pagination)?,
        })
    }
}

/// Service fetching job listings from the upstream site.
pub struct ListingScraper {
    config: ScraperConfig,
    selectors: CardSelectors,
    client: Client,
}

impl ListingScraper {
    /// Create a new scraper with the given configuration.
    pub fn new(config: ScraperConfig, selectors: &SelectorConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            selectors: CardSelectors::compile(selectors)?,
            client,
        })
    }

    fn feed_url(&self, category: Category, page: u32) -> String {
        format!(
            "{}/{}?page={page}",
            self.config.base_url.trim_end_matches('/'),
            category.feed_path()
        )
    }

    /// Fetch one page body, retrying transient failures with linear backoff.
    async fn fetch_with_retry(&self, category: Category, url: &str) -> Result<String> {
        let mut last_error = String::new();

        for attempt in 1..=self.config.retry_attempts {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(FetchAttemptError::Permanent(message)) => {
                    return Err(AppError::fetch(category, message));
                }
                Err(FetchAttemptError::Transient(message)) => {
                    tracing::warn!(
                        %category,
                        url,
                        attempt,
                        "fetch attempt failed: {message}"
                    );
                    last_error = message;
                }
            }

            if attempt < self.config.retry_attempts {
                let backoff = self.config.retry_backoff_ms * attempt as u64;
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
        }

        Err(AppError::fetch(
            category,
            format!(
                "{} attempts exhausted, last error: {last_error}",
                self.config.retry_attempts
            ),
        ))
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, FetchAttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchAttemptError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .text()
                .await
                .map_err(|e| FetchAttemptError::Transient(e.to_string()))
        } else if status.is_server_error() || status.as_u16() == 429 {
            Err(FetchAttemptError::Transient(format!("HTTP {status}")))
        } else {
            Err(FetchAttemptError::Permanent(format!("HTTP {status}")))
        }
    }
}

enum FetchAttemptError {
    Transient(String),
    Permanent(String),
}

#[async_trait]
impl JobFetcher for ListingScraper {
    async fn fetch_category(&self, category: Category) -> Result<Vec<RawPosting>> {
        let first_url = self.feed_url(category, 1);
        let body = self.fetch_with_retry(category, &first_url).await?;

        // Parse synchronously in a block: Html is not Send and must not
        // live across an await point.
        let (mut postings, last_page) = {
            let document = Html::parse_document(&body);
            let postings = parse_cards(&document, &self.selectors, &first_url);
            let last_page = detect_last_page(&document, &self.selectors.pagination);
            (postings, last_page)
        };

        let last_page = last_page.min(self.config.max_pages);
        tracing::info!(%category, last_page, "fetched feed page 1");

        for page in 2..=last_page {
            if self.config.request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
            }

            let url = self.feed_url(category, page);
            let body = self.fetch_with_retry(category, &url).await?;
            let page_postings = {
                let document = Html::parse_document(&body);
                parse_cards(&document, &self.selectors, &url)
            };
            tracing::debug!(%category, page, count = page_postings.len(), "fetched feed page");
            postings.extend(page_postings);
        }

        Ok(postings)
    }
}

/// Extract raw postings from every listing card in the document.
///
/// Extraction is permissive: missing fields come back empty and the
/// pipeline's validation step decides what to drop.
pub fn parse_cards(document: &Html, selectors: &CardSelectors, page_url: &str) -> Vec<RawPosting> {
    let base = Url::parse(page_url).ok();

    document
        .select(&selectors.card)
        .map(|card| {
            let skills: Vec<String> = card
                .select(&selectors.skills)
                .map(|el| element_text(&el))
                .filter(|s| !s.is_empty())
                .collect();

            RawPosting {
                title: select_text(&card, &selectors.title),
                company_location: select_text(&card, &selectors.company_location),
                salary: clean_salary(&select_text(&card, &selectors.salary)),
                posted: select_text(&card, &selectors.posted),
                skills: skills.join(", "),
                eligible_years: select_text(&card, &selectors.eligible_years),
                apply_url: select_attr(&card, &selectors.apply_link, "href", base.as_ref()),
                company_logo: select_attr(&card, &selectors.company_logo, "src", base.as_ref()),
            }
        })
        .collect()
}

/// Find the highest page number among pagination links. Defaults to 1 when
/// the feed has no pagination.
pub fn detect_last_page(document: &Html, pagination: &Selector) -> u32 {
    document
        .select(pagination)
        .filter_map(|link| element_text(&link).parse::<u32>().ok())
        .max()
        .unwrap_or(1)
}

/// Normalize source salary strings: the feed mixes `₹` with mangled
/// encodings of it.
fn clean_salary(salary: &str) -> String {
    salary.replace('₹', "INR").replace('?', "INR").trim().to_string()
}

fn select_text(card: &ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default()
}

fn select_attr(
    card: &ElementRef<'_>,
    selector: &Selector,
    attr: &str,
    base: Option<&Url>,
) -> String {
    let raw = card
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .unwrap_or_default();

    if raw.is_empty() {
        return String::new();
    }
    match base {
        Some(base) => base
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    }
}

/// Collect an element's text with whitespace collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
