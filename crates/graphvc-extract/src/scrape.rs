//! Fetch a public page and reduce it to readable text.

use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use scraper::{ElementRef, Html, Selector};

use graphvc_core::api::SCRAPE_FAILURE_MESSAGE;
use graphvc_core::input::MAX_CONTENT_CHARS;

use crate::error::{ExtractError, ExtractResult};
use crate::ssrf::{UrlValidator, ValidatedUrl};

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const BOILERPLATE_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside", "noscript"];

/// Scraper limits.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub max_bytes: usize,
    /// Pages yielding less text are treated as paywalled or empty.
    pub min_chars: usize,
    pub max_chars: usize,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_redirects: 5,
            max_bytes: 5 * 1024 * 1024,
            min_chars: 500,
            max_chars: MAX_CONTENT_CHARS,
            user_agent: CHROME_UA.to_string(),
        }
    }
}

pub struct Scraper {
    config: ScraperConfig,
    validator: UrlValidator,
}

impl Default for Scraper {
    fn default() -> Self {
        Self::new(ScraperConfig::default(), UrlValidator::new())
    }
}

impl Scraper {
    pub fn new(config: ScraperConfig, validator: UrlValidator) -> Self {
        Self { config, validator }
    }

    pub fn validator(&self) -> &UrlValidator {
        &self.validator
    }

    /// Fetch `url` and return its article text, capped at `max_chars`.
    pub async fn scrape(&self, url: &str) -> ExtractResult<String> {
        let html = self.fetch(url).await?;
        let text = extract_text(&html);

        let chars = text.chars().count();
        if chars < self.config.min_chars {
            tracing::info!(url = %url, chars, "Scraped page yielded too little text");
            return Err(ExtractError::scrape_failed(SCRAPE_FAILURE_MESSAGE));
        }

        Ok(graphvc_core::input::truncate_chars(&text, self.config.max_chars).to_string())
    }

    async fn fetch(&self, url: &str) -> ExtractResult<String> {
        let mut current = self.validator.validate(url).await?;
        let mut redirects = 0;

        let mut response = loop {
            let client = self.client_for(&current)?;
            let response = client
                .get(current.url.clone())
                .send()
                .await
                .map_err(map_transport_error)?;

            if !response.status().is_redirection() {
                break response;
            }
            if redirects >= self.config.max_redirects {
                tracing::info!(url = %url, "Too many redirects");
                return Err(ExtractError::scrape_failed(SCRAPE_FAILURE_MESSAGE));
            }

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| ExtractError::scrape_failed(SCRAPE_FAILURE_MESSAGE))?;
            let next = current
                .url
                .join(location)
                .map_err(|_| ExtractError::scrape_failed(SCRAPE_FAILURE_MESSAGE))?;

            tracing::debug!(from = %current.url, to = %next, "Following redirect");
            current = self.validator.validate(next.as_str()).await?;
            redirects += 1;
        };

        if !response.status().is_success() {
            tracing::info!(url = %current.url, status = %response.status(), "Target returned an error");
            return Err(ExtractError::scrape_failed(SCRAPE_FAILURE_MESSAGE));
        }

        let declared_len = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared_len.is_some_and(|len| len > self.config.max_bytes) {
            return Err(too_large());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.contains("text/html") && !content_type.contains("text/plain") {
            tracing::info!(url = %current.url, content_type = %content_type, "Unsupported content type");
            return Err(ExtractError::scrape_failed(SCRAPE_FAILURE_MESSAGE));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_transport_error)? {
            if body.len() + chunk.len() > self.config.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// One client per hop, pinned to the addresses the validator checked.
    fn client_for(&self, target: &ValidatedUrl) -> ExtractResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(&self.config.user_agent)
            .redirect(Policy::none());

        if let (Some(host), Some(addr)) = (target.url.host_str(), target.addrs.first()) {
            builder = builder.resolve(host, *addr);
        }

        builder
            .build()
            .map_err(|e| ExtractError::unavailable(format!("HTTP client error: {}", e)))
    }
}

fn too_large() -> ExtractError {
    ExtractError::scrape_failed("Page is too large to process, try pasting the text instead")
}

fn map_transport_error(err: reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        ExtractError::unavailable("URL fetch timed out, try again or paste the text directly")
    } else if err.is_connect() {
        ExtractError::unavailable("Could not connect to URL, try pasting the text instead")
    } else {
        tracing::info!(error = %err, "URL fetch failed");
        ExtractError::scrape_failed(SCRAPE_FAILURE_MESSAGE)
    }
}

/// Readable text of an HTML document.
///
/// Boilerplate subtrees are dropped. Headings come first, then every
/// `<article>`; pages without articles fall back to their paragraphs.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<String> = Vec::new();

    let mut push = |element: ElementRef<'_>| {
        let text = visible_text(element);
        if !text.is_empty() {
            parts.push(text);
        }
    };

    for heading in select_content(&document, "h1, h2, h3") {
        push(heading);
    }

    let articles = select_content(&document, "article");
    if articles.is_empty() {
        for paragraph in select_content(&document, "p") {
            push(paragraph);
        }
    } else {
        for article in articles {
            push(article);
        }
    }

    parts.join(" ")
}

/// Elements matching `css` that are not nested in boilerplate.
fn select_content<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter(|el| {
            !el.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| is_boilerplate(a.value().name()))
        })
        .collect()
}

fn is_boilerplate(tag: &str) -> bool {
    BOILERPLATE_TAGS.contains(&tag)
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !is_boilerplate(child_el.value().name()) {
                collect_text(child_el, out);
            }
        }
    }
}
