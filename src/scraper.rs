// Copyright 2026 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::analysis::types::PageContent;
use crate::config::ScraperConfig;

/// Pages that scraped cleanly plus per-URL failure notes. One bad page
/// never fails the batch.
pub struct ScrapeResult {
    pub pages: HashMap<String, PageContent>,
    pub errors: HashMap<String, String>,
}

pub struct PageScraper {
    client: reqwest::Client,
    max_concurrent: usize,
}

impl PageScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            max_concurrent: config.max_concurrent.max(1),
        })
    }

    /// Fetch each distinct URL with bounded concurrency. Fragment URLs
    /// are skipped up front since they rank the same document.
    pub async fn scrape_all(&self, urls: &[String]) -> ScrapeResult {
        let mut seen: HashSet<&str> = HashSet::new();
        let targets: Vec<&String> = urls
            .iter()
            .filter(|url| !url.contains('#') && seen.insert(url.as_str()))
            .collect();

        info!(pages = targets.len(), "Scraping pages");

        let outcomes: Vec<(String, Result<PageContent>)> =
            stream::iter(targets.into_iter().map(|url| async move {
                (url.clone(), self.fetch_page(url).await)
            }))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut result = ScrapeResult {
            pages: HashMap::new(),
            errors: HashMap::new(),
        };
        for (url, outcome) in outcomes {
            match outcome {
                Ok(page) => {
                    result.pages.insert(url, page);
                }
                Err(e) => {
                    warn!(url = url.as_str(), error = %e, "Failed to scrape page");
                    result.errors.insert(url, e.to_string());
                }
            }
        }

        info!(
            scraped = result.pages.len(),
            failed = result.errors.len(),
            "Scrape complete"
        );
        result
    }

    async fn fetch_page(&self, url: &str) -> Result<PageContent> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }
        let html = response.text().await?;
        Ok(extract_content(&html))
    }
}

/// Pull the ranking-relevant fields out of an HTML document.
pub fn extract_content(html: &str) -> PageContent {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").unwrap();
    let meta_selector = Selector::parse("meta[name=\"description\"]").unwrap();
    let h1_selector = Selector::parse("h1").unwrap();
    let h2_selector = Selector::parse("h2").unwrap();

    let title = document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let meta_description = document
        .select(&meta_selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|value| value.trim().to_string())
        .unwrap_or_default();

    PageContent {
        title,
        meta_description,
        h1: heading_texts(&document, &h1_selector),
        h2: heading_texts(&document, &h2_selector),
    }
}

fn heading_texts(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}
