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

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::analysis::types::QueryObservation;
use crate::config::SearchApiConfig;
use crate::sources::dedup::DedupAccumulator;
use crate::sources::error::{SourceError, SourceResult};

const TOKEN_ENV: &str = "SEARCH_API_TOKEN";

/// Client for a Search-Console-compatible analytics API.
///
/// Long date ranges are fetched as tiling windows so a busy property
/// cannot exhaust the row budget on its most recent days; rows are merged
/// first-wins by (keyword, url).
pub struct SearchAnalyticsClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    row_limit: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    start_date: String,
    end_date: String,
    dimensions: [&'static str; 2],
    row_limit: usize,
    start_row: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<AnalyticsRow>,
}

#[derive(Debug, Deserialize)]
struct AnalyticsRow {
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    clicks: f64,
    #[serde(default)]
    impressions: f64,
    #[serde(default)]
    ctr: f64,
    #[serde(default)]
    position: f64,
}

/// One property the token can query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    #[serde(default)]
    pub permission_level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteListResponse {
    #[serde(default)]
    site_entry: Vec<SiteEntry>,
}

impl SearchAnalyticsClient {
    /// Token comes from the environment, never from config files.
    pub fn new(config: &SearchApiConfig) -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .with_context(|| format!("{} environment variable not set", TOKEN_ENV))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token,
            row_limit: config.row_limit.max(1),
        })
    }

    /// Fetch up to `max_rows` distinct (keyword, url) observations for a
    /// site over an inclusive date range. `chunk_days: None` issues a
    /// single query for the whole range.
    pub async fn fetch_observations(
        &self,
        site: &str,
        start: NaiveDate,
        end: NaiveDate,
        max_rows: usize,
        chunk_days: Option<u32>,
    ) -> SourceResult<Vec<QueryObservation>> {
        let windows = date_windows(start, end, chunk_days);
        let budget = per_window_budget(max_rows, windows.len());
        info!(
            site,
            windows = windows.len(),
            window_budget = budget,
            "Fetching search analytics"
        );

        let mut accumulator: DedupAccumulator<(String, String), QueryObservation> =
            DedupAccumulator::new(max_rows);
        for (window_start, window_end) in windows {
            if accumulator.is_full() {
                debug!("Row budget exhausted, skipping remaining windows");
                break;
            }
            let rows = self
                .fetch_window(site, window_start, window_end, budget)
                .await?;
            for row in rows {
                let Some(observation) = convert_row(row) else {
                    continue;
                };
                accumulator.insert(
                    (observation.keyword.clone(), observation.url.clone()),
                    observation,
                );
            }
        }

        info!(rows = accumulator.len(), "Fetched search analytics rows");
        Ok(accumulator.into_items())
    }

    /// Pull one date window, paging by `startRow` until a short page or
    /// the window budget.
    async fn fetch_window(
        &self,
        site: &str,
        start: NaiveDate,
        end: NaiveDate,
        budget: usize,
    ) -> SourceResult<Vec<AnalyticsRow>> {
        let url = self.query_url(site)?;
        let mut rows: Vec<AnalyticsRow> = Vec::new();

        while rows.len() < budget {
            let limit = self.row_limit.min(budget - rows.len());
            let request = QueryRequest {
                start_date: start.format("%Y-%m-%d").to_string(),
                end_date: end.format("%Y-%m-%d").to_string(),
                dimensions: ["query", "page"],
                row_limit: limit,
                start_row: rows.len(),
            };

            let response = self
                .client
                .post(url.clone())
                .bearer_auth(&self.token)
                .json(&request)
                .send()
                .await
                .map_err(|e| SourceError::FetchFailed {
                    target: site.to_string(),
                    reason: e.to_string(),
                })?;
            let page = self.decode::<QueryResponse>(response, site).await?.rows;

            debug!(
                window_start = %start,
                window_end = %end,
                page = page.len(),
                fetched = rows.len(),
                "Fetched analytics page"
            );

            let short_page = page.len() < limit;
            rows.extend(page);
            if short_page {
                break;
            }
        }

        Ok(rows)
    }

    /// List the properties the token can access.
    pub async fn list_sites(&self) -> SourceResult<Vec<SiteEntry>> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| self.bad_endpoint())?
            .push("sites");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SourceError::FetchFailed {
                target: "sites".to_string(),
                reason: e.to_string(),
            })?;
        let listing: SiteListResponse = self.decode(response, "sites").await?;

        Ok(listing.site_entry)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        resource: &str,
    ) -> SourceResult<T> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(SourceError::AuthorizationDenied {
                resource: resource.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::FetchFailed {
                target: resource.to_string(),
                reason: format!("HTTP {}", status),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::InvalidFormat(e.to_string()))
    }

    fn query_url(&self, site: &str) -> SourceResult<Url> {
        let mut url = self.base_url()?;
        // The site is one percent-encoded path segment, slashes included
        url.path_segments_mut()
            .map_err(|_| self.bad_endpoint())?
            .extend(["sites", site, "searchAnalytics", "query"]);
        Ok(url)
    }

    fn base_url(&self) -> SourceResult<Url> {
        Url::parse(&self.endpoint).map_err(|e| SourceError::FetchFailed {
            target: self.endpoint.clone(),
            reason: e.to_string(),
        })
    }

    fn bad_endpoint(&self) -> SourceError {
        SourceError::FetchFailed {
            target: self.endpoint.clone(),
            reason: "endpoint URL cannot hold path segments".to_string(),
        }
    }
}

/// Split an inclusive date range into tiling windows of at most
/// `chunk_days` days. Ranges no longer than one chunk stay whole.
fn date_windows(
    start: NaiveDate,
    end: NaiveDate,
    chunk_days: Option<u32>,
) -> Vec<(NaiveDate, NaiveDate)> {
    let Some(chunk) = chunk_days.filter(|c| *c > 0) else {
        return vec![(start, end)];
    };
    // Inclusive day count: Jan 1 through Jan 7 is seven days, one chunk
    if (end - start).num_days() + 1 <= i64::from(chunk) {
        return vec![(start, end)];
    }

    let mut windows = Vec::new();
    let mut current = start;
    loop {
        let window_end = (current + Duration::days(i64::from(chunk) - 1)).min(end);
        windows.push((current, window_end));
        if window_end >= end {
            break;
        }
        current = window_end + Duration::days(1);
    }
    windows
}

/// Every window gets an equal share of the row budget, but never less
/// than 1000 rows, so thin windows still surface long-tail keywords.
fn per_window_budget(max_rows: usize, window_count: usize) -> usize {
    (max_rows / window_count.max(1)).max(1000)
}

fn convert_row(row: AnalyticsRow) -> Option<QueryObservation> {
    let mut keys = row.keys.into_iter();
    let keyword = keys.next()?;
    let url = keys.next()?;
    if keyword.is_empty() || url.is_empty() {
        return None;
    }

    Some(QueryObservation {
        keyword,
        url,
        clicks: row.clicks.max(0.0) as u64,
        impressions: row.impressions.max(0.0) as u64,
        ctr: row.ctr as f32,
        position: row.position as f32,
    })
}
