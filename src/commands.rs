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

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::warn;

use crate::analysis::engine::CannibalizationAnalyzer;
use crate::analysis::formatting;
use crate::analysis::report;
use crate::analysis::types::{AnalysisOptions, PageContent, QueryObservation};
use crate::cli::{AnalyzeCommand, Commands};
use crate::config::Config;
use crate::embedding::{ProviderEmbedder, TextEmbedder};
use crate::scraper::PageScraper;
use crate::sources::csv;
use crate::sources::search_api::SearchAnalyticsClient;

pub async fn execute(config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Analyze { command } => match command {
            AnalyzeCommand::Csv {
                file,
                content_file,
                scrape,
                threshold,
                primary_only,
                min_clicks,
                min_impressions,
                no_report,
                format,
            } => {
                let observations = csv::read_observations(&file)?;
                let content =
                    load_csv_content(config, content_file.as_deref(), scrape, &observations)
                        .await?;
                let options =
                    build_options(config, threshold, primary_only, min_clicks, min_impressions);
                run_analysis(config, observations, content, options, no_report, &format).await
            }
            AnalyzeCommand::Search {
                site,
                start_date,
                end_date,
                max_rows,
                chunk_days,
                no_date_chunks,
                scrape,
                threshold,
                primary_only,
                min_clicks,
                min_impressions,
                no_report,
                format,
            } => {
                let start = parse_date(&start_date)?;
                let end = parse_date(&end_date)?;
                anyhow::ensure!(
                    start <= end,
                    "start date {} is after end date {}",
                    start,
                    end
                );

                let client = SearchAnalyticsClient::new(&config.search_api)?;
                let observations = client
                    .fetch_observations(
                        &site,
                        start,
                        end,
                        max_rows.unwrap_or(config.search_api.max_rows),
                        effective_chunk_days(config, chunk_days, no_date_chunks),
                    )
                    .await?;

                let content = if scrape {
                    Some(scrape_content(config, &observations).await?)
                } else {
                    None
                };
                let options =
                    build_options(config, threshold, primary_only, min_clicks, min_impressions);
                run_analysis(config, observations, content, options, no_report, &format).await
            }
        },
        Commands::Sites { format } => list_sites(config, &format).await,
    }
}

async fn run_analysis(
    config: &Config,
    observations: Vec<QueryObservation>,
    content: Option<HashMap<String, PageContent>>,
    options: AnalysisOptions,
    no_report: bool,
    format: &str,
) -> Result<()> {
    // The provider is only wired up when there is content to embed, so
    // URL-only runs never need embedding credentials
    let embedder: Option<Arc<dyn TextEmbedder>> = match &content {
        Some(pages) if !pages.is_empty() => {
            Some(Arc::new(ProviderEmbedder::from_config(config).await?))
        }
        _ => None,
    };

    let analyzer = CannibalizationAnalyzer::new(embedder);
    let result = analyzer
        .analyze(&observations, &options, content.as_ref())
        .await?;

    if no_report {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let report = report::build(&result);
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print!("{}", formatting::format_report(&report)),
    }
    Ok(())
}

async fn load_csv_content(
    config: &Config,
    content_file: Option<&Path>,
    scrape: bool,
    observations: &[QueryObservation],
) -> Result<Option<HashMap<String, PageContent>>> {
    if let Some(path) = content_file {
        if scrape {
            warn!("Both --content-file and --scrape given, using the file");
        }
        return Ok(Some(csv::read_content(path)?));
    }
    if scrape {
        return Ok(Some(scrape_content(config, observations).await?));
    }
    Ok(None)
}

async fn scrape_content(
    config: &Config,
    observations: &[QueryObservation],
) -> Result<HashMap<String, PageContent>> {
    let urls: Vec<String> = observations.iter().map(|obs| obs.url.clone()).collect();
    let scraper = PageScraper::new(&config.scraper)?;
    Ok(scraper.scrape_all(&urls).await.pages)
}

async fn list_sites(config: &Config, format: &str) -> Result<()> {
    let client = SearchAnalyticsClient::new(&config.search_api)?;
    let sites = client.list_sites().await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&sites)?),
        _ => print!("{}", formatting::format_site_list(&sites)),
    }
    Ok(())
}

fn build_options(
    config: &Config,
    threshold: Option<f32>,
    primary_only: bool,
    min_clicks: Option<u64>,
    min_impressions: Option<u64>,
) -> AnalysisOptions {
    AnalysisOptions {
        similarity_threshold: threshold.unwrap_or(config.analysis.similarity_threshold),
        primary_keyword_only: primary_only,
        min_clicks: min_clicks.unwrap_or(config.analysis.min_clicks),
        min_impressions: min_impressions.unwrap_or(config.analysis.min_impressions),
    }
}

fn effective_chunk_days(
    config: &Config,
    chunk_days: Option<u32>,
    no_date_chunks: bool,
) -> Option<u32> {
    if no_date_chunks {
        None
    } else {
        Some(chunk_days.unwrap_or(config.search_api.chunk_days))
    }
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", text))
}
