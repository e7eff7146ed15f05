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

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analysis::grouping;
use crate::analysis::risk;
use crate::analysis::similarity;
use crate::analysis::types::{
    AnalysisOptions, AnalysisResult, KeywordGroup, PageContent, QueryObservation, UrlPair,
};
use crate::embedding::TextEmbedder;

/// Runs the full cannibalization pipeline: grouping, one embedding batch
/// over the grouped pages, pairwise similarity and risk classification.
///
/// The embedder is injected so callers can run URL-only analysis (pass
/// `None`) and tests can supply deterministic vectors. Embeddings are
/// memoized per call only; nothing is cached across calls, so changed
/// content never leaks into a later analysis.
pub struct CannibalizationAnalyzer {
    embedder: Option<Arc<dyn TextEmbedder>>,
}

impl CannibalizationAnalyzer {
    pub fn new(embedder: Option<Arc<dyn TextEmbedder>>) -> Self {
        Self { embedder }
    }

    /// Analyze observations, optionally against a page content map.
    pub async fn analyze(
        &self,
        observations: &[QueryObservation],
        options: &AnalysisOptions,
        content: Option<&HashMap<String, PageContent>>,
    ) -> Result<AnalysisResult> {
        if let Err(reason) = options.validate() {
            anyhow::bail!("Invalid analysis options: {}", reason);
        }

        let mode = options.mode();
        info!(
            observations = observations.len(),
            mode = %mode,
            threshold = options.similarity_threshold,
            content = content.map(|c| c.len()).unwrap_or(0),
            "Starting cannibalization analysis"
        );

        let outcome = grouping::group_observations(observations, options);
        info!(
            total_keywords = outcome.total_keywords,
            analyzed = outcome.groups.len(),
            "Grouped observations"
        );

        let embeddings = self.embed_group_pages(&outcome.groups, content).await?;

        let mut groups = outcome.groups;
        let mut cannibalized_keywords = 0;
        for group in &mut groups {
            group.pairs = score_pairs(group, &embeddings, options.similarity_threshold);
            group.cannibalized = group
                .pairs
                .iter()
                .any(|pair| pair.combined_similarity >= options.similarity_threshold);
            if group.cannibalized {
                cannibalized_keywords += 1;
            }
        }

        info!(
            analyzed = groups.len(),
            cannibalized = cannibalized_keywords,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            total_keywords: outcome.total_keywords,
            analyzed_keywords: groups.len(),
            cannibalized_keywords,
            similarity_threshold: options.similarity_threshold,
            mode,
            groups,
        })
    }

    /// Embed every distinct grouped URL with usable content in one batch.
    /// Each URL is embedded at most once per call, however many groups and
    /// pairs reference it.
    async fn embed_group_pages(
        &self,
        groups: &[KeywordGroup],
        content: Option<&HashMap<String, PageContent>>,
    ) -> Result<HashMap<String, Vec<f32>>> {
        let Some(content) = content else {
            return Ok(HashMap::new());
        };
        if content.is_empty() {
            return Ok(HashMap::new());
        }
        let Some(embedder) = &self.embedder else {
            warn!("Page content supplied without an embedding provider, using URL similarity only");
            return Ok(HashMap::new());
        };

        let mut seen: HashSet<&str> = HashSet::new();
        let mut urls: Vec<String> = Vec::new();
        let mut texts: Vec<String> = Vec::new();
        for group in groups {
            for entry in &group.urls {
                if !seen.insert(entry.url.as_str()) {
                    continue;
                }
                let Some(page) = content.get(&entry.url) else {
                    continue;
                };
                let text = similarity::prepare_embedding_text(page);
                if text.is_empty() {
                    debug!(url = %entry.url, "Page has no usable content, skipping embedding");
                    continue;
                }
                urls.push(entry.url.clone());
                texts.push(text);
            }
        }

        if texts.is_empty() {
            info!("No usable page content found, using URL similarity only");
            return Ok(HashMap::new());
        }

        info!(pages = texts.len(), "Generating content embeddings");
        let vectors = embedder.embed_batch(texts).await?;
        if vectors.len() != urls.len() {
            anyhow::bail!(
                "Embedding batch returned {} vectors for {} pages",
                vectors.len(),
                urls.len()
            );
        }

        Ok(urls.into_iter().zip(vectors).collect())
    }
}

/// Score every unordered URL pair in a group. Content similarity fully
/// overrides the URL score when both ends have an embedding; the URL
/// score is still reported in the breakdown.
fn score_pairs(
    group: &KeywordGroup,
    embeddings: &HashMap<String, Vec<f32>>,
    threshold: f32,
) -> Vec<UrlPair> {
    let urls = &group.urls;
    let mut pairs = Vec::with_capacity(urls.len() * (urls.len() - 1) / 2);

    for i in 0..urls.len() {
        for j in (i + 1)..urls.len() {
            let url_a = &urls[i].url;
            let url_b = &urls[j].url;

            let url_score = similarity::url_similarity(url_a, url_b);
            let content_score = match (embeddings.get(url_a), embeddings.get(url_b)) {
                (Some(a), Some(b)) => Some(similarity::cosine_similarity(a, b)),
                _ => None,
            };
            let combined = content_score.unwrap_or(url_score);

            pairs.push(UrlPair {
                url_a: url_a.clone(),
                url_b: url_b.clone(),
                url_similarity: url_score,
                content_similarity: content_score,
                combined_similarity: combined,
                risk: risk::classify(combined, threshold),
            });
        }
    }

    pairs
}
