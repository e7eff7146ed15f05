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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One (keyword, URL) ranking fact as reported by a search analytics export.
/// Immutable once ingested; the analyzer only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryObservation {
    pub keyword: String,
    pub url: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f32,
    pub position: f32,
}

/// Page fields used to build the embedding text for content similarity.
/// Supplied by the scraper or a content file, keyed by URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContent {
    pub title: String,
    pub meta_description: String,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
}

impl PageContent {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.meta_description.is_empty()
            && self.h1.is_empty()
            && self.h2.is_empty()
    }
}

/// Risk bands relative to the similarity threshold.
/// Ordering matters: derives compare by declaration order, None < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::None => write!(f, "none"),
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// How observations are grouped before pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Group by literal keyword string.
    ExactKeyword,
    /// Group URLs by the keyword that earns each URL the most clicks.
    PrimaryKeyword,
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::ExactKeyword => write!(f, "exact_keyword"),
            AnalysisMode::PrimaryKeyword => write!(f, "primary_keyword"),
        }
    }
}

/// Tuning knobs for one analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Similarity at or above which a pair counts as cannibalization.
    pub similarity_threshold: f32,
    /// Use primary-keyword grouping instead of exact keyword strings.
    pub primary_keyword_only: bool,
    /// Drop observations with fewer clicks before grouping.
    pub min_clicks: u64,
    /// Drop observations with fewer impressions before grouping.
    pub min_impressions: u64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            primary_keyword_only: false,
            min_clicks: 0,
            min_impressions: 0,
        }
    }
}

impl AnalysisOptions {
    /// Validate that the threshold leaves room for all four risk bands.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold < 1.0) {
            return Err(format!(
                "similarity_threshold must be in (0.0, 1.0), got {}",
                self.similarity_threshold
            ));
        }
        Ok(())
    }

    pub fn mode(&self) -> AnalysisMode {
        if self.primary_keyword_only {
            AnalysisMode::PrimaryKeyword
        } else {
            AnalysisMode::ExactKeyword
        }
    }
}

/// One URL's best-ranking entry within a keyword group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupUrl {
    pub url: String,
    pub position: f32,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f32,
}

/// Similarity verdict for one unordered URL pair within a group.
///
/// `combined_similarity` equals `content_similarity` whenever that score is
/// present and `url_similarity` otherwise. Content fully overrides the URL
/// signal; both raw scores stay visible so consumers can see the breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlPair {
    pub url_a: String,
    pub url_b: String,
    pub url_similarity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_similarity: Option<f32>,
    pub combined_similarity: f32,
    pub risk: RiskLevel,
}

/// A keyword and the distinct URLs competing for it, with pair verdicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub keyword: String,
    pub urls: Vec<GroupUrl>,
    pub pairs: Vec<UrlPair>,
    pub cannibalized: bool,
}

impl KeywordGroup {
    pub fn url_count(&self) -> usize {
        self.urls.len()
    }
}

/// Aggregate outcome of one analysis call. Contains every analyzed group
/// (two or more URLs), cannibalized or not; the report builder filters
/// further for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Distinct grouping keys seen after filtering, including single-URL ones.
    pub total_keywords: usize,
    /// Groups that had at least two distinct URLs and went through pairing.
    pub analyzed_keywords: usize,
    /// Analyzed groups with at least one pair at or above the threshold.
    pub cannibalized_keywords: usize,
    pub similarity_threshold: f32,
    pub mode: AnalysisMode,
    pub groups: Vec<KeywordGroup>,
}

/// Headline counters carried into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub analyzed_keywords: usize,
    pub cannibalized_keywords: usize,
    pub similarity_threshold: f32,
    pub mode: AnalysisMode,
}

/// Presentation-ready projection of an [`AnalysisResult`]: groups sorted by
/// URL count, pairs filtered to the threshold and sorted by similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannibalizationReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub groups: Vec<KeywordGroup>,
}
