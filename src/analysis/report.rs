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

use chrono::Utc;

use crate::analysis::types::{AnalysisResult, CannibalizationReport, ReportSummary};

/// Shape an analysis result for presentation. Groups are ordered by URL
/// count (largest first), and each group keeps only the pairs at or above
/// the threshold, strongest first. Pure reordering and filtering; no
/// similarity is recomputed here.
pub fn build(result: &AnalysisResult) -> CannibalizationReport {
    let threshold = result.similarity_threshold;

    let mut groups = result.groups.clone();
    for group in &mut groups {
        group
            .pairs
            .retain(|pair| pair.combined_similarity >= threshold);
        group
            .pairs
            .sort_by(|a, b| b.combined_similarity.total_cmp(&a.combined_similarity));
    }
    groups.sort_by(|a, b| b.urls.len().cmp(&a.urls.len()));

    CannibalizationReport {
        generated_at: Utc::now(),
        summary: ReportSummary {
            analyzed_keywords: result.analyzed_keywords,
            cannibalized_keywords: result.cannibalized_keywords,
            similarity_threshold: threshold,
            mode: result.mode,
        },
        groups,
    }
}
