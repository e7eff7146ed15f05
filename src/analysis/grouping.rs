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

use tracing::debug;

use crate::analysis::types::{AnalysisOptions, GroupUrl, KeywordGroup, QueryObservation};

/// Groups that survived filtering, plus the total key count before the
/// two-URL cutoff. Group order is first-seen order of the grouping key,
/// so the same input always yields the same output.
#[derive(Debug)]
pub struct GroupingOutcome {
    pub groups: Vec<KeywordGroup>,
    pub total_keywords: usize,
}

/// Filter observations and group them by exact or primary keyword.
///
/// Fragment URLs (`#`) are duplicates of their base page and are dropped,
/// as are rows under the click/impression floors. Only groups with at
/// least two distinct URLs are emitted; every distinct key still counts
/// toward `total_keywords`.
pub fn group_observations(
    observations: &[QueryObservation],
    options: &AnalysisOptions,
) -> GroupingOutcome {
    let filtered: Vec<&QueryObservation> = observations
        .iter()
        .filter(|obs| {
            if obs.url.contains('#') {
                debug!(url = %obs.url, "Dropping fragment URL");
                return false;
            }
            obs.clicks >= options.min_clicks && obs.impressions >= options.min_impressions
        })
        .collect();

    debug!(
        kept = filtered.len(),
        dropped = observations.len() - filtered.len(),
        "Filtered observations"
    );

    if options.primary_keyword_only {
        group_by_primary_keyword(&filtered)
    } else {
        group_by_exact_keyword(&filtered)
    }
}

/// Group by literal keyword string. Within a group each URL appears once,
/// keeping the entry with the best (lowest) position.
fn group_by_exact_keyword(observations: &[&QueryObservation]) -> GroupingOutcome {
    let mut order: Vec<&str> = Vec::new();
    let mut buckets: HashMap<&str, Vec<&QueryObservation>> = HashMap::new();

    for obs in observations {
        let bucket = buckets.entry(obs.keyword.as_str()).or_insert_with(|| {
            order.push(obs.keyword.as_str());
            Vec::new()
        });
        bucket.push(obs);
    }

    let total_keywords = order.len();
    let groups = order
        .into_iter()
        .filter_map(|keyword| {
            let entries = dedup_by_url(&buckets[keyword]);
            build_group(keyword, entries)
        })
        .collect();

    GroupingOutcome {
        groups,
        total_keywords,
    }
}

/// Group URLs by their primary keyword: for each URL, the observation with
/// the most clicks, ties broken by impressions, full ties by first seen.
fn group_by_primary_keyword(observations: &[&QueryObservation]) -> GroupingOutcome {
    let mut url_order: Vec<&str> = Vec::new();
    let mut primary: HashMap<&str, &QueryObservation> = HashMap::new();

    for obs in observations {
        match primary.get_mut(obs.url.as_str()) {
            Some(current) => {
                if obs.clicks > current.clicks
                    || (obs.clicks == current.clicks && obs.impressions > current.impressions)
                {
                    *current = obs;
                }
            }
            None => {
                url_order.push(obs.url.as_str());
                primary.insert(obs.url.as_str(), obs);
            }
        }
    }

    let mut keyword_order: Vec<&str> = Vec::new();
    let mut buckets: HashMap<&str, Vec<&QueryObservation>> = HashMap::new();
    for url in url_order {
        let obs = primary[url];
        let bucket = buckets.entry(obs.keyword.as_str()).or_insert_with(|| {
            keyword_order.push(obs.keyword.as_str());
            Vec::new()
        });
        bucket.push(obs);
    }

    let total_keywords = keyword_order.len();
    let groups = keyword_order
        .into_iter()
        .filter_map(|keyword| build_group(keyword, buckets[keyword].clone()))
        .collect();

    GroupingOutcome {
        groups,
        total_keywords,
    }
}

/// Keep one entry per URL, preferring the lowest position, preserving the
/// order in which URLs were first seen.
fn dedup_by_url<'a>(entries: &[&'a QueryObservation]) -> Vec<&'a QueryObservation> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut kept: Vec<&'a QueryObservation> = Vec::new();

    for obs in entries {
        match index.get(obs.url.as_str()) {
            Some(&at) => {
                if obs.position < kept[at].position {
                    kept[at] = obs;
                }
            }
            None => {
                index.insert(obs.url.as_str(), kept.len());
                kept.push(obs);
            }
        }
    }

    kept
}

/// Sort members by ascending position (best ranking first) and emit the
/// group when it has at least two distinct URLs.
fn build_group(keyword: &str, mut entries: Vec<&QueryObservation>) -> Option<KeywordGroup> {
    if entries.len() < 2 {
        return None;
    }

    entries.sort_by(|a, b| a.position.total_cmp(&b.position));

    let urls = entries
        .into_iter()
        .map(|obs| GroupUrl {
            url: obs.url.clone(),
            position: obs.position,
            clicks: obs.clicks,
            impressions: obs.impressions,
            ctr: obs.ctr,
        })
        .collect();

    Some(KeywordGroup {
        keyword: keyword.to_string(),
        urls,
        pairs: Vec::new(),
        cannibalized: false,
    })
}

/// Parse clicks and impressions as they appear in delimited exports.
/// Thousands-separator spaces (plain or non-breaking) are stripped and
/// fractional values truncated. When either value fails to parse, both
/// fall back to 0 so a broken row never skews click/impression ratios.
pub fn coerce_count_pair(clicks: &str, impressions: &str) -> (u64, u64) {
    match (parse_count(clicks), parse_count(impressions)) {
        (Some(clicks), Some(impressions)) => (clicks, impressions),
        _ => {
            debug!(clicks, impressions, "Unparseable counts, defaulting to 0");
            (0, 0)
        }
    }
}

fn parse_count(raw: &str) -> Option<u64> {
    // A missing value counts as zero; garbage does not.
    if raw.is_empty() {
        return Some(0);
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}'))
        .collect();

    let value = cleaned.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.max(0.0) as u64)
}
