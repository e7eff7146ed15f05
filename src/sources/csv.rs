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
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::analysis::grouping::coerce_count_pair;
use crate::analysis::types::{PageContent, QueryObservation};
use crate::sources::error::{SourceError, SourceResult};

/// Delimiters tried in order. The first one whose header row carries a
/// recognized column scheme wins, so a semicolon export never gets
/// misread as one wide comma column.
const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Accepted (keyword, url) header pairs: our native names and the
/// search-console export names.
const OBSERVATION_SCHEMES: [(&str, &str); 2] = [("keyword", "url"), ("query", "page")];

struct ObservationColumns {
    keyword: usize,
    url: usize,
    position: usize,
    clicks: Option<usize>,
    impressions: Option<usize>,
    ctr: Option<usize>,
}

struct ContentColumns {
    url: usize,
    title: Option<usize>,
    meta_description: Option<usize>,
    h1: Option<usize>,
    h2: Option<usize>,
}

/// Read ranking observations from a delimited file.
pub fn read_observations(path: &Path) -> SourceResult<Vec<QueryObservation>> {
    let data = fs::read_to_string(path).map_err(|e| SourceError::FetchFailed {
        target: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_observations(&data)
}

/// Parse ranking observations from delimited text.
///
/// Header names are matched case-insensitively after trimming. Rows
/// missing a keyword or URL are skipped; count fields go through the
/// same lenient coercion the analytics client applies.
pub fn parse_observations(data: &str) -> SourceResult<Vec<QueryObservation>> {
    let data = strip_bom(data);
    let Some((delimiter, columns)) = detect_observation_layout(data) else {
        return Err(SourceError::InvalidFormat(format!(
            "missing required columns: {}",
            closest_missing_columns(data).join(", ")
        )));
    };

    let mut observations = Vec::new();
    let mut reader = reader_for(data, delimiter);
    for record in reader.records() {
        let record = record.map_err(|e| SourceError::InvalidFormat(e.to_string()))?;

        let keyword = record.get(columns.keyword).unwrap_or("").trim();
        let url = record.get(columns.url).unwrap_or("").trim();
        if keyword.is_empty() || url.is_empty() {
            debug!("Skipping row without keyword or URL");
            continue;
        }

        let (clicks, impressions) = coerce_count_pair(
            field(&record, columns.clicks),
            field(&record, columns.impressions),
        );

        observations.push(QueryObservation {
            keyword: keyword.to_string(),
            url: url.to_string(),
            clicks,
            impressions,
            ctr: parse_ctr(field(&record, columns.ctr)),
            position: field(&record, Some(columns.position))
                .parse::<f32>()
                .unwrap_or(0.0),
        });
    }

    debug!(rows = observations.len(), "Parsed observation file");
    Ok(observations)
}

/// Read a URL -> page content map from a delimited file.
pub fn read_content(path: &Path) -> SourceResult<HashMap<String, PageContent>> {
    let data = fs::read_to_string(path).map_err(|e| SourceError::FetchFailed {
        target: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_content(&data)
}

/// Parse page content from delimited text.
///
/// Needs a `url` column plus either named columns (`title`,
/// `meta_description`, `h1`, `h2`) or positional `content*` columns in
/// that same order. Heading cells hold `|`-separated lists. A later row
/// for the same URL replaces the earlier one.
pub fn parse_content(data: &str) -> SourceResult<HashMap<String, PageContent>> {
    let data = strip_bom(data);
    let Some((delimiter, columns)) = detect_content_layout(data) else {
        return Err(SourceError::InvalidFormat(
            "content file needs a url column plus title/meta_description/h1/h2 \
             or content* columns"
                .to_string(),
        ));
    };

    let mut pages = HashMap::new();
    let mut reader = reader_for(data, delimiter);
    for record in reader.records() {
        let record = record.map_err(|e| SourceError::InvalidFormat(e.to_string()))?;

        let url = record.get(columns.url).unwrap_or("").trim();
        if url.is_empty() {
            debug!("Skipping content row without URL");
            continue;
        }

        pages.insert(
            url.to_string(),
            PageContent {
                title: field(&record, columns.title).trim().to_string(),
                meta_description: field(&record, columns.meta_description).trim().to_string(),
                h1: split_headings(field(&record, columns.h1)),
                h2: split_headings(field(&record, columns.h2)),
            },
        );
    }

    debug!(pages = pages.len(), "Parsed content file");
    Ok(pages)
}

fn reader_for(data: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data.as_bytes())
}

fn strip_bom(data: &str) -> &str {
    data.strip_prefix('\u{feff}').unwrap_or(data)
}

fn field<'r>(record: &'r csv::StringRecord, index: Option<usize>) -> &'r str {
    index.and_then(|i| record.get(i)).unwrap_or("")
}

fn normalized_headers(data: &str, delimiter: u8) -> Option<Vec<String>> {
    let mut reader = reader_for(data, delimiter);
    let headers = reader.headers().ok()?;
    Some(
        headers
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect(),
    )
}

fn detect_observation_layout(data: &str) -> Option<(u8, ObservationColumns)> {
    for delimiter in DELIMITERS {
        let Some(headers) = normalized_headers(data, delimiter) else {
            continue;
        };
        let find = |name: &str| headers.iter().position(|h| h == name);

        for (keyword_name, url_name) in OBSERVATION_SCHEMES {
            let (Some(keyword), Some(url), Some(position)) =
                (find(keyword_name), find(url_name), find("position"))
            else {
                continue;
            };
            return Some((
                delimiter,
                ObservationColumns {
                    keyword,
                    url,
                    position,
                    clicks: find("clicks"),
                    impressions: find("impressions"),
                    ctr: find("ctr"),
                },
            ));
        }
    }
    None
}

/// Best-effort diagnosis for the InvalidFormat message: the smallest set
/// of required columns still missing across every delimiter and scheme.
fn closest_missing_columns(data: &str) -> Vec<String> {
    let mut best: Option<Vec<String>> = None;
    for delimiter in DELIMITERS {
        let Some(headers) = normalized_headers(data, delimiter) else {
            continue;
        };
        for (keyword_name, url_name) in OBSERVATION_SCHEMES {
            let missing: Vec<String> = [keyword_name, url_name, "position"]
                .into_iter()
                .filter(|name| !headers.iter().any(|h| h == name))
                .map(String::from)
                .collect();
            if best.as_ref().map(|b| missing.len() < b.len()).unwrap_or(true) {
                best = Some(missing);
            }
        }
    }
    best.unwrap_or_else(|| vec!["keyword".to_string(), "url".to_string(), "position".to_string()])
}

fn detect_content_layout(data: &str) -> Option<(u8, ContentColumns)> {
    for delimiter in DELIMITERS {
        let Some(headers) = normalized_headers(data, delimiter) else {
            continue;
        };
        let find = |name: &str| headers.iter().position(|h| h == name);
        let Some(url) = find("url") else {
            continue;
        };

        let named = ContentColumns {
            url,
            title: find("title"),
            meta_description: find("meta_description"),
            h1: find("h1"),
            h2: find("h2"),
        };
        if named.title.is_some()
            || named.meta_description.is_some()
            || named.h1.is_some()
            || named.h2.is_some()
        {
            return Some((delimiter, named));
        }

        // Fall back to anonymous content columns in conventional order
        let positional: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.starts_with("content"))
            .map(|(i, _)| i)
            .collect();
        if !positional.is_empty() {
            return Some((
                delimiter,
                ContentColumns {
                    url,
                    title: positional.first().copied(),
                    meta_description: positional.get(1).copied(),
                    h1: positional.get(2).copied(),
                    h2: positional.get(3).copied(),
                },
            ));
        }
    }
    None
}

/// CTR cells appear both as export percentages (`3.4%`) and plain
/// fractions (`0.034`).
fn parse_ctr(raw: &str) -> f32 {
    let trimmed = raw.trim();
    match trimmed.strip_suffix('%') {
        Some(percent) => percent
            .trim()
            .parse::<f32>()
            .map(|v| v / 100.0)
            .unwrap_or(0.0),
        None => trimmed.parse::<f32>().unwrap_or(0.0),
    }
}

fn split_headings(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}
