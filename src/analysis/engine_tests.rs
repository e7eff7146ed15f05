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

#[cfg(test)]
mod tests {
    use super::super::engine::CannibalizationAnalyzer;
    use super::super::similarity;
    use super::super::types::{
        AnalysisOptions, PageContent, QueryObservation, RiskLevel,
    };
    use crate::embedding::TextEmbedder;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn obs(
        keyword: &str,
        url: &str,
        clicks: u64,
        impressions: u64,
        position: f32,
    ) -> QueryObservation {
        QueryObservation {
            keyword: keyword.to_string(),
            url: url.to_string(),
            clicks,
            impressions,
            ctr: 0.0,
            position,
        }
    }

    fn page(title: &str) -> PageContent {
        PageContent {
            title: title.to_string(),
            meta_description: format!("{} description", title),
            h1: vec![title.to_string()],
            h2: Vec::new(),
        }
    }

    /// Returns a fixed vector per prepared embedding text.
    struct MapEmbedder {
        vectors: HashMap<String, Vec<f32>>,
    }

    impl MapEmbedder {
        fn for_pages(pages: &[(&PageContent, Vec<f32>)]) -> Arc<Self> {
            let vectors = pages
                .iter()
                .map(|(page, vector)| (similarity::prepare_embedding_text(page), vector.clone()))
                .collect();
            Arc::new(Self { vectors })
        }
    }

    #[async_trait]
    impl TextEmbedder for MapEmbedder {
        async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            texts
                .iter()
                .map(|text| {
                    self.vectors
                        .get(text)
                        .cloned()
                        .ok_or_else(|| anyhow::anyhow!("no vector prepared for: {}", text))
                })
                .collect()
        }
    }

    /// Records batch calls and sizes, returning unit vectors.
    struct CountingEmbedder {
        calls: AtomicUsize,
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl CountingEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                batch_sizes: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextEmbedder for CountingEmbedder {
        async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn options(threshold: f32) -> AnalysisOptions {
        AnalysisOptions {
            similarity_threshold: threshold,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_url_only_analysis_scores_sibling_pages() {
        let observations = vec![
            obs("shoes", "/a", 10, 100, 3.0),
            obs("shoes", "/b", 5, 50, 5.0),
        ];
        let analyzer = CannibalizationAnalyzer::new(None);
        let result = analyzer
            .analyze(&observations, &options(0.8), None)
            .await
            .unwrap();

        assert_eq!(result.total_keywords, 1);
        assert_eq!(result.analyzed_keywords, 1);
        assert_eq!(result.cannibalized_keywords, 0);
        assert_eq!(result.groups.len(), 1);

        let group = &result.groups[0];
        assert_eq!(group.keyword, "shoes");
        assert_eq!(group.url_count(), 2);
        assert!(!group.cannibalized);
        assert_eq!(group.pairs.len(), 1);

        // Segments {"", "a"} vs {"", "b"}: one shared of three total
        let pair = &group.pairs[0];
        assert!((pair.url_similarity - 1.0 / 3.0).abs() < 1e-6);
        assert!(pair.content_similarity.is_none());
        assert!((pair.combined_similarity - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(pair.risk, RiskLevel::None);
    }

    #[tokio::test]
    async fn test_identical_content_flags_high_risk() {
        let observations = vec![
            obs("shoes", "/a", 10, 100, 3.0),
            obs("shoes", "/b", 5, 50, 5.0),
        ];
        let shared = page("Best running shoes");
        let content: HashMap<String, PageContent> = [
            ("/a".to_string(), shared.clone()),
            ("/b".to_string(), shared.clone()),
        ]
        .into();
        let embedder = MapEmbedder::for_pages(&[(&shared, vec![0.6, 0.8])]);

        let analyzer = CannibalizationAnalyzer::new(Some(embedder));
        let result = analyzer
            .analyze(&observations, &options(0.8), Some(&content))
            .await
            .unwrap();

        assert_eq!(result.cannibalized_keywords, 1);
        let group = &result.groups[0];
        assert!(group.cannibalized);

        let pair = &group.pairs[0];
        assert!((pair.content_similarity.unwrap() - 1.0).abs() < 1e-6);
        assert!((pair.combined_similarity - 1.0).abs() < 1e-6);
        assert_eq!(pair.risk, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_click_floor_can_empty_the_analysis() {
        let observations = vec![
            obs("shoes", "/a", 10, 100, 3.0),
            obs("shoes", "/b", 5, 50, 5.0),
        ];
        let opts = AnalysisOptions {
            min_clicks: 6,
            ..Default::default()
        };
        let analyzer = CannibalizationAnalyzer::new(None);
        let result = analyzer.analyze(&observations, &opts, None).await.unwrap();

        assert_eq!(result.total_keywords, 1);
        assert_eq!(result.analyzed_keywords, 0);
        assert_eq!(result.cannibalized_keywords, 0);
        assert!(result.groups.is_empty());
    }

    #[tokio::test]
    async fn test_content_similarity_overrides_url_similarity() {
        // Near-identical paths, but content says the pages are unrelated
        let observations = vec![
            obs("shoes", "/shop/shoes/a", 10, 100, 3.0),
            obs("shoes", "/shop/shoes/b", 5, 50, 5.0),
        ];
        let page_a = page("Trail runners");
        let page_b = page("Return policy");
        let content: HashMap<String, PageContent> = [
            ("/shop/shoes/a".to_string(), page_a.clone()),
            ("/shop/shoes/b".to_string(), page_b.clone()),
        ]
        .into();
        let embedder =
            MapEmbedder::for_pages(&[(&page_a, vec![1.0, 0.0]), (&page_b, vec![0.0, 1.0])]);

        let analyzer = CannibalizationAnalyzer::new(Some(embedder));
        let result = analyzer
            .analyze(&observations, &options(0.8), Some(&content))
            .await
            .unwrap();

        let pair = &result.groups[0].pairs[0];
        assert!(
            pair.url_similarity > 0.5,
            "paths share most segments: {}",
            pair.url_similarity
        );
        assert_eq!(pair.content_similarity, Some(0.0));
        assert_eq!(
            pair.combined_similarity, 0.0,
            "content score replaces the URL score entirely"
        );
        assert_eq!(pair.risk, RiskLevel::None);
    }

    #[tokio::test]
    async fn test_each_url_embedded_once_across_groups() {
        // Both keywords rank the same two URLs
        let observations = vec![
            obs("shoes", "/a", 10, 100, 3.0),
            obs("shoes", "/b", 5, 50, 5.0),
            obs("boots", "/a", 4, 40, 2.0),
            obs("boots", "/b", 3, 30, 6.0),
        ];
        let content: HashMap<String, PageContent> = [
            ("/a".to_string(), page("Alpha")),
            ("/b".to_string(), page("Beta")),
        ]
        .into();
        let embedder = CountingEmbedder::new();

        let analyzer =
            CannibalizationAnalyzer::new(Some(embedder.clone() as Arc<dyn TextEmbedder>));
        let result = analyzer
            .analyze(&observations, &options(0.8), Some(&content))
            .await
            .unwrap();

        assert_eq!(result.analyzed_keywords, 2);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*embedder.batch_sizes.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_invalid_threshold_rejected() {
        let observations = vec![obs("shoes", "/a", 10, 100, 3.0)];
        let analyzer = CannibalizationAnalyzer::new(None);

        assert!(analyzer
            .analyze(&observations, &options(0.0), None)
            .await
            .is_err());
        assert!(analyzer
            .analyze(&observations, &options(1.0), None)
            .await
            .is_err());
        assert!(analyzer
            .analyze(&observations, &options(1.5), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_content_without_embedder_falls_back_to_urls() {
        let observations = vec![
            obs("shoes", "/a", 10, 100, 3.0),
            obs("shoes", "/b", 5, 50, 5.0),
        ];
        let content: HashMap<String, PageContent> = [
            ("/a".to_string(), page("Alpha")),
            ("/b".to_string(), page("Beta")),
        ]
        .into();

        let analyzer = CannibalizationAnalyzer::new(None);
        let result = analyzer
            .analyze(&observations, &options(0.8), Some(&content))
            .await
            .unwrap();

        let pair = &result.groups[0].pairs[0];
        assert!(pair.content_similarity.is_none());
        assert!((pair.combined_similarity - pair.url_similarity).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_partial_content_degrades_pair_to_url_score() {
        let observations = vec![
            obs("shoes", "/a", 10, 100, 3.0),
            obs("shoes", "/b", 5, 50, 5.0),
        ];
        let page_a = page("Alpha");
        let content: HashMap<String, PageContent> =
            [("/a".to_string(), page_a.clone())].into();
        let embedder = MapEmbedder::for_pages(&[(&page_a, vec![1.0, 0.0])]);

        let analyzer = CannibalizationAnalyzer::new(Some(embedder));
        let result = analyzer
            .analyze(&observations, &options(0.8), Some(&content))
            .await
            .unwrap();

        let pair = &result.groups[0].pairs[0];
        assert!(
            pair.content_similarity.is_none(),
            "one-sided content cannot produce a content score"
        );
        assert!((pair.combined_similarity - pair.url_similarity).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_page_content_never_embedded() {
        let observations = vec![
            obs("shoes", "/a", 10, 100, 3.0),
            obs("shoes", "/b", 5, 50, 5.0),
        ];
        let content: HashMap<String, PageContent> = [
            ("/a".to_string(), PageContent::default()),
            ("/b".to_string(), PageContent::default()),
        ]
        .into();
        let embedder = CountingEmbedder::new();

        let analyzer =
            CannibalizationAnalyzer::new(Some(embedder.clone() as Arc<dyn TextEmbedder>));
        let result = analyzer
            .analyze(&observations, &options(0.8), Some(&content))
            .await
            .unwrap();

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert!(result.groups[0].pairs[0].content_similarity.is_none());
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        struct FailingEmbedder;

        #[async_trait]
        impl TextEmbedder for FailingEmbedder {
            async fn embed_batch(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
                anyhow::bail!("provider unavailable")
            }
        }

        let observations = vec![
            obs("shoes", "/a", 10, 100, 3.0),
            obs("shoes", "/b", 5, 50, 5.0),
        ];
        let content: HashMap<String, PageContent> = [
            ("/a".to_string(), page("Alpha")),
            ("/b".to_string(), page("Beta")),
        ]
        .into();

        let analyzer = CannibalizationAnalyzer::new(Some(Arc::new(FailingEmbedder)));
        let outcome = analyzer
            .analyze(&observations, &options(0.8), Some(&content))
            .await;

        assert!(outcome.is_err());
    }
}
