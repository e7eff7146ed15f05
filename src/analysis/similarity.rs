use std::collections::HashSet;

use crate::analysis::types::PageContent;

/// Structural similarity between two URLs: Jaccard index over their
/// `/`-separated segments. Works on the raw string, so scheme and host
/// count as segments and identical prefixes pull the score up.
pub fn url_similarity(url_a: &str, url_b: &str) -> f32 {
    let segments_a: HashSet<&str> = url_a.split('/').collect();
    let segments_b: HashSet<&str> = url_b.split('/').collect();

    let union = segments_a.union(&segments_b).count();
    if union == 0 {
        return 0.0;
    }
    let common = segments_a.intersection(&segments_b).count();

    common as f32 / union as f32
}

/// Build the text fed into the embedding model for one page. Title, meta
/// description and h1 are repeated to weigh them over h2 without touching
/// the model itself. An empty page yields an empty string and is skipped
/// by the embedding batch.
pub fn prepare_embedding_text(page: &PageContent) -> String {
    let h1 = page.h1.join(" ");
    let h2 = page.h2.join(" ");
    format!(
        "{title} {title} {meta} {meta} {h1} {h1} {h2}",
        title = page.title,
        meta = page.meta_description,
        h1 = h1,
        h2 = h2,
    )
    .trim()
    .to_string()
}

/// Cosine similarity between two embedding vectors, clamped to [0, 1].
/// A zero-length vector has no direction and scores 0.0 against anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_similarity_identity() {
        let urls = [
            "/a",
            "https://example.com/blog/post-1",
            "",
            "https://example.com/",
        ];
        for url in urls {
            assert_eq!(
                url_similarity(url, url),
                1.0,
                "identical URLs must score 1.0: {}",
                url
            );
        }
    }

    #[test]
    fn test_url_similarity_sibling_paths() {
        // Segments {"", "a"} vs {"", "b"}: one common out of three total.
        let similarity = url_similarity("/a", "/b");
        assert!(
            (similarity - 1.0 / 3.0).abs() < 1e-6,
            "expected 1/3, got {}",
            similarity
        );
    }

    #[test]
    fn test_url_similarity_shared_prefix_scores_higher() {
        let siblings = url_similarity(
            "https://example.com/blog/shoes-guide",
            "https://example.com/blog/shoes-review",
        );
        let unrelated = url_similarity(
            "https://example.com/blog/shoes-guide",
            "https://example.com/about",
        );
        assert!(
            siblings > unrelated,
            "shared path prefix should raise the score: {} vs {}",
            siblings,
            unrelated
        );
    }

    #[test]
    fn test_url_similarity_is_symmetric() {
        let a = "https://example.com/a/b";
        let b = "https://example.com/a/c";
        assert_eq!(url_similarity(a, b), url_similarity(b, a));
    }

    #[test]
    fn test_prepare_embedding_text_weighting() {
        let page = PageContent {
            title: "Shoes".to_string(),
            meta_description: "Best shoes".to_string(),
            h1: vec!["Running".to_string(), "Trail".to_string()],
            h2: vec!["Sizing".to_string()],
        };
        let text = prepare_embedding_text(&page);
        assert_eq!(
            text,
            "Shoes Shoes Best shoes Best shoes Running Trail Running Trail Sizing"
        );
    }

    #[test]
    fn test_prepare_embedding_text_empty_page() {
        assert_eq!(prepare_embedding_text(&PageContent::default()), "");
    }

    #[test]
    fn test_prepare_embedding_text_partial_page() {
        let page = PageContent {
            title: "Only title".to_string(),
            ..Default::default()
        };
        let text = prepare_embedding_text(&page);
        assert!(text.starts_with("Only title"));
        assert!(!text.is_empty());
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let v = vec![0.5, -0.2, 0.8];
        let similarity = cosine_similarity(&v, &v);
        assert!(
            (similarity - 1.0).abs() < 1e-6,
            "identical vectors must score 1.0, got {}",
            similarity
        );
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_zero_vector_guard() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_clamps_negative() {
        // Opposed vectors have cosine -1; scores stay within [0, 1].
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
    }
}
