use colored::Colorize;

use crate::analysis::types::{CannibalizationReport, RiskLevel};
use crate::sources::search_api::SiteEntry;

pub fn format_report(report: &CannibalizationReport) -> String {
    let mut output = String::new();

    // Summary header
    output.push_str(&"Keyword Cannibalization Report".bold().to_string());
    output.push('\n');
    output.push_str(&format!(
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push('\n');
    output.push_str(&format!(
        "Analyzed Keywords: {}",
        report.summary.analyzed_keywords
    ));
    output.push('\n');
    output.push_str(&format!(
        "Cannibalized Keywords: {}",
        report.summary.cannibalized_keywords
    ));
    output.push('\n');
    output.push_str(&format!(
        "Similarity Threshold: {:.2}",
        report.summary.similarity_threshold
    ));
    output.push('\n');
    output.push_str(&format!("Mode: {}", report.summary.mode));
    output.push('\n');

    let cannibalized: Vec<_> = report.groups.iter().filter(|g| g.cannibalized).collect();
    if cannibalized.is_empty() {
        output.push('\n');
        output.push_str(&"No cannibalization detected".green().to_string());
        output.push('\n');
        return output;
    }

    for group in cannibalized {
        output.push('\n');
        output.push_str(&"━".repeat(60));
        output.push('\n');

        // Keyword and competing URL count
        output.push_str(&group.keyword.blue().bold().to_string());
        output.push_str(&format!(" ({} competing URLs)\n", group.urls.len()));

        // URLs ordered by ranking position
        for entry in &group.urls {
            output.push_str(&entry.url.bright_black().to_string());
            output.push_str(&format!(
                "\n  position {:.1}, {} clicks, {} impressions\n",
                entry.position, entry.clicks, entry.impressions
            ));
        }

        // Pairs at or above the threshold, strongest first
        for pair in &group.pairs {
            let score_pct = (pair.combined_similarity * 100.0) as u32;
            output.push_str(&format!(
                "{} {} {} {}\n",
                format!("{}%", score_pct).green(),
                pair.url_a,
                "<->".bright_black(),
                pair.url_b
            ));
            output.push_str(&format!("  risk: {}\n", risk_label(pair.risk)));
        }
    }

    output
}

pub fn format_site_list(sites: &[SiteEntry]) -> String {
    if sites.is_empty() {
        return "No sites available".to_string();
    }

    let mut output = String::new();

    // Header
    output.push_str(
        &format!("{:<52} {}\n", "Site", "Permission")
            .bold()
            .to_string(),
    );
    output.push_str(&"─".repeat(72));
    output.push('\n');

    // Rows
    for site in sites {
        output.push_str(&format!(
            "{:<52} {}\n",
            site.site_url, site.permission_level
        ));
    }

    output
}

fn risk_label(risk: RiskLevel) -> String {
    match risk {
        RiskLevel::High => "high".red().bold().to_string(),
        RiskLevel::Medium => "medium".yellow().to_string(),
        RiskLevel::Low => "low".cyan().to_string(),
        RiskLevel::None => "none".to_string(),
    }
}
