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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "octorank")]
#[command(version, author = "Muvon Un Limited <opensource@muvon.io>")]
#[command(about = "Keyword cannibalization analyzer for search rankings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze ranking data for keyword cannibalization
    Analyze {
        #[command(subcommand)]
        command: AnalyzeCommand,
    },
    /// List analytics properties available to the configured token
    Sites {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AnalyzeCommand {
    /// Analyze a delimited ranking export (search console or native columns)
    Csv {
        /// Path to the observations file
        #[arg(short, long)]
        file: PathBuf,

        /// Optional delimited file with page content (url, title, meta_description, h1, h2)
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// Scrape page content live instead of reading it from a file
        #[arg(long)]
        scrape: bool,

        /// Similarity threshold, between 0 and 1 exclusive
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Group URLs by their primary keyword instead of exact keyword
        #[arg(long)]
        primary_only: bool,

        /// Ignore observations with fewer clicks
        #[arg(long)]
        min_clicks: Option<u64>,

        /// Ignore observations with fewer impressions
        #[arg(long)]
        min_impressions: Option<u64>,

        /// Emit the raw analysis result instead of the sorted report
        #[arg(long)]
        no_report: bool,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Fetch observations from the search analytics API and analyze them
    Search {
        /// Site property URL as registered with the analytics API
        #[arg(short, long)]
        site: String,

        /// Range start, YYYY-MM-DD (inclusive)
        #[arg(long)]
        start_date: String,

        /// Range end, YYYY-MM-DD (inclusive)
        #[arg(long)]
        end_date: String,

        /// Maximum distinct (keyword, url) rows to fetch
        #[arg(long)]
        max_rows: Option<usize>,

        /// Window size in days for date-chunked fetching
        #[arg(long)]
        chunk_days: Option<u32>,

        /// Fetch the whole range as a single window
        #[arg(long)]
        no_date_chunks: bool,

        /// Scrape page content for the fetched URLs
        #[arg(long)]
        scrape: bool,

        /// Similarity threshold, between 0 and 1 exclusive
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Group URLs by their primary keyword instead of exact keyword
        #[arg(long)]
        primary_only: bool,

        /// Ignore observations with fewer clicks
        #[arg(long)]
        min_clicks: Option<u64>,

        /// Ignore observations with fewer impressions
        #[arg(long)]
        min_impressions: Option<u64>,

        /// Emit the raw analysis result instead of the sorted report
        #[arg(long)]
        no_report: bool,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },
}
