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

use thiserror::Error;

/// Errors raised while loading observations or page content.
///
/// Authorization failures get their own variant so callers can tell
/// "you lack access to this property" apart from a transport problem
/// and render a useful message instead of a raw HTTP status.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The analytics property refused the credentials
    #[error("access denied for {resource}")]
    AuthorizationDenied { resource: String },

    /// Network or file retrieval failed
    #[error("failed to fetch {target}: {reason}")]
    FetchFailed { target: String, reason: String },

    /// Input did not match any recognized layout
    #[error("invalid source format: {0}")]
    InvalidFormat(String),
}

/// Result type alias for source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;
