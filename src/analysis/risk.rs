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

use crate::analysis::types::RiskLevel;

/// Width of the Medium and Low bands around the threshold.
const BAND_WIDTH: f32 = 0.1;

/// Map a similarity score to a risk band relative to the threshold.
///
/// High starts one band above the threshold, Medium at the threshold,
/// Low one band below it. Everything further down is None. Medium and
/// High are the cannibalization bands: a pair at or above the threshold
/// flags its group.
pub fn classify(similarity: f32, threshold: f32) -> RiskLevel {
    if similarity >= threshold + BAND_WIDTH {
        RiskLevel::High
    } else if similarity >= threshold {
        RiskLevel::Medium
    } else if similarity >= threshold - BAND_WIDTH {
        RiskLevel::Low
    } else {
        RiskLevel::None
    }
}
