// Copyright 2024 The Smartlog Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Uncommitted working-copy changes as reported by the engine.
//!
//! Like the commit list, the file list is fetched out of band and replaced
//! wholesale; operations predict their effect on it through
//! [`crate::operation::Operation::optimistic_changes`].

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Status letter the engine reports per changed file.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum FileStatus {
    #[serde(rename = "A")]
    Added,
    #[serde(rename = "M")]
    Modified,
    #[serde(rename = "R")]
    Removed,
    #[serde(rename = "?")]
    Untracked,
    #[serde(rename = "!")]
    Missing,
    #[serde(rename = "U")]
    Unresolved,
}

/// One uncommitted file change.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_letters() {
        let files: Vec<ChangedFile> =
            serde_json::from_str(r#"[{"path": "src/lib.rs", "status": "M"}]"#).unwrap();
        assert_eq!(
            files,
            vec![ChangedFile {
                path: "src/lib.rs".to_owned(),
                status: FileStatus::Modified,
            }]
        );
    }
}
