//! The descriptive record written next to the bundle in every archive.
//!
//! Field names on the wire are camelCase (`exportDate`, `branchMetadata`, ...)
//! so archives stay readable by other tools that speak the same format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Archive entry holding the git bundle.
pub const BUNDLE_ENTRY: &str = "repository.bundle";
/// Archive entry holding the serialized [`Snapshot`].
pub const METADATA_ENTRY: &str = "metadata.json";

/// Tip commit details for one ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    /// Subject line of the commit message.
    pub message: String,
    /// `Name <email>`
    pub author: String,
    pub date: String,
}

impl CommitInfo {
    /// First seven characters of the hash.
    pub fn short_hash(&self) -> &str {
        short_hash(&self.hash)
    }
}

/// Abbreviate a full hash to seven characters.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

/// State of a repository captured at export time. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// RFC 3339 instant the export ran.
    pub export_date: String,
    /// Branch checked out at export time, or the first exported branch when
    /// the checked-out branch was not exported.
    pub current_branch: String,
    /// Exported branches, in order.
    pub branches: Vec<String>,
    /// Every tag in the repository, regardless of the branch filter.
    pub tags: Vec<String>,
    #[serde(default)]
    pub branch_metadata: BTreeMap<String, CommitInfo>,
    #[serde(default)]
    pub tag_metadata: BTreeMap<String, CommitInfo>,
    /// Informational only.
    pub repository_path: String,
}

impl Snapshot {
    /// Commit info for `branch`, if it could be collected at export time.
    pub fn branch_info(&self, branch: &str) -> Option<&CommitInfo> {
        self.branch_metadata.get(branch)
    }

    /// Whether `branch` was exported.
    pub fn includes(&self, branch: &str) -> bool {
        self.branches.iter().any(|b| b == branch)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(hash: &str) -> CommitInfo {
        CommitInfo {
            hash: hash.into(),
            message: "initial".into(),
            author: "Dev <dev@example.com>".into(),
            date: "2025-10-25 10:00:00 +0900".into(),
        }
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let mut branch_metadata = BTreeMap::new();
        branch_metadata.insert("main".to_string(), info("0123456789abcdef"));
        let snap = Snapshot {
            export_date: "2025-10-25T01:00:00Z".into(),
            current_branch: "main".into(),
            branches: vec!["main".into()],
            tags: vec!["v1".into()],
            branch_metadata,
            tag_metadata: BTreeMap::new(),
            repository_path: "/src/repo".into(),
        };
        let value: serde_json::Value =
            serde_json::from_slice(&snap.to_json_pretty().unwrap()).unwrap();
        for key in [
            "exportDate",
            "currentBranch",
            "branches",
            "tags",
            "branchMetadata",
            "tagMetadata",
            "repositoryPath",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["branchMetadata"]["main"]["hash"], "0123456789abcdef");
    }

    #[test]
    fn reads_foreign_metadata_and_ignores_unknown_fields() {
        let json = r#"{
            "exportDate": "2025-10-25T01:00:00.000Z",
            "currentBranch": "develop",
            "branches": ["main", "develop"],
            "tags": [],
            "branchMetadata": {
                "main": {"hash": "abc1234def", "message": "m", "author": "a <a@x>", "date": "d"}
            },
            "tagMetadata": {},
            "repositoryPath": "C:\\work\\repo",
            "exporterVersion": "1.0.0"
        }"#;
        let snap = Snapshot::from_json(json.as_bytes()).unwrap();
        assert_eq!(snap.current_branch, "develop");
        assert!(snap.includes("develop"));
        assert!(!snap.includes("feature"));
        assert_eq!(snap.branch_info("main").unwrap().short_hash(), "abc1234");
        assert!(snap.branch_info("develop").is_none());
    }

    #[test]
    fn short_hash_tolerates_short_input() {
        assert_eq!(short_hash("abc"), "abc");
        assert_eq!(short_hash("0123456789"), "0123456");
    }
}
