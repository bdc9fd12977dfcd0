//! Ref listings from git smart-HTTP upload-pack advertisements

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RefSource;
use crate::error::PolicyError;

/// A named ref and the commit it resolves to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitRef {
    pub name: String,
    /// Commit the ref points at (peeled for annotated tags)
    pub commit_sha: String,
}

impl GitRef {
    pub fn new(name: impl Into<String>, commit_sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit_sha: commit_sha.into(),
        }
    }

    /// Returns true if the ref points at `sha` (full or abbreviated)
    pub fn points_at(&self, sha: &str) -> bool {
        !sha.is_empty() && self.commit_sha.starts_with(&sha.to_lowercase())
    }
}

/// Tags and branches of a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RefListing {
    #[serde(default)]
    pub tags: Vec<GitRef>,
    #[serde(default)]
    pub branches: Vec<GitRef>,
    /// Branch `HEAD` points at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

impl RefListing {
    pub fn new(tags: Vec<GitRef>, branches: Vec<GitRef>) -> Self {
        Self {
            tags,
            branches,
            default_branch: None,
        }
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = Some(branch.into());
        self
    }

    /// Parse an upload-pack ref advertisement
    ///
    /// Lines carry a pkt-line length prefix glued to the SHA, so the SHA is
    /// the last 40 characters of the first token. Of the capabilities after
    /// the NUL byte only `symref=HEAD:` is kept. A `^{}` entry gives the
    /// commit an annotated tag points at.
    pub fn parse_upload_pack(body: &str) -> Self {
        let mut listing = RefListing::default();

        for line in body.lines() {
            let mut parts = line.splitn(2, '\0');
            let line = parts.next().unwrap_or_default().trim();
            if let Some(capabilities) = parts.next() {
                listing.default_branch = capabilities
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("symref=HEAD:refs/heads/"))
                    .map(str::to_string)
                    .or(listing.default_branch.take());
            }
            let mut tokens = line.split_whitespace();
            let (Some(first), Some(full_name)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            if first.len() < 40 || !first.is_char_boundary(first.len() - 40) {
                continue;
            }
            let sha = first[first.len() - 40..].to_lowercase();

            if let Some(name) = full_name.strip_prefix("refs/heads/") {
                listing.branches.push(GitRef::new(name, sha));
            } else if let Some(name) = full_name.strip_prefix("refs/tags/") {
                match name.strip_suffix("^{}") {
                    Some(tag) => {
                        if let Some(existing) = listing.tags.iter_mut().find(|t| t.name == tag) {
                            existing.commit_sha = sha;
                        }
                    }
                    None => listing.tags.push(GitRef::new(name, sha)),
                }
            }
        }

        listing
    }
}

#[async_trait]
impl RefSource for RefListing {
    async fn tags(&self) -> Result<Vec<GitRef>, PolicyError> {
        Ok(self.tags.clone())
    }

    async fn branches(&self) -> Result<Vec<GitRef>, PolicyError> {
        Ok(self.branches.clone())
    }

    async fn default_branch(&self) -> Result<Option<String>, PolicyError> {
        Ok(self.default_branch.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPLOAD_PACK: &str = "001e# service=git-upload-pack\n\
        0000015547b3ebbe8d1b5e62f0e8c6e2c0e1d5e8a9c4c8e1 HEAD\0multi_ack thin-pack side-band symref=HEAD:refs/heads/master\n\
        003f7bb4e41ce5164074a0920d5b5770d196b4d90104 refs/heads/master\n\
        0040df9f605d7111b6814fe493cf8f41de3f9f0b1ac5 refs/heads/v1.x-beta\n\
        003ee4d76e6a2f7a8b1c9d0e1f2a3b4c5d6e7f8a9b0c refs/tags/v1.0.0\n\
        0041df9f605d7111b6814fe493cf8f41de3f9f0b1ac5 refs/tags/v1.0.0^{}\n\
        003f37f41032a0f191507903ebbae8a5c0cb945d7585 refs/tags/v1.1\n\
        003c37f41032a0f191507903ebbae8a5c0cb945d7585 refs/pull/1/head\n\
        0000";

    #[test]
    fn test_parse_branches() {
        let listing = RefListing::parse_upload_pack(UPLOAD_PACK);
        let names: Vec<&str> = listing.branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["master", "v1.x-beta"]);
        assert_eq!(
            listing.branches[0].commit_sha,
            "7bb4e41ce5164074a0920d5b5770d196b4d90104"
        );
    }

    #[test]
    fn test_parse_peeled_tags() {
        let listing = RefListing::parse_upload_pack(UPLOAD_PACK);
        assert_eq!(listing.tags.len(), 2);
        assert_eq!(listing.tags[0].name, "v1.0.0");
        assert_eq!(
            listing.tags[0].commit_sha,
            "df9f605d7111b6814fe493cf8f41de3f9f0b1ac5"
        );
        assert_eq!(listing.tags[1].name, "v1.1");
    }

    #[test]
    fn test_parse_default_branch() {
        let listing = RefListing::parse_upload_pack(UPLOAD_PACK);
        assert_eq!(listing.default_branch.as_deref(), Some("master"));
    }

    #[test]
    fn test_parse_skips_garbage() {
        let listing = RefListing::parse_upload_pack("not an upload pack\n\nshort refs/heads/x\n");
        assert_eq!(listing, RefListing::default());
    }

    #[test]
    fn test_points_at_abbreviated_sha() {
        let git_ref = GitRef::new("v1.0.0", "df9f605d7111b6814fe493cf8f41de3f9f0b1ac5");
        assert!(git_ref.points_at("df9f605"));
        assert!(git_ref.points_at("DF9F605D"));
        assert!(!git_ref.points_at("e4d76e6"));
        assert!(!git_ref.points_at(""));
    }

    #[tokio::test]
    async fn test_listing_is_a_ref_source() {
        let listing = RefListing::parse_upload_pack(UPLOAD_PACK);
        assert!(listing.branch_exists("master").await.unwrap());
        assert!(!listing.branch_exists("v1.0.0").await.unwrap());
        assert_eq!(listing.tags().await.unwrap().len(), 2);
    }
}
