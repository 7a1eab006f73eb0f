//! Branch naming convention: classification and derivation.
//!
//! All knowledge of the `release/vX.Y.Z` and `fix/<desc>-from-<version>`
//! grammars lives here; nothing else in the crate splits branch names by
//! hand. Branch classification is derived fresh from the live branch list
//! on every query, never stored.

use crate::error::{RelflowError, Result};
use crate::git::Repository;
use crate::version::{max_version, Version};
use regex::Regex;

const RELEASE_BRANCH_PATTERN: &str = r"^release/v(\d+)\.(\d+)\.(\d+)$";
const FIX_BRANCH_PATTERN: &str = r"^fix/(.+?)(?:-from-(\d+\.\d+\.\d+))?$";

/// A branch name classified under the release-flow convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchRef {
    Main,
    Release(Version),
    Fix {
        description: String,
        source: Option<Version>,
    },
    Other(String),
}

/// True iff the name matches the release branch grammar
pub fn is_release_branch(name: &str) -> bool {
    parse_release_branch(name).is_some()
}

/// True iff the name matches the fix branch grammar
pub fn is_fix_branch(name: &str) -> bool {
    Regex::new(FIX_BRANCH_PATTERN)
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

/// Extract the version embedded in a release branch name
pub fn parse_release_branch(name: &str) -> Option<Version> {
    let re = Regex::new(RELEASE_BRANCH_PATTERN).ok()?;
    let caps = re.captures(name)?;
    // The grammar only admits digit runs, so a parse failure here means the
    // embedded number overflows - treat that as "not a release branch".
    let major = caps[1].parse().ok()?;
    let minor = caps[2].parse().ok()?;
    let patch = caps[3].parse().ok()?;
    Some(Version::new(major, minor, patch))
}

/// Resolve the main branch from a set of branch names
///
/// Fixed precedence: "main" wins over "master"; anything else fails.
pub fn main_branch_name(branch_names: &[String]) -> Result<String> {
    for candidate in ["main", "master"] {
        if branch_names.iter().any(|name| name == candidate) {
            return Ok(candidate.to_string());
        }
    }
    Err(RelflowError::policy(
        "'main' or 'master' branch not found in repository",
    ))
}

/// Highest version embedded in any release branch name, or None
///
/// Names that match the release grammar but carry a malformed version are
/// silently skipped.
pub fn latest_release_version(branch_names: &[String]) -> Option<Version> {
    max_version(
        branch_names
            .iter()
            .filter_map(|name| parse_release_branch(name)),
    )
}

/// Branch name for the release of `version`
///
/// The patch component is always normalized to 0: only `.0` release branches
/// are long-lived, patch increments happen via commits inside that branch.
pub fn release_branch_name(version: &Version) -> String {
    format!("release/v{}.{}.0", version.major, version.minor)
}

/// Branch name for a fix derived from the release tagged `source`
pub fn fix_branch_name(description: &str, source: &Version) -> String {
    format!("fix/{}-from-{}", description, source)
}

/// Classify a branch name relative to the resolved main branch
pub fn classify(name: &str, main_branch: &str) -> BranchRef {
    if name == main_branch {
        return BranchRef::Main;
    }
    if let Some(version) = parse_release_branch(name) {
        return BranchRef::Release(version);
    }
    if let Ok(re) = Regex::new(FIX_BRANCH_PATTERN) {
        if let Some(caps) = re.captures(name) {
            let source = caps.get(2).and_then(|m| Version::parse(m.as_str()).ok());
            return BranchRef::Fix {
                description: caps[1].to_string(),
                source,
            };
        }
    }
    BranchRef::Other(name.to_string())
}

/// Whether a branch is still at its first commit relative to main
///
/// Implemented as a single ahead-count comparison so the heuristic is
/// visible and swappable; kept out of the flow engine on purpose.
pub fn is_first_commit<R: Repository>(repo: &R, branch: &str, main_branch: &str) -> Result<bool> {
    Ok(repo.ahead_count(main_branch, branch)? == 0)
}
