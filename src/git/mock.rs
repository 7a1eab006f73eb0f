use crate::error::{RelflowError, Result};
use crate::git::Repository;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Mock repository for testing without actual git operations
///
/// Tracks branches, tags and the active branch in memory and records every
/// side effect (commits, pushes, deletions) so tests can assert on the exact
/// sequence of operations the engine issued.
pub struct MockRepository {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    current_branch: String,
    branches: Vec<String>,
    tags: Vec<String>,
    /// (branch, message) for each commit made
    commits: Vec<(String, String)>,
    /// (remote, branch, set_upstream)
    pushed_branches: Vec<(String, String, bool)>,
    /// (remote, tag)
    pushed_tags: Vec<(String, String)>,
    deleted_tags: Vec<String>,
    /// (remote, tag)
    deleted_remote_tags: Vec<(String, String)>,
    /// (base, tip) -> commits ahead; missing pairs default to 0
    ahead_counts: HashMap<(String, String), usize>,
    /// when set, every push fails with this message
    push_failure: Option<String>,
}

impl MockRepository {
    /// Create a mock with a single branch checked out
    pub fn new(current_branch: impl Into<String>) -> Self {
        let name = current_branch.into();
        MockRepository {
            state: Mutex::new(MockState {
                current_branch: name.clone(),
                branches: vec![name],
                ..MockState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    /// Add an existing branch
    pub fn add_branch(&self, name: impl Into<String>) {
        self.lock().branches.push(name.into());
    }

    /// Add an existing tag
    pub fn add_tag(&self, name: impl Into<String>) {
        self.lock().tags.push(name.into());
    }

    /// Set the ahead count reported for `base..tip`
    pub fn set_ahead_count(&self, base: impl Into<String>, tip: impl Into<String>, count: usize) {
        self.lock()
            .ahead_counts
            .insert((base.into(), tip.into()), count);
    }

    /// Make every subsequent push fail with the given message
    pub fn fail_pushes(&self, message: impl Into<String>) {
        self.lock().push_failure = Some(message.into());
    }

    // Inspection helpers for assertions

    pub fn commits(&self) -> Vec<(String, String)> {
        self.lock().commits.clone()
    }

    pub fn pushed_branches(&self) -> Vec<(String, String, bool)> {
        self.lock().pushed_branches.clone()
    }

    pub fn pushed_tags(&self) -> Vec<(String, String)> {
        self.lock().pushed_tags.clone()
    }

    pub fn deleted_tags(&self) -> Vec<String> {
        self.lock().deleted_tags.clone()
    }

    pub fn deleted_remote_tags(&self) -> Vec<(String, String)> {
        self.lock().deleted_remote_tags.clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.lock().tags.clone()
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        Ok(self.lock().current_branch.clone())
    }

    fn branch_names(&self) -> Result<Vec<String>> {
        Ok(self.lock().branches.clone())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock().branches.iter().any(|b| b == name))
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock().tags.iter().any(|t| t == name))
    }

    fn create_branch_from_head(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if state.branches.iter().any(|b| b == name) {
            return Err(RelflowError::Git(git2::Error::from_str(&format!(
                "branch '{}' already exists",
                name
            ))));
        }
        state.branches.push(name.to_string());
        Ok(())
    }

    fn create_branch_at(&self, name: &str, rev: &str) -> Result<()> {
        let mut state = self.lock();
        let rev_known = state.branches.iter().any(|b| b == rev)
            || state.tags.iter().any(|t| t == rev);
        if !rev_known {
            return Err(RelflowError::Git(git2::Error::from_str(&format!(
                "revision '{}' not found",
                rev
            ))));
        }
        if state.branches.iter().any(|b| b == name) {
            return Err(RelflowError::Git(git2::Error::from_str(&format!(
                "branch '{}' already exists",
                name
            ))));
        }
        state.branches.push(name.to_string());
        Ok(())
    }

    fn checkout(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.branches.iter().any(|b| b == name) {
            return Err(RelflowError::Git(git2::Error::from_str(&format!(
                "branch '{}' not found",
                name
            ))));
        }
        state.current_branch = name.to_string();
        Ok(())
    }

    fn commit_path(&self, _path: &Path, message: &str) -> Result<()> {
        let mut state = self.lock();
        let branch = state.current_branch.clone();
        state.commits.push((branch, message.to_string()));
        Ok(())
    }

    fn push_branch(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<()> {
        let mut state = self.lock();
        if let Some(msg) = &state.push_failure {
            return Err(RelflowError::remote(msg.clone()));
        }
        state
            .pushed_branches
            .push((remote.to_string(), branch.to_string(), set_upstream));
        Ok(())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if state.tags.iter().any(|t| t == name) {
            return Err(RelflowError::Git(git2::Error::from_str(&format!(
                "tag '{}' already exists",
                name
            ))));
        }
        state.tags.push(name.to_string());
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        state.tags.retain(|t| t != name);
        state.deleted_tags.push(name.to_string());
        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        let mut state = self.lock();
        if let Some(msg) = &state.push_failure {
            return Err(RelflowError::remote(msg.clone()));
        }
        state
            .pushed_tags
            .push((remote.to_string(), name.to_string()));
        Ok(())
    }

    fn delete_remote_tag(&self, remote: &str, name: &str) -> Result<()> {
        let mut state = self.lock();
        state
            .deleted_remote_tags
            .push((remote.to_string(), name.to_string()));
        Ok(())
    }

    fn ahead_count(&self, base: &str, tip: &str) -> Result<usize> {
        Ok(self
            .lock()
            .ahead_counts
            .get(&(base.to_string(), tip.to_string()))
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_branches() {
        let repo = MockRepository::new("main");
        repo.add_branch("release/v1.0.0");

        assert_eq!(repo.current_branch().unwrap(), "main");
        assert!(repo.branch_exists("release/v1.0.0").unwrap());
        assert!(!repo.branch_exists("release/v2.0.0").unwrap());

        repo.checkout("release/v1.0.0").unwrap();
        assert_eq!(repo.current_branch().unwrap(), "release/v1.0.0");
    }

    #[test]
    fn test_mock_checkout_unknown_branch() {
        let repo = MockRepository::new("main");
        assert!(repo.checkout("nope").is_err());
    }

    #[test]
    fn test_mock_tags() {
        let repo = MockRepository::new("main");
        repo.create_tag("v1.0.0").unwrap();
        assert!(repo.tag_exists("v1.0.0").unwrap());
        assert!(repo.create_tag("v1.0.0").is_err());

        repo.delete_tag("v1.0.0").unwrap();
        assert!(!repo.tag_exists("v1.0.0").unwrap());
        assert_eq!(repo.deleted_tags(), vec!["v1.0.0".to_string()]);
    }

    #[test]
    fn test_mock_records_commits_per_branch() {
        let repo = MockRepository::new("main");
        repo.commit_path(Path::new("version.info"), "msg one")
            .unwrap();
        repo.add_branch("release/v1.1.0");
        repo.checkout("release/v1.1.0").unwrap();
        repo.commit_path(Path::new("version.info"), "msg two")
            .unwrap();

        assert_eq!(
            repo.commits(),
            vec![
                ("main".to_string(), "msg one".to_string()),
                ("release/v1.1.0".to_string(), "msg two".to_string()),
            ]
        );
    }

    #[test]
    fn test_mock_push_failure() {
        let repo = MockRepository::new("main");
        repo.fail_pushes("rejected: non-fast-forward");
        let err = repo.push_branch("origin", "main", false).unwrap_err();
        assert!(err.to_string().contains("non-fast-forward"));
        assert!(repo.pushed_branches().is_empty());
    }

    #[test]
    fn test_mock_create_branch_at_requires_known_rev() {
        let repo = MockRepository::new("main");
        assert!(repo.create_branch_at("fix/a-from-1.0.0", "v1.0.0").is_err());
        repo.add_tag("v1.0.0");
        repo.create_branch_at("fix/a-from-1.0.0", "v1.0.0").unwrap();
        assert!(repo.branch_exists("fix/a-from-1.0.0").unwrap());
    }

    #[test]
    fn test_mock_ahead_count_defaults_to_zero() {
        let repo = MockRepository::new("main");
        assert_eq!(repo.ahead_count("main", "feature/x").unwrap(), 0);
        repo.set_ahead_count("main", "feature/x", 3);
        assert_eq!(repo.ahead_count("main", "feature/x").unwrap(), 3);
    }
}
