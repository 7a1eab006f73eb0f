use crate::error::{RelflowError, Result};
use crate::git::Repository;
use git2::{BranchType, Repository as Git2Repo};
use std::path::{Path, PathBuf};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository at or above `path`
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)
            .map_err(|e| RelflowError::policy(format!("Not in a git repository: {}", e)))?;
        Ok(Git2Repository { repo })
    }

    /// Root of the working tree
    ///
    /// Bare repositories are rejected at open time in practice; the engine
    /// needs a working tree to carry the version record.
    pub fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| RelflowError::policy("Repository has no working tree"))
    }

    /// Credential callbacks shared by every remote operation.
    ///
    /// Tries SSH keys from ~/.ssh (ed25519 first), then the SSH agent, then
    /// whatever default credential helper libgit2 can find.
    fn remote_callbacks(&self) -> git2::RemoteCallbacks<'static> {
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                let key_paths = [
                    format!("{}/.ssh/id_ed25519", home),
                    format!("{}/.ssh/id_rsa", home),
                    format!("{}/.ssh/id_ecdsa", home),
                ];

                for key_path in &key_paths {
                    let path = std::path::Path::new(key_path);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(
                            username_from_url.unwrap_or("git"),
                            None,
                            path,
                            None,
                        ) {
                            return Ok(cred);
                        }
                    }
                }

                if let Ok(cred) =
                    git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                {
                    return Ok(cred);
                }
            }

            git2::Cred::default()
        });
        callbacks
    }

    /// Push a set of refspecs to a named remote
    fn push_refspecs(&self, remote_name: &str, refspecs: &[&str]) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|_| {
            RelflowError::remote(format!("Remote '{}' not found", remote_name))
        })?;

        let mut callbacks = self.remote_callbacks();
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                Err(git2::Error::from_str(&format!(
                    "push rejected for {}: {}",
                    refname, status
                )))
            } else {
                Ok(())
            }
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(refspecs, Some(&mut push_options))
            .map_err(|e| RelflowError::remote(e.message().to_string()))?;

        Ok(())
    }

    fn resolve_commit(&self, rev: &str) -> Result<git2::Oid> {
        let object = self.repo.revparse_single(rev)?;
        let commit = object.peel_to_commit()?;
        Ok(commit.id())
    }
}

impl Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        head.shorthand()
            .map(|s| s.to_string())
            .ok_or_else(|| RelflowError::policy("HEAD is detached or not on a branch"))
    }

    fn branch_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_branch_from_head(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(name, &head, false)?;
        Ok(())
    }

    fn create_branch_at(&self, name: &str, rev: &str) -> Result<()> {
        let oid = self.resolve_commit(rev)?;
        let commit = self.repo.find_commit(oid)?;
        self.repo.branch(name, &commit, false)?;
        Ok(())
    }

    fn checkout(&self, name: &str) -> Result<()> {
        let (object, reference) = self.repo.revparse_ext(name)?;
        self.repo.checkout_tree(&object, None)?;
        match reference.and_then(|r| r.name().map(|n| n.to_string())) {
            Some(ref_name) => self.repo.set_head(&ref_name)?,
            None => self.repo.set_head_detached(object.id())?,
        }
        Ok(())
    }

    fn commit_path(&self, path: &Path, message: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_path(path)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;

        // First commit in a repo has no parent.
        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(())
    }

    fn push_branch(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<()> {
        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
        self.push_refspecs(remote, &[&refspec])?;

        if set_upstream {
            let mut local = self.repo.find_branch(branch, BranchType::Local)?;
            local.set_upstream(Some(&format!("{}/{}", remote, branch)))?;
        }
        Ok(())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.tag_lightweight(name, head.as_object(), false)?;
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.repo.tag_delete(name)?;
        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        let refspec = format!("refs/tags/{}:refs/tags/{}", name, name);
        self.push_refspecs(remote, &[&refspec])
    }

    fn delete_remote_tag(&self, remote: &str, name: &str) -> Result<()> {
        // An empty source side deletes the remote ref.
        let refspec = format!(":refs/tags/{}", name);
        self.push_refspecs(remote, &[&refspec])
    }

    fn ahead_count(&self, base: &str, tip: &str) -> Result<usize> {
        let base_oid = self.resolve_commit(base)?;
        let tip_oid = self.resolve_commit(tip)?;
        let (ahead, _behind) = self.repo.graph_ahead_behind(tip_oid, base_oid)?;
        Ok(ahead)
    }
}

// SAFETY: Git2Repository wraps git2::Repository which libgit2 makes safe to
// use from multiple threads for the operations exercised here.
unsafe impl Sync for Git2Repository {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository as _;
    use std::fs;
    use tempfile::TempDir;

    // Build a throwaway repo with one commit on a named branch.
    fn init_repo(branch: &str) -> (TempDir, Git2Repository) {
        let dir = TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        repo.set_head(&format!("refs/heads/{}", branch)).unwrap();

        fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = repo.signature().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();

        let wrapped = Git2Repository::discover(dir.path()).unwrap();
        (dir, wrapped)
    }

    #[test]
    fn test_current_branch() {
        let (_dir, repo) = init_repo("main");
        assert_eq!(repo.current_branch().unwrap(), "main");
    }

    #[test]
    fn test_branch_names_and_exists() {
        let (_dir, repo) = init_repo("main");
        repo.create_branch_from_head("release/v1.0.0").unwrap();

        let names = repo.branch_names().unwrap();
        assert!(names.contains(&"main".to_string()));
        assert!(names.contains(&"release/v1.0.0".to_string()));
        assert!(repo.branch_exists("release/v1.0.0").unwrap());
        assert!(!repo.branch_exists("release/v9.9.0").unwrap());
    }

    #[test]
    fn test_tag_create_exists_delete() {
        let (_dir, repo) = init_repo("main");
        assert!(!repo.tag_exists("v1.0.0").unwrap());
        repo.create_tag("v1.0.0").unwrap();
        assert!(repo.tag_exists("v1.0.0").unwrap());
        repo.delete_tag("v1.0.0").unwrap();
        assert!(!repo.tag_exists("v1.0.0").unwrap());
    }

    #[test]
    fn test_checkout_and_commit_path() {
        let (dir, repo) = init_repo("main");
        repo.create_branch_from_head("release/v1.0.0").unwrap();
        repo.checkout("release/v1.0.0").unwrap();
        assert_eq!(repo.current_branch().unwrap(), "release/v1.0.0");

        fs::write(dir.path().join("version.info"), "{}\n").unwrap();
        repo.commit_path(Path::new("version.info"), "Add version.info")
            .unwrap();
        assert_eq!(repo.ahead_count("main", "release/v1.0.0").unwrap(), 1);
    }

    #[test]
    fn test_create_branch_at_tag() {
        let (dir, repo) = init_repo("main");
        repo.create_tag("v1.0.0").unwrap();

        // advance main past the tag
        fs::write(dir.path().join("file.txt"), "more\n").unwrap();
        repo.commit_path(Path::new("file.txt"), "Another commit")
            .unwrap();

        repo.create_branch_at("fix/x-from-1.0.0", "v1.0.0").unwrap();
        assert!(repo.branch_exists("fix/x-from-1.0.0").unwrap());
        // the branch sits at the tag, not at main's tip
        assert_eq!(repo.ahead_count("fix/x-from-1.0.0", "main").unwrap(), 1);
        assert_eq!(repo.ahead_count("main", "fix/x-from-1.0.0").unwrap(), 0);
    }

    #[test]
    fn test_ahead_count_same_rev() {
        let (_dir, repo) = init_repo("main");
        repo.create_branch_from_head("release/v1.0.0").unwrap();
        assert_eq!(repo.ahead_count("main", "release/v1.0.0").unwrap(), 0);
    }
}
