//! The release-flow state machine.
//!
//! Each operation reads the repository topology and the version record,
//! validates its preconditions, then issues an ordered sequence of
//! commit/branch/tag/push operations through the [Repository] trait. There
//! is no rollback: a local commit left behind by a failed push is surfaced
//! to the user rather than undone, and concurrent invocations are resolved
//! by git's own push rejection, never retried here.

use crate::error::{RelflowError, Result};
use crate::git::Repository;
use crate::policy::{self, BranchRef};
use crate::store::{VersionRecord, VersionStore};
use crate::version::{Version, VersionBump};
use chrono::Utc;
use std::path::PathBuf;

/// Result of the `release` and `major` operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// Version the release branch was cut at
    pub version: Version,
    /// Name of the created release branch
    pub branch: String,
}

/// Result of the `fix` operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// Name of the created fix branch
    pub fix_branch: String,
    /// Release branch associated with the source tag
    pub release_branch: String,
    /// Whether the release branch had to be created from the tag
    pub release_branch_created: bool,
    /// False when the release branch had diverged from the tag and its
    /// record update was skipped - manual intervention required.
    pub release_branch_updated: bool,
    /// The patched version carried by the fix branch
    pub version: Version,
}

/// Result of the `tag` operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// Tag created and pushed
    Created(String),
    /// Tag already existed and --force was not given; nothing was done
    AlreadyExists(String),
    /// Existing tag deleted locally and remotely, then recreated and pushed
    Recreated(String),
}

/// Read-only report produced by the `status` operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub branch: String,
    pub classification: BranchRef,
    pub record: Option<VersionRecord>,
    /// For non-main branches: whether the branch is still at its first
    /// commit relative to main
    pub first_commit: Option<bool>,
}

/// Orchestrates version-record mutations and branch/tag operations
///
/// The repository handle is obtained once at program start and passed in;
/// no operation relies on implicit process-wide state.
pub struct ReleaseFlow<R: Repository> {
    repo: R,
    store: VersionStore,
    remote: String,
}

impl<R: Repository> ReleaseFlow<R> {
    pub fn new(repo: R, store: VersionStore, remote: impl Into<String>) -> Self {
        ReleaseFlow {
            repo,
            store,
            remote: remote.into(),
        }
    }

    /// Access the underlying repository handle
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// The path the version record is committed under, relative to the
    /// working tree root.
    fn record_path(&self) -> PathBuf {
        self.store
            .path()
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("version.info"))
    }

    /// Record file name as it appears in commit messages
    fn record_name(&self) -> String {
        self.record_path().display().to_string()
    }

    fn require_main_branch(&self) -> Result<String> {
        let branches = self.repo.branch_names()?;
        let main = policy::main_branch_name(&branches)?;
        let active = self.repo.current_branch()?;
        if active != main {
            return Err(RelflowError::policy(format!(
                "This command must be run from the '{}' branch (currently on '{}')",
                main, active
            )));
        }
        Ok(main)
    }

    /// Write the record, commit it on the current branch and push.
    fn commit_record(
        &self,
        record: &VersionRecord,
        branch: &str,
        message: &str,
        set_upstream: bool,
    ) -> Result<()> {
        self.store.write(record)?;
        self.repo.commit_path(&self.record_path(), message)?;
        self.repo.push_branch(&self.remote, branch, set_upstream)?;
        Ok(())
    }

    /// Initialize the version record from the repository topology
    ///
    /// Must run on the main branch, exactly once. The current version is
    /// taken from the highest existing release branch; a repository with no
    /// release branches starts at 1.0.0 with next equal to current (the
    /// first `release` will cut 1.0.0 itself).
    pub fn init(&self) -> Result<VersionRecord> {
        self.require_main_branch()?;
        if self.store.exists() {
            return Err(RelflowError::AlreadyInitialized);
        }

        let branches = self.repo.branch_names()?;
        let record = match policy::latest_release_version(&branches) {
            Some(latest) => VersionRecord::new(latest, latest.bump(&VersionBump::Minor)),
            None => {
                let first = Version::new(1, 0, 0);
                VersionRecord::new(first, first)
            }
        };

        self.store.init(&record)?;
        Ok(record)
    }

    /// Cut the next minor release branch from main
    pub fn release(&self) -> Result<ReleaseOutcome> {
        let main = self.require_main_branch()?;
        let record = self.store.read()?;
        self.cut_release(&main, record.next_version)
    }

    /// Cut the next major release branch from main
    pub fn major(&self) -> Result<ReleaseOutcome> {
        let main = self.require_main_branch()?;
        let record = self.store.read()?;
        self.cut_release(&main, record.current_version.bump(&VersionBump::Major))
    }

    /// Two-stage release sequence shared by `release` and `major`.
    ///
    /// Stage one advances main's record past the released version and
    /// pushes it. Stage two cuts the release branch from main's new head
    /// and seeds it with a patch-oriented record.
    fn cut_release(&self, main: &str, version: Version) -> Result<ReleaseOutcome> {
        let main_record = VersionRecord::new(version, version.bump(&VersionBump::Minor));
        self.commit_record(
            &main_record,
            main,
            &format!("Update {} for release {}", self.record_name(), version),
            false,
        )?;

        let branch = policy::release_branch_name(&version);
        self.repo.create_branch_from_head(&branch)?;
        self.repo.checkout(&branch)?;

        let branch_record = VersionRecord::new(version, version.bump(&VersionBump::Patch));
        self.commit_record(
            &branch_record,
            &branch,
            &format!("Prepare release branch for {}", version),
            true,
        )?;

        Ok(ReleaseOutcome { version, branch })
    }

    /// Branch a fix off a tagged release
    ///
    /// The fix branch starts at the tag itself, not at the release branch
    /// tip, so the fix applies to exactly what was shipped. The release
    /// branch gets its patch version advanced first; when it has diverged
    /// from the tag that update is skipped and flagged for manual handling.
    pub fn fix(&self, tag_version: &Version, description: &str) -> Result<FixOutcome> {
        let tag_name = format!("v{}", tag_version);
        if !self.repo.tag_exists(&tag_name)? {
            return Err(RelflowError::policy(format!(
                "Tag '{}' not found",
                tag_name
            )));
        }

        let release_branch = policy::release_branch_name(tag_version);
        let release_branch_created = if self.repo.branch_exists(&release_branch)? {
            false
        } else {
            self.repo.create_branch_at(&release_branch, &tag_name)?;
            true
        };

        // Safe to automate only while the branch tip sits exactly at the
        // tag: no commits beyond it, and none missing from it (a tip behind
        // the tag never shipped the tagged release).
        let release_branch_updated = self.repo.ahead_count(&tag_name, &release_branch)? == 0
            && self.repo.ahead_count(&release_branch, &tag_name)? == 0;

        let version;
        if release_branch_updated {
            self.repo.checkout(&release_branch)?;
            let record = self.store.read()?;
            version = record.current_version.bump(&VersionBump::Patch);
            let bumped = VersionRecord::new(version, version.bump(&VersionBump::Patch));
            self.commit_record(
                &bumped,
                &release_branch,
                &format!("Update {} for fix {}", self.record_name(), version),
                release_branch_created,
            )?;
        } else {
            version = tag_version.bump(&VersionBump::Patch);
        }

        let fix_branch = policy::fix_branch_name(description, tag_version);
        self.repo.create_branch_at(&fix_branch, &tag_name)?;
        self.repo.checkout(&fix_branch)?;

        let fix_record = VersionRecord::new(version, version.bump(&VersionBump::Patch));
        self.commit_record(
            &fix_record,
            &fix_branch,
            &format!("Prepare fix branch for {}", version),
            true,
        )?;

        Ok(FixOutcome {
            fix_branch,
            release_branch,
            release_branch_created,
            release_branch_updated,
            version,
        })
    }

    /// Tag the current release branch at its current version
    ///
    /// With `force`, an existing tag is deleted remotely and locally and
    /// recreated at the branch head; without it the operation is a no-op.
    pub fn tag(&self, force: bool) -> Result<TagOutcome> {
        let active = self.repo.current_branch()?;
        if !policy::is_release_branch(&active) {
            return Err(RelflowError::policy(format!(
                "Tags can only be created from a release branch (currently on '{}')",
                active
            )));
        }

        let record = self.store.read()?;
        let tag_name = format!("v{}", record.current_version);

        if self.repo.tag_exists(&tag_name)? {
            if !force {
                return Ok(TagOutcome::AlreadyExists(tag_name));
            }
            self.repo.delete_remote_tag(&self.remote, &tag_name)?;
            self.repo.delete_tag(&tag_name)?;
            self.repo.create_tag(&tag_name)?;
            self.repo.push_tag(&self.remote, &tag_name)?;
            return Ok(TagOutcome::Recreated(tag_name));
        }

        self.repo.create_tag(&tag_name)?;
        self.repo.push_tag(&self.remote, &tag_name)?;
        Ok(TagOutcome::Created(tag_name))
    }

    /// Create a timestamped snapshot tag on the current branch
    ///
    /// Uses the next version on main (what the snapshot is leading up to)
    /// and the current version everywhere else. The UTC second-precision
    /// suffix keeps names unique barring a same-second repeat invocation,
    /// an accepted limitation.
    pub fn snap(&self) -> Result<String> {
        let record = self.store.read()?;
        let branches = self.repo.branch_names()?;
        let main = policy::main_branch_name(&branches)?;
        let active = self.repo.current_branch()?;

        let version = if active == main {
            record.next_version
        } else {
            record.current_version
        };

        let tag_name = format!("v{}-{}", version, Utc::now().format("%Y%m%d%H%M%S"));
        self.repo.create_tag(&tag_name)?;
        self.repo.push_tag(&self.remote, &tag_name)?;
        Ok(tag_name)
    }

    /// Current version from the record, without mutation
    pub fn current_version(&self) -> Result<Version> {
        Ok(self.store.read()?.current_version)
    }

    /// Read-only summary of where the working tree stands
    pub fn status(&self) -> Result<StatusReport> {
        let branches = self.repo.branch_names()?;
        let main = policy::main_branch_name(&branches)?;
        let active = self.repo.current_branch()?;
        let classification = policy::classify(&active, &main);

        let record = match self.store.read() {
            Ok(record) => Some(record),
            Err(RelflowError::RecordNotFound) => None,
            Err(e) => return Err(e),
        };

        let first_commit = if active == main {
            None
        } else {
            Some(policy::is_first_commit(&self.repo, &active, &main)?)
        };

        Ok(StatusReport {
            branch: active,
            classification,
            record,
            first_commit,
        })
    }
}
