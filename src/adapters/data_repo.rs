use crate::utils::error::{DailyReadError, Result};
use git2::{Commit, Diff, DiffOptions, ErrorCode, Repository, Signature, Status, StatusOptions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const EMPTY_FILE: &str = ".empty";
const FIRST_COMMIT_MESSAGE: &str = "Empty file as a first commit";

/// Git repository holding one JSON file per project.
pub struct DataRepo {
    location: PathBuf,
    repo: Repository,
}

impl std::fmt::Debug for DataRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataRepo")
            .field("location", &self.location)
            .finish()
    }
}

fn location_error(location: &Path, reason: &str) -> DailyReadError {
    DailyReadError::DataLocationError {
        path: location.to_string_lossy().into_owned(),
        reason: reason.to_string(),
    }
}

fn diff_paths(diff: &Diff<'_>) -> Vec<String> {
    let paths: Vec<String> = diff
        .deltas()
        .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    paths
}

impl DataRepo {
    /// Opens the repository at `location`, creating it and a first commit if needed.
    pub fn setup(location: &Path) -> Result<Self> {
        if !location.is_absolute() {
            return Err(location_error(location, "Data location is not an absolute path"));
        }

        if location.exists() && !location.is_dir() {
            return Err(location_error(
                location,
                "Data location exists but is not a directory",
            ));
        }

        let repo = match Repository::open(location) {
            Ok(repo) => repo,
            Err(_) => {
                std::fs::create_dir_all(location)?;
                tracing::info!("Initializing data repository at {}", location.display());
                Repository::init(location)?
            }
        };

        let data_repo = Self {
            location: location.to_path_buf(),
            repo,
        };

        if data_repo.head_commit()?.is_none() {
            if data_repo.is_dirty()? || !data_repo.untracked_files()?.is_empty() {
                return Err(location_error(
                    location,
                    "Data location has no commits but has modifications, please commit those or use an empty directory as the data location",
                ));
            }

            OpenOptions::new()
                .create(true)
                .append(true)
                .open(location.join(EMPTY_FILE))?;
            data_repo.add(&[EMPTY_FILE])?;
            data_repo.commit(FIRST_COMMIT_MESSAGE)?;
        }

        Ok(data_repo)
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Differences between HEAD and the index.
    pub fn staged_files(&self) -> Result<Vec<String>> {
        let head_tree = match self.head_commit()? {
            Some(commit) => Some(commit.tree()?),
            None => None,
        };
        let index = self.repo.index()?;
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)?;
        Ok(diff_paths(&diff))
    }

    /// Differences between the index and the working tree, untracked files excluded.
    pub fn modified_not_staged_files(&self) -> Result<Vec<String>> {
        let mut opts = DiffOptions::new();
        opts.include_untracked(false);
        let diff = self.repo.diff_index_to_workdir(None, Some(&mut opts))?;
        Ok(diff_paths(&diff))
    }

    pub fn untracked_files(&self) -> Result<Vec<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let paths: Vec<String> = statuses
            .iter()
            .filter(|entry| entry.status().contains(Status::WT_NEW))
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect();
        Ok(paths)
    }

    pub fn is_dirty(&self) -> Result<bool> {
        Ok(!self.staged_files()?.is_empty() || !self.modified_not_staged_files()?.is_empty())
    }

    /// Stages the given paths; paths missing from the working tree are staged as deletions.
    pub fn add<P: AsRef<Path>>(&self, paths: &[P]) -> Result<()> {
        let mut index = self.repo.index()?;
        for path in paths {
            let path = path.as_ref();
            if self.location.join(path).exists() {
                index.add_path(path)?;
            } else {
                index.remove_path(path)?;
            }
        }
        index.write()?;
        Ok(())
    }

    /// Commits the index on top of HEAD and returns the new commit id.
    pub fn commit(&self, message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self
            .repo
            .signature()
            .or_else(|_| Signature::now("daily_read", "daily_read@localhost"))?;

        let parent = self.head_commit()?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        tracing::debug!("Committed {} to data repository: {}", oid, message);
        Ok(oid.to_string())
    }
}
