use git2::Repository;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommits {
    pub git_commit: String,
    pub git_commit_full: String,
}

impl GitCommits {
    fn unknown() -> Self {
        Self {
            git_commit: UNKNOWN.to_string(),
            git_commit_full: UNKNOWN.to_string(),
        }
    }
}

/// HEAD of the checkout the process runs from, attached to every log line.
pub fn git_commits() -> GitCommits {
    let head = Repository::discover(".").and_then(|repo| {
        let commit = repo.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    });

    match head {
        Ok(full) => GitCommits {
            git_commit: full.chars().take(7).collect(),
            git_commit_full: full,
        },
        Err(e) => {
            tracing::debug!("Could not resolve git commit: {}", e);
            GitCommits::unknown()
        }
    }
}
