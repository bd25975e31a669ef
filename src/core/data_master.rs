use crate::adapters::data_repo::DataRepo;
use crate::adapters::sources::{SnpseqProjectData, StockholmProjectData, UgcProjectData};
use crate::config::DailyReadConfig;
use crate::domain::model::ProjectDataRecord;
use crate::domain::ports::ProjectDataSource;
use crate::utils::error::{DailyReadError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Fetches projects from every enabled source and keeps them in the data repository.
pub struct ProjectDataMaster {
    sources: Vec<Box<dyn ProjectDataSource>>,
    data_location: PathBuf,
    data_repo: DataRepo,
    data_fetched: bool,
    pub data: BTreeMap<String, ProjectDataRecord>,
}

impl ProjectDataMaster {
    pub async fn from_config(config: &DailyReadConfig) -> Result<Self> {
        let mut sources: Vec<Box<dyn ProjectDataSource>> = Vec::new();
        if config.fetch_from_ngis {
            sources.push(Box::new(StockholmProjectData::connect(config).await?));
        }
        if config.fetch_from_snpseq {
            sources.push(Box::new(SnpseqProjectData));
        }
        if config.fetch_from_ugc {
            sources.push(Box::new(UgcProjectData));
        }

        Self::with_sources(config, sources)
    }

    pub fn with_sources(
        config: &DailyReadConfig,
        sources: Vec<Box<dyn ProjectDataSource>>,
    ) -> Result<Self> {
        let data_location = config.data_location();
        let data_repo = DataRepo::setup(&data_location)?;

        Ok(Self {
            sources,
            data_location,
            data_repo,
            data_fetched: false,
            data: BTreeMap::new(),
        })
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn staged_files(&self) -> Result<Vec<String>> {
        self.data_repo.staged_files()
    }

    pub fn modified_not_staged_files(&self) -> Result<Vec<String>> {
        self.data_repo.modified_not_staged_files()
    }

    /// Downloads data for each source into memory.
    pub async fn get_data(&mut self, project_id: Option<&str>) -> Result<()> {
        for source in &self.sources {
            match source.get_data(project_id).await {
                Ok(records) => self.data.extend(records),
                Err(e) => {
                    tracing::error!("Failed to fetch data from {}", source.name());
                    tracing::error!("{}", e);
                    return Err(e);
                }
            }
        }

        self.data_fetched = true;
        Ok(())
    }

    /// Writes every fetched project to `DATA_LOCATION/<node>/<year>/<portal id>.json`.
    pub fn save_data(&mut self) -> Result<()> {
        if !self.data_fetched {
            return Err(DailyReadError::processing(
                "Project data must be fetched before it can be saved",
            ));
        }

        if self.any_modified_or_new()? {
            tracing::info!("Changes for projects detected from previous run!");
            for record in self.get_modified_or_new_projects()? {
                tracing::info!(
                    "{} from {} had changes not yet reported.",
                    record.project_id,
                    record.ngi_node
                );
            }
        }

        for record in self.data.values() {
            let source_year_dir = self.data_location.join(&record.relative_dirpath);
            std::fs::create_dir_all(&source_year_dir).map_err(|e| {
                DailyReadError::DataLocationError {
                    path: source_year_dir.to_string_lossy().into_owned(),
                    reason: format!(
                        "Failed to use data directory for download, path exists but is not a directory ({})",
                        e
                    ),
                }
            })?;

            if !source_year_dir.is_dir() {
                return Err(DailyReadError::DataLocationError {
                    path: source_year_dir.to_string_lossy().into_owned(),
                    reason: "Failed to use data directory for download, path exists but is not a directory".to_string(),
                });
            }

            let abs_path = self.data_location.join(&record.relative_path);
            if abs_path.parent() != Some(source_year_dir.as_path()) {
                return Err(DailyReadError::DataLocationError {
                    path: abs_path.to_string_lossy().into_owned(),
                    reason: format!("Parent directory should be {}", source_year_dir.display()),
                });
            }

            let Some(data) = &record.data else {
                continue;
            };
            tracing::debug!("Writing data for {} to {}", record.project_id, abs_path.display());
            std::fs::write(&abs_path, serde_json::to_string(data)?)?;
        }

        Ok(())
    }

    /// True if any project file is staged, modified or untracked.
    pub fn any_modified_or_new(&self) -> Result<bool> {
        Ok(self.data_repo.is_dirty()?
            || !self.data_repo.untracked_files()?.is_empty()
            || !self.data_repo.staged_files()?.is_empty())
    }

    /// Projects whose files are staged, modified but not staged, or untracked.
    pub fn get_modified_or_new_projects(&self) -> Result<Vec<ProjectDataRecord>> {
        if !self.any_modified_or_new()? {
            return Ok(Vec::new());
        }

        let mut paths = BTreeSet::new();
        paths.extend(self.data_repo.staged_files()?);
        paths.extend(self.data_repo.modified_not_staged_files()?);
        paths.extend(self.data_repo.untracked_files()?);

        let mut projects = Vec::new();
        for path in paths.into_iter().filter(|path| path.ends_with(".json")) {
            let portal_id = ProjectDataRecord::portal_id_from_path(&path);
            let record = match self.data.get(&portal_id) {
                Some(record) => record.clone(),
                None => ProjectDataRecord::load(&self.data_location, &path)?,
            };
            projects.push(record);
        }

        Ok(projects)
    }

    pub fn find_unique_orderers(&self) -> Result<BTreeSet<String>> {
        let orderers = self
            .get_modified_or_new_projects()?
            .into_iter()
            .filter_map(|project| project.orderer)
            .collect();
        Ok(orderers)
    }

    pub fn stage_data_for_project(&self, record: &ProjectDataRecord) -> Result<()> {
        self.data_repo.add(&[record.relative_path.as_str()])
    }

    pub fn commit_staged_data(&self, message: &str) -> Result<String> {
        self.data_repo.commit(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    struct FixedSource {
        records: Vec<(&'static str, serde_json::Value)>,
    }

    #[async_trait]
    impl ProjectDataSource for FixedSource {
        fn name(&self) -> &str {
            "Fixed"
        }

        fn dirname(&self) -> &str {
            "NGIS"
        }

        async fn get_data(
            &self,
            project_id: Option<&str>,
        ) -> Result<BTreeMap<String, ProjectDataRecord>> {
            let mut data = BTreeMap::new();
            for (path, value) in &self.records {
                let record = ProjectDataRecord::new(path, Some(value.clone()))?;
                if project_id.map_or(true, |id| id == record.project_id) {
                    data.insert(record.project_id.clone(), record);
                }
            }
            Ok(data)
        }
    }

    fn master_with(temp_dir: &TempDir, records: Vec<(&'static str, serde_json::Value)>) -> ProjectDataMaster {
        let config = DailyReadConfig {
            fetch_from_ngis: false,
            data_location: temp_dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        ProjectDataMaster::with_sources(&config, vec![Box::new(FixedSource { records })]).unwrap()
    }

    #[tokio::test]
    async fn test_save_requires_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let mut master = master_with(&temp_dir, vec![]);
        assert!(master.save_data().is_err());
    }

    #[tokio::test]
    async fn test_project_filter_is_forwarded() {
        let temp_dir = TempDir::new().unwrap();
        let mut master = master_with(
            &temp_dir,
            vec![
                ("NGIS/2023/NGI1.json", json!({"orderer": "a@b.se"})),
                ("NGIS/2023/NGI2.json", json!({"orderer": "c@d.se"})),
            ],
        );

        master.get_data(Some("NGI2")).await.unwrap();
        assert_eq!(master.data.keys().collect::<Vec<_>>(), vec!["NGI2"]);
        assert_eq!(master.source_names(), vec!["Fixed"]);
    }

    #[tokio::test]
    async fn test_unchanged_data_is_not_reported_twice() {
        let temp_dir = TempDir::new().unwrap();
        let mut master = master_with(
            &temp_dir,
            vec![("NGIS/2023/NGI1.json", json!({"orderer": "a@b.se"}))],
        );

        master.get_data(None).await.unwrap();
        master.save_data().unwrap();
        let modified = master.get_modified_or_new_projects().unwrap();
        assert_eq!(modified.len(), 1);

        master.stage_data_for_project(&modified[0]).unwrap();
        master.commit_staged_data("Report NGI1").unwrap();

        master.save_data().unwrap();
        assert!(!master.any_modified_or_new().unwrap());
        assert!(master.get_modified_or_new_projects().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_project_file_is_reported_without_data() {
        let temp_dir = TempDir::new().unwrap();
        let mut master = master_with(
            &temp_dir,
            vec![("NGIS/2023/NGI1.json", json!({"orderer": "a@b.se"}))],
        );

        master.get_data(None).await.unwrap();
        master.save_data().unwrap();
        let record = master.data["NGI1"].clone();
        master.stage_data_for_project(&record).unwrap();
        master.commit_staged_data("Report NGI1").unwrap();

        std::fs::remove_file(temp_dir.path().join("NGIS/2023/NGI1.json")).unwrap();
        master.data.clear();

        let modified = master.get_modified_or_new_projects().unwrap();
        assert_eq!(modified.len(), 1);
        assert_eq!(modified[0].project_id, "NGI1");
        assert!(modified[0].data.is_none());
        assert!(modified[0].orderer.is_none());
        assert!(master.find_unique_orderers().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_fails_when_year_path_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut master = master_with(
            &temp_dir,
            vec![("NGIS/2023/NGI1.json", json!({"orderer": "a@b.se"}))],
        );
        std::fs::create_dir_all(temp_dir.path().join("NGIS")).unwrap();
        std::fs::write(temp_dir.path().join("NGIS/2023"), "not a directory").unwrap();

        master.get_data(None).await.unwrap();
        let err = master.save_data().unwrap_err();
        assert!(matches!(err, DailyReadError::DataLocationError { .. }));
        assert!(!temp_dir.path().join("NGIS/2023/NGI1.json").exists());
    }
}
