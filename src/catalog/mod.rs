use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::store::{DataStore, Filter, OrderBy, StoreError};

pub const PAPERS_TABLE: &str = "papers";

/// One downloadable exam paper.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub id: String,
    pub title: String,
    pub level: String,
    pub subject: String,
    pub year: i32,
    pub file_url: String,
    /// Epoch seconds, set on insert.
    pub created_at: i64,
}

/// Fields an admin submits when adding a paper.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewPaper {
    pub title: String,
    pub level: String,
    pub subject: String,
    pub year: i32,
    pub file_url: String,
}

/// Query-side equality filters. Absent fields match everything.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PaperFilter {
    pub level: Option<String>,
    pub subject: Option<String>,
    pub year: Option<i32>,
}

/// Options for the cascading filter controls: choosing a level narrows the
/// subjects offered, and level plus subject narrow the years.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub levels: Vec<String>,
    pub subjects: Vec<String>,
    pub years: Vec<i32>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("paper row could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DataStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    fn filters_for(filter: &PaperFilter) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(level) = &filter.level {
            filters.push(Filter::eq("level", level.as_str()));
        }
        if let Some(subject) = &filter.subject {
            filters.push(Filter::eq("subject", subject.as_str()));
        }
        if let Some(year) = filter.year {
            filters.push(Filter::eq("year", year));
        }
        filters
    }

    /// Papers matching the filter, newest year first.
    pub async fn list(&self, filter: &PaperFilter) -> Result<Vec<Paper>, CatalogError> {
        let order = OrderBy { field: "year".to_string(), descending: true };
        let rows = self.store
            .select(PAPERS_TABLE, &Self::filters_for(filter), Some(&order))
            .await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(CatalogError::from))
            .collect()
    }

    pub async fn options(
        &self,
        level: Option<&str>,
        subject: Option<&str>,
    ) -> Result<FilterOptions, CatalogError> {
        let rows = self.store.select(PAPERS_TABLE, &[], None).await?;
        let papers: Vec<Paper> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?;

        let mut levels: Vec<String> = papers.iter().map(|p| p.level.clone()).collect();
        levels.sort();
        levels.dedup();

        let mut subjects: Vec<String> = papers
            .iter()
            .filter(|p| level.map_or(true, |l| p.level == l))
            .map(|p| p.subject.clone())
            .collect();
        subjects.sort();
        subjects.dedup();

        let mut years: Vec<i32> = papers
            .iter()
            .filter(|p| level.map_or(true, |l| p.level == l))
            .filter(|p| subject.map_or(true, |s| p.subject == s))
            .map(|p| p.year)
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();

        Ok(FilterOptions { levels, subjects, years })
    }

    pub async fn add(&self, new: NewPaper) -> Result<Paper, CatalogError> {
        let paper = Paper {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            level: new.level,
            subject: new.subject,
            year: new.year,
            file_url: new.file_url,
            created_at: Utc::now().timestamp(),
        };
        let row = serde_json::to_value(&paper)?;
        self.store.insert(PAPERS_TABLE, row).await?;
        Ok(paper)
    }

    pub async fn remove(&self, id: &str) -> Result<usize, CatalogError> {
        Ok(self.store.delete(PAPERS_TABLE, &[Filter::eq("id", id)]).await?)
    }

    /// Loads the seed list shipped with the deployment. A missing file is
    /// not fatal; the catalog just starts empty.
    pub async fn seed_from_file(&self, path: &str) -> Result<usize, CatalogError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Papers seed file not found at {}: {}. Starting with an empty catalog.",
                    path, e
                );
                return Ok(0);
            }
        };

        let seeds: Vec<NewPaper> = serde_json::from_str(&text)?;
        let mut count = 0;
        for seed in seeds {
            self.add(seed).await?;
            count += 1;
        }
        info!("Seeded {} papers from {}", count, path);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn paper(title: &str, level: &str, subject: &str, year: i32) -> NewPaper {
        NewPaper {
            title: title.to_string(),
            level: level.to_string(),
            subject: subject.to_string(),
            year,
            file_url: format!("https://files.polypros.example/{}.pdf", title),
        }
    }

    async fn seeded_catalog() -> CatalogService {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        catalog.add(paper("em1-2021", "Year 1", "Engineering Mathematics", 2021)).await.unwrap();
        catalog.add(paper("em1-2023", "Year 1", "Engineering Mathematics", 2023)).await.unwrap();
        catalog.add(paper("prog-2022", "Year 1", "Programming", 2022)).await.unwrap();
        catalog.add(paper("net-2023", "Year 2", "Networking", 2023)).await.unwrap();
        catalog
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let catalog = seeded_catalog().await;

        let filter = PaperFilter {
            level: Some("Year 1".to_string()),
            subject: Some("Engineering Mathematics".to_string()),
            year: None,
        };
        let papers = catalog.list(&filter).await.unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].year, 2023);
        assert_eq!(papers[1].year, 2021);
    }

    #[tokio::test]
    async fn list_by_year_matches_exactly() {
        let catalog = seeded_catalog().await;
        let filter = PaperFilter { year: Some(2023), ..Default::default() };
        let papers = catalog.list(&filter).await.unwrap();
        assert_eq!(papers.len(), 2);
        assert!(papers.iter().all(|p| p.year == 2023));
    }

    #[tokio::test]
    async fn options_cascade_narrows_by_selection() {
        let catalog = seeded_catalog().await;

        let all = catalog.options(None, None).await.unwrap();
        assert_eq!(all.levels, vec!["Year 1", "Year 2"]);
        assert_eq!(all.subjects.len(), 3);
        assert_eq!(all.years, vec![2023, 2022, 2021]);

        let year_one = catalog.options(Some("Year 1"), None).await.unwrap();
        assert_eq!(year_one.subjects, vec!["Engineering Mathematics", "Programming"]);

        let narrowed = catalog
            .options(Some("Year 1"), Some("Engineering Mathematics"))
            .await
            .unwrap();
        assert_eq!(narrowed.years, vec![2023, 2021]);
    }

    #[tokio::test]
    async fn remove_deletes_by_id() {
        let catalog = seeded_catalog().await;
        let before = catalog.list(&PaperFilter::default()).await.unwrap();

        let removed = catalog.remove(&before[0].id).await.unwrap();
        assert_eq!(removed, 1);

        let after = catalog.list(&PaperFilter::default()).await.unwrap();
        assert_eq!(after.len(), before.len() - 1);
        assert!(after.iter().all(|p| p.id != before[0].id));
    }

    #[tokio::test]
    async fn seed_from_missing_file_is_empty_catalog() {
        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let count = catalog.seed_from_file("/nonexistent/papers.json").await.unwrap();
        assert_eq!(count, 0);
        assert!(catalog.list(&PaperFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seed_from_file_loads_rows() {
        let path = std::env::temp_dir().join(format!("papers-{}.json", Uuid::new_v4()));
        let seeds = vec![
            paper("a", "Year 1", "Programming", 2020),
            paper("b", "Year 2", "Networking", 2021),
        ];
        fs::write(&path, serde_json::to_string(&seeds).unwrap()).unwrap();

        let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
        let count = catalog.seed_from_file(path.to_str().unwrap()).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(catalog.list(&PaperFilter::default()).await.unwrap().len(), 2);

        let _ = fs::remove_file(&path);
    }
}
