//! Process-wide challenge registry.
//!
//! The registry owns the loaded challenge catalog and serves lookups, filtered
//! listings, and progression queries. Reads never block behind a load:
//! the catalog is an immutable [`RegistryIndex`] behind an `Arc`, and reloads
//! build a complete replacement index off to the side before swapping it in.
//! Initialization is idempotent and single-flight: concurrent callers of
//! [`ChallengeRegistry::initialize`] trigger exactly one directory scan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::challenge::{
    ChallengeCategory, ChallengeConfig, ChallengeFlags, ChallengeLoader, ChallengeMetadata,
    ProgressionConfig, QualityThresholds,
};
use crate::error::RegistryError;

/// Immutable snapshot of the loaded catalog.
///
/// `order` preserves load order (file-name order); `by_id` backs O(1) lookup.
#[derive(Debug, Default)]
struct RegistryIndex {
    order: Vec<Arc<ChallengeConfig>>,
    by_id: HashMap<String, Arc<ChallengeConfig>>,
}

impl RegistryIndex {
    fn from_challenges(challenges: Vec<Arc<ChallengeConfig>>) -> Self {
        let by_id = challenges
            .iter()
            .map(|c| (c.id.clone(), Arc::clone(c)))
            .collect();
        Self {
            order: challenges,
            by_id,
        }
    }
}

/// Filters applied to catalog listings. All populated fields must match
/// (AND); within `tags`, any overlap matches (OR).
#[derive(Debug, Default, Clone)]
pub struct ChallengeFilters {
    pub category: Option<ChallengeCategory>,
    pub difficulty: Option<u8>,
    pub tags: Option<Vec<String>>,
    pub tenant_id: Option<String>,
}

/// Reduced challenge view for listing surfaces: enough to render a catalog
/// card without shipping rubric internals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSummary {
    pub id: String,
    pub version: String,
    pub metadata: ChallengeMetadata,
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    pub max_score: u32,
    pub thresholds: QualityThresholds,
    pub progression: ProgressionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<ChallengeFlags>,
}

impl From<&ChallengeConfig> for ChallengeSummary {
    fn from(c: &ChallengeConfig) -> Self {
        Self {
            id: c.id.clone(),
            version: c.version.clone(),
            metadata: c.metadata.clone(),
            headline: c.content.scenario.headline.clone(),
            persona: c.content.scenario.persona.clone(),
            max_score: c.scoring.max_score,
            thresholds: c.scoring.thresholds,
            progression: c.progression.clone(),
            flags: c.flags.clone(),
        }
    }
}

/// Registry over a challenge source directory.
pub struct ChallengeRegistry {
    source_dir: PathBuf,
    index: RwLock<Arc<RegistryIndex>>,
    init_lock: tokio::sync::Mutex<()>,
    initialized: AtomicBool,
}

impl ChallengeRegistry {
    /// Creates a registry over the given directory. No IO happens until
    /// [`initialize`](Self::initialize) is called; reads before then see an
    /// empty catalog.
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            index: RwLock::new(Arc::new(RegistryIndex::default())),
            init_lock: tokio::sync::Mutex::new(()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Loads the catalog if it has not been loaded yet.
    ///
    /// Safe to call from many tasks at once: exactly one performs the scan,
    /// the rest wait and return once the catalog is visible.
    pub async fn initialize(&self) -> Result<(), RegistryError> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        let _guard = self.init_lock.lock().await;
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        let index = self.build_index()?;
        *self.index.write().expect("registry index lock poisoned") = Arc::new(index);
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Rebuilds the catalog from disk and swaps it in atomically.
    ///
    /// Readers either see the complete old catalog or the complete new one.
    /// On failure the current catalog is left untouched.
    pub async fn reload(&self) -> Result<usize, RegistryError> {
        let _guard = self.init_lock.lock().await;
        let index = self.build_index()?;
        let count = index.order.len();
        *self.index.write().expect("registry index lock poisoned") = Arc::new(index);
        self.initialized.store(true, Ordering::Release);
        tracing::info!(count, "Registry reloaded");
        Ok(count)
    }

    fn build_index(&self) -> Result<RegistryIndex, RegistryError> {
        let mut loader = ChallengeLoader::new();
        let challenges = loader.load_directory(&self.source_dir)?;
        Ok(RegistryIndex::from_challenges(challenges))
    }

    fn snapshot(&self) -> Arc<RegistryIndex> {
        Arc::clone(&self.index.read().expect("registry index lock poisoned"))
    }

    /// Looks up a challenge by id.
    pub fn get(&self, id: &str) -> Result<Arc<ChallengeConfig>, RegistryError> {
        self.get_opt(id)
            .ok_or_else(|| RegistryError::ChallengeNotFound(id.to_string()))
    }

    /// Looks up a challenge by id, returning `None` when absent.
    pub fn get_opt(&self, id: &str) -> Option<Arc<ChallengeConfig>> {
        self.snapshot().by_id.get(id).cloned()
    }

    /// Lists challenges matching the filters, sorted by difficulty ascending.
    /// The sort is stable, so equal-difficulty challenges keep load order.
    pub fn get_all(&self, filters: &ChallengeFilters) -> Vec<Arc<ChallengeConfig>> {
        let snapshot = self.snapshot();
        let mut matched: Vec<Arc<ChallengeConfig>> = snapshot
            .order
            .iter()
            .filter(|c| Self::matches(c, filters))
            .cloned()
            .collect();
        matched.sort_by_key(|c| c.metadata.difficulty);
        matched
    }

    fn matches(challenge: &ChallengeConfig, filters: &ChallengeFilters) -> bool {
        if let Some(category) = filters.category {
            if challenge.metadata.category != category {
                return false;
            }
        }
        if let Some(difficulty) = filters.difficulty {
            if challenge.metadata.difficulty != difficulty {
                return false;
            }
        }
        if let Some(tags) = &filters.tags {
            if !tags.iter().any(|t| challenge.metadata.tags.contains(t)) {
                return false;
            }
        }
        if let Some(tenant_id) = &filters.tenant_id {
            if !challenge.allows_tenant(tenant_id) {
                return false;
            }
        }
        true
    }

    /// Lists featured challenges in load order.
    pub fn get_featured(&self) -> Vec<Arc<ChallengeConfig>> {
        self.snapshot()
            .order
            .iter()
            .filter(|c| c.is_featured())
            .cloned()
            .collect()
    }

    /// Distinct categories present in the catalog, sorted by name.
    pub fn get_categories(&self) -> Vec<ChallengeCategory> {
        let snapshot = self.snapshot();
        let mut categories: Vec<ChallengeCategory> = ChallengeCategory::ALL
            .into_iter()
            .filter(|cat| snapshot.order.iter().any(|c| c.metadata.category == *cat))
            .collect();
        categories.sort_by_key(|c| c.as_str());
        categories
    }

    /// Challenges unlocked by the given completion state: every prerequisite
    /// completed with a best score of at least `unlockScore` (default 0), and
    /// the challenge itself not yet completed. Sorted by difficulty.
    pub fn get_next_challenges(
        &self,
        completed: &[String],
        best_scores: &HashMap<String, f64>,
    ) -> Vec<Arc<ChallengeConfig>> {
        let snapshot = self.snapshot();
        let mut eligible: Vec<Arc<ChallengeConfig>> = snapshot
            .order
            .iter()
            .filter(|c| !completed.contains(&c.id))
            .filter(|c| {
                let unlock_score = f64::from(c.progression.unlock_score.unwrap_or(0));
                match &c.progression.prerequisites {
                    None => true,
                    Some(prereqs) => prereqs.iter().all(|p| {
                        completed.contains(p)
                            && best_scores.get(p).copied().unwrap_or(0.0) >= unlock_score
                    }),
                }
            })
            .cloned()
            .collect();
        eligible.sort_by_key(|c| c.metadata.difficulty);
        eligible
    }

    /// Catalog summaries matching the filters, sorted by difficulty.
    pub fn summaries(&self, filters: &ChallengeFilters) -> Vec<ChallengeSummary> {
        self.get_all(filters)
            .iter()
            .map(|c| ChallengeSummary::from(c.as_ref()))
            .collect()
    }

    /// Number of loaded challenges.
    pub fn len(&self) -> usize {
        self.snapshot().order.len()
    }

    /// True when no challenges are loaded.
    pub fn is_empty(&self) -> bool {
        self.snapshot().order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::test_fixtures::sample_challenge;
    use std::fs;
    use tempfile::tempdir;

    fn write_challenge(dir: &Path, file: &str, config: &ChallengeConfig) {
        fs::write(
            dir.join(file),
            serde_yaml::to_string(config).expect("serialize"),
        )
        .expect("write");
    }

    fn seeded_registry(dir: &Path) -> ChallengeRegistry {
        let mut a = sample_challenge("alpha");
        a.metadata.difficulty = 3;
        a.metadata.tags = vec!["email".to_string()];
        let mut b = sample_challenge("bravo");
        b.metadata.difficulty = 1;
        b.metadata.category = ChallengeCategory::Analysis;
        b.metadata.tags = vec!["data".to_string()];
        let mut c = sample_challenge("charlie");
        c.metadata.difficulty = 1;
        c.flags = Some(ChallengeFlags {
            is_active: true,
            is_featured: true,
            is_experimental: false,
            allowed_tenants: Some(vec!["acme".to_string()]),
            start_date: None,
            end_date: None,
        });

        write_challenge(dir, "a.yaml", &a);
        write_challenge(dir, "b.yaml", &b);
        write_challenge(dir, "c.yaml", &c);
        ChallengeRegistry::new(dir)
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let registry = seeded_registry(dir.path());

        registry.initialize().await.expect("init");
        assert_eq!(registry.len(), 3);
        registry.initialize().await.expect("init again");
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_initialize_runs_one_load() {
        let dir = tempdir().expect("tempdir");
        let registry = Arc::new(seeded_registry(dir.path()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move { registry.initialize().await }));
        }
        for handle in handles {
            handle.await.expect("join").expect("init");
        }
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn reads_before_initialize_see_an_empty_catalog() {
        let dir = tempdir().expect("tempdir");
        let registry = seeded_registry(dir.path());

        assert!(registry.is_empty());
        assert!(registry.get_opt("alpha").is_none());
        assert!(matches!(
            registry.get("alpha"),
            Err(RegistryError::ChallengeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn get_all_sorts_by_difficulty_stably() {
        let dir = tempdir().expect("tempdir");
        let registry = seeded_registry(dir.path());
        registry.initialize().await.expect("init");

        let all = registry.get_all(&ChallengeFilters::default());
        let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
        // bravo and charlie share difficulty 1 and keep load order.
        assert_eq!(ids, vec!["bravo", "charlie", "alpha"]);
    }

    #[tokio::test]
    async fn filters_combine_with_and_semantics() {
        let dir = tempdir().expect("tempdir");
        let registry = seeded_registry(dir.path());
        registry.initialize().await.expect("init");

        let filtered = registry.get_all(&ChallengeFilters {
            category: Some(ChallengeCategory::Analysis),
            difficulty: Some(1),
            ..Default::default()
        });
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "bravo");

        // Same category, wrong difficulty.
        let filtered = registry.get_all(&ChallengeFilters {
            category: Some(ChallengeCategory::Analysis),
            difficulty: Some(5),
            ..Default::default()
        });
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn tag_filter_matches_any_overlap() {
        let dir = tempdir().expect("tempdir");
        let registry = seeded_registry(dir.path());
        registry.initialize().await.expect("init");

        let filtered = registry.get_all(&ChallengeFilters {
            tags: Some(vec!["email".to_string(), "unrelated".to_string()]),
            ..Default::default()
        });
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "alpha");
    }

    #[tokio::test]
    async fn tenant_filter_respects_allow_lists() {
        let dir = tempdir().expect("tempdir");
        let registry = seeded_registry(dir.path());
        registry.initialize().await.expect("init");

        let acme = registry.get_all(&ChallengeFilters {
            tenant_id: Some("acme".to_string()),
            ..Default::default()
        });
        assert_eq!(acme.len(), 3);

        let globex = registry.get_all(&ChallengeFilters {
            tenant_id: Some("globex".to_string()),
            ..Default::default()
        });
        let ids: Vec<&str> = globex.iter().map(|c| c.id.as_str()).collect();
        assert!(!ids.contains(&"charlie"));
    }

    #[tokio::test]
    async fn featured_and_categories() {
        let dir = tempdir().expect("tempdir");
        let registry = seeded_registry(dir.path());
        registry.initialize().await.expect("init");

        let featured = registry.get_featured();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].id, "charlie");

        assert_eq!(
            registry.get_categories(),
            vec![
                ChallengeCategory::Analysis,
                ChallengeCategory::Summarization
            ]
        );
    }

    #[tokio::test]
    async fn unlock_score_boundary_is_inclusive() {
        let dir = tempdir().expect("tempdir");
        let mut gated = sample_challenge("gated");
        gated.progression.prerequisites = Some(vec!["opener".to_string()]);
        gated.progression.unlock_score = Some(50);
        write_challenge(dir.path(), "gated.yaml", &gated);
        write_challenge(dir.path(), "opener.yaml", &sample_challenge("opener"));

        let registry = ChallengeRegistry::new(dir.path());
        registry.initialize().await.expect("init");

        let completed = vec!["opener".to_string()];
        let mut best = HashMap::new();

        best.insert("opener".to_string(), 40.0);
        let next = registry.get_next_challenges(&completed, &best);
        assert!(!next.iter().any(|c| c.id == "gated"));

        best.insert("opener".to_string(), 50.0);
        let next = registry.get_next_challenges(&completed, &best);
        assert!(next.iter().any(|c| c.id == "gated"));
    }

    #[tokio::test]
    async fn reload_swaps_in_new_catalog() {
        let dir = tempdir().expect("tempdir");
        write_challenge(dir.path(), "a.yaml", &sample_challenge("original"));

        let registry = ChallengeRegistry::new(dir.path());
        registry.initialize().await.expect("init");
        assert_eq!(registry.len(), 1);

        write_challenge(dir.path(), "b.yaml", &sample_challenge("added-later"));
        let count = registry.reload().await.expect("reload");
        assert_eq!(count, 2);
        assert!(registry.get_opt("added-later").is_some());
    }

    #[tokio::test]
    async fn summaries_reduce_the_config() {
        let dir = tempdir().expect("tempdir");
        let registry = seeded_registry(dir.path());
        registry.initialize().await.expect("init");

        let summaries = registry.summaries(&ChallengeFilters::default());
        assert_eq!(summaries.len(), 3);
        let alpha = summaries.iter().find(|s| s.id == "alpha").expect("alpha");
        assert_eq!(alpha.max_score, 100);
        assert!(!alpha.headline.is_empty());
    }
}
