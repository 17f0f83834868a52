//! Idempotent import of categories and rules from static descriptors
//!
//! Running the pipeline twice over the same data leaves the database
//! unchanged after the first run: categories are upserted by slug and rules
//! whose slug already exists are skipped. Per-descriptor problems are logged
//! and skipped; only storage failures abort the run.

use std::path::Path;

use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::model::{CategorySeed, NewRule, RuleSeed, RuleStats};
use crate::repository::{Catalog, Outcome};
use crate::text::slugify;

/// Whether inserted rules start with zeroed or randomized counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricsMode {
    /// All counters start at zero
    #[default]
    Zeroed,
    /// Demo data: counters drawn from the fixture ranges
    Fixture,
}

impl std::str::FromStr for MetricsMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "zeroed" => Ok(MetricsMode::Zeroed),
            "fixture" => Ok(MetricsMode::Fixture),
            other => Err(AppError::Config(format!(
                "SEED_MODE must be `production` or `fixture`, got `{other}`"
            ))),
        }
    }
}

pub const FIXTURE_VIEWS: std::ops::RangeInclusive<u64> = 50..=500;
pub const FIXTURE_COPIES: std::ops::RangeInclusive<u64> = 10..=150;
pub const FIXTURE_UPVOTES: std::ops::RangeInclusive<u64> = 5..=80;
pub const FIXTURE_DOWNVOTES: std::ops::RangeInclusive<u64> = 0..=15;

impl MetricsMode {
    pub fn initial_stats<R: Rng + ?Sized>(self, rng: &mut R) -> RuleStats {
        match self {
            MetricsMode::Zeroed => RuleStats::default(),
            MetricsMode::Fixture => RuleStats {
                view_count: rng.random_range(FIXTURE_VIEWS),
                copy_count: rng.random_range(FIXTURE_COPIES),
                upvotes: rng.random_range(FIXTURE_UPVOTES),
                downvotes: rng.random_range(FIXTURE_DOWNVOTES),
            },
        }
    }
}

/// Everything one seed run imports
#[derive(Deserialize, Debug, Clone, Default)]
pub struct SeedData {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub rules: Vec<RuleSeed>,
}

impl SeedData {
    /// Loads descriptors from a JSON file shaped `{"categories": [...], "rules": [...]}`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::SeedData(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::SeedData(format!("invalid seed file {}: {e}", path.display())))
    }
}

/// Counts of what a seed run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories_created: usize,
    pub categories_existing: usize,
    pub categories_rejected: usize,
    pub rules_created: usize,
    pub rules_skipped: usize,
    pub rules_rejected: usize,
    /// Category names on rule descriptors that did not resolve
    pub categorizations_skipped: usize,
}

/// Imports `data` into `catalog`.
///
/// Returns `Err` only for storage or serialization failures; descriptors
/// with an empty slug or unknown category names are logged and skipped.
pub fn run<R: Rng + ?Sized>(
    catalog: &Catalog,
    data: &SeedData,
    mode: MetricsMode,
    rng: &mut R,
) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();

    for seed in &data.categories {
        match catalog.upsert_category(seed) {
            Ok(Outcome::Created(category)) => {
                info!(slug = %category.slug, id = category.id, "category created");
                report.categories_created += 1;
            }
            Ok(Outcome::Existing(category)) => {
                info!(slug = %category.slug, id = category.id, "category exists");
                report.categories_existing += 1;
            }
            Err(AppError::EmptySlug(name)) => {
                warn!(name = %name, "category name has no usable slug, skipped");
                report.categories_rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    for seed in &data.rules {
        let slug = slugify(&seed.title);
        if slug.is_empty() {
            warn!(title = %seed.title, "rule title has no usable slug, skipped");
            report.rules_rejected += 1;
            continue;
        }

        if catalog.get_rule(&slug)?.is_some() {
            info!(slug = %slug, "rule exists, skipped");
            report.rules_skipped += 1;
            continue;
        }

        let mut category_ids = Vec::with_capacity(seed.categories.len());
        for name in &seed.categories {
            let category_slug = slugify(name);
            match catalog.find_category(&category_slug)? {
                Some(category) => category_ids.push(category.id),
                None => {
                    warn!(rule = %slug, category = %name, "category not found, categorization skipped");
                    report.categorizations_skipped += 1;
                }
            }
        }

        let rule = NewRule {
            slug: slug.clone(),
            title: seed.title.clone(),
            description: seed.description.clone(),
            content: seed.content.clone(),
            is_published: seed.is_published.unwrap_or(true),
            author: seed.author.clone(),
            tags: seed.tags.clone(),
            application_mode: seed.application_mode,
            globs: seed.globs.clone(),
            stats: mode.initial_stats(rng),
        };

        match catalog.insert_rule(rule, &category_ids)? {
            Outcome::Created(id) => {
                info!(slug = %slug, id, categories = category_ids.len(), "rule created");
                report.rules_created += 1;
            }
            Outcome::Existing(_) => {
                info!(slug = %slug, "rule exists, skipped");
                report.rules_skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Opens the catalog at `db_path`, hands it to `f`, and releases it afterwards.
///
/// The handle is dropped before this returns whether `f` succeeds or fails.
pub fn with_catalog<T>(
    db_path: &str,
    f: impl FnOnce(&Catalog) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let catalog = Catalog::open(db_path)?;
    info!(path = %db_path, "database opened");

    let result = f(&catalog);
    drop(catalog);
    info!(path = %db_path, ok = result.is_ok(), "database released");

    result
}
