//! Catalog: the connection-scoped client over the rule database
//!
//! Every operation runs in its own redb transaction. redb admits a single
//! writer at a time, so counter bumps done inside one write transaction
//! cannot lose updates even when many requests hit the same rule.

use std::sync::Arc;

use chrono::Utc;
use redb::{
    Database, ReadOnlyTable, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    WriteTransaction,
};

use crate::database::{
    init_db, TABLE_CATEGORIES, TABLE_CATEGORY_IDS, TABLE_CATEGORY_RULES, TABLE_RULES,
    TABLE_RULE_CATEGORIES, TABLE_RULE_COUNTERS, TABLE_RULE_IDS, TABLE_SEQUENCES,
};
use crate::error::AppError;
use crate::model::{
    Category, CategorySeed, CategorySummary, Counter, ListParams, NewRule, Rule, RuleRecord,
    RuleStats, RuleSummary,
};
use crate::text::{slugify, truncate};

/// Length of the content excerpt in rule listings, in characters.
pub const EXCERPT_LEN: usize = 160;

const CATEGORY_SEQUENCE: &str = "categories";
const RULE_SEQUENCE: &str = "rules";

/// Result of a create-if-absent write
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// A new row was written
    Created(T),
    /// A row with the same slug already existed and was left unchanged
    Existing(T),
}

impl<T> Outcome<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Outcome::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Outcome::Created(value) | Outcome::Existing(value) => value,
        }
    }
}

#[derive(Clone)]
pub struct Catalog {
    db: Arc<Database>,
}

impl Catalog {
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Opens (or creates) the database at `path` with all tables in place.
    pub fn open(path: &str) -> Result<Self, AppError> {
        Ok(Self::new(init_db(path)?))
    }

    /// Creates the category if no category with the same slug exists.
    ///
    /// Existing rows are returned untouched; descriptive fields from `seed`
    /// are ignored in that case.
    pub fn upsert_category(&self, seed: &CategorySeed) -> Result<Outcome<Category>, AppError> {
        let slug = slugify(&seed.name);
        if slug.is_empty() {
            return Err(AppError::EmptySlug(seed.name.clone()));
        }

        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut categories = write_txn.open_table(TABLE_CATEGORIES)?;
            let existing = categories
                .get(slug.as_str())?
                .map(|guard| guard.value().to_string());

            match existing {
                Some(json) => Outcome::Existing(serde_json::from_str::<Category>(&json)?),
                None => {
                    let category = Category {
                        id: next_id(&write_txn, CATEGORY_SEQUENCE)?,
                        slug: slug.clone(),
                        name: seed.name.clone(),
                        description: seed.description.clone(),
                        icon: seed.icon.clone(),
                    };
                    let json = serde_json::to_string(&category)?;
                    categories.insert(slug.as_str(), json.as_str())?;

                    let mut ids = write_txn.open_table(TABLE_CATEGORY_IDS)?;
                    ids.insert(category.id, slug.as_str())?;

                    Outcome::Created(category)
                }
            }
        };
        write_txn.commit()?;

        Ok(outcome)
    }

    pub fn find_category(&self, slug: &str) -> Result<Option<Category>, AppError> {
        Reader::open(&self.db)?.category(slug)
    }

    /// All categories ordered by slug, each with its published rule count.
    pub fn list_categories(&self) -> Result<Vec<CategorySummary>, AppError> {
        let reader = Reader::open(&self.db)?;
        let mut summaries = Vec::new();

        for entry in reader.categories.iter()? {
            let (_, value) = entry?;
            let category: Category = serde_json::from_str(value.value())?;
            let rule_count = reader.published_in(category.id)?.len();
            summaries.push(CategorySummary {
                category,
                rule_count,
            });
        }

        Ok(summaries)
    }

    /// Inserts a rule unless one with the same slug already exists.
    ///
    /// The record, its counters and its join rows are written in one
    /// transaction. Category ids that do not resolve are ignored.
    pub fn insert_rule(
        &self,
        rule: NewRule,
        category_ids: &[u64],
    ) -> Result<Outcome<u64>, AppError> {
        if rule.slug.is_empty() {
            return Err(AppError::EmptySlug(rule.title));
        }

        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut rules = write_txn.open_table(TABLE_RULES)?;
            let existing = rules
                .get(rule.slug.as_str())?
                .map(|guard| guard.value().to_string());

            match existing {
                Some(json) => {
                    let record: RuleRecord = serde_json::from_str(&json)?;
                    Outcome::Existing(record.id)
                }
                None => {
                    let id = next_id(&write_txn, RULE_SEQUENCE)?;
                    let record = RuleRecord {
                        id,
                        slug: rule.slug.clone(),
                        title: rule.title,
                        description: rule.description,
                        content: rule.content,
                        is_published: rule.is_published,
                        created_at: Utc::now(),
                        author: rule.author,
                        tags: rule.tags,
                        application_mode: rule.application_mode,
                        globs: rule.globs,
                    };
                    let json = serde_json::to_string(&record)?;
                    rules.insert(record.slug.as_str(), json.as_str())?;

                    let mut rule_ids = write_txn.open_table(TABLE_RULE_IDS)?;
                    rule_ids.insert(id, record.slug.as_str())?;

                    let mut counters = write_txn.open_table(TABLE_RULE_COUNTERS)?;
                    counters.insert(record.slug.as_str(), rule.stats.to_row())?;

                    let category_index = write_txn.open_table(TABLE_CATEGORY_IDS)?;
                    let mut rule_categories = write_txn.open_table(TABLE_RULE_CATEGORIES)?;
                    let mut category_rules = write_txn.open_table(TABLE_CATEGORY_RULES)?;
                    for &category_id in category_ids {
                        if category_index.get(category_id)?.is_none() {
                            tracing::warn!(rule = %record.slug, category_id, "unknown category id, not linked");
                            continue;
                        }
                        rule_categories.insert((id, category_id), ())?;
                        category_rules.insert((category_id, id), ())?;
                    }

                    Outcome::Created(id)
                }
            }
        };
        write_txn.commit()?;

        Ok(outcome)
    }

    pub fn get_rule(&self, slug: &str) -> Result<Option<Rule>, AppError> {
        Reader::open(&self.db)?.rule(slug)
    }

    /// Published rules ordered by slug, optionally restricted to a category.
    pub fn list_rules(&self, params: &ListParams) -> Result<Vec<RuleSummary>, AppError> {
        let reader = Reader::open(&self.db)?;

        let records = match params.category.as_deref() {
            Some(category_slug) => {
                let category = reader
                    .category(category_slug)?
                    .ok_or_else(|| AppError::CategoryNotFound(category_slug.to_string()))?;
                reader.published_in(category.id)?
            }
            None => reader.published()?,
        };

        records
            .into_iter()
            .skip(params.offset())
            .take(params.limit())
            .map(|record| reader.summary(record))
            .collect()
    }

    /// Published rule summaries attached to the category, ordered by slug.
    pub fn rules_in_category(&self, category_id: u64) -> Result<Vec<RuleSummary>, AppError> {
        let reader = Reader::open(&self.db)?;
        reader
            .published_in(category_id)?
            .into_iter()
            .map(|record| reader.summary(record))
            .collect()
    }

    /// Counters of a published rule. Drafts read as absent.
    pub fn rule_stats(&self, slug: &str) -> Result<Option<RuleStats>, AppError> {
        let reader = Reader::open(&self.db)?;
        match reader.record(slug)? {
            Some(record) if record.is_published => Ok(Some(reader.stats(slug)?)),
            _ => Ok(None),
        }
    }

    /// Bumps one counter by one and returns the updated counters.
    ///
    /// The read and the write happen inside the same write transaction.
    /// Unpublished rules are reported as not found.
    pub fn increment(&self, slug: &str, counter: Counter) -> Result<RuleStats, AppError> {
        let write_txn = self.db.begin_write()?;
        let stats = {
            let rules = write_txn.open_table(TABLE_RULES)?;
            let record: Option<RuleRecord> = match rules.get(slug)? {
                Some(guard) => Some(serde_json::from_str(guard.value())?),
                None => None,
            };
            if !record.is_some_and(|record| record.is_published) {
                return Err(AppError::RuleNotFound(slug.to_string()));
            }

            let mut counters = write_txn.open_table(TABLE_RULE_COUNTERS)?;
            let row = counters.get(slug)?.map(|guard| guard.value());
            let Some(row) = row else {
                return Err(AppError::RuleNotFound(slug.to_string()));
            };

            let mut stats = RuleStats::from_row(row);
            let field = match counter {
                Counter::Views => &mut stats.view_count,
                Counter::Copies => &mut stats.copy_count,
                Counter::Upvotes => &mut stats.upvotes,
                Counter::Downvotes => &mut stats.downvotes,
            };
            *field = field.saturating_add(1);

            counters.insert(slug, stats.to_row())?;
            stats
        };
        write_txn.commit()?;

        Ok(stats)
    }

    pub fn category_count(&self) -> Result<u64, AppError> {
        Ok(Reader::open(&self.db)?.categories.len()?)
    }

    pub fn rule_count(&self) -> Result<u64, AppError> {
        Ok(Reader::open(&self.db)?.rules.len()?)
    }
}

fn next_id(write_txn: &WriteTransaction, sequence: &str) -> Result<u64, AppError> {
    let mut sequences = write_txn.open_table(TABLE_SEQUENCES)?;
    let next = sequences.get(sequence)?.map(|guard| guard.value()).unwrap_or(0) + 1;
    sequences.insert(sequence, next)?;
    Ok(next)
}

/// Tables opened from a single read transaction, so one request sees one snapshot.
struct Reader {
    categories: ReadOnlyTable<&'static str, &'static str>,
    category_ids: ReadOnlyTable<u64, &'static str>,
    rules: ReadOnlyTable<&'static str, &'static str>,
    rule_ids: ReadOnlyTable<u64, &'static str>,
    counters: ReadOnlyTable<&'static str, (u64, u64, u64, u64)>,
    rule_categories: ReadOnlyTable<(u64, u64), ()>,
    category_rules: ReadOnlyTable<(u64, u64), ()>,
}

impl Reader {
    fn open(db: &Database) -> Result<Self, AppError> {
        let read_txn = db.begin_read()?;
        Ok(Self {
            categories: read_txn.open_table(TABLE_CATEGORIES)?,
            category_ids: read_txn.open_table(TABLE_CATEGORY_IDS)?,
            rules: read_txn.open_table(TABLE_RULES)?,
            rule_ids: read_txn.open_table(TABLE_RULE_IDS)?,
            counters: read_txn.open_table(TABLE_RULE_COUNTERS)?,
            rule_categories: read_txn.open_table(TABLE_RULE_CATEGORIES)?,
            category_rules: read_txn.open_table(TABLE_CATEGORY_RULES)?,
        })
    }

    fn category(&self, slug: &str) -> Result<Option<Category>, AppError> {
        match self.categories.get(slug)? {
            Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
            None => Ok(None),
        }
    }

    fn record(&self, slug: &str) -> Result<Option<RuleRecord>, AppError> {
        match self.rules.get(slug)? {
            Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
            None => Ok(None),
        }
    }

    fn stats(&self, slug: &str) -> Result<RuleStats, AppError> {
        Ok(self
            .counters
            .get(slug)?
            .map(|guard| RuleStats::from_row(guard.value()))
            .unwrap_or_default())
    }

    /// Category slugs linked to the rule, in category id order.
    fn categories_of(&self, rule_id: u64) -> Result<Vec<String>, AppError> {
        let mut slugs = Vec::new();
        for entry in self.rule_categories.range((rule_id, 0)..=(rule_id, u64::MAX))? {
            let (key, _) = entry?;
            let (_, category_id) = key.value();
            if let Some(slug) = self.category_ids.get(category_id)? {
                slugs.push(slug.value().to_string());
            }
        }
        Ok(slugs)
    }

    fn rule(&self, slug: &str) -> Result<Option<Rule>, AppError> {
        let Some(record) = self.record(slug)? else {
            return Ok(None);
        };
        let categories = self.categories_of(record.id)?;
        let stats = self.stats(&record.slug)?;
        Ok(Some(Rule::assemble(record, categories, stats)))
    }

    fn summary(&self, record: RuleRecord) -> Result<RuleSummary, AppError> {
        let categories = self.categories_of(record.id)?;
        let stats = self.stats(&record.slug)?;
        Ok(RuleSummary {
            excerpt: truncate(&record.content, EXCERPT_LEN),
            slug: record.slug,
            title: record.title,
            description: record.description,
            created_at: record.created_at,
            author: record.author,
            tags: record.tags,
            categories,
            stats,
        })
    }

    fn published(&self) -> Result<Vec<RuleRecord>, AppError> {
        let mut records = Vec::new();
        for entry in self.rules.iter()? {
            let (_, value) = entry?;
            let record: RuleRecord = serde_json::from_str(value.value())?;
            if record.is_published {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn published_in(&self, category_id: u64) -> Result<Vec<RuleRecord>, AppError> {
        let mut records = Vec::new();
        for entry in self
            .category_rules
            .range((category_id, 0)..=(category_id, u64::MAX))?
        {
            let (key, _) = entry?;
            let (_, rule_id) = key.value();
            let Some(slug) = self.rule_ids.get(rule_id)?.map(|guard| guard.value().to_string())
            else {
                continue;
            };
            if let Some(record) = self.record(&slug)? {
                if record.is_published {
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_catalog() -> (Catalog, NamedTempFile) {
        let temp_db = NamedTempFile::new().expect("Failed to create temp file");
        let catalog = Catalog::open(temp_db.path().to_str().unwrap()).unwrap();
        (catalog, temp_db)
    }

    fn category(name: &str) -> CategorySeed {
        CategorySeed {
            name: name.to_string(),
            description: format!("{name} rules"),
            icon: None,
        }
    }

    fn new_rule(title: &str) -> NewRule {
        NewRule {
            slug: slugify(title),
            title: title.to_string(),
            description: "desc".to_string(),
            content: "content".to_string(),
            is_published: true,
            author: None,
            tags: vec![],
            application_mode: None,
            globs: None,
            stats: RuleStats::default(),
        }
    }

    #[test]
    fn upsert_category_is_keyed_by_slug() {
        let (catalog, _temp_db) = test_catalog();

        let first = catalog.upsert_category(&category("Next.js")).unwrap();
        assert!(first.is_created());
        let second = catalog.upsert_category(&category("next JS")).unwrap();
        assert!(!second.is_created());

        let first = first.into_inner();
        let second = second.into_inner();
        assert_eq!(first.slug, "next-js");
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Next.js");
        assert_eq!(catalog.category_count().unwrap(), 1);
    }

    #[test]
    fn upsert_category_rejects_empty_slug() {
        let (catalog, _temp_db) = test_catalog();
        let err = catalog.upsert_category(&category("???")).unwrap_err();
        assert!(matches!(err, AppError::EmptySlug(_)));
        assert_eq!(catalog.category_count().unwrap(), 0);
    }

    #[test]
    fn insert_rule_skips_existing_slug() {
        let (catalog, _temp_db) = test_catalog();

        let first = catalog.insert_rule(new_rule("React Hooks Expert"), &[]).unwrap();
        let second = catalog.insert_rule(new_rule("React Hooks Expert"), &[]).unwrap();

        assert!(first.is_created());
        assert_eq!(second, Outcome::Existing(first.into_inner()));
        assert_eq!(catalog.rule_count().unwrap(), 1);
    }

    #[test]
    fn rule_links_to_many_categories() {
        let (catalog, _temp_db) = test_catalog();
        let frontend = catalog.upsert_category(&category("Frontend")).unwrap().into_inner();
        let react = catalog.upsert_category(&category("React")).unwrap().into_inner();

        catalog
            .insert_rule(new_rule("React Hooks Expert"), &[frontend.id, react.id, 999])
            .unwrap();

        let rule = catalog.get_rule("react-hooks-expert").unwrap().unwrap();
        assert_eq!(rule.categories, vec!["frontend", "react"]);
        assert_eq!(rule.primary_category(), Some("frontend"));

        let in_react = catalog.rules_in_category(react.id).unwrap();
        assert_eq!(in_react.len(), 1);
        assert_eq!(in_react[0].slug, "react-hooks-expert");
    }

    #[test]
    fn increment_bumps_a_single_counter() {
        let (catalog, _temp_db) = test_catalog();
        catalog.insert_rule(new_rule("Rust Development"), &[]).unwrap();

        catalog.increment("rust-development", Counter::Views).unwrap();
        catalog.increment("rust-development", Counter::Views).unwrap();
        let stats = catalog.increment("rust-development", Counter::Upvotes).unwrap();

        assert_eq!(stats.view_count, 2);
        assert_eq!(stats.upvotes, 1);
        assert_eq!(stats.copy_count, 0);
        assert_eq!(stats.downvotes, 0);
        assert_eq!(catalog.rule_stats("rust-development").unwrap(), Some(stats));
    }

    #[test]
    fn increment_unknown_rule_is_not_found() {
        let (catalog, _temp_db) = test_catalog();
        let err = catalog.increment("missing", Counter::Copies).unwrap_err();
        assert!(matches!(err, AppError::RuleNotFound(slug) if slug == "missing"));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let (catalog, _temp_db) = test_catalog();
        catalog.insert_rule(new_rule("Hot Rule"), &[]).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = catalog.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        catalog.increment("hot-rule", Counter::Copies).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = catalog.rule_stats("hot-rule").unwrap().unwrap();
        assert_eq!(stats.copy_count, 200);
    }

    #[test]
    fn unpublished_rules_are_hidden_from_listings() {
        let (catalog, _temp_db) = test_catalog();
        let mut draft = new_rule("Draft Rule");
        draft.is_published = false;
        catalog.insert_rule(draft, &[]).unwrap();
        catalog.insert_rule(new_rule("Public Rule"), &[]).unwrap();

        let listed = catalog.list_rules(&ListParams::default()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].slug, "public-rule");
        assert!(catalog.get_rule("draft-rule").unwrap().is_some());
    }

    #[test]
    fn unpublished_rule_counters_are_not_found() {
        let (catalog, _temp_db) = test_catalog();
        let mut draft = new_rule("Draft Rule");
        draft.is_published = false;
        catalog.insert_rule(draft, &[]).unwrap();

        assert_eq!(catalog.rule_stats("draft-rule").unwrap(), None);
        let err = catalog.increment("draft-rule", Counter::Views).unwrap_err();
        assert!(matches!(err, AppError::RuleNotFound(slug) if slug == "draft-rule"));
    }

    #[test]
    fn list_rules_unknown_category() {
        let (catalog, _temp_db) = test_catalog();
        let params = ListParams {
            category: Some("nope".into()),
            ..Default::default()
        };
        assert!(matches!(
            catalog.list_rules(&params),
            Err(AppError::CategoryNotFound(_))
        ));
    }
}
