//! Data models for the rule catalogue
//!
//! This module defines the stored records, the API views built from them,
//! the seed descriptors consumed by the import pipeline, and the
//! request/response payloads of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named grouping of rules (e.g. "Frontend", "Next.js")
///
/// Stored as JSON in the categories table, keyed by `slug`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    /// Stable numeric identifier, referenced by the join tables
    pub id: u64,

    /// URL-safe key derived from `name`, unique across categories
    pub slug: String,

    /// Display name
    pub name: String,

    pub description: String,

    /// Optional icon reference (emoji or asset name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Category listing entry with the number of published rules attached to it
#[derive(Serialize, Debug, Clone)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub rule_count: usize,
}

/// How an editor decides when a rule is applied
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationMode {
    /// Applied to files matching the rule's glob pattern
    Files,
    /// Applied to every request
    Always,
    /// Applied when the agent judges it relevant
    Intelligent,
}

/// The four engagement counters attached to a rule
///
/// Serialized with the camelCase names clients expect:
/// `{"upvotes":1,"downvotes":0,"viewCount":10,"copyCount":2}`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleStats {
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub copy_count: u64,
}

impl RuleStats {
    /// Merges every counter present in `patch`, leaving the others untouched.
    pub fn apply(&mut self, patch: &StatsPatch) {
        if let Some(upvotes) = patch.upvotes {
            self.upvotes = upvotes;
        }
        if let Some(downvotes) = patch.downvotes {
            self.downvotes = downvotes;
        }
        if let Some(view_count) = patch.view_count {
            self.view_count = view_count;
        }
        if let Some(copy_count) = patch.copy_count {
            self.copy_count = copy_count;
        }
    }

    pub(crate) fn from_row((views, copies, upvotes, downvotes): (u64, u64, u64, u64)) -> Self {
        Self {
            upvotes,
            downvotes,
            view_count: views,
            copy_count: copies,
        }
    }

    pub(crate) fn to_row(self) -> (u64, u64, u64, u64) {
        (self.view_count, self.copy_count, self.upvotes, self.downvotes)
    }
}

/// Partial set of counters for optimistic local updates
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsPatch {
    pub upvotes: Option<u64>,
    pub downvotes: Option<u64>,
    pub view_count: Option<u64>,
    pub copy_count: Option<u64>,
}

/// Which engagement counter an interaction bumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Views,
    Copies,
    Upvotes,
    Downvotes,
}

impl Counter {
    pub fn as_str(self) -> &'static str {
        match self {
            Counter::Views => "views",
            Counter::Copies => "copies",
            Counter::Upvotes => "upvotes",
            Counter::Downvotes => "downvotes",
        }
    }
}

/// Rule body as persisted in the rules table
///
/// Counters and category links live in their own tables, so bumping a
/// counter never rewrites the (potentially multi-kilobyte) content.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RuleRecord {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub application_mode: Option<ApplicationMode>,
    #[serde(default)]
    pub globs: Option<String>,
}

fn default_published() -> bool {
    true
}

/// A rule with its resolved categories and live counters
#[derive(Serialize, Debug, Clone)]
pub struct Rule {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_mode: Option<ApplicationMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub globs: Option<String>,
    /// Slugs of the attached categories, ordered by category id
    pub categories: Vec<String>,
    pub stats: RuleStats,
}

impl Rule {
    pub(crate) fn assemble(record: RuleRecord, categories: Vec<String>, stats: RuleStats) -> Self {
        Self {
            id: record.id,
            slug: record.slug,
            title: record.title,
            description: record.description,
            content: record.content,
            is_published: record.is_published,
            created_at: record.created_at,
            author: record.author,
            tags: record.tags,
            application_mode: record.application_mode,
            globs: record.globs,
            categories,
            stats,
        }
    }

    /// Single-category view of the many-to-many link: the first attached category.
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }
}

/// Listing entry for a rule; the content is cut down to an excerpt
#[derive(Serialize, Debug, Clone)]
pub struct RuleSummary {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub stats: RuleStats,
}

/// Fields needed to insert a rule; the catalog assigns `id` and `created_at`
#[derive(Debug, Clone)]
pub struct NewRule {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub is_published: bool,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub application_mode: Option<ApplicationMode>,
    pub globs: Option<String>,
    pub stats: RuleStats,
}

/// Static description of a category used by the seed pipeline
#[derive(Deserialize, Debug, Clone)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Static description of a rule used by the seed pipeline
///
/// `categories` holds category display names; they are matched by slug.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RuleSeed {
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub application_mode: Option<ApplicationMode>,
    #[serde(default)]
    pub globs: Option<String>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

/// Query parameters for listing rules with pagination
///
/// # Example
/// Query string: `?category=frontend&page=2&limit=20`
#[derive(Deserialize, Debug, Default, Clone)]
pub struct ListParams {
    /// Optional category slug to filter by
    pub category: Option<String>,

    /// Page number for pagination (starts from 1)
    /// Defaults to 1 if not provided
    pub page: Option<usize>,

    /// Number of items per page
    /// Defaults to 10 if not provided, maximum is 100
    pub limit: Option<usize>,
}

impl ListParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// Request payload for casting a vote
///
/// # Example
/// ```json
/// { "direction": "up" }
/// ```
#[derive(Deserialize, Debug)]
pub struct VoteRequest {
    pub direction: VoteDirection,
}
