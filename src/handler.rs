//! HTTP request handlers for the rule catalogue API
//!
//! This module implements:
//! - Browsing categories and the rules attached to them
//! - Listing and reading published rules
//! - Reading a rule's engagement counters
//! - Recording views, copies and votes as atomic counter bumps

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::database::AppState;
use crate::error::AppError;
use crate::model::{Counter, ListParams, Rule, VoteDirection, VoteRequest};

/// Lists every category with its number of published rules
///
/// # Response
///
/// ```json
/// {
///   "total": 2,
///   "data": [{ "id": 1, "slug": "frontend", "name": "Frontend", "description": "...", "rule_count": 4 }]
/// }
/// ```
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = state.catalog.list_categories()?;

    Ok(Json(json!({
        "total": categories.len(),
        "data": categories,
    })))
}

/// Returns a category together with its published rules
///
/// # Response
///
/// - **200 OK** - `{ "category": {...}, "rules": [...] }`
/// - **404 Not Found** - No category with that slug
pub async fn get_category(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let category = state
        .catalog
        .find_category(&slug)?
        .ok_or_else(|| AppError::CategoryNotFound(slug.clone()))?;
    let rules = state.catalog.rules_in_category(category.id)?;

    Ok(Json(json!({
        "category": category,
        "rules": rules,
    })))
}

/// Lists published rules with pagination and an optional category filter
///
/// # Query Parameters
///
/// - `category` (optional) - Category slug to filter by
/// - `page` (optional) - Page number, starts from 1 (default: 1)
/// - `limit` (optional) - Items per page, max 100 (default: 10)
///
/// # Example Request
///
/// `GET /api/rules?category=react&page=2&limit=20`
///
/// # Response
///
/// ```json
/// {
///   "page": 2,
///   "limit": 20,
///   "total_fetched": 15,
///   "data": [...]
/// }
/// ```
pub async fn list_rules(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let rules = state.catalog.list_rules(&params)?;

    Ok(Json(json!({
        "page": params.page(),
        "limit": params.limit(),
        "total_fetched": rules.len(),
        "data": rules,
    })))
}

/// Returns the full rule, including content, categories and counters
///
/// Unpublished rules are reported as missing.
pub async fn get_rule(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Rule>, AppError> {
    match state.catalog.get_rule(&slug)? {
        Some(rule) if rule.is_published => Ok(Json(rule)),
        _ => Err(AppError::RuleNotFound(slug)),
    }
}

/// Returns the four engagement counters of a rule
///
/// # Response
///
/// ```json
/// { "upvotes": 5, "downvotes": 0, "viewCount": 120, "copyCount": 14 }
/// ```
pub async fn get_rule_stats(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state
        .catalog
        .rule_stats(&slug)?
        .ok_or_else(|| AppError::RuleNotFound(slug.clone()))?;

    Ok(Json(stats))
}

/// Records one view of a rule and returns the updated counters
pub async fn record_view(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    bump(&state, &slug, Counter::Views)
}

/// Records one copy-to-clipboard of a rule and returns the updated counters
pub async fn record_copy(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    bump(&state, &slug, Counter::Copies)
}

/// Records an up or down vote
///
/// # Request Body
///
/// ```json
/// { "direction": "up" }
/// ```
///
/// # Response
///
/// - **200 OK** - Updated counters
/// - **404 Not Found** - Unknown or unpublished rule
/// - **422 Unprocessable Entity** - Direction is not `up` or `down`
pub async fn record_vote(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let counter = match payload.direction {
        VoteDirection::Up => Counter::Upvotes,
        VoteDirection::Down => Counter::Downvotes,
    };
    bump(&state, &slug, counter)
}

fn bump(state: &AppState, slug: &str, counter: Counter) -> Result<impl IntoResponse, AppError> {
    let stats = state.catalog.increment(slug, counter)?;
    tracing::debug!(slug = %slug, counter = counter.as_str(), "counter incremented");
    Ok((StatusCode::OK, Json(stats)))
}
