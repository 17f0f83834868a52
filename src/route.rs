//! Route definitions for the rule catalogue API

use axum::routing::{get, post};
use axum::Router;

use crate::database::AppState;
use crate::handler::{
    get_category, get_rule, get_rule_stats, list_categories, list_rules, record_copy,
    record_view, record_vote,
};

/// Creates the Axum router with all routes configured
///
/// # Route Definitions
///
/// - `GET /api/categories` - Categories with rule counts
/// - `GET /api/categories/{slug}` - A category and its rules
/// - `GET /api/rules` - Paginated rule listing (`category`, `page`, `limit`)
/// - `GET /api/rules/{slug}` - Full rule
/// - `GET /api/rules/{slug}/stats` - Engagement counters
/// - `POST /api/rules/{slug}/view` - Count a view
/// - `POST /api/rules/{slug}/copy` - Count a copy
/// - `POST /api/rules/{slug}/vote` - Count an up/down vote
///
/// # Example Usage
///
/// ```no_run
/// # use rulehub::database::AppState;
/// # use rulehub::repository::Catalog;
/// # use rulehub::route::create_app;
/// let state = AppState { catalog: Catalog::open("data.db").unwrap() };
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{slug}", get(get_category))
        .route("/rules", get(list_rules))
        .route("/rules/{slug}", get(get_rule))
        .route("/rules/{slug}/stats", get(get_rule_stats))
        .route("/rules/{slug}/view", post(record_view))
        .route("/rules/{slug}/copy", post(record_copy))
        .route("/rules/{slug}/vote", post(record_vote));

    Router::new().nest("/api", api_routes).with_state(state)
}
