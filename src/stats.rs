//! Client-side view of a rule's engagement counters
//!
//! [`StatsTracker`] fetches the counters for one rule from a
//! [`StatsSource`] and publishes a [`StatsState`] (loading / error / stats)
//! on a `watch` channel that UI code subscribes to. Fetch failures end up in
//! the state as a message; they are never returned to the caller.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::model::{RuleStats, StatsPatch};
use crate::repository::Catalog;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    #[error("rule not found: {0}")]
    NotFound(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("invalid stats payload: {0}")]
    Decode(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

/// Anything that can produce the current counters for a rule slug
pub trait StatsSource {
    fn fetch_stats(&self, slug: &str)
        -> impl Future<Output = Result<RuleStats, StatsError>> + Send;
}

impl StatsSource for Catalog {
    async fn fetch_stats(&self, slug: &str) -> Result<RuleStats, StatsError> {
        match self.rule_stats(slug) {
            Ok(Some(stats)) => Ok(stats),
            Ok(None) => Err(StatsError::NotFound(slug.to_string())),
            Err(e) => Err(StatsError::Storage(e.to_string())),
        }
    }
}

/// Reads counters from `GET {base_url}/api/rules/{slug}/stats`
#[derive(Debug, Clone)]
pub struct HttpStatsSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatsSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// `{base_url}/api/rules/{slug}/stats` with the slug percent-encoded as one segment
    fn stats_url(&self, slug: &str) -> Result<reqwest::Url, StatsError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| StatsError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| StatsError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["api", "rules", slug, "stats"]);
        Ok(url)
    }
}

impl StatsSource for HttpStatsSource {
    async fn fetch_stats(&self, slug: &str) -> Result<RuleStats, StatsError> {
        let url = self.stats_url(slug)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StatsError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StatsError::NotFound(slug.to_string()));
        }
        if !status.is_success() {
            return Err(StatsError::Status(status.as_u16()));
        }

        response
            .json::<RuleStats>()
            .await
            .map_err(|e| StatsError::Decode(e.to_string()))
    }
}

/// Fetch lifecycle of a rule's counters as seen by a consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsState {
    pub loading: bool,
    pub error: Option<String>,
    /// Last known counters (zero until the first fetch or update)
    pub stats: RuleStats,
    /// Whether `stats` holds counters from a fetch or an update
    pub loaded: bool,
}

impl Default for StatsState {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            stats: RuleStats::default(),
            loaded: false,
        }
    }
}

impl StatsState {
    /// Counters that may be shown as real values, `None` while loading or after a failure.
    pub fn authoritative(&self) -> Option<&RuleStats> {
        if self.loading || self.error.is_some() {
            None
        } else {
            Some(&self.stats)
        }
    }
}

impl fmt::Display for StatsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loading {
            return f.write_str("-");
        }
        if self.error.is_some() && !self.loaded {
            return f.write_str("stats unavailable");
        }
        let s = &self.stats;
        write!(
            f,
            "{} views, {} copies, +{}/-{}",
            s.view_count, s.copy_count, s.upvotes, s.downvotes
        )?;
        if self.error.is_some() {
            f.write_str(" (stale)")?;
        }
        Ok(())
    }
}

/// Tracks the counters of a single rule
pub struct StatsTracker<S> {
    source: S,
    slug: String,
    state: watch::Sender<StatsState>,
    generation: AtomicU64,
    detached: AtomicBool,
}

impl<S: StatsSource> StatsTracker<S> {
    pub fn new(source: S, slug: impl Into<String>) -> Self {
        let (state, _) = watch::channel(StatsState::default());
        Self {
            source,
            slug: slug.into(),
            state,
            generation: AtomicU64::new(0),
            detached: AtomicBool::new(false),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn subscribe(&self) -> watch::Receiver<StatsState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> StatsState {
        self.state.borrow().clone()
    }

    /// Fetches fresh counters and publishes the outcome.
    ///
    /// A result is dropped if the tracker was detached or a newer fetch
    /// started while this one was in flight.
    pub async fn fetch(&self) {
        if self.detached.load(Ordering::SeqCst) {
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = self.source.fetch_stats(&self.slug).await;

        let applied = self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            state.loading = false;
            match &result {
                Ok(stats) => {
                    state.stats = *stats;
                    state.loaded = true;
                    state.error = None;
                }
                Err(e) => state.error = Some(e.to_string()),
            }
            true
        });

        match (&result, applied) {
            (_, false) => debug!(slug = %self.slug, generation, "stale stats result ignored"),
            (Err(e), true) => warn!(slug = %self.slug, error = %e, "failed to fetch stats"),
            (Ok(_), true) => debug!(slug = %self.slug, "stats loaded"),
        }
    }

    /// Merges the provided counters into the current stats without refetching.
    pub fn update_stats(&self, patch: StatsPatch) {
        if self.detached.load(Ordering::SeqCst) {
            return;
        }
        self.state.send_modify(|state| {
            state.stats.apply(&patch);
            state.loaded = true;
        });
    }

    /// Stops publishing; in-flight and later fetches no longer touch the state.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.detached.load(Ordering::SeqCst)
            && self.generation.load(Ordering::SeqCst) == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Notify;

    struct FixedSource(Result<RuleStats, StatsError>);

    impl StatsSource for FixedSource {
        async fn fetch_stats(&self, _slug: &str) -> Result<RuleStats, StatsError> {
            self.0.clone()
        }
    }

    /// First call waits for `gate` and reports one view; later calls report
    /// the call number immediately.
    struct GatedSource {
        calls: AtomicU64,
        gate: Notify,
    }

    impl StatsSource for GatedSource {
        async fn fetch_stats(&self, _slug: &str) -> Result<RuleStats, StatsError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                self.gate.notified().await;
            }
            Ok(RuleStats {
                view_count: call,
                ..Default::default()
            })
        }
    }

    fn sample() -> RuleStats {
        RuleStats {
            upvotes: 1,
            downvotes: 0,
            view_count: 10,
            copy_count: 2,
        }
    }

    #[test]
    fn starts_loading_with_zero_stats() {
        let tracker = StatsTracker::new(FixedSource(Ok(sample())), "rule");
        let state = tracker.state();
        assert!(state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.stats, RuleStats::default());
        assert!(state.authoritative().is_none());
        assert_eq!(state.to_string(), "-");
    }

    #[tokio::test]
    async fn successful_fetch_publishes_stats() {
        let tracker = StatsTracker::new(FixedSource(Ok(sample())), "rule");
        let mut rx = tracker.subscribe();

        tracker.fetch().await;

        let state = rx.borrow_and_update().clone();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.authoritative(), Some(&sample()));
        assert_eq!(state.to_string(), "10 views, 2 copies, +1/-0");
    }

    #[tokio::test]
    async fn failed_fetch_keeps_last_stats_and_sets_error() {
        let tracker = StatsTracker::new(
            FixedSource(Err(StatsError::Transport("connection refused".into()))),
            "rule",
        );
        tracker.update_stats(StatsPatch {
            view_count: Some(3),
            ..Default::default()
        });

        tracker.fetch().await;

        let state = tracker.state();
        assert!(!state.loading);
        assert_eq!(
            state.error.as_deref(),
            Some("request failed: connection refused")
        );
        assert_eq!(state.stats.view_count, 3);
        assert!(state.authoritative().is_none());
        assert_eq!(state.to_string(), "3 views, 0 copies, +0/-0 (stale)");
    }

    #[tokio::test]
    async fn failed_first_fetch_renders_unavailable() {
        let tracker = StatsTracker::new(FixedSource(Err(StatsError::Status(500))), "rule");

        tracker.fetch().await;

        let state = tracker.state();
        assert!(!state.loaded);
        assert_eq!(state.error.as_deref(), Some("unexpected status 500"));
        assert_eq!(state.to_string(), "stats unavailable");
    }

    #[test]
    fn stats_url_encodes_the_slug_as_one_segment() {
        let source = HttpStatsSource::new("http://localhost:8080/");
        assert_eq!(
            source.stats_url("react-hooks").unwrap().as_str(),
            "http://localhost:8080/api/rules/react-hooks/stats"
        );
        assert_eq!(
            source.stats_url("a b/c?d").unwrap().as_str(),
            "http://localhost:8080/api/rules/a%20b%2Fc%3Fd/stats"
        );

        let prefixed = HttpStatsSource::new("http://localhost:8080/rulehub");
        assert_eq!(
            prefixed.stats_url("x").unwrap().as_str(),
            "http://localhost:8080/rulehub/api/rules/x/stats"
        );
    }

    #[test]
    fn stats_url_rejects_a_bad_base() {
        let source = HttpStatsSource::new("not a url");
        assert!(matches!(source.stats_url("x"), Err(StatsError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn update_stats_merges_partially() {
        let tracker = StatsTracker::new(FixedSource(Ok(sample())), "rule");
        tracker.fetch().await;

        tracker.update_stats(StatsPatch {
            upvotes: Some(5),
            ..Default::default()
        });

        assert_eq!(
            tracker.state().stats,
            RuleStats {
                upvotes: 5,
                downvotes: 0,
                view_count: 10,
                copy_count: 2,
            }
        );
    }

    #[tokio::test]
    async fn detached_tracker_ignores_in_flight_result() {
        let tracker = StatsTracker::new(
            GatedSource {
                calls: AtomicU64::new(0),
                gate: Notify::new(),
            },
            "rule",
        );

        tokio::join!(tracker.fetch(), async {
            tracker.detach();
            tracker.source.gate.notify_one();
        });

        let state = tracker.state();
        assert_eq!(state.stats, RuleStats::default());
        assert!(state.loading);

        tracker.update_stats(StatsPatch {
            upvotes: Some(9),
            ..Default::default()
        });
        assert_eq!(tracker.state().stats.upvotes, 0);
    }

    #[tokio::test]
    async fn newer_fetch_supersedes_older_one() {
        let tracker = StatsTracker::new(
            GatedSource {
                calls: AtomicU64::new(0),
                gate: Notify::new(),
            },
            "rule",
        );

        tokio::join!(tracker.fetch(), async {
            tracker.fetch().await;
            tracker.source.gate.notify_one();
        });

        let state = tracker.state();
        assert!(!state.loading);
        assert_eq!(state.stats.view_count, 2);
    }

    #[tokio::test]
    async fn catalog_source_reports_unknown_rule() {
        let temp_db = tempfile::NamedTempFile::new().unwrap();
        let catalog = Catalog::open(temp_db.path().to_str().unwrap()).unwrap();

        let err = catalog.fetch_stats("missing").await.unwrap_err();
        assert_eq!(err, StatsError::NotFound("missing".into()));
    }
}
