use std::sync::Arc;
use std::time::{Duration, Instant};

use jiff::Timestamp;
use serde::Serialize;
use thiserror::Error;

use crate::error::AppError;
use crate::models::{
    AlertSubscription, GeoPoint, JobPosting, NEW_JOB_NEARBY, NewJobNearbyPayload,
    NewNotification,
};
use crate::services::proximity::{DistanceOracle, MatchingStore};

const NOTIFICATION_TITLE: &str = "New job nearby";

/// Counters for one matching pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub jobs_checked: usize,
    pub alerts_checked: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    /// Pairs skipped because the distance oracle returned an error
    #[serde(skip_serializing_if = "is_zero")]
    pub distance_unavailable: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Whether a pair passed the filters
enum PairOutcome {
    Notify(f64),
    Skip,
    DistanceError,
}

/// Failures that abort a pass before any notification is written.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("failed to fetch recent job postings")]
    FetchPostings(#[source] AppError),

    #[error("failed to fetch active proximity alerts")]
    FetchAlerts(#[source] AppError),
}

impl MatchError {
    /// Both fetch failures are transient; the next scheduled pass may succeed.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Runs matching passes over a store and a distance oracle.
#[derive(Clone)]
pub struct ProximityMatcher {
    store: Arc<dyn MatchingStore>,
    distance: Arc<dyn DistanceOracle>,
    lookback: Duration,
}

impl ProximityMatcher {
    pub fn new(
        store: Arc<dyn MatchingStore>,
        distance: Arc<dyn DistanceOracle>,
        lookback: Duration,
    ) -> Self {
        Self {
            store,
            distance,
            lookback,
        }
    }

    pub fn lookback(&self) -> Duration {
        self.lookback
    }

    /// One pass using the current wall clock.
    pub async fn run(&self) -> Result<MatchReport, MatchError> {
        self.run_at(Timestamp::now()).await
    }

    /// One pass treating `now` as the current time.
    ///
    /// Postings created after `now - lookback` are paired with every active
    /// alert. A pair produces a notification when they share a trade and the
    /// distance is within the alert radius. Insert failures are counted and
    /// the pass continues; no step is retried.
    pub async fn run_at(&self, now: Timestamp) -> Result<MatchReport, MatchError> {
        let started = Instant::now();
        let since = now.checked_sub(self.lookback).unwrap_or(Timestamp::MIN);

        let postings = self
            .store
            .recent_active_postings(since)
            .await
            .map_err(MatchError::FetchPostings)?;
        let alerts = self
            .store
            .active_alerts()
            .await
            .map_err(MatchError::FetchAlerts)?;

        let mut report = MatchReport {
            jobs_checked: postings.len(),
            alerts_checked: alerts.len(),
            ..Default::default()
        };

        tracing::debug!(
            since = %since,
            postings = postings.len(),
            alerts = alerts.len(),
            distance_backend = self.distance.name(),
            "Starting proximity match"
        );

        for posting in &postings {
            let Some(job_point) = posting.point else {
                tracing::trace!(job_id = %posting.id, "Posting has no location, skipping");
                continue;
            };

            for alert in &alerts {
                let distance_km = match self.qualifying_distance(posting, job_point, alert).await {
                    PairOutcome::Notify(km) => km,
                    PairOutcome::Skip => continue,
                    PairOutcome::DistanceError => {
                        report.distance_unavailable += 1;
                        continue;
                    }
                };

                let notification = match build_notification(posting, alert, distance_km) {
                    Ok(notification) => notification,
                    Err(e) => {
                        report.notifications_failed += 1;
                        tracing::warn!(
                            job_id = %posting.id,
                            alert_id = %alert.id,
                            error = %e,
                            "Failed to encode proximity notification payload"
                        );
                        continue;
                    }
                };

                match self.store.insert_notification(notification).await {
                    Ok(()) => {
                        report.notifications_sent += 1;
                        tracing::debug!(
                            job_id = %posting.id,
                            alert_id = %alert.id,
                            user_id = %alert.user_id,
                            distance_km,
                            "Proximity notification recorded"
                        );
                    }
                    Err(e) => {
                        report.notifications_failed += 1;
                        tracing::warn!(
                            job_id = %posting.id,
                            alert_id = %alert.id,
                            user_id = %alert.user_id,
                            error = %e,
                            "Failed to record proximity notification"
                        );
                    }
                }
            }
        }

        tracing::info!(
            jobs_checked = report.jobs_checked,
            alerts_checked = report.alerts_checked,
            notifications_sent = report.notifications_sent,
            notifications_failed = report.notifications_failed,
            distance_unavailable = report.distance_unavailable,
            duration_ms = started.elapsed().as_millis() as u64,
            "Proximity match completed"
        );

        Ok(report)
    }

    /// Distance in km when the pair should be notified.
    ///
    /// An oracle error skips the pair like `Ok(None)` does, but is reported
    /// separately so a broken backend shows up in the pass report.
    async fn qualifying_distance(
        &self,
        posting: &JobPosting,
        job_point: GeoPoint,
        alert: &AlertSubscription,
    ) -> PairOutcome {
        if !alert.is_active {
            return PairOutcome::Skip;
        }
        let Some(alert_point) = alert.owner_point else {
            return PairOutcome::Skip;
        };
        if !alert.shares_trade_with(&posting.trades) {
            return PairOutcome::Skip;
        }

        let meters = match self.distance.distance_meters(job_point, alert_point).await {
            Ok(Some(m)) if m.is_finite() => m,
            Ok(_) => return PairOutcome::Skip,
            Err(e) => {
                tracing::warn!(
                    job_id = %posting.id,
                    alert_id = %alert.id,
                    distance_backend = self.distance.name(),
                    error = %e,
                    "Distance unavailable, skipping pair"
                );
                return PairOutcome::DistanceError;
            }
        };

        let km = meters / 1000.0;
        if km <= alert.radius_km {
            PairOutcome::Notify(km)
        } else {
            PairOutcome::Skip
        }
    }
}

fn round_one_decimal(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

fn build_notification(
    posting: &JobPosting,
    alert: &AlertSubscription,
    distance_km: f64,
) -> Result<NewNotification, serde_json::Error> {
    let rounded = round_one_decimal(distance_km);
    let payload = NewJobNearbyPayload {
        job_id: posting.id,
        job_title: posting.title.clone(),
        trades: posting.trades.clone(),
        location: posting.location.clone(),
        distance_km: rounded,
    };

    Ok(NewNotification {
        user_id: alert.user_id,
        notification_type: NEW_JOB_NEARBY.to_string(),
        title: NOTIFICATION_TITLE.to_string(),
        message: format!(
            "{} posted \"{}\" {:.1} km from you",
            posting.employer_display_name(),
            posting.title,
            rounded
        ),
        data: serde_json::to_value(&payload)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use crate::models::PostingStatus;
    use crate::services::proximity::HaversineDistance;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    // ------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct FakeStore {
        postings: Vec<JobPosting>,
        alerts: Vec<AlertSubscription>,
        fail_postings: bool,
        fail_alerts: bool,
        reject_users: HashSet<Uuid>,
        since_seen: Mutex<Option<Timestamp>>,
        alert_fetches: AtomicUsize,
        inserted: Mutex<Vec<NewNotification>>,
    }

    fn boom(what: &str) -> AppError {
        AppError::ConnectionPool {
            source: anyhow::anyhow!("{what} unavailable"),
        }
    }

    #[async_trait]
    impl MatchingStore for FakeStore {
        async fn recent_active_postings(&self, since: Timestamp) -> AppResult<Vec<JobPosting>> {
            *self.since_seen.lock().unwrap() = Some(since);
            if self.fail_postings {
                return Err(boom("postings"));
            }
            Ok(self
                .postings
                .iter()
                .filter(|p| p.status == PostingStatus::Active && p.created_at > since)
                .cloned()
                .collect())
        }

        async fn active_alerts(&self) -> AppResult<Vec<AlertSubscription>> {
            self.alert_fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_alerts {
                return Err(boom("alerts"));
            }
            Ok(self.alerts.iter().filter(|a| a.is_active).cloned().collect())
        }

        async fn insert_notification(&self, notification: NewNotification) -> AppResult<()> {
            if self.reject_users.contains(&notification.user_id) {
                return Err(AppError::Validation {
                    field: "notifications_user_id_fkey".to_string(),
                    reason: "Invalid reference from notifications".to_string(),
                });
            }
            self.inserted.lock().unwrap().push(notification);
            Ok(())
        }
    }

    /// Returns the same answer for every pair
    struct FixedDistance(AppResult<Option<f64>>);

    #[async_trait]
    impl DistanceOracle for FixedDistance {
        async fn distance_meters(&self, _a: GeoPoint, _b: GeoPoint) -> AppResult<Option<f64>> {
            match &self.0 {
                Ok(v) => Ok(*v),
                Err(_) => Err(boom("postgis")),
            }
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    fn now() -> Timestamp {
        "2025-06-01T12:00:00Z".parse().unwrap()
    }

    fn minutes_ago(minutes: i64) -> Timestamp {
        now() - jiff::SignedDuration::from_mins(minutes)
    }

    fn posting(trades: &[&str], point: Option<GeoPoint>) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            employer_name: Some("Northside Plumbing".to_string()),
            title: "Fix leaking water heater".to_string(),
            trades: trades.iter().map(|t| t.to_string()).collect(),
            location: "Minneapolis, MN".to_string(),
            point,
            status: PostingStatus::Active,
            created_at: minutes_ago(2),
        }
    }

    fn alert(radius_km: f64, trades: &[&str], point: Option<GeoPoint>) -> AlertSubscription {
        AlertSubscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            radius_km,
            trades: trades.iter().map(|t| t.to_string()).collect(),
            is_active: true,
            owner_point: point,
            created_at: minutes_ago(60 * 24),
        }
    }

    fn here() -> Option<GeoPoint> {
        Some(GeoPoint::new(44.98, -93.27))
    }

    fn matcher(store: Arc<FakeStore>, oracle: impl DistanceOracle + 'static) -> ProximityMatcher {
        ProximityMatcher::new(store, Arc::new(oracle), Duration::from_secs(600))
    }

    fn five_km() -> FixedDistance {
        FixedDistance(Ok(Some(5_000.0)))
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_match_within_radius_emits_one_notification() {
        let job = posting(&["plumbing"], here());
        let subscription = alert(10.0, &["plumbing"], here());
        let store = Arc::new(FakeStore {
            postings: vec![job.clone()],
            alerts: vec![subscription.clone()],
            ..Default::default()
        });

        let report = matcher(store.clone(), five_km()).run_at(now()).await.unwrap();

        assert_eq!(
            report,
            MatchReport {
                jobs_checked: 1,
                alerts_checked: 1,
                notifications_sent: 1,
                notifications_failed: 0,
                distance_unavailable: 0,
            }
        );

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        let n = &inserted[0];
        assert_eq!(n.user_id, subscription.user_id);
        assert_eq!(n.notification_type, "new_job_nearby");
        assert_eq!(n.title, "New job nearby");
        assert_eq!(
            n.message,
            "Northside Plumbing posted \"Fix leaking water heater\" 5.0 km from you"
        );

        let payload: NewJobNearbyPayload = serde_json::from_value(n.data.clone()).unwrap();
        assert_eq!(payload.job_id, job.id);
        assert_eq!(payload.job_title, job.title);
        assert_eq!(payload.trades, vec!["plumbing".to_string()]);
        assert_eq!(payload.location, "Minneapolis, MN");
        assert_eq!(payload.distance_km, 5.0);
    }

    #[tokio::test]
    async fn test_outside_radius_emits_nothing() {
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["plumbing"], here())],
            alerts: vec![alert(10.0, &["plumbing"], here())],
            ..Default::default()
        });

        let report = matcher(store.clone(), FixedDistance(Ok(Some(15_000.0))))
            .run_at(now())
            .await
            .unwrap();

        assert_eq!(report.notifications_sent, 0);
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_distance_equal_to_radius_matches() {
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["hvac"], here())],
            alerts: vec![alert(5.0, &["hvac"], here())],
            ..Default::default()
        });

        let report = matcher(store, five_km()).run_at(now()).await.unwrap();
        assert_eq!(report.notifications_sent, 1);
    }

    #[tokio::test]
    async fn test_inactive_alert_is_never_considered() {
        let mut inactive = alert(10.0, &["plumbing"], here());
        inactive.is_active = false;
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["plumbing"], here())],
            alerts: vec![inactive],
            ..Default::default()
        });

        let report = matcher(store, five_km()).run_at(now()).await.unwrap();
        assert_eq!(report.alerts_checked, 0);
        assert_eq!(report.notifications_sent, 0);
    }

    #[tokio::test]
    async fn test_posting_without_point_contributes_no_pairs() {
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["plumbing"], None)],
            alerts: vec![alert(10.0, &["plumbing"], here())],
            ..Default::default()
        });

        let report = matcher(store, five_km()).run_at(now()).await.unwrap();
        assert_eq!(report.jobs_checked, 1);
        assert_eq!(report.notifications_sent, 0);
    }

    #[tokio::test]
    async fn test_alert_owner_without_point_is_skipped() {
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["plumbing"], here())],
            alerts: vec![alert(10.0, &["plumbing"], None)],
            ..Default::default()
        });

        let report = matcher(store, five_km()).run_at(now()).await.unwrap();
        assert_eq!(report.notifications_sent, 0);
        assert_eq!(report.notifications_failed, 0);
    }

    #[tokio::test]
    async fn test_trade_filter_is_exact() {
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["Plumbing", "roofing"], here())],
            alerts: vec![
                alert(10.0, &[], here()),
                alert(10.0, &["plumbing"], here()),
                alert(10.0, &["roofing", "siding"], here()),
            ],
            ..Default::default()
        });

        let report = matcher(store, five_km()).run_at(now()).await.unwrap();
        assert_eq!(report.alerts_checked, 3);
        assert_eq!(report.notifications_sent, 1);
    }

    #[tokio::test]
    async fn test_unavailable_distance_skips_pair_without_failing() {
        for oracle in [FixedDistance(Ok(None)), FixedDistance(Ok(Some(f64::NAN)))] {
            let store = Arc::new(FakeStore {
                postings: vec![posting(&["plumbing"], here())],
                alerts: vec![alert(10.0, &["plumbing"], here())],
                ..Default::default()
            });

            let report = matcher(store, oracle).run_at(now()).await.unwrap();
            assert_eq!(report.notifications_sent, 0);
            assert_eq!(report.notifications_failed, 0);
            assert_eq!(report.distance_unavailable, 0);
        }
    }

    #[tokio::test]
    async fn test_distance_errors_are_counted() {
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["plumbing"], here()), posting(&["plumbing"], here())],
            alerts: vec![
                alert(10.0, &["plumbing"], here()),
                alert(10.0, &["roofing"], here()),
            ],
            ..Default::default()
        });

        let report = matcher(store.clone(), FixedDistance(Err(boom("postgis"))))
            .run_at(now())
            .await
            .unwrap();

        // Only the two trade-matching pairs reach the oracle
        assert_eq!(report.distance_unavailable, 2);
        assert_eq!(report.notifications_sent, 0);
        assert_eq!(report.notifications_failed, 0);
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_is_isolated() {
        let rejected = alert(10.0, &["plumbing"], here());
        let accepted = alert(10.0, &["plumbing"], here());
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["plumbing"], here())],
            alerts: vec![rejected.clone(), accepted.clone()],
            reject_users: HashSet::from([rejected.user_id]),
            ..Default::default()
        });

        let report = matcher(store.clone(), five_km()).run_at(now()).await.unwrap();

        assert_eq!(report.notifications_sent, 1);
        assert_eq!(report.notifications_failed, 1);
        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted[0].user_id, accepted.user_id);
    }

    #[tokio::test]
    async fn test_postings_fetch_failure_aborts_before_alerts() {
        let store = Arc::new(FakeStore {
            fail_postings: true,
            alerts: vec![alert(10.0, &["plumbing"], here())],
            ..Default::default()
        });

        let err = matcher(store.clone(), five_km()).run_at(now()).await.unwrap_err();

        assert!(matches!(err, MatchError::FetchPostings(_)));
        assert!(err.is_retryable());
        assert_eq!(store.alert_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_alerts_fetch_failure_is_fatal() {
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["plumbing"], here())],
            fail_alerts: true,
            ..Default::default()
        });

        let err = matcher(store.clone(), five_km()).run_at(now()).await.unwrap_err();
        assert!(matches!(err, MatchError::FetchAlerts(_)));
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookback_window_bounds_candidates() {
        let mut stale = posting(&["plumbing"], here());
        stale.created_at = minutes_ago(11);
        let fresh = posting(&["plumbing"], here());
        let store = Arc::new(FakeStore {
            postings: vec![stale, fresh],
            alerts: vec![alert(10.0, &["plumbing"], here())],
            ..Default::default()
        });

        let report = matcher(store.clone(), five_km()).run_at(now()).await.unwrap();

        assert_eq!(*store.since_seen.lock().unwrap(), Some(minutes_ago(10)));
        assert_eq!(report.jobs_checked, 1);
        assert_eq!(report.notifications_sent, 1);
    }

    #[tokio::test]
    async fn test_two_runs_emit_duplicates() {
        let store = Arc::new(FakeStore {
            postings: vec![posting(&["plumbing"], here())],
            alerts: vec![alert(10.0, &["plumbing"], here())],
            ..Default::default()
        });
        let matcher = matcher(store.clone(), five_km());

        matcher.run_at(now()).await.unwrap();
        matcher.run_at(now()).await.unwrap();

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 2);
        assert_eq!(inserted[0], inserted[1]);
    }

    #[tokio::test]
    async fn test_empty_inputs_are_successful_zero_runs() {
        let store = Arc::new(FakeStore::default());
        let report = matcher(store, five_km()).run_at(now()).await.unwrap();
        assert_eq!(report, MatchReport::default());
    }

    #[tokio::test]
    async fn test_haversine_backend_end_to_end() {
        // ~5 km due north of the job
        let job_point = GeoPoint::new(44.98, -93.27);
        let worker_point = GeoPoint::new(44.98 + 5.0 / 111.195, -93.27);
        let mut job = posting(&["electrical"], Some(job_point));
        job.employer_name = None;
        let store = Arc::new(FakeStore {
            postings: vec![job],
            alerts: vec![
                alert(10.0, &["electrical"], Some(worker_point)),
                alert(4.0, &["electrical"], Some(worker_point)),
            ],
            ..Default::default()
        });

        let report = matcher(store.clone(), HaversineDistance)
            .run_at(now())
            .await
            .unwrap();

        assert_eq!(report.notifications_sent, 1);
        let inserted = store.inserted.lock().unwrap();
        let payload: NewJobNearbyPayload = serde_json::from_value(inserted[0].data.clone()).unwrap();
        assert_eq!(payload.distance_km, 5.0);
        assert!(inserted[0].message.starts_with("An employer posted"));
    }

    #[test]
    fn test_build_notification_stores_object_payload() {
        let job = posting(&["plumbing"], here());
        let subscription = alert(10.0, &["plumbing"], here());

        let notification = build_notification(&job, &subscription, 3.25).unwrap();

        assert!(notification.data.is_object());
        assert_eq!(notification.data["job_id"], serde_json::json!(job.id));
        assert_eq!(notification.data["distance_km"], serde_json::json!(3.3));
    }

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(4.96), 5.0);
        assert_eq!(round_one_decimal(4.94), 4.9);
        assert_eq!(round_one_decimal(0.0), 0.0);
        assert_eq!(round_one_decimal(12.35), 12.4);
    }
}
