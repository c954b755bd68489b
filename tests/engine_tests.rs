// Integration tests for quota enforcement, swipe recording and match
// detection working together over the in-memory catalog.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::Mutex;

use hanap_algo::engine::{FeedOrchestrator, FeedPolicy, QuotaPolicy};
use hanap_algo::models::{
    Decision, ErrorKind, FilterSpec, JobPosting, JobStatus, JobType, NotificationEvent, PayType,
    RecipientRole,
};
use hanap_algo::services::{
    CatalogStore, EmitError, InMemoryCatalog, NotificationEmitter, StaticTiers,
    SubscriptionError, SubscriptionLookup,
};

/// Captures every emitted event for assertions.
#[derive(Default)]
struct RecordingEmitter {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingEmitter {
    async fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl NotificationEmitter for RecordingEmitter {
    async fn emit(&self, event: &NotificationEvent) -> Result<(), EmitError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// Tier service that is always down.
struct FailingTiers;

#[async_trait]
impl SubscriptionLookup for FailingTiers {
    async fn daily_limit(&self, _seeker_id: &str) -> Result<Option<i64>, SubscriptionError> {
        Err(SubscriptionError::ApiError("tier service down".to_string()))
    }
}

fn test_posting(id: &str, employer_id: &str) -> JobPosting {
    let now = Utc::now();
    JobPosting {
        id: id.to_string(),
        employer_id: employer_id.to_string(),
        title: format!("Posting {}", id),
        description: "Household help wanted".to_string(),
        job_type: JobType::Housekeeper,
        location: "Manila".to_string(),
        province: None,
        latitude: None,
        longitude: None,
        salary_min: 500,
        salary_max: 800,
        pay_type: PayType::PerDay,
        skills: vec![],
        experience_years: 0,
        languages: vec![],
        schedule: vec![],
        boosted: false,
        boost_expires_at: None,
        status: JobStatus::Active,
        expires_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn build(
    tiers: StaticTiers,
) -> (Arc<InMemoryCatalog>, Arc<RecordingEmitter>, FeedOrchestrator) {
    let store = Arc::new(InMemoryCatalog::new());
    let emitter = Arc::new(RecordingEmitter::default());
    let engine = FeedOrchestrator::new(
        store.clone(),
        Arc::new(tiers),
        emitter.clone(),
        None,
        QuotaPolicy::default(),
        FeedPolicy::default(),
    );
    (store, emitter, engine)
}

fn build_over(
    store: Arc<InMemoryCatalog>,
    tiers: StaticTiers,
) -> (Arc<RecordingEmitter>, FeedOrchestrator) {
    let emitter = Arc::new(RecordingEmitter::default());
    let engine = FeedOrchestrator::new(
        store,
        Arc::new(tiers),
        emitter.clone(),
        None,
        QuotaPolicy::default(),
        FeedPolicy::default(),
    );
    (emitter, engine)
}

fn match_created_events(events: &[NotificationEvent]) -> Vec<(String, RecipientRole)> {
    events
        .iter()
        .filter_map(|e| match e {
            NotificationEvent::MatchCreated {
                recipient_id,
                recipient_role,
                ..
            } => Some((recipient_id.clone(), *recipient_role)),
            _ => None,
        })
        .collect()
}

fn quota_exhausted_count(events: &[NotificationEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, NotificationEvent::QuotaExhausted { .. }))
        .count()
}

#[tokio::test]
async fn test_quota_decrements_and_blocks_at_zero() {
    let (store, _, engine) = build(StaticTiers::new().with_limit("seeker-1", 3));
    let now = Utc::now();

    for i in 0..4 {
        store
            .insert_posting(&test_posting(&format!("p-{}", i), "employer-1"))
            .await
            .unwrap();
    }

    for i in 0..3 {
        let response = engine
            .swipe("seeker-1", &format!("p-{}", i), Decision::Pass, now)
            .await;
        assert!(response.success, "Swipe {} should be admitted", i);
        assert_eq!(response.remaining, 3 - (i as i64 + 1));
        assert_eq!(response.limit, 3);
    }

    let refused = engine.swipe("seeker-1", "p-3", Decision::Pass, now).await;
    assert!(!refused.success);
    assert_eq!(refused.error_kind, Some(ErrorKind::QuotaExceeded));
    assert_eq!(refused.remaining, 0);
    assert!(!refused.can_swipe);

    // The refused swipe left no decision behind.
    assert!(store
        .swipe_decision("seeker-1", "p-3")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_swipes_never_exceed_the_limit() {
    let (store, _, engine) = build(StaticTiers::new().with_limit("seeker-1", 10));
    let now = Utc::now();

    for i in 0..15 {
        store
            .insert_posting(&test_posting(&format!("p-{}", i), "employer-1"))
            .await
            .unwrap();
    }

    let engine = Arc::new(engine);
    let mut handles = Vec::new();
    for i in 0..15 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .swipe("seeker-1", &format!("p-{}", i), Decision::Like, now)
                .await
        }));
    }

    let mut admitted = 0;
    let mut refused = 0;
    for handle in handles {
        let response = handle.await.unwrap();
        if response.success {
            admitted += 1;
        } else {
            assert_eq!(response.error_kind, Some(ErrorKind::QuotaExceeded));
            refused += 1;
        }
    }

    assert_eq!(admitted, 10, "Exactly the limit must be admitted");
    assert_eq!(refused, 5);

    let day = hanap_algo::core::day_key(now, 8);
    assert_eq!(store.quota_consumed("seeker-1", day).await.unwrap(), 10);
}

#[tokio::test]
async fn test_repeat_swipe_supersedes_but_still_costs() {
    let (store, _, engine) = build(StaticTiers::new().with_limit("seeker-1", 5));
    let now = Utc::now();

    store
        .insert_posting(&test_posting("p-1", "employer-1"))
        .await
        .unwrap();

    engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    let second = engine.swipe("seeker-1", "p-1", Decision::Pass, now).await;

    assert!(second.success);
    assert_eq!(second.remaining, 3, "Both swipes consumed quota");

    let decision = store.swipe_decision("seeker-1", "p-1").await.unwrap();
    assert_eq!(decision.unwrap().decision, Decision::Pass);
    assert_eq!(
        store.swiped_posting_ids("seeker-1").await.unwrap().len(),
        1,
        "Superseding swipes keep a single decision row"
    );
}

#[tokio::test]
async fn test_like_then_interest_creates_one_match() {
    let (store, emitter, engine) = build(StaticTiers::new());
    let now = Utc::now();

    store
        .insert_posting(&test_posting("p-1", "employer-1"))
        .await
        .unwrap();

    let swipe = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    assert!(swipe.success);
    assert!(swipe.matched.is_none(), "No interest yet, no match");
    assert!(match_created_events(&emitter.events().await).is_empty());

    let interest = engine
        .register_interest("employer-1", "seeker-1", "p-1", now)
        .await
        .unwrap();
    let matched = interest.matched.expect("Interest completed the pair");
    assert_eq!(matched.seeker_id, "seeker-1");
    assert_eq!(matched.employer_id, "employer-1");
    assert_eq!(matched.posting_id, "p-1");

    let recipients = match_created_events(&emitter.events().await);
    assert_eq!(
        recipients,
        vec![
            ("seeker-1".to_string(), RecipientRole::Seeker),
            ("employer-1".to_string(), RecipientRole::Employer),
        ],
        "Both sides are notified exactly once"
    );
}

#[tokio::test]
async fn test_interest_then_like_creates_one_match() {
    let (store, emitter, engine) = build(StaticTiers::new());
    let now = Utc::now();

    store
        .insert_posting(&test_posting("p-1", "employer-1"))
        .await
        .unwrap();

    let interest = engine
        .register_interest("employer-1", "seeker-1", "p-1", now)
        .await
        .unwrap();
    assert!(interest.matched.is_none(), "No like yet, interest is pending");

    let swipe = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    let matched = swipe.matched.expect("Like completed the pair");
    assert_eq!(matched.posting_id, "p-1");

    assert_eq!(match_created_events(&emitter.events().await).len(), 2);
}

#[tokio::test]
async fn test_match_is_unique_per_pair() {
    let (store, emitter, engine) = build(StaticTiers::new());
    let now = Utc::now();

    store
        .insert_posting(&test_posting("p-1", "employer-1"))
        .await
        .unwrap();

    engine
        .register_interest("employer-1", "seeker-1", "p-1", now)
        .await
        .unwrap();
    let first = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    let match_id = first.matched.expect("First like matches").id;

    // Re-liking resolves to the same match and stays silent.
    let second = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    assert_eq!(second.matched.map(|m| m.id), Some(match_id.clone()));

    // Repeating the employer signal is idempotent too.
    let repeat = engine
        .register_interest("employer-1", "seeker-1", "p-1", now)
        .await
        .unwrap();
    assert_eq!(repeat.matched.map(|m| m.id), Some(match_id));

    assert_eq!(
        match_created_events(&emitter.events().await).len(),
        2,
        "One creation, one pair of notifications"
    );
}

#[tokio::test]
async fn test_pass_after_match_leaves_match_standing() {
    let (store, _, engine) = build(StaticTiers::new());
    let now = Utc::now();

    store
        .insert_posting(&test_posting("p-1", "employer-1"))
        .await
        .unwrap();

    engine
        .register_interest("employer-1", "seeker-1", "p-1", now)
        .await
        .unwrap();
    let liked = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    let match_id = liked.matched.expect("Pair completed").id;

    // Changing the decision to pass supersedes the swipe but never unwinds
    // the match.
    engine.swipe("seeker-1", "p-1", Decision::Pass, now).await;
    let reliked = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    assert_eq!(reliked.matched.map(|m| m.id), Some(match_id));
}

#[tokio::test]
async fn test_quota_exhausted_event_fires_once() {
    let (store, emitter, engine) = build(StaticTiers::new().with_limit("seeker-1", 2));
    let now = Utc::now();

    for i in 0..3 {
        store
            .insert_posting(&test_posting(&format!("p-{}", i), "employer-1"))
            .await
            .unwrap();
    }

    engine.swipe("seeker-1", "p-0", Decision::Pass, now).await;
    let events = emitter.events().await;
    assert_eq!(quota_exhausted_count(&events), 0);

    // The final slot announces exhaustion.
    engine.swipe("seeker-1", "p-1", Decision::Pass, now).await;
    let events = emitter.events().await;
    assert_eq!(quota_exhausted_count(&events), 1);

    match events.last() {
        Some(NotificationEvent::QuotaExhausted { seeker_id, limit, .. }) => {
            assert_eq!(seeker_id, "seeker-1");
            assert_eq!(*limit, 2);
        }
        other => panic!("Expected a quota exhausted event, got {:?}", other),
    }

    // Refused attempts stay silent.
    engine.swipe("seeker-1", "p-2", Decision::Pass, now).await;
    assert_eq!(quota_exhausted_count(&emitter.events().await), 1);
}

#[tokio::test]
async fn test_quota_resets_at_the_day_boundary() {
    let (store, _, engine) = build(StaticTiers::new().with_limit("seeker-1", 1));

    store
        .insert_posting(&test_posting("p-1", "employer-1"))
        .await
        .unwrap();
    store
        .insert_posting(&test_posting("p-2", "employer-1"))
        .await
        .unwrap();

    // 15:30 UTC is 23:30 in Manila; the day flips at 16:00 UTC.
    let before_midnight = Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap();
    let after_midnight = Utc.with_ymd_and_hms(2025, 3, 10, 16, 30, 0).unwrap();

    let spent = engine
        .swipe("seeker-1", "p-1", Decision::Pass, before_midnight)
        .await;
    assert!(spent.success);
    assert_eq!(spent.remaining, 0);

    let refused = engine
        .swipe("seeker-1", "p-2", Decision::Pass, before_midnight)
        .await;
    assert_eq!(refused.error_kind, Some(ErrorKind::QuotaExceeded));

    // Half an hour later it is a fresh day with a fresh allowance.
    let fresh = engine
        .swipe("seeker-1", "p-2", Decision::Pass, after_midnight)
        .await;
    assert!(fresh.success);
    assert_eq!(fresh.limit, 1);
    assert_eq!(fresh.remaining, 0);
}

#[tokio::test]
async fn test_raised_limit_applies_immediately() {
    let store = Arc::new(InMemoryCatalog::new());
    let now = Utc::now();

    for i in 0..3 {
        store
            .insert_posting(&test_posting(&format!("p-{}", i), "employer-1"))
            .await
            .unwrap();
    }

    let (_, free_tier) = build_over(store.clone(), StaticTiers::new().with_limit("seeker-1", 1));
    let spent = free_tier.swipe("seeker-1", "p-0", Decision::Pass, now).await;
    assert!(spent.success);
    let refused = free_tier.swipe("seeker-1", "p-1", Decision::Pass, now).await;
    assert_eq!(refused.error_kind, Some(ErrorKind::QuotaExceeded));

    // The seeker upgrades mid-day; the new headroom is usable at once.
    let (_, paid_tier) = build_over(store.clone(), StaticTiers::new().with_limit("seeker-1", 3));
    let upgraded = paid_tier.swipe("seeker-1", "p-1", Decision::Pass, now).await;
    assert!(upgraded.success);
    assert_eq!(upgraded.limit, 3);
    assert_eq!(upgraded.remaining, 1);
}

#[tokio::test]
async fn test_lowered_limit_waits_for_the_next_day() {
    let store = Arc::new(InMemoryCatalog::new());
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
    let next_day = now + Duration::days(1);

    for i in 0..4 {
        store
            .insert_posting(&test_posting(&format!("p-{}", i), "employer-1"))
            .await
            .unwrap();
    }

    let (_, paid_tier) = build_over(store.clone(), StaticTiers::new().with_limit("seeker-1", 3));
    paid_tier.swipe("seeker-1", "p-0", Decision::Pass, now).await;
    paid_tier.swipe("seeker-1", "p-1", Decision::Pass, now).await;

    // Downgraded to one per day, but today's allowance was already granted
    // at three; the remaining headroom is not clawed back.
    let (_, free_tier) = build_over(store.clone(), StaticTiers::new().with_limit("seeker-1", 1));
    let graced = free_tier.swipe("seeker-1", "p-2", Decision::Pass, now).await;
    assert!(graced.success);
    let refused = free_tier.swipe("seeker-1", "p-3", Decision::Pass, now).await;
    assert_eq!(refused.error_kind, Some(ErrorKind::QuotaExceeded));

    // Tomorrow the lowered limit is the whole allowance.
    let fresh = free_tier
        .swipe("seeker-1", "p-3", Decision::Pass, next_day)
        .await;
    assert!(fresh.success);
    assert_eq!(fresh.limit, 1);
    assert_eq!(fresh.remaining, 0);
}

#[tokio::test]
async fn test_downgrade_grace_swipes_emit_no_exhausted_events() {
    let store = Arc::new(InMemoryCatalog::new());
    let now = Utc::now();

    for i in 0..6 {
        store
            .insert_posting(&test_posting(&format!("p-{}", i), "employer-1"))
            .await
            .unwrap();
    }

    let (paid_emitter, paid_tier) =
        build_over(store.clone(), StaticTiers::new().with_limit("seeker-1", 5));
    let first = paid_tier.swipe("seeker-1", "p-0", Decision::Pass, now).await;
    assert!(first.success);
    assert_eq!(quota_exhausted_count(&paid_emitter.events().await), 0);

    // Downgraded to one per day with one swipe already spent: the remaining
    // headroom stays usable, every graced swipe reports no headroom left,
    // and none of them lands exactly on the lowered limit, so the
    // exhaustion announcement never fires.
    let (emitter, free_tier) =
        build_over(store.clone(), StaticTiers::new().with_limit("seeker-1", 1));
    for i in 1..5 {
        let graced = free_tier
            .swipe("seeker-1", &format!("p-{}", i), Decision::Pass, now)
            .await;
        assert!(graced.success, "Swipe {} rides the granted allowance", i);
        assert_eq!(graced.remaining, 0);
        assert!(!graced.can_swipe);
    }

    let refused = free_tier.swipe("seeker-1", "p-5", Decision::Pass, now).await;
    assert_eq!(refused.error_kind, Some(ErrorKind::QuotaExceeded));

    assert_eq!(quota_exhausted_count(&emitter.events().await), 0);
}

#[tokio::test]
async fn test_quota_limit_wider_than_32_bits_is_honored() {
    let big_limit = i64::from(i32::MAX) + 5;
    let (store, _, engine) = build(StaticTiers::new().with_limit("seeker-1", big_limit));
    let now = Utc::now();

    store
        .insert_posting(&test_posting("p-1", "employer-1"))
        .await
        .unwrap();

    // The limit is an i64 end to end; nothing along the path may narrow it.
    let response = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    assert!(response.success);
    assert_eq!(response.limit, big_limit);
    assert_eq!(response.remaining, big_limit - 1);
}

#[tokio::test]
async fn test_tier_outage_falls_back_to_baseline_limit() {
    let store = Arc::new(InMemoryCatalog::new());
    let emitter = Arc::new(RecordingEmitter::default());
    let engine = FeedOrchestrator::new(
        store.clone(),
        Arc::new(FailingTiers),
        emitter,
        None,
        QuotaPolicy::default(),
        FeedPolicy::default(),
    );
    let now = Utc::now();

    store
        .insert_posting(&test_posting("p-1", "employer-1"))
        .await
        .unwrap();

    let feed = engine.get_feed("seeker-1", FilterSpec::default(), now).await;
    assert_eq!(feed.quota.limit, 20, "Baseline limit applies on tier outage");
    assert_eq!(feed.error_kind, None);

    let swipe = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    assert!(swipe.success);
    assert_eq!(swipe.limit, 20);
}

#[tokio::test]
async fn test_storage_outage_fails_swipes_closed() {
    let (store, _, engine) = build(StaticTiers::new().with_limit("seeker-1", 5));
    let now = Utc::now();

    store
        .insert_posting(&test_posting("p-1", "employer-1"))
        .await
        .unwrap();
    store.set_unavailable(true);

    let response = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    assert!(!response.success);
    assert_eq!(response.error_kind, Some(ErrorKind::StorageUnavailable));
    assert_eq!(response.remaining, 0, "Outage reports no headroom");

    // Nothing was spent during the outage.
    store.set_unavailable(false);
    let retry = engine.swipe("seeker-1", "p-1", Decision::Like, now).await;
    assert!(retry.success);
    assert_eq!(retry.remaining, 4);
}

#[tokio::test]
async fn test_quota_reads_fail_closed_on_outage() {
    let (store, _, engine) = build(StaticTiers::new().with_limit("seeker-1", 5));
    store.set_unavailable(true);

    let feed = engine
        .get_feed("seeker-1", FilterSpec::default(), Utc::now())
        .await;

    assert_eq!(feed.error_kind, Some(ErrorKind::StorageUnavailable));
    assert!(feed.jobs.is_empty());
    assert_eq!(feed.quota.remaining, 0);
    assert_eq!(feed.quota.limit, 5, "The resolved limit is still reported");
    assert!(!feed.quota.can_swipe);
}
