mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{Behaviour, FakeQueue};
use flare::schema::DATA;
use flare::{
    BlockingDeliveryBridge, ClientConfig, DeliveryError, DeliveryOutcome, Event,
    ExtendablePayload, Severity,
};
use serde_json::{json, Map};

const SLACK: Duration = Duration::from_millis(250);

fn bridge(queue: &Arc<FakeQueue>, timeout: Duration) -> BlockingDeliveryBridge {
    BlockingDeliveryBridge::new(queue.clone(), timeout)
}

#[test]
fn silent_queue_times_out_within_window() {
    let queue = FakeQueue::new(Behaviour::Silent, ClientConfig::default());
    let timeout = Duration::from_millis(100);

    let started = Instant::now();
    let result = bridge(&queue, timeout).deliver(Event::message("hello"), Severity::Error, None);
    let elapsed = started.elapsed();

    assert_eq!(result, Err(DeliveryError::Timeout { timeout }));
    assert!(elapsed >= timeout, "returned early after {elapsed:?}");
    assert!(elapsed < timeout + SLACK, "returned late after {elapsed:?}");

    // Nobody waits on the signal any more; firing it is a harmless no-op.
    let held = queue.take_held();
    assert_eq!(held.len(), 1);
    for signal in held {
        assert!(!signal.complete(DeliveryOutcome::Delivered));
    }
}

#[test]
fn immediate_queue_returns_quickly() {
    let queue = FakeQueue::new(Behaviour::Immediate, ClientConfig::default());

    let started = Instant::now();
    bridge(&queue, Duration::from_secs(30))
        .deliver(Event::message("hello"), Severity::Info, None)
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(queue.enqueued(), 1);
}

#[test]
fn delayed_signal_within_timeout_succeeds() {
    let queue = FakeQueue::new(
        Behaviour::Delayed(Duration::from_millis(20)),
        ClientConfig::default(),
    );
    bridge(&queue, Duration::from_secs(5))
        .deliver(Event::message("hello"), Severity::Info, None)
        .unwrap();
}

#[test]
fn refused_submission_is_reported() {
    let queue = FakeQueue::new(Behaviour::Refuse, ClientConfig::default());
    let result = bridge(&queue, Duration::from_secs(1)).deliver("x", Severity::Info, None);
    assert!(matches!(result, Err(DeliveryError::Enqueue(_))));
}

#[test]
fn timeout_is_passed_to_the_queue() {
    let queue = FakeQueue::new(Behaviour::Immediate, ClientConfig::default());
    let bridge = bridge(&queue, Duration::from_secs(3));
    bridge.deliver("a", Severity::Info, None).unwrap();
    bridge
        .deliver_within("b", Severity::Info, None, Duration::from_millis(750))
        .unwrap();

    let timeouts: Vec<_> = queue.submissions().iter().map(|s| s.timeout).collect();
    assert_eq!(timeouts, [Duration::from_secs(3), Duration::from_millis(750)]);
}

#[test]
fn filtered_levels_never_reach_the_queue() {
    let config = ClientConfig::builder().min_severity(Severity::Error).build();
    let queue = FakeQueue::new(Behaviour::Silent, config);
    let bridge = bridge(&queue, Duration::from_secs(10));

    let started = Instant::now();
    bridge.debug("d").unwrap();
    bridge.info("i").unwrap();
    bridge.warning("w").unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(queue.enqueued(), 0);
}

#[test]
fn disabled_client_filters_everything() {
    let config = ClientConfig::builder().enabled(false).build();
    let queue = FakeQueue::new(Behaviour::Silent, config);
    bridge(&queue, Duration::from_secs(10)).critical("c").unwrap();
    assert_eq!(queue.enqueued(), 0);
}

#[test]
fn admitted_levels_carry_their_severity() {
    let config = ClientConfig::builder().min_severity(Severity::Warning).build();
    let queue = FakeQueue::new(Behaviour::Immediate, config);
    let bridge = bridge(&queue, Duration::from_secs(1));

    bridge.warning("w").unwrap();
    bridge.error("e").unwrap();
    bridge.critical("c").unwrap();

    let severities: Vec<_> = queue.submissions().iter().map(|s| s.severity).collect();
    assert_eq!(
        severities,
        [Severity::Warning, Severity::Error, Severity::Critical]
    );
}

#[test]
fn prebuilt_data_is_logged_at_its_own_level() {
    let queue = FakeQueue::new(Behaviour::Immediate, ClientConfig::default());
    let bridge = bridge(&queue, Duration::from_secs(1));

    let data = ExtendablePayload::new(&DATA).unwrap().with("level", "error");
    bridge.log(data).unwrap();
    bridge
        .log(ExtendablePayload::new(&DATA).unwrap().with("title", "no level"))
        .unwrap();

    let severities: Vec<_> = queue.submissions().iter().map(|s| s.severity).collect();
    assert_eq!(severities, [Severity::Error, Severity::Debug]);
}

#[test]
fn prebuilt_data_ignores_the_threshold() {
    let config = ClientConfig::builder().min_severity(Severity::Critical).build();
    let queue = FakeQueue::new(Behaviour::Immediate, config);

    let data = ExtendablePayload::new(&DATA).unwrap().with("level", "info");
    bridge(&queue, Duration::from_secs(1)).log(data).unwrap();

    assert_eq!(queue.enqueued(), 1);
    assert_eq!(queue.submissions()[0].severity, Severity::Info);
}

#[test]
fn level_helpers_carry_custom_data() {
    let config = ClientConfig::builder().min_severity(Severity::Warning).build();
    let queue = FakeQueue::new(Behaviour::Immediate, config);
    let bridge = bridge(&queue, Duration::from_secs(1));

    let mut custom = Map::new();
    custom.insert("order".into(), json!(42));

    bridge.error_with("declined", custom.clone()).unwrap();
    bridge.info_with("below threshold", custom.clone()).unwrap();
    bridge
        .log_at(Severity::Critical, "at a chosen level", Some(custom.clone()))
        .unwrap();
    bridge.log_at(Severity::Debug, "also filtered", None).unwrap();

    let submissions = queue.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].severity, Severity::Error);
    assert_eq!(submissions[0].custom.as_ref(), Some(&custom));
    assert_eq!(submissions[1].severity, Severity::Critical);
    assert_eq!(submissions[1].custom.as_ref(), Some(&custom));
}

#[test]
fn sibling_bridge_shares_the_queue() {
    let queue = FakeQueue::new(Behaviour::Immediate, ClientConfig::default());
    let slow = bridge(&queue, Duration::from_secs(5));
    let fast = slow.with_timeout(Duration::from_millis(10));

    assert_eq!(fast.timeout(), Duration::from_millis(10));
    slow.info("a").unwrap();
    fast.info("b").unwrap();
    assert_eq!(queue.enqueued(), 2);
}

#[test]
fn concurrent_calls_are_independent() {
    let queue = FakeQueue::new(Behaviour::Silent, ClientConfig::default());
    let bridge = bridge(&queue, Duration::from_millis(100));

    let started = Instant::now();
    std::thread::scope(|s| {
        for n in 0..8 {
            let bridge = &bridge;
            s.spawn(move || {
                let result = bridge.deliver(format!("event {n}"), Severity::Info, None);
                assert!(matches!(result, Err(DeliveryError::Timeout { .. })));
            });
        }
    });

    // All waits overlap; none serialises behind another.
    assert!(started.elapsed() < Duration::from_millis(100) * 4);
    assert_eq!(queue.enqueued(), 8);
}
