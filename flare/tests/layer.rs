#![cfg(feature = "layer")]

mod common;

use std::time::Duration;

use common::{Behaviour, FakeQueue};
use flare::layer::FlareLayer;
use flare::{BlockingDeliveryBridge, ClientConfig, Event, FlareLogger, Severity};
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, thiserror::Error)]
#[error("connection reset")]
struct ResetError;

fn layer(queue: &std::sync::Arc<FakeQueue>) -> FlareLayer {
    let bridge = BlockingDeliveryBridge::new(queue.clone(), Duration::from_secs(1));
    FlareLayer::new(FlareLogger::new("tracing", bridge))
}

#[test]
fn tracing_events_are_reported() {
    let config = ClientConfig::builder().min_severity(Severity::Warning).build();
    let queue = FakeQueue::new(Behaviour::Immediate, config);
    let subscriber = tracing_subscriber::registry().with(layer(&queue));

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("below threshold");
        tracing::warn!(shard = 4, "replica lagging");
        let err = ResetError;
        tracing::error!(error = &err as &dyn std::error::Error, "upstream failed");
    });

    let submissions = queue.submissions();
    assert_eq!(submissions.len(), 2);

    assert_eq!(submissions[0].severity, Severity::Warning);
    let Event::Data(warning) = &submissions[0].event else {
        panic!("expected data payload");
    };
    let warning = warning.clone().into_value();
    assert_eq!(warning["body"]["message"]["body"], "replica lagging");
    assert_eq!(warning["custom"]["shard"], 4);
    assert_eq!(warning["custom"]["target"], "layer");

    assert_eq!(submissions[1].severity, Severity::Error);
    let Event::Data(error) = &submissions[1].event else {
        panic!("expected data payload");
    };
    let error = error.clone().into_value();
    assert_eq!(error["body"]["trace"]["exception"]["message"], "connection reset");
    assert_eq!(error["custom"]["LogMessage"], "upstream failed");
}

#[test]
fn internal_diagnostics_are_not_reported() {
    let queue = FakeQueue::new(Behaviour::Immediate, ClientConfig::default());
    let subscriber = tracing_subscriber::registry().with(layer(&queue));

    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(target: "flare_net::queue", "internal");
        tracing::warn!(target: "flare", "internal");
    });

    assert_eq!(queue.enqueued(), 0);
}
