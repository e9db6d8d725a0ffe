mod common;

use std::time::Duration;

use common::{Behaviour, FakeQueue};
use flare::runtime::tokio_runtime::TokioRuntime;
use flare::{
    ClientConfig, DeliveryError, Event, Flare, HostLevel, LifecycleOwner, LogDisposition,
    LogRecord, MockTransport, Severity,
};

fn config() -> ClientConfig {
    ClientConfig::builder()
        .access_token("secret")
        .environment("integration")
        .build()
}

#[test]
fn reports_reach_the_transport() {
    let transport = MockTransport::new();
    let client = Flare::builder().config(config()).build(transport.clone()).unwrap();

    client.as_blocking(Duration::from_secs(5)).error("boom").unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["access_token"], "secret");
    assert_eq!(sent[0]["data"]["environment"], "integration");
    assert_eq!(sent[0]["data"]["level"], "error");
    assert_eq!(sent[0]["data"]["body"]["message"]["body"], "boom");
}

#[test]
fn unbounded_timeout_is_accepted() {
    let transport = MockTransport::new();
    let client = Flare::builder().config(config()).build(transport.clone()).unwrap();

    client
        .bridge()
        .deliver_within(Event::message("hi"), Severity::Error, None, Duration::MAX)
        .unwrap();
    assert_eq!(transport.sent_count(), 1);
}

#[test]
fn unbounded_default_timeout_does_not_break_logging() {
    let transport = MockTransport::new();
    let config = ClientConfig::builder()
        .access_token("secret")
        .default_timeout(Duration::MAX)
        .build();
    let client = Flare::builder().config(config).build(transport.clone()).unwrap();

    let outcome = client
        .logger("unbounded")
        .log(LogRecord::new(HostLevel::Warning).message("still reported"));
    assert_eq!(outcome, LogDisposition::Delivered);
    assert_eq!(transport.sent_count(), 1);
}

#[tokio::test]
async fn built_inside_a_current_thread_runtime() {
    let transport = MockTransport::new();
    let client = Flare::builder().config(config()).build(transport.clone()).unwrap();

    client
        .as_blocking(Duration::from_secs(5))
        .error("boom")
        .unwrap();
    assert_eq!(transport.sent_count(), 1);
}

#[test]
fn hanging_transport_times_out_the_caller() {
    let client = Flare::builder()
        .config(config())
        .build(MockTransport::new().hanging())
        .unwrap();

    let result = client
        .as_blocking(Duration::from_millis(100))
        .warning("stuck");
    assert_eq!(
        result,
        Err(DeliveryError::Timeout {
            timeout: Duration::from_millis(100)
        })
    );
}

#[test]
fn sink_construction_uses_given_values() {
    let client = Flare::for_sink(
        "token",
        "sink-env",
        Duration::from_millis(1500),
        MockTransport::new(),
    )
    .unwrap();

    assert_eq!(client.config().environment, "sink-env");
    assert_eq!(client.bridge().timeout(), Duration::from_millis(1500));
}

#[test]
fn json_configuration() {
    let client = Flare::builder()
        .config_json(r#"{"access_token":"json-token","environment":"from-json"}"#)
        .unwrap()
        .build(MockTransport::new())
        .unwrap();
    assert_eq!(client.config().environment, "from-json");

    let err = Flare::builder().config_json("{not json").unwrap_err();
    assert!(matches!(err, flare::Error::Config(_)));
}

#[test]
fn reconfiguration_applies_to_later_events() {
    let transport = MockTransport::new();
    let client = Flare::builder().config(config()).build(transport.clone()).unwrap();
    let blocking = client.as_blocking(Duration::from_secs(5));

    blocking.info("before").unwrap();
    client.reconfigure(
        ClientConfig::builder()
            .access_token("secret")
            .environment("moved")
            .min_severity(Severity::Error)
            .build(),
    );
    blocking.info("filtered").unwrap();
    blocking.critical("after").unwrap();

    let environments: Vec<_> = transport
        .sent()
        .iter()
        .map(|envelope| envelope["data"]["environment"].clone())
        .collect();
    assert_eq!(environments, ["integration", "moved"]);
}

#[test]
fn logger_delivers_through_the_client() {
    let transport = MockTransport::new();
    let client = Flare::builder().config(config()).build(transport.clone()).unwrap();

    let logger = client.logger("orders");
    assert_eq!(
        logger.log(LogRecord::new(HostLevel::Error).message("order rejected")),
        LogDisposition::Delivered
    );
    assert_eq!(transport.sent()[0]["data"]["custom"]["LogEventID"], "0");
}

#[test]
fn shutdown_is_idempotent_and_stops_delivery() {
    let client = Flare::builder().config(config()).build(MockTransport::new()).unwrap();

    client.shutdown();
    client.shutdown();
    assert!(client.is_shut_down());

    let result = client.as_blocking(Duration::from_secs(1)).error("late");
    assert!(matches!(result, Err(DeliveryError::Enqueue(_))));
}

#[test]
fn explicit_runtime_is_used() {
    let runtime = TokioRuntime::dedicated(1).unwrap();
    let transport = MockTransport::new();
    let client = Flare::builder()
        .config(config())
        .runtime(runtime)
        .build(transport.clone())
        .unwrap();

    client.bridge().info("on a dedicated runtime").unwrap();
    assert_eq!(transport.sent_count(), 1);
    assert_eq!(client.pending(), 0);
}

#[test]
fn lifecycle_owner_disposes_once() {
    let queue = FakeQueue::new(Behaviour::Immediate, ClientConfig::default());
    let owner = LifecycleOwner::new(queue.clone());

    owner.shutdown();
    owner.shutdown();
    drop(owner);
    assert_eq!(queue.disposed(), 1);
}

#[test]
fn lifecycle_owner_disposes_on_drop() {
    let queue = FakeQueue::new(Behaviour::Immediate, ClientConfig::default());
    {
        let owner = LifecycleOwner::new(queue.clone());
        owner
            .bridge(Duration::from_secs(1))
            .info("through the owner")
            .unwrap();
    }
    assert_eq!(queue.disposed(), 1);
    assert_eq!(queue.enqueued(), 1);
}
