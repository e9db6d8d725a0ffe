//! Report a few events and wait for each one to go out.
//!
//! Envelopes are written to stdout as NDJSON.

use std::time::Duration;

use flare::prelude::*;
use flare::schema::{DATA, PERSON};
use flare::ExtendablePayload;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
#[error("could not open ledger")]
struct LedgerError(#[source] std::io::Error);

fn main() -> flare::Result<()> {
    let config = ClientConfig::builder()
        .access_token("example-token")
        .environment("example")
        .min_severity(Severity::Info)
        .max_events_per_scope(3)
        .build();
    let client = Flare::builder()
        .config(config)
        .build(NdjsonTransport::stdout())?;
    let blocking = client.as_blocking(Duration::from_secs(2));

    blocking.info("service started")?;
    blocking.debug("filtered out below the threshold")?;

    let failure = LedgerError(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "ledger.db",
    ));
    blocking.error(ErrorReport::from_error(&failure))?;

    // Reserved keys passed as custom data land in the schema fields.
    let person = ExtendablePayload::new(&PERSON)?
        .with("id", "42")
        .with("email", "ops@example.com");
    let data = ExtendablePayload::new(&DATA)?
        .with("level", "warning")
        .with("body", json!({"message": {"body": "quota at 90%"}}))
        .with("person", person)
        .with("quota_pct", 90);
    blocking.log(data)?;

    let logger = client.logger("example");
    let _scope = logger.begin_scope("batch");
    for n in 0..5 {
        let outcome = logger.log(
            LogRecord::new(HostLevel::Warning)
                .message(format!("batch item {n} is slow"))
                .field("item", n),
        );
        eprintln!("item {n}: {outcome:?}");
    }

    client.shutdown();
    Ok(())
}
