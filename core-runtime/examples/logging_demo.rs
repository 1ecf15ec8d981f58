//! Logging system demonstration
//!
//! This example shows how to use the logging infrastructure in different modes.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use core_runtime::events::{CoreEvent, EventBus, ScanEvent};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::env;
use tracing::{debug, info, warn};

fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace);
    if let Some(filter) = args.get(2).cloned() {
        config = config.with_filter(filter);
    }

    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "Logging initialized");
    debug!("Debug-level details show up at Trace/Debug levels");
    warn!("Warnings always make it through the default filter");

    let bus = EventBus::new(16);
    let event = CoreEvent::Scan(ScanEvent::Completed {
        camera_files: 12,
        pending_files: 3,
        completed_files: 5,
        records: 20,
    });
    info!(
        description = event.description(),
        severity = ?event.severity(),
        "Events carry their own severity for log mapping"
    );
    bus.emit(event).ok();
}
