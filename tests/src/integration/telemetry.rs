//! Subscriber installation. Global state, so exactly one test installs it.

#[cfg(test)]
mod tests {
    use singularity_telemetry::{init_telemetry, TelemetryConfig, TelemetryError};

    #[test]
    fn test_subscriber_installs_once() {
        let config = TelemetryConfig::default()
            .with_service_name("singularity-tests")
            .with_console_output(false)
            .with_log_level("warn");

        let guard = init_telemetry(config.clone()).expect("first install");
        assert!(matches!(
            init_telemetry(config),
            Err(TelemetryError::SubscriberInit(_))
        ));

        singularity_telemetry::log_replication_event!(warn, "peer-1", "chest", "Handled after init");
        drop(guard);
    }
}
