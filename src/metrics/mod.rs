
use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;

lazy_static! {
    pub static ref OBJECTS_REGISTERED: IntCounter =
        IntCounter::new("objects_registered", "objects that started being tracked")
            .expect("metric can not be created");

    pub static ref OBJECTS_UNREGISTERED: IntCounter =
        IntCounter::new("objects_unregistered", "objects that stopped being tracked")
            .expect("metric can not be created");

    pub static ref SERVERS_ATTACHED: IntCounter =
        IntCounter::new("servers_attached", "management servers attached")
            .expect("metric can not be created");

    pub static ref SERVERS_LOST: IntCounter =
        IntCounter::new("servers_lost", "management servers lost")
            .expect("metric can not be created");

    pub static ref ATTACH_RETRIES: IntCounterVec = IntCounterVec::new(
        Opts::new("attach_retries", "connectivity failures while attaching to a server"),
        &["server_id"]
    )
    .expect("metric can not be created");

    pub static ref LISTENER_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("listener_failures", "listener callbacks that failed or panicked"),
        &["event_type"]
    )
    .expect("metric can not be created");

    pub static ref NOTIFICATIONS_ROUTED: IntCounterVec = IntCounterVec::new(
        Opts::new("notifications_routed", "inbound notifications by classification"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new_custom(Some("dtracker".to_string()), None)
            .expect("registry can be created");
        register_custom_metrics(&registry);
        registry
    };
}

pub(crate) fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(OBJECTS_REGISTERED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(OBJECTS_UNREGISTERED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(SERVERS_ATTACHED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(SERVERS_LOST.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(ATTACH_RETRIES.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(LISTENER_FAILURES.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(NOTIFICATIONS_ROUTED.clone()))
        .expect("collector can be registered");
}

/// Export metrics in the Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode tracker metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("tracker metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
