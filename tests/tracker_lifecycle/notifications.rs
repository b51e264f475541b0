use d_tracker::ChannelListener;
use d_tracker::Tracker;
use d_tracker::TrackerEvent;
use serde_json::json;

use crate::common::Node;
use crate::common::Recorder;

#[tokio::test]
async fn state_changes_reach_listeners_as_typed_events() {
    let local = Node::new("local").with_object("app:name=cache", &["Any"]);
    let tracker = Tracker::builder(local.locator())
        .local_only(true)
        .forward_notifications(true)
        .build()
        .await
        .unwrap();
    let recorder = Recorder::new();
    tracker.add_listener(recorder.clone(), false);

    local.set_state("app:name=cache", json!(1)).await;
    local.set_state("app:name=cache", json!(2)).await;

    let events = recorder.events();
    assert_eq!(recorder.kinds(), vec!["state_changed", "state_changed"]);
    match &events[1] {
        TrackerEvent::StateChanged {
            old_state, new_state, ..
        } => {
            assert_eq!(old_state, &json!(1));
            assert_eq!(new_state, &json!(2));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn generic_notifications_are_forwarded_only_when_enabled() {
    let local = Node::new("local").with_object("app:name=cache", &["Any"]);
    let quiet = Tracker::builder(local.locator()).local_only(true).build().await.unwrap();
    let loud = Tracker::builder(local.locator())
        .local_only(true)
        .forward_notifications(true)
        .build()
        .await
        .unwrap();
    let quiet_recorder = Recorder::new();
    let loud_recorder = Recorder::new();
    quiet.add_listener(quiet_recorder.clone(), false);
    loud.add_listener(loud_recorder.clone(), false);

    local.emit("app:name=cache", "app.alert", json!({"level": "high"})).await;

    assert!(quiet_recorder.events().is_empty());
    assert_eq!(loud_recorder.kinds(), vec!["notification"]);
}

#[tokio::test]
async fn channel_listener_streams_events() {
    let local = Node::new("local").with_object("app:name=cache", &["Any"]);
    let (listener, mut rx) = ChannelListener::new(16);
    let tracker = Tracker::builder(local.locator())
        .local_only(true)
        .listener(listener)
        .build()
        .await
        .unwrap();

    local.register("app:name=queue", &["Any"]).await;

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.kind(), "registered");
    assert_eq!(second.locator().name().as_str(), "app:name=queue");
    assert_eq!(tracker.count(), 2);
}
