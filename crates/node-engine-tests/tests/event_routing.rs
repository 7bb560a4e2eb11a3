use node_engine::event_bus::EventBus;
use node_engine::model::FlowEvent;

fn event(session_id: &str) -> FlowEvent {
    FlowEvent {
        session_id: session_id.to_string(),
        event: "e".to_string(),
        data: "d".to_string(),
    }
}

#[tokio::test]
async fn untargeted_emit_reaches_every_session_subscriber() {
    let bus = EventBus::new();
    let mut x = bus.add_subscriber("S".to_string(), Some("X".to_string()));
    let mut y = bus.add_subscriber("S".to_string(), None);

    bus.emit(event("S"), None);

    assert_eq!(x.receiver.recv().await.unwrap().data, "d");
    assert_eq!(y.receiver.recv().await.unwrap().data, "d");
}

#[tokio::test]
async fn targeted_emit_reaches_only_the_matching_connection() {
    let bus = EventBus::new();
    let mut x = bus.add_subscriber("S".to_string(), Some("X".to_string()));
    let mut y = bus.add_subscriber("S".to_string(), None);

    bus.emit(event("S"), Some("X"));

    assert!(x.receiver.recv().await.is_some());
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(y.receiver.try_recv().is_err());
}
