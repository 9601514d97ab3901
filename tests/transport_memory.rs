// tests/transport_memory.rs

use bytes::Bytes;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;

use iot_telemetry_sim::generator::{Reading, SensorReading};
use iot_telemetry_sim::{
    // ---
    Endpoint,
    MemoryBroker,
    MessagePublisher,
    PublishLoopBuilder,
    QoS,
    SimConfig,
    Topic,
    TransportBuilder,
};

#[tokio::test]
async fn memory_subscribe_then_publish_delivers() {
    // ---
    // Arrange
    // ---
    let broker = MemoryBroker::new();
    let topic = Topic::from("topic/test");

    let mut inbox = broker.subscribe(topic.clone()).await;
    let mut other = broker.subscribe("topic/other").await;

    let payload = Bytes::from_static(b"{\"hello\":1}");
    let endpoint = Endpoint::from("memory://ap-northeast-2");

    // ---
    // Act
    // ---
    broker
        .publish(&endpoint, &topic, QoS::AtLeastOnce, payload.clone())
        .await
        .expect("publish failed");

    // ---
    // Assert
    // ---
    let received = timeout(Duration::from_millis(100), inbox.recv())
        .await
        .expect("timed out waiting for message")
        .expect("subscription channel closed unexpectedly");

    assert_eq!(received.payload, payload);
    assert_eq!(received.topic, topic);
    assert_eq!(received.qos, QoS::AtLeastOnce);
    assert!(other.try_recv().is_err(), "exact-match only");
}

#[tokio::test]
async fn memory_close_drops_subscriptions() {
    // ---
    let broker = MemoryBroker::new();
    let mut inbox = broker.subscribe("topic/test").await;

    broker.close().await.unwrap();

    // All senders are gone, so the inbox reports closed.
    assert!(inbox.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn sensor_loop_feeds_subscriber() {
    // ---
    // Arrange
    // ---
    let broker = MemoryBroker::new();
    let mut inbox = broker.subscribe("topic/test").await;

    let config = SimConfig::sensor()
        .with_device_id("bench-7")
        .with_seed(99)
        .with_max_cycles(2);

    let mut publish_loop = PublishLoopBuilder::new(&config, broker.resolver(), broker.publisher())
        .build()
        .unwrap();

    // ---
    // Act
    // ---
    let summary = publish_loop.run(CancellationToken::new()).await;

    // ---
    // Assert
    // ---
    assert_eq!(summary.successes, 2);

    for _ in 0..2 {
        let message = inbox.recv().await.expect("inbox closed early");
        let reading: Reading = serde_json::from_slice(&message.payload).unwrap();

        let Reading::Sensor(SensorReading {
            device_id, message, ..
        }) = reading
        else {
            panic!("expected a sensor reading");
        };
        assert_eq!(device_id, "bench-7");
        assert_eq!(message, None);
    }
}

#[tokio::test]
async fn builder_memory_transport_round_trip() {
    // ---
    let handles = TransportBuilder::new()
        .client_id_for_device("test-psw0507")
        .transport_type("memory")
        .build()
        .await
        .unwrap();

    let endpoint = handles
        .resolver
        .resolve_data_endpoint("ap-northeast-2")
        .await
        .unwrap();
    assert_eq!(endpoint.as_str(), "memory://ap-northeast-2");

    handles
        .publisher
        .publish(
            &endpoint,
            &Topic::from("topic/truck"),
            QoS::AtLeastOnce,
            Bytes::from_static(b"{}"),
        )
        .await
        .unwrap();

    handles.publisher.close().await.unwrap();
}
