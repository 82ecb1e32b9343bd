//! S6: a malformed frame ahead of a well-formed request does not derail
//! the broker loop -- the well-formed request still gets forwarded exactly
//! once.

use std::sync::Arc;
use std::time::Duration;

use hydra_client::{ClientConfig, MQClient, Message, MessageKind, PeerType};
use hydra_core::{Broker, BrokerConfig};
use hydra_test_support::{unique_endpoint, MockDealerTransport, MockRouterTransport};
use hydra_transport::{DealerTransport, RouterTransport};
use serde_json::json;
use tokio::sync::Mutex;

#[tokio::test]
async fn malformed_frame_does_not_prevent_the_next_good_request_from_routing() {
    let endpoint = unique_endpoint("s6");
    let transport = MockRouterTransport::bind(&endpoint).await.unwrap();
    let broker = Broker::new(transport, BrokerConfig::default());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let broker_task = tokio::spawn(broker.run(shutdown_rx));

    let received = Arc::new(Mutex::new(Vec::new()));
    let server = MQClient::<MockDealerTransport>::new(ClientConfig::new(
        endpoint.clone(),
        PeerType::SimpleServer,
    ));
    let store = Arc::clone(&received);
    server
        .register_handler(MessageKind::SquareRequest, move |message: Message| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store.lock().await.push(message);
            });
        })
        .await;
    server.connect().await.unwrap();

    // A peer that sends non-JSON bytes directly, bypassing the typed
    // client entirely -- exercises the broker's JSON-parse-failure path.
    let mut bad_peer = MockDealerTransport::connect(&endpoint).await.unwrap();
    bad_peer.send(b"not json at all".to_vec()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = MQClient::<MockDealerTransport>::new(ClientConfig::new(
        endpoint,
        PeerType::SimpleClient,
    ));
    client.connect().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let data = json!({ "number": 4 }).as_object().unwrap().clone();
    client
        .send(Message::new(MessageKind::SquareRequest).with_data(data))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let forwarded = received.lock().await;
    assert_eq!(
        forwarded.len(),
        1,
        "the square_request should have been forwarded exactly once: {forwarded:?}"
    );

    client.disconnect().await;
    server.disconnect().await;
    let _ = shutdown_tx.send(true);
    broker_task.await.unwrap();
}
