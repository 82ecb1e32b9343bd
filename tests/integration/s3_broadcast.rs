//! S3: a server-category peer's unsolicited message reaches every other
//! connected client-category peer and never loops back to the server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hydra_client::{ClientConfig, MQClient, Message, MessageKind, PeerType};
use hydra_core::{Broker, BrokerConfig};
use hydra_test_support::{unique_endpoint, MockDealerTransport, MockRouterTransport};
use hydra_transport::RouterTransport;
use serde_json::json;

#[tokio::test]
async fn server_broadcast_reaches_every_client_but_not_itself() {
    let endpoint = unique_endpoint("s3");
    let transport = MockRouterTransport::bind(&endpoint).await.unwrap();
    let broker = Broker::new(transport, BrokerConfig::default());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let broker_task = tokio::spawn(broker.run(shutdown_rx));

    let server = MQClient::<MockDealerTransport>::new(ClientConfig::new(
        endpoint.clone(),
        PeerType::SimpleServer,
    ));
    server.connect().await.unwrap();

    let received_a = Arc::new(Mutex::new(Vec::new()));
    let client_a = MQClient::<MockDealerTransport>::new(ClientConfig::new(
        endpoint.clone(),
        PeerType::SimpleClient,
    ));
    let store_a = Arc::clone(&received_a);
    client_a
        .register_handler(MessageKind::StatusUpdate, move |message: Message| {
            store_a.lock().unwrap().push(message);
        })
        .await;
    client_a.connect().await.unwrap();

    let received_b = Arc::new(Mutex::new(Vec::new()));
    let client_b = MQClient::<MockDealerTransport>::new(ClientConfig::new(
        endpoint.clone(),
        PeerType::SimpleClient,
    ));
    let store_b = Arc::clone(&received_b);
    client_b
        .register_handler(MessageKind::StatusUpdate, move |message: Message| {
            store_b.lock().unwrap().push(message);
        })
        .await;
    client_b.connect().await.unwrap();

    let received_server = Arc::new(Mutex::new(Vec::new()));
    let store_server = Arc::clone(&received_server);
    server
        .register_handler(MessageKind::StatusUpdate, move |message: Message| {
            store_server.lock().unwrap().push(message);
        })
        .await;

    tokio::time::sleep(Duration::from_millis(50)).await;

    let data = json!({ "state": "running" }).as_object().unwrap().clone();
    server
        .send(Message::new(MessageKind::StatusUpdate).with_data(data))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(received_a.lock().unwrap().len(), 1);
    assert_eq!(received_b.lock().unwrap().len(), 1);
    assert!(received_server.lock().unwrap().is_empty());

    client_a.disconnect().await;
    client_b.disconnect().await;
    server.disconnect().await;
    let _ = shutdown_tx.send(true);
    broker_task.await.unwrap();
}
