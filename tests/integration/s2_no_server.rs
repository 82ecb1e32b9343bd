//! S2: a broker with no registered server synthesizes an `error` envelope
//! with `data.reason = "no server connected"` and the inbound request_id.

use std::time::Duration;

use hydra_client::{ClientConfig, MQClient, MessageKind, PeerType};
use hydra_core::{Broker, BrokerConfig};
use hydra_test_support::{unique_endpoint, MockDealerTransport, MockRouterTransport};
use hydra_transport::RouterTransport;
use serde_json::json;

#[tokio::test]
async fn request_without_a_server_gets_a_synthesized_no_server_error() {
    let endpoint = unique_endpoint("s2");
    let transport = MockRouterTransport::bind(&endpoint).await.unwrap();
    let broker = Broker::new(transport, BrokerConfig::default());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let broker_task = tokio::spawn(broker.run(shutdown_rx));

    let client = MQClient::<MockDealerTransport>::new(ClientConfig::new(endpoint, PeerType::SimpleClient));
    client.connect().await.unwrap();

    let data = json!({ "number": 3 }).as_object().unwrap().clone();
    let response = client
        .request(MessageKind::SquareRequest, Some(data), Some(Duration::from_secs(1)))
        .await
        .expect("the broker replies with an error envelope, not a transport failure");

    assert_eq!(response.kind, MessageKind::Error);
    let data = response.data.expect("error envelope always carries data.reason");
    assert_eq!(data.get("reason").unwrap(), "no server connected");

    client.disconnect().await;
    let _ = shutdown_tx.send(true);
    broker_task.await.unwrap();
}
