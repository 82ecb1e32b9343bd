//! S1: broker + one SimpleServer + one SimpleClient, a square_request round
//! trips to a square_response carrying the same request_id.

use std::sync::Arc;
use std::time::Duration;

use hydra_client::{ClientConfig, MQClient, Message, MessageKind, PeerType};
use hydra_core::{Broker, BrokerConfig};
use hydra_test_support::{unique_endpoint, MockDealerTransport, MockRouterTransport};
use hydra_transport::RouterTransport;
use serde_json::json;

#[tokio::test]
async fn square_request_round_trips_to_square_response() {
    let endpoint = unique_endpoint("s1");
    let transport = MockRouterTransport::bind(&endpoint).await.unwrap();
    let broker = Broker::new(transport, BrokerConfig::default());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let broker_task = tokio::spawn(broker.run(shutdown_rx));

    let server = Arc::new(MQClient::<MockDealerTransport>::new(ClientConfig::new(
        endpoint.clone(),
        PeerType::SimpleServer,
    )));
    let handler_server = Arc::clone(&server);
    server
        .register_handler(MessageKind::SquareRequest, move |message: Message| {
            let number = message
                .data
                .as_ref()
                .and_then(|d| d.get("number"))
                .and_then(serde_json::Value::as_i64)
                .expect("square_request always carries a number");
            let data = json!({ "number": number, "result": number * number })
                .as_object()
                .unwrap()
                .clone();
            let mut response = Message::new(MessageKind::SquareResponse).with_data(data);
            if let Some(request_id) = message.request_id.clone() {
                response = response.with_request_id(request_id);
            }
            let server = Arc::clone(&handler_server);
            tokio::spawn(async move {
                server.send(response).await.unwrap();
            });
        })
        .await;
    server.connect().await.unwrap();

    let client = MQClient::<MockDealerTransport>::new(ClientConfig::new(endpoint.clone(), PeerType::SimpleClient));
    client.connect().await.unwrap();

    // Let both peers' initial heartbeats register with the broker before
    // issuing the request.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let data = json!({ "number": 7 }).as_object().unwrap().clone();
    let response = client
        .request(MessageKind::SquareRequest, Some(data), Some(Duration::from_secs(2)))
        .await
        .expect("square_request should succeed with a server connected");

    assert_eq!(response.kind, MessageKind::SquareResponse);
    let data = response.data.expect("square_response always carries data");
    assert_eq!(data.get("number").unwrap(), 7);
    assert_eq!(data.get("result").unwrap(), 49);

    client.disconnect().await;
    server.disconnect().await;
    let _ = shutdown_tx.send(true);
    broker_task.await.unwrap();
}
