//! S5: a client_registry_request lists every currently-registered peer,
//! client and server alike, with their declared types.

use std::time::Duration;

use hydra_client::{ClientConfig, MQClient, MessageKind, PeerType};
use hydra_core::{Broker, BrokerConfig};
use hydra_test_support::{unique_endpoint, MockDealerTransport, MockRouterTransport};
use hydra_transport::RouterTransport;

#[tokio::test]
async fn registry_query_lists_every_connected_peer_with_its_declared_type() {
    let endpoint = unique_endpoint("s5");
    let transport = MockRouterTransport::bind(&endpoint).await.unwrap();
    let broker = Broker::new(transport, BrokerConfig::default());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let broker_task = tokio::spawn(broker.run(shutdown_rx));

    let s1 = MQClient::<MockDealerTransport>::new(
        ClientConfig::new(endpoint.clone(), PeerType::HydraServer).with_client_id("S1"),
    );
    s1.connect().await.unwrap();

    let c1 = MQClient::<MockDealerTransport>::new(
        ClientConfig::new(endpoint.clone(), PeerType::HydraClient).with_client_id("C1"),
    );
    c1.connect().await.unwrap();

    let c2 = MQClient::<MockDealerTransport>::new(
        ClientConfig::new(endpoint, PeerType::HydraClient).with_client_id("C2"),
    );
    c2.connect().await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = c1
        .query_registry(Some(Duration::from_secs(1)))
        .await
        .expect("registry query should succeed");
    assert_eq!(response.kind, MessageKind::ClientRegistryResponse);
    let peers = response
        .data
        .expect("registry response always carries data.peers")
        .get("peers")
        .expect("registry response always has a peers array")
        .as_array()
        .expect("peers is an array")
        .clone();

    let ids: Vec<&str> = peers
        .iter()
        .map(|p| p.get("id").and_then(|v| v.as_str()).expect("every entry has an id"))
        .collect();
    assert_eq!(ids.len(), 3, "expected exactly {{C1, C2, S1}}, got {ids:?}");
    assert!(ids.contains(&"S1"));
    assert!(ids.contains(&"C1"));
    assert!(ids.contains(&"C2"));

    let types: Vec<&str> = peers
        .iter()
        .map(|p| p.get("peer_type").and_then(|v| v.as_str()).expect("every entry has a peer_type"))
        .collect();
    assert!(types.contains(&"HydraServer"));
    assert_eq!(types.iter().filter(|t| **t == "HydraClient").count(), 2);

    s1.disconnect().await;
    c1.disconnect().await;
    c2.disconnect().await;
    let _ = shutdown_tx.send(true);
    broker_task.await.unwrap();
}
