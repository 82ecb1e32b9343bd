//! S4: a peer that stops heartbeating is pruned from the registry within
//! one prune interval of `client_timeout` elapsing.

use std::time::Duration;

use hydra_client::{ClientConfig, MQClient, MessageKind, PeerType};
use hydra_core::{Broker, BrokerConfig};
use hydra_test_support::{unique_endpoint, MockDealerTransport, MockRouterTransport};
use hydra_transport::RouterTransport;

#[tokio::test]
async fn a_peer_that_goes_silent_is_pruned_within_one_interval_of_the_timeout() {
    let endpoint = unique_endpoint("s4");
    let transport = MockRouterTransport::bind(&endpoint).await.unwrap();
    let config = BrokerConfig::default().with_client_timeout(Duration::from_secs_f64(1.0));
    let broker = Broker::new(transport, config);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let broker_task = tokio::spawn(broker.run(shutdown_rx));

    let silent = MQClient::<MockDealerTransport>::new(
        ClientConfig::new(endpoint.clone(), PeerType::SimpleClient)
            .with_client_id("silent-one")
            .with_heartbeat_interval(Duration::from_secs(3600)),
    );
    silent.connect().await.unwrap();

    // One heartbeat landed at connect time; the client then falls silent
    // (its heartbeat interval is far longer than the test).
    tokio::time::sleep(Duration::from_millis(50)).await;

    let watcher = MQClient::<MockDealerTransport>::new(ClientConfig::new(
        endpoint,
        PeerType::SimpleClient,
    ));
    watcher.connect().await.unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;

    let response = watcher
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
    assert!(
        peers.iter().all(|p| p.get("id").and_then(|v| v.as_str()) != Some("silent-one")),
        "silent peer should have been pruned: {peers:?}"
    );

    silent.disconnect().await;
    watcher.disconnect().await;
    let _ = shutdown_tx.send(true);
    broker_task.await.unwrap();
}
