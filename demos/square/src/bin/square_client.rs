//! Trivial demonstration client: asks the square server to square one
//! number taken from the command line (default 7) and prints the result.

use std::time::Duration;

use hydra_client::{ClientConfig, MQClient, MessageKind, PeerType};
use hydra_transport::ZmqDealerTransport;
use serde_json::json;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let number: i64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);

    let config = ClientConfig::new("tcp://127.0.0.1:5556", PeerType::SimpleClient);
    let client = MQClient::<ZmqDealerTransport>::new(config);
    client.connect().await.expect("failed to connect to broker");

    let data = json!({ "number": number })
        .as_object()
        .expect("json! of an object literal is always an object")
        .clone();
    let response = client
        .request(MessageKind::SquareRequest, Some(data), Some(Duration::from_secs(5)))
        .await
        .expect("square_request failed");

    match response.kind {
        MessageKind::SquareResponse => {
            let result = response
                .data
                .as_ref()
                .and_then(|d| d.get("result"))
                .and_then(serde_json::Value::as_i64);
            println!("{number}^2 = {result:?}");
        }
        MessageKind::Error => {
            let reason = response
                .data
                .as_ref()
                .and_then(|d| d.get("reason"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown");
            eprintln!("broker returned an error: {reason}");
        }
        other => eprintln!("unexpected response kind: {other}"),
    }

    client.disconnect().await;
}
