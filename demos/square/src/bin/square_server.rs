//! Trivial demonstration server: answers `square_request` with the square
//! of the given number. Not part of the broker/routing/client core -- a
//! worked example of `hydra-client` from the server side.

use std::time::Duration;

use hydra_client::{Message, MessageKind, MQClient, ClientConfig, PeerType};
use hydra_transport::ZmqDealerTransport;
use serde_json::json;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::new("tcp://127.0.0.1:5556", PeerType::SimpleServer);
    let client = std::sync::Arc::new(MQClient::<ZmqDealerTransport>::new(config));

    let handler_client = std::sync::Arc::clone(&client);
    client
        .register_handler(MessageKind::SquareRequest, move |message: Message| {
            let Some(number) = message
                .data
                .as_ref()
                .and_then(|d| d.get("number"))
                .and_then(serde_json::Value::as_i64)
            else {
                return;
            };
            let result = number * number;
            let response = Message::new(MessageKind::SquareResponse)
                .with_data(
                    json!({ "number": number, "result": result })
                        .as_object()
                        .expect("json! of an object literal is always an object")
                        .clone(),
                );
            let response = match message.request_id {
                Some(ref id) => response.with_request_id(id.clone()),
                None => response,
            };
            let client = std::sync::Arc::clone(&handler_client);
            tokio::spawn(async move {
                if let Err(e) = client.send(response).await {
                    tracing::warn!(error = %e, "failed to send square_response");
                }
            });
        })
        .await;

    client.connect().await.expect("failed to connect to broker");
    info!("square-server connected, waiting for square_request");

    tokio::signal::ctrl_c().await.expect("failed to await ctrl-c");
    client.disconnect().await;

    // Give the disconnect a moment to drain before the process exits.
    tokio::time::sleep(Duration::from_millis(50)).await;
}
