//! Graceful shutdown behaviour of the running server.

use std::time::Duration;

use reqwest::StatusCode;
use sendmsg::lifecycle::ServerState;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[tokio::test]
async fn in_flight_request_completes_during_drain() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(common::GATEWAY_OK)
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&gateway)
        .await;

    let server = common::spawn_server(common::test_config(&gateway.uri())).await;
    let url = server.url("/v1/sms/send");
    let in_flight = tokio::spawn(async move {
        reqwest::Client::new()
            .post(url)
            .json(&common::valid_payload())
            .send()
            .await
    });

    // Let the request reach the gateway before shutting down.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(server.shutdown.trigger());

    let response = in_flight.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(report.drained);
    assert_eq!(report.open_connections, 0);
    assert_eq!(server.lifecycle.current(), ServerState::Stopped);
}

#[tokio::test]
async fn no_connections_accepted_after_shutdown() {
    let server = common::spawn_server(common::test_config("http://127.0.0.1:1/")).await;
    let addr = server.addr;

    server.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server.lifecycle.reached(ServerState::Stopped))
        .await
        .unwrap();

    let result = tokio::net::TcpStream::connect(addr).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn second_trigger_is_a_no_op() {
    let server = common::spawn_server(common::test_config("http://127.0.0.1:1/")).await;

    assert!(server.shutdown.trigger());
    assert!(!server.shutdown.trigger());

    let report = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(report.drained);
    assert_eq!(server.lifecycle.current(), ServerState::Stopped);
}

#[tokio::test]
async fn drain_deadline_abandons_stuck_connections() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(common::GATEWAY_OK)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&gateway)
        .await;

    let mut config = common::test_config(&gateway.uri());
    config.timeouts.drain_secs = 1;
    let server = common::spawn_server(config).await;

    let url = server.url("/v1/sms/send");
    let _in_flight = tokio::spawn(async move {
        reqwest::Client::new()
            .post(url)
            .json(&common::valid_payload())
            .send()
            .await
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    server.shutdown.trigger();

    let report = tokio::time::timeout(Duration::from_secs(4), server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(!report.drained);
    assert_eq!(report.open_connections, 1);
}
