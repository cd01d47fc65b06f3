//! `HttpRemote` against an in-process axum server speaking the server's
//! side of the three endpoints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

use vouch_protocol::remote::{HttpRemote, HttpRemoteConfig, NetworkError, RemoteError, RemoteService};
use vouch_protocol::transaction::Status;

#[derive(Clone)]
struct Bank {
    latest_body: &'static str,
    latest_status: StatusCode,
    submit_status: StatusCode,
    stat_body: &'static str,
    delay: Duration,
    seen_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    seen_forms: Arc<Mutex<Vec<HashMap<String, String>>>>,
    seen_status_ids: Arc<Mutex<Vec<u64>>>,
}

impl Default for Bank {
    fn default() -> Self {
        Self {
            latest_body: "0a0b|ccdd\n",
            latest_status: StatusCode::OK,
            submit_status: StatusCode::OK,
            stat_body: "1\n",
            delay: Duration::ZERO,
            seen_queries: Arc::default(),
            seen_forms: Arc::default(),
            seen_status_ids: Arc::default(),
        }
    }
}

async fn latest(
    State(bank): State<Bank>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    bank.seen_queries.lock().unwrap().push(query);
    tokio::time::sleep(bank.delay).await;
    (bank.latest_status, bank.latest_body)
}

async fn submit(
    State(bank): State<Bank>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    bank.seen_forms.lock().unwrap().push(form);
    bank.submit_status
}

async fn stat(State(bank): State<Bank>, Path(id): Path<u64>) -> &'static str {
    bank.seen_status_ids.lock().unwrap().push(id);
    bank.stat_body
}

/// Serve `bank` on an ephemeral port and return its base URL.
async fn spawn(bank: Bank) -> String {
    let app = Router::new()
        .route("/api/user/+last-txn", get(latest))
        .route("/api/txn/+mod", post(submit))
        .route("/api/txn/:id/+stat", get(stat))
        .with_state(bank);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn remote(base_url: &str) -> HttpRemote {
    HttpRemote::new(HttpRemoteConfig::new(base_url)).unwrap()
}

#[tokio::test]
async fn fetch_latest_reads_the_first_line() {
    let bank = Bank {
        latest_body: "0a0b|ccdd\nffff|eeee\n",
        ..Bank::default()
    };
    let queries = bank.seen_queries.clone();
    let base = spawn(bank).await;

    let tuple = remote(&base).fetch_latest(7).await.unwrap();

    assert_eq!(tuple.ciphertext, vec![0x0a, 0x0b]);
    assert_eq!(tuple.signature, vec![0xcc, 0xdd]);
    let queries = queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].get("device_id").map(String::as_str), Some("7"));
}

#[tokio::test]
async fn fetch_latest_reports_server_errors_as_transient() {
    let base = spawn(Bank {
        latest_status: StatusCode::SERVICE_UNAVAILABLE,
        ..Bank::default()
    })
    .await;

    let err = remote(&base).fetch_latest(7).await.unwrap_err();

    match err {
        RemoteError::Network(err) => {
            assert!(matches!(err, NetworkError::HttpStatus { status: 503, .. }));
            assert!(err.is_transient());
        }
        other => panic!("expected a network error, got {:?}", other),
    }
}

#[tokio::test]
async fn fetch_latest_rejects_garbage_bodies() {
    let base = spawn(Bank {
        latest_body: "no delimiter here",
        ..Bank::default()
    })
    .await;
    assert!(matches!(
        remote(&base).fetch_latest(7).await,
        Err(RemoteError::Decode(_))
    ));

    let base = spawn(Bank {
        latest_body: "",
        ..Bank::default()
    })
    .await;
    assert!(matches!(
        remote(&base).fetch_latest(7).await,
        Err(RemoteError::Network(NetworkError::EmptyBody { .. }))
    ));
}

#[tokio::test]
async fn blank_first_line_is_not_skipped() {
    let base = spawn(Bank {
        latest_body: "\n0a0b|ccdd\n",
        ..Bank::default()
    })
    .await;

    assert!(matches!(
        remote(&base).fetch_latest(7).await,
        Err(RemoteError::Decode(_))
    ));
}

#[tokio::test]
async fn submit_posts_hex_form_fields() {
    let bank = Bank::default();
    let forms = bank.seen_forms.clone();
    let base = spawn(bank).await;

    remote(&base)
        .submit(5, 7, &[0xde, 0xad], &[0xbe, 0xef])
        .await
        .unwrap();

    let forms = forms.lock().unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["payload"], "dead");
    assert_eq!(forms[0]["signature"], "beef");
    assert_eq!(forms[0]["device_id"], "7");
}

#[tokio::test]
async fn non_success_submit_is_a_rejection() {
    let base = spawn(Bank {
        submit_status: StatusCode::FORBIDDEN,
        ..Bank::default()
    })
    .await;

    let err = remote(&base).submit(5, 7, &[1], &[2]).await.unwrap_err();

    assert!(matches!(err, RemoteError::Rejected { status: 403 }));
}

#[tokio::test]
async fn submit_accepts_only_200() {
    for (code, expected) in [(StatusCode::ACCEPTED, 202), (StatusCode::NO_CONTENT, 204)] {
        let base = spawn(Bank {
            submit_status: code,
            ..Bank::default()
        })
        .await;

        let err = remote(&base).submit(5, 7, &[1, 2], &[3, 4]).await.unwrap_err();

        assert!(
            matches!(err, RemoteError::Rejected { status } if status == expected),
            "{:?}",
            err
        );
    }
}

#[tokio::test]
async fn query_status_decodes_the_body() {
    let bank = Bank {
        stat_body: " 2\n",
        ..Bank::default()
    };
    let ids = bank.seen_status_ids.clone();
    let base = spawn(bank).await;

    let status = remote(&base).query_status(42).await.unwrap();

    assert_eq!(status, Status::Denied);
    assert_eq!(*ids.lock().unwrap(), vec![42]);
}

#[tokio::test]
async fn query_status_rejects_unknown_codes() {
    let base = spawn(Bank {
        stat_body: "9",
        ..Bank::default()
    })
    .await;

    assert!(matches!(
        remote(&base).query_status(1).await,
        Err(RemoteError::Decode(_))
    ));
}

#[tokio::test]
async fn slow_server_times_out() {
    let base = spawn(Bank {
        delay: Duration::from_secs(5),
        ..Bank::default()
    })
    .await;
    let remote = HttpRemote::new(HttpRemoteConfig {
        request_timeout: Duration::from_millis(200),
        ..HttpRemoteConfig::new(base)
    })
    .unwrap();

    let err = remote.fetch_latest(7).await.unwrap_err();

    match err {
        RemoteError::Network(err) => {
            assert!(matches!(err, NetworkError::Timeout { .. }), "{:?}", err);
            assert!(err.is_transient());
        }
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transient_connect_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = remote(&format!("http://{}", addr))
        .fetch_latest(7)
        .await
        .unwrap_err();

    match err {
        RemoteError::Network(err) => assert!(err.is_transient(), "{:?}", err),
        other => panic!("expected a network error, got {:?}", other),
    }
}

#[test]
fn invalid_endpoint_is_rejected_up_front() {
    assert!(matches!(
        HttpRemote::new(HttpRemoteConfig::new("localhost:8000")),
        Err(NetworkError::InvalidEndpoint { .. })
    ));
}
