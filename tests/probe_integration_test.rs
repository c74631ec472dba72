use futures::StreamExt;
use httpmock::prelude::*;
use resolve_probe::domain::ports::Prober;
use resolve_probe::{
    BatchRunner, ClientSettings, FailureKind, FixedHostClient, FixedHostClientFactory,
    ProbeOutcome, ProbeState, ProbeTargets, RunEvent, Scheme, SystemAddressResolver,
};
use rcgen::CertifiedKey;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn plain_http(port: u16) -> ClientSettings {
    ClientSettings {
        scheme: Scheme::Http,
        port: Some(port),
        ..ClientSettings::default()
    }
}

fn https_with_timeout(port: u16, timeout: Duration) -> ClientSettings {
    ClientSettings {
        timeout,
        port: Some(port),
        ..ClientSettings::default()
    }
}

/// Accepts connections and never writes a byte.
async fn silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

/// Answers anything, including a TLS ClientHello, with plain HTTP.
async fn plaintext_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .await;
                tokio::time::sleep(Duration::from_secs(2)).await;
            });
        }
    });
    addr
}

/// HTTPS origin with a self-signed certificate for an unrelated name.
/// Answers 503 and records the SNI each client sent.
async fn self_signed_origin() -> (SocketAddr, Arc<Mutex<Vec<Option<String>>>>) {
    let CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["unrelated.invalid".to_string()]).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };
                let sni = tls.get_ref().1.server_name().map(str::to_string);
                recorded.lock().unwrap().push(sni);

                let mut buf = [0u8; 2048];
                let _ = tls.read(&mut buf).await;
                let _ = tls
                    .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .await;
                let _ = tls.shutdown().await;
            });
        }
    });

    (addr, seen)
}

#[tokio::test]
async fn test_https_origin_with_untrusted_certificate_responds() {
    let (addr, seen) = self_signed_origin().await;

    let client = FixedHostClient::build(
        addr.ip(),
        &https_with_timeout(addr.port(), Duration::from_secs(2)),
    )
    .unwrap();
    let outcome = client.probe("shop.example.test").await;

    assert!(
        matches!(outcome, ProbeOutcome::Succeeded { status: 503, .. }),
        "unexpected outcome: {outcome:?}"
    );
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[Some("shop.example.test".to_string())]
    );
}

#[tokio::test]
async fn test_error_status_counts_as_response() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/")
                .header("user-agent", "AndroidCurlProbe/1.0");
            then.status(503);
        })
        .await;

    let client = FixedHostClient::build(LOCALHOST, &plain_http(server.port())).unwrap();
    let outcome = client.probe("origin.example.test").await;

    mock.assert_async().await;
    assert!(matches!(outcome, ProbeOutcome::Succeeded { status: 503, .. }));
}

#[tokio::test]
async fn test_host_header_is_the_probed_domain() {
    let server = MockServer::start_async().await;
    let host = format!("shop.example.test:{}", server.port());
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/").header("host", host.as_str());
            then.status(204);
        })
        .await;

    let client = FixedHostClient::build(LOCALHOST, &plain_http(server.port())).unwrap();
    let outcome = client.probe("shop.example.test").await;

    mock.assert_async().await;
    assert!(matches!(outcome, ProbeOutcome::Succeeded { status: 204, .. }));
}

#[tokio::test]
async fn test_silent_endpoint_times_out() {
    let addr = silent_server().await;
    let timeout = Duration::from_millis(300);

    let client = FixedHostClient::build(addr.ip(), &https_with_timeout(addr.port(), timeout)).unwrap();
    let outcome = client.probe("blackhole.example.test").await;

    match outcome {
        ProbeOutcome::Failed {
            error: FailureKind::Timeout,
            elapsed_ms,
        } => {
            assert!(elapsed_ms >= 250, "returned too early: {elapsed_ms} ms");
            assert!(elapsed_ms < 3000, "timeout not enforced: {elapsed_ms} ms");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_tls_server_is_a_handshake_failure() {
    let addr = plaintext_server().await;

    let client = FixedHostClient::build(
        addr.ip(),
        &https_with_timeout(addr.port(), Duration::from_secs(2)),
    )
    .unwrap();
    let outcome = client.probe("wrong-origin.example.test").await;

    assert!(
        matches!(
            outcome,
            ProbeOutcome::Failed {
                error: FailureKind::TlsHandshake(_),
                ..
            }
        ),
        "unexpected outcome: {outcome:?}"
    );
}

#[tokio::test]
async fn test_refused_connection_is_other_failure() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = FixedHostClient::build(LOCALHOST, &plain_http(port)).unwrap();
    let outcome = client.probe("closed.example.test").await;

    assert!(
        matches!(
            outcome,
            ProbeOutcome::Failed {
                error: FailureKind::Other(_),
                ..
            }
        ),
        "unexpected outcome: {outcome:?}"
    );
}

#[tokio::test]
async fn test_batch_run_against_local_origin() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;

    let runner = BatchRunner::new(
        SystemAddressResolver::new(),
        FixedHostClientFactory::new(plain_http(server.port())),
    );
    let targets = ProbeTargets::from_lines("a.example.test\nA.EXAMPLE.TEST\n\nb.example.test\n").unwrap();

    let events: Vec<RunEvent> = runner.run("127.0.0.1".to_string(), targets).collect().await;

    mock.assert_hits_async(2).await;

    let done: Vec<(String, ProbeState)> = events
        .into_iter()
        .filter_map(|event| match event {
            RunEvent::Transition { domain, state, .. } if state.is_terminal() => Some((domain, state)),
            _ => None,
        })
        .collect();

    assert_eq!(done.len(), 2);
    assert_eq!(done[0].0, "a.example.test");
    assert_eq!(done[1].0, "b.example.test");
    assert!(done
        .iter()
        .all(|(_, state)| matches!(state, ProbeState::Succeeded { status: 200, .. })));
}

#[tokio::test]
async fn test_batch_run_aborts_on_bad_address() {
    let runner = BatchRunner::new(SystemAddressResolver::new(), FixedHostClientFactory::default());
    let targets = ProbeTargets::new(["a.example.test", "b.example.test"]).unwrap();

    let events: Vec<RunEvent> = runner
        .run("not a valid host!! ".to_string(), targets)
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], RunEvent::Aborted { .. }));
}
