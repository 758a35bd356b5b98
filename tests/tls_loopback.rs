//! TLS socket against misbehaving loopback peers.
//!
//! None of these peers speak TLS, so every test exercises a path that must
//! end in exactly one error notification and never in `Opened`.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;

use gatelink::{ConnectionState, Error, SecureSocket, TransportConfig, TransportEvent};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn terminal_error(events: &mut UnboundedReceiver<TransportEvent>) -> std::sync::Arc<Error> {
    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("no notification within bound")
        .expect("event channel closed without a terminal event");

    match event {
        TransportEvent::Error(e) => {
            assert!(events.recv().await.is_none(), "notification after error");
            e
        }
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_peer_hanging_up_during_handshake() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        // Swallow the ClientHello, then hang up
        let mut buf = [0u8; 512];
        let _ = socket.read(&mut buf).await;
    });

    let socket = SecureSocket::new(TransportConfig::new("127.0.0.1", port));
    let mut events = socket.subscribe().unwrap();
    socket.connect().unwrap();

    let error = terminal_error(&mut events).await;
    assert!(matches!(*error, Error::Io(_) | Error::Tls(_)), "{:?}", error);
    assert_eq!(socket.state(), ConnectionState::Failed);
}

#[tokio::test]
async fn test_plaintext_peer_fails_handshake() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 512];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n")
            .await;
        tokio::time::sleep(Duration::from_secs(1)).await;
    });

    let socket = SecureSocket::new(TransportConfig::new("127.0.0.1", port));
    let mut events = socket.subscribe().unwrap();
    socket.connect().unwrap();

    let error = terminal_error(&mut events).await;
    assert!(matches!(*error, Error::Tls(_) | Error::Io(_)), "{:?}", error);
}

#[tokio::test]
async fn test_silent_peer_hits_connect_timeout() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let timeout = Duration::from_millis(200);
    let config = TransportConfig::new("127.0.0.1", port).with_connect_timeout(timeout);
    let socket = SecureSocket::new(config);
    let mut events = socket.subscribe().unwrap();

    let started = std::time::Instant::now();
    socket.connect().unwrap();
    let error = terminal_error(&mut events).await;

    assert!(matches!(*error, Error::Timeout(t) if t == timeout), "{:?}", error);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_refused_port_reports_error() {
    init_tracing();
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = TransportConfig::new("127.0.0.1", port).with_connect_timeout(Duration::from_secs(2));
    let socket = SecureSocket::new(config);
    let mut events = socket.subscribe().unwrap();
    socket.connect().unwrap();

    let error = terminal_error(&mut events).await;
    assert!(matches!(*error, Error::Io(_) | Error::Timeout(_)), "{:?}", error);

    // A failed socket stays failed and ignores writes
    socket.send(vec![0x01u8]);
    assert!(socket.connect().is_err());
}
