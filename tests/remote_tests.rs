use console_relay::remote::RemoteMessage;
use console_relay::web::{start_viewer, ViewerEvent};
use console_relay::{ClientCredentials, ConsoleOptions, OutputCoordinator, RemoteError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

async fn spawn_viewer(password: Option<&str>) -> (SocketAddr, mpsc::UnboundedReceiver<ViewerEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(start_viewer(listener, password.map(str::to_string), tx));
    (addr, rx)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ViewerEvent>) -> ViewerEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for viewer event")
        .expect("viewer channel closed")
}

fn coordinator() -> OutputCoordinator {
    OutputCoordinator::new(ConsoleOptions {
        mirror_to_trace: false,
        ..ConsoleOptions::default()
    })
    .with_local_sink(None)
}

#[tokio::test]
async fn writes_reach_the_viewer() {
    let (addr, mut events) = spawn_viewer(Some("secret")).await;
    let coordinator = coordinator();

    let client = coordinator
        .connect(
            &format!("ws://{}/", addr),
            ClientCredentials::new("worker", "id-1", "secret"),
        )
        .await
        .unwrap();
    assert!(client.is_connected());

    assert_eq!(
        next_event(&mut events).await,
        ViewerEvent::Connected {
            name: "worker".to_string(),
            id: "id-1".to_string(),
        }
    );

    coordinator.write("half ").await;
    coordinator.write_line("done").await;

    for expected in [
        RemoteMessage::new("[color #cccccc black]half ", false),
        RemoteMessage::new("[color #cccccc black]done", true),
    ] {
        assert_eq!(
            next_event(&mut events).await,
            ViewerEvent::Output {
                name: "worker".to_string(),
                message: expected,
            }
        );
    }

    coordinator.stop().await;
    assert!(!client.is_connected());
    assert!(matches!(
        next_event(&mut events).await,
        ViewerEvent::Disconnected { .. }
    ));
}

#[tokio::test]
async fn wrong_password_fails_connect() {
    let (addr, _events) = spawn_viewer(Some("secret")).await;
    let coordinator = coordinator();

    let result = coordinator
        .connect(
            &format!("ws://{}/", addr),
            ClientCredentials::new("worker", "id-2", "guess"),
        )
        .await;

    assert!(matches!(result, Err(RemoteError::Handshake(_))));
    assert!(coordinator.registered_sinks().is_empty());

    // Writing with no remote clients is still fine.
    coordinator.write_line("nobody listening").await;
}

#[tokio::test]
async fn unreachable_viewer_fails_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = coordinator().connect_local(addr.port(), "").await;
    assert!(matches!(result, Err(RemoteError::Handshake(_))));
}

#[tokio::test]
async fn second_connect_reuses_live_connection() {
    let (addr, mut events) = spawn_viewer(None).await;
    let coordinator = coordinator();

    let client = coordinator
        .connect(
            &format!("ws://{}/", addr),
            ClientCredentials::new("worker", "id-3", ""),
        )
        .await
        .unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        ViewerEvent::Connected { .. }
    ));

    tokio::time::timeout(Duration::from_millis(500), client.connect())
        .await
        .expect("second connect should return immediately")
        .unwrap();
    assert!(client.is_connected());

    // The next event is the write, not a second handshake.
    coordinator.write_line("once").await;
    assert_eq!(
        next_event(&mut events).await,
        ViewerEvent::Output {
            name: "worker".to_string(),
            message: RemoteMessage::new("[color #cccccc black]once", true),
        }
    );
}

#[tokio::test]
async fn writes_after_disconnect_are_dropped() {
    let (addr, mut events) = spawn_viewer(None).await;
    let coordinator = coordinator();

    let client = coordinator
        .connect(
            &format!("ws://{}/", addr),
            ClientCredentials::new("worker", "id-4", ""),
        )
        .await
        .unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        ViewerEvent::Connected { .. }
    ));

    client.disconnect().await;
    assert!(!client.is_connected());
    assert!(matches!(
        next_event(&mut events).await,
        ViewerEvent::Disconnected { .. }
    ));

    tokio::time::timeout(Duration::from_secs(1), async {
        for _ in 0..5 {
            client.output_message("lost", true).await;
        }
        coordinator.write_line("also lost").await;
    })
    .await
    .expect("writes to a closed client should not block");

    assert!(!client.is_connected());
    assert_eq!(coordinator.registered_sinks().len(), 1);
    assert_eq!(
        coordinator.with_log(|log| log.entries().last().map(|e| e.text.clone())),
        Some("also lost".to_string())
    );
}
