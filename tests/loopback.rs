//! End-to-end tests driving a launched socket the way a protocol client
//! would: JSON in through `send`, JSON out through the message callback,
//! with a mock engine task on the other side of the channels.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;

use kernel_loopback::engine::{ExecRequest, LifecycleEvent, MimeBundle, StreamName};
use kernel_loopback::exchange::SessionContext;
use kernel_loopback::socket::{launch, KernelSocket, SocketHandle};
use kernel_loopback::types::Config;

const WAIT: Duration = Duration::from_secs(2);

struct Harness {
    handle: SocketHandle,
    dispatch_rx: mpsc::UnboundedReceiver<ExecRequest>,
    event_tx: mpsc::UnboundedSender<LifecycleEvent>,
    messages: mpsc::UnboundedReceiver<Value>,
    opened: mpsc::UnboundedReceiver<()>,
    closed: mpsc::UnboundedReceiver<()>,
}

/// Launch a socket with every callback wired to a channel the test can await.
fn launch_harness(open_delay: Duration) -> Harness {
    let mut config = Config::default();
    config.socket.open_delay = open_delay;

    let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let mut socket = KernelSocket::new(
        "kernel-test",
        Arc::new(SessionContext::new()),
        dispatch_tx,
        &config,
    );

    let (msg_tx, messages) = mpsc::unbounded_channel();
    socket.set_on_message(move |raw| {
        let value: Value = serde_json::from_str(&raw).unwrap();
        let _ = msg_tx.send(value);
    });

    let (open_tx, opened) = mpsc::unbounded_channel();
    socket.set_on_open(move || {
        let _ = open_tx.send(());
    });

    let (close_tx, closed) = mpsc::unbounded_channel();
    socket.set_on_close(move || {
        let _ = close_tx.send(());
    });

    Harness {
        handle: launch(socket, event_rx),
        dispatch_rx,
        event_tx,
        messages,
        opened,
        closed,
    }
}

fn execute_request(code: &str, msg_id: &str) -> String {
    serde_json::json!({
        "header": { "msg_id": msg_id, "msg_type": "execute_request" },
        "content": { "code": code },
        "channel": "shell",
    })
    .to_string()
}

fn kernel_info_request(msg_id: &str) -> String {
    serde_json::json!({
        "header": { "msg_id": msg_id, "msg_type": "kernel_info_request" },
        "content": {},
        "channel": "shell",
    })
    .to_string()
}

fn plain_result(text: &str) -> MimeBundle {
    let mut bundle = MimeBundle::new();
    bundle.insert("text/plain".to_string(), text.into());
    bundle
}

async fn next_message(harness: &mut Harness) -> Value {
    timeout(WAIT, harness.messages.recv())
        .await
        .expect("timed out waiting for outbound message")
        .expect("message channel closed")
}

#[tokio::test]
async fn open_callback_fires_after_delay() {
    let mut harness = launch_harness(Duration::from_millis(20));

    // Not yet: the timer has not elapsed.
    assert!(harness.opened.try_recv().is_err());

    timeout(WAIT, harness.opened.recv())
        .await
        .expect("open callback never fired")
        .unwrap();

    // Exactly once.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(harness.opened.try_recv().is_err());
}

#[tokio::test]
async fn close_before_delay_suppresses_open() {
    let mut harness = launch_harness(Duration::from_millis(50));

    harness.handle.close().await;
    timeout(WAIT, harness.closed.recv())
        .await
        .expect("close callback never fired")
        .unwrap();

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(harness.opened.try_recv().is_err());
}

#[tokio::test]
async fn kernel_info_round_trip() {
    let mut harness = launch_harness(Duration::from_millis(1));

    harness.handle.send(&kernel_info_request("r1")).await.unwrap();

    let busy = next_message(&mut harness).await;
    let idle = next_message(&mut harness).await;
    let reply = next_message(&mut harness).await;

    assert_eq!(busy["header"]["msg_type"], "status");
    assert_eq!(busy["content"]["execution_state"], "busy");
    assert_eq!(idle["content"]["execution_state"], "idle");
    assert_eq!(reply["header"]["msg_type"], "kernel_info_reply");
    assert_eq!(reply["parent_header"]["msg_id"], "r1");
}

#[tokio::test]
async fn execute_round_trip_with_mock_engine() {
    let mut harness = launch_harness(Duration::from_millis(1));

    // Mock engine: echo the code on stdout, then complete with the code as
    // the plain-text result.
    let event_tx = harness.event_tx.clone();
    let (_dummy_tx, dummy_rx) = mpsc::unbounded_channel();
    let mut dispatch_rx = std::mem::replace(&mut harness.dispatch_rx, dummy_rx);
    tokio::spawn(async move {
        let mut count = 0u32;
        while let Some(request) = dispatch_rx.recv().await {
            count += 1;
            event_tx
                .send(LifecycleEvent::Output {
                    stream: StreamName::Stdout,
                    text: format!("{}\n", request.code),
                    parent_id: request.parent_id.clone(),
                })
                .unwrap();
            event_tx
                .send(LifecycleEvent::Completed {
                    execution_count: count,
                    result: Some(plain_result(&request.code)),
                    parent_id: request.parent_id,
                })
                .unwrap();
        }
    });

    harness.handle.send(&execute_request("1+1", "m1")).await.unwrap();

    let stream = next_message(&mut harness).await;
    assert_eq!(stream["header"]["msg_type"], "stream");
    assert_eq!(stream["content"]["name"], "stdout");
    assert_eq!(stream["content"]["text"], "1+1\n");
    assert_eq!(stream["parent_header"]["msg_id"], "m1");

    let result = next_message(&mut harness).await;
    assert_eq!(result["header"]["msg_type"], "execute_result");
    assert_eq!(result["content"]["data"]["text/plain"], "1+1");
    assert_eq!(result["content"]["execution_count"], 1);

    let reply = next_message(&mut harness).await;
    assert_eq!(reply["header"]["msg_type"], "execute_reply");
    assert_eq!(reply["channel"], "shell");
    assert_eq!(reply["parent_header"]["msg_id"], "m1");
}

#[tokio::test]
async fn requests_are_dispatched_one_at_a_time() {
    let mut harness = launch_harness(Duration::from_millis(1));

    harness.handle.send(&execute_request("a", "m1")).await.unwrap();
    harness.handle.send(&execute_request("b", "m2")).await.unwrap();

    let first = timeout(WAIT, harness.dispatch_rx.recv())
        .await
        .expect("first dispatch never arrived")
        .unwrap();
    assert_eq!(first.code, "a");

    // "b" is held until "a" reaches a terminal event.
    assert!(harness.dispatch_rx.try_recv().is_err());

    harness
        .event_tx
        .send(LifecycleEvent::Failed {
            execution_count: None,
            parent_id: "m1".to_string(),
        })
        .unwrap();

    let second = timeout(WAIT, harness.dispatch_rx.recv())
        .await
        .expect("second dispatch never arrived")
        .unwrap();
    assert_eq!(second.code, "b");

    // The failure produced a bare reply for m1 on the way.
    let reply = next_message(&mut harness).await;
    assert_eq!(reply["header"]["msg_type"], "execute_reply");
    assert_eq!(reply["parent_header"]["msg_id"], "m1");
    assert!(reply["content"].get("execution_count").is_none());
}

#[tokio::test]
async fn close_stops_the_lifecycle_pump() {
    let mut harness = launch_harness(Duration::from_millis(1));

    harness.handle.close().await;
    timeout(WAIT, harness.closed.recv())
        .await
        .expect("close callback never fired")
        .unwrap();

    // Events sent after close no longer reach the adapter. The pump may
    // already have dropped its receiver, so the send itself may fail too.
    let _ = harness.event_tx.send(LifecycleEvent::Output {
        stream: StreamName::Stderr,
        text: "late".to_string(),
        parent_id: "m1".to_string(),
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.messages.try_recv().is_err());

    // Closing again does not fire the callback a second time.
    harness.handle.close().await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(harness.closed.try_recv().is_err());
}
