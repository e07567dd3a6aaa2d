//! Realtime Subscription Manager
//!
//! Maintains one persistent STOMP-over-WebSocket connection to the
//! broker, tracks topic subscriptions, and keeps the snapshot store
//! current. The connection task reconnects indefinitely with a fixed
//! delay; the subscription registry survives a drop and every topic is
//! reasserted once the connection comes back.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, sleep, timeout, Duration, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::messages::{scale_topic, ScaleSnapshot, TOPIC_ALL_SCALES};
use super::snapshots::SnapshotStore;
use super::stomp::{self, Frame};
use super::subscriptions::SubscriptionRegistry;
use crate::config::RealtimeConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection lifecycle events, surfaced to the UI layer as
/// notifications alongside the boolean `connected` signal.
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    Connected,
    Disconnected { reason: String },
    Error { message: String },
}

enum ClientCommand {
    Subscribe { topic: String, id: String },
    Unsubscribe { id: String },
    Shutdown,
}

enum SessionEnd {
    Shutdown,
    Lost(String),
}

/// Client for the realtime telemetry broker
pub struct RealtimeClient {
    config: RealtimeConfig,
    store: Arc<SnapshotStore>,
    registry: Arc<SubscriptionRegistry>,
    connected_tx: Arc<watch::Sender<bool>>,
    connected_rx: watch::Receiver<bool>,
    events_tx: broadcast::Sender<RealtimeEvent>,
    commands: StdRwLock<Option<mpsc::UnboundedSender<ClientCommand>>>,
    task: StdMutex<Option<tokio::task::JoinHandle<()>>>,
}

impl RealtimeClient {
    pub fn new(config: RealtimeConfig) -> Self {
        let (connected_tx, connected_rx) = watch::channel(false);
        let (events_tx, _) = broadcast::channel(64);

        Self {
            config,
            store: Arc::new(SnapshotStore::new()),
            registry: Arc::new(SubscriptionRegistry::new()),
            connected_tx: Arc::new(connected_tx),
            connected_rx,
            events_tx,
            commands: StdRwLock::new(None),
            task: StdMutex::new(None),
        }
    }

    /// The snapshot store fed by this connection
    pub fn snapshots(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Whether the broker connection is currently established
    pub fn is_connected(&self) -> bool {
        *self.connected_rx.borrow()
    }

    /// Watch the boolean connection signal
    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected_rx.clone()
    }

    /// Subscribe to connection lifecycle events
    pub fn events(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.events_tx.subscribe()
    }

    /// Start the connection task. Called once at application start;
    /// subsequent calls are no-ops while the task is alive.
    pub fn connect(&self) {
        let mut task = self.task.lock().unwrap();
        if task.is_some() {
            return;
        }

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        *self.commands.write().unwrap() = Some(commands_tx);

        let handle = tokio::spawn(run_loop(
            self.config.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.registry),
            Arc::clone(&self.connected_tx),
            self.events_tx.clone(),
            commands_rx,
        ));
        *task = Some(handle);
    }

    /// Subscribe to the broadcast topic carrying every scale.
    /// No-op if already subscribed or not connected.
    pub fn subscribe_all(&self) {
        self.subscribe_topic(TOPIC_ALL_SCALES.to_string());
    }

    /// Subscribe to one scale's topic.
    /// No-op if already subscribed or not connected.
    pub fn subscribe(&self, scale_id: i64) {
        self.subscribe_topic(scale_topic(scale_id));
    }

    /// Cancel a per-scale subscription; no-op if not subscribed
    pub fn unsubscribe(&self, scale_id: i64) {
        let topic = scale_topic(scale_id);
        if let Some(id) = self.registry.remove(&topic) {
            tracing::debug!(topic = %topic, "Unsubscribed");
            self.send_command(ClientCommand::Unsubscribe { id });
        }
    }

    /// Stop the connection task and release all subscriptions.
    /// Snapshots are kept; they only go away on full application reset.
    pub async fn shutdown(&self) {
        self.send_command(ClientCommand::Shutdown);
        self.commands.write().unwrap().take();

        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            let abort = handle.abort_handle();
            if timeout(Duration::from_secs(2), handle).await.is_err() {
                abort.abort();
            }
        }

        self.registry.clear();
        self.connected_tx.send_replace(false);
        tracing::info!("Realtime client shut down");
    }

    fn subscribe_topic(&self, topic: String) {
        if !self.is_connected() {
            tracing::debug!(topic = %topic, "Not connected, subscribe ignored");
            return;
        }
        if let Some(id) = self.registry.add(&topic) {
            tracing::debug!(topic = %topic, "Subscribed");
            self.send_command(ClientCommand::Subscribe { topic, id });
        }
    }

    fn send_command(&self, command: ClientCommand) {
        if let Some(tx) = self.commands.read().unwrap().as_ref() {
            let _ = tx.send(command);
        }
    }
}

/// Connection task: connect, run a session, reconnect after a fixed
/// delay, forever, until shutdown.
async fn run_loop(
    config: RealtimeConfig,
    store: Arc<SnapshotStore>,
    registry: Arc<SubscriptionRegistry>,
    connected_tx: Arc<watch::Sender<bool>>,
    events_tx: broadcast::Sender<RealtimeEvent>,
    mut commands_rx: mpsc::UnboundedReceiver<ClientCommand>,
) {
    loop {
        match connect_async(config.url.as_str()).await {
            Ok((ws, _)) => {
                let end = session(
                    ws,
                    &config,
                    &store,
                    &registry,
                    &connected_tx,
                    &events_tx,
                    &mut commands_rx,
                )
                .await;

                let was_connected = *connected_tx.borrow();
                connected_tx.send_replace(false);

                match end {
                    SessionEnd::Shutdown => return,
                    SessionEnd::Lost(reason) => {
                        tracing::warn!("Realtime connection lost: {}", reason);
                        if was_connected {
                            let _ = events_tx.send(RealtimeEvent::Disconnected { reason });
                        } else {
                            let _ = events_tx.send(RealtimeEvent::Error { message: reason });
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Broker connection failed: {}", e);
                let _ = events_tx.send(RealtimeEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        // Fixed reconnect delay, still honoring shutdown
        let delay = sleep(Duration::from_millis(config.reconnect_delay_ms));
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = &mut delay => break,
                cmd = commands_rx.recv() => match cmd {
                    Some(ClientCommand::Shutdown) | None => return,
                    // Subscribe/unsubscribe are no-ops while disconnected
                    _ => {}
                },
            }
        }
    }
}

/// One broker session: STOMP handshake, resubscription, then the main
/// read/command/heartbeat loop.
async fn session(
    ws: WsStream,
    config: &RealtimeConfig,
    store: &SnapshotStore,
    registry: &SubscriptionRegistry,
    connected_tx: &watch::Sender<bool>,
    events_tx: &broadcast::Sender<RealtimeEvent>,
    commands_rx: &mut mpsc::UnboundedReceiver<ClientCommand>,
) -> SessionEnd {
    let (mut sink, mut source) = ws.split();

    if let Err(e) = sink
        .send(Message::Text(Frame::connect(config.heartbeat_ms).encode()))
        .await
    {
        return SessionEnd::Lost(format!("failed to send CONNECT: {}", e));
    }

    let connected = match await_connected(&mut source).await {
        Ok(frame) => frame,
        Err(reason) => return SessionEnd::Lost(reason),
    };

    connected_tx.send_replace(true);
    let _ = events_tx.send(RealtimeEvent::Connected);
    tracing::info!("Realtime connection established");

    // Reassert every topic that was active before the drop
    for (topic, id) in registry.active() {
        if let Err(e) = sink
            .send(Message::Text(Frame::subscribe(&id, &topic).encode()))
            .await
        {
            return SessionEnd::Lost(format!("failed to resubscribe {}: {}", topic, e));
        }
        tracing::debug!(topic = %topic, "Resubscribed after reconnect");
    }

    // Heartbeats are negotiated with the CONNECTED frame: a direction is
    // active only if both sides asked for it, at the larger interval. A
    // broker advertising 0 sends nothing, so silence from it is not a
    // liveness failure.
    let (server_send, server_recv) = parse_heart_beat(connected.get_header("heart-beat"));
    let outbound = negotiated_interval(config.heartbeat_ms, server_recv);
    let inbound = negotiated_interval(server_send, config.heartbeat_ms);
    tracing::debug!(outbound_ms = outbound, inbound_ms = inbound, "Heartbeats negotiated");

    let mut send_beat = interval(tick_period(outbound));
    send_beat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    send_beat.reset();
    let mut liveness = interval(tick_period(inbound));
    liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);
    liveness.reset();
    let inbound_limit = Duration::from_millis(inbound).saturating_mul(2);
    let mut last_inbound = Instant::now();

    loop {
        tokio::select! {
            cmd = commands_rx.recv() => match cmd {
                Some(ClientCommand::Subscribe { topic, id }) => {
                    if let Err(e) = sink
                        .send(Message::Text(Frame::subscribe(&id, &topic).encode()))
                        .await
                    {
                        return SessionEnd::Lost(format!("failed to subscribe {}: {}", topic, e));
                    }
                }
                Some(ClientCommand::Unsubscribe { id }) => {
                    if let Err(e) = sink
                        .send(Message::Text(Frame::unsubscribe(&id).encode()))
                        .await
                    {
                        return SessionEnd::Lost(format!("failed to unsubscribe: {}", e));
                    }
                }
                Some(ClientCommand::Shutdown) | None => {
                    let _ = sink
                        .send(Message::Text(Frame::disconnect().encode()))
                        .await;
                    let _ = sink.close().await;
                    return SessionEnd::Shutdown;
                }
            },

            _ = send_beat.tick(), if outbound > 0 => {
                if sink.send(Message::Text("\n".to_string())).await.is_err() {
                    return SessionEnd::Lost("failed to send heartbeat".to_string());
                }
            }

            _ = liveness.tick(), if inbound > 0 => {
                if last_inbound.elapsed() > inbound_limit {
                    return SessionEnd::Lost("missed heartbeats".to_string());
                }
            }

            msg = source.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    last_inbound = Instant::now();
                    handle_frame(&text, store, events_tx);
                }
                Some(Ok(Message::Ping(payload))) => {
                    last_inbound = Instant::now();
                    let _ = sink.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Pong(_))) => {
                    last_inbound = Instant::now();
                }
                Some(Ok(Message::Close(_))) => {
                    return SessionEnd::Lost("server closed connection".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
                None => return SessionEnd::Lost("stream ended".to_string()),
            },
        }
    }
}

/// Wait for the broker's CONNECTED frame, which carries the server's
/// side of the heartbeat negotiation.
async fn await_connected(source: &mut WsSource) -> Result<Frame, String> {
    let handshake = timeout(HANDSHAKE_TIMEOUT, async {
        while let Some(msg) = source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if stomp::is_heartbeat(&text) {
                        continue;
                    }
                    return match Frame::parse(&text) {
                        Ok(frame) if frame.command == stomp::Command::Connected => Ok(frame),
                        Ok(frame) if frame.command == stomp::Command::Error => {
                            Err(format!("broker rejected connection: {}", frame.body))
                        }
                        Ok(frame) => {
                            Err(format!("unexpected {:?} before CONNECTED", frame.command))
                        }
                        Err(e) => Err(format!("malformed handshake frame: {}", e)),
                    };
                }
                Ok(_) => continue,
                Err(e) => return Err(e.to_string()),
            }
        }
        Err("stream ended during handshake".to_string())
    })
    .await;

    match handshake {
        Ok(result) => result,
        Err(_) => Err("handshake timeout".to_string()),
    }
}

/// Server's `heart-beat` header: (interval it sends at, interval it
/// wants to receive at). Missing or malformed means no heartbeats.
fn parse_heart_beat(header: Option<&str>) -> (u64, u64) {
    header
        .and_then(|value| value.split_once(','))
        .and_then(|(send, recv)| Some((send.trim().parse().ok()?, recv.trim().parse().ok()?)))
        .unwrap_or((0, 0))
}

/// Effective interval for one heartbeat direction: zero on either side
/// disables it, otherwise the larger of the two.
fn negotiated_interval(ours: u64, theirs: u64) -> u64 {
    if ours == 0 || theirs == 0 {
        0
    } else {
        ours.max(theirs)
    }
}

fn tick_period(interval_ms: u64) -> Duration {
    if interval_ms > 0 {
        Duration::from_millis(interval_ms)
    } else {
        // Arm is guarded off; the interval just needs to be valid
        Duration::from_secs(3600)
    }
}

/// Route one inbound text payload. Parse failures are logged and the
/// payload dropped; they never take the connection down.
fn handle_frame(text: &str, store: &SnapshotStore, events_tx: &broadcast::Sender<RealtimeEvent>) {
    if stomp::is_heartbeat(text) {
        return;
    }

    let frame = match Frame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Dropping malformed frame: {}", e);
            return;
        }
    };

    match frame.command {
        stomp::Command::Message => match ScaleSnapshot::parse(&frame.body) {
            Ok(snapshot) => {
                tracing::trace!(scale_id = snapshot.scale_id, "Snapshot received");
                store.apply(snapshot);
            }
            Err(e) => {
                tracing::warn!(
                    destination = frame.get_header("destination").unwrap_or(""),
                    "Dropping unparseable snapshot: {}",
                    e
                );
            }
        },
        stomp::Command::Error => {
            let message = frame
                .get_header("message")
                .map(str::to_string)
                .unwrap_or_else(|| frame.body.clone());
            tracing::warn!("Broker error frame: {}", message);
            let _ = events_tx.send(RealtimeEvent::Error { message });
        }
        stomp::Command::Receipt => {}
        other => tracing::debug!("Ignoring unexpected {:?} frame", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::messages::ScaleStatus;
    use crate::realtime::stomp::Command;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    type ServerWs = WebSocketStream<TcpStream>;

    fn test_config(addr: std::net::SocketAddr) -> RealtimeConfig {
        RealtimeConfig {
            url: format!("ws://{}", addr),
            reconnect_delay_ms: 100,
            heartbeat_ms: 0,
        }
    }

    /// Accept one connection and complete the STOMP handshake,
    /// advertising the given heartbeat interval back to the client.
    async fn accept_stomp_with(listener: &TcpListener, heartbeat_ms: u64) -> ServerWs {
        let (stream, _) = timeout(Duration::from_secs(3), listener.accept())
            .await
            .expect("no connection")
            .unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        loop {
            match timeout(Duration::from_secs(3), ws.next())
                .await
                .expect("no CONNECT")
                .unwrap()
                .unwrap()
            {
                Message::Text(text) => {
                    if stomp::is_heartbeat(&text) {
                        continue;
                    }
                    let frame = Frame::parse(&text).unwrap();
                    assert_eq!(frame.command, Command::Connect);
                    ws.send(Message::Text(Frame::connected(heartbeat_ms).encode()))
                        .await
                        .unwrap();
                    return ws;
                }
                _ => continue,
            }
        }
    }

    async fn accept_stomp(listener: &TcpListener) -> ServerWs {
        accept_stomp_with(listener, 0).await
    }

    /// Next non-heartbeat STOMP frame from the client
    async fn next_frame(ws: &mut ServerWs) -> Frame {
        loop {
            match timeout(Duration::from_secs(3), ws.next())
                .await
                .expect("no frame")
                .unwrap()
                .unwrap()
            {
                Message::Text(text) if !stomp::is_heartbeat(&text) => {
                    return Frame::parse(&text).unwrap()
                }
                _ => continue,
            }
        }
    }

    async fn expect_no_frame(ws: &mut ServerWs) {
        let result = timeout(Duration::from_millis(200), ws.next()).await;
        assert!(result.is_err(), "unexpected frame from client");
    }

    async fn wait_connected(client: &RealtimeClient) {
        let mut rx = client.connected();
        timeout(Duration::from_secs(3), async {
            while !*rx.borrow_and_update() {
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("client did not connect in time");
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        timeout(Duration::from_secs(3), async {
            while !condition() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not met in time");
    }

    fn snapshot_body(scale_id: i64, data1: &str) -> String {
        json!({
            "scaleId": scale_id,
            "lastTime": "2024-03-12T08:15:30",
            "data1": data1,
            "status": "ONLINE"
        })
        .to_string()
    }

    #[test]
    fn test_heartbeat_negotiation_rules() {
        assert_eq!(negotiated_interval(0, 4000), 0);
        assert_eq!(negotiated_interval(4000, 0), 0);
        assert_eq!(negotiated_interval(4000, 10000), 10000);

        assert_eq!(parse_heart_beat(Some("5000,3000")), (5000, 3000));
        assert_eq!(parse_heart_beat(Some("garbage")), (0, 0));
        assert_eq!(parse_heart_beat(None), (0, 0));
    }

    #[tokio::test]
    async fn test_subscribe_all_and_receive_snapshot() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = RealtimeClient::new(test_config(addr));
        let store = client.snapshots();

        client.connect();
        let mut ws = accept_stomp(&listener).await;
        wait_connected(&client).await;

        client.subscribe_all();
        let frame = next_frame(&mut ws).await;
        assert_eq!(frame.command, Command::Subscribe);
        assert_eq!(frame.get_header("destination"), Some(TOPIC_ALL_SCALES));
        let sub_id = frame.get_header("id").unwrap().to_string();

        ws.send(Message::Text(
            Frame::message(TOPIC_ALL_SCALES, &sub_id, &snapshot_body(7, "1520.5")).encode(),
        ))
        .await
        .unwrap();

        wait_until(|| store.get(7).is_some()).await;
        let snapshot = store.get(7).unwrap();
        assert_eq!(snapshot.data1.as_deref(), Some("1520.5"));
        assert_eq!(snapshot.status, ScaleStatus::Online);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = RealtimeClient::new(test_config(addr));

        client.connect();
        let mut ws = accept_stomp(&listener).await;
        wait_connected(&client).await;

        client.subscribe(5);
        client.subscribe(5);

        let frame = next_frame(&mut ws).await;
        assert_eq!(frame.get_header("destination"), Some("/topic/scale/5"));
        // The second call must not produce a second SUBSCRIBE
        expect_no_frame(&mut ws).await;
        assert_eq!(client.registry.len(), 1);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscribe_while_disconnected_is_noop() {
        let client = RealtimeClient::new(test_config("127.0.0.1:9".parse().unwrap()));

        client.subscribe_all();
        client.subscribe(3);

        assert!(!client.is_connected());
        assert!(client.registry.is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = RealtimeClient::new(test_config(addr));

        client.connect();
        let mut ws = accept_stomp(&listener).await;
        wait_connected(&client).await;

        client.subscribe(9);
        let sub = next_frame(&mut ws).await;
        let sub_id = sub.get_header("id").unwrap().to_string();

        client.unsubscribe(9);
        let unsub = next_frame(&mut ws).await;
        assert_eq!(unsub.command, Command::Unsubscribe);
        assert_eq!(unsub.get_header("id"), Some(sub_id.as_str()));
        assert!(client.registry.is_empty());

        // Second unsubscribe is a no-op
        client.unsubscribe(9);
        expect_no_frame(&mut ws).await;

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_message_is_dropped_not_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = RealtimeClient::new(test_config(addr));
        let store = client.snapshots();

        client.connect();
        let mut ws = accept_stomp(&listener).await;
        wait_connected(&client).await;

        client.subscribe_all();
        let frame = next_frame(&mut ws).await;
        let sub_id = frame.get_header("id").unwrap().to_string();

        ws.send(Message::Text(
            Frame::message(TOPIC_ALL_SCALES, &sub_id, "this is not json").encode(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text(
            Frame::message(TOPIC_ALL_SCALES, &sub_id, &snapshot_body(4, "88.0")).encode(),
        ))
        .await
        .unwrap();

        wait_until(|| store.get(4).is_some()).await;
        assert_eq!(store.len(), 1);
        assert!(client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_overlapping_subscriptions_update_once_per_message() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = RealtimeClient::new(test_config(addr));
        let store = client.snapshots();
        let mut updates = store.watch();

        client.connect();
        let mut ws = accept_stomp(&listener).await;
        wait_connected(&client).await;

        client.subscribe_all();
        let _ = next_frame(&mut ws).await;
        client.subscribe(7);
        let per_scale = next_frame(&mut ws).await;
        let sub_id = per_scale.get_header("id").unwrap().to_string();

        ws.send(Message::Text(
            Frame::message("/topic/scale/7", &sub_id, &snapshot_body(7, "310.2")).encode(),
        ))
        .await
        .unwrap();

        wait_until(|| store.get(7).is_some()).await;
        // One broker message means exactly one store update
        assert!(updates.recv().await.is_ok());
        assert!(matches!(
            updates.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_last_write_wins_over_the_wire() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = RealtimeClient::new(test_config(addr));
        let store = client.snapshots();

        client.connect();
        let mut ws = accept_stomp(&listener).await;
        wait_connected(&client).await;

        client.subscribe(7);
        let frame = next_frame(&mut ws).await;
        let sub_id = frame.get_header("id").unwrap().to_string();
        let topic = "/topic/scale/7";

        ws.send(Message::Text(
            Frame::message(topic, &sub_id, &snapshot_body(7, "first")).encode(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text(
            Frame::message(topic, &sub_id, &snapshot_body(7, "second")).encode(),
        ))
        .await
        .unwrap();

        wait_until(|| {
            store
                .get(7)
                .map(|s| s.data1.as_deref() == Some("second"))
                .unwrap_or(false)
        })
        .await;
        assert_eq!(store.len(), 1);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_quiet_server_declining_heartbeats_is_not_dropped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = RealtimeConfig {
            url: format!("ws://{}", addr),
            reconnect_delay_ms: 100,
            heartbeat_ms: 200,
        };
        let client = RealtimeClient::new(config);
        let mut events = client.events();

        client.connect();
        // The broker answers heart-beat:0,0 so neither direction is active
        let mut ws = accept_stomp_with(&listener, 0).await;
        wait_connected(&client).await;

        // Several would-be 2x-interval windows of silence
        sleep(Duration::from_millis(900)).await;

        assert!(client.is_connected());
        while let Ok(event) = events.try_recv() {
            assert!(
                !matches!(event, RealtimeEvent::Disconnected { .. }),
                "healthy connection was dropped"
            );
        }
        // The client must not send heartbeats the server declined
        expect_no_frame(&mut ws).await;

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_unresponsive_server_detected_by_missed_heartbeats() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = RealtimeConfig {
            url: format!("ws://{}", addr),
            reconnect_delay_ms: 100,
            heartbeat_ms: 100,
        };
        let client = RealtimeClient::new(config);
        let mut events = client.events();

        client.connect();
        let mut ws = accept_stomp_with(&listener, 100).await;
        wait_connected(&client).await;

        // The client owes heartbeats at the negotiated interval
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("no heartbeat from client")
            .unwrap()
            .unwrap();
        match msg {
            Message::Text(text) => assert!(stomp::is_heartbeat(&text)),
            other => panic!("expected heartbeat, got {:?}", other),
        }

        // The socket stays open but the server goes silent; the client
        // must declare the connection lost and reconnect on its own.
        let _ws2 = accept_stomp_with(&listener, 100).await;
        wait_connected(&client).await;

        let mut reasons = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let RealtimeEvent::Disconnected { reason } = event {
                reasons.push(reason);
            }
        }
        assert!(
            reasons.iter().any(|r| r == "missed heartbeats"),
            "expected a missed-heartbeat disconnect, got {:?}",
            reasons
        );

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconnect_resubscribes_active_topics() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = RealtimeClient::new(test_config(addr));
        let store = client.snapshots();

        client.connect();
        let mut ws = accept_stomp(&listener).await;
        wait_connected(&client).await;

        client.subscribe(7);
        let frame = next_frame(&mut ws).await;
        assert_eq!(frame.get_header("destination"), Some("/topic/scale/7"));
        ws.send(Message::Text(
            Frame::message("/topic/scale/7", frame.get_header("id").unwrap(), &snapshot_body(7, "42.0"))
                .encode(),
        ))
        .await
        .unwrap();
        wait_until(|| store.get(7).is_some()).await;

        // Drop the connection server-side; the client must reconnect
        // and reassert the subscription without being asked.
        drop(ws);

        let mut ws2 = accept_stomp(&listener).await;
        wait_connected(&client).await;
        let resub = next_frame(&mut ws2).await;
        assert_eq!(resub.command, Command::Subscribe);
        assert_eq!(resub.get_header("destination"), Some("/topic/scale/7"));

        // Neither snapshots nor the registry were lost in the drop
        assert_eq!(client.registry.len(), 1);
        assert!(store.get(7).is_some());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_sends_disconnect_and_clears_registry() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = RealtimeClient::new(test_config(addr));

        client.connect();
        let mut ws = accept_stomp(&listener).await;
        wait_connected(&client).await;
        client.subscribe(1);
        let _ = next_frame(&mut ws).await;

        client.shutdown().await;

        let frame = next_frame(&mut ws).await;
        assert_eq!(frame.command, Command::Disconnect);
        assert!(!client.is_connected());
        assert!(client.registry.is_empty());
    }
}
