//! # Connection Client Module
//!
//! Game-side connection to the relay hub with automatic simulation fallback.
//!
//! This module handles:
//! - Hub endpoint selection from the page origin ([`endpoint`])
//! - The link abstraction and WebSocket implementation ([`transport`])
//! - Status and presence events ([`status`])
//! - The [`ConnectionClient`] tying transport, pipeline and simulation together
//!
//! ## Tasks
//!
//! | Task | Loop |
//! |------|------|
//! | connection | connect → `register` → pump frames → on close: `Simulated`, wait backoff, retry |
//! | simulation | every tick: if no live sensor source, advance [`SimulationFallback`] and publish |
//!
//! The live source is active while the status is `Live` and a `sensor_data`
//! frame arrived within `sensor_timeout`. Whenever it stops, the simulation
//! resumes from the last published input so the game sees no jump.
//!
//! The current [`GameInput`] lives in a `watch` channel, so readers always
//! observe a whole value.

pub mod endpoint;
pub mod status;
pub mod transport;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::input::{GameInput, MappingProfile, SensorPipeline, SimButton, SimKey, SimulationFallback};
use crate::protocol::{encode, parse_relay_message, ClientOutbound, Register, RelayMessage, Role, SensorFrame};
pub use endpoint::Endpoint;
pub use status::{ConnectionStatus, PeerEvent};
pub use transport::{Connector, RelayLink, WebSocketConnector};

type InputCallback = Arc<dyn Fn(&GameInput, Option<&SensorFrame>) + Send + Sync>;
type StatusCallback = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;
type PeerCallback = Arc<dyn Fn(&PeerEvent) + Send + Sync>;

/// Creates a device identifier: `device-<unix millis>-<9 random chars>`.
#[must_use]
pub fn generate_device_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("device-{}-{}", Utc::now().timestamp_millis(), suffix)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the client handle and its tasks.
struct Shared {
    pipeline: Mutex<SensorPipeline>,
    simulation: Mutex<SimulationFallback>,
    last_frame: Mutex<Option<Instant>>,
    sensor_timeout: Duration,
    /// Set by live input; the next simulated tick blends from the current value.
    resume_pending: AtomicBool,
    input: watch::Sender<GameInput>,
    status: watch::Sender<ConnectionStatus>,
    input_callbacks: Mutex<Vec<InputCallback>>,
    status_callbacks: Mutex<Vec<StatusCallback>>,
    peer_callbacks: Mutex<Vec<PeerCallback>>,
}

impl Shared {
    fn publish_input(&self, input: GameInput, raw: Option<&SensorFrame>) {
        self.input.send_replace(input);
        let callbacks = lock(&self.input_callbacks).clone();
        for callback in callbacks {
            callback(&input, raw);
        }
    }

    fn set_status(&self, next: ConnectionStatus) {
        let changed = self.status.send_if_modified(|status| {
            if *status == next {
                return false;
            }
            *status = next;
            true
        });
        if !changed {
            return;
        }
        info!("Connection status: {}", next);
        let callbacks = lock(&self.status_callbacks).clone();
        for callback in callbacks {
            callback(next);
        }
    }

    fn publish_peer(&self, event: PeerEvent) {
        match &event {
            PeerEvent::Joined(presence) => info!("Peer joined: {}", presence.name),
            PeerEvent::Left(presence) => info!("Peer left: {}", presence.name),
        }
        let callbacks = lock(&self.peer_callbacks).clone();
        for callback in callbacks {
            callback(&event);
        }
    }

    /// `true` while frames from a live link are driving the input.
    fn live_source_active(&self, now: Instant) -> bool {
        if !self.status.borrow().is_live() {
            return false;
        }
        match *lock(&self.last_frame) {
            Some(at) => now.saturating_duration_since(at) < self.sensor_timeout,
            None => false,
        }
    }

    fn handle_frame(&self, text: &str) {
        match parse_relay_message(text) {
            Ok(RelayMessage::SensorData { data }) => {
                let now = Instant::now();
                let input = lock(&self.pipeline).ingest(&data, now.into_std());
                *lock(&self.last_frame) = Some(now);
                self.publish_input(input, Some(&data));
                self.resume_pending.store(true, Ordering::Release);
            }
            Ok(RelayMessage::Join(presence)) => self.publish_peer(PeerEvent::Joined(presence)),
            Ok(RelayMessage::Leave(presence)) => self.publish_peer(PeerEvent::Left(presence)),
            Ok(RelayMessage::Other) => debug!("Ignoring frame with unhandled type"),
            Err(e) => warn!("Dropping frame, keeping previous input: {}", e),
        }
    }
}

/// Why a live session ended.
enum SessionEnd {
    Cancelled,
    Closed(String),
}

/// Game-side relay connection.
///
/// Must be started inside a Tokio runtime. Dropping the client cancels its
/// tasks; [`shutdown`](Self::shutdown) also waits for them.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use motion_relay::client::{ConnectionClient, Endpoint, WebSocketConnector};
/// use motion_relay::config::ClientConfig;
/// use motion_relay::input::Preset;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ClientConfig::default();
///     let connector = WebSocketConnector::new(Endpoint::from_config(&config)?, config.connect_timeout());
///     let client = ConnectionClient::start(&config, Preset::Racing.profile(), Arc::new(connector))?;
///
///     client.on_input(|input, _raw| println!("steer {:.2}", input.x));
///     client.calibrate();
///
///     client.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ConnectionClient {
    shared: Arc<Shared>,
    device_id: String,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ConnectionClient {
    /// Builds the pipeline and simulation, then spawns the connection and
    /// simulation tasks.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`](crate::error::RelayError::InvalidConfig)
    /// for a zero history capacity, an invalid profile or blend rate.
    pub fn start(config: &ClientConfig, profile: MappingProfile, connector: Arc<dyn Connector>) -> Result<Self> {
        let pipeline = SensorPipeline::new(config.history_capacity, profile)?;
        let simulation = SimulationFallback::new(config.simulation_settings(), &profile)?;

        let (input, _) = watch::channel(GameInput::default());
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        let shared = Arc::new(Shared {
            pipeline: Mutex::new(pipeline),
            simulation: Mutex::new(simulation),
            last_frame: Mutex::new(None),
            sensor_timeout: config.sensor_timeout(),
            resume_pending: AtomicBool::new(false),
            input,
            status,
            input_callbacks: Mutex::new(Vec::new()),
            status_callbacks: Mutex::new(Vec::new()),
            peer_callbacks: Mutex::new(Vec::new()),
        });

        let device_id = generate_device_id();
        let register = Register {
            game_type: config.game_type.clone(),
            capabilities: config.capabilities.clone(),
            name: config.name.clone(),
            role: Some(Role::Consumer),
            ..Register::new(device_id.clone())
        };
        info!("Starting client {}", device_id);
        let cancel = CancellationToken::new();
        let tasks = vec![
            tokio::spawn(run_connection(
                Arc::clone(&shared),
                connector,
                register,
                config.reconnect_backoff(),
                cancel.clone(),
            )),
            tokio::spawn(run_simulation(Arc::clone(&shared), config.tick(), cancel.clone())),
        ];

        Ok(Self {
            shared,
            device_id,
            cancel,
            tasks,
        })
    }

    /// Registers a callback for every published input.
    ///
    /// The raw frame is present for live sensor input and `None` for simulated input.
    pub fn on_input<F>(&self, callback: F)
    where
        F: Fn(&GameInput, Option<&SensorFrame>) + Send + Sync + 'static,
    {
        lock(&self.shared.input_callbacks).push(Arc::new(callback));
    }

    /// Registers a callback for status changes.
    pub fn on_status<F>(&self, callback: F)
    where
        F: Fn(ConnectionStatus) + Send + Sync + 'static,
    {
        lock(&self.shared.status_callbacks).push(Arc::new(callback));
    }

    /// Registers a callback for `join`/`leave` of other participants.
    pub fn on_peer<F>(&self, callback: F)
    where
        F: Fn(&PeerEvent) + Send + Sync + 'static,
    {
        lock(&self.shared.peer_callbacks).push(Arc::new(callback));
    }

    #[must_use]
    pub fn current_input(&self) -> GameInput {
        *self.shared.input.borrow()
    }

    /// Receiver that observes every published input.
    #[must_use]
    pub fn subscribe_input(&self) -> watch::Receiver<GameInput> {
        self.shared.input.subscribe()
    }

    /// Receiver that observes status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// `true` while a hub link is open.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status().is_live()
    }

    /// Takes the current smoothed orientation as neutral. No-op without history.
    pub fn calibrate(&self) -> bool {
        lock(&self.shared.pipeline).calibrate()
    }

    pub fn reset_calibration(&self) {
        lock(&self.shared.pipeline).reset_calibration();
    }

    pub fn press(&self, key: SimKey) {
        lock(&self.shared.simulation).press(key);
    }

    pub fn release(&self, key: SimKey) {
        lock(&self.shared.simulation).release(key);
    }

    pub fn trigger(&self, button: SimButton) {
        lock(&self.shared.simulation).trigger(button);
    }

    /// Normalized pointer position for the simulation, `None` to use keys.
    pub fn set_pointer(&self, position: Option<(f32, f32)>) {
        lock(&self.shared.simulation).set_pointer(position);
    }

    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Cancels reconnects and the simulation tick, then waits for both tasks.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!("Client task ended abnormally: {}", e);
            }
        }
        self.shared.set_status(ConnectionStatus::Closed);
        info!("Client {} shut down", self.device_id);
    }
}

impl Drop for ConnectionClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_connection(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    register: Register,
    backoff: Duration,
    cancel: CancellationToken,
) {
    loop {
        shared.set_status(ConnectionStatus::Connecting);
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            connected = connector.connect() => connected,
        };

        match connected {
            Ok(mut link) => match run_session(&shared, link.as_mut(), &register, &cancel).await {
                SessionEnd::Cancelled => break,
                SessionEnd::Closed(reason) => warn!("Hub link closed: {}", reason),
            },
            Err(e) => warn!("Failed to connect to hub: {}", e),
        }

        shared.set_status(ConnectionStatus::Simulated);
        debug!("Reconnecting in {:?}", backoff);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(backoff) => {}
        }
    }
}

async fn run_session(
    shared: &Shared,
    link: &mut dyn RelayLink,
    register: &Register,
    cancel: &CancellationToken,
) -> SessionEnd {
    let hello = Register {
        timestamp: Some(Utc::now().timestamp_millis() as f64),
        ..register.clone()
    };
    let sent = match encode(&ClientOutbound::Register(hello)) {
        Ok(text) => link.send_text(text).await,
        Err(e) => Err(e),
    };
    if let Err(e) = sent {
        return SessionEnd::Closed(format!("register failed: {}", e));
    }

    *lock(&shared.last_frame) = None;
    shared.set_status(ConnectionStatus::Live);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            next = link.next_text() => match next {
                Some(Ok(text)) => shared.handle_frame(&text),
                Some(Err(e)) => return SessionEnd::Closed(e.to_string()),
                None => return SessionEnd::Closed("closed by hub".to_string()),
            },
        }
    }
}

async fn run_simulation(shared: Arc<Shared>, tick: Duration, cancel: CancellationToken) {
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let now = Instant::now();
        if shared.live_source_active(now) {
            continue;
        }

        let mut simulation = lock(&shared.simulation);
        if shared.resume_pending.swap(false, Ordering::AcqRel) {
            simulation.resume_from(&shared.input.borrow());
            info!("Live sensor input stopped, simulation resumed");
        }
        let input = simulation.tick(now.into_std());
        drop(simulation);
        shared.publish_input(input, None);
    }
}

#[cfg(test)]
mod tests {
    use super::transport::mocks::{HubSide, ScriptedConnector};
    use super::transport::MockConnector;
    use super::*;
    use crate::error::RelayError;
    use crate::input::{AngleSource, AxisSpec, Preset};
    use std::sync::atomic::AtomicUsize;

    const LIVE_FRAME: &str = r#"{"type":"sensor_data","data":{"orientation":{"alpha":0,"beta":50,"gamma":10}}}"#;

    fn test_config() -> ClientConfig {
        ClientConfig {
            history_capacity: 3,
            game_type: Some("maze".to_string()),
            ..ClientConfig::default()
        }
    }

    fn scenario_profile() -> MappingProfile {
        MappingProfile::builder()
            .x(AxisSpec::new(AngleSource::Gamma).deadzone(5.0))
            .y(AxisSpec::new(AngleSource::Beta).deadzone(5.0))
            .build()
            .unwrap()
    }

    fn start(connector: &ScriptedConnector) -> ConnectionClient {
        ConnectionClient::start(&test_config(), scenario_profile(), Arc::new(connector.clone())).unwrap()
    }

    /// Lets spawned tasks run without advancing the paused clock.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    async fn wait_for_status(client: &ConnectionClient, wanted: ConnectionStatus) {
        let mut status = client.subscribe_status();
        tokio::time::timeout(Duration::from_secs(30), status.wait_for(|s| *s == wanted))
            .await
            .expect("status not reached")
            .unwrap();
    }

    fn registered_device(hub: &HubSide, index: usize) -> String {
        let frame: serde_json::Value = serde_json::from_str(&hub.sent()[index]).unwrap();
        assert_eq!(frame["type"], "register");
        frame["deviceId"].as_str().unwrap().to_string()
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_device_id_format() {
        let id = generate_device_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "device");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_device_id(), generate_device_id());
    }

    #[tokio::test]
    async fn test_zero_capacity_is_fatal() {
        let config = ClientConfig {
            history_capacity: 0,
            ..ClientConfig::default()
        };
        let result = ConnectionClient::start(&config, Preset::Tilt.profile(), Arc::new(ScriptedConnector::new()));
        assert!(matches!(result, Err(RelayError::InvalidConfig(_))));
    }

    // ==================== Connection Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_refused_connection_falls_back_and_retries() {
        let mut connector = MockConnector::new();
        connector
            .expect_connect()
            .times(2..)
            .returning(|| Err(RelayError::Transport("connection refused".to_string())));

        let client = ConnectionClient::start(&test_config(), Preset::Tilt.profile(), Arc::new(connector)).unwrap();
        wait_for_status(&client, ConnectionStatus::Simulated).await;
        assert!(!client.is_live());

        // Second attempt after the 3s backoff
        tokio::time::sleep(Duration::from_millis(3100)).await;
        settle().await;
        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_session_maps_frames() {
        let connector = ScriptedConnector::new();
        let hub = connector.offer();
        let client = start(&connector);
        wait_for_status(&client, ConnectionStatus::Live).await;

        let device_id = registered_device(&hub, 0);
        assert_eq!(device_id, client.device_id());
        let register: serde_json::Value = serde_json::from_str(&hub.sent()[0]).unwrap();
        assert_eq!(register["gameType"], "maze");
        assert_eq!(register["role"], "consumer");

        let raw_frames = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&raw_frames);
        client.on_input(move |_, raw| {
            if raw.is_some() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        for _ in 0..3 {
            hub.push(LIVE_FRAME);
        }
        settle().await;

        let input = client.current_input();
        assert_eq!(input.y, 1.0);
        assert!((input.x - 10.0 / 45.0).abs() < 1e-4);
        assert_eq!(raw_frames.load(Ordering::SeqCst), 3);
        assert!(client.is_live());

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frame_keeps_previous_input() {
        let connector = ScriptedConnector::new();
        let hub = connector.offer();
        let client = start(&connector);
        wait_for_status(&client, ConnectionStatus::Live).await;

        hub.push(LIVE_FRAME);
        settle().await;
        let before = client.current_input();

        hub.push("{broken");
        hub.push(r#"{"type":"sensor_data","data":"nope"}"#);
        settle().await;

        assert_eq!(client.current_input(), before);
        assert!(client.is_live());
        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_switches_to_simulation_smoothly() {
        let connector = ScriptedConnector::new();
        let hub = connector.offer();
        let client = start(&connector);
        wait_for_status(&client, ConnectionStatus::Live).await;

        for _ in 0..3 {
            hub.push(LIVE_FRAME);
        }
        settle().await;
        let live = client.current_input();
        assert_eq!(live.y, 1.0);

        drop(hub);
        wait_for_status(&client, ConnectionStatus::Simulated).await;
        assert!(!client.is_live());

        // One tick later the simulation blends down from the live value
        tokio::time::sleep(Duration::from_millis(16)).await;
        settle().await;
        let simulated = client.current_input();
        assert!(simulated.y < live.y);
        assert!(simulated.y > 0.5, "no snap to zero, got {}", simulated.y);

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_reuses_device_id() {
        let connector = ScriptedConnector::new();
        let first = connector.offer();
        let second = connector.offer();
        let client = start(&connector);
        wait_for_status(&client, ConnectionStatus::Live).await;

        first.fail("reset by peer");
        wait_for_status(&client, ConnectionStatus::Simulated).await;

        tokio::time::sleep(Duration::from_millis(3000)).await;
        wait_for_status(&client, ConnectionStatus::Live).await;

        assert_eq!(registered_device(&first, 0), registered_device(&second, 0));
        assert_eq!(connector.attempts(), 2);
        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_live_link_uses_simulation() {
        let connector = ScriptedConnector::new();
        let _hub = connector.offer();
        let client = start(&connector);
        wait_for_status(&client, ConnectionStatus::Live).await;

        // Live but silent: keyboard input still drives the game
        client.press(SimKey::Right);
        tokio::time::sleep(Duration::from_millis(100)).await;
        settle().await;

        assert!(client.is_live());
        assert!(client.current_input().x > 0.0);
        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sensor_timeout_resumes_simulation() {
        let connector = ScriptedConnector::new();
        let hub = connector.offer();
        let client = start(&connector);
        wait_for_status(&client, ConnectionStatus::Live).await;

        for _ in 0..3 {
            hub.push(LIVE_FRAME);
        }
        settle().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.current_input().y, 1.0, "live frames win while fresh");

        tokio::time::sleep(Duration::from_millis(2500)).await;
        settle().await;
        assert!(client.current_input().y < 1.0, "simulation takes over after timeout");

        client.shutdown().await;
    }

    // ==================== Collaborator API Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_status_callbacks() {
        let connector = ScriptedConnector::new();
        let hub = connector.offer();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let client = start(&connector);
        let log = Arc::clone(&seen);
        client.on_status(move |status| log.lock().unwrap().push(status));
        wait_for_status(&client, ConnectionStatus::Live).await;

        drop(hub);
        wait_for_status(&client, ConnectionStatus::Simulated).await;
        client.shutdown().await;

        let seen = seen.lock().unwrap().clone();
        assert!(seen.ends_with(&[
            ConnectionStatus::Live,
            ConnectionStatus::Simulated,
            ConnectionStatus::Closed
        ]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_events() {
        let connector = ScriptedConnector::new();
        let hub = connector.offer();
        let client = start(&connector);
        let names = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&names);
        client.on_peer(move |event| {
            let tag = match event {
                PeerEvent::Joined(_) => "+",
                PeerEvent::Left(_) => "-",
            };
            log.lock().unwrap().push(format!("{}{}", tag, event.name()));
        });
        wait_for_status(&client, ConnectionStatus::Live).await;

        hub.push(r#"{"type":"join","name":"phone","timestamp":"2024-01-01T00:00:00.000Z"}"#);
        hub.push(r#"{"type":"leave","name":"phone","timestamp":"2024-01-01T00:00:05.000Z"}"#);
        settle().await;

        assert_eq!(*names.lock().unwrap(), vec!["+phone", "-phone"]);
        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_calibrate_through_client() {
        let connector = ScriptedConnector::new();
        let hub = connector.offer();
        let client = start(&connector);
        assert!(!client.calibrate(), "no history yet");
        wait_for_status(&client, ConnectionStatus::Live).await;

        for _ in 0..3 {
            hub.push(LIVE_FRAME);
        }
        settle().await;
        assert!(client.calibrate());

        hub.push(LIVE_FRAME);
        settle().await;
        assert_eq!(client.current_input().x, 0.0);
        assert_eq!(client.current_input().y, 0.0);

        client.reset_calibration();
        hub.push(LIVE_FRAME);
        settle().await;
        assert_eq!(client.current_input().y, 1.0);

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_trigger_and_pointer() {
        let client = start(&ScriptedConnector::new());
        wait_for_status(&client, ConnectionStatus::Simulated).await;

        let mut inputs = client.subscribe_input();
        client.trigger(SimButton::Jump);
        // The returned guard blocks the simulation sends while held
        let jumped = tokio::time::timeout(
            Duration::from_secs(1),
            inputs.wait_for(|input| input.jump),
        )
        .await
        .is_ok();
        assert!(jumped);

        client.set_pointer(Some((-1.0, 0.0)));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(client.current_input().x < -0.9);

        client.set_pointer(None);
        client.press(SimKey::Up);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(client.current_input().y < -0.9);
        client.release(SimKey::Up);

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_reconnects() {
        let connector = ScriptedConnector::new();
        let client = start(&connector);
        wait_for_status(&client, ConnectionStatus::Simulated).await;
        client.shutdown().await;

        let attempts = connector.attempts();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(connector.attempts(), attempts);
    }
}
