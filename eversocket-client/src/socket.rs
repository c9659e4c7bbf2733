//! The reconnecting socket
//!
//! This module provides [`ReconnectingSocket`]: a wrapper around one
//! transport at a time that re-opens the transport after unintended closes,
//! backs off exponentially between attempts, abandons connects that exceed
//! the connection timeout, and notifies subscribers uniformly across the
//! whole lifecycle.
//!
//! All state transitions happen on a single driver task spawned at build
//! time. The driver selects over the transport's event stream, the armed
//! timers, and a command channel from the handle, so transitions and
//! notifications stay totally ordered. `send`, `close`, and `refresh` act
//! directly on the installed transport and never block.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use eversocket_core::error::{CloseCode, ConfigError, Error, Result};
use eversocket_core::event::{CloseFrame, ConnectingEvent, ErrorEvent, OpenEvent};
use eversocket_core::message::Message;
use eversocket_core::transport::{
    BinaryKind, TransportEvent, TransportFactory, TransportRequest, TransportSink,
};

use crate::config::SocketConfig;
use crate::registry::{ListenerId, Listeners, Subscription};

/// Connection state, mirroring the underlying transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReadyState {
    /// A transport is being established
    Connecting,
    /// The transport is established and ready
    Open,
    /// A caller-requested close is in flight
    Closing,
    /// No transport is established
    Closed,
}

impl ReadyState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ReadyState::Connecting => 0,
            ReadyState::Open => 1,
            ReadyState::Closing => 2,
            ReadyState::Closed => 3,
        }
    }
}

/// State shared between the handle and the driver task
struct Shared {
    ready: AtomicU8,
    attempts: AtomicU32,
    forced_close: AtomicBool,
    next_listener_id: AtomicU64,
    sink: Mutex<Option<Box<dyn TransportSink>>>,
}

impl Shared {
    fn new(next_listener_id: u64) -> Self {
        Self {
            ready: AtomicU8::new(ReadyState::Connecting.as_u8()),
            attempts: AtomicU32::new(0),
            forced_close: AtomicBool::new(false),
            next_listener_id: AtomicU64::new(next_listener_id),
            sink: Mutex::new(None),
        }
    }

    fn ready(&self) -> ReadyState {
        ReadyState::from_u8(self.ready.load(Ordering::SeqCst))
    }

    fn set_ready(&self, state: ReadyState) {
        self.ready.store(state.as_u8(), Ordering::SeqCst);
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn set_attempts(&self, attempts: u32) {
        self.attempts.store(attempts, Ordering::SeqCst);
    }

    fn increment_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
    }

    fn forced_close(&self) -> bool {
        self.forced_close.load(Ordering::SeqCst)
    }

    fn set_forced_close(&self) {
        self.forced_close.store(true, Ordering::SeqCst);
    }

    fn allocate_listener_id(&self) -> ListenerId {
        ListenerId::new(self.next_listener_id.fetch_add(1, Ordering::SeqCst))
    }

    fn install_sink(&self, sink: Box<dyn TransportSink>) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    fn clear_sink(&self) {
        self.sink.lock().unwrap().take();
    }

    fn close_sink(&self, code: Option<u16>, reason: Option<&str>) {
        if let Some(sink) = self.sink.lock().unwrap().as_mut() {
            sink.close(code, reason);
        }
    }
}

/// Commands the handle sends to the driver task
enum Command {
    /// Start a fresh, non-reconnect connect cycle
    Open,
    /// Install a listener
    Subscribe {
        id: ListenerId,
        single_slot: bool,
        subscription: Subscription,
    },
    /// Remove a listener
    Unsubscribe(ListenerId),
}

/// Builder for [`ReconnectingSocket`]
pub struct SocketBuilder {
    url: String,
    protocols: Vec<String>,
    config: SocketConfig,
    factory: Option<Arc<dyn TransportFactory>>,
    listeners: Listeners,
    next_listener_id: u64,
}

impl SocketBuilder {
    /// Create a builder for the given target URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            protocols: Vec::new(),
            config: SocketConfig::default(),
            factory: None,
            listeners: Listeners::new(),
            next_listener_id: 1,
        }
    }

    /// Set the socket configuration
    pub fn config(mut self, config: SocketConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the subprotocols offered to the peer, in preference order
    pub fn protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// Add a subprotocol
    pub fn add_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    /// Set the transport factory the socket connects through
    pub fn factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    fn register(mut self, subscription: Subscription) -> Self {
        let id = ListenerId::new(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.insert(id, subscription, false);
        self
    }

    /// Register a `connecting` listener before the socket starts
    ///
    /// With `automatic_open`, the initial connecting notification fires
    /// before `build` returns a handle to subscribe on; listeners that need
    /// it must be registered here.
    pub fn on_connecting(self, callback: impl FnMut(&ConnectingEvent) + Send + 'static) -> Self {
        self.register(Subscription::Connecting(Box::new(callback)))
    }

    /// Register an `open` listener before the socket starts
    pub fn on_open(self, callback: impl FnMut(&OpenEvent) + Send + 'static) -> Self {
        self.register(Subscription::Open(Box::new(callback)))
    }

    /// Register a `close` listener before the socket starts
    pub fn on_close(self, callback: impl FnMut(&CloseFrame) + Send + 'static) -> Self {
        self.register(Subscription::Close(Box::new(callback)))
    }

    /// Register a `message` listener before the socket starts
    pub fn on_message(self, callback: impl FnMut(&Message) + Send + 'static) -> Self {
        self.register(Subscription::Message(Box::new(callback)))
    }

    /// Register an `error` listener before the socket starts
    pub fn on_error(self, callback: impl FnMut(&ErrorEvent) + Send + 'static) -> Self {
        self.register(Subscription::Error(Box::new(callback)))
    }

    /// Validate the configuration, spawn the driver task, and return the
    /// socket handle
    ///
    /// Must be called within a tokio runtime. With `automatic_open` (the
    /// default), the initial connect cycle is queued before this returns.
    pub fn build(self) -> Result<ReconnectingSocket> {
        if self.url.is_empty() {
            return Err(ConfigError::Validation("url must not be empty".to_string()).into());
        }
        self.config.validate()?;
        let factory = self.factory.ok_or_else(|| {
            Error::from(ConfigError::Validation(
                "a transport factory is required".to_string(),
            ))
        })?;

        let shared = Arc::new(Shared::new(self.next_listener_id));
        let (commands, commands_rx) = mpsc::unbounded_channel();

        if self.config.automatic_open {
            let _ = commands.send(Command::Open);
        }

        let driver = Driver {
            url: self.url.clone(),
            protocols: self.protocols.clone(),
            config: self.config.clone(),
            factory,
            shared: Arc::clone(&shared),
            listeners: self.listeners,
        };
        let _ = tokio::spawn(driver.run(commands_rx));

        Ok(ReconnectingSocket {
            url: self.url,
            protocols: self.protocols,
            config: self.config,
            shared,
            commands,
        })
    }
}

impl fmt::Debug for SocketBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketBuilder")
            .field("url", &self.url)
            .field("protocols", &self.protocols)
            .field("config", &self.config)
            .field("has_factory", &self.factory.is_some())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// A socket that survives its transport
///
/// Wraps one transport at a time and re-opens it after unintended closes
/// with exponential backoff, so the connection looks persistent to the
/// caller. Dropping the handle terminates the driver task and abandons the
/// current transport.
pub struct ReconnectingSocket {
    url: String,
    protocols: Vec<String>,
    config: SocketConfig,
    shared: Arc<Shared>,
    commands: UnboundedSender<Command>,
}

impl ReconnectingSocket {
    /// Create a builder for the given target URL
    pub fn builder(url: impl Into<String>) -> SocketBuilder {
        SocketBuilder::new(url)
    }

    /// Target endpoint address
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Subprotocols offered to the peer
    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    /// The socket's configuration
    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// Current connection state
    pub fn ready_state(&self) -> ReadyState {
        self.shared.ready()
    }

    /// Number of reconnect attempts since the last successful open
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.attempts()
    }

    /// Start a fresh, explicit connect cycle
    ///
    /// Abandons the current transport if one exists, resets the reconnect
    /// attempt counter, and connects as on construction. This is also the
    /// only way to resume connecting after the attempt ceiling was reached.
    pub fn open(&self) {
        let _ = self.commands.send(Command::Open);
    }

    /// Send a message over the current transport
    ///
    /// Fails with [`Error::NotConnected`] when no transport is installed
    /// (never opened, or torn down without a replacement yet). Nothing is
    /// buffered: a failed send is not retried after reconnection.
    pub fn send(&self, message: impl Into<Message>) -> Result<()> {
        let mut sink = self.shared.sink.lock().unwrap();
        match sink.as_mut() {
            Some(sink) => {
                sink.send(message.into())?;
                #[cfg(feature = "metrics")]
                {
                    metrics::counter!("eversocket_client_messages_sent_total").increment(1);
                }
                Ok(())
            }
            None => Err(Error::NotConnected),
        }
    }

    /// Send a text message
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Message::text(text.into()))
    }

    /// Send a binary message
    pub fn send_binary(&self, data: impl Into<bytes::Bytes>) -> Result<()> {
        self.send(Message::binary(data.into()))
    }

    /// Close the socket for good
    ///
    /// Sets the forced-close flag (permanently disabling automatic
    /// reopening) and requests the current transport close with the given
    /// code and reason. The code defaults to 1000 (normal closure). Safe to
    /// call repeatedly.
    pub fn close(&self, code: Option<u16>, reason: Option<&str>) {
        self.shared.set_forced_close();
        let mut sink = self.shared.sink.lock().unwrap();
        if let Some(sink) = sink.as_mut() {
            self.shared.set_ready(ReadyState::Closing);
            sink.close(code.or(Some(CloseCode::Normal.code())), reason);
        }
    }

    /// Force an immediate reconnect cycle
    ///
    /// Requests the current transport close without setting the forced-close
    /// flag, so the close flows through the normal unintended-drop path and
    /// triggers a reconnect.
    pub fn refresh(&self) {
        self.shared.close_sink(None, None);
    }

    /// Subprotocol negotiated by the current transport; `None` when no
    /// transport is installed
    pub fn protocol(&self) -> Option<String> {
        self.shared
            .sink
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|sink| sink.protocol())
    }

    /// Extensions in effect on the current transport; empty when no
    /// transport is installed
    pub fn extensions(&self) -> Vec<String> {
        self.shared
            .sink
            .lock()
            .unwrap()
            .as_ref()
            .map(|sink| sink.extensions())
            .unwrap_or_default()
    }

    /// Bytes buffered by the current transport; 0 when no transport is
    /// installed
    pub fn buffered_amount(&self) -> u64 {
        self.shared
            .sink
            .lock()
            .unwrap()
            .as_ref()
            .map(|sink| sink.buffered_amount())
            .unwrap_or(0)
    }

    /// Binary payload representation the socket requests from transports
    pub fn binary_kind(&self) -> BinaryKind {
        self.config.binary_kind
    }

    fn subscribe(&self, subscription: Subscription, single_slot: bool) -> ListenerId {
        let id = self.shared.allocate_listener_id();
        let _ = self.commands.send(Command::Subscribe {
            id,
            single_slot,
            subscription,
        });
        id
    }

    /// Subscribe to `connecting` notifications
    pub fn on_connecting(
        &self,
        callback: impl FnMut(&ConnectingEvent) + Send + 'static,
    ) -> ListenerId {
        self.subscribe(Subscription::Connecting(Box::new(callback)), false)
    }

    /// Subscribe to `open` notifications
    pub fn on_open(&self, callback: impl FnMut(&OpenEvent) + Send + 'static) -> ListenerId {
        self.subscribe(Subscription::Open(Box::new(callback)), false)
    }

    /// Subscribe to `close` notifications
    pub fn on_close(&self, callback: impl FnMut(&CloseFrame) + Send + 'static) -> ListenerId {
        self.subscribe(Subscription::Close(Box::new(callback)), false)
    }

    /// Subscribe to `message` notifications
    pub fn on_message(&self, callback: impl FnMut(&Message) + Send + 'static) -> ListenerId {
        self.subscribe(Subscription::Message(Box::new(callback)), false)
    }

    /// Subscribe to `error` notifications
    pub fn on_error(&self, callback: impl FnMut(&ErrorEvent) + Send + 'static) -> ListenerId {
        self.subscribe(Subscription::Error(Box::new(callback)), false)
    }

    /// Remove a listener by its id
    ///
    /// Removal is processed on the driver task; a notification already being
    /// dispatched still reaches the listener.
    pub fn remove_listener(&self, id: ListenerId) {
        let _ = self.commands.send(Command::Unsubscribe(id));
    }

    /// Set the single-slot `connecting` handler, replacing any previous one
    ///
    /// The single-slot handlers mirror the assignable callback fields of
    /// browser-style sockets. They are sugar over the listener registry:
    /// each call subscribes a listener and unsubscribes the one installed by
    /// the previous call, leaving plain [`on_connecting`] listeners
    /// untouched.
    ///
    /// [`on_connecting`]: ReconnectingSocket::on_connecting
    pub fn set_connecting_handler(
        &self,
        callback: impl FnMut(&ConnectingEvent) + Send + 'static,
    ) -> ListenerId {
        self.subscribe(Subscription::Connecting(Box::new(callback)), true)
    }

    /// Set the single-slot `open` handler, replacing any previous one
    pub fn set_open_handler(
        &self,
        callback: impl FnMut(&OpenEvent) + Send + 'static,
    ) -> ListenerId {
        self.subscribe(Subscription::Open(Box::new(callback)), true)
    }

    /// Set the single-slot `close` handler, replacing any previous one
    pub fn set_close_handler(
        &self,
        callback: impl FnMut(&CloseFrame) + Send + 'static,
    ) -> ListenerId {
        self.subscribe(Subscription::Close(Box::new(callback)), true)
    }

    /// Set the single-slot `message` handler, replacing any previous one
    pub fn set_message_handler(
        &self,
        callback: impl FnMut(&Message) + Send + 'static,
    ) -> ListenerId {
        self.subscribe(Subscription::Message(Box::new(callback)), true)
    }

    /// Set the single-slot `error` handler, replacing any previous one
    pub fn set_error_handler(
        &self,
        callback: impl FnMut(&ErrorEvent) + Send + 'static,
    ) -> ListenerId {
        self.subscribe(Subscription::Error(Box::new(callback)), true)
    }
}

impl fmt::Debug for ReconnectingSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectingSocket")
            .field("url", &self.url)
            .field("ready_state", &self.ready_state())
            .field("reconnect_attempts", &self.reconnect_attempts())
            .finish()
    }
}

/// Outcome of one connect cycle
enum Cycle {
    /// Command channel closed; the handle is gone
    Shutdown,
    /// Stop connecting until an explicit open arrives
    Idle,
    /// Re-enter as an automatic reconnect attempt
    Reconnect,
    /// Re-enter as a fresh explicit open
    Reopen,
}

/// Why the current transport went away
enum CloseCause {
    /// The transport dropped on its own
    Drop,
    /// The connection timeout closed a still-pending transport
    Timeout,
}

/// The driver task: owns the listeners and all state transitions
struct Driver {
    url: String,
    protocols: Vec<String>,
    config: SocketConfig,
    factory: Arc<dyn TransportFactory>,
    shared: Arc<Shared>,
    listeners: Listeners,
}

impl Driver {
    async fn run(mut self, mut commands: UnboundedReceiver<Command>) {
        let mut pending: Option<bool> = None;
        loop {
            let is_reconnect = match pending.take() {
                Some(flag) => flag,
                None => match self.idle(&mut commands).await {
                    Some(()) => false,
                    None => return,
                },
            };
            match self.connect_cycle(&mut commands, is_reconnect).await {
                Cycle::Shutdown => return,
                Cycle::Idle => {}
                Cycle::Reconnect => pending = Some(true),
                Cycle::Reopen => pending = Some(false),
            }
        }
    }

    /// Wait for an explicit open, servicing listener commands meanwhile.
    /// Returns `None` when the handle is gone.
    async fn idle(&mut self, commands: &mut UnboundedReceiver<Command>) -> Option<()> {
        loop {
            let command = commands.recv().await?;
            if self.apply_command(command) {
                return Some(());
            }
        }
    }

    /// Returns true when the command asks for a fresh open
    fn apply_command(&mut self, command: Command) -> bool {
        match command {
            Command::Open => true,
            Command::Subscribe {
                id,
                single_slot,
                subscription,
            } => {
                self.listeners.insert(id, subscription, single_slot);
                false
            }
            Command::Unsubscribe(id) => {
                self.listeners.remove(id);
                false
            }
        }
    }

    /// One connect cycle: create a transport and follow it until it settles
    async fn connect_cycle(
        &mut self,
        commands: &mut UnboundedReceiver<Command>,
        is_reconnect: bool,
    ) -> Cycle {
        if is_reconnect {
            // Forced close and the attempt ceiling turn a scheduled reopen
            // into a no-op; the backoff timer itself is never cancelled.
            if self.shared.forced_close() {
                return Cycle::Idle;
            }
            if let Some(max) = self.config.max_reconnect_attempts {
                if self.shared.attempts() > max {
                    self.dbg("reconnect-attempts-exhausted");
                    return Cycle::Idle;
                }
            }
        } else {
            self.emit_connecting(ConnectingEvent::initial());
            self.shared.set_attempts(0);
        }

        self.dbg("attempt-connect");
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("eversocket_client_connect_attempts_total").increment(1);
        }

        self.shared.set_ready(ReadyState::Connecting);

        let request = TransportRequest {
            url: self.url.clone(),
            protocols: self.protocols.clone(),
            binary_kind: self.config.binary_kind,
        };
        let mut events = match self.factory.open(request) {
            Ok(link) => {
                self.shared.install_sink(link.sink);
                link.events
            }
            Err(error) => {
                self.dbg("factory-rejected");
                self.emit_error(ErrorEvent::new(error));
                return self
                    .recover(commands, CloseFrame::abnormal(), CloseCause::Drop)
                    .await;
            }
        };

        let timeout = tokio::time::sleep(self.config.timeout_interval);
        tokio::pin!(timeout);
        let mut timeout_armed = true;
        let mut open_is_reconnect = is_reconnect;
        let mut cause = CloseCause::Drop;

        enum Step {
            Command(Option<Command>),
            Event(Option<TransportEvent>),
            TimedOut,
        }

        loop {
            let step = tokio::select! {
                command = commands.recv() => Step::Command(command),
                event = events.recv() => Step::Event(event),
                _ = &mut timeout, if timeout_armed => Step::TimedOut,
            };
            match step {
                Step::Command(None) => return Cycle::Shutdown,
                Step::Command(Some(command)) => {
                    if self.apply_command(command) {
                        // An explicit open abandons the current transport.
                        self.shared.clear_sink();
                        return Cycle::Reopen;
                    }
                }
                Step::Event(Some(TransportEvent::Opened { protocol })) => {
                    timeout_armed = false;
                    self.dbg("open");
                    self.shared.set_ready(ReadyState::Open);
                    self.shared.set_attempts(0);
                    self.emit_open(OpenEvent {
                        is_reconnect: open_is_reconnect,
                        protocol,
                    });
                    open_is_reconnect = false;
                }
                Step::Event(Some(TransportEvent::Message(message))) => {
                    if self.config.debug {
                        tracing::debug!(
                            target: "eversocket",
                            url = %self.url,
                            bytes = message.len(),
                            "message"
                        );
                    }
                    #[cfg(feature = "metrics")]
                    {
                        metrics::counter!("eversocket_client_messages_received_total").increment(1);
                    }
                    self.emit_message(message);
                }
                Step::Event(Some(TransportEvent::Errored(error))) => {
                    self.dbg("error");
                    self.emit_error(ErrorEvent::new(error));
                }
                Step::Event(Some(TransportEvent::Closed(frame))) => {
                    return self.finish_close(commands, frame, cause).await;
                }
                Step::Event(None) => {
                    // The transport vanished without a close event.
                    return self
                        .finish_close(commands, CloseFrame::abnormal(), cause)
                        .await;
                }
                Step::TimedOut => {
                    timeout_armed = false;
                    cause = CloseCause::Timeout;
                    self.dbg("connection-timeout");
                    self.shared.close_sink(None, None);
                }
            }
        }
    }

    /// Settle a transport close: terminal when forced, otherwise recover
    async fn finish_close(
        &mut self,
        commands: &mut UnboundedReceiver<Command>,
        frame: CloseFrame,
        cause: CloseCause,
    ) -> Cycle {
        self.shared.clear_sink();
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("eversocket_client_transport_closes_total").increment(1);
        }

        if self.shared.forced_close() {
            self.dbg("close-forced");
            self.shared.set_ready(ReadyState::Closed);
            self.emit_close(frame);
            return Cycle::Idle;
        }
        self.recover(commands, frame, cause).await
    }

    /// The unintended-close path: notify subscribers, back off, and come
    /// back as a reconnect attempt
    ///
    /// The `close` notification only fires for the first failure since the
    /// last successful open, so callers see one close per outage rather
    /// than one per retry. A timeout-induced first failure suppresses even
    /// that one.
    async fn recover(
        &mut self,
        commands: &mut UnboundedReceiver<Command>,
        frame: CloseFrame,
        cause: CloseCause,
    ) -> Cycle {
        self.shared.set_ready(ReadyState::Closed);

        let attempts = self.shared.attempts();
        if attempts == 0 && !matches!(cause, CloseCause::Timeout) {
            self.dbg("close");
            self.emit_close(frame.clone());
        }
        self.emit_connecting(ConnectingEvent::retry(frame));

        let delay = self.config.reconnect_delay(attempts);
        if self.config.debug {
            tracing::debug!(
                target: "eversocket",
                url = %self.url,
                delay_ms = delay.as_millis() as u64,
                attempts,
                "reconnect-scheduled"
            );
        }
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("eversocket_client_reconnects_scheduled_total").increment(1);
        }

        let wake = tokio::time::sleep(delay);
        tokio::pin!(wake);

        enum Step {
            Command(Option<Command>),
            Wake,
        }

        loop {
            let step = tokio::select! {
                command = commands.recv() => Step::Command(command),
                _ = &mut wake => Step::Wake,
            };
            match step {
                Step::Command(None) => return Cycle::Shutdown,
                Step::Command(Some(command)) => {
                    if self.apply_command(command) {
                        return Cycle::Reopen;
                    }
                }
                Step::Wake => break,
            }
        }

        if self.shared.forced_close() {
            return Cycle::Idle;
        }
        self.shared.increment_attempts();
        Cycle::Reconnect
    }

    fn dbg(&self, action: &str) {
        if self.config.debug {
            tracing::debug!(target: "eversocket", url = %self.url, "{}", action);
        }
    }

    fn emit_connecting(&mut self, event: ConnectingEvent) {
        self.listeners.emit_connecting(&event);
    }

    fn emit_open(&mut self, event: OpenEvent) {
        self.listeners.emit_open(&event);
    }

    fn emit_close(&mut self, frame: CloseFrame) {
        self.listeners.emit_close(&frame);
    }

    fn emit_message(&mut self, message: Message) {
        self.listeners.emit_message(&message);
    }

    fn emit_error(&mut self, event: ErrorEvent) {
        self.listeners.emit_error(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eversocket_core::testing::MockFactory;

    /// Let the driver task drain its queues on the current-thread runtime
    async fn settle() {
        for _ in 0..25 {
            tokio::task::yield_now().await;
        }
    }

    fn manual_config() -> SocketConfig {
        SocketConfig::default().automatic_open(false)
    }

    #[tokio::test]
    async fn test_builder_rejects_empty_url() {
        let factory = MockFactory::new();
        let result = ReconnectingSocket::builder("").factory(factory).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_builder_requires_factory() {
        let result = ReconnectingSocket::builder("wss://test").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_config() {
        let factory = MockFactory::new();
        let result = ReconnectingSocket::builder("wss://test")
            .factory(factory)
            .config(SocketConfig::default().reconnect_decay(0.5))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_no_transport_without_automatic_open() {
        let factory = MockFactory::new();
        let socket = ReconnectingSocket::builder("wss://test")
            .factory(factory.clone())
            .config(manual_config())
            .build()
            .expect("build");
        settle().await;

        assert_eq!(factory.created(), 0);
        assert_eq!(socket.ready_state(), ReadyState::Connecting);

        socket.open();
        settle().await;
        assert_eq!(factory.created(), 1);
    }

    #[tokio::test]
    async fn test_automatic_open_creates_transport() {
        let factory = MockFactory::new();
        let _socket = ReconnectingSocket::builder("wss://test")
            .factory(factory.clone())
            .build()
            .expect("build");
        settle().await;

        assert_eq!(factory.created(), 1);
        assert_eq!(factory.transport(0).request().url, "wss://test");
    }

    #[tokio::test]
    async fn test_send_without_transport_fails() {
        let factory = MockFactory::new();
        let socket = ReconnectingSocket::builder("wss://test")
            .factory(factory)
            .config(manual_config())
            .build()
            .expect("build");

        assert!(matches!(
            socket.send(Message::text("hello")),
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_successful_open_resets_state() {
        let factory = MockFactory::new();
        let socket = ReconnectingSocket::builder("wss://test")
            .protocols(["chat"])
            .factory(factory.clone())
            .build()
            .expect("build");
        settle().await;

        factory.transport(0).emit_open(Some("chat"));
        settle().await;

        assert_eq!(socket.ready_state(), ReadyState::Open);
        assert_eq!(socket.reconnect_attempts(), 0);
        assert_eq!(socket.protocol(), Some("chat".to_string()));

        socket.send_text("hello").expect("send text");
        socket.send_binary(vec![1u8, 2, 3]).expect("send binary");
        assert_eq!(
            factory.transport(0).sent(),
            vec![Message::text("hello"), Message::binary(vec![1u8, 2, 3])]
        );
    }

    #[tokio::test]
    async fn test_accessor_fallbacks_without_transport() {
        let factory = MockFactory::new();
        let socket = ReconnectingSocket::builder("wss://test")
            .factory(factory)
            .config(manual_config())
            .build()
            .expect("build");

        assert_eq!(socket.protocol(), None);
        assert!(socket.extensions().is_empty());
        assert_eq!(socket.buffered_amount(), 0);
        assert_eq!(socket.binary_kind(), BinaryKind::Blob);
    }

    #[tokio::test]
    async fn test_message_listener_receives_payload() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        let factory = MockFactory::new();
        let socket = ReconnectingSocket::builder("wss://test")
            .factory(factory.clone())
            .build()
            .expect("build");
        let id = socket.on_message(move |message| {
            log.lock().unwrap().push(message.clone());
        });
        settle().await;

        factory.transport(0).emit_open(None);
        factory.transport(0).emit_message(Message::text("one"));
        settle().await;

        assert_eq!(*received.lock().unwrap(), vec![Message::text("one")]);

        socket.remove_listener(id);
        settle().await;
        factory.transport(0).emit_message(Message::text("two"));
        settle().await;

        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let factory = MockFactory::new();
        let socket = ReconnectingSocket::builder("wss://test")
            .factory(factory.clone())
            .build()
            .expect("build");
        settle().await;
        factory.transport(0).emit_open(None);
        settle().await;

        socket.close(None, Some("bye"));
        socket.close(None, Some("bye again"));
        settle().await;

        assert_eq!(socket.ready_state(), ReadyState::Closed);
        let requests = factory.transport(0).close_requests();
        assert_eq!(requests[0].code, Some(1000));
        assert_eq!(requests[0].reason.as_deref(), Some("bye"));
    }
}
