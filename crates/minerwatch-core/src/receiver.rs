//! Datagram receiver.
//!
//! Owns the UDP socket. Each datagram is normalized and upserted into the
//! registry; one packet at a time, in receipt order. The port is bound
//! exclusively: a second listener on a busy port fails to start instead of
//! splitting the traffic.

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ReceiverError;
use crate::names::NameOverlay;
use crate::normalize::{normalize_payload, resolve_address, Payload};
use crate::registry::{Registry, Upsert};

/// Create a non-blocking UDP socket bound to `port` on all interfaces.
///
/// Neither SO_REUSEADDR nor SO_REUSEPORT is set, so the bind fails with
/// `AddrInUse` while another socket holds the port.
pub fn bind_socket(port: u16) -> Result<std::net::UdpSocket, std::io::Error> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    socket.bind(&addr.into())?;

    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

struct Running {
    /// Port requested by the caller (0 = ephemeral)
    port: u16,
    local_port: u16,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Shared by the receiver handle and its loop task.
struct Context {
    registry: Arc<Registry>,
    names: NameOverlay,
    buffer_size: usize,
}

pub struct Receiver {
    context: Arc<Context>,
    running: Mutex<Option<Running>>,
    listening: watch::Sender<bool>,
}

impl Receiver {
    pub fn new(registry: Arc<Registry>, names: NameOverlay, buffer_size: usize) -> Self {
        let (listening, _) = watch::channel(false);
        Self {
            context: Arc::new(Context {
                registry,
                names,
                buffer_size,
            }),
            running: Mutex::new(None),
            listening,
        }
    }

    /// Start listening on `port` and return the bound local port.
    ///
    /// No-op if already listening on the same port. A different port, or a
    /// loop that ended on a socket error, restarts the listener.
    pub async fn start(&self, port: u16) -> Result<u16, ReceiverError> {
        let mut running = self.running.lock().await;

        if let Some(current) = running.as_ref() {
            if current.port == port && !current.task.is_finished() {
                return Ok(current.local_port);
            }
        }
        if let Some(previous) = running.take() {
            Self::shutdown(previous).await;
            self.listening.send_replace(false);
        }

        let std_socket =
            bind_socket(port).map_err(|source| ReceiverError::Bind { port, source })?;
        let socket =
            UdpSocket::from_std(std_socket).map_err(|source| ReceiverError::Bind { port, source })?;
        let local_port = socket.local_addr()?.port();

        let cancel = CancellationToken::new();
        self.listening.send_replace(true);
        let task = tokio::spawn(run_loop(
            socket,
            self.context.clone(),
            cancel.clone(),
            self.listening.clone(),
        ));

        tracing::info!("UDP listener bound on port {}", local_port);

        *running = Some(Running {
            port,
            local_port,
            cancel,
            task,
        });
        Ok(local_port)
    }

    /// Stop listening and release the socket. Safe when not running.
    pub async fn stop(&self) {
        if let Some(previous) = self.running.lock().await.take() {
            Self::shutdown(previous).await;
            tracing::info!("UDP listener stopped");
        }
        self.listening.send_replace(false);
    }

    pub async fn restart(&self, port: u16) -> Result<u16, ReceiverError> {
        self.stop().await;
        self.start(port).await
    }

    pub fn is_listening(&self) -> bool {
        *self.listening.borrow()
    }

    pub fn listening(&self) -> watch::Receiver<bool> {
        self.listening.subscribe()
    }

    /// Bound local port while listening.
    pub async fn local_port(&self) -> Option<u16> {
        self.running
            .lock()
            .await
            .as_ref()
            .filter(|r| !r.task.is_finished())
            .map(|r| r.local_port)
    }

    async fn shutdown(running: Running) {
        running.cancel.cancel();
        if let Err(e) = running.task.await {
            tracing::warn!("UDP listener task ended abnormally: {}", e);
        }
    }
}

async fn run_loop(
    socket: UdpSocket,
    context: Arc<Context>,
    cancel: CancellationToken,
    listening: watch::Sender<bool>,
) {
    let mut buf = vec![0u8; context.buffer_size];

    loop {
        let (len, addr) = tokio::select! {
            _ = cancel.cancelled() => break,
            result = socket.recv_from(&mut buf) => match result {
                Ok(received) => received,
                Err(e) => {
                    tracing::error!("UDP receive error, listener stopping: {}", e);
                    listening.send_replace(false);
                    break;
                }
            },
        };

        handle_datagram(&context, &buf[..len], addr);
    }
}

/// Normalize one datagram and upsert it. Never fails the loop.
fn handle_datagram(context: &Context, data: &[u8], addr: SocketAddr) {
    let source = addr.ip().to_string();

    let payload = match Payload::parse(data) {
        Ok(payload) => payload,
        Err(e) if e.is_silent() => {
            tracing::trace!("Ignoring non-JSON datagram from {}", source);
            return;
        }
        Err(e) => {
            tracing::debug!("Dropping datagram from {}: {}", source, e);
            return;
        }
    };

    let custom_name =
        resolve_address(&payload, Some(source.as_str())).and_then(|id| context.names.resolve(&id));

    match normalize_payload(&payload, Some(source.as_str()), custom_name.as_deref()) {
        Ok(device) => {
            tracing::debug!(
                "{} ({}) - {:.2} KH/s",
                device.id,
                device.display_name,
                device.hashrate_kh
            );
            let id = device.id.clone();
            if context.registry.upsert(device) == Upsert::Inserted {
                tracing::info!("New miner {} (from {})", id, source);
            }
        }
        Err(e) => {
            tracing::warn!("Dropping status report from {}: {}", source, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Preferences;
    use std::time::Duration;

    fn context() -> Context {
        Context {
            registry: Arc::new(Registry::new(Duration::from_secs(30))),
            names: NameOverlay::new(Preferences::ephemeral()),
            buffer_size: 4096,
        }
    }

    fn addr(ip: &str) -> SocketAddr {
        format!("{}:5555", ip).parse().unwrap()
    }

    #[tokio::test]
    async fn test_handle_datagram_upserts() {
        let context = context();
        handle_datagram(
            &context,
            br#"{"HashRate": "10K", "Temp": 40}"#,
            addr("192.168.0.10"),
        );

        let device = context.registry.get("192.168.0.10").unwrap();
        assert_eq!(device.hashrate_kh, 10.0);
    }

    #[tokio::test]
    async fn test_discovery_probe_is_ignored() {
        let context = context();
        handle_datagram(&context, b"DISCOVER", addr("192.168.0.10"));
        handle_datagram(&context, b"{broken", addr("192.168.0.10"));
        handle_datagram(&context, b"{broken}", addr("192.168.0.10"));

        assert!(context.registry.is_empty());
        assert_eq!(context.registry.snapshot().revision, 0);
    }

    #[tokio::test]
    async fn test_custom_name_resolved_from_embedded_address() {
        let context = context();
        context.names.set("10.0.0.5", "Rig-A");

        // Relayed through another host: the embedded address is the id
        handle_datagram(&context, br#"{"ip": "10.0.0.5"}"#, addr("10.0.0.99"));

        let device = context.registry.get("10.0.0.5").unwrap();
        assert_eq!(device.display_name, "Rig-A");
        assert!(context.registry.get("10.0.0.99").is_none());
    }

    #[tokio::test]
    async fn test_custom_name_resolved_from_source_address() {
        let context = context();
        context.names.set("10.0.0.6", "Rig-B");

        handle_datagram(&context, br#"{"Name": "nerd"}"#, addr("10.0.0.6"));

        assert_eq!(context.registry.get("10.0.0.6").unwrap().display_name, "Rig-B");
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_is_safe() {
        let ctx = context();
        let receiver = Receiver::new(ctx.registry.clone(), ctx.names.clone(), 4096);

        receiver.stop().await;
        assert!(!receiver.is_listening());

        let port = receiver.start(0).await.unwrap();
        assert!(receiver.is_listening());
        assert_eq!(receiver.start(0).await.unwrap(), port);
        assert_eq!(receiver.local_port().await, Some(port));

        receiver.stop().await;
        assert!(!receiver.is_listening());
        assert_eq!(receiver.local_port().await, None);
        receiver.stop().await;
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let ctx = context();
        let receiver = Receiver::new(ctx.registry.clone(), ctx.names.clone(), 4096);

        let blocker = std::net::UdpSocket::bind("0.0.0.0:0").unwrap();
        let port = blocker.local_addr().unwrap().port();

        let result = receiver.start(port).await;
        assert!(matches!(result, Err(ReceiverError::Bind { .. })));
        assert!(!receiver.is_listening());
    }

    #[tokio::test]
    async fn test_second_receiver_on_busy_port_fails() {
        let ctx = context();
        let first = Receiver::new(ctx.registry.clone(), ctx.names.clone(), 4096);
        let second = Receiver::new(ctx.registry.clone(), ctx.names.clone(), 4096);

        let port = first.start(0).await.unwrap();

        let result = second.start(port).await;
        assert!(matches!(result, Err(ReceiverError::Bind { port: p, .. }) if p == port));
        assert!(!second.is_listening());
        assert!(first.is_listening());

        first.stop().await;
        // Released on stop
        assert_eq!(second.start(port).await.unwrap(), port);
        second.stop().await;
    }

    #[tokio::test]
    async fn test_start_on_different_port_moves_listener() {
        let ctx = context();
        let receiver = Receiver::new(ctx.registry.clone(), ctx.names.clone(), 4096);

        let first = receiver.start(0).await.unwrap();
        ctx.registry.upsert(crate::types::tests::make_device("10.0.0.1"));

        // Pick a free port for the move
        let second = std::net::UdpSocket::bind("0.0.0.0:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        assert_eq!(receiver.start(second).await.unwrap(), second);
        assert!(receiver.is_listening());
        assert_eq!(receiver.local_port().await, Some(second));

        // The old port is free again
        let reclaimed = std::net::UdpSocket::bind(("0.0.0.0", first));
        assert!(reclaimed.is_ok());
        assert_eq!(ctx.registry.len(), 1);

        receiver.stop().await;
    }
}
