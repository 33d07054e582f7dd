//! Length-prefixed JSON RPC transport shared by all three tiers.
//!
//! Frames are `[u32 big-endian length][JSON body]`. Every call is wrapped in
//! an [`Envelope`] carrying a correlation id, so a single persistent
//! connection can multiplex a long-running call (`Evolve`) against
//! concurrent control-plane calls (`Pause`, `Quit`, `ReportAliveCells`, ...)
//! — the concurrency the client controller and broker both need, modelled
//! on the teacher's `tokio::sync::{mpsc, oneshot}` request/response pattern
//! in `gameroom::Actor` and `hosting::Casino::bridge`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot, Mutex};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    id: u64,
    body: T,
}

async fn write_frame(write_half: &mut OwnedWriteHalf, bytes: &[u8]) -> std::io::Result<()> {
    write_half.write_u32(bytes.len() as u32).await?;
    write_half.write_all(bytes).await?;
    write_half.flush().await
}

async fn read_frame(read_half: &mut OwnedReadHalf) -> std::io::Result<Option<Vec<u8>>> {
    let len = match read_half.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut buf = vec![0u8; len as usize];
    read_half.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

/// Error surfaced by a failed or disconnected RPC call. Treated as fatal to
/// the caller's current operation per the transport-error taxonomy in
/// SPEC_FULL.md §7 — no local retry except the alive-cells ticker.
#[derive(Debug)]
pub struct RpcError(pub String);

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rpc error: {}", self.0)
    }
}
impl std::error::Error for RpcError {}

impl From<std::io::Error> for RpcError {
    fn from(e: std::io::Error) -> Self {
        RpcError(e.to_string())
    }
}
impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError(e.to_string())
    }
}

/// A dialed, persistent RPC connection that can carry multiple concurrent
/// in-flight calls. Used by the broker to talk to each worker and by the
/// client to talk to the broker.
pub struct RpcClient<Resp> {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Resp>>>>,
    next_id: AtomicU64,
}

impl<Resp> RpcClient<Resp>
where
    Resp: DeserializeOwned + Send + 'static,
{
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, RpcError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let (read_half, mut write_half) = stream.into_split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Resp>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(async move {
            while let Some(bytes) = outbound_rx.recv().await {
                if write_frame(&mut write_half, &bytes).await.is_err() {
                    break;
                }
            }
        });

        let reader_pending = pending.clone();
        let mut read_half = read_half;
        tokio::spawn(async move {
            loop {
                match read_frame(&mut read_half).await {
                    Ok(Some(bytes)) => match serde_json::from_slice::<Envelope<Resp>>(&bytes) {
                        Ok(envelope) => {
                            if let Some(tx) = reader_pending.lock().await.remove(&envelope.id) {
                                let _ = tx.send(envelope.body);
                            }
                        }
                        Err(e) => {
                            log::error!("failed to decode rpc response: {e}");
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("rpc connection read error: {e}");
                        break;
                    }
                }
            }
            // connection dropped: wake every still-pending waiter with an error
            // by simply dropping their senders, which turns their `.await` into
            // a RecvError the caller maps to a transport failure.
            reader_pending.lock().await.clear();
        });

        Self {
            outbound: outbound_tx,
            pending,
            next_id: AtomicU64::new(0),
        }
    }

    pub async fn call<Req: Serialize>(&self, request: Req) -> Result<Resp, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);
        let bytes = serde_json::to_vec(&Envelope { id, body: request })?;
        self.outbound
            .send(bytes)
            .map_err(|_| RpcError("rpc connection closed".into()))?;
        rx.await
            .map_err(|_| RpcError("rpc connection closed before response".into()))
    }
}

/// Serves one accepted connection: reads request frames, dispatches each to
/// `handler` on its own task (so a slow handler — e.g. a long-running
/// `Evolve` — never blocks reading the *next* frame), and writes each
/// response back tagged with its request's correlation id.
pub async fn serve_connection<Req, Resp, F, Fut>(stream: TcpStream, handler: F)
where
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
    F: Fn(Req) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Resp> + Send + 'static,
{
    let (mut read_half, mut write_half) = stream.into_split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let writer = tokio::spawn(async move {
        while let Some(bytes) = outbound_rx.recv().await {
            if write_frame(&mut write_half, &bytes).await.is_err() {
                break;
            }
        }
    });

    loop {
        let bytes = match read_frame(&mut read_half).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(e) => {
                log::error!("connection read error: {e}");
                break;
            }
        };
        let envelope: Envelope<Req> = match serde_json::from_slice(&bytes) {
            Ok(e) => e,
            Err(e) => {
                log::error!("failed to decode request: {e}");
                continue;
            }
        };
        let handler = handler.clone();
        let outbound_tx = outbound_tx.clone();
        tokio::spawn(async move {
            let body = handler(envelope.body).await;
            if let Ok(bytes) = serde_json::to_vec(&Envelope { id: envelope.id, body }) {
                let _ = outbound_tx.send(bytes);
            }
        });
    }
    drop(outbound_tx);
    let _ = writer.await;
}
