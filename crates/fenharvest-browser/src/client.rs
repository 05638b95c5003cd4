//! CDP WebSocket client.
//!
//! One socket carries the browser-level connection and every attached page
//! session. Replies are matched to waiters by id; events are routed to the
//! page that raised them by `sessionId`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use crate::error::CdpError;
use crate::protocol::{Command, Fault, Incoming, NewTarget, VersionInfo};
use crate::session::PageSession;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Reply = Result<Value, Fault>;

/// Waiters and event subscribers for one socket.
#[derive(Default)]
pub(crate) struct Router {
    waiters: Mutex<HashMap<u64, oneshot::Sender<Reply>>>,
    sessions: Mutex<HashMap<String, mpsc::UnboundedSender<Incoming>>>,
}

impl Router {
    fn route(&self, msg: Incoming) {
        if let Some(id) = msg.id {
            let waiter = self.waiters.lock().remove(&id);
            match waiter {
                Some(tx) => {
                    let reply = match msg.error {
                        Some(fault) => Err(fault),
                        None => Ok(msg.result.unwrap_or(Value::Null)),
                    };
                    let _ = tx.send(reply);
                }
                None => trace!(id, "Reply without waiter"),
            }
            return;
        }

        if !msg.is_event() {
            return;
        }
        let key = msg.session_id.clone().unwrap_or_default();
        if let Some(tx) = self.sessions.lock().get(&key) {
            let _ = tx.send(msg);
        }
    }

    fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<Incoming> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.lock().insert(session_id.to_string(), tx);
        rx
    }

    /// Drop every waiter and subscriber so callers see the disconnect.
    fn close(&self) {
        self.waiters.lock().clear();
        self.sessions.lock().clear();
    }
}

/// Command sender shared by the client and its page sessions.
#[derive(Clone)]
pub(crate) struct Transport {
    sink: Arc<tokio::sync::Mutex<SplitSink<Socket, Message>>>,
    router: Arc<Router>,
    next_id: Arc<AtomicU64>,
    timeout: Duration,
}

impl Transport {
    /// Send one command and wait for its reply, bounded by the request timeout.
    pub(crate) async fn send(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = serde_json::to_string(&Command {
            id,
            method,
            params,
            session_id,
        })?;
        trace!("-> {}", frame);

        let (tx, rx) = oneshot::channel();
        self.router.waiters.lock().insert(id, tx);

        let sent = self.sink.lock().await.send(Message::Text(frame.into())).await;
        if let Err(e) = sent {
            self.router.waiters.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(fault))) => Err(CdpError::Protocol {
                method: method.to_string(),
                code: fault.code,
                message: fault.message,
            }),
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.router.waiters.lock().remove(&id);
                Err(CdpError::Timeout(format!("{} after {:?}", method, self.timeout)))
            }
        }
    }
}

/// Query `/json/version` on a debugging endpoint.
pub(crate) async fn probe_endpoint(endpoint: &str) -> Result<VersionInfo, CdpError> {
    let unreachable = |e: reqwest::Error| CdpError::Unreachable(format!("{} ({})", endpoint, e));
    reqwest::get(format!("{}/json/version", endpoint))
        .await
        .map_err(unreachable)?
        .json()
        .await
        .map_err(unreachable)
}

/// Connection to one browser over its debugging socket.
pub struct CdpClient {
    endpoint: String,
    transport: Transport,
    reader: JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the browser behind `endpoint` (e.g. `http://localhost:9222`).
    pub async fn connect(endpoint: &str, request_timeout: Duration) -> Result<Self, CdpError> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let version = probe_endpoint(&endpoint).await?;
        debug!("Found {} at {}", version.browser, endpoint);

        let (socket, _) = tokio_tungstenite::connect_async(version.ws_url.as_str()).await?;
        let (sink, source) = socket.split();

        let router = Arc::new(Router::default());
        let reader = tokio::spawn(Self::read_loop(source, router.clone()));

        Ok(Self {
            endpoint,
            transport: Transport {
                sink: Arc::new(tokio::sync::Mutex::new(sink)),
                router,
                next_id: Arc::new(AtomicU64::new(1)),
                timeout: request_timeout,
            },
            reader,
        })
    }

    async fn read_loop(mut source: SplitStream<Socket>, router: Arc<Router>) {
        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<Incoming>(&text) {
                    Ok(msg) => router.route(msg),
                    Err(e) => warn!("Unparseable CDP frame: {}", e),
                },
                Ok(Message::Close(reason)) => {
                    debug!(?reason, "Browser closed the socket");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("CDP socket failed: {}", e);
                    break;
                }
            }
        }
        router.close();
    }

    /// Browser-level command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.send(method, params, None).await
    }

    pub fn is_connected(&self) -> bool {
        !self.reader.is_finished()
    }

    /// Create a blank tab, attach to it, and enable the domains a page needs.
    pub async fn open_page(&self) -> Result<PageSession, CdpError> {
        // Chrome only accepts PUT here.
        let target: NewTarget = reqwest::Client::new()
            .put(format!("{}/json/new", self.endpoint))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("Opened target {} ({})", target.id, target.url);

        let attached = self
            .call(
                "Target.attachToTarget",
                Some(json!({ "targetId": target.id, "flatten": true })),
            )
            .await?;
        let session_id = attached["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("attachToTarget without sessionId".into()))?
            .to_string();

        let events = self.transport.router.subscribe(&session_id);
        let session = PageSession::new(target.id, session_id, self.transport.clone(), events);
        session.enable_domains().await?;
        Ok(session)
    }

    pub async fn close_target(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.closeTarget", Some(json!({ "targetId": target_id })))
            .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incoming(json: &str) -> Incoming {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_reply_reaches_waiter() {
        let router = Router::default();
        let (tx, rx) = oneshot::channel();
        router.waiters.lock().insert(7, tx);

        router.route(incoming(r#"{"id": 7, "result": {"frameId": "F"}}"#));

        let value = rx.await.unwrap().unwrap();
        assert_eq!(value["frameId"], "F");
        assert!(router.waiters.lock().is_empty());
    }

    #[tokio::test]
    async fn test_fault_reaches_waiter() {
        let router = Router::default();
        let (tx, rx) = oneshot::channel();
        router.waiters.lock().insert(3, tx);

        router.route(incoming(r#"{"id": 3, "error": {"code": -32000, "message": "No node"}}"#));

        let fault = rx.await.unwrap().unwrap_err();
        assert_eq!(fault.code, -32000);
    }

    #[tokio::test]
    async fn test_event_routed_by_session() {
        let router = Router::default();
        let mut s1 = router.subscribe("S1");
        let mut s2 = router.subscribe("S2");

        router.route(incoming(
            r#"{"method": "Network.loadingFinished", "params": {"requestId": "1"}, "sessionId": "S1"}"#,
        ));

        let event = s1.recv().await.unwrap();
        assert_eq!(event.method.as_deref(), Some("Network.loadingFinished"));
        assert!(s2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_ends_streams_and_waiters() {
        let router = Router::default();
        let mut events = router.subscribe("S1");
        let (tx, rx) = oneshot::channel();
        router.waiters.lock().insert(1, tx);

        router.close();

        assert!(events.recv().await.is_none());
        assert!(rx.await.is_err());
    }
}
