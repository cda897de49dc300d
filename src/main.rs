//! resyncd - line-oriented driver for the delivery outbox.
//!
//! Reads one JSON operation per line on stdin and writes every frame the
//! outboxes emit as a JSON line on stdout:
//!
//! ```text
//! {"op":"connect","client":"c1"}
//! {"op":"update","client":"c1","id":7,"payload":{"x":1}}
//! {"op":"message","client":"c1","type":"notify","payload":{"text":"hi"}}
//! {"op":"offline","client":"c1"}
//! {"op":"handshake","client":"c1","last_message_id":1,"retransmit_id":"r1"}
//! ```

use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use resync_outbox::config::Config;
use resync_outbox::error::TransportError;
use resync_outbox::transport::TransportTimeouts;
use resync_outbox::{
    ClientHandle, Element, Outbox, OutboxParams, OutboxRegistry, SharingMode, Startup,
    Transport, http, metrics,
};
use resync_proto::{ClientId, ElementId, Payload, SyncRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// One input line.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Op {
    Connect {
        client: Option<ClientId>,
        #[serde(default)]
        shared: bool,
    },
    Update {
        client: ClientId,
        id: ElementId,
        payload: Payload,
    },
    Delete {
        client: ClientId,
        id: ElementId,
    },
    Message {
        client: ClientId,
        #[serde(rename = "type")]
        message_type: String,
        payload: Payload,
        target: Option<ClientId>,
    },
    Online {
        client: ClientId,
    },
    Offline {
        client: ClientId,
    },
    Handshake {
        client: ClientId,
        last_message_id: u64,
        retransmit_id: String,
    },
    Disconnect {
        client: ClientId,
    },
}

/// One output line.
#[derive(Serialize)]
struct Frame<'a> {
    room: &'a str,
    #[serde(rename = "type")]
    message_type: &'a str,
    payload: &'a Payload,
}

/// Writes frames to stdout; liveness is driven by `online`/`offline` ops.
struct StdoutTransport {
    out: Mutex<tokio::io::Stdout>,
    live: DashMap<ClientId, bool>,
    timeouts: TransportTimeouts,
}

impl StdoutTransport {
    fn new(timeouts: TransportTimeouts) -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
            live: DashMap::new(),
            timeouts,
        }
    }

    fn set_live(&self, client_id: &str, live: bool) {
        self.live.insert(client_id.to_string(), live);
    }
}

#[async_trait]
impl Transport for StdoutTransport {
    async fn emit(
        &self,
        message_type: &str,
        payload: &Payload,
        room: &str,
    ) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(&Frame {
            room,
            message_type,
            payload,
        })?;
        line.push(b'\n');

        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;
        Ok(())
    }

    fn is_live(&self, client_id: &str) -> bool {
        self.live.get(client_id).is_some_and(|live| *live)
    }

    fn timeouts(&self) -> TransportTimeouts {
        self.timeouts
    }
}

/// Element whose state is the payload it was last given.
struct StaticElement {
    id: ElementId,
    payload: Payload,
}

impl Element for StaticElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn to_payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(self.payload.clone())
    }
}

struct Driver {
    config: Config,
    startup: Startup,
    transport: Arc<StdoutTransport>,
    registry: OutboxRegistry,
    clients: DashMap<ClientId, Arc<ClientHandle>>,
}

impl Driver {
    fn new(config: Config) -> Self {
        let transport = Arc::new(StdoutTransport::new(config.transport.timeouts()));
        Self {
            config,
            startup: Startup::new(),
            transport,
            registry: OutboxRegistry::new(),
            clients: DashMap::new(),
        }
    }

    fn outbox(&self, client_id: &str) -> anyhow::Result<Arc<Outbox>> {
        self.registry
            .get(client_id)
            .with_context(|| format!("unknown client {client_id}"))
    }

    async fn apply(&self, op: Op) -> anyhow::Result<()> {
        match op {
            Op::Connect { client, shared } => {
                let client_id = client.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                self.connect(client_id, shared).await?;
            }
            Op::Update {
                client,
                id,
                payload,
            } => {
                self.outbox(&client)?
                    .enqueue_update(Arc::new(StaticElement { id, payload }))?;
            }
            Op::Delete { client, id } => {
                self.outbox(&client)?.enqueue_delete(id)?;
            }
            Op::Message {
                client,
                message_type,
                payload,
                target,
            } => {
                let target = target.unwrap_or_else(|| client.clone());
                self.outbox(&client)?
                    .enqueue_message(&message_type, payload, &target)?;
            }
            Op::Online { client } => self.transport.set_live(&client, true),
            Op::Offline { client } => self.transport.set_live(&client, false),
            Op::Handshake {
                client,
                last_message_id,
                retransmit_id,
            } => {
                let outbox = self.outbox(&client)?;
                self.transport.set_live(&client, true);
                let request = SyncRequest::new(last_message_id, retransmit_id);
                if !outbox.handle_handshake(&request)? {
                    let payload = serde_json::json!({ "retransmit_id": request.retransmit_id });
                    self.transport.emit("reload", &payload, &client).await?;
                }
            }
            Op::Disconnect { client } => {
                if let Some((_, handle)) = self.clients.remove(&client) {
                    handle.delete();
                }
                self.transport.live.remove(&client);
                if self.registry.remove(&client).is_some() {
                    info!(client = %client, "Client disconnected");
                }
            }
        }
        Ok(())
    }

    async fn connect(&self, client_id: ClientId, shared: bool) -> anyhow::Result<()> {
        if let Some(outbox) = self.registry.get(&client_id) {
            debug!(client = %client_id, "Client already connected");
            self.transport.set_live(&client_id, true);
            let payload = serde_json::json!({ "starting_message_id": outbox.starting_message_id() });
            self.transport.emit("connected", &payload, &client_id).await?;
            return Ok(());
        }

        let sharing = if shared {
            SharingMode::Shared
        } else {
            SharingMode::Single
        };
        let handle = Arc::new(ClientHandle::new(
            client_id.clone(),
            sharing,
            self.config.transport.reconnect_timeout(),
        ));
        let params = OutboxParams::new(handle.clone(), self.transport.clone())
            .with_history(self.config.history.clone())
            .with_delivery(self.config.delivery.clone());
        let outbox = Outbox::new(params, &self.startup);

        self.clients.insert(client_id.clone(), handle);
        self.registry.register(Arc::clone(&outbox));
        self.transport.set_live(&client_id, true);
        info!(client = %client_id, ?sharing, "Client connected");

        let payload = serde_json::json!({ "starting_message_id": outbox.starting_message_id() });
        self.transport.emit("connected", &payload, &client_id).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries frames
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).map_err(|e| {
            error!(path = %path, error = %e, "Failed to load config");
            e
        })?,
        None => Config::default(),
    };

    info!(server = %config.server.name, "Starting resyncd");

    if let Some(port) = config.server.metrics_port {
        metrics::init();
        info!("Metrics initialized");
        tokio::spawn(async move {
            http::run_http_server(port).await;
        });
    } else {
        info!("Metrics disabled");
    }

    let driver = Driver::new(config);
    let started = driver.startup.start();
    debug!(started, "Startup complete");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Op>(line) {
                    Ok(op) => {
                        if let Err(e) = driver.apply(op).await {
                            warn!(error = %e, "Operation failed");
                        }
                    }
                    Err(e) => warn!(error = %e, "Malformed operation"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    // Let pending batches go out before exiting
    tokio::time::sleep(driver.config.delivery.wake_timeout()).await;
    driver.registry.stop_all();
    info!("Shutdown complete");
    Ok(())
}
