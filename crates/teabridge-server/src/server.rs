//! TCP listener

use crate::error::{Result, ServerError};
use crate::session::LdapSession;
use futures::{SinkExt, StreamExt};
use ldap3_server::LdapCodec;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use teabridge_directory::{metrics, DirectoryBridge};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, warn};

/// LDAP server
pub struct LdapServer {
    bridge: Arc<DirectoryBridge>,
    listen_address: String,
}

impl LdapServer {
    pub fn new(bridge: Arc<DirectoryBridge>, listen_address: impl Into<String>) -> Self {
        Self {
            bridge,
            listen_address: listen_address.into(),
        }
    }

    /// Serve until the process exits
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves. Connections already open are left
    /// to finish on their own.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(&self.listen_address)
            .await
            .map_err(|source| ServerError::Bind {
                address: self.listen_address.clone(),
                source,
            })?;

        self.serve(listener, shutdown).await
    }

    /// Accept connections from an already bound listener
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("LDAP server listening on ldap://{}", listener.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("LDAP server shutting down");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };

                    let bridge = self.bridge.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, peer_addr, bridge).await;
                    });
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, bridge: Arc<DirectoryBridge>) {
    debug!(peer = %peer_addr, "Connection opened");
    metrics::connection_opened();

    let (reader, writer) = stream.into_split();
    let mut requests = FramedRead::new(reader, LdapCodec);
    let mut responses = FramedWrite::new(writer, LdapCodec);
    let mut session = LdapSession::new(bridge);

    'requests: while let Some(msg) = requests.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!(peer = %peer_addr, error = ?e, "Invalid LDAP message");
                break;
            }
        };

        let Some(replies) = session.handle_message(msg).await else {
            break;
        };
        for reply in replies {
            if let Err(e) = responses.send(reply).await {
                warn!(peer = %peer_addr, error = ?e, "Failed to send LDAP response");
                break 'requests;
            }
        }
    }

    session.close().await;
    metrics::connection_closed();
    debug!(peer = %peer_addr, "Connection closed");
}
