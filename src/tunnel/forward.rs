// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Relaying local TCP connections to a pod port

use crate::error::{Result, StudioError};
use futures::future::BoxFuture;
use futures::FutureExt;
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

/// One upstream byte stream plus a future that resolves once the transport behind it is done
pub struct UpstreamStream {
    pub stream: Box<dyn AsyncStream>,
    pub done: BoxFuture<'static, Result<()>>,
}

/// Where accepted local connections are relayed to
pub trait Upstream {
    fn open(&self) -> BoxFuture<'_, Result<UpstreamStream>>;
}

/// Builds the upstream for a pod once it has been resolved
pub trait PodConnector {
    type Upstream: Upstream + Send + Sync;

    fn connect(&self, pod_name: &str, port: u16) -> Self::Upstream;
}

/// Connects to pods in one namespace through the API server's port-forward subresource
#[derive(Clone)]
pub struct PortForwardConnector {
    pods: Api<Pod>,
}

impl PortForwardConnector {
    pub fn new(pods: Api<Pod>) -> Self {
        Self { pods }
    }
}

impl PodConnector for PortForwardConnector {
    type Upstream = PodPortForward;

    fn connect(&self, pod_name: &str, port: u16) -> PodPortForward {
        PodPortForward::new(self.pods.clone(), pod_name, port)
    }
}

/// Port-forward streams into a single pod port
pub struct PodPortForward {
    pods: Api<Pod>,
    pod_name: String,
    port: u16,
}

impl PodPortForward {
    pub fn new(pods: Api<Pod>, pod_name: impl Into<String>, port: u16) -> Self {
        Self {
            pods,
            pod_name: pod_name.into(),
            port,
        }
    }
}

impl Upstream for PodPortForward {
    fn open(&self) -> BoxFuture<'_, Result<UpstreamStream>> {
        async move {
            let mut forwarder = self
                .pods
                .portforward(&self.pod_name, &[self.port])
                .await
                .map_err(|e| {
                    StudioError::TunnelTransportError(format!(
                        "Failed to open port-forward to pod {}: {}",
                        self.pod_name, e
                    ))
                })?;

            let stream = forwarder.take_stream(self.port).ok_or_else(|| {
                StudioError::TunnelTransportError(format!(
                    "Port {} missing from port-forward to pod {}",
                    self.port, self.pod_name
                ))
            })?;

            let pod_name = self.pod_name.clone();
            let done = async move {
                forwarder.join().await.map_err(|e| {
                    StudioError::TunnelTransportError(format!(
                        "Port-forward to pod {} failed: {}",
                        pod_name, e
                    ))
                })
            }
            .boxed();

            Ok(UpstreamStream {
                stream: Box::new(stream),
                done,
            })
        }
        .boxed()
    }
}

/// Accept connections on `listener` and relay each over a fresh upstream stream until `stop`
/// is cancelled.
///
/// Failing to accept or to open an upstream stream ends forwarding with an error. Once a
/// relay is running, errors on its stream or its transport only end that one connection
/// and are logged; the tunnel keeps accepting. The listener and all running relays are
/// released before returning.
#[instrument(skip_all, fields(local = ?listener.local_addr().ok()))]
pub async fn forward<U: Upstream>(
    listener: TcpListener,
    upstream: &U,
    stop: &CancellationToken,
) -> Result<()> {
    let mut relays = JoinSet::new();

    let result = loop {
        tokio::select! {
            _ = stop.cancelled() => {
                info!("Stop requested, closing tunnel");
                break Ok(());
            }
            accepted = listener.accept() => {
                let (conn, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => break Err(StudioError::TunnelTransportError(format!(
                        "Failed to accept local connection: {}", e
                    ))),
                };
                debug!("Accepted connection from {}", peer);

                let opened = tokio::select! {
                    _ = stop.cancelled() => break Ok(()),
                    opened = upstream.open() => opened,
                };
                match opened {
                    Ok(upstream_stream) => {
                        relays.spawn(relay(conn, upstream_stream, peer));
                    }
                    Err(e) => break Err(e),
                }
            }
            Some(joined) = relays.join_next(), if !relays.is_empty() => {
                if let Err(e) = joined {
                    warn!("Relay task failed: {}", e);
                }
            }
        }
    };

    relays.shutdown().await;
    drop(listener);
    result
}

async fn relay(mut conn: TcpStream, upstream: UpstreamStream, peer: SocketAddr) {
    let UpstreamStream { mut stream, done } = upstream;

    match tokio::io::copy_bidirectional(&mut conn, &mut stream).await {
        Ok((sent, received)) => debug!(
            "Connection from {} closed, {} bytes sent, {} bytes received",
            peer, sent, received
        ),
        Err(e) => warn!("Relay for {} failed: {}", peer, e),
    }

    drop(stream);
    if let Err(e) = done.await {
        warn!("{}", e);
    }
}
