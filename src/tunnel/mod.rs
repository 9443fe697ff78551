// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Local access to nebula-studio through a port-forward tunnel.

pub mod forward;
pub mod pods;
pub mod signals;

pub use forward::{
    forward, PodConnector, PodPortForward, PortForwardConnector, Upstream, UpstreamStream,
};
pub use pods::{is_pod_running, label_query, wait_for_running_pod};
pub use signals::spawn_shutdown_listener;

use crate::constants::{pod_wait, STUDIO_NAME, STUDIO_PORT};
use crate::error::{Result, StudioError};
use crate::kubernetes::{CoreV1, NamespacedName};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    pub address: IpAddr,
    pub local_port: u16,
    pub pod_port: u16,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            local_port: STUDIO_PORT,
            pod_port: STUDIO_PORT,
            poll_interval: Duration::from_secs(pod_wait::POLL_INTERVAL_SECS),
            poll_timeout: Duration::from_secs(pod_wait::TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelState {
    Idle,
    WaitingForPod,
    /// The local listener is bound and relaying to the named pod
    Forwarding { local: SocketAddr, pod: String },
    Closed,
}

/// A single tunnel from a local port to the studio pod.
///
/// `Idle -> WaitingForPod -> Forwarding -> Closed`; any failure or a stop request goes
/// straight to `Closed`. Observers see the transitions through [`Tunnel::subscribe`],
/// and the switch to `Forwarding` is the ready signal.
pub struct Tunnel<C = PortForwardConnector> {
    core: CoreV1,
    namespace: String,
    config: TunnelConfig,
    connector: C,
    state: watch::Sender<TunnelState>,
}

impl Tunnel {
    /// Tunnel that reaches the pod through the API server's port-forward subresource
    pub fn new(core: CoreV1, namespace: &str, config: TunnelConfig) -> Self {
        let connector = PortForwardConnector::new(core.pods(namespace));
        Self::with_connector(core, namespace, config, connector)
    }
}

impl<C: PodConnector> Tunnel<C> {
    pub fn with_connector(
        core: CoreV1,
        namespace: &str,
        config: TunnelConfig,
        connector: C,
    ) -> Self {
        let (state, _) = watch::channel(TunnelState::Idle);
        Self {
            core,
            namespace: namespace.to_string(),
            config,
            connector,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TunnelState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> TunnelState {
        self.state.borrow().clone()
    }

    /// Find the running pod behind the studio Service's selector
    pub async fn resolve_pod(&self) -> Result<Pod> {
        let name = NamespacedName::new(&self.namespace, STUDIO_NAME);
        let service = self
            .core
            .services(&self.namespace)
            .get(STUDIO_NAME)
            .await
            .map_err(|source| StudioError::ResourceLookupError {
                kind: "Service".to_string(),
                name: name.clone(),
                source,
            })?;

        let selector = service
            .spec
            .and_then(|s| s.selector)
            .unwrap_or_default();
        let query = label_query(&selector).ok_or(StudioError::InvalidSelector(name))?;

        wait_for_running_pod(
            &self.core,
            &self.namespace,
            &query,
            self.config.poll_interval,
            self.config.poll_timeout,
        )
        .await
    }

    /// Wait for the pod, then forward the local port until `stop` is cancelled.
    ///
    /// Cancelling `stop` while the pod is still being waited for ends the run without
    /// binding the local port.
    pub async fn run(&self, stop: CancellationToken) -> Result<()> {
        let result = self.establish(&stop).await;
        self.state.send_replace(TunnelState::Closed);
        result
    }

    async fn establish(&self, stop: &CancellationToken) -> Result<()> {
        self.state.send_replace(TunnelState::WaitingForPod);
        let pod = tokio::select! {
            biased;
            _ = stop.cancelled() => {
                info!("Stop requested while waiting for the nebula-studio pod");
                return Ok(());
            }
            pod = self.resolve_pod() => pod?,
        };
        let pod_name = pod.name_any();

        let bind_addr = SocketAddr::new(self.config.address, self.config.local_port);
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            StudioError::TunnelTransportError(format!("Failed to bind {}: {}", bind_addr, e))
        })?;
        let local = listener.local_addr().map_err(|e| {
            StudioError::TunnelTransportError(format!("Failed to read local address: {}", e))
        })?;

        let upstream = self.connector.connect(&pod_name, self.config.pod_port);
        self.state.send_replace(TunnelState::Forwarding {
            local,
            pod: pod_name.clone(),
        });
        info!(
            "nebula-studio is running on http://localhost:{} (pod {}, port {})",
            local.port(),
            pod_name,
            self.config.pod_port
        );

        forward(listener, &upstream, stop).await
    }
}
