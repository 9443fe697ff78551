// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster connection configuration and lazily built client handles

use crate::constants::rate_limit::{BURST, QPS};
use crate::error::{Result, StudioError};
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use kube::{
    client::ClientBuilder,
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config as KConfig,
};
use std::path::Path;
use std::time::Duration;
use tokio::sync::OnceCell;
use tower::limit::RateLimitLayer;
use tracing::{debug, info, instrument};

/// Token bucket bounding outbound requests to the cluster API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub qps: u64,
    pub burst: u64,
}

impl RateLimit {
    /// Window in which `burst` requests may be spent while averaging `qps`
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.burst.saturating_mul(1000) / self.qps.max(1))
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            qps: QPS,
            burst: BURST,
        }
    }
}

/// Cluster endpoint, credentials and request rate limit
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub kube: KConfig,
    pub rate_limit: RateLimit,
}

impl ConnectionConfig {
    pub fn new(kube: KConfig) -> Self {
        Self {
            kube,
            rate_limit: RateLimit::default(),
        }
    }

    /// Discover the configuration from KUBECONFIG, ~/.kube/config or the in-cluster environment
    #[instrument]
    pub async fn infer() -> Result<Self> {
        let kube = KConfig::infer().await.map_err(|e| {
            StudioError::ConfigDiscoveryError(format!("Failed to infer config: {}", e))
        })?;
        info!("Discovered cluster configuration for {}", kube.cluster_url);
        Ok(Self::new(kube))
    }

    /// Load the configuration from an explicit kubeconfig file
    pub async fn from_kubeconfig_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            StudioError::ConfigDiscoveryError(format!(
                "Failed to read kubeconfig {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_kubeconfig_str(&raw).await
    }

    /// Build the configuration from the contents of a kubeconfig file
    pub async fn from_kubeconfig_str(kubeconfig: &str) -> Result<Self> {
        let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig).map_err(|e| {
            StudioError::ConfigDiscoveryError(format!("Failed to parse kubeconfig: {}", e))
        })?;

        let kube = KConfig::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                StudioError::ConfigDiscoveryError(format!("Failed to create config: {}", e))
            })?;

        Ok(Self::new(kube))
    }

    /// Build a client whose requests pass through the rate limiter
    fn build_client(&self) -> Result<Client> {
        let builder = ClientBuilder::try_from(self.kube.clone()).map_err(|e| {
            StudioError::ConfigDiscoveryError(format!("Failed to create client: {}", e))
        })?;
        let limiter = RateLimitLayer::new(self.rate_limit.burst, self.rate_limit.window());

        debug!(
            "Creating client for {} limited to {} requests per {:?}",
            self.kube.cluster_url,
            self.rate_limit.burst,
            self.rate_limit.window()
        );
        Ok(builder.with_layer(&limiter).build())
    }
}

/// Typed access to the core/v1 resources this tool touches
#[derive(Clone)]
pub struct CoreV1 {
    client: Client,
}

impl CoreV1 {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }

    pub fn services(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Holds the connection configuration and the client handles derived from it.
///
/// Every handle is built on first use and then reused for the rest of the process.
/// When no configuration was installed through [`ConnectionHolder::set_config`],
/// the first getter runs discovery.
#[derive(Default)]
pub struct ConnectionHolder {
    config: OnceCell<ConnectionConfig>,
    client: OnceCell<Client>,
    core: OnceCell<CoreV1>,
}

impl ConnectionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `config`, or discover one when `None` is given
    pub async fn set_config(&self, config: Option<ConnectionConfig>) -> Result<()> {
        if self.config.initialized() {
            return Err(StudioError::ConfigDiscoveryError(
                "connection is already configured".to_string(),
            ));
        }

        let config = match config {
            Some(config) => config,
            None => ConnectionConfig::infer().await?,
        };

        self.config.set(config).map_err(|_| {
            StudioError::ConfigDiscoveryError("connection is already configured".to_string())
        })
    }

    /// Install an already built client instead of building one from the configuration
    #[cfg(test)]
    pub fn set_client(&self, client: Client) -> Result<()> {
        self.client.set(client).map_err(|_| {
            StudioError::ConfigDiscoveryError("client is already initialized".to_string())
        })
    }

    pub async fn config(&self) -> Result<&ConnectionConfig> {
        self.config.get_or_try_init(ConnectionConfig::infer).await
    }

    /// Generic client, usable with any resource kind through `Api<K>`
    pub async fn client(&self) -> Result<Client> {
        let config = self.config().await?;
        let client = self
            .client
            .get_or_try_init(|| async { config.build_client() })
            .await?;
        Ok(client.clone())
    }

    /// Typed handle for namespaces, services and pods
    pub async fn core_client(&self) -> Result<CoreV1> {
        let client = self.client().await?;
        let core = self
            .core
            .get_or_init(|| async move { CoreV1::new(client) })
            .await;
        Ok(core.clone())
    }

    /// The configuration together with the generic client built from it
    pub async fn connection(&self) -> Result<(&ConnectionConfig, Client)> {
        let client = self.client().await?;
        Ok((self.config().await?, client))
    }
}
