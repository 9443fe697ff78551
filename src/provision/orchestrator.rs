// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ensures the namespace, Service and Deployment exist, then optionally opens the tunnel.

use crate::config::Config;
use crate::error::Result;
use crate::kubernetes::{
    ensure_namespace_exists, ConnectionHolder, DeploymentAccessor, Provisioned, ServiceAccessor,
};
use crate::provision::defaults::{
    default_deployment, default_service, deployment_name, service_name,
};
use crate::tunnel::{spawn_shutdown_listener, Tunnel};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// What each step of a provisioning run found or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionReport {
    pub namespace: Provisioned,
    pub service: Provisioned,
    pub deployment: Provisioned,
}

impl ProvisionReport {
    pub fn created_count(&self) -> usize {
        [self.namespace, self.service, self.deployment]
            .iter()
            .filter(|p| **p == Provisioned::Created)
            .count()
    }
}

pub struct Provisioner {
    client: Client,
    services: ServiceAccessor,
    deployments: DeploymentAccessor,
}

impl Provisioner {
    pub fn new(client: Client) -> Self {
        Self {
            services: ServiceAccessor::new(client.clone()),
            deployments: DeploymentAccessor::new(client.clone()),
            client,
        }
    }

    pub async fn ensure_namespace(&self, namespace: &str) -> Result<Provisioned> {
        ensure_namespace_exists(&self.client, namespace).await
    }

    #[instrument(skip(self))]
    pub async fn ensure_service(&self, namespace: &str) -> Result<Provisioned> {
        let name = service_name(namespace);
        if self.services.get_by_namespaced_name(&name).await?.is_some() {
            return Ok(Provisioned::Existing);
        }

        info!("create service, Namespace: {}, Name: {}", name.namespace, name.name);
        self.services.create(&default_service(namespace)).await?;
        Ok(Provisioned::Created)
    }

    #[instrument(skip(self))]
    pub async fn ensure_deployment(&self, namespace: &str) -> Result<Provisioned> {
        let name = deployment_name(namespace);
        if self.deployments.get_by_namespaced_name(&name).await?.is_some() {
            return Ok(Provisioned::Existing);
        }

        info!("create deployment, Namespace: {}, Name: {}", name.namespace, name.name);
        self.deployments.create(&default_deployment(namespace)).await?;
        Ok(Provisioned::Created)
    }

    /// Run the ensure steps in order, stopping at the first failure.
    ///
    /// Nothing is rolled back on failure; running again picks up where the
    /// previous run stopped because every create is preceded by a lookup.
    pub async fn provision(&self, namespace: &str) -> Result<ProvisionReport> {
        let namespace_outcome = self.ensure_namespace(namespace).await?;
        let service = self.ensure_service(namespace).await?;
        let deployment = self.ensure_deployment(namespace).await?;

        Ok(ProvisionReport {
            namespace: namespace_outcome,
            service,
            deployment,
        })
    }
}

/// The `create` command: provision, then forward a local port if requested.
///
/// SIGINT and SIGTERM are only intercepted while the tunnel runs; until then they keep
/// their default behaviour. Cancelling `stop` also ends the tunnel.
pub async fn run_create(
    connection: &ConnectionHolder,
    config: &Config,
    stop: &CancellationToken,
) -> Result<ProvisionReport> {
    let provisioner = Provisioner::new(connection.client().await?);
    let report = provisioner.provision(&config.namespace).await?;

    info!(
        "nebula-studio provisioned in namespace {}: namespace {}, service {}, deployment {}",
        config.namespace, report.namespace, report.service, report.deployment
    );

    if config.local {
        let tunnel = Tunnel::new(
            connection.core_client().await?,
            &config.namespace,
            config.tunnel.clone(),
        );
        let stop = stop.child_token();
        let signals = spawn_shutdown_listener(stop.clone());

        let result = tunnel.run(stop.clone()).await;

        stop.cancel();
        if let Err(e) = signals.await {
            warn!("Shutdown listener failed: {}", e);
        }
        result?;
    }

    Ok(report)
}
