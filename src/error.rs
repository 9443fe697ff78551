// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

use crate::kubernetes::NamespacedName;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load cluster configuration: {0}")]
    ConfigDiscoveryError(String),

    #[error("Failed to look up {kind} {name}: {source}")]
    ResourceLookupError {
        kind: String,
        name: NamespacedName,
        #[source]
        source: kube::Error,
    },

    #[error("{kind} {name} already exists")]
    ResourceConflictError {
        kind: String,
        name: NamespacedName,
    },

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("Invalid label selector on service {0}: selector is empty")]
    InvalidSelector(NamespacedName),

    #[error("No running pod matching '{selector}' in namespace {namespace} after {timeout:?}")]
    PodNotReadyError {
        namespace: String,
        selector: String,
        timeout: Duration,
    },

    #[error("Port-forward failed: {0}")]
    TunnelTransportError(String),
}

pub type Result<T> = std::result::Result<T, StudioError>;
