// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client handling, resource access, and namespace management.

pub mod connection;
pub mod namespaces;
pub mod resources;

pub use connection::{ConnectionConfig, ConnectionHolder, CoreV1, RateLimit};
pub use namespaces::ensure_namespace_exists;
pub use resources::{
    DeploymentAccessor, NamespacedName, Provisioned, ResourceAccessor, ServiceAccessor,
};
