// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Point lookups and writes for namespaced resources

use crate::error::{Result, StudioError};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service};
use k8s_openapi::NamespaceResourceScope;
use kube::{api::PostParams, Api, Client, Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, info, instrument};

/// Identity of a namespaced resource within its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of an existing object, if it carries both a namespace and a name
    pub fn of<K: Resource>(obj: &K) -> Option<Self> {
        Some(Self::new(obj.meta().namespace.clone()?, obj.meta().name.clone()?))
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Outcome of an ensure step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// The resource was already present and left untouched
    Existing,
    /// The resource was absent and has been created
    Created,
}

impl fmt::Display for Provisioned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provisioned::Existing => write!(f, "existing"),
            Provisioned::Created => write!(f, "created"),
        }
    }
}

/// Get, create and replace objects of kind `K`.
///
/// A missing object is reported as `Ok(None)` by [`ResourceAccessor::get_by_namespaced_name`],
/// every other API failure is an error.
pub struct ResourceAccessor<K> {
    client: Client,
    _kind: PhantomData<K>,
}

pub type ServiceAccessor = ResourceAccessor<Service>;
pub type DeploymentAccessor = ResourceAccessor<Deployment>;

impl<K> ResourceAccessor<K>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + fmt::Debug,
    K::DynamicType: Default,
{
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn kind() -> String {
        K::kind(&K::DynamicType::default()).into_owned()
    }

    fn api(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn identity(obj: &K) -> Result<NamespacedName> {
        NamespacedName::of(obj).ok_or_else(|| {
            StudioError::InvalidResource(format!(
                "{} '{}' has no namespace or name",
                Self::kind(),
                obj.name_any()
            ))
        })
    }

    #[instrument(skip(self), fields(kind = %Self::kind(), name = %name))]
    pub async fn get_by_namespaced_name(&self, name: &NamespacedName) -> Result<Option<K>> {
        match self.api(&name.namespace).get(&name.name).await {
            Ok(obj) => {
                debug!("{} {} found", Self::kind(), name);
                Ok(Some(obj))
            }
            Err(kube::Error::Api(err)) if err.code == 404 => {
                info!("{} not found, Namespace: {}, Name: {}", Self::kind(), name.namespace, name.name);
                Ok(None)
            }
            Err(source) => Err(StudioError::ResourceLookupError {
                kind: Self::kind(),
                name: name.clone(),
                source,
            }),
        }
    }

    /// Submit `obj` as-is. An existing object with the same identity is a conflict.
    #[instrument(skip(self, obj), fields(kind = %Self::kind(), name = %obj.name_any()))]
    pub async fn create(&self, obj: &K) -> Result<()> {
        let name = Self::identity(obj)?;

        match self.api(&name.namespace).create(&PostParams::default(), obj).await {
            Ok(_) => {
                info!("Created {} {}", Self::kind(), name);
                Ok(())
            }
            Err(kube::Error::Api(err)) if err.code == 409 => {
                Err(StudioError::ResourceConflictError {
                    kind: Self::kind(),
                    name,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the stored object with `obj`
    // TODO: compare against the live object and skip the write when nothing changed
    #[instrument(skip(self, obj), fields(kind = %Self::kind(), name = %obj.name_any()))]
    pub async fn update(&self, obj: &K) -> Result<()> {
        let name = Self::identity(obj)?;

        self.api(&name.namespace)
            .replace(&name.name, &PostParams::default(), obj)
            .await?;
        info!("Replaced {} {}", Self::kind(), name);
        Ok(())
    }
}
