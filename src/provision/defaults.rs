// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fixed-shape nebula-studio Service and Deployment

use crate::constants::{labels, STUDIO_IMAGE, STUDIO_NAME, STUDIO_PORT};
use crate::kubernetes::NamespacedName;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// Labels carried by every studio object. The Service selector and the pod
/// template both come from here, so the Service always routes to the pods.
pub fn studio_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(labels::APP_KEY.to_string(), labels::APP_VALUE.to_string())])
}

pub fn service_name(namespace: &str) -> NamespacedName {
    NamespacedName::new(namespace, STUDIO_NAME)
}

pub fn deployment_name(namespace: &str) -> NamespacedName {
    NamespacedName::new(namespace, STUDIO_NAME)
}

fn studio_metadata(namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(STUDIO_NAME.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(studio_labels()),
        ..Default::default()
    }
}

/// ClusterIP Service exposing the studio HTTP port
pub fn default_service(namespace: &str) -> Service {
    Service {
        metadata: studio_metadata(namespace),
        spec: Some(ServiceSpec {
            selector: Some(studio_labels()),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: i32::from(STUDIO_PORT),
                ..Default::default()
            }]),
            type_: Some("ClusterIP".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Single-replica Deployment running the studio image
pub fn default_deployment(namespace: &str) -> Deployment {
    Deployment {
        metadata: studio_metadata(namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(studio_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(studio_labels()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: STUDIO_NAME.to_string(),
                        image: Some(STUDIO_IMAGE.to_string()),
                        image_pull_policy: Some("IfNotPresent".to_string()),
                        ports: Some(vec![ContainerPort {
                            name: Some("http".to_string()),
                            container_port: i32::from(STUDIO_PORT),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
