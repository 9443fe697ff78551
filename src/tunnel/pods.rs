// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resolving the pod behind a Service selector

use crate::constants::pod_wait::MIN_POLL_INTERVAL_MILLIS;
use crate::error::{Result, StudioError};
use crate::kubernetes::CoreV1;
use k8s_openapi::api::core::v1::Pod;
use kube::{api::ListParams, Api, ResourceExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, instrument};

/// Equality-based label query for a selector, `None` when the selector is empty
pub fn label_query(selector: &BTreeMap<String, String>) -> Option<String> {
    if selector.is_empty() {
        return None;
    }

    Some(
        selector
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(","),
    )
}

pub fn is_pod_running(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .is_some_and(|phase| phase == "Running")
}

/// Poll until a pod matching `selector` is running, or fail once `limit` has passed.
///
/// The first poll happens immediately; the first running pod found wins. A `poll_interval`
/// below 100ms is raised to 100ms.
#[instrument(skip(core))]
pub async fn wait_for_running_pod(
    core: &CoreV1,
    namespace: &str,
    selector: &str,
    poll_interval: Duration,
    limit: Duration,
) -> Result<Pod> {
    let pods = core.pods(namespace);
    let poll_interval = poll_interval.max(Duration::from_millis(MIN_POLL_INTERVAL_MILLIS));

    match timeout(limit, poll_running_pod(&pods, selector, poll_interval)).await {
        Ok(result) => result,
        Err(_) => Err(StudioError::PodNotReadyError {
            namespace: namespace.to_string(),
            selector: selector.to_string(),
            timeout: limit,
        }),
    }
}

async fn poll_running_pod(pods: &Api<Pod>, selector: &str, poll_interval: Duration) -> Result<Pod> {
    let lp = ListParams::default().labels(selector);
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let pod_list = pods.list(&lp).await?;
        debug!("Found {} pods matching '{}'", pod_list.items.len(), selector);

        if let Some(pod) = pod_list.items.into_iter().find(is_pod_running) {
            info!("pod {} is running", pod.name_any());
            return Ok(pod);
        }

        info!(
            "No running pod matching '{}' yet, checking again in {:?}",
            selector, poll_interval
        );
    }
}
