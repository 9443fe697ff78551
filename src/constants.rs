// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Namespace used when none is given on the command line
pub const DEFAULT_NAMESPACE: &str = "default";

/// Name shared by the Service, the Deployment and its container
pub const STUDIO_NAME: &str = "nebula-studio";

/// Container image run by the Deployment
pub const STUDIO_IMAGE: &str = "vesoft/nebula-graph-studio";

/// HTTP port of the studio UI, both inside the pod and on the workstation
pub const STUDIO_PORT: u16 = 7001;

/// Label identifying studio resources
pub mod labels {
    pub const APP_KEY: &str = "app";
    pub const APP_VALUE: &str = super::STUDIO_NAME;
}

/// Outbound request pressure on the cluster API
pub mod rate_limit {
    /// Steady requests per second
    pub const QPS: u64 = 100;
    /// Requests allowed in a single burst
    pub const BURST: u64 = 200;
}

/// Pod readiness polling used before opening a tunnel
pub mod pod_wait {
    pub const POLL_INTERVAL_SECS: u64 = 5;
    pub const TIMEOUT_SECS: u64 = 60;
    /// Shorter intervals are raised to this
    pub const MIN_POLL_INTERVAL_MILLIS: u64 = 100;
}
