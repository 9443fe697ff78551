// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::cli::CreateArgs;
use crate::tunnel::TunnelConfig;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Settings for a `create` run
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace the studio resources live in
    pub namespace: String,
    /// Open a tunnel to the studio pod after provisioning
    pub local: bool,
    pub kubeconfig: Option<PathBuf>,
    pub tunnel: TunnelConfig,
}

impl Config {
    /// Build the configuration from the parsed `create` arguments
    pub fn from_args(kubeconfig: Option<PathBuf>, args: &CreateArgs) -> Result<Self> {
        let namespace = args.namespace.trim();
        if namespace.is_empty() {
            bail!("namespace must not be empty");
        }
        if namespace != args.namespace {
            bail!("namespace '{}' has leading or trailing whitespace", args.namespace);
        }

        Ok(Config {
            namespace: args.namespace.clone(),
            local: args.local,
            kubeconfig,
            tunnel: TunnelConfig::default(),
        })
    }
}
