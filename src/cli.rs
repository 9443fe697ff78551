// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command-line arguments

use crate::constants::DEFAULT_NAMESPACE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "studioctl", version, about = "Run nebula-studio on a Kubernetes cluster")]
pub struct Cli {
    /// Kubeconfig file to use instead of the one discovered from the environment
    #[arg(long, global = true, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the nebula-studio service and deployment
    Create(CreateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Local access to nebula-studio
    #[arg(short, long)]
    pub local: bool,

    /// Namespace of nebula-studio
    #[arg(short, long, env = "STUDIO_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,
}
