// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcile-or-create provisioning of the studio resources.

pub mod defaults;
pub mod orchestrator;

pub use defaults::{default_deployment, default_service, studio_labels};
pub use orchestrator::{run_create, ProvisionReport, Provisioner};
