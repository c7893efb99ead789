// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD management and idempotent object creation.

pub mod crd;
pub mod objects;

pub use crd::{install_crds, wait_for_crd};
pub use objects::{apiserver_service_ref, create_if_absent, object_ref};
