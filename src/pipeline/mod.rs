// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Manifest generation and reconciliation of component workloads.

pub mod engine;
pub mod merge;
pub mod owner;
pub mod status;

pub use engine::{ComponentPipeline, ComponentRequest, GeneratedComponent};
