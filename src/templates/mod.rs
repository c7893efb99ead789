// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Component templates: resolution, rendering and decoding.

pub mod decode;
pub mod render;
pub mod source;

pub use decode::decode;
pub use render::{render, TemplateContext};
pub use source::{TemplateFetcher, TemplateSource, TemplateTable, TemplateTarget, UriFetcher};
