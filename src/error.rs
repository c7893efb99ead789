// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::types::component::ComponentKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NestplaneError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Not implemented: {0}")]
    Unimplemented(String),

    #[error("Failed to fetch the {resource} template for {kind} from {url}: {message}")]
    TemplateFetch {
        kind: ComponentKind,
        resource: &'static str,
        url: String,
        message: String,
    },

    #[error("Failed to render the {resource} template for {kind}: {message}")]
    TemplateRender {
        kind: ComponentKind,
        resource: &'static str,
        message: String,
    },

    #[error("Invalid template location {url}: {message}")]
    InvalidTemplateLocation { url: String, message: String },

    #[error("Failed to decode {resource} manifest for {kind}: {message}")]
    Decode {
        kind: ComponentKind,
        resource: &'static str,
        message: String,
    },

    #[error("Invalid manifest for {kind}: {message}")]
    InvalidManifest { kind: ComponentKind, message: String },

    #[error("Invalid owner: {0}")]
    InvalidOwner(String),

    #[error("Unreachable component kind: {0}")]
    UnreachableKind(String),

    #[error("Reconcile of {0} timed out")]
    Timeout(String),
}

impl NestplaneError {
    /// Whether the watch loop should requeue after this error.
    /// Template and schema defects only change when the resource does.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NestplaneError::KubeError(_)
                | NestplaneError::TemplateFetch { .. }
                | NestplaneError::Timeout(_)
        )
    }

    /// Attach the component kind and resource to a template stage failure
    pub fn from_template(kind: ComponentKind, resource: &'static str, err: TemplateError) -> Self {
        match err {
            TemplateError::Fetch { url, message } => NestplaneError::TemplateFetch {
                kind,
                resource,
                url,
                message,
            },
            TemplateError::Render(message) => NestplaneError::TemplateRender {
                kind,
                resource,
                message,
            },
        }
    }
}

/// Failures of the fetch and render stages, before the component they
/// belong to is attached
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("{url}: {message}")]
    Fetch { url: String, message: String },

    #[error("{0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, NestplaneError>;
