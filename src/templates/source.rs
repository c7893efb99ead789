// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Template resolution and fetching

use crate::constants::templates;
use crate::error::{NestplaneError, Result, TemplateError};
use crate::types::component::ComponentKind;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::Resource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Fetches raw template bytes from a URL
#[async_trait]
pub trait TemplateFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> std::result::Result<String, TemplateError>;
}

/// Fetcher for `http`, `https` and `file` URLs
pub struct UriFetcher {
    http: reqwest::Client,
}

impl UriFetcher {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl TemplateFetcher for UriFetcher {
    async fn fetch(&self, url: &Url) -> std::result::Result<String, TemplateError> {
        let fetch_err = |message: String| TemplateError::Fetch {
            url: url.to_string(),
            message,
        };

        match url.scheme() {
            "http" | "https" => {
                let response = self
                    .http
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| fetch_err(e.to_string()))?;
                response.text().await.map_err(|e| fetch_err(e.to_string()))
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| fetch_err("not a local file path".to_string()))?;
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| fetch_err(e.to_string()))
            }
            other => Err(fetch_err(format!("unsupported scheme '{}'", other))),
        }
    }
}

/// Which of a component's templates to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateTarget {
    Workload,
    Endpoint,
}

impl TemplateTarget {
    /// Kind of the object the template describes
    pub fn resource_kind(self) -> &'static str {
        match self {
            TemplateTarget::Workload => StatefulSet::KIND,
            TemplateTarget::Endpoint => Service::KIND,
        }
    }
}

/// Template paths of one component kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePaths {
    pub workload: String,
    pub endpoint: Option<String>,
}

/// Immutable table of default template paths per component kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTable {
    pub etcd: TemplatePaths,
    pub apiserver: TemplatePaths,
    pub controller_manager: TemplatePaths,
}

impl Default for TemplateTable {
    fn default() -> Self {
        Self {
            etcd: TemplatePaths {
                workload: templates::ETCD_STATEFULSET.to_string(),
                endpoint: Some(templates::ETCD_SERVICE.to_string()),
            },
            apiserver: TemplatePaths {
                workload: templates::APISERVER_STATEFULSET.to_string(),
                endpoint: Some(templates::APISERVER_SERVICE.to_string()),
            },
            controller_manager: TemplatePaths {
                workload: templates::CONTROLLER_MANAGER_STATEFULSET.to_string(),
                endpoint: None,
            },
        }
    }
}

impl TemplateTable {
    pub fn paths(&self, kind: ComponentKind) -> &TemplatePaths {
        match kind {
            ComponentKind::Etcd => &self.etcd,
            ComponentKind::APIServer => &self.apiserver,
            ComponentKind::ControllerManager => &self.controller_manager,
        }
    }
}

/// Resolves component templates against a base location
pub struct TemplateSource {
    base: String,
    table: TemplateTable,
    fetcher: Arc<dyn TemplateFetcher>,
}

impl TemplateSource {
    pub fn new(base: &str, table: TemplateTable, fetcher: Arc<dyn TemplateFetcher>) -> Result<Self> {
        let base = base.trim_end_matches('/').to_string();
        Url::parse(&base).map_err(|e| NestplaneError::InvalidTemplateLocation {
            url: base.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            base,
            table,
            fetcher,
        })
    }

    /// Location of the default template for a component kind
    pub fn template_url(&self, kind: ComponentKind, target: TemplateTarget) -> Result<Url> {
        let paths = self.table.paths(kind);
        let path = match target {
            TemplateTarget::Workload => paths.workload.as_str(),
            TemplateTarget::Endpoint => paths.endpoint.as_deref().ok_or_else(|| {
                NestplaneError::UnreachableKind(format!("{} has no endpoint template", kind))
            })?,
        };

        let raw = format!("{}{}", self.base, path);
        Url::parse(&raw).map_err(|e| NestplaneError::InvalidTemplateLocation {
            url: raw.clone(),
            message: e.to_string(),
        })
    }

    /// Resolve and fetch the template for a component.
    /// Only the default template exists; asking for a version or channel fails.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        kind: ComponentKind,
        target: TemplateTarget,
        version: Option<&str>,
        channel: Option<&str>,
    ) -> Result<String> {
        let is_set = |v: Option<&str>| v.is_some_and(|s| !s.is_empty());
        if is_set(version) || is_set(channel) {
            return Err(NestplaneError::Unimplemented(format!(
                "templates by version/channel for {} (version={:?}, channel={:?})",
                kind, version, channel
            )));
        }

        let url = self.template_url(kind, target)?;
        debug!("Version and channel are not set, using the default template {}", url);
        self.fetcher
            .fetch(&url)
            .await
            .map_err(|e| NestplaneError::from_template(kind, target.resource_kind(), e))
    }
}
