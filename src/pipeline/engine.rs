// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generates a component's StatefulSet and Service and writes them to the cluster.
//!
//! Objects are only ever created. An object that already exists, whether
//! seen through a lookup or a 409 on create, is left as it is so fields scaled
//! by someone else are never overwritten.

use crate::error::{NestplaneError, Result};
use crate::kubernetes::create_if_absent;
use crate::pipeline::merge::merge;
use crate::pipeline::owner::{bind, owner_reference};
use crate::pipeline::status::{aggregate, creating};
use crate::templates::{decode, render, TemplateContext, TemplateSource, TemplateTarget};
use crate::types::component::{ComponentKind, NestedComponentSpec, NestedComponentStatus};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::chrono::Utc;
use kube::api::ObjectMeta;
use kube::{Api, Client, Resource, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Everything the pipeline needs to know about one component
#[derive(Debug, Clone, Copy)]
pub struct ComponentRequest<'a> {
    pub spec: &'a NestedComponentSpec,
    pub owner: &'a ObjectMeta,
    pub kind: ComponentKind,
    pub control_plane_name: &'a str,
    pub cluster_name: &'a str,
}

impl ComponentRequest<'_> {
    pub fn context(&self) -> TemplateContext {
        TemplateContext::new(self.owner, self.control_plane_name, self.cluster_name)
    }

    fn namespace(&self) -> Result<&str> {
        self.owner.namespace.as_deref().ok_or_else(|| {
            NestplaneError::InvalidOwner(format!("{} has no namespace", self.kind))
        })
    }
}

/// Objects generated for one component, not yet written
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedComponent {
    pub workload: StatefulSet,
    pub endpoint: Option<Service>,
}

pub struct ComponentPipeline {
    client: Client,
    source: Arc<TemplateSource>,
}

impl ComponentPipeline {
    pub fn new(client: Client, source: Arc<TemplateSource>) -> Self {
        Self { client, source }
    }

    /// Resolve, render, decode, merge and bind the component's StatefulSet
    pub async fn generate_workload(&self, request: &ComponentRequest<'_>) -> Result<StatefulSet> {
        let kind = request.kind;
        let mut sts: StatefulSet = self.generate(request, TemplateTarget::Workload).await?;

        merge(&mut sts, request.spec, kind, &request.context())?;
        debug!("The {} StatefulSet's resources and replicas are set", kind);

        bind(&mut sts, owner_reference(request.owner, kind)?);
        Ok(sts)
    }

    /// Resolve, render, decode and bind the component's Service.
    /// Components without an endpoint get `None`.
    pub async fn generate_endpoint(
        &self,
        request: &ComponentRequest<'_>,
    ) -> Result<Option<Service>> {
        if !request.kind.has_endpoint() {
            return Ok(None);
        }

        let mut svc: Service = self.generate(request, TemplateTarget::Endpoint).await?;
        bind(&mut svc, owner_reference(request.owner, request.kind)?);
        Ok(Some(svc))
    }

    async fn generate<K>(&self, request: &ComponentRequest<'_>, target: TemplateTarget) -> Result<K>
    where
        K: k8s_openapi::Resource + Resource + serde::de::DeserializeOwned,
    {
        let template = self
            .source
            .resolve(
                request.kind,
                target,
                request.spec.version.as_deref(),
                request.spec.channel.as_deref(),
            )
            .await?;
        let manifest = render(&request.context(), &template)
            .map_err(|e| NestplaneError::from_template(request.kind, K::KIND, e))?;
        let mut obj: K = decode(&manifest, request.kind)?;
        debug!("Deserialized {} manifest for {}", K::KIND, request.kind);

        // owner references only resolve within the owner's namespace
        obj.meta_mut().namespace = Some(request.namespace()?.to_string());
        Ok(obj)
    }

    /// Generate all of the component's objects before anything is written
    pub async fn generate_all(&self, request: &ComponentRequest<'_>) -> Result<GeneratedComponent> {
        let workload = self.generate_workload(request).await?;
        let endpoint = self.generate_endpoint(request).await?;
        Ok(GeneratedComponent { workload, endpoint })
    }

    /// Generate and create the component's objects, Service first.
    /// Objects that already exist count as created.
    #[instrument(skip(self, request), fields(kind = %request.kind, component = ?request.owner.name))]
    pub async fn create_component(&self, request: &ComponentRequest<'_>) -> Result<()> {
        let generated = self.generate_all(request).await?;
        self.write(request.namespace()?, generated).await
    }

    async fn write(&self, namespace: &str, generated: GeneratedComponent) -> Result<()> {
        if let Some(svc) = generated.endpoint {
            let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
            create_if_absent(&services, &svc).await?;
            info!("Service for the StatefulSet is in place");
        }

        let statefulsets: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        create_if_absent(&statefulsets, &generated.workload).await?;
        Ok(())
    }

    /// One reconcile pass: create the component when its StatefulSet is
    /// missing, otherwise report the health of the existing one.
    #[instrument(skip(self, request, previous), fields(kind = %request.kind, component = ?request.owner.name))]
    pub async fn reconcile(
        &self,
        request: &ComponentRequest<'_>,
        previous: Option<&NestedComponentStatus>,
        grace: Duration,
    ) -> Result<NestedComponentStatus> {
        let namespace = request.namespace()?;
        let generated = self.generate_all(request).await?;
        let name = generated.workload.metadata.name.clone().ok_or_else(|| {
            NestplaneError::InvalidManifest {
                kind: request.kind,
                message: "StatefulSet has no name".to_string(),
            }
        })?;

        let statefulsets: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        let Some(existing) = statefulsets.get_opt(&name).await? else {
            info!("StatefulSet {}/{} not found, creating", namespace, name);
            self.write(namespace, generated).await?;
            return Ok(creating());
        };

        let endpoint = match generated.endpoint {
            Some(svc) => Some(self.ensure_endpoint(namespace, svc).await?),
            None => None,
        };

        Ok(aggregate(
            Some(&existing),
            endpoint.as_ref(),
            previous,
            Utc::now(),
            grace,
        ))
    }

    /// The component's Service as stored, recreated from `generated` when it
    /// has gone missing
    async fn ensure_endpoint(&self, namespace: &str, generated: Service) -> Result<Service> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let name = generated.name_any();

        if let Some(existing) = services.get_opt(&name).await? {
            return Ok(existing);
        }

        info!("Service {}/{} not found, recreating", namespace, name);
        create_if_absent(&services, &generated).await?;
        Ok(generated)
    }
}
