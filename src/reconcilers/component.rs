// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Component reconciler - watches one component custom resource kind and the
//! StatefulSets it owns, and records the outcome in the component's status.

use crate::config::Config;
use crate::error::{NestplaneError, Result};
use crate::pipeline::owner::{cluster_name, control_plane_name};
use crate::pipeline::status::failed;
use crate::pipeline::{ComponentPipeline, ComponentRequest};
use crate::templates::TemplateSource;
use crate::types::component::{ComponentPhase, NestedComponent, NestedComponentStatus};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use kube::{
    api::{Patch, PatchParams},
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

pub struct ComponentReconciler<C> {
    client: Client,
    pipeline: ComponentPipeline,
    config: Config,
    _component: PhantomData<fn() -> C>,
}

impl<C: NestedComponent> ComponentReconciler<C> {
    pub fn new(client: Client, source: Arc<TemplateSource>, config: Config) -> Self {
        Self {
            pipeline: ComponentPipeline::new(client.clone(), source),
            client,
            config,
            _component: PhantomData,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let components: Api<C> = Api::all(self.client.clone());
        let statefulsets: Api<StatefulSet> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(components, WatcherConfig::default())
            .owns(statefulsets, WatcherConfig::default())
            .run(reconcile::<C>, error_policy::<C>, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled {}: {:?}", C::KIND, o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile<C: NestedComponent>(
    component: Arc<C>,
    ctx: Arc<ComponentReconciler<C>>,
) -> Result<Action> {
    let name = component.name_any();
    let namespace = component.namespace().unwrap_or_default();
    let meta = component.meta();
    let control_plane = control_plane_name(meta);
    let cluster = cluster_name(meta, &control_plane);

    debug!("Reconciling {} {}/{}", C::KIND, namespace, name);

    let request = ComponentRequest {
        spec: component.component_spec(),
        owner: meta,
        kind: C::KIND,
        control_plane_name: &control_plane,
        cluster_name: &cluster,
    };
    let previous = component.component_status();

    let outcome = timeout(
        ctx.config.reconcile_timeout,
        ctx.pipeline
            .reconcile(&request, previous, ctx.config.unhealthy_grace),
    )
    .await
    .unwrap_or_else(|_| {
        Err(NestplaneError::Timeout(format!(
            "{} {}/{}",
            C::KIND,
            namespace,
            name
        )))
    });

    let components: Api<C> = Api::namespaced(ctx.client.clone(), &namespace);
    match outcome {
        Ok(status) => {
            update_status(&components, &name, previous, &status).await?;
            Ok(next_action(&status, &ctx.config))
        }
        Err(e) => {
            let status = failed(vec![e.to_string()]);
            if let Err(status_err) = update_status(&components, &name, previous, &status).await {
                warn!(
                    "Failed to record error status for {} {}/{}: {}",
                    C::KIND,
                    namespace,
                    name,
                    status_err
                );
            }
            Err(e)
        }
    }
}

/// Replace the component's status unless it is unchanged
async fn update_status<C: NestedComponent>(
    api: &Api<C>,
    name: &str,
    previous: Option<&NestedComponentStatus>,
    status: &NestedComponentStatus,
) -> Result<()> {
    if previous == Some(status) {
        debug!("Status of {} {} unchanged", C::KIND, name);
        return Ok(());
    }

    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    info!("{} {} is {:?}", C::KIND, name, status.phase);
    Ok(())
}

/// Ready components wait for their StatefulSet to change; others are polled
fn next_action(status: &NestedComponentStatus, config: &Config) -> Action {
    match status.phase {
        ComponentPhase::Ready => Action::await_change(),
        ComponentPhase::Pending
        | ComponentPhase::Creating
        | ComponentPhase::Unhealthy
        | ComponentPhase::Failed => Action::requeue(config.requeue_interval),
    }
}

fn error_policy<C: NestedComponent>(
    component: Arc<C>,
    error: &NestplaneError,
    ctx: Arc<ComponentReconciler<C>>,
) -> Action {
    error!(
        "Reconciliation error for {} {}: {}",
        C::KIND,
        component.name_any(),
        error
    );
    if error.is_retryable() {
        Action::requeue(ctx.config.requeue_interval)
    } else {
        Action::await_change()
    }
}
