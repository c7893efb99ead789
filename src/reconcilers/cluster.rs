// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster reconciler - watches NestedCluster resources and marks them ready
//! once every control plane tier reports Ready.

use crate::config::Config;
use crate::constants::labels;
use crate::error::{NestplaneError, Result};
use crate::pipeline::status::cluster_ready;
use crate::types::cluster::NestedCluster;
use crate::types::component::{
    NestedAPIServer, NestedComponent, NestedComponentStatus, NestedControllerManager, NestedEtcd,
};
use futures::StreamExt;
use kube::{
    api::{ListParams, Patch, PatchParams},
    runtime::{controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct NestedClusterReconciler {
    client: Client,
    config: Config,
}

impl NestedClusterReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let clusters: Api<NestedCluster> = Api::all(self.client.clone());
        let context = Arc::new(self);

        Controller::new(clusters, watcher::Config::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled cluster: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(cluster: Arc<NestedCluster>, ctx: Arc<NestedClusterReconciler>) -> Result<Action> {
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_default();

    debug!("Reconciling cluster: {}/{}", namespace, name);

    let selector = format!("{}={}", labels::CLUSTER_NAME, name);
    let tiers = vec![
        tier_statuses::<NestedEtcd>(&ctx.client, &namespace, &selector).await?,
        tier_statuses::<NestedAPIServer>(&ctx.client, &namespace, &selector).await?,
        tier_statuses::<NestedControllerManager>(&ctx.client, &namespace, &selector).await?,
    ];
    let ready = cluster_ready(&tiers);

    if cluster.status.is_none() || cluster.is_ready() != ready {
        let clusters: Api<NestedCluster> = Api::namespaced(ctx.client.clone(), &namespace);
        let patch = serde_json::json!({ "status": { "ready": ready } });
        clusters
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        info!("Cluster {}/{} ready={}", namespace, name, ready);
    }

    // Component health is not watched from here, so keep polling
    Ok(Action::requeue(ctx.config.requeue_interval))
}

/// Statuses of one tier's components labelled with the cluster's name
async fn tier_statuses<C: NestedComponent>(
    client: &Client,
    namespace: &str,
    selector: &str,
) -> Result<Vec<Option<NestedComponentStatus>>> {
    let components: Api<C> = Api::namespaced(client.clone(), namespace);
    let list = components
        .list(&ListParams::default().labels(selector))
        .await?;

    Ok(list
        .items
        .iter()
        .map(|c| c.component_status().cloned())
        .collect())
}

fn error_policy(
    _cluster: Arc<NestedCluster>,
    error: &NestplaneError,
    ctx: Arc<NestedClusterReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(ctx.config.requeue_interval)
}
