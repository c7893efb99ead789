// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Applies a component's overrides to its rendered StatefulSet

use crate::constants::etcd::{INITIAL_CLUSTER_FLAG, PEER_PORT};
use crate::error::{NestplaneError, Result};
use crate::templates::TemplateContext;
use crate::types::component::{ComponentKind, NestedComponentSpec};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::ResourceRequirements;
use tracing::debug;

/// Merge the component spec into the StatefulSet in place.
///
/// - resource bounds, when any are set, replace those of every container
/// - a non-zero replica count replaces the template default
/// - etcd gets `--initial-cluster` with one peer per replica
///
/// Patches are carried by `NestedComponentSpec` but not applied.
pub fn merge(
    sts: &mut StatefulSet,
    spec: &NestedComponentSpec,
    kind: ComponentKind,
    ctx: &TemplateContext,
) -> Result<()> {
    let sts_spec = sts.spec.get_or_insert_with(Default::default);

    if let Some(bounds) = spec.resources.as_ref().filter(|r| has_bounds(r)) {
        if let Some(pod) = sts_spec.template.spec.as_mut() {
            for container in pod.containers.iter_mut() {
                container.resources = Some(bounds.clone());
            }
        }
    }

    if let Some(replicas) = spec.replicas.filter(|r| *r != 0) {
        sts_spec.replicas = Some(replicas);
    }

    match kind {
        ComponentKind::Etcd => {
            let peers = sts_spec.replicas.unwrap_or(1).max(1);
            let initial_cluster =
                initial_cluster_peers(&ctx.cluster_name, &ctx.component_namespace, peers);

            let container = sts_spec
                .template
                .spec
                .as_mut()
                .and_then(|pod| pod.containers.first_mut())
                .ok_or_else(|| NestplaneError::InvalidManifest {
                    kind,
                    message: "StatefulSet has no containers to bootstrap".to_string(),
                })?;
            set_initial_cluster(container.args.get_or_insert_with(Vec::new), initial_cluster);
            debug!("The '{}' command line option is set", INITIAL_CLUSTER_FLAG);
        }
        ComponentKind::APIServer | ComponentKind::ControllerManager => {}
    }

    if !spec.patches.is_empty() {
        debug!(
            "{} patches declared for {}, patch application is not supported",
            spec.patches.len(),
            kind
        );
    }

    Ok(())
}

fn has_bounds(resources: &ResourceRequirements) -> bool {
    resources.limits.as_ref().is_some_and(|m| !m.is_empty())
        || resources.requests.as_ref().is_some_and(|m| !m.is_empty())
}

/// Bootstrap peer list for an etcd cluster of `replicas` members
pub fn initial_cluster_peers(cluster_name: &str, namespace: &str, replicas: i32) -> String {
    (0..replicas)
        .map(|i| {
            format!(
                "{cluster}-{i}=https://{cluster}-{i}.{cluster}-etcd.{namespace}.svc:{port}",
                cluster = cluster_name,
                i = i,
                namespace = namespace,
                port = PEER_PORT
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Replace any existing `--initial-cluster` value so the flag appears once
fn set_initial_cluster(args: &mut Vec<String>, value: String) {
    let mut kept = Vec::with_capacity(args.len() + 2);
    let mut iter = args.drain(..);
    while let Some(arg) = iter.next() {
        if arg == INITIAL_CLUSTER_FLAG {
            iter.next();
            continue;
        }
        if arg.starts_with(&format!("{}=", INITIAL_CLUSTER_FLAG)) {
            continue;
        }
        kept.push(arg);
    }
    drop(iter);

    kept.push(INITIAL_CLUSTER_FLAG.to_string());
    kept.push(value);
    *args = kept;
}
