// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Aggregation of observed workload health into component status

use crate::types::component::{
    is_component_ready, Address, ComponentPhase, NestedComponentStatus,
};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::chrono::{DateTime, Utc};
use std::time::Duration;

/// Derive a component's status from its observed StatefulSet.
///
/// A workload that is not ready yet stays `Creating` until it has been
/// ready before or has exceeded `grace`; after that it is `Unhealthy`.
pub fn aggregate(
    workload: Option<&StatefulSet>,
    endpoint: Option<&Service>,
    previous: Option<&NestedComponentStatus>,
    now: DateTime<Utc>,
    grace: Duration,
) -> NestedComponentStatus {
    let Some(sts) = workload else {
        return NestedComponentStatus::new(ComponentPhase::Pending, vec![], vec![]);
    };

    let addresses = endpoint.map(endpoint_addresses).unwrap_or_default();

    if is_workload_ready(sts) {
        return NestedComponentStatus::new(ComponentPhase::Ready, addresses, vec![]);
    }

    let was_healthy = previous.is_some_and(|s| {
        matches!(s.phase, ComponentPhase::Ready | ComponentPhase::Unhealthy)
    });
    let overdue = sts.metadata.creation_timestamp.as_ref().is_some_and(|created| {
        (now - created.0)
            .to_std()
            .is_ok_and(|age| age > grace)
    });

    let phase = if was_healthy || overdue {
        ComponentPhase::Unhealthy
    } else {
        ComponentPhase::Creating
    };
    NestedComponentStatus::new(phase, addresses, vec![])
}

/// Status recorded after the pipeline failed
pub fn failed(errors: Vec<String>) -> NestedComponentStatus {
    NestedComponentStatus::new(ComponentPhase::Failed, vec![], errors)
}

/// Status recorded right after the component's objects were written
pub fn creating() -> NestedComponentStatus {
    NestedComponentStatus::new(ComponentPhase::Creating, vec![], vec![])
}

/// A StatefulSet is ready once the controller observed its latest spec and
/// every desired replica reports ready
pub fn is_workload_ready(sts: &StatefulSet) -> bool {
    let desired = sts.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
    let Some(status) = sts.status.as_ref() else {
        return false;
    };

    let observed = match (status.observed_generation, sts.metadata.generation) {
        (Some(observed), Some(generation)) => observed >= generation,
        _ => true,
    };

    observed && status.ready_replicas.unwrap_or(0) >= desired
}

/// Addresses a Service exposes: its in-cluster DNS name, cluster IP and first port
pub fn endpoint_addresses(svc: &Service) -> Vec<Address> {
    let (Some(name), Some(spec)) = (svc.metadata.name.as_ref(), svc.spec.as_ref()) else {
        return vec![];
    };
    let Some(port) = spec.ports.as_ref().and_then(|p| p.first()) else {
        return vec![];
    };

    let ip = spec
        .cluster_ip
        .clone()
        .filter(|ip| ip != "None")
        .unwrap_or_default();
    let hostname = match svc.metadata.namespace.as_ref() {
        Some(ns) => format!("{}.{}.svc", name, ns),
        None => name.clone(),
    };

    vec![Address {
        hostname,
        ip,
        port: port.port,
    }]
}

/// A nested cluster is ready when every tier has components and all of them are ready
pub fn cluster_ready(tiers: &[Vec<Option<NestedComponentStatus>>]) -> bool {
    tiers
        .iter()
        .all(|tier| !tier.is_empty() && tier.iter().all(|s| is_component_ready(s.as_ref())))
}
