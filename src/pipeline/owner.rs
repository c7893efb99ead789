// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ownership of generated objects and owner lookups

use crate::constants::{labels, CONTROLPLANE_GROUP, CONTROLPLANE_VERSION, CONTROL_PLANE_KIND};
use crate::error::{NestplaneError, Result};
use crate::types::component::ComponentKind;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use kube::Resource;

fn controlplane_api_version() -> String {
    format!("{}/{}", CONTROLPLANE_GROUP, CONTROLPLANE_VERSION)
}

/// Controller reference pointing at the component custom resource
pub fn owner_reference(meta: &ObjectMeta, kind: ComponentKind) -> Result<OwnerReference> {
    let name = meta
        .name
        .clone()
        .ok_or_else(|| NestplaneError::InvalidOwner(format!("{} has no name", kind)))?;
    let uid = meta.uid.clone().ok_or_else(|| {
        NestplaneError::InvalidOwner(format!("{} {} has no uid", kind, name))
    })?;

    Ok(OwnerReference {
        api_version: controlplane_api_version(),
        kind: kind.resource_kind().to_string(),
        name,
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

/// Make `owner` the only owner of `obj`
pub fn bind<K: Resource>(obj: &mut K, owner: OwnerReference) {
    obj.meta_mut().owner_references = Some(vec![owner]);
}

/// Owner reference of the NestedControlPlane a component belongs to, if any
pub fn control_plane_owner(meta: &ObjectMeta) -> Option<&OwnerReference> {
    let api_version = controlplane_api_version();
    meta.owner_references
        .as_ref()?
        .iter()
        .find(|owner| owner.api_version == api_version && owner.kind == CONTROL_PLANE_KIND)
}

/// Name of the owning control plane, or the component's own name when it has none
pub fn control_plane_name(meta: &ObjectMeta) -> String {
    control_plane_owner(meta)
        .map(|owner| owner.name.clone())
        .or_else(|| meta.name.clone())
        .unwrap_or_default()
}

/// Cluster a component belongs to, from its cluster-name label
pub fn cluster_name(meta: &ObjectMeta, control_plane_name: &str) -> String {
    meta.labels
        .as_ref()
        .and_then(|l| l.get(labels::CLUSTER_NAME))
        .cloned()
        .unwrap_or_else(|| control_plane_name.to_string())
}
