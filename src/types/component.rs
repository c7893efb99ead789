// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Component custom resources: NestedEtcd, NestedAPIServer and NestedControllerManager.

use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::NamespaceResourceScope;
use kube::{CustomResource, Resource};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The control-plane tier a component custom resource describes
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, JsonSchema)]
pub enum ComponentKind {
    Etcd,
    APIServer,
    ControllerManager,
}

impl ComponentKind {
    /// Kind of the custom resource declaring this component
    pub fn resource_kind(self) -> &'static str {
        match self {
            ComponentKind::Etcd => "NestedEtcd",
            ComponentKind::APIServer => "NestedAPIServer",
            ComponentKind::ControllerManager => "NestedControllerManager",
        }
    }

    /// Whether the component gets a Service in front of its StatefulSet
    pub fn has_endpoint(self) -> bool {
        match self {
            ComponentKind::Etcd | ComponentKind::APIServer => true,
            ComponentKind::ControllerManager => false,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_kind())
    }
}

/// Desired state shared by all component custom resources
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NestedComponentSpec {
    /// Component version used to select a template; only the default template is supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Release channel used to select a template; only the default template is supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Replica count; unset or zero keeps the template default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0))]
    pub replicas: Option<i32>,
    /// Resource bounds applied to every container of the workload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    /// Patches held for the rendered workload; not applied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(schema_with = "patch_list_schema")]
    pub patches: Vec<serde_json::Value>,
}

fn patch_list_schema(_: &mut SchemaGenerator) -> Schema {
    serde_json::from_value(serde_json::json!({
        "type": "array",
        "items": {
            "type": "object",
            "x-kubernetes-preserve-unknown-fields": true
        }
    }))
    .unwrap_or(Schema::Bool(true))
}

/// Lifecycle phase of a component
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum ComponentPhase {
    #[default]
    Pending,
    Creating,
    Ready,
    Unhealthy,
    Failed,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub hostname: String,
    pub ip: String,
    pub port: i32,
}

/// Observed state shared by all component custom resources.
/// Always written as a whole, never merged with a previous value.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NestedComponentStatus {
    #[serde(default)]
    pub phase: ComponentPhase,
    pub healthy: bool,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl NestedComponentStatus {
    pub fn new(phase: ComponentPhase, addresses: Vec<Address>, errors: Vec<String>) -> Self {
        Self {
            phase,
            healthy: phase == ComponentPhase::Ready,
            addresses,
            errors,
        }
    }
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "controlplane.cluster.x-k8s.io",
    version = "v1alpha4",
    kind = "NestedEtcd",
    namespaced,
    status = "NestedComponentStatus",
    shortname = "netcd",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct NestedEtcdSpec {
    #[serde(flatten)]
    pub component: NestedComponentSpec,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "controlplane.cluster.x-k8s.io",
    version = "v1alpha4",
    kind = "NestedAPIServer",
    namespaced,
    status = "NestedComponentStatus",
    shortname = "nkas",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct NestedAPIServerSpec {
    #[serde(flatten)]
    pub component: NestedComponentSpec,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "controlplane.cluster.x-k8s.io",
    version = "v1alpha4",
    kind = "NestedControllerManager",
    namespaced,
    status = "NestedComponentStatus",
    shortname = "nkcm",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct NestedControllerManagerSpec {
    #[serde(flatten)]
    pub component: NestedComponentSpec,
}

/// Common view over the component custom resources so one reconciler serves all three
pub trait NestedComponent:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: ComponentKind;

    fn component_spec(&self) -> &NestedComponentSpec;

    fn component_status(&self) -> Option<&NestedComponentStatus>;
}

macro_rules! impl_nested_component {
    ($resource:ty, $kind:expr) => {
        impl NestedComponent for $resource {
            const KIND: ComponentKind = $kind;

            fn component_spec(&self) -> &NestedComponentSpec {
                &self.spec.component
            }

            fn component_status(&self) -> Option<&NestedComponentStatus> {
                self.status.as_ref()
            }
        }
    };
}

impl_nested_component!(NestedEtcd, ComponentKind::Etcd);
impl_nested_component!(NestedAPIServer, ComponentKind::APIServer);
impl_nested_component!(NestedControllerManager, ComponentKind::ControllerManager);

/// Check if a component has reached the Ready phase
pub fn is_component_ready(status: Option<&NestedComponentStatus>) -> bool {
    status.is_some_and(|s| s.phase == ComponentPhase::Ready)
}
