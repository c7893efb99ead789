// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// API group and version of the component custom resources
pub const CONTROLPLANE_GROUP: &str = "controlplane.cluster.x-k8s.io";
pub const CONTROLPLANE_VERSION: &str = "v1alpha4";

/// API group of the NestedCluster custom resource
pub const INFRASTRUCTURE_GROUP: &str = "infrastructure.cluster.x-k8s.io";

/// Kind of the resource that owns the component custom resources
pub const CONTROL_PLANE_KIND: &str = "NestedControlPlane";

/// The operator name used for server-side apply
pub const OPERATOR_NAME: &str = "nestplane";

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 2;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 30;
}

/// Kubernetes label keys used by the operator
pub mod labels {
    /// Name of the cluster a component belongs to
    pub const CLUSTER_NAME: &str = "cluster.x-k8s.io/cluster-name";
}

/// Default template locations, relative to the template base path
pub mod templates {
    pub const DEFAULT_BASE: &str =
        "https://raw.githubusercontent.com/kubernetes-sigs/cluster-api-provider-nested/main/config/component-templates";
    pub const ETCD_STATEFULSET: &str = "/nested-etcd/nested-etcd-statefulset-template.yaml";
    pub const ETCD_SERVICE: &str = "/nested-etcd/nested-etcd-service-template.yaml";
    pub const APISERVER_STATEFULSET: &str =
        "/nested-apiserver/nested-apiserver-statefulset-template.yaml";
    pub const APISERVER_SERVICE: &str = "/nested-apiserver/nested-apiserver-service-template.yaml";
    pub const CONTROLLER_MANAGER_STATEFULSET: &str =
        "/nested-controllermanager/nested-controllermanager-statefulset-template.yaml";
}

/// etcd bootstrap settings
pub mod etcd {
    /// Port etcd members use for peer traffic
    pub const PEER_PORT: u16 = 2380;
    pub const INITIAL_CLUSTER_FLAG: &str = "--initial-cluster";
}

/// Defaults for the operator configuration
pub mod defaults {
    pub const RECONCILE_TIMEOUT_SECS: u64 = 60;
    pub const REQUEUE_SECS: u64 = 30;
    pub const UNHEALTHY_GRACE_SECS: u64 = 300;
    pub const FETCH_TIMEOUT_SECS: u64 = 10;
}
