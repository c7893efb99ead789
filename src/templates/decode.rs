// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decoding rendered manifests into typed Kubernetes objects

use crate::error::{NestplaneError, Result};
use crate::types::component::ComponentKind;
use k8s_openapi::Resource;
use serde::de::DeserializeOwned;

/// Decode a YAML manifest into `K`.
/// The manifest's `apiVersion` and `kind` must match `K`.
pub fn decode<K>(manifest: &str, kind: ComponentKind) -> Result<K>
where
    K: Resource + DeserializeOwned,
{
    serde_yaml::from_str(manifest).map_err(|e| NestplaneError::Decode {
        kind,
        resource: K::KIND,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::StatefulSet;
    use k8s_openapi::api::core::v1::Service;

    const STATEFULSET: &str = r#"
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: demo-apiserver
  namespace: ns1
spec:
  replicas: 2
  serviceName: demo-apiserver
  selector:
    matchLabels:
      app: demo-apiserver
  template:
    metadata:
      labels:
        app: demo-apiserver
    spec:
      containers:
        - name: apiserver
          image: registry.k8s.io/kube-apiserver:v1.30.0
"#;

    const SERVICE: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: demo-apiserver
spec:
  ports:
    - port: 6443
"#;

    #[test]
    fn test_decode_statefulset() {
        let sts: StatefulSet = decode(STATEFULSET, ComponentKind::APIServer).unwrap();

        assert_eq!(sts.metadata.name.as_deref(), Some("demo-apiserver"));
        let spec = sts.spec.unwrap();
        assert_eq!(spec.replicas, Some(2));
        let containers = spec.template.spec.unwrap().containers;
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name, "apiserver");
    }

    #[test]
    fn test_decode_service() {
        let svc: Service = decode(SERVICE, ComponentKind::APIServer).unwrap();

        assert_eq!(svc.spec.unwrap().ports.unwrap()[0].port, 6443);
    }

    #[test]
    fn test_decode_wrong_kind_fails() {
        let err = decode::<StatefulSet>(SERVICE, ComponentKind::Etcd).unwrap_err();

        match err {
            NestplaneError::Decode { kind, resource, .. } => {
                assert_eq!(kind, ComponentKind::Etcd);
                assert_eq!(resource, "StatefulSet");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_decode_malformed_yaml_fails() {
        let err = decode::<Service>("kind: [unclosed", ComponentKind::Etcd).unwrap_err();
        assert!(matches!(err, NestplaneError::Decode { .. }));
    }

    #[test]
    fn test_decode_invalid_field_type_fails() {
        let manifest = STATEFULSET.replace("replicas: 2", "replicas: two");
        let err = decode::<StatefulSet>(&manifest, ComponentKind::APIServer).unwrap_err();
        assert!(err.to_string().contains("NestedAPIServer"));
    }
}
