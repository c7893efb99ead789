// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Idempotent object creation and object references

use crate::error::{NestplaneError, Result};
use crate::types::component::NestedAPIServer;
use k8s_openapi::api::core::v1::{ObjectReference, Service};
use kube::{api::PostParams, Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, instrument};

/// Create `obj` unless an object with the same name already exists.
/// Existing objects are left untouched. Returns whether a new object was created.
#[instrument(skip(api, obj), fields(name = %obj.name_any()))]
pub async fn create_if_absent<K>(api: &Api<K>, obj: &K) -> Result<bool>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    match api.create(&PostParams::default(), obj).await {
        Ok(_) => {
            info!("Created {}", obj.name_any());
            Ok(true)
        }
        Err(kube::Error::Api(err)) if err.code == 409 => {
            debug!("{} already exists, skipping creation", obj.name_any());
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Reference to a stored object by kind, namespace, name and uid
pub fn object_ref<K: Resource<DynamicType = ()>>(obj: &K) -> ObjectReference {
    let meta = obj.meta();
    ObjectReference {
        api_version: Some(K::api_version(&()).into_owned()),
        kind: Some(K::kind(&()).into_owned()),
        namespace: meta.namespace.clone(),
        name: meta.name.clone(),
        uid: meta.uid.clone(),
        ..Default::default()
    }
}

/// Reference to the `{cluster}-apiserver` Service fronting a cluster's API server
#[instrument(skip(client, apiserver), fields(apiserver = %apiserver.name_any()))]
pub async fn apiserver_service_ref(
    client: &Client,
    apiserver: &NestedAPIServer,
    cluster_name: &str,
) -> Result<ObjectReference> {
    let namespace = apiserver.namespace().ok_or_else(|| {
        NestplaneError::InvalidOwner(format!("{} has no namespace", apiserver.name_any()))
    })?;
    let services: Api<Service> = Api::namespaced(client.clone(), &namespace);
    let svc = services.get(&format!("{}-apiserver", cluster_name)).await?;
    Ok(object_ref(&svc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{already_exists_json, MockService};
    use crate::types::component::{NestedAPIServerSpec, NestedComponentSpec};
    use k8s_openapi::api::apps::v1::StatefulSet;
    use kube::api::ObjectMeta;

    const SERVICES: &str = "/api/v1/namespaces/ns1/services";

    fn make_service() -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some("demo-etcd".to_string()),
                namespace: Some("ns1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_if_absent_creates() {
        let body = serde_json::to_string(&make_service()).unwrap();
        let mock = MockService::new().on_post(SERVICES, 201, &body);
        let api: Api<Service> = Api::namespaced(mock.clone().into_client(), "ns1");

        let created = create_if_absent(&api, &make_service()).await.unwrap();

        assert!(created);
        assert_eq!(mock.requests("POST", SERVICES).len(), 1);
    }

    #[tokio::test]
    async fn test_create_if_absent_treats_conflict_as_success() {
        let mock = MockService::new().on_post(
            SERVICES,
            409,
            &already_exists_json("services", "demo-etcd"),
        );
        let api: Api<Service> = Api::namespaced(mock.into_client(), "ns1");

        let created = create_if_absent(&api, &make_service()).await.unwrap();

        assert!(!created);
    }

    #[tokio::test]
    async fn test_create_if_absent_propagates_other_errors() {
        let forbidden = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": "forbidden",
            "reason": "Forbidden",
            "code": 403
        })
        .to_string();
        let mock = MockService::new().on_post(SERVICES, 403, &forbidden);
        let api: Api<Service> = Api::namespaced(mock.into_client(), "ns1");

        let err = create_if_absent(&api, &make_service()).await.unwrap_err();

        assert!(err.is_retryable());
    }

    fn make_apiserver(namespace: Option<&str>) -> NestedAPIServer {
        let mut apiserver = NestedAPIServer::new(
            "demo-apiserver",
            NestedAPIServerSpec {
                component: NestedComponentSpec::default(),
            },
        );
        apiserver.metadata.namespace = namespace.map(str::to_string);
        apiserver
    }

    #[test]
    fn test_object_ref_carries_identity() {
        let sts = StatefulSet {
            metadata: ObjectMeta {
                name: Some("demo".to_string()),
                namespace: Some("ns1".to_string()),
                uid: Some("sts-uid".to_string()),
                resource_version: Some("42".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let reference = object_ref(&sts);

        assert_eq!(reference.api_version.as_deref(), Some("apps/v1"));
        assert_eq!(reference.kind.as_deref(), Some("StatefulSet"));
        assert_eq!(reference.namespace.as_deref(), Some("ns1"));
        assert_eq!(reference.name.as_deref(), Some("demo"));
        assert_eq!(reference.uid.as_deref(), Some("sts-uid"));
        assert_eq!(reference.resource_version, None);
    }

    #[tokio::test]
    async fn test_apiserver_service_ref() {
        let svc = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": "demo-apiserver", "namespace": "ns1", "uid": "svc-uid" },
            "spec": { "ports": [{ "port": 6443 }] }
        })
        .to_string();
        let mock = MockService::new().on_get(&format!("{}/demo-apiserver", SERVICES), 200, &svc);
        let client = mock.clone().into_client();

        let reference = apiserver_service_ref(&client, &make_apiserver(Some("ns1")), "demo")
            .await
            .unwrap();

        assert_eq!(reference.kind.as_deref(), Some("Service"));
        assert_eq!(reference.api_version.as_deref(), Some("v1"));
        assert_eq!(reference.name.as_deref(), Some("demo-apiserver"));
        assert_eq!(reference.uid.as_deref(), Some("svc-uid"));
        assert_eq!(mock.requests("GET", &format!("{}/demo-apiserver", SERVICES)).len(), 1);
    }

    #[tokio::test]
    async fn test_apiserver_service_ref_missing_service() {
        let client = MockService::new().into_client();

        let err = apiserver_service_ref(&client, &make_apiserver(Some("ns1")), "demo")
            .await
            .unwrap_err();

        assert!(matches!(err, NestplaneError::KubeError(kube::Error::Api(ref e)) if e.code == 404));
    }

    #[tokio::test]
    async fn test_apiserver_service_ref_requires_namespace() {
        let mock = MockService::new();
        let client = mock.clone().into_client();

        let err = apiserver_service_ref(&client, &make_apiserver(None), "demo")
            .await
            .unwrap_err();

        assert!(matches!(err, NestplaneError::InvalidOwner(_)));
        assert!(mock.recorded().is_empty());
    }
}
