use crate::crds::{ServerDescriptor, CORRELATION_LABEL};
use kube::Resource;

/// Returns `resource` placed in the owner's namespace, with the owner as its
/// only owner reference and the correlation label set. Existing labels are kept.
pub fn with_ownership<K: Resource>(mut resource: K, owner: &ServerDescriptor) -> K {
    let meta = resource.meta_mut();
    meta.namespace = Some(owner.namespace.clone());
    meta.owner_references = Some(vec![owner.owner.clone()]);
    meta.labels
        .get_or_insert_with(Default::default)
        .insert(CORRELATION_LABEL.to_string(), owner.name.clone());
    resource
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crds::server::tests::{server, valid_spec};
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    #[test]
    fn test_with_ownership_keeps_labels() {
        let owner = ServerDescriptor::try_from(&server("alpha", valid_spec())).unwrap();
        let original = ConfigMap {
            metadata: ObjectMeta {
                name: Some("alpha".to_string()),
                labels: Some(BTreeMap::from([("tier".to_string(), "game".to_string())])),
                ..Default::default()
            },
            ..Default::default()
        };

        let owned = with_ownership(original.clone(), &owner);

        // input is untouched
        assert!(original.metadata.owner_references.is_none());

        let labels = owned.metadata.labels.unwrap();
        assert_eq!(labels.get("tier").map(String::as_str), Some("game"));
        assert_eq!(labels.get(CORRELATION_LABEL).map(String::as_str), Some("alpha"));
        assert_eq!(owned.metadata.namespace.as_deref(), Some("games"));
        assert_eq!(owned.metadata.owner_references, Some(vec![owner.owner]));
    }
}
