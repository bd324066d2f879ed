use super::with_ownership;
use crate::crds::ServerDescriptor;
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::ObjectMeta};
use std::collections::BTreeMap;

const CONFIG_CAPACITY: &str = "1Gi";

/// Claim holding the server's config directory.
pub fn build_volume(server: &ServerDescriptor) -> PersistentVolumeClaim {
    let pvc = PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(server.name.clone()),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(CONFIG_CAPACITY.to_string()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };
    with_ownership(pvc, server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crds::server::tests::{server, valid_spec};
    use crate::crds::CORRELATION_LABEL;

    #[test]
    fn test_volume_shape() {
        let descriptor = ServerDescriptor::try_from(&server("alpha", valid_spec())).unwrap();
        let pvc = build_volume(&descriptor);

        assert_eq!(pvc.metadata.name.as_deref(), Some("alpha"));
        assert_eq!(
            pvc.metadata.labels.unwrap()[CORRELATION_LABEL],
            "alpha".to_string()
        );
        assert_eq!(pvc.metadata.owner_references.unwrap().len(), 1);

        let spec = pvc.spec.unwrap();
        assert_eq!(spec.access_modes.unwrap(), vec!["ReadWriteOnce"]);
        let requests = spec.resources.unwrap().requests.unwrap();
        assert_eq!(requests["storage"], Quantity("1Gi".to_string()));
    }
}
