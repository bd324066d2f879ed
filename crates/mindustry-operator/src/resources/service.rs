use super::{with_ownership, TCP_PORT_NAME, UDP_PORT_NAME};
use crate::crds::{ServerDescriptor, CORRELATION_LABEL};
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::{apis::meta::v1::ObjectMeta, util::intstr::IntOrString};
use std::collections::BTreeMap;

/// Service exposing the game port on the Server's external addresses.
///
/// Backends are selected by correlation label, and both protocols target
/// the pod's named ports so the container port can change independently.
pub fn build_service(server: &ServerDescriptor) -> Service {
    let service = Service {
        metadata: ObjectMeta {
            name: Some(server.name.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(BTreeMap::from([(
                CORRELATION_LABEL.to_string(),
                server.name.clone(),
            )])),
            ports: Some(vec![
                ServicePort {
                    name: Some(TCP_PORT_NAME.to_string()),
                    port: server.external_port,
                    target_port: Some(IntOrString::String(TCP_PORT_NAME.to_string())),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                },
                ServicePort {
                    name: Some(UDP_PORT_NAME.to_string()),
                    port: server.external_port,
                    target_port: Some(IntOrString::String(UDP_PORT_NAME.to_string())),
                    protocol: Some("UDP".to_string()),
                    ..Default::default()
                },
            ]),
            external_ips: Some(server.external_ips.clone()),
            ..Default::default()
        }),
        ..Default::default()
    };
    with_ownership(service, server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crds::server::tests::{server, valid_spec};

    #[test]
    fn test_service_forwards_both_protocols() {
        let descriptor = ServerDescriptor::try_from(&server("alpha", valid_spec())).unwrap();
        let service = build_service(&descriptor);
        assert_eq!(
            service.metadata.labels.as_ref().unwrap()[CORRELATION_LABEL],
            "alpha"
        );

        let spec = service.spec.unwrap();
        assert_eq!(spec.selector.unwrap()[CORRELATION_LABEL], "alpha");
        assert_eq!(spec.external_ips, Some(vec!["10.0.0.5".to_string()]));

        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].port, 25565);
        assert_eq!(ports[0].protocol.as_deref(), Some("TCP"));
        assert_eq!(
            ports[0].target_port,
            Some(IntOrString::String("tcp".to_string()))
        );
        assert_eq!(ports[1].port, 25565);
        assert_eq!(ports[1].protocol.as_deref(), Some("UDP"));
        assert_eq!(
            ports[1].target_port,
            Some(IntOrString::String("udp".to_string()))
        );
    }
}
