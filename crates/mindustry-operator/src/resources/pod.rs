use super::with_ownership;
use crate::config::OperatorConfig;
use crate::crds::ServerDescriptor;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EmptyDirVolumeSource, PersistentVolumeClaimVolumeSource, Pod,
    PodSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Game port, served on both TCP and UDP.
pub const GAME_PORT: i32 = 6567;
/// Admin socket port.
pub const ADMIN_PORT: i32 = 6569;

pub const TCP_PORT_NAME: &str = "tcp";
pub const UDP_PORT_NAME: &str = "udp";
pub const ADMIN_PORT_NAME: &str = "adm";

/// Container running the server process; the attach target.
pub const SERVER_CONTAINER: &str = "server";

const INSTALLER_CONTAINER: &str = "installer";
const SERVER_VOLUME: &str = "server";
const CONFIG_VOLUME: &str = "config";
const SERVER_DIR: &str = "/opt/mindustry/";
const CONFIG_DIR: &str = "/opt/mindustry/config";
const SERVER_JAR: &str = "/opt/mindustry/server-release.jar";

/// Shell command the init container runs to fetch the release jar.
pub(crate) fn install_command(config: &OperatorConfig, version: &str) -> String {
    format!("wget {} -O {}", config.release_url(version), SERVER_JAR)
}

/// Pod that downloads release `version` into an emptyDir and runs it with
/// stdin open, keeping its config on the Server's claim.
pub fn build_pod(server: &ServerDescriptor, config: &OperatorConfig) -> Pod {
    let server_mount = VolumeMount {
        name: SERVER_VOLUME.to_string(),
        mount_path: SERVER_DIR.to_string(),
        ..Default::default()
    };
    let config_mount = VolumeMount {
        name: CONFIG_VOLUME.to_string(),
        mount_path: CONFIG_DIR.to_string(),
        ..Default::default()
    };

    let installer = Container {
        name: INSTALLER_CONTAINER.to_string(),
        image: Some(config.installer_image.clone()),
        command: Some(vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            install_command(config, &server.version),
        ]),
        volume_mounts: Some(vec![server_mount.clone()]),
        ..Default::default()
    };

    let main = Container {
        name: SERVER_CONTAINER.to_string(),
        image: Some(config.server_image.clone()),
        working_dir: Some(SERVER_DIR.to_string()),
        command: Some(vec!["java".to_string()]),
        args: Some(vec!["-jar".to_string(), SERVER_JAR.to_string()]),
        stdin: Some(true),
        ports: Some(vec![
            port(TCP_PORT_NAME, GAME_PORT, "TCP"),
            port(UDP_PORT_NAME, GAME_PORT, "UDP"),
            port(ADMIN_PORT_NAME, ADMIN_PORT, "TCP"),
        ]),
        volume_mounts: Some(vec![server_mount, config_mount]),
        ..Default::default()
    };

    let pod = Pod {
        metadata: ObjectMeta {
            name: Some(server.name.clone()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            init_containers: Some(vec![installer]),
            containers: vec![main],
            volumes: Some(vec![
                Volume {
                    name: SERVER_VOLUME.to_string(),
                    empty_dir: Some(EmptyDirVolumeSource::default()),
                    ..Default::default()
                },
                Volume {
                    name: CONFIG_VOLUME.to_string(),
                    persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                        claim_name: server.name.clone(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    };
    with_ownership(pod, server)
}

fn port(name: &str, container_port: i32, protocol: &str) -> ContainerPort {
    ContainerPort {
        name: Some(name.to_string()),
        container_port,
        protocol: Some(protocol.to_string()),
        ..Default::default()
    }
}
