//! Remote initializer
//!
//! Once a server pod first reaches `Running`, attach to the server process's
//! stdin and type in the console commands that open the admin socket and
//! start hosting. The write is fire-and-forget: no output is read and the
//! process is not checked for readiness beyond the attach itself.

use crate::error::{AttachError, Error, Result};
use crate::platform::Platform;
use crate::resources::{ADMIN_PORT, GAME_PORT, SERVER_CONTAINER};
use std::time::Duration;
use strum::Display;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Console commands sent to a freshly started server, one per line,
/// followed by a blank line.
pub fn init_script() -> String {
    let commands = [
        format!("config port {GAME_PORT}"),
        format!("config socketInputPort {ADMIN_PORT}"),
        "config socketInputAddress 0.0.0.0".to_string(),
        "config socketInput true".to_string(),
        "host".to_string(),
        String::new(),
    ];
    commands.iter().map(|line| format!("{line}\n")).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum InitState {
    AwaitingRunning,
    Attaching,
    Configuring,
    Done,
}

/// Runs the attach-and-write handshake for one pod, once.
pub struct RemoteInitializer<'a> {
    platform: &'a dyn Platform,
    namespace: &'a str,
    pod: &'a str,
    timeout: Duration,
    state: InitState,
}

impl<'a> RemoteInitializer<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        namespace: &'a str,
        pod: &'a str,
        timeout: Duration,
    ) -> Self {
        Self {
            platform,
            namespace,
            pod,
            timeout,
            state: InitState::AwaitingRunning,
        }
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    fn transition(&mut self, next: InitState) {
        debug!(from = %self.state, to = %next, "Initializer state changed");
        self.state = next;
    }

    fn attach_error(&self, source: AttachError) -> Error {
        Error::Attach {
            pod: self.pod.to_string(),
            source,
        }
    }

    /// Attach, write [`init_script`], close. Consumes the initializer so the
    /// handshake cannot be re-entered.
    #[instrument(skip(self), fields(namespace = %self.namespace, pod = %self.pod))]
    pub async fn run(mut self) -> Result<InitState> {
        self.transition(InitState::Attaching);
        let attach = self
            .platform
            .attach(self.namespace, self.pod, SERVER_CONTAINER);
        let mut session = match tokio::time::timeout(self.timeout, attach).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => return Err(self.attach_error(e)),
            Err(_) => return Err(self.attach_error(AttachError::Timeout(self.timeout))),
        };

        self.transition(InitState::Configuring);
        let script = init_script();
        if let Err(e) = session.stdin().write_all(script.as_bytes()).await {
            let _ = session.close(self.timeout).await;
            return Err(self.attach_error(e.into()));
        }
        session
            .close(self.timeout)
            .await
            .map_err(|e| self.attach_error(e))?;

        self.transition(InitState::Done);
        info!("Sent init commands to server");
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AttachSession, MockPlatform};
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_init_script_literal() {
        assert_eq!(
            init_script(),
            "config port 6567\n\
             config socketInputPort 6569\n\
             config socketInputAddress 0.0.0.0\n\
             config socketInput true\n\
             host\n\
             \n"
        );
    }

    #[tokio::test]
    async fn test_run_writes_script_and_closes() {
        let (writer, mut reader) = tokio::io::duplex(1024);
        let mut writer = Some(writer);

        let mut platform = MockPlatform::new();
        platform
            .expect_attach()
            .withf(|ns, pod, container| {
                ns.to_string() == "games"
                    && pod.to_string() == "alpha"
                    && container.to_string() == "server"
            })
            .times(1)
            .returning(move |_, _, _| {
                Ok(AttachSession::from_writer(writer.take().expect("attached once")))
            });

        let initializer =
            RemoteInitializer::new(&platform, "games", "alpha", Duration::from_secs(1));
        assert_eq!(initializer.state(), InitState::AwaitingRunning);
        let state = initializer.run().await.unwrap();
        assert_eq!(state, InitState::Done);

        // stream is closed: read_to_string reaches EOF
        let mut received = String::new();
        reader.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, init_script());
    }

    #[tokio::test]
    async fn test_run_ignores_remote_output() {
        // Remote side has already written a banner; nothing reads it.
        let (writer, mut reader) = tokio::io::duplex(1024);
        reader.write_all(b"[I] Server loaded.\n").await.unwrap();
        let mut writer = Some(writer);

        let mut platform = MockPlatform::new();
        platform
            .expect_attach()
            .returning(move |_, _, _| Ok(AttachSession::from_writer(writer.take().unwrap())));

        RemoteInitializer::new(&platform, "games", "alpha", Duration::from_secs(1))
            .run()
            .await
            .unwrap();

        let mut received = String::new();
        reader.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, init_script());
    }

    #[tokio::test]
    async fn test_attach_failure_is_surfaced() {
        let mut platform = MockPlatform::new();
        platform
            .expect_attach()
            .times(1)
            .returning(|_, _, _| Err(AttachError::StdinUnavailable));

        let err = RemoteInitializer::new(&platform, "games", "alpha", Duration::from_secs(1))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Attach {
                source: AttachError::StdinUnavailable,
                ..
            }
        ));
    }

    struct HangingPlatform;

    #[async_trait::async_trait]
    impl Platform for HangingPlatform {
        async fn create_volume(
            &self,
            _: &k8s_openapi::api::core::v1::PersistentVolumeClaim,
        ) -> std::result::Result<k8s_openapi::api::core::v1::PersistentVolumeClaim, kube::Error>
        {
            unreachable!()
        }

        async fn create_pod(
            &self,
            _: &k8s_openapi::api::core::v1::Pod,
        ) -> std::result::Result<k8s_openapi::api::core::v1::Pod, kube::Error> {
            unreachable!()
        }

        async fn create_service(
            &self,
            _: &k8s_openapi::api::core::v1::Service,
        ) -> std::result::Result<k8s_openapi::api::core::v1::Service, kube::Error> {
            unreachable!()
        }

        async fn attach(
            &self,
            _: &str,
            _: &str,
            _: &str,
        ) -> std::result::Result<AttachSession, AttachError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_times_out() {
        let err = RemoteInitializer::new(&HangingPlatform, "games", "alpha", Duration::from_secs(1))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Attach {
                source: AttachError::Timeout(_),
                ..
            }
        ));
    }
}
