//! Server pod controller

use super::{report, Context};
use crate::crds::CORRELATION_LABEL;
use crate::reconciler::{PhaseChange, PodPhase};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::Api,
    runtime::{
        watcher::{watcher, Config, Event},
        WatchStreamExt,
    },
    Client, ResourceExt,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{debug, warn};

/// Remembers the last phase seen per pod uid and turns a pod watch stream
/// into (old, new) phase changes.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    last: HashMap<String, Option<PodPhase>>,
    listed: HashSet<String>,
}

impl PhaseTracker {
    pub fn observe(&mut self, event: Event<Pod>) -> Option<PhaseChange> {
        match event {
            Event::Init => {
                self.listed.clear();
                None
            }
            Event::InitApply(pod) => {
                if let Some(uid) = pod.uid() {
                    self.listed.insert(uid);
                }
                self.record(pod)
            }
            Event::InitDone => {
                let listed = std::mem::take(&mut self.listed);
                self.last.retain(|uid, _| listed.contains(uid));
                None
            }
            Event::Apply(pod) => self.record(pod),
            Event::Delete(pod) => {
                if let Some(uid) = pod.uid() {
                    self.last.remove(&uid);
                }
                None
            }
        }
    }

    fn record(&mut self, pod: Pod) -> Option<PhaseChange> {
        let uid = pod.uid()?;
        let new = PodPhase::of(&pod);
        let old = self.last.insert(uid, new).flatten();
        (old != new).then_some(PhaseChange { pod, old, new })
    }
}

pub struct PodController;

impl PodController {
    pub async fn run(client: Client, ctx: Arc<Context>) {
        let api: Api<Pod> = Api::all(client);
        let config = Config::default().labels(CORRELATION_LABEL);
        let mut tracker = PhaseTracker::default();
        let mut events = watcher(api, config).default_backoff().boxed();

        while let Some(event) = events.next().await {
            let change = match event {
                Ok(event) => match tracker.observe(event) {
                    Some(change) => change,
                    None => continue,
                },
                Err(e) => {
                    warn!(error = %e, "Pod watch error");
                    continue;
                }
            };

            debug!(
                pod = %change.pod.name_any(),
                old = ?change.old,
                new = ?change.new,
                "Pod phase changed"
            );
            let ctx = ctx.clone();
            tokio::spawn(async move {
                if let Err(e) = ctx.handler.on_pod_phase_changed(&change).await {
                    report(&e);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::PodStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn pod(uid: &str, phase: Option<&str>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("alpha".to_string()),
                uid: Some(uid.to_string()),
                ..Default::default()
            },
            status: Some(PodStatus {
                phase: phase.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_changes_carry_old_and_new() {
        let mut tracker = PhaseTracker::default();

        let first = tracker.observe(Event::Apply(pod("u1", Some("Pending")))).unwrap();
        assert_eq!((first.old, first.new), (None, Some(PodPhase::Pending)));

        // same phase again, e.g. a status condition update
        assert!(tracker.observe(Event::Apply(pod("u1", Some("Pending")))).is_none());

        let started = tracker.observe(Event::Apply(pod("u1", Some("Running")))).unwrap();
        assert_eq!(
            (started.old, started.new),
            (Some(PodPhase::Pending), Some(PodPhase::Running))
        );

        assert!(tracker.observe(Event::Apply(pod("u1", Some("Running")))).is_none());
    }

    #[test]
    fn test_pod_without_phase_is_not_a_change() {
        let mut tracker = PhaseTracker::default();
        assert!(tracker.observe(Event::Apply(pod("u1", None))).is_none());
        let change = tracker.observe(Event::Apply(pod("u1", Some("Pending")))).unwrap();
        assert_eq!(change.old, None);
    }

    #[test]
    fn test_relist_catches_missed_transition() {
        let mut tracker = PhaseTracker::default();
        tracker.observe(Event::Apply(pod("u1", Some("Pending"))));

        tracker.observe(Event::Init);
        let change = tracker
            .observe(Event::InitApply(pod("u1", Some("Running"))))
            .unwrap();
        tracker.observe(Event::InitDone);
        assert_eq!(change.old, Some(PodPhase::Pending));
        assert_eq!(change.new, Some(PodPhase::Running));
    }

    #[test]
    fn test_recreated_pod_starts_fresh() {
        let mut tracker = PhaseTracker::default();
        tracker.observe(Event::Apply(pod("u1", Some("Running"))));
        tracker.observe(Event::Delete(pod("u1", Some("Running"))));

        let change = tracker.observe(Event::Apply(pod("u2", Some("Pending")))).unwrap();
        assert_eq!(change.old, None);
        assert!(tracker.last.get("u1").is_none());
    }
}
