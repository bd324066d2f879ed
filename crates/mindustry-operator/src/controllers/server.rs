//! Server controller

use super::{report, Context};
use crate::crds::Server;
use futures::StreamExt;
use kube::{
    api::Api,
    runtime::{
        watcher::{watcher, Config, Event},
        WatchStreamExt,
    },
    Client, ResourceExt,
};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info, warn};

/// Turns a Server watch stream into creation events: the first sighting of
/// each uid, whether from a live event or an initial listing.
#[derive(Debug, Default)]
pub struct CreationTracker {
    seen: HashSet<String>,
    listed: HashSet<String>,
}

impl CreationTracker {
    /// Returns the Server if this event is its creation.
    pub fn observe(&mut self, event: Event<Server>) -> Option<Server> {
        match event {
            Event::Init => {
                self.listed.clear();
                None
            }
            Event::InitApply(server) => {
                let uid = server.uid()?;
                self.listed.insert(uid.clone());
                self.seen.insert(uid).then_some(server)
            }
            Event::InitDone => {
                // drop Servers deleted while the watch was down
                let listed = std::mem::take(&mut self.listed);
                self.seen.retain(|uid| listed.contains(uid));
                None
            }
            Event::Apply(server) => {
                let uid = server.uid()?;
                self.seen.insert(uid).then_some(server)
            }
            Event::Delete(server) => {
                if let Some(uid) = server.uid() {
                    self.seen.remove(&uid);
                }
                None
            }
        }
    }
}

pub struct ServerController;

impl ServerController {
    pub async fn run(client: Client, ctx: Arc<Context>) {
        let api: Api<Server> = Api::all(client);
        let mut tracker = CreationTracker::default();
        let mut events = watcher(api, Config::default()).default_backoff().boxed();

        while let Some(event) = events.next().await {
            let server = match event {
                Ok(event) => match tracker.observe(event) {
                    Some(server) => server,
                    None => continue,
                },
                Err(e) => {
                    warn!(error = %e, "Server watch error");
                    continue;
                }
            };

            info!(name = %server.name_any(), "Server created");
            let ctx = ctx.clone();
            tokio::spawn(async move {
                match ctx.handler.on_resource_created(&server).await {
                    Ok(()) => debug!(name = %server.name_any(), "Handled Server creation"),
                    Err(e) => report(&e),
                }
            });
        }
    }
}
