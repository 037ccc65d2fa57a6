//! Watch session: notify events → debouncer → bridge.
//!
//! The watcher is created first and its receiver handed to the session, so
//! events raised while the host is still starting up are buffered, not lost.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use super::watcher::NotifyReceiver;
use super::{ChangeKind, Debouncer};
use crate::bridge::BridgeContext;
use crate::utils::path::display_path;
use crate::{debug, log};

/// Something the host has to act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// A file appeared in or vanished from a context directory; the modules
    /// of `dependents` must be invalidated.
    #[serde(rename = "file-add")]
    ContextChanged {
        path: PathBuf,
        dependents: Vec<PathBuf>,
    },
    /// A watched file changed and auxiliary pipelines rebuilt it.
    Rebuilt { path: PathBuf, pipelines: Vec<String> },
}

pub struct Session {
    ctx: Arc<BridgeContext>,
    rx: NotifyReceiver,
    debouncer: Debouncer,
}

impl Session {
    pub fn new(ctx: Arc<BridgeContext>, rx: NotifyReceiver) -> Self {
        Self {
            ctx,
            rx,
            debouncer: Debouncer::new(),
        }
    }

    pub fn with_debouncer(mut self, debouncer: Debouncer) -> Self {
        self.debouncer = debouncer;
        self
    }

    /// Run until the receiver of `events` is dropped.
    pub async fn run(self, events: mpsc::Sender<SessionEvent>) {
        let Self {
            ctx,
            rx,
            mut debouncer,
        } = self;
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify delivers on a std channel; forward from a plain thread
        std::thread::spawn(move || {
            while let Ok(result) = rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.push(&event),
                _ = tokio::time::sleep(debouncer.next_wake()) => {
                    let Some(changes) = debouncer.flush() else {
                        continue;
                    };
                    for event in dispatch(&ctx, changes).await {
                        if events.send(event).await.is_err() {
                            debug!("watch"; "event receiver dropped, stopping");
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Route debounced changes: modified files to the cross-pipeline rebuild,
/// created/removed files to the context dependencies.
pub async fn dispatch(
    ctx: &BridgeContext,
    changes: Vec<(PathBuf, ChangeKind)>,
) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    for (path, kind) in changes {
        match kind {
            ChangeKind::Modified => match ctx.rebuild_changed(&path).await {
                Ok(pipelines) if !pipelines.is_empty() => {
                    log!("watch"; "rebuilt {} ({})", display_path(&path), pipelines.join(", "));
                    out.push(SessionEvent::Rebuilt { path, pipelines });
                }
                Ok(_) => {}
                Err(e) => log!("watch"; "{}: {}", display_path(&path), e),
            },
            ChangeKind::Created | ChangeKind::Removed => {
                if let Some(dependents) = ctx.context_change(&path) {
                    debug!("watch"; "{} {}", kind.label(), display_path(&path));
                    out.push(SessionEvent::ContextChanged { path, dependents });
                }
            }
        }
    }
    out
}
