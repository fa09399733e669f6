use super::pipeline::InstallPipeline;
use super::types::{InstallResult, InstallTarget, RunMode};
use crate::error::InstallError;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Runs the install pipeline over a batch of targets.
///
/// Exactly one result comes back per target. Sequential runs keep input
/// order; parallel runs return results in completion order.
///
/// Parallel pipelines share the destination directory without any
/// cross-process lock, so a concurrent installer outside this process can
/// still race the check-then-move. Within one run, targets with the same
/// name are serialized.
pub struct Orchestrator {
    pipeline: InstallPipeline,
    locks: NameLocks,
}

impl Orchestrator {
    pub fn new(pipeline: InstallPipeline) -> Self {
        Self {
            pipeline,
            locks: NameLocks::default(),
        }
    }

    pub fn pipeline(&self) -> &InstallPipeline {
        &self.pipeline
    }

    pub async fn run(&self, targets: Vec<InstallTarget>, mode: RunMode) -> Vec<InstallResult> {
        log::info!("Installing {} target(s), mode={:?}", targets.len(), mode);

        match mode {
            RunMode::Sequential => {
                let mut results = Vec::with_capacity(targets.len());
                for target in &targets {
                    results.push(self.run_isolated(target, true).await);
                }
                results
            }
            RunMode::Parallel { concurrency } => {
                let limit = concurrency.unwrap_or(targets.len()).max(1);
                stream::iter(targets)
                    .map(|target| async move {
                        let _guard = self.locks.acquire(&target.name).await;
                        self.run_isolated(&target, false).await
                    })
                    .buffer_unordered(limit)
                    .collect::<Vec<_>>()
                    .await
            }
        }
    }

    /// A panic inside one pipeline becomes that target's failure instead of
    /// taking the whole run down.
    async fn run_isolated(&self, target: &InstallTarget, show_progress: bool) -> InstallResult {
        match AssertUnwindSafe(self.pipeline.install(target, show_progress))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Pipeline for {} panicked: {}", target.name, message);
                let result = InstallResult::failed(&target.name, InstallError::Unexpected(message));
                self.pipeline.reporter().done(&result);
                result
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "pipeline panicked".to_string()
    }
}

/// In-process advisory locks keyed by lowercased target name
#[derive(Default)]
struct NameLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl NameLocks {
    async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(name.to_lowercase()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
