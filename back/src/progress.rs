use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::messages::{Frontend, TaskKind, ToFrontend};

/// How far into a phase the cosmetic animation is allowed to go
pub const ANIMATION_CEILING: f32 = 0.95;

/// The highest value reachable before [ProgressSink::complete] is called
const BEFORE_COMPLETE: f32 = 99.9;

/// A slice of the 0-100 range owned by one step of an operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub name: &'static str,
    pub start: f32,
    pub end: f32,
}

impl Phase {
    pub const fn new(name: &'static str, start: f32, end: f32) -> Self {
        Self { name, start, end }
    }

    /// Map a fraction of this phase onto the overall range
    pub fn at(&self, fraction: f32) -> f32 {
        self.start + (self.end - self.start) * fraction.clamp(0.0, 1.0)
    }

    /// The furthest point the animation may push this phase to
    pub fn animation_target(&self) -> f32 {
        self.at(ANIMATION_CEILING)
    }
}

/// The progress of a single task, shared between the task and its animation
#[derive(Clone)]
pub struct ProgressSink {
    task: TaskKind,
    value: Arc<Mutex<f32>>,
    frontend: Frontend,
}

impl ProgressSink {
    pub fn new(task: TaskKind, frontend: Frontend) -> Self {
        Self {
            task,
            value: Arc::new(Mutex::new(0.0)),
            frontend,
        }
    }

    pub fn get(&self) -> f32 {
        *self.value.lock()
    }

    /// Move the value forward, values behind the current one are ignored. Returns whether the value changed.
    ///
    /// 100 is reserved for [complete](Self::complete).
    pub fn set(&self, value: f32) -> bool {
        let next = value.clamp(0.0, BEFORE_COMPLETE);
        self.store(|current| (next > current).then_some(next))
    }

    pub fn advance(&self, step: f32, target: f32) -> bool {
        self.store(|current| {
            let next = (current + step).min(target).clamp(0.0, BEFORE_COMPLETE);
            (next > current).then_some(next)
        })
    }

    pub fn set_phase(&self, phase: &Phase, fraction: f32) -> bool {
        self.set(phase.at(fraction))
    }

    pub fn reset(&self) {
        *self.value.lock() = 0.0;
        self.notify(0.0);
    }

    /// Mark the operation as finished
    pub fn complete(&self) {
        *self.value.lock() = 100.0;
        self.notify(100.0);
    }

    fn store(&self, update: impl FnOnce(f32) -> Option<f32>) -> bool {
        let mut value = self.value.lock();
        let previous = *value;

        match update(previous) {
            Some(next) => {
                *value = next;
                drop(value);

                // Avoid flooding the UI with sub-permille changes from download chunks
                if (next * 10.0).floor() != (previous * 10.0).floor() {
                    self.notify(next);
                }

                true
            }
            None => false,
        }
    }

    fn notify(&self, value: f32) {
        self.frontend.send(ToFrontend::TaskProgress { task: self.task, value });
    }
}

/// Tick the sink towards `target` until it gets there or `stop` is cancelled
pub async fn animate(sink: ProgressSink, target: f32, stop: CancellationToken, step: f32, interval: Duration) {
    let mut ticks = tokio::time::interval(interval);
    // The first tick completes immediately
    ticks.tick().await;

    loop {
        tokio::select! {
            biased;

            () = stop.cancelled() => break,
            _ = ticks.tick() => {
                if !sink.advance(step, target) {
                    trace!(target, "Animation reached its target");
                    break;
                }
            }
        }
    }
}
