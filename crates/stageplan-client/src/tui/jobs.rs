use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use super::event::Event;
use crate::storage::ScheduleBackend;
use crate::timeline::{execute, Effect};

/// Run `effect` on a worker thread and post the completion back to the
/// event loop.
pub fn spawn(effect: Effect, backend: Arc<dyn ScheduleBackend>, sender: Sender<Event>) {
    let generation = effect.generation();
    thread::spawn(move || {
        tracing::debug!(generation, "backend job started");
        let completion = execute(effect, backend.as_ref());
        if sender.send(Event::Completed(completion)).is_err() {
            tracing::debug!(generation, "event loop gone, dropping job result");
        }
    });
}
