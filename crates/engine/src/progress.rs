//! `progress_reporter` handed to `WorkHandler::execute` (spec §3, §4.5).
//! Lets a long-running work unit surface intermediate status without
//! reaching back into the bus/registry itself.

use std::sync::Arc;

use sentinel_core::{Event, SubjectId, WorkId};

use crate::bus::EventBus;

#[derive(Clone)]
pub struct ProgressReporter {
    bus: Arc<EventBus>,
    module: String,
    work_id: WorkId,
    subject: SubjectId,
    clock_epoch: u64,
}

impl ProgressReporter {
    pub fn new(
        bus: Arc<EventBus>,
        module: impl Into<String>,
        work_id: WorkId,
        subject: SubjectId,
        clock_epoch: u64,
    ) -> Self {
        Self { bus, module: module.into(), work_id, subject, clock_epoch }
    }

    pub fn report(&self, message: impl Into<String>) {
        self.bus.emit(Event::JobProgress {
            module: self.module.clone(),
            timestamp: self.clock_epoch,
            work_id: self.work_id.clone(),
            subject: self.subject.clone(),
            message: message.into(),
        });
    }
}
