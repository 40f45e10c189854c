//! Async task bookkeeping.
//!
//! The reducer allocates a [`TaskId`] and marks it active when it asks for
//! work; the runtime reports the start (with its cancellation token) and the
//! result under that id. Results whose id is no longer active are stale and
//! dropped.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Probe,
    Catalog,
    Export,
    Download,
    SignOut,
}

#[derive(Debug, Clone)]
pub struct TaskStarted {
    pub id: TaskId,
    pub cancel: CancellationToken,
}

/// Task lifecycle state (stored in AppState, mutated only by the reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    pub active: Option<TaskId>,
    pub cancel: Option<CancellationToken>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Marks `id` as the active task before the runtime has spawned it.
    pub fn begin(&mut self, id: TaskId) {
        self.active = Some(id);
        self.cancel = None;
    }

    /// Attaches the runtime's token. Returns false if `started` is no longer
    /// the active task.
    pub fn on_started(&mut self, started: &TaskStarted) -> bool {
        let ok = self.active == Some(started.id);
        if ok {
            self.cancel = Some(started.cancel.clone());
        }
        ok
    }

    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.clear();
        }
        ok
    }

    /// Forgets the task, handing back its token so the caller can cancel it.
    pub fn take_cancel(&mut self) -> Option<CancellationToken> {
        self.active = None;
        self.cancel.take()
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.cancel = None;
    }
}

#[derive(Debug, Default, Clone)]
pub struct Tasks {
    pub probe: TaskState,
    pub catalog: TaskState,
    pub export: TaskState,
    pub download: TaskState,
    pub sign_out: TaskState,
}

impl Tasks {
    pub fn state_mut(&mut self, kind: TaskKind) -> &mut TaskState {
        match kind {
            TaskKind::Probe => &mut self.probe,
            TaskKind::Catalog => &mut self.catalog,
            TaskKind::Export => &mut self.export,
            TaskKind::Download => &mut self.download,
            TaskKind::SignOut => &mut self.sign_out,
        }
    }

    pub fn is_any_running(&self) -> bool {
        self.probe.is_running()
            || self.catalog.is_running()
            || self.export.is_running()
            || self.download.is_running()
            || self.sign_out.is_running()
    }
}
