use super::{Job, JobState};
use crate::context::EditorContext;
use std::fmt;

type Builder = Box<dyn FnOnce(&EditorContext) -> Vec<Box<dyn Job>>>;

/// Several jobs applied as one undo step.
///
/// Sub-jobs run in order on execute and redo, and in reverse order on undo,
/// all inside one notification bracket so listeners see a single burst of
/// events. The batch is executable only when every sub-job is.
///
/// A deferred batch builds its sub-jobs from the context the first time it
/// is checked, which lets a job be constructed before the state it depends
/// on is final.
pub struct BatchJob {
    description: String,
    jobs: Vec<Box<dyn Job>>,
    builder: Option<Builder>,
    allow_empty: bool,
    state: JobState,
}

impl BatchJob {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            jobs: Vec::new(),
            builder: None,
            allow_empty: false,
            state: JobState::Fresh,
        }
    }

    pub fn deferred(
        description: impl Into<String>,
        builder: impl FnOnce(&EditorContext) -> Vec<Box<dyn Job>> + 'static,
    ) -> Self {
        Self {
            builder: Some(Box::new(builder)),
            ..Self::new(description)
        }
    }

    /// Accept a batch with no sub-jobs as executable.
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn push(&mut self, job: impl Job + 'static) {
        self.jobs.push(Box::new(job));
    }

    pub fn push_boxed(&mut self, job: Box<dyn Job>) {
        self.jobs.push(job);
    }

    pub fn with(mut self, job: impl Job + 'static) -> Self {
        self.push(job);
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn build(&mut self, ctx: &EditorContext) {
        if let Some(builder) = self.builder.take() {
            let built = builder(ctx);
            self.jobs.extend(built);
        }
    }
}

impl fmt::Debug for BatchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchJob")
            .field("description", &self.description)
            .field("jobs", &self.jobs)
            .field("deferred", &self.builder.is_some())
            .field("state", &self.state)
            .finish()
    }
}

impl Job for BatchJob {
    fn is_executable(&mut self, ctx: &EditorContext) -> bool {
        self.build(ctx);
        if self.jobs.is_empty() {
            return self.allow_empty;
        }
        self.jobs.iter_mut().all(|job| job.is_executable(ctx))
    }

    fn execute(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        self.build(ctx);
        ctx.document.begin_update();
        for job in &mut self.jobs {
            job.execute(ctx);
        }
        ctx.document.end_update();
    }

    fn undo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Undone);
        ctx.document.begin_update();
        for job in self.jobs.iter_mut().rev() {
            job.undo(ctx);
        }
        ctx.document.end_update();
    }

    fn redo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        ctx.document.begin_update();
        for job in &mut self.jobs {
            job.redo(ctx);
        }
        ctx.document.end_update();
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn dispose(&mut self, ctx: &mut EditorContext) {
        for job in self.jobs.iter_mut().rev() {
            job.dispose(ctx);
        }
    }
}
