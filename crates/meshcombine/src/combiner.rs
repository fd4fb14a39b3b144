//! Front end that owns at most one combine run at a time.

use crate::aggregator::{Aggregator, RenderableSource};
use crate::config::CombineOptions;
use crate::error::{CombineError, CombineResult};
use crate::job::{CombineJob, CombineReport, StepStatus};
use crate::renderable::Renderable;

/// Starts combine runs and advances them one step per [`Combiner::tick`].
///
/// # Example
///
/// ```ignore
/// let mut combiner = Combiner::new(CombineOptions::default().with_deep_combine(true));
/// combiner.start_discovery(&scene, &root)?;
///
/// // Once per frame:
/// if let Some(report) = combiner.tick(&aggregator) {
///     println!("{} batches", report.batches.len());
/// }
/// ```
#[derive(Debug)]
pub struct Combiner<M, C> {
    options: CombineOptions,
    job: Option<CombineJob<M, C>>,
}

impl<M, C> Combiner<M, C> {
    pub fn new(options: CombineOptions) -> Self {
        Self { options, job: None }
    }

    pub fn options(&self) -> &CombineOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CombineOptions) {
        self.options = options;
    }

    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    pub fn job(&self) -> Option<&CombineJob<M, C>> {
        self.job.as_ref()
    }

    /// Start a run over `renderables`.
    ///
    /// Fails with [`CombineError::Busy`] while an earlier run is unfinished.
    pub fn start(&mut self, renderables: impl IntoIterator<Item = Renderable>) -> CombineResult<()> {
        self.ensure_idle()?;
        self.job = Some(CombineJob::new(renderables, self.options.clone())?);
        Ok(())
    }

    /// Start a run over everything `source` finds under `root`.
    pub fn start_discovery<S: RenderableSource>(&mut self, source: &S, root: &S::Root) -> CombineResult<()> {
        self.ensure_idle()?;
        self.job = Some(CombineJob::discover(source, root, self.options.clone())?);
        Ok(())
    }

    /// Advance the current run by one step.
    ///
    /// Returns the report once the run finishes; the combiner is then idle.
    pub fn tick<A>(&mut self, aggregator: &A) -> Option<CombineReport<M, C>>
    where
        A: Aggregator<Mesh = M, Collider = C>,
    {
        let job = self.job.as_mut()?;
        match job.process_next_group(aggregator) {
            StepStatus::Pending => None,
            StepStatus::Done => self.job.take().map(CombineJob::into_report),
        }
    }

    /// Cancel the current run and return what it produced so far.
    pub fn cancel(&mut self) -> Option<CombineReport<M, C>> {
        let mut job = self.job.take()?;
        job.cancel();
        Some(job.into_report())
    }

    fn ensure_idle(&self) -> CombineResult<()> {
        if self.job.is_some() {
            tracing::warn!("Combine start denied, wait for the last process to finish");
            return Err(CombineError::Busy);
        }
        Ok(())
    }
}

impl<M, C> Default for Combiner<M, C> {
    fn default() -> Self {
        Self::new(CombineOptions::default())
    }
}
