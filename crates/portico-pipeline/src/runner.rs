//! Chain composition and execution.
//!
//! [`Pipeline`] owns an ordered list of steps and executes them for
//! exactly one request, ending in a caller-supplied terminal
//! function. Two strategies are available; both produce identical
//! side-effect ordering and identical responses, a property the
//! integration suite pins down.

use portico_core::{HttpResult, RequestContext, ResponseWriter};

use crate::error_handler::ErrorHandler;
use crate::middleware::{Next, Terminal};
use crate::step::PipelineStep;

/// How the chain is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainStrategy {
    /// Build a nested continuation per request. One boxed `Next` per
    /// step; the natural, direct encoding.
    #[default]
    Recursive,
    /// Walk a cursor over the step slice. No per-step continuation
    /// allocation, which keeps deep stacks cheap.
    Iterative,
}

/// An ordered middleware chain executed once per request.
///
/// # Example
///
/// ```rust
/// use portico_pipeline::{ChainStrategy, Pipeline, PipelineStep, PredicateGuard};
/// use portico_core::RequestContext;
///
/// let pipeline = Pipeline::new(ChainStrategy::Recursive)
///     .with_step(PipelineStep::guard(PredicateGuard::new("open", |_: &RequestContext| true)));
///
/// assert_eq!(pipeline.stage_names(), vec!["open"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    strategy: ChainStrategy,
}

impl Pipeline {
    /// Creates an empty pipeline with the given strategy.
    #[must_use]
    pub fn new(strategy: ChainStrategy) -> Self {
        Self {
            steps: Vec::new(),
            strategy,
        }
    }

    /// Creates a pipeline from pre-assembled steps.
    #[must_use]
    pub fn from_steps(steps: Vec<PipelineStep>, strategy: ChainStrategy) -> Self {
        Self { steps, strategy }
    }

    /// Appends a step.
    #[must_use]
    pub fn with_step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends a middleware step.
    #[must_use]
    pub fn with_middleware<M: crate::Middleware>(self, middleware: M) -> Self {
        self.with_step(PipelineStep::middleware(middleware))
    }

    /// Appends a guard step.
    #[must_use]
    pub fn with_guard<G: crate::Guard>(self, guard: G) -> Self {
        self.with_step(PipelineStep::guard(guard))
    }

    /// Appends an interceptor step.
    #[must_use]
    pub fn with_interceptor<I: crate::Interceptor>(self, interceptor: I) -> Self {
        self.with_step(PipelineStep::interceptor(interceptor))
    }

    /// Returns the steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Returns the configured strategy.
    #[must_use]
    pub fn strategy(&self) -> ChainStrategy {
        self.strategy
    }

    /// Returns the step names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(PipelineStep::name).collect()
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.steps.len()
    }

    /// Executes the chain for one request.
    ///
    /// Each step runs in registration order; the terminal function
    /// runs when every step has continued. Errors from any step or
    /// the terminal propagate to the caller untouched.
    ///
    /// # Errors
    ///
    /// Whatever the first failing step or the terminal returned.
    pub async fn run(
        &self,
        req: &mut RequestContext,
        res: &mut ResponseWriter,
        terminal: &Terminal,
    ) -> HttpResult<()> {
        match self.strategy {
            ChainStrategy::Iterative => Next::cursor(&self.steps, terminal).run(req, res).await,
            ChainStrategy::Recursive => {
                let mut next = Next::terminal(terminal);
                for step in self.steps.iter().rev() {
                    next = Next::chain(step, next);
                }
                next.run(req, res).await
            }
        }
    }

    /// Executes the chain and routes any error into the handler.
    ///
    /// This is the single outermost catch of the escape path: no step
    /// recovers partially, and the handler is invoked at most once
    /// per request.
    pub async fn run_with_handler(
        &self,
        req: &mut RequestContext,
        res: &mut ResponseWriter,
        terminal: &Terminal,
        error_handler: &dyn ErrorHandler,
    ) {
        if let Err(error) = self.run(req, res, terminal).await {
            error_handler.handle(req, res, error).await;
        }
    }
}
