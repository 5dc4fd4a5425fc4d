//! Main execution engine - interprets a pipeline's step tree

use crate::{
    ability::AbilityInvoker,
    core::{
        condition::Condition,
        value::type_name,
        variables::{resolve, resolve_map},
        EngineError, ExecutionLimits, ExecutionStats, Pipeline, PipelineContext, Step,
    },
    execution::{EventHandler, ExecutionEvent, ExecutionResult},
    transform::TransformRegistry,
    validation::PipelineValidator,
};
use futures::future::{join_all, BoxFuture, FutureExt};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Variable bound to the caught error while a catch branch runs
const ERROR_VARIABLE: &str = "error";

/// A step error together with the path of the step that raised it
#[derive(Debug)]
struct Failure {
    path: String,
    error: EngineError,
}

impl Failure {
    fn at(path: &str, error: EngineError) -> Self {
        Self {
            path: path.to_string(),
            error,
        }
    }
}

type StepResult = Result<Value, Failure>;

/// Counters shared by every scope of one execution, sub-pipelines included
struct RunState {
    limits: ExecutionLimits,
    started: Instant,
    stats: Mutex<ExecutionStats>,
}

impl RunState {
    fn new(limits: ExecutionLimits) -> Self {
        Self {
            limits,
            started: Instant::now(),
            stats: Mutex::new(ExecutionStats::new()),
        }
    }

    fn stats(&self) -> std::sync::MutexGuard<'_, ExecutionStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_depth(&self, depth: usize) -> Result<(), EngineError> {
        if depth > self.limits.max_depth {
            return Err(EngineError::DepthLimitExceeded {
                limit: self.limits.max_depth,
            });
        }
        Ok(())
    }

    /// Timeout and step budget, checked before every step
    fn admit(&self, step: &Step) -> Result<(), EngineError> {
        if self.started.elapsed() >= self.limits.timeout() {
            return Err(EngineError::TimeoutExceeded {
                seconds: self.limits.timeout_secs,
            });
        }

        let mut stats = self.stats();
        if stats.steps_executed >= self.limits.max_steps {
            return Err(EngineError::StepLimitExceeded {
                limit: self.limits.max_steps,
            });
        }
        stats.record_step(step.kind().as_str());
        Ok(())
    }

    fn observe(&self, context: &PipelineContext) {
        self.stats().observe_memory(context.approximate_size());
    }

    fn finish(&self) -> ExecutionStats {
        let mut stats = self.stats().clone();
        stats.duration = self.started.elapsed().as_secs_f64();
        stats
    }
}

fn child_path(path: &str, label: &str) -> String {
    format!("{}.{}", path, label)
}

/// Pipeline execution engine
///
/// Holds the ability invoker and transform catalog; each call to
/// [`execute`](Self::execute) is an independent run with its own context,
/// counters and statistics.
pub struct ExecutionEngine<A> {
    invoker: A,
    transforms: TransformRegistry,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl<A: AbilityInvoker> ExecutionEngine<A> {
    pub fn new(invoker: A) -> Self {
        Self {
            invoker,
            transforms: TransformRegistry::new(),
            event_handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the transform catalog
    pub fn with_transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    pub fn invoker(&self) -> &A {
        &self.invoker
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        let handlers = self
            .event_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Validator configured with this engine's transform catalog
    pub fn validator(&self) -> PipelineValidator {
        PipelineValidator::new().with_known_transforms(self.transforms.names())
    }

    /// Validate and run a raw pipeline definition
    ///
    /// Structural problems are reported as a `ValidationError` result
    /// without running any step.
    pub async fn execute(
        &self,
        definition: &Value,
        context: Value,
        limits: &ExecutionLimits,
    ) -> ExecutionResult {
        let mut validator = self.validator();
        if !validator.validate(definition) {
            let err = EngineError::Validation(validator.errors().to_vec());
            warn!("Pipeline rejected: {}", err);
            return ExecutionResult::failed(err.to_info(None), context, ExecutionStats::new());
        }

        match Pipeline::from_value(definition) {
            Ok(pipeline) => self.execute_pipeline(&pipeline, context, limits).await,
            Err(err) => {
                warn!("Pipeline rejected: {}", err);
                ExecutionResult::failed(err.to_info(None), context, ExecutionStats::new())
            }
        }
    }

    /// Run an already decoded pipeline
    pub async fn execute_pipeline(
        &self,
        pipeline: &Pipeline,
        context: Value,
        limits: &ExecutionLimits,
    ) -> ExecutionResult {
        let run = RunState::new(*limits);
        let execution_id = run.stats().execution_id;
        let pipeline_name = pipeline.name.clone().unwrap_or_else(|| "pipeline".to_string());

        info!("Starting pipeline execution: {} ({})", pipeline_name, execution_id);
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline_name.clone(),
            total_steps: pipeline.total_steps(),
        });

        let mut ctx = PipelineContext::from_value(context);
        run.observe(&ctx);
        let outcome = self
            .run_steps(&pipeline.steps, &mut ctx, 0, "steps".to_string(), &run)
            .await;
        let stats = run.finish();

        let result = match outcome {
            Ok(last) => {
                let result = match &pipeline.output {
                    Some(name) => ctx.get(name).cloned().unwrap_or(Value::Null),
                    None => last,
                };
                info!(
                    "Pipeline execution finished: {} - {} steps in {:.3}s",
                    pipeline_name, stats.steps_executed, stats.duration
                );
                ExecutionResult::completed(result, ctx.into_value(), stats)
            }
            Err(Failure { path, error: err }) => {
                let err = if err.is_fatal() {
                    err
                } else {
                    EngineError::UnrecoverableStep {
                        path: path.clone(),
                        source: Box::new(err),
                    }
                };
                error!("Pipeline execution failed: {} - {}", pipeline_name, err);
                ExecutionResult::failed(err.to_info(Some(&path)), ctx.into_value(), stats)
            }
        };

        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id,
            success: result.success,
            steps_executed: result.stats.steps_executed,
            duration: result.stats.duration,
        });
        result
    }

    /// Run a step list in `ctx`, returning the last step's result
    ///
    /// `depth` is the nesting level of this list; the top level is 0.
    fn run_steps<'a>(
        &'a self,
        steps: &'a [Step],
        ctx: &'a mut PipelineContext,
        depth: usize,
        list_path: String,
        run: &'a RunState,
    ) -> BoxFuture<'a, StepResult> {
        async move {
            run.check_depth(depth)
                .map_err(|e| Failure::at(&list_path, e))?;

            let mut last = Value::Null;
            for (i, step) in steps.iter().enumerate() {
                let path = format!("{}[{}]", list_path, i);
                last = self.run_step(step, ctx, depth, path, run).await?;
            }
            Ok(last)
        }
        .boxed()
    }

    /// Run one step: limit checks, dispatch, output binding
    fn run_step<'a>(
        &'a self,
        step: &'a Step,
        ctx: &'a mut PipelineContext,
        depth: usize,
        path: String,
        run: &'a RunState,
    ) -> BoxFuture<'a, StepResult> {
        async move {
            run.admit(step).map_err(|e| Failure::at(&path, e))?;

            debug!("Executing step {} ({})", path, step.describe());
            self.emit_event(ExecutionEvent::StepStarted {
                path: path.clone(),
                step_type: step.kind(),
                description: step.describe(),
                depth,
            });

            match self.dispatch(step, ctx, depth, &path, run).await {
                Ok(value) => {
                    if let Some(name) = step.output() {
                        debug!("Binding ${} from step {}", name, path);
                        ctx.set(name, value.clone());
                    }
                    run.observe(ctx);
                    self.emit_event(ExecutionEvent::StepCompleted {
                        path,
                        step_type: step.kind(),
                    });
                    Ok(value)
                }
                Err(failure) => {
                    if failure.path == path {
                        debug!("Step {} failed: {}", path, failure.error);
                        self.emit_event(ExecutionEvent::StepFailed {
                            path,
                            error: failure.error.to_string(),
                        });
                    }
                    Err(failure)
                }
            }
        }
        .boxed()
    }

    async fn dispatch(
        &self,
        step: &Step,
        ctx: &mut PipelineContext,
        depth: usize,
        path: &str,
        run: &RunState,
    ) -> StepResult {
        let here = |e: EngineError| Failure::at(path, e);

        match step {
            Step::Ability { ability, input, .. } => {
                let input = resolve(input, ctx).map_err(here)?;
                self.invoke(ability, input).await.map_err(here)
            }

            Step::Transform {
                operation,
                input,
                params,
                ..
            } => {
                let data = resolve(input, ctx).map_err(here)?;
                let params = resolve_map(params, ctx).map_err(here)?;
                self.transforms
                    .execute(operation, data, &params)
                    .map_err(here)
            }

            Step::Conditional {
                condition,
                then,
                otherwise,
                ..
            } => self.run_conditional(condition, then, otherwise, ctx, depth, path, run).await,

            Step::Loop {
                input,
                steps,
                item_var,
                index_var,
                collect,
                ..
            } => {
                let items = match resolve(input, ctx).map_err(here)? {
                    Value::Array(items) => items
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| (Value::from(i), item))
                        .collect::<Vec<_>>(),
                    Value::Object(map) => map
                        .into_iter()
                        .map(|(key, item)| (Value::String(key), item))
                        .collect(),
                    other => {
                        return Err(here(EngineError::InvalidStepInput {
                            step_type: "loop".to_string(),
                            message: format!(
                                "input must be an array or object, got {}",
                                type_name(&other)
                            ),
                        }));
                    }
                };

                let body_path = child_path(path, "steps");
                let mut collected = Vec::with_capacity(items.len());
                for (index, item) in items {
                    let mut scope = ctx.fork();
                    scope.set(item_var.as_str(), item);
                    if let Some(index_var) = index_var {
                        scope.set(index_var.as_str(), index);
                    }

                    let last = self
                        .run_steps(steps, &mut scope, depth + 1, body_path.clone(), run)
                        .await?;
                    collected.push(match collect {
                        Some(name) => scope.get(name).cloned().unwrap_or(Value::Null),
                        None => last,
                    });
                }
                Ok(Value::Array(collected))
            }

            Step::Parallel { steps, .. } => self.run_parallel(steps, ctx, depth, path, run).await,

            Step::TryCatch {
                attempt,
                recover,
                always,
                ..
            } => {
                self.run_try_catch(attempt, recover.as_deref(), always, ctx, depth, path, run)
                    .await
            }

            Step::SubPipeline {
                pipeline, inputs, ..
            } => {
                let mut scope = PipelineContext::from(resolve_map(inputs, ctx).map_err(here)?);
                debug!("Entering sub-pipeline at {}", path);
                let last = self
                    .run_steps(
                        &pipeline.steps,
                        &mut scope,
                        depth + 1,
                        child_path(path, "pipeline.steps"),
                        run,
                    )
                    .await?;
                Ok(match &pipeline.output {
                    Some(name) => scope.get(name).cloned().unwrap_or(Value::Null),
                    None => last,
                })
            }
        }
    }

    async fn invoke(&self, name: &str, input: Value) -> Result<Value, EngineError> {
        let ability = self
            .invoker
            .resolve(name)
            .ok_or_else(|| EngineError::AbilityNotFound {
                name: name.to_string(),
            })?;
        debug!("Invoking ability {}", name);
        ability
            .execute(input)
            .await
            .map_err(|source| EngineError::AbilityExecution {
                ability: name.to_string(),
                source,
            })
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_conditional(
        &self,
        condition: &Condition,
        then: &[Step],
        otherwise: &[Step],
        ctx: &mut PipelineContext,
        depth: usize,
        path: &str,
        run: &RunState,
    ) -> StepResult {
        let matched = condition
            .evaluate(ctx)
            .map_err(|e| Failure::at(path, e))?;
        let (branch, label) = if matched {
            (then, "then")
        } else {
            (otherwise, "else")
        };
        debug!("Condition at {} is {}, taking '{}'", path, matched, label);

        if branch.is_empty() {
            return Ok(Value::Null);
        }
        // Branches share the enclosing scope
        self.run_steps(branch, ctx, depth + 1, child_path(path, label), run)
            .await
    }

    /// Run every branch to completion on its own fork, then merge outputs in declaration order
    async fn run_parallel(
        &self,
        branches: &[Step],
        ctx: &mut PipelineContext,
        depth: usize,
        path: &str,
        run: &RunState,
    ) -> StepResult {
        let branch_depth = depth + 1;
        let list_path = child_path(path, "steps");
        run.check_depth(branch_depth)
            .map_err(|e| Failure::at(&list_path, e))?;

        let forks: Vec<PipelineContext> = branches.iter().map(|_| ctx.fork()).collect();
        let pending = branches.iter().zip(forks).enumerate().map(|(i, (branch, mut scope))| {
            let branch_path = format!("{}[{}]", list_path, i);
            async move {
                let outcome = self
                    .run_step(branch, &mut scope, branch_depth, branch_path, run)
                    .await;
                (outcome, scope)
            }
        });
        let finished = join_all(pending).await;

        let mut results = Vec::with_capacity(finished.len());
        let mut failure: Option<Failure> = None;
        for (branch, (outcome, scope)) in branches.iter().zip(finished) {
            match outcome {
                Ok(value) => {
                    if let Some(name) = branch.output() {
                        ctx.set(name, scope.get(name).cloned().unwrap_or(Value::Null));
                    }
                    results.push(value);
                }
                Err(f) => {
                    let replace = match &failure {
                        None => true,
                        Some(first) => f.error.is_fatal() && !first.error.is_fatal(),
                    };
                    if replace {
                        failure = Some(f);
                    }
                    results.push(Value::Null);
                }
            }
        }

        match failure {
            Some(f) => Err(f),
            None => Ok(Value::Array(results)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_try_catch(
        &self,
        attempt: &[Step],
        recover: Option<&[Step]>,
        always: &[Step],
        ctx: &mut PipelineContext,
        depth: usize,
        path: &str,
        run: &RunState,
    ) -> StepResult {
        // try runs on a fork so a failure leaves no partial writes behind
        let mut scope = ctx.fork();
        let outcome = match self
            .run_steps(attempt, &mut scope, depth + 1, child_path(path, "try"), run)
            .await
        {
            Ok(value) => {
                *ctx = scope;
                Ok(value)
            }
            Err(failure) if failure.error.is_fatal() => return Err(failure),
            Err(failure) => match recover {
                None => Err(failure),
                Some(recover) => {
                    warn!(
                        "Recovered from error in {} at {}: {}",
                        path, failure.path, failure.error
                    );
                    self.emit_event(ExecutionEvent::ErrorRecovered {
                        path: path.to_string(),
                        failed_step: failure.path.clone(),
                        error: failure.error.to_string(),
                    });

                    let info = failure.error.to_info(Some(&failure.path));
                    let previous = ctx.remove(ERROR_VARIABLE);
                    ctx.set(ERROR_VARIABLE, serde_json::to_value(info).unwrap_or_default());

                    let caught = self
                        .run_steps(recover, ctx, depth + 1, child_path(path, "catch"), run)
                        .await;

                    match previous {
                        Some(value) => ctx.set(ERROR_VARIABLE, value),
                        None => {
                            ctx.remove(ERROR_VARIABLE);
                        }
                    }
                    caught
                }
            },
        };

        if let Err(failure) = &outcome {
            if failure.error.is_fatal() {
                return outcome;
            }
        }

        if !always.is_empty() {
            // A failure in finally supersedes the outcome
            self.run_steps(always, ctx, depth + 1, child_path(path, "finally"), run)
                .await?;
        }
        outcome
    }
}
