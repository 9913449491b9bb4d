//! Linear multi-step workflows with reverse-order compensation.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{StepError, WorkflowError};
use crate::state::WorkflowStatus;

/// Key under which the caller's input is stored in the data bag.
pub const INITIAL_DATA_KEY: &str = "initial";

/// Results accumulated by a workflow, keyed by step name.
pub type StepData = HashMap<String, Value>;

type ExecuteFn = Box<dyn Fn(&StepData) -> Result<Value, StepError> + Send + Sync>;
type ValidateFn = Box<dyn Fn(&Value) -> Result<(), StepError> + Send + Sync>;
type CompensateFn = Box<dyn Fn(&Value) -> Result<(), StepError> + Send + Sync>;

/// One step of a workflow.
pub struct WorkflowStep {
    name: String,
    execute: ExecuteFn,
    validate: Option<ValidateFn>,
}

impl WorkflowStep {
    /// Creates a step that reads the data bag and returns its result.
    pub fn new<F>(name: impl Into<String>, execute: F) -> Self
    where
        F: Fn(&StepData) -> Result<Value, StepError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            execute: Box::new(execute),
            validate: None,
        }
    }

    /// Checks the step's result before it is recorded.
    pub fn with_validation<F>(mut self, validate: F) -> Self
    where
        F: Fn(&Value) -> Result<(), StepError> + Send + Sync + 'static,
    {
        self.validate = Some(Box::new(validate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStep")
            .field("name", &self.name)
            .field("validated", &self.validate.is_some())
            .finish()
    }
}

/// Undoes a completed step. Receives the step's recorded result.
pub struct CompensationStep {
    name: String,
    compensate: CompensateFn,
}

impl CompensationStep {
    /// Creates the compensation for the step called `name`.
    pub fn new<F>(name: impl Into<String>, compensate: F) -> Self
    where
        F: Fn(&Value) -> Result<(), StepError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            compensate: Box::new(compensate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for CompensationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompensationStep")
            .field("name", &self.name)
            .finish()
    }
}

/// Progress of one workflow execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowState {
    /// Index of the step running or last run.
    pub current_step: usize,

    /// Names of steps whose results were recorded, in execution order.
    pub completed_steps: Vec<String>,

    /// The caller's input under [`INITIAL_DATA_KEY`] plus each completed step's result.
    pub data: StepData,

    pub failed: bool,
    pub status: WorkflowStatus,
}

/// Runs steps in order and compensates completed ones on failure.
///
/// A step's result is validated, then stored in the data bag under the
/// step's name. If a step or its validation fails, compensations run for the
/// completed steps in reverse order, matched by step name. Steps without a
/// compensation are skipped. The first compensation failure stops
/// compensation and is reported together with the original failure.
///
/// A coordinator executes once; create a new one to run again.
#[derive(Debug, Default)]
pub struct WorkflowCoordinator {
    steps: Vec<WorkflowStep>,
    compensations: Vec<CompensationStep>,
    state: WorkflowState,
}

impl WorkflowCoordinator {
    pub fn new(steps: Vec<WorkflowStep>, compensations: Vec<CompensationStep>) -> Self {
        Self {
            steps,
            compensations,
            state: WorkflowState::default(),
        }
    }

    /// Appends a step.
    pub fn step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Adds a compensation.
    pub fn compensation(mut self, compensation: CompensationStep) -> Self {
        self.compensations.push(compensation);
        self
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn status(&self) -> WorkflowStatus {
        self.state.status
    }

    /// Whether the workflow has completed or failed.
    pub fn is_finished(&self) -> bool {
        self.state.status.is_terminal()
    }

    /// Runs every step with `initial` as the caller's input.
    #[tracing::instrument(skip_all, fields(steps = self.steps.len()))]
    pub fn execute(&mut self, initial: Value) -> Result<(), WorkflowError> {
        if !self.state.status.can_run() {
            return Err(WorkflowError::AlreadyExecuted {
                status: self.state.status,
            });
        }

        self.state.status = WorkflowStatus::Running;
        self.state.data.insert(INITIAL_DATA_KEY.to_string(), initial);

        let mut failure = None;
        for (index, step) in self.steps.iter().enumerate() {
            self.state.current_step = index;
            tracing::debug!(step = %step.name, "Workflow step started");

            let result = match (step.execute)(&self.state.data) {
                Ok(result) => result,
                Err(cause) => {
                    let error = WorkflowError::StepFailed {
                        step: step.name.clone(),
                        source: cause.clone(),
                    };
                    failure = Some((step.name.clone(), cause, error));
                    break;
                }
            };

            if let Some(Err(cause)) = step.validate.as_ref().map(|validate| validate(&result)) {
                let error = WorkflowError::ValidationFailed {
                    step: step.name.clone(),
                    source: cause.clone(),
                };
                failure = Some((step.name.clone(), cause, error));
                break;
            }

            self.state.data.insert(step.name.clone(), result);
            self.state.completed_steps.push(step.name.clone());
        }

        if let Some((step, cause, error)) = failure {
            return Err(self.fail(&step, cause, error));
        }

        self.state.status = WorkflowStatus::Completed;
        tracing::info!(steps = self.state.completed_steps.len(), "Workflow completed");
        Ok(())
    }

    /// Marks the workflow failed and compensates. Returns the error to report.
    fn fail(&mut self, failed_step: &str, cause: StepError, failure: WorkflowError) -> WorkflowError {
        tracing::warn!(step = failed_step, error = %cause, "Workflow step failed, compensating");
        self.state.failed = true;

        let outcome = if self.state.status.can_compensate() {
            self.state.status = WorkflowStatus::Compensating;
            self.compensate()
        } else {
            Ok(())
        };
        self.state.status = WorkflowStatus::Failed;

        match outcome {
            Ok(()) => failure,
            Err((compensation_step, source)) => {
                tracing::error!(
                    step = failed_step,
                    compensation_step = %compensation_step,
                    error = %source,
                    "Workflow compensation failed"
                );
                WorkflowError::CompensationFailed {
                    failed_step: failed_step.to_string(),
                    compensation_step,
                    cause,
                    source,
                }
            }
        }
    }

    fn compensate(&self) -> Result<(), (String, StepError)> {
        for name in self.state.completed_steps.iter().rev() {
            let Some(compensation) = self.compensations.iter().find(|c| &c.name == name) else {
                continue;
            };

            metrics::counter!("workflow_compensations_total", "step" => name.clone()).increment(1);
            let result = self.state.data.get(name).unwrap_or(&Value::Null);
            (compensation.compensate)(result).map_err(|e| (name.clone(), e))?;
            tracing::debug!(step = %name, "Compensated workflow step");
        }
        Ok(())
    }
}
