use crate::{
    condition, runner::LAUNCH_FAILED_EXIT_CODE, Excitation, ExecutorError, FileNeuronRunner,
    HistoryManager, NeuronRunner, OutputSink,
};
use axoncore::{
    parse_duration, Backoff, ExecutionMode, ExecutionRecord, ExecutionStatus, NeuronRef,
    NeuronResult, NeuronStatus, Synapse,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use uuid::Uuid;

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Fires synapses: dependency-aware scheduling, retry/backoff, condition
/// gating, rollback dispatch, and history hand-off.
///
/// Instances are independent; multiple executors may run in one process.
/// The environment map feeds condition evaluation and must be set before a
/// run starts — `set_environment` takes `&mut self` so the borrow checker
/// rules out mutation while an `execute` borrow is live.
pub struct Executor {
    runner: Arc<dyn NeuronRunner>,
    history: Option<Arc<HistoryManager>>,
    environment: Arc<HashMap<String, String>>,
    out: OutputSink,
}

impl Executor {
    pub fn new(history: Option<Arc<HistoryManager>>, out: OutputSink) -> Self {
        Self::with_runner(Arc::new(FileNeuronRunner), history, out)
    }

    pub fn with_runner(
        runner: Arc<dyn NeuronRunner>,
        history: Option<Arc<HistoryManager>>,
        out: OutputSink,
    ) -> Self {
        Self {
            runner,
            history,
            environment: Arc::new(HashMap::new()),
            out,
        }
    }

    /// Set the environment map used for condition evaluation.
    pub fn set_environment(&mut self, environment: HashMap<String, String>) {
        self.environment = Arc::new(environment);
    }

    /// Fire a synapse. The caller is expected to have validated it.
    ///
    /// Returns the finalized execution record on a completed run (status
    /// `success` or `partial`); hard scheduling errors (timeout, deadlock,
    /// stop-on-error abort) come back as `Err`. Either way the record is
    /// handed to the history store first; persistence failures are logged
    /// and never change the run's outcome.
    pub async fn execute(
        &self,
        synapse: &Synapse,
        synapse_dir: &Path,
    ) -> Result<ExecutionRecord, ExecutorError> {
        let execution_id = Uuid::new_v4();
        let started = Instant::now();

        tracing::info!(
            synapse = %synapse.name,
            id = %execution_id,
            "starting synapse execution"
        );

        let deadline = match synapse.timeout_duration() {
            Ok(Some(timeout)) if !timeout.is_zero() => Some(started + timeout),
            Ok(_) => None,
            Err(e) => return Err(ExecutorError::InvalidTimeout(e)),
        };

        let mut record = ExecutionRecord::started(execution_id, &synapse.name);
        let ctx = Arc::new(RunContext {
            runner: Arc::clone(&self.runner),
            environment: Arc::clone(&self.environment),
            out: self.out.clone(),
            synapse_dir: synapse_dir.to_path_buf(),
            deadline,
        });

        let outcome = match synapse.execution {
            ExecutionMode::Parallel => execute_parallel(&ctx, synapse, &mut record).await,
            ExecutionMode::Sequential => execute_sequential(&ctx, synapse, &mut record).await,
        };

        record.duration_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Err(err) => {
                record.status = ExecutionStatus::Failed;
                record.error_message = Some(err.to_string());
            }
            Ok(()) => {
                let all_ok = record
                    .neuron_results
                    .iter()
                    .all(|r| r.status != NeuronStatus::Failed);
                record.status = if all_ok {
                    ExecutionStatus::Success
                } else {
                    ExecutionStatus::Partial
                };
            }
        }

        if let Some(history) = &self.history {
            if let Err(err) = history.add_execution(&synapse.name, record.clone()) {
                tracing::error!(synapse = %synapse.name, error = %err, "failed to save execution history");
            }
        }

        outcome.map(|()| record)
    }
}

/// Per-run state shared with spawned parallel tasks. Scoped to one
/// `execute` call; nothing here crosses runs.
struct RunContext {
    runner: Arc<dyn NeuronRunner>,
    environment: Arc<HashMap<String, String>>,
    out: OutputSink,
    synapse_dir: PathBuf,
    deadline: Option<Instant>,
}

impl RunContext {
    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn condition_met(&self, neuron: &NeuronRef) -> bool {
        condition::evaluate(neuron.condition.as_deref().unwrap_or(""), &self.environment)
    }
}

async fn execute_sequential(
    ctx: &RunContext,
    synapse: &Synapse,
    record: &mut ExecutionRecord,
) -> Result<(), ExecutorError> {
    for neuron in &synapse.neurons {
        if ctx.expired() {
            return Err(ExecutorError::Timeout);
        }

        if !ctx.condition_met(neuron) {
            ctx.out
                .line(format!("Skipping: {} (condition not met)", neuron.name));
            record.neuron_results.push(NeuronResult::skipped(&neuron.name));
            continue;
        }

        let result = run_with_retry(ctx, neuron).await;
        let failure = (result.status == NeuronStatus::Failed)
            .then(|| result.error.clone().unwrap_or_default());
        record.neuron_results.push(result);

        if let Some(error) = failure {
            if !neuron.on_failure.is_empty() {
                ctx.out.line(format!("Executing rollback for {}", neuron.name));
                for rollback in &neuron.on_failure {
                    run_rollback(ctx, rollback).await;
                }
            }

            if synapse.stop_on_error {
                ctx.out.line(format!(
                    "Stopping execution due to error in {}",
                    neuron.name
                ));
                return Err(ExecutorError::NeuronFailed {
                    name: neuron.name.clone(),
                    error,
                });
            }
        }
    }

    Ok(())
}

#[derive(Default)]
struct BatchState {
    results: Vec<NeuronResult>,
    completed: HashSet<String>,
}

async fn execute_parallel(
    ctx: &Arc<RunContext>,
    synapse: &Synapse,
    record: &mut ExecutionRecord,
) -> Result<(), ExecutorError> {
    let concurrency = synapse.effective_concurrency();
    ctx.out
        .line(format!("Executing in parallel (max concurrency: {concurrency})"));

    let mut ready: VecDeque<NeuronRef> = VecDeque::new();
    let mut waiting: Vec<NeuronRef> = Vec::new();
    for neuron in &synapse.neurons {
        if neuron.depends_on.is_empty() {
            ready.push_back(neuron.clone());
        } else {
            waiting.push(neuron.clone());
        }
    }

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let state = Arc::new(Mutex::new(BatchState::default()));

    let outcome = loop {
        if ready.is_empty() && waiting.is_empty() {
            break Ok(());
        }

        // Launch the whole ready batch; the semaphore bounds how many
        // actually run at once.
        let mut batch = JoinSet::new();
        while let Some(neuron) = ready.pop_front() {
            let ctx = Arc::clone(ctx);
            let state = Arc::clone(&state);
            let semaphore = Arc::clone(&semaphore);
            batch.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                run_parallel_neuron(&ctx, &neuron, &state).await;
            });
        }
        while batch.join_next().await.is_some() {}

        // Promote waiting neurons whose dependencies have all completed.
        // Completion, not success, unblocks dependents.
        {
            let guard = state.lock().await;
            let mut still_waiting = Vec::new();
            for neuron in waiting.drain(..) {
                if neuron.depends_on.iter().all(|d| guard.completed.contains(d)) {
                    ready.push_back(neuron);
                } else {
                    still_waiting.push(neuron);
                }
            }
            waiting = still_waiting;
        }

        // Unreachable given upstream cycle validation, but detected
        // rather than spinning forever.
        if ready.is_empty() && !waiting.is_empty() {
            break Err(ExecutorError::DeadlockDetected);
        }
    };

    record.neuron_results = state.lock().await.results.clone();
    outcome
}

async fn run_parallel_neuron(ctx: &RunContext, neuron: &NeuronRef, state: &Mutex<BatchState>) {
    if !ctx.condition_met(neuron) {
        ctx.out
            .line(format!("Skipping: {} (condition not met)", neuron.name));
        let mut state = state.lock().await;
        state.results.push(NeuronResult::skipped(&neuron.name));
        state.completed.insert(neuron.name.clone());
        return;
    }

    let result = run_with_retry(ctx, neuron).await;
    let failed = result.status == NeuronStatus::Failed;
    {
        let mut state = state.lock().await;
        state.results.push(result);
        state.completed.insert(neuron.name.clone());
    }

    if failed && !neuron.on_failure.is_empty() {
        ctx.out.line(format!("Executing rollback for {}", neuron.name));
        for rollback in &neuron.on_failure {
            run_rollback(ctx, rollback).await;
        }
    }
}

/// Run one neuron with its retry policy applied.
///
/// Success means exit code 0 with no launch error on some attempt.
/// Cancellation is re-checked before every attempt, the first included; a
/// tripped deadline yields a failed result without further attempts. The
/// result's duration covers all attempts including backoff sleeps.
async fn run_with_retry(ctx: &RunContext, neuron: &NeuronRef) -> NeuronResult {
    let policy = neuron.retry.clone().unwrap_or_default();
    let max_attempts = policy.max_attempts.max(1);
    let initial_delay = match policy.initial_delay.as_deref() {
        None | Some("") => DEFAULT_INITIAL_DELAY,
        Some(raw) => parse_duration(raw).unwrap_or_else(|_| {
            tracing::warn!(neuron = %neuron.name, delay = raw, "invalid retry delay, using default");
            DEFAULT_INITIAL_DELAY
        }),
    };

    let mut result = NeuronResult::new(&neuron.name);
    let started = Instant::now();
    let mut last_error: Option<String> = None;

    for attempt in 1..=max_attempts {
        if ctx.expired() {
            result.status = NeuronStatus::Failed;
            result.error = Some(ExecutorError::Timeout.to_string());
            result.duration_ms = started.elapsed().as_millis() as u64;
            return result;
        }

        if attempt > 1 {
            let delay = backoff_delay(initial_delay, attempt, policy.backoff);
            ctx.out.line(format!(
                "Retry attempt {attempt}/{max_attempts} for {} (waiting {delay:?})",
                neuron.name
            ));
            tokio::time::sleep(delay).await;
        }

        ctx.out.line(format!("Executing: {}", neuron.name));

        match ctx
            .runner
            .excite(&neuron.name, &ctx.synapse_dir, &ctx.out)
            .await
        {
            Ok(Excitation {
                exit_code,
                stdout,
                stderr,
            }) => {
                result.exit_code = exit_code;
                result.stdout = stdout;
                result.stderr = stderr;
                if exit_code == 0 {
                    result.status = NeuronStatus::Success;
                    result.duration_ms = started.elapsed().as_millis() as u64;
                    return result;
                }
                last_error = Some(format!("exit code {exit_code}"));
            }
            Err(err) => {
                result.exit_code = LAUNCH_FAILED_EXIT_CODE;
                last_error = Some(err.to_string());
            }
        }
    }

    result.status = NeuronStatus::Failed;
    result.duration_ms = started.elapsed().as_millis() as u64;
    result.error = last_error;
    result
}

/// Dispatch one rollback neuron, best-effort. Failures are logged so they
/// never mask the original failure's report.
async fn run_rollback(ctx: &RunContext, name: &str) {
    ctx.out.line(format!("Executing: {name}"));
    match ctx.runner.excite(name, &ctx.synapse_dir, &ctx.out).await {
        Ok(excitation) if excitation.exit_code != 0 => {
            tracing::warn!(
                neuron = name,
                exit_code = excitation.exit_code,
                "rollback neuron exited non-zero"
            );
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(neuron = name, error = %err, "rollback neuron failed");
        }
    }
}

/// Wait before attempt `attempt` (≥ 2). The first retry waits exactly the
/// base delay under both strategies; linear then grows by the base per
/// retry and exponential doubles.
fn backoff_delay(initial_delay: Duration, attempt: u32, backoff: Backoff) -> Duration {
    match backoff {
        Backoff::Linear => initial_delay * attempt.saturating_sub(1),
        Backoff::Exponential => initial_delay * (1u32 << attempt.saturating_sub(2).min(31)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_backoff_grows_by_base() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 2, Backoff::Linear), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 3, Backoff::Linear), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 4, Backoff::Linear), Duration::from_secs(3));
    }

    #[test]
    fn exponential_backoff_doubles_after_first_retry() {
        let base = Duration::from_secs(1);
        assert_eq!(
            backoff_delay(base, 2, Backoff::Exponential),
            Duration::from_secs(1)
        );
        assert_eq!(
            backoff_delay(base, 3, Backoff::Exponential),
            Duration::from_secs(2)
        );
        assert_eq!(
            backoff_delay(base, 4, Backoff::Exponential),
            Duration::from_secs(4)
        );
    }
}
