//! Workflow engine: drives one user turn through the node graph.
//!
//! A turn runs under the thread's lock: load (or create) the state, walk the
//! graph from `init` until it suspends or ends, persist the state, release.
//! Task-level failures never escape as `Err`: they reset the task, append an
//! explanation to the history, and are reported as an event. Only checkpoint
//! failures fail the turn itself.

use tokio::sync::mpsc::{self, UnboundedSender};
use waypoint_types::conversation::{ConversationState, Message};
use waypoint_types::error::{CheckpointError, TaskError};
use waypoint_types::event::{EngineEvent, TurnInput};
use waypoint_types::plan::Step;

use crate::checkpoint::CheckpointStore;
use crate::llm::TextCompletion;
use crate::routing::RoutingCapability;

use super::converse::{ConverseOutcome, converse};
use super::graph::{Node, Transition, route_after_converse, route_after_execute};
use super::locks::ThreadLocks;
use super::parser::PlanParser;
use super::planner::draft_plan;
use super::step_runner::StepExecutor;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// How a turn stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStatus {
    /// Conversation continues; waiting for the next user message.
    AwaitingInput,
    /// A plan ran to completion.
    Completed,
    /// The active task was abandoned.
    Failed { kind: String },
}

/// The persisted state after a turn and how the turn stopped.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: ConversationState,
    pub status: TurnStatus,
}

/// Errors that fail a whole turn.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// User-facing summary of a freshly parsed plan.
pub fn plan_summary(task: &str, steps: &[Step]) -> String {
    let mut out = format!("**Task Detected**: {task}\n\n**Actions Planned**:");
    for step in steps {
        out.push_str(&format!(
            "\n- {} {} ({})",
            step.step_id,
            step.description,
            step.tool_name.reason()
        ));
    }
    out
}

fn emit(events: &UnboundedSender<EngineEvent>, event: EngineEvent) {
    if events.send(event).is_err() {
        tracing::trace!("event receiver dropped, continuing without listener");
    }
}

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

/// Plan-execute engine over injected capabilities.
///
/// Generic over the checkpoint store, text completion and routing so tests
/// can substitute in-memory stubs for every collaborator.
pub struct WorkflowEngine<S, L, R> {
    store: S,
    llm: L,
    router: R,
    parser: PlanParser,
    executor: StepExecutor,
    locks: ThreadLocks,
}

impl<S, L, R> WorkflowEngine<S, L, R>
where
    S: CheckpointStore,
    L: TextCompletion,
    R: RoutingCapability,
{
    pub fn new(store: S, llm: L, router: R) -> Self {
        Self {
            store,
            llm,
            router,
            parser: PlanParser::default(),
            executor: StepExecutor::default(),
            locks: ThreadLocks::new(),
        }
    }

    pub fn with_parser(mut self, parser: PlanParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_executor(mut self, executor: StepExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read a thread's persisted state, waiting for any in-flight turn.
    pub async fn thread(&self, thread_id: &str) -> Result<Option<ConversationState>, EngineError> {
        let guard = self.locks.acquire(thread_id).await;
        let loaded = self.store.load(thread_id).await;
        drop(guard);
        self.locks.prune();
        Ok(loaded?)
    }

    /// Delete a thread's persisted state. Returns `true` if it existed.
    pub async fn reset_thread(&self, thread_id: &str) -> Result<bool, EngineError> {
        let guard = self.locks.acquire(thread_id).await;
        let deleted = self.store.delete(thread_id).await;
        drop(guard);
        self.locks.prune();

        let existed = deleted?;
        tracing::info!(thread_id, existed, "thread reset");
        Ok(existed)
    }

    /// Run one turn, sending events as they occur.
    ///
    /// A closed receiver does not stop the turn: it runs to completion and
    /// persists so an in-flight routing call is never abandoned.
    pub async fn run_turn(
        &self,
        input: TurnInput,
        events: &UnboundedSender<EngineEvent>,
    ) -> Result<TurnOutcome, EngineError> {
        let guard = self.locks.acquire(&input.thread_id).await;
        let result = self.run_locked(&input, events).await;
        drop(guard);
        self.locks.prune();
        result
    }

    /// Run one turn and collect its events.
    pub async fn invoke(
        &self,
        input: TurnInput,
    ) -> Result<(TurnOutcome, Vec<EngineEvent>), EngineError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let outcome = self.run_turn(input, &tx).await?;
        drop(tx);

        let mut collected = Vec::new();
        while let Ok(event) = rx.try_recv() {
            collected.push(event);
        }
        Ok((outcome, collected))
    }

    async fn run_locked(
        &self,
        input: &TurnInput,
        events: &UnboundedSender<EngineEvent>,
    ) -> Result<TurnOutcome, EngineError> {
        let mut state = match self.store.load(&input.thread_id).await? {
            Some(state) => state,
            None => {
                tracing::info!(thread_id = %input.thread_id, "starting new thread");
                ConversationState::new(&input.thread_id)
            }
        };

        let status = self.drive(&mut state, input, events).await;

        state.touch();
        self.store.save(&state).await?;

        tracing::debug!(
            thread_id = %state.thread_id,
            messages = state.messages.len(),
            status = ?status,
            "turn persisted"
        );

        Ok(TurnOutcome { state, status })
    }

    async fn drive(
        &self,
        state: &mut ConversationState,
        input: &TurnInput,
        events: &UnboundedSender<EngineEvent>,
    ) -> TurnStatus {
        let mut node = Node::Init;
        loop {
            let transition = match node {
                Node::Init => {
                    init(state, input);
                    Ok(Transition::Goto(Node::Converse))
                }
                Node::Converse => self.converse_node(state, events).await,
                Node::Plan => self.plan_node(state, events).await,
                Node::Execute => self.execute_node(state).await,
                Node::Finish => {
                    finish(state, events);
                    Ok(Transition::End)
                }
            };

            match transition {
                Ok(Transition::Goto(next)) => {
                    tracing::debug!(thread_id = %state.thread_id, from = %node, to = %next, "transition");
                    node = next;
                }
                Ok(Transition::Suspend) => return TurnStatus::AwaitingInput,
                Ok(Transition::End) => return TurnStatus::Completed,
                Err(err) => {
                    let kind = err.kind().to_string();
                    abandon(state, node, err, events);
                    return TurnStatus::Failed { kind };
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    async fn converse_node(
        &self,
        state: &mut ConversationState,
        events: &UnboundedSender<EngineEvent>,
    ) -> Result<Transition, TaskError> {
        match converse(&self.llm, state).await? {
            ConverseOutcome::Conversational { reply } => {
                state.messages.push(Message::assistant(reply.clone()));
                emit(events, EngineEvent::Reply { content: reply });
            }
            ConverseOutcome::Finalized { task, reply } => {
                tracing::info!(thread_id = %state.thread_id, task = %task, "task finalized");
                state.messages.push(Message::assistant(reply.clone()));
                state.task_ready = true;
                state.task = Some(task);
                emit(events, EngineEvent::Reply { content: reply });
            }
        }
        Ok(route_after_converse(state))
    }

    async fn plan_node(
        &self,
        state: &mut ConversationState,
        events: &UnboundedSender<EngineEvent>,
    ) -> Result<Transition, TaskError> {
        let task = state.task.clone().unwrap_or_default();
        let plan_text = draft_plan(&self.llm, &task, self.parser.max_steps()).await?;
        state.plan_text = Some(plan_text.clone());

        let steps = self.parser.parse(&plan_text)?;
        tracing::info!(thread_id = %state.thread_id, steps = steps.len(), "plan parsed");

        state.steps = steps.clone();
        state.results.clear();
        state.messages.push(Message::assistant(plan_summary(&task, &steps)));
        emit(
            events,
            EngineEvent::PlanReady {
                task,
                plan_text,
                steps,
            },
        );
        Ok(Transition::Goto(Node::Execute))
    }

    async fn execute_node(&self, state: &mut ConversationState) -> Result<Transition, TaskError> {
        if let Some(step) = state.next_step().cloned() {
            let result = self
                .executor
                .execute(&self.router, &step, &state.results)
                .await?;
            state.results.push(result);
            if state.plan_complete() {
                state.optimal_path = state.results.last().map(|r| r.value.clone());
            }
        }
        Ok(route_after_execute(state))
    }
}

fn init(state: &mut ConversationState, input: &TurnInput) {
    state.messages.push(Message::user(input.message.clone()));
    state.should_execute = input.flags.should_execute.unwrap_or(false);
    state.has_optimal_path = input.flags.has_optimal_path.unwrap_or(false);
    state.task_ready = false;
    state.chain_finished = false;
}

fn finish(state: &mut ConversationState, events: &UnboundedSender<EngineEvent>) {
    let task = state.task.clone().unwrap_or_default();
    let optimal_path = state.optimal_path.clone().unwrap_or_default();
    let execute = state.should_execute;
    let summary = format!("Optimal path found for: {task}");

    tracing::info!(thread_id = %state.thread_id, execute, "task completed");

    state.messages.push(Message::assistant(summary.clone()));
    state.reset_task();
    state.chain_finished = true;

    emit(
        events,
        EngineEvent::Completed {
            task,
            summary,
            optimal_path,
            execute,
        },
    );
}

fn abandon(
    state: &mut ConversationState,
    node: Node,
    err: TaskError,
    events: &UnboundedSender<EngineEvent>,
) {
    tracing::warn!(
        thread_id = %state.thread_id,
        node = %node,
        kind = err.kind(),
        error = %err,
        "task abandoned"
    );

    let message = format!("I couldn't complete this task: {err}");
    state.messages.push(Message::assistant(message.clone()));
    state.reset_task();

    emit(
        events,
        EngineEvent::TaskFailed {
            kind: err.kind().to_string(),
            message,
        },
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
