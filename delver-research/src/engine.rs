//! Research orchestration engine
//!
//! Drives the cyclic stage pipeline: query generation, parallel search
//! fan-out with a strict barrier, aggregation, reflection, and answer
//! synthesis. Each run owns its own state and event stream; the engine only
//! shares the language-model client across runs.

use crate::events::{EventStream, ProgressEmitter, ResearchEvent, StreamMode};
use crate::llm::{DemoGenerator, SharedGenerator, SiumaiGenerator};
use crate::planner::QueryPlanner;
use crate::reflector::Reflector;
use crate::searcher::{SearchOutcome, SearchTask, Searcher};
use crate::state::{FinalResult, ResearchPhase, ResearchState};
use crate::synthesizer::Synthesizer;
use crate::{ResearchError, ResearchResult};
use delver_core::{DelverConfig, LlmOptions, ResearchOptions};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Handle to a streaming run: the run id (for cancellation) plus the lazy
/// event sequence
pub struct StreamingRun {
    pub run_id: String,
    pub events: EventStream,
}

/// The stage set cloned into each run's driver task
#[derive(Clone)]
struct Stages {
    planner: QueryPlanner,
    searcher: Searcher,
    reflector: Reflector,
    synthesizer: Synthesizer,
    options: ResearchOptions,
}

/// Deep research engine executing the staged pipeline
pub struct ResearchEngine {
    stages: Stages,
    /// Cancel flags for in-flight runs, keyed by run id
    active_runs: Arc<RwLock<HashMap<String, Arc<AtomicBool>>>>,
}

impl ResearchEngine {
    /// Create an engine from configuration, choosing the demo generator or
    /// the siumai-backed client
    ///
    /// This is the pre-flight boundary: invalid configuration (no credentials
    /// outside demo mode) fails here, before any run starts.
    pub async fn from_config(config: &DelverConfig) -> ResearchResult<Self> {
        config.validate()?;

        let generator: SharedGenerator = if config.demo_mode {
            info!("Demo mode enabled, bypassing the language model");
            Arc::new(DemoGenerator::new())
        } else {
            Arc::new(SiumaiGenerator::new(config.llm.clone()).await?)
        };

        Ok(Self::with_generator(
            generator,
            config.research.clone(),
            &config.llm,
        ))
    }

    /// Create an engine with an explicit generator (used by tests and
    /// embedders)
    pub fn with_generator(
        generator: SharedGenerator,
        options: ResearchOptions,
        llm: &LlmOptions,
    ) -> Self {
        let stages = Stages {
            planner: QueryPlanner::new(
                generator.clone(),
                options.clone(),
                llm.query_model.clone(),
            ),
            searcher: Searcher::new(
                generator.clone(),
                options.clone(),
                llm.search_model.clone(),
            ),
            reflector: Reflector::new(
                generator.clone(),
                options.clone(),
                llm.reflection_model.clone(),
            ),
            synthesizer: Synthesizer::new(generator, llm.answer_model.clone()),
            options,
        };

        Self {
            stages,
            active_runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start a run and subscribe to its progress events
    ///
    /// Fails fast on an empty question, before any stage executes.
    pub async fn run_streaming(
        &self,
        question: &str,
        mode: StreamMode,
    ) -> ResearchResult<StreamingRun> {
        let question = question.trim().to_string();
        if question.is_empty() {
            return Err(ResearchError::validation("Question cannot be empty"));
        }

        let run_id = Uuid::new_v4().to_string();
        let cancel = Arc::new(AtomicBool::new(false));
        self.active_runs
            .write()
            .await
            .insert(run_id.clone(), cancel.clone());

        let (emitter, events) = ProgressEmitter::new(mode);
        let stages = self.stages.clone();
        let active_runs = self.active_runs.clone();
        let driver_run_id = run_id.clone();

        tokio::spawn(async move {
            drive(stages, question, &emitter, &cancel).await;
            active_runs.write().await.remove(&driver_run_id);
        });

        Ok(StreamingRun { run_id, events })
    }

    /// Run to completion and return the terminal payload
    pub async fn run(&self, question: &str) -> ResearchResult<FinalResult> {
        let StreamingRun { mut events, .. } =
            self.run_streaming(question, StreamMode::Values).await?;

        let mut final_result = None;
        let mut run_error = None;
        while let Some(event) = events.next().await {
            match event {
                ResearchEvent::Complete {
                    final_result: result,
                    ..
                } => final_result = Some(result),
                ResearchEvent::Error { error, .. } => run_error = Some(error),
                _ => {}
            }
        }

        final_result.ok_or_else(|| {
            ResearchError::research(
                run_error.unwrap_or_else(|| "Run ended without a final result".to_string()),
            )
        })
    }

    /// Request cancellation of a run
    ///
    /// Honored between stages only: a search fan-out batch that is already
    /// dispatched always completes so every task yields a record.
    pub async fn cancel_run(&self, run_id: &str) -> ResearchResult<()> {
        let runs = self.active_runs.read().await;
        match runs.get(run_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                info!(run_id, "Cancellation requested");
                Ok(())
            }
            None => Err(ResearchError::RunNotFound {
                run_id: run_id.to_string(),
            }),
        }
    }

    /// List the ids of in-flight runs
    pub async fn list_active_runs(&self) -> Vec<String> {
        self.active_runs.read().await.keys().cloned().collect()
    }
}

/// Execute the full state machine for one run
async fn drive(
    stages: Stages,
    question: String,
    emitter: &ProgressEmitter,
    cancel: &AtomicBool,
) {
    let mut state = ResearchState::new(&question);
    info!(question = %question, "Starting research run");

    loop {
        if cancelled(cancel, emitter) {
            return;
        }

        // Query generation. Follow-up rounds re-enter this node, but the
        // fan-out below prefers the follow-up queries produced by reflection.
        emitter.node_start("generate_queries");
        state.current_phase = ResearchPhase::GeneratingQueries;
        let plan = stages
            .planner
            .generate_queries(&state.original_question)
            .await;
        if let Some(error) = plan.error {
            state.record_error(error);
        }
        state.query_list = plan.queries;
        state.rationale = plan.rationale;
        state.current_phase = ResearchPhase::SearchWeb;
        emitter.node_complete("generate_queries");
        emitter.state_update(&state);

        if cancelled(cancel, emitter) {
            return;
        }

        // Search fan-out: one task per query, bounded concurrency, and a
        // strict barrier before aggregation
        let (queries, prefix) = if state.follow_up_queries.is_empty() {
            (state.query_list.clone(), "initial".to_string())
        } else {
            (
                std::mem::take(&mut state.follow_up_queries),
                format!("followup_{}", state.loop_count),
            )
        };

        let tasks: Vec<SearchTask> = queries
            .iter()
            .enumerate()
            .map(|(i, query)| SearchTask {
                query: query.clone(),
                task_id: format!("{}_{}", prefix, i),
                original_question: state.original_question.clone(),
            })
            .collect();

        let batch_size = tasks.len();
        info!(batch = batch_size, prefix = %prefix, "Dispatching search tasks");

        let searcher = stages.searcher.clone();
        let outcomes: Vec<SearchOutcome> = stream::iter(tasks)
            .map(|task| {
                let searcher = searcher.clone();
                let emitter = emitter.clone();
                async move {
                    let node_id = format!("web_search_{}", task.task_id);
                    emitter.node_start(&node_id);
                    let outcome = searcher.search(task).await;
                    emitter.node_complete(&node_id);
                    outcome
                }
            })
            .buffer_unordered(stages.options.parallel_search_limit.max(1))
            .collect()
            .await;

        // Barrier passed: exactly one outcome per dispatched task
        debug_assert_eq!(outcomes.len(), batch_size);

        // Aggregate: pure merge, appends evidence in completion order
        emitter.node_start("aggregate_results");
        let mut batch_sources = Vec::new();
        for outcome in outcomes {
            if let Some(error) = outcome.error {
                state.record_error(error);
            }
            batch_sources.extend(outcome.record.source_urls.iter().cloned());
            state.evidence_records.push(outcome.record);
        }
        state.merge_sources(batch_sources);
        state.total_tasks_run += batch_size;
        state.current_phase = ResearchPhase::Reflection;
        emitter.node_complete("aggregate_results");
        emitter.state_update(&state);

        if cancelled(cancel, emitter) {
            return;
        }

        // Reflection
        emitter.node_start("reflection");
        let reflection = stages
            .reflector
            .reflect(
                &state.original_question,
                &state.evidence_records,
                state.discovered_sources.len(),
                state.loop_count,
            )
            .await;
        if let Some(error) = reflection.error {
            state.record_error(error);
        }
        state.is_sufficient = reflection.is_sufficient;
        state.knowledge_gap = reflection.knowledge_gap;
        state.follow_up_queries = reflection.follow_up_queries;
        state.loop_count += 1;
        state.current_phase = if state.is_sufficient {
            ResearchPhase::GeneratingAnswer
        } else {
            ResearchPhase::SearchWeb
        };
        emitter.node_complete("reflection");
        emitter.state_update(&state);

        // OR-semantics across three independent stop conditions; any one of
        // them routes to answer synthesis, guaranteeing termination
        let stop = state.is_sufficient
            || state.loop_count >= stages.options.max_research_loops
            || state.follow_up_queries.is_empty();
        debug!(
            loop_count = state.loop_count,
            sufficient = state.is_sufficient,
            follow_ups = state.follow_up_queries.len(),
            stop,
            "Reflection complete"
        );
        if stop {
            break;
        }
    }

    if cancelled(cancel, emitter) {
        return;
    }

    // Answer synthesis: the terminal stage always produces some answer
    emitter.node_start("answer_generation");
    let answer = stages.synthesizer.synthesize(&state).await;
    if let Some(error) = answer.error {
        state.record_error(error);
        state.current_phase = ResearchPhase::Error;
    } else {
        state.current_phase = ResearchPhase::Completed;
    }
    state.final_answer = answer.final_answer.clone();
    state.citations = answer.citations.clone();
    emitter.node_complete("answer_generation");
    emitter.state_update(&state);

    let final_result = FinalResult {
        success: true,
        final_answer: answer.final_answer,
        citations: answer.citations,
        research_summary: answer.summary,
        errors: state.errors.clone(),
    };

    info!(
        loops = state.loop_count,
        tasks = state.total_tasks_run,
        sources = state.discovered_sources.len(),
        "Research run finished"
    );
    emitter.complete(final_result);
}

fn cancelled(cancel: &AtomicBool, emitter: &ProgressEmitter) -> bool {
    if cancel.load(Ordering::SeqCst) {
        warn!("Research run cancelled between stages");
        emitter.error("Research run cancelled");
        true
    } else {
        false
    }
}
