//! Progress event stream
//!
//! Converts stage transitions and state updates into an ordered, sequenced
//! stream of external-facing events. Transport adapters (SSE, WebSocket)
//! consume this stream identically; no pipeline logic lives in them.

use crate::state::{FinalResult, ResearchState};
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::debug;

/// Progress delivery mode, selected per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// Coarse-grained: the full state snapshot after every stage completion
    Values,
    /// Fine-grained: node lifecycle events, including per-search-task events
    Events,
}

impl Default for StreamMode {
    fn default() -> Self {
        StreamMode::Values
    }
}

impl StreamMode {
    /// Parse the wire form; anything other than "events" means values mode
    pub fn parse(mode: &str) -> Self {
        match mode {
            "events" => StreamMode::Events,
            _ => StreamMode::Values,
        }
    }
}

/// One externally visible progress event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResearchEvent {
    /// Full state snapshot after a stage completed (values mode)
    StateUpdate {
        node: String,
        data: serde_json::Value,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// A stage or fanned-out search task began (events mode)
    NodeStart {
        node_id: String,
        seq: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// A stage or fanned-out search task finished (events mode)
    NodeComplete {
        node_id: String,
        seq: u64,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Terminal event carrying the final answer; emitted exactly once
    Complete {
        final_result: FinalResult,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    /// Terminal failure of the run or its transport
    Error {
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ResearchEvent {
    /// Wire name of the event, used for the SSE `event:` line
    pub fn event_name(&self) -> &'static str {
        match self {
            ResearchEvent::StateUpdate { .. } => "state_update",
            ResearchEvent::NodeStart { .. } => "node_start",
            ResearchEvent::NodeComplete { .. } => "node_complete",
            ResearchEvent::Complete { .. } => "complete",
            ResearchEvent::Error { .. } => "error",
        }
    }
}

/// Lazy sequence of progress events for one run
pub type EventStream = mpsc::UnboundedReceiver<ResearchEvent>;

/// Per-run progress emitter
///
/// Internally synchronized: the search fan-out emits node events from
/// concurrent tasks. The sequence counter is scoped to the run, not global.
#[derive(Clone)]
pub struct ProgressEmitter {
    inner: Arc<EmitterInner>,
}

struct EmitterInner {
    tx: mpsc::UnboundedSender<ResearchEvent>,
    mode: StreamMode,
    /// Sequence counter and start-time registry, locked together so that
    /// sequence allocation and channel send stay ordered across concurrent
    /// search tasks
    node_state: Mutex<NodeState>,
    completed: AtomicBool,
}

#[derive(Default)]
struct NodeState {
    seq: u64,
    timers: HashMap<String, Instant>,
}

impl ProgressEmitter {
    /// Create an emitter and the event stream it feeds
    pub fn new(mode: StreamMode) -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded();
        let emitter = Self {
            inner: Arc::new(EmitterInner {
                tx,
                mode,
                node_state: Mutex::new(NodeState::default()),
                completed: AtomicBool::new(false),
            }),
        };
        (emitter, rx)
    }

    fn send(&self, event: ResearchEvent) {
        if self.inner.tx.unbounded_send(event).is_err() {
            // Subscriber is gone; the run keeps executing but stops streaming
            debug!("Progress subscriber dropped, event discarded");
        }
    }

    /// Emit a full state snapshot (values mode only)
    pub fn state_update(&self, state: &ResearchState) {
        if self.inner.mode != StreamMode::Values {
            return;
        }
        self.send(ResearchEvent::StateUpdate {
            node: state.current_phase.to_string(),
            data: state.snapshot(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Emit a node-start event (events mode only)
    pub fn node_start(&self, node_id: &str) {
        if self.inner.mode != StreamMode::Events {
            return;
        }
        let mut nodes = self.inner.node_state.lock().expect("emitter node lock");
        nodes.timers.insert(node_id.to_string(), Instant::now());
        let seq = nodes.seq;
        nodes.seq += 1;
        self.send(ResearchEvent::NodeStart {
            node_id: node_id.to_string(),
            seq,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Emit a node-complete event with the duration since the matching start
    pub fn node_complete(&self, node_id: &str) {
        if self.inner.mode != StreamMode::Events {
            return;
        }
        let mut nodes = self.inner.node_state.lock().expect("emitter node lock");
        let duration_ms = nodes
            .timers
            .remove(node_id)
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or(0);
        let seq = nodes.seq;
        nodes.seq += 1;
        self.send(ResearchEvent::NodeComplete {
            node_id: node_id.to_string(),
            seq,
            duration_ms,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Emit the terminal complete event; subsequent calls are ignored
    pub fn complete(&self, final_result: FinalResult) {
        if self.inner.completed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.send(ResearchEvent::Complete {
            final_result,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Emit a terminal error event
    pub fn error(&self, error: impl Into<String>) {
        self.send(ResearchEvent::Error {
            error: error.into(),
            timestamp: chrono::Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ResearchState, ResearchSummary};
    use futures::StreamExt;

    fn final_result() -> FinalResult {
        FinalResult {
            success: true,
            final_answer: "answer".to_string(),
            citations: vec![],
            research_summary: ResearchSummary {
                total_queries: 0,
                total_results: 0,
                total_sources: 0,
                research_loops: 0,
                completion_time: chrono::Utc::now(),
            },
            errors: vec![],
        }
    }

    #[tokio::test]
    async fn test_values_mode_suppresses_node_events() {
        let (emitter, events) = ProgressEmitter::new(StreamMode::Values);
        emitter.node_start("generate_queries");
        emitter.node_complete("generate_queries");
        emitter.state_update(&ResearchState::new("q"));
        emitter.complete(final_result());
        drop(emitter);

        let collected: Vec<_> = events.collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].event_name(), "state_update");
        assert_eq!(collected[1].event_name(), "complete");
    }

    #[tokio::test]
    async fn test_events_mode_sequences_monotonically() {
        let (emitter, events) = ProgressEmitter::new(StreamMode::Events);
        emitter.node_start("a");
        emitter.node_start("b");
        emitter.node_complete("b");
        emitter.node_complete("a");
        emitter.complete(final_result());
        drop(emitter);

        let collected: Vec<_> = events.collect().await;
        let seqs: Vec<u64> = collected
            .iter()
            .filter_map(|event| match event {
                ResearchEvent::NodeStart { seq, .. } => Some(*seq),
                ResearchEvent::NodeComplete { seq, .. } => Some(*seq),
                _ => None,
            })
            .collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert_eq!(collected.last().unwrap().event_name(), "complete");
    }

    #[tokio::test]
    async fn test_complete_is_emitted_exactly_once() {
        let (emitter, events) = ProgressEmitter::new(StreamMode::Values);
        emitter.complete(final_result());
        emitter.complete(final_result());
        drop(emitter);

        let collected: Vec<_> = events.collect().await;
        assert_eq!(collected.len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_panic() {
        let (emitter, events) = ProgressEmitter::new(StreamMode::Values);
        drop(events);
        emitter.state_update(&ResearchState::new("q"));
        emitter.complete(final_result());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(StreamMode::parse("events"), StreamMode::Events);
        assert_eq!(StreamMode::parse("values"), StreamMode::Values);
        assert_eq!(StreamMode::parse("anything"), StreamMode::Values);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = ResearchEvent::NodeStart {
            node_id: "reflection".to_string(),
            seq: 4,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "node_start");
        assert_eq!(json["node_id"], "reflection");
        assert_eq!(json["seq"], 4);
    }
}
