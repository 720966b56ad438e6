//! Progress reporting
//!
//! The orchestrator reports each stage it enters through a [`ProgressSink`]
//! passed in by the caller. Only `PROGRESSING` events are produced here;
//! success and failure are conveyed by the return value of the launch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Stages of a launch, in the order they are entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaunchStage {
    Started,
    #[serde(rename = "RESOLVING_KEYPAIR")]
    ResolvingKeyPair,
    ApplyingFirewall,
    Launching,
    AwaitingReady,
    AssigningStaticIp,
    AllocatingPublicIp,
    AwaitingAppReady,
    Done,
}

impl fmt::Display for LaunchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LaunchStage::Started => "STARTED",
            LaunchStage::ResolvingKeyPair => "RESOLVING_KEYPAIR",
            LaunchStage::ApplyingFirewall => "APPLYING_FIREWALL",
            LaunchStage::Launching => "LAUNCHING",
            LaunchStage::AwaitingReady => "AWAITING_READY",
            LaunchStage::AssigningStaticIp => "ASSIGNING_STATIC_IP",
            LaunchStage::AllocatingPublicIp => "ALLOCATING_PUBLIC_IP",
            LaunchStage::AwaitingAppReady => "AWAITING_APP_READY",
            LaunchStage::Done => "DONE",
        };
        write!(f, "{}", s)
    }
}

/// Task status carried by a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Progressing,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Progressing => write!(f, "PROGRESSING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: LaunchStage,
    pub state: TaskState,
    /// Human-readable description of the action in progress
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(stage: LaunchStage, action: impl Into<String>) -> Self {
        Self {
            stage,
            state: TaskState::Progressing,
            action: action.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of launch progress events
pub trait ProgressSink: Send + Sync {
    fn update_state(&self, event: ProgressEvent);
}

/// Forwards events over an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn update_state(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Progress receiver dropped; event discarded");
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stages(&self) -> Vec<LaunchStage> {
        self.events().into_iter().map(|e| e.stage).collect()
    }

    pub fn last(&self) -> Option<ProgressEvent> {
        self.events().pop()
    }
}

impl ProgressSink for RecordingSink {
    fn update_state(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Writes each event to the log and nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn update_state(&self, event: ProgressEvent) {
        tracing::info!(
            target: "cloudlaunch::progress",
            stage = %event.stage,
            state = %event.state,
            "{}",
            event.action
        );
    }
}

/// Hands each event to the caller's sink, with a debug log
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn ProgressSink>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }

    pub fn emit(&self, stage: LaunchStage, action: impl Into<String>) {
        let event = ProgressEvent::new(stage, action);
        tracing::debug!(stage = %stage, "{}", event.action);
        self.sink.update_state(event);
    }
}
