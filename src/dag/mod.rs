// src/dag/mod.rs

//! Task graph, plan expansion and scheduling.
//!
//! - [`graph`] holds the prerequisite graph of the registry.
//! - [`plan`] expands a task or step list into ordered stages.
//! - [`sequencer`] walks those stages strictly in order.
//! - [`scheduler`] runs one stage: its roots plus their transitive
//!   prerequisites, independent tasks concurrently.
//! - [`task_info`] provides task metadata and scheduled task types.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod plan;
pub mod scheduler;
pub mod sequencer;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use plan::{ExecutionPlan, Stage, plan_for_sequence, plan_for_task};
pub use scheduler::{Scheduler, SchedulerStep};
pub use sequencer::{SequenceState, Sequencer};
pub use task_info::{ScheduledTask, TaskRunState};
