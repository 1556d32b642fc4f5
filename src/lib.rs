// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # eunoia
//!
//! A coherence scoring and drift tracking engine for a scripted
//! conversational agent. Text is scored along a few heuristic axes, reduced
//! to a scalar coherence, and tracked over time; the resulting drift and
//! curvature gate the responses and adapt the agent's weights.
//!
//! ## Architecture
//!
//! - **Features** (`features`): entropy, reflection, harmony and logic scores
//! - **Coherence** (`coherence`): distance of the normalized feature vector
//!   from the balanced direction
//! - **Trajectory** (`trajectory`): sample history, drift and curvature
//! - **Adaptation** (`adapt`, `axis`): bounded weight tables and the
//!   drift-driven controller
//! - **Gate** (`gate`, `mood`): threshold decision and mood bookkeeping
//! - **Responses** (`respond`, `recall`): templates, kernels and episodic recall
//! - **Baseline** (`baseline`): decayed feedback and the running mean
//! - **State** (`state`, `audit`): event reducer and the audit journal
//! - **Persistence** (`snapshot`, `store`): JSON files and a redb session store
//!
//! ## Library usage
//!
//! ```no_run
//! use eunoia::config::EngineConfig;
//! use eunoia::engine::Engine;
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! let response = engine.process("What is the meaning of fairness and truth?");
//! println!("{response}");
//! println!("{}", engine.summary());
//! ```

pub mod adapt;
pub mod audit;
pub mod axis;
pub mod baseline;
pub mod clock;
pub mod coherence;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod gate;
pub mod geometry;
pub mod mood;
pub mod paths;
pub mod recall;
pub mod respond;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod trajectory;
