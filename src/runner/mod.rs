//! @ai:module:intent Benchmark orchestration
//! @ai:module:layer application
//! @ai:module:public_api Orchestrator, ModelSlot

pub mod orchestrator;

pub use orchestrator::{ModelSlot, Orchestrator};
