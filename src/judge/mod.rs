//! @ai:module:intent LLM-as-judge pairwise comparison with position-bias mitigation
//! @ai:module:layer application
//! @ai:module:public_api JudgeProtocol, Verdict, ReconciledVerdict, Winner, reconcile
//! @ai:module:stateless true

pub mod parse;
pub mod prompt;
pub mod protocol;
pub mod verdict;

pub use protocol::JudgeProtocol;
pub use verdict::{reconcile, ReconciledVerdict, Verdict, Winner};
