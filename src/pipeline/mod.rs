pub mod chance;
pub mod ports;
pub mod runtime;
pub mod types;

pub use chance::{ScriptedChance, ThreadRngChance};
pub use ports::{ChanceSource, ResponsePoster};
pub use runtime::ResponsePipeline;
pub use types::{CandidateEvent, Delivery, PipelineOutcome, PostReceipt, PostRequest};
