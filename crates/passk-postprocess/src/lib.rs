//! Post-processing pipeline for raw code-generation model output: stub
//! extraction from benchmark prompts, completion normalization under a
//! versioned policy chain, self-consistency candidate reduction, and a
//! one-shot self-repair hook.

pub mod normalize;
pub mod reduce;
pub mod repair;
pub mod stub;

pub use normalize::{between_tags, last_fence, normalize, strip_fences};
pub use reduce::reduce;
pub use repair::{attempt_repair, repair_instruction};
pub use stub::extract_stub;
