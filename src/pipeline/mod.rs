pub mod classifier;
pub mod generation;
pub mod relay;

pub use classifier::{Category, Classification, classify, classify_detailed};
pub use generation::{
    FALLBACK_PROMPT_PREFIX_CHARS, GenerationPipeline, GenerationRequest, GenerationResult,
    MIN_PROMPT_CHARS, PipelineSettings, SYSTEM_INSTRUCTION, fallback_script, strip_code_fences,
};
pub use relay::{RelayService, ServiceStatus};
