//! Strategic prompt generation for perception scans.
//!
//! Five categories of templates are rendered against what is known about a
//! brand (personas, products, competitors, claims, risk factors) and ranked
//! by priority.

pub mod context;
pub mod generator;
pub mod templates;

pub use context::{CompetitorInput, GenerationContext, PersonaInput, ProductInput};
pub use generator::{
    generate, CategoryCount, GeneratedPrompt, GenerationResult, GeneratorOptions,
    DEFAULT_MAX_PER_CATEGORY,
};
pub use templates::{
    render, review_templates, template_by_id, templates, total_template_count, PromptTemplate,
    HALLUCINATION_TRAP_AWARDS, HALLUCINATION_TRAP_FEATURES,
};
