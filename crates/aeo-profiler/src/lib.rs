//! Brand profiling: turn a crawled website into a Brand 360 profile.

pub mod error;
pub mod extractor;
pub mod persist;
pub mod profile;
pub mod review;
pub mod tasks;

pub use error::ProfilerError;
pub use extractor::{BrandExtractor, CompetitorContext};
pub use persist::{save_profile, ProfileSeed};
pub use profile::{
    AiGuidance, AudienceSegment, Brand360Profile, BrandIdentity, BrandVoice, CompetitiveLandscape,
    Competitor, ConfidenceField, CoreValue, HeroOffering, ProductCategory, ProductPortfolio,
    ProfileMetadata, TargetAudience, PROFILE_VERSION,
};
pub use review::{low_confidence_fields, ReviewItem, DEFAULT_REVIEW_THRESHOLD};
pub use tasks::ExtractionTask;
