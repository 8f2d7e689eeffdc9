//! Shared configuration and domain vocabulary for the AEO perception monitor.

use thiserror::Error;

#[macro_use]
mod macros;

pub mod app_config;
pub mod brands;
pub mod config;
pub mod perception;
pub mod workflow;

pub use app_config::{AppConfig, Environment};
pub use brands::{
    load_brands, BrandConfig, BrandsFile, ClaimConfig, CompetitorConfig, PersonaConfig,
    ProductConfig, RiskFactorsConfig,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use perception::{Platform, PromptCategory, PromptIntent, Quadrant, ScanStatus};
pub use workflow::{
    CorrectionStatus, Effort, FixType, InsightCategory, InsightPriority, InsightStatus,
    PersonaType, ProblemType, ThreatLevel,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[from] serde_yaml::Error),

    #[error("brands validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },
}
