use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::workflow::{PersonaType, ThreatLevel};
use crate::ConfigError;

/// A monitored brand as declared in `config/brands.yaml`.
///
/// Everything beyond `name` and `domain` is optional seed knowledge; it is
/// merged with whatever the extractor later pulls from the crawled site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    pub domain: String,
    pub industry: Option<String>,
    #[serde(default)]
    pub competitors: Vec<CompetitorConfig>,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
    #[serde(default)]
    pub personas: Vec<PersonaConfig>,
    #[serde(default)]
    pub claims: Vec<ClaimConfig>,
    #[serde(default)]
    pub risk_factors: RiskFactorsConfig,
    #[serde(default)]
    pub review_sites: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorConfig {
    pub name: String,
    #[serde(default = "default_competitor_type")]
    pub competitor_type: String,
    #[serde(default = "default_threat_level")]
    pub threat_level: ThreatLevel,
}

fn default_competitor_type() -> String {
    "direct".to_string()
}

fn default_threat_level() -> ThreatLevel {
    ThreatLevel::Medium
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    pub name: String,
    pub category: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub is_hero: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub name: String,
    #[serde(rename = "type", default = "default_persona_type")]
    pub persona_type: PersonaType,
    pub description: Option<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub common_questions: Vec<String>,
    #[serde(default)]
    pub objections: Vec<String>,
}

fn default_persona_type() -> PersonaType {
    PersonaType::Secondary
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimConfig {
    pub text: String,
    pub claim_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskFactorsConfig {
    #[serde(default)]
    pub negative_keywords: Vec<String>,
    #[serde(default)]
    pub misconceptions: Vec<String>,
}

impl BrandConfig {
    /// URL-safe slug derived from the brand name.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Lowercase, ASCII-only, dash-separated form of `name`.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                Some(c)
            } else if c.is_whitespace() {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

/// Load and validate the brands configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        if brand.domain.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{}' must declare a domain",
                brand.name
            )));
        }

        let slug = brand.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{}' produces an empty slug",
                brand.name
            )));
        }

        if !seen_names.insert(brand.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug: '{}' (from brand '{}')",
                slug, brand.name
            )));
        }

        if let Some(c) = brand.competitors.iter().find(|c| c.name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has a competitor with an empty name ({})",
                brand.name, c.competitor_type
            )));
        }

        if brand.products.iter().any(|p| p.name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has a product with an empty name",
                brand.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
