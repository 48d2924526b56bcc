//! Bilingual promotional copy.
//!
//! Each language is requested from the text backend concurrently. A reply is
//! accepted only if it is non-empty and mentions the subject; anything else
//! (including backend errors) is replaced by a template chosen
//! deterministically from the subject and language. Generation never fails.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use trend_models::{Candidate, Category, CopyLanguage, CopyOrigin, PromotionalCopy};

use crate::config::CopyConfig;
use crate::error::CopyError;
use crate::metrics;

/// Sampling options forwarded to the text backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    /// Maximum output tokens
    pub max_length: u32,
}

impl From<&CopyConfig> for CompletionOptions {
    fn from(config: &CopyConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_length: config.max_length,
        }
    }
}

/// Generative text backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, CopyError>;
}

/// Produces [`PromotionalCopy`] for a chosen candidate.
#[derive(Clone)]
pub struct CopyGenerator {
    backend: Option<Arc<dyn TextBackend>>,
    options: CompletionOptions,
}

impl CopyGenerator {
    pub fn new(backend: Arc<dyn TextBackend>, options: CompletionOptions) -> Self {
        Self {
            backend: Some(backend),
            options,
        }
    }

    /// Generator without a backend; every block comes from templates.
    pub fn templates_only() -> Self {
        Self {
            backend: None,
            options: CompletionOptions::from(&CopyConfig::default()),
        }
    }

    pub async fn generate(&self, candidate: &Candidate, category: Category) -> PromotionalCopy {
        let (primary, secondary) = tokio::join!(
            self.generate_language(candidate, category, CopyLanguage::Primary),
            self.generate_language(candidate, category, CopyLanguage::Secondary),
        );

        PromotionalCopy {
            text_primary: primary.0,
            text_secondary: secondary.0,
            primary_origin: primary.1,
            secondary_origin: secondary.1,
        }
    }

    async fn generate_language(
        &self,
        candidate: &Candidate,
        category: Category,
        language: CopyLanguage,
    ) -> (String, CopyOrigin) {
        let result = match &self.backend {
            Some(backend) => {
                let system = system_prompt(category, language);
                let prompt = user_prompt(candidate, category, language);
                backend
                    .complete(&prompt, &system, self.options)
                    .await
                    .and_then(|text| validate(text, &candidate.title))
            }
            None => Err(CopyError::Unavailable("no text backend configured".to_string())),
        };

        match result {
            Ok(text) => {
                debug!(category = %category, language = language.as_str(), "Generated copy accepted");
                (text, CopyOrigin::Generated)
            }
            Err(e) => {
                warn!(
                    category = %category,
                    language = language.as_str(),
                    candidate = %candidate.key(),
                    "Copy generation degraded to template: {}", e
                );
                metrics::record_copy_degraded(category, language);
                (template_copy(candidate, category, language), CopyOrigin::Template)
            }
        }
    }
}

/// Accept `text` only if it is non-empty and mentions `subject`.
pub fn validate(text: String, subject: &str) -> Result<String, CopyError> {
    let text = text.trim().trim_matches('"').trim().to_string();
    if text.is_empty() {
        return Err(CopyError::Empty);
    }
    if !text.to_lowercase().contains(&subject.trim().to_lowercase()) {
        return Err(CopyError::MissingSubject(subject.to_string()));
    }
    Ok(text)
}

fn category_label(category: Category, language: CopyLanguage) -> &'static str {
    match language {
        CopyLanguage::Primary => category.display_name(),
        CopyLanguage::Secondary => match category {
            Category::Movies => "película",
            Category::TvShows => "serie",
            Category::Sports => "partido",
            Category::Recipes => "receta",
            Category::Gaming => "juego",
            Category::Apps => "app",
            Category::TvChannels => "canal",
        },
    }
}

fn system_prompt(category: Category, language: CopyLanguage) -> String {
    let angle = match category {
        Category::Movies | Category::TvShows => "build hype for watching it tonight",
        Category::Sports => "capture the rivalry and the stakes of the match",
        Category::Recipes => "make the dish sound irresistible and easy to cook",
        Category::Gaming => "make players want to jump in right now",
        Category::Apps => "show why everyone is downloading it",
        Category::TvChannels => "make viewers want to tune in",
    };
    format!(
        "You write short promotional copy for social media stories about a trending {label}. \
         Write only in {language}. Mention the exact name at least twice. \
         Use 2 or 3 sentences and 25 to 45 words. {angle}. \
         No hashtags, no emojis, no quotation marks, no translations.",
        label = category.display_name(),
        language = language.english_name(),
    )
}

fn user_prompt(candidate: &Candidate, category: Category, language: CopyLanguage) -> String {
    let mut prompt = format!(
        "Write the {} story copy for the trending {}: {}.",
        language.english_name(),
        category.display_name(),
        candidate.title
    );
    let meta = &candidate.metadata;
    if let Some(genre) = &meta.genre {
        prompt.push_str(&format!(" Genre: {genre}."));
    }
    if let Some(origin) = &meta.origin {
        prompt.push_str(&format!(" From: {origin}."));
    }
    if let Some(rating) = meta.rating {
        prompt.push_str(&format!(" Rating: {rating:.1}/10."));
    }
    if let Some(fixture) = &meta.fixture {
        prompt.push_str(&format!(" Competition: {}.", fixture.league));
    }
    prompt
}

const UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Compact count: `1234` -> `1.2K`, `1_500_000` -> `1.5M`, `2_100_000_000` -> `2.1B`.
pub fn format_count(value: u64) -> String {
    let v = value as f64;
    for (i, (scale, suffix)) in UNITS.iter().enumerate() {
        if v < *scale {
            continue;
        }
        let scaled = (v / scale * 10.0).round() / 10.0;
        // 999_950 rounds to 1000.0K; promote to the next unit.
        if scaled >= 1000.0 && i > 0 {
            let (bigger, bigger_suffix) = UNITS[i - 1];
            return trim_decimal((v / bigger * 10.0).round() / 10.0, bigger_suffix);
        }
        return trim_decimal(scaled, suffix);
    }
    value.to_string()
}

fn trim_decimal(value: f64, suffix: &str) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}{suffix}")
    } else {
        format!("{value:.1}{suffix}")
    }
}

/// Stats fragment inserted after the subject name, with a leading space.
fn stats_fragment(candidate: &Candidate, category: Category, language: CopyLanguage) -> String {
    let meta = &candidate.metadata;
    if let Some(rating) = meta.rating.filter(|r| *r > 0.0) {
        return match language {
            CopyLanguage::Primary => format!(" (rated {rating:.1}/10)"),
            CopyLanguage::Secondary => format!(" (valorada con {rating:.1}/10)"),
        };
    }
    if let Some(installs) = meta.installs.filter(|n| *n > 0) {
        return match language {
            CopyLanguage::Primary => format!(" ({} installs)", format_count(installs)),
            CopyLanguage::Secondary => format!(" ({} descargas)", format_count(installs)),
        };
    }
    // Store listings report their review count as popularity; elsewhere it
    // is an opaque score that reads badly in copy.
    if matches!(category, Category::Apps | Category::Gaming) {
        if let Some(count) = meta.popularity.filter(|p| *p >= 1.0) {
            let count = format_count(count.round() as u64);
            return match language {
                CopyLanguage::Primary => format!(" ({count} ratings)"),
                CopyLanguage::Secondary => format!(" ({count} valoraciones)"),
            };
        }
    }
    String::new()
}

const EN_TEMPLATES: &[&str] = &[
    "{title}{stats} is the {category} everyone is talking about right now. Don't miss out on {title}.",
    "Trending today: {title}{stats}. Find out why this {category} is taking over, and see {title} for yourself.",
    "All eyes are on {title}{stats}. This {category} is everywhere today, so catch up on {title} now.",
];

const ES_TEMPLATES: &[&str] = &[
    "{title}{stats} es la {category} de la que todos hablan. No te pierdas {title}.",
    "Tendencia hoy: {title}{stats}. Descubre por qué esta {category} arrasa y vive {title} tú mismo.",
    "Todos miran {title}{stats}. Esta {category} está en todas partes; ponte al día con {title} ahora.",
];

const ES_TEMPLATES_MASCULINE: &[&str] = &[
    "{title}{stats} es el {category} del que todos hablan. No te pierdas {title}.",
    "Tendencia hoy: {title}{stats}. Descubre por qué este {category} arrasa y vive {title} tú mismo.",
    "Todos miran {title}{stats}. Este {category} está en todas partes; ponte al día con {title} ahora.",
];

fn template_pool(category: Category, language: CopyLanguage) -> &'static [&'static str] {
    match language {
        CopyLanguage::Primary => EN_TEMPLATES,
        CopyLanguage::Secondary => match category {
            Category::Movies | Category::TvShows | Category::Recipes | Category::Apps => ES_TEMPLATES,
            Category::Sports | Category::Gaming | Category::TvChannels => ES_TEMPLATES_MASCULINE,
        },
    }
}

/// Deterministic template copy; always non-empty and always contains the title.
pub fn template_copy(candidate: &Candidate, category: Category, language: CopyLanguage) -> String {
    let pool = template_pool(category, language);
    let digest = Sha256::new()
        .chain_update(candidate.title.as_bytes())
        .chain_update(language.as_str().as_bytes())
        .finalize();
    let template = pool[digest[0] as usize % pool.len()];

    let title = if candidate.title.trim().is_empty() {
        category_label(category, language)
    } else {
        candidate.title.trim()
    };

    template
        .replace("{title}", title)
        .replace("{stats}", &stats_fragment(candidate, category, language))
        .replace("{category}", category_label(category, language))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;
    use trend_models::{CandidateMetadata, SourceType};

    fn matrix() -> Candidate {
        Candidate::new(SourceType::Tmdb, "603", "The Matrix").with_metadata(CandidateMetadata {
            rating: Some(8.2),
            ..Default::default()
        })
    }

    fn options() -> CompletionOptions {
        CompletionOptions {
            temperature: 0.8,
            max_length: 256,
        }
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1234), "1.2K");
        assert_eq!(format_count(1_500_000), "1.5M");
        assert_eq!(format_count(2_100_000_000), "2.1B");
        assert_eq!(format_count(3_000), "3K");
        assert_eq!(format_count(999_960), "1M");
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate("  \"Watch THE MATRIX now\" ".into(), "The Matrix").unwrap(), "Watch THE MATRIX now");
        assert!(matches!(validate("   ".into(), "The Matrix"), Err(CopyError::Empty)));
        assert!(matches!(validate("Watch it now".into(), "The Matrix"), Err(CopyError::MissingSubject(_))));
    }

    #[test]
    fn test_templates_are_deterministic_and_mention_subject() {
        for &category in Category::ALL {
            for language in CopyLanguage::BOTH {
                let a = template_copy(&matrix(), category, language);
                let b = template_copy(&matrix(), category, language);
                assert_eq!(a, b);
                assert!(a.contains("The Matrix"));
                assert!(!a.contains('{'));
            }
        }
    }

    #[test]
    fn test_template_includes_stats() {
        let text = template_copy(&matrix(), Category::Movies, CopyLanguage::Primary);
        assert!(text.contains("8.2/10"));
    }

    #[test]
    fn test_store_review_count_reaches_copy() {
        let app = Candidate::new(SourceType::AppStore, "570060128", "Duolingo").with_metadata(CandidateMetadata {
            popularity: Some(612_000.0),
            ..Default::default()
        });
        let en = template_copy(&app, Category::Apps, CopyLanguage::Primary);
        assert!(en.contains("Duolingo (612K ratings)"), "{en}");
        let es = template_copy(&app, Category::Apps, CopyLanguage::Secondary);
        assert!(es.contains("Duolingo (612K valoraciones)"), "{es}");
    }

    #[test]
    fn test_installs_are_labelled_as_installs() {
        let app = Candidate::new(SourceType::AppStore, "1", "Duolingo").with_metadata(CandidateMetadata {
            installs: Some(1_500_000),
            popularity: Some(612_000.0),
            ..Default::default()
        });
        let text = template_copy(&app, Category::Apps, CopyLanguage::Primary);
        assert!(text.contains("(1.5M installs)"), "{text}");
    }

    #[test]
    fn test_popularity_score_stays_out_of_movie_copy() {
        let movie = Candidate::new(SourceType::Tmdb, "603", "The Matrix").with_metadata(CandidateMetadata {
            popularity: Some(85.3),
            ..Default::default()
        });
        let text = template_copy(&movie, Category::Movies, CopyLanguage::Primary);
        assert!(text.contains("The Matrix"));
        assert!(!text.contains('('), "{text}");
    }

    #[tokio::test]
    async fn test_generated_copy_accepted() {
        let mut backend = MockTextBackend::new();
        backend
            .expect_complete()
            .withf(|_, system, _| system.contains("English"))
            .returning(|_, _, _| Ok("The Matrix is back. Watch The Matrix tonight.".to_string()));
        backend
            .expect_complete()
            .withf(|_, system, _| system.contains("Spanish"))
            .returning(|_, _, _| Ok("The Matrix vuelve. Mira The Matrix esta noche.".to_string()));

        let generator = CopyGenerator::new(Arc::new(backend), options());
        let copy = generator.generate(&matrix(), Category::Movies).await;

        assert!(!copy.is_degraded());
        assert!(copy.text_secondary.contains("Matrix"));
        assert!(copy.text_primary.starts_with("The Matrix is back"));
    }

    #[tokio::test]
    async fn test_backend_error_falls_back_to_template() {
        let mut backend = MockTextBackend::new();
        backend
            .expect_complete()
            .with(always(), always(), eq(options()))
            .times(2)
            .returning(|_, _, _| Err(CopyError::Timeout));

        let generator = CopyGenerator::new(Arc::new(backend), options());
        let copy = generator.generate(&matrix(), Category::Movies).await;

        assert_eq!(copy.primary_origin, CopyOrigin::Template);
        assert_eq!(copy.secondary_origin, CopyOrigin::Template);
        assert!(copy.text_primary.contains("The Matrix"));
        assert!(copy.text_secondary.contains("The Matrix"));
    }

    #[tokio::test]
    async fn test_invalid_reply_degrades_only_that_language() {
        let mut backend = MockTextBackend::new();
        backend
            .expect_complete()
            .withf(|_, system, _| system.contains("English"))
            .returning(|_, _, _| Ok("The Matrix redefined action. See The Matrix.".to_string()));
        backend
            .expect_complete()
            .withf(|_, system, _| system.contains("Spanish"))
            .returning(|_, _, _| Ok(String::new()));

        let generator = CopyGenerator::new(Arc::new(backend), options());
        let copy = generator.generate(&matrix(), Category::Movies).await;

        assert_eq!(copy.primary_origin, CopyOrigin::Generated);
        assert_eq!(copy.secondary_origin, CopyOrigin::Template);
        assert!(copy.text_secondary.contains("The Matrix"));
    }

    #[tokio::test]
    async fn test_templates_only() {
        let copy = CopyGenerator::templates_only()
            .generate(&matrix(), Category::Movies)
            .await;
        assert!(copy.is_degraded());
        assert!(!copy.text_primary.is_empty());
    }
}
