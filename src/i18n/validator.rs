//! Cross-locale translation validation.
//!
//! Compares every enabled locale's bundle against the canonical reference
//! bundle, reporting missing locales, malformed structures, missing keys
//! and an overall coverage percentage. Validation never throws for bad
//! input; problems become structured issues in the result.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::i18n::cache::{I18nError, MessageLoader, TranslationCache};
use crate::i18n::messages::FlattenedKeys;
use crate::i18n::registry::LocaleRegistry;

/// One validation finding, tagged with structured context rather than
/// encoded in a message string.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ValidationIssue {
    #[error("locale '{locale}' is missing: {reason}")]
    MissingLocale { locale: String, reason: String },

    #[error("malformed bundle for locale '{locale}': {detail}")]
    MalformedBundle { locale: String, detail: String },

    #[error("bundle for locale '{locale}' is empty")]
    EmptyBundle { locale: String },

    #[error("locale '{locale}' is missing key '{key}'")]
    MissingKey { locale: String, key: String },

    #[error("locale '{locale}' has key '{key}' absent from the reference")]
    ExtraKey { locale: String, key: String },
}

impl ValidationIssue {
    /// Extra keys are advisory; everything else invalidates the run.
    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationIssue::ExtraKey { .. })
    }

    /// The locale the issue concerns.
    pub fn locale(&self) -> &str {
        match self {
            ValidationIssue::MissingLocale { locale, .. }
            | ValidationIssue::MalformedBundle { locale, .. }
            | ValidationIssue::EmptyBundle { locale }
            | ValidationIssue::MissingKey { locale, .. }
            | ValidationIssue::ExtraKey { locale, .. } => locale,
        }
    }
}

/// Outcome of one validation run. Computed fresh each call, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    /// Coverage percentage in `[0.0, 100.0]`; 100.0 when every locale's key
    /// set matches the reference.
    pub coverage: f64,
}

impl ValidationResult {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_warning())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Validator over a translation cache.
pub struct TranslationValidator<'a, L: MessageLoader> {
    cache: &'a TranslationCache<L>,
}

impl<'a, L: MessageLoader> TranslationValidator<'a, L> {
    pub fn new(cache: &'a TranslationCache<L>) -> Self {
        Self { cache }
    }

    /// Validate every enabled locale against the canonical reference.
    ///
    /// Coverage is the mean per-locale coverage over non-reference locales:
    /// the share of reference keys present in the locale, where an absent or
    /// malformed locale counts as 0 and an empty (but well-formed) bundle
    /// counts as 100, covering all zero of its keys. An empty reference
    /// also yields 100.
    pub async fn validate_translations(&self) -> ValidationResult {
        let registry = LocaleRegistry::get();
        let reference = registry.canonical();

        let mut issues = Vec::new();

        let reference_keys = match self.cache.try_messages(reference.code).await {
            Ok(hit) => {
                let flattened = hit.messages.flatten_keys();
                self.report_truncation(reference.code, &flattened, &mut issues);
                flattened.keys
            }
            Err(error) => {
                // Without a reference bundle there is nothing to compare
                // against; report and bail out with zero coverage.
                issues.push(issue_from_error(reference.code, error));
                return ValidationResult {
                    is_valid: false,
                    issues,
                    coverage: 0.0,
                };
            }
        };

        let targets: Vec<&str> = registry
            .list_enabled()
            .into_iter()
            .map(|l| l.code)
            .filter(|code| *code != reference.code)
            .collect();

        let loads =
            futures::future::join_all(targets.iter().map(|code| self.cache.try_messages(code)))
                .await;

        let mut locale_coverages = Vec::with_capacity(targets.len());
        for (code, outcome) in targets.iter().zip(loads) {
            match outcome {
                Ok(hit) => {
                    let flattened = hit.messages.flatten_keys();
                    self.report_truncation(code, &flattened, &mut issues);

                    if flattened.keys.is_empty() {
                        issues.push(ValidationIssue::EmptyBundle {
                            locale: code.to_string(),
                        });
                        // "100% of nothing": an empty bundle covers all
                        // zero of its keys.
                        locale_coverages.push(100.0);
                        continue;
                    }

                    let mut matched = 0usize;
                    for key in &reference_keys {
                        if flattened.keys.contains(key) {
                            matched += 1;
                        } else {
                            issues.push(ValidationIssue::MissingKey {
                                locale: code.to_string(),
                                key: key.clone(),
                            });
                        }
                    }
                    for key in flattened.keys.difference(&reference_keys) {
                        issues.push(ValidationIssue::ExtraKey {
                            locale: code.to_string(),
                            key: key.clone(),
                        });
                    }

                    let coverage = if reference_keys.is_empty() {
                        100.0
                    } else {
                        (matched as f64 / reference_keys.len() as f64) * 100.0
                    };
                    locale_coverages.push(coverage);
                }
                Err(error) => {
                    issues.push(issue_from_error(code, error));
                    locale_coverages.push(0.0);
                }
            }
        }

        let coverage = if locale_coverages.is_empty() {
            100.0
        } else {
            locale_coverages.iter().sum::<f64>() / locale_coverages.len() as f64
        };

        let is_valid = !issues.iter().any(|i| !i.is_warning());
        debug!(
            "validated {} locales: valid={}, coverage={:.1}%, issues={}",
            targets.len() + 1,
            is_valid,
            coverage,
            issues.len()
        );

        ValidationResult {
            is_valid,
            issues,
            coverage,
        }
    }

    fn report_truncation(
        &self,
        locale: &str,
        flattened: &FlattenedKeys,
        issues: &mut Vec<ValidationIssue>,
    ) {
        for path in &flattened.truncated {
            issues.push(ValidationIssue::MalformedBundle {
                locale: locale.to_string(),
                detail: format!("nesting under '{}' exceeds the supported depth", path),
            });
        }
    }
}

fn issue_from_error(locale: &str, error: I18nError) -> ValidationIssue {
    match error {
        I18nError::MalformedBundle { locale, detail } => {
            ValidationIssue::MalformedBundle { locale, detail }
        }
        other => ValidationIssue::MissingLocale {
            locale: locale.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Loader with a configurable bundle per locale.
    struct MapLoader {
        bundles: HashMap<&'static str, Value>,
    }

    impl MapLoader {
        fn new(bundles: Vec<(&'static str, Value)>) -> Self {
            Self {
                bundles: bundles.into_iter().collect(),
            }
        }
    }

    impl MessageLoader for MapLoader {
        async fn load(&self, locale: &str) -> anyhow::Result<Value> {
            match self.bundles.get(locale) {
                Some(value) => Ok(value.clone()),
                None => bail!("no messages for locale '{}'", locale),
            }
        }
    }

    async fn validate(bundles: Vec<(&'static str, Value)>) -> ValidationResult {
        let cache = TranslationCache::new(MapLoader::new(bundles));
        TranslationValidator::new(&cache).validate_translations().await
    }

    // ==================== Matching Bundles ====================

    #[tokio::test]
    async fn test_identical_bundles_are_valid() {
        let bundle = json!({ "common": { "hello": "x", "bye": "y" } });
        let result = validate(vec![("en", bundle.clone()), ("zh", bundle)]).await;

        assert!(result.is_valid);
        assert!(result.issues.is_empty());
        assert_eq!(result.coverage, 100.0);
    }

    #[tokio::test]
    async fn test_same_keys_different_values_are_valid() {
        let result = validate(vec![
            ("en", json!({ "common": { "hello": "Hi" } })),
            ("zh", json!({ "common": { "hello": "你好" } })),
        ])
        .await;
        assert!(result.is_valid);
        assert_eq!(result.coverage, 100.0);
    }

    // ==================== Missing Keys ====================

    #[tokio::test]
    async fn test_missing_key_reported_per_locale() {
        let result = validate(vec![
            ("en", json!({ "common": { "hello": "Hi", "bye": "Bye" } })),
            ("zh", json!({ "common": { "hello": "你好" } })),
        ])
        .await;

        assert!(!result.is_valid);
        assert!(result.issues.contains(&ValidationIssue::MissingKey {
            locale: "zh".to_string(),
            key: "common.bye".to_string(),
        }));
        assert_eq!(result.coverage, 50.0);
    }

    #[tokio::test]
    async fn test_extra_key_is_warning_only() {
        let result = validate(vec![
            ("en", json!({ "common": { "hello": "Hi" } })),
            (
                "zh",
                json!({ "common": { "hello": "你好", "extra": "多余" } }),
            ),
        ])
        .await;

        assert!(result.is_valid, "extra keys alone must not invalidate");
        assert!(result
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::ExtraKey { .. })));
        assert_eq!(result.coverage, 100.0);
    }

    // ==================== Empty / Missing / Malformed ====================

    #[tokio::test]
    async fn test_empty_bundle_invalid_but_full_coverage() {
        let result = validate(vec![
            ("en", json!({ "common": { "hello": "Hi" } })),
            ("zh", json!({})),
        ])
        .await;

        assert!(!result.is_valid);
        assert!(result.issues.iter().any(|i| i.locale() == "zh"));
        assert!(result
            .issues
            .contains(&ValidationIssue::EmptyBundle {
                locale: "zh".to_string()
            }));
        // "100% of nothing"
        assert_eq!(result.coverage, 100.0);
    }

    #[tokio::test]
    async fn test_missing_locale_reported_with_code() {
        let result = validate(vec![("en", json!({ "common": { "hello": "Hi" } }))]).await;

        assert!(!result.is_valid);
        let missing = result
            .issues
            .iter()
            .find(|i| matches!(i, ValidationIssue::MissingLocale { .. }))
            .expect("missing locale issue");
        assert_eq!(missing.locale(), "zh");
        assert!(missing.to_string().contains("zh"));
        assert_eq!(result.coverage, 0.0);
    }

    #[tokio::test]
    async fn test_malformed_bundle_flagged() {
        let result = validate(vec![
            ("en", json!({ "common": { "hello": "Hi" } })),
            ("zh", json!("just a string")),
        ])
        .await;

        assert!(!result.is_valid);
        assert!(result
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::MalformedBundle { .. })));
        assert_eq!(result.coverage, 0.0);
    }

    #[tokio::test]
    async fn test_missing_reference_short_circuits() {
        let result = validate(vec![("zh", json!({ "common": { "hello": "你好" } }))]).await;

        assert!(!result.is_valid);
        assert_eq!(result.coverage, 0.0);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].locale(), "en");
    }

    #[tokio::test]
    async fn test_empty_reference_is_full_coverage() {
        let result = validate(vec![("en", json!({})), ("zh", json!({}))]).await;

        // Nothing to cover; both empties produce EmptyBundle-free reference
        // handling but the zh bundle is still flagged empty.
        assert_eq!(result.coverage, 100.0);
        assert!(!result.is_valid);
    }

    // ==================== Coverage Bound ====================

    #[tokio::test]
    async fn test_coverage_stays_within_bounds() {
        let result = validate(vec![
            (
                "en",
                json!({ "a": "1", "b": "2", "c": "3", "d": "4" }),
            ),
            ("zh", json!({ "a": "一" })),
        ])
        .await;

        assert!(result.coverage >= 0.0 && result.coverage <= 100.0);
        assert_eq!(result.coverage, 25.0);
    }

    #[tokio::test]
    async fn test_deep_nesting_terminates() {
        let mut deep = json!("leaf");
        for i in 0..64 {
            deep = json!({ format!("n{}", i): deep });
        }
        let result = validate(vec![
            ("en", json!({ "common": { "hello": "Hi" } })),
            ("zh", deep),
        ])
        .await;

        // Must terminate and report rather than recurse forever
        assert!(!result.is_valid);
        assert!(result
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::MalformedBundle { .. })));
    }
}
