use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::{Provider, ProviderError, ResolvedProvider};
use crate::services::provider::ProviderService;

/// Minimum name-match score accepted as a confident resolution. Below this
/// the input is treated as unresolved rather than guessed at.
pub const MATCH_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Maps free text from the voice pipeline (a provider name, a misspelled
/// name, or a specialty) onto exactly one provider.
pub struct ProviderResolver {
    provider_service: ProviderService,
}

impl ProviderResolver {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            provider_service: ProviderService::new(config),
        }
    }

    /// Resolve a single free-text query: specialty label first, then fuzzy
    /// name matching against the roster.
    pub async fn resolve(
        &self,
        query: &str,
        auth_token: &str,
    ) -> Result<ResolvedProvider, ProviderError> {
        let roster = self.provider_service.list_providers(auth_token).await?;
        self.resolve_against(&roster, Some(query), Some(query))
            .ok_or_else(|| ProviderError::NotFound {
                query: query.to_string(),
            })
    }

    /// Resolve separately extracted name/specialty fields, as produced by the
    /// language-model extraction step.
    pub async fn resolve_fields(
        &self,
        name: Option<&str>,
        specialty: Option<&str>,
        auth_token: &str,
    ) -> Result<ResolvedProvider, ProviderError> {
        let roster = self.provider_service.list_providers(auth_token).await?;
        self.resolve_against(&roster, name, specialty)
            .ok_or_else(|| ProviderError::NotFound {
                query: name
                    .or(specialty)
                    .unwrap_or_default()
                    .to_string(),
            })
    }

    fn resolve_against(
        &self,
        roster: &[Provider],
        name: Option<&str>,
        specialty: Option<&str>,
    ) -> Option<ResolvedProvider> {
        // Specialty match is checked first and treated as fully confident.
        if let Some(spec) = specialty.filter(|s| !s.trim().is_empty()) {
            if let Some(provider) = match_specialty(roster, spec) {
                debug!("Resolved \"{}\" by specialty to {}", spec, provider.full_name);
                return Some(ResolvedProvider {
                    provider: provider.clone(),
                    confidence: 1.0,
                });
            }
        }

        let name = name.filter(|n| !n.trim().is_empty())?;
        let resolved = match_name(roster, name)?;
        info!(
            "Resolved \"{}\" to {} (confidence {:.2})",
            name, resolved.provider.full_name, resolved.confidence
        );
        Some(resolved)
    }
}

/// Case-insensitive match against the specialty label. A query may name a
/// prefix of the label ("derm") or contain the label as a whole word or
/// phrase; a label buried inside an unrelated word never matches (a short
/// label like "ENT" must not resolve from "appointment"). Ties break
/// deterministically because the roster arrives sorted by (full_name, id).
pub fn match_specialty<'a>(roster: &'a [Provider], query: &str) -> Option<&'a Provider> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    roster.iter().find(|p| {
        let specialty = p.specialty.to_lowercase();
        specialty == needle
            || specialty.contains(&needle)
            || needle.split_whitespace().any(|word| word == specialty)
            || (specialty.contains(' ') && needle.contains(&specialty))
    })
}

/// Fuzzy name matching: honorifics stripped, per-token comparison tolerating
/// a single-character misspelling or a partial (prefix) token. Accepts only
/// scores at or above the confidence threshold; callers see anything below
/// as unresolved.
pub fn match_name(roster: &[Provider], query: &str) -> Option<ResolvedProvider> {
    let query_tokens = name_tokens(query);
    if query_tokens.is_empty() {
        return None;
    }

    let mut best: Option<(f32, &Provider)> = None;
    for provider in roster {
        let score = name_match_score(&query_tokens, &name_tokens(&provider.full_name));
        // Roster order (full_name, id) makes "first strictly-better wins"
        // deterministic across identical scores.
        let better = match best {
            Some((best_score, _)) => score > best_score,
            None => true,
        };
        if better {
            best = Some((score, provider));
        }
    }

    best.filter(|(score, _)| *score >= MATCH_CONFIDENCE_THRESHOLD)
        .map(|(score, provider)| ResolvedProvider {
            provider: provider.clone(),
            confidence: score,
        })
}

fn name_tokens(name: &str) -> Vec<String> {
    name.split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty() && t != "dr" && t != "doctor")
        .collect()
}

/// Fraction of query tokens that land on some candidate token.
fn name_match_score(query_tokens: &[String], candidate_tokens: &[String]) -> f32 {
    if query_tokens.is_empty() || candidate_tokens.is_empty() {
        return 0.0;
    }

    let hits = query_tokens
        .iter()
        .filter(|q| candidate_tokens.iter().any(|c| tokens_match(q, c)))
        .count();

    hits as f32 / query_tokens.len() as f32
}

fn tokens_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    // Partial names: "sam" matches "samuel".
    if a.len() >= 3 && (b.starts_with(a) || a.starts_with(b)) {
        return true;
    }
    // Minor misspellings: one edit for reasonably long tokens.
    a.len() >= 4 && b.len() >= 4 && within_one_edit(a, b)
}

/// Levenshtein distance <= 1, without building the full matrix.
fn within_one_edit(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > 1 {
        return false;
    }

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut i = 0;
    let mut j = 0;
    let mut edits = 0;
    while i < short.len() && j < long.len() {
        if short[i] == long[j] {
            i += 1;
            j += 1;
            continue;
        }
        edits += 1;
        if edits > 1 {
            return false;
        }
        if short.len() == long.len() {
            // substitution
            i += 1;
            j += 1;
        } else {
            // insertion in the longer string
            j += 1;
        }
    }
    edits + (long.len() - j) + (short.len() - i) <= 1
}
