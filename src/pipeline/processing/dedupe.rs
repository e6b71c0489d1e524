use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{DetectorConfig, SimilarityConfig};
use crate::domain::RecordSnapshot;
use crate::pipeline::processing::dates::FuzzyDate;
use crate::pipeline::processing::similarity::SimilarityScorer;

/// Which signal(s) of an existing record matched the candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchField {
    Name,
    Date,
    Place,
}

/// One existing record that looks like a duplicate of the candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub existing_id: Uuid,
    /// Maximum of the per-field similarities that cleared their own
    /// thresholds. Deliberately never an average: one strong signal must not
    /// be diluted by several weak ones.
    pub confidence: f64,
    pub matched_fields: BTreeSet<MatchField>,
    /// Human-readable explanation of which signal(s) drove the match
    pub reason: String,
}

/// The candidate-side inputs to duplicate detection: display name, primary
/// date and place, as produced by normalization.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    pub name: String,
    pub date: Option<FuzzyDate>,
    pub place: Option<String>,
}

/// Finds probable duplicates of a candidate record in a read-only snapshot
/// of existing records.
///
/// Two independent paths can flag an existing record: a name/title
/// similarity clearing the strong threshold, or the conjunction of date
/// proximity with a place similarity clearing the supporting threshold. A
/// name can coincidentally repeat across unrelated people, so it triggers
/// alone only at the higher bar; two agreeing weaker signals are together
/// strong evidence and may trigger at the lower one.
pub struct DuplicateDetector {
    similarity: SimilarityConfig,
    detector: DetectorConfig,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self {
            similarity: SimilarityConfig::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl DuplicateDetector {
    pub fn new(similarity: SimilarityConfig, detector: DetectorConfig) -> Self {
        Self {
            similarity,
            detector,
        }
    }

    /// Candidates come back ordered by confidence descending, ties broken by
    /// ascending existing id. The snapshot is never mutated.
    pub fn find_matches(
        &self,
        candidate: &CandidateRecord,
        existing: &[RecordSnapshot],
    ) -> Vec<MatchCandidate> {
        let mut matches = Vec::new();

        for record in existing {
            if let Some(found) = self.match_one(candidate, record) {
                matches.push(found);
            }
        }

        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.existing_id.cmp(&b.existing_id))
        });
        matches
    }

    /// Whether any match clears the caller-facing skip threshold.
    pub fn best_duplicate(
        &self,
        candidate: &CandidateRecord,
        existing: &[RecordSnapshot],
    ) -> Option<MatchCandidate> {
        self.find_matches(candidate, existing)
            .into_iter()
            .find(|m| m.confidence >= self.detector.skip_threshold)
    }

    fn match_one(
        &self,
        candidate: &CandidateRecord,
        existing: &RecordSnapshot,
    ) -> Option<MatchCandidate> {
        let mut matched_fields = BTreeSet::new();
        let mut reasons = Vec::new();
        let mut confidence: f64 = 0.0;

        // Path 1: strong name/title similarity on its own
        let name_score = SimilarityScorer::score(&candidate.name, &existing.name);
        if name_score >= self.similarity.strong_match {
            matched_fields.insert(MatchField::Name);
            reasons.push(format!("name similarity {name_score:.2}"));
            confidence = confidence.max(name_score);
        }

        // Path 2: date proximity corroborated by place similarity. Place
        // similarity never triggers alone.
        if let (Some(candidate_date), Some(existing_date)) = (&candidate.date, &existing.date) {
            if dates_coincide(candidate_date, existing_date) {
                if let (Some(candidate_place), Some(existing_place)) =
                    (&candidate.place, &existing.place)
                {
                    let place_score = SimilarityScorer::score(candidate_place, existing_place);
                    if place_score >= self.similarity.supporting_match {
                        matched_fields.insert(MatchField::Date);
                        matched_fields.insert(MatchField::Place);
                        reasons.push(format!(
                            "date proximity with place similarity {place_score:.2}"
                        ));
                        confidence = confidence.max(place_score);
                    }
                }
            }
        }

        if matched_fields.is_empty() || confidence < self.detector.confidence_floor {
            return None;
        }

        Some(MatchCandidate {
            existing_id: existing.id,
            confidence,
            matched_fields,
            reason: reasons.join("; "),
        })
    }
}

/// Date proximity window: same calendar day, or the same year when either
/// side only carries year precision.
fn dates_coincide(a: &FuzzyDate, b: &FuzzyDate) -> bool {
    use chrono::Datelike;

    match (a.resolved, b.resolved) {
        (Some(day_a), Some(day_b)) => {
            if a.is_year_only() || b.is_year_only() {
                day_a.year() == day_b.year()
            } else {
                day_a == day_b
            }
        }
        _ => false,
    }
}
