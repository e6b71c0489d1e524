use serde::{Deserialize, Serialize};

/// A free-text value canonicalized into a comparable key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedText {
    /// The input, preserved verbatim
    pub original: String,
    /// Trimmed, whitespace-collapsed, lower-cased, diacritic-folded form
    pub normalized: String,
    /// 1.0 when only casing/whitespace changed; 0.9 when the source text
    /// needed heavier cleanup
    pub confidence: f64,
}

/// A normalized place name, optionally enriched with geographic detail.
///
/// The geographic fields are only ever populated from the external geocoding
/// collaborator; the engine never invents them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedPlace {
    pub original: String,
    pub normalized: String,
    pub confidence: f64,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<NormalizedText> for NormalizedPlace {
    fn from(text: NormalizedText) -> Self {
        Self {
            original: text.original,
            normalized: text.normalized,
            confidence: text.confidence,
            country: None,
            region: None,
            city: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// Canonicalizes free-text names and places. Deterministic and pure; the
/// normalized form is the exact-match key consulted before any fuzzy scoring.
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn normalize(raw: &str) -> NormalizedText {
        let collapsed: String = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let normalized = fold_diacritics(&collapsed);

        // Casing and whitespace cleanup is superficial; anything beyond that
        // signals a noisy source string.
        let confidence = if normalized == collapsed { 1.0 } else { 0.9 };

        NormalizedText {
            original: raw.to_string(),
            normalized,
            confidence,
        }
    }

    pub fn normalize_place(raw: &str) -> NormalizedPlace {
        Self::normalize(raw).into()
    }
}

/// Folds common Latin diacritics to ASCII. Umlauts and ß use the German
/// transliteration (ä -> ae, ß -> ss) since much of the source material is
/// German-language archival data.
fn fold_diacritics(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'å' | 'ā' | 'ă' => out.push('a'),
            'ä' | 'æ' => out.push_str("ae"),
            'ç' | 'ć' | 'č' => out.push('c'),
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' => out.push('e'),
            'ì' | 'í' | 'î' | 'ï' | 'ī' => out.push('i'),
            'ñ' | 'ń' => out.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ō' => out.push('o'),
            'ö' | 'ø' | 'œ' => out.push_str("oe"),
            'ù' | 'ú' | 'û' | 'ū' => out.push('u'),
            'ü' => out.push_str("ue"),
            'ý' | 'ÿ' => out.push('y'),
            'ß' => out.push_str("ss"),
            'ś' | 'š' => out.push('s'),
            'ž' | 'ź' | 'ż' => out.push('z'),
            'ł' => out.push('l'),
            'đ' => out.push('d'),
            'ț' => out.push('t'),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_collapses_and_lowercases() {
        let text = TextNormalizer::normalize("  Sankt   Petersburg  ");
        assert_eq!(text.normalized, "sankt petersburg");
        assert_eq!(text.original, "  Sankt   Petersburg  ");
        assert_eq!(text.confidence, 1.0);
    }

    #[test]
    fn diacritic_folding_lowers_confidence() {
        let text = TextNormalizer::normalize("Zürich");
        assert_eq!(text.normalized, "zuerich");
        assert_eq!(text.confidence, 0.9);

        let text = TextNormalizer::normalize("São Paulo");
        assert_eq!(text.normalized, "sao paulo");
        assert_eq!(text.confidence, 0.9);
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["  Wien ", "Zürich", "GRAZ", "bad ischl"] {
            let first = TextNormalizer::normalize(raw);
            let second = TextNormalizer::normalize(&first.normalized);
            assert_eq!(second.normalized, first.normalized, "{raw:?}");
            assert_eq!(second.confidence, 1.0, "{raw:?}");
        }
    }

    #[test]
    fn place_starts_without_geographic_detail() {
        let place = TextNormalizer::normalize_place("Wien");
        assert_eq!(place.normalized, "wien");
        assert!(place.country.is_none());
        assert!(place.latitude.is_none());
    }

    #[test]
    fn empty_input_yields_empty_key() {
        let text = TextNormalizer::normalize("   ");
        assert_eq!(text.normalized, "");
        assert_eq!(text.confidence, 1.0);
    }
}
