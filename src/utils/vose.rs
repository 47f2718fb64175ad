// src/utils/vose.rs

//! VOSE / VO classification of free-text language and format labels.
//!
//! The rule set is a plain union: any marker hit means VOSE. There are no
//! exclusion markers, so an unrelated "subtítulo" in a card's text is a hit.
//!
//! The short markers favour recall: `" VO"` anywhere, a trailing `"VO"`, and a
//! leading `"VO "` (so `"VO Subtitulada"` counts even with no other marker).
//! `"ORIGINAL SUBTITULADA"` is likewise an addition for labels that spell the
//! format out. A title ending in "vo" is the accepted false positive.

/// One case-insensitive rule. Needles are written in upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Contains(&'static str),
    StartsWith(&'static str),
    EndsWith(&'static str),
}

impl Marker {
    fn matches(&self, upper: &str) -> bool {
        match self {
            Marker::Contains(needle) => upper.contains(needle),
            Marker::StartsWith(needle) => upper.starts_with(needle),
            Marker::EndsWith(needle) => upper.ends_with(needle),
        }
    }
}

/// Markers checked in order by [`is_vose`].
pub const VOSE_MARKERS: &[Marker] = &[
    Marker::Contains("VOSE"),
    Marker::Contains("V.O.S.E"),
    Marker::Contains("V.O."),
    Marker::Contains(" VO"),
    Marker::StartsWith("VO "),
    Marker::EndsWith("VO"),
    Marker::Contains("VERSIÓN ORIGINAL"),
    Marker::Contains("VERSION ORIGINAL"),
    Marker::Contains("ORIGINAL SUBTITULADA"),
    Marker::Contains("SUBTITULADO"),
    Marker::Contains("SUBTÍTULO"),
];

/// Whether `text` denotes an original-language subtitled showing.
pub fn is_vose(text: &str) -> bool {
    is_vose_with(text, VOSE_MARKERS)
}

/// [`is_vose`] against a caller-supplied rule set.
pub fn is_vose_with(text: &str, markers: &[Marker]) -> bool {
    let upper = text.trim().to_uppercase();
    if upper.is_empty() {
        return false;
    }
    markers.iter().any(|m| m.matches(&upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviations() {
        for label in ["VOSE", "vose", "V.O.S.E.", "V.O.", "VO", "Digital VO", "VO Inglés", "2D VOSE"] {
            assert!(is_vose(label), "{label}");
        }
    }

    #[test]
    fn test_spanish_phrases() {
        for label in [
            "Versión Original",
            "version original subtitulada",
            "Original Subtitulada",
            "Subtitulado en español",
            "SUBTÍTULOS",
        ] {
            assert!(is_vose(label), "{label}");
        }
    }

    #[test]
    fn test_dubbed_is_not_vose() {
        for label in ["Castellano", "2D", "Doblada", "ESP", "", "   "] {
            assert!(!is_vose(label), "{label}");
        }
    }

    #[test]
    fn test_leading_vo_label() {
        for label in ["VO Subtitulada", "VO 2D", "vo atmos"] {
            assert!(is_vose(label), "{label}");
        }
        assert!(!is_vose("VOLVER 2D"));
    }

    #[test]
    fn test_known_false_positive_is_kept() {
        // Recall over precision: no exclusion list.
        assert!(is_vose("Ver el subtítulo del cartel"));
    }

    #[test]
    fn test_classification_is_pure() {
        let text = "Sala 3 · V.O.S.E.";
        let first = is_vose(text);
        assert!((0..10).all(|_| is_vose(text) == first));
    }

    #[test]
    fn test_custom_rule_set() {
        let markers = [Marker::Contains("ATMOS")];
        assert!(is_vose_with("Dolby Atmos", &markers));
        assert!(!is_vose_with("VOSE", &markers));
    }
}
