//! Core domain types: facts, their categories, and the content language.
//!
//! `Fact` is serialized in camelCase so the persisted favorites blob keeps
//! the `videoUrl` / `imageUrl` field names.
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Language
// ============================================================================

/// Language of the generated content and of the UI strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    /// Parse a language code ("en", "fr", "fr_FR.UTF-8", ...).
    ///
    /// Only the first two characters are considered, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        let prefix: String = code.trim().chars().take(2).collect();
        match prefix.to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "fr" => Some(Self::Fr),
            _ => None,
        }
    }

    /// Two-letter code used in the header and in config.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// The other language.
    pub fn toggle(self) -> Self {
        match self {
            Self::En => Self::Fr,
            Self::Fr => Self::En,
        }
    }

    /// Name of the language as written into the generation prompt.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Self::En => "ENGLISH",
            Self::Fr => "FRENCH",
        }
    }

    /// The five category labels the provider may use for this language.
    pub fn categories(self) -> &'static [Category] {
        match self {
            Self::En => &[
                Category::Ghost,
                Category::Witchcraft,
                Category::Cryptid,
                Category::Ufo,
                Category::SupernaturalPhenomenon,
            ],
            Self::Fr => &[
                Category::Fantome,
                Category::Sorcellerie,
                Category::Creature,
                Category::Ovni,
                Category::PhenomeneSurnaturel,
            ],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// Category
// ============================================================================

/// The fixed bilingual set of fact categories.
///
/// English and French labels are distinct values: a favorite saved while
/// browsing in French keeps its French label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Ghost")]
    Ghost,
    #[serde(rename = "Witchcraft")]
    Witchcraft,
    #[serde(rename = "Cryptid")]
    Cryptid,
    #[serde(rename = "UFO")]
    Ufo,
    #[serde(rename = "Supernatural Phenomenon")]
    SupernaturalPhenomenon,
    #[serde(rename = "Fantôme")]
    Fantome,
    #[serde(rename = "Sorcellerie")]
    Sorcellerie,
    #[serde(rename = "Créature")]
    Creature,
    #[serde(rename = "OVNI")]
    Ovni,
    #[serde(rename = "Phénomène Surnaturel")]
    PhenomeneSurnaturel,
}

/// Language-independent grouping of categories, used for display styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Ghost,
    Witchcraft,
    Cryptid,
    Ufo,
    Phenomenon,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Ghost,
        Category::Witchcraft,
        Category::Cryptid,
        Category::Ufo,
        Category::SupernaturalPhenomenon,
        Category::Fantome,
        Category::Sorcellerie,
        Category::Creature,
        Category::Ovni,
        Category::PhenomeneSurnaturel,
    ];

    /// Display label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ghost => "Ghost",
            Self::Witchcraft => "Witchcraft",
            Self::Cryptid => "Cryptid",
            Self::Ufo => "UFO",
            Self::SupernaturalPhenomenon => "Supernatural Phenomenon",
            Self::Fantome => "Fantôme",
            Self::Sorcellerie => "Sorcellerie",
            Self::Creature => "Créature",
            Self::Ovni => "OVNI",
            Self::PhenomeneSurnaturel => "Phénomène Surnaturel",
        }
    }

    /// Parse a label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == wanted)
    }

    pub fn language(self) -> Language {
        match self {
            Self::Ghost
            | Self::Witchcraft
            | Self::Cryptid
            | Self::Ufo
            | Self::SupernaturalPhenomenon => Language::En,
            _ => Language::Fr,
        }
    }

    pub fn kind(self) -> CategoryKind {
        match self {
            Self::Ghost | Self::Fantome => CategoryKind::Ghost,
            Self::Witchcraft | Self::Sorcellerie => CategoryKind::Witchcraft,
            Self::Cryptid | Self::Creature => CategoryKind::Cryptid,
            Self::Ufo | Self::Ovni => CategoryKind::Ufo,
            Self::SupernaturalPhenomenon | Self::PhenomeneSurnaturel => CategoryKind::Phenomenon,
        }
    }

    /// Catch-all category of a language, used when the provider invents a label.
    pub fn fallback_for(lang: Language) -> Self {
        match lang {
            Language::En => Self::SupernaturalPhenomenon,
            Language::Fr => Self::PhenomeneSurnaturel,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Fact
// ============================================================================

/// One generated content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub details: String,
    pub category: Category,
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Fact {
    /// Text read aloud by the narration controller.
    pub fn narration_text(&self) -> String {
        format!("{}. {}", self.title, self.details)
    }

    /// Case-insensitive substring match over title, summary and details.
    ///
    /// `query_lower` must already be lowercased; an empty query matches.
    pub fn matches_query(&self, query_lower: &str) -> bool {
        query_lower.is_empty()
            || self.title.to_lowercase().contains(query_lower)
            || self.summary.to_lowercase().contains(query_lower)
            || self.details.to_lowercase().contains(query_lower)
    }
}

/// A fact as returned by the text provider, before its cover exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactDescriptor {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub details: String,
    pub category: Category,
    pub video_url: String,
    pub image_prompt: String,
}

impl FactDescriptor {
    /// Complete the descriptor with its generated cover.
    pub fn into_fact(self, image_url: Option<String>) -> Fact {
        Fact {
            id: self.id,
            title: self.title,
            summary: self.summary,
            details: self.details,
            category: self.category,
            video_url: self.video_url,
            image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact() -> Fact {
        Fact {
            id: "bell-witch".to_string(),
            title: "The Bell Witch".to_string(),
            summary: "A Tennessee haunting".to_string(),
            details: "Reported poltergeist activity in 1817.".to_string(),
            category: Category::Witchcraft,
            video_url: "https://www.youtube.com/watch?v=abc".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_language_from_code() {
        assert_eq!(Language::from_code("en"), Some(Language::En));
        assert_eq!(Language::from_code("FR"), Some(Language::Fr));
        assert_eq!(Language::from_code("fr_CA.UTF-8"), Some(Language::Fr));
        assert_eq!(Language::from_code("de_DE"), None);
        assert_eq!(Language::from_code(""), None);
    }

    #[test]
    fn test_language_toggle_roundtrip() {
        assert_eq!(Language::En.toggle(), Language::Fr);
        assert_eq!(Language::En.toggle().toggle(), Language::En);
    }

    #[test]
    fn test_category_labels_parse_back() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!(Category::from_label("  ufo "), Some(Category::Ufo));
        assert_eq!(
            Category::from_label("phénomène surnaturel"),
            Some(Category::PhenomeneSurnaturel)
        );
        assert_eq!(Category::from_label("Vampire"), None);
    }

    #[test]
    fn test_category_kind_pairs_languages() {
        assert_eq!(Category::Ghost.kind(), Category::Fantome.kind());
        assert_eq!(Category::Ufo.kind(), Category::Ovni.kind());
        assert_ne!(Category::Ghost.kind(), Category::Cryptid.kind());
        assert_eq!(Category::Creature.language(), Language::Fr);
    }

    #[test]
    fn test_language_categories_belong_to_language() {
        for lang in [Language::En, Language::Fr] {
            assert_eq!(lang.categories().len(), 5);
            assert!(lang.categories().iter().all(|c| c.language() == lang));
        }
    }

    #[test]
    fn test_fact_serializes_camel_case() {
        let mut f = fact();
        f.image_url = Some("data:image/png;base64,AAAA".to_string());
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("\"videoUrl\""));
        assert!(json.contains("\"imageUrl\""));
        assert!(json.contains("\"Witchcraft\""));

        let back: Fact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn test_fact_without_image_omits_field() {
        let json = serde_json::to_string(&fact()).unwrap();
        assert!(!json.contains("imageUrl"));
    }

    #[test]
    fn test_matches_query() {
        let f = fact();
        assert!(f.matches_query(""));
        assert!(f.matches_query("bell"));
        assert!(f.matches_query("tennessee"));
        assert!(f.matches_query("1817"));
        assert!(!f.matches_query("ufo"));
    }

    #[test]
    fn test_narration_text() {
        assert_eq!(
            fact().narration_text(),
            "The Bell Witch. Reported poltergeist activity in 1817."
        );
    }
}
