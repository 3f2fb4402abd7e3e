//! Languages understood by the dictation pipeline

use serde::Serialize;

/// ISO 639 language descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Language {
    /// English display name, also substituted into the polishing prompt
    pub name: &'static str,
    /// ISO 639-1 code (e.g., "en")
    pub iso2: &'static str,
    /// ISO 639-2 code (e.g., "eng")
    pub iso3: &'static str,
}

impl Language {
    pub const ARABIC: Language = Language { name: "Arabic", iso2: "ar", iso3: "ara" };
    pub const CATALAN: Language = Language { name: "Catalan", iso2: "ca", iso3: "cat" };
    pub const CHINESE: Language = Language { name: "Chinese", iso2: "zh", iso3: "chi" };
    pub const CZECH: Language = Language { name: "Czech", iso2: "cs", iso3: "cze" };
    pub const DANISH: Language = Language { name: "Danish", iso2: "da", iso3: "dan" };
    pub const DUTCH: Language = Language { name: "Dutch", iso2: "nl", iso3: "dut" };
    pub const ENGLISH: Language = Language { name: "English", iso2: "en", iso3: "eng" };
    pub const FINNISH: Language = Language { name: "Finnish", iso2: "fi", iso3: "fin" };
    pub const FRENCH: Language = Language { name: "French", iso2: "fr", iso3: "fre" };
    pub const GERMAN: Language = Language { name: "German", iso2: "de", iso3: "ger" };
    pub const GREEK: Language = Language { name: "Modern Greek", iso2: "el", iso3: "gre" };
    pub const HEBREW: Language = Language { name: "Hebrew", iso2: "he", iso3: "heb" };
    pub const HINDI: Language = Language { name: "Hindi", iso2: "hi", iso3: "hin" };
    pub const HUNGARIAN: Language = Language { name: "Hungarian", iso2: "hu", iso3: "hun" };
    pub const INDONESIAN: Language = Language { name: "Indonesian", iso2: "id", iso3: "ind" };
    pub const ITALIAN: Language = Language { name: "Italian", iso2: "it", iso3: "ita" };
    pub const JAPANESE: Language = Language { name: "Japanese", iso2: "ja", iso3: "jpn" };
    pub const KOREAN: Language = Language { name: "Korean", iso2: "ko", iso3: "kor" };
    pub const NORWEGIAN: Language = Language { name: "Norwegian", iso2: "no", iso3: "nor" };
    pub const POLISH: Language = Language { name: "Polish", iso2: "pl", iso3: "pol" };
    pub const PORTUGUESE: Language = Language { name: "Portuguese", iso2: "pt", iso3: "por" };
    pub const ROMANIAN: Language = Language { name: "Romanian", iso2: "ro", iso3: "rum" };
    pub const RUSSIAN: Language = Language { name: "Russian", iso2: "ru", iso3: "rus" };
    pub const SPANISH: Language = Language { name: "Spanish", iso2: "es", iso3: "spa" };
    pub const SWEDISH: Language = Language { name: "Swedish", iso2: "sv", iso3: "swe" };
    pub const TURKISH: Language = Language { name: "Turkish", iso2: "tr", iso3: "tur" };
    pub const UKRAINIAN: Language = Language { name: "Ukrainian", iso2: "uk", iso3: "ukr" };
    pub const VIETNAMESE: Language = Language { name: "Vietnamese", iso2: "vi", iso3: "vie" };

    /// Get language info by ISO 639-1 code (case-insensitive)
    pub fn from_iso2(code: &str) -> Option<Language> {
        SUPPORTED_LANGUAGES
            .iter()
            .find(|l| l.iso2.eq_ignore_ascii_case(code))
            .copied()
    }

    /// Check if a language code is supported
    pub fn is_supported(code: &str) -> bool {
        Self::from_iso2(code).is_some()
    }
}

impl Default for Language {
    fn default() -> Self {
        DEFAULT_LANGUAGE
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Language used when nothing is configured
pub const DEFAULT_LANGUAGE: Language = Language::ENGLISH;

/// Supported languages list
pub static SUPPORTED_LANGUAGES: &[Language] = &[
    Language::ARABIC,
    Language::CATALAN,
    Language::CHINESE,
    Language::CZECH,
    Language::DANISH,
    Language::DUTCH,
    Language::ENGLISH,
    Language::FINNISH,
    Language::FRENCH,
    Language::GERMAN,
    Language::GREEK,
    Language::HEBREW,
    Language::HINDI,
    Language::HUNGARIAN,
    Language::INDONESIAN,
    Language::ITALIAN,
    Language::JAPANESE,
    Language::KOREAN,
    Language::NORWEGIAN,
    Language::POLISH,
    Language::PORTUGUESE,
    Language::ROMANIAN,
    Language::RUSSIAN,
    Language::SPANISH,
    Language::SWEDISH,
    Language::TURKISH,
    Language::UKRAINIAN,
    Language::VIETNAMESE,
];
