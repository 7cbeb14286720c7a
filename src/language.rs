use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::LanguageConfig;
use crate::error::{PipelineError, Result};
use crate::transcribe::Granularity;

/// Languages known to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Yoruba,
    English,
    French,
    Fon,
    Spanish,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Yoruba,
        Language::English,
        Language::French,
        Language::Fon,
        Language::Spanish,
    ];

    /// Display name, also used in derived file names
    pub fn name(&self) -> &'static str {
        match self {
            Self::Yoruba => "Yoruba",
            Self::English => "English",
            Self::French => "French",
            Self::Fon => "Fon",
            Self::Spanish => "Spanish",
        }
    }

    /// Code sent to the translation backend
    pub fn code(&self) -> &'static str {
        match self {
            Self::Yoruba => "yo",
            Self::English => "en",
            Self::French => "fr",
            Self::Fon => "fon",
            Self::Spanish => "es",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| {
                lang.name().eq_ignore_ascii_case(needle) || lang.code().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| PipelineError::UnsupportedLanguage(needle.to_string()))
    }
}

/// Spoken languages with a transcription model
pub const DEFAULT_INPUT_LANGUAGES: [Language; 4] = [
    Language::Yoruba,
    Language::English,
    Language::French,
    Language::Fon,
];

/// What the pipeline can do with a given language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Transcription backend variant used when this is the spoken language
    pub granularity: Granularity,
    pub input: bool,
    pub output: bool,
    pub dub: bool,
}

/// Single lookup table consulted at the pipeline entry point
#[derive(Debug, Clone)]
pub struct LanguageTable {
    entries: HashMap<Language, Capabilities>,
}

impl LanguageTable {
    /// Build the table from the transcribable and the subtitle languages
    pub fn new(input_languages: &[Language], output_languages: &[Language]) -> Self {
        let entries = Language::ALL
            .iter()
            .map(|&lang| {
                let granularity = match lang {
                    Language::Fon => Granularity::Word,
                    _ => Granularity::Phrase,
                };
                let caps = Capabilities {
                    granularity,
                    input: input_languages.contains(&lang),
                    output: output_languages.contains(&lang),
                    dub: lang != Language::Fon,
                };
                (lang, caps)
            })
            .collect();

        Self { entries }
    }

    pub fn from_config(config: &LanguageConfig) -> Result<Self> {
        let input = parse_configured(&config.input, "input")?;
        let output = parse_configured(&config.output, "output")?;

        Ok(Self::new(&input, &output))
    }

    pub fn capabilities(&self, lang: Language) -> Capabilities {
        // Every Language variant is inserted by `new`
        self.entries[&lang]
    }

    /// Resolve a spoken-language name, rejecting languages we cannot transcribe
    pub fn resolve_input(&self, name: &str) -> Result<Language> {
        let lang: Language = name.parse()?;
        if self.capabilities(lang).input {
            Ok(lang)
        } else {
            Err(PipelineError::UnsupportedLanguage(format!(
                "transcription from {} is not supported",
                lang
            )))
        }
    }

    /// Resolve a subtitle-language name
    pub fn resolve_output(&self, name: &str) -> Result<Language> {
        let lang: Language = name.parse()?;
        if self.capabilities(lang).output {
            Ok(lang)
        } else {
            Err(PipelineError::UnsupportedLanguage(format!(
                "subtitles in {} are not supported",
                lang
            )))
        }
    }

    pub fn dub_supported(&self, input: Language, output: Language) -> bool {
        self.capabilities(input).dub && self.capabilities(output).dub
    }

    /// Rows in declaration order, for listing
    pub fn rows(&self) -> Vec<(Language, Capabilities)> {
        Language::ALL
            .iter()
            .map(|&lang| (lang, self.capabilities(lang)))
            .collect()
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new(&DEFAULT_INPUT_LANGUAGES, &Language::ALL)
    }
}

fn parse_configured(names: &[String], role: &str) -> Result<Vec<Language>> {
    names
        .iter()
        .map(|name| {
            name.parse::<Language>().map_err(|_| {
                PipelineError::Config(format!("Unknown {} language in config: {}", role, name))
            })
        })
        .collect()
}
