//! Cleanup of OCR text before it is rendered.
//!
//! Applied per text block, never to LaTeX or to the rendered Markdown as a
//! whole, so table pipes and math delimiters are left alone.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Cleanup preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPreset {
    /// Minimal cleanup: Unicode NFC normalization only
    Minimal,
    /// Standard cleanup: NFC + ligatures + hyphenation + whitespace
    #[default]
    Standard,
    /// Aggressive cleanup: also strips private-use glyphs and joins lines
    Aggressive,
}

impl std::str::FromStr for CleanupPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Ok(CleanupPreset::Minimal),
            "standard" => Ok(CleanupPreset::Standard),
            "aggressive" => Ok(CleanupPreset::Aggressive),
            other => Err(format!("unknown cleanup preset: {}", other)),
        }
    }
}

/// Options for text cleanup.
#[derive(Debug, Clone)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Standardize bullet characters (●, ○, ■ → •)
    pub standardize_bullets: bool,

    /// Fix ligatures (fi, fl, etc.)
    pub fix_ligatures: bool,

    /// Fix hyphenation at line breaks
    pub fix_hyphenation: bool,

    /// Remove the space OCR tends to put before punctuation
    pub fix_punctuation_spacing: bool,

    /// Remove Private Use Area (PUA) characters
    pub remove_pua: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Join the lines of a block into one
    pub join_lines: bool,

    /// Collapse runs of spaces
    pub normalize_whitespace: bool,
}

impl CleanupOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        match preset {
            CleanupPreset::Minimal => Self::minimal(),
            CleanupPreset::Standard => Self::standard(),
            CleanupPreset::Aggressive => Self::aggressive(),
        }
    }

    /// Minimal cleanup options.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: true,
            standardize_bullets: false,
            fix_ligatures: false,
            fix_hyphenation: false,
            fix_punctuation_spacing: false,
            remove_pua: false,
            remove_replacement_char: false,
            join_lines: false,
            normalize_whitespace: true,
        }
    }

    /// Standard cleanup options.
    pub fn standard() -> Self {
        Self {
            normalize_unicode: true,
            standardize_bullets: true,
            fix_ligatures: true,
            fix_hyphenation: true,
            fix_punctuation_spacing: true,
            remove_pua: false,
            remove_replacement_char: true,
            join_lines: false,
            normalize_whitespace: true,
        }
    }

    /// Aggressive cleanup options.
    pub fn aggressive() -> Self {
        Self {
            remove_pua: true,
            join_lines: true,
            ..Self::standard()
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Text cleanup pipeline.
pub struct CleanupPipeline {
    options: CleanupOptions,
    hyphenation_regex: Regex,
    punctuation_regex: Regex,
    spaces_regex: Regex,
    ligature_map: Vec<(&'static str, &'static str)>,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Result<Self> {
        Ok(Self {
            options,
            hyphenation_regex: compile(r"([a-zA-Z])-[ \t]*\n[ \t]*([a-z])")?,
            punctuation_regex: compile(r"[ \t]+([,.;:!?])")?,
            spaces_regex: compile(r"[ \t]{2,}")?,
            ligature_map: vec![
                ("\u{FB00}", "ff"),
                ("\u{FB01}", "fi"),
                ("\u{FB02}", "fl"),
                ("\u{FB03}", "ffi"),
                ("\u{FB04}", "ffl"),
                ("\u{FB05}", "st"),
                ("\u{FB06}", "st"),
            ],
        })
    }

    /// Create a pipeline from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Result<Self> {
        Self::new(CleanupOptions::from_preset(preset))
    }

    /// Process one block of text through the cleanup pipeline.
    pub fn process(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.options.normalize_unicode {
            result = result.nfc().collect();
        }

        if self.options.fix_ligatures {
            for (ligature, replacement) in &self.ligature_map {
                result = result.replace(ligature, replacement);
            }
        }

        if self.options.standardize_bullets {
            result = standardize_bullets(&result);
        }

        if self.options.remove_pua {
            result = remove_pua_chars(&result);
        }

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        // Must run before lines are joined.
        if self.options.fix_hyphenation {
            result = self.hyphenation_regex.replace_all(&result, "$1$2").to_string();
        }

        if self.options.join_lines {
            result = result
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
        }

        if self.options.fix_punctuation_spacing {
            result = self.punctuation_regex.replace_all(&result, "$1").to_string();
        }

        if self.options.normalize_whitespace {
            result = self.spaces_regex.replace_all(&result, " ").to_string();
        }

        result.trim().to_string()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("invalid cleanup pattern: {}", e)))
}

fn standardize_bullets(text: &str) -> String {
    let bullets = ['●', '○', '■', '□', '◆', '◇', '▪', '▫', '►', '▻'];
    text.chars()
        .map(|c| if bullets.contains(&c) { '•' } else { c })
        .collect()
}

fn remove_pua_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            let code = *c as u32;
            !(0xE000..=0xF8FF).contains(&code)
                && !(0xF0000..=0xFFFFD).contains(&code)
                && !(0x100000..=0x10FFFD).contains(&code)
        })
        .collect()
}
