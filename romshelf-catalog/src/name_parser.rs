//! Heuristic filename parser, the fallback of last resort.
//!
//! ROM filenames commonly encode metadata in parenthesized tags:
//! ```text
//! Super Game (Europe) (Disc 1) (v1.2).zip
//! ```
//!
//! When a file matches nothing in the reference databases, this parser
//! extracts regions, disc designators, video formats, version, year and
//! hack markers from those tags and strips them from the display name.
//! It never fails; unrecognized tag content simply yields empty metadata.

use regex::Regex;

use crate::types::{stem_of, CatalogEntry, Identity};

/// Whether a system participates in heuristic naming.
///
/// Systems on the naming-excluded list (ports, standalone binaries) keep
/// their raw filenames and record no identity value at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingMode {
    Standard,
    Excluded,
}

/// Token -> pipe-separated canonical region codes.
///
/// Tokens are matched lowercase after multi-word phrases have been joined
/// with `_`. A token may expand to several codes ("world" covers the three
/// major release regions).
const REGION_SYNONYMS: &[(&str, &str)] = &[
    ("usa", "US"),
    ("us", "US"),
    ("u", "US"),
    ("america", "US"),
    ("europe", "EU"),
    ("eur", "EU"),
    ("e", "EU"),
    ("japan", "JP"),
    ("jpn", "JP"),
    ("jap", "JP"),
    ("j", "JP"),
    ("world", "US|EU|JP"),
    ("w", "US|EU|JP"),
    ("uk", "UK"),
    ("england", "UK"),
    ("united_kingdom", "UK"),
    ("france", "FR"),
    ("germany", "DE"),
    ("spain", "ES"),
    ("italy", "IT"),
    ("netherlands", "NL"),
    ("holland", "NL"),
    ("sweden", "SE"),
    ("norway", "NO"),
    ("denmark", "DK"),
    ("finland", "FI"),
    ("scandinavia", "SE|NO|DK"),
    ("australia", "AU"),
    ("korea", "KR"),
    ("china", "CN"),
    ("taiwan", "TW"),
    ("hong_kong", "HK"),
    ("hk", "HK"),
    ("brazil", "BR"),
    ("canada", "CA"),
    ("russia", "RU"),
    ("asia", "AS"),
    ("latin_america", "MX|BR|AR"),
    ("new_zealand", "NZ"),
    ("south_africa", "ZA"),
];

/// Region phrases that contain spaces. Normalized before tokenization so
/// the splitter treats them as single tokens.
const MULTI_WORD_REGIONS: &[&str] = &[
    "hong kong",
    "latin america",
    "new zealand",
    "south africa",
    "united kingdom",
];

fn region_codes_for(token: &str) -> Option<&'static str> {
    REGION_SYNONYMS
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, codes)| *codes)
}

/// Compiled pattern set for filename parsing.
///
/// Construct once and reuse; the orchestrator owns a single instance and
/// passes it by reference instead of going through ambient statics.
pub struct NameParser {
    paren: Regex,
    disc: Regex,
    format: Regex,
    version: Regex,
    revision: Regex,
    year: Regex,
    bracketed: Regex,
    whitespace: Regex,
}

impl Default for NameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NameParser {
    pub fn new() -> Self {
        // All patterns are fixed and known-valid; unwrap is fine here.
        Self {
            paren: Regex::new(r"\(([^()]*)\)").unwrap(),
            disc: Regex::new(r"(?i)\b(side|disk|disc|tape|set)[ _-]?([0-9]+|[a-z]\b)").unwrap(),
            format: Regex::new(r"(?i)\b(pal|ntsc|secam)\b").unwrap(),
            version: Regex::new(r"^[vV][0-9][0-9.]*$").unwrap(),
            revision: Regex::new(r"(?i)^rev[ .]?[a-z0-9.]+$").unwrap(),
            year: Regex::new(r"^(19|20)[0-9]{2}$").unwrap(),
            bracketed: Regex::new(r"\([^()]*\)|\[[^\[\]]*\]|\{[^{}]*\}").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Parse a relative catalog key into a best-guess entry.
    ///
    /// `candidate_crc` is the first identity value gathered for the file,
    /// recorded as a provisional `Crc` identity (unless the system is
    /// naming-excluded) so a future reference-database update can
    /// re-resolve the entry. Always succeeds.
    pub fn parse(
        &self,
        relative_path: &str,
        candidate_crc: Option<&str>,
        naming: NamingMode,
    ) -> CatalogEntry {
        let title = stem_of(relative_path).to_string();
        let normalized = self.normalize_regions(&title);

        let mut regions: Vec<String> = Vec::new();
        let mut discs: Vec<String> = Vec::new();
        let mut formats: Vec<String> = Vec::new();
        let mut hack: Option<String> = None;
        let mut version: Option<String> = None;
        let mut year: Option<String> = None;
        let mut extra: Vec<String> = Vec::new();

        for cap in self.paren.captures_iter(&normalized) {
            let segment = cap[1].trim();
            if segment.is_empty() {
                continue;
            }
            let mut recognized = false;

            // Per-token region lookup.
            for token in segment.split(|c: char| c == ',' || c == '-' || c.is_whitespace()) {
                let token = token.trim().to_lowercase();
                if token.is_empty() {
                    continue;
                }
                if let Some(codes) = region_codes_for(&token) {
                    recognized = true;
                    for code in codes.split('|') {
                        if !regions.iter().any(|r| r == code) {
                            regions.push(code.to_string());
                        }
                    }
                }
            }

            // Disc and format patterns run against the whole segment text.
            for m in self.disc.captures_iter(segment) {
                recognized = true;
                let designator = format!("{} {}", &m[1], &m[2]).to_uppercase();
                if !discs.contains(&designator) {
                    discs.push(designator);
                }
            }
            for m in self.format.find_iter(segment) {
                recognized = true;
                let fmt = m.as_str().to_uppercase();
                if !formats.contains(&fmt) {
                    formats.push(fmt);
                }
            }

            if self.version.is_match(segment) || self.revision.is_match(segment) {
                recognized = true;
                if version.is_none() {
                    version = Some(segment.to_string());
                }
            }
            if self.year.is_match(segment) {
                recognized = true;
                if year.is_none() {
                    year = Some(segment.to_string());
                }
            }
            if segment.to_lowercase().contains("hack") {
                recognized = true;
                if hack.is_none() {
                    hack = Some(segment.to_string());
                }
            }

            if !recognized {
                extra.push(segment.to_string());
            }
        }

        let identity = match (naming, candidate_crc) {
            (NamingMode::Excluded, _) | (NamingMode::Standard, None) => Identity::Heuristic,
            (NamingMode::Standard, Some(crc)) => Identity::Crc(crc.to_string()),
        };

        CatalogEntry {
            name: self.clean_name(&title),
            title,
            identity,
            regions,
            discs,
            formats,
            hack,
            version,
            year,
            extra,
        }
    }

    /// Strip every `(...)`, `[...]` and `{...}` segment (repeating until
    /// nothing changes, so nested brackets disappear too) and collapse
    /// runs of whitespace.
    pub fn clean_name(&self, stem: &str) -> String {
        let mut current = stem.to_string();
        loop {
            let stripped = self.bracketed.replace_all(&current, "").into_owned();
            if stripped == current {
                break;
            }
            current = stripped;
        }
        self.whitespace.replace_all(&current, " ").trim().to_string()
    }

    /// Join known multi-word region phrases with `_` so tokenization keeps
    /// them atomic. Matching is ASCII case-insensitive, which keeps byte
    /// offsets stable for the in-place replacement.
    fn normalize_regions(&self, stem: &str) -> String {
        let mut out = stem.to_string();
        for phrase in MULTI_WORD_REGIONS {
            let joined = phrase.replace(' ', "_");
            loop {
                let lower = out.to_ascii_lowercase();
                match lower.find(phrase) {
                    Some(pos) => out.replace_range(pos..pos + phrase.len(), &joined),
                    None => break,
                }
            }
        }
        out
    }
}
