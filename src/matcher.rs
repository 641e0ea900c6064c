//! Transcript matching against carriers and the resident directory
//!
//! A transcript is classified as a delivery when any token is a carrier
//! keyword. Otherwise the first token outside the filler stoplist is compared
//! by edit distance against every resident name and alias.

use serde::Deserialize;

use crate::directory::{DeliveryPerson, Directory, Resident};

/// Default maximum edit distance for a resident match
pub const DEFAULT_MAX_DISTANCE: usize = 2;

const DEFAULT_FILLER_WORDS: &[&str] = &[
    "a", "am", "and", "at", "can", "could", "for", "good", "hello", "here", "hey", "hi", "i", "im",
    "is", "it", "its", "looking", "may", "me", "morning", "my", "need", "oh", "please", "see",
    "speak", "talk", "thank", "thanks", "the", "this", "to", "uh", "um", "visit", "want", "with",
    "would", "yeah", "yes", "you",
];

const DEFAULT_CARRIER_KEYWORDS: &[&str] = &[
    "amazon", "dhl", "doordash", "fedex", "grubhub", "instacart", "postmates", "ubereats", "ups",
    "usps",
];

/// Tunable heuristics for the matcher
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Largest accepted edit distance between candidate token and a name
    pub max_distance: usize,

    /// Tokens skipped when picking the candidate name token
    pub filler_words: Vec<String>,

    /// Tokens that classify the caller as a delivery person
    pub carrier_keywords: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            filler_words: DEFAULT_FILLER_WORDS.iter().map(ToString::to_string).collect(),
            carrier_keywords: DEFAULT_CARRIER_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Who the caller turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A carrier keyword was heard
    Delivery(DeliveryPerson),
    /// The caller asked for this resident
    Resident(Resident),
    /// Nobody close enough
    NoMatch,
}

impl MatchOutcome {
    /// Resident to bridge the call to, if any
    #[must_use]
    pub const fn resident(&self) -> Option<&Resident> {
        match self {
            Self::Resident(r) => Some(r),
            Self::Delivery(_) | Self::NoMatch => None,
        }
    }
}

/// Lower-case, strip punctuation, split on whitespace
#[must_use]
pub fn tokenize(transcript: &str) -> Vec<String> {
    transcript
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(ToString::to_string)
        .collect()
}

/// Classic Levenshtein distance with unit insert/delete/substitute costs
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // Single rolling row of the DP table
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Matches transcripts against the directory and carrier list
#[derive(Debug, Clone)]
pub struct PersonMatcher {
    directory: Directory,
    config: MatcherConfig,
}

impl PersonMatcher {
    /// Keyword and filler lists are lower-cased to match tokenized input
    #[must_use]
    pub fn new(directory: Directory, mut config: MatcherConfig) -> Self {
        for word in config
            .filler_words
            .iter_mut()
            .chain(config.carrier_keywords.iter_mut())
        {
            *word = word.trim().to_lowercase();
        }
        Self { directory, config }
    }

    #[must_use]
    pub const fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Decide whether the transcript names a carrier, a resident, or neither
    #[must_use]
    pub fn match_transcript(&self, transcript: &str) -> MatchOutcome {
        let tokens = tokenize(transcript);

        if let Some(carrier) = tokens
            .iter()
            .find(|t| self.config.carrier_keywords.iter().any(|k| k == *t))
        {
            tracing::info!(carrier = %carrier, "delivery keyword detected (unverified)");
            return MatchOutcome::Delivery(DeliveryPerson::unverified(carrier));
        }

        let Some(candidate) = tokens
            .iter()
            .find(|t| !self.config.filler_words.iter().any(|f| f == *t))
        else {
            tracing::debug!(transcript, "no candidate name token");
            return MatchOutcome::NoMatch;
        };

        let mut best: Option<(&Resident, usize)> = None;
        for resident in self.directory.residents() {
            for spelling in resident.spellings() {
                let distance = edit_distance(candidate, &spelling.to_lowercase());
                if best.is_none_or(|(_, d)| distance < d) {
                    best = Some((resident, distance));
                }
            }
        }

        match best {
            Some((resident, distance)) if distance <= self.config.max_distance => {
                tracing::info!(candidate = %candidate, resident = %resident.name, distance, "resident matched");
                MatchOutcome::Resident(resident.clone())
            }
            Some((resident, distance)) => {
                tracing::info!(candidate = %candidate, closest = %resident.name, distance, "no resident within threshold");
                MatchOutcome::NoMatch
            }
            None => MatchOutcome::NoMatch,
        }
    }
}
