// Advisory text signals computed during triage.
// Best-effort telemetry only: values are logged alongside the scan and
// never influence the deception score.

use regex::Regex;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextSignals {
    pub word_count: usize,
    pub ttr: f64,
    pub avg_sentence_len: f64,
    pub punctuation_ratio: f64,
    pub repeat_ratio: f64,
}

pub fn compute_signals(text: &str) -> TextSignals {
    if text.is_empty() {
        return TextSignals::default();
    }

    let word_re = Regex::new(r"[A-Za-z0-9_']+").expect("word regex");
    let words: Vec<&str> = word_re.find_iter(text).map(|m| m.as_str()).collect();
    let total_words = words.len();

    if total_words == 0 {
        return TextSignals::default();
    }

    // Type-Token Ratio
    let unique_words: HashSet<String> =
        words.iter().map(|w| w.to_ascii_lowercase()).collect();
    let ttr = unique_words.len() as f64 / total_words as f64;

    // Average sentence length in chars
    let sentences: Vec<&str> = text
        .split(|c| matches!(c, '.' | '!' | '?'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let avg_sentence_len = if sentences.is_empty() {
        text.chars().count() as f64
    } else {
        sentences.iter().map(|s| s.chars().count()).sum::<usize>() as f64
            / sentences.len() as f64
    };

    // Punctuation ratio
    let punct_count = text.chars().filter(|c| matches!(c, ',' | '.' | '!' | '?' | ';' | ':')).count();
    let char_len = text.chars().count().max(1) as f64;
    let punctuation_ratio = punct_count as f64 / char_len;

    // Repeat ratio: fraction of vocab items that occur >= 3 times
    let mut freq: HashMap<String, usize> = HashMap::new();
    for w in &words {
        *freq.entry(w.to_ascii_lowercase()).or_insert(0) += 1;
    }
    let repeat_ratio =
        freq.values().filter(|&&v| v >= 3).count() as f64 / freq.len().max(1) as f64;

    TextSignals {
        word_count: total_words,
        ttr,
        avg_sentence_len,
        punctuation_ratio,
        repeat_ratio,
    }
}
