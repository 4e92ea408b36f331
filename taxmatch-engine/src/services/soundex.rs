//! Phonetic key for scientific names
//!
//! Applied word by word: case-fold, drop anything that is not a letter,
//! rewrite spelling variants common in latinised names, collapse doubled
//! letters, and (for epithets only) reduce gendered endings to one form.
//! Queries and indexed records use the same key.

const DIGRAPHS: &[(&str, &str)] = &[
    ("ae", "e"),
    ("oe", "e"),
    ("ph", "f"),
    ("rh", "r"),
    ("th", "t"),
    ("ch", "c"),
    ("y", "i"),
    ("k", "c"),
    ("z", "s"),
    ("j", "i"),
];

/// Gendered epithet endings, longest first
const ENDINGS: &[&str] = &["ense", "ensis", "um", "us", "is", "os", "on", "a", "e"];

pub fn taxon_soundex(name: &str) -> String {
    name.split_whitespace()
        .enumerate()
        .map(|(position, word)| soundex_word(word, position > 0))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn soundex_word(word: &str, epithet: bool) -> String {
    let mut key: String = word
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .filter(char::is_ascii_lowercase)
        .collect();

    for &(from, to) in DIGRAPHS {
        if key.contains(from) {
            key = key.replace(from, to);
        }
    }

    let mut collapsed = String::with_capacity(key.len());
    let mut last = None;
    for c in key.chars() {
        if Some(c) != last {
            collapsed.push(c);
        }
        last = Some(c);
    }

    if epithet && collapsed.len() > 4 {
        for ending in ENDINGS {
            if let Some(stem) = collapsed.strip_suffix(ending) {
                let stem = stem.to_string();
                return format!("{}a", stem.trim_end_matches('a'));
            }
        }
        if !collapsed.ends_with('a') {
            collapsed.push('a');
        }
    }
    collapsed
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' | 'å' | 'ã' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubled_letters_collapse() {
        assert_eq!(taxon_soundex("Acacia dealbatta"), taxon_soundex("Acacia dealbata"));
    }

    #[test]
    fn test_gendered_endings() {
        assert_eq!(taxon_soundex("Acacia dealbata"), taxon_soundex("Acacia dealbatus"));
        assert_eq!(taxon_soundex("Racosperma dealbatum"), "racosperma dealbata");
    }

    #[test]
    fn test_genus_ending_untouched() {
        assert_eq!(taxon_soundex("Agathis"), "agatis");
        assert_ne!(taxon_soundex("Agathis"), taxon_soundex("Agatha"));
    }

    #[test]
    fn test_digraphs_and_noise() {
        assert_eq!(taxon_soundex("Phyllanthus"), taxon_soundex("Filanthus"));
        assert_eq!(taxon_soundex("Caesalpinia  "), taxon_soundex("Cesalpinia"));
        assert_eq!(taxon_soundex("Bossiaea × hybrida"), taxon_soundex("Bossiaea hybrida"));
        assert_eq!(taxon_soundex(""), "");
    }
}
