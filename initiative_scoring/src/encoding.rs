//! Repair of UTF-8 text that went through a Latin-1 round-trip somewhere
//! between the form frontend and the sheet export.

/// The known corruptions and their repairs. This is a hard-coded correction
/// table, not a general decoder: every pattern is a literal byte sequence
/// observed in real exports. Sequences sharing the "â€" prefix are listed
/// longest first so a later rule cannot mangle an earlier fix.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã­", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã±", "ñ"),
    ("ÃÁ", "Á"),
    ("ÃÉ", "É"),
    ("ÃÍ", "Í"),
    ("ÃÓ", "Ó"),
    ("ÃÚ", "Ú"),
    ("ÃÑ", "Ñ"),
    ("Â¿", "¿"),
    ("Â¡", "¡"),
    ("Â°", "°"),
    ("âœ…", "✅"),
    ("â€œ", "\u{201c}"),
    ("â€“", "–"),
    ("â€”", "—"),
    ("â€", "\u{201d}"),
];

/// Applies the correction table to one free-text field. Empty input passes
/// through unchanged.
pub fn fix_encoding(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut fixed = text.to_string();
    for (bad, good) in REPLACEMENTS {
        if fixed.contains(bad) {
            fixed = fixed.replace(bad, good);
        }
    }
    fixed
}

#[cfg(test)]
mod tests {
    use super::fix_encoding;

    #[test]
    fn repairs_accented_vowels() {
        assert_eq!(fix_encoding("InnovaciÃ³n"), "Innovación");
        assert_eq!(fix_encoding("Ã¡Ã©Ã­Ã³Ãº"), "áéíóú");
        assert_eq!(fix_encoding("MaÃ±ana"), "Mañana");
    }

    #[test]
    fn repairs_punctuation_and_emoji() {
        assert_eq!(fix_encoding("Â¿CuÃ¡l?"), "¿Cuál?");
        assert_eq!(fix_encoding("âœ… listo"), "✅ listo");
    }

    #[test]
    fn quote_prefix_does_not_mangle_longer_sequences() {
        // "â€œ" must win over its "â€" prefix.
        assert_eq!(fix_encoding("â€œcitaâ€"), "\u{201c}cita\u{201d}");
        assert_eq!(fix_encoding("2020â€“2024"), "2020–2024");
    }

    #[test]
    fn clean_text_passes_through() {
        assert_eq!(fix_encoding("Innovación"), "Innovación");
        assert_eq!(fix_encoding(""), "");
    }
}
