//! Static bidirectional mapping between characters and dot/dash codes.
//!
//! Reverse lookup is total: any code outside the table resolves to
//! [`UNKNOWN_CHAR`] so decoding never has to stop on a garbled letter.

/// Sentinel produced for codes that are not in the table
pub const UNKNOWN_CHAR: char = '?';

/// ITU letters, digits and common punctuation
const ENTRIES: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('?', "..--.."),
    ('\'', ".----."),
    ('!', "-.-.--"),
    ('/', "-..-."),
    ('(', "-.--."),
    (')', "-.--.-"),
    ('&', ".-..."),
    (':', "---..."),
    (';', "-.-.-."),
    ('=', "-...-"),
    ('+', ".-.-."),
    ('-', "-....-"),
    ('_', "..--.-"),
    ('"', ".-..-."),
    ('$', "...-..-"),
    ('@', ".--.-."),
];

/// Character <-> code lookup over the static table
#[derive(Debug, Clone, Copy, Default)]
pub struct MorseTable;

impl MorseTable {
    pub fn new() -> Self {
        Self
    }

    /// Code for a character, case-insensitive. `None` for unsupported characters.
    pub fn code_for(&self, ch: char) -> Option<&'static str> {
        let upper = ch.to_ascii_uppercase();
        ENTRIES
            .iter()
            .find(|(c, _)| *c == upper)
            .map(|(_, code)| *code)
    }

    /// Character for a code, `None` if the code is unmapped
    pub fn lookup(&self, code: &str) -> Option<char> {
        ENTRIES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(ch, _)| *ch)
    }

    /// Total reverse lookup: unmapped codes become [`UNKNOWN_CHAR`]
    pub fn decode(&self, code: &str) -> char {
        self.lookup(code).unwrap_or(UNKNOWN_CHAR)
    }

    /// Codes for every supported character of `text`, one per letter.
    /// Unsupported characters (spaces included) are skipped.
    pub fn encode(&self, text: &str) -> Vec<&'static str> {
        text.chars().filter_map(|ch| self.code_for(ch)).collect()
    }

    /// Iterate every (character, code) pair in table order
    pub fn entries(&self) -> impl Iterator<Item = (char, &'static str)> {
        ENTRIES.iter().copied()
    }

    pub fn len(&self) -> usize {
        ENTRIES.len()
    }

    pub fn is_empty(&self) -> bool {
        ENTRIES.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_is_bijective() {
        let table = MorseTable::new();
        let chars: HashSet<char> = table.entries().map(|(c, _)| c).collect();
        let codes: HashSet<&str> = table.entries().map(|(_, code)| code).collect();
        assert_eq!(chars.len(), table.len());
        assert_eq!(codes.len(), table.len());

        for (ch, code) in table.entries() {
            assert!(code.chars().all(|s| s == '.' || s == '-'), "bad code for {}", ch);
            assert_eq!(table.lookup(code), Some(ch));
            assert_eq!(table.code_for(ch), Some(code));
        }
    }

    #[test]
    fn test_forward_lookup_is_case_insensitive() {
        let table = MorseTable::new();
        assert_eq!(table.code_for('a'), Some(".-"));
        assert_eq!(table.code_for('A'), Some(".-"));
        assert_eq!(table.code_for('#'), None);
        assert_eq!(table.code_for(' '), None);
    }

    #[test]
    fn test_unknown_code_yields_sentinel() {
        let table = MorseTable::new();
        assert_eq!(table.decode("........"), UNKNOWN_CHAR);
        assert_eq!(table.decode(""), UNKNOWN_CHAR);
        assert_eq!(table.lookup("........"), None);
        assert_eq!(table.decode("..."), 'S');
    }

    #[test]
    fn test_encode_skips_unsupported() {
        let table = MorseTable::new();
        assert_eq!(table.encode("SOS"), vec!["...", "---", "..."]);
        assert_eq!(table.encode("a b#"), vec![".-", "-..."]);
        assert!(table.encode("").is_empty());
    }
}
