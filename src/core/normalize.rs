/// Normalize a label before similarity scoring
///
/// Steps, in order:
/// 1. Lower-case
/// 2. Trim leading/trailing whitespace
/// 3. Drop every character that is neither a word character
///    (alphanumeric or `_`) nor whitespace
/// 4. Collapse whitespace runs into a single space
///
/// Trimming happens before punctuation is removed, so `"Nike !"` keeps
/// a trailing space (`"nike "`).
pub fn normalize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_whitespace = false;

    for c in lowered.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else if is_word_char(c) {
            out.push(c);
            in_whitespace = false;
        }
    }

    out
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Nike Inc."), "nike inc");
        assert_eq!(normalize("Coca-Cola"), "cocacola");
        assert_eq!(normalize("  AT&T  "), "att");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("trail \t  running\nshoes"), "trail running shoes");
    }

    #[test]
    fn test_keeps_underscores_and_digits() {
        assert_eq!(normalize("Web_3 Gaming 2024"), "web_3 gaming 2024");
    }

    #[test]
    fn test_punctuation_removed_after_trim() {
        assert_eq!(normalize("Nike !"), "nike ");
        assert_eq!(normalize("Ben & Jerry's"), "ben jerrys");
    }

    #[test]
    fn test_only_punctuation_is_empty() {
        assert_eq!(normalize("?!..."), "");
        assert_eq!(normalize("   "), "");
    }
}
