//! Person name splitting.

/// Given and family name of a person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedName {
    pub first_name: String,
    pub last_name: String,
}

/// Split a display name into first and last name.
///
/// The first whitespace-separated token of the trimmed name is the first
/// name. The last name is everything after the separator that follows it,
/// with its internal spacing kept.
pub fn parse_full_name(full_name: &str) -> ParsedName {
    let trimmed = full_name.trim();
    let (first_name, last_name) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));

    ParsedName {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> (String, String) {
        let parsed = parse_full_name(name);
        (parsed.first_name, parsed.last_name)
    }

    #[test]
    fn test_two_tokens() {
        assert_eq!(parse("Bong Joon-ho"), ("Bong".into(), "Joon-ho".into()));
    }

    #[test]
    fn test_single_token() {
        assert_eq!(parse("Zendaya"), ("Zendaya".into(), "".into()));
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse(""), ("".into(), "".into()));
        assert_eq!(parse("   "), ("".into(), "".into()));
    }

    #[test]
    fn test_remainder_kept_together() {
        assert_eq!(
            parse("  Guillermo del  Toro "),
            ("Guillermo".into(), "del  Toro".into())
        );
        assert_eq!(
            parse("Guillermo del  Toro"),
            ("Guillermo".into(), "del  Toro".into())
        );
    }

    #[test]
    fn test_only_first_separator_consumed() {
        assert_eq!(parse("Ana  de Armas"), ("Ana".into(), " de Armas".into()));
    }
}
