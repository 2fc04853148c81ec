//! Nationality derived from a TMDB birthplace.

/// Nationality label for a country name.
fn country_to_nationality(country: &str) -> Option<&'static str> {
    let label = match country {
        "USA" | "United States" => "Estadounidense",
        "UK" | "United Kingdom" => "Británico",
        "France" => "Francés",
        "Germany" => "Alemán",
        "Italy" => "Italiano",
        "Spain" => "Español",
        "Canada" => "Canadiense",
        "Australia" => "Australiano",
        "Japan" => "Japonés",
        "South Korea" => "Surcoreano",
        "Mexico" => "Mexicano",
        "Brazil" => "Brasileño",
        "Argentina" => "Argentino",
        _ => return None,
    };
    Some(label)
}

/// Resolve the nationality for a birthplace such as `"Berlin, Germany"`.
///
/// The country is the part after the last comma. Countries missing from the
/// table are returned as-is.
pub fn resolve_nationality(birth_place: Option<&str>) -> Option<String> {
    let birth_place = birth_place?.trim();
    if birth_place.is_empty() {
        return None;
    }

    let country = birth_place.rsplit(',').next().unwrap_or(birth_place).trim();
    if country.is_empty() {
        return None;
    }

    Some(
        country_to_nationality(country)
            .map(str::to_string)
            .unwrap_or_else(|| country.to_string()),
    )
}
