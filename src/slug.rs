use chrono::Utc;
use uuid::Uuid;

/// Lowercase, keep `[a-z0-9]`, join words with single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }
    slug
}

/// Use the given slug when present, otherwise derive one from the name.
pub fn slug_or_name(slug: Option<&str>, name: &str) -> String {
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => slugify(s),
        None => slugify(name),
    }
}

/// Make a colliding slug distinct: `<slug>-<unix-millis>-<5 chars>`.
pub fn with_unique_suffix(slug: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    format!("{slug}-{millis}-{}", &random[..5])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_url_safe(slug: &str) -> bool {
        !slug.is_empty()
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn slugify_names() {
        assert_eq!(slugify("Nasi Kotak"), "nasi-kotak");
        assert_eq!(slugify("  Paket   Keluarga! "), "paket-keluarga");
        assert_eq!(slugify("Jakarta Selatan - Kebayoran"), "jakarta-selatan-kebayoran");
        assert_eq!(slugify("Menu #1"), "menu-1");
    }

    #[test]
    fn explicit_slug_wins_over_name() {
        assert_eq!(slug_or_name(Some("Box A"), "Catering Box"), "box-a");
        assert_eq!(slug_or_name(Some("   "), "Catering Box"), "catering-box");
        assert_eq!(slug_or_name(None, "Catering Box"), "catering-box");
    }

    #[test]
    fn unique_suffix_keeps_prefix_and_stays_url_safe() {
        let slug = with_unique_suffix("nasi-kotak");
        assert!(slug.starts_with("nasi-kotak-"));
        assert_ne!(slug, "nasi-kotak");
        assert!(is_url_safe(&slug));
    }
}
