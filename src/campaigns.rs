//! Campaign label canonicalization.

/// Lowercased alias -> canonical label.
const CAMPAIGN_ALIASES: &[(&str, &str)] = &[
    ("liverpool", "Liverpool"),
    ("metlife", "MetLife"),
    ("met life", "MetLife"),
    ("mutuus", "Mutuus"),
    ("mutus", "Mutuus"),
];

/// Maps a noisy campaign spelling to its canonical label.
///
/// Unknown labels pass through (trimmed) so that new campaigns are never
/// silently dropped. Idempotent.
pub fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let key = trimmed.to_lowercase();
    CAMPAIGN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Canonicalizes every label, drops empties and deduplicates, keeping the
/// first occurrence order.
pub fn canonicalize_all<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for label in raw {
        let canonical = canonicalize(label.as_ref());
        if !canonical.is_empty() && !out.contains(&canonical) {
            out.push(canonical);
        }
    }
    out
}

/// Parses a comma-separated campaign list (query strings, env vars).
pub fn parse_campaign_list(raw: &str) -> Vec<String> {
    canonicalize_all(raw.split(','))
}

/// Case-insensitive label equality with full Unicode case folding.
pub fn same_campaign(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// True when the provider tags intersect the requested campaigns. An empty
/// request imposes no constraint.
pub fn matches_any(tags: &[String], requested: &[String]) -> bool {
    requested.is_empty()
        || requested
            .iter()
            .any(|wanted| tags.iter().any(|tag| same_campaign(tag, wanted)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_aliases() {
        assert_eq!(canonicalize("mutus"), "Mutuus");
        assert_eq!(canonicalize("Mutuus"), "Mutuus");
        assert_eq!(canonicalize("MUTUUS"), "Mutuus");
        assert_eq!(canonicalize(" metlife "), "MetLife");
        assert_eq!(canonicalize("LIVERPOOL"), "Liverpool");
    }

    #[test]
    fn test_unknown_labels_pass_through() {
        assert_eq!(canonicalize("Seguros Atlas"), "Seguros Atlas");
        assert_eq!(canonicalize("  Nueva Campaña "), "Nueva Campaña");
    }

    #[test]
    fn test_canonicalize_all_dedupes() {
        let tags = canonicalize_all(["mutus", "Mutuus", "", "metlife", "MUTUUS"]);
        assert_eq!(tags, vec!["Mutuus", "MetLife"]);
    }

    #[test]
    fn test_parse_campaign_list() {
        assert_eq!(parse_campaign_list("liverpool, mutus,,"), vec!["Liverpool", "Mutuus"]);
        assert!(parse_campaign_list("").is_empty());
    }

    #[test]
    fn test_matches_any() {
        let tags = vec!["Liverpool".to_string(), "Mutuus".to_string()];
        assert!(matches_any(&tags, &[]));
        assert!(matches_any(&tags, &["MetLife".to_string(), "Mutuus".to_string()]));
        assert!(matches_any(&tags, &["liverpool".to_string()]));
        assert!(!matches_any(&tags, &["MetLife".to_string()]));
        assert!(!matches_any(&[], &["MetLife".to_string()]));
    }

    #[test]
    fn test_matches_any_folds_non_ascii_case() {
        let tags = canonicalize_all(["Campaña X"]);
        assert!(matches_any(&tags, &parse_campaign_list("CAMPAÑA X")));
        assert!(matches_any(&tags, &parse_campaign_list("campaña x")));
        assert!(!matches_any(&tags, &parse_campaign_list("Campana X")));
    }
}
