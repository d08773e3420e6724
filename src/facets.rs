//! Facet index and clinical combinations for filter controls.

use crate::campaigns::{canonicalize, same_campaign};
use crate::field_resolver::fold_diacritic;
use crate::models::{ClinicalCombo, Facets, Provider};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Primary collation weight of a character under Spanish rules: accents are
/// ignored, case is ignored, and `ñ` sorts between `n` and `o`.
fn primary_weight(c: char) -> u32 {
    let lower = c.to_lowercase().next().unwrap_or(c);
    if lower == 'ñ' {
        return 1000 + ('n' as u32 - 'a' as u32) * 2 + 1;
    }
    let base = fold_diacritic(lower);
    match base {
        'a'..='z' => 1000 + (base as u32 - 'a' as u32) * 2,
        '0'..='9' => 500 + (base as u32 - '0' as u32),
        // whitespace and punctuation sort before digits and letters
        _ if (base as u32) < 500 => base as u32,
        _ => 10_000 + base as u32,
    }
}

/// Compares two strings the way a Spanish locale-aware sort would:
/// base letters first, then accents (unaccented first), then case
/// (lowercase first). Falls back to code point order so the result is a
/// total order.
pub fn spanish_cmp(a: &str, b: &str) -> Ordering {
    let primary = |s: &str| s.chars().map(primary_weight).collect::<Vec<_>>();
    let accents = |s: &str| {
        s.chars()
            .map(|c| {
                let lower = c.to_lowercase().next().unwrap_or(c);
                u8::from(lower != 'ñ' && fold_diacritic(lower) != lower)
            })
            .collect::<Vec<_>>()
    };
    let case = |s: &str| s.chars().map(|c| u8::from(c.is_uppercase())).collect::<Vec<_>>();

    primary(a)
        .cmp(&primary(b))
        .then_with(|| accents(a).cmp(&accents(b)))
        .then_with(|| case(a).cmp(&case(b)))
        .then_with(|| a.cmp(b))
}

fn sorted(values: HashSet<String>) -> Vec<String> {
    let mut out: Vec<String> = values.into_iter().collect();
    out.sort_by(|a, b| spanish_cmp(a, b));
    out
}

fn insert_non_empty(set: &mut HashSet<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        set.insert(value.to_string());
    }
}

/// Builds the distinct sorted value set of every filterable dimension.
///
/// Values are the same strings the search filters compare against, so any
/// facet value selected in a control matches at least one provider.
pub fn build_facets(providers: &[Provider]) -> Facets {
    let mut types = HashSet::new();
    let mut professions = HashSet::new();
    let mut specialties = HashSet::new();
    let mut sub_specialties = HashSet::new();
    let mut campaigns = HashSet::new();

    for p in providers {
        insert_non_empty(&mut types, &p.provider_type);
        insert_non_empty(&mut professions, &p.profession);
        insert_non_empty(&mut specialties, &p.specialty);
        insert_non_empty(&mut sub_specialties, &p.sub_specialty);
        for tag in &p.campaign_tags {
            insert_non_empty(&mut campaigns, tag);
        }
    }

    Facets {
        types: sorted(types),
        professions: sorted(professions),
        specialties: sorted(specialties),
        sub_specialties: sorted(sub_specialties),
        campaigns: sorted(campaigns),
    }
}

/// Distinct profession/specialty/sub-specialty triples, optionally limited
/// to providers carrying `campaign`.
pub fn build_clinical_combos(providers: &[Provider], campaign: Option<&str>) -> Vec<ClinicalCombo> {
    let wanted = campaign
        .map(canonicalize)
        .filter(|c| !c.is_empty());

    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut combos = Vec::new();

    for p in providers {
        if let Some(ref wanted) = wanted {
            if !p.campaign_tags.iter().any(|t| same_campaign(t, wanted)) {
                continue;
            }
        }

        let key = (
            p.profession.trim().to_string(),
            p.specialty.trim().to_string(),
            p.sub_specialty.trim().to_string(),
        );
        let label = [&key.0, &key.1, &key.2]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" | ");
        if label.is_empty() || !seen.insert(key.clone()) {
            continue;
        }

        combos.push(ClinicalCombo {
            profession: key.0,
            specialty: key.1,
            sub_specialty: key.2,
            label,
        });
    }

    combos.sort_by(|a, b| spanish_cmp(&a.label, &b.label));
    combos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(kind: &str, profession: &str, specialty: &str, tags: &[&str]) -> Provider {
        Provider {
            id: format!("rec-{}-{}", profession, specialty),
            name: String::new(),
            address: String::new(),
            municipality: String::new(),
            state: String::new(),
            lat: f64::NAN,
            lng: f64::NAN,
            provider_type: kind.to_string(),
            profession: profession.to_string(),
            specialty: specialty.to_string(),
            sub_specialty: String::new(),
            campaign_tags: tags.iter().map(|t| t.to_string()).collect(),
            phone: String::new(),
            email: String::new(),
        }
    }

    #[test]
    fn test_spanish_collation() {
        let mut values = vec!["Zoología", "Óptica", "Odontología", "Ñandú", "Nutrición", "ortopedia"];
        values.sort_by(|a, b| spanish_cmp(a, b));
        assert_eq!(
            values,
            vec!["Nutrición", "Ñandú", "Odontología", "Óptica", "ortopedia", "Zoología"]
        );
    }

    #[test]
    fn test_accent_and_case_tiebreak() {
        assert_eq!(spanish_cmp("medico", "médico"), Ordering::Less);
        assert_eq!(spanish_cmp("médico", "Médico"), Ordering::Less);
        assert_eq!(spanish_cmp("Médico", "Médico"), Ordering::Equal);
    }

    #[test]
    fn test_build_facets_empty() {
        assert_eq!(build_facets(&[]), Facets::default());
    }

    #[test]
    fn test_build_facets_distinct_sorted() {
        let providers = vec![
            provider("Médico", "Psicología", "", &["Mutuus", "MetLife"]),
            provider("Clínica", "Odontología", "Endodoncia", &["Mutuus"]),
            provider("Médico", "  ", "Endodoncia", &[]),
        ];
        let facets = build_facets(&providers);

        assert_eq!(facets.types, vec!["Clínica", "Médico"]);
        assert_eq!(facets.professions, vec!["Odontología", "Psicología"]);
        assert_eq!(facets.specialties, vec!["Endodoncia"]);
        assert!(facets.sub_specialties.is_empty());
        assert_eq!(facets.campaigns, vec!["MetLife", "Mutuus"]);
    }

    #[test]
    fn test_clinical_combos_filtered_by_campaign() {
        let providers = vec![
            provider("", "Odontología", "Endodoncia", &["Mutuus"]),
            provider("", "Odontología", "Endodoncia", &["Mutuus"]),
            provider("", "Psicología", "", &["MetLife"]),
            provider("", "", "", &["Mutuus"]),
        ];

        let all = build_clinical_combos(&providers, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].label, "Odontología | Endodoncia");
        assert_eq!(all[1].label, "Psicología");

        let mutuus = build_clinical_combos(&providers, Some("mutus"));
        assert_eq!(mutuus.len(), 1);
        assert_eq!(mutuus[0].specialty, "Endodoncia");
    }

    #[test]
    fn test_clinical_combos_campaign_match_folds_accented_case() {
        let providers = vec![
            provider("", "Psicología", "", &["Campaña X"]),
            provider("", "Odontología", "", &["Liverpool"]),
        ];

        let combos = build_clinical_combos(&providers, Some("CAMPAÑA X"));
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].profession, "Psicología");
    }
}
