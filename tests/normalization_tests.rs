/// Normalization tests against directory rows with drifting headers
/// Rows mirror what different copies of the provider table return
use provider_locator::facets::{build_clinical_combos, build_facets};
use provider_locator::models::SearchCriteria;
use provider_locator::normalizer::normalize_rows;
use provider_locator::search::filter_providers;
use serde_json::{json, Value};

fn drifting_rows() -> Vec<Value> {
    vec![
        json!({
            "id": "recA",
            "fields": {
                "Nombre de proveedor": "Dra. Ana López",
                "Dirección Completa": "Durango 296, Roma Norte",
                "Lat": 19.4194,
                "Lng": -99.1617,
                "Campañas": ["mutus", "Liverpool"],
                "Tipo de proveedor": "Médico",
                "Profesión": "Médico Cirujano",
                "Especialidad": "Oftalmología",
                "Sub. Especialidad": "Retina",
            }
        }),
        json!({
            "id": "recB",
            "fields": {
                "Nombre": "Clínica Ñuñoa",
                "Direccion": "Insurgentes Sur 1000",
                "Latitud": "19.37",
                "Longitud": "-99.17",
                "Campaña": "Met Life",
                "Tipo proveedor": "Clínica",
                "Profesion": "Médico Cirujano",
                "Especialidades": "Cardiología",
                "Subespecialidad": "",
            }
        }),
        json!({
            "id": "recC",
            "fields": {
                "Nombre completo": "Laboratorio Centro",
                "Lat": "",
                "Lng": null,
                "CAMPAÑAS": "Mutuus, MUTUS",
                "Tipo": "Laboratorio",
            }
        }),
        json!({ "fields": { "Nombre": "row without id" } }),
    ]
}

#[test]
fn test_every_header_variant_resolves() {
    let (providers, skipped) = normalize_rows(drifting_rows());
    assert_eq!(skipped, 1);
    assert_eq!(providers.len(), 3);

    let b = &providers[1];
    assert_eq!(b.name, "Clínica Ñuñoa");
    assert_eq!(b.address, "Insurgentes Sur 1000");
    assert_eq!(b.lat, 19.37);
    assert_eq!(b.lng, -99.17);
    assert_eq!(b.campaign_tags, vec!["MetLife"]);
    assert_eq!(b.provider_type, "Clínica");
    assert_eq!(b.profession, "Médico Cirujano");
    assert_eq!(b.specialty, "Cardiología");
    assert_eq!(b.sub_specialty, "");

    let c = &providers[2];
    assert_eq!(c.campaign_tags, vec!["Mutuus"]);
    assert!(c.coordinates().is_none());
}

#[test]
fn test_facets_over_normalized_directory() {
    let (providers, _) = normalize_rows(drifting_rows());
    let facets = build_facets(&providers);

    assert_eq!(facets.types, vec!["Clínica", "Laboratorio", "Médico"]);
    assert_eq!(facets.professions, vec!["Médico Cirujano"]);
    assert_eq!(facets.specialties, vec!["Cardiología", "Oftalmología"]);
    assert_eq!(facets.sub_specialties, vec!["Retina"]);
    assert_eq!(facets.campaigns, vec!["Liverpool", "MetLife", "Mutuus"]);

    // Every facet value selects at least one provider
    for specialty in &facets.specialties {
        let criteria = SearchCriteria {
            specialty: Some(specialty.clone()),
            ..SearchCriteria::default()
        };
        assert!(!filter_providers(&providers, &criteria).is_empty());
    }
}

#[test]
fn test_clinical_combos_by_campaign() {
    let (providers, _) = normalize_rows(drifting_rows());

    let all = build_clinical_combos(&providers, None);
    let labels: Vec<&str> = all.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Médico Cirujano | Cardiología",
            "Médico Cirujano | Oftalmología | Retina",
        ]
    );

    let metlife = build_clinical_combos(&providers, Some("met life"));
    assert_eq!(metlife.len(), 1);
    assert_eq!(metlife[0].specialty, "Cardiología");

    assert!(build_clinical_combos(&providers, Some("Desconocida")).is_empty());
}
