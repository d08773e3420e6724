use crate::campaigns::canonicalize_all;
use crate::field_resolver::{as_list, as_number, as_text, resolve_field, LogicalField};
use crate::models::{Provider, RawRecord};
use serde_json::Value;

/// Maps one raw directory record to a [`Provider`].
///
/// Total: a record with no recognizable fields still yields a provider with
/// empty strings, no campaign tags and NaN coordinates. Campaign tags are
/// canonicalized and deduplicated here.
pub fn normalize(record: &RawRecord) -> Provider {
    let f = &record.fields;
    let text = |field| as_text(resolve_field(f, field));

    Provider {
        id: record.id.clone(),
        name: text(LogicalField::Name),
        address: text(LogicalField::Address),
        municipality: text(LogicalField::Municipality),
        state: text(LogicalField::State),
        lat: as_number(resolve_field(f, LogicalField::Lat)),
        lng: as_number(resolve_field(f, LogicalField::Lng)),
        provider_type: text(LogicalField::ProviderType),
        profession: text(LogicalField::Profession),
        specialty: text(LogicalField::Specialty),
        sub_specialty: text(LogicalField::SubSpecialty),
        campaign_tags: canonicalize_all(as_list(resolve_field(f, LogicalField::Campaigns))),
        phone: text(LogicalField::Phone),
        email: text(LogicalField::Email),
    }
}

/// Parses a record store row into a [`RawRecord`]. Rows that are not
/// objects or have no id are rejected; the caller skips them.
pub fn parse_raw_record(row: Value) -> Option<RawRecord> {
    let Value::Object(mut obj) = row else {
        return None;
    };
    let id = match obj.remove("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id,
        _ => return None,
    };
    let fields = match obj.remove("fields") {
        Some(Value::Object(fields)) => fields,
        _ => serde_json::Map::new(),
    };
    Some(RawRecord { id, fields })
}

/// Normalizes a batch of raw rows, skipping malformed ones.
///
/// Returns the providers and the number of rows skipped.
pub fn normalize_rows(rows: Vec<Value>) -> (Vec<Provider>, usize) {
    let total = rows.len();
    let providers: Vec<Provider> = rows
        .into_iter()
        .filter_map(parse_raw_record)
        .map(|record| normalize(&record))
        .collect();
    let skipped = total - providers.len();
    if skipped > 0 {
        tracing::warn!("Skipped {} malformed directory record(s)", skipped);
    }
    (providers, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: Value) -> RawRecord {
        parse_raw_record(json!({ "id": "rec123", "fields": fields })).unwrap()
    }

    #[test]
    fn test_normalize_full_record() {
        let provider = normalize(&record(json!({
            "Nombre de proveedor": "Dra. Ana López",
            "Dirección Completa": "Durango 296, Roma Norte",
            "Ciudad o municipio": "Cuauhtémoc",
            "Estado": "CDMX",
            "Lat": 19.4194,
            "Lng": "-99.1617",
            "Campañas": ["mutus", "Liverpool", "MUTUUS"],
            "Tipo de proveedor": "Médico",
            "Profesión": "Médico Cirujano",
            "Especialidad": "Oftalmología",
            "Sub. Especialidad": "Retina",
            "Teléfono principal ": ["55 1234 5678", "55 8765 4321"],
            "Correo": "ana@example.com",
        })));

        assert_eq!(provider.id, "rec123");
        assert_eq!(provider.name, "Dra. Ana López");
        assert_eq!(provider.municipality, "Cuauhtémoc");
        assert_eq!(provider.lat, 19.4194);
        assert_eq!(provider.lng, -99.1617);
        assert_eq!(provider.campaign_tags, vec!["Mutuus", "Liverpool"]);
        assert_eq!(provider.sub_specialty, "Retina");
        assert_eq!(provider.phone, "55 1234 5678, 55 8765 4321");
        assert_eq!(provider.email, "ana@example.com");
    }

    #[test]
    fn test_normalize_empty_record_is_total() {
        let provider = normalize(&record(json!({})));

        assert_eq!(provider.name, "");
        assert_eq!(provider.address, "");
        assert_eq!(provider.provider_type, "");
        assert!(provider.campaign_tags.is_empty());
        assert!(provider.lat.is_nan());
        assert!(provider.lng.is_nan());
        assert!(provider.coordinates().is_none());
    }

    #[test]
    fn test_campaigns_as_comma_string() {
        let provider = normalize(&record(json!({ "Campaña Asignada": "metlife, Nueva" })));
        assert_eq!(provider.campaign_tags, vec!["MetLife", "Nueva"]);
    }

    #[test]
    fn test_parse_raw_record_rejects_malformed() {
        assert!(parse_raw_record(json!("not an object")).is_none());
        assert!(parse_raw_record(json!({ "fields": {} })).is_none());
        assert!(parse_raw_record(json!({ "id": 7, "fields": {} })).is_none());

        let record = parse_raw_record(json!({ "id": "rec1", "fields": "garbage" })).unwrap();
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_normalize_rows_counts_skipped() {
        let (providers, skipped) = normalize_rows(vec![
            json!({ "id": "rec1", "fields": { "Nombre": "A" } }),
            json!(null),
            json!({ "id": "rec2" }),
        ]);
        assert_eq!(providers.len(), 2);
        assert_eq!(skipped, 1);
    }
}
