//! Schema-drift tolerant field access for raw directory records.
//!
//! Header names in the record store drift between tables and over time
//! ("Teléfono principal " vs "Telefono principal", "Sub. Especialidad" vs
//! "Sub Especialidad"). Every logical field has a fixed, ordered list of
//! known header aliases; a header matches an alias when both normalize to
//! the same key.

use serde_json::{Map, Value};

/// Logical fields the normalizer extracts from a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    Name,
    Address,
    Municipality,
    State,
    Lat,
    Lng,
    Campaigns,
    ProviderType,
    Profession,
    Specialty,
    SubSpecialty,
    Phone,
    Email,
}

impl LogicalField {
    pub const ALL: [LogicalField; 13] = [
        LogicalField::Name,
        LogicalField::Address,
        LogicalField::Municipality,
        LogicalField::State,
        LogicalField::Lat,
        LogicalField::Lng,
        LogicalField::Campaigns,
        LogicalField::ProviderType,
        LogicalField::Profession,
        LogicalField::Specialty,
        LogicalField::SubSpecialty,
        LogicalField::Phone,
        LogicalField::Email,
    ];

    /// Known real-world header variants, most preferred first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            LogicalField::Name => &[
                "Nombre de proveedor",
                "Nombre",
                "Nombre completo",
                "Proveedor",
                "Médico",
            ],
            LogicalField::Address => &[
                "Dirección Completa",
                "Dirección de consultorio (Manual)",
                "Dirección",
            ],
            LogicalField::Municipality => &[
                "Ciudad o municipio",
                "Municipio",
                "Delegación",
                "Alcaldía",
            ],
            LogicalField::State => &["Estado", "Entidad"],
            LogicalField::Lat => &["Lat", "Latitud"],
            LogicalField::Lng => &["Lng", "Longitud", "Lon", "Long"],
            LogicalField::Campaigns => &["Campañas", "Campaña Asignada", "Campaña"],
            LogicalField::ProviderType => &["Tipo de proveedor", "Tipo proveedor", "Tipo"],
            LogicalField::Profession => &["Profesión"],
            LogicalField::Specialty => &["Especialidad", "Especialidades"],
            LogicalField::SubSpecialty => &[
                "Sub. Especialidad",
                "Subespecialidad",
                "Sub-especialidad",
            ],
            LogicalField::Phone => &["Teléfono principal", "Teléfono", "Celular"],
            LogicalField::Email => &["Correo electrónico", "Correo", "Email"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogicalField::Name => "name",
            LogicalField::Address => "address",
            LogicalField::Municipality => "municipality",
            LogicalField::State => "state",
            LogicalField::Lat => "lat",
            LogicalField::Lng => "lng",
            LogicalField::Campaigns => "campaignTags",
            LogicalField::ProviderType => "providerType",
            LogicalField::Profession => "profession",
            LogicalField::Specialty => "specialty",
            LogicalField::SubSpecialty => "subSpecialty",
            LogicalField::Phone => "phone",
            LogicalField::Email => "email",
        }
    }

    /// The logical field a raw header name resolves to, if any.
    pub fn for_header(header: &str) -> Option<LogicalField> {
        let key = normalize_key(header);
        LogicalField::ALL
            .into_iter()
            .find(|field| field.aliases().iter().any(|alias| normalize_key(alias) == key))
    }
}

/// Maps an accented Latin letter to its base letter.
///
/// Covers the Latin-1 range only. Letters outside it such as `ő` or `č`
/// are returned unchanged, so `normalize_key` drops them as non-alphanumeric.
pub(crate) fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        other => other,
    }
}

/// Normalizes a header name for comparison: strips diacritics and
/// punctuation, collapses whitespace and lowercases.
///
/// Only ASCII word characters and whitespace survive, so `"Sub. Especialidad"`
/// becomes `"sub especialidad"` and `"Teléfono principal "` becomes
/// `"telefono principal"`.
pub fn normalize_key(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .map(fold_diacritic)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns the value of the first candidate that matches a header of the
/// record, trying candidates in order. Null values count as absent.
pub fn resolve<'a>(fields: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    let normalized: Vec<(String, &Value)> = fields
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (normalize_key(key), value))
        .collect();

    candidates.iter().find_map(|candidate| {
        let wanted = normalize_key(candidate);
        normalized
            .iter()
            .find(|(key, _)| *key == wanted)
            .map(|(_, value)| *value)
    })
}

/// Resolves a logical field through its alias table.
pub fn resolve_field(fields: &Map<String, Value>, field: LogicalField) -> Option<&Value> {
    resolve(fields, field.aliases())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Linked records and attachments come back as objects; prefer a
        // display name when one exists.
        Value::Object(obj) => obj
            .get("name")
            .or_else(|| obj.get("text"))
            .and_then(scalar_text),
        Value::Array(_) => None,
    }
}

/// Display text for a value; lists are flattened with `", "`.
pub fn as_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => scalar_text(other).unwrap_or_default(),
        None => String::new(),
    }
}

/// Multi-valued text. Lists stay lists; a scalar string is split on commas.
pub fn as_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(other) => scalar_text(other).into_iter().filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    }
}

/// Strict numeric coercion. Anything that is not a number or a string that
/// parses completely as one (including empty strings) becomes NaN.
pub fn as_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        // Lookup columns wrap a single value in a list
        Some(Value::Array(items)) if items.len() == 1 => as_number(items.first()),
        _ => f64::NAN,
    }
}
