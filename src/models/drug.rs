use serde::{Deserialize, Deserializer, Serialize};

/// Provenance tag stamped on every record mined from openFDA.
pub const DEFAULT_SOURCE: &str = "FDA USA";

/// One entry of the reference drug database.
///
/// Built once while the database loads and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRecord {
    /// Normalized key: the lower-cased brand name.
    #[serde(default)]
    pub id: String,
    pub brand_name: String,
    pub generic_name: String,
    #[serde(default = "default_pharm_class", deserialize_with = "nullable_string_or_first")]
    pub pharm_class: String,
    #[serde(default)]
    pub dosage_form: Option<String>,
    /// openFDA ships `route` as a list; older dumps store a single string.
    #[serde(default, deserialize_with = "route_string_or_list")]
    pub route: Option<String>,
    #[serde(default, deserialize_with = "labelled_items")]
    pub active_ingredients: Vec<String>,
    #[serde(default, deserialize_with = "labelled_items")]
    pub packaging: Vec<String>,
    #[serde(default = "default_source")]
    pub source: String,
}

impl DrugRecord {
    /// Create a record with the mandatory naming fields; everything else defaults.
    pub fn new(brand_name: &str, generic_name: &str, pharm_class: &str) -> Self {
        Self {
            id: normalize_id(brand_name),
            brand_name: brand_name.to_string(),
            generic_name: generic_name.to_string(),
            pharm_class: pharm_class.to_string(),
            dosage_form: None,
            route: None,
            active_ingredients: Vec::new(),
            packaging: Vec::new(),
            source: default_source(),
        }
    }

    pub fn with_dosage_form(mut self, dosage_form: &str) -> Self {
        self.dosage_form = Some(dosage_form.to_string());
        self
    }

    pub fn with_route(mut self, route: &str) -> Self {
        self.route = Some(route.to_string());
        self
    }
}

/// Derive the normalized record key from a brand name.
pub fn normalize_id(brand_name: &str) -> String {
    brand_name.trim().to_lowercase()
}

fn default_pharm_class() -> String {
    "Unclassified".to_string()
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn nullable_string_or_first<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<StringOrList> = Option::deserialize(deserializer)?;
    let value = match raw {
        Some(StringOrList::One(s)) => Some(s),
        Some(StringOrList::Many(list)) => list.into_iter().next(),
        None => None,
    };
    Ok(value
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_pharm_class))
}

fn route_string_or_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<StringOrList> = Option::deserialize(deserializer)?;
    let joined = match raw {
        Some(StringOrList::One(s)) => s,
        Some(StringOrList::Many(list)) => list.join(", "),
        None => return Ok(None),
    };
    Ok(Some(joined).filter(|s| !s.trim().is_empty()))
}

/// Ingredient and packaging entries are either plain strings or openFDA objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelledItem {
    Text(String),
    Ingredient { name: String, strength: Option<String> },
    Package { description: String },
    Other(serde_json::Value),
}

impl LabelledItem {
    fn into_label(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Ingredient { name, strength: Some(strength) } => Some(format!("{name} {strength}")),
            Self::Ingredient { name, strength: None } => Some(name),
            Self::Package { description } => Some(description),
            Self::Other(_) => None,
        }
    }
}

fn labelled_items<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<LabelledItem>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(LabelledItem::into_label)
        .collect())
}

/// One unit of raw label text produced by the vision collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
}

impl TextFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for TextFragment {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
