use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use serde_json::{Map, Value};

/// Reserved key carrying the content hash of the file a document was loaded from.
pub const FILE_SHA_FIELD: &str = "_fileSha";

const BUNDLED_DOCUMENT: &str = include_str!("../data/default_navigation.json");

const CATEGORIES: &str = "categories";
const SITES: &str = "sites";

/// The complete navigation data set.
///
/// Every object in the document is held as the ordered JSON map it was read
/// from, and the typed accessors are views over that map. Writing a document
/// back therefore reproduces the keys it was loaded with, in the same order,
/// and adds nothing that was not set explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationDocument {
    pub categories: Vec<Category>,
    fields: Map<String, Value>,
    holds_categories: bool,
    file_sha: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub sites: Vec<Site>,
    fields: Map<String, Value>,
    holds_sites: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Site {
    fields: Map<String, Value>,
}

impl NavigationDocument {
    pub fn new(title: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(CATEGORIES.to_string(), Value::Null);
        fields.insert("title".to_string(), Value::String(title.into()));

        Self {
            categories: Vec::new(),
            fields,
            holds_categories: true,
            file_sha: None,
        }
    }

    /// The sample data set shipped with the crate.
    ///
    /// Callers that choose to keep rendering when the remote copy cannot be
    /// loaded use this as their fallback.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        serde_json::from_str(BUNDLED_DOCUMENT)
    }

    pub fn title(&self) -> &str {
        text(&self.fields, "title")
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields.insert("title".to_string(), Value::String(title.into()));
    }

    pub fn default_search_engine(&self) -> Option<&str> {
        self.fields.get("defaultSearchEngine").and_then(Value::as_str)
    }

    pub fn set_default_search_engine(&mut self, engine: impl Into<String>) {
        self.fields
            .insert("defaultSearchEngine".to_string(), Value::String(engine.into()));
    }

    /// Any top-level key other than `categories`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        if key == CATEGORIES {
            return None;
        }
        self.fields.get(key)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn file_sha(&self) -> Option<&str> {
        self.file_sha.as_deref()
    }

    pub fn set_file_sha(&mut self, sha: impl Into<String>) {
        self.file_sha = Some(sha.into());
    }

    /// Categories by ascending `order`; ties keep their position in the file.
    pub fn sorted_categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.categories.iter().collect();
        categories.sort_by(|a, b| {
            let (a, b) = (a.order().unwrap_or(0.0), b.order().unwrap_or(0.0));
            a.total_cmp(&b)
        });
        categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id() == id)
    }

    pub fn category_mut(&mut self, id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id() == id)
    }

    pub fn site_count(&self) -> usize {
        self.categories.iter().map(|c| c.sites.len()).sum()
    }

    /// A copy without the reserved hash field, suitable for writing to disk.
    pub fn without_file_sha(&self) -> Self {
        Self {
            file_sha: None,
            ..self.clone()
        }
    }
}

impl Serialize for NavigationDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut fields = with_objects(&self.fields, CATEGORIES, &self.categories, self.holds_categories)
            .map_err(ser::Error::custom)?;
        if let Some(sha) = &self.file_sha {
            fields.insert(FILE_SHA_FIELD.to_string(), Value::String(sha.clone()));
        }
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NavigationDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::deserialize(deserializer)?;
        let file_sha = match fields.shift_remove(FILE_SHA_FIELD) {
            Some(Value::String(sha)) => Some(sha),
            _ => None,
        };
        let categories = take_objects(&mut fields, CATEGORIES).map_err(de::Error::custom)?;

        Ok(Self {
            holds_categories: categories.is_some(),
            categories: categories.unwrap_or_default(),
            fields,
            file_sha,
        })
    }
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: i64) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(id.into()));
        fields.insert("name".to_string(), Value::String(name.into()));
        fields.insert("icon".to_string(), Value::String(String::new()));
        fields.insert("order".to_string(), Value::from(order));
        fields.insert(SITES.to_string(), Value::Null);

        Self {
            sites: Vec::new(),
            fields,
            holds_sites: true,
        }
    }

    pub fn id(&self) -> &str {
        text(&self.fields, "id")
    }

    pub fn name(&self) -> &str {
        text(&self.fields, "name")
    }

    pub fn icon(&self) -> &str {
        text(&self.fields, "icon")
    }

    /// Sort key. Numbers and numeric strings both count; anything else has no order.
    pub fn order(&self) -> Option<f64> {
        match self.fields.get("order")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.fields.insert("name".to_string(), Value::String(name.into()));
    }

    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.fields.insert("icon".to_string(), Value::String(icon.into()));
    }

    pub fn set_order(&mut self, order: i64) {
        self.fields.insert("order".to_string(), Value::from(order));
    }

    /// Any key other than `sites`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        if key == SITES {
            return None;
        }
        self.fields.get(key)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn site(&self, id: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.id() == id)
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        with_objects(&self.fields, SITES, &self.sites, self.holds_sites)
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::deserialize(deserializer)?;
        let sites = take_objects(&mut fields, SITES).map_err(de::Error::custom)?;

        Ok(Self {
            holds_sites: sites.is_some(),
            sites: sites.unwrap_or_default(),
            fields,
        })
    }
}

impl Site {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(id.into()));
        fields.insert("name".to_string(), Value::String(name.into()));
        fields.insert("url".to_string(), Value::String(url.into()));
        fields.insert("description".to_string(), Value::String(String::new()));
        fields.insert("icon".to_string(), Value::String(String::new()));
        Self { fields }
    }

    pub fn id(&self) -> &str {
        text(&self.fields, "id")
    }

    pub fn name(&self) -> &str {
        text(&self.fields, "name")
    }

    pub fn url(&self) -> &str {
        text(&self.fields, "url")
    }

    pub fn description(&self) -> &str {
        text(&self.fields, "description")
    }

    /// Either an absolute icon URL or a local asset reference.
    pub fn icon(&self) -> &str {
        text(&self.fields, "icon")
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.fields
            .insert("description".to_string(), Value::String(description.into()));
    }

    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.fields.insert("icon".to_string(), Value::String(icon.into()));
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Whether the icon points at a remote resource rather than a bundled asset.
    pub fn has_remote_icon(&self) -> bool {
        self.icon().starts_with("http")
    }
}

/// String value of `key`, or `""` when it is absent or not a string.
fn text<'a>(fields: &'a Map<String, Value>, key: &str) -> &'a str {
    fields.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Move an array of objects out of `fields`, leaving a null behind so the key
/// keeps its position. Anything else under `key` stays where it is.
fn take_objects<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<T>>, serde_json::Error> {
    let Some(Value::Array(items)) = fields.get(key) else {
        return Ok(None);
    };
    if !items.iter().all(Value::is_object) {
        return Ok(None);
    }

    let Some(Value::Array(items)) = fields.insert(key.to_string(), Value::Null) else {
        return Ok(None);
    };
    items.into_iter().map(serde_json::from_value).collect::<Result<_, _>>().map(Some)
}

/// `fields` with the held list written back into its slot. A list that was
/// never present is only added once it has entries.
fn with_objects<T: Serialize>(
    fields: &Map<String, Value>,
    key: &str,
    items: &[T],
    held: bool,
) -> Result<Map<String, Value>, serde_json::Error> {
    let mut fields = fields.clone();
    if held || !items.is_empty() {
        fields.insert(key.to_string(), serde_json::to_value(items)?);
    }
    Ok(fields)
}
