//! Field descriptors: the typed form of one schema field entry.
//!
//! Schema documents are loosely shaped (a field may be a bare type name, an
//! attribute map, or `null`), so descriptors are built from `serde_json::Value`
//! with best-effort coercion. Parsing never fails: anything that cannot be
//! understood becomes [`FieldDescriptor::Unknown`], which generates `null`.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Ordered mapping of field name to descriptor
pub type FieldMap = IndexMap<String, FieldDescriptor>;

pub const DEFAULT_STRING_LENGTH: usize = 5;
pub const DEFAULT_CWORD_LENGTH: usize = 3;
pub const DEFAULT_NUMBER_MIN: i64 = -9999;
pub const DEFAULT_NUMBER_MAX: i64 = 9999;
pub const DEFAULT_FLOAT_MIN: f64 = 0.0;
pub const DEFAULT_FLOAT_MAX: f64 = 100.0;
pub const DEFAULT_FLOAT_DMIN: u32 = 0;
pub const DEFAULT_FLOAT_DMAX: u32 = 2;
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-MM-dd";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    Zh,
    En,
}

impl Locale {
    fn parse(value: Option<&str>) -> Option<Self> {
        match value?.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "zh_cn" | "cn" => Some(Locale::Zh),
            "en" | "en-us" | "en_us" => Some(Locale::En),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Plain,
    Email,
}

/// How an `array` field produces its elements
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayShape {
    /// `fields` present: `length` records built from the nested mapping
    Records { fields: FieldMap, length: usize },
    /// `item` present: `long` independent values of one nested descriptor
    Items { item: Box<FieldDescriptor>, long: usize },
    /// Neither present
    Empty,
}

/// One field kind with only the attributes it uses
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDescriptor {
    String {
        length: Option<usize>,
        format: StringFormat,
        locale: Option<Locale>,
    },
    Number {
        min: i64,
        max: i64,
    },
    Float {
        min: f64,
        max: f64,
        dmin: u32,
        dmax: u32,
    },
    Boolean,
    Date {
        format: String,
    },
    Url,
    Color,
    Image,
    Identifier,
    Name {
        locale: Option<Locale>,
    },
    Title {
        locale: Option<Locale>,
    },
    Sentence {
        locale: Option<Locale>,
    },
    Paragraph {
        locale: Option<Locale>,
    },
    Phone,
    IdCard,
    Ip(IpVersion),
    MacAddress,
    /// Uniform pick from a fixed candidate set, overriding any declared type
    Enum(Vec<Value>),
    Object(FieldMap),
    Array(ArrayShape),
    /// Unrecognized or missing type tag; generates `null`
    Unknown(String),
}

impl FieldDescriptor {
    /// Build a descriptor from one entry of a `fields` mapping.
    ///
    /// A `null` entry takes its type tag from the field name.
    pub fn from_entry(name: &str, value: &Value) -> Self {
        match value {
            Value::Null => Self::from_tag(name, &serde_json::Map::new()),
            other => Self::from_value(other),
        }
    }

    /// Build a descriptor from a shorthand type name or an attribute map
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(tag) => Self::from_tag(tag, &serde_json::Map::new()),
            Value::Object(attrs) => {
                if let Some(choices) = enum_choices(attrs.get("enum")) {
                    return FieldDescriptor::Enum(choices);
                }
                let tag = attrs.get("type").and_then(Value::as_str).unwrap_or_default();
                Self::from_tag(tag, attrs)
            }
            _ => FieldDescriptor::Unknown(String::new()),
        }
    }

    fn from_tag(tag: &str, attrs: &serde_json::Map<String, Value>) -> Self {
        let locale = Locale::parse(attrs.get("locale").and_then(Value::as_str));

        match tag {
            "string" | "str" => FieldDescriptor::String {
                length: attr_usize(attrs, "length"),
                format: match attrs.get("format").and_then(Value::as_str) {
                    Some("email") => StringFormat::Email,
                    _ => StringFormat::Plain,
                },
                locale,
            },
            "number" | "integer" | "int" => {
                let min = attr_f64(attrs, "min").map(|v| v as i64);
                let max = attr_f64(attrs, "max").map(|v| v as i64);
                FieldDescriptor::Number {
                    min: min.unwrap_or(DEFAULT_NUMBER_MIN),
                    max: max.unwrap_or(DEFAULT_NUMBER_MAX),
                }
            }
            "float" | "double" => FieldDescriptor::Float {
                min: attr_f64(attrs, "min").unwrap_or(DEFAULT_FLOAT_MIN),
                max: attr_f64(attrs, "max").unwrap_or(DEFAULT_FLOAT_MAX),
                dmin: attr_usize(attrs, "dmin").map_or(DEFAULT_FLOAT_DMIN, |v| v as u32),
                dmax: attr_usize(attrs, "dmax").map_or(DEFAULT_FLOAT_DMAX, |v| v as u32),
            },
            "boolean" | "bool" => FieldDescriptor::Boolean,
            "date" => FieldDescriptor::Date {
                format: attrs
                    .get("format")
                    .and_then(Value::as_str)
                    .filter(|f| !f.is_empty())
                    .unwrap_or(DEFAULT_DATE_FORMAT)
                    .to_string(),
            },
            "url" => FieldDescriptor::Url,
            "color" => FieldDescriptor::Color,
            "image" => FieldDescriptor::Image,
            "id" | "uuid" | "guid" => FieldDescriptor::Identifier,
            "name" => FieldDescriptor::Name { locale },
            "cname" => FieldDescriptor::Name {
                locale: Some(Locale::Zh),
            },
            "title" => FieldDescriptor::Title { locale },
            "sentence" => FieldDescriptor::Sentence { locale },
            "paragraph" => FieldDescriptor::Paragraph { locale },
            "phone" => FieldDescriptor::Phone,
            "idcard" | "id-card" | "idCard" | "id_card" => FieldDescriptor::IdCard,
            "ip" | "ipv4" => FieldDescriptor::Ip(IpVersion::V4),
            "ipv6" => FieldDescriptor::Ip(IpVersion::V6),
            "mac" | "mac-address" | "macAddress" => FieldDescriptor::MacAddress,
            "enum" => FieldDescriptor::Enum(Vec::new()),
            "object" => FieldDescriptor::Object(nested_fields(attrs.get("fields"))),
            "array" => FieldDescriptor::Array(array_shape(attrs)),
            other => FieldDescriptor::Unknown(other.to_string()),
        }
    }
}

/// Parse a `fields` mapping, keeping document order
pub fn parse_fields(value: &Value) -> FieldMap {
    match value {
        Value::Object(entries) => entries
            .iter()
            .map(|(name, entry)| (name.clone(), FieldDescriptor::from_entry(name, entry)))
            .collect(),
        _ => FieldMap::new(),
    }
}

/// Serde adapter for `fields` attributes on endpoint descriptors
pub fn deserialize_fields<'de, D>(deserializer: D) -> Result<FieldMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(parse_fields(&raw))
}

fn nested_fields(value: Option<&Value>) -> FieldMap {
    value.map(parse_fields).unwrap_or_default()
}

fn array_shape(attrs: &serde_json::Map<String, Value>) -> ArrayShape {
    if let Some(fields) = attrs.get("fields").filter(|v| !v.is_null()) {
        return ArrayShape::Records {
            fields: parse_fields(fields),
            length: attr_usize(attrs, "length").filter(|n| *n > 0).unwrap_or(1),
        };
    }
    if let Some(item) = attrs.get("item").filter(|v| !v.is_null()) {
        let long = item
            .as_object()
            .and_then(|obj| attr_usize(obj, "long"))
            .filter(|n| *n > 0)
            .unwrap_or(1);
        return ArrayShape::Items {
            item: Box::new(FieldDescriptor::from_value(item)),
            long,
        };
    }
    ArrayShape::Empty
}

fn enum_choices(value: Option<&Value>) -> Option<Vec<Value>> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Array(items) => Some(items.clone()),
        single => Some(vec![single.clone()]),
    }
}

/// Numeric attribute; strings are coerced, and `inf` / `NaN` count as absent
fn attr_f64(attrs: &serde_json::Map<String, Value>, key: &str) -> Option<f64> {
    let value = match attrs.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn attr_usize(attrs: &serde_json::Map<String, Value>, key: &str) -> Option<usize> {
    attr_f64(attrs, key)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shorthand_string_uses_defaults() {
        let field = FieldDescriptor::from_value(&json!("number"));
        assert_eq!(
            field,
            FieldDescriptor::Number {
                min: DEFAULT_NUMBER_MIN,
                max: DEFAULT_NUMBER_MAX
            }
        );
    }

    #[test]
    fn test_enum_overrides_declared_type() {
        let field = FieldDescriptor::from_value(&json!({
            "type": "number",
            "enum": ["a", "b"]
        }));
        assert_eq!(field, FieldDescriptor::Enum(vec![json!("a"), json!("b")]));
    }

    #[test]
    fn test_unknown_tag_is_not_an_error() {
        let field = FieldDescriptor::from_value(&json!({ "type": "hologram" }));
        assert_eq!(field, FieldDescriptor::Unknown("hologram".to_string()));

        let field = FieldDescriptor::from_value(&json!(42));
        assert!(matches!(field, FieldDescriptor::Unknown(_)));
    }

    #[test]
    fn test_null_entry_takes_type_from_field_name() {
        let fields = parse_fields(&json!({ "url": null, "email": null }));
        assert_eq!(fields["url"], FieldDescriptor::Url);
        assert_eq!(fields["email"], FieldDescriptor::Unknown("email".to_string()));
    }

    #[test]
    fn test_field_order_is_preserved() {
        let fields = parse_fields(&json!({
            "zeta": "string",
            "alpha": "number",
            "mid": "boolean"
        }));
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_array_shapes() {
        let records = FieldDescriptor::from_value(&json!({
            "type": "array",
            "length": 3,
            "fields": { "id": "uuid" }
        }));
        match records {
            FieldDescriptor::Array(ArrayShape::Records { fields, length }) => {
                assert_eq!(length, 3);
                assert_eq!(fields["id"], FieldDescriptor::Identifier);
            }
            other => panic!("unexpected descriptor: {:?}", other),
        }

        let items = FieldDescriptor::from_value(&json!({
            "type": "array",
            "item": { "type": "boolean", "long": 4 }
        }));
        assert_eq!(
            items,
            FieldDescriptor::Array(ArrayShape::Items {
                item: Box::new(FieldDescriptor::Boolean),
                long: 4
            })
        );

        let empty = FieldDescriptor::from_value(&json!({ "type": "array" }));
        assert_eq!(empty, FieldDescriptor::Array(ArrayShape::Empty));
    }

    #[test]
    fn test_numeric_attributes_coerce_from_strings() {
        let field = FieldDescriptor::from_value(&json!({
            "type": "number",
            "min": "1",
            "max": 10
        }));
        assert_eq!(field, FieldDescriptor::Number { min: 1, max: 10 });
    }

    #[test]
    fn test_non_finite_attributes_fall_back_to_defaults() {
        let field = FieldDescriptor::from_value(&json!({
            "type": "float",
            "min": "NaN",
            "max": "inf"
        }));
        assert_eq!(
            field,
            FieldDescriptor::Float {
                min: DEFAULT_FLOAT_MIN,
                max: DEFAULT_FLOAT_MAX,
                dmin: DEFAULT_FLOAT_DMIN,
                dmax: DEFAULT_FLOAT_DMAX
            }
        );

        let field = FieldDescriptor::from_value(&json!({ "type": "number", "max": "-infinity" }));
        assert_eq!(
            field,
            FieldDescriptor::Number {
                min: DEFAULT_NUMBER_MIN,
                max: DEFAULT_NUMBER_MAX
            }
        );
    }

    #[test]
    fn test_locale_variants() {
        assert_eq!(
            FieldDescriptor::from_value(&json!("cname")),
            FieldDescriptor::Name {
                locale: Some(Locale::Zh)
            }
        );
        assert_eq!(
            FieldDescriptor::from_value(&json!({ "type": "title", "locale": "en" })),
            FieldDescriptor::Title {
                locale: Some(Locale::En)
            }
        );
    }
}
