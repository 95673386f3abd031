use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use polyser::{
    to_json_string, to_jsonp_string, MapSerializable, MapSerializer, PropertyNameSerializable,
    Result, Value, ValueSerializable, ValueSerializer,
};
use uuid::Uuid;

#[derive(Debug)]
struct Address {
    city: String,
    postcode: Option<String>,
}

impl MapSerializable for Address {
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
        serializer.write_property_string("city", &self.city, false)?;
        polyser::write_nullable_string_property(serializer, "postcode", self.postcode.as_deref())
    }
}

#[derive(Debug)]
struct Reference(&'static str);

impl ValueSerializable for Reference {
    fn serialise_value(&self, serializer: &mut dyn ValueSerializer) -> Result<()> {
        serializer.write_value_string(self.0)
    }
}

#[derive(Debug)]
struct Account {
    id: i64,
    name: String,
    active: bool,
    address: Address,
    tags: Vec<String>,
}

impl MapSerializable for Account {
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
        serializer.write_property_i64("id", self.id, false)?;
        serializer.write_property_string("name", &self.name, false)?;
        serializer.write_property_bool("active", self.active, false)?;
        serializer.write_property_map("address", &self.address, false)?;
        let tags: Vec<Value> = self.tags.iter().map(|tag| Value::String(tag)).collect();
        serializer.write_property_list("tags", &tags, false)
    }
}

fn account() -> Account {
    Account {
        id: 42,
        name: "Ada".to_string(),
        active: true,
        address: Address {
            city: "London".to_string(),
            postcode: None,
        },
        tags: vec!["pioneer".to_string(), "analyst".to_string()],
    }
}

#[test]
fn nested_graph_renders_as_one_object() {
    let json = to_json_string(&account()).unwrap();
    assert_eq!(
        json,
        r#"{"id":42,"name":"Ada","active":"true","address":{"city":"London","postcode":null},"tags":["pioneer","analyst"]}"#
    );
}

#[test]
fn output_parses_as_json() {
    let json = to_json_string(&account()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["name"], "Ada");
    assert_eq!(parsed["id"], 42);
    // Booleans render through the shared token convention: quoted text.
    assert_eq!(parsed["active"], "true");
    assert!(parsed["address"]["postcode"].is_null());
}

#[derive(Debug)]
struct Mixed;

impl MapSerializable for Mixed {
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
        let big = BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap();
        serializer.write_property_big_int("big", &big, false)?;
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        serializer.write_property_uuid("id", id, false)?;
        let when: DateTime<Utc> = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        serializer.write_property_timestamp("when", when, false)?;
        serializer.write_property_scalar("ref", &Reference("r-1"), false)
    }
}

#[test]
fn rich_scalars_render_in_their_canonical_forms() {
    let json = to_json_string(&Mixed).unwrap();
    assert_eq!(
        json,
        r#"{"big":123456789012345678901234567890,"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","when":"2026-01-02T03:04:05+00:00","ref":"r-1"}"#
    );
}

#[derive(Debug)]
struct Catalogue {
    entries: Vec<Address>,
}

impl MapSerializable for Catalogue {
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
        let entries: Vec<&dyn MapSerializable> = self
            .entries
            .iter()
            .map(|entry| entry as &dyn MapSerializable)
            .collect();
        serializer.write_property_map_array("entries", &entries, false)
    }
}

#[test]
fn map_arrays_comma_join_their_elements() {
    let catalogue = Catalogue {
        entries: vec![
            Address {
                city: "London".to_string(),
                postcode: Some("N1".to_string()),
            },
            Address {
                city: "Paris".to_string(),
                postcode: None,
            },
        ],
    };
    let json = to_json_string(&catalogue).unwrap();
    assert_eq!(
        json,
        r#"{"entries":[{"city":"London","postcode":"N1"},{"city":"Paris","postcode":null}]}"#
    );

    let empty = Catalogue { entries: vec![] };
    assert_eq!(to_json_string(&empty).unwrap(), r#"{"entries":[]}"#);
}

#[derive(Debug)]
struct Dictionary;

impl MapSerializable for Dictionary {
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
        let count_key: &dyn PropertyNameSerializable = &7u64;
        let name_owned = String::from("name");
        let name_key: &dyn PropertyNameSerializable = &name_owned;
        let entries: Vec<(&dyn PropertyNameSerializable, Value)> = vec![
            (name_key, Value::String("Ada")),
            (count_key, Value::Int(2)),
        ];
        serializer.write_property("dict", &Value::Entries(&entries), false)
    }
}

#[test]
fn generic_maps_stringify_their_keys() {
    let json = to_json_string(&Dictionary).unwrap();
    assert_eq!(json, r#"{"dict":{"name":"Ada","7":2}}"#);
}

#[test]
fn escaping_applies_to_names_and_values() {
    #[derive(Debug)]
    struct Tricky;
    impl MapSerializable for Tricky {
        fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
            serializer.write_property_string("pa\"th", "a\\b\nc/d", false)
        }
    }
    let json = to_json_string(&Tricky).unwrap();
    assert_eq!(json, r#"{"pa\"th":"a\\b\nc\/d"}"#);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["pa\"th"], "a\\b\nc/d");
}

#[test]
fn jsonp_wraps_the_document_exactly() {
    let jsonp = to_jsonp_string("ns.handle", &account()).unwrap();
    assert!(jsonp.starts_with("ns.handle({"));
    assert!(jsonp.ends_with("});\n"));
    let inner = &jsonp["ns.handle(".len()..jsonp.len() - ");\n".len()];
    assert_eq!(inner, to_json_string(&account()).unwrap());
}

#[test]
fn jsonp_rejects_bad_prefixes_before_writing() {
    assert!(to_jsonp_string("", &account()).is_err());
    assert!(to_jsonp_string("function", &account()).is_err());
    assert!(to_jsonp_string("1abc", &account()).is_err());
}

#[test]
fn repeated_serialization_is_byte_identical() {
    let graph = account();
    let first = to_json_string(&graph).unwrap();
    let second = to_json_string(&graph).unwrap();
    assert_eq!(first, second);
}
