use polyser::{
    to_xml_string, Error, MapSerializable, MapSerializer, PropertyNameSerializable, Result,
    Serializer, Value, XmlOptions, XmlSerializer, XML_SCHEMA_INSTANCE_NAMESPACE,
};

#[derive(Debug)]
struct Account {
    name: String,
    nickname: Option<String>,
    motto: String,
    tags: Vec<String>,
}

impl MapSerializable for Account {
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
        serializer.write_property_string("name", &self.name, false)?;
        polyser::write_nullable_string_property(serializer, "nickname", self.nickname.as_deref())?;
        serializer.write_property_string("motto", &self.motto, false)?;
        let tags: Vec<Value> = self.tags.iter().map(|tag| Value::String(tag)).collect();
        serializer.write_property_list("tags", &tags, false)
    }
}

fn account() -> Account {
    Account {
        name: "Ada".to_string(),
        nickname: None,
        motto: "".to_string(),
        tags: vec!["pioneer".to_string()],
    }
}

#[test]
fn declaration_carries_the_uppercased_encoding() {
    let options = XmlOptions::new("account").with_encoding("utf-8");
    let xml = to_xml_string(options, &account()).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
}

#[test]
fn document_shape_without_nil_support() {
    let options = XmlOptions::new("account").with_declaration(false);
    let xml = to_xml_string(options, &account()).unwrap();
    // Null and empty-string properties both collapse to an empty tag when
    // the schema-instance namespace is not registered.
    assert_eq!(
        xml,
        "<account><name>Ada</name><nickname/><motto/><tags><element>pioneer</element></tags></account>"
    );
}

#[test]
fn nil_markers_appear_once_the_namespace_is_registered() {
    let options = XmlOptions::new("account")
        .with_declaration(false)
        .with_namespace(XML_SCHEMA_INSTANCE_NAMESPACE, "xsi");
    let xml = to_xml_string(options, &account()).unwrap();
    assert!(xml.starts_with(
        "<account xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">"
    ));
    // Only the null property carries the marker; the empty string stays a
    // plain empty tag.
    assert!(xml.contains("<nickname xsi:nil=\"true\"/>"));
    assert!(xml.contains("<motto/>"));
}

#[test]
fn root_attributes_follow_the_namespaces() {
    let options = XmlOptions::new("report")
        .with_declaration(false)
        .with_namespace(XML_SCHEMA_INSTANCE_NAMESPACE, "xsi")
        .with_root_attribute("version", "3");
    #[derive(Debug)]
    struct Empty;
    impl MapSerializable for Empty {
        fn serialise_map(&self, _serializer: &mut dyn MapSerializer) -> Result<()> {
            Ok(())
        }
    }
    let xml = to_xml_string(options, &Empty).unwrap();
    assert_eq!(
        xml,
        "<report xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" version=\"3\"></report>"
    );
}

#[test]
fn text_is_entity_escaped() {
    #[derive(Debug)]
    struct Tricky;
    impl MapSerializable for Tricky {
        fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
            serializer.write_property_string("x", "a<b & c>'d\"", false)
        }
    }
    let options = XmlOptions::new("r").with_declaration(false);
    let xml = to_xml_string(options, &Tricky).unwrap();
    assert_eq!(xml, "<r><x>a&lt;b &amp; c&gt;&apos;d&quot;</x></r>");
}

#[test]
fn map_entries_render_under_the_key_attribute() {
    #[derive(Debug)]
    struct Dictionary;
    impl MapSerializable for Dictionary {
        fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
            let name_owned = String::from("name");
            let name_key: &dyn PropertyNameSerializable = &name_owned;
            let entries: Vec<(&dyn PropertyNameSerializable, Value)> =
                vec![(name_key, Value::String("Ada"))];
            serializer.write_property("dict", &Value::Entries(&entries), false)
        }
    }
    let options = XmlOptions::new("r").with_declaration(false);
    let xml = to_xml_string(options, &Dictionary).unwrap();
    assert_eq!(
        xml,
        "<r><dict><map-entry key=\"name\">Ada</map-entry></dict></r>"
    );
}

#[test]
fn null_array_items_self_close() {
    #[derive(Debug)]
    struct Sparse;
    impl MapSerializable for Sparse {
        fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
            let values = [Value::String("a"), Value::Null, Value::Int(3)];
            serializer.write_property_list("items", &values, false)
        }
    }
    let options = XmlOptions::new("r").with_declaration(false);
    let xml = to_xml_string(options, &Sparse).unwrap();
    assert_eq!(
        xml,
        "<r><items><element>a</element><element/><element>3</element></items></r>"
    );
}

#[test]
fn disallowed_code_points_fail_the_write() {
    #[derive(Debug)]
    struct Bad;
    impl MapSerializable for Bad {
        fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
            serializer.write_property_string("x", "bad\u{FFFF}", false)
        }
    }
    let options = XmlOptions::new("r").with_declaration(false);
    let err = to_xml_string(options, &Bad).unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
}

#[test]
fn finish_closes_the_root_even_after_a_body_error() {
    let options = XmlOptions::new("r").with_declaration(false);
    let mut serializer = XmlSerializer::new(Vec::new(), options).unwrap();
    serializer.start().unwrap();
    let body = serializer.write_property_string("x", "bad\u{FFFF}", false);
    assert!(body.is_err());
    serializer.finish().unwrap();
    let xml = String::from_utf8(serializer.into_inner()).unwrap();
    assert!(xml.ends_with("</r>"));
}

#[test]
fn control_codes_render_as_numeric_references() {
    #[derive(Debug)]
    struct Controls;
    impl MapSerializable for Controls {
        fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
            serializer.write_property_string("x", "a\tb\u{7F}", false)
        }
    }
    let options = XmlOptions::new("r").with_declaration(false);
    let xml = to_xml_string(options, &Controls).unwrap();
    assert_eq!(xml, "<r><x>a&#0009;b&#0127;</x></r>");
}
