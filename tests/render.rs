#![cfg(feature = "parse")]

use protoschema::{
    EnumConstantElement, EnumElement, ExtendElement, ExtensionsElement, FieldElement, Label,
    MessageElement, OneofElement, OptionElement, OptionValue, ProtoFile, ReservedElement,
    ReservedValue, RpcElement, ServiceElement, Syntax,
};
use similar_asserts::assert_eq;

fn message(name: &str, qualified_name: &str) -> MessageElement {
    MessageElement::builder()
        .name(name)
        .qualified_name(qualified_name)
        .build()
        .unwrap()
}

fn service(name: &str, qualified_name: &str) -> ServiceElement {
    ServiceElement::builder()
        .name(name)
        .qualified_name(qualified_name)
        .build()
        .unwrap()
}

fn extend(name: &str, qualified_name: &str) -> ExtendElement {
    ExtendElement::builder()
        .name(name)
        .qualified_name(qualified_name)
        .build()
        .unwrap()
}

fn string_option(name: &str, value: &str) -> OptionElement {
    OptionElement::new(name, OptionValue::String(value.to_owned())).unwrap()
}

#[test]
fn empty_file() {
    let file = ProtoFile::builder("file.proto").build().unwrap();
    assert_eq!(file.render(), "// file.proto\n");
}

#[test]
fn package_only() {
    let file = ProtoFile::builder("file.proto")
        .package_name("example.simple")
        .build()
        .unwrap();
    assert_eq!(file.render(), "// file.proto\npackage example.simple;\n");
}

#[test]
fn single_message() {
    let file = ProtoFile::builder("file.proto")
        .add_type(message("Message", "Message"))
        .build()
        .unwrap();
    assert_eq!(file.render(), "// file.proto\n\nmessage Message {}\n");
}

#[test]
fn imports_render_plain_before_public() {
    let file = ProtoFile::builder("file.proto")
        .package_name("example.simple")
        .add_public_dependency("example.other")
        .add_dependency("example.thing")
        .add_type(message("Message", "example.simple.Message"))
        .build()
        .unwrap();

    assert_eq!(
        file.render(),
        "// file.proto\n\
         package example.simple;\n\
         \n\
         import \"example.thing\";\n\
         import public \"example.other\";\n\
         \n\
         message Message {}\n"
    );
}

#[test]
fn sections_render_in_fixed_order() {
    let file = ProtoFile::builder("file.proto")
        .package_name("example.simple")
        .add_dependency("example.thing")
        .add_public_dependency("example.other")
        .add_type(message("Message1", "example.simple.Message1"))
        .add_type(message("Message2", "example.simple.Message2"))
        .add_service(service("Service1", "example.simple.Service1"))
        .add_service(service("Service2", "example.simple.Service2"))
        .add_extend_declaration(extend("Extend1", "example.simple.Extend1"))
        .add_extend_declaration(extend("Extend2", "example.simple.Extend2"))
        .add_option(string_option("kit", "kat"))
        .add_option(string_option("foo", "bar"))
        .build()
        .unwrap();

    let expected = "\
// file.proto
package example.simple;

import \"example.thing\";
import public \"example.other\";

option kit = \"kat\";
option foo = \"bar\";

message Message1 {}
message Message2 {}

extend Extend1 {}
extend Extend2 {}

service Service1 {}
service Service2 {}
";
    assert_eq!(file.render(), expected);

    let parsed = protoschema::parse("file.proto", expected).unwrap();
    assert_eq!(parsed, file);
}

#[test]
fn nested_declarations() {
    let kind = EnumElement::builder()
        .name("Kind")
        .qualified_name("example.Outer.Kind")
        .documentation("The kind of thing.")
        .add_reserved(
            ReservedElement::builder()
                .add_value(ReservedValue::Tag(2))
                .add_value(ReservedValue::Range(5, 9))
                .build()
                .unwrap(),
        )
        .add_constant(
            EnumConstantElement::builder()
                .name("UNKNOWN")
                .tag(0)
                .build()
                .unwrap(),
        )
        .add_constant(
            EnumConstantElement::builder()
                .name("OTHER")
                .tag(-1)
                .add_option(OptionElement::new("deprecated", OptionValue::Bool(true)).unwrap())
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let outer = MessageElement::builder()
        .name("Outer")
        .qualified_name("example.Outer")
        .documentation("An outer message.\n\nWith two paragraphs.")
        .add_option(
            OptionElement::builder()
                .name("my.option")
                .parenthesized(true)
                .value(OptionValue::Aggregate(vec![
                    OptionElement::new("a", OptionValue::Number("-0x1F".to_owned())).unwrap(),
                    OptionElement::new(
                        "b",
                        OptionValue::List(vec![
                            OptionValue::Enum("FOO".to_owned()),
                            OptionValue::String("bar".to_owned()),
                        ]),
                    )
                    .unwrap(),
                ]))
                .build()
                .unwrap(),
        )
        .add_field(
            FieldElement::builder()
                .label(Label::Repeated)
                .type_name("Kind")
                .name("kinds")
                .tag(1)
                .documentation("All kinds.")
                .build()
                .unwrap(),
        )
        .add_field(
            FieldElement::builder()
                .type_name("map<string, int64>")
                .name("counts")
                .tag(2)
                .build()
                .unwrap(),
        )
        .add_oneof(
            OneofElement::builder()
                .name("choice")
                .add_field(
                    FieldElement::builder()
                        .type_name("string")
                        .name("text")
                        .tag(3)
                        .add_option(
                            OptionElement::new(
                                "default",
                                OptionValue::String("a \"quoted\" value".to_owned()),
                            )
                            .unwrap(),
                        )
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap(),
        )
        .add_extensions(
            ExtensionsElement::builder()
                .start(100)
                .end(protoschema::MAX_TAG_VALUE)
                .build()
                .unwrap(),
        )
        .add_type(kind)
        .build()
        .unwrap();

    let file = ProtoFile::builder("nested.proto")
        .syntax(Syntax::Proto3)
        .package_name("example")
        .add_type(outer)
        .add_service(
            ServiceElement::builder()
                .name("Things")
                .qualified_name("example.Things")
                .add_rpc(
                    RpcElement::builder()
                        .name("Watch")
                        .request_type("Outer")
                        .response_type(".example.Outer")
                        .response_streaming(true)
                        .add_option(
                            OptionElement::new(
                                "idempotency_level",
                                OptionValue::Enum("NO_SIDE_EFFECTS".to_owned()),
                            )
                            .unwrap(),
                        )
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let rendered = file.render();
    insta::assert_snapshot!(rendered, @r###"
    // nested.proto
    syntax = "proto3";
    package example;

    // An outer message.
    //
    // With two paragraphs.
    message Outer {
      option (my.option) = { a: -0x1F, b: [FOO, "bar"] };

      // All kinds.
      repeated Kind kinds = 1;
      map<string, int64> counts = 2;

      oneof choice {
        string text = 3 [default = "a \"quoted\" value"];
      }

      extensions 100 to max;

      // The kind of thing.
      enum Kind {
        reserved 2, 5 to 9;

        UNKNOWN = 0;
        OTHER = -1 [deprecated = true];
      }
    }

    service Things {
      rpc Watch (Outer) returns (stream .example.Outer) {
        option idempotency_level = NO_SIDE_EFFECTS;
      }
    }
    "###);

    assert_eq!(protoschema::parse("nested.proto", &rendered).unwrap(), file);
}

#[test]
fn label_is_kept_absent_in_proto3() {
    let source = "syntax = \"proto3\";\n\nmessage Foo {\n  int32 bar = 1;\n}\n";
    let file = protoschema::parse("foo.proto", source).unwrap();

    assert_eq!(file.render(), format!("// foo.proto\n{}", source));
}

#[test]
fn unset_qualified_names_roundtrip() {
    let inner = MessageElement::builder().name("Inner").build().unwrap();
    let outer = MessageElement::builder()
        .name("Outer")
        .add_type(inner)
        .add_extend_declaration(extend_unqualified("Other"))
        .build()
        .unwrap();
    let file = ProtoFile::builder("file.proto")
        .syntax(Syntax::Proto3)
        .package_name("example.simple")
        .add_type(MessageElement::builder().name("Message1").build().unwrap())
        .add_type(outer)
        .add_service(ServiceElement::builder().name("Service").build().unwrap())
        .add_extend_declaration(extend_unqualified("Message1"))
        .build()
        .unwrap();

    assert_eq!(file.types()[0].qualified_name(), "example.simple.Message1");
    assert_eq!(
        file.types()[1].nested_types()[0].qualified_name(),
        "example.simple.Outer.Inner"
    );
    assert_eq!(file.services()[0].qualified_name(), "example.simple.Service");
    assert_eq!(
        file.extend_declarations()[0].qualified_name(),
        "example.simple.Message1"
    );

    let parsed = protoschema::parse("file.proto", &file.render()).unwrap();
    assert_eq!(parsed, file);

    let file = ProtoFile::builder("file.proto")
        .syntax(Syntax::Proto3)
        .add_type(
            MessageElement::builder()
                .name("Outer")
                .add_type(MessageElement::builder().name("Inner").build().unwrap())
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    assert_eq!(
        file.types()[0].nested_types()[0].qualified_name(),
        "Outer.Inner"
    );
    assert_eq!(
        protoschema::parse("file.proto", &file.render()).unwrap(),
        file
    );
}

fn extend_unqualified(name: &str) -> ExtendElement {
    ExtendElement::builder()
        .name(name)
        .add_field(
            FieldElement::builder()
                .label(Label::Repeated)
                .type_name("string")
                .name(format!("ext_{}", name.to_lowercase()))
                .tag(100)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

#[test]
fn aggregate_entry_names_roundtrip() {
    let value = OptionValue::Aggregate(vec![
        OptionElement::entry("[my.ext]", OptionValue::Bool(true)).unwrap(),
        OptionElement::entry(
            "[type.googleapis.com/my.Any]",
            OptionValue::Aggregate(vec![OptionElement::entry(
                "name",
                OptionValue::String("x".to_owned()),
            )
            .unwrap()]),
        )
        .unwrap(),
        OptionElement::entry(
            "items",
            OptionValue::List(vec![OptionValue::Aggregate(vec![])]),
        )
        .unwrap(),
    ]);
    let file = ProtoFile::builder("file.proto")
        .add_option(OptionElement::new("(my.ext)", value).unwrap())
        .build()
        .unwrap();

    let rendered = file.render();
    assert_eq!(
        rendered,
        "// file.proto\n\noption (my.ext) = { [my.ext]: true, [type.googleapis.com/my.Any]: { name: \"x\" }, items: [{}] };\n"
    );
    assert_eq!(protoschema::parse("file.proto", &rendered).unwrap(), file);

    let dotted = OptionElement::new("a.b", OptionValue::Number("1".to_owned())).unwrap();
    assert!(OptionElement::new("(my.ext)", OptionValue::Aggregate(vec![dotted])).is_err());

    let bracketed = OptionElement::entry("[foo.bar]", OptionValue::Bool(true)).unwrap();
    assert!(ProtoFile::builder("file.proto")
        .add_option(bracketed)
        .build()
        .is_err());
}

#[test]
fn keyword_type_names_roundtrip_with_labels() {
    let message = MessageElement::builder()
        .name("Message")
        .add_field(
            FieldElement::builder()
                .label(Label::Optional)
                .type_name("optional")
                .name("a")
                .tag(1)
                .build()
                .unwrap(),
        )
        .add_field(
            FieldElement::builder()
                .label(Label::Repeated)
                .type_name("message")
                .name("b")
                .tag(2)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let file = ProtoFile::builder("file.proto")
        .add_type(message)
        .build()
        .unwrap();

    assert_eq!(
        protoschema::parse("file.proto", &file.render()).unwrap(),
        file
    );

    assert!(FieldElement::builder()
        .type_name("optional")
        .name("foo")
        .tag(1)
        .build()
        .is_err());
}
