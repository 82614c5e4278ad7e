//! End-to-end rule set scenarios: script in, result table out

mod common;

use common::{TestCharacter, TestResolver};
use morphrules::core::types::{RaceId, ResultTable, Sex};
use morphrules::engine::ScriptFile;
use morphrules::{CollisionPolicy, RuleSet};

fn evaluate(rs: &RuleSet) -> ResultTable {
    let mut out = ResultTable::default();
    rs.evaluate(&mut out);
    out
}

#[test]
fn test_worn_keyword_drives_morph() {
    let resolver = TestResolver::new().keyword("ArmorHeavy");
    let script = ScriptFile::parse(
        r#"{
            "Aliases": {
                "heavy": { "EditorID": "ArmorHeavy", "Type": "wornKeyword" }
            },
            "Rules": {
                "Adders": { "ShoulderWidth": "heavy * 2" }
            }
        }"#,
    )
    .unwrap();

    let mut rs = RuleSet::new();
    assert!(rs.load_script(&script, true, CollisionPolicy::Append, &resolver));

    let mut character = TestCharacter::new(RaceId(0), Sex::Male);

    // Not worn: adder evaluates to zero and is suppressed entirely
    rs.snapshot(&character);
    assert!(evaluate(&rs).is_empty());

    character.worn_apparel.insert(0);
    rs.snapshot(&character);
    let results = evaluate(&rs);
    assert_eq!(results["ShoulderWidth"].value, 2.0);
    assert!(!results["ShoulderWidth"].is_setter);
}

#[test]
fn test_visibility_layer_switching() {
    let resolver = TestResolver::new().keyword("HelmetVisor");
    let script = ScriptFile::parse(
        r#"{
            "Aliases": {
                "visor": { "EditorID": "HelmetVisor", "Type": "visibleWornKeyword" }
            },
            "Rules": {
                "Setters": { "NeckSeam": "visor" }
            }
        }"#,
    )
    .unwrap();

    let mut rs = RuleSet::new();
    rs.load_script(&script, true, CollisionPolicy::Append, &resolver);

    // Visor equipped on the suit layer only
    let mut character = TestCharacter::new(RaceId(0), Sex::Female);
    character.worn_suit.insert(0);

    character.suited = true;
    rs.snapshot(&character);
    assert_eq!(evaluate(&rs)["NeckSeam"].value, 1.0);

    // Suit hidden: the visible layer is apparel, where nothing is worn
    character.suited = false;
    rs.snapshot(&character);
    assert_eq!(evaluate(&rs)["NeckSeam"].value, 0.0);
}

#[test]
fn test_body_part_selection() {
    let resolver = TestResolver::new().body_part("HornsCurved");
    let script = ScriptFile::parse(
        r#"{
            "Aliases": {
                "horns": { "EditorID": "HornsCurved", "Type": "headpart" }
            },
            "Rules": {
                "Adders": { "BrowRidge": "horns * 0.6" }
            }
        }"#,
    )
    .unwrap();

    let mut rs = RuleSet::new();
    assert!(rs.load_script(&script, true, CollisionPolicy::Append, &resolver));

    let mut character = TestCharacter::new(RaceId(0), Sex::Male);
    character.body_parts.insert(0);
    rs.snapshot(&character);
    assert_eq!(evaluate(&rs)["BrowRidge"].value, 0.6);

    character.body_parts.clear();
    rs.snapshot(&character);
    assert!(evaluate(&rs).is_empty());
}

#[test]
fn test_untyped_alias_never_binds_body_part() {
    // Same editor id exists only as a body part; an untyped alias falls
    // through to a rule-output binding instead
    let resolver = TestResolver::new().body_part("HornsCurved");
    let script = ScriptFile::parse(
        r#"{
            "Aliases": {
                "horns": { "EditorID": "HornsCurved" }
            },
            "Rules": {
                "Adders": { "BrowRidge": "horns" }
            }
        }"#,
    )
    .unwrap();

    let mut rs = RuleSet::new();
    assert!(rs.load_script(&script, true, CollisionPolicy::Append, &resolver));

    let mut character = TestCharacter::new(RaceId(0), Sex::Male);
    character.body_parts.insert(0);
    // Reads the morph named HornsCurved, which is absent, not the body part
    rs.snapshot(&character);
    assert!(evaluate(&rs).is_empty());

    character.morphs.insert("HornsCurved".to_string(), 0.3);
    rs.snapshot(&character);
    assert_eq!(evaluate(&rs)["BrowRidge"].value, 0.3);
}

#[test]
fn test_attribute_and_conditional() {
    let resolver = TestResolver::new().attribute("AVStrength");
    let script = ScriptFile::parse(
        r#"{
            "Aliases": {
                "str": { "EditorID": "AVStrength", "Type": "actorValue" }
            },
            "Rules": {
                "Setters": { "MuscleTone": "if str > 50 then 1 else str / 50" }
            }
        }"#,
    )
    .unwrap();

    let mut rs = RuleSet::new();
    rs.load_script(&script, true, CollisionPolicy::Append, &resolver);

    let mut character = TestCharacter::new(RaceId(0), Sex::Male);
    character.attributes.insert(0, 25.0);
    rs.snapshot(&character);
    assert_eq!(evaluate(&rs)["MuscleTone"].value, 0.5);

    character.attributes.insert(0, 80.0);
    rs.snapshot(&character);
    assert_eq!(evaluate(&rs)["MuscleTone"].value, 1.0);
}

#[test]
fn test_setter_beats_adders_across_scripts() {
    let resolver = TestResolver::new().keyword("K");
    let base = ScriptFile::parse(
        r#"{
            "Aliases": { "k": { "EditorID": "K", "Type": "wornKeyword" } },
            "Rules": { "Adders": { "Bulk": "k + 1" } }
        }"#,
    )
    .unwrap();
    let overlay = ScriptFile::parse(
        r#"{
            "Rules": { "Setters": { "Bulk": "0" } }
        }"#,
    )
    .unwrap();

    let mut rs = RuleSet::new();
    rs.load_script(&base, true, CollisionPolicy::Append, &resolver);
    rs.load_script(&overlay, false, CollisionPolicy::Append, &resolver);

    let character = TestCharacter::new(RaceId(0), Sex::Male);
    rs.snapshot(&character);

    // Setter zero is an explicit result, unlike adder zero
    let results = evaluate(&rs);
    assert!(results["Bulk"].is_setter);
    assert_eq!(results["Bulk"].value, 0.0);
}
