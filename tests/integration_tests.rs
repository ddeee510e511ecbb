//! Integration tests for the OmniScore compiler
//!
//! Tests the full pipeline from OmniScore source to a compiled timeline.

use omniscore::{compile, compile_with_options, CompileOptions, EventKind, OmniError, StaffStyle};

#[test]
fn test_compile_full_score() {
    let source = r#"
omniscore {
    meta { title: "Full", composer: "Test", tempo: 60, key: "F", time: "3/4" }

    group "Band" {
        def gtr "Guitar" style=tab
        def dr "Drums" style=grid map=gm_kit
    }
    def pno "Piano"

    macro Beat(v) = { k:4.vol($v) sn sn }

    measure 1-2 {
        pno: [f4 a4 c5]:2. 
        gtr: 1-1:4 3-1 5-1
        dr: $Beat(100)
    }
}
"#;
    let result = compile_with_options(source, &CompileOptions::default());
    assert!(result.is_ok(), "Should compile a full score");
    let compilation = result.unwrap();
    assert!(compilation.is_clean(), "{:?}", compilation.diagnostics);

    let score = compilation.score;
    assert_eq!(score.meta.title, "Full");
    assert_eq!(score.meta.time_signature.as_pair(), [3, 4]);
    assert_eq!(score.instruments.len(), 3);
    assert_eq!(score.groups[0].members, vec!["gtr", "dr"]);
    // 2 measures x (1 chord + 3 tab notes + 3 drum hits)
    assert_eq!(score.timeline.len(), 14);
    assert_eq!(score.duration_ticks, 2 * 5760);
    assert!(score
        .timeline
        .windows(2)
        .all(|w| w[0].tick_start <= w[1].tick_start));
}

#[test]
fn test_tick_to_seconds() {
    let score = compile("meta { tempo: 60 }\ndef pno\nmeasure 1 { pno: c4:1 }").unwrap();
    assert_eq!(score.duration_ticks, 7680);
    assert!((score.tick_to_seconds(score.duration_ticks) - 4.0).abs() < 1e-9);
}

#[test]
fn test_measure_window_queries() {
    let score = compile(
        "def pno\ndef bass\n\
         measure 1-4 { pno { rh: c5:4 d e f | lh: c3:1 } bass: c2:1 }",
    )
    .unwrap();

    let window = score.measure_window(2, 3);
    assert_eq!(window, 7680..23040);
    assert_eq!(score.events_in_window("pno", None, window.clone()).count(), 10);
    assert_eq!(score.events_in_window("pno", Some("lh"), window.clone()).count(), 2);
    assert_eq!(score.events_in_window("bass", None, window).count(), 2);
}

#[test]
fn test_instrument_styles_survive() {
    let score = compile("def g style=tab\ndef d style=grid\ndef p").unwrap();
    assert_eq!(score.instrument("g").unwrap().style, StaffStyle::Tab);
    assert_eq!(score.instrument("d").unwrap().style, StaffStyle::Grid);
    assert_eq!(score.instrument("p").unwrap().style, StaffStyle::Standard);
}

#[test]
fn test_lenient_on_malformed_input() {
    let fragments = [
        "",
        "{",
        "}}}",
        "measure",
        "measure 1",
        "measure 1 {",
        "def",
        "def pno style=",
        "macro",
        "macro M(",
        "meta { tempo: }",
        "def pno\nmeasure 1 { pno: [c4 e4",
        "def pno\nmeasure 1 { pno: c4: }",
        "def pno\nmeasure 1 { pno: c4:8.vol( }",
        "def pno\nmeasure 1 { pno { : | : | } }",
        "def pno\nmeasure 1-x { pno: c4 }",
        "\"unterminated",
        "$ $$ $Foo(",
        "def pno\nmeasure 1 { pno: c4.... d:99999 e:-1 }",
    ];

    for fragment in fragments {
        let result = compile(fragment);
        assert!(result.is_ok(), "Fragment {:?} should compile leniently", fragment);
    }
}

#[test]
fn test_strict_mode_reports_location() {
    let options = CompileOptions {
        strict: true,
        ..CompileOptions::default()
    };
    let result = compile_with_options("def pno\n\nmeasure 1 {\n  pno: c4 zz\n}", &options);

    match result {
        Err(OmniError::ParseError { line, column, message }) => {
            assert_eq!(line, 4);
            assert_eq!(column, 11);
            assert!(message.contains("zz"));
        }
        other => panic!("Expected ParseError, got {:?}", other.map(|c| c.diagnostics)),
    }
}

#[test]
fn test_strict_mode_accepts_clean_input() {
    let options = CompileOptions {
        strict: true,
        ..CompileOptions::default()
    };
    let result = compile_with_options("def pno\nmeasure 1 { pno: c4 }", &options);
    assert!(result.is_ok());
}

#[test]
fn test_compile_is_deterministic() {
    let source = "def pno\ndef dr style=grid\nmeasure 1-8 { pno: c4:8 e g c5 | dr: k sn k sn }";
    let first = compile(source).unwrap();
    let second = compile(source).unwrap();
    assert_eq!(first.timeline, second.timeline);
}

#[test]
fn test_every_demo_score_compiles_cleanly() {
    let scores = omniscore_scores::get_all_scores();
    assert!(!scores.is_empty());

    for score in scores {
        let result = compile_with_options(&score.content, &CompileOptions::default());
        assert!(result.is_ok(), "Demo '{}' failed to compile", score.name);
        let compilation = result.unwrap();
        assert!(
            compilation.is_clean(),
            "Demo '{}' produced diagnostics: {:?}",
            score.name,
            compilation.diagnostics
        );
        assert!(!compilation.score.timeline.is_empty(), "Demo '{}' is empty", score.name);
    }
}

#[test]
fn test_demo_drums() {
    let score = omniscore_scores::get_score("band/drums").unwrap();
    let compiled = compile(&score.content).unwrap();
    let kicks = compiled
        .timeline
        .iter()
        .filter(|e| e.pitches.first().map(|p| p.midi) == Some(36.0))
        .count();
    assert!(kicks > 0);
    assert!(compiled.timeline.iter().all(|e| e.kind != EventKind::Chord));
}

#[test]
fn test_score_serializes_camel_case() {
    let score = compile("meta { title: \"S\" }\ndef pno\nmeasure 1 { pno: c4:8.stacc }").unwrap();
    let json = serde_json::to_value(&score).unwrap();
    assert_eq!(json["durationTicks"], 960);
    assert_eq!(json["meta"]["timeSignature"]["numerator"], 4);
    let event = &json["timeline"][0];
    assert_eq!(event["tickStart"], 0);
    assert_eq!(event["instrumentId"], "pno");
    assert_eq!(event["voiceId"], "v1");
    assert_eq!(event["kind"], "note");
    assert_eq!(event["modifiers"][0]["kind"], "staccato");
}
