//! Parser behaviour tests, including the grammar-level properties from the
//! language contract: repetition expansion, reserved names, user-variable
//! capacity, comment transparency, and canonical round-tripping.

use vgsc_util::ParseErrorKind;

use crate::ast::{Argument, Opcode, ProcId, VarId, FIXED_NAMES, FIXED_VARS};
use crate::{parse, Script};

fn opcodes(script: &Script) -> Vec<Opcode> {
    script.body.statements.iter().map(|s| s.opcode).collect()
}

#[test]
fn test_simple_program() {
    let script = parse("M 10 20 l 5 5 stroke").unwrap();
    assert_eq!(
        opcodes(&script),
        vec![Opcode::MoveTo, Opcode::RLineTo, Opcode::Stroke]
    );
    assert_eq!(
        script.body.statements[0].args,
        vec![Argument::Literal(10.0), Argument::Literal(20.0)]
    );
}

#[test]
fn test_aliases_parse_to_same_tree() {
    let short = parse("M 1 2 l 3 4 Z").unwrap();
    let long = parse("moveto 1 2 rlineto 3 4 closepath").unwrap();
    assert_eq!(short, long);
}

#[test]
fn test_empty_program() {
    let script = parse("").unwrap();
    assert!(script.body.statements.is_empty());
    let script = parse("  \n\t, // only a comment\n").unwrap();
    assert!(script.body.statements.is_empty());
}

// ---------------------------------------------------------------------------
// Repetition (MAY_REPEAT) and variadic tails
// ---------------------------------------------------------------------------

#[test]
fn test_repetition_expands_to_one_statement_per_group() {
    let script = parse("L 1 2 3 4 5 6").unwrap();
    assert_eq!(
        opcodes(&script),
        vec![Opcode::LineTo, Opcode::LineTo, Opcode::LineTo]
    );
    assert_eq!(
        script.body.statements[2].args,
        vec![Argument::Literal(5.0), Argument::Literal(6.0)]
    );
}

#[test]
fn test_repetition_continues_on_expressions() {
    let script = parse("L 1 2 (w) (h)").unwrap();
    assert_eq!(opcodes(&script), vec![Opcode::LineTo, Opcode::LineTo]);
}

#[test]
fn test_repetition_stops_at_words() {
    let script = parse("L 1 2 stroke").unwrap();
    assert_eq!(opcodes(&script), vec![Opcode::LineTo, Opcode::Stroke]);
}

#[test]
fn test_repetition_mid_group_shortfall_is_an_error() {
    let err = parse("L 1 2 3").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::UnexpectedEnd);
}

#[test]
fn test_push_repeats() {
    let script = parse("push 1 2 3 4").unwrap();
    assert_eq!(opcodes(&script), vec![Opcode::Push, Opcode::Push]);
}

#[test]
fn test_colorstop_repeats() {
    let script = parse("colorstop 0 red 1 blue").unwrap();
    assert_eq!(opcodes(&script), vec![Opcode::ColorStop, Opcode::ColorStop]);
    assert_eq!(
        script.body.statements[1].args,
        vec![Argument::Literal(1.0), Argument::Color([0, 0, 0xff, 0xff])]
    );
}

#[test]
fn test_print_variadic_tail() {
    let script = parse("print label (t) 2 stroke").unwrap();
    assert_eq!(opcodes(&script), vec![Opcode::Print, Opcode::Stroke]);
    let args = &script.body.statements[0].args;
    assert_eq!(args.len(), 3);
    assert_eq!(args[0], Argument::Key("label".to_string()));

    // An empty tail is fine.
    let script = parse("print heartbeat").unwrap();
    assert_eq!(script.body.statements[0].args.len(), 1);
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

#[test]
fn test_user_variable_allocation() {
    let script = parse("setvar a 1 setvar b 2 setvar a 3").unwrap();
    let slot = |s: &Script, i: usize| match s.body.statements[i].args[0] {
        Argument::Var(id) => id,
        ref other => panic!("expected Var, got {other:?}"),
    };
    assert_eq!(slot(&script, 0), VarId(FIXED_VARS as u32));
    assert_eq!(slot(&script, 1), VarId(FIXED_VARS as u32 + 1));
    // Re-use, not re-allocation.
    assert_eq!(slot(&script, 2), slot(&script, 0));
    assert_eq!(script.var_names[FIXED_VARS], "a");
}

#[test]
fn test_every_reserved_name_is_rejected() {
    for name in FIXED_NAMES {
        let err = parse(&format!("setvar {name} 1")).unwrap_err();
        assert_eq!(
            err.kind(),
            ParseErrorKind::ReservedVariableName,
            "for {name}"
        );
    }
}

#[test]
fn test_defrgba_and_defhsla_reject_reserved_names() {
    let err = parse("defrgba w 1 0 0 1").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::ReservedVariableName);
    let err = parse("defhsla t 0 1 0.5 1").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::ReservedVariableName);
}

#[test]
fn test_eleventh_user_variable_fails() {
    let mut source = String::new();
    for i in 0..10 {
        source.push_str(&format!("setvar v{i} {i} "));
    }
    parse(&source).unwrap();

    source.push_str("setvar v10 10");
    let err = parse(&source).unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::TooManyUserVariables);
}

#[test]
fn test_variable_as_numeric_argument() {
    let script = parse("setvar x 5 M x x").unwrap();
    assert_eq!(
        script.body.statements[1].args,
        vec![
            Argument::Var(VarId(FIXED_VARS as u32)),
            Argument::Var(VarId(FIXED_VARS as u32))
        ]
    );

    // Fixed variables work too.
    let script = parse("M w h").unwrap();
    assert_eq!(
        script.body.statements[0].args,
        vec![Argument::Var(VarId(2)), Argument::Var(VarId(3))]
    );
}

#[test]
fn test_unknown_word_in_numeric_slot() {
    let err = parse("M nope 0").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::ExpectedNumeric);
}

#[test]
fn test_expressions_see_user_variables() {
    parse("setvar a 1 M (a*2) 0").unwrap();
    let err = parse("M (a*2) 0").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::ExpressionParseFailed);
}

// ---------------------------------------------------------------------------
// Colours
// ---------------------------------------------------------------------------

#[test]
fn test_color_forms() {
    let script = parse("setcolor red setcolor #336699 setcolor #33669980 setcolor rgba(255,0,0,0.5)")
        .unwrap();
    let color = |i: usize| match script.body.statements[i].args[0] {
        Argument::Color(rgba) => rgba,
        ref other => panic!("expected Color, got {other:?}"),
    };
    assert_eq!(color(0), [0xff, 0, 0, 0xff]);
    assert_eq!(color(1), [0x33, 0x66, 0x99, 0xff]);
    assert_eq!(color(2), [0x33, 0x66, 0x99, 0x80]);
    assert_eq!(color(3), [0xff, 0, 0, 0x80]);
}

#[test]
fn test_color_alpha_suffix() {
    let script = parse("setcolor red@0.2 setcolor #336699@0.5 setcolor #33669980@0.5").unwrap();
    let color = |i: usize| match script.body.statements[i].args[0] {
        Argument::Color(rgba) => rgba,
        ref other => panic!("expected Color, got {other:?}"),
    };
    assert_eq!(color(0), [0xff, 0, 0, 51]);
    assert_eq!(color(1), [0x33, 0x66, 0x99, 128]);
    // The suffix scales an explicit hex alpha rather than replacing it.
    assert_eq!(color(2), [0x33, 0x66, 0x99, 64]);
}

#[test]
fn test_bad_alpha_suffixes() {
    for source in ["setcolor red@", "setcolor red@x", "setcolor nope@0.5"] {
        let err = parse(source).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::ExpectedColor, "for {source}");
    }
}

#[test]
fn test_alpha_suffix_does_not_apply_to_variables() {
    // Only keyword and hex literals take the suffix; a user variable with
    // an embedded '@' cannot exist, so this is simply not a colour.
    let err = parse("defrgba glow 1 0 0 1 setcolor glow@0.5").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::ExpectedColor);
}

#[test]
fn test_color_from_user_variable() {
    let script = parse("defrgba glow 1 0 0 1 setcolor glow").unwrap();
    assert_eq!(
        script.body.statements[1].args[0],
        Argument::ColorVar(VarId(FIXED_VARS as u32))
    );
}

#[test]
fn test_color_keyword_wins_over_variable() {
    // A user variable may be named after a colour; the keyword wins in
    // COLOR slots, consistently on every parse.
    let script = parse("setvar red 1 setcolor red").unwrap();
    assert_eq!(
        script.body.statements[1].args[0],
        Argument::Color([0xff, 0, 0, 0xff])
    );
}

#[test]
fn test_bad_colors() {
    for source in ["setcolor nope", "setcolor #12345", "setcolor rgba(1,2,3)"] {
        let err = parse(source).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::ExpectedColor, "for {source}");
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

#[test]
fn test_constants() {
    let script = parse("setlinecap round setlinejoin bevel").unwrap();
    assert_eq!(script.body.statements[0].args, vec![Argument::Constant(1)]);
    assert_eq!(script.body.statements[1].args, vec![Argument::Constant(2)]);
}

#[test]
fn test_invalid_constant_lists_the_choices() {
    let err = parse("setlinecap unknown m 10 20").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::InvalidConstant);
    assert!(err.message().contains("butt"));
    assert!(err.message().contains("round"));
    assert!(err.message().contains("square"));
}

// ---------------------------------------------------------------------------
// Blocks and procedures
// ---------------------------------------------------------------------------

#[test]
fn test_nested_blocks() {
    let script = parse("repeat 3 { if (i) { l 1 1 } }").unwrap();
    let Argument::SubProgram(outer) = &script.body.statements[0].args[1] else {
        panic!("expected sub-program");
    };
    assert_eq!(outer.statements[0].opcode, Opcode::If);
}

#[test]
fn test_procedure_ids_are_interned_in_first_reference_order() {
    let script = parse("call second proc first { } proc second { M 0 0 }").unwrap();
    assert_eq!(script.procedures, vec!["second", "first"]);
    assert_eq!(
        script.body.statements[0].args[0],
        Argument::Proc(ProcId(0))
    );
    assert_eq!(
        script.body.statements[2].args[0],
        Argument::Proc(ProcId(0))
    );
    assert_eq!(
        script.body.statements[1].args[0],
        Argument::Proc(ProcId(1))
    );
}

#[test]
fn test_proc_forms() {
    let script = parse("proc1 wave amp { } proc2 dot px py { } call1 wave 3 call2 dot 1 2").unwrap();
    assert_eq!(
        opcodes(&script),
        vec![Opcode::Proc1, Opcode::Proc2, Opcode::Call1, Opcode::Call2]
    );
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_instruction() {
    let err = parse("M 0 0 spam 1").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::UnknownInstruction);
    assert!(err.message().contains("spam"));
}

#[test]
fn test_unmatched_paren_mid_statement() {
    let err = parse("M 0 (1*(t+1)").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::UnmatchedParen);
    assert_eq!(err.line(), 1);
}

#[test]
fn test_unexpected_end_inside_block() {
    let err = parse("repeat 3 { M 0 0").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::UnexpectedEnd);
}

#[test]
fn test_unmatched_brace_at_top_level() {
    let err = parse("M 0 0 }").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::UnmatchedBrace);
}

#[test]
fn test_missing_block() {
    let err = parse("if 1 moveto 0 0").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::UnmatchedBrace);
}

#[test]
fn test_invalid_number() {
    let err = parse("M 1..2 3").unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::InvalidNumber);
}

#[test]
fn test_end_of_input_mid_statement() {
    for source in ["M 0", "setcolor", "setvar", "proc", "call1 foo"] {
        let err = parse(source).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::UnexpectedEnd, "for {source:?}");
    }
}

#[test]
fn test_error_location() {
    let err = parse("M 0 0\nl 1 1\nbogus").unwrap_err();
    assert_eq!(err.line(), 3);
    assert_eq!(err.column(), 1);
}

// ---------------------------------------------------------------------------
// Comment transparency and canonical round-trips
// ---------------------------------------------------------------------------

const COMMENT_TOKENS: &[&str] = &[
    "M", "0", "0", "l", "10", "(w/2)", "setcolor", "red", "repeat", "2", "{", "l", "1", "1", "}",
    "stroke",
];

#[test]
fn test_comments_between_any_two_tokens_are_invisible() {
    let plain = parse(&COMMENT_TOKENS.join(" ")).unwrap();
    for gap in 1..COMMENT_TOKENS.len() {
        let mut source = String::new();
        for (index, token) in COMMENT_TOKENS.iter().enumerate() {
            if index == gap {
                source.push_str(" // interleaved comment\n");
            }
            source.push(' ');
            source.push_str(token);
        }
        let commented = parse(&source).unwrap();
        assert_eq!(plain, commented, "comment before token {gap}");
    }
}

fn assert_round_trip(source: &str) {
    let first = parse(source).unwrap();
    let canonical = first.canonical();
    let second = parse(&canonical).unwrap();
    assert_eq!(first, second, "canonical form was: {canonical}");
    // The canonical form is a fixpoint.
    assert_eq!(second.canonical(), canonical);
}

#[test]
fn test_canonical_round_trip() {
    assert_round_trip("M 10 20 l 5 5 stroke");
    assert_round_trip("moveto 1 2 rlineto 3 4 closepath");
    assert_round_trip("M 0 0 L 1 2 3 4 5 6");
    assert_round_trip("setcolor red setcolor #33669980 setcolor rgba(128,64,3,0.25)");
    assert_round_trip("setcolor red@0.2 colorstop 0 lime@0.5 1 #ffffff@0.25");
    assert_round_trip("setlinecap square setlinejoin miter setmiterlimit 4");
    assert_round_trip("setvar a 4 M (a*2+1) (min(w,h)/2) l (-a^2) (if(lt(t,1),0,5))");
    assert_round_trip("defrgba glow 1 0 0 1 setcolor glow colorstop 0.5 glow");
    assert_round_trip("proc2 dot px py { circle px py 2 fill } call2 dot 5 5 call dot");
    assert_round_trip("repeat 3 { if (i) { l 1 1 } m 1 0 } print done (t) 1");
    assert_round_trip("getmetadata a score push 1 2 arc 0 0 5 0 (TAU)");
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// `L x1 y1 … xn yn` yields exactly n statements with the
        /// coordinates in order.
        #[test]
        fn repetition_expansion(pairs in proptest::collection::vec((-1e6..1e6f64, -1e6..1e6f64), 1..20)) {
            let mut source = String::from("L");
            for (x, y) in &pairs {
                source.push_str(&format!(" {x} {y}"));
            }
            let script = parse(&source).unwrap();
            prop_assert_eq!(script.body.statements.len(), pairs.len());
            for (statement, (x, y)) in script.body.statements.iter().zip(&pairs) {
                prop_assert_eq!(statement.opcode, Opcode::LineTo);
                prop_assert_eq!(&statement.args, &vec![Argument::Literal(*x), Argument::Literal(*y)]);
            }
        }

        /// Literal coordinates survive a canonical round-trip exactly.
        #[test]
        fn canonical_preserves_literals(x in -1e9..1e9f64, y in proptest::num::f64::NORMAL) {
            let source = format!("M {x} {y}");
            let first = parse(&source).unwrap();
            let second = parse(&first.canonical()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
