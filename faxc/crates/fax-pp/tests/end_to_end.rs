//! Black-box coverage of end-to-end preprocessing scenarios, plus the
//! named stack-depth and recursion boundaries.

use fax_pp::context::NoIncludes;
use fax_pp::preprocess;

fn run(source: &str) -> fax_pp::PreprocessResult {
    preprocess("test.c", source, &[], false, Box::new(NoIncludes)).unwrap()
}

#[test]
fn object_like_macros() {
    let r = run("#define A 2\n#define B 3\nA+B\n");
    assert_eq!(r.output, "2 + 3");
    assert!(r.errors.is_empty());
}

#[test]
fn function_like_macro_with_expression_argument() {
    let r = run("#define SQ(x) ((x)*(x))\nSQ(1+2)\n");
    assert_eq!(r.output, "( ( 1 + 2 ) * ( 1 + 2 ) )");
}

#[test]
fn stringize_operator() {
    let r = run("#define STR(x) #x\nSTR(hello world)\n");
    assert_eq!(r.output, "\"hello world\"");
}

#[test]
fn token_paste_operator() {
    let r = run("#define CAT(a,b) a##b\nCAT(foo,bar)\n");
    assert_eq!(r.output, "foobar");
}

#[test]
fn conditional_else_branch() {
    let r = run("#if defined(X)\nyes\n#else\nno\n#endif\n");
    assert_eq!(r.output, "no");
}

#[test]
fn conditional_constant_expression() {
    let r = run("#if 1+2*3 == 7\nok\n#endif\n");
    assert_eq!(r.output, "ok");
}

#[test]
fn predefines_are_visible_to_the_primary_source() {
    let r = preprocess(
        "test.c",
        "#if VERSION >= 2\nnew\n#else\nold\n#endif\n",
        &[("VERSION".to_string(), "3".to_string())],
        false,
        Box::new(NoIncludes),
    )
    .unwrap();
    assert_eq!(r.output, "new");
}

#[test]
fn undef_removes_a_macro() {
    let r = run("#define X 1\n#undef X\n#ifdef X\nyes\n#else\nno\n#endif\n");
    assert_eq!(r.output, "no");
}

#[test]
fn nested_conditionals_track_independently() {
    let r = run("#if 1\n#if 0\na\n#else\nb\n#endif\n#endif\n");
    assert_eq!(r.output, "b");
}

#[test]
fn unterminated_if_is_accumulated_as_a_diagnostic() {
    // Directive/semantic errors are accumulated, not fatal — only
    // `Context::new`'s own startup failures return `Err` directly.
    let r = run("#if 1\nx\n");
    assert_eq!(r.errors.len(), 1);
}

#[test]
fn line_directive_changes_reported_diagnostics() {
    let r = run("#line 100 \"other.c\"\n#error boom\n");
    assert_eq!(r.errors.len(), 1);
    assert_eq!(r.errors[0].line, 100);
    assert_eq!(&*r.errors[0].filename, "other.c");
}

#[test]
fn self_referential_macro_trips_the_recursion_cap() {
    // `A` expands to `A B`; rescanning re-encounters `A` and expands
    // again, climbing until the 256-deep expansion cap fires.
    let r = run("#define A A B\nA\n");
    assert_eq!(r.errors.len(), 1);
    assert!(r.errors[0].message.contains("256"));
}

#[test]
fn dangling_concat_is_an_error() {
    let r = run("#define BAD(x) x##\nBAD(1)\n");
    assert!(!r.errors.is_empty());
}

#[test]
fn stray_bad_character_is_an_error() {
    let r = run("a @ b\n");
    assert_eq!(r.errors.len(), 1);
    assert!(r.errors[0].message.contains('@'));
}

#[test]
fn unterminated_block_comment_is_an_error() {
    let r = run("a /* never closes\n");
    assert_eq!(r.errors.len(), 1);
    assert!(r.errors[0].message.contains("comment"));
}
