use tokio_util::sync::CancellationToken;

use crate::document::Document;
use crate::include::MemoryResolver;
use crate::options::ParseOptions;
use crate::parser::ErrorCode;
use crate::syntax::{AssignOp, Directive, Expr, ItemKind, Literal, Refinement};
use crate::{Session, parse};

fn codes(document: &Document) -> Vec<ErrorCode> {
    document.errors.iter().map(|error| error.code()).collect()
}

fn rendered(source: &str) -> String {
    let document = parse(source);
    assert!(document.ok(), "{:?}", document.errors);
    document.to_string()
}

fn shallow(depth: usize) -> Session {
    Session::new().with_options(ParseOptions {
        max_expansion_depth: depth,
        ..ParseOptions::default()
    })
}

// =============================================================================
// Macro invocation
// =============================================================================

#[test]
fn test_macro_call_substitutes_arguments() {
    let document = parse("macro lp(pk1) { = pk1; } lp(2)");
    assert!(document.ok(), "{:?}", document.errors);
    assert_eq!(document.items.len(), 2);
    let ItemKind::Equation(equation) = &document.items[1].kind else {
        panic!("expected equation, got {:?}", document.items[1].kind);
    };
    assert_eq!(equation.body, Expr::Literal(Literal::Integer(2)));
    assert_eq!(document.context.macros.len(), 1);
}

#[test]
fn test_expanded_items_take_the_call_range() {
    let source = "macro two() { pk1 pk2 } two()";
    let document = parse(source);
    let call_start = source.rfind("two()").unwrap() as u32;
    assert_eq!(document.items.len(), 3);
    for item in &document.items[1..] {
        assert_eq!(u32::from(item.range.start()), call_start);
    }
}

#[test]
fn test_compound_argument_keeps_its_grouping() {
    assert_eq!(rendered("macro sq(pk1) { = pk1 * pk1; } sq(1 + 2)").lines().last(), Some("= (1 + 2) * (1 + 2);"));
}

#[test]
fn test_macro_inside_expression() {
    assert_eq!(rendered("macro two() { 2 } = two() + 1;").lines().last(), Some("= 2 + 1;"));
}

#[test]
fn test_nested_invocation_in_body() {
    let source = "macro inner(pk1) { = pk1; } macro outer(pk2) { inner(pk2) } outer(5)";
    assert_eq!(rendered(source).lines().last(), Some("= 5;"));
}

#[test]
fn test_non_macro_call_is_kept() {
    assert_eq!(rendered("= Sqrt(4);"), "= Sqrt(4);");
}

#[test]
fn test_arity_mismatch() {
    let document = parse("macro pv(pk1, pk2) { pk1 } pv(1)");
    assert_eq!(codes(&document), vec![ErrorCode::E0503]);
    assert_eq!(document.items.len(), 1);
}

#[test]
fn test_empty_call_fills_single_parameter() {
    let document = parse("macro one(pk1) { pk1 rr } one()");
    assert!(document.ok(), "{:?}", document.errors);
    // the bare parameter item drops out
    assert_eq!(document.to_string().lines().last(), Some("rr"));
    assert_eq!(document.items.len(), 2);
}

#[test]
fn test_empty_slot_drops_standalone_parameter() {
    let document = parse("macro two(pk1, pk2) { pk1 pk2 } two(, 3)");
    assert!(document.ok(), "{:?}", document.errors);
    assert_eq!(document.to_string().lines().last(), Some("3"));
}

#[test]
fn test_by_reference_parameter_is_never_expanded_unless_used() {
    let source = "macro pair(pk1, pk2) { pk1 } macro ignore(&pk3) { = 1; } ignore(pair(1, 2, 3))";
    let document = parse(source);
    assert!(document.ok(), "{:?}", document.errors);

    let by_value = parse("macro pair(pk1, pk2) { pk1 } macro keep(pk3) { = 1; } keep(pair(1, 2, 3))");
    assert_eq!(codes(&by_value), vec![ErrorCode::E0503]);
}

#[test]
fn test_list_signatures_share_one_body() {
    let document = parse("#list lst1(), lst2() { = 1; pk1 } lst1() lst2()");
    assert!(document.ok(), "{:?}", document.errors);
    let rendered: Vec<String> = document.items[1..].iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["= 1;", "pk1", "= 1;", "pk1"]);
}

#[test]
fn test_list_blocks_are_spliced() {
    let document = parse("#list lst1(pk1) { { = pk1; } } lst1(4)");
    assert!(document.ok(), "{:?}", document.errors);
    assert_eq!(document.to_string().lines().last(), Some("= 4;"));
}

#[test]
fn test_recursion_limit() {
    let document = shallow(8).parse("macro rec() { rec() } rec()");
    assert_eq!(codes(&document), vec![ErrorCode::E0502]);
    assert_eq!(document.items.len(), 1);
}

#[test]
fn test_failed_item_does_not_stop_the_next() {
    let document = parse("macro pv(pk1) { pk1 } pv(1, 2) pv(3)");
    assert_eq!(codes(&document), vec![ErrorCode::E0503]);
    assert_eq!(document.to_string().lines().last(), Some("3"));
}

#[test]
fn test_macro_named_like_a_keyword() {
    let document = parse("macro la(pk1) { = pk1; } la(4)");
    assert!(document.ok(), "{:?}", document.errors);
    assert_eq!(document.to_string().lines().last(), Some("= 4;"));
}

#[test]
fn test_redeclaration_replaces_macro() {
    assert_eq!(rendered("macro mv() { 1 } macro mv() { 2 } mv()").lines().last(), Some("2"));
}

#[test]
fn test_deleted_macro_is_unresolved() {
    let document = parse("macro lp(pk1) { pk1 } #delete_macros { lp } lp(1)");
    assert_eq!(codes(&document), vec![ErrorCode::E0501]);
    assert!(!document.context.macros.contains("lp"));
    assert!(document.context.macros.is_deleted("lp"));
}

#[test]
fn test_delete_unknown_macro_is_ignored() {
    let document = parse("#delete_macros { nothing }");
    assert!(document.ok());
    assert!(!document.context.macros.is_deleted("nothing"));
}

// =============================================================================
// Macro directives
// =============================================================================

#[test]
fn test_unique_names_differ_per_expansion() {
    let document = parse("macro mk() { prm #m_unique 1 } mk() mk()");
    assert!(document.ok(), "{:?}", document.errors);
    let names: Vec<String> = document.items[1..].iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["prm _unique_1 1", "prm _unique_2 1"]);
    assert!(document.context.is_declared("_unique_2"));
}

#[test]
fn test_m_ifarg_code() {
    let source = "macro opt(pk1) { #m_ifarg pk1 #m_code = 1; #m_else = 2; #m_endif } opt(@ rr 1) opt(3)";
    let lines: Vec<String> = rendered(source).lines().map(String::from).collect();
    assert_eq!(&lines[1..], ["= 1;", "= 2;"]);
}

#[test]
fn test_m_ifarg_text_and_eqn() {
    let source = "macro opt(pk1) { #m_ifarg pk1 \"yes\" = 1; #m_elseif 0; = 3; #m_else = 2; #m_endif } opt(yes)";
    assert_eq!(rendered(source).lines().last(), Some("= 1;"));

    let source = "macro eq(pk1) { #m_ifarg pk1 #m_eqn = 1; #m_else = 2; #m_endif } eq(= 4;) eq(4)";
    let lines: Vec<String> = rendered(source).lines().map(String::from).collect();
    assert_eq!(&lines[1..], ["= 1;", "= 2;"]);
}

#[test]
fn test_m_elseif_chain() {
    let source = "macro pick(pk1) { #m_if pk1 == 1; = 1; #m_elseif pk1 == 2; = 2; #m_else = 0; #m_endif } \
                  pick(1) pick(2) pick(3)";
    let lines: Vec<String> = rendered(source).lines().map(String::from).collect();
    assert_eq!(&lines[1..], ["= 1;", "= 2;", "= 0;"]);
}

#[test]
fn test_m_if_evaluates_arguments() {
    let source = "macro pick(pk1) { #m_if pk1 > 2; = 1; #m_else = 0; #m_endif } pick(5) pick(1)";
    let lines: Vec<String> = rendered(source).lines().map(String::from).collect();
    assert_eq!(&lines[1..], ["= 1;", "= 0;"]);
}

#[test]
fn test_m_argu_inserts_argument() {
    let document = parse("macro wrap(pk1) { #m_argu pk1 } wrap(@ rr 1)");
    assert!(document.ok(), "{:?}", document.errors);
    let ItemKind::Param(param) = &document.items[1].kind else {
        panic!("expected parameter");
    };
    assert_eq!(param.refinement, Refinement::Refined);
    assert_eq!(param.name.as_deref(), Some("rr"));
}

#[test]
fn test_m_unique_not_refine() {
    let document = parse("macro fix(pk1) { #m_unique_not_refine pk1 } fix(@ 1.5)");
    assert!(document.ok(), "{:?}", document.errors);
    let ItemKind::Param(param) = &document.items[1].kind else {
        panic!("expected parameter");
    };
    assert_eq!(param.refinement, Refinement::Unrefined);
    assert!(param.name.as_deref().is_some_and(|name| name.starts_with("_unique_")));
}

#[test]
fn test_m_first_word() {
    assert_eq!(rendered("macro fw(pk1) { #m_first_word pk1 } fw(@ rr 1)").lines().last(), Some("@"));
}

#[test]
fn test_m_out_evaluates_argument() {
    assert_eq!(rendered("macro show(pk1) { #m_out pk1 } show(2 * 3)").lines().last(), Some("6"));
}

#[test]
fn test_site_in_macro_body() {
    let document = parse("macro at(pk1) { site pk1 x 0.5 occ Fe 1 } at(Fe1)");
    assert!(document.ok(), "{:?}", document.errors);
    assert_eq!(document.to_string().lines().last(), Some("site Fe1 x 0.5 occ Fe 1"));
}

// =============================================================================
// Preprocessor
// =============================================================================

#[test]
fn test_if_selects_branch() {
    assert_eq!(rendered("#if 1; pk1 #else pk2 #endif"), "pk1");
    assert_eq!(rendered("#if 0; pk1 #else pk2 #endif"), "pk2");
    assert_eq!(rendered("#if 0; pk1 #elseif 2 > 1; pk3 #endif"), "pk3");
    assert_eq!(rendered("#if 0; pk1 #endif"), "");
    assert_eq!(rendered("#prm kk = 0; #if 0; pk1 #elseif kk == 0; pk3 #endif").lines().last(), Some("pk3"));
}

#[test]
fn test_ifdef_follows_symbols() {
    assert_eq!(rendered("#define sym #ifdef sym pk1 #else pk2 #endif").lines().last(), Some("pk1"));
    assert_eq!(rendered("#ifndef sym pk1 #endif"), "pk1");
    assert_eq!(rendered("#define sym #undef sym #ifdef !sym pk1 #endif").lines().last(), Some("pk1"));
}

#[test]
fn test_prm_variables_in_conditions() {
    let document = parse("#prm k = 3; #if k > 2; pk1 #endif");
    assert!(document.ok(), "{:?}", document.errors);
    assert_eq!(document.context.variables.get("k"), Some(3.0));
    assert_eq!(document.to_string().lines().last(), Some("pk1"));
}

#[test]
fn test_out_replaced_by_value() {
    assert_eq!(rendered("#out 2 + 3"), "5");
    assert_eq!(rendered("#out 1 / 4"), "0.25");
}

#[test]
fn test_condition_errors() {
    assert_eq!(codes(&parse("#if missing; pk1 #endif")), vec![ErrorCode::E0501]);
    assert_eq!(codes(&parse("#if 1 / 0; pk1 #endif")), vec![ErrorCode::E0504]);
}

#[test]
fn test_directives_stay_in_output() {
    let document = parse("#define sym #seed");
    assert!(matches!(&document.items[0].kind, ItemKind::Directive(Directive::Define(name)) if name == "sym"));
    assert!(matches!(&document.items[1].kind, ItemKind::Directive(Directive::Seed)));
    assert!(document.context.symbols.is_defined("sym"));
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn test_existing_prm_requires_declaration() {
    let document = parse("existing_prm foo = foo + 1;");
    assert_eq!(codes(&document), vec![ErrorCode::E0501]);

    let document = parse("prm foo 1 existing_prm foo = foo + 1;");
    assert!(document.ok(), "{:?}", document.errors);
    let ItemKind::ExistingPrm(assignment) = &document.items[1].kind else {
        panic!("expected existing_prm");
    };
    let compound = assignment.compound_form();
    assert_eq!(compound.op, AssignOp::Add);
    assert_eq!(compound.body, Expr::Literal(Literal::Integer(1)));
}

// =============================================================================
// Includes and cancellation
// =============================================================================

#[test]
fn test_include_splices_items() {
    let resolver = MemoryResolver::new().with_file("cell.inc", "macro cl(pk1) { = pk1; } pk9");
    let document = Session::new().with_resolver(resolver).parse("#include \"cell.inc\" cl(3)");
    assert!(document.ok(), "{:?}", document.errors);
    assert_eq!(document.to_string(), "macro cl(pk1) { = pk1; }\npk9\n= 3;");
}

#[test]
fn test_missing_include() {
    let document = parse("#include \"nowhere.inc\" pk1");
    assert_eq!(codes(&document), vec![ErrorCode::E0505]);
    assert_eq!(document.to_string(), "pk1");
}

#[test]
fn test_self_include_hits_depth_limit() {
    let resolver = MemoryResolver::new().with_file("loop.inc", "#include \"loop.inc\"");
    let document = shallow(4).with_resolver(resolver).parse("#include \"loop.inc\"");
    assert_eq!(codes(&document), vec![ErrorCode::E0502]);
}

#[test]
fn test_cancelled_parse_discards_items() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let document = Session::new().with_cancellation(cancel).parse("pk1 pk2");
    assert!(document.items.is_empty());
    assert_eq!(codes(&document), vec![ErrorCode::E0506]);
}

#[test]
fn test_syntax_errors_come_first() {
    let document = parse("existing_prm foo = 1; prm");
    assert_eq!(codes(&document), vec![ErrorCode::E0301, ErrorCode::E0501]);
}

#[test]
fn test_comments_are_optional() {
    let source = "pk1 ' trailing note\n/* block */ pk2";
    assert_eq!(parse(source).comments.len(), 2);

    let document = Session::new()
        .with_options(ParseOptions {
            collect_comments: false,
            ..ParseOptions::default()
        })
        .parse(source);
    assert!(document.comments.is_empty());
    assert_eq!(document.items.len(), 2);
}
