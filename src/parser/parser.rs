//! Recursive descent parser for control files
//!
//! Builds the owned syntax tree from the significant tokens produced by
//! [`tokenize`]. Errors are collected rather than returned: every item that
//! fails to parse is reported and skipped, and the rest of the file is still
//! parsed.

use text_size::{TextRange, TextSize};
use tracing::trace;

use super::errors::{ErrorCode, ParseError};
use super::grammar::{BlockParser, ExpressionParser, parse_document};
use super::keywords::{SiteKeyword, StandardVocabulary, Vocabulary};
use super::lexer::{Comment, Token, tokenize};
use super::syntax_kind::SyntaxKind;
use crate::syntax::Item;

/// Parse result containing the items, errors and comments of one source text
#[derive(Debug, Clone, Default)]
pub struct Parse {
    pub items: Vec<Item>,
    /// Lexical and syntax errors, ordered by position
    pub errors: Vec<ParseError>,
    pub comments: Vec<Comment>,
}

impl Parse {
    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse control-file source using the standard keyword vocabulary
pub fn parse_source(input: &str) -> Parse {
    parse_source_with(input, &StandardVocabulary)
}

/// Parse control-file source with a custom keyword vocabulary
pub fn parse_source_with(input: &str, vocabulary: &dyn Vocabulary) -> Parse {
    let lexed = tokenize(input);
    let mut parser = Parser::new(&lexed.tokens, vocabulary, TextSize::of(input));
    let items = parse_document(&mut parser);

    let mut errors = lexed.errors;
    errors.extend(parser.errors);
    errors.sort_by_key(|error| error.range().start());
    trace!(items = items.len(), errors = errors.len(), "parsed source");

    Parse {
        items,
        errors,
        comments: lexed.comments,
    }
}

/// Deepest nesting of parentheses, argument lists, blocks, macro bodies and
/// conditionals the parser descends into
pub const MAX_NESTING: usize = 64;

/// The parser state
struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    errors: Vec<ParseError>,
    vocabulary: &'t dyn Vocabulary,
    macro_depth: usize,
    nesting: usize,
    end: TextSize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn new(tokens: &'t [Token<'a>], vocabulary: &'t dyn Vocabulary, end: TextSize) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            vocabulary,
            macro_depth: 0,
            nesting: 0,
            end,
        }
    }

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn nth(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + n)
    }
}

impl ExpressionParser for Parser<'_, '_> {
    fn current_kind(&self) -> SyntaxKind {
        self.current().map(|t| t.kind).unwrap_or(SyntaxKind::EOF)
    }

    fn current_text(&self) -> &str {
        self.current().map(|t| t.text).unwrap_or("")
    }

    fn current_range(&self) -> TextRange {
        self.current()
            .map(|t| t.range)
            .unwrap_or_else(|| TextRange::empty(self.end))
    }

    fn peek_kind(&self, n: usize) -> SyntaxKind {
        self.nth(n).map(|t| t.kind).unwrap_or(SyntaxKind::EOF)
    }

    fn is_spaced(&self, n: usize) -> bool {
        self.nth(n).is_none_or(|t| t.spaced_before)
    }

    fn prev_end(&self) -> TextSize {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.range.end(),
            None => TextSize::new(0),
        }
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_reserved(&self, word: &str) -> bool {
        self.vocabulary.contains(word) || SiteKeyword::from_word(word).is_some()
    }

    fn enter_nested(&mut self) -> Result<(), ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(ParseError::syntax(
                format!("nesting deeper than {MAX_NESTING} levels"),
                self.current_range(),
                ErrorCode::E0208,
            ));
        }
        self.nesting += 1;
        Ok(())
    }

    fn exit_nested(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }
}

impl BlockParser for Parser<'_, '_> {
    fn is_vocabulary(&self, word: &str) -> bool {
        self.vocabulary.contains(word)
    }

    fn in_macro_body(&self) -> bool {
        self.macro_depth > 0
    }

    fn enter_macro_body(&mut self) {
        self.macro_depth += 1;
    }

    fn exit_macro_body(&mut self) {
        self.macro_depth = self.macro_depth.saturating_sub(1);
    }

    fn error(&mut self, error: ParseError) {
        trace!(%error, "syntax error");
        self.errors.push(error);
    }

    fn get_pos(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{
        Argument, BinaryOp, Branch, Condition, ConditionFamily, Conditional, Directive, Expr,
        ItemKind, Literal, Refinement, SiteDecl, SiteStatement, UnaryOp, Value,
    };

    fn parse_ok(input: &str) -> Vec<Item> {
        let parse = parse_source(input);
        assert!(parse.ok(), "unexpected errors for {input:?}: {:?}", parse.errors);
        parse.items
    }

    /// Body of `= <input>;`
    fn expr(input: &str) -> Expr {
        let items = parse_ok(&format!("= {input};"));
        match &items[0].kind {
            ItemKind::Equation(equation) => equation.body.clone(),
            other => panic!("expected equation, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(format!("{:#}", expr("1 + 2 * 3")), "(1 + (2 * 3))");
        assert_eq!(format!("{:#}", expr("1 - 2 - 3")), "((1 - 2) - 3)");
        assert_eq!(format!("{:#}", expr("a < b + 1")), "(a < (b + 1))");
        assert_eq!(format!("{:#}", expr("2 x ^ 2")), "(2 (x ^ 2))");
    }

    #[test]
    fn test_power_is_left_associative() {
        assert_eq!(format!("{:#}", expr("a^b^c")), "((a ^ b) ^ c)");
    }

    #[test]
    fn test_negative_literal_folding() {
        assert_eq!(expr("-2"), Expr::Literal(Literal::Integer(-2)));
        assert_eq!(
            expr("-2^2"),
            Expr::unary(
                UnaryOp::Minus,
                Expr::binary(
                    BinaryOp::Pow,
                    Expr::Literal(Literal::Integer(2)),
                    Expr::Literal(Literal::Integer(2))
                )
            )
        );
        assert_eq!(format!("{:#}", expr("a^-2")), "(a ^ -2)");
    }

    #[test]
    fn test_call_requires_adjacent_paren() {
        assert!(matches!(expr("f(x)"), Expr::Call(_)));
        assert_eq!(format!("{:#}", expr("f (x)")), "(f x)");
    }

    #[test]
    fn test_call_arguments() {
        let Expr::Call(call) = expr("f(a,, @ pk1 1, = c;, !dd1)") else {
            panic!("expected call");
        };
        assert_eq!(call.arguments.len(), 5);
        assert!(call.arguments[1].is_empty());
        assert!(matches!(&call.arguments[2], Argument::Param(p) if p.refinement == Refinement::Refined));
        assert!(matches!(call.arguments[3], Argument::Equation(_)));
        assert!(matches!(&call.arguments[4], Argument::Param(p) if p.refinement == Refinement::Unrefined));
    }

    #[test]
    fn test_empty_call_has_no_arguments() {
        let Expr::Call(call) = expr("f()") else {
            panic!("expected call");
        };
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_juxtaposition_only_inside_expressions() {
        let items = parse_ok("a b 1 -2");
        assert_eq!(items.len(), 4);
        assert_eq!(items[3].as_expr(), Some(&Expr::Literal(Literal::Integer(-2))));
        assert_eq!(format!("{:#}", expr("a b 1 -2")), "(((a b) 1) - 2)");
    }

    #[test]
    fn test_float_with_fractional_exponent() {
        let Expr::Literal(Literal::Float(value)) = expr("1e0.5") else {
            panic!("expected float");
        };
        assert!((value - 10f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_integer_overflow_is_lex_error() {
        let parse = parse_source("= 99999999999999999999;");
        assert_eq!(parse.errors.len(), 1);
        assert!(parse.errors[0].is_lex());
        assert_eq!(parse.errors[0].code(), ErrorCode::E0104);
    }

    #[test]
    fn test_keyword_equation() {
        let items = parse_ok("scale = 0.001;");
        let ItemKind::Keyword { keyword, equation: Some(equation) } = &items[0].kind else {
            panic!("expected keyword with equation");
        };
        assert_eq!(keyword, "scale");
        assert_eq!(equation.body, Expr::Literal(Literal::Float(0.001)));
    }

    #[test]
    fn test_equation_with_uncertainty() {
        let items = parse_ok("prm a = b + 1; : 0.5");
        let ItemKind::Variable(decl) = &items[0].kind else {
            panic!("expected variable");
        };
        let Some(Value::Equation(equation)) = &decl.param.value else {
            panic!("expected equation value");
        };
        assert!(equation.uncertainty.is_some());
    }

    #[test]
    fn test_missing_semicolon() {
        let parse = parse_source("prm a = 1 + \n local b 2");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0406);
        let parse = parse_source("prm a = 1 )");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0201);
    }

    #[test]
    fn test_recovery_continues_after_semicolon() {
        let parse = parse_source("prm = 1; scale 2");
        assert_eq!(parse.errors.len(), 1);
        assert_eq!(parse.errors[0].code(), ErrorCode::E0301);
        assert_eq!(parse.items.len(), 2);
    }

    #[test]
    fn test_site_statements() {
        let items = parse_ok("site Fe+3 x @ 0.25 y 0.5 z = 1/3; occ Fe+3 1 beq @ 0.5 scale_occ 2");
        let ItemKind::Site(site) = &items[0].kind else {
            panic!("expected site");
        };
        assert_eq!(site.name, "Fe+3");
        assert_eq!(site.members.len(), 4);
        let ItemKind::SiteStatement(SiteStatement::Occupancy(occ)) = &site.members[3].kind else {
            panic!("expected occupancy");
        };
        assert_eq!(occ.atom, "Fe+3");
        assert_eq!(occ.modifiers.len(), 2);
    }

    #[test]
    fn test_occ_without_atom() {
        let parse = parse_source("site A occ 1");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0303);
        assert_eq!(parse.errors[0].range(), TextRange::empty(TextSize::new(10)));
    }

    #[test]
    fn test_fixed_site_value_rejects_refinement() {
        let parse = parse_source("site A rand_xyz @ 1");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0302);
    }

    #[test]
    fn test_adps_order() {
        let parse = parse_source("site A adps u11 1 u33 1");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0305);
    }

    #[test]
    fn test_conditionals() {
        let items = parse_ok("#ifdef !A a #elseif 1; b #else c #endif");
        let ItemKind::Conditional(conditional) = &items[0].kind else {
            panic!("expected conditional");
        };
        assert_eq!(conditional.family, ConditionFamily::Document);
        assert!(matches!(
            conditional.branches[0].condition,
            Condition::Defined { negated: true, .. }
        ));
        assert_eq!(conditional.branches.len(), 2);
        assert!(conditional.otherwise.is_some());
    }

    #[test]
    fn test_elseif_condition_keeps_its_first_token() {
        let items = parse_ok("#if 0; pk1 #elseif 2 > 1; pk2 #elseif kk; pk3 #endif");
        let ItemKind::Conditional(conditional) = &items[0].kind else {
            panic!("expected conditional");
        };
        assert_eq!(conditional.branches.len(), 3);
        let Condition::Expr(second) = &conditional.branches[1].condition else {
            panic!("expected expression condition");
        };
        assert_eq!(format!("{second:#}"), "(2 > 1)");

        let items = parse_ok("macro mc(pk1) { #m_if pk1 == 1; pk2 #m_elseif pk1 == 2; pk3 #m_endif }");
        let ItemKind::Macro(decl) = &items[0].kind else {
            panic!("expected macro");
        };
        let ItemKind::Conditional(conditional) = &decl.body.items[0].kind else {
            panic!("expected conditional");
        };
        assert_eq!(conditional.family, ConditionFamily::Macro);
        assert_eq!(conditional.branches.len(), 2);
    }

    #[test]
    fn test_unterminated_conditional() {
        let parse = parse_source("#if 1; a");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0206);
    }

    #[test]
    fn test_mixed_conditional_families() {
        let parse = parse_source("macro m { #if 1; a #m_endif }");
        assert!(parse.errors.iter().any(|e| e.code() == ErrorCode::E0207));
    }

    #[test]
    fn test_macro_directive_outside_macro() {
        let parse = parse_source("#m_argu x scale");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0306);
        assert_eq!(parse.items.len(), 1);
    }

    #[test]
    fn test_macro_declaration() {
        let items = parse_ok("macro & Foo(a, &b, ) { a b }");
        let ItemKind::Macro(decl) = &items[0].kind else {
            panic!("expected macro");
        };
        let signature = &decl.signatures[0];
        assert!(signature.by_reference);
        assert_eq!(signature.params.len(), 3);
        assert!(signature.params[1].by_reference);
        assert!(signature.params[2].name.is_none());
        assert_eq!(decl.body.items.len(), 2);
    }

    #[test]
    fn test_signature_keeps_written_parens() {
        let rendered = crate::syntax::render_items(&parse_ok("macro mv() { 1 } macro mw { 2 }"));
        assert_eq!(rendered, "macro mv() { 1 }\nmacro mw { 2 }");
    }

    #[test]
    fn test_call_shaped_keyword_is_an_invocation() {
        let items = parse_ok("lam(1) lam (1)");
        assert!(matches!(items[0].as_expr(), Some(Expr::Call(call)) if call.name == "lam"));
        assert!(matches!(&items[1].kind, ItemKind::Keyword { equation: None, .. }));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_nesting_limit() {
        let parens = |depth: usize| format!("= {}1{};", "(".repeat(depth), ")".repeat(depth));
        assert!(parse_source(&parens(MAX_NESTING - 2)).ok());

        let parse = parse_source(&parens(20_000));
        assert_eq!(parse.errors.len(), 1, "{:?}", parse.errors);
        assert_eq!(parse.errors[0].code(), ErrorCode::E0208);

        let conditionals = format!("{}pk1{}", "#if 1; ".repeat(20_000), " #endif".repeat(20_000));
        let parse = parse_source(&conditionals);
        assert!(parse.errors.iter().any(|error| error.code() == ErrorCode::E0208));
    }

    #[test]
    fn test_list_declaration_shares_body() {
        let items = parse_ok("#list a(p1), b(p1) { p1 { p1 } }");
        let ItemKind::Macro(decl) = &items[0].kind else {
            panic!("expected macro");
        };
        assert!(decl.is_list);
        assert_eq!(decl.signatures.len(), 2);
        assert!(matches!(decl.body.items[1].kind, ItemKind::Block(_)));
    }

    #[test]
    fn test_nested_macro_is_error() {
        let parse = parse_source("macro a { macro b { } }");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0307);
    }

    #[test]
    fn test_directives() {
        let items = parse_ok("#include \"a.inc\" #define X #delete_macros { a b } #prm p = 2;");
        assert!(matches!(&items[0].kind, ItemKind::Directive(Directive::Include(p)) if p == "a.inc"));
        assert!(matches!(&items[1].kind, ItemKind::Directive(Directive::Define(_))));
        assert!(matches!(&items[2].kind, ItemKind::Directive(Directive::DeleteMacros(n)) if n.len() == 2));
        assert!(matches!(&items[3].kind, ItemKind::Directive(Directive::Prm { .. })));
    }

    #[test]
    fn test_stray_brace() {
        let parse = parse_source("a } b");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0205);
        assert_eq!(parse.items.len(), 2);
    }

    #[test]
    fn test_display_reparses_to_same_tree() {
        let source = "prm @ a 1 site O1 x = 1/3; occ O-2 @ 0.5 \
                      #if a > -1; b = (c + 1) 2 ^ -d; #endif";
        let first = parse_ok(source);
        let second = parse_ok(&crate::syntax::render_items(&first));
        assert_eq!(without_ranges(&first), without_ranges(&second));
    }

    /// Items with every nested item range cleared
    fn without_ranges(items: &[Item]) -> Vec<Item> {
        let empty = TextRange::empty(TextSize::new(0));
        items
            .iter()
            .map(|item| {
                let kind = match &item.kind {
                    ItemKind::Site(site) => ItemKind::Site(SiteDecl {
                        name: site.name.clone(),
                        members: without_ranges(&site.members),
                    }),
                    ItemKind::Conditional(conditional) => ItemKind::Conditional(Conditional {
                        family: conditional.family,
                        branches: conditional
                            .branches
                            .iter()
                            .map(|branch| Branch {
                                condition: branch.condition.clone(),
                                items: without_ranges(&branch.items),
                            })
                            .collect(),
                        otherwise: conditional.otherwise.as_deref().map(without_ranges),
                    }),
                    ItemKind::Block(items) => ItemKind::Block(without_ranges(items)),
                    other => other.clone(),
                };
                Item::new(kind, empty)
            })
            .collect()
    }

    #[test]
    fn test_macro_display_is_a_fixpoint() {
        let source = "macro f(p) { #m_ifarg p #m_code p #m_else = p; #m_endif } f(@ q1 2)";
        let rendered = crate::syntax::render_items(&parse_ok(source));
        assert_eq!(crate::syntax::render_items(&parse_ok(&rendered)), rendered);
    }

    #[test]
    fn test_unclosed_paren() {
        let parse = parse_source("= (1 + 2;");
        assert_eq!(parse.errors[0].code(), ErrorCode::E0203);
    }
}
