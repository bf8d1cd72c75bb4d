use crate::ast::{
    Block, Call, Expr, Function, If, Loop, Simple, Stmt, Switch, SwitchArm, TranslationUnit,
};
use crate::error::{Error, Result};
use tree_sitter::{Node, Parser};

/// Leaf-like nodes whose text is taken verbatim instead of token by token.
const ATOMIC_KINDS: [&str; 5] = [
    "string_literal",
    "char_literal",
    "number_literal",
    "system_lib_string",
    "concatenated_string",
];

const PREFIX_PARENTS: [&str; 4] = [
    "unary_expression",
    "pointer_expression",
    "pointer_declarator",
    "abstract_pointer_declarator",
];

/// Parses (preprocessed) C source into the statement tree used by the layout.
///
/// Any ERROR or MISSING node in the syntax tree fails the whole parse.
pub fn parse_c(source: &str) -> Result<TranslationUnit> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::language())
        .map_err(|err| Error::parse(0, 0, format!("failed to load C grammar: {err}")))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::parse(0, 0, "parser produced no syntax tree"))?;
    let root = tree.root_node();
    let src = source.as_bytes();

    if root.has_error() {
        let bad = first_error(root).unwrap_or(root);
        let pos = bad.start_position();
        let message = if bad.is_missing() {
            format!("missing `{}`", bad.kind())
        } else {
            let snippet: String = text(bad, src).chars().take(24).collect();
            format!("unexpected `{}`", snippet.trim())
        };
        return Err(Error::parse(pos.row + 1, pos.column + 1, message));
    }

    let mut unit = TranslationUnit::default();
    for child in named_children(root) {
        if child.kind() != "function_definition" {
            continue;
        }
        match convert_function(child, src) {
            Some(function) => unit.functions.push(function),
            None => tracing::debug!(line = line_of(child), "skipping function without a plain name"),
        }
    }
    tracing::debug!(functions = unit.functions.len(), "parsed translation unit");
    Ok(unit)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

fn convert_function(node: Node<'_>, src: &[u8]) -> Option<Function> {
    let name = declarator_name(node.child_by_field_name("declarator")?, src)?;
    let body = node.child_by_field_name("body")?;
    Some(Function {
        name,
        signature: format_tokens_before(node, body.start_byte(), src),
        line: line_of(node),
        body: convert_block(body, src),
    })
}

fn declarator_name(node: Node<'_>, src: &[u8]) -> Option<String> {
    let mut current = node;
    loop {
        if current.kind() == "identifier" {
            return Some(text(current, src).to_string());
        }
        current = current.child_by_field_name("declarator")?;
    }
}

fn convert_block(node: Node<'_>, src: &[u8]) -> Block {
    Block {
        line: line_of(node),
        stmts: named_children(node)
            .into_iter()
            .map(|child| convert_stmt(child, src))
            .collect(),
    }
}

fn convert_stmt(node: Node<'_>, src: &[u8]) -> Stmt {
    let line = line_of(node);
    match node.kind() {
        "compound_statement" => Stmt::Block(convert_block(node, src)),
        "declaration" => Stmt::Decl(simple(node, src)),
        "return_statement" => Stmt::Return(simple(node, src)),
        "expression_statement" => convert_expression_statement(node, src),
        "if_statement" => convert_if(node, src),
        "for_statement" => convert_loop(node, src).map(Stmt::For).unwrap_or(Stmt::Unsupported {
            kind: "for_statement".to_string(),
            line,
        }),
        "while_statement" => convert_loop(node, src).map(Stmt::While).unwrap_or(Stmt::Unsupported {
            kind: "while_statement".to_string(),
            line,
        }),
        "switch_statement" => convert_switch(node, src),
        "continue_statement" => Stmt::Continue { line },
        kind => Stmt::Unsupported {
            kind: kind.to_string(),
            line,
        },
    }
}

fn simple(node: Node<'_>, src: &[u8]) -> Simple {
    Simple {
        line: line_of(node),
        text: format_tokens(node, src),
        raw: text(node, src).to_string(),
    }
}

fn convert_expression_statement(node: Node<'_>, src: &[u8]) -> Stmt {
    let line = line_of(node);
    let Some(expr) = named_children(node).into_iter().next() else {
        return Stmt::Unsupported {
            kind: "empty_statement".to_string(),
            line,
        };
    };
    match expr.kind() {
        "assignment_expression" | "update_expression" | "comma_expression" => {
            Stmt::Assign(simple(node, src))
        }
        "call_expression" => {
            let callee = expr
                .child_by_field_name("function")
                .map(|function| format_tokens(function, src))
                .unwrap_or_default();
            Stmt::Call(Call {
                line,
                callee,
                text: format_tokens(node, src),
                raw: text(node, src).to_string(),
            })
        }
        kind => Stmt::Unsupported {
            kind: kind.to_string(),
            line,
        },
    }
}

fn convert_if(node: Node<'_>, src: &[u8]) -> Stmt {
    let line = line_of(node);
    let (Some(condition), Some(consequence)) = (
        node.child_by_field_name("condition"),
        node.child_by_field_name("consequence"),
    ) else {
        return Stmt::Unsupported {
            kind: "if_statement".to_string(),
            line,
        };
    };
    // Older grammars put the statement in `alternative` directly, newer ones
    // wrap it in an `else_clause`.
    let alternative = node.child_by_field_name("alternative").and_then(|alt| {
        if alt.kind() == "else_clause" {
            named_children(alt).into_iter().next()
        } else {
            Some(alt)
        }
    });
    Stmt::If(If {
        line,
        condition: convert_expr(condition, src),
        then_branch: Box::new(convert_stmt(consequence, src)),
        else_branch: alternative.map(|alt| Box::new(convert_stmt(alt, src))),
    })
}

fn convert_loop(node: Node<'_>, src: &[u8]) -> Option<Loop> {
    let body = node.child_by_field_name("body")?;
    Some(Loop {
        line: line_of(node),
        header: format_tokens_before(node, body.start_byte(), src),
        body: Box::new(convert_stmt(body, src)),
    })
}

fn convert_switch(node: Node<'_>, src: &[u8]) -> Stmt {
    let line = line_of(node);
    let Some(body) = node.child_by_field_name("body") else {
        return Stmt::Unsupported {
            kind: "switch_statement".to_string(),
            line,
        };
    };
    let arms = named_children(body)
        .into_iter()
        .filter(|child| child.kind() == "case_statement")
        .map(|case| convert_case(case, src))
        .collect();
    Stmt::Switch(Switch {
        line,
        header: format_tokens_before(node, body.start_byte(), src),
        arms,
    })
}

fn convert_case(node: Node<'_>, src: &[u8]) -> SwitchArm {
    let value = node.child_by_field_name("value");
    let body = named_children(node)
        .into_iter()
        .filter(|child| value.map(|value| value.id() != child.id()).unwrap_or(true))
        .map(|child| convert_stmt(child, src))
        .collect();
    SwitchArm {
        line: line_of(node),
        value: value.map(|value| convert_expr(value, src)),
        body,
    }
}

fn convert_expr(node: Node<'_>, src: &[u8]) -> Expr {
    match node.kind() {
        "parenthesized_expression" => match named_children(node).into_iter().next() {
            Some(inner) => convert_expr(inner, src),
            None => Expr::Other(format_tokens(node, src)),
        },
        "binary_expression" => {
            let parts = (
                node.child_by_field_name("left"),
                node.child_by_field_name("operator"),
                node.child_by_field_name("right"),
            );
            match parts {
                (Some(left), Some(op), Some(right)) => Expr::Binary {
                    op: text(op, src).to_string(),
                    left: Box::new(convert_expr(left, src)),
                    right: Box::new(convert_expr(right, src)),
                },
                _ => Expr::Other(format_tokens(node, src)),
            }
        }
        "identifier" => Expr::Ident(text(node, src).to_string()),
        "number_literal" | "char_literal" | "string_literal" | "true" | "false" | "null" => {
            Expr::Constant(text(node, src).to_string())
        }
        "subscript_expression" => {
            match (
                node.child_by_field_name("argument"),
                node.child_by_field_name("index"),
            ) {
                (Some(base), Some(index)) => Expr::Index {
                    base: Box::new(convert_expr(base, src)),
                    index: Box::new(convert_expr(index, src)),
                },
                _ => Expr::Other(format_tokens(node, src)),
            }
        }
        _ => Expr::Other(format_tokens(node, src)),
    }
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    kind: &'static str,
    parent_kind: &'static str,
    leading: bool,
}

/// Rebuilds a node's source text from its tokens with conventional C spacing.
pub(crate) fn format_tokens(node: Node<'_>, src: &[u8]) -> String {
    format_tokens_before(node, usize::MAX, src)
}

fn format_tokens_before(node: Node<'_>, limit: usize, src: &[u8]) -> String {
    let mut tokens = Vec::new();
    collect_tokens(node, limit, src, &mut tokens);
    let mut out = String::new();
    let mut prev: Option<Token> = None;
    for token in tokens {
        if let Some(prev) = prev {
            if needs_space(&prev, &token) {
                out.push(' ');
            }
        }
        out.push_str(token.text);
        prev = Some(token);
    }
    out
}

fn collect_tokens<'a>(node: Node<'_>, limit: usize, src: &'a [u8], out: &mut Vec<Token<'a>>) {
    if node.start_byte() >= limit || node.kind() == "comment" {
        return;
    }
    if node.child_count() == 0 || ATOMIC_KINDS.contains(&node.kind()) {
        let token_text = text(node, src);
        if token_text.is_empty() {
            return;
        }
        out.push(Token {
            text: token_text,
            kind: node.kind(),
            parent_kind: node.parent().map(|parent| parent.kind()).unwrap_or(""),
            leading: node.prev_sibling().is_none(),
        });
        return;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children {
        collect_tokens(child, limit, src, out);
    }
}

fn needs_space(prev: &Token<'_>, next: &Token<'_>) -> bool {
    if matches!(next.text, "," | ";" | ")" | "]" | "[" | "." | "->") {
        return false;
    }
    if matches!(prev.text, "(" | "[" | "." | "->") {
        return false;
    }
    if next.text == "(" {
        let call_like = matches!(prev.kind, "identifier" | "field_identifier")
            || matches!(prev.text, ")" | "]" | "sizeof");
        return !call_like;
    }
    let prefix = prev.leading
        && (PREFIX_PARENTS.contains(&prev.parent_kind)
            || (prev.parent_kind == "update_expression" && matches!(prev.text, "++" | "--")));
    if prefix {
        return false;
    }
    let postfix = !next.leading
        && next.parent_kind == "update_expression"
        && matches!(next.text, "++" | "--");
    !postfix
}
