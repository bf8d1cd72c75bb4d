//! Statement tree handed from the C front end to the flowchart layout.
//!
//! Only the constructs the layout understands get their own variant; every
//! other statement is kept as [`Stmt::Unsupported`] so it can be skipped
//! without losing its position in the block.

#[derive(Debug, Clone, Default)]
pub struct TranslationUnit {
    pub functions: Vec<Function>,
}

impl TranslationUnit {
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|function| function.name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// Formatted declaration without the body, e.g. `int sum(int a, int b)`.
    pub signature: String,
    pub line: usize,
    pub body: Block,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub line: usize,
    pub stmts: Vec<Stmt>,
}

/// A leaf statement. `text` is the token-formatted statement, `raw` the exact
/// source slice; both still carry the trailing `;`.
#[derive(Debug, Clone)]
pub struct Simple {
    pub line: usize,
    pub text: String,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub line: usize,
    pub callee: String,
    pub text: String,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct If {
    pub line: usize,
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct Loop {
    pub line: usize,
    /// Statement header up to the body, e.g. `for (i = 0; i < n; i++)`.
    pub header: String,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Switch {
    pub line: usize,
    pub header: String,
    pub arms: Vec<SwitchArm>,
}

#[derive(Debug, Clone)]
pub struct SwitchArm {
    pub line: usize,
    /// `None` for `default:`.
    pub value: Option<Expr>,
    pub body: Vec<Stmt>,
}

impl SwitchArm {
    pub fn label(&self) -> String {
        match &self.value {
            Some(value) => format!("case {}:", value.to_label()),
            None => "default:".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    Decl(Simple),
    Assign(Simple),
    Return(Simple),
    Call(Call),
    If(If),
    For(Loop),
    While(Loop),
    Switch(Switch),
    Continue { line: usize },
    Unsupported { kind: String, line: usize },
}

impl Stmt {
    /// Branches, loops and switches, directly or as the statement of a
    /// block. Plain statements only ever occupy their own column.
    pub fn is_construct(&self) -> bool {
        match self {
            Stmt::If(_) | Stmt::For(_) | Stmt::While(_) | Stmt::Switch(_) => true,
            Stmt::Block(block) => block.stmts.iter().any(Stmt::is_construct),
            _ => false,
        }
    }

    /// `{ continue; }`, the early-exit idiom inside loop bodies.
    pub fn is_lone_continue(&self) -> bool {
        match self {
            Stmt::Block(block) => {
                block.stmts.len() == 1 && matches!(block.stmts[0], Stmt::Continue { .. })
            }
            _ => false,
        }
    }

    /// True when the statement, or the last statement of a block, is a
    /// conditional.
    pub fn ends_with_conditional(&self) -> bool {
        match self {
            Stmt::If(_) => true,
            Stmt::Block(block) => block
                .stmts
                .last()
                .map(Stmt::ends_with_conditional)
                .unwrap_or(false),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ident(String),
    Constant(String),
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// Anything else, kept as formatted source text.
    Other(String),
}

impl Expr {
    /// Condition label text: binary expressions are fully parenthesised.
    pub fn to_label(&self) -> String {
        match self {
            Expr::Binary { op, left, right } => {
                format!("({} {} {})", left.to_label(), op, right.to_label())
            }
            Expr::Ident(name) => name.clone(),
            Expr::Constant(value) => value.clone(),
            Expr::Index { base, index } => format!("{}[{}]", base.to_label(), index.to_label()),
            Expr::Other(text) => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn nested_binary_conditions_are_parenthesised() {
        let expr = Expr::Binary {
            op: "&&".to_string(),
            left: Box::new(Expr::Binary {
                op: ">".to_string(),
                left: ident("a"),
                right: Box::new(Expr::Constant("5".to_string())),
            }),
            right: Box::new(Expr::Index {
                base: ident("flags"),
                index: ident("i"),
            }),
        };
        assert_eq!(expr.to_label(), "((a > 5) && flags[i])");
    }

    #[test]
    fn lone_continue_block_is_detected() {
        let block = Stmt::Block(Block {
            line: 3,
            stmts: vec![Stmt::Continue { line: 3 }],
        });
        assert!(block.is_lone_continue());
        assert!(!Stmt::Continue { line: 3 }.is_lone_continue());
    }

    #[test]
    fn default_arm_label() {
        let arm = SwitchArm {
            line: 1,
            value: None,
            body: Vec::new(),
        };
        assert_eq!(arm.label(), "default:");
    }
}
