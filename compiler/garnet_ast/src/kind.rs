//! The closed set of syntax node tags.

/// Tag of a syntax node.
///
/// Tags are read in either spelling the external parser uses
/// (`op_asgn` or `op-asgn`). Anything outside the known set becomes
/// [`NodeKind::Unknown`] so the dispatcher can report it instead of
/// silently skipping it.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    Begin,
    Kwbegin,
    Class,
    Module,
    Sclass,
    Def,
    Defs,
    Args,
    Arg,
    Lvasgn,
    Ivasgn,
    Cvasgn,
    Gvasgn,
    Casgn,
    OpAsgn,
    OrAsgn,
    AndAsgn,
    Lvar,
    Ivar,
    Cvar,
    Gvar,
    Const,
    Cbase,
    SelfRef,
    Int,
    Float,
    Str,
    Dstr,
    Sym,
    True,
    False,
    Nil,
    Hash,
    Kwargs,
    Pair,
    Array,
    Send,
    If,
    While,
    Until,
    WhilePost,
    UntilPost,
    Break,
    Next,
    Return,
    And,
    Or,
    Not,
    Unknown(String),
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.replace('-', "_");
        match normalized.as_str() {
            "begin" => NodeKind::Begin,
            "kwbegin" => NodeKind::Kwbegin,
            "class" => NodeKind::Class,
            "module" => NodeKind::Module,
            "sclass" => NodeKind::Sclass,
            "def" => NodeKind::Def,
            "defs" => NodeKind::Defs,
            "args" => NodeKind::Args,
            "arg" => NodeKind::Arg,
            "lvasgn" => NodeKind::Lvasgn,
            "ivasgn" => NodeKind::Ivasgn,
            "cvasgn" => NodeKind::Cvasgn,
            "gvasgn" => NodeKind::Gvasgn,
            "casgn" => NodeKind::Casgn,
            "op_asgn" => NodeKind::OpAsgn,
            "or_asgn" => NodeKind::OrAsgn,
            "and_asgn" => NodeKind::AndAsgn,
            "lvar" => NodeKind::Lvar,
            "ivar" => NodeKind::Ivar,
            "cvar" => NodeKind::Cvar,
            "gvar" => NodeKind::Gvar,
            "const" => NodeKind::Const,
            "cbase" => NodeKind::Cbase,
            "self" => NodeKind::SelfRef,
            "int" => NodeKind::Int,
            "float" => NodeKind::Float,
            "str" => NodeKind::Str,
            "dstr" => NodeKind::Dstr,
            "sym" => NodeKind::Sym,
            "true" => NodeKind::True,
            "false" => NodeKind::False,
            "nil" => NodeKind::Nil,
            "hash" => NodeKind::Hash,
            "kwargs" => NodeKind::Kwargs,
            "pair" => NodeKind::Pair,
            "array" => NodeKind::Array,
            "send" => NodeKind::Send,
            "if" => NodeKind::If,
            "while" => NodeKind::While,
            "until" => NodeKind::Until,
            "while_post" => NodeKind::WhilePost,
            "until_post" => NodeKind::UntilPost,
            "break" => NodeKind::Break,
            "next" => NodeKind::Next,
            "return" => NodeKind::Return,
            "and" => NodeKind::And,
            "or" => NodeKind::Or,
            "not" => NodeKind::Not,
            _ => NodeKind::Unknown(tag.to_string()),
        }
    }

    /// Canonical tag spelling.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Begin => "begin",
            NodeKind::Kwbegin => "kwbegin",
            NodeKind::Class => "class",
            NodeKind::Module => "module",
            NodeKind::Sclass => "sclass",
            NodeKind::Def => "def",
            NodeKind::Defs => "defs",
            NodeKind::Args => "args",
            NodeKind::Arg => "arg",
            NodeKind::Lvasgn => "lvasgn",
            NodeKind::Ivasgn => "ivasgn",
            NodeKind::Cvasgn => "cvasgn",
            NodeKind::Gvasgn => "gvasgn",
            NodeKind::Casgn => "casgn",
            NodeKind::OpAsgn => "op_asgn",
            NodeKind::OrAsgn => "or_asgn",
            NodeKind::AndAsgn => "and_asgn",
            NodeKind::Lvar => "lvar",
            NodeKind::Ivar => "ivar",
            NodeKind::Cvar => "cvar",
            NodeKind::Gvar => "gvar",
            NodeKind::Const => "const",
            NodeKind::Cbase => "cbase",
            NodeKind::SelfRef => "self",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
            NodeKind::Str => "str",
            NodeKind::Dstr => "dstr",
            NodeKind::Sym => "sym",
            NodeKind::True => "true",
            NodeKind::False => "false",
            NodeKind::Nil => "nil",
            NodeKind::Hash => "hash",
            NodeKind::Kwargs => "kwargs",
            NodeKind::Pair => "pair",
            NodeKind::Array => "array",
            NodeKind::Send => "send",
            NodeKind::If => "if",
            NodeKind::While => "while",
            NodeKind::Until => "until",
            NodeKind::WhilePost => "while_post",
            NodeKind::UntilPost => "until_post",
            NodeKind::Break => "break",
            NodeKind::Next => "next",
            NodeKind::Return => "return",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Not => "not",
            NodeKind::Unknown(tag) => tag,
        }
    }
}
