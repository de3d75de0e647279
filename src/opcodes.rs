use crate::cell::*;
use crate::lex::Token;

use std::rc::Rc;

#[derive(Clone)]
pub enum Opcode {
    Literal(Cell),
    // { ... }, closed over the scope when pushed
    Block(Xunit),
    // !x
    SetVar(Xstr),
    // @x $x
    GetVar(Xstr),
    // &x
    Dynamic(Xstr),
    // -> x
    Bind(Xstr),
    // bare parameter or local name
    Local(Xstr),
    Call(usize),
    NativeCall(XfnPtr),
    ListBegin,
    ListEnd,
    Quit,
}

/// Compiled operation and the token it came from.
#[derive(Clone)]
pub struct Op {
    pub code: Opcode,
    pub tok: Token,
}

pub type Xunit = Rc<Vec<Op>>;

use std::fmt;

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(val) => write!(f, "Literal({:?})", val),
            Self::Block(unit) => write!(f, "Block({})", unit.len()),
            Self::SetVar(name) => write!(f, "SetVar({})", name),
            Self::GetVar(name) => write!(f, "GetVar({})", name),
            Self::Dynamic(name) => write!(f, "Dynamic({})", name),
            Self::Bind(name) => write!(f, "Bind({})", name),
            Self::Local(name) => write!(f, "Local({})", name),
            Self::Call(a) => write!(f, "Call({})", a),
            Self::NativeCall(x) => write!(f, "NativeCall({:?})", x),
            Self::ListBegin => write!(f, "ListBegin"),
            Self::ListEnd => write!(f, "ListEnd"),
            Self::Quit => write!(f, "Quit"),
        }
    }
}

impl PartialEq for Opcode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Block(a), Self::Block(b)) => Rc::ptr_eq(a, b),
            (Self::SetVar(a), Self::SetVar(b)) => a == b,
            (Self::GetVar(a), Self::GetVar(b)) => a == b,
            (Self::Dynamic(a), Self::Dynamic(b)) => a == b,
            (Self::Bind(a), Self::Bind(b)) => a == b,
            (Self::Local(a), Self::Local(b)) => a == b,
            (Self::Call(a), Self::Call(b)) => a == b,
            (Self::NativeCall(a), Self::NativeCall(b)) => a == b,
            (Self::ListBegin, Self::ListBegin) => true,
            (Self::ListEnd, Self::ListEnd) => true,
            (Self::Quit, Self::Quit) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} # {:?}", self.code, self.tok)
    }
}
