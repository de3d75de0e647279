use crate::cell::{Cell, Xstr};

use std::fmt;

#[derive(PartialEq, Clone)]
pub enum Xerr {
    // tokenizer
    LexError(Xstr),
    // compiler
    CompileError(Xstr),
    UnknownWord(Xstr),
    ExpectingName,
    // runtime
    StackUnderflow(Xstr),
    StackOverflow(usize),
    CallStackOverflow(usize),
    UnbalancedList,
    UnresolvedVariable(Xstr),
    TypeError,
    TypeErrorMsg { msg: Xstr, val: Cell },
    ComparisonError(Cell, Cell),
    ExpectingBlock(Cell),
    ArgumentError(Xstr),
    DivisionByZero,
    OutOfBounds,
    IOError { filename: Xstr, reason: Xstr },
    InternalError,
    // step debugger asked to stop
    Aborted,
    // stop interpreter execution without a diagnostic
    Quit,
}

impl fmt::Debug for Xerr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Xerr::LexError(msg) => write!(f, "lexical error: {}", msg),
            Xerr::CompileError(msg) => write!(f, "compile error: {}", msg),
            Xerr::UnknownWord(s) => write!(f, "unknown word {}", s),
            Xerr::ExpectingName => f.write_str("expecting a name"),
            Xerr::StackUnderflow(tag) => write!(f, "popping value '{}': stack is empty", tag),
            Xerr::StackOverflow(cap) => write!(f, "stack overflow, capacity is {}, stack was reset", cap),
            Xerr::CallStackOverflow(n) => write!(f, "call stack is deeper than {} frames", n),
            Xerr::UnbalancedList => f.write_str("list end without a matching list start"),
            Xerr::UnresolvedVariable(name) => write!(f, "unresolved variable '{}'", name),
            Xerr::TypeError => f.write_str("TypeError"),
            Xerr::TypeErrorMsg { msg, val } => write!(f, "expecting {}, got {:?}", msg, val),
            Xerr::ComparisonError(a, b) => write!(f, "can't compare {:?} and {:?}", a, b),
            Xerr::ExpectingBlock(val) => write!(f, "expecting a block or function, got {:?}", val),
            Xerr::ArgumentError(msg) => f.write_str(msg),
            Xerr::DivisionByZero => f.write_str("division by zero"),
            Xerr::OutOfBounds => f.write_str("OutOfBounds"),
            Xerr::IOError { filename, reason } => write!(f, "{}: {}", filename, reason),
            Xerr::InternalError => f.write_str("InternalError"),
            Xerr::Aborted => f.write_str("execution aborted"),
            Xerr::Quit => f.write_str("quit"),
        }
    }
}

pub type Xresult = Xresult1<()>;

pub type Xresult1<T> = Result<T, Xerr>;

pub const OK: Xresult = Ok(());

pub(crate) fn argument_error(msg: &str) -> Xerr {
    Xerr::ArgumentError(Xstr::from(msg))
}
