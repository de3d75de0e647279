pub mod arith;
pub mod cell;
pub mod combinators;
pub mod compare;
mod compiler;
pub mod control;
pub mod debug;
pub mod error;
pub mod file;
pub mod istype;
pub mod lex;
pub mod list;
mod opcodes;
#[cfg(feature = "stdio")]
pub mod repl;
pub mod scope;
pub mod state;
pub mod strings;

pub mod prelude {
    pub type Xstate = crate::state::State;
    pub type Xcell = crate::cell::Cell;
    pub use crate::error::{Xerr, Xresult};
}
