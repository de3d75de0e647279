use crate::error::{Xerr, Xresult, Xresult1};
use crate::lex::Token;
use crate::opcodes::Xunit;
use crate::scope::Xscope;
use crate::state::State;

use std::rc::Rc;

pub type Xvec = rpds::Vector<Cell>;
pub type Xmap = rpds::RedBlackTreeMap<Cell, Cell>;
pub type Xstrmap = rpds::RedBlackTreeMap<Xstr, Cell>;
pub type Xstr = arcstr::ArcStr;
pub type XfnType = fn(&mut State) -> Xresult;
pub type Xint = i64;
pub type Xreal = f64;
pub type Xregex = Rc<regex::Regex>;

#[derive(Clone, Copy)]
pub struct XfnPtr(pub XfnType);

impl PartialEq for XfnPtr {
    fn eq(&self, other: &Self) -> bool {
        (self.0 as usize) == (other.0 as usize)
    }
}

#[derive(Clone, PartialEq)]
pub enum Xfn {
    // index into the function arena
    Interp(usize),
    Native(XfnPtr),
}

impl Xfn {
    pub(crate) fn addr(&self) -> (u8, usize) {
        match self {
            Xfn::Interp(i) => (0, *i),
            Xfn::Native(x) => (1, x.0 as usize),
        }
    }
}

/// Deferred block `{ ... }` together with the token that opened it and the
/// scope it was pushed in. Bare parameter names inside the block resolve
/// through that scope wherever the block runs.
pub struct Quotation {
    pub unit: Xunit,
    pub tok: Token,
    pub scope: Xscope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CellType {
    Nil,
    Flag,
    Int,
    Real,
    Str,
    Char,
    List,
    Dict,
    Quot,
    Fun,
    Regex,
    Type,
}

impl CellType {
    pub fn name(&self) -> &'static str {
        match self {
            CellType::Nil => "^nil",
            CellType::Flag => "^bool",
            CellType::Int => "^int",
            CellType::Real => "^float",
            CellType::Str => "^string",
            CellType::Char => "^char",
            CellType::List => "^list",
            CellType::Dict => "^dict",
            CellType::Quot => "^lambda",
            CellType::Fun => "^fun",
            CellType::Regex => "^regex",
            CellType::Type => "^type",
        }
    }
}

#[derive(Clone)]
pub enum Cell {
    Nil,
    Flag(bool),
    Int(Xint),
    Real(Xreal),
    Str(Xstr),
    Char(char),
    List(Xvec),
    Dict(Xmap),
    // string keyed dictionary, see `vars`
    StrDict(Xstrmap),
    Quot(Rc<Quotation>),
    Regex(Xregex),
    Type(CellType),
    Fun(Xfn),
}

use std::fmt;

impl fmt::Debug for XfnPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0 as usize)
    }
}

impl fmt::Debug for Xfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Xfn::Interp(x) => write!(f, "f:{:#x}", x),
            Xfn::Native(x) => write!(f, "xf:{:#x}", x.0 as usize),
        }
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Nil => write!(f, "nil"),
            Cell::Flag(x) => write!(f, "{}", if *x { "true" } else { "false" }),
            Cell::Int(n) => write!(f, "{}", n),
            Cell::Real(r) => write!(f, "{:?}", r),
            Cell::Str(s) => write!(f, "{:?}", s.as_str()),
            Cell::Char(c) => write!(f, "{:?}", c),
            Cell::List(v) => {
                f.write_str("[ ")?;
                for x in v.iter() {
                    x.fmt(f)?;
                    f.write_str(" ")?;
                }
                f.write_str("]")
            }
            Cell::Dict(m) => {
                f.write_str("{ ")?;
                for (k, v) in m.iter() {
                    write!(f, "{:?}: {:?} ", k, v)?;
                }
                f.write_str("}")
            }
            Cell::StrDict(m) => {
                f.write_str("{ ")?;
                for (k, v) in m.iter() {
                    write!(f, "{:?}: {:?} ", k.as_str(), v)?;
                }
                f.write_str("}")
            }
            Cell::Quot(q) => write!(f, "{{lambda {}:{}}}", q.tok.unit, q.tok.line),
            Cell::Regex(r) => write!(f, "r/{}/", r.as_str()),
            Cell::Type(t) => f.write_str(t.name()),
            Cell::Fun(x) => write!(f, "{:?}", x),
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        crate::compare::total_order(self, other) == std::cmp::Ordering::Equal
    }
}

use std::cmp::Ordering;

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Cell) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Cell) -> Ordering {
        crate::compare::total_order(self, other)
    }
}

impl Eq for Cell {}

fn cell_type_error(msg: &'static str, val: Cell) -> Xerr {
    Xerr::TypeErrorMsg { msg: Xstr::from(msg), val }
}

impl Cell {
    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::Nil => CellType::Nil,
            Cell::Flag(_) => CellType::Flag,
            Cell::Int(_) => CellType::Int,
            Cell::Real(_) => CellType::Real,
            Cell::Str(_) => CellType::Str,
            Cell::Char(_) => CellType::Char,
            Cell::List(_) => CellType::List,
            Cell::Dict(_) | Cell::StrDict(_) => CellType::Dict,
            Cell::Quot(_) => CellType::Quot,
            Cell::Fun(_) => CellType::Fun,
            Cell::Regex(_) => CellType::Regex,
            Cell::Type(_) => CellType::Type,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.cell_type().name()
    }

    pub fn is_invocable(&self) -> bool {
        match self {
            Cell::Quot(_) | Cell::Fun(_) => true,
            _ => false,
        }
    }

    pub fn is_number(&self) -> bool {
        match self {
            Cell::Int(_) | Cell::Real(_) => true,
            _ => false,
        }
    }

    pub fn flag(&self) -> Xresult1<bool> {
        match self {
            Cell::Flag(x) => Ok(*x),
            val => Err(cell_type_error("bool", val.clone())),
        }
    }

    pub fn to_int(&self) -> Xresult1<Xint> {
        match self {
            Cell::Int(x) => Ok(*x),
            Cell::Real(x) => Ok(x.trunc() as Xint),
            val => Err(cell_type_error("int", val.clone())),
        }
    }

    pub fn to_real(&self) -> Xresult1<Xreal> {
        match self {
            Cell::Real(x) => Ok(*x),
            Cell::Int(x) => Ok(*x as Xreal),
            val => Err(cell_type_error("float", val.clone())),
        }
    }

    pub fn to_usize(&self) -> Xresult1<usize> {
        match self {
            Cell::Int(i) if *i < 0 => Err(cell_type_error("positive integer", self.clone())),
            Cell::Int(i) => Ok(*i as usize),
            val => Err(cell_type_error("int", val.clone())),
        }
    }

    pub fn str(&self) -> Xresult1<&str> {
        match self {
            Cell::Str(x) => Ok(x.as_str()),
            val => Err(cell_type_error("string", val.clone())),
        }
    }

    pub fn to_xstr(&self) -> Xresult1<Xstr> {
        match self {
            Cell::Str(x) => Ok(x.clone()),
            val => Err(cell_type_error("string", val.clone())),
        }
    }

    pub fn vec(&self) -> Xresult1<&Xvec> {
        match self {
            Cell::List(x) => Ok(x),
            val => Err(cell_type_error("list", val.clone())),
        }
    }

    pub fn to_vec(&self) -> Xresult1<Xvec> {
        self.vec().map(|x| x.clone())
    }

    pub fn to_type(&self) -> Xresult1<CellType> {
        match self {
            Cell::Type(t) => Ok(*t),
            val => Err(cell_type_error("type", val.clone())),
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Cell::Str(s) => Some(s.chars().count()),
            Cell::List(v) => Some(v.len()),
            Cell::Dict(m) => Some(m.size()),
            Cell::StrDict(m) => Some(m.size()),
            _ => None,
        }
    }
}

impl From<usize> for Cell {
    fn from(x: usize) -> Self {
        Cell::Int(x as Xint)
    }
}

impl From<i32> for Cell {
    fn from(x: i32) -> Self {
        Cell::Int(x as Xint)
    }
}

impl From<i64> for Cell {
    fn from(x: i64) -> Self {
        Cell::Int(x)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Real(x)
    }
}

impl From<char> for Cell {
    fn from(x: char) -> Self {
        Cell::Char(x)
    }
}

impl From<bool> for Cell {
    fn from(x: bool) -> Self {
        if x {
            TRUE
        } else {
            FALSE
        }
    }
}

impl From<Xvec> for Cell {
    fn from(x: Xvec) -> Self {
        Cell::List(x)
    }
}

impl From<Xmap> for Cell {
    fn from(x: Xmap) -> Self {
        Cell::Dict(x)
    }
}

impl From<&str> for Cell {
    fn from(x: &str) -> Self {
        Cell::Str(Xstr::from(x))
    }
}

impl From<Xstr> for Cell {
    fn from(x: Xstr) -> Self {
        Cell::Str(x)
    }
}

impl From<String> for Cell {
    fn from(x: String) -> Self {
        Cell::Str(Xstr::from(x))
    }
}

impl From<CellType> for Cell {
    fn from(x: CellType) -> Self {
        Cell::Type(x)
    }
}

pub const ZERO: Cell = Cell::Int(0);
pub const ONE: Cell = Cell::Int(1);
pub const NIL: Cell = Cell::Nil;
pub const TRUE: Cell = Cell::Flag(true);
pub const FALSE: Cell = Cell::Flag(false);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_flag() {
        assert_ne!(Ok(true), ZERO.flag());
        assert!(NIL.flag().is_err());
        assert_eq!(Ok(true), TRUE.flag());
        assert_eq!(Ok(false), FALSE.flag());
    }

    #[test]
    fn test_cell_conversions() {
        assert_eq!(Ok(3), Cell::Real(3.9).to_int());
        assert_eq!(Ok(-3), Cell::Real(-3.9).to_int());
        assert_eq!(Ok(2.0), Cell::Int(2).to_real());
        assert!(Cell::Int(-1).to_usize().is_err());
        assert_eq!(Some(3), Cell::from("abc").len());
        assert_eq!(None, Cell::Int(1).len());
        assert_eq!("^list", Cell::from(Xvec::new()).type_name());
        assert_eq!("^dict", Cell::StrDict(Xstrmap::new()).type_name());
    }

    #[test]
    fn test_cell_debug() {
        let v = Xvec::new().push_back(ONE).push_back(Cell::from("s")).push_back(Cell::Real(1.0));
        assert_eq!("[ 1 \"s\" 1.0 ]", format!("{:?}", Cell::from(v)));
        assert_eq!("'x'", format!("{:?}", Cell::Char('x')));
        assert_eq!("^type", format!("{:?}", Cell::Type(CellType::Type)));
    }
}
