use crate::cell::*;
use crate::error::*;

use std::cmp::Ordering;
use std::fmt::Write;

fn real_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

fn parse_number(s: &str) -> Option<Cell> {
    let s = s.trim();
    if let Ok(i) = s.parse::<Xint>() {
        Some(Cell::Int(i))
    } else {
        s.parse::<Xreal>().ok().map(Cell::Real)
    }
}

fn numeric_cmp(a: &Cell, b: &Cell) -> Option<Ordering> {
    match (a, b) {
        (Cell::Int(x), Cell::Int(y)) => Some(x.cmp(y)),
        (Cell::Int(x), Cell::Real(y)) => Some(real_cmp(*x as f64, *y)),
        (Cell::Real(x), Cell::Int(y)) => Some(real_cmp(*x, *y as f64)),
        (Cell::Real(x), Cell::Real(y)) => Some(real_cmp(*x, *y)),
        _ => None,
    }
}

/// Language level ordering of two values.
///
/// Nil sorts below everything else. A type tag on either side turns the
/// comparison into a type test that answers Equal or Greater. Otherwise the
/// first operand decides the coercion: numbers coerce strings to numbers,
/// strings stringify the other side, lists compare by length first and then
/// element by element.
pub fn compare(a: &Cell, b: &Cell) -> Xresult1<Ordering> {
    let type_test = |t: &CellType, other: &Cell| {
        if other.cell_type() == *t {
            Ordering::Equal
        } else {
            Ordering::Greater
        }
    };
    match (a, b) {
        (Cell::Nil, Cell::Nil) => Ok(Ordering::Equal),
        (Cell::Nil, _) => Ok(Ordering::Less),
        (_, Cell::Nil) => Ok(Ordering::Greater),
        (Cell::Type(x), Cell::Type(y)) => Ok(if x == y {
            Ordering::Equal
        } else {
            Ordering::Greater
        }),
        (Cell::Type(t), other) | (other, Cell::Type(t)) => Ok(type_test(t, other)),
        (Cell::Int(_), Cell::Int(_))
        | (Cell::Int(_), Cell::Real(_))
        | (Cell::Real(_), Cell::Int(_))
        | (Cell::Real(_), Cell::Real(_)) => numeric_cmp(a, b).ok_or(Xerr::InternalError),
        (Cell::Int(_), Cell::Str(s)) | (Cell::Real(_), Cell::Str(s)) => parse_number(s)
            .and_then(|n| numeric_cmp(a, &n))
            .ok_or_else(|| Xerr::ComparisonError(a.clone(), b.clone())),
        (Cell::Str(x), Cell::Str(y)) => Ok(x.as_str().cmp(y.as_str())),
        (Cell::Str(x), other) => Ok(x.as_str().cmp(stringify(other).as_str())),
        (Cell::List(x), Cell::List(y)) => {
            if x.len() != y.len() {
                return Ok(x.len().cmp(&y.len()));
            }
            for (i, j) in x.iter().zip(y.iter()) {
                let ord = compare(i, j)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(Ordering::Equal)
        }
        (Cell::Flag(_), Cell::Flag(_))
        | (Cell::Char(_), Cell::Char(_))
        | (Cell::Dict(_), Cell::Dict(_))
        | (Cell::StrDict(_), Cell::StrDict(_))
        | (Cell::Regex(_), Cell::Regex(_))
        | (Cell::Quot(_), Cell::Quot(_))
        | (Cell::Fun(_), Cell::Fun(_)) => Ok(total_order(a, b)),
        _ => Err(Xerr::ComparisonError(a.clone(), b.clone())),
    }
}

pub fn truthy(val: &Cell) -> Xresult1<bool> {
    match val {
        Cell::Nil => Ok(false),
        Cell::Flag(x) => Ok(*x),
        Cell::Int(i) => Ok(*i != 0),
        Cell::Real(r) => Ok(*r != 0.0),
        Cell::Str(s) => Ok(!s.is_empty()),
        Cell::List(v) => Ok(!v.is_empty()),
        Cell::Dict(m) => Ok(!m.is_empty()),
        Cell::StrDict(m) => Ok(!m.is_empty()),
        val => Err(Xerr::TypeErrorMsg {
            msg: Xstr::from("a value with truthiness"),
            val: val.clone(),
        }),
    }
}

fn stringify_into(buf: &mut String, val: &Cell) {
    match val {
        Cell::Nil => (),
        Cell::Str(s) => buf.push_str(s),
        Cell::Char(c) => buf.push(*c),
        Cell::List(v) => {
            buf.push('[');
            for (i, x) in v.iter().enumerate() {
                if i > 0 {
                    buf.push(' ');
                }
                stringify_into(buf, x);
            }
            buf.push(']');
        }
        Cell::Dict(m) => {
            buf.push_str("map[");
            for (i, (k, v)) in m.iter().enumerate() {
                if i > 0 {
                    buf.push(' ');
                }
                stringify_into(buf, k);
                buf.push(':');
                stringify_into(buf, v);
            }
            buf.push(']');
        }
        Cell::StrDict(m) => {
            buf.push_str("map[");
            for (i, (k, v)) in m.iter().enumerate() {
                if i > 0 {
                    buf.push(' ');
                }
                buf.push_str(k);
                buf.push(':');
                stringify_into(buf, v);
            }
            buf.push(']');
        }
        val => {
            let _ = write!(buf, "{:?}", val);
        }
    }
}

/// Text of a value as `print` and string concatenation see it.
pub fn stringify(val: &Cell) -> String {
    let mut buf = String::new();
    stringify_into(&mut buf, val);
    buf
}

fn rank(val: &Cell) -> u8 {
    match val {
        Cell::Nil => 0,
        Cell::Flag(_) => 1,
        Cell::Int(_) => 2,
        Cell::Real(_) => 3,
        Cell::Char(_) => 4,
        Cell::Str(_) => 5,
        Cell::List(_) => 6,
        Cell::Dict(_) => 7,
        Cell::StrDict(_) => 8,
        Cell::Regex(_) => 9,
        Cell::Type(_) => 10,
        Cell::Quot(_) => 11,
        Cell::Fun(_) => 12,
    }
}

/// Structural total order used for dictionary keys and `Eq`.
pub fn total_order(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Nil, Cell::Nil) => Ordering::Equal,
        (Cell::Flag(x), Cell::Flag(y)) => x.cmp(y),
        (Cell::Int(x), Cell::Int(y)) => x.cmp(y),
        (Cell::Real(x), Cell::Real(y)) => x.total_cmp(y),
        (Cell::Char(x), Cell::Char(y)) => x.cmp(y),
        (Cell::Str(x), Cell::Str(y)) => x.as_str().cmp(y.as_str()),
        (Cell::List(x), Cell::List(y)) => x.iter().cmp(y.iter()),
        (Cell::Dict(x), Cell::Dict(y)) => x.iter().cmp(y.iter()),
        (Cell::StrDict(x), Cell::StrDict(y)) => x.iter().cmp(y.iter()),
        (Cell::Regex(x), Cell::Regex(y)) => x.as_str().cmp(y.as_str()),
        (Cell::Type(x), Cell::Type(y)) => x.cmp(y),
        (Cell::Quot(x), Cell::Quot(y)) => {
            (std::rc::Rc::as_ptr(x) as usize).cmp(&(std::rc::Rc::as_ptr(y) as usize))
        }
        (Cell::Fun(x), Cell::Fun(y)) => x.addr().cmp(&y.addr()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn real_key(val: &Cell) -> f64 {
    match val {
        Cell::Int(i) => *i as f64,
        Cell::Real(r) => *r,
        _ => 0.0,
    }
}

/// Total order for sorting. Numbers compare by value across int and float,
/// lists by length and then element by element, anything else structurally.
pub fn sort_order(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Int(x), Cell::Int(y)) => x.cmp(y),
        (Cell::Int(_), Cell::Real(_)) | (Cell::Real(_), Cell::Int(_)) | (Cell::Real(_), Cell::Real(_)) => {
            real_key(a)
                .total_cmp(&real_key(b))
                .then_with(|| total_order(a, b))
        }
        (Cell::List(x), Cell::List(y)) => x.len().cmp(&y.len()).then_with(|| {
            x.iter()
                .zip(y.iter())
                .map(|(i, j)| sort_order(i, j))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }),
        _ => total_order(a, b),
    }
}

/// Values that can be sorted together without coercion. Nil goes with
/// anything.
pub fn sortable_together(a: &Cell, b: &Cell) -> bool {
    match (a, b) {
        (Cell::Nil, _) | (_, Cell::Nil) => true,
        _ => (a.is_number() && b.is_number()) || a.cell_type() == b.cell_type(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[Cell]) -> Cell {
        Cell::from(items.iter().cloned().collect::<Xvec>())
    }

    #[test]
    fn test_compare_reflexive() {
        let regex = Cell::Regex(std::rc::Rc::new(regex::Regex::new("a+").unwrap()));
        let dict = Cell::from(Xmap::new().insert(ONE, Cell::from("x")));
        let values = [
            NIL,
            TRUE,
            Cell::Int(-4),
            Cell::Real(2.5),
            Cell::Real(f64::NAN),
            Cell::from("abc"),
            Cell::Char('z'),
            list(&[ONE, Cell::from("x")]),
            dict,
            regex,
            Cell::Type(CellType::Int),
            Cell::Fun(Xfn::Interp(3)),
        ];
        for v in values.iter() {
            assert_eq!(Ok(Ordering::Equal), compare(v, v), "{:?}", v);
        }
    }

    #[test]
    fn test_compare_nil() {
        assert_eq!(Ok(Ordering::Less), compare(&NIL, &ZERO));
        assert_eq!(Ok(Ordering::Greater), compare(&ZERO, &NIL));
        assert_eq!(Ok(Ordering::Greater), compare(&Cell::from(""), &NIL));
    }

    #[test]
    fn test_compare_numbers() {
        assert_eq!(Ok(Ordering::Less), compare(&Cell::Int(1), &Cell::Int(2)));
        assert_eq!(Ok(Ordering::Equal), compare(&Cell::Int(2), &Cell::Real(2.0)));
        assert_eq!(Ok(Ordering::Greater), compare(&Cell::Real(2.5), &Cell::Int(2)));
        assert_eq!(Ok(Ordering::Equal), compare(&Cell::Int(10), &Cell::from("10")));
        assert_eq!(Ok(Ordering::Less), compare(&Cell::Int(10), &Cell::from("10.5")));
        assert!(compare(&Cell::Int(10), &Cell::from("ten")).is_err());
        assert!(compare(&Cell::Int(10), &TRUE).is_err());
    }

    #[test]
    fn test_compare_strings() {
        assert_eq!(Ok(Ordering::Less), compare(&Cell::from("abc"), &Cell::from("abd")));
        assert_eq!(Ok(Ordering::Equal), compare(&Cell::from("12"), &Cell::Int(12)));
        assert_eq!(Ok(Ordering::Equal), compare(&Cell::from("true"), &TRUE));
    }

    #[test]
    fn test_compare_lists() {
        let a = list(&[ONE, Cell::Int(2)]);
        let b = list(&[ONE, Cell::Int(2), Cell::Int(3)]);
        assert_eq!(Ok(Ordering::Less), compare(&a, &b));
        assert_eq!(Ok(Ordering::Greater), compare(&b, &a));
        let c = list(&[ONE, Cell::Int(3)]);
        assert_eq!(Ok(Ordering::Less), compare(&a, &c));
        assert!(compare(&a, &ONE).is_err());
    }

    #[test]
    fn test_compare_types() {
        let t = Cell::Type(CellType::Int);
        assert_eq!(Ok(Ordering::Equal), compare(&t, &ONE));
        assert_eq!(Ok(Ordering::Equal), compare(&ONE, &t));
        assert_eq!(Ok(Ordering::Greater), compare(&t, &Cell::from("1")));
        assert_eq!(Ok(Ordering::Greater), compare(&t, &Cell::Type(CellType::Str)));
    }

    #[test]
    fn test_truthy() {
        assert_eq!(Ok(false), truthy(&NIL));
        assert_eq!(Ok(false), truthy(&ZERO));
        assert_eq!(Ok(true), truthy(&Cell::Real(0.5)));
        assert_eq!(Ok(false), truthy(&Cell::from("")));
        assert_eq!(Ok(true), truthy(&list(&[NIL])));
        assert_eq!(Ok(false), truthy(&Cell::from(Xvec::new())));
        assert!(truthy(&Cell::Char('a')).is_err());
    }

    #[test]
    fn test_stringify() {
        assert_eq!("", stringify(&NIL));
        assert_eq!("abc", stringify(&Cell::from("abc")));
        assert_eq!("2.5", stringify(&Cell::Real(2.5)));
        assert_eq!("[1 a [true]]", stringify(&list(&[ONE, Cell::from("a"), list(&[TRUE])])));
    }
}
