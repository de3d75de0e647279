use crate::cell::*;
use crate::compare::stringify;
use crate::error::*;
use crate::state::*;

pub fn load(xs: &mut State) -> Xresult {
    xs.defword("+", core_word_add)?;
    xs.defword("-", core_word_sub)?;
    xs.defword("*", core_word_mul)?;
    xs.defword("/", core_word_div)?;
    xs.defword("%", core_word_rem)?;
    xs.defword("neg", core_word_neg)?;
    xs.defword("abs", core_word_abs)?;
    xs.defword("random", core_word_random)?;
    xs.defword("int!", core_word_to_int)?;
    xs.defword("float!", core_word_to_float)?;
    xs.defword("string!", core_word_to_string)?;
    OK
}

// strings in arithmetic are read as numbers
fn numeric_operand(val: Cell) -> Xresult1<Cell> {
    match val {
        Cell::Int(_) | Cell::Real(_) => Ok(val),
        Cell::Str(s) => {
            let t = s.trim();
            if let Ok(i) = t.parse::<Xint>() {
                Ok(Cell::Int(i))
            } else if let Ok(r) = t.parse::<Xreal>() {
                Ok(Cell::Real(r))
            } else {
                Err(Xerr::TypeErrorMsg {
                    msg: Xstr::from("number"),
                    val: Cell::Str(s),
                })
            }
        }
        val => Err(Xerr::TypeErrorMsg {
            msg: Xstr::from("number"),
            val,
        }),
    }
}

fn arithmetic_ops_real(
    xs: &mut State,
    a: Cell,
    b: Cell,
    ops_int: fn(Xint, Xint) -> Option<Xint>,
    ops_real: fn(f64, f64) -> f64,
) -> Xresult {
    let a = numeric_operand(a)?;
    let b = numeric_operand(b)?;
    let c = match (a, b) {
        (Cell::Int(a), Cell::Int(b)) => Cell::Int(ops_int(a, b).ok_or(Xerr::DivisionByZero)?),
        (Cell::Int(a), Cell::Real(b)) => Cell::Real(ops_real(a as f64, b)),
        (Cell::Real(a), Cell::Int(b)) => Cell::Real(ops_real(a, b as f64)),
        (Cell::Real(a), Cell::Real(b)) => Cell::Real(ops_real(a, b)),
        _ => return Err(Xerr::InternalError),
    };
    xs.push_data(c)
}

fn pop_operands(xs: &mut State) -> Xresult1<(Cell, Cell)> {
    let b = xs.pop_data("operand2")?;
    let a = xs.pop_data("operand1")?;
    Ok((a, b))
}

pub fn core_word_add(xs: &mut State) -> Xresult {
    match pop_operands(xs)? {
        (Cell::Str(a), b) => {
            let s = format!("{}{}", a, stringify(&b));
            xs.push_data(Cell::from(s))
        }
        (Cell::List(a), b) => xs.push_data(Cell::from(a.push_back(b))),
        (a, b) => arithmetic_ops_real(xs, a, b, |a, b| Some(a.wrapping_add(b)), |a, b| a + b),
    }
}

pub fn core_word_sub(xs: &mut State) -> Xresult {
    let (a, b) = pop_operands(xs)?;
    arithmetic_ops_real(xs, a, b, |a, b| Some(a.wrapping_sub(b)), |a, b| a - b)
}

pub fn core_word_mul(xs: &mut State) -> Xresult {
    let (a, b) = pop_operands(xs)?;
    arithmetic_ops_real(xs, a, b, |a, b| Some(a.wrapping_mul(b)), |a, b| a * b)
}

fn check_divisor(b: &Cell) -> Xresult {
    match b {
        Cell::Int(0) => Err(Xerr::DivisionByZero),
        Cell::Real(r) if *r == 0.0 => Err(Xerr::DivisionByZero),
        _ => OK,
    }
}

// numeric strings reach the integer op without the divisor check
fn nonzero(b: Xint) -> Option<Xint> {
    if b == 0 {
        None
    } else {
        Some(b)
    }
}

pub fn core_word_div(xs: &mut State) -> Xresult {
    let (a, b) = pop_operands(xs)?;
    check_divisor(&b)?;
    arithmetic_ops_real(xs, a, b, |a, b| nonzero(b).map(|b| a.wrapping_div(b)), |a, b| a / b)
}

pub fn core_word_rem(xs: &mut State) -> Xresult {
    let (a, b) = pop_operands(xs)?;
    check_divisor(&b)?;
    arithmetic_ops_real(xs, a, b, |a, b| nonzero(b).map(|b| a.wrapping_rem(b)), |a, b| a % b)
}

fn core_word_neg(xs: &mut State) -> Xresult {
    match numeric_operand(xs.pop_data("value")?)? {
        Cell::Int(x) => xs.push_data(Cell::Int(x.wrapping_neg())),
        Cell::Real(x) => xs.push_data(Cell::Real(-x)),
        _ => Err(Xerr::InternalError),
    }
}

fn core_word_abs(xs: &mut State) -> Xresult {
    match numeric_operand(xs.pop_data("value")?)? {
        Cell::Int(x) => xs.push_data(Cell::Int(x.wrapping_abs())),
        Cell::Real(x) => xs.push_data(Cell::Real(x.abs())),
        _ => Err(Xerr::InternalError),
    }
}

fn random_u64() -> Xresult1<u64> {
    let mut buf = [0u8; 8];
    getrandom::getrandom(&mut buf).map_err(|e| Xerr::ArgumentError(Xstr::from(e.to_string())))?;
    Ok(u64::from_le_bytes(buf))
}

/// n random -> integer in [0, n)
fn core_word_random(xs: &mut State) -> Xresult {
    let n = xs.pop_data("limit")?.to_int()?;
    if n <= 0 {
        return Err(argument_error("random limit must be positive"));
    }
    let r = random_u64()? % (n as u64);
    xs.push_data(Cell::Int(r as Xint))
}

fn core_word_to_int(xs: &mut State) -> Xresult {
    let val = match xs.pop_data("value")? {
        Cell::Nil => ZERO,
        Cell::Flag(x) => Cell::Int(x as Xint),
        Cell::Char(c) => Cell::Int(c as Xint),
        Cell::Str(s) => {
            let t = s.trim();
            match t.parse::<Xint>() {
                Ok(i) => Cell::Int(i),
                Err(e) => return Err(Xerr::ArgumentError(Xstr::from(format!("{:?}: {}", t, e)))),
            }
        }
        val => Cell::Int(val.to_int()?),
    };
    xs.push_data(val)
}

fn core_word_to_float(xs: &mut State) -> Xresult {
    let val = match xs.pop_data("value")? {
        Cell::Nil => Cell::Real(0.0),
        Cell::Str(s) => {
            let t = s.trim();
            match t.parse::<Xreal>() {
                Ok(r) => Cell::Real(r),
                Err(e) => return Err(Xerr::ArgumentError(Xstr::from(format!("{:?}: {}", t, e)))),
            }
        }
        val => Cell::Real(val.to_real()?),
    };
    xs.push_data(val)
}

fn core_word_to_string(xs: &mut State) -> Xresult {
    let val = xs.pop_data("value")?;
    xs.push_data(Cell::from(stringify(&val)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arith() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        xs.interpret("5 4 -").unwrap();
        assert_eq!(Ok(Cell::Int(1)), xs.pop_data("x"));
        xs.interpret("4 5 *").unwrap();
        assert_eq!(Ok(Cell::Int(20)), xs.pop_data("x"));
        xs.interpret("-7 2 /").unwrap();
        assert_eq!(Ok(Cell::Int(-3)), xs.pop_data("x"));
        xs.interpret("-7 2 %").unwrap();
        assert_eq!(Ok(Cell::Int(-1)), xs.pop_data("x"));
        xs.interpret("1 0.5 +").unwrap();
        assert_eq!(Ok(Cell::Real(1.5)), xs.pop_data("x"));
        xs.interpret("7.0 2 /").unwrap();
        assert_eq!(Ok(Cell::Real(3.5)), xs.pop_data("x"));
        xs.interpret("10 \"5\" -").unwrap();
        assert_eq!(Ok(Cell::Int(5)), xs.pop_data("x"));
        assert_eq!(Err(Xerr::StackUnderflow(Xstr::from("operand1"))), xs.interpret("1 +"));
        assert_eq!(Err(Xerr::StackUnderflow(Xstr::from("operand2"))), xs.interpret("+"));
        assert_eq!(Err(Xerr::DivisionByZero), xs.interpret("1 0 /"));
        assert_eq!(Err(Xerr::DivisionByZero), xs.interpret("1 0.0 %"));
        assert!(matches!(xs.interpret("1 true *"), Err(Xerr::TypeErrorMsg { .. })));
    }

    #[test]
    fn test_division_wraps() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        xs.interpret("-9223372036854775807 1 - -1 /").unwrap();
        assert_eq!(Ok(Cell::Int(Xint::MIN)), xs.pop_data("x"));
        xs.interpret("-9223372036854775807 1 - -1 %").unwrap();
        assert_eq!(Ok(ZERO), xs.pop_data("x"));
        assert_eq!(Err(Xerr::DivisionByZero), xs.interpret("7 \"0\" /"));
        assert_eq!(Err(Xerr::DivisionByZero), xs.interpret("7 0 %"));
    }

    #[test]
    fn test_concat() {
        let mut xs = State::boot().unwrap();
        xs.interpret("\"a\" \"b\" + 1 + [ 2 ] +").unwrap();
        assert_eq!(Ok(Cell::from("ab1[2]")), xs.pop_data("x"));
        xs.interpret("[ 1 ] 2 +").unwrap();
        let v: Xvec = [1, 2].iter().map(|x| Cell::Int(*x)).collect();
        assert_eq!(Ok(Cell::from(v)), xs.pop_data("x"));
    }

    #[test]
    fn test_unary() {
        let mut xs = State::boot().unwrap();
        xs.interpret("5 neg -2.5 abs").unwrap();
        assert_eq!(Ok(Cell::Real(2.5)), xs.pop_data("x"));
        assert_eq!(Ok(Cell::Int(-5)), xs.pop_data("x"));
        xs.interpret("10 random").unwrap();
        let r = xs.pop_data("x").unwrap().to_int().unwrap();
        assert!((0..10).contains(&r));
        xs.capture_stdout();
        assert!(xs.interpret("0 random").is_err());
    }

    #[test]
    fn test_conversions() {
        let mut xs = State::boot().unwrap();
        xs.interpret("-3.9 int! \" 42 \" int! 'a' int! nil int!").unwrap();
        assert_eq!(Ok(ZERO), xs.pop_data("x"));
        assert_eq!(Ok(Cell::Int(97)), xs.pop_data("x"));
        assert_eq!(Ok(Cell::Int(42)), xs.pop_data("x"));
        assert_eq!(Ok(Cell::Int(-3)), xs.pop_data("x"));
        xs.interpret("3 float! \"2.5\" float!").unwrap();
        assert_eq!(Ok(Cell::Real(2.5)), xs.pop_data("x"));
        assert_eq!(Ok(Cell::Real(3.0)), xs.pop_data("x"));
        xs.interpret("[ 1 \"a\" ] string! 1.0 string!").unwrap();
        assert_eq!(Ok(Cell::from("1.0")), xs.pop_data("x"));
        assert_eq!(Ok(Cell::from("[1 a]")), xs.pop_data("x"));
        xs.capture_stdout();
        assert!(matches!(xs.interpret("\"x1\" int!"), Err(Xerr::ArgumentError(_))));
    }
}
