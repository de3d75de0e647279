use crate::cell::*;
use crate::compare::*;
use crate::error::*;
use crate::state::*;

use std::cmp::Ordering;

pub fn load(xs: &mut State) -> Xresult {
    xs.defword("=", |xs| compare_with(xs, |o| o == Ordering::Equal))?;
    xs.defword("==", |xs| compare_with(xs, |o| o == Ordering::Equal))?;
    xs.defword("!=", |xs| compare_with(xs, |o| o != Ordering::Equal))?;
    xs.defword("<", |xs| compare_with(xs, |o| o == Ordering::Less))?;
    xs.defword(">", |xs| compare_with(xs, |o| o == Ordering::Greater))?;
    xs.defword("<=", |xs| compare_with(xs, |o| o != Ordering::Greater))?;
    xs.defword(">=", |xs| compare_with(xs, |o| o != Ordering::Less))?;
    xs.defword("compare", core_word_compare)?;
    xs.defword("and", core_word_and)?;
    xs.defword("or", core_word_or)?;
    xs.defword("not?", core_word_not)?;
    xs.defword("true?", core_word_is_true)?;
    xs.defword("false?", core_word_is_false)?;
    xs.defword("nil?", core_word_is_nil)?;
    xs.defword("true!", |xs| replace_top(xs, TRUE))?;
    xs.defword("false!", |xs| replace_top(xs, FALSE))?;
    xs.defword("if", core_word_if)?;
    xs.defword("ifte", core_word_ifte)?;
    xs.defword("while", core_word_while)?;
    xs.defword("repeat", core_word_repeat)?;
    xs.defword("case", core_word_case)?;
    xs.defword("dip", core_word_dip)?;
    xs.defword("apply2", core_word_apply2)?;
    xs.defword("apply3", core_word_apply3)?;
    xs.defword("cleave", core_word_cleave)?;
    OK
}

fn compare_operands(xs: &mut State) -> Xresult1<Ordering> {
    let b = xs.pop_data("operand2")?;
    let a = xs.pop_data("operand1")?;
    compare(&a, &b)
}

fn compare_with(xs: &mut State, pred: fn(Ordering) -> bool) -> Xresult {
    let ord = compare_operands(xs)?;
    xs.push_data(Cell::from(pred(ord)))
}

fn core_word_compare(xs: &mut State) -> Xresult {
    let n = match compare_operands(xs)? {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    };
    xs.push_data(Cell::Int(n))
}

fn core_word_and(xs: &mut State) -> Xresult {
    let b = xs.pop_data("operand2")?;
    let a = xs.pop_data("operand1")?;
    let res = truthy(&a)? && truthy(&b)?;
    xs.push_data(Cell::from(res))
}

fn core_word_or(xs: &mut State) -> Xresult {
    let b = xs.pop_data("operand2")?;
    let a = xs.pop_data("operand1")?;
    let res = truthy(&a)? || truthy(&b)?;
    xs.push_data(Cell::from(res))
}

// values without truthiness are never "not"
fn core_word_not(xs: &mut State) -> Xresult {
    let val = xs.pop_data("value")?;
    let res = truthy(&val).map(|t| !t).unwrap_or(false);
    xs.push_data(Cell::from(res))
}

fn core_word_is_true(xs: &mut State) -> Xresult {
    let val = xs.pop_data("value")?;
    let res = truthy(&val)?;
    xs.push_data(Cell::from(res))
}

fn core_word_is_false(xs: &mut State) -> Xresult {
    let val = xs.pop_data("value")?;
    let res = !truthy(&val)?;
    xs.push_data(Cell::from(res))
}

fn core_word_is_nil(xs: &mut State) -> Xresult {
    let res = matches!(xs.pop_data("value")?, Cell::Nil);
    xs.push_data(Cell::from(res))
}

fn replace_top(xs: &mut State, val: Cell) -> Xresult {
    xs.pop_data("value")?;
    xs.push_data(val)
}

/// cond {then} if
fn core_word_if(xs: &mut State) -> Xresult {
    let body = xs.pop_block("thenPart")?;
    let cond = xs.pop_data("condVal")?;
    if truthy(&cond)? {
        xs.invoke(&body)?;
    }
    OK
}

/// cond {then} {else} ifte
fn core_word_ifte(xs: &mut State) -> Xresult {
    let else_part = xs.pop_block("elsePart")?;
    let then_part = xs.pop_block("thenPart")?;
    let cond = xs.pop_data("condVal")?;
    if truthy(&cond)? {
        xs.invoke(&then_part)
    } else {
        xs.invoke(&else_part)
    }
}

/// {cond} {body} while
fn core_word_while(xs: &mut State) -> Xresult {
    let body = xs.pop_block("bodyProgram")?;
    let cond = xs.pop_block("condProgram")?;
    loop {
        xs.invoke(&cond)?;
        let r = xs.pop_data("condResult")?;
        if !truthy(&r)? {
            break;
        }
        xs.invoke(&body)?;
    }
    OK
}

/// n {body} repeat, the loop index is bound to `_` while the body runs.
fn core_word_repeat(xs: &mut State) -> Xresult {
    let body = xs.pop_block("program")?;
    let n = xs.pop_data("itercount")?.to_int()?;
    let scope = xs.block_scope(&body);
    let saved = scope.lookup("_");
    for i in 0..n.max(0) {
        scope.bind(Xstr::from("_"), Cell::Int(i));
        xs.invoke(&body)?;
    }
    if let Some(old) = saved {
        scope.bind(Xstr::from("_"), old);
    }
    OK
}

fn case_matches(xs: &mut State, pattern: &Cell, val: &Cell) -> Xresult1<bool> {
    match pattern {
        p if p.is_invocable() => {
            xs.push_data(val.clone())?;
            xs.invoke(p)?;
            let r = xs.pop_data("testResult")?;
            truthy(&r)
        }
        Cell::Regex(re) => Ok(re.is_match(&stringify(val))),
        Cell::Type(t) => Ok(val.cell_type() == *t),
        p => Ok(compare(p, val).map(|o| o == Ordering::Equal).unwrap_or(false)),
    }
}

/// val [ pattern result ... ] case
///
/// The first matching pattern selects its result, a block result is run
/// with the value on the stack, any other result is pushed as is.
fn core_word_case(xs: &mut State) -> Xresult {
    let patterns = xs.pop_data("pattern")?.to_vec()?;
    let val = xs.pop_data("valToMatch")?;
    let items: Vec<Cell> = patterns.iter().cloned().collect();
    for pair in items.chunks(2) {
        if let [pattern, result] = pair {
            if case_matches(xs, pattern, &val)? {
                if result.is_invocable() {
                    xs.push_data(val)?;
                    return xs.invoke(result);
                }
                return xs.push_data(result.clone());
            }
        }
    }
    OK
}

/// x {p} dip
fn core_word_dip(xs: &mut State) -> Xresult {
    let prog = xs.pop_block("program")?;
    let val = xs.pop_data("value")?;
    xs.invoke(&prog)?;
    xs.push_data(val)
}

/// a b {p} apply2
fn core_word_apply2(xs: &mut State) -> Xresult {
    let prog = xs.pop_block("program")?;
    let b = xs.pop_data("secondVal")?;
    xs.invoke(&prog)?;
    xs.push_data(b)?;
    xs.invoke(&prog)
}

/// a b c {p} apply3
fn core_word_apply3(xs: &mut State) -> Xresult {
    let prog = xs.pop_block("program")?;
    let c = xs.pop_data("thirdVal")?;
    let b = xs.pop_data("secondVal")?;
    xs.invoke(&prog)?;
    xs.push_data(b)?;
    xs.invoke(&prog)?;
    xs.push_data(c)?;
    xs.invoke(&prog)
}

/// x {p1} {p2} cleave
fn core_word_cleave(xs: &mut State) -> Xresult {
    let p2 = xs.pop_block("prog2")?;
    let p1 = xs.pop_block("prog1")?;
    let val = xs.pop_data("value")?;
    xs.push_data(val.clone())?;
    xs.invoke(&p1)?;
    xs.push_data(val)?;
    xs.invoke(&p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pop_int(xs: &mut State) -> Xint {
        xs.pop_data("x").unwrap().to_int().unwrap()
    }

    #[test]
    fn test_comparison_words() {
        let mut xs = State::boot().unwrap();
        xs.interpret("1 2 < 2 2 <= 3 2 > 1 1.0 = \"a\" \"b\" != nil 0 >=").unwrap();
        assert_eq!(Ok(FALSE), xs.pop_data("x"));
        for _ in 0..5 {
            assert_eq!(Ok(TRUE), xs.pop_data("x"));
        }
        xs.interpret("1 2 compare 2 2 compare [ 1 2 3 ] [ 1 2 ] compare").unwrap();
        assert_eq!(1, pop_int(&mut xs));
        assert_eq!(0, pop_int(&mut xs));
        assert_eq!(-1, pop_int(&mut xs));
        xs.capture_stdout();
        let res = xs.interpret("1 \"x\" <");
        assert!(matches!(res, Err(Xerr::ComparisonError(_, _))));
    }

    #[test]
    fn test_logic() {
        let mut xs = State::boot().unwrap();
        xs.interpret("1 \"\" and 1 \"\" or [ ] not? 0 true? nil false? nil nil? 5 true!").unwrap();
        assert_eq!(Ok(TRUE), xs.pop_data("x"));
        assert_eq!(Ok(TRUE), xs.pop_data("x"));
        assert_eq!(Ok(TRUE), xs.pop_data("x"));
        assert_eq!(Ok(FALSE), xs.pop_data("x"));
        assert_eq!(Ok(TRUE), xs.pop_data("x"));
        assert_eq!(Ok(TRUE), xs.pop_data("x"));
        assert_eq!(Ok(FALSE), xs.pop_data("x"));
        xs.interpret("'c' not?").unwrap();
        assert_eq!(Ok(FALSE), xs.pop_data("x"));
    }

    #[test]
    fn test_if() {
        let mut xs = State::boot().unwrap();
        xs.interpret("1 { 10 } if 0 { 20 } if").unwrap();
        assert_eq!(10, pop_int(&mut xs));
        assert_eq!(0, xs.data_depth());
        xs.interpret("\"\" { 1 } { 2 } ifte [ 0 ] { 3 } { 4 } ifte").unwrap();
        assert_eq!(3, pop_int(&mut xs));
        assert_eq!(2, pop_int(&mut xs));
        xs.capture_stdout();
        assert_eq!(Err(Xerr::ExpectingBlock(Cell::Int(1))), xs.interpret("1 1 if"));
    }

    #[test]
    fn test_loops() {
        let mut xs = State::boot().unwrap();
        xs.interpret("0 !i 0 { @i 5 < } { @i + @i 1 + !i } while").unwrap();
        assert_eq!(10, pop_int(&mut xs));
        xs.interpret("[ ] 3 { @_ + } repeat").unwrap();
        let v: Xvec = [0, 1, 2].iter().map(|x| Cell::Int(*x)).collect();
        assert_eq!(Ok(Cell::from(v)), xs.pop_data("x"));
        xs.interpret("7 !_ 2 { } repeat @_").unwrap();
        assert_eq!(7, pop_int(&mut xs));
    }

    #[test]
    fn test_loop_abort() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        xs.interpret("0 !n").unwrap();
        let res = xs.interpret("1000 { @n 1 + !n @n 3 = { nosuch! } if } repeat");
        assert!(res.is_err());
        let res = xs.interpret("1000 { @n 1 + !n @n 3 = { @nosuch } if } repeat");
        assert_eq!(Err(Xerr::UnresolvedVariable(Xstr::from("nosuch"))), res);
        xs.interpret("@n").unwrap();
        assert_eq!(3, pop_int(&mut xs));
    }

    #[test]
    fn test_case() {
        let mut xs = State::boot().unwrap();
        let src = "[ 1 \"one\" ^string { \" is a string\" + } r/^a+$/ \"a-run\" { 10 > } \"big\" ]";
        xs.interpret(&format!("{} !pats", src)).unwrap();
        xs.interpret("1 @pats case").unwrap();
        assert_eq!(Ok(Cell::from("one")), xs.pop_data("x"));
        xs.interpret("\"x\" @pats case").unwrap();
        assert_eq!(Ok(Cell::from("x is a string")), xs.pop_data("x"));
        xs.interpret("42 @pats case").unwrap();
        assert_eq!(Ok(Cell::from("big")), xs.pop_data("x"));
        xs.interpret("5 @pats case").unwrap();
        assert_eq!(0, xs.data_depth());
        xs.interpret("[ 1 ] [ ^list \"list\" ] case").unwrap();
        assert_eq!(Ok(Cell::from("list")), xs.pop_data("x"));
    }

    #[test]
    fn test_combinators() {
        let mut xs = State::boot().unwrap();
        xs.interpret("1 2 { 10 + } dip").unwrap();
        assert_eq!(2, pop_int(&mut xs));
        assert_eq!(11, pop_int(&mut xs));
        xs.interpret("1 2 { 2 * } apply2").unwrap();
        assert_eq!(4, pop_int(&mut xs));
        assert_eq!(2, pop_int(&mut xs));
        xs.interpret("1 2 3 { neg } apply3").unwrap();
        assert_eq!(-3, pop_int(&mut xs));
        assert_eq!(-2, pop_int(&mut xs));
        assert_eq!(-1, pop_int(&mut xs));
        xs.interpret("5 { 1 + } { 1 - } cleave").unwrap();
        assert_eq!(4, pop_int(&mut xs));
        assert_eq!(6, pop_int(&mut xs));
    }
}
