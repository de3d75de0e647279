use crate::cell::*;
use crate::compare::truthy;
use crate::error::*;
use crate::state::*;

pub fn load(xs: &mut State) -> Xresult {
    xs.defword("primrec", primrec)?;
    xs.defword("linrec", linrec)?;
    xs.defword("binrec", binrec)?;
    OK
}

// numbers count down to zero, strings and lists lose their first element
fn predecessor(val: &Cell) -> Xresult1<Option<Cell>> {
    match val {
        Cell::Int(i) if *i > 0 => Ok(Some(Cell::Int(i - 1))),
        Cell::Real(r) if *r > 0.0 => Ok(Some(Cell::Real(r - 1.0))),
        Cell::Int(_) | Cell::Real(_) => Ok(None),
        Cell::Str(s) if !s.is_empty() => Ok(Some(Cell::from(s.chars().skip(1).collect::<String>()))),
        Cell::List(v) if !v.is_empty() => Ok(Some(Cell::from(v.iter().skip(1).cloned().collect::<Xvec>()))),
        Cell::Str(_) | Cell::List(_) => Ok(None),
        val => Err(Xerr::TypeErrorMsg {
            msg: Xstr::from("number, string or list"),
            val: val.clone(),
        }),
    }
}

/// val {init} {step} primrec
fn primrec(xs: &mut State) -> Xresult {
    let step = xs.pop_block("program")?;
    let init = xs.pop_block("initProgram")?;
    let mut val = xs.pop_data("value")?;
    xs.invoke(&init)?;
    let mut result = xs.pop_data("initResult")?;
    while let Some(next) = predecessor(&val)? {
        xs.push_data(result)?;
        xs.push_data(val)?;
        xs.invoke(&step)?;
        result = xs.pop_data("stepResult")?;
        val = next;
    }
    xs.push_data(result)
}

/// val {if} {then} {rec} {end} linrec
fn linrec(xs: &mut State) -> Xresult {
    let end = xs.pop_block("endProgram")?;
    let rec = xs.pop_block("recProgram")?;
    let then = xs.pop_block("thenProgram")?;
    let cond = xs.pop_block("ifProgram")?;
    let mut val = xs.pop_data("value")?;
    let mut depth = 0;
    loop {
        xs.push_data(val.clone())?;
        xs.invoke(&cond)?;
        let r = xs.pop_data("ifResult")?;
        if truthy(&r)? {
            xs.push_data(val)?;
            xs.invoke(&then)?;
            break;
        }
        xs.push_data(val)?;
        xs.invoke(&rec)?;
        val = xs.pop_data("recResult")?;
        depth += 1;
    }
    for _ in 0..depth {
        xs.invoke(&end)?;
    }
    OK
}

struct BinRec {
    cond: Cell,
    then: Cell,
    rec: Cell,
    end: Cell,
}

impl BinRec {
    fn run(&self, xs: &mut State, val: Cell, depth: usize) -> Xresult {
        if depth > MAX_CALL_DEPTH {
            return Err(Xerr::CallStackOverflow(MAX_CALL_DEPTH));
        }
        xs.push_data(val.clone())?;
        xs.invoke(&self.cond)?;
        let r = xs.pop_data("ifResult")?;
        xs.push_data(val)?;
        if truthy(&r)? {
            return xs.invoke(&self.then);
        }
        xs.invoke(&self.rec)?;
        let first = xs.pop_data("recResult1")?;
        let second = xs.pop_data("recResult2")?;
        self.run(xs, first, depth + 1)?;
        let first = xs.pop_data("result1")?;
        self.run(xs, second, depth + 1)?;
        let second = xs.pop_data("result2")?;
        xs.push_data(first)?;
        xs.push_data(second)?;
        xs.invoke(&self.end)
    }
}

/// val {if} {then} {rec} {end} binrec, `rec` leaves two values to recurse into.
fn binrec(xs: &mut State) -> Xresult {
    let end = xs.pop_block("endProgram")?;
    let rec = xs.pop_block("recProgram")?;
    let then = xs.pop_block("thenProgram")?;
    let cond = xs.pop_block("ifProgram")?;
    let val = xs.pop_data("value")?;
    let b = BinRec {
        cond,
        then,
        rec,
        end,
    };
    b.run(xs, val, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primrec() {
        let mut xs = State::boot().unwrap();
        xs.interpret("5 { 1 } { * } primrec").unwrap();
        assert_eq!(Ok(Cell::Int(120)), xs.pop_data("x"));
        xs.interpret("0 { 7 } { * } primrec").unwrap();
        assert_eq!(Ok(Cell::Int(7)), xs.pop_data("x"));
        xs.interpret("[ 1 2 3 ] { 0 } { len + } primrec").unwrap();
        assert_eq!(Ok(Cell::Int(6)), xs.pop_data("x"));
        xs.interpret("\"abc\" { \"\" } { first + } primrec").unwrap();
        assert_eq!(Ok(Cell::from("abc")), xs.pop_data("x"));
        xs.interpret("2.5 { 0 } { + } primrec").unwrap();
        assert_eq!(Ok(Cell::Real(4.5)), xs.pop_data("x"));
    }

    #[test]
    fn test_primrec_errors() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        let res = xs.interpret("5 1 { * } primrec");
        assert_eq!(Err(Xerr::ExpectingBlock(Cell::Int(1))), res);
        let res = xs.interpret("'c' { 1 } { * } primrec");
        assert!(matches!(res, Err(Xerr::TypeErrorMsg { .. })));
        xs.interpret("clear").unwrap();
        let res = xs.interpret("3 { 1 } { drop drop drop } primrec 99");
        assert!(matches!(res, Err(Xerr::StackUnderflow(_))));
        assert_eq!(0, xs.data_depth());
    }

    #[test]
    fn test_linrec() {
        let mut xs = State::boot().unwrap();
        xs.interpret("5 { 0 = } { drop 1 } { dup 1 - } { * } linrec").unwrap();
        assert_eq!(Ok(Cell::Int(120)), xs.pop_data("x"));
        assert_eq!(0, xs.data_depth());
        xs.capture_stdout();
        let res = xs.interpret("5 { 0 = } { drop 1 } \"x\" { * } linrec");
        assert_eq!(Err(Xerr::ExpectingBlock(Cell::from("x"))), res);
    }

    #[test]
    fn test_binrec() {
        let mut xs = State::boot().unwrap();
        xs.interpret("def fib n == n { small } { drop 1 } { 1 - dup 1 - } { + } binrec ;")
            .unwrap();
        xs.interpret("5 fib").unwrap();
        assert_eq!(Ok(Cell::Int(8)), xs.pop_data("x"));
        xs.interpret("10 fib").unwrap();
        assert_eq!(Ok(Cell::Int(89)), xs.pop_data("x"));
        assert_eq!(0, xs.data_depth());
    }

    #[test]
    fn test_binrec_abort() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        let res = xs.interpret("6 { small } { nosuchvar } { 1 - dup 1 - } { + } binrec");
        assert!(res.is_err());
        let res = xs.interpret("6 { small } { drop @nosuchvar } { 1 - dup 1 - } { + } binrec 1");
        assert_eq!(Err(Xerr::UnresolvedVariable(Xstr::from("nosuchvar"))), res);
        assert_eq!(2, xs.console().unwrap().matches("Calling").count());
    }
}
