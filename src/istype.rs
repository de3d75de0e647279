use crate::cell::*;
use crate::error::*;
use crate::state::*;

pub fn load(xs: &mut State) -> Xresult {
    xs.defword("^nil", |xs| xs.push_data(Cell::Type(CellType::Nil)))?;
    xs.defword("^bool", |xs| xs.push_data(Cell::Type(CellType::Flag)))?;
    xs.defword("^int", |xs| xs.push_data(Cell::Type(CellType::Int)))?;
    xs.defword("^float", |xs| xs.push_data(Cell::Type(CellType::Real)))?;
    xs.defword("^string", |xs| xs.push_data(Cell::Type(CellType::Str)))?;
    xs.defword("^char", |xs| xs.push_data(Cell::Type(CellType::Char)))?;
    xs.defword("^list", |xs| xs.push_data(Cell::Type(CellType::List)))?;
    xs.defword("^dict", |xs| xs.push_data(Cell::Type(CellType::Dict)))?;
    xs.defword("^lambda", |xs| xs.push_data(Cell::Type(CellType::Quot)))?;
    xs.defword("^fun", |xs| xs.push_data(Cell::Type(CellType::Fun)))?;
    xs.defword("^regex", |xs| xs.push_data(Cell::Type(CellType::Regex)))?;
    xs.defword("^type", |xs| xs.push_data(Cell::Type(CellType::Type)))?;
    xs.defword("type", type_of_xf)?;
    xs.defword("is", is_type_xf)?;
    xs.defword("int?", |xs| type_test(xs, CellType::Int))?;
    xs.defword("float?", |xs| type_test(xs, CellType::Real))?;
    xs.defword("string?", |xs| type_test(xs, CellType::Str))?;
    xs.defword("list?", |xs| type_test(xs, CellType::List))?;
    xs.defword("number?", is_number_xf)?;
    xs.defword("empty?", is_empty_xf)?;
    xs.defword("small", small_xf)?;
    OK
}

fn type_of_xf(xs: &mut State) -> Xresult {
    let t = xs.pop_data("value")?.cell_type();
    xs.push_data(Cell::Type(t))
}

/// val type is -> bool
fn is_type_xf(xs: &mut State) -> Xresult {
    let t = xs.pop_data("targetType")?.to_type()?;
    let val = xs.pop_data("value")?;
    xs.push_data(Cell::from(val.cell_type() == t))
}

fn type_test(xs: &mut State, t: CellType) -> Xresult {
    let yes = xs.pop_data("value")?.cell_type() == t;
    xs.push_data(Cell::from(yes))
}

fn is_number_xf(xs: &mut State) -> Xresult {
    let yes = xs.pop_data("value")?.is_number();
    xs.push_data(Cell::from(yes))
}

// anything without a length counts as empty
fn is_empty_xf(xs: &mut State) -> Xresult {
    let yes = xs.pop_data("value")?.len().map(|n| n == 0).unwrap_or(true);
    xs.push_data(Cell::from(yes))
}

/// Replace the top value with true when it is below two in size.
fn small_xf(xs: &mut State) -> Xresult {
    let val = xs.pop_data("value")?;
    let yes = match &val {
        Cell::Int(i) => *i < 2,
        Cell::Real(r) => *r < 2.0,
        Cell::Str(_) | Cell::List(_) | Cell::Dict(_) | Cell::StrDict(_) => {
            val.len().map(|n| n < 2).unwrap_or(false)
        }
        Cell::Nil | Cell::Flag(_) => true,
        val => {
            return Err(Xerr::TypeErrorMsg {
                msg: Xstr::from("number, string or list"),
                val: val.clone(),
            })
        }
    };
    xs.push_data(Cell::from(yes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(xs: &mut State, src: &str) -> bool {
        xs.interpret(src).unwrap();
        xs.pop_data("x").unwrap() == TRUE
    }

    #[test]
    fn test_typecheck() {
        let mut xs = State::boot().unwrap();
        assert!(check(&mut xs, "1 ^int is"));
        assert!(!check(&mut xs, "1.0 ^int is"));
        assert!(check(&mut xs, "{ 1 } ^lambda is"));
        assert!(check(&mut xs, "@dup ^fun is"));
        assert!(check(&mut xs, "r/x/ type ^regex ="));
        assert!(check(&mut xs, "^int type ^type is"));
        assert!(check(&mut xs, "nil ^nil is"));
        assert!(check(&mut xs, "'a' ^char is"));
        assert!(check(&mut xs, "[ 1 ] ^list is"));
        assert!(check(&mut xs, "[ ] dict! ^dict is"));
        assert!(check(&mut xs, "vars ^dict is"));
        assert!(check(&mut xs, "\"x\" string?"));
        assert!(!check(&mut xs, "\"1\" int?"));
        assert!(check(&mut xs, "2.5 number?"));
        assert!(!check(&mut xs, "\"2\" number?"));
        xs.capture_stdout();
        assert!(matches!(xs.interpret("1 2 is"), Err(Xerr::TypeErrorMsg { .. })));
    }

    #[test]
    fn test_empty_small() {
        let mut xs = State::boot().unwrap();
        assert!(check(&mut xs, "[ ] empty?"));
        assert!(check(&mut xs, "\"\" empty?"));
        assert!(check(&mut xs, "nil empty?"));
        assert!(!check(&mut xs, "[ 0 ] empty?"));
        assert!(check(&mut xs, "1 small"));
        assert!(!check(&mut xs, "2 small"));
        assert!(check(&mut xs, "\"a\" small"));
        assert!(!check(&mut xs, "[ 1 2 ] small"));
    }
}
