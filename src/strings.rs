use crate::cell::*;
use crate::compare::stringify;
use crate::error::*;
use crate::state::*;

use std::convert::TryFrom;
use std::rc::Rc;

pub fn load(xs: &mut State) -> Xresult {
    xs.defword("str:split", str_split)?;
    xs.defword("str:join", str_join)?;
    xs.defword("str:tolower", |xs| map_text(xs, |s| s.to_lowercase()))?;
    xs.defword("str:toupper", |xs| map_text(xs, |s| s.to_uppercase()))?;
    xs.defword("str:trim", |xs| map_text(xs, |s| s.trim().to_string()))?;
    xs.defword("str:replace", str_replace)?;
    xs.defword("str:match", |xs| str_match(xs, true))?;
    xs.defword("str:notmatch", |xs| str_match(xs, false))?;
    xs.defword("regex!", to_regex)?;
    xs.defword("ord", ord)?;
    OK
}

fn text_of(val: &Cell) -> String {
    stringify(val)
}

fn map_text(xs: &mut State, f: fn(&str) -> String) -> Xresult {
    let val = xs.pop_data("string")?;
    let s = f(&text_of(&val));
    xs.push_data(Cell::from(s))
}

/// s sep str:split, sep is a string or regex
fn str_split(xs: &mut State) -> Xresult {
    let sep = xs.pop_data("separator")?;
    let val = xs.pop_data("string")?;
    if let Cell::Nil = val {
        return xs.push_data(Cell::from(Xvec::new()));
    }
    let s = text_of(&val);
    let parts: Xvec = match &sep {
        Cell::Regex(re) => re.split(&s).map(Cell::from).collect(),
        sep => s.split(text_of(sep).as_str()).map(Cell::from).collect(),
    };
    xs.push_data(Cell::from(parts))
}

/// Concatenate list items, integers are taken as character codes.
fn str_join(xs: &mut State) -> Xresult {
    let val = xs.pop_data("list")?;
    let res = match val {
        Cell::Nil => String::new(),
        Cell::Str(s) => s.to_string(),
        Cell::List(v) => {
            let mut buf = String::new();
            for x in v.iter() {
                match x {
                    Cell::Int(i) => {
                        let c = u32::try_from(*i).ok().and_then(char::from_u32).ok_or_else(|| {
                            Xerr::TypeErrorMsg {
                                msg: Xstr::from("character code"),
                                val: x.clone(),
                            }
                        })?;
                        buf.push(c);
                    }
                    x => buf.push_str(&stringify(x)),
                }
            }
            buf
        }
        val => {
            return Err(Xerr::TypeErrorMsg {
                msg: Xstr::from("list"),
                val,
            })
        }
    };
    xs.push_data(Cell::from(res))
}

fn replace_text(s: &str, pat: &Cell, rep: &str) -> String {
    match pat {
        Cell::Regex(re) => re.replace_all(s, rep).into_owned(),
        pat => s.replace(text_of(pat).as_str(), rep),
    }
}

/// s pattern replacement str:replace, lists are replaced item by item
fn str_replace(xs: &mut State) -> Xresult {
    let rep = text_of(&xs.pop_data("replacement")?);
    let pat = xs.pop_data("pattern")?;
    let res = match xs.pop_data("string")? {
        Cell::List(v) => {
            let items: Xvec = v
                .iter()
                .map(|x| Cell::from(replace_text(&text_of(x), &pat, &rep)))
                .collect();
            Cell::from(items)
        }
        val => Cell::from(replace_text(&text_of(&val), &pat, &rep)),
    };
    xs.push_data(res)
}

fn matches_text(s: &str, pat: &Cell) -> bool {
    match pat {
        Cell::Regex(re) => re.is_match(s),
        pat => text_of(pat) == s,
    }
}

/// s pattern str:match -> bool, a list is filtered instead
fn str_match(xs: &mut State, want: bool) -> Xresult {
    let pat = xs.pop_data("pattern")?;
    let res = match xs.pop_data("string")? {
        Cell::List(v) => {
            let items: Xvec = v
                .iter()
                .map(text_of)
                .filter(|s| matches_text(s, &pat) == want)
                .map(Cell::from)
                .collect();
            Cell::from(items)
        }
        val => Cell::from(matches_text(&text_of(&val), &pat) == want),
    };
    xs.push_data(res)
}

fn to_regex(xs: &mut State) -> Xresult {
    let val = xs.pop_data("pattern")?;
    let re = match val {
        Cell::Regex(_) => val,
        val => {
            let re = regex::Regex::new(&text_of(&val)).map_err(|e| Xerr::ArgumentError(Xstr::from(e.to_string())))?;
            Cell::Regex(Rc::new(re))
        }
    };
    xs.push_data(re)
}

fn ord(xs: &mut State) -> Xresult {
    let n = match xs.pop_data("char")? {
        Cell::Char(c) => c as Xint,
        Cell::Str(s) => s.chars().next().map(|c| c as Xint).unwrap_or(0),
        val => {
            return Err(Xerr::TypeErrorMsg {
                msg: Xstr::from("char or string"),
                val,
            })
        }
    };
    xs.push_data(Cell::Int(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Cell {
        Cell::from(items.iter().map(|s| Cell::from(*s)).collect::<Xvec>())
    }

    fn run(xs: &mut State, src: &str) -> Cell {
        xs.interpret(src).unwrap();
        xs.pop_data("x").unwrap()
    }

    #[test]
    fn test_split_join() {
        let mut xs = State::boot().unwrap();
        assert_eq!(strs(&["a", "b", "c"]), run(&mut xs, "\"a,b,c\" \",\" str:split"));
        assert_eq!(strs(&["a", "b"]), run(&mut xs, "\"a  b\" r/\\s+/ str:split"));
        assert_eq!(Cell::from("abc"), run(&mut xs, "[ \"a\" 98 'c' ] str:join"));
        assert_eq!(Cell::from("ab1"), run(&mut xs, "[ \"a\" \"b\" 1.5 int! string! ] str:join"));
    }

    #[test]
    fn test_case_trim() {
        let mut xs = State::boot().unwrap();
        assert_eq!(Cell::from("abc"), run(&mut xs, "\"AbC\" str:tolower"));
        assert_eq!(Cell::from("ABC"), run(&mut xs, "\"abc\" str:toupper"));
        assert_eq!(Cell::from("x y"), run(&mut xs, "\"  x y \n\" str:trim"));
    }

    #[test]
    fn test_replace_match() {
        let mut xs = State::boot().unwrap();
        assert_eq!(Cell::from("a-b-c"), run(&mut xs, "\"a b c\" \" \" \"-\" str:replace"));
        assert_eq!(Cell::from("x#y#"), run(&mut xs, "\"x1y22\" r/[0-9]+/ \"#\" str:replace"));
        assert_eq!(TRUE, run(&mut xs, "\"abc\" r/^a/ str:match"));
        assert_eq!(FALSE, run(&mut xs, "\"abc\" r/^a/ str:notmatch"));
        assert_eq!(strs(&["a1", "a2"]), run(&mut xs, "[ \"a1\" \"b\" \"a2\" ] r/^a/ str:match"));
        assert_eq!(strs(&["b"]), run(&mut xs, "[ \"a1\" \"b\" \"a2\" ] r/^a/ str:notmatch"));
        assert_eq!(TRUE, run(&mut xs, "\"a.c\" \"a.c\" str:match"));
    }

    #[test]
    fn test_regex_ord() {
        let mut xs = State::boot().unwrap();
        assert_eq!(TRUE, run(&mut xs, "\"aaa\" \"^a+$\" regex! str:match"));
        assert_eq!(Cell::Int(97), run(&mut xs, "'a' ord"));
        assert_eq!(Cell::Int(98), run(&mut xs, "\"bc\" ord"));
        assert_eq!(Cell::Int(0), run(&mut xs, "\"\" ord"));
        xs.capture_stdout();
        assert!(matches!(xs.interpret("\"(\" regex!"), Err(Xerr::ArgumentError(_))));
    }
}
