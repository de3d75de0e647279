use crate::cell::*;
use crate::compare::*;
use crate::error::*;
use crate::state::*;


pub fn load(xs: &mut State) -> Xresult {
    xs.defword("len", core_word_len)?;
    xs.defword("first", core_word_first)?;
    xs.defword("rest", core_word_rest)?;
    xs.defword("last", core_word_last)?;
    xs.defword("cons", core_word_cons)?;
    xs.defword("uncons", core_word_uncons)?;
    xs.defword("append", core_word_append)?;
    xs.defword("@", core_word_get)?;
    xs.defword("!", core_word_assoc)?;
    xs.defword("take", core_word_take)?;
    xs.defword("skip", core_word_skip)?;
    xs.defword("lastn", core_word_lastn)?;
    xs.defword("explode", core_word_explode)?;
    xs.defword("map", core_word_map)?;
    xs.defword("each", core_word_each)?;
    xs.defword("filter", core_word_filter)?;
    xs.defword("reduce", core_word_reduce)?;
    xs.defword("sort", |xs| sort_list(xs, false))?;
    xs.defword("dsort", |xs| sort_list(xs, true))?;
    xs.defword("keys", core_word_keys)?;
    xs.defword("dict!", core_word_to_dict)?;
    xs.defword("set!", core_word_to_set)?;
    xs.defword("..", core_word_range)?;
    OK
}

fn type_error(expected: &str, val: Cell) -> Xerr {
    Xerr::TypeErrorMsg {
        msg: Xstr::from(expected),
        val,
    }
}

fn str_slice(s: &str, start: usize, end: usize) -> Cell {
    let part: String = s.chars().skip(start).take(end.saturating_sub(start)).collect();
    Cell::from(part)
}

fn vec_slice(v: &Xvec, start: usize, end: usize) -> Cell {
    let part: Xvec = v.iter().skip(start).take(end.saturating_sub(start)).cloned().collect();
    Cell::from(part)
}

fn core_word_len(xs: &mut State) -> Xresult {
    let val = xs.pop_data("value")?;
    let n = val.len().ok_or_else(|| type_error("string, list or dictionary", val.clone()))?;
    xs.push_data(Cell::from(n))
}

fn core_word_first(xs: &mut State) -> Xresult {
    let val = match xs.pop_data("list")? {
        Cell::List(v) => v.first().cloned().unwrap_or(NIL),
        Cell::Str(s) => str_slice(&s, 0, 1),
        val => val,
    };
    xs.push_data(val)
}

fn core_word_rest(xs: &mut State) -> Xresult {
    let val = match xs.pop_data("list")? {
        Cell::List(v) => vec_slice(&v, 1, v.len()),
        Cell::Str(s) => str_slice(&s, 1, usize::MAX),
        Cell::Nil => Cell::from(Xvec::new()),
        val => return Err(type_error("string or list", val)),
    };
    xs.push_data(val)
}

fn core_word_last(xs: &mut State) -> Xresult {
    let val = match xs.pop_data("list")? {
        Cell::List(v) => v.last().cloned().unwrap_or(NIL),
        Cell::Str(s) => s.chars().last().map(|c| Cell::from(c.to_string())).unwrap_or_else(|| Cell::from("")),
        val => val,
    };
    xs.push_data(val)
}

/// x list cons
fn core_word_cons(xs: &mut State) -> Xresult {
    let v = xs.pop_data("list")?.to_vec()?;
    let x = xs.pop_data("valToCons")?;
    let mut result = Xvec::new().push_back(x);
    for item in v.iter() {
        result.push_back_mut(item.clone());
    }
    xs.push_data(Cell::from(result))
}

fn core_word_uncons(xs: &mut State) -> Xresult {
    match xs.pop_data("list")? {
        Cell::List(v) => {
            xs.push_data(v.first().cloned().unwrap_or(NIL))?;
            xs.push_data(vec_slice(&v, 1, v.len()))
        }
        val => {
            xs.push_data(val)?;
            xs.push_data(Cell::from(Xvec::new()))
        }
    }
}

fn core_word_append(xs: &mut State) -> Xresult {
    let b = xs.pop_data("list2")?;
    let a = xs.pop_data("list1")?;
    let mut result = match a {
        Cell::List(v) => v,
        val => Xvec::new().push_back(val),
    };
    match b {
        Cell::List(v) => {
            for x in v.iter() {
                result.push_back_mut(x.clone());
            }
        }
        val => result.push_back_mut(val),
    }
    xs.push_data(Cell::from(result))
}

// out of range positions stick to the nearest end
fn clamp_index(idx: Xint, len: usize) -> usize {
    if idx >= 0 {
        (idx as usize).min(len - 1)
    } else {
        let back = idx.unsigned_abs() as usize;
        len.saturating_sub(back)
    }
}

/// coll idx @
fn core_word_get(xs: &mut State) -> Xresult {
    let idx = xs.pop_data("index")?;
    let val = match xs.pop_data("collection")? {
        Cell::List(v) if v.is_empty() => NIL,
        Cell::List(v) => {
            let i = clamp_index(idx.to_int()?, v.len());
            v.get(i).cloned().unwrap_or(NIL)
        }
        Cell::Str(s) => {
            let n = s.chars().count();
            if n == 0 {
                Cell::from("")
            } else {
                let i = clamp_index(idx.to_int()?, n);
                str_slice(&s, i, i + 1)
            }
        }
        Cell::Dict(m) => m.get(&idx).cloned().unwrap_or(NIL),
        Cell::StrDict(m) => m.get(stringify(&idx).as_str()).cloned().unwrap_or(NIL),
        val => return Err(type_error("list, string or dictionary", val)),
    };
    xs.push_data(val)
}

/// coll idx val ! -> coll
fn core_word_assoc(xs: &mut State) -> Xresult {
    let val = xs.pop_data("newval")?;
    let idx = xs.pop_data("index")?;
    let coll = match xs.pop_data("collection")? {
        Cell::List(v) => {
            let i = idx.to_usize()?;
            Cell::from(v.set(i, val).ok_or(Xerr::OutOfBounds)?)
        }
        Cell::Dict(m) => Cell::from(m.insert(idx, val)),
        Cell::StrDict(m) => Cell::StrDict(m.insert(Xstr::from(stringify(&idx)), val)),
        val => return Err(type_error("list or dictionary", val)),
    };
    xs.push_data(coll)
}

fn pop_count(xs: &mut State) -> Xresult1<Xint> {
    xs.pop_data("count")?.to_int()
}

/// list n take, negative n takes from the end
fn core_word_take(xs: &mut State) -> Xresult {
    let n = pop_count(xs)?;
    let val = xs.pop_data("list")?;
    let len = val.len().unwrap_or(0);
    let (start, end) = if n >= 0 {
        (0, (n as usize).min(len))
    } else {
        (len.saturating_sub(n.unsigned_abs() as usize), len)
    };
    let res = match val {
        Cell::Nil => Cell::from(Xvec::new()),
        Cell::List(v) => vec_slice(&v, start, end),
        Cell::Str(s) => str_slice(&s, start, end),
        val => return Err(type_error("string or list", val)),
    };
    xs.push_data(res)
}

fn core_word_skip(xs: &mut State) -> Xresult {
    let n = pop_count(xs)?.max(0) as usize;
    let res = match xs.pop_data("list")? {
        Cell::Nil => Cell::from(Xvec::new()),
        Cell::List(v) => vec_slice(&v, n, v.len()),
        Cell::Str(s) => str_slice(&s, n, usize::MAX),
        val => return Err(type_error("string or list", val)),
    };
    xs.push_data(res)
}

fn core_word_lastn(xs: &mut State) -> Xresult {
    let n = pop_count(xs)?.max(0) as usize;
    let res = match xs.pop_data("list")? {
        Cell::Nil => Cell::from(Xvec::new()),
        Cell::List(v) => vec_slice(&v, v.len().saturating_sub(n), v.len()),
        Cell::Str(s) => {
            let len = s.chars().count();
            str_slice(&s, len.saturating_sub(n), len)
        }
        val => return Err(type_error("string or list", val)),
    };
    xs.push_data(res)
}

fn core_word_explode(xs: &mut State) -> Xresult {
    let val = xs.pop_data("string")?;
    let v: Xvec = match val {
        Cell::Nil => Xvec::new(),
        val => stringify(&val).chars().map(|c| Cell::from(c.to_string())).collect(),
    };
    xs.push_data(Cell::from(v))
}

/// list {p} map, nil results are dropped
fn core_word_map(xs: &mut State) -> Xresult {
    let prog = xs.pop_block("program")?;
    let v = match xs.pop_data("list")? {
        Cell::Nil => Xvec::new(),
        val => val.to_vec()?,
    };
    let mut result = Xvec::new();
    for x in v.iter() {
        xs.push_data(x.clone())?;
        xs.invoke(&prog)?;
        match xs.pop_data("progResult")? {
            Cell::Nil => (),
            val => result.push_back_mut(val),
        }
    }
    xs.push_data(Cell::from(result))
}

/// list {p} each, dictionaries give [ key value ] pairs
fn core_word_each(xs: &mut State) -> Xresult {
    let prog = xs.pop_block("program")?;
    let items: Vec<Cell> = match xs.pop_data("list")? {
        Cell::Nil => Vec::new(),
        Cell::List(v) => v.iter().cloned().collect(),
        Cell::Dict(m) => m
            .iter()
            .map(|(k, v)| Cell::from(Xvec::new().push_back(k.clone()).push_back(v.clone())))
            .collect(),
        Cell::StrDict(m) => m
            .iter()
            .map(|(k, v)| Cell::from(Xvec::new().push_back(Cell::from(k.clone())).push_back(v.clone())))
            .collect(),
        val => return Err(type_error("list or dictionary", val)),
    };
    for x in items {
        xs.push_data(x)?;
        xs.invoke(&prog)?;
    }
    OK
}

fn core_word_filter(xs: &mut State) -> Xresult {
    let prog = xs.pop_block("program")?;
    let v = match xs.pop_data("list")? {
        Cell::Nil => Xvec::new(),
        val => val.to_vec()?,
    };
    let mut result = Xvec::new();
    for x in v.iter() {
        xs.push_data(x.clone())?;
        xs.invoke(&prog)?;
        let r = xs.pop_data("progResult")?;
        if truthy(&r)? {
            result.push_back_mut(x.clone());
        }
    }
    xs.push_data(Cell::from(result))
}

/// list {p} reduce, an empty list leaves nothing
fn core_word_reduce(xs: &mut State) -> Xresult {
    let prog = xs.pop_block("program")?;
    let v = xs.pop_data("list")?.to_vec()?;
    for (i, x) in v.iter().enumerate() {
        xs.push_data(x.clone())?;
        if i > 0 {
            xs.invoke(&prog)?;
        }
    }
    OK
}

// mixed kinds like numbers and strings have no consistent order
fn sort_cells(items: &mut Vec<Cell>, descending: bool, key: fn(&Cell) -> &Cell) -> Xresult {
    if let Some(first) = items.iter().map(key).find(|x| !matches!(x, Cell::Nil)) {
        if let Some(other) = items.iter().map(key).find(|x| !sortable_together(first, x)) {
            return Err(Xerr::ComparisonError(first.clone(), other.clone()));
        }
    }
    items.sort_by(|a, b| {
        let ord = sort_order(key(a), key(b));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    OK
}

fn identity(x: &Cell) -> &Cell {
    x
}

fn pair_value(pair: &Cell) -> &Cell {
    match pair {
        Cell::List(v) => v.get(1).unwrap_or(pair),
        _ => pair,
    }
}

// lists sort by value, dictionaries become [ key value ] pairs sorted by value
fn sort_list(xs: &mut State, descending: bool) -> Xresult {
    let res = match xs.pop_data("listToSort")? {
        Cell::List(v) => {
            let mut items: Vec<Cell> = v.iter().cloned().collect();
            sort_cells(&mut items, descending, identity)?;
            items.into_iter().collect::<Xvec>()
        }
        Cell::Dict(m) => {
            let mut items: Vec<Cell> = m
                .iter()
                .map(|(k, v)| Cell::from(Xvec::new().push_back(k.clone()).push_back(v.clone())))
                .collect();
            sort_cells(&mut items, descending, pair_value)?;
            items.into_iter().collect::<Xvec>()
        }
        val => return Err(type_error("list or dictionary", val)),
    };
    xs.push_data(Cell::from(res))
}

fn core_word_keys(xs: &mut State) -> Xresult {
    let keys: Xvec = match xs.pop_data("dictionary")? {
        Cell::Dict(m) => m.keys().cloned().collect(),
        Cell::StrDict(m) => m.keys().map(|k| Cell::from(k.clone())).collect(),
        val => return Err(type_error("dictionary", val)),
    };
    xs.push_data(Cell::from(keys))
}

/// [ k1 v1 k2 v2 ... ] dict!
fn core_word_to_dict(xs: &mut State) -> Xresult {
    let v = xs.pop_data("list")?.to_vec()?;
    if v.len() % 2 != 0 {
        return Err(argument_error("dictionary list must have an even length"));
    }
    let mut m = Xmap::new();
    let items: Vec<&Cell> = v.iter().collect();
    for pair in items.chunks(2) {
        m.insert_mut(pair[0].clone(), pair[1].clone());
    }
    xs.push_data(Cell::from(m))
}

fn core_word_to_set(xs: &mut State) -> Xresult {
    let m: Xmap = match xs.pop_data("list")? {
        Cell::List(v) => v.iter().map(|x| (x.clone(), TRUE)).collect(),
        val => Xmap::new().insert(val, TRUE),
    };
    xs.push_data(Cell::from(m))
}

/// a b .. -> [ a ... b ], counts down when a > b
fn core_word_range(xs: &mut State) -> Xresult {
    let b = xs.pop_data("operand2")?.to_int()?;
    let a = xs.pop_data("operand1")?.to_int()?;
    let span = (a as i128 - b as i128).unsigned_abs();
    if span >= STACK_CAPACITY as u128 {
        return Err(argument_error("range is too large"));
    }
    let v: Xvec = if a <= b {
        (a..=b).map(Cell::Int).collect()
    } else {
        (b..=a).rev().map(Cell::Int).collect()
    };
    xs.push_data(Cell::from(v))
}
