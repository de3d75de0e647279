use crate::cell::*;
use crate::error::*;
use crate::lex::Token;
use crate::opcodes::*;
use crate::state::*;

use std::rc::Rc;

fn is_float_literal(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let digits = |x: &str| !x.is_empty() && x.bytes().all(|c| c.is_ascii_digit());
    let (mantissa, exp) = match s.find('e') {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let frac_ok = match mantissa.find('.') {
        Some(i) => digits(&mantissa[..i]) && digits(&mantissa[i + 1..]),
        None => false,
    };
    let exp_ok = match exp {
        Some(e) => digits(e.strip_prefix('-').unwrap_or(e)),
        None => true,
    };
    frac_ok && exp_ok
}

// None when the text is not an integer literal at all
fn parse_int_literal(s: &str) -> Option<Result<Xint, std::num::ParseIntError>> {
    let body = s.strip_prefix('-').unwrap_or(s);
    if !body.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if !body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '_') {
        return None;
    }
    let clean: String = s.chars().filter(|c| *c != ',' && *c != '_').collect();
    Some(clean.parse::<Xint>())
}

fn is_plain_name(s: &str) -> bool {
    match s {
        "" | "=" | "==" | ":" | "->" | ";" | "[" | "]" | "{" | "}" => false,
        _ => {
            !s.starts_with(|c| matches!(c, '"' | '\'' | '!' | '@' | '$' | '&'))
                && parse_int_literal(s).is_none()
                && !is_float_literal(s)
        }
    }
}

impl State {
    fn compile_error(&mut self, msg: &str, tok: &Token) -> Xerr {
        self.raise(Xerr::CompileError(Xstr::from(msg)), Some(tok))
    }

    /// Compile tokens starting at `start` until `term` or the end of input.
    /// Returns the position after the terminator and the compiled unit.
    /// `enclosing` lists the parameter and local names visible to the code.
    pub fn compile(
        &mut self,
        tokens: &[Token],
        start: usize,
        term: Option<&str>,
        enclosing: &[Xstr],
    ) -> Xresult1<(usize, Xunit)> {
        let mut names: Vec<Xstr> = enclosing.to_vec();
        let mut code = Vec::new();
        // list brackets opened in this body
        let mut depth = 0usize;
        let mut i = start;
        while i < tokens.len() {
            let tok = &tokens[i];
            let name = tok.name.as_str();
            if Some(name) == term {
                if depth != 0 {
                    return Err(self.compile_error("unbalanced [ in block", tok));
                }
                return Ok((i + 1, Rc::new(code)));
            }
            i += 1;
            let opcode = match name {
                "def" | "DEFINE" => {
                    i = self.compile_def(tokens, i - 1)?;
                    continue;
                }
                "{" => {
                    let (next, unit) = self.compile(tokens, i, Some("}"), &names)?;
                    i = next;
                    Opcode::Block(unit)
                }
                ";" | "}" => {
                    let msg = format!("unexpected {}", name);
                    return Err(self.compile_error(&msg, tok));
                }
                "[" => {
                    depth += 1;
                    Opcode::ListBegin
                }
                "]" => {
                    if depth == 0 {
                        return Err(self.compile_error("unbalanced ] in block", tok));
                    }
                    depth -= 1;
                    Opcode::ListEnd
                }
                "quit" => Opcode::Quit,
                "->" => {
                    let var = self.expect_name(tokens, i, tok)?;
                    i += 1;
                    names.push(var.clone());
                    Opcode::Bind(var)
                }
                "IMPORT" => {
                    let unit = self.expect_name(tokens, i, tok)?;
                    i += 1;
                    self.caller = Some(tok.clone());
                    self.load(&unit)?;
                    continue;
                }
                _ => match self.compile_token(tok, &names) {
                    Ok(opcode) => opcode,
                    Err(e) => return Err(self.raise(e, Some(tok))),
                },
            };
            code.push(Op {
                code: opcode,
                tok: tok.clone(),
            });
        }
        if let Some(t) = term {
            let msg = format!("missing {}", t);
            let at = tokens.last().cloned().unwrap_or_else(|| Token::synthetic("<input>", t));
            return Err(self.compile_error(&msg, &at));
        }
        Ok((i, Rc::new(code)))
    }

    // name after `->` or `IMPORT`, quotes are dropped
    fn expect_name(&mut self, tokens: &[Token], i: usize, at: &Token) -> Xresult1<Xstr> {
        match tokens.get(i) {
            Some(t) if t.name.len() > 1 && t.name.starts_with('"') => {
                Ok(Xstr::from(t.name.trim_matches('"')))
            }
            Some(t) if is_plain_name(&t.name) => Ok(t.name.clone()),
            _ => Err(self.raise(Xerr::ExpectingName, Some(at))),
        }
    }

    fn compile_token(&mut self, tok: &Token, names: &[Xstr]) -> Xresult1<Opcode> {
        let s = tok.name.as_str();
        if is_float_literal(s) {
            return s
                .parse::<Xreal>()
                .map(|r| Opcode::Literal(Cell::Real(r)))
                .map_err(|e| Xerr::CompileError(Xstr::from(e.to_string())));
        }
        if let Some(res) = parse_int_literal(s) {
            return res
                .map(|i| Opcode::Literal(Cell::Int(i)))
                .map_err(|e| Xerr::CompileError(Xstr::from(format!("{}: {}", s, e))));
        }
        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            return Ok(Opcode::Literal(Cell::from(&s[1..s.len() - 1])));
        }
        if s.len() > 1 && s.starts_with('!') && s != "!=" {
            return Ok(Opcode::SetVar(Xstr::from(&s[1..])));
        }
        if s.len() > 1 && (s.starts_with('@') || s.starts_with('$')) {
            return Ok(Opcode::GetVar(Xstr::from(&s[1..])));
        }
        if s.len() > 1 && s.starts_with('&') {
            return Ok(Opcode::Dynamic(Xstr::from(&s[1..])));
        }
        if s.len() >= 3 && s.starts_with("r/") && s.ends_with('/') {
            let re = regex::Regex::new(&s[2..s.len() - 1])
                .map_err(|e| Xerr::CompileError(Xstr::from(e.to_string())))?;
            return Ok(Opcode::Literal(Cell::Regex(Rc::new(re))));
        }
        if s.starts_with('\'') {
            let c = s.chars().nth(1).ok_or(Xerr::InternalError)?;
            return Ok(Opcode::Literal(Cell::Char(c)));
        }
        if names.iter().any(|x| x.as_str() == s) {
            return Ok(Opcode::Local(tok.name.clone()));
        }
        match self.dict_find(s) {
            Some(Xfn::Interp(fid)) => Ok(Opcode::Call(fid)),
            Some(Xfn::Native(x)) => Ok(Opcode::NativeCall(x)),
            None => Err(Xerr::UnknownWord(tok.name.clone())),
        }
    }

    // def name params [: locals] (= | ==) body ;
    fn compile_def(&mut self, tokens: &[Token], at: usize) -> Xresult1<usize> {
        let def_tok = &tokens[at];
        let name_tok = match tokens.get(at + 1) {
            Some(t) if is_plain_name(&t.name) => t,
            _ => return Err(self.raise(Xerr::ExpectingName, Some(def_tok))),
        };
        let mut params = Vec::new();
        let mut locals = Vec::new();
        let mut in_locals = false;
        let mut i = at + 2;
        loop {
            let t = match tokens.get(i) {
                Some(t) => t,
                None => return Err(self.compile_error("expecting = in definition", def_tok)),
            };
            i += 1;
            match t.name.as_str() {
                "=" | "==" => break,
                ":" if !in_locals => in_locals = true,
                s if is_plain_name(s) => {
                    if in_locals {
                        locals.push(t.name.clone());
                    } else {
                        params.push(t.name.clone());
                    }
                }
                _ => return Err(self.compile_error("invalid parameter name", t)),
            }
        }
        if i >= tokens.len() {
            return Err(self.compile_error("missing body in definition", def_tok));
        }
        let names: Vec<Xstr> = params.iter().chain(locals.iter()).cloned().collect();
        let fid = self.functions.len();
        self.functions.push(Rc::new(Function {
            name: name_tok.name.clone(),
            params,
            locals,
            body: None,
            def_tok: name_tok.clone(),
            parent: self.scope.clone(),
        }));
        // registered before the body for recursive calls
        let wa = self.dict_insert(name_tok.name.clone(), Xfn::Interp(fid));
        match self.compile(tokens, i, Some(";"), &names) {
            Ok((next, body)) => {
                let mut f = (*self.functions[fid]).clone();
                f.body = Some(body);
                self.functions[fid] = Rc::new(f);
                Ok(next)
            }
            Err(e) => {
                self.dict.remove(wa);
                Err(e)
            }
        }
    }
}
