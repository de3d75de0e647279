use crate::cell::*;
use crate::compare::*;
use crate::debug::LineSource;
use crate::error::*;
use crate::lex::*;
use crate::opcodes::*;
use crate::scope::*;

use std::rc::Rc;

pub const STACK_CAPACITY: usize = 100_000;
// pushing above capacity minus reserve is an overflow
const STACK_RESERVE: usize = 10;
pub const MAX_CALL_DEPTH: usize = 1000;
pub const UNIT_EXTENSION: &str = ".quip";

const PRELUDE_NAME: &str = "prelude.quip";
const PRELUDE_SOURCE: &str = include_str!("prelude.quip");

/// User defined function, `body` is filled in once the definition is compiled.
#[derive(Clone)]
pub struct Function {
    pub name: Xstr,
    pub params: Vec<Xstr>,
    pub locals: Vec<Xstr>,
    pub body: Option<Xunit>,
    pub def_tok: Token,
    // scope active at definition time
    pub parent: Xscope,
}

#[derive(Clone)]
pub(crate) struct DictEntry {
    pub name: Xstr,
    pub xf: Xfn,
}

pub struct State {
    pub(crate) dict: Vec<DictEntry>,
    pub(crate) functions: Vec<Rc<Function>>,
    data_stack: Vec<Cell>,
    list_marks: Vec<usize>,
    call_stack: Vec<Token>,
    pub(crate) scope: Xscope,
    keep_running: bool,
    quit: bool,
    pub(crate) stepping: bool,
    pub(crate) debugger: Option<Box<dyn LineSource>>,
    // token of the op that called the running native word
    pub(crate) caller: Option<Token>,
    input: Lex,
    console: Option<String>,
    pub(crate) colors: bool,
}

pub fn unit_path(name: &str) -> String {
    if name.ends_with(UNIT_EXTENSION) {
        name.to_string()
    } else {
        format!("{}{}", name, UNIT_EXTENSION)
    }
}

impl State {
    /// Interpreter with every built-in word but without the prelude.
    pub fn new() -> Xresult1<State> {
        let mut xs = State {
            dict: Vec::new(),
            functions: Vec::new(),
            data_stack: Vec::with_capacity(STACK_CAPACITY),
            list_marks: Vec::new(),
            call_stack: Vec::new(),
            scope: Scope::root(),
            keep_running: true,
            quit: false,
            stepping: false,
            debugger: None,
            caller: None,
            input: Lex::new("<input>"),
            console: None,
            colors: cfg!(feature = "stdio"),
        };
        #[cfg(not(feature = "stdio"))]
        {
            xs.console = Some(String::new());
        }
        xs.load_core()?;
        crate::arith::load(&mut xs)?;
        crate::istype::load(&mut xs)?;
        crate::control::load(&mut xs)?;
        crate::list::load(&mut xs)?;
        crate::strings::load(&mut xs)?;
        crate::file::load(&mut xs)?;
        crate::combinators::load(&mut xs)?;
        Ok(xs)
    }

    pub fn boot() -> Xresult1<State> {
        let mut xs = State::new()?;
        xs.eval_unit(PRELUDE_NAME, Token::synthetic(PRELUDE_NAME, PRELUDE_NAME), PRELUDE_SOURCE)?;
        Ok(xs)
    }

    pub fn capture_stdout(&mut self) {
        if self.console.is_none() {
            self.console = Some(String::new());
        }
        self.colors = false;
    }

    pub fn console(&mut self) -> Option<&mut String> {
        self.console.as_mut()
    }

    pub fn set_colors(&mut self, on: bool) {
        self.colors = on;
    }

    pub fn log_error(&mut self, mut msg: String) {
        msg.push_str("\n");
        self.print(&msg);
    }

    pub fn print(&mut self, msg: &str) {
        #[cfg(not(feature = "stdio"))]
        if let Some(out) = self.console.as_mut() {
            out.push_str(msg);
        }
        #[cfg(feature = "stdio")]
        if let Some(out) = self.console.as_mut() {
            out.push_str(msg)
        } else {
            use std::io::Write;
            let stdout = std::io::stdout();
            let mut h = stdout.lock();
            let _ = h.write_all(msg.as_bytes());
            let _ = h.flush();
        }
    }

    pub fn is_running(&self) -> bool {
        self.keep_running
    }

    pub fn is_quit(&self) -> bool {
        self.quit
    }

    /// Report the error once and stop execution.
    pub(crate) fn raise(&mut self, err: Xerr, tok: Option<&Token>) -> Xerr {
        if self.keep_running && err != Xerr::Quit {
            self.report_error(&err, tok);
        }
        self.keep_running = false;
        err
    }

    pub fn defword(&mut self, name: &str, f: XfnType) -> Xresult1<usize> {
        Ok(self.dict_insert(Xstr::from(name), Xfn::Native(XfnPtr(f))))
    }

    pub(crate) fn dict_insert(&mut self, name: Xstr, xf: Xfn) -> usize {
        let wa = self.dict.len();
        self.dict.push(DictEntry { name, xf });
        wa
    }

    pub fn dict_find(&self, name: &str) -> Option<Xfn> {
        self.dict.iter().rfind(|x| x.name == name).map(|x| x.xf.clone())
    }

    pub fn function(&self, fid: usize) -> Option<&Function> {
        self.functions.get(fid).map(|f| f.as_ref())
    }

    /// Variable from the scope chain, words are visible as function values.
    pub fn lookup_var(&self, name: &str) -> Option<Cell> {
        self.scope
            .lookup(name)
            .or_else(|| self.dict_find(name).map(Cell::Fun))
    }

    pub fn bind_var(&mut self, name: &str, val: Cell) {
        self.scope.bind(Xstr::from(name), val);
    }

    fn load_core(&mut self) -> Xresult {
        self.defword("dup", |xs| xs.dup_data())?;
        self.defword("dup2", core_word_dup2)?;
        self.defword("drop", |xs| xs.drop_data())?;
        self.defword("pop", |xs| xs.drop_data())?;
        self.defword("popd", core_word_popd)?;
        self.defword("swap", |xs| xs.swap_data())?;
        self.defword("swapd", core_word_swapd)?;
        self.defword("over", |xs| xs.over_data())?;
        self.defword("rot", |xs| xs.rot_data())?;
        self.defword("rol", core_word_rol)?;
        self.defword("clear", core_word_clear)?;
        self.defword("depth", core_word_depth)?;
        self.defword("stack", core_word_stack)?;
        self.defword("unstack", core_word_unstack)?;
        self.defword("nil", |xs| xs.push_data(NIL))?;
        self.defword("true", |xs| xs.push_data(TRUE))?;
        self.defword("false", |xs| xs.push_data(FALSE))?;
        self.defword(".", core_word_display_top)?;
        self.defword("print", core_word_print)?;
        self.defword(".s", core_word_display_stack)?;
        self.defword("vars", core_word_vars)?;
        self.defword("&", core_word_invoke)?;
        self.defword("eval", core_word_eval)?;
        self.defword("load", core_word_load)?;
        self.defword("step", core_word_step)?;
        OK
    }

    pub fn push_data(&mut self, data: Cell) -> Xresult {
        if self.data_stack.len() >= STACK_CAPACITY - STACK_RESERVE {
            self.data_stack.clear();
            self.list_marks.clear();
            return Err(Xerr::StackOverflow(STACK_CAPACITY));
        }
        self.data_stack.push(data);
        OK
    }

    /// Pop the top value, `tag` names the expected operand in the error.
    pub fn pop_data(&mut self, tag: &str) -> Xresult1<Cell> {
        self.data_stack
            .pop()
            .ok_or_else(|| Xerr::StackUnderflow(Xstr::from(tag)))
    }

    /// Pop a block or function value.
    pub fn pop_block(&mut self, tag: &str) -> Xresult1<Cell> {
        let val = self.pop_data(tag)?;
        if val.is_invocable() {
            Ok(val)
        } else {
            Err(Xerr::ExpectingBlock(val))
        }
    }

    pub fn get_data(&self, idx: usize) -> Option<&Cell> {
        self.data_stack.iter().rev().nth(idx)
    }

    pub fn data_depth(&self) -> usize {
        self.data_stack.len()
    }

    pub(crate) fn top_data(&self) -> Xresult1<&Cell> {
        self.data_stack
            .last()
            .ok_or_else(|| Xerr::StackUnderflow(Xstr::from("top")))
    }

    fn drop_data(&mut self) -> Xresult {
        self.pop_data("value")?;
        OK
    }

    fn dup_data(&mut self) -> Xresult {
        let val = self.top_data()?.clone();
        self.push_data(val)
    }

    fn swap_data(&mut self) -> Xresult {
        let len = self.data_stack.len();
        if len >= 2 {
            self.data_stack.swap(len - 1, len - 2);
            OK
        } else {
            Err(Xerr::StackUnderflow(Xstr::from("operand2")))
        }
    }

    fn rot_data(&mut self) -> Xresult {
        let len = self.data_stack.len();
        if len >= 3 {
            let x = self.data_stack.remove(len - 3);
            self.data_stack.push(x);
            OK
        } else {
            Err(Xerr::StackUnderflow(Xstr::from("operand3")))
        }
    }

    fn over_data(&mut self) -> Xresult {
        let len = self.data_stack.len();
        if len >= 2 {
            let val = self.data_stack[len - 2].clone();
            self.push_data(val)
        } else {
            Err(Xerr::StackUnderflow(Xstr::from("operand2")))
        }
    }

    pub(crate) fn list_begin(&mut self) -> Xresult {
        self.list_marks.push(self.data_stack.len());
        OK
    }

    pub(crate) fn list_end(&mut self) -> Xresult {
        let start = self.list_marks.pop().ok_or(Xerr::UnbalancedList)?;
        let start = start.min(self.data_stack.len());
        let v: Xvec = self.data_stack.drain(start..).collect();
        self.push_data(Cell::from(v))
    }

    pub fn call_stack(&self) -> &[Token] {
        &self.call_stack
    }

    fn push_frame(&mut self, tok: Token) -> Xresult {
        if self.call_stack.len() >= MAX_CALL_DEPTH {
            return Err(Xerr::CallStackOverflow(MAX_CALL_DEPTH));
        }
        self.call_stack.push(tok);
        OK
    }

    fn pop_frame(&mut self) {
        self.call_stack.pop();
    }

    /// Run ops in order until one fails or execution is stopped.
    pub fn evaluate(&mut self, unit: &Xunit) -> Xresult {
        for op in unit.iter() {
            if !self.keep_running {
                break;
            }
            if let Err(e) = self.step_op(op) {
                return Err(self.raise(e, Some(&op.tok)));
            }
        }
        OK
    }

    fn step_op(&mut self, op: &Op) -> Xresult {
        if self.stepping {
            self.debug_step(op)?;
        }
        self.run_op(op)
    }

    fn run_op(&mut self, op: &Op) -> Xresult {
        match &op.code {
            Opcode::Literal(val) => self.push_data(val.clone()),
            Opcode::Block(unit) => {
                let q = Quotation {
                    unit: unit.clone(),
                    tok: op.tok.clone(),
                    scope: self.scope.clone(),
                };
                self.push_data(Cell::Quot(Rc::new(q)))
            }
            Opcode::GetVar(name) => {
                let val = self
                    .lookup_var(name)
                    .ok_or_else(|| Xerr::UnresolvedVariable(name.clone()))?;
                self.push_data(val)
            }
            Opcode::SetVar(name) | Opcode::Bind(name) => {
                let val = self.pop_data(name)?;
                self.scope.bind(name.clone(), val);
                OK
            }
            Opcode::Local(name) => {
                let val = self
                    .scope
                    .lookup(name)
                    .ok_or_else(|| Xerr::UnresolvedVariable(name.clone()))?;
                if val.is_invocable() {
                    self.invoke(&val)
                } else {
                    self.push_data(val)
                }
            }
            Opcode::Dynamic(name) => {
                self.caller = Some(op.tok.clone());
                match self.lookup_var(name) {
                    Some(val) => self.invoke_dynamic(val),
                    // neither variable nor word, try a source unit
                    None => self.load(name),
                }
            }
            Opcode::Call(fid) => self.call_function(*fid),
            Opcode::NativeCall(x) => {
                self.caller = Some(op.tok.clone());
                (x.0)(self)
            }
            Opcode::ListBegin => self.list_begin(),
            Opcode::ListEnd => self.list_end(),
            Opcode::Quit => {
                self.quit = true;
                Err(Xerr::Quit)
            }
        }
    }

    pub(crate) fn call_function(&mut self, fid: usize) -> Xresult {
        let f = self.functions.get(fid).cloned().ok_or(Xerr::InternalError)?;
        let body = f.body.clone().ok_or_else(|| {
            Xerr::CompileError(Xstr::from(format!("function {} is not compiled yet", f.name)))
        })?;
        let scope = Scope::child(&f.parent);
        for name in f.params.iter().rev() {
            let val = self.pop_data(name)?;
            scope.bind(name.clone(), val);
        }
        for name in f.locals.iter() {
            scope.bind(name.clone(), NIL);
        }
        self.push_frame(f.def_tok.clone())?;
        let prev = std::mem::replace(&mut self.scope, scope);
        let res = self.evaluate(&body);
        self.scope = prev;
        self.pop_frame();
        res
    }

    /// Run a block or function value.
    pub fn invoke(&mut self, val: &Cell) -> Xresult {
        match val {
            Cell::Quot(q) if Rc::ptr_eq(&q.scope, &self.scope) => self.evaluate(&q.unit),
            Cell::Quot(q) => {
                let prev = std::mem::replace(&mut self.scope, q.scope.clone());
                let res = self.evaluate(&q.unit);
                self.scope = prev;
                res
            }
            Cell::Fun(Xfn::Interp(fid)) => self.call_function(*fid),
            Cell::Fun(Xfn::Native(x)) => (x.0)(self),
            val => Err(Xerr::ExpectingBlock(val.clone())),
        }
    }

    /// Scope a block runs in, functions and native words use the current one.
    pub(crate) fn block_scope(&self, val: &Cell) -> Xscope {
        match val {
            Cell::Quot(q) => q.scope.clone(),
            _ => self.scope.clone(),
        }
    }

    /// Invoke a block, a function, or resolve a string as a variable, a word
    /// or a source unit, in that order.
    pub fn invoke_dynamic(&mut self, val: Cell) -> Xresult {
        match val {
            Cell::Str(name) => {
                if let Some(val) = self.scope.lookup(&name).filter(Cell::is_invocable) {
                    self.invoke(&val)
                } else if let Some(xf) = self.dict_find(&name) {
                    self.invoke(&Cell::Fun(xf))
                } else {
                    self.load(&name)
                }
            }
            val if val.is_invocable() => self.invoke(&val),
            val => Err(Xerr::ExpectingBlock(val)),
        }
    }

    fn compile_source(&mut self, lex: &mut Lex, src: &str) -> Xresult1<Xunit> {
        let tokens = match lex.tokenize(src) {
            Ok(tokens) => tokens,
            Err(e) => {
                let tok = lex.last_token().cloned();
                return Err(self.raise(e, tok.as_ref()));
            }
        };
        let (_, unit) = self.compile(&tokens, 0, None, &[])?;
        Ok(unit)
    }

    pub(crate) fn eval_unit(&mut self, unit: &str, frame: Token, src: &str) -> Xresult {
        let mut lex = Lex::new(unit);
        let code = self.compile_source(&mut lex, src)?;
        if let Err(e) = self.push_frame(frame.clone()) {
            return Err(self.raise(e, Some(&frame)));
        }
        let res = self.evaluate(&code);
        self.pop_frame();
        res
    }

    /// Load a source unit, the extension is appended when missing. A unit
    /// that can't be read is reported and skipped.
    pub fn load(&mut self, name: &str) -> Xresult {
        let path = unit_path(name);
        match crate::file::read_source_file(&path) {
            Ok(src) => {
                let frame = Token::synthetic(&path, &path);
                self.eval_unit(&path, frame, &src)
            }
            Err(e) => {
                let tok = self.caller.clone();
                self.report_error(&e, tok.as_ref());
                OK
            }
        }
    }

    /// Evaluate source text in the current scope on behalf of the calling op.
    pub fn eval(&mut self, src: &str) -> Xresult {
        let frame = self
            .caller
            .clone()
            .unwrap_or_else(|| Token::synthetic("<eval>", "eval"));
        self.eval_unit("<eval>", frame, src)
    }

    /// Top level entry for one piece of input, clears the stop flag and
    /// the call stack left by previous input.
    pub fn interpret(&mut self, src: &str) -> Xresult {
        self.keep_running = true;
        self.call_stack.clear();
        self.list_marks.clear();
        let mut lex = std::mem::replace(&mut self.input, Lex::new("<input>"));
        let res = self.compile_source(&mut lex, src);
        self.input = lex;
        let code = res?;
        self.evaluate(&code)
    }

    /// Run a script file as the top level unit.
    pub fn run_file(&mut self, path: &str) -> Xresult {
        self.keep_running = true;
        self.call_stack.clear();
        self.caller = None;
        self.load(path)
    }
}

fn core_word_dup2(xs: &mut State) -> Xresult {
    let b = xs.pop_data("operand2")?;
    let a = xs.pop_data("operand1")?;
    xs.push_data(a.clone())?;
    xs.push_data(b.clone())?;
    xs.push_data(a)?;
    xs.push_data(b)
}

fn core_word_popd(xs: &mut State) -> Xresult {
    let top = xs.pop_data("operand2")?;
    xs.pop_data("operand1")?;
    xs.push_data(top)
}

fn core_word_swapd(xs: &mut State) -> Xresult {
    let c = xs.pop_data("operand3")?;
    let b = xs.pop_data("operand2")?;
    let a = xs.pop_data("operand1")?;
    xs.push_data(b)?;
    xs.push_data(a)?;
    xs.push_data(c)
}

fn core_word_rol(xs: &mut State) -> Xresult {
    let tos = xs.pop_data("tos")?;
    let b = xs.pop_data("v2")?;
    let a = xs.pop_data("v1")?;
    xs.push_data(tos)?;
    xs.push_data(a)?;
    xs.push_data(b)
}

fn core_word_clear(xs: &mut State) -> Xresult {
    xs.data_stack.clear();
    OK
}

fn core_word_depth(xs: &mut State) -> Xresult {
    let n = xs.data_depth();
    xs.push_data(Cell::from(n))
}

fn core_word_stack(xs: &mut State) -> Xresult {
    let v: Xvec = xs.data_stack.iter().cloned().collect();
    xs.push_data(Cell::from(v))
}

fn core_word_unstack(xs: &mut State) -> Xresult {
    let v = xs.pop_data("list")?.to_vec()?;
    for x in v.iter() {
        xs.push_data(x.clone())?;
    }
    OK
}

fn core_word_display_top(xs: &mut State) -> Xresult {
    let val = xs.pop_data("value")?;
    let mut s = stringify(&val);
    s.push('\n');
    xs.print(&s);
    OK
}

fn core_word_print(xs: &mut State) -> Xresult {
    let val = xs.pop_data("value")?;
    let s = stringify(&val);
    xs.print(&s);
    OK
}

pub(crate) fn format_stack(xs: &State, limit: usize) -> String {
    let mut buf = String::from("Stack:\n");
    for (i, x) in xs.data_stack.iter().rev().take(limit).enumerate() {
        buf.push_str(&format!("{}: {:?}\n", i, x));
    }
    buf
}

fn core_word_display_stack(xs: &mut State) -> Xresult {
    let s = format_stack(xs, 6);
    xs.print(&s);
    OK
}

fn core_word_vars(xs: &mut State) -> Xresult {
    let m = xs.scope.flatten();
    xs.push_data(Cell::StrDict(m))
}

fn core_word_invoke(xs: &mut State) -> Xresult {
    let val = xs.pop_data("programToInvoke")?;
    xs.invoke_dynamic(val)
}

fn core_word_eval(xs: &mut State) -> Xresult {
    let src = xs.pop_data("source")?.to_xstr()?;
    xs.eval(&src)
}

fn core_word_load(xs: &mut State) -> Xresult {
    let name = xs.pop_data("unitName")?.to_xstr()?;
    xs.load(&name)
}

fn core_word_step(xs: &mut State) -> Xresult {
    xs.stepping = true;
    OK
}
