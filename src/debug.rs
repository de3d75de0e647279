use crate::cell::*;
use crate::error::*;
use crate::lex::Token;
use crate::opcodes::Op;
use crate::state::*;

use owo_colors::OwoColorize;
use std::collections::VecDeque;
use std::fmt;

pub const MAX_TRACE_FRAMES: usize = 10;
const STEP_STACK_ROWS: usize = 6;

/// Line oriented input for the step debugger.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

#[cfg(feature = "stdio")]
pub struct StdinLines;

#[cfg(feature = "stdio")]
impl LineSource for StdinLines {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        use std::io::Write;
        print!("{}", prompt);
        let _ = std::io::stdout().flush();
        let mut buf = String::new();
        match std::io::stdin().read_line(&mut buf) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(buf),
        }
    }
}

// scripted input
impl LineSource for VecDeque<String> {
    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.pop_front()
    }
}

pub struct TokenLocation<'a> {
    pub tok: &'a Token,
    pub source: Option<(&'a str, usize)>,
}

impl<'a> TokenLocation<'a> {
    pub fn new(tok: &'a Token) -> Self {
        Self {
            tok,
            source: tok.code_line(),
        }
    }
}

impl<'a> fmt::Debug for TokenLocation<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "At: {}:{} {}", self.tok.unit, self.tok.line, self.tok.name)?;
        if let Some((line, col)) = self.source {
            writeln!(f, ">> {}", line)?;
            writeln!(f, ">> {:>1$}", '^', col + 1)?;
        }
        Ok(())
    }
}

/// Call frames most recent first, repeated frames are collapsed.
pub fn format_trace(frames: &[Token]) -> String {
    let mut buf = String::new();
    let mut prev: Option<&Token> = None;
    let mut n = 0;
    for tok in frames.iter().rev() {
        if prev.map(|p| p.unit == tok.unit && p.line == tok.line && p.name == tok.name) == Some(true) {
            continue;
        }
        prev = Some(tok);
        if n == MAX_TRACE_FRAMES {
            buf.push_str("  ...\n");
            break;
        }
        n += 1;
        buf.push_str(&format!("  at {}:{} {}\n", tok.unit, tok.line, tok.name));
    }
    buf
}

impl State {
    pub(crate) fn report_error(&mut self, err: &Xerr, tok: Option<&Token>) {
        let mut msg = match tok {
            Some(tok) => format!("Calling '{}': {:?}\n", tok.name, err),
            None => format!("{:?}\n", err),
        };
        if let Some(tok) = tok {
            msg.push_str(&format!("{:?}", TokenLocation::new(tok)));
        }
        if !self.call_stack().is_empty() {
            msg.push_str("Trace:\n");
            msg.push_str(&format_trace(self.call_stack()));
        }
        let msg = msg.trim_end().to_string();
        if self.colors {
            self.log_error(msg.red().to_string());
        } else {
            self.log_error(msg);
        }
    }

    pub fn set_step(&mut self, on: bool) {
        self.stepping = on;
    }

    pub fn set_line_source(&mut self, src: Box<dyn LineSource>) {
        self.debugger = Some(src);
    }

    fn read_debug_line(&mut self, prompt: &str) -> Option<String> {
        #[cfg(feature = "stdio")]
        if self.debugger.is_none() {
            self.debugger = Some(Box::new(StdinLines));
        }
        self.debugger.as_mut().and_then(|src| src.read_line(prompt))
    }

    fn print_var(&mut self, name: &str) {
        let msg = match self.lookup_var(name) {
            Some(val) => format!("{} = {:?}\n", name, val),
            None => format!("{} is not defined\n", name),
        };
        self.print(&msg);
    }

    /// Suspend before an op until the operator decides how to continue.
    pub(crate) fn debug_step(&mut self, op: &Op) -> Xresult {
        let loc = format!("{:?}", TokenLocation::new(&op.tok));
        let msg = if self.colors {
            loc.yellow().to_string()
        } else {
            loc
        };
        self.print(&msg);
        let stack = format_stack(self, STEP_STACK_ROWS);
        self.print(&stack);
        loop {
            let line = match self.read_debug_line("step> ") {
                Some(line) => line,
                None => {
                    self.stepping = false;
                    return OK;
                }
            };
            let line = line.trim();
            match line {
                "" | "s" => return OK,
                "c" => {
                    self.stepping = false;
                    return OK;
                }
                "q" => {
                    self.stepping = false;
                    return Err(Xerr::Aborted);
                }
                _ => {
                    let name = line
                        .strip_prefix("p ")
                        .or_else(|| line.strip_prefix("? "))
                        .map(|s| s.trim());
                    match name {
                        Some(name) if !name.is_empty() => self.print_var(name),
                        _ => self.print("s: step, c: continue, q: abort, p NAME: print variable\n"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(lines: &[&str]) -> Box<dyn LineSource> {
        Box::new(lines.iter().map(|s| s.to_string()).collect::<VecDeque<String>>())
    }

    #[test]
    fn test_error_location() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        assert_eq!(Err(Xerr::UnknownWord(Xstr::from("x"))), xs.interpret("1 2\n   x"));
        let lines: Vec<&str> = xs.console().unwrap().lines().collect();
        assert_eq!(lines[0], "Calling 'x': unknown word x");
        assert_eq!(lines[1], "At: <input>:2 x");
        assert_eq!(lines[2], ">>    x");
        assert_eq!(lines[3], ">>    ^");
    }

    #[test]
    fn test_error_reported_once() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        xs.interpret("def inner == drop ; def outer == inner ;").unwrap();
        assert!(xs.interpret("outer").is_err());
        let out = xs.console().unwrap().clone();
        assert_eq!(1, out.matches("Calling").count());
        assert!(out.starts_with("Calling 'drop': popping value 'value': stack is empty"));
        assert!(out.contains("Trace:"));
        let inner = out.find("at <input>:1 inner").unwrap();
        let outer = out.find("at <input>:1 outer").unwrap();
        assert!(inner < outer);
    }

    #[test]
    fn test_trace_format() {
        let frames: Vec<Token> = (0..15)
            .map(|i| Token::synthetic("u", if i < 3 { "a" } else { "b" }))
            .collect();
        let trace = format_trace(&frames);
        assert_eq!("  at u:0 b\n  at u:0 a\n", trace);
        let frames: Vec<Token> = (0..15)
            .map(|i| Token::synthetic("u", &format!("f{}", i)))
            .collect();
        let trace = format_trace(&frames);
        assert_eq!(11, trace.lines().count());
        assert!(trace.starts_with("  at u:0 f14\n"));
    }

    #[test]
    fn test_step_continue() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        xs.set_line_source(script(&["", "p x", "c"]));
        xs.interpret("5 !x step 1 2 +").unwrap();
        assert_eq!(Ok(Cell::Int(3)), xs.pop_data("x"));
        assert!(!xs.stepping);
        assert!(xs.console().unwrap().contains("x = 5"));
    }

    #[test]
    fn test_step_abort() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        xs.set_line_source(script(&["s", "q"]));
        xs.set_step(true);
        assert_eq!(Err(Xerr::Aborted), xs.interpret("1 2 3"));
        assert_eq!(1, xs.data_depth());
        assert!(xs.console().unwrap().contains("execution aborted"));
    }
}
