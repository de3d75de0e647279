use crate::cell::Xstr;
use crate::error::*;

/// Lexeme with enough context to point back into the source.
#[derive(Clone, PartialEq)]
pub struct Token {
    pub unit: Xstr,
    pub name: Xstr,
    // whole text given to the tokenizer
    pub text: Xstr,
    pub line: usize,
    // byte offset of the lexeme in text
    pub offset: usize,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} {:?}", self.unit, self.line, self.name.as_str())
    }
}

impl Token {
    /// Token that has no source text, used for call frames of whole units.
    pub fn synthetic(unit: &str, name: &str) -> Self {
        Token {
            unit: Xstr::from(unit),
            name: Xstr::from(name),
            text: Xstr::new(),
            line: 0,
            offset: 0,
        }
    }

    /// Source line containing the token and the column of its first char.
    pub fn code_line(&self) -> Option<(&str, usize)> {
        let buf = self.text.as_bytes();
        if self.offset >= buf.len() {
            return None;
        }
        let start = memchr::memrchr(b'\n', &buf[..self.offset])
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = memchr::memchr(b'\n', &buf[self.offset..])
            .map(|i| self.offset + i)
            .unwrap_or(buf.len());
        let line = self.text.get(start..end)?.trim_end_matches('\r');
        let col = self.text.get(start..self.offset)?.chars().count();
        Some((line, col))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Mode {
    Normal,
    Str,
    Char,
    Regex,
    Comment,
}

fn is_schar(c: char) -> bool {
    match c {
        ';' | '[' | ']' | '{' | '}' => true,
        _ => false,
    }
}

fn unescape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        '"' => Some('"'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'e' => Some('\x1b'),
        '\\' => Some('\\'),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct Lex {
    unit: Xstr,
    line: usize,
    last: Option<Token>,
}

struct Pending {
    buf: String,
    offset: usize,
    line: usize,
}

impl Lex {
    pub fn new(unit: &str) -> Self {
        Self {
            unit: Xstr::from(unit),
            line: 1,
            last: None,
        }
    }

    pub fn unit(&self) -> &Xstr {
        &self.unit
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn reset(&mut self) {
        self.line = 1;
        self.last = None;
    }

    /// Position of the last failure.
    pub fn last_token(&self) -> Option<&Token> {
        self.last.as_ref()
    }

    fn make_token(&self, text: &Xstr, p: &Pending) -> Token {
        Token {
            unit: self.unit.clone(),
            name: Xstr::from(p.buf.as_str()),
            text: text.clone(),
            line: p.line,
            offset: p.offset,
        }
    }

    fn fail(&mut self, text: &Xstr, p: &Pending, start_line: usize, msg: &str) -> Xerr {
        self.last = Some(self.make_token(text, p));
        self.line = start_line;
        Xerr::LexError(Xstr::from(msg))
    }

    /// Split text into tokens. Either every token of the text is returned
    /// or none of them.
    pub fn tokenize(&mut self, text: &str) -> Xresult1<Vec<Token>> {
        let text = Xstr::from(text);
        let start_line = self.line;
        let mut tokens = Vec::new();
        let mut mode = Mode::Normal;
        let mut p = Pending {
            buf: String::new(),
            offset: 0,
            line: self.line,
        };
        let mut brackets = 0isize;
        let mut braces = 0isize;
        let mut it = text.char_indices().peekable();

        macro_rules! flush {
            () => {
                if !p.buf.is_empty() {
                    if p.buf.len() > 1 && p.buf.starts_with(':') {
                        p.buf = format!("\"{}\"", &p.buf[1..]);
                    }
                    tokens.push(self.make_token(&text, &p));
                    p.buf.clear();
                }
            };
        }

        while let Some((i, c)) = it.next() {
            if p.buf.is_empty() {
                p.offset = i;
                p.line = self.line;
            }
            match mode {
                Mode::Comment => {
                    if c == '\n' {
                        self.line += 1;
                        mode = Mode::Normal;
                    }
                }
                Mode::Normal if c.is_whitespace() => {
                    flush!();
                    if c == '\n' {
                        self.line += 1;
                    }
                }
                Mode::Normal if c == '#' => {
                    flush!();
                    mode = Mode::Comment;
                }
                Mode::Normal if is_schar(c) => {
                    flush!();
                    p.offset = i;
                    p.line = self.line;
                    p.buf.push(c);
                    match c {
                        '[' => brackets += 1,
                        ']' => brackets -= 1,
                        '{' => braces += 1,
                        '}' => braces -= 1,
                        _ => (),
                    }
                    if brackets < 0 {
                        return Err(self.fail(&text, &p, start_line, "unbalanced ]"));
                    }
                    if braces < 0 {
                        return Err(self.fail(&text, &p, start_line, "unbalanced }"));
                    }
                    flush!();
                }
                Mode::Normal if c == '"' => {
                    flush!();
                    p.offset = i;
                    p.line = self.line;
                    p.buf.push(c);
                    mode = Mode::Str;
                }
                Mode::Normal if c == '\'' && p.buf.is_empty() => {
                    p.buf.push(c);
                    mode = Mode::Char;
                }
                Mode::Normal if c == 'r' && p.buf.is_empty() && it.peek().map(|x| x.1) == Some('/') => {
                    it.next();
                    p.buf.push_str("r/");
                    mode = Mode::Regex;
                }
                Mode::Normal => p.buf.push(c),
                Mode::Str | Mode::Char => {
                    let quote = if mode == Mode::Str { '"' } else { '\'' };
                    if c == '\\' {
                        match it.next() {
                            Some((_, '\'')) if mode == Mode::Char => p.buf.push('\''),
                            Some((_, e)) => match unescape(e) {
                                Some(x) => p.buf.push(x),
                                None => {
                                    p.buf.push('\\');
                                    p.buf.push(e);
                                }
                            },
                            None => break,
                        }
                    } else if c == quote {
                        p.buf.push(c);
                        if mode == Mode::Char && p.buf.chars().count() != 3 {
                            return Err(self.fail(&text, &p, start_line, "invalid character literal"));
                        }
                        mode = Mode::Normal;
                        flush!();
                    } else if c == '\n' && mode == Mode::Char {
                        return Err(self.fail(&text, &p, start_line, "unterminated character literal"));
                    } else {
                        if c == '\n' {
                            self.line += 1;
                        }
                        p.buf.push(c);
                    }
                }
                Mode::Regex => {
                    if c == '\\' {
                        match it.next() {
                            Some((_, '/')) => p.buf.push('/'),
                            Some((_, e)) => {
                                p.buf.push('\\');
                                p.buf.push(e);
                            }
                            None => break,
                        }
                    } else if c == '/' {
                        p.buf.push(c);
                        mode = Mode::Normal;
                        flush!();
                    } else {
                        if c == '\n' {
                            self.line += 1;
                        }
                        p.buf.push(c);
                    }
                }
            }
        }
        match mode {
            Mode::Str => return Err(self.fail(&text, &p, start_line, "unterminated string")),
            Mode::Char => return Err(self.fail(&text, &p, start_line, "unterminated character literal")),
            Mode::Regex => return Err(self.fail(&text, &p, start_line, "unterminated regex")),
            _ => flush!(),
        }
        if brackets != 0 || braces != 0 {
            let msg = if brackets != 0 { "unbalanced [" } else { "unbalanced {" };
            let p = tokens
                .iter()
                .rev()
                .find(|t| t.name.as_str() == "[" || t.name.as_str() == "{")
                .map(|t| Pending {
                    buf: t.name.to_string(),
                    offset: t.offset,
                    line: t.line,
                })
                .unwrap_or(p);
            return Err(self.fail(&text, &p, start_line, msg));
        }
        self.last = None;
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(src: &str) -> Vec<String> {
        Lex::new("test")
            .tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect()
    }

    #[test]
    fn test_lex_ws() {
        assert!(lexemes("\n\t").is_empty());
        assert!(lexemes("\n\t#567").is_empty());
        assert_eq!(vec!["a"], lexemes("a#b"));
        let mut lex = Lex::new("test");
        let toks = lex.tokenize(" abcde \n123").unwrap();
        assert_eq!(toks[0].name.as_str(), "abcde");
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[0].offset, 1);
        assert_eq!(toks[1].name.as_str(), "123");
        assert_eq!(toks[1].line, 2);
        assert_eq!(Some(("123", 0)), toks[1].code_line());
        assert_eq!(Some((" abcde ", 1)), toks[0].code_line());
        assert_eq!(2, lex.line());
    }

    #[test]
    fn test_lex_schar() {
        assert_eq!(
            vec!["{", "aa", ":", "+", "[", "bb", "]", "cc", ";", "}", ";"],
            lexemes("{aa : +[bb]cc;};")
        );
        assert_eq!(vec!["\"foo\"", ":", "!x", "@y", "&z"], lexemes(":foo : !x @y &z"));
    }

    #[test]
    fn test_lex_str() {
        assert_eq!(vec!["\"a b\"", "x"], lexemes("\"a b\"x"));
        assert_eq!(vec!["\"[{;\""], lexemes("\"[{;\""));
        assert_eq!(vec!["\"a\nb\t\\\"\""], lexemes(r#""a\nb\t\\\"""#));
        assert_eq!(vec!["\"\x1b\r\""], lexemes(r#""\e\r""#));
        // unknown escapes are kept as is
        assert_eq!(vec!["\"\\q\""], lexemes(r#""\q""#));
        let mut lex = Lex::new("test");
        let toks = lex.tokenize("\"a\nb\" c").unwrap();
        assert_eq!(2, toks[1].line);
    }

    #[test]
    fn test_lex_str_after_word() {
        assert_eq!(vec!["a", "\"b c\"", "d"], lexemes("a\"b c\"d"));
        let mut lex = Lex::new("test");
        let toks = lex.tokenize("xy\"z\"").unwrap();
        assert_eq!(2, toks[1].offset);
    }

    #[test]
    fn test_lex_char() {
        assert_eq!(vec!["'x'", "' '", "'\n'", "'\''"], lexemes(r"'x' ' ' '\n' '\''"));
        let mut lex = Lex::new("test");
        assert!(matches!(lex.tokenize("'xy'"), Err(Xerr::LexError(_))));
        assert!(matches!(lex.tokenize("'x"), Err(Xerr::LexError(_))));
        assert!(matches!(lex.tokenize("''"), Err(Xerr::LexError(_))));
    }

    #[test]
    fn test_lex_regex() {
        assert_eq!(vec!["r/a b/", "x"], lexemes("r/a b/ x"));
        assert_eq!(vec![r"r/\d+\.//"], lexemes(r"r/\d+\.\//"));
        assert_eq!(vec!["r"], lexemes("r"));
        let mut lex = Lex::new("test");
        assert!(matches!(lex.tokenize("r/abc"), Err(Xerr::LexError(_))));
    }

    #[test]
    fn test_lex_atomic_failure() {
        let mut lex = Lex::new("test");
        lex.tokenize("a\nb\n").unwrap();
        assert_eq!(3, lex.line());
        for src in ["[ 1 2", "1 ]", "{ { }", "} {", "\"abc", "x\n\"y"].iter() {
            assert!(matches!(lex.tokenize(src), Err(Xerr::LexError(_))), "{}", src);
            assert_eq!(3, lex.line());
            assert!(lex.last_token().is_some());
        }
        assert_eq!("]", lex.tokenize("1 ]").err().and(lex.last_token()).unwrap().name.as_str());
    }

    #[test]
    fn test_lex_roundtrip() {
        let src = "def f a b == [ 1 2.5 \"s t\" ] { a b + } 'c' r/x y/ ; :k f";
        let first = lexemes(src);
        let second = lexemes(&first.join(" "));
        assert_eq!(first, second);
    }
}
