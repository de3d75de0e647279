use crate::cell::*;
use crate::error::*;
use crate::state::*;

use std::io::Read;

fn ioerror_with_path(filename: &str, e: &std::io::Error) -> Xerr {
    Xerr::IOError {
        filename: Xstr::from(filename),
        reason: Xstr::from(e.to_string()),
    }
}

pub fn read_all(path: &str) -> Xresult1<Vec<u8>> {
    let mut file = std::fs::File::open(path).map_err(|e| ioerror_with_path(path, &e))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .map_err(|e| ioerror_with_path(path, &e))?;
    Ok(buf)
}

pub fn read_source_file(path: &str) -> Xresult1<String> {
    let buf = read_all(path)?;
    String::from_utf8(buf).map_err(|e| Xerr::IOError {
        filename: Xstr::from(path),
        reason: Xstr::from(e.to_string()),
    })
}

pub fn load(xs: &mut State) -> Xresult {
    xs.defword("file:read", file_read)?;
    xs.defword("file:readlines", file_readlines)?;
    xs.defword("file:exists?", file_exists)?;
    OK
}

// read errors are reported and leave nil
fn read_or_report(xs: &mut State, path: &str) -> Option<String> {
    match read_source_file(path) {
        Ok(s) => Some(s),
        Err(e) => {
            let tok = xs.caller.clone();
            xs.report_error(&e, tok.as_ref());
            None
        }
    }
}

fn file_read(xs: &mut State) -> Xresult {
    let path = xs.pop_data("fileToRead")?.to_xstr()?;
    let val = read_or_report(xs, &path).map(Cell::from).unwrap_or(NIL);
    xs.push_data(val)
}

fn file_readlines(xs: &mut State) -> Xresult {
    let path = xs.pop_data("fileToRead")?.to_xstr()?;
    let val = match read_or_report(xs, &path) {
        Some(text) => Cell::from(text.lines().map(Cell::from).collect::<Xvec>()),
        None => NIL,
    };
    xs.push_data(val)
}

fn file_exists(xs: &mut State) -> Xresult {
    let path = xs.pop_data("path")?.to_xstr()?;
    let yes = std::path::Path::new(path.as_str()).exists();
    xs.push_data(Cell::from(yes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_words() {
        let path = std::env::temp_dir().join(format!("quip-file-{}.txt", std::process::id()));
        std::fs::write(&path, "one\r\ntwo\nthree").unwrap();
        let name = path.to_string_lossy().to_string();
        let mut xs = State::boot().unwrap();
        xs.interpret(&format!("\"{}\" file:readlines", name)).unwrap();
        let v: Xvec = ["one", "two", "three"].iter().map(|s| Cell::from(*s)).collect();
        assert_eq!(Ok(Cell::from(v)), xs.pop_data("x"));
        xs.interpret(&format!("\"{}\" file:read len", name)).unwrap();
        assert_eq!(Ok(Cell::Int(14)), xs.pop_data("x"));
        xs.interpret(&format!("\"{}\" file:exists?", name)).unwrap();
        assert_eq!(Ok(TRUE), xs.pop_data("x"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let mut xs = State::boot().unwrap();
        xs.capture_stdout();
        xs.interpret("\"/no/such/file\" file:read 1").unwrap();
        assert_eq!(Ok(ONE), xs.pop_data("x"));
        assert_eq!(Ok(NIL), xs.pop_data("x"));
        assert!(xs.is_running());
        assert!(xs.console().unwrap().contains("/no/such/file"));
        xs.interpret("\"/no/such/file\" file:exists?").unwrap();
        assert_eq!(Ok(FALSE), xs.pop_data("x"));
    }
}
