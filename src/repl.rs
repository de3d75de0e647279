use crate::state::*;
use rustyline::error::ReadlineError;
use rustyline::Editor;

const HISTORY_FILE: &str = ".quip_history";

/// Read lines until `quit`, errors are reported by the interpreter itself.
pub fn console_repl(xs: &mut State, load_history: bool) {
    let mut rl = Editor::<()>::new();
    if load_history {
        let _ = rl.load_history(HISTORY_FILE);
    }
    loop {
        let readline = rl.readline("> ");
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str());
                if line.trim() == "quit" {
                    break;
                }
                let _ = xs.interpret(line.as_str());
                if xs.is_quit() {
                    break;
                }
                xs.print(&format!("[{}]\n", xs.data_depth()));
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    if load_history {
        if let Err(e) = rl.save_history(HISTORY_FILE) {
            println!("history save failed: {:}", e);
        }
    }
}
