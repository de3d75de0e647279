use quip::repl::console_repl;
use quip::state::*;

use getopts::Options;

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] [SCRIPT]", program);
    print!("{}", opts.usage(&brief));
}

fn run(args: Vec<String>) -> i32 {
    let mut opts = Options::new();
    opts.optmulti("e", "", "evaluate expression", "EXPR");
    opts.optflag("i", "", "enter interactive mode after running script");
    opts.optflag("d", "", "enable step debugging");
    opts.optflag("", "no-prelude", "do not load the prelude");
    opts.optflag("", "no-color", "disable colored diagnostics");
    opts.optflag("h", "help", "print this help");
    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            print_usage(&args[0], &opts);
            return 2;
        }
    };
    if matches.opt_present("h") {
        print_usage(&args[0], &opts);
        return 0;
    }
    let booted = if matches.opt_present("no-prelude") {
        State::new()
    } else {
        State::boot()
    };
    let mut xs = match booted {
        Ok(xs) => xs,
        Err(e) => {
            eprintln!("boot failed: {:?}", e);
            return 1;
        }
    };
    if matches.opt_present("no-color") {
        xs.set_colors(false);
    }
    if matches.opt_present("d") {
        xs.set_step(true);
    }
    let mut batch = false;
    for script in matches.free.iter() {
        batch = true;
        let _ = xs.run_file(script);
        if xs.is_quit() {
            return 0;
        }
    }
    for expr in matches.opt_strs("e") {
        batch = true;
        let _ = xs.interpret(&expr);
        if xs.is_quit() {
            return 0;
        }
    }
    if !batch || matches.opt_present("i") {
        console_repl(&mut xs, true);
    }
    0
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    // deep recursion in scripts needs a larger host stack
    let child = std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(move || run(args));
    let code = match child.map(|h| h.join()) {
        Ok(Ok(code)) => code,
        _ => 1,
    };
    std::process::exit(code);
}
