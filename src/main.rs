use std::io::{self, BufRead, IsTerminal, Read};

use nanolisp::arena::DEFAULT_CELL_CAPACITY;
use nanolisp::eval::Machine;
use nanolisp::reader;
use nanolisp::symbol::DEFAULT_ATOM_CAPACITY;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut cell_capacity = DEFAULT_CELL_CAPACITY;
    let mut atom_capacity = DEFAULT_ATOM_CAPACITY;
    let mut load_files: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--load" => {
                if i + 1 < args.len() {
                    load_files.push(args[i + 1].clone());
                    i += 2;
                } else {
                    eprintln!("--load requires a file path");
                    std::process::exit(1);
                }
            }
            "--cells" => {
                cell_capacity = numeric_flag(&args, i, "--cells");
                i += 2;
            }
            "--atoms" => {
                atom_capacity = numeric_flag(&args, i, "--atoms");
                i += 2;
            }
            "--help" | "-h" => {
                println!("Usage: nanolisp [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --load <file>    Evaluate a source file before reading stdin");
                println!("  --cells <n>      Cell arena capacity (default {})", DEFAULT_CELL_CAPACITY);
                println!("  --atoms <n>      Symbol pool size in bytes (default {})", DEFAULT_ATOM_CAPACITY);
                println!("  --help, -h       Show this help message");
                println!();
                println!("Environment variables:");
                println!("  RUST_LOG=trace   Enable evaluation tracing");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Try 'nanolisp --help' for usage information.");
                std::process::exit(1);
            }
        }
    }

    let mut machine = match Machine::new(cell_capacity, atom_capacity) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to initialize machine: {}", e);
            std::process::exit(1);
        }
    };

    for path in &load_files {
        load_file(&mut machine, path);
    }

    let stdin = io::stdin();

    if stdin.is_terminal() {
        println!("nanolisp");
        println!(
            "  Cells: {}/{} used, Symbols: {} interned",
            machine.arena.used(),
            machine.arena.capacity(),
            machine.symbols.count()
        );
        println!();
        run_interactive(&mut machine);
    } else {
        run_piped(&mut machine);
    }
}

fn numeric_flag(args: &[String], i: usize, flag: &str) -> usize {
    let Some(raw) = args.get(i + 1) else {
        eprintln!("{} requires a number", flag);
        std::process::exit(1);
    };
    match raw.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("{}: '{}' is not a number", flag, raw);
            std::process::exit(1);
        }
    }
}

/// Evaluate a source file, silently. Any error aborts the process.
fn load_file(machine: &mut Machine, path: &str) {
    let input = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let mut pos = 0;
    let mut count = 0;
    loop {
        match reader::read_one_at(&input, pos, &mut machine.arena, &mut machine.symbols) {
            Ok(Some((expr, new_pos))) => {
                pos = new_pos;
                count += 1;
                if let Err(e) = machine.eval_global(expr) {
                    eprintln!("{}: error at expression {}: {}", path, count, e);
                    std::process::exit(1);
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("{}: read error at position {}: {}", path, pos, e);
                std::process::exit(1);
            }
        }
    }
}

/// Interactive loop: accumulate lines until parens are balanced.
fn run_interactive(machine: &mut Machine) {
    let stdin = io::stdin();
    let mut buf = String::new();
    let mut depth: i32 = 0;

    loop {
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }

        // Track paren depth (naive but sufficient for well-formed input).
        for ch in line.chars() {
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }

        buf.push_str(&line);

        if depth <= 0 {
            depth = 0;
            let input = buf.trim().to_string();
            buf.clear();

            if input.is_empty() {
                continue;
            }

            eval_and_print(&input, machine);
        }
    }
}

/// Piped mode: read all input, then parse and evaluate one expression at
/// a time.
fn run_piped(machine: &mut Machine) {
    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("Failed to read input: {}", e);
        std::process::exit(1);
    }
    eval_and_print(&input, machine);
}

/// Evaluate every expression in a string. Each top-level form is echoed
/// back as `>` plus its parsed shape, then its result is printed on its
/// own line.
fn eval_and_print(input: &str, machine: &mut Machine) {
    let mut pos = 0;
    loop {
        match reader::read_one_at(input, pos, &mut machine.arena, &mut machine.symbols) {
            Ok(Some((expr, new_pos))) => {
                pos = new_pos;
                println!(">{}", machine.print(expr));
                match machine.eval_global(expr) {
                    Ok(val) => println!("{}", machine.print(val)),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("{}", e);
                break;
            }
        }
    }
}
