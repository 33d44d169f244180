//! Garnet Compiler CLI

use garnetc::commands::{build_files, check_file, explain_error, run_entry, CliOptions};
use garnetc::logging::init_tracing;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "build" => {
            let (options, files) = parse_options(&args[2..]);
            if files.is_empty() {
                eprintln!("Usage: garnetc build <file.ast>... [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  -o <path>               Output file (single input only)");
                eprintln!("  --emit=<kind>           Output: wat (default), ir");
                eprintln!("  --memory-pages=<n>      Initial linear memory pages (default: 1)");
                eprintln!("  --load-path=<dir>       Extra directory searched by require");
                eprintln!("  --frontend=<command>    Command producing AST dumps from .rb files");
                eprintln!("  --no-fold               Do not fold constant expressions");
                eprintln!("  --no-export-memory      Do not export the linear memory");
                eprintln!("  --color=<mode>          auto, always, never");
                std::process::exit(1);
            }
            match build_files(&files, &options) {
                Some(outputs) => {
                    for built in outputs {
                        println!("{} -> {}", built.input.display(), built.output.display());
                    }
                }
                None => std::process::exit(1),
            }
        }
        "check" => {
            let (options, files) = parse_options(&args[2..]);
            let [path] = files.as_slice() else {
                eprintln!("Usage: garnetc check <file.ast> [options]");
                std::process::exit(1);
            };
            if !check_file(path, &options) {
                std::process::exit(1);
            }
        }
        "run" => {
            let (options, rest) = parse_options(&args[2..]);
            let [path, entry, values @ ..] = rest.as_slice() else {
                eprintln!("Usage: garnetc run <file.ast> <Class.method> [args...] [options]");
                eprintln!();
                eprintln!("Calls a class method (Class.method) or an instance method on a new");
                eprintln!("object (Class#method) with integer arguments and prints the result.");
                std::process::exit(1);
            };
            if !run_entry(path, entry, values, &options) {
                std::process::exit(1);
            }
        }
        "explain" => {
            if args.len() < 3 {
                eprintln!("Usage: garnetc explain <error-code>");
                eprintln!("Example: garnetc explain E1001");
                std::process::exit(1);
            }
            if !explain_error(&args[2]) {
                std::process::exit(1);
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("garnetc {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

/// Parse command flags, exiting with the error on a bad one.
fn parse_options(args: &[String]) -> (CliOptions, Vec<String>) {
    match CliOptions::parse(args) {
        Ok((mut options, positional)) => {
            options.compile = options.compile.with_env_load_paths();
            (options, positional)
        }
        Err(message) => {
            eprintln!("error: {message}");
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Garnet Compiler");
    println!();
    println!("Usage: garnetc <command> [options]");
    println!();
    println!("Commands:");
    println!("  build <files...>        Compile AST dumps to WebAssembly text");
    println!("  check <file>            Compile without writing output");
    println!("  run <file> <entry> ...  Compile and evaluate one method");
    println!("  explain <code>          Explain an error code (e.g., E1001)");
    println!("  help                    Show this help message");
    println!("  version                 Show version information");
    println!();
    println!("Environment:");
    println!("  GARNET_PATH             Extra directories searched by require");
    println!("  RUST_LOG                Enable tracing, e.g. RUST_LOG=garnet_parse=debug");
}
