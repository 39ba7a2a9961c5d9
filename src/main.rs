use clap::{Arg, Command};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    endscript::init_tracing();

    let matches = Command::new("endscript")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A small scripting language with an interactive editor")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start the interactive editor")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    match matches.get_one::<String>("file") {
        Some(file_path) if !matches.get_flag("interactive") => run_file(file_path),
        _ => {
            endscript::start_repl();
            ExitCode::SUCCESS
        }
    }
}

fn run_file(file_path: &str) -> ExitCode {
    let path = Path::new(file_path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        return ExitCode::FAILURE;
    }

    match fs::read_to_string(path) {
        Ok(source) => match endscript::run(&source, Some(file_path)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        },
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            ExitCode::FAILURE
        }
    }
}
