use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use meowlang::builtins::BuiltinRegistry;
use meowlang::diag::MeowError;
use meowlang::interpreter::Interpreter;
use meowlang::parser;

fn main() -> Result<ExitCode> {
    let mut input_path: Option<PathBuf> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("usage: meowlang [script.miaou]");
                println!("Sans argument, le script est lu sur l'entrée standard.");
                return Ok(ExitCode::SUCCESS);
            }
            _ => {
                if input_path.is_some() {
                    bail!("Un seul fichier script est accepté");
                }
                input_path = Some(PathBuf::from(arg));
            }
        }
    }

    let (source, filename, base_dir) = match input_path {
        Some(path) => {
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(_) => {
                    let error = MeowError::new("E900")
                        .with_detail("filename", path.display())
                        .with_instruction(path.display().to_string());
                    eprint!("{}", error.render(&path.display().to_string(), ""));
                    return Ok(ExitCode::FAILURE);
                }
            };
            let base_dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            (source, path.display().to_string(), base_dir)
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Lecture de l'entrée standard")?;
            (buffer, "<stdin>".to_string(), PathBuf::from("."))
        }
    };

    match execute(&source, &base_dir) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(error) => {
            eprint!("{}", error.render(&filename, &source));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn execute(source: &str, base_dir: &std::path::Path) -> Result<(), MeowError> {
    let program = parser::parse_source(source)?;
    Interpreter::new(BuiltinRegistry::standard(), base_dir)
        .run(&program)
        .map(|_| ())
}
