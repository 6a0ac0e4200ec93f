use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use pylite::interpreter;
use pylite::parser;
use pylite::runtime::{Closure, StandardContext};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let input_path = args.next();
    if args.next().is_some() {
        bail!("Only one input file is supported");
    }

    let source = if let Some(path) = input_path {
        fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let program = parser::parse(&source)?;

    let mut globals = Closure::new();
    let mut context = StandardContext::stdout();
    interpreter::run_program(&program, &mut globals, &mut context)?;
    Ok(())
}
