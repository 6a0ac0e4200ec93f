//! File-driven end-to-end tests: every directory under `tests/programs/`
//! holds a program plus its expected output or expected failure.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};

use pylite::fixtures::{CaseClass, load_cases};
use pylite::interpreter;
use pylite::parser;
use pylite::runtime::{BufferContext, Closure};

fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}

#[test]
fn runs_program_fixtures() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;

    for case in cases {
        let source = fs::read_to_string(&case.program_path)
            .with_context(|| format!("Reading {}", case.name))?;
        let parsed = parser::parse(&source);

        match case.spec.class {
            CaseClass::RuntimeSuccess => {
                ensure!(
                    case.spec.expected.exit_code == 0,
                    "Case {} expected exit code must be 0 for runtime_success",
                    case.name
                );
                let stdout_file = case
                    .spec
                    .expected
                    .stdout_file
                    .as_deref()
                    .with_context(|| format!("Missing stdout_file in {}", case.name))?;
                let expected = case.read_text(stdout_file)?;

                let program = parsed.with_context(|| format!("Parsing {}", case.name))?;
                let mut globals = Closure::new();
                let mut context = BufferContext::new();
                interpreter::run_program(&program, &mut globals, &mut context)
                    .with_context(|| format!("Running {}", case.name))?;

                assert_eq!(
                    normalize_output(&context.output()),
                    normalize_output(&expected),
                    "Output mismatch for {}",
                    case.name
                );
            }
            CaseClass::FrontendError => {
                ensure!(
                    case.spec.expected.exit_code == 1,
                    "Case {} expected exit code must be 1 for frontend_error",
                    case.name
                );
                let expected_error = case
                    .spec
                    .expected
                    .error_contains
                    .as_deref()
                    .with_context(|| format!("Missing error_contains in {}", case.name))?;
                let Err(error) = parsed else {
                    bail!("Expected frontend error in {}, but parsing succeeded", case.name);
                };
                let actual = error.to_string();
                ensure!(
                    actual.contains(expected_error),
                    "Expected frontend error containing '{expected_error}' in {}, got '{actual}'",
                    case.name
                );
            }
            CaseClass::RuntimeError => {
                ensure!(
                    case.spec.expected.exit_code == 1,
                    "Case {} expected exit code must be 1 for runtime_error",
                    case.name
                );
                let expected_error = case
                    .spec
                    .expected
                    .error_contains
                    .as_deref()
                    .with_context(|| format!("Missing error_contains in {}", case.name))?;
                let program = parsed.with_context(|| format!("Parsing {}", case.name))?;
                let mut globals = Closure::new();
                let mut context = BufferContext::new();
                let result = interpreter::run_program(&program, &mut globals, &mut context);
                let Err(error) = result else {
                    bail!("Expected runtime error in {}, but the program ran", case.name);
                };
                let actual = error.to_string();
                ensure!(
                    actual.contains(expected_error),
                    "Expected runtime error containing '{expected_error}' in {}, got '{actual}'",
                    case.name
                );
            }
        }
    }

    Ok(())
}
