use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pylite::interpreter;
use pylite::lexer;
use pylite::parser;
use pylite::runtime::{BufferContext, Closure};

const FIB_PROGRAM: &str = "\
class Math:
  def fib(n):
    if n < 2:
      return n
    return self.fib(n - 1) + self.fib(n - 2)

m = Math()
print m.fib(15)
";

fn repeated_arithmetic_program() -> String {
    let mut source = String::from("total = 0\n");
    for i in 0..200 {
        source.push_str(&format!("total = total + {i} * 3 - {i} / 2\n"));
    }
    source.push_str("print total\n");
    source
}

fn bench_frontend(c: &mut Criterion) {
    let source = repeated_arithmetic_program();

    c.bench_function("frontend_tokenize", |b| {
        b.iter(|| {
            let out = lexer::tokenize(black_box(&source)).expect("tokenize");
            black_box(out);
        })
    });

    c.bench_function("frontend_tokenize_parse", |b| {
        b.iter(|| {
            let out = parser::parse(black_box(&source)).expect("parse");
            black_box(out);
        })
    });
}

fn bench_interpreter(c: &mut Criterion) {
    for (label, source) in [
        ("arithmetic", repeated_arithmetic_program()),
        ("fib", FIB_PROGRAM.to_string()),
    ] {
        let program = parser::parse(&source).expect("parse");

        c.bench_function(&format!("interpreter_run_{label}"), |b| {
            b.iter(|| {
                let mut globals = Closure::new();
                let mut context = BufferContext::new();
                interpreter::run_program(black_box(&program), &mut globals, &mut context)
                    .expect("run");
                black_box(context.output());
            })
        });
    }
}

criterion_group!(benches, bench_frontend, bench_interpreter);
criterion_main!(benches);
