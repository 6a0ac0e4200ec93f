use std::io::{self, Write};

/// Host hook point for interpreter side effects. The evaluator only needs a
/// sink for `print`; anything richer (an input stream, a test double) hangs
/// off an implementation of this trait.
pub trait Context {
    fn output_stream(&mut self) -> &mut dyn Write;
}

/// Context writing straight through to any sink; the driver uses it with
/// stdout.
pub struct StandardContext<W: Write> {
    output: W,
}

impl<W: Write> StandardContext<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

impl<W: Write> Context for StandardContext<W> {
    fn output_stream(&mut self) -> &mut dyn Write {
        &mut self.output
    }
}

impl StandardContext<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

/// In-memory context for tests and harnesses.
#[derive(Default)]
pub struct BufferContext {
    buffer: Vec<u8>,
}

impl BufferContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as text.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

impl Context for BufferContext {
    fn output_stream(&mut self) -> &mut dyn Write {
        &mut self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_context_captures_writes() {
        let mut context = BufferContext::new();
        write!(context.output_stream(), "hi {}", 5).expect("write should succeed");
        assert_eq!(context.output(), "hi 5");
    }
}
