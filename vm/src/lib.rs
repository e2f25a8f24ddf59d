pub mod compiler;
pub mod demos;
pub mod error;
pub mod interpreter;
pub mod materialize;
pub mod prelude;
pub mod primitives;
pub mod trace;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use object::{ClassDescriptor, FrameRef, GlobalNamespace, Value};
use syntax::ast::File;

pub use compiler::{CompiledClass, Compiler, CompilerOptions, Program};
pub use error::{CompileError, Error, ErrorKind, Result, VmError};
pub use trace::disassemble;

#[derive(Debug, Clone, Copy, Default)]
pub struct VmOptions {
    /// Log every executed instruction at `trace` level.
    pub trace: bool,
}

/// A virtual machine over one compiled program.
///
/// The VM is single-threaded: values share state through `Rc`, so a VM and
/// everything it produces stay on the thread that created them.
pub struct Vm {
    globals: GlobalNamespace,
    options: VmOptions,
    transcript: Box<dyn Write>,
    /// Frame currently executing; `None` when idle.
    pub(crate) ctx: Option<FrameRef>,
}

impl Vm {
    /// Build the classes of `program` and a VM that writes its transcript
    /// to stdout.
    pub fn new(program: &Program) -> Result<Self> {
        Ok(Self::from_globals(materialize::build_globals(program)?))
    }

    pub fn from_globals(globals: GlobalNamespace) -> Self {
        Self {
            globals,
            options: VmOptions::default(),
            transcript: Box::new(io::stdout()),
            ctx: None,
        }
    }

    pub fn with_options(mut self, options: VmOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_transcript(mut self, sink: impl Write + 'static) -> Self {
        self.transcript = Box::new(sink);
        self
    }

    pub fn options(&self) -> VmOptions {
        self.options
    }

    pub fn globals(&self) -> &GlobalNamespace {
        &self.globals
    }

    pub fn lookup_class(&self, name: &str) -> Option<Rc<ClassDescriptor>> {
        self.globals.lookup_class(name).cloned()
    }

    pub(crate) fn write_transcript(&mut self, text: &str) -> Result<()> {
        self.transcript
            .write_all(text.as_bytes())
            .and_then(|_| self.transcript.flush())
            .map_err(|err| VmError::new(ErrorKind::Other, format!("transcript: {err}")))
    }
}

/// Transcript sink that keeps everything written to it, for embedding
/// and tests. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct TranscriptBuffer(Rc<RefCell<Vec<u8>>>);

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for TranscriptBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Compile `file` with the kernel prelude and run its top-level code.
pub fn run_file(
    file: File,
    compiler: &CompilerOptions,
    options: VmOptions,
    transcript: impl Write + 'static,
) -> Result<Value, Error> {
    let program = Compiler::new(compiler.clone()).compile(file)?;
    let mut vm = Vm::new(&program)?
        .with_options(options)
        .with_transcript(transcript);
    Ok(vm.run_main()?)
}
