#![allow(dead_code)]

use std::io;

use object::Value;
use syntax::ast::File;
use vm::{Compiler, CompilerOptions, Program, TranscriptBuffer, Vm, VmError};

/// Route `log` output through the test harness; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn compile(file: File) -> Program {
    init_logging();
    Compiler::new(CompilerOptions::default())
        .compile(file)
        .expect("compile error")
}

pub fn run(file: File) -> Result<Value, VmError> {
    let program = compile(file);
    Vm::new(&program)?.with_transcript(io::sink()).run_main()
}

/// Run and also answer everything written to `Transcript`.
pub fn run_with_output(file: File) -> (Result<Value, VmError>, String) {
    let out = TranscriptBuffer::new();
    let program = compile(file);
    let result = Vm::new(&program).and_then(|vm| vm.with_transcript(out.clone()).run_main());
    (result, out.contents())
}
