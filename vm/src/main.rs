use clap::Parser as ClapParser;
use std::{io, process};

use vm::demos::{self, Demo};
use vm::{Compiler, CompilerOptions, Program, Vm, VmOptions, disassemble};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bundled program to run
    #[arg(long, default_value = "arith", help = "Name of the demo program to run")]
    demo: String,

    /// List the bundled programs and exit
    #[arg(long, help = "List demo programs")]
    list: bool,

    /// Print classes and bytecode instead of executing
    #[arg(long, help = "Dump class layouts and disassembled bytecode")]
    dump: bool,

    /// Log every executed instruction (needs RUST_LOG=trace)
    #[arg(long, help = "Trace instruction execution")]
    trace: bool,

    /// Emit source position markers into the bytecode
    #[arg(long, help = "Generate debug location instructions")]
    dbg: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        for demo in demos::DEMOS {
            println!("{:<12} {}", demo.name, demo.description);
        }
        return;
    }

    let Some(demo) = demos::demo(&cli.demo) else {
        eprintln!(
            "Unknown demo '{}'; available: {}",
            cli.demo,
            demos::names().collect::<Vec<_>>().join(", ")
        );
        process::exit(1);
    };

    let options = CompilerOptions {
        file_name: format!("{}.st", demo.name),
        gen_dbg: cli.dbg,
    };
    let program = match Compiler::new(options).compile(demo.file()) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("Error compiling {}:\n{}", demo.name, err);
            process::exit(1);
        }
    };

    let vm = match Vm::new(&program) {
        Ok(vm) => vm,
        Err(err) => {
            eprintln!("Error loading {}: {}", demo.name, err.report());
            process::exit(1);
        }
    };

    if cli.dump {
        dump_program(&vm, &program, demo);
        return;
    }

    let mut vm = vm
        .with_options(VmOptions { trace: cli.trace })
        .with_transcript(io::stdout());
    match vm.run_main() {
        Ok(value) => println!("{}", value.debug_string()),
        Err(err) => {
            eprintln!("Error executing {}: {}", demo.name, err.report());
            process::exit(1);
        }
    }
}

/// Kernel classes only hold primitives and are skipped.
fn dump_program(vm: &Vm, program: &Program, demo: &Demo) {
    println!("== {} ==", demo.name);
    println!("globals: {}", vm.globals().names().collect::<Vec<_>>().join(" "));
    for class in &program.classes {
        if class.methods.iter().all(|m| m.is_primitive()) {
            continue;
        }
        if let Some(descriptor) = vm.lookup_class(&class.name) {
            println!("{}", descriptor.describe());
        }
        for method in &class.methods {
            print!("{}", disassemble(method));
        }
        println!();
    }
}
