//! Stack traces and disassembly.
use core::fmt::Write;

use bytecode::{Instruction, decode_at};
use object::{CompiledUnit, FrameRef};

/// Render `instr` with any literal operand resolved against `unit`.
pub fn render_instruction(unit: &CompiledUnit, instr: &Instruction) -> String {
    let literal = match *instr {
        Instruction::PushLiteral { literal } | Instruction::PushGlobal { literal } => {
            unit.literal(literal)
        }
        Instruction::Send { selector, .. } | Instruction::SendSuper { selector, .. } => {
            unit.literal(selector)
        }
        Instruction::Dbg { file, .. } => unit.literal(file),
        Instruction::Block { block } => unit.block(block).map(|b| b.name.as_str()),
        _ => return instr.to_string(),
    };
    match literal {
        Some(text) => format!("{instr} ({text})"),
        None => format!("{instr} (?)"),
    }
}

/// Disassemble `unit` and, after it, every block nested in it.
pub fn disassemble(unit: &CompiledUnit) -> String {
    let mut out = String::new();
    disassemble_into(unit, &mut out);
    out
}

fn disassemble_into(unit: &CompiledUnit, out: &mut String) {
    let _ = writeln!(
        out,
        "{} (args: {}, locals: {})",
        unit.qualified_name, unit.num_args, unit.num_locals
    );
    if let Some(primitive) = unit.primitive {
        let _ = writeln!(out, "    <primitive {}>", primitive.name());
        return;
    }
    let mut pos = 0;
    while pos < unit.bytecode.len() {
        match decode_at(&unit.bytecode, pos) {
            Ok((instr, next)) => {
                let _ = writeln!(out, "    {pos:>4}  {}", render_instruction(unit, &instr));
                pos = next;
            }
            Err(err) => {
                let _ = writeln!(out, "    {pos:>4}  <{err}>");
                break;
            }
        }
    }
    for block in &unit.blocks {
        disassemble_into(block, out);
    }
}

/// One line per frame on the invoker chain, innermost first.
pub fn stack_trace(ctx: Option<&FrameRef>) -> String {
    let mut out = String::new();
    let mut current = ctx.cloned();
    while let Some(frame) = current {
        let f = frame.borrow();
        let executing = match decode_at(&f.unit.bytecode, f.current_ip) {
            Ok((instr, _)) => render_instruction(&f.unit, &instr),
            Err(_) => "<nothing>".to_string(),
        };
        let _ = writeln!(
            out,
            "    at {} locals={:?} stack={:?} ({}) executing {executing}",
            f.unit.qualified_name, f.locals, f.stack, f.location
        );
        current = f.invoker.clone();
    }
    out
}
