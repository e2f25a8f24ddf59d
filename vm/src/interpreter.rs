use std::rc::Rc;

use bytecode::{Instruction, decode_at};
use object::{ClassDescriptor, Closure, CompiledUnit, Frame, FrameRef, FrameStatus, Instance, SourceLocation, Value};
use syntax::{MAIN_CLASS, MAIN_SELECTOR};

use crate::error::{ErrorKind, Result, VmError};
use crate::primitives::{self, PrimitiveOutcome};
use crate::{Vm, trace};

impl Vm {
    /// Run `unit` as a method of `receiver` until it returns.
    pub fn exec(&mut self, receiver: Value, unit: Rc<CompiledUnit>, args: Vec<Value>) -> Result<Value> {
        if unit.is_primitive() {
            return Err(VmError::internal(format!(
                "{} is a primitive and has no code to run",
                unit.qualified_name
            )));
        }
        if args.len() != unit.num_args {
            return Err(VmError::internal(format!(
                "{} takes {} arguments, got {}",
                unit.qualified_name,
                unit.num_args,
                args.len()
            )));
        }
        let saved = self.ctx.take();
        self.ctx = Some(Frame::for_method(unit, receiver, args, None));
        let result = self.run();
        self.ctx = saved;
        result
    }

    /// Send `main` to a fresh `MainClass` instance. Answers nil when the
    /// program has no top-level code.
    pub fn run_main(&mut self) -> Result<Value> {
        let Some(class) = self.lookup_class(MAIN_CLASS) else {
            log::debug!("no {MAIN_CLASS}, nothing to run");
            return Ok(Value::Nil);
        };
        let Some(unit) = class.resolve_method(MAIN_SELECTOR, false) else {
            log::debug!("{MAIN_CLASS} has no {MAIN_SELECTOR} method");
            return Ok(Value::Nil);
        };
        log::debug!("running {}", unit.qualified_name);
        let receiver = Value::Object(Rc::new(Instance::new(class)));
        self.exec(receiver, unit, Vec::new())
    }

    fn run(&mut self) -> Result<Value> {
        loop {
            match self.step() {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(mut err) => {
                    if err.trace.is_empty() {
                        err.trace = trace::stack_trace(self.ctx.as_ref());
                    }
                    log::debug!("{}", err.report());
                    return Err(err);
                }
            }
        }
    }

    /// Execute one instruction of the current frame. Answers the result
    /// once the outermost frame has returned.
    fn step(&mut self) -> Result<Option<Value>> {
        let frame = self
            .ctx
            .clone()
            .ok_or_else(|| VmError::internal("no active frame"))?;

        let fetched = {
            let mut f = frame.borrow_mut();
            if f.ip >= f.unit.bytecode.len() {
                None
            } else {
                let (instr, next) = decode_at(&f.unit.bytecode, f.ip)?;
                f.current_ip = f.ip;
                f.ip = next;
                Some((instr, f.unit.clone()))
            }
        };
        let Some((instr, unit)) = fetched else {
            // Code without a final return answers its top of stack, or
            // the receiver when the stack is empty.
            let value = {
                let f = frame.borrow();
                f.top().cloned().unwrap_or_else(|| f.receiver.clone())
            };
            return Ok(self.finish_frame(&frame, value));
        };

        if self.options.trace {
            let f = frame.borrow();
            log::trace!(
                "{:>5} {:<32} {:<28} {:?}",
                f.current_ip,
                f.unit.qualified_name,
                trace::render_instruction(&unit, &instr),
                f.stack
            );
        }

        match instr {
            Instruction::Nil => push(&frame, Value::Nil),
            Instruction::SelfRef => {
                let receiver = frame.borrow().receiver.clone();
                push(&frame, receiver);
            }
            Instruction::True => push(&frame, Value::Boolean(true)),
            Instruction::False => push(&frame, Value::Boolean(false)),
            Instruction::PushChar { code } => {
                let c = char::from_u32(code as u32)
                    .ok_or_else(|| VmError::internal(format!("invalid character code {code}")))?;
                push(&frame, Value::Character(c));
            }
            Instruction::PushInt { value } => push(&frame, Value::Integer(value)),
            Instruction::PushFloat { value } => push(&frame, Value::Float(value)),
            Instruction::PushField { slot } => {
                let receiver = frame.borrow().receiver.clone();
                let value = with_field(&receiver, slot, |field| field.clone())?;
                push(&frame, value);
            }
            Instruction::PushLocal { depth, slot } => {
                let target = enclosing(&frame, depth)?;
                let value = target
                    .borrow()
                    .locals
                    .get(slot as usize)
                    .cloned()
                    .ok_or_else(|| VmError::internal(format!("no local {slot} at depth {depth}")))?;
                push(&frame, value);
            }
            Instruction::PushLiteral { literal } => {
                let text = literal_text(&unit, literal)?;
                push(&frame, Value::string(text));
            }
            Instruction::PushGlobal { literal } => {
                let name = literal_text(&unit, literal)?;
                let value = self.globals.lookup(name).cloned().ok_or_else(|| {
                    VmError::new(ErrorKind::UndefinedGlobal, format!("{name} is not defined"))
                })?;
                push(&frame, value);
            }
            Instruction::PushArray { count } => {
                let items = frame
                    .borrow_mut()
                    .pop_n(count as usize)
                    .ok_or_else(VmError::stack_underflow)?;
                push(&frame, Value::array(items));
            }
            Instruction::StoreField { slot } => {
                let (receiver, value) = {
                    let f = frame.borrow();
                    (f.receiver.clone(), f.top().cloned().ok_or_else(VmError::stack_underflow)?)
                };
                with_field(&receiver, slot, |field| *field = value)?;
            }
            Instruction::StoreLocal { depth, slot } => {
                let value = frame.borrow().top().cloned().ok_or_else(VmError::stack_underflow)?;
                let target = enclosing(&frame, depth)?;
                let mut scope = target.borrow_mut();
                let local = scope
                    .locals
                    .get_mut(slot as usize)
                    .ok_or_else(|| VmError::internal(format!("no local {slot} at depth {depth}")))?;
                *local = value;
            }
            Instruction::Pop => {
                frame.borrow_mut().pop().ok_or_else(VmError::stack_underflow)?;
            }
            Instruction::Send { argc, selector } => {
                self.dispatch_send(&frame, &unit, argc, selector, false)?
            }
            Instruction::SendSuper { argc, selector } => {
                self.dispatch_send(&frame, &unit, argc, selector, true)?
            }
            Instruction::Block { block } => {
                let block_unit = unit.block(block).cloned().ok_or_else(|| {
                    VmError::internal(format!("{} has no block {block}", unit.qualified_name))
                })?;
                let closure = Closure {
                    unit: block_unit,
                    frame: frame.clone(),
                };
                push(&frame, Value::Closure(Rc::new(closure)));
            }
            Instruction::BlockReturn => {
                let value = frame.borrow_mut().pop().ok_or_else(VmError::stack_underflow)?;
                return Ok(self.finish_frame(&frame, value));
            }
            Instruction::Return => return self.method_return(&frame),
            Instruction::Dbg { file, line, column } => {
                let file = literal_text(&unit, file)?.to_string();
                frame.borrow_mut().location = SourceLocation { file, line, column };
            }
        }
        Ok(None)
    }

    /// Look up and invoke `selector`. Primitives run in place; other
    /// methods get a new frame that becomes current.
    fn dispatch_send(
        &mut self,
        frame: &FrameRef,
        unit: &CompiledUnit,
        argc: u16,
        selector: u16,
        is_super: bool,
    ) -> Result<()> {
        let selector = literal_text(unit, selector)?;
        let argc = argc as usize;
        let receiver = frame
            .borrow()
            .peek(argc)
            .cloned()
            .ok_or_else(VmError::stack_underflow)?;
        let class_side = receiver.is_class();

        let class = if is_super {
            self.super_class_of(unit, selector)?
        } else {
            self.class_of(&receiver)?
        };
        let method = class
            .resolve_method(selector, class_side)
            .ok_or_else(|| not_understood(&class, &receiver, selector, class_side))?;
        if method.num_args != argc {
            return Err(VmError::internal(format!(
                "{} takes {} arguments, sent with {argc}",
                method.qualified_name, method.num_args
            )));
        }

        if let Some(primitive) = method.primitive {
            if let PrimitiveOutcome::Value(value) = primitives::perform(self, frame, primitive)? {
                push(frame, value);
            }
            return Ok(());
        }

        let (receiver, args) = {
            let mut f = frame.borrow_mut();
            let args = f.pop_n(argc).ok_or_else(VmError::stack_underflow)?;
            let receiver = f.pop().ok_or_else(VmError::stack_underflow)?;
            (receiver, args)
        };
        self.ctx = Some(Frame::for_method(method, receiver, args, Some(frame.clone())));
        Ok(())
    }

    /// Activate `closure` with `args`, invoked from `frame`.
    pub(crate) fn activate_block(
        &mut self,
        frame: &FrameRef,
        closure: &Closure,
        args: Vec<Value>,
    ) -> Result<PrimitiveOutcome> {
        if closure.unit.num_args != args.len() {
            return Err(VmError::new(
                ErrorKind::MismatchedBlockArg,
                format!(
                    "{} expects {} arguments, got {}",
                    closure.unit.name,
                    closure.unit.num_args,
                    args.len()
                ),
            ));
        }
        self.ctx = Some(Frame::for_block(closure, args, Some(frame.clone())));
        Ok(PrimitiveOutcome::Activated)
    }

    pub(crate) fn class_of(&self, receiver: &Value) -> Result<Rc<ClassDescriptor>> {
        match receiver {
            Value::Class(class) => Ok(class.clone()),
            Value::Object(instance) => Ok(instance.class.clone()),
            other => self.lookup_class(other.class_name()).ok_or_else(|| {
                VmError::new(
                    ErrorKind::UnknownClass,
                    format!("kernel class {} is not loaded", other.class_name()),
                )
            }),
        }
    }

    fn super_class_of(&self, unit: &CompiledUnit, selector: &str) -> Result<Rc<ClassDescriptor>> {
        let owner = unit
            .owner
            .as_deref()
            .ok_or_else(|| VmError::internal(format!("{} has no owning class", unit.qualified_name)))?;
        let class = self.lookup_class(owner).ok_or_else(|| {
            VmError::new(ErrorKind::UnknownClass, format!("class {owner} is not defined"))
        })?;
        class.superclass.clone().ok_or_else(|| {
            VmError::new(
                ErrorKind::MessageNotUnderstood,
                format!("{owner} has no superclass to receive super {selector}"),
            )
        })
    }

    /// Hand `value` to the frame's invoker and make the invoker current.
    fn finish_frame(&mut self, frame: &FrameRef, value: Value) -> Option<Value> {
        let invoker = {
            let mut f = frame.borrow_mut();
            f.status = FrameStatus::Returned;
            f.invoker.clone()
        };
        self.ctx = invoker.clone();
        match invoker {
            Some(invoker) => {
                push(&invoker, value);
                None
            }
            None => Some(value),
        }
    }

    /// `Return`: exit the home method of `frame`, abandoning every frame
    /// between them.
    fn method_return(&mut self, frame: &FrameRef) -> Result<Option<Value>> {
        if frame.borrow().top().is_none() {
            return Err(VmError::stack_underflow());
        }
        let home = Frame::home(frame).ok_or_else(|| {
            VmError::new(ErrorKind::BlockCannotReturn, "home context no longer exists")
        })?;
        let home_name = home.borrow().unit.qualified_name.clone();
        let status = home.borrow().status;
        match status {
            FrameStatus::Active => {}
            FrameStatus::Returned => {
                return Err(VmError::new(
                    ErrorKind::BlockCannotReturn,
                    format!("{home_name} has already returned"),
                ));
            }
            FrameStatus::Abandoned => {
                return Err(VmError::new(
                    ErrorKind::BlockCannotReturn,
                    format!("{home_name} was unwound by a non-local return"),
                ));
            }
        }

        let mut unwound = Vec::new();
        let mut current = frame.clone();
        while !Rc::ptr_eq(&current, &home) {
            let next = current.borrow().invoker.clone();
            unwound.push(current);
            current = next.ok_or_else(|| {
                VmError::new(
                    ErrorKind::BlockCannotReturn,
                    format!("{home_name} is not on the call chain"),
                )
            })?;
        }
        let value = frame.borrow_mut().pop().ok_or_else(VmError::stack_underflow)?;
        for f in unwound {
            f.borrow_mut().status = FrameStatus::Abandoned;
        }
        Ok(self.finish_frame(&home, value))
    }
}

fn push(frame: &FrameRef, value: Value) {
    frame.borrow_mut().push(value);
}

fn enclosing(frame: &FrameRef, depth: u16) -> Result<FrameRef> {
    Frame::enclosing(frame, depth)
        .ok_or_else(|| VmError::internal(format!("no enclosing frame at depth {depth}")))
}

fn literal_text(unit: &CompiledUnit, idx: u16) -> Result<&str> {
    unit.literal(idx).ok_or_else(|| {
        VmError::internal(format!("{} has no literal {idx}", unit.qualified_name))
    })
}

fn with_field<R>(receiver: &Value, slot: u16, f: impl FnOnce(&mut Value) -> R) -> Result<R> {
    let Value::Object(instance) = receiver else {
        return Err(VmError::new(
            ErrorKind::UnknownField,
            format!("{} has no fields", receiver.debug_string()),
        ));
    };
    let mut fields = instance.fields.borrow_mut();
    let field = fields.get_mut(slot as usize).ok_or_else(|| {
        VmError::new(
            ErrorKind::UnknownField,
            format!("{} has no field {slot}", instance.class.name),
        )
    })?;
    Ok(f(field))
}

fn not_understood(class: &ClassDescriptor, receiver: &Value, selector: &str, class_side: bool) -> VmError {
    if class.resolve_method(selector, !class_side).is_some() {
        if class_side {
            VmError::new(
                ErrorKind::MessageNotUnderstood,
                format!("{selector} is an instance method sent to class object {}", class.name),
            )
        } else {
            VmError::new(
                ErrorKind::ClassMessageSentToInstance,
                format!("{selector} is a class method sent to instance of {}", class.name),
            )
        }
    } else {
        VmError::new(
            ErrorKind::MessageNotUnderstood,
            format!("{} does not understand #{selector}", receiver.debug_string()),
        )
    }
}
