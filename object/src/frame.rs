use core::fmt;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::unit::CompiledUnit;
use crate::value::{Closure, Value};

pub type FrameRef = Rc<RefCell<Frame>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Active,
    /// The frame answered a value to its invoker.
    Returned,
    /// Unwound by a non-local return passing through it.
    Abandoned,
}

/// Last source position recorded by a `Dbg` instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            Ok(())
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// Activation record of a method or block.
///
/// Frames sit on two chains: `invoker` is the dynamic caller that receives
/// the result, `lexical` is the frame whose locals enclose this block's
/// code. Method frames have no lexical parent and are their own home.
pub struct Frame {
    pub unit: Rc<CompiledUnit>,
    pub receiver: Value,
    pub stack: Vec<Value>,
    /// Arguments followed by declared locals.
    pub locals: Vec<Value>,
    /// Offset of the next instruction.
    pub ip: usize,
    /// Offset of the instruction being executed.
    pub current_ip: usize,
    pub invoker: Option<FrameRef>,
    pub lexical: Option<FrameRef>,
    home: Option<Weak<RefCell<Frame>>>,
    pub status: FrameStatus,
    pub location: SourceLocation,
}

impl Frame {
    fn new(unit: Rc<CompiledUnit>, receiver: Value, args: Vec<Value>, invoker: Option<FrameRef>) -> Self {
        let mut locals = args;
        locals.resize(unit.frame_size().max(locals.len()), Value::Nil);
        Self {
            unit,
            receiver,
            stack: Vec::new(),
            locals,
            ip: 0,
            current_ip: 0,
            invoker,
            lexical: None,
            home: None,
            status: FrameStatus::Active,
            location: SourceLocation::default(),
        }
    }

    pub fn for_method(
        unit: Rc<CompiledUnit>,
        receiver: Value,
        args: Vec<Value>,
        invoker: Option<FrameRef>,
    ) -> FrameRef {
        Rc::new(RefCell::new(Self::new(unit, receiver, args, invoker)))
    }

    /// Activate `closure`. The new frame shares the receiver and home of the
    /// frame the closure was created in.
    pub fn for_block(closure: &Closure, args: Vec<Value>, invoker: Option<FrameRef>) -> FrameRef {
        let (receiver, home) = {
            let outer = closure.frame.borrow();
            let home = match &outer.home {
                Some(home) => home.clone(),
                None => Rc::downgrade(&closure.frame),
            };
            (outer.receiver.clone(), home)
        };
        let mut frame = Self::new(closure.unit.clone(), receiver, args, invoker);
        frame.lexical = Some(closure.frame.clone());
        frame.home = Some(home);
        Rc::new(RefCell::new(frame))
    }

    pub fn is_block(&self) -> bool {
        self.home.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.status == FrameStatus::Active
    }

    /// The method frame that `Return` exits. `None` only if that frame has
    /// been dropped.
    pub fn home(this: &FrameRef) -> Option<FrameRef> {
        match &this.borrow().home {
            Some(home) => home.upgrade(),
            None => Some(this.clone()),
        }
    }

    /// Walk `depth` steps up the lexical chain.
    pub fn enclosing(this: &FrameRef, depth: u16) -> Option<FrameRef> {
        let mut frame = this.clone();
        for _ in 0..depth {
            let parent = frame.borrow().lexical.clone()?;
            frame = parent;
        }
        Some(frame)
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&Value> {
        self.stack.last()
    }

    /// Value `depth` entries below the top.
    pub fn peek(&self, depth: usize) -> Option<&Value> {
        let len = self.stack.len();
        if depth < len {
            self.stack.get(len - 1 - depth)
        } else {
            None
        }
    }

    /// Pop `n` values, answering them in push order.
    pub fn pop_n(&mut self, n: usize) -> Option<Vec<Value>> {
        let len = self.stack.len();
        if n > len {
            return None;
        }
        Some(self.stack.split_off(len - n))
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("unit", &self.unit.qualified_name)
            .field("ip", &self.ip)
            .field("stack", &self.stack)
            .field("locals", &self.locals)
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, num_args: usize, num_locals: usize) -> Rc<CompiledUnit> {
        Rc::new(CompiledUnit {
            name: name.to_string(),
            qualified_name: format!("Test>>{name}"),
            num_args,
            num_locals,
            ..CompiledUnit::default()
        })
    }

    #[test]
    fn locals_hold_args_then_nils() {
        let frame = Frame::for_method(unit("at:put:", 2, 1), Value::Nil, vec![1.into(), 2.into()], None);
        let frame = frame.borrow();
        assert_eq!(frame.locals.len(), 3);
        assert!(frame.locals[2].is_nil());
        assert!(!frame.is_block());
    }

    #[test]
    fn block_frames_share_home_and_receiver() {
        let method = Frame::for_method(unit("run", 0, 0), Value::Integer(9), vec![], None);
        let outer = Closure { unit: unit("run-block0", 0, 0), frame: method.clone() };
        let block = Frame::for_block(&outer, vec![], Some(method.clone()));
        let inner = Closure { unit: unit("run-block0-block0", 0, 0), frame: block.clone() };
        let nested = Frame::for_block(&inner, vec![], Some(block.clone()));

        let home = Frame::home(&nested).expect("home alive");
        assert!(Rc::ptr_eq(&home, &method));
        assert!(Rc::ptr_eq(&Frame::home(&method).expect("self home"), &method));
        assert!(matches!(nested.borrow().receiver, Value::Integer(9)));
        assert!(Rc::ptr_eq(&Frame::enclosing(&nested, 2).expect("depth 2"), &method));
        assert!(Frame::enclosing(&nested, 3).is_none());
    }

    #[test]
    fn stack_helpers() {
        let frame = Frame::for_method(unit("x", 0, 0), Value::Nil, vec![], None);
        let mut frame = frame.borrow_mut();
        frame.push(1.into());
        frame.push(2.into());
        frame.push(3.into());
        assert!(matches!(frame.peek(2), Some(Value::Integer(1))));
        let top_two = frame.pop_n(2).expect("two values");
        assert!(matches!(top_two[..], [Value::Integer(2), Value::Integer(3)]));
        assert!(frame.pop_n(2).is_none());
        assert_eq!(frame.stack.len(), 1);
    }
}
