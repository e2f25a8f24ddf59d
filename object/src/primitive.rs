/// Which kernel class a primitive belongs to. The VM keeps one dispatch
/// table per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Object,
    Boolean,
    Integer,
    Float,
    Character,
    String,
    Array,
    Block,
    Transcript,
}

impl PrimitiveKind {
    /// Name of the kernel class that declares primitives of this kind.
    pub const fn class_name(self) -> &'static str {
        match self {
            PrimitiveKind::Object => "Object",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Integer => "Integer",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Character => "Character",
            PrimitiveKind::String => "String",
            PrimitiveKind::Array => "Array",
            PrimitiveKind::Block => "BlockDescriptor",
            PrimitiveKind::Transcript => "TranscriptStream",
        }
    }
}

macro_rules! primitives {
    ($($variant:ident => $kind:ident, $side:ident, $selector:literal;)*) => {
        /// Built-in operation bound to a kernel method in place of bytecode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Primitive {
            $($variant,)*
        }

        impl Primitive {
            pub const ALL: &'static [Primitive] = &[$(Primitive::$variant,)*];

            pub const fn kind(self) -> PrimitiveKind {
                match self {
                    $(Primitive::$variant => PrimitiveKind::$kind,)*
                }
            }

            pub const fn selector(self) -> &'static str {
                match self {
                    $(Primitive::$variant => $selector,)*
                }
            }

            /// Whether the primitive is installed on the class side.
            pub const fn is_class_side(self) -> bool {
                match self {
                    $(Primitive::$variant => primitives!(@side $side),)*
                }
            }

            /// Stable name used to refer to the primitive from method
            /// declarations.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Primitive::$variant => stringify!($variant),)*
                }
            }
        }
    };
    (@side class) => { true };
    (@side instance) => { false };
}

primitives! {
    ObjectClassBasicNew => Object, class, "basicNew";
    ObjectClassNew => Object, class, "new";
    ObjectClassError => Object, class, "error:";
    ObjectError => Object, instance, "error:";
    ObjectIdentical => Object, instance, "==";
    ObjectNotIdentical => Object, instance, "~~";
    ObjectAsString => Object, instance, "asString";
    ObjectPrintString => Object, instance, "printString";
    ObjectClass => Object, instance, "class";
    ObjectIsNil => Object, instance, "isNil";
    ObjectNotNil => Object, instance, "notNil";
    ObjectHash => Object, instance, "hash";

    IntegerAdd => Integer, instance, "+";
    IntegerSub => Integer, instance, "-";
    IntegerMul => Integer, instance, "*";
    IntegerDiv => Integer, instance, "/";
    IntegerModulo => Integer, instance, "\\\\";
    IntegerMod => Integer, instance, "mod:";
    IntegerLt => Integer, instance, "<";
    IntegerLe => Integer, instance, "<=";
    IntegerGt => Integer, instance, ">";
    IntegerGe => Integer, instance, ">=";
    IntegerEq => Integer, instance, "=";
    IntegerNe => Integer, instance, "~=";
    IntegerAsFloat => Integer, instance, "asFloat";
    IntegerAsCharacter => Integer, instance, "asCharacter";
    IntegerNegated => Integer, instance, "negated";
    IntegerPrintString => Integer, instance, "printString";

    FloatAdd => Float, instance, "+";
    FloatSub => Float, instance, "-";
    FloatMul => Float, instance, "*";
    FloatDiv => Float, instance, "/";
    FloatLt => Float, instance, "<";
    FloatLe => Float, instance, "<=";
    FloatGt => Float, instance, ">";
    FloatGe => Float, instance, ">=";
    FloatEq => Float, instance, "=";
    FloatAsInteger => Float, instance, "asInteger";
    FloatNegated => Float, instance, "negated";
    FloatPrintString => Float, instance, "printString";

    BooleanIfTrue => Boolean, instance, "ifTrue:";
    BooleanIfFalse => Boolean, instance, "ifFalse:";
    BooleanIfTrueIfFalse => Boolean, instance, "ifTrue:ifFalse:";
    BooleanIfFalseIfTrue => Boolean, instance, "ifFalse:ifTrue:";
    BooleanNot => Boolean, instance, "not";
    BooleanAnd => Boolean, instance, "&";
    BooleanOr => Boolean, instance, "|";
    BooleanEq => Boolean, instance, "=";

    CharacterClassValue => Character, class, "value:";
    CharacterAsInteger => Character, instance, "asInteger";
    CharacterEq => Character, instance, "=";

    StringClassNew => String, class, "new:";
    StringConcat => String, instance, ",";
    StringEq => String, instance, "=";
    StringSize => String, instance, "size";
    StringAt => String, instance, "at:";
    StringAsArray => String, instance, "asArray";
    StringAsString => String, instance, "asString";

    ArrayClassNew => Array, class, "new";
    ArrayClassNewSize => Array, class, "new:";
    ArraySize => Array, instance, "size";
    ArrayAt => Array, instance, "at:";
    ArrayAtPut => Array, instance, "at:put:";

    BlockValue => Block, instance, "value";
    BlockValue1 => Block, instance, "value:";
    BlockValue2 => Block, instance, "value:value:";
    BlockValue3 => Block, instance, "value:value:value:";
    BlockNumArgs => Block, instance, "numArgs";

    TranscriptShow => Transcript, instance, "show:";
    TranscriptCr => Transcript, instance, "cr";
}

impl Primitive {
    /// Number of arguments, derived from the selector shape.
    pub fn arity(self) -> usize {
        selector_arity(self.selector())
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// Argument count implied by a selector: one per keyword part, one for a
/// binary operator, none for a unary message.
pub fn selector_arity(selector: &str) -> usize {
    let keywords = selector.matches(':').count();
    if keywords > 0 {
        keywords
    } else if selector
        .chars()
        .next()
        .is_some_and(|c| !(c.is_alphanumeric() || c == '_'))
    {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_follows_selector_shape() {
        assert_eq!(selector_arity("size"), 0);
        assert_eq!(selector_arity("+"), 1);
        assert_eq!(selector_arity("\\\\"), 1);
        assert_eq!(selector_arity("at:put:"), 2);
        assert_eq!(Primitive::BlockValue3.arity(), 3);
        assert_eq!(Primitive::ObjectClassBasicNew.arity(), 0);
    }

    #[test]
    fn names_round_trip() {
        for &p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert_eq!(Primitive::from_name("NoSuchThing"), None);
    }

    #[test]
    fn selectors_are_unique_per_class_side() {
        for (i, a) in Primitive::ALL.iter().enumerate() {
            for b in &Primitive::ALL[i + 1..] {
                assert!(
                    !(a.kind() == b.kind()
                        && a.is_class_side() == b.is_class_side()
                        && a.selector() == b.selector()),
                    "{a:?} and {b:?} collide"
                );
            }
        }
    }
}
