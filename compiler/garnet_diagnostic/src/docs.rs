//! Long-form error explanations for `garnetc explain`.

use crate::ErrorCode;

/// Registry of error explanations.
pub struct ErrorDocs;

impl ErrorDocs {
    /// Explanation text for `code`, if one is written.
    pub fn get(code: ErrorCode) -> Option<&'static str> {
        DOCS.iter().find(|(c, _)| *c == code).map(|(_, doc)| *doc)
    }

    pub fn has_docs(code: ErrorCode) -> bool {
        DOCS.iter().any(|(c, _)| *c == code)
    }
}

static DOCS: &[(ErrorCode, &str)] = &[
    (
        ErrorCode::E1001,
        "A constant was referenced that is not defined in the current class, any \
         lexically enclosing class or module, or at the root.\n\n\
         Constants must be assigned (`C = 10`) before they are read. Paths such as \
         `A::B::C` are resolved segment by segment starting from the innermost scope.",
    ),
    (
        ErrorCode::E1002,
        "A variable was read before anything assigned or declared it.\n\n\
         Locals are created by their first assignment or by `local name: :Type`. \
         Class variables and globals must be declared at class or root scope \
         before methods read them.",
    ),
    (
        ErrorCode::E1003,
        "A method was called that no class in the receiver's ancestry defines.\n\n\
         Lookup searches prepended modules, the class itself, included modules \
         and then the superclass chain. Class methods also search extended modules. \
         The error is also raised after parsing when a called method was declared \
         (for instance by a forward `result` directive) but never implemented or imported.",
    ),
    (
        ErrorCode::E1004,
        "A class, module or type name could not be resolved.\n\n\
         Type names are `:I32`, `:I64`, `:F32`, `:F64`, `:none` or the path of a \
         class defined earlier in the unit.",
    ),
    (
        ErrorCode::E2001,
        "Instance variables (`@x`) only exist inside instance methods, where the \
         receiver `self` gives them an address.",
    ),
    (
        ErrorCode::E2002,
        "Constants, class variables and globals are declared at class or root \
         scope, with a compile-time constant initializer. Inside a method they can \
         only be read or updated.",
    ),
    (
        ErrorCode::E2003,
        "Only declarations and directives may appear directly in a class body or \
         at the root of a unit. Executable code belongs inside a method.",
    ),
    (
        ErrorCode::E2004,
        "`break` and `next` must appear inside a `while` or `until` loop.",
    ),
    (
        ErrorCode::E2005,
        "A module passed to `include`, `prepend` or `extend` must be completely \
         defined before the class body that uses it. Move the module definition \
         (or its `require`) above the class.",
    ),
    (
        ErrorCode::E2006,
        "A compiler directive was used where it has no meaning, for example \
         `arg` outside a method or `attr_reader` outside a class.",
    ),
    (
        ErrorCode::E3001,
        "The two types have no conversion between them. Native integers convert \
         to and from class references (pointer arithmetic); blank values convert \
         to nothing.",
    ),
    (
        ErrorCode::E3002,
        "The operation is representable but not implemented. Floating point \
         values may be declared and stored, but arithmetic and conversions on \
         them are not supported.",
    ),
    (
        ErrorCode::E3003,
        "The operator cannot be applied to these operands. On class references \
         only `+`, `-` and the relational operators are defined, and native \
         operators take exactly one argument.",
    ),
    (
        ErrorCode::E3004,
        "The value produced by the method body does not match the declared \
         result type. A method whose last expression produces no value must \
         declare `result :none`.",
    ),
    (
        ErrorCode::E3005,
        "Both branches of a conditional used as a value must have the same type.",
    ),
    (
        ErrorCode::E3006,
        "The number of arguments does not match the method's parameter list.",
    ),
    (
        ErrorCode::E4001,
        "A constant or class variable was assigned again with a different value. \
         Assigning the same value again only produces a warning.",
    ),
    (
        ErrorCode::E4002,
        "A global variable can be declared only once per compilation unit.",
    ),
    (
        ErrorCode::E4003,
        "A static data label was declared twice. Use `DAta.append(:label, value)` \
         to add more values under an existing label.",
    ),
    (
        ErrorCode::E4004,
        "`DAta.address = n` may only move the static data cursor forward; \
         moving it backward would overlap data that is already placed.",
    ),
    (
        ErrorCode::E4005,
        "A variable or attribute was given two different types. A slot's type is \
         fixed by its first declaration or assignment.",
    ),
    (
        ErrorCode::E4006,
        "A method marked with `import` is provided by the host; its body may \
         contain only directives.",
    ),
    (
        ErrorCode::E5001,
        "The input contains a construct the compiler cannot translate, such as \
         `nil`, floating point literals, string interpolation, `||=` or singleton \
         class bodies.",
    ),
    (
        ErrorCode::E5002,
        "A syntax node does not have the children the compiler expects. This \
         usually means the AST dump was produced by an incompatible parser.",
    ),
    (
        ErrorCode::E5003,
        "The AST dump could not be read: unbalanced parentheses, a bad string \
         escape or an unexpected character.",
    ),
    (
        ErrorCode::E5004,
        "A compiler directive received arguments of the wrong shape, for example \
         `arg x: 5` instead of `arg x: :I64`.",
    ),
    (
        ErrorCode::E5005,
        "A `require` or `require_relative` target was not found on the load path.",
    ),
    (ErrorCode::E6001, "The evaluated program divided an integer by zero."),
    (
        ErrorCode::E6002,
        "The evaluated program read or wrote outside its linear memory.",
    ),
    (
        ErrorCode::E6003,
        "The method named as entry point does not exist in the compiled unit.",
    ),
    (
        ErrorCode::E6004,
        "The evaluator cannot execute this instruction (for example an inline \
         instruction escape).",
    ),
    (
        ErrorCode::E6005,
        "The program calls an imported function but no host function was \
         registered for it.",
    ),
    (
        ErrorCode::E6006,
        "The evaluated program recursed deeper than the evaluator allows.",
    ),
    (
        ErrorCode::E9001,
        "The compiler reached a state it considers impossible. Please report it \
         with the input that triggered it.",
    ),
    (
        ErrorCode::W4001,
        "A constant or class variable was assigned again with the value it \
         already has. The second assignment has no effect.",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_is_documented() {
        for code in ErrorCode::ALL {
            assert!(ErrorDocs::has_docs(*code), "{code} has no explanation");
        }
    }
}
