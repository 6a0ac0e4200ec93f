use std::fmt;

/// Lexical tokens of the language.
///
/// Valued variants carry their payload; two tokens compare equal when the
/// variant matches and the payloads, if any, are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(i64),
    Id(String),
    String(String),
    /// Single-character punctuation not promoted to a named kind:
    /// `+ - * / = < > ( ) : , .`
    Char(char),

    // Keywords
    Class,
    Return,
    If,
    Else,
    Def,
    Print,
    And,
    Or,
    Not,
    None,
    True,
    False,

    // Multi-character operators
    Eq,
    NotEq,
    LessOrEq,
    GreaterOrEq,

    // Structural
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Token::Number(value) => return write!(f, "Number{{{value}}}"),
            Token::Id(name) => return write!(f, "Id{{{name}}}"),
            Token::String(value) => return write!(f, "String{{{value}}}"),
            Token::Char(value) => return write!(f, "Char{{{value}}}"),
            Token::Class => "Class",
            Token::Return => "Return",
            Token::If => "If",
            Token::Else => "Else",
            Token::Def => "Def",
            Token::Print => "Print",
            Token::And => "And",
            Token::Or => "Or",
            Token::Not => "Not",
            Token::None => "None",
            Token::True => "True",
            Token::False => "False",
            Token::Eq => "Eq",
            Token::NotEq => "NotEq",
            Token::LessOrEq => "LessOrEq",
            Token::GreaterOrEq => "GreaterOrEq",
            Token::Newline => "Newline",
            Token::Indent => "Indent",
            Token::Dedent => "Dedent",
            Token::Eof => "Eof",
        };
        f.write_str(name)
    }
}
