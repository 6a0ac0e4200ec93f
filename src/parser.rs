//! Recursive-descent parser.
//!
//! Consumes the lexer's token buffer through the forward cursor and the
//! `expect` family only. Classes are registered as they are parsed so that
//! parent classes and constructor calls resolve to the already-built class
//! values; method bodies are wrapped in `MethodBody` at construction time.

use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Program, Statement};
use crate::lexer::{LexError, Lexer};
use crate::runtime::class::{Class, Method};
use crate::runtime::compare::Comparator;
use crate::token::Token;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Unexpected token {found}")]
    UnexpectedToken { found: String },
    #[error("Unknown class '{name}'")]
    UnknownClass { name: String },
    #[error("str() expects exactly one argument, got {found}")]
    StringifyArity { found: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Lexes and parses a complete program.
pub fn parse(source: &str) -> ParseResult<Program> {
    let lexer = Lexer::new(source)?;
    Parser::new(lexer).parse_program()
}

pub struct Parser {
    lexer: Lexer,
    classes: HashMap<String, Rc<Class>>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Self {
            lexer,
            classes: HashMap::new(),
        }
    }

    pub fn parse_program(mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        loop {
            match self.lexer.current_token() {
                Token::Eof => break,
                Token::Newline => {
                    self.lexer.next_token();
                }
                _ => statements.push(self.parse_statement()?),
            }
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.lexer.current_token() {
            Token::Class => self.parse_class_definition(),
            Token::If => self.parse_if_else(),
            Token::Return => self.parse_return(),
            Token::Print => self.parse_print(),
            _ => self.parse_assignment_or_call(),
        }
    }

    fn parse_class_definition(&mut self) -> ParseResult<Statement> {
        self.lexer.next_token();
        let name = self.lexer.expect_id()?.to_string();
        self.lexer.next_token();

        let parent = if self.lexer.current_token() == &Token::Char('(') {
            let parent_name = self.lexer.expect_next_id()?;
            self.lexer.expect_next(&Token::Char(')'))?;
            self.lexer.next_token();
            Some(self.lookup_class(&parent_name)?)
        } else {
            None
        };

        self.lexer.expect(&Token::Char(':'))?;
        self.lexer.next_token();
        self.lexer.expect(&Token::Newline)?;
        self.lexer.next_token();
        self.lexer.expect(&Token::Indent)?;
        self.lexer.next_token();

        let mut methods = Vec::new();
        loop {
            match self.lexer.current_token() {
                Token::Dedent => {
                    self.lexer.next_token();
                    break;
                }
                Token::Newline => {
                    self.lexer.next_token();
                }
                _ => methods.push(self.parse_method()?),
            }
        }

        let class = Rc::new(Class::new(name.clone(), methods, parent));
        self.classes.insert(name, Rc::clone(&class));
        Ok(Statement::ClassDefinition { class })
    }

    fn parse_method(&mut self) -> ParseResult<Method> {
        self.lexer.expect(&Token::Def)?;
        let name = self.lexer.expect_next_id()?;
        self.lexer.expect_next(&Token::Char('('))?;
        self.lexer.next_token();

        let mut formal_params = Vec::new();
        if self.lexer.current_token() != &Token::Char(')') {
            loop {
                formal_params.push(self.lexer.expect_id()?.to_string());
                if self.lexer.next_token() == &Token::Char(',') {
                    self.lexer.next_token();
                } else {
                    break;
                }
            }
        }
        self.lexer.expect(&Token::Char(')'))?;
        self.lexer.expect_next(&Token::Char(':'))?;
        self.lexer.next_token();

        let body = self.parse_suite()?;
        Ok(Method {
            name,
            formal_params,
            body: Statement::MethodBody { body: body.boxed() }.boxed(),
        })
    }

    /// An indented block: `Newline Indent statement+ Dedent`.
    fn parse_suite(&mut self) -> ParseResult<Statement> {
        self.lexer.expect(&Token::Newline)?;
        self.lexer.next_token();
        self.lexer.expect(&Token::Indent)?;
        self.lexer.next_token();

        let mut statements = Vec::new();
        loop {
            match self.lexer.current_token() {
                Token::Dedent => {
                    self.lexer.next_token();
                    break;
                }
                Token::Eof => break,
                Token::Newline => {
                    self.lexer.next_token();
                }
                _ => statements.push(self.parse_statement()?),
            }
        }
        Ok(Statement::Compound { statements })
    }

    fn parse_if_else(&mut self) -> ParseResult<Statement> {
        self.lexer.next_token();
        let condition = self.parse_expression()?;
        self.lexer.expect(&Token::Char(':'))?;
        self.lexer.next_token();
        let if_body = self.parse_suite()?;

        let else_body = if self.lexer.current_token() == &Token::Else {
            self.lexer.expect_next(&Token::Char(':'))?;
            self.lexer.next_token();
            Some(self.parse_suite()?.boxed())
        } else {
            None
        };

        Ok(Statement::IfElse {
            condition: condition.boxed(),
            if_body: if_body.boxed(),
            else_body,
        })
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.lexer.next_token();
        let value = if self.lexer.current_token() == &Token::Newline {
            Statement::None
        } else {
            self.parse_expression()?
        };
        self.consume_newline()?;
        Ok(Statement::Return {
            value: value.boxed(),
        })
    }

    fn parse_print(&mut self) -> ParseResult<Statement> {
        self.lexer.next_token();
        let mut args = Vec::new();
        if self.lexer.current_token() != &Token::Newline {
            loop {
                args.push(self.parse_expression()?);
                if self.lexer.current_token() == &Token::Char(',') {
                    self.lexer.next_token();
                } else {
                    break;
                }
            }
        }
        self.consume_newline()?;
        Ok(Statement::Print { args })
    }

    /// A statement opening with an identifier is either an assignment
    /// (`a.b.c = e`) or a call used for its effect (`obj.m(...)`,
    /// `Class(...)`). Anything else here is a syntax error.
    fn parse_assignment_or_call(&mut self) -> ParseResult<Statement> {
        if !matches!(self.lexer.current_token(), Token::Id(_)) {
            return Err(self.unexpected());
        }
        let dotted_ids = self.parse_dotted_ids()?;

        if self.lexer.current_token() == &Token::Char('=') {
            self.lexer.next_token();
            let value = self.parse_expression()?;
            self.consume_newline()?;
            return Ok(assignment_target(dotted_ids, value));
        }

        if self.lexer.current_token() == &Token::Char('(') {
            let call = self.parse_call(dotted_ids)?;
            self.consume_newline()?;
            return Ok(call);
        }

        Err(self.unexpected())
    }

    fn parse_dotted_ids(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.lexer.expect_id()?.to_string()];
        while self.lexer.next_token() == &Token::Char('.') {
            ids.push(self.lexer.expect_next_id()?);
        }
        Ok(ids)
    }

    /// Call form with the dotted path already consumed; the cursor sits on
    /// `(`. A single name is a constructor call (or `str(...)`), a dotted
    /// path is a method call on its prefix.
    fn parse_call(&mut self, mut dotted_ids: Vec<String>) -> ParseResult<Statement> {
        self.lexer.next_token();
        let args = self.parse_call_args()?;

        if dotted_ids.len() == 1 {
            let name = dotted_ids.remove(0);
            if name == "str" {
                if args.len() != 1 {
                    return Err(ParseError::StringifyArity { found: args.len() });
                }
                let mut args = args;
                return Ok(Statement::Stringify {
                    arg: args.remove(0).boxed(),
                });
            }
            let class = self.lookup_class(&name)?;
            return Ok(Statement::NewInstance { class, args });
        }

        let method = dotted_ids.pop().unwrap_or_default();
        Ok(Statement::MethodCall {
            object: Statement::VariableValue { dotted_ids }.boxed(),
            method,
            args,
        })
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<Statement>> {
        let mut args = Vec::new();
        if self.lexer.current_token() != &Token::Char(')') {
            loop {
                args.push(self.parse_expression()?);
                if self.lexer.current_token() == &Token::Char(',') {
                    self.lexer.next_token();
                } else {
                    break;
                }
            }
        }
        self.lexer.expect(&Token::Char(')'))?;
        self.lexer.next_token();
        Ok(args)
    }

    // Expression grammar, loosest binding first:
    // or < and < not < comparison < addition < multiplication < unary minus.

    fn parse_expression(&mut self) -> ParseResult<Statement> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Statement> {
        let mut lhs = self.parse_and()?;
        while self.lexer.current_token() == &Token::Or {
            self.lexer.next_token();
            let rhs = self.parse_and()?;
            lhs = Statement::Or {
                lhs: lhs.boxed(),
                rhs: rhs.boxed(),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<Statement> {
        let mut lhs = self.parse_not()?;
        while self.lexer.current_token() == &Token::And {
            self.lexer.next_token();
            let rhs = self.parse_not()?;
            lhs = Statement::And {
                lhs: lhs.boxed(),
                rhs: rhs.boxed(),
            };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> ParseResult<Statement> {
        if self.lexer.current_token() == &Token::Not {
            self.lexer.next_token();
            let arg = self.parse_not()?;
            return Ok(Statement::Not { arg: arg.boxed() });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Statement> {
        let lhs = self.parse_additive()?;
        let comparator = match self.lexer.current_token() {
            Token::Eq => Comparator::Equal,
            Token::NotEq => Comparator::NotEqual,
            Token::Char('<') => Comparator::Less,
            Token::Char('>') => Comparator::Greater,
            Token::LessOrEq => Comparator::LessOrEqual,
            Token::GreaterOrEq => Comparator::GreaterOrEqual,
            _ => return Ok(lhs),
        };
        self.lexer.next_token();
        let rhs = self.parse_additive()?;
        Ok(Statement::Comparison {
            comparator,
            lhs: lhs.boxed(),
            rhs: rhs.boxed(),
        })
    }

    fn parse_additive(&mut self) -> ParseResult<Statement> {
        let mut lhs = self.parse_term()?;
        loop {
            let add = match self.lexer.current_token() {
                Token::Char('+') => true,
                Token::Char('-') => false,
                _ => return Ok(lhs),
            };
            self.lexer.next_token();
            let rhs = self.parse_term()?;
            lhs = if add {
                Statement::Add {
                    lhs: lhs.boxed(),
                    rhs: rhs.boxed(),
                }
            } else {
                Statement::Sub {
                    lhs: lhs.boxed(),
                    rhs: rhs.boxed(),
                }
            };
        }
    }

    fn parse_term(&mut self) -> ParseResult<Statement> {
        let mut lhs = self.parse_unary()?;
        loop {
            let mult = match self.lexer.current_token() {
                Token::Char('*') => true,
                Token::Char('/') => false,
                _ => return Ok(lhs),
            };
            self.lexer.next_token();
            let rhs = self.parse_unary()?;
            lhs = if mult {
                Statement::Mult {
                    lhs: lhs.boxed(),
                    rhs: rhs.boxed(),
                }
            } else {
                Statement::Div {
                    lhs: lhs.boxed(),
                    rhs: rhs.boxed(),
                }
            };
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Statement> {
        if self.lexer.current_token() == &Token::Char('-') {
            self.lexer.next_token();
            let operand = self.parse_unary()?;
            // Unary minus is subtraction from zero.
            return Ok(Statement::Sub {
                lhs: Statement::NumericConst(0).boxed(),
                rhs: operand.boxed(),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Statement> {
        match self.lexer.current_token() {
            Token::Number(value) => {
                let value = *value;
                self.lexer.next_token();
                Ok(Statement::NumericConst(value))
            }
            Token::String(value) => {
                let value = value.clone();
                self.lexer.next_token();
                Ok(Statement::StringConst(value))
            }
            Token::True => {
                self.lexer.next_token();
                Ok(Statement::BoolConst(true))
            }
            Token::False => {
                self.lexer.next_token();
                Ok(Statement::BoolConst(false))
            }
            Token::None => {
                self.lexer.next_token();
                Ok(Statement::None)
            }
            Token::Char('(') => {
                self.lexer.next_token();
                let inner = self.parse_expression()?;
                self.lexer.expect(&Token::Char(')'))?;
                self.lexer.next_token();
                Ok(inner)
            }
            Token::Id(_) => {
                let dotted_ids = self.parse_dotted_ids()?;
                if self.lexer.current_token() == &Token::Char('(') {
                    self.parse_call(dotted_ids)
                } else {
                    Ok(Statement::VariableValue { dotted_ids })
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn lookup_class(&self, name: &str) -> ParseResult<Rc<Class>> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| ParseError::UnknownClass {
                name: name.to_string(),
            })
    }

    fn consume_newline(&mut self) -> ParseResult<()> {
        self.lexer.expect(&Token::Newline)?;
        self.lexer.next_token();
        Ok(())
    }

    fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            found: self.lexer.current_token().to_string(),
        }
    }
}

/// `a = e` binds a closure entry; `a.b.c = e` assigns the field `c` of the
/// instance reached through `a.b`.
fn assignment_target(mut dotted_ids: Vec<String>, value: Statement) -> Statement {
    if dotted_ids.len() == 1 {
        return Statement::Assignment {
            var: dotted_ids.remove(0),
            value: value.boxed(),
        };
    }
    let field = dotted_ids.pop().unwrap_or_default();
    Statement::FieldAssignment {
        object: Statement::VariableValue { dotted_ids }.boxed(),
        field,
        value: value.boxed(),
    }
}
