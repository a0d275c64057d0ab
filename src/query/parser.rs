//! Statement parser
//!
//! ```text
//! SELECT <fields> FROM <type>
//! SELECT <fields> FROM <type> WHERE <cond> ((AND|OR) <cond>)*
//! SELECT <fields> FROM <type> WHERE IN_FOLDER([<type>,] '<id>')
//! SELECT <fields> FROM <type> WHERE IN_TREE([<type>,] '<id>')
//!
//! <cond> := <field> (= | <> | LIKE) <literal> | <field> IS [NOT] NULL
//! ```

use crate::error::ApiError;
use crate::query::lexer::{tokenize, Token};
use crate::query::{Condition, Fields, Literal, Operator, Predicate, QueryStatement};
use crate::schema::{ids, SchemaCatalog};
use crate::types::ObjectId;

/// Parse a full statement, resolving type names through `catalog`.
pub fn parse(statement: &str, catalog: &dyn SchemaCatalog) -> Result<QueryStatement, ApiError> {
    let tokens = tokenize(statement)?;
    let mut parser = Parser::new(tokens);
    let parsed = parser.statement(catalog)?;
    parser.expect_end()?;
    Ok(parsed)
}

/// Parse a bare condition list, as it appears after `WHERE`.
pub fn parse_predicate(text: &str) -> Result<Predicate, ApiError> {
    let mut parser = Parser::new(tokenize(text)?);
    let predicate = parser.predicate()?;
    parser.expect_end()?;
    Ok(predicate)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

fn invalid(message: impl Into<String>) -> ApiError {
    ApiError::InvalidArgument(message.into())
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek().map(|t| t.is_keyword(keyword)).unwrap_or(false)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ApiError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(invalid(format!(
                "Expected {} but found {}",
                keyword,
                self.describe_next()
            )))
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ApiError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(invalid(format!("Expected {} but found {:?}", what, other))),
        }
    }

    fn expect_end(&self) -> Result<(), ApiError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(invalid(format!("Unexpected trailing token {:?}", token))),
        }
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(token) => format!("{:?}", token),
            None => "end of statement".to_string(),
        }
    }

    fn word(&mut self, what: &str) -> Result<String, ApiError> {
        match self.next() {
            Some(Token::Word(word)) => Ok(word),
            other => Err(invalid(format!("Expected {} but found {:?}", what, other))),
        }
    }

    fn statement(&mut self, catalog: &dyn SchemaCatalog) -> Result<QueryStatement, ApiError> {
        self.expect_keyword("SELECT")?;
        let fields = self.fields()?;
        self.expect_keyword("FROM")?;
        let type_id = resolve_type(catalog, &self.word("type name")?)?;

        if !self.eat_keyword("WHERE") {
            return Ok(QueryStatement::Simple { fields, type_id });
        }

        if self.at_keyword("IN_FOLDER") || self.at_keyword("IN_TREE") {
            let in_tree = self.at_keyword("IN_TREE");
            self.pos += 1;
            let (qualifier, id) = self.scope_arguments(catalog)?;
            return Ok(if in_tree {
                QueryStatement::InTree {
                    fields,
                    type_id,
                    subtree_id: id,
                    qualifier,
                }
            } else {
                QueryStatement::InFolder {
                    fields,
                    type_id,
                    folder_id: id,
                    qualifier,
                }
            });
        }

        let predicate = self.predicate()?;
        Ok(QueryStatement::Where {
            fields,
            type_id,
            predicate,
        })
    }

    fn fields(&mut self) -> Result<Fields, ApiError> {
        if self.peek() == Some(&Token::Star) {
            self.pos += 1;
            return Ok(Fields::All);
        }
        let mut names = vec![self.word("field name")?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            names.push(self.word("field name")?);
        }
        for required in [ids::OBJECT_ID, ids::NAME] {
            if !names.iter().any(|n| n == required) {
                names.push(required.to_string());
            }
        }
        Ok(Fields::Named(names))
    }

    /// `( [<type>,] '<id>' )`
    fn scope_arguments(
        &mut self,
        catalog: &dyn SchemaCatalog,
    ) -> Result<(Option<String>, ObjectId), ApiError> {
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                match self.next() {
                    Some(token @ (Token::Word(_) | Token::Str(_))) => args.push(token),
                    other => return Err(invalid(format!("Invalid scope argument {:?}", other))),
                }
                if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;

        match args.as_slice() {
            [Token::Str(id)] => Ok((None, ObjectId::from(id.as_str()))),
            [Token::Word(name) | Token::Str(name), Token::Str(id)] => Ok((
                Some(resolve_type(catalog, name)?),
                ObjectId::from(id.as_str()),
            )),
            [] => Err(invalid("Scope predicate needs a folder id")),
            _ if args.len() > 2 => Err(invalid("Scope predicate takes at most two arguments")),
            _ => Err(invalid("Scope predicate folder id must be a quoted string")),
        }
    }

    fn predicate(&mut self) -> Result<Predicate, ApiError> {
        let mut any_of = vec![vec![self.condition()?]];
        loop {
            if self.eat_keyword("AND") {
                let condition = self.condition()?;
                if let Some(last) = any_of.last_mut() {
                    last.push(condition);
                }
            } else if self.eat_keyword("OR") {
                any_of.push(vec![self.condition()?]);
            } else {
                break;
            }
        }
        Ok(Predicate { any_of })
    }

    fn condition(&mut self) -> Result<Condition, ApiError> {
        let field = self.word("field name")?;
        if self.eat_keyword("IS") {
            let op = if self.eat_keyword("NOT") {
                Operator::IsNot
            } else {
                Operator::Is
            };
            self.expect_keyword("NULL")?;
            return Ok(Condition {
                field,
                op,
                literal: Literal::Null,
            });
        }

        let op = match self.next() {
            Some(Token::Eq) => Operator::Eq,
            Some(Token::Ne) => Operator::Ne,
            Some(token) if token.is_keyword("LIKE") => Operator::Like,
            other => {
                return Err(invalid(format!(
                    "Expected operator after {} but found {:?}",
                    field, other
                )))
            }
        };
        let literal = self.literal()?;
        if op == Operator::Like && !matches!(literal, Literal::String(_)) {
            return Err(invalid("LIKE needs a string pattern"));
        }
        Ok(Condition { field, op, literal })
    }

    fn literal(&mut self) -> Result<Literal, ApiError> {
        match self.next() {
            Some(Token::Str(s)) => Ok(Literal::String(s)),
            Some(Token::Int(i)) => Ok(Literal::Integer(i)),
            Some(token) if token.is_keyword("TRUE") => Ok(Literal::Boolean(true)),
            Some(token) if token.is_keyword("FALSE") => Ok(Literal::Boolean(false)),
            Some(token) if token.is_keyword("NULL") => Ok(Literal::Null),
            other => Err(invalid(format!("Expected literal but found {:?}", other))),
        }
    }
}

fn resolve_type(catalog: &dyn SchemaCatalog, name: &str) -> Result<String, ApiError> {
    catalog
        .resolve(name)
        .map(|t| t.id.clone())
        .ok_or_else(|| invalid(format!("Unknown type: {}", name)))
}
