//! Query language
//!
//! A statement is tokenized by [`lexer`], parsed once into a
//! [`QueryStatement`] by [`parser`] and run by one of the strategies in
//! [`executor`]. Both strategies evaluate predicates with [`eval`], so they
//! agree on every match.

pub mod eval;
pub mod executor;
pub mod lexer;
pub mod parser;

pub use executor::{IndexedExecutor, QueryStrategy, StrategyKind, TreeWalkExecutor};
pub use parser::{parse, parse_predicate};

use crate::properties::{PropertyBag, PropertyFilter};
use crate::types::ObjectId;
use std::fmt;

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Like,
    Is,
    IsNot,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Like => "LIKE",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Boolean(bool),
    Null,
}

/// `field op literal`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub op: Operator,
    pub literal: Literal,
}

/// Disjunction of conjunctions; AND binds tighter than OR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub any_of: Vec<Vec<Condition>>,
}

impl Predicate {
    /// Conditions in source order.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.any_of.iter().flatten()
    }

    pub fn matches(&self, bag: &PropertyBag) -> bool {
        self.any_of
            .iter()
            .any(|all| all.iter().all(|c| eval::matches_condition(c, bag)))
    }
}

/// Selected fields of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fields {
    All,
    Named(Vec<String>),
}

impl Fields {
    /// Property filter used to project result objects.
    pub fn to_filter(&self) -> PropertyFilter {
        match self {
            Fields::All => PropertyFilter::All,
            Fields::Named(names) => PropertyFilter::from_names(names.iter().cloned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatement {
    Simple {
        fields: Fields,
        type_id: String,
    },
    Where {
        fields: Fields,
        type_id: String,
        predicate: Predicate,
    },
    InFolder {
        fields: Fields,
        type_id: String,
        folder_id: ObjectId,
        qualifier: Option<String>,
    },
    InTree {
        fields: Fields,
        type_id: String,
        subtree_id: ObjectId,
        qualifier: Option<String>,
    },
}

impl QueryStatement {
    pub fn fields(&self) -> &Fields {
        match self {
            QueryStatement::Simple { fields, .. }
            | QueryStatement::Where { fields, .. }
            | QueryStatement::InFolder { fields, .. }
            | QueryStatement::InTree { fields, .. } => fields,
        }
    }

    pub fn type_id(&self) -> &str {
        match self {
            QueryStatement::Simple { type_id, .. }
            | QueryStatement::Where { type_id, .. }
            | QueryStatement::InFolder { type_id, .. }
            | QueryStatement::InTree { type_id, .. } => type_id,
        }
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        match self {
            QueryStatement::Where { predicate, .. } => Some(predicate),
            _ => None,
        }
    }

    pub fn qualifier(&self) -> Option<&str> {
        match self {
            QueryStatement::InFolder { qualifier, .. } | QueryStatement::InTree { qualifier, .. } => {
                qualifier.as_deref()
            }
            _ => None,
        }
    }
}
