mod eval;
mod lexer;
mod parser;

use crate::entries::Entry;

pub use eval::eval;
pub use lexer::{tokenize, Token};
pub use parser::to_postfix;

/// A boolean query compiled to postfix form.
///
/// Syntax:
/// - words are case-insensitive substring terms
/// - `"quoted phrase"` is a single term
/// - `AND`, `OR`, `NOT` (any case) and parentheses; adjacent terms are ANDed
///
/// Malformed queries never fail to parse, and evaluation fails open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    postfix: Vec<Token>,
}

impl Query {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Self::default();
        }
        Self {
            postfix: to_postfix(tokenize(input)),
        }
    }

    /// True when the query matches everything without looking at the text.
    pub fn is_match_all(&self) -> bool {
        self.postfix.is_empty()
    }

    /// `text` must already be lowercased.
    pub fn matches_text(&self, text: &str) -> bool {
        eval(&self.postfix, text)
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        if self.is_match_all() {
            return true;
        }
        self.matches_text(&entry.searchable_text())
    }
}

/// Evaluate `query` against already derived searchable text.
pub fn evaluate_query(query: &str, searchable_text: &str) -> bool {
    Query::parse(query).matches_text(searchable_text)
}

/// Convenience: parse + evaluate against one entry.
pub fn matches(entry: &Entry, query: &str) -> bool {
    Query::parse(query).matches(entry)
}

/// Entries matching `query`, in input order.
pub fn filter_entries<'a, I>(entries: I, query: &str) -> Vec<&'a Entry>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let query = Query::parse(query);
    entries.into_iter().filter(|e| query.matches(e)).collect()
}
