use serde::Serialize;
use std::fmt;

use crate::errors::{Result, RuleError};
use crate::parser::Scanner;

/// The annotations that make a field mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Keyword {
    /// `$mandatory`, `$mandatory(<expr>)`
    Mandatory,
    /// `$mandatoryIf(<expr>)`
    MandatoryIf,
}

impl Keyword {
    pub fn token(self) -> &'static str {
        match self {
            Keyword::Mandatory => "$mandatory",
            Keyword::MandatoryIf => "$mandatoryIf",
        }
    }

    /// Name the keyword is registered under, without the `$`.
    pub fn hook_name(self) -> &'static str {
        &self.token()[1..]
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A keyword found in a field description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordMatch<'a> {
    /// Text between the parentheses, untrimmed; `None` for the bare form.
    pub args: Option<&'a str>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Looks for the first whole-word occurrence of `keyword` in `description`.
///
/// An opening parenthesis right after the token must be closed, otherwise
/// the annotation is malformed.
pub fn find_keyword(description: &str, keyword: Keyword) -> Result<Option<KeywordMatch<'_>>> {
    let token = keyword.token();
    for (at, _) in description.match_indices(token) {
        let mut sc = Scanner::starting_at(description, at + token.len());
        if sc.peek_char().is_some_and(is_word_char) {
            continue;
        }
        if sc.peek_char() != Some('(') {
            return Ok(Some(KeywordMatch { args: None }));
        }
        return match sc.capture_group() {
            Some(args) => Ok(Some(KeywordMatch { args: Some(args) })),
            None => Err(RuleError::malformed(
                sc.rest(),
                format!("unclosed parenthesis after `{token}`"),
            )),
        };
    }
    Ok(None)
}
