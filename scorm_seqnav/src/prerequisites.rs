// Copyright 2025 the SCORM SeqNav Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SCORM 1.2 prerequisite scripts.
//!
//! ## Overview
//!
//! SCORM 1.2 gates delivery of an item on an `adlcp:prerequisites` script in
//! the AICC script language:
//!
//! - `intro` is true when item `intro` is passed or completed.
//! - `intro = "failed"` and `intro <> "f"` compare the item's lesson status
//!   against a status name or its one-letter abbreviation.
//! - `~a` is negation, `a & b` conjunction, `a | b` disjunction; `~` binds
//!   tightest, then `&`, then `|`. Parentheses group.
//! - `2*{a, b, c}` is true when at least two members of the set are true.
//!
//! [`parse`] produces a [`PrerequisiteExpr`] that can be evaluated any number
//! of times. [`ScriptPrerequisites`] is the [`Prerequisites`] implementation
//! the SCORM 1.2 engine uses by default.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use scorm_activity_tree::LessonStatus;
use tracing::warn;

use crate::types::Prerequisites;

/// Why a prerequisite script could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PrerequisiteError {
    /// The script ended in the middle of an expression.
    #[error("unexpected end of prerequisite script")]
    UnexpectedEnd,
    /// A character that cannot start or continue the expression here.
    #[error("unexpected `{found}` at byte {at}")]
    Unexpected {
        /// The offending character.
        found: char,
        /// Its byte offset in the script.
        at: usize,
    },
    /// A comparison against something that is not a lesson status.
    #[error("`{0}` is not a lesson status")]
    UnknownStatus(String),
    /// The set count is not a number that fits.
    #[error("invalid set count `{0}`")]
    InvalidCount(String),
}

/// A parsed prerequisite script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrerequisiteExpr {
    /// Item is passed or completed.
    Item(String),
    /// Item's lesson status equals (or, with `negated`, differs from) `status`.
    Status {
        /// Item identifier.
        item: String,
        /// Status compared against.
        status: LessonStatus,
        /// `<>` rather than `=`.
        negated: bool,
    },
    /// Negation.
    Not(Box<PrerequisiteExpr>),
    /// Every operand holds.
    And(Vec<PrerequisiteExpr>),
    /// Some operand holds.
    Or(Vec<PrerequisiteExpr>),
    /// At least `count` members hold.
    AtLeast {
        /// Required number of true members.
        count: usize,
        /// The set.
        members: Vec<PrerequisiteExpr>,
    },
}

impl PrerequisiteExpr {
    /// Evaluate against `lesson_status`, which maps an item identifier to its
    /// status. Unknown identifiers count as not attempted.
    pub fn evaluate(&self, lesson_status: &dyn Fn(&str) -> Option<LessonStatus>) -> bool {
        let status_of = |item: &str| lesson_status(item).unwrap_or(LessonStatus::NotAttempted);
        match self {
            Self::Item(item) => status_of(item).is_finished(),
            Self::Status {
                item,
                status,
                negated,
            } => (status_of(item) == *status) != *negated,
            Self::Not(inner) => !inner.evaluate(lesson_status),
            Self::And(operands) => operands.iter().all(|e| e.evaluate(lesson_status)),
            Self::Or(operands) => operands.iter().any(|e| e.evaluate(lesson_status)),
            Self::AtLeast { count, members } => {
                members.iter().filter(|e| e.evaluate(lesson_status)).count() >= *count
            }
        }
    }
}

/// Parse a prerequisite script.
pub fn parse(script: &str) -> Result<PrerequisiteExpr, PrerequisiteError> {
    let mut parser = Parser { src: script, pos: 0 };
    let expr = parser.or()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(expr),
        Some(found) => Err(PrerequisiteError::Unexpected {
            found,
            at: parser.pos,
        }),
    }
}

/// Status from its full name or one-letter abbreviation, ignoring case.
fn lesson_status_from_str(s: &str) -> Option<LessonStatus> {
    let s = s.trim();
    let status = match s.to_ascii_lowercase().as_str() {
        "passed" | "p" => LessonStatus::Passed,
        "completed" | "c" => LessonStatus::Completed,
        "failed" | "f" => LessonStatus::Failed,
        "incomplete" | "i" => LessonStatus::Incomplete,
        "browsed" | "b" => LessonStatus::Browsed,
        "not attempted" | "not-attempted" | "n" => LessonStatus::NotAttempted,
        _ => return None,
    };
    Some(status)
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '/' | '$' | '#')
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume `token` after optional whitespace.
    fn eat(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        if self.src[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: char) -> Result<(), PrerequisiteError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == token => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(PrerequisiteError::Unexpected {
                found,
                at: self.pos,
            }),
            None => Err(PrerequisiteError::UnexpectedEnd),
        }
    }

    fn or(&mut self) -> Result<PrerequisiteExpr, PrerequisiteError> {
        let mut operands = alloc::vec![self.and()?];
        while self.eat("|") {
            operands.push(self.and()?);
        }
        Ok(match operands.len() {
            1 => operands.remove(0),
            _ => PrerequisiteExpr::Or(operands),
        })
    }

    fn and(&mut self) -> Result<PrerequisiteExpr, PrerequisiteError> {
        let mut operands = alloc::vec![self.unary()?];
        while self.eat("&") {
            operands.push(self.unary()?);
        }
        Ok(match operands.len() {
            1 => operands.remove(0),
            _ => PrerequisiteExpr::And(operands),
        })
    }

    fn unary(&mut self) -> Result<PrerequisiteExpr, PrerequisiteError> {
        if self.eat("~") {
            return Ok(PrerequisiteExpr::Not(Box::new(self.unary()?)));
        }
        if self.eat("(") {
            let inner = self.or()?;
            self.expect(')')?;
            return Ok(inner);
        }
        let word = self.identifier()?;
        if self.eat("*") {
            let count = word
                .parse::<usize>()
                .map_err(|_| PrerequisiteError::InvalidCount(word.into()))?;
            return self.set(count);
        }
        let item = String::from(word);
        if self.eat("<>") {
            let status = self.status()?;
            return Ok(PrerequisiteExpr::Status {
                item,
                status,
                negated: true,
            });
        }
        if self.eat("=") {
            let status = self.status()?;
            return Ok(PrerequisiteExpr::Status {
                item,
                status,
                negated: false,
            });
        }
        Ok(PrerequisiteExpr::Item(item))
    }

    fn set(&mut self, count: usize) -> Result<PrerequisiteExpr, PrerequisiteError> {
        self.expect('{')?;
        let mut members = alloc::vec![self.or()?];
        while self.eat(",") {
            members.push(self.or()?);
        }
        self.expect('}')?;
        Ok(PrerequisiteExpr::AtLeast { count, members })
    }

    fn identifier(&mut self) -> Result<&'a str, PrerequisiteError> {
        self.skip_whitespace();
        let src = self.src;
        let start = self.pos;
        let rest = &src[start..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !is_identifier_char(*c))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return match self.peek() {
                Some(found) => Err(PrerequisiteError::Unexpected { found, at: start }),
                None => Err(PrerequisiteError::UnexpectedEnd),
            };
        }
        self.pos += len;
        Ok(&src[start..start + len])
    }

    /// A status, quoted or bare.
    fn status(&mut self) -> Result<LessonStatus, PrerequisiteError> {
        self.skip_whitespace();
        let src = self.src;
        let text = if self.eat("\"") {
            let rest = &src[self.pos..];
            let end = rest.find('"').ok_or(PrerequisiteError::UnexpectedEnd)?;
            self.pos += end + 1;
            &rest[..end]
        } else {
            self.identifier()?
        };
        lesson_status_from_str(text).ok_or_else(|| PrerequisiteError::UnknownStatus(text.into()))
    }
}

/// Evaluates SCORM 1.2 prerequisite scripts.
///
/// An absent or blank script is satisfied. A script that does not parse is
/// also treated as satisfied, so a broken manifest never locks a learner out.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptPrerequisites;

impl Prerequisites for ScriptPrerequisites {
    fn evaluate(
        &self,
        expression: Option<&str>,
        lesson_status: &dyn Fn(&str) -> Option<LessonStatus>,
    ) -> bool {
        let Some(script) = expression.filter(|s| !s.trim().is_empty()) else {
            return true;
        };
        match parse(script) {
            Ok(expr) => expr.evaluate(lesson_status),
            Err(error) => {
                warn!(script, %error, "ignoring malformed prerequisite script");
                true
            }
        }
    }
}
