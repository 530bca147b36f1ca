//! Filter expressions for list queries.
//!
//! The supported grammar is a conjunction of equality tests:
//!
//! ```text
//! filter  := clause ( AND clause )*
//! clause  := path '=' operand
//! path    := ident ( '.' ident )*
//! operand := '$' N | '\'' text '\'' | number | true | false
//! ```
//!
//! `$N` refers to the N-th filter parameter, counting from 1.

use crate::error::{LedgerError, LedgerResult};
use serde_json::Value;

/// A parsed filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    path: Vec<String>,
    operand: Operand,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Param(usize),
    Literal(Value),
}

impl Filter {
    /// Parses a filter. An empty or blank expression matches everything.
    pub fn parse(expr: &str) -> LedgerResult<Self> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Ok(Self::default());
        }

        let clauses = split_and(expr)
            .into_iter()
            .map(parse_clause)
            .collect::<LedgerResult<Vec<_>>>()?;
        Ok(Self { clauses })
    }

    /// Returns true if the filter has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Checks that every `$N` has a matching parameter.
    pub fn check_params(&self, params: &[Value]) -> LedgerResult<()> {
        for clause in &self.clauses {
            if let Operand::Param(n) = clause.operand {
                if n == 0 || n > params.len() {
                    return Err(LedgerError::InvalidFilter(format!(
                        "${} has no parameter ({} given)",
                        n,
                        params.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Tests an item. Parameters must have passed
    /// [`check_params`](Self::check_params).
    pub fn matches(&self, item: &Value, params: &[Value]) -> bool {
        self.clauses.iter().all(|clause| {
            let expected = match &clause.operand {
                Operand::Param(n) => match params.get(n.wrapping_sub(1)) {
                    Some(value) => value,
                    None => return false,
                },
                Operand::Literal(value) => value,
            };
            lookup(item, &clause.path) == Some(expected)
        })
    }
}

/// Splits on the `AND` keyword outside quoted literals.
fn split_and(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let bytes = expr.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_quote = !in_quote,
            b' ' if !in_quote => {
                let rest = &bytes[i..];
                if rest.len() >= 5 && rest[..5].eq_ignore_ascii_case(b" and ") {
                    parts.push(&expr[start..i]);
                    start = i + 5;
                    i += 5;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&expr[start..]);
    parts
}

fn parse_clause(text: &str) -> LedgerResult<Clause> {
    let (path, operand) = text
        .split_once('=')
        .ok_or_else(|| LedgerError::InvalidFilter(format!("expected '=' in {:?}", text.trim())))?;

    let path = path.trim();
    if path.is_empty() {
        return Err(LedgerError::InvalidFilter(format!("missing field in {:?}", text.trim())));
    }
    let path: Vec<String> = path.split('.').map(|s| s.trim().to_string()).collect();
    if path.iter().any(|segment| !is_ident(segment)) {
        return Err(LedgerError::InvalidFilter(format!("bad field name in {:?}", text.trim())));
    }

    Ok(Clause {
        path,
        operand: parse_operand(operand.trim())?,
    })
}

fn is_ident(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_operand(text: &str) -> LedgerResult<Operand> {
    if let Some(n) = text.strip_prefix('$') {
        return n
            .parse::<usize>()
            .map(Operand::Param)
            .map_err(|_| LedgerError::InvalidFilter(format!("bad placeholder {:?}", text)));
    }

    if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return Ok(Operand::Literal(Value::String(inner.to_string())));
    }

    match text {
        "true" => return Ok(Operand::Literal(Value::Bool(true))),
        "false" => return Ok(Operand::Literal(Value::Bool(false))),
        _ => {}
    }

    serde_json::from_str::<serde_json::Number>(text)
        .map(|n| Operand::Literal(Value::Number(n)))
        .map_err(|_| LedgerError::InvalidFilter(format!("bad operand {:?}", text)))
}

fn lookup<'a>(item: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(item, |value, key| value.get(key))
}
