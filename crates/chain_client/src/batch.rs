//! Results of batch create calls.

use crate::error::{ClientError, ClientResult};
use chain_protocol::{ErrorRecord, Outcome};

/// Per-element results of a batch create, in request order.
///
/// A batch call that reaches the ledger succeeds as a whole even when some
/// elements fail, so partial failure shows up here instead of as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse<T> {
    outcomes: Vec<Outcome<T>>,
}

impl<T> BatchResponse<T> {
    /// Wraps per-element outcomes.
    pub fn new(outcomes: Vec<Outcome<T>>) -> Self {
        Self { outcomes }
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if the batch had no elements.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Returns the outcomes in request order.
    pub fn outcomes(&self) -> &[Outcome<T>] {
        &self.outcomes
    }

    /// Consumes the response, returning the outcomes.
    pub fn into_outcomes(self) -> Vec<Outcome<T>> {
        self.outcomes
    }

    /// Returns true if some elements succeeded and some failed.
    pub fn is_partial(&self) -> bool {
        self.outcomes.iter().any(Outcome::is_ok) && self.outcomes.iter().any(Outcome::is_err)
    }

    /// Returns true if every element succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_ok)
    }

    /// Returns the successful elements with their request positions.
    pub fn successes(&self) -> impl Iterator<Item = (usize, &T)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, outcome)| outcome.ok().map(|value| (i, value)))
    }

    /// Returns the failed elements with their request positions.
    pub fn errors(&self) -> impl Iterator<Item = (usize, &ErrorRecord)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, outcome)| outcome.err().map(|record| (i, record)))
    }

    /// Converts each outcome into a `ClientResult`.
    pub fn into_results(self) -> Vec<ClientResult<T>> {
        self.outcomes
            .into_iter()
            .map(|outcome| outcome.into_result().map_err(ClientError::element))
            .collect()
    }

    /// Returns the only element of a one-element batch.
    pub fn into_single(self) -> ClientResult<T> {
        let count = self.outcomes.len();
        let mut outcomes = self.outcomes.into_iter();
        match (outcomes.next(), count) {
            (Some(outcome), 1) => outcome.into_result().map_err(ClientError::element),
            _ => Err(ClientError::Decode {
                message: format!("expected 1 result, got {}", count),
                body: String::new(),
            }),
        }
    }
}

impl<T> IntoIterator for BatchResponse<T> {
    type Item = Outcome<T>;
    type IntoIter = std::vec::IntoIter<Outcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a BatchResponse<T> {
    type Item = &'a Outcome<T>;
    type IntoIter = std::slice::Iter<'a, Outcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}
