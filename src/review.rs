//! Human review of proposed flag corrections.
//!
//! The inference pass never blocks on a person: it hands each proposed
//! correction to a [`Reviewer`] and the default one accepts everything.

use std::io::{BufRead, Write};

use tracing::warn;

use crate::multidigit::Correction;

/// Accept or reject a proposed correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

pub trait Reviewer {
    fn review(&mut self, correction: &Correction) -> Decision;
}

/// Accepts every correction
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Reviewer for AcceptAll {
    fn review(&mut self, _correction: &Correction) -> Decision {
        Decision::Accept
    }
}

/// Asks on a line-oriented prompt.
///
/// `n`/`no` rejects; anything else, including an empty answer, accepts.
/// Once input is exhausted the remaining corrections are accepted.
pub struct PromptReviewer<R, W> {
    input: R,
    output: W,
    exhausted: bool,
}

impl<R: BufRead, W: Write> PromptReviewer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            exhausted: false,
        }
    }
}

impl<R: BufRead, W: Write> Reviewer for PromptReviewer<R, W> {
    fn review(&mut self, correction: &Correction) -> Decision {
        if self.exhausted {
            return Decision::Accept;
        }

        let prompt = write!(
            self.output,
            "Segment {} (link {}): MULTIDIGIT {} -> {}. Apply? [Y/n] ",
            correction.index, correction.link_id, correction.original, correction.inferred
        )
        .and_then(|_| self.output.flush());
        if let Err(e) = prompt {
            warn!("Review prompt failed, accepting remaining corrections: {}", e);
            self.exhausted = true;
            return Decision::Accept;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => {
                self.exhausted = true;
                Decision::Accept
            }
            Ok(_) => match answer.trim().to_ascii_lowercase().as_str() {
                "n" | "no" => Decision::Reject,
                _ => Decision::Accept,
            },
        }
    }
}
