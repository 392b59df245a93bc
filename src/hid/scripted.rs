//! Scripted report source for tests.
//!
//! Plays back a fixed sequence of poll results instead of touching hardware,
//! the same role the mock keyboard backend plays for key injection.

use super::session::{RawReport, ReportSource};
use super::HidError;
use std::collections::VecDeque;

/// One scripted poll outcome.
#[derive(Debug, Clone)]
pub enum Poll {
    /// Poll yields this report.
    Report(Vec<u8>),
    /// Poll yields nothing (device had no fresh report).
    Empty,
    /// Poll fails as if the device was unplugged.
    Lost,
}

/// Report source that replays a scripted poll sequence.
///
/// Once the script is exhausted every further poll is empty, so loops that
/// poll "a bounded number of times" terminate naturally in tests.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    polls: VecDeque<Poll>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from poll outcomes in order.
    pub fn from_polls<I: IntoIterator<Item = Poll>>(polls: I) -> Self {
        Self {
            polls: polls.into_iter().collect(),
        }
    }

    pub fn push_report(&mut self, report: &[u8]) {
        self.polls.push_back(Poll::Report(report.to_vec()));
    }

    pub fn push_empty(&mut self) {
        self.polls.push_back(Poll::Empty);
    }

    /// Queue the same report for `count` consecutive polls.
    pub fn repeat_report(&mut self, report: &[u8], count: usize) {
        for _ in 0..count {
            self.push_report(report);
        }
    }

    pub fn remaining(&self) -> usize {
        self.polls.len()
    }
}

impl ReportSource for ScriptedSource {
    fn read_report(&mut self) -> Result<Option<RawReport>, HidError> {
        match self.polls.pop_front() {
            Some(Poll::Report(report)) => Ok(Some(report)),
            Some(Poll::Lost) => Err(HidError::Lost("scripted disconnect".to_string())),
            Some(Poll::Empty) | None => Ok(None),
        }
    }
}
