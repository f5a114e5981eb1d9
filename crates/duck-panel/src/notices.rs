//! Notices — transient, self-expiring feedback keyed to the control that
//! triggered it.
//!
//! Time is passed in so expiry can be tested without a clock.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// The control that produced this notice, e.g. `"feed"`.
    pub control: &'static str,
    pub message: String,
    pub severity: Severity,
    pub expires: Instant,
}

pub struct Notices {
    items: VecDeque<Notice>,
    success_ttl: Duration,
    error_ttl: Duration,
    max_kept: usize,
}

impl Notices {
    pub fn new(success_ttl: Duration, error_ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            success_ttl,
            error_ttl,
            max_kept: 8,
        }
    }

    /// A control shows one notice at a time; a new one replaces the old.
    pub fn push(
        &mut self,
        control: &'static str,
        message: impl Into<String>,
        severity: Severity,
        now: Instant,
    ) {
        let ttl = match severity {
            Severity::Info | Severity::Success => self.success_ttl,
            Severity::Error => self.error_ttl,
        };
        self.items.retain(|n| n.control != control);
        self.items.push_back(Notice {
            control,
            message: message.into(),
            severity,
            expires: now + ttl,
        });
        while self.items.len() > self.max_kept {
            self.items.pop_front();
        }
    }

    pub fn success(&mut self, control: &'static str, message: impl Into<String>, now: Instant) {
        self.push(control, message, Severity::Success, now);
    }

    pub fn error(&mut self, control: &'static str, message: impl Into<String>, now: Instant) {
        self.push(control, message, Severity::Error, now);
    }

    pub fn info(&mut self, control: &'static str, message: impl Into<String>, now: Instant) {
        self.push(control, message, Severity::Info, now);
    }

    /// Drop expired notices.  Returns whether anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.expires > now);
        self.items.len() != before
    }

    pub fn for_control(&self, control: &str) -> Option<&Notice> {
        self.items.iter().find(|n| n.control == control)
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
