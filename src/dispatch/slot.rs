/// Single in-flight job slot
///
/// Replaces a bare "is loading" flag. `begin` hands out a ticket, and only
/// the completion carrying that ticket can release the slot. Anything that
/// changes what the user is looking at marks the job stale, so its result
/// is not written over the new state when it eventually arrives.

use crate::error::StudioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug)]
struct InFlight<T> {
    ticket: Ticket,
    target: T,
    message: String,
    stale: bool,
}

/// A finished job handed back to the owner of the slot
#[derive(Debug, PartialEq)]
pub struct Finished<T> {
    pub target: T,
    pub stale: bool,
}

#[derive(Debug)]
pub struct TaskSlot<T> {
    next: u64,
    current: Option<InFlight<T>>,
}

impl<T> Default for TaskSlot<T> {
    fn default() -> Self {
        Self {
            next: 1,
            current: None,
        }
    }
}

impl<T> TaskSlot<T> {
    /// Claim the slot, or fail with `Busy` if a job is running
    pub fn begin(&mut self, target: T, message: impl Into<String>) -> Result<Ticket, StudioError> {
        if self.current.is_some() {
            return Err(StudioError::Busy);
        }
        Ok(self.start(target, message.into()))
    }

    /// Claim the slot, abandoning whatever was running.
    /// The abandoned job's completion will be ignored.
    pub fn replace(&mut self, target: T, message: impl Into<String>) -> Ticket {
        if let Some(previous) = self.current.take() {
            tracing::debug!("superseding job {:?}", previous.ticket);
        }
        self.start(target, message.into())
    }

    fn start(&mut self, target: T, message: String) -> Ticket {
        let ticket = Ticket(self.next);
        self.next += 1;
        self.current = Some(InFlight {
            ticket,
            target,
            message,
            stale: false,
        });
        ticket
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Loading text of the running job
    pub fn message(&self) -> Option<&str> {
        self.current.as_ref().map(|job| job.message.as_str())
    }

    /// Replace the loading text if `ticket` is still the running job
    pub fn set_message(&mut self, ticket: Ticket, message: impl Into<String>) {
        if let Some(job) = self.current.as_mut().filter(|job| job.ticket == ticket) {
            job.message = message.into();
        }
    }

    pub fn mark_stale(&mut self) {
        if let Some(job) = self.current.as_mut() {
            job.stale = true;
        }
    }

    /// Release the slot for `ticket`. Unknown or superseded tickets
    /// return `None` and leave the slot alone.
    pub fn finish(&mut self, ticket: Ticket) -> Option<Finished<T>> {
        match &self.current {
            Some(job) if job.ticket == ticket => {}
            _ => return None,
        }
        self.current.take().map(|job| Finished {
            target: job.target,
            stale: job.stale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_rejected() {
        let mut slot = TaskSlot::default();
        let ticket = slot.begin("a", "working").unwrap();
        assert!(matches!(slot.begin("b", "again"), Err(StudioError::Busy)));
        assert_eq!(slot.message(), Some("working"));
        slot.set_message(ticket, "almost there");
        assert_eq!(slot.message(), Some("almost there"));

        let finished = slot.finish(ticket).unwrap();
        assert_eq!(finished.target, "a");
        assert!(!finished.stale);
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_stale_and_foreign_tickets() {
        let mut slot = TaskSlot::default();
        let first = slot.begin(1, "").unwrap();
        slot.mark_stale();
        assert_eq!(slot.finish(first), Some(Finished { target: 1, stale: true }));

        // Marking an idle slot is a no-op
        slot.mark_stale();
        let second = slot.begin(2, "").unwrap();
        assert_eq!(slot.finish(first), None);
        assert!(slot.is_busy());
        assert_eq!(slot.finish(second).map(|f| f.stale), Some(false));
    }

    #[test]
    fn test_replace_supersedes() {
        let mut slot = TaskSlot::default();
        let old = slot.begin((), "").unwrap();
        let new = slot.replace((), "");
        assert_ne!(old, new);
        assert_eq!(slot.finish(old), None);
        assert!(slot.finish(new).is_some());
    }
}
