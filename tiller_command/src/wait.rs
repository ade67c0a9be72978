//! Pure delay command.

use std::time::Duration;

use crate::claim::ClaimSet;
use crate::command::Command;

/// Command that claims nothing, does nothing, and finishes on its
/// timeout. Used to insert pauses into autonomous sequences.
pub struct WaitCommand {
    name: String,
    duration: Duration,
}

impl WaitCommand {
    pub fn new(duration: Duration) -> Self {
        Self {
            name: format!("wait {:.2}s", duration.as_secs_f64()),
            duration,
        }
    }
}

impl<C> Command<C> for WaitCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn claims(&self) -> ClaimSet {
        ClaimSet::empty()
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn is_finished(&mut self, _ctx: &mut C) -> bool {
        // Completion is the timeout itself.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use std::time::Instant;

    #[test]
    fn wait_finishes_exactly_on_timeout() {
        let mut scheduler: Scheduler<()> = Scheduler::new();
        let id = scheduler
            .schedule(Box::new(WaitCommand::new(Duration::from_millis(100))))
            .unwrap();

        let t0 = Instant::now();
        scheduler.tick_at(&mut (), t0);
        scheduler.tick_at(&mut (), t0 + Duration::from_millis(60));
        assert!(scheduler.is_running(id));

        scheduler.tick_at(&mut (), t0 + Duration::from_millis(100));
        assert!(!scheduler.is_running(id));
    }

    #[test]
    fn wait_claims_nothing() {
        let wait = WaitCommand::new(Duration::from_secs(1));
        assert_eq!(<WaitCommand as Command<()>>::claims(&wait), ClaimSet::empty());
    }
}
