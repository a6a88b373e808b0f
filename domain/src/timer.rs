/// Per-turn countdown in whole seconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnTimer {
    initial: u32,
    remaining: u32,
    running: bool,
}

impl TurnTimer {
    #[must_use]
    pub fn new(initial: u32) -> Self {
        Self {
            initial,
            remaining: initial,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.remaining = self.initial;
        self.running = true;
    }

    pub fn reset(&mut self) {
        self.remaining = self.initial;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Counts down by `elapsed` seconds. Returns false when the timer is stopped.
    pub fn tick(
        &mut self,
        elapsed: u32,
    ) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        true
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.running && self.remaining == 0
    }
}
