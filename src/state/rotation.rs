/// Fixed-size rotation of visual objects; exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectRotation {
    active: usize,
    count: usize,
}

impl ObjectRotation {
    pub fn new(count: usize) -> Self {
        Self { active: 0, count }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Move to the next object in the cycle, returning the new active index.
    /// Callers must zero the outgoing object's layers before switching so no
    /// stale frame of it bleeds into the next activation.
    pub fn advance(&mut self) -> usize {
        self.active = (self.active + 1) % self.count;
        self.active
    }
}
