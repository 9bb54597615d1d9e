/// Slots per line, the last one always holds the blank counter.
pub const MAX_WAYS: usize = 8;

/// Job slots per line.
pub const JOB_WAYS: usize = MAX_WAYS - 1;

/// Misses after which a line is considered blank.
pub const BLANK_LIMIT: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSlot {
    Empty,
    /// Index into the decoder's job table.
    Job(u8),
    /// Consecutive decode calls in which no job matched the line.
    Cooldown(u8),
}

/// Which jobs to try on one scan line, most recently successful first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePattern {
    slots: [PatternSlot; MAX_WAYS],
}

impl Default for LinePattern {
    fn default() -> Self {
        let mut slots = [PatternSlot::Empty; MAX_WAYS];
        slots[JOB_WAYS] = PatternSlot::Cooldown(0);
        Self { slots }
    }
}

impl LinePattern {
    /// Job indices in trial order.
    pub fn jobs(&self) -> impl Iterator<Item = u8> + '_ {
        self.slots[..JOB_WAYS].iter().map_while(|slot| match slot {
            PatternSlot::Job(job) => Some(*job),
            _ => None,
        })
    }

    pub fn job_at(&self, way: usize) -> Option<u8> {
        match self.slots.get(way) {
            Some(PatternSlot::Job(job)) if way < JOB_WAYS => Some(*job),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots[0] == PatternSlot::Empty
    }

    pub fn contains(&self, job: u8) -> bool {
        self.jobs().any(|j| j == job)
    }

    pub fn has_room(&self) -> bool {
        self.slots[JOB_WAYS - 1] == PatternSlot::Empty
    }

    /// Appends `job` to the trial order. Returns false if the line is full.
    pub fn add(&mut self, job: u8) -> bool {
        if self.contains(job) {
            return true;
        }

        match self.slots[..JOB_WAYS]
            .iter()
            .position(|slot| *slot == PatternSlot::Empty)
        {
            Some(way) => {
                self.slots[way] = PatternSlot::Job(job);
                self.reset_cooldown();
                true
            }
            None => false,
        }
    }

    /// Removes `job` and renumbers jobs above it, as the job table does when
    /// `job` is deleted from it.
    pub fn remove_and_compact(&mut self, job: u8) {
        self.remove(job);

        for slot in &mut self.slots[..JOB_WAYS] {
            if let PatternSlot::Job(j) = slot {
                if *j > job {
                    *j -= 1;
                }
            }
        }
    }

    /// Removes `job` keeping the order of the others. Lines without `job`
    /// keep their blank counter.
    pub fn remove(&mut self, job: u8) {
        if !self.contains(job) {
            return;
        }

        let mut kept = [PatternSlot::Empty; JOB_WAYS];
        for (slot, j) in kept.iter_mut().zip(self.jobs().filter(|&j| j != job)) {
            *slot = PatternSlot::Job(j);
        }
        self.slots[..JOB_WAYS].copy_from_slice(&kept);
        self.reset_cooldown();
    }

    /// Moves the job at `way` to the front.
    pub fn promote(&mut self, way: usize) {
        if way < JOB_WAYS {
            self.slots[..=way].rotate_right(1);
        }
        self.reset_cooldown();
    }

    pub fn cooldown(&self) -> u8 {
        match self.slots[JOB_WAYS] {
            PatternSlot::Cooldown(count) => count,
            _ => 0,
        }
    }

    /// Counts a miss, saturating at [`BLANK_LIMIT`].
    pub fn miss(&mut self) {
        let count = self.cooldown();
        self.slots[JOB_WAYS] = PatternSlot::Cooldown((count + 1).min(BLANK_LIMIT));
    }

    pub fn is_blank(&self) -> bool {
        self.cooldown() >= BLANK_LIMIT
    }

    fn reset_cooldown(&mut self) {
        self.slots[JOB_WAYS] = PatternSlot::Cooldown(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mru_order() {
        let mut pattern = LinePattern::default();
        assert!(pattern.is_empty());
        assert!(pattern.add(0));
        assert!(pattern.add(3));
        assert!(pattern.add(5));
        assert!(pattern.add(3));
        assert_eq!(pattern.jobs().collect::<Vec<_>>(), [0, 3, 5]);

        pattern.promote(2);
        assert_eq!(pattern.jobs().collect::<Vec<_>>(), [5, 0, 3]);
        assert_eq!(pattern.job_at(1), Some(0));
        assert_eq!(pattern.job_at(3), None);
        assert_eq!(pattern.job_at(JOB_WAYS), None);
    }

    #[test]
    fn one_slot_stays_reserved() {
        let mut pattern = LinePattern::default();
        for job in 0..JOB_WAYS as u8 {
            assert!(pattern.has_room());
            assert!(pattern.add(job));
        }
        assert!(!pattern.has_room());
        assert!(!pattern.add(7));
        assert_eq!(pattern.jobs().count(), JOB_WAYS);
        assert_eq!(pattern.cooldown(), 0);
    }

    #[test]
    fn removal_compacts_indices() {
        let mut pattern = LinePattern::default();
        for job in [4, 1, 2, 6] {
            pattern.add(job);
        }
        pattern.remove_and_compact(2);
        assert_eq!(pattern.jobs().collect::<Vec<_>>(), [3, 1, 5]);

        pattern.remove(1);
        assert_eq!(pattern.jobs().collect::<Vec<_>>(), [3, 5]);
    }

    #[test]
    fn removing_absent_job_keeps_cooldown() {
        let mut pattern = LinePattern::default();
        pattern.add(2);
        for _ in 0..5 {
            pattern.miss();
        }

        pattern.remove(4);
        pattern.remove_and_compact(6);
        assert_eq!(pattern.cooldown(), 5);
        assert_eq!(pattern.jobs().collect::<Vec<_>>(), [2]);

        pattern.remove(2);
        assert_eq!(pattern.cooldown(), 0);
        assert!(pattern.is_empty());
    }

    #[test]
    fn cooldown_saturates() {
        let mut pattern = LinePattern::default();
        pattern.add(0);
        for _ in 0..300 {
            pattern.miss();
        }
        assert_eq!(pattern.cooldown(), BLANK_LIMIT);
        assert!(pattern.is_blank());

        pattern.promote(0);
        assert_eq!(pattern.cooldown(), 0);
        assert!(!pattern.is_blank());
    }
}
