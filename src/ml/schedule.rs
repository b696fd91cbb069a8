// One-cycle learning-rate policy (Smith, 2018), stepped once per batch.
//
//   lr
//   peak ┤        /\
//        │       /  \
//   0.1p ┤──────/    \──────╮
//        │                   ╲___  0.001p
//        └──────┬─────┬──────┬───── step
//               0    mid   2·mid  total
//
// The cycle spans 90% of the steps; the last 10% anneal further down.

/// Learning rate scheduler driven by the training loop.
pub trait LrScheduler {
    /// Learning rate for the current step
    fn get_lr(&self) -> f64;

    /// Advance to the next step (called after every batch)
    fn step(&mut self);
}

/// Fraction of the steps spent after the cycle.
const END_PERCENTAGE: f64 = 0.1;

/// Cycle floor relative to the peak.
const SCALE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct OneCycleSchedule {
    peak_lr:     f64,
    total_steps: usize,
    mid:         usize,
    current:     usize,
}

impl OneCycleSchedule {
    pub fn new(peak_lr: f64, total_steps: usize) -> Self {
        let mid = (total_steps as f64 * (1.0 - END_PERCENTAGE) / 2.0).floor() as usize;
        Self { peak_lr, total_steps, mid, current: 0 }
    }

    /// Steps for `epochs` passes over `n_samples` in batches of `batch_size`.
    ///
    /// One step per batch actually drawn, a short last batch included. Keras'
    /// `epochs * n_samples // batch_size + 1` sizing gives the same count unless
    /// `batch_size` divides `n_samples`, where it has one step more than is taken.
    pub fn for_epochs(peak_lr: f64, epochs: usize, n_samples: usize, batch_size: usize) -> Self {
        Self::new(peak_lr, epochs * n_samples.div_ceil(batch_size.max(1)))
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    #[cfg(test)]
    pub fn current_step(&self) -> usize {
        self.current
    }

    /// Learning rate at step `t`.
    pub fn lr_at(&self, t: usize) -> f64 {
        let floor = self.peak_lr * SCALE;
        let ratio = 1.0 / SCALE - 1.0;

        if t <= self.mid {
            let p = if self.mid == 0 { 0.0 } else { t as f64 / self.mid as f64 };
            floor * (1.0 + p * ratio)
        } else if t <= 2 * self.mid {
            let p = 1.0 - (t - self.mid) as f64 / self.mid as f64;
            floor * (1.0 + p * ratio)
        } else {
            let tail = self.total_steps.saturating_sub(2 * self.mid).max(1);
            let p = ((t - 2 * self.mid) as f64 / tail as f64).min(1.0);
            floor * (1.0 - p * (1.0 - SCALE / 10.0))
        }
    }
}

impl LrScheduler for OneCycleSchedule {
    fn get_lr(&self) -> f64 {
        self.lr_at(self.current)
    }

    fn step(&mut self) {
        self.current += 1;
    }
}
