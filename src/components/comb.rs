//! Damped feedback comb filter, the other Freeverb building block (spec §4.10).

/// A single comb filter: a delay line with damped feedback, as used by
/// both the algorithmic reverb and the Freeverb-style reverb.
#[derive(Clone, Debug)]
pub struct Comb {
    buffer: Vec<f32>,
    idx: usize,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filter_store: f32,
}

impl Comb {
    pub fn new(delay_length: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_length.max(1)],
            idx: 0,
            feedback: 0.5,
            damp1: 0.5,
            damp2: 0.5,
            filter_store: 0.0,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    /// `damping` in `[0, 1]`; higher values roll off high frequencies faster
    /// in the feedback path.
    pub fn set_damping(&mut self, damping: f32) {
        self.damp1 = damping;
        self.damp2 = 1.0 - damping;
    }

    pub fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
        self.idx = 0;
        self.filter_store = 0.0;
    }

    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.idx];
        self.filter_store = output * self.damp2 + self.filter_store * self.damp1;
        self.buffer[self.idx] = input + self.filter_store * self.feedback;
        self.idx = (self.idx + 1) % self.buffer.len();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_response_decays() {
        let mut c = Comb::new(8);
        c.set_feedback(0.8);
        c.set_damping(0.2);
        let first = c.tick(1.0);
        for _ in 0..7 {
            c.tick(0.0);
        }
        let looped = c.tick(0.0);
        assert!(first.abs() < 1e-6);
        assert!(looped.abs() < 1.0);
    }
}
