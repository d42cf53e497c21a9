/// Running mean
#[derive(Debug, Default, Clone)]
pub struct Averager {
    mean: f64,
    count: u64,
}

impl Averager {
    /// Push new value into [Averager]
    pub fn add(&mut self, x: f64) {
        self.count += 1;
        let k = self.count as f64;
        self.mean = x / k + self.mean * (k - 1.0) / k;
    }

    /// Current mean, [None] until first value
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean)
        }
    }

    /// Number of values pushed so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Reset [Averager]
    pub fn reset(&mut self) {
        self.count = 0;
        self.mean = 0.0;
    }
}

#[cfg(test)]
mod test {
    use super::Averager;

    #[test]
    fn running_mean() {
        let mut avg = Averager::default();
        assert!(avg.mean().is_none());

        for (x_i, mean) in [(1.0, 1.0), (0.5, 0.75), (3.0, 1.5)] {
            avg.add(x_i);
            assert_eq!(avg.mean(), Some(mean));
        }
        assert_eq!(avg.count(), 3);

        avg.reset();
        assert!(avg.mean().is_none());
    }
}
