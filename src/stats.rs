use crate::common::Method;

/// Summary statistics over a sequence of elapsed times, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation, only defined for more than one sample.
    pub std_dev: Option<f64>,
}

impl Summary {
    /// Returns `None` for an empty sequence.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let count = samples.len();
        let mean = samples.iter().sum::<f64>() / count as f64;

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };

        let std_dev = (count > 1).then(|| {
            let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        });

        Some(Self {
            count,
            mean,
            median,
            min: sorted[0],
            max: sorted[count - 1],
            std_dev,
        })
    }
}

/// Relative speed of the two methods, from their mean times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub faster: Method,
    /// Slower mean divided by faster mean.
    pub ratio: f64,
}

impl Comparison {
    /// Flight wins only with a strictly smaller mean.
    pub fn between(flight_mean: f64, http_mean: f64) -> Self {
        if flight_mean < http_mean {
            Self {
                faster: Method::Flight,
                ratio: http_mean / flight_mean,
            }
        } else {
            Self {
                faster: Method::Http,
                ratio: flight_mean / http_mean,
            }
        }
    }

    pub fn percent(&self) -> f64 {
        (self.ratio - 1.0) * 100.0
    }

    pub fn verdict(&self) -> String {
        format!(
            "{} is {:.2}x faster ({:.1}% faster)",
            self.faster,
            self.ratio,
            self.percent()
        )
    }
}
