use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {text:?} is not an integer")]
    Parse { line: usize, text: String },

    #[error("{stat} requires at least {needed} data point(s)")]
    NotEnoughData { stat: &'static str, needed: usize },
}

/// Reads measurement lines, skipping blanks, `#` comments and anything above
/// `cutoff`.
pub fn read_values<R: BufRead>(reader: R, cutoff: Option<i64>) -> Result<Vec<i64>, StatsError> {
    let mut values = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let value: i64 = text.parse().map_err(|_| StatsError::Parse {
            line: idx + 1,
            text: text.to_string(),
        })?;
        if cutoff.is_some_and(|c| value > c) {
            continue;
        }
        values.push(value);
    }
    Ok(values)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub median: f64,
    pub mode: i64,
    pub pstdev: f64,
    /// Sample deviation, undefined below two values.
    pub stdev: Option<f64>,
    pub min: i64,
    pub max: i64,
    pub count: usize,
}

impl Summary {
    pub fn of(values: &[i64]) -> Result<Self, StatsError> {
        if values.is_empty() {
            return Err(StatsError::NotEnoughData {
                stat: "mean",
                needed: 1,
            });
        }

        let count = values.len();
        let n = count as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let squares: f64 = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum();

        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
        } else {
            sorted[mid] as f64
        };

        Ok(Self {
            mean,
            median,
            mode: mode(values),
            pstdev: (squares / n).sqrt(),
            stdev: (count > 1).then(|| (squares / (n - 1.0)).sqrt()),
            min: sorted[0],
            max: sorted[count - 1],
            count,
        })
    }
}

// most frequent value, earliest wins ties
fn mode(values: &[i64]) -> i64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &v in values {
        *counts.entry(v).or_default() += 1;
    }

    let mut best = values[0];
    let mut best_count = 0;
    for &v in values {
        let c = counts[&v];
        if c > best_count {
            best = v;
            best_count = c;
        }
    }
    best
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\tmean\t {}", self.mean)?;
        writeln!(f, "\tmedian\t {}", self.median)?;
        writeln!(f, "\tmode\t {}", self.mode)?;
        writeln!(f, "\tpstdev\t {}", self.pstdev)?;
        match self.stdev {
            Some(stdev) => writeln!(f, "\tstdev\t {}", stdev)?,
            None => writeln!(f, "\tstdev\t n/a")?,
        }
        writeln!(f, "\tmin\t {}", self.min)?;
        writeln!(f, "\tmax\t {}", self.max)?;
        writeln!(f, "\tcount\t {}", self.count)?;
        write!(f, "\tsqrt(count)\t {}", (self.count as f64).sqrt())
    }
}
