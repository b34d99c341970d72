// Two-sample hypothesis tests
//
// All tests are two-sided and return a p-value clamped to [0, 1]. When a test
// statistic is mathematically undefined (zero standard error, all values
// tied) the outcome is flagged `undefined` and carries p = 1 instead of NaN.

use crate::comparison::descriptive::{count_successes, mean, std_dev};
use crate::comparison::special::{
    chi_square_sf, ln_choose, normal_sf, students_t_two_tailed_p,
};
use serde::{Deserialize, Serialize};

/// Largest per-group size for which Mann-Whitney uses the exact null distribution
pub const EXACT_MANN_WHITNEY_MAX_N: usize = 8;

/// Relative tolerance when comparing hypergeometric probabilities in Fisher's test
const FISHER_RELATIVE_TOLERANCE: f64 = 1.0e-7;

/// Hypothesis test applied to a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    WelchT,
    MannWhitneyU,
    ChiSquare,
    FisherExact,
}

impl TestKind {
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::WelchT => "Welch's t-test",
            TestKind::MannWhitneyU => "Mann-Whitney U test",
            TestKind::ChiSquare => "Chi-square test",
            TestKind::FisherExact => "Fisher's exact test",
        }
    }
}

/// Result of running one hypothesis test
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub kind: TestKind,
    /// t (Welch), U for group A (Mann-Whitney), χ² (chi-square),
    /// Haldane-corrected odds ratio (Fisher)
    pub statistic: f64,
    /// Degrees of freedom where the reference distribution has them
    pub df: Option<f64>,
    /// Two-sided p-value in [0, 1]
    pub p_value: f64,
    /// The statistic could not be computed; p-value set to 1
    pub undefined: bool,
}

impl TestOutcome {
    fn undefined(kind: TestKind) -> Self {
        Self {
            kind,
            statistic: 0.0,
            df: None,
            p_value: 1.0,
            undefined: true,
        }
    }
}

/// Welch's unequal-variance t-test with Welch–Satterthwaite degrees of freedom
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TestOutcome {
    let n_a = a.len() as f64;
    let n_b = b.len() as f64;

    // Squared standard errors in units of the larger group SD
    let sd_a = std_dev(a);
    let sd_b = std_dev(b);
    let scale = sd_a.max(sd_b);
    if scale == 0.0 || !scale.is_finite() {
        return TestOutcome::undefined(TestKind::WelchT);
    }

    let u_a = (sd_a / scale).powi(2) / n_a;
    let u_b = (sd_b / scale).powi(2) / n_b;
    let se = scale * (u_a + u_b).sqrt();
    let t = (mean(a) - mean(b)) / se;

    let w_a = u_a / (u_a + u_b);
    let w_b = u_b / (u_a + u_b);
    let df = 1.0 / (w_a * w_a / (n_a - 1.0) + w_b * w_b / (n_b - 1.0));

    if !t.is_finite() || !df.is_finite() {
        return TestOutcome::undefined(TestKind::WelchT);
    }

    TestOutcome {
        kind: TestKind::WelchT,
        statistic: t,
        df: Some(df),
        p_value: students_t_two_tailed_p(t, df).clamp(0.0, 1.0),
        undefined: false,
    }
}

/// Midranks of the pooled sample plus the sizes of every tie block
fn pooled_ranks(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut pooled: Vec<(f64, usize)> = a
        .iter()
        .chain(b.iter())
        .copied()
        .enumerate()
        .map(|(idx, v)| (v, idx))
        .collect();
    pooled.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut ranks = vec![0.0; pooled.len()];
    let mut tie_blocks = Vec::new();
    let mut start = 0;
    while start < pooled.len() {
        let mut end = start + 1;
        while end < pooled.len() && pooled[end].0 == pooled[start].0 {
            end += 1;
        }
        // Ranks are 1-based: positions start..end share the mean of start+1..=end
        let midrank = (start + 1 + end) as f64 / 2.0;
        for &(_, idx) in &pooled[start..end] {
            ranks[idx] = midrank;
        }
        tie_blocks.push(end - start);
        start = end;
    }

    (ranks, tie_blocks)
}

/// Mann-Whitney U test (two-sided)
///
/// Uses the exact distribution of U when both groups have at most
/// `EXACT_MANN_WHITNEY_MAX_N` observations and there are no ties, and the
/// tie-corrected normal approximation with continuity correction otherwise.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> TestOutcome {
    let n_a = a.len();
    let n_b = b.len();

    let (ranks, tie_blocks) = pooled_ranks(a, b);
    let rank_sum_a: f64 = ranks[..n_a].iter().sum();
    let u_a = rank_sum_a - (n_a * (n_a + 1)) as f64 / 2.0;
    let u_b = (n_a * n_b) as f64 - u_a;
    let u_max = u_a.max(u_b);

    let has_ties = tie_blocks.iter().any(|&t| t > 1);

    if !has_ties && n_a <= EXACT_MANN_WHITNEY_MAX_N && n_b <= EXACT_MANN_WHITNEY_MAX_N {
        let p = 2.0 * exact_u_sf(u_max, n_a, n_b);
        return TestOutcome {
            kind: TestKind::MannWhitneyU,
            statistic: u_a,
            df: None,
            p_value: p.clamp(0.0, 1.0),
            undefined: false,
        };
    }

    let n = (n_a + n_b) as f64;
    let tie_term: f64 = tie_blocks
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let variance =
        (n_a * n_b) as f64 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    if variance <= 0.0 {
        let mut outcome = TestOutcome::undefined(TestKind::MannWhitneyU);
        outcome.statistic = u_a;
        return outcome;
    }

    let mu = (n_a * n_b) as f64 / 2.0;
    let z = (u_max - mu - 0.5) / variance.sqrt();

    TestOutcome {
        kind: TestKind::MannWhitneyU,
        statistic: u_a,
        df: None,
        p_value: (2.0 * normal_sf(z)).clamp(0.0, 1.0),
        undefined: false,
    }
}

/// P(U >= u) under H0 for group sizes (m, n), by counting rank arrangements
fn exact_u_sf(u: f64, m: usize, n: usize) -> f64 {
    // counts[i][j][k]: arrangements of i A-values and j B-values with U = k.
    // The largest pooled value is either an A (adds j to U) or a B (adds 0).
    let mut counts: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); n + 1]; m + 1];
    for i in 0..=m {
        for j in 0..=n {
            if i == 0 || j == 0 {
                counts[i][j] = vec![1.0];
                continue;
            }
            let mut dist = vec![0.0; i * j + 1];
            for (k, &c) in counts[i - 1][j].iter().enumerate() {
                dist[k + j] += c;
            }
            for (k, &c) in counts[i][j - 1].iter().enumerate() {
                dist[k] += c;
            }
            counts[i][j] = dist;
        }
    }

    let dist = &counts[m][n];
    let total: f64 = dist.iter().sum();
    let threshold = u.round().max(0.0) as usize;
    let upper: f64 = dist.iter().skip(threshold).sum();
    upper / total
}

/// 2×2 table of outcomes by group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContingencyTable {
    pub successes_a: u64,
    pub failures_a: u64,
    pub successes_b: u64,
    pub failures_b: u64,
}

impl ContingencyTable {
    /// Build from 0/1 indicator samples
    pub fn from_indicators(a: &[f64], b: &[f64]) -> Self {
        let successes_a = count_successes(a) as u64;
        let successes_b = count_successes(b) as u64;
        Self {
            successes_a,
            failures_a: a.len() as u64 - successes_a,
            successes_b,
            failures_b: b.len() as u64 - successes_b,
        }
    }

    pub fn total(&self) -> u64 {
        self.successes_a + self.failures_a + self.successes_b + self.failures_b
    }

    /// Observed counts in row-major order: [[sA, sB], [fA, fB]]
    fn observed(&self) -> [f64; 4] {
        [
            self.successes_a as f64,
            self.successes_b as f64,
            self.failures_a as f64,
            self.failures_b as f64,
        ]
    }

    /// Expected counts under independence, same order as `observed`
    pub fn expected(&self) -> [f64; 4] {
        let total = self.total() as f64;
        if total == 0.0 {
            return [0.0; 4];
        }
        let successes = (self.successes_a + self.successes_b) as f64;
        let failures = (self.failures_a + self.failures_b) as f64;
        let n_a = (self.successes_a + self.failures_a) as f64;
        let n_b = (self.successes_b + self.failures_b) as f64;
        [
            successes * n_a / total,
            successes * n_b / total,
            failures * n_a / total,
            failures * n_b / total,
        ]
    }

    pub fn min_expected(&self) -> f64 {
        self.expected().into_iter().fold(f64::INFINITY, f64::min)
    }
}

/// Chi-square test of independence on a 2×2 table with Yates' correction
pub fn chi_square_independence(table: &ContingencyTable) -> TestOutcome {
    let observed = table.observed();
    let expected = table.expected();

    if expected.iter().any(|&e| e <= 0.0) {
        return TestOutcome::undefined(TestKind::ChiSquare);
    }

    let chi2: f64 = observed
        .iter()
        .zip(expected.iter())
        .map(|(&o, &e)| {
            let deviation = (o - e).abs();
            let corrected = deviation - deviation.min(0.5);
            corrected * corrected / e
        })
        .sum();

    TestOutcome {
        kind: TestKind::ChiSquare,
        statistic: chi2,
        df: Some(1.0),
        p_value: chi_square_sf(chi2, 1.0).clamp(0.0, 1.0),
        undefined: false,
    }
}

/// Fisher's exact test (two-sided) on a 2×2 table
///
/// Sums the hypergeometric probabilities of every table with the observed
/// margins that is no more likely than the observed one.
pub fn fisher_exact(table: &ContingencyTable) -> TestOutcome {
    let n_a = table.successes_a + table.failures_a;
    let n_b = table.successes_b + table.failures_b;
    let successes = table.successes_a + table.successes_b;
    let total = n_a + n_b;

    let ln_denominator = ln_choose(total, successes);
    let ln_pmf = |x: u64| ln_choose(n_a, x) + ln_choose(n_b, successes - x) - ln_denominator;

    let lo = successes.saturating_sub(n_b);
    let hi = successes.min(n_a);
    let observed = ln_pmf(table.successes_a).exp();
    let cutoff = observed * (1.0 + FISHER_RELATIVE_TOLERANCE);

    let p: f64 = (lo..=hi)
        .map(|x| ln_pmf(x).exp())
        .filter(|&p| p <= cutoff)
        .sum();

    let odds_ratio = ((table.successes_a as f64 + 0.5) * (table.failures_b as f64 + 0.5))
        / ((table.failures_a as f64 + 0.5) * (table.successes_b as f64 + 0.5));

    TestOutcome {
        kind: TestKind::FisherExact,
        statistic: odds_ratio,
        df: None,
        p_value: p.clamp(0.0, 1.0),
        undefined: false,
    }
}
