//! Column standardization.

use credit_core::error::ModelError;
use credit_core::sanitize::finite_or_zero;
use credit_core::traits::check_rectangular;

/// Per-column mean and scale learned from a feature matrix.
///
/// Uses the population standard deviation. A zero-variance column gets a
/// scale of `1.0`, so it standardizes to all zeros instead of NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn column statistics.
    pub fn fit(features: &[Vec<f64>]) -> Result<Self, ModelError> {
        let first = features.first().ok_or(ModelError::EmptyTrainingSet)?;
        let cols = first.len();
        check_rectangular(features, cols)?;
        let n = features.len() as f64;

        let mut means = vec![0.0; cols];
        for row in features {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut variances = vec![0.0; cols];
        for row in features {
            for ((var, v), m) in variances.iter_mut().zip(row).zip(&means) {
                let d = v - m;
                *var += d * d;
            }
        }

        let scales = variances
            .into_iter()
            .map(|var| {
                let std = (var / n).sqrt();
                if std.is_finite() && std > 0.0 { std } else { 1.0 }
            })
            .collect();

        Ok(Self { means, scales })
    }

    /// Standardize a matrix with the learned statistics.
    pub fn transform(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        check_rectangular(features, self.means.len())?;
        Ok(features
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.means)
                    .zip(&self.scales)
                    .map(|((v, m), s)| finite_or_zero((v - m) / s))
                    .collect()
            })
            .collect())
    }

    /// Fit and transform the same matrix in one pass.
    pub fn fit_transform(features: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>), ModelError> {
        let scaler = Self::fit(features)?;
        let scaled = scaler.transform(features)?;
        Ok((scaler, scaled))
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_to_zero_mean_unit_variance() {
        let x = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0], vec![4.0, 40.0]];
        let (scaler, z) = StandardScaler::fit_transform(&x).unwrap();
        assert_eq!(scaler.means(), &[2.5, 25.0]);

        for col in 0..2 {
            let vals: Vec<f64> = z.iter().map(|r| r[col]).collect();
            let mean = vals.iter().sum::<f64>() / vals.len() as f64;
            let var = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / vals.len() as f64;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_variance_column_becomes_zero() {
        let x = vec![vec![7.0, 1.0], vec![7.0, 3.0]];
        let (scaler, z) = StandardScaler::fit_transform(&x).unwrap();
        assert_eq!(scaler.scales()[0], 1.0);
        assert_eq!(z[0][0], 0.0);
        assert_eq!(z[1][0], 0.0);
        assert_eq!(z[0][1], -1.0);
        assert_eq!(z[1][1], 1.0);
    }

    #[test]
    fn fit_rejects_empty_matrix() {
        assert_eq!(StandardScaler::fit(&[]), Err(ModelError::EmptyTrainingSet));
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&[vec![1.0]]),
            Err(ModelError::RaggedRow { row: 0, got: 1, expected: 2 })
        ));
    }

    #[test]
    fn huge_values_stay_finite() {
        let x = vec![vec![1e8], vec![0.0], vec![0.0]];
        let (_, z) = StandardScaler::fit_transform(&x).unwrap();
        assert!(z.iter().flatten().all(|v| v.is_finite()));
    }
}
