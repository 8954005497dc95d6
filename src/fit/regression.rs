//! Ordinary least squares fit of the linear mass model.

use nalgebra::DVector;

use crate::domain::{Feature, Star};
use crate::error::AppError;
use crate::math::{design_with_intercept, mean_squared_error, r2_score, solve_least_squares};
use crate::models::LinearModel;

/// Feature matrix (row-major) and target vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub features: Vec<Feature>,
    pub target: Feature,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

impl Dataset {
    pub fn from_stars(stars: &[Star], features: &[Feature], target: Feature) -> Self {
        Dataset {
            features: features.to_vec(),
            target,
            x: stars.iter().map(|s| features.iter().map(|&f| s.get(f)).collect()).collect(),
            y: stars.iter().map(|s| s.get(target)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Rows at `idx`, in that order.
    pub fn subset(&self, idx: &[usize]) -> Dataset {
        Dataset {
            features: self.features.clone(),
            target: self.target,
            x: idx.iter().map(|&i| self.x[i].clone()).collect(),
            y: idx.iter().map(|&i| self.y[i]).collect(),
        }
    }

    /// One column of the feature matrix.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.x.iter().map(|row| row[j]).collect()
    }
}

/// Fit `y = intercept + Σ β_j x_j`.
pub fn fit_linear(data: &Dataset) -> Result<LinearModel, AppError> {
    let p = data.features.len();
    if data.len() < p + 1 {
        return Err(AppError::insufficient(format!(
            "Need at least {} row(s) to fit {p} feature(s), got {}.",
            p + 1,
            data.len()
        )));
    }

    let x = design_with_intercept(&data.x);
    let y = DVector::from_column_slice(&data.y);
    let beta = solve_least_squares(&x, &y)
        .ok_or_else(|| AppError::runtime("Least squares solve failed (ill-conditioned design)."))?;

    Ok(LinearModel {
        target: data.target,
        features: data.features.clone(),
        intercept: beta[0],
        coefficients: beta.iter().skip(1).copied().collect(),
    })
}

/// Mean squared error and R² of `model` on `data`.
pub fn score(model: &LinearModel, data: &Dataset) -> Result<(f64, f64), AppError> {
    let pred: Vec<f64> = data.x.iter().map(|row| model.predict_row(row)).collect();
    let mse = mean_squared_error(&data.y, &pred);
    let r2 = r2_score(&data.y, &pred);
    match (mse, r2) {
        (Some(mse), Some(r2)) => Ok((mse, r2)),
        _ => Err(AppError::insufficient("Cannot score a model on an empty set.")),
    }
}
