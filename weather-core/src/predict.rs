//! Next-day temperature estimate from today's temperature and humidity.
//!
//! The model is an ordinary least squares fit over a fixed ten-row table,
//! computed once at start-up and only read afterwards.

use crate::{model::DailyForecast, units::round2};

/// `(today_temp, today_humidity, tomorrow_temp)` rows the model is fit on.
pub const TRAINING_TABLE: [(f64, f64, f64); 10] = [
    (30.0, 40.0, 31.0),
    (32.0, 35.0, 33.0),
    (35.0, 30.0, 36.0),
    (25.0, 60.0, 26.0),
    (28.0, 55.0, 29.0),
    (22.0, 70.0, 23.0),
    (20.0, 80.0, 21.0),
    (27.0, 50.0, 28.0),
    (29.0, 45.0, 30.0),
    (24.0, 65.0, 25.0),
];

/// `tomorrow = intercept + coef_temp * temp + coef_humidity * humidity`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coef_temp: f64,
    pub coef_humidity: f64,
}

impl LinearModel {
    /// Least squares fit of `(temp, humidity) -> target` rows.
    ///
    /// Returns `None` when the rows do not pin down a unique solution
    /// (fewer than three rows, or collinear features).
    pub fn fit(rows: &[(f64, f64, f64)]) -> Option<Self> {
        // Normal equations: (XᵀX) β = Xᵀy with X = [1, temp, humidity].
        let mut xtx = [[0.0_f64; 3]; 3];
        let mut xty = [0.0_f64; 3];

        for &(temp, humidity, target) in rows {
            let x = [1.0, temp, humidity];
            for i in 0..3 {
                for j in 0..3 {
                    xtx[i][j] += x[i] * x[j];
                }
                xty[i] += x[i] * target;
            }
        }

        let [intercept, coef_temp, coef_humidity] = solve3(xtx, xty)?;
        Some(Self {
            intercept,
            coef_temp,
            coef_humidity,
        })
    }

    /// Model fit on [`TRAINING_TABLE`].
    pub fn trained() -> Option<Self> {
        Self::fit(&TRAINING_TABLE)
    }

    pub fn predict(&self, today_temp: f64, today_humidity: f64) -> f64 {
        self.intercept + self.coef_temp * today_temp + self.coef_humidity * today_humidity
    }
}

/// Gaussian elimination with partial pivoting.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    const EPS: f64 = 1e-9;

    for col in 0..3 {
        let pivot = (col..3).max_by(|&r, &s| a[r][col].abs().total_cmp(&a[s][col].abs()))?;
        if a[pivot][col].abs() < EPS {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..3 {
            let factor = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; 3];
    for row in (0..3).rev() {
        let tail: f64 = ((row + 1)..3).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// First value present, in preference order.
pub fn first_present<T: Copy>(candidates: &[Option<T>]) -> Option<T> {
    candidates.iter().flatten().next().copied()
}

/// One prediction per forecast day, each rounded to two decimals.
///
/// Day one starts from today's readings. Later days feed on the previous
/// prediction, so an early miss carries forward through the chain.
pub fn predict_chain(
    model: &LinearModel,
    today_temp: f64,
    today_humidity: f64,
    daily: &[DailyForecast],
) -> Vec<f64> {
    let mut predictions: Vec<f64> = Vec::with_capacity(daily.len());

    for (i, day) in daily.iter().enumerate() {
        let (temp, humidity) = if i == 0 {
            (today_temp, today_humidity)
        } else {
            let day_humidity = day.avg_humidity.map(|h| h as f64);
            (
                first_present(&[predictions.last().copied(), day.avg_temp, Some(today_temp)])
                    .unwrap_or(today_temp),
                first_present(&[day_humidity, Some(today_humidity)]).unwrap_or(today_humidity),
            )
        };

        predictions.push(round2(model.predict(temp, humidity)));
    }

    predictions
}
