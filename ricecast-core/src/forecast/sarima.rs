//! Seasonal ARIMA, SARIMA(p,d,q)(P,D,Q)s.
//!
//! The series is differenced `d` times at lag 1 and `D` times at lag `s`; the
//! result `w` is modelled as a zero-mean ARMA process whose polynomials are
//! the products of the non-seasonal and seasonal parts:
//!
//! ```text
//! φ(B) Φ(Bˢ) w_t = θ(B) Θ(Bˢ) e_t
//! ```
//!
//! Coefficients are estimated by conditional sum of squares (CSS) with a
//! Nelder–Mead search. Stationarity and invertibility are not enforced: any
//! coefficient values are admissible as long as the residual recursion stays
//! finite.
//!
//! ## Example
//!
//! ```rust
//! use ricecast_core::forecast::{Predictor, Sarima, SarimaOrder};
//!
//! let data: Vec<f64> = (0..60).map(|t| 100.0 + t as f64 + [0.0, 2.0, 1.0, 3.0, 0.5, -1.0, 0.0][t % 7]).collect();
//! let mut model = Sarima::new(SarimaOrder::DAILY_WEEKLY);
//! model.fit(&data).unwrap();
//! let forecast = model.predict(7).unwrap();
//! assert_eq!(forecast.len(), 7);
//! ```

use super::optimize::{nelder_mead, NelderMeadOptions};
use super::{ForecastError, Predictor};
use serde::{Deserialize, Serialize};

/// Residuals beyond this magnitude mean the recursion has blown up.
const EXPLOSION_LIMIT: f64 = 1e100;

/// Model orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaOrder {
    /// Non-seasonal AR order.
    pub p: usize,
    /// Non-seasonal differencing.
    pub d: usize,
    /// Non-seasonal MA order.
    pub q: usize,
    /// Seasonal AR order.
    pub seasonal_p: usize,
    /// Seasonal differencing.
    pub seasonal_d: usize,
    /// Seasonal MA order.
    pub seasonal_q: usize,
    /// Season length in observations.
    pub period: usize,
}

impl SarimaOrder {
    /// (1,1,1)(0,1,1) with a 7-day season: the daily price model.
    pub const DAILY_WEEKLY: SarimaOrder = SarimaOrder {
        p: 1,
        d: 1,
        q: 1,
        seasonal_p: 0,
        seasonal_d: 1,
        seasonal_q: 1,
        period: 7,
    };

    /// Plain ARIMA(p,d,q).
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            period: 0,
        }
    }

    fn ar_lags(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }

    fn ma_lags(&self) -> usize {
        self.q + self.seasonal_q * self.period
    }

    fn param_count(&self) -> usize {
        self.p + self.seasonal_p + self.q + self.seasonal_q
    }

    /// Observations needed before anything can be estimated.
    pub fn min_observations(&self) -> usize {
        self.d + self.seasonal_d * self.period + self.ar_lags() + self.ma_lags() + 1
    }

    fn validate(&self) -> Result<(), ForecastError> {
        let seasonal = self.seasonal_p + self.seasonal_d + self.seasonal_q > 0;
        if seasonal && self.period < 2 {
            return Err(ForecastError::InvalidParameter {
                name: "period".into(),
                reason: "seasonal terms need a period of at least 2".into(),
            });
        }
        if self.d > 2 || self.seasonal_d > 1 {
            return Err(ForecastError::InvalidParameter {
                name: "d".into(),
                reason: "differencing must be d <= 2 and D <= 1".into(),
            });
        }
        Ok(())
    }
}

/// Coefficients laid out as `[φ.., Φ.., θ.., Θ..]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarimaParams {
    pub ar: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl SarimaParams {
    fn from_vec(order: &SarimaOrder, x: &[f64]) -> Self {
        let (ar, rest) = x.split_at(order.p);
        let (seasonal_ar, rest) = rest.split_at(order.seasonal_p);
        let (ma, seasonal_ma) = rest.split_at(order.q);
        Self {
            ar: ar.to_vec(),
            seasonal_ar: seasonal_ar.to_vec(),
            ma: ma.to_vec(),
            seasonal_ma: seasonal_ma.to_vec(),
        }
    }

    fn is_finite(&self) -> bool {
        self.ar
            .iter()
            .chain(&self.seasonal_ar)
            .chain(&self.ma)
            .chain(&self.seasonal_ma)
            .all(|v| v.is_finite())
    }
}

/// Expanded lag polynomials: `w_t = Σ ar[k-1]·w_{t-k} + e_t + Σ ma[k-1]·e_{t-k}`.
struct Lags {
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl Lags {
    fn expand(order: &SarimaOrder, params: &SarimaParams) -> Self {
        // AR side: (1 - Σφ Bⁱ)(1 - ΣΦ Bˢʲ) = 1 - Σ a_k Bᵏ
        let ar_poly = poly_mul(
            &lag_poly(&params.ar, 1, -1.0),
            &lag_poly(&params.seasonal_ar, order.period, -1.0),
        );
        // MA side: (1 + Σθ Bⁱ)(1 + ΣΘ Bˢʲ) = 1 + Σ b_k Bᵏ
        let ma_poly = poly_mul(
            &lag_poly(&params.ma, 1, 1.0),
            &lag_poly(&params.seasonal_ma, order.period, 1.0),
        );

        Self {
            ar: ar_poly.iter().skip(1).map(|c| -c).collect(),
            ma: ma_poly.iter().skip(1).copied().collect(),
        }
    }

    /// One-step prediction at `t` from past values and past shocks.
    fn predict_at(&self, t: usize, w: &[f64], e: &[f64]) -> f64 {
        let ar: f64 = self
            .ar
            .iter()
            .enumerate()
            .filter(|(k, _)| t > *k)
            .map(|(k, a)| a * w[t - k - 1])
            .sum();
        let ma: f64 = self
            .ma
            .iter()
            .enumerate()
            .filter(|(k, _)| t > *k)
            .map(|(k, b)| b * e[t - k - 1])
            .sum();
        ar + ma
    }
}

/// `1 + sign·Σ coeffs[j]·B^{step·(j+1)}`
fn lag_poly(coeffs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * step + 1];
    poly[0] = 1.0;
    for (j, c) in coeffs.iter().enumerate() {
        poly[(j + 1) * step] = sign * c;
    }
    poly
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `v_t = u_{t+lag} - u_t`
fn difference(data: &[f64], lag: usize) -> Vec<f64> {
    data.iter()
        .skip(lag)
        .zip(data)
        .map(|(later, earlier)| later - earlier)
        .collect()
}

/// Conditional residuals; shocks before the first full AR window are zero.
fn css_residuals(lags: &Lags, w: &[f64]) -> Option<Vec<f64>> {
    let start = lags.ar.len();
    let mut e = vec![0.0; w.len()];
    for t in start..w.len() {
        let residual = w[t] - lags.predict_at(t, w, &e);
        if !residual.is_finite() || residual.abs() > EXPLOSION_LIMIT {
            return None;
        }
        e[t] = residual;
    }
    Some(e)
}

/// Mean squared conditional residual, or infinity when the recursion diverges.
fn css_loss(order: &SarimaOrder, x: &[f64], w: &[f64]) -> f64 {
    let lags = Lags::expand(order, &SarimaParams::from_vec(order, x));
    let start = lags.ar.len();
    match css_residuals(&lags, w) {
        Some(e) if w.len() > start => {
            e[start..].iter().map(|r| r * r).sum::<f64>() / (w.len() - start) as f64
        }
        _ => f64::INFINITY,
    }
}

/// AR coefficients from the Yule–Walker equations (Levinson–Durbin).
fn yule_walker(data: &[f64], order: usize) -> Vec<f64> {
    if order == 0 || data.len() <= order {
        return vec![0.0; order];
    }
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let autocov: Vec<f64> = (0..=order)
        .map(|k| {
            data.iter()
                .skip(k)
                .zip(data)
                .map(|(a, b)| (a - mean) * (b - mean))
                .sum::<f64>()
                / n
        })
        .collect();

    if autocov[0].abs() < 1e-12 {
        return vec![0.0; order];
    }

    let mut phi = vec![0.0; order];
    let mut error = autocov[0];
    for k in 0..order {
        let acc: f64 = (0..k).map(|j| phi[j] * autocov[k - j]).sum();
        let reflection = (autocov[k + 1] - acc) / error;
        let previous = phi.clone();
        phi[k] = reflection;
        for j in 0..k {
            phi[j] = previous[j] - reflection * previous[k - 1 - j];
        }
        error *= 1.0 - reflection * reflection;
        if error.abs() < 1e-12 {
            break;
        }
    }
    phi
}

/// Seasonal ARIMA model.
#[derive(Debug, Clone)]
pub struct Sarima {
    order: SarimaOrder,
    options: NelderMeadOptions,
    params: Option<SarimaParams>,
    /// Series before each differencing step, paired with that step's lag.
    levels: Vec<(Vec<f64>, usize)>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    sigma2: f64,
}

impl Sarima {
    pub fn new(order: SarimaOrder) -> Self {
        Self {
            order,
            options: NelderMeadOptions::default(),
            params: None,
            levels: Vec::new(),
            differenced: Vec::new(),
            residuals: Vec::new(),
            sigma2: f64::NAN,
        }
    }

    pub fn with_options(mut self, options: NelderMeadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    /// Estimated coefficients, once fitted.
    pub fn params(&self) -> Option<&SarimaParams> {
        self.params.as_ref()
    }

    /// Residual variance of the CSS fit.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    fn initial_guess(&self, w: &[f64]) -> Vec<f64> {
        let mut x = Vec::with_capacity(self.order.param_count());
        x.extend(
            yule_walker(w, self.order.p)
                .into_iter()
                .map(|c| c.clamp(-0.9, 0.9)),
        );
        x.extend(std::iter::repeat(0.0).take(
            self.order.seasonal_p + self.order.q + self.order.seasonal_q,
        ));
        x
    }

    /// Undo the differencing steps in reverse, extending each level forward.
    fn integrate(&self, mut future: Vec<f64>) -> Vec<f64> {
        for (level, lag) in self.levels.iter().rev() {
            let mut extended = level.clone();
            for v in &future {
                let t = extended.len();
                extended.push(v + extended[t - lag]);
            }
            future = extended.split_off(level.len());
        }
        future
    }
}

impl Predictor for Sarima {
    fn fit(&mut self, data: &[f64]) -> Result<(), ForecastError> {
        self.order.validate()?;

        let required = self.order.min_observations();
        if data.len() < required {
            return Err(ForecastError::InsufficientData {
                required,
                actual: data.len(),
            });
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(ForecastError::InvalidData(
                "data contains NaN or infinite values".into(),
            ));
        }

        let lags: Vec<usize> = std::iter::repeat(1)
            .take(self.order.d)
            .chain(std::iter::repeat(self.order.period).take(self.order.seasonal_d))
            .collect();

        let mut levels = Vec::with_capacity(lags.len());
        let mut current = data.to_vec();
        for lag in lags {
            let next = difference(&current, lag);
            levels.push((current, lag));
            current = next;
        }
        let w = current;

        let order = self.order;
        let x0 = self.initial_guess(&w);
        let minimum = nelder_mead(|x| css_loss(&order, x, &w), &x0, &self.options);

        let params = SarimaParams::from_vec(&order, &minimum.x);
        if !minimum.value.is_finite() || !params.is_finite() {
            return Err(ForecastError::NonConvergence(format!(
                "CSS objective did not reach a finite value after {} iterations",
                minimum.iterations
            )));
        }
        if !minimum.converged {
            tracing::warn!(
                iterations = minimum.iterations,
                "SARIMA optimizer hit its iteration limit; using best parameters found"
            );
        }

        let residuals = css_residuals(&Lags::expand(&order, &params), &w).ok_or_else(|| {
            ForecastError::NonConvergence("residual recursion diverged at the optimum".into())
        })?;

        tracing::debug!(
            ?params,
            sigma2 = minimum.value,
            iterations = minimum.iterations,
            observations = data.len(),
            "SARIMA fitted"
        );

        self.levels = levels;
        self.differenced = w;
        self.residuals = residuals;
        self.sigma2 = minimum.value;
        self.params = Some(params);
        Ok(())
    }

    fn predict(&self, steps: usize) -> Result<Vec<f64>, ForecastError> {
        let params = self.params.as_ref().ok_or(ForecastError::NotFitted)?;
        if steps == 0 {
            return Ok(Vec::new());
        }

        let lags = Lags::expand(&self.order, params);
        let n = self.differenced.len();
        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();

        for _ in 0..steps {
            let t = w.len();
            let next = lags.predict_at(t, &w, &e);
            w.push(next);
            // Future shocks have zero expectation.
            e.push(0.0);
        }

        Ok(self.integrate(w.split_off(n)))
    }

    fn is_fitted(&self) -> bool {
        self.params.is_some()
    }
}
