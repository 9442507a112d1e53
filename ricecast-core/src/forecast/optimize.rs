//! Derivative-free minimization (Nelder–Mead simplex).

/// Stopping rules for [`nelder_mead`].
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    pub max_iterations: usize,
    /// Stop once best and worst vertex values are this close (relative).
    pub f_tolerance: f64,
    /// Stop once every vertex is this close to the best one.
    pub x_tolerance: f64,
    /// Offset used to build the initial simplex around the start point.
    pub initial_step: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            f_tolerance: 1e-10,
            x_tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

/// Result of a minimization run.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `f` starting from `x0`.
///
/// `f` may return `f64::INFINITY` (or NaN) for points it cannot evaluate;
/// such vertices are treated as worse than any finite one.
pub fn nelder_mead<F>(f: F, x0: &[f64], opts: &NelderMeadOptions) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let n = x0.len();
    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    if n == 0 {
        return Minimum {
            x: Vec::new(),
            value: eval(x0),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut v = x0.to_vec();
        v[i] += if v[i] == 0.0 {
            opts.initial_step
        } else {
            opts.initial_step * v[i].abs().max(1.0)
        };
        simplex.push(v);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < opts.max_iterations {
        sort_simplex(&mut simplex, &mut values);

        let best = values[0];
        let worst = values[n];
        let f_spread = (worst - best).abs();
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);

        if best.is_finite()
            && worst.is_finite()
            && f_spread <= opts.f_tolerance * (1.0 + best.abs())
            && x_spread <= opts.x_tolerance
        {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let toward = |coef: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&simplex[n])
                .map(|(c, w)| c + coef * (c - w))
                .collect()
        };

        let reflected = toward(REFLECT);
        let f_reflected = eval(&reflected);

        if f_reflected < values[0] {
            let expanded = toward(EXPAND);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (contracted, f_contracted) = if f_reflected < values[n] {
            let c = toward(REFLECT * CONTRACT);
            let fc = eval(&c);
            (c, fc)
        } else {
            let c = toward(-CONTRACT);
            let fc = eval(&c);
            (c, fc)
        };

        if f_contracted < values[n].min(f_reflected) {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        let anchor = simplex[0].clone();
        for i in 1..=n {
            for (x, a) in simplex[i].iter_mut().zip(&anchor) {
                *x = a + SHRINK * (*x - a);
            }
            values[i] = eval(&simplex[i]);
        }
    }

    sort_simplex(&mut simplex, &mut values);
    Minimum {
        x: simplex.swap_remove(0),
        value: values[0],
        iterations,
        converged,
    }
}

fn sort_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    *simplex = order.iter().map(|&i| simplex[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}
