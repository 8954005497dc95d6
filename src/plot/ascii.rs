//! ASCII mass-luminosity diagram for terminal output.
//!
//! Fixed-size grid on log10 axes (solar units), deterministic output.
//!
//! Plot elements:
//! - catalog stars: `o`
//! - model line at the requested metallicity: `-`
//! - reference stars: `*`
//! - prediction: `X`

use crate::domain::ReferenceStar;
use crate::models::{predict_solar_mass, LinearModel};

/// What to draw. Points are `(mass, luminosity)` in solar units.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagram<'a> {
    pub stars: &'a [(f64, f64)],
    pub references: &'a [ReferenceStar],
    pub prediction: Option<(f64, f64)>,
    /// Model and `[Fe/H]` (dex) for the trend line.
    pub model: Option<(&'a LinearModel, f64)>,
}

pub fn render_mass_luminosity(diagram: &Diagram<'_>, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut points: Vec<(f64, f64, char)> = diagram
        .stars
        .iter()
        .filter_map(|&(m, l)| log_point(m, l, 'o'))
        .collect();
    points.extend(diagram.references.iter().filter_map(|r| log_point(r.mass, r.luminosity, '*')));
    if let Some((m, l)) = diagram.prediction {
        points.extend(log_point(m, l, 'X'));
    }

    let (x_min, x_max) = range(points.iter().map(|p| p.0)).unwrap_or((-1.0, 1.0));
    let curve = diagram
        .model
        .map(|(model, feh)| sample_model(model, feh, x_min, x_max, width))
        .unwrap_or_default();

    let (y_min, y_max) = range(points.iter().map(|p| p.1).chain(curve.iter().map(|c| c.1))).unwrap_or((-1.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    draw_curve(&mut grid, &curve, x_min, x_max, y_min, y_max);

    // Later layers win: stars, then references, then the prediction.
    for &(x, y, ch) in &points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = ch;
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: log10 L=[{x_min:.3}, {x_max:.3}] L_sun | log10 M=[{y_min:.2}, {y_max:.2}] M_sun\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str("o catalog  * reference  X prediction  - model\n");
    out
}

/// `(log10 L, log10 M)`; `None` for non-positive values.
fn log_point(mass: f64, lum: f64, ch: char) -> Option<(f64, f64, char)> {
    (mass > 0.0 && lum > 0.0 && mass.is_finite() && lum.is_finite()).then(|| (lum.log10(), mass.log10(), ch))
}

fn sample_model(model: &LinearModel, feh: f64, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .filter_map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let x = x_min + u * (x_max - x_min);
            let mass = predict_solar_mass(model, 10f64.powf(x), feh).ok()?;
            (mass > 0.0).then(|| (x, mass.log10()))
        })
        .collect()
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else if min.is_finite() && max.is_finite() {
        Some((min - 0.5, max + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, '-'),
            None => grid[row][col] = '-',
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Feature, REFERENCE_STARS};
    use crate::math::units::{log_solar_lum_to_log_watts, solar_mass_to_log_kg};

    #[test]
    fn plot_golden_snapshot_small() {
        let stars = [(1.0, 1.0), (10.0, 100.0)];
        let txt = render_mass_luminosity(
            &Diagram {
                stars: &stars,
                ..Diagram::default()
            },
            10,
            5,
        );
        let expected = concat!(
            "Plot: log10 L=[0.000, 2.000] L_sun | log10 M=[-0.05, 1.05] M_sun\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o         \n",
            "o catalog  * reference  X prediction  - model\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn prediction_and_model_line_are_drawn() {
        // M = L^0.25 in solar units, i.e. log M = 0.25 log L.
        let model = LinearModel {
            target: Feature::Mass,
            features: vec![Feature::Luminosity, Feature::Metallicity],
            intercept: solar_mass_to_log_kg(1.0).unwrap() - 0.25 * log_solar_lum_to_log_watts(0.0),
            coefficients: vec![0.25, 0.0],
        };
        let txt = render_mass_luminosity(
            &Diagram {
                stars: &[(0.5, 0.06), (1.5, 5.0)],
                references: &REFERENCE_STARS,
                prediction: Some((1.0, 1.0)),
                model: Some((&model, 0.0)),
            },
            40,
            12,
        );
        let body: String = txt.lines().skip(1).take(12).collect();
        assert!(body.contains('X'));
        assert!(body.contains('*'));
        assert!(body.contains('-'));
        assert!(body.contains('o'));
    }
}
