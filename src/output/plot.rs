//! ASCII line plots

const WIDTH: usize = 64;
const HEIGHT: usize = 16;
const MARKS: &[char] = &['*', '+', 'o', 'x', '#', '@'];

/// Plot one or more series against a shared abscissa.
///
/// Each series gets its own mark; a legend line names them in order. Rows of
/// the returned text are top to bottom.
pub fn ascii_plot(title: &str, x: &[f64], series: &[(String, Vec<f64>)]) -> Vec<String> {
    let mut lines = vec![format!("{:^1$}", title, WIDTH + 12)];
    if x.is_empty() || series.is_empty() {
        lines.push("(no data)".to_string());
        return lines;
    }

    let (x_min, x_max) = bounds(x.iter().copied());
    let (y_min, y_max) = bounds(series.iter().flat_map(|(_, ys)| ys.iter().copied()));

    let mut grid = vec![vec![' '; WIDTH]; HEIGHT];
    for (s, (_, ys)) in series.iter().enumerate() {
        let mark = MARKS[s % MARKS.len()];
        for (&xv, &yv) in x.iter().zip(ys) {
            if !yv.is_finite() {
                continue;
            }
            let col = scale(xv, x_min, x_max, WIDTH);
            let row = HEIGHT - 1 - scale(yv, y_min, y_max, HEIGHT);
            grid[row][col] = mark;
        }
    }

    for (row, cells) in grid.iter().enumerate() {
        let label = match row {
            0 => format!("{:>11.3e}", y_max),
            r if r == HEIGHT - 1 => format!("{:>11.3e}", y_min),
            _ => " ".repeat(11),
        };
        lines.push(format!("{}|{}", label, cells.iter().collect::<String>()));
    }
    lines.push(format!("{}+{}", " ".repeat(11), "-".repeat(WIDTH)));
    lines.push(format!(
        "{}{:<width$}{:>11.3e}",
        " ".repeat(8),
        format!("{:.3e}", x_min),
        x_max,
        width = WIDTH - 4
    ));

    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(s, (name, _))| format!("{} {}", MARKS[s % MARKS.len()], name))
        .collect();
    lines.push(format!("{}{}", " ".repeat(12), legend.join("   ")));
    lines
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON * hi.abs().max(1.0) {
        return (lo - 1.0, hi + 1.0);
    }
    (lo, hi)
}

fn scale(value: f64, lo: f64, hi: f64, cells: usize) -> usize {
    let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
    ((t * (cells - 1) as f64).round() as usize).min(cells - 1)
}
