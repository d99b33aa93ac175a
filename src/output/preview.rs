//! Character-cell preview of a planar structure

use crate::model::Problem;

/// Draw the elements and nodes of `problem` projected onto the x-y plane.
///
/// Element edges are traced with `.`, nodes with `o`, and constrained nodes
/// with `#`. The aspect ratio of the structure is kept; terminal cells are
/// taken to be twice as tall as they are wide.
pub fn draw_structure_ascii(problem: &Problem, width: usize, height: usize) -> String {
    let width = width.max(2);
    let height = height.max(2);
    if problem.nodes.is_empty() {
        return String::new();
    }

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for node in &problem.nodes {
        x_min = x_min.min(node.x);
        x_max = x_max.max(node.x);
        y_min = y_min.min(node.y);
        y_max = y_max.max(node.y);
    }
    let span = (x_max - x_min).max((y_max - y_min) * 2.0).max(f64::EPSILON);
    let sx = (width - 1) as f64 / span;
    let sy = sx / 2.0;

    let to_cell = |x: f64, y: f64| -> (usize, usize) {
        let col = ((x - x_min) * sx).round() as usize;
        let row = ((y - y_min) * sy).round() as usize;
        (col.min(width - 1), (height - 1).saturating_sub(row.min(height - 1)))
    };

    let mut grid = vec![vec![' '; width]; height];
    for element in &problem.elements {
        let corners: Vec<(f64, f64)> = element
            .nodes
            .iter()
            .map(|&id| (problem.nodes[id].x, problem.nodes[id].y))
            .collect();
        for (i, &(x1, y1)) in corners.iter().enumerate() {
            let (x2, y2) = corners[(i + 1) % corners.len()];
            let (c1, r1) = to_cell(x1, y1);
            let (c2, r2) = to_cell(x2, y2);
            let steps = c1.abs_diff(c2).max(r1.abs_diff(r2)).max(1);
            for s in 0..=steps {
                let t = s as f64 / steps as f64;
                let (col, row) = to_cell(x1 + t * (x2 - x1), y1 + t * (y2 - y1));
                grid[row][col] = '.';
            }
        }
    }
    for node in &problem.nodes {
        let (col, row) = to_cell(node.x, node.y);
        grid[row][col] = if node.constraint.is_some() { '#' } else { 'o' };
    }

    let mut out = String::with_capacity((width + 1) * height);
    for row in grid {
        let line: String = row.into_iter().collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Constraint, Material};

    #[test]
    fn test_horizontal_bar_preview() {
        let mut problem = Problem::new("bar");
        problem.add_material(Material::elastic("m", 1.0, 1.0, 1.0)).unwrap();
        problem.add_constraint(Constraint::fixed("fixed")).unwrap();
        problem.add_node(1, 0.0, 0.0, 0.0).unwrap();
        problem.add_node(2, 10.0, 0.0, 0.0).unwrap();
        problem.add_element(1, "rod", &[1, 2], "m").unwrap();
        problem.constrain_node(1, "fixed").unwrap();

        let preview = draw_structure_ascii(&problem, 11, 3);
        let last = preview.lines().last().unwrap();
        assert_eq!(last, "#.........o");
    }

    #[test]
    fn test_empty_problem_draws_nothing() {
        assert!(draw_structure_ascii(&Problem::new("empty"), 20, 5).is_empty());
    }
}
