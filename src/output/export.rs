//! File outputs: matrix export, graphics dump and material statistics

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::elements::Element;
use crate::error::FeltResult;
use crate::math::Mat;
use crate::model::Problem;

/// Write `M`, `C` and `K` to `path` as MATLAB assignments. Empty matrices are
/// left out.
pub fn export_matrices(path: &Path, m: &Mat, c: &Mat, k: &Mat) -> FeltResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (name, matrix) in [("M", m), ("C", c), ("K", k)] {
        if matrix.nrows() == 0 {
            continue;
        }
        write_matlab(&mut out, name, matrix)?;
    }
    out.flush()?;
    Ok(())
}

fn write_matlab<W: Write>(out: &mut W, name: &str, matrix: &Mat) -> std::io::Result<()> {
    writeln!(out, "{} = [", name)?;
    for row in matrix.row_iter() {
        let entries: Vec<String> = row.iter().map(|v| format!("{:.16e}", v)).collect();
        writeln!(out, "  {};", entries.join(" "))?;
    }
    writeln!(out, "];")?;
    writeln!(out)
}

/// Node record of a graphics file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsNode {
    pub number: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub constrained: bool,
    /// Solved values `[Tx, Ty, Tz, Rx, Ry, Rz]`
    pub values: [f64; 6],
}

/// Element record of a graphics file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsElement {
    pub number: u32,
    pub definition: String,
    pub nodes: Vec<u32>,
    pub material: String,
    pub stresses: Vec<f64>,
}

/// Structure dump consumed by external viewers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsFile {
    pub title: String,
    pub generated: DateTime<Utc>,
    pub nodes: Vec<GraphicsNode>,
    pub elements: Vec<GraphicsElement>,
}

impl GraphicsFile {
    /// Snapshot of the problem's geometry and last solved values
    pub fn from_problem(problem: &Problem) -> Self {
        let nodes = problem
            .nodes
            .iter()
            .map(|node| GraphicsNode {
                number: node.number,
                x: node.x,
                y: node.y,
                z: node.z,
                constrained: node.constraint.is_some(),
                values: node.values(),
            })
            .collect();
        let elements = problem
            .elements
            .iter()
            .map(|element| GraphicsElement {
                number: element.number,
                definition: element.definition.name.clone(),
                nodes: element.nodes.iter().map(|&id| problem.nodes[id].number).collect(),
                material: element.material.name.clone(),
                stresses: element.stresses().to_vec(),
            })
            .collect();
        Self {
            title: problem.title.clone(),
            generated: Utc::now(),
            nodes,
            elements,
        }
    }
}

/// Write the structure and its last solved values as JSON
pub fn write_graphics_file(problem: &Problem, path: &Path) -> FeltResult<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, &GraphicsFile::from_problem(problem))?;
    log::info!("graphics written to {}", path.display());
    Ok(())
}

#[derive(Debug, Default)]
struct MaterialUsage {
    elements: usize,
    length: f64,
    area: f64,
    mass: f64,
}

/// Length of a two-node element, zero otherwise
fn element_length(problem: &Problem, element: &Element) -> f64 {
    match element.nodes.as_slice() {
        [a, b] => problem.nodes[*a].distance_to(&problem.nodes[*b]),
        _ => 0.0,
    }
}

/// Plan area of an element with three or more nodes, zero otherwise
fn element_area(problem: &Problem, element: &Element) -> f64 {
    let n = element.nodes.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let p = &problem.nodes[element.nodes[i]];
            let q = &problem.nodes[element.nodes[(i + 1) % n]];
            p.x * q.y - q.x * p.y
        })
        .sum();
    twice.abs() / 2.0
}

/// Element count, total length, total area and mass per material
pub fn write_material_statistics<W: Write>(problem: &Problem, out: &mut W) -> FeltResult<()> {
    let mut usage: BTreeMap<&str, MaterialUsage> = BTreeMap::new();
    for element in &problem.elements {
        let material = &element.material;
        let length = element_length(problem, element);
        let area = element_area(problem, element);
        let entry = usage.entry(material.name.as_str()).or_default();
        entry.elements += 1;
        entry.length += length;
        entry.area += area;
        entry.mass += material.rho * (material.a * length + material.t * area);
    }

    let line = format!("{:─^1$}", "", 66);
    writeln!(out, "{}", line)?;
    writeln!(out, "{:^66}", "MATERIAL USAGE")?;
    writeln!(
        out,
        "{:<14}{:>10}{:>14}{:>14}{:>14}",
        "material", "elements", "length", "area", "mass"
    )?;
    writeln!(out, "{}", line)?;
    let mut total_mass = 0.0;
    for (name, stats) in &usage {
        writeln!(
            out,
            "{:<14}{:>10}{:>14.5e}{:>14.5e}{:>14.5e}",
            name, stats.elements, stats.length, stats.area, stats.mass
        )?;
        total_mass += stats.mass;
    }
    writeln!(out, "{}", line)?;
    writeln!(out, "{:<14}{:>52.5e}", "total mass", total_mass)?;
    Ok(())
}
