use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::dataset::{Dataset, Style};

/// Everything needed to render one figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotDescriptor {
    /// File stem shared by the command file and the image it renders.
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Raw directives emitted after the ranges.
    pub extras: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl PlotDescriptor {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            x_range: (0.0, 1.0),
            y_range: (0.0, 1.0),
            extras: Vec::new(),
            datasets: Vec::new(),
        }
    }

    pub fn with_legend(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_ranges(mut self, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        self.x_range = x_range;
        self.y_range = y_range;
        self
    }

    pub fn append_extra(&mut self, directive: impl Into<String>) {
        self.extras.push(directive.into());
    }

    pub fn add_dataset(&mut self, dataset: Dataset) {
        self.datasets.push(dataset);
    }

    pub fn image_file(&self) -> String {
        format!("{}.png", self.name)
    }

    pub fn command_file(&self) -> String {
        format!("{}.plt", self.name)
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn style_clause(style: Style) -> &'static str {
    match style {
        Style::LinesPoints => "linespoints",
        Style::Points => "points",
    }
}

/// Writes gnuplot command files with inline data.
pub struct PlotExporter {
    out_dir: PathBuf,
}

impl PlotExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Render `plot` as gnuplot commands. Ranges come before any dataset and are not
    /// checked against the data.
    pub fn render<W: Write>(plot: &PlotDescriptor, out: &mut W) -> io::Result<()> {
        writeln!(out, "set terminal png")?;
        writeln!(out, "set output {}", quote(&plot.image_file()))?;
        writeln!(out, "set title {}", quote(&plot.title))?;
        writeln!(out, "set xlabel {}", quote(&plot.x_label))?;
        writeln!(out, "set ylabel {}", quote(&plot.y_label))?;
        writeln!(out, "set xrange [{}:{}]", plot.x_range.0, plot.x_range.1)?;
        writeln!(out, "set yrange [{}:{}]", plot.y_range.0, plot.y_range.1)?;
        for extra in &plot.extras {
            writeln!(out, "{extra}")?;
        }

        if plot.datasets.is_empty() {
            return Ok(());
        }

        let clauses: Vec<String> = plot
            .datasets
            .iter()
            .map(|d| {
                format!(
                    "\"-\" title {} with {}",
                    quote(&d.title),
                    style_clause(d.style)
                )
            })
            .collect();
        writeln!(out, "plot {}", clauses.join(", "))?;

        for dataset in &plot.datasets {
            for (x, y) in &dataset.points {
                writeln!(out, "{x} {y}")?;
            }
            writeln!(out, "e")?;
        }
        Ok(())
    }

    /// Write `<out_dir>/<name>.plt` and return its path.
    pub fn write(&self, plot: &PlotDescriptor) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(plot.command_file());
        let mut out = BufWriter::new(File::create(&path)?);
        Self::render(plot, &mut out)?;
        out.flush()?;
        info!("Wrote {}", path.display());
        Ok(path)
    }
}
