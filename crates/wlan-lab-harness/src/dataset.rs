use serde::{Deserialize, Serialize};

/// How a dataset is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    LinesPoints,
    Points,
}

/// One aggregated result at one sweep position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub series: String,
    pub x: f64,
    pub y: f64,
}

/// Named, ordered list of points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub title: String,
    pub style: Style,
    pub points: Vec<(f64, f64)>,
}

impl Dataset {
    pub fn new(title: impl Into<String>, style: Style) -> Self {
        Self {
            title: title.into(),
            style,
            points: Vec::new(),
        }
    }

    pub fn add(&mut self, x: f64, y: f64) {
        self.points.push((x, y));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Accumulates points into named series.
///
/// Series keep creation order and points keep insertion order; nothing is sorted or
/// merged, since the order decides how connecting lines are drawn.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    datasets: Vec<Dataset>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the series called `title`, creating it with `style` if it does not exist.
    pub fn series(&mut self, title: &str, style: Style) -> &mut Dataset {
        let position = match self.datasets.iter().position(|d| d.title == title) {
            Some(position) => position,
            None => {
                self.datasets.push(Dataset::new(title, style));
                self.datasets.len() - 1
            }
        };
        &mut self.datasets[position]
    }

    pub fn push(&mut self, point: SweepPoint) {
        self.series(&point.series, Style::LinesPoints)
            .add(point.x, point.y);
    }

    /// Append fixed reference points that do not come from a sweep.
    pub fn annotate(&mut self, title: &str, style: Style, points: &[(f64, f64)]) {
        let dataset = self.series(title, style);
        for &(x, y) in points {
            dataset.add(x, y);
        }
    }

    pub fn get(&self, title: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.title == title)
    }

    pub fn point_count(&self) -> usize {
        self.datasets.iter().map(Dataset::len).sum()
    }

    pub fn finish(self) -> Vec<Dataset> {
        self.datasets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(series: &str, x: f64, y: f64) -> SweepPoint {
        SweepPoint {
            series: series.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn annotation_points_keep_their_order() {
        let mut builder = DatasetBuilder::new();
        builder.annotate(
            "Saturation for all nodes",
            Style::LinesPoints,
            &[(1416.96, 0.0), (1416.96, 0.55)],
        );
        let dataset = builder.get("Saturation for all nodes").unwrap();
        assert_eq!(dataset.points, vec![(1416.96, 0.0), (1416.96, 0.55)]);
    }

    #[test]
    fn no_sorting_or_dedup() {
        let mut builder = DatasetBuilder::new();
        builder.push(point("a", 3.0, 1.0));
        builder.push(point("a", 1.0, 2.0));
        builder.push(point("a", 3.0, 1.0));
        assert_eq!(
            builder.get("a").unwrap().points,
            vec![(3.0, 1.0), (1.0, 2.0), (3.0, 1.0)]
        );
    }

    #[test]
    fn series_keep_creation_order() {
        let mut builder = DatasetBuilder::new();
        builder.series("first", Style::LinesPoints);
        builder.series("second", Style::Points);
        builder.push(point("second", 1.0, 1.0));
        builder.push(point("first", 1.0, 1.0));
        builder.push(point("third", 1.0, 1.0));
        assert_eq!(builder.point_count(), 3);

        let datasets = builder.finish();
        let titles: Vec<_> = datasets.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["first", "second", "third"]);
        assert_eq!(datasets[1].style, Style::Points);
    }
}
