//! The fixed five-chart event visualization pipeline.

use tracing::{debug, info};

use crate::errors::{SciVizError, SciVizResult};
use crate::events::analysis::{
    extreme_pixels, gaussian_kde, hexbin, histogram, intensity_grid, pixel_counts, PixelCounts,
    HEX_GRIDSIZE, POLARITY_BINS,
};
use crate::events::loader::LoadedEvents;
use crate::events::table::{EventTable, Polarity, SensorDim};
use crate::models::ResultRecord;
use crate::render::chart::{BarPanel, Chart, Curve, HexPanel};
use crate::render::palette::{Palette, BLUE, PURE_BLUE, PURE_RED, RED};
use crate::render::sink::ArtifactSink;

/// (record name, artifact base name) for each analysis, in run order.
pub const EVENT_OUTPUTS: [(&str, &str); 5] = [
    ("Event Time Histogram", "event_histogram"),
    ("Temporal Kernel Density", "temporal_kernel_density"),
    ("Event ON/OFF Map", "event_on_off_map"),
    ("Polarity Count at Given Pixel", "polarity_count"),
    ("Event Intensity Map", "event_intensity_map"),
];

pub struct EventVizTool {
    name: String,
    table: EventTable,
    sensor: SensorDim,
}

impl EventVizTool {
    /// Fails with `InvalidValue` on an empty table or an oversized sensor.
    pub fn new(name: impl Into<String>, table: EventTable, sensor: SensorDim) -> SciVizResult<Self> {
        let name = name.into();
        if table.is_empty() {
            return Err(SciVizError::InvalidValue(format!("{name} contains no events")));
        }
        let sensor = SensorDim::checked(sensor.x_max, sensor.y_max)?;
        Ok(Self {
            name,
            table,
            sensor,
        })
    }

    pub fn from_loaded(loaded: LoadedEvents) -> SciVizResult<Self> {
        Self::new(loaded.name, loaded.table, loaded.sensor)
    }

    pub fn histogram_chart(&self) -> Chart {
        let values: Vec<f64> = self.table.polarities().iter().map(|p| p.as_f64()).collect();
        let (edges, counts) = histogram(&values, POLARITY_BINS);
        Chart::Histogram {
            title: format!("Event Polarity Histogram - {}", self.name),
            edges,
            counts,
        }
    }

    pub fn temporal_density_chart(&self) -> Chart {
        let curve = |label: &str, polarity, color| {
            let (xs, ys) = gaussian_kde(&self.table.times_where(polarity));
            Curve {
                label: label.to_string(),
                xs,
                ys,
                color,
            }
        };
        Chart::Density {
            title: format!("Temporal Kernel Density Visualization - {}", self.name),
            curves: vec![
                curve("ON Events", Polarity::On, BLUE),
                curve("OFF Events", Polarity::Off, RED),
            ],
        }
    }

    pub fn on_off_map_chart(&self) -> Chart {
        Chart::HexPanels(vec![
            HexPanel {
                title: format!("ON Events Density - {}", self.name),
                bins: hexbin(&self.table.coords_where(Polarity::On), HEX_GRIDSIZE),
                palette: Palette::Blues,
            },
            HexPanel {
                title: format!("OFF Events Density - {}", self.name),
                bins: hexbin(&self.table.coords_where(Polarity::Off), HEX_GRIDSIZE),
                palette: Palette::Reds,
            },
        ])
    }

    pub fn polarity_count_chart(&self) -> Chart {
        let counts = pixel_counts(&self.table);
        let panels = extreme_pixels(&counts)
            .map(|(max, min)| {
                [max, min]
                    .into_iter()
                    .map(|pixel| {
                        let c = counts.get(&pixel).copied().unwrap_or_default();
                        pixel_panel(pixel, c)
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Chart::BarPanels(panels)
    }

    pub fn intensity_map_chart(&self) -> Chart {
        let grid = intensity_grid(&pixel_counts(&self.table), self.sensor);
        Chart::Heatmap {
            title: format!("Event Intensity Map - {}", self.name),
            // x across, y down
            grid: grid.t().to_owned(),
            palette: Palette::SeismicReversed,
            x_label: Some("X Pixel".into()),
            y_label: Some("Y Pixel".into()),
        }
    }

    /// Run all five analyses in order and persist each chart.
    pub fn run(&self, sink: &dyn ArtifactSink) -> SciVizResult<Vec<ResultRecord>> {
        let charts = [
            self.histogram_chart(),
            self.temporal_density_chart(),
            self.on_off_map_chart(),
            self.polarity_count_chart(),
            self.intensity_map_chart(),
        ];
        let mut records = Vec::with_capacity(charts.len());
        for (chart, (variable, file)) in charts.iter().zip(EVENT_OUTPUTS) {
            debug!(file, recipe = chart.recipe(), "rendering event chart");
            let artifact = sink.persist(chart, file)?;
            records.push(ResultRecord::chart(variable, artifact, None));
        }
        info!(
            name = %self.name,
            events = self.table.len(),
            on = self.table.count(Polarity::On),
            off = self.table.count(Polarity::Off),
            "event visualization complete"
        );
        Ok(records)
    }
}

fn pixel_panel((x, y): (i64, i64), counts: PixelCounts) -> BarPanel {
    BarPanel {
        title: format!("Pixel ({x},{y})"),
        labels: vec!["p=0".into(), "p=1".into()],
        heights: vec![counts.off as f64, counts.on as f64],
        colors: vec![PURE_RED, PURE_BLUE],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::table::Event;
    use crate::render::sink::MemorySink;

    fn four_at_origin() -> EventVizTool {
        let table = EventTable::from_events((0..4).map(|i| Event {
            t: i as f64 * 0.01,
            x: 0,
            y: 0,
            p: Polarity::On,
        }));
        EventVizTool::new("four.h5", table, SensorDim::new(1, 1)).unwrap()
    }

    #[test]
    fn test_runs_five_analyses_in_order() {
        let sink = MemorySink::new();
        let records = four_at_origin().run(&sink).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.variable()).collect();
        assert_eq!(
            names,
            vec![
                "Event Time Histogram",
                "Temporal Kernel Density",
                "Event ON/OFF Map",
                "Polarity Count at Given Pixel",
                "Event Intensity Map"
            ]
        );
        assert!(records.iter().all(|r| r.artifact().is_some()));
        assert_eq!(
            sink.names(),
            vec![
                "event_histogram",
                "temporal_kernel_density",
                "event_on_off_map",
                "polarity_count",
                "event_intensity_map"
            ]
        );
    }

    #[test]
    fn test_four_events_at_origin() {
        let tool = four_at_origin();
        match tool.intensity_map_chart() {
            Chart::Heatmap { grid, .. } => {
                assert_eq!(grid.dim(), (1, 1));
                assert_eq!(grid[[0, 0]], 1020.0);
            }
            other => panic!("expected heatmap, got {other:?}"),
        }
        match tool.on_off_map_chart() {
            Chart::HexPanels(panels) => {
                assert_eq!(panels[0].bins.cells.len(), 1);
                assert_eq!(panels[0].bins.cells[0].count, 4);
                assert!(panels[1].bins.cells.is_empty());
            }
            other => panic!("expected hexbin panels, got {other:?}"),
        }
    }

    #[test]
    fn test_polarity_count_panels() {
        let table = EventTable::from_events([
            Event { t: 0.0, x: 1, y: 1, p: Polarity::On },
            Event { t: 0.1, x: 1, y: 1, p: Polarity::Off },
            Event { t: 0.2, x: 1, y: 1, p: Polarity::On },
            Event { t: 0.3, x: 4, y: 2, p: Polarity::Off },
        ]);
        let tool = EventVizTool::new("p", table, SensorDim::new(8, 8)).unwrap();
        match tool.polarity_count_chart() {
            Chart::BarPanels(panels) => {
                assert_eq!(panels.len(), 2);
                assert_eq!(panels[0].title, "Pixel (1,1)");
                assert_eq!(panels[0].heights, vec![1.0, 2.0]);
                assert_eq!(panels[1].title, "Pixel (4,2)");
                assert_eq!(panels[1].heights, vec![1.0, 0.0]);
            }
            other => panic!("expected bar panels, got {other:?}"),
        }
    }

    #[test]
    fn test_density_splits_by_polarity() {
        let table = EventTable::from_events((0..10).map(|i| Event {
            t: i as f64,
            x: 0,
            y: 0,
            p: if i % 2 == 0 { Polarity::On } else { Polarity::Off },
        }));
        let tool = EventVizTool::new("d", table, SensorDim::new(1, 1)).unwrap();
        match tool.temporal_density_chart() {
            Chart::Density { curves, .. } => {
                assert_eq!(curves[0].label, "ON Events");
                assert_eq!(curves[1].label, "OFF Events");
                assert!(curves.iter().all(|c| c.xs.len() == 200));
            }
            other => panic!("expected density, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_sensor_rejected() {
        let table = EventTable::from_events([Event { t: 0.0, x: 0, y: 0, p: Polarity::On }]);
        let err = EventVizTool::new("big", table, SensorDim::new(1 << 40, 1 << 40));
        assert!(matches!(err, Err(SciVizError::InvalidValue(_))));
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = EventVizTool::new("empty", EventTable::default(), SensorDim::new(1, 1));
        assert!(matches!(err, Err(SciVizError::InvalidValue(_))));
    }
}
