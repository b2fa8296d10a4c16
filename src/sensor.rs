//! Synthetic sensor readings driving the simulation.
//!
//! The sensor is the only source of non-determinism in the engine. It is
//! injected through the [`Sensor`] trait so tests can substitute a fixed or
//! replayed reading stream for the seeded random one.

use std::fs::File;
use std::io;
use std::path::Path;

use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;

use crate::devices::types::Band;

/// A named sensor channel and the range its readings are drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Column name, e.g. `flow.house-a`.
    pub name: String,
    pub band: Band,
}

impl Channel {
    pub fn new(name: impl Into<String>, band: Band) -> Self {
        Self {
            name: name.into(),
            band,
        }
    }
}

/// Channels the engine expects on every tick, grouped by purpose.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorLayout {
    /// Pump delivery rate per pump (L/min).
    pub feeds: Vec<Channel>,
    /// Flow rate per consumer (L/min).
    pub consumers: Vec<Channel>,
    /// Electrical draw per pump while running (kW).
    pub pump_draws: Vec<Channel>,
    /// Standby/base draw (kW).
    pub base: Channel,
}

impl SensorLayout {
    /// All channels in frame order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.feeds
            .iter()
            .chain(&self.consumers)
            .chain(&self.pump_draws)
            .chain(std::iter::once(&self.base))
    }
}

/// Readings for one tick, index-aligned with the [`SensorLayout`] groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorFrame {
    pub feed_lpm: Vec<f64>,
    pub consumer_lpm: Vec<f64>,
    pub pump_kw: Vec<f64>,
    pub base_kw: f64,
}

impl SensorFrame {
    /// Returns `true` when every group has one value per layout channel.
    pub fn matches(&self, layout: &SensorLayout) -> bool {
        self.feed_lpm.len() == layout.feeds.len()
            && self.consumer_lpm.len() == layout.consumers.len()
            && self.pump_kw.len() == layout.pump_draws.len()
    }
}

/// Source of per-tick readings.
pub trait Sensor {
    /// Produces the readings for the next tick.
    fn sample(&mut self, layout: &SensorLayout) -> SensorFrame;

    /// Short name of the sensor implementation, for logs.
    fn kind(&self) -> &'static str;
}

/// Seeded uniform sensor: every channel is drawn from its band.
#[derive(Debug, Clone)]
pub struct UniformSensor {
    rng: StdRng,
}

impl UniformSensor {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sensor for UniformSensor {
    fn sample(&mut self, layout: &SensorLayout) -> SensorFrame {
        let rng = &mut self.rng;
        SensorFrame {
            feed_lpm: layout.feeds.iter().map(|c| c.band.sample(rng)).collect(),
            consumer_lpm: layout.consumers.iter().map(|c| c.band.sample(rng)).collect(),
            pump_kw: layout.pump_draws.iter().map(|c| c.band.sample(rng)).collect(),
            base_kw: layout.base.band.sample(rng),
        }
    }

    fn kind(&self) -> &'static str {
        "uniform"
    }
}

/// Returns the same frame on every tick.
#[derive(Debug, Clone)]
pub struct FixedSensor {
    frame: SensorFrame,
}

impl FixedSensor {
    pub fn new(frame: SensorFrame) -> Self {
        Self { frame }
    }

    /// Replaces the frame returned from the next tick on.
    pub fn set_frame(&mut self, frame: SensorFrame) {
        self.frame = frame;
    }
}

impl Sensor for FixedSensor {
    fn sample(&mut self, _layout: &SensorLayout) -> SensorFrame {
        self.frame.clone()
    }

    fn kind(&self) -> &'static str {
        "fixed"
    }
}

/// Error loading a recorded reading stream.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot open replay file \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed replay csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("replay csv is missing column \"{0}\"")]
    MissingColumn(String),
    #[error("replay row {row}, column \"{column}\": cannot parse \"{value}\" as a number")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("replay csv contains no rows")]
    Empty,
}

/// Replays recorded frames in order, wrapping around when exhausted.
///
/// The CSV header must name every channel of the layout (`feed.<pump>`,
/// `flow.<consumer>`, `draw.<pump>`, `base`); extra columns are ignored.
#[derive(Debug, Clone)]
pub struct ReplaySensor {
    frames: Vec<SensorFrame>,
    cursor: usize,
}

impl ReplaySensor {
    /// Creates a replay from pre-built frames.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Empty`] when `frames` is empty.
    pub fn from_frames(frames: Vec<SensorFrame>) -> Result<Self, ReplayError> {
        if frames.is_empty() {
            return Err(ReplayError::Empty);
        }
        Ok(Self { frames, cursor: 0 })
    }

    /// Loads a replay from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns a [`ReplayError`] if the file cannot be read, a layout column
    /// is missing, a value does not parse, or there are no data rows.
    pub fn from_csv_path(path: &Path, layout: &SensorLayout) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_csv_reader(io::BufReader::new(file), layout)
    }

    /// Loads a replay from any CSV reader.
    ///
    /// # Errors
    ///
    /// See [`ReplaySensor::from_csv_path`].
    pub fn from_csv_reader(reader: impl io::Read, layout: &SensorLayout) -> Result<Self, ReplayError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let column = |channel: &Channel| {
            headers
                .iter()
                .position(|h| h == channel.name)
                .ok_or_else(|| ReplayError::MissingColumn(channel.name.clone()))
        };
        let feeds: Vec<usize> = layout.feeds.iter().map(column).collect::<Result<_, _>>()?;
        let consumers: Vec<usize> = layout.consumers.iter().map(column).collect::<Result<_, _>>()?;
        let draws: Vec<usize> = layout.pump_draws.iter().map(column).collect::<Result<_, _>>()?;
        let base = column(&layout.base)?;

        let mut frames = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let value = |idx: usize| -> Result<f64, ReplayError> {
                let raw = record.get(idx).unwrap_or("");
                raw.parse::<f64>().map_err(|_| ReplayError::InvalidValue {
                    row: row + 1,
                    column: headers.get(idx).unwrap_or("").to_string(),
                    value: raw.to_string(),
                })
            };
            frames.push(SensorFrame {
                feed_lpm: feeds.iter().map(|&i| value(i)).collect::<Result<_, _>>()?,
                consumer_lpm: consumers.iter().map(|&i| value(i)).collect::<Result<_, _>>()?,
                pump_kw: draws.iter().map(|&i| value(i)).collect::<Result<_, _>>()?,
                base_kw: value(base)?,
            });
        }

        Self::from_frames(frames)
    }

    /// Number of recorded frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; an empty replay cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Sensor for ReplaySensor {
    fn sample(&mut self, _layout: &SensorLayout) -> SensorFrame {
        let frame = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        frame
    }

    fn kind(&self) -> &'static str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SensorLayout {
        SensorLayout {
            feeds: vec![Channel::new("feed.motor", Band::new(120.0, 360.0))],
            consumers: vec![Channel::new("flow.main", Band::new(0.0, 50.0))],
            pump_draws: vec![Channel::new("draw.motor", Band::new(2.5, 4.0))],
            base: Channel::new("base", Band::new(0.1, 0.3)),
        }
    }

    #[test]
    fn uniform_sensor_is_deterministic_for_seed() {
        let layout = layout();
        let mut a = UniformSensor::new(42);
        let mut b = UniformSensor::new(42);
        for _ in 0..20 {
            assert_eq!(a.sample(&layout), b.sample(&layout));
        }
    }

    #[test]
    fn uniform_sensor_respects_bands() {
        let layout = layout();
        let mut sensor = UniformSensor::new(7);
        for _ in 0..500 {
            let frame = sensor.sample(&layout);
            assert!(frame.matches(&layout));
            assert!(layout.feeds[0].band.contains(frame.feed_lpm[0]));
            assert!(layout.consumers[0].band.contains(frame.consumer_lpm[0]));
            assert!(layout.pump_draws[0].band.contains(frame.pump_kw[0]));
            assert!(layout.base.band.contains(frame.base_kw));
        }
    }

    #[test]
    fn replay_reads_columns_by_name_and_wraps() {
        let csv = "base,flow.main,draw.motor,feed.motor,note\n\
                   0.2,60,3.0,240,a\n\
                   0.1,0,2.5,120,b\n";
        let mut sensor = ReplaySensor::from_csv_reader(csv.as_bytes(), &layout())
            .expect("replay should load");
        assert_eq!(sensor.len(), 2);

        let first = sensor.sample(&layout());
        assert_eq!(first.consumer_lpm, vec![60.0]);
        assert_eq!(first.feed_lpm, vec![240.0]);
        assert_eq!(first.base_kw, 0.2);

        let _second = sensor.sample(&layout());
        let third = sensor.sample(&layout());
        assert_eq!(third, first);
    }

    #[test]
    fn replay_reports_missing_column() {
        let csv = "flow.main,draw.motor,feed.motor\n1,2,3\n";
        let err = ReplaySensor::from_csv_reader(csv.as_bytes(), &layout()).unwrap_err();
        assert!(matches!(err, ReplayError::MissingColumn(ref c) if c == "base"));
    }

    #[test]
    fn replay_reports_bad_value() {
        let csv = "base,flow.main,draw.motor,feed.motor\n0.1,lots,3,200\n";
        let err = ReplaySensor::from_csv_reader(csv.as_bytes(), &layout()).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidValue { row: 1, .. }));
    }

    #[test]
    fn replay_rejects_empty_file() {
        let csv = "base,flow.main,draw.motor,feed.motor\n";
        let err = ReplaySensor::from_csv_reader(csv.as_bytes(), &layout()).unwrap_err();
        assert!(matches!(err, ReplayError::Empty));
    }

    #[test]
    fn fixed_sensor_repeats() {
        let frame = SensorFrame {
            feed_lpm: vec![240.0],
            consumer_lpm: vec![25.0],
            pump_kw: vec![3.25],
            base_kw: 0.2,
        };
        let mut sensor = FixedSensor::new(frame.clone());
        assert_eq!(sensor.sample(&layout()), frame);
        assert_eq!(sensor.sample(&layout()), frame);
        assert_eq!(sensor.kind(), "fixed");
    }
}
