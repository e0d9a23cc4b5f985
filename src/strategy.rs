use crate::compound::Compound;
use crate::config::SimulationConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Anything that can price a single lap.
pub trait LapTimePredictor {
    /// Predicted lap time in seconds.
    fn predict_lap(&self, lap_number: u32, compound: Compound) -> Result<f64>;
}

/// Starting tyre and the lap on which the car pits. The pit lap is not
/// validated; a lap outside the race simply never triggers a stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyPlan {
    pub tyre: Compound,
    pub pit_lap: u32,
}

impl StrategyPlan {
    pub fn new(tyre: Compound, pit_lap: u32) -> Self {
        Self { tyre, pit_lap }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPlan {
    pub name: String,
    #[serde(flatten)]
    pub plan: StrategyPlan,
}

impl NamedPlan {
    pub fn new(name: impl Into<String>, plan: StrategyPlan) -> Self {
        Self { name: name.into(), plan }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub lap: u32,
    /// Seconds, including the pit loss on the stop lap.
    pub lap_time: f64,
    /// Percent, never below zero.
    pub tyre_life: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RaceTrace {
    laps: Vec<LapRecord>,
    pit_laps: Vec<u32>,
}

impl RaceTrace {
    pub fn laps(&self) -> &[LapRecord] {
        &self.laps
    }

    pub fn len(&self) -> usize {
        self.laps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LapRecord> {
        self.laps.iter()
    }

    /// Record for a 1-based lap number, for lap-by-lap replay.
    pub fn lap(&self, lap: u32) -> Option<&LapRecord> {
        let index = lap.checked_sub(1)? as usize;
        self.laps.get(index)
    }

    pub fn pit_laps(&self) -> &[u32] {
        &self.pit_laps
    }

    /// Stops actually taken, as `"25"`, `"20, 45"` or `"none"`.
    pub fn pit_summary(&self) -> String {
        if self.pit_laps.is_empty() {
            return "none".to_string();
        }
        self.pit_laps.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
    }

    pub fn total_time(&self) -> f64 {
        self.laps.iter().map(|l| l.lap_time).sum()
    }

    pub fn final_tyre_life(&self) -> Option<f64> {
        self.laps.last().map(|l| l.tyre_life)
    }
}

impl<'a> IntoIterator for &'a RaceTrace {
    type Item = &'a LapRecord;
    type IntoIter = std::slice::Iter<'a, LapRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.laps.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StrategySimulator {
    config: SimulationConfig,
}

impl StrategySimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs the race lap by lap. Every lap is priced by the model, then the
    /// tyre wears; on the pit lap the pit loss is added and tyre life resets
    /// after that lap's wear has been taken.
    pub fn simulate<P>(&self, plan: &StrategyPlan, model: &P) -> Result<RaceTrace>
    where
        P: LapTimePredictor + ?Sized,
    {
        let wear_rate = self.config.wear.rate(plan.tyre);
        let mut tyre_life = self.config.fresh_tyre_life;
        let mut laps = Vec::with_capacity(self.config.race_laps as usize);
        let mut pit_laps = Vec::new();

        for lap in 1..=self.config.race_laps {
            let mut lap_time = model.predict_lap(lap, plan.tyre)?;

            tyre_life -= wear_rate;

            if lap == plan.pit_lap {
                lap_time += self.config.pit_loss;
                tyre_life = self.config.fresh_tyre_life;
                pit_laps.push(lap);
            }

            laps.push(LapRecord {
                lap,
                lap_time,
                tyre_life: tyre_life.max(0.0),
            });
        }

        let trace = RaceTrace { laps, pit_laps };
        debug!(
            tyre = %plan.tyre,
            pit_lap = plan.pit_lap,
            total = trace.total_time(),
            "simulated race"
        );
        Ok(trace)
    }
}

/// Simulates with the reference race settings (70 laps, 22s pit loss).
pub fn simulate<P>(plan: &StrategyPlan, model: &P) -> Result<RaceTrace>
where
    P: LapTimePredictor + ?Sized,
{
    StrategySimulator::default().simulate(plan, model)
}
