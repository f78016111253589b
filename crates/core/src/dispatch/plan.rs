//! Action → device operation table.
//!
//! ```text
//! action         lamp          rgb_light    sunset_plug  spotlight_plug
//! reset_all      health check  on(orange)   on           off
//! record_start   on            on(red)      on           -
//! record_stop    off           on(pink)     -            -
//! play           -             on(green)    off          on
//! stop           -             on(pink)     on           off
//! all_notes_off  off           off          off          off
//! snare_on       on            -            -            -
//! snare_off      off           -            -            -
//! ```
//!
//! Track left/right and unknown messages have no device operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::devices::{DeviceSlot, Palette};
use crate::midi::Action;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Switch on, optionally with a palette color name.
    TurnOn(Option<String>),
    TurnOff,
    HealthCheck,
}

impl Operation {
    pub fn on() -> Self {
        Operation::TurnOn(None)
    }

    pub fn on_color(name: &str) -> Self {
        Operation::TurnOn(Some(name.to_string()))
    }
}

/// One device operation inside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOp {
    pub slot: DeviceSlot,
    pub op: Operation,
}

impl PlannedOp {
    pub fn new(slot: DeviceSlot, op: Operation) -> Self {
        Self { slot, op }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub action: Action,
    pub ops: Vec<PlannedOp>,
}

/// The full plan table. Actions without an entry have an empty plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ActionPlan>", into = "Vec<ActionPlan>")]
pub struct PlanTable {
    plans: BTreeMap<Action, Vec<PlannedOp>>,
}

impl PlanTable {
    pub fn empty() -> Self {
        Self {
            plans: BTreeMap::new(),
        }
    }

    pub fn with(mut self, action: Action, ops: Vec<PlannedOp>) -> Self {
        self.plans.insert(action, ops);
        self
    }

    pub fn plan_for(&self, action: Action) -> &[PlannedOp] {
        self.plans.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every color name used by the table must exist in `palette`.
    pub fn validate(&self, palette: &Palette) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for (action, ops) in &self.plans {
            for planned in ops {
                if let Operation::TurnOn(Some(name)) = &planned.op {
                    if !palette.contains(name) {
                        errors.push(format!(
                            "{} plan uses unknown color '{}' for {}",
                            action, name, planned.slot
                        ));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for PlanTable {
    fn default() -> Self {
        use DeviceSlot::*;

        let op = PlannedOp::new;
        let all_off = DeviceSlot::ALL
            .into_iter()
            .map(|slot| op(slot, Operation::TurnOff))
            .collect();

        Self::empty()
            .with(
                Action::ResetAll,
                vec![
                    op(Lamp, Operation::HealthCheck),
                    op(RgbLight, Operation::on_color("orange")),
                    op(SunsetPlug, Operation::on()),
                    op(SpotlightPlug, Operation::TurnOff),
                ],
            )
            .with(
                Action::RecordStart,
                vec![
                    op(Lamp, Operation::on()),
                    op(RgbLight, Operation::on_color("red")),
                    op(SunsetPlug, Operation::on()),
                ],
            )
            .with(
                Action::RecordStop,
                vec![
                    op(Lamp, Operation::TurnOff),
                    op(RgbLight, Operation::on_color("pink")),
                ],
            )
            .with(
                Action::Play,
                vec![
                    op(RgbLight, Operation::on_color("green")),
                    op(SunsetPlug, Operation::TurnOff),
                    op(SpotlightPlug, Operation::on()),
                ],
            )
            .with(
                Action::Stop,
                vec![
                    op(RgbLight, Operation::on_color("pink")),
                    op(SunsetPlug, Operation::on()),
                    op(SpotlightPlug, Operation::TurnOff),
                ],
            )
            .with(Action::AllNotesOff, all_off)
            .with(Action::SnareOn, vec![op(Lamp, Operation::on())])
            .with(Action::SnareOff, vec![op(Lamp, Operation::TurnOff)])
    }
}

impl From<Vec<ActionPlan>> for PlanTable {
    fn from(plans: Vec<ActionPlan>) -> Self {
        Self {
            plans: plans
                .into_iter()
                .map(|plan| (plan.action, plan.ops))
                .collect(),
        }
    }
}

impl From<PlanTable> for Vec<ActionPlan> {
    fn from(table: PlanTable) -> Self {
        table
            .plans
            .into_iter()
            .map(|(action, ops)| ActionPlan { action, ops })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plans_match_table() {
        let table = PlanTable::default();

        assert_eq!(
            table.plan_for(Action::Play),
            &[
                PlannedOp::new(DeviceSlot::RgbLight, Operation::on_color("green")),
                PlannedOp::new(DeviceSlot::SunsetPlug, Operation::TurnOff),
                PlannedOp::new(DeviceSlot::SpotlightPlug, Operation::on()),
            ]
        );
        assert_eq!(table.plan_for(Action::AllNotesOff).len(), 4);
        assert!(table
            .plan_for(Action::AllNotesOff)
            .iter()
            .all(|planned| planned.op == Operation::TurnOff));
        assert_eq!(
            table.plan_for(Action::ResetAll)[0],
            PlannedOp::new(DeviceSlot::Lamp, Operation::HealthCheck)
        );
    }

    #[test]
    fn test_log_only_actions_have_empty_plans() {
        let table = PlanTable::default();
        for action in [Action::TrackLeft, Action::TrackRight, Action::Unknown] {
            assert!(table.plan_for(action).is_empty());
        }
    }

    #[test]
    fn test_default_plans_only_use_palette_colors() {
        assert!(PlanTable::default().validate(&Palette::default()).is_ok());

        let errors = PlanTable::default()
            .validate(&Palette::empty())
            .unwrap_err();
        assert!(errors.iter().any(|e| e.contains("'red'")));
    }

    #[test]
    fn test_plan_table_json_shape() {
        let table = PlanTable::empty().with(
            Action::SnareOn,
            vec![PlannedOp::new(DeviceSlot::Lamp, Operation::on_color("red"))],
        );
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"action": "snare_on", "ops": [{"slot": "lamp", "op": {"turn_on": "red"}}]}
            ])
        );
        let parsed: PlanTable = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, table);
    }
}
