use serde::{Deserialize, Serialize};

use crate::electrical::{self, LINE_VOLTAGE};
use crate::error::CanvasError;

/// One load line of a panel worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsumerModel {
    pub name: String,
    pub room_number: String,
    /// Volts.
    pub voltage: f64,
    pub power_factor: f64,
    pub power_kw: f64,
    pub installed_power_w: f64,
    pub operating_mode: String,
    pub cable_line: String,
    pub laying_method: String,
    /// Amperes, refreshed by [`ShieldData::recalculate`].
    pub current: f64,
    pub phases: u8,
    pub line_name: String,
    pub breaker_number: String,
    pub protection_device: String,
    pub poles: u8,
    pub cable_type: String,
    /// Percent of the nominal voltage.
    pub voltage_drop: f64,
    /// Metres.
    pub cable_length: f64,
    /// Kiloamperes at the end of the line.
    pub short_circuit_current: f64,
}

impl Default for ConsumerModel {
    fn default() -> Self {
        Self {
            name: String::new(),
            room_number: String::new(),
            voltage: electrical::PHASE_VOLTAGE,
            power_factor: 0.9,
            power_kw: 0.0,
            installed_power_w: 0.0,
            operating_mode: String::from("continuous"),
            cable_line: String::new(),
            laying_method: String::new(),
            current: 0.0,
            phases: 1,
            line_name: String::new(),
            breaker_number: String::new(),
            protection_device: String::new(),
            poles: 1,
            cable_type: String::new(),
            voltage_drop: 0.0,
            cable_length: 0.0,
            short_circuit_current: 0.0,
        }
    }
}

impl ConsumerModel {
    pub fn new(name: impl Into<String>, power_kw: f64) -> Self {
        Self {
            name: name.into(),
            power_kw,
            installed_power_w: power_kw * 1000.0,
            ..Self::default()
        }
    }

    /// Three-phase line at the line voltage.
    pub fn three_phase(mut self) -> Self {
        self.phases = 3;
        self.poles = 3;
        self.voltage = LINE_VOLTAGE;
        self
    }

    pub fn with_power_factor(mut self, power_factor: f64) -> Self {
        self.power_factor = power_factor;
        self
    }

    /// File key of the first numeric field holding NaN or an infinity.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        first_non_finite(&[
            ("voltage", self.voltage),
            ("powerFactor", self.power_factor),
            ("powerKw", self.power_kw),
            ("installedPowerW", self.installed_power_w),
            ("current", self.current),
            ("voltageDrop", self.voltage_drop),
            ("cableLength", self.cable_length),
            ("shortCircuitCurrent", self.short_circuit_current),
        ])
    }

    pub fn calculated_current(&self) -> f64 {
        electrical::load_current(
            self.power_kw * 1000.0,
            self.voltage,
            self.power_factor,
            self.phases,
        )
    }

    /// Cable length including the panel's reserve, descent and
    /// termination allowances.
    pub fn routed_cable_length(&self, shield: &ShieldData) -> f64 {
        let allowance =
            (shield.cable_reserve_percent + shield.descent_percent) / 100.0;
        self.cable_length * (1.0 + allowance) + shield.termination_length
    }

    pub fn voltage_drop_percent(
        &self,
        resistance_ohm_per_km: f64,
        reactance_ohm_per_km: f64,
        length_m: f64,
    ) -> f64 {
        electrical::voltage_drop_percent(
            self.calculated_current(),
            length_m,
            resistance_ohm_per_km,
            reactance_ohm_per_km,
            self.power_factor,
            self.voltage,
            self.phases,
        )
    }
}

/// Engineering worksheet of one panel, keyed by the shield node id in
/// [`crate::ShieldStorage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShieldData {
    // Description
    pub name: String,
    pub input_info: String,
    pub short_circuit_current: String,
    pub protection_standard: String,
    pub protection_manufacturer: String,

    // Phase labels
    #[serde(rename = "phaseL1")]
    pub phase_l1: String,
    #[serde(rename = "phaseL2")]
    pub phase_l2: String,
    #[serde(rename = "phaseL3")]
    pub phase_l3: String,

    // Factors
    pub demand_ratio: f64,
    pub simultaneity_factor: f64,
    pub diversity_factor: f64,

    // Totals
    pub installed_power: f64,
    pub calculated_power: f64,
    pub average_power_factor: f64,
    pub total_current: f64,
    pub demand_factor: f64,

    // Protection selection
    pub current_threshold: f64,
    pub low_current_factor: f64,
    pub high_current_factor: f64,

    // Cable
    pub cable_material: String,
    pub cable_insulation: String,
    pub cable_reserve_percent: f64,
    pub descent_percent: f64,
    pub termination_length: f64,
    pub max_voltage_drop: f64,
    pub temperature: f64,
    pub inductive_resistance: f64,
    pub flexible_cable: bool,

    // Reserve tiers, thresholds in kW of calculated power
    pub reserve_threshold_low: f64,
    pub reserve_threshold_high: f64,
    pub reserve_percent_low: f64,
    pub reserve_percent_mid: f64,
    pub reserve_percent_high: f64,

    pub consumers: Vec<ConsumerModel>,
}

impl Default for ShieldData {
    fn default() -> Self {
        Self {
            name: String::new(),
            input_info: String::new(),
            short_circuit_current: String::new(),
            protection_standard: String::from("IEC 60898"),
            protection_manufacturer: String::new(),
            phase_l1: String::from("L1"),
            phase_l2: String::from("L2"),
            phase_l3: String::from("L3"),
            demand_ratio: 1.0,
            simultaneity_factor: 1.0,
            diversity_factor: 1.0,
            installed_power: 0.0,
            calculated_power: 0.0,
            average_power_factor: 0.0,
            total_current: 0.0,
            demand_factor: 0.0,
            current_threshold: 40.0,
            low_current_factor: 1.25,
            high_current_factor: 1.1,
            cable_material: String::from("Cu"),
            cable_insulation: String::from("PVC"),
            cable_reserve_percent: 2.0,
            descent_percent: 0.0,
            termination_length: 2.0,
            max_voltage_drop: 4.0,
            temperature: 25.0,
            inductive_resistance: 0.08,
            flexible_cable: false,
            reserve_threshold_low: 10.0,
            reserve_threshold_high: 50.0,
            reserve_percent_low: 20.0,
            reserve_percent_mid: 15.0,
            reserve_percent_high: 10.0,
            consumers: Vec::new(),
        }
    }
}

/// Detached copy of a worksheet held by the undo history.
#[derive(Debug, Clone, PartialEq)]
pub struct ShieldSnapshot(ShieldData);

impl ShieldSnapshot {
    pub fn data(&self) -> &ShieldData {
        &self.0
    }
}

impl ShieldData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> ShieldSnapshot {
        ShieldSnapshot(self.clone())
    }

    /// Overwrites every field in place from `snapshot`. The consumer list
    /// is cleared and refilled with fresh copies.
    pub fn restore_from(&mut self, snapshot: &ShieldSnapshot) {
        let ShieldData {
            name,
            input_info,
            short_circuit_current,
            protection_standard,
            protection_manufacturer,
            phase_l1,
            phase_l2,
            phase_l3,
            demand_ratio,
            simultaneity_factor,
            diversity_factor,
            installed_power,
            calculated_power,
            average_power_factor,
            total_current,
            demand_factor,
            current_threshold,
            low_current_factor,
            high_current_factor,
            cable_material,
            cable_insulation,
            cable_reserve_percent,
            descent_percent,
            termination_length,
            max_voltage_drop,
            temperature,
            inductive_resistance,
            flexible_cable,
            reserve_threshold_low,
            reserve_threshold_high,
            reserve_percent_low,
            reserve_percent_mid,
            reserve_percent_high,
            consumers,
        } = &snapshot.0;

        self.name.clone_from(name);
        self.input_info.clone_from(input_info);
        self.short_circuit_current.clone_from(short_circuit_current);
        self.protection_standard.clone_from(protection_standard);
        self.protection_manufacturer
            .clone_from(protection_manufacturer);
        self.phase_l1.clone_from(phase_l1);
        self.phase_l2.clone_from(phase_l2);
        self.phase_l3.clone_from(phase_l3);
        self.demand_ratio = *demand_ratio;
        self.simultaneity_factor = *simultaneity_factor;
        self.diversity_factor = *diversity_factor;
        self.installed_power = *installed_power;
        self.calculated_power = *calculated_power;
        self.average_power_factor = *average_power_factor;
        self.total_current = *total_current;
        self.demand_factor = *demand_factor;
        self.current_threshold = *current_threshold;
        self.low_current_factor = *low_current_factor;
        self.high_current_factor = *high_current_factor;
        self.cable_material.clone_from(cable_material);
        self.cable_insulation.clone_from(cable_insulation);
        self.cable_reserve_percent = *cable_reserve_percent;
        self.descent_percent = *descent_percent;
        self.termination_length = *termination_length;
        self.max_voltage_drop = *max_voltage_drop;
        self.temperature = *temperature;
        self.inductive_resistance = *inductive_resistance;
        self.flexible_cable = *flexible_cable;
        self.reserve_threshold_low = *reserve_threshold_low;
        self.reserve_threshold_high = *reserve_threshold_high;
        self.reserve_percent_low = *reserve_percent_low;
        self.reserve_percent_mid = *reserve_percent_mid;
        self.reserve_percent_high = *reserve_percent_high;

        self.consumers.clear();
        self.consumers.extend(consumers.iter().cloned());
    }

    // ------------------------------------------------------------------
    // Consumer list
    // ------------------------------------------------------------------

    pub fn add_consumer(&mut self, consumer: ConsumerModel) -> usize {
        self.consumers.push(consumer);
        self.consumers.len() - 1
    }

    pub fn consumer(&self, index: usize) -> Option<&ConsumerModel> {
        self.consumers.get(index)
    }

    /// Replaces the consumer at `index`, returning the previous one.
    pub fn update_consumer(
        &mut self,
        index: usize,
        consumer: ConsumerModel,
    ) -> Result<ConsumerModel, CanvasError> {
        let slot = self
            .consumers
            .get_mut(index)
            .ok_or(CanvasError::ConsumerOutOfRange(index))?;
        Ok(std::mem::replace(slot, consumer))
    }

    pub fn remove_consumer(
        &mut self,
        index: usize,
    ) -> Result<ConsumerModel, CanvasError> {
        if index >= self.consumers.len() {
            return Err(CanvasError::ConsumerOutOfRange(index));
        }
        Ok(self.consumers.remove(index))
    }

    pub fn move_consumer(
        &mut self,
        from: usize,
        to: usize,
    ) -> Result<(), CanvasError> {
        let len = self.consumers.len();
        if from >= len {
            return Err(CanvasError::ConsumerOutOfRange(from));
        }
        if to >= len {
            return Err(CanvasError::ConsumerOutOfRange(to));
        }
        let consumer = self.consumers.remove(from);
        self.consumers.insert(to, consumer);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Calculations
    // ------------------------------------------------------------------

    /// Refreshes every consumer current, then the panel totals.
    pub fn recalculate(&mut self) {
        for consumer in &mut self.consumers {
            consumer.current = consumer.calculated_current();
        }

        let installed: f64 =
            self.consumers.iter().map(|c| c.power_kw).sum();
        let (active, apparent) = self
            .consumers
            .iter()
            .filter(|c| c.power_factor > 0.0)
            .fold((0.0, 0.0), |(p, s), c| {
                (p + c.power_kw, s + c.power_kw / c.power_factor)
            });

        self.installed_power = installed;
        self.calculated_power = installed
            * self.demand_ratio
            * self.simultaneity_factor
            * self.diversity_factor;
        self.average_power_factor =
            if apparent > 0.0 { active / apparent } else { 0.0 };
        self.total_current = electrical::load_current(
            self.calculated_power * 1000.0,
            LINE_VOLTAGE,
            self.average_power_factor,
            3,
        );
        self.demand_factor = if installed > 0.0 {
            self.calculated_power / installed
        } else {
            0.0
        };
    }

    /// Current a protective device must carry for a line drawing
    /// `current` amperes.
    pub fn required_breaker_current(&self, current: f64) -> f64 {
        if current < self.current_threshold {
            current * self.low_current_factor
        } else {
            current * self.high_current_factor
        }
    }

    pub fn breaker_rating_for(&self, current: f64) -> Option<f64> {
        electrical::select_breaker_rating(
            self.required_breaker_current(current),
        )
    }

    /// Spare capacity percentage for the panel's calculated power.
    pub fn reserve_percent(&self) -> f64 {
        if self.calculated_power <= self.reserve_threshold_low {
            self.reserve_percent_low
        } else if self.calculated_power <= self.reserve_threshold_high {
            self.reserve_percent_mid
        } else {
            self.reserve_percent_high
        }
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Path of the first numeric field, consumers included, holding NaN
    /// or an infinity, e.g. `consumers[2].powerKw`.
    pub fn non_finite_field(&self) -> Option<String> {
        let own = first_non_finite(&[
            ("demandRatio", self.demand_ratio),
            ("simultaneityFactor", self.simultaneity_factor),
            ("diversityFactor", self.diversity_factor),
            ("installedPower", self.installed_power),
            ("calculatedPower", self.calculated_power),
            ("averagePowerFactor", self.average_power_factor),
            ("totalCurrent", self.total_current),
            ("demandFactor", self.demand_factor),
            ("currentThreshold", self.current_threshold),
            ("lowCurrentFactor", self.low_current_factor),
            ("highCurrentFactor", self.high_current_factor),
            ("cableReservePercent", self.cable_reserve_percent),
            ("descentPercent", self.descent_percent),
            ("terminationLength", self.termination_length),
            ("maxVoltageDrop", self.max_voltage_drop),
            ("temperature", self.temperature),
            ("inductiveResistance", self.inductive_resistance),
            ("reserveThresholdLow", self.reserve_threshold_low),
            ("reserveThresholdHigh", self.reserve_threshold_high),
            ("reservePercentLow", self.reserve_percent_low),
            ("reservePercentMid", self.reserve_percent_mid),
            ("reservePercentHigh", self.reserve_percent_high),
        ]);
        if let Some(field) = own {
            return Some(field.to_string());
        }
        self.consumers.iter().enumerate().find_map(|(i, c)| {
            c.non_finite_field()
                .map(|field| format!("consumers[{i}].{field}"))
        })
    }
}

fn first_non_finite(fields: &[(&'static str, f64)]) -> Option<&'static str> {
    fields
        .iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shield() -> ShieldData {
        let mut shield = ShieldData::new("SH-1");
        shield.add_consumer(
            ConsumerModel::new("Lighting", 2.2).with_power_factor(1.0),
        );
        shield.add_consumer(
            ConsumerModel::new("Pump", 10.0)
                .three_phase()
                .with_power_factor(0.8),
        );
        shield
    }

    #[test]
    fn test_recalculate_totals() {
        let mut shield = sample_shield();
        shield.simultaneity_factor = 0.5;
        shield.recalculate();

        assert!((shield.consumers[0].current - 10.0).abs() < 1e-9);
        assert!((shield.consumers[1].current - 18.9918).abs() < 1e-3);

        assert!((shield.installed_power - 12.2).abs() < 1e-9);
        assert!((shield.calculated_power - 6.1).abs() < 1e-9);
        assert!((shield.demand_factor - 0.5).abs() < 1e-9);
        // 12.2 / (2.2 + 12.5)
        assert!(
            (shield.average_power_factor - 12.2 / 14.7).abs() < 1e-9
        );
        assert!(shield.total_current > 0.0);
    }

    #[test]
    fn test_recalculate_empty_zeroes_totals() {
        let mut shield = sample_shield();
        shield.recalculate();
        shield.consumers.clear();
        shield.recalculate();

        assert_eq!(shield.installed_power, 0.0);
        assert_eq!(shield.calculated_power, 0.0);
        assert_eq!(shield.average_power_factor, 0.0);
        assert_eq!(shield.total_current, 0.0);
        assert_eq!(shield.demand_factor, 0.0);
    }

    #[test]
    fn test_breaker_rating_uses_threshold_factors() {
        let shield = ShieldData::default();
        // below 40 A: 30 * 1.25 = 37.5 -> 40
        assert_eq!(shield.breaker_rating_for(30.0), Some(40.0));
        // above 40 A: 60 * 1.1 = 66 -> 80
        assert_eq!(shield.breaker_rating_for(60.0), Some(80.0));
    }

    #[test]
    fn test_reserve_tiers() {
        let mut shield = ShieldData::default();
        shield.calculated_power = 5.0;
        assert_eq!(shield.reserve_percent(), 20.0);
        shield.calculated_power = 30.0;
        assert_eq!(shield.reserve_percent(), 15.0);
        shield.calculated_power = 80.0;
        assert_eq!(shield.reserve_percent(), 10.0);
    }

    #[test]
    fn test_routed_cable_length() {
        let mut shield = ShieldData::default();
        shield.cable_reserve_percent = 5.0;
        shield.descent_percent = 5.0;
        shield.termination_length = 1.5;
        let mut consumer = ConsumerModel::new("Socket", 1.0);
        consumer.cable_length = 20.0;

        let length = consumer.routed_cable_length(&shield);
        assert!((length - 23.5).abs() < 1e-9);
    }

    #[test]
    fn test_consumer_list_edits() {
        let mut shield = sample_shield();
        shield.add_consumer(ConsumerModel::new("Heater", 3.0));

        shield.move_consumer(2, 0).unwrap();
        assert_eq!(shield.consumers[0].name, "Heater");
        assert_eq!(shield.consumers[1].name, "Lighting");

        let old = shield
            .update_consumer(1, ConsumerModel::new("LED", 0.5))
            .unwrap();
        assert_eq!(old.name, "Lighting");
        assert_eq!(shield.consumer(1).map(|c| c.name.as_str()), Some("LED"));

        let removed = shield.remove_consumer(0).unwrap();
        assert_eq!(removed.name, "Heater");
        assert_eq!(shield.consumer_count(), 2);

        assert_eq!(
            shield.remove_consumer(7),
            Err(CanvasError::ConsumerOutOfRange(7))
        );
        assert_eq!(
            shield.move_consumer(0, 9),
            Err(CanvasError::ConsumerOutOfRange(9))
        );
    }

    #[test]
    fn test_snapshot_does_not_follow_live_edits() {
        let mut shield = sample_shield();
        let snapshot = shield.snapshot();

        shield.consumers[0].name.push_str(" (edited)");
        shield.add_consumer(ConsumerModel::new("Extra", 1.0));
        shield.demand_ratio = 0.7;

        assert_eq!(snapshot.data().consumers.len(), 2);
        assert_eq!(snapshot.data().consumers[0].name, "Lighting");
        assert_eq!(snapshot.data().demand_ratio, 1.0);

        shield.restore_from(&snapshot);
        assert_eq!(&shield, snapshot.data());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let json = r#"{ "name": "Old", "consumers": [ { "name": "A" } ] }"#;
        let shield: ShieldData = serde_json::from_str(json).unwrap();

        assert_eq!(shield.name, "Old");
        assert_eq!(shield.current_threshold, 40.0);
        assert_eq!(shield.consumers[0].cable_length, 0.0);
        assert_eq!(shield.consumers[0].phases, 1);
    }

    #[test]
    fn test_non_finite_field_names_the_first_offender() {
        let mut shield = sample_shield();
        assert_eq!(shield.non_finite_field(), None);

        shield.consumers[1].power_kw = f64::NAN;
        assert_eq!(
            shield.non_finite_field().as_deref(),
            Some("consumers[1].powerKw")
        );

        shield.temperature = f64::INFINITY;
        assert_eq!(shield.non_finite_field().as_deref(), Some("temperature"));
    }
}
