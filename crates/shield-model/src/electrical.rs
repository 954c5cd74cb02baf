//! Plain electrical formulas used by the panel worksheet.

/// Line-to-line voltage of the three-phase supply, in volts.
pub const LINE_VOLTAGE: f64 = 380.0;
/// Phase voltage of the single-phase supply, in volts.
pub const PHASE_VOLTAGE: f64 = 220.0;

/// Nominal currents of the standard breaker series (IEC 60898 / 60947).
pub const STANDARD_BREAKER_RATINGS: [f64; 22] = [
    6.0, 10.0, 13.0, 16.0, 20.0, 25.0, 32.0, 40.0, 50.0, 63.0, 80.0,
    100.0, 125.0, 160.0, 200.0, 250.0, 315.0, 400.0, 500.0, 630.0,
    800.0, 1600.0,
];

/// Load current in amperes for an active power in watts.
///
/// Single phase: `P / (U cos φ)`. Three phase: `P / (√3 U cos φ)`.
/// Returns 0 when the voltage or power factor is not positive.
pub fn load_current(
    power_w: f64,
    voltage: f64,
    power_factor: f64,
    phases: u8,
) -> f64 {
    if voltage <= 0.0 || power_factor <= 0.0 {
        return 0.0;
    }
    let k = if phases >= 3 { 3f64.sqrt() } else { 1.0 };
    power_w / (k * voltage * power_factor)
}

/// Voltage drop along a line, in percent of the nominal voltage.
///
/// `ΔU% = k I L (r cos φ + x sin φ) / U * 100`, with `k = 2` for single
/// phase and `√3` for three phase, `r`/`x` in Ω/km and `L` in metres.
pub fn voltage_drop_percent(
    current: f64,
    length_m: f64,
    resistance_ohm_per_km: f64,
    reactance_ohm_per_km: f64,
    power_factor: f64,
    voltage: f64,
    phases: u8,
) -> f64 {
    if voltage <= 0.0 {
        return 0.0;
    }
    let cos = power_factor.clamp(0.0, 1.0);
    let sin = (1.0 - cos * cos).sqrt();
    let k = if phases >= 3 { 3f64.sqrt() } else { 2.0 };
    let length_km = length_m / 1000.0;
    k * current
        * length_km
        * (resistance_ohm_per_km * cos + reactance_ohm_per_km * sin)
        / voltage
        * 100.0
}

/// Smallest standard breaker rating that carries `required` amperes.
pub fn select_breaker_rating(required: f64) -> Option<f64> {
    STANDARD_BREAKER_RATINGS
        .iter()
        .copied()
        .find(|&rating| rating >= required)
}
