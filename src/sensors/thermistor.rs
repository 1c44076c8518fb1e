//! NTC thermistor conversion (B = 3950).
//!
//! The thermistor sits in a voltage divider with a fixed series resistor
//! and is sampled by a 12-bit ADC.  Both resistances come from the sensor
//! record, so one routine serves every NTC on the board.  The simplified
//! Beta (Steinhart-Hart) equation turns resistance into temperature.

const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;

/// Readings this close to either rail mean an open or shorted thermistor.
const RAIL_MARGIN_V: f32 = 0.01;

/// Convert a raw ADC sample to °C.
///
/// `None` for rail readings or non-positive resistances.
pub fn adc_to_celsius(raw: u16, series_ohms: f32, nominal_ohms: f32) -> Option<f32> {
    if series_ohms <= 0.0 || nominal_ohms <= 0.0 {
        return None;
    }
    let voltage = (f32::from(raw) / ADC_MAX) * V_REF;
    if voltage <= RAIL_MARGIN_V || voltage >= V_REF - RAIL_MARGIN_V {
        return None;
    }
    let r_ntc = series_ohms * voltage / (V_REF - voltage);
    let inv_t = (1.0 / T25_K) + (1.0 / BETA) * (r_ntc / nominal_ohms).ln();
    if inv_t <= 0.0 {
        return None;
    }
    Some((1.0 / inv_t) - 273.15)
}
