//! Net power from separate solar/wind/demand forecast exports.
//!
//! Forecast files carry one column each (`SolarPower`, `WindPower`,
//! `Total demand`, all in kW). The combined `net_power` column is in W, the
//! same unit the `power` query produces.

use wb_schemas::{Dataset, Series};

use crate::StrategyError;

pub const SOLAR_COLUMN: &str = "SolarPower";
pub const WIND_COLUMN: &str = "WindPower";
pub const DEMAND_COLUMN: &str = "Total demand";
pub const NET_POWER_COLUMN: &str = "net_power";

const KW_TO_W: f64 = 1000.0;

/// `(wind + solar - demand) * 1000` on timestamps present in all three inputs.
pub fn net_power_from_forecasts(
    solar: &Dataset,
    wind: &Dataset,
    demand: &Dataset,
) -> Result<Dataset, StrategyError> {
    let solar = column(solar, "solar", SOLAR_COLUMN)?;
    let wind = column(wind, "wind", WIND_COLUMN)?;
    let demand = column(demand, "demand", DEMAND_COLUMN)?;

    let points = solar.iter().filter_map(|(t, s)| {
        let w = wind.get(t)?;
        let d = demand.get(t)?;
        Some((*t, (w + s - d) * KW_TO_W))
    });
    Ok(Dataset::from_series(NET_POWER_COLUMN, points))
}

fn column(ds: &Dataset, name: &str, column: &str) -> Result<Series, StrategyError> {
    ds.series(column).ok_or_else(|| StrategyError::MissingColumn {
        dataset: name.to_string(),
        column: column.to_string(),
    })
}
