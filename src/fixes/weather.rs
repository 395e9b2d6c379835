//! Weather/area resynchronization
//!
//! The weather record's area id must match the area byte of the current
//! map id. A zero area id while the character stands in a real location,
//! or an implausibly large weather timer, marks the record corrupt.

use super::{occupied_slot, Fix, FixResult};
use crate::save::slot::world::WorldAreaWeather;
use crate::save::{encode_sub, Save};

/// Weather timers above this value only occur in corrupted saves.
pub const WEATHER_TIMER_MAX: u32 = 100_000;

pub struct WeatherFix;

impl Fix for WeatherFix {
    fn name(&self) -> &'static str {
        "Weather Corruption"
    }

    fn detect(&self, save: &Save, slot_index: usize) -> bool {
        let Some(slot) = occupied_slot(save, slot_index) else {
            return false;
        };
        let weather = slot.world_area_weather;
        weather.timer > WEATHER_TIMER_MAX
            || (weather.area_id == 0 && !slot.map_id.is_zero())
    }

    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult {
        if !self.detect(save, slot_index) {
            return FixResult::skipped("weather record is consistent");
        }

        let (rel, old_area, new_area, map, bytes) = {
            let slot = match save.slot_mut(slot_index) {
                Ok(slot) => slot,
                Err(err) => return FixResult::skipped(err.to_string()),
            };
            let old_area = slot.world_area_weather.area_id;
            slot.world_area_weather.area_id = slot.map_id.area();
            // A runaway timer would re-trigger detection forever
            if slot.world_area_weather.timer > WEATHER_TIMER_MAX {
                slot.world_area_weather.timer = 0;
            }
            (
                slot.offsets.weather,
                old_area,
                slot.world_area_weather.area_id,
                slot.map_id,
                encode_sub(&slot.world_area_weather, WorldAreaWeather::write),
            )
        };
        save.write_back(slot_index, rel, &bytes);

        FixResult::applied(format!("area id set to {new_area}")).with_details(vec![
            format!("previous area id: {old_area}"),
            format!("map: {map}"),
        ])
    }
}
