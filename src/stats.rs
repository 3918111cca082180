// Derived metrics over the raw rows of a `ReportRequest`.
//
// Every function here is total: empty or missing input yields a fixed
// default (`"0 L"`, `"N/A"`, `"0%"`) instead of an error or a NaN.
use std::collections::HashMap;

use crate::types::{ApartmentRow, BuildingRow, ConsumptionRecord, GroupRow, ReportRequest};
use crate::util::{format_date, format_fixed};

pub const NOT_AVAILABLE: &str = "N/A";

fn liters(total: f64) -> String {
    format!("{} L", format_fixed(total, 2))
}

pub fn average_consumption(records: &[ConsumptionRecord]) -> String {
    if records.is_empty() {
        return "0 L".to_string();
    }
    let sum: f64 = records.iter().map(|r| r.consumption).sum();
    liters(sum / records.len() as f64)
}

pub fn total_consumption(records: &[ConsumptionRecord]) -> String {
    if records.is_empty() {
        return "0 L".to_string();
    }
    liters(records.iter().map(|r| r.consumption).sum())
}

/// First record whose value beats every earlier one under `better`.
fn pick_record<F>(records: &[ConsumptionRecord], better: F) -> Option<&ConsumptionRecord>
where
    F: Fn(f64, f64) -> bool,
{
    let mut iter = records.iter();
    let mut best = iter.next()?;
    for r in iter {
        if better(r.consumption, best.consumption) {
            best = r;
        }
    }
    Some(best)
}

fn describe_day(record: Option<&ConsumptionRecord>) -> String {
    match record {
        Some(r) => format!("{} ({} L)", format_date(&r.date), r.consumption),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn peak_day(records: &[ConsumptionRecord]) -> String {
    describe_day(pick_record(records, |candidate, best| candidate > best))
}

pub fn lowest_day(records: &[ConsumptionRecord]) -> String {
    describe_day(pick_record(records, |candidate, best| candidate < best))
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    f64::from(numerator) / f64::from(denominator.max(1))
}

pub fn group_efficiency_ratio(group: &GroupRow) -> f64 {
    ratio(group.apartment_count, group.building_count)
}

pub fn group_efficiency_label(group: &GroupRow) -> &'static str {
    let r = group_efficiency_ratio(group);
    if r > 10.0 {
        "Excellent"
    } else if r > 5.0 {
        "Good"
    } else {
        "Average"
    }
}

/// Apartments per device; shared by the occupancy and efficiency labels.
pub fn building_device_ratio(building: &BuildingRow) -> f64 {
    ratio(building.apartment_count, building.device_count)
}

pub fn building_occupancy_label(building: &BuildingRow) -> &'static str {
    let r = building_device_ratio(building);
    if r > 0.8 {
        "Fully Occupied"
    } else if r > 0.5 {
        "Partially Occupied"
    } else {
        "Low Occupancy"
    }
}

pub fn building_efficiency_label(building: &BuildingRow) -> &'static str {
    let r = building_device_ratio(building);
    if r > 0.9 {
        "High"
    } else if r > 0.7 {
        "Medium"
    } else {
        "Low"
    }
}

/// First item maximising `key`; later ties lose.
fn arg_max<T, F>(items: &[T], key: F) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let k = key(item);
        match best {
            Some((_, best_k)) if k <= best_k => {}
            _ => best = Some((item, k)),
        }
    }
    best.map(|(item, _)| item)
}

pub fn most_efficient_building(buildings: &[BuildingRow]) -> String {
    arg_max(buildings, building_device_ratio)
        .map_or_else(|| NOT_AVAILABLE.to_string(), |b| b.name.clone())
}

pub fn largest_building(buildings: &[BuildingRow]) -> String {
    arg_max(buildings, |b| f64::from(b.apartment_count))
        .map_or_else(|| NOT_AVAILABLE.to_string(), |b| b.name.clone())
}

/// Share of apartments with a real tenant, in percent. `None` when there
/// are no apartments at all.
pub fn occupancy_rate_percent(apartments: &[ApartmentRow]) -> Option<f64> {
    if apartments.is_empty() {
        return None;
    }
    let occupied = apartments.iter().filter(|a| a.is_occupied()).count();
    Some(occupied as f64 / apartments.len() as f64 * 100.0)
}

pub fn occupancy_rate(apartments: &[ApartmentRow]) -> String {
    match occupancy_rate_percent(apartments) {
        Some(rate) => format!("{}%", format_fixed(rate, 1)),
        None => "0%".to_string(),
    }
}

pub fn most_common_apartment_type(apartments: &[ApartmentRow]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for kind in apartments
        .iter()
        .filter_map(|a| a.apartment_type.as_deref())
        .map(str::trim)
        .filter(|k| !k.is_empty())
    {
        let count = counts.entry(kind).or_insert(0);
        if *count == 0 {
            order.push(kind);
        }
        *count += 1;
    }
    // Ties resolve to the type seen first.
    let mut best: Option<(&str, usize)> = None;
    for kind in order {
        let count = counts[kind];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((kind, count));
        }
    }
    best.map_or_else(|| NOT_AVAILABLE.to_string(), |(kind, _)| kind.to_string())
}

pub fn average_apartment_size(apartments: &[ApartmentRow]) -> String {
    let sizes: Vec<f64> = apartments.iter().filter_map(|a| a.size).collect();
    if sizes.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    let avg = sizes.iter().sum::<f64>() / sizes.len() as f64;
    format!("{} m²", format_fixed(avg, 1))
}

pub fn total_devices(buildings: &[BuildingRow]) -> u64 {
    buildings.iter().map(|b| u64::from(b.device_count)).sum()
}

pub fn total_apartments(buildings: &[BuildingRow]) -> u64 {
    buildings.iter().map(|b| u64::from(b.apartment_count)).sum()
}

/// Bands are strict: a score of exactly 80 is `"Good"`, not `"Excellent"`.
pub fn system_efficiency_score(
    total_apartments: u64,
    total_devices: u64,
    occupancy_rate_percent: f64,
) -> &'static str {
    if total_devices == 0 {
        return NOT_AVAILABLE;
    }
    let score = ((total_apartments as f64 / total_devices as f64)
        * (occupancy_rate_percent / 100.0)
        * 100.0)
        .min(100.0);
    if score > 80.0 {
        "Excellent"
    } else if score > 60.0 {
        "Good"
    } else if score > 40.0 {
        "Average"
    } else {
        "Needs Improvement"
    }
}

pub fn consumption_level(liters: f64) -> &'static str {
    if liters > 200.0 {
        "High"
    } else if liters > 100.0 {
        "Medium"
    } else {
        "Low"
    }
}

pub fn consumption_note(liters: f64) -> &'static str {
    if liters > 200.0 {
        "Above average consumption"
    } else if liters < 50.0 {
        "Below average consumption"
    } else {
        "Normal consumption"
    }
}

/// Metrics computed once per report build and shared by both builders.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub average_consumption: String,
    pub total_consumption: String,
    pub peak_day: String,
    pub lowest_day: String,
    pub most_efficient_building: String,
    pub largest_building: String,
    pub occupancy_rate: String,
    pub most_common_apartment_type: String,
    pub average_apartment_size: String,
    pub total_devices: u64,
    pub total_apartments: u64,
    pub system_efficiency_score: String,
    pub consumption_records: usize,
    pub building_groups: usize,
    pub buildings: usize,
    pub apartments: usize,
}

impl AnalyticsSummary {
    pub fn compute(request: &ReportRequest) -> Self {
        let records = &request.consumption_data;
        let total_devices = total_devices(&request.buildings);
        let total_apartments = total_apartments(&request.buildings);
        // The score is computed from the rate as displayed (one decimal).
        let rate = occupancy_rate_percent(&request.apartments)
            .map_or(0.0, |r| (r * 10.0).round() / 10.0);

        Self {
            average_consumption: average_consumption(records),
            total_consumption: total_consumption(records),
            peak_day: peak_day(records),
            lowest_day: lowest_day(records),
            most_efficient_building: most_efficient_building(&request.buildings),
            largest_building: largest_building(&request.buildings),
            occupancy_rate: occupancy_rate(&request.apartments),
            most_common_apartment_type: most_common_apartment_type(&request.apartments),
            average_apartment_size: average_apartment_size(&request.apartments),
            total_devices,
            total_apartments,
            system_efficiency_score: system_efficiency_score(total_apartments, total_devices, rate)
                .to_string(),
            consumption_records: records.len(),
            building_groups: request.building_groups.len(),
            buildings: request.buildings.len(),
            apartments: request.apartments.len(),
        }
    }

    /// Fixed, ordered `(metric, value)` list for tabular output.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Average Daily Consumption", self.average_consumption.clone()),
            ("Total Consumption", self.total_consumption.clone()),
            ("Peak Consumption Day", self.peak_day.clone()),
            ("Lowest Consumption Day", self.lowest_day.clone()),
            ("Most Efficient Building", self.most_efficient_building.clone()),
            ("Largest Building", self.largest_building.clone()),
            ("Occupancy Rate", self.occupancy_rate.clone()),
            ("Most Common Apartment Type", self.most_common_apartment_type.clone()),
            ("Average Apartment Size", self.average_apartment_size.clone()),
            ("Total Devices", self.total_devices.to_string()),
            ("System Efficiency Score", self.system_efficiency_score.clone()),
            ("Consumption Records", self.consumption_records.to_string()),
            ("Building Groups", self.building_groups.to_string()),
            ("Buildings", self.buildings.to_string()),
            ("Apartments", self.apartments.to_string()),
        ]
    }
}
