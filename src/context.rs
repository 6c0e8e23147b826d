//! Telemetry snapshots for the dashboard views and the context strings they
//! send to the resolver.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AdvisorError;
use crate::resolver::ResolveRequest;
use crate::types::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeRange {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Daily,
        TimeRange::Weekly,
        TimeRange::Monthly,
        TimeRange::Yearly,
    ];
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeRange::Daily => "Daily",
            TimeRange::Weekly => "Weekly",
            TimeRange::Monthly => "Monthly",
            TimeRange::Yearly => "Yearly",
        };
        f.write_str(label)
    }
}

impl FromStr for TimeRange {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|r| r.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AdvisorError::Validation {
                message: format!("unknown time range '{}'", s),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Building {
    pub name: &'static str,
    pub kind: &'static str,
    pub base_load_kw: u32,
    pub efficiency: u8,
}

pub const BUILDINGS: &[Building] = &[
    Building {
        name: "Skyline Tower",
        kind: "Commercial",
        base_load_kw: 4500,
        efficiency: 72,
    },
    Building {
        name: "Eco Plaza",
        kind: "Mixed Use",
        base_load_kw: 2800,
        efficiency: 88,
    },
    Building {
        name: "Tech Hub",
        kind: "Office",
        base_load_kw: 3200,
        efficiency: 65,
    },
    Building {
        name: "Green Valley Mall",
        kind: "Retail",
        base_load_kw: 5100,
        efficiency: 58,
    },
];

impl Building {
    /// Case-insensitive lookup in [`BUILDINGS`].
    pub fn find(name: &str) -> Option<&'static Building> {
        BUILDINGS
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn context(&self, range: TimeRange, load_kw: f64) -> String {
        format!(
            "Building: {}, Range: {}, Load: {}kW",
            self.name, range, load_kw
        )
    }

    pub fn request(&self, range: TimeRange, load_kw: f64) -> ResolveRequest {
        ResolveRequest::new(Domain::Energy, self.context(range, load_kw)).with_entity(self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub id: &'static str,
    pub name: &'static str,
    pub status: &'static str,
    pub load_pct: u8,
    pub vehicles: u8,
}

pub const ROUTES: &[Route] = &[
    Route {
        id: "R101",
        name: "Downtown Loop",
        status: "On Time",
        load_pct: 85,
        vehicles: 4,
    },
    Route {
        id: "R102",
        name: "Tech Park Express",
        status: "Delayed",
        load_pct: 92,
        vehicles: 3,
    },
    Route {
        id: "R103",
        name: "Suburb Connector",
        status: "On Time",
        load_pct: 45,
        vehicles: 6,
    },
    Route {
        id: "R104",
        name: "Airport Shuttle",
        status: "On Time",
        load_pct: 60,
        vehicles: 2,
    },
];

impl Route {
    pub fn find(id: &str) -> Option<&'static Route> {
        ROUTES.iter().find(|r| r.id.eq_ignore_ascii_case(id.trim()))
    }

    pub fn context(&self, range: TimeRange) -> String {
        format!(
            "Route: {}, Range: {}, Status: {}, Load: {}%",
            self.id, range, self.status, self.load_pct
        )
    }

    pub fn request(&self, range: TimeRange) -> ResolveRequest {
        ResolveRequest::new(Domain::Transport, self.context(range)).with_entity(self.id)
    }
}

/// Point-in-time grid readings. The grid has no per-entity answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSnapshot {
    pub frequency_hz: f64,
    pub demand_mw: f64,
    pub battery_pct: f64,
}

impl Default for GridSnapshot {
    fn default() -> Self {
        Self {
            frequency_hz: 50.0,
            demand_mw: 850.0,
            battery_pct: 78.0,
        }
    }
}

impl GridSnapshot {
    pub fn context(&self, range: TimeRange) -> String {
        format!(
            "Range: {}, Frequency: {}Hz, Demand: {}MW, Battery: {}%",
            range, self.frequency_hz, self.demand_mw, self.battery_pct
        )
    }

    pub fn request(&self, range: TimeRange) -> ResolveRequest {
        ResolveRequest::new(Domain::Grid, self.context(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn building_context_matches_dashboard() {
        let tower = Building::find("skyline tower").unwrap();
        assert_eq!(
            tower.context(TimeRange::Daily, 4512.0),
            "Building: Skyline Tower, Range: Daily, Load: 4512kW"
        );
        let request = tower.request(TimeRange::Daily, 4512.5);
        assert_eq!(request.entity.as_deref(), Some("Skyline Tower"));
        assert!(request.context.ends_with("Load: 4512.5kW"));
    }

    #[test]
    fn route_context_matches_dashboard() {
        let route = Route::find("R102").unwrap();
        assert_eq!(
            route.context(TimeRange::Weekly),
            "Route: R102, Range: Weekly, Status: Delayed, Load: 92%"
        );
        assert_eq!(route.request(TimeRange::Weekly).domain, Domain::Transport);
    }

    #[test]
    fn grid_context_has_no_entity() {
        let snapshot = GridSnapshot {
            frequency_hz: 49.97,
            demand_mw: 862.0,
            battery_pct: 77.9,
        };
        let request = snapshot.request(TimeRange::Monthly);
        assert_eq!(
            request.context,
            "Range: Monthly, Frequency: 49.97Hz, Demand: 862MW, Battery: 77.9%"
        );
        assert!(request.entity.is_none());
    }

    #[test]
    fn time_range_parses() {
        assert_eq!("yearly".parse::<TimeRange>().unwrap(), TimeRange::Yearly);
        assert!("hourly".parse::<TimeRange>().is_err());
    }

    #[test]
    fn unknown_names_are_not_found() {
        assert!(Building::find("City Hall").is_none());
        assert!(Route::find("R999").is_none());
    }
}
