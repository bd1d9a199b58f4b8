//! Built-in demo dataset used when the host supplies no usable plan or
//! forecast: a two-tier bowl with four gates and an evening event profile.

use bevy::prelude::*;

use crate::forecast::{Forecast, ForecastPoint, GateSeries};
use crate::venue::{Exit, Facility, VenuePlan, Zone};

const DEMO_DATE: &str = "2024-06-01";

/// Gate id, name, position, capacity, share of the crowd.
const GATES: [(&str, &str, [f32; 2], u32, f64); 4] = [
    ("gate-n", "North Gate", [50.0, 2.0], 1800, 0.35),
    ("gate-e", "East Gate", [97.0, 31.0], 1200, 0.25),
    ("gate-s", "South Gate", [50.0, 60.5], 1500, 0.25),
    ("gate-w", "West Gate", [3.0, 31.0], 900, 0.15),
];

fn zone(id: &str, name: &str, layer: u32, points: &[[f32; 2]]) -> Zone {
    Zone {
        id: id.to_string(),
        name: name.to_string(),
        layer,
        points: points.iter().map(|&[x, y]| Vec2::new(x, y)).collect(),
    }
}

pub fn demo_plan() -> VenuePlan {
    let zones = vec![
        zone("lower-north", "Lower North", 1, &[[30.0, 14.0], [70.0, 14.0], [62.0, 24.0], [38.0, 24.0]]),
        zone("lower-east", "Lower East", 1, &[[70.0, 14.0], [78.0, 20.0], [78.0, 42.0], [62.0, 38.0], [62.0, 24.0]]),
        zone("lower-south", "Lower South", 1, &[[38.0, 38.0], [62.0, 38.0], [70.0, 48.0], [30.0, 48.0]]),
        zone("lower-west", "Lower West", 1, &[[22.0, 20.0], [30.0, 14.0], [38.0, 24.0], [38.0, 38.0], [22.0, 42.0]]),
        // Upper tier wraps the bowl as a concave ring segment.
        zone("upper-north", "Upper North", 2, &[[20.0, 6.0], [80.0, 6.0], [86.0, 14.0], [70.0, 14.0], [30.0, 14.0], [14.0, 14.0]]),
        zone("upper-south", "Upper South", 2, &[[14.0, 48.0], [30.0, 48.0], [70.0, 48.0], [86.0, 48.0], [80.0, 56.0], [20.0, 56.0]]),
    ];
    let exits = GATES
        .iter()
        .map(|&(id, name, [x, y], capacity, _)| Exit {
            id: id.to_string(),
            name: name.to_string(),
            position: Vec2::new(x, y),
            capacity: Some(capacity),
        })
        .collect();
    let facilities = vec![
        Facility {
            id: "wc-ne".to_string(),
            position: Vec2::new(84.0, 10.0),
            label: Some("WC".to_string()),
        },
        Facility {
            id: "wc-sw".to_string(),
            position: Vec2::new(16.0, 52.0),
            label: Some("WC".to_string()),
        },
    ];
    VenuePlan {
        sections: 6,
        layers: 2,
        zones,
        exits,
        facilities,
    }
}

/// Bell-shaped load profile over `steps` buckets starting at `start_minute`
/// (minutes after midnight).
fn profile(start_minute: u32, steps: u32, peak: f64, share: f64) -> Vec<ForecastPoint> {
    let mid = f64::from(steps - 1) / 2.0;
    let width = f64::from(steps) / 4.0;
    (0..steps)
        .map(|i| {
            let minute = start_minute + i * 5;
            let z = (f64::from(i) - mid) / width;
            let yhat = (peak * share * (-0.5 * z * z).exp()).round();
            ForecastPoint {
                ds: format!("{DEMO_DATE}T{:02}:{:02}:00", minute / 60, minute % 60),
                yhat,
                yhat_lower: Some((yhat * 0.85).round()),
                yhat_upper: Some((yhat * 1.15).round()),
            }
        })
        .collect()
}

pub fn demo_forecast() -> Forecast {
    let series = |start_minute: u32, steps: u32, peak: f64| -> GateSeries {
        GATES
            .iter()
            .map(|&(id, _, _, _, share)| (id.to_string(), profile(start_minute, steps, peak, share)))
            .collect()
    };
    Forecast {
        // 18:00-19:55 doors open, 21:45-22:40 egress.
        arrivals: series(18 * 60, 24, 2400.0),
        exits: series(21 * 60 + 45, 12, 4200.0),
    }
}
