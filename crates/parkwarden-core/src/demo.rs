//! Seed data for demos, replays and tests.

use std::time::Duration;

use crate::domain::bay::{Bay, BayState};
use crate::domain::zone::Zone;
use crate::lot_status::LotBook;

fn zone(id: &str, name: &str, address: &str, available: u32, total: u32, price: &str) -> Zone {
    Zone {
        id: id.to_string(),
        name: name.to_string(),
        address: Some(address.to_string()),
        available_count: available,
        total_count: total,
        price_per_hour: price.to_string(),
    }
}

pub fn demo_zones() -> Vec<Zone> {
    vec![
        zone("zone-a", "Zone A", "123 Main Street", 0, 40, "$2.50"),
        zone("zone-b", "Zone B", "456 Oak Avenue", 12, 60, "$3.00"),
        zone("zone-c", "Zone C", "789 Pine Road", 25, 50, "$2.00"),
        zone("zone-d", "Zone D", "321 Elm Street", 8, 30, "$3.50"),
    ]
}

fn minutes(m: u64) -> Option<Duration> {
    Some(Duration::from_secs(m * 60))
}

fn bay(number: &str, state: BayState) -> Bay {
    Bay::new(number.to_lowercase(), number, "zone-b", state)
}

fn session(plate: &str, warning: bool) -> BayState {
    BayState::NewSession {
        registration: plate.to_string(),
        has_warning: warning,
        remaining: None,
    }
}

/// The Zone B bays shown by the demo console.
pub fn demo_bays() -> Vec<Bay> {
    vec![
        bay("B-042", session("ABC-123", true)),
        bay("B-056", session("GHI-321", true)),
        bay(
            "B-129",
            BayState::Compliant {
                registration: "MNO-987".into(),
                remaining: minutes(90),
            },
        ),
        bay(
            "B-034",
            BayState::Overstay {
                registration: "DEF-456".into(),
                remaining: None,
            },
        ),
        bay("B-078", session("JKL-789", true)),
        bay("B-091", session("STU-234", true)),
        bay("B-143", session("VWX-876", true)),
        bay(
            "B-105",
            BayState::Overstay {
                registration: "PQR-567".into(),
                remaining: None,
            },
        ),
        bay("B-155", BayState::Empty),
        bay("B-167", BayState::Empty),
        bay("B-201", BayState::Empty),
        bay("B-202", session("ABC-222", false)),
    ]
}

pub fn demo_book() -> LotBook {
    LotBook::new(demo_bays())
}
