//! Built-in floor plans that can be opened by identifier.
//!
//! The plans live in `assets/floorplans.json` and are embedded at compile time. Each
//! plan carries a partial [`FloorplanState`] plus the asset path of its image, which the
//! view layer loads asynchronously once the plan is opened.

use crate::error::FloorplanError;
use crate::state::FloorplanState;
use serde::Deserialize;
use std::sync::OnceLock;

const SEED_JSON: &str = include_str!("../assets/floorplans.json");

/// A seeded floor plan.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPlan {
    /// Identifier used on the command line or in the URL
    pub id: String,
    /// Human-friendly display name
    pub name: String,
    /// Image path relative to the assets directory
    pub image: Option<String>,
    /// Initial state of the plan
    #[serde(default)]
    pub state: FloorplanState,
}

/// Returns all seeded plans.
///
/// A malformed seed file is logged and treated as empty.
pub fn all_plans() -> &'static [SeedPlan] {
    static PLANS: OnceLock<Vec<SeedPlan>> = OnceLock::new();
    PLANS.get_or_init(|| {
        parse_plans(SEED_JSON).unwrap_or_else(|e| {
            log::error!("failed to parse seeded floor plans: {e}");
            Vec::new()
        })
    })
}

/// Parses a seed file. Device types this build does not know load as
/// [`DeviceType::Unknown`](crate::types::DeviceType::Unknown) instead of failing the file.
pub fn parse_plans(json: &str) -> Result<Vec<SeedPlan>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Looks up a seeded plan by identifier.
pub fn floorplan_by_id(id: &str) -> Result<&'static SeedPlan, FloorplanError> {
    all_plans()
        .iter()
        .find(|plan| plan.id == id)
        .ok_or_else(|| FloorplanError::UnknownFloorplan(id.to_string()))
}

/// Builds the starting state for an optional plan identifier.
///
/// Returns the state and the image asset still to be loaded. Missing or unknown
/// identifiers fall back to the empty planning state.
pub fn initial_state(id: Option<&str>) -> (FloorplanState, Option<String>) {
    let Some(id) = id else {
        return (FloorplanState::new(), None);
    };
    match floorplan_by_id(id) {
        Ok(plan) => {
            log::info!("opening floor plan {} ({})", plan.id, plan.name);
            (plan.state.clone(), plan.image.clone())
        }
        Err(e) => {
            log::warn!("{e}; starting with an empty floor plan");
            (FloorplanState::new(), None)
        }
    }
}

/// Extracts a plan identifier from command-line arguments (program name excluded).
pub fn floorplan_id_from_args<I>(args: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| arg.trim().to_string())
        .find(|arg| !arg.is_empty() && !arg.starts_with('-'))
}

/// Extracts a plan identifier from a URL path and fragment.
///
/// A non-empty `#id` fragment wins; otherwise the last non-empty path segment is used,
/// ignoring `index.html`.
pub fn floorplan_id_from_url(path: &str, hash: &str) -> Option<String> {
    let fragment = hash.trim_start_matches('#').trim();
    if !fragment.is_empty() {
        return Some(fragment.to_string());
    }
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != "index.html")
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceType, Mode};

    #[test]
    fn test_seed_file_parses() {
        let ids: Vec<&str> = all_plans().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unrecognised_device_type_keeps_seed_file() {
        let json = SEED_JSON.replacen(
            r#""device_type": "hub""#,
            r#""device_type": "thermostat""#,
            1,
        );
        let plans = parse_plans(&json).unwrap();
        assert_eq!(plans.len(), 3);

        let device = &plans[0].state.devices[0];
        assert_eq!(device.device_type, DeviceType::Unknown);
        assert_eq!(crate::catalog::style(device.device_type), &crate::catalog::BASE_STYLE);
        assert_eq!(plans[0].state.devices[1].device_type, DeviceType::DeskOccupancy);
    }

    #[test]
    fn test_planning_seed_has_placeholders() {
        let plan = floorplan_by_id("1").unwrap();
        assert_eq!(plan.state.mode, Mode::Planning);
        assert_eq!(plan.image.as_deref(), Some("floorplans/floorplan_1.png"));
        assert_eq!(plan.state.devices.len(), 2);
        assert!(plan.state.devices.iter().all(|d| d.is_placeholder()));
        assert_eq!(plan.state.devices[1].device_type, DeviceType::DeskOccupancy);
        assert_eq!(plan.state.devices[1].position, (500.0, 600.0));
    }

    #[test]
    fn test_view_seed_has_full_devices() {
        let plan = floorplan_by_id("3").unwrap();
        assert_eq!(plan.state.mode, Mode::View);
        let hub = &plan.state.devices[0];
        let details = hub.details().unwrap();
        assert_eq!(details.uuid, "HUB-0001");
        assert_eq!(details.battery, 92);
        assert!(plan.state.scale_ratio.is_some());
    }

    #[test]
    fn test_unknown_id_falls_back_to_empty_state() {
        assert!(matches!(
            floorplan_by_id("42"),
            Err(FloorplanError::UnknownFloorplan(_))
        ));
        let (state, image) = initial_state(Some("42"));
        assert!(state.devices.is_empty());
        assert!(image.is_none());
    }

    #[test]
    fn test_initial_state_for_known_id() {
        let (state, image) = initial_state(Some("2"));
        assert_eq!(state.devices.len(), 2);
        assert_eq!(image.as_deref(), Some("floorplans/floorplan_2.png"));
    }

    #[test]
    fn test_id_from_args_skips_flags() {
        let args = vec!["--verbose".to_string(), "3".to_string()];
        assert_eq!(floorplan_id_from_args(args), Some("3".to_string()));
        assert_eq!(floorplan_id_from_args(Vec::new()), None);
    }

    #[test]
    fn test_id_from_url() {
        assert_eq!(floorplan_id_from_url("/floorplan/2", ""), Some("2".into()));
        assert_eq!(floorplan_id_from_url("/index.html", "#3"), Some("3".into()));
        assert_eq!(floorplan_id_from_url("/", ""), None);
        assert_eq!(floorplan_id_from_url("/app/index.html", "#"), Some("app".into()));
    }
}
