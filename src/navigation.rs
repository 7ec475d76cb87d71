//! Navigation progress tracking.
//!
//! The tracker owns one session's route state and evaluates each
//! position fix: distance to the next turn, step advancement, off-route
//! detection, remaining distance/time, and arrival. It never performs
//! network work itself — a `RerouteNeeded` event asks the host to query
//! the routing provider and hand the replacement route back through
//! [`NavTracker::set_route`].
//!
//! Timestamps come in from the caller (milliseconds), so evaluating the
//! same fix twice produces the same answer and tests need no clock.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::LatLng;

/// Advance to the next step within this distance of the current turn.
pub const STEP_ADVANCE_RADIUS_M: f64 = 25.0;
/// Arrival triggers within this distance of the destination.
pub const ARRIVAL_RADIUS_M: f64 = 30.0;
/// Off-route when the nearest sampled route point is farther than this.
pub const OFF_ROUTE_THRESHOLD_M: f64 = 100.0;
/// Stop sampling once a route point this close is found.
pub const OFF_ROUTE_NEAR_M: f64 = 30.0;
/// Sample every Nth route coordinate for off-route estimation.
pub const OFF_ROUTE_SAMPLE_STRIDE: usize = 5;
/// Minimum gap between re-route requests.
pub const RECALC_COOLDOWN_MS: i64 = 10_000;
/// Measured speed below this falls back to the profile speed for ETA.
pub const MIN_MEASURED_SPEED_MPS: f64 = 1.0;
/// ETA fallback speed while walking.
pub const WALKING_FALLBACK_MPS: f64 = 1.4;
/// ETA fallback speed for road vehicles.
pub const DRIVING_FALLBACK_MPS: f64 = 8.3;

/// Vehicle profile for a navigation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum VehicleProfile {
    Car,
    Bus,
    Walk,
}

impl VehicleProfile {
    /// ETA fallback speed when no usable GPS speed is available.
    pub fn fallback_speed(&self) -> f64 {
        match self {
            VehicleProfile::Walk => WALKING_FALLBACK_MPS,
            VehicleProfile::Car | VehicleProfile::Bus => DRIVING_FALLBACK_MPS,
        }
    }

    /// Profile name understood by the routing provider.
    pub fn routing_profile(&self) -> &'static str {
        match self {
            VehicleProfile::Walk => "foot",
            VehicleProfile::Car | VehicleProfile::Bus => "driving",
        }
    }
}

/// One turn instruction of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TurnInstruction {
    pub text: String,
    /// Where the turn happens.
    pub target: LatLng,
    /// Index of `target` within the route coordinate sequence.
    pub coord_index: u32,
}

/// A resolved route from the routing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Route {
    pub coordinates: Vec<LatLng>,
    pub instructions: Vec<TurnInstruction>,
    /// Total distance in meters.
    pub total_distance: f64,
    /// Total time in seconds.
    pub total_time: f64,
}

/// Maneuver kind derived from instruction text; the UI maps these to
/// icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Maneuver {
    Arrive,
    SharpLeft,
    SharpRight,
    SlightLeft,
    SlightRight,
    Left,
    Right,
    Roundabout,
    UTurn,
    Straight,
    Merge,
}

impl Maneuver {
    /// Classify instruction text by keyword containment. Precedence
    /// follows the original UI: arrival first, sharp before slight
    /// before plain turns, straight as the default.
    pub fn from_text(text: &str) -> Self {
        let t = text.to_lowercase();
        if t.contains("destination") || t.contains("arrive") {
            Maneuver::Arrive
        } else if t.contains("sharp left") || t.contains("u-turn left") {
            Maneuver::SharpLeft
        } else if t.contains("sharp right") || t.contains("u-turn right") {
            Maneuver::SharpRight
        } else if t.contains("slight left") || t.contains("bear left") {
            Maneuver::SlightLeft
        } else if t.contains("slight right") || t.contains("bear right") {
            Maneuver::SlightRight
        } else if t.contains("left") {
            Maneuver::Left
        } else if t.contains("right") {
            Maneuver::Right
        } else if t.contains("roundabout") {
            Maneuver::Roundabout
        } else if t.contains("u-turn") {
            Maneuver::UTurn
        } else if t.contains("merge") {
            Maneuver::Merge
        } else {
            Maneuver::Straight
        }
    }
}

/// Navigation session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum NavState {
    Idle,
    Navigating,
    /// Terminal for the session; position updates are ignored until a
    /// new session starts.
    Arrived,
}

/// Events raised by one position update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum NavEvent {
    StepAdvanced { step_index: u32 },
    /// The host should query the routing provider and call `set_route`.
    RerouteNeeded,
    Arrived,
}

/// Evaluation of one position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Progress {
    pub state: NavState,
    /// Step index after this update.
    pub step_index: u32,
    /// The instruction that was current when the fix was evaluated
    /// (what the turn banner shows).
    pub instruction: Option<TurnInstruction>,
    /// Distance to that instruction's turn point, meters.
    pub distance_to_step: Option<f64>,
    /// Straight-line distance to the destination, meters.
    pub distance_to_destination: f64,
    /// Estimated remaining seconds at current or fallback speed.
    pub remaining_time: f64,
    pub events: Vec<NavEvent>,
}

/// Tracks progress along one navigation session.
///
/// Owns the route state exclusively; `start` and `exit` replace it
/// wholesale, so no stale timers or partial route data survive a
/// session change.
#[derive(Debug, Clone)]
pub struct NavTracker {
    state: NavState,
    destination: Option<LatLng>,
    profile: VehicleProfile,
    route: Option<Route>,
    step_index: usize,
    panned_away: bool,
    last_recalc_ms: i64,
}

impl Default for NavTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl NavTracker {
    pub fn new() -> Self {
        Self {
            state: NavState::Idle,
            destination: None,
            profile: VehicleProfile::Car,
            route: None,
            step_index: 0,
            panned_away: false,
            last_recalc_ms: 0,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn profile(&self) -> VehicleProfile {
        self.profile
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn panned_away(&self) -> bool {
        self.panned_away
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn destination(&self) -> Option<LatLng> {
        self.destination
    }

    /// Begin a session. Discards any previous session's route state and
    /// timers; the route itself arrives later via [`set_route`].
    ///
    /// [`set_route`]: NavTracker::set_route
    pub fn start(&mut self, destination: LatLng, profile: VehicleProfile, now_ms: i64) {
        self.state = NavState::Navigating;
        self.destination = Some(destination);
        self.profile = profile;
        self.route = None;
        self.step_index = 0;
        self.panned_away = false;
        self.last_recalc_ms = now_ms;
    }

    /// Install a resolved route (initial or re-route). Does not change
    /// session state; resets the step pointer and the recalculation
    /// timestamp.
    pub fn set_route(&mut self, route: Route, now_ms: i64) {
        if self.state == NavState::Idle {
            return;
        }
        self.step_index = 0;
        self.last_recalc_ms = now_ms;
        self.route = Some(route);
    }

    /// Switch the vehicle profile mid-session. The host re-routes.
    pub fn set_profile(&mut self, profile: VehicleProfile) {
        self.profile = profile;
    }

    /// Record that the host's map view was panned away (or recentered).
    pub fn set_panned_away(&mut self, panned: bool) {
        if self.state == NavState::Navigating {
            self.panned_away = panned;
        }
    }

    /// End the session and drop all route state.
    pub fn exit(&mut self) {
        self.state = NavState::Idle;
        self.destination = None;
        self.route = None;
        self.step_index = 0;
        self.panned_away = false;
        self.last_recalc_ms = 0;
    }

    /// Evaluate one position fix.
    ///
    /// Returns `None` while Idle or Arrived, and while Navigating
    /// without a route yet. Idempotent: re-evaluating the same fix at
    /// the same timestamp yields the same progress (a re-route request
    /// is the one rate-limited exception, by design).
    pub fn on_position_update(
        &mut self,
        position: LatLng,
        speed_mps: f64,
        now_ms: i64,
    ) -> Option<Progress> {
        if self.state != NavState::Navigating {
            return None;
        }
        let destination = self.destination?;
        let route_len = {
            let route = self.route.as_ref()?;
            if route.instructions.is_empty() {
                return None;
            }
            route.instructions.len()
        };

        let mut events = Vec::new();

        // Distance to the current turn; the banner keeps showing this
        // instruction even when the fix advances the pointer
        let instruction = self
            .route
            .as_ref()
            .and_then(|r| r.instructions.get(self.step_index))
            .cloned();
        let distance_to_step = instruction
            .as_ref()
            .map(|step| haversine_distance(&position, &step.target));

        if let Some(dist) = distance_to_step {
            if dist < STEP_ADVANCE_RADIUS_M && self.step_index < route_len - 1 {
                self.step_index += 1;
                events.push(NavEvent::StepAdvanced {
                    step_index: self.step_index as u32,
                });
            }
        }

        // Off-route estimation over sampled route coordinates
        if let Some(route) = self.route.as_ref() {
            if !route.coordinates.is_empty() {
                let mut min_dist = f64::INFINITY;
                for coord in route.coordinates.iter().step_by(OFF_ROUTE_SAMPLE_STRIDE) {
                    let d = haversine_distance(&position, coord);
                    if d < min_dist {
                        min_dist = d;
                    }
                    if d < OFF_ROUTE_NEAR_M {
                        break;
                    }
                }
                if min_dist > OFF_ROUTE_THRESHOLD_M
                    && now_ms - self.last_recalc_ms > RECALC_COOLDOWN_MS
                {
                    debug!(
                        "off route ({:.0}m from nearest sample), requesting re-route",
                        min_dist
                    );
                    self.last_recalc_ms = now_ms;
                    events.push(NavEvent::RerouteNeeded);
                }
            }
        }

        // Remaining distance/time toward the destination
        let distance_to_destination = haversine_distance(&position, &destination);
        let speed = if speed_mps > MIN_MEASURED_SPEED_MPS {
            speed_mps
        } else {
            self.profile.fallback_speed()
        };
        let remaining_time = distance_to_destination / speed;

        if distance_to_destination < ARRIVAL_RADIUS_M {
            self.state = NavState::Arrived;
            events.push(NavEvent::Arrived);
        }

        Some(Progress {
            state: self.state,
            step_index: self.step_index as u32,
            instruction,
            distance_to_step,
            distance_to_destination,
            remaining_time,
            events,
        })
    }
}
