//! Every named quantity of the commercial mission, declared once in a shared registry.

use sizing_config::MissionConfig;
use sizing_core::constants::{G, GAMMA_AIR, R_AIR};
use sizing_model::{ModelError, Monomial, Registry, VectorVar};

use super::segments::{Family, SegmentLayout};

/// Handles on the mission quantities. Vectors indexed by slot have length `Nseg`; `dhft` and
/// `RngClimb` are indexed by climb-family position and `RngCruise` by cruise-family position.
#[derive(Debug, Clone)]
pub struct MissionVariables {
    // physical constants
    pub g: Monomial,
    pub gamma: Monomial,
    pub r: Monomial,

    // air properties
    pub a: VectorVar,
    pub rho: VectorVar,
    pub mu: VectorVar,
    pub t: VectorVar,

    // altitude
    pub hft: VectorVar,
    pub dhft: VectorVar,
    pub h: VectorVar,

    // time
    pub tmin: VectorVar,
    pub thr: VectorVar,

    // range
    pub rng_climb: VectorVar,
    pub rng_cruise: VectorVar,
    pub req_rng_cruise: Monomial,
    pub req_rng: Monomial,

    // weights
    pub w_e: Monomial,
    pub w_start: VectorVar,
    pub w_fuel: VectorVar,
    pub w_ftotal: Monomial,
    pub w_end: VectorVar,
    pub w_payload: Monomial,
    pub w_total: Monomial,

    // aerodynamics
    pub ld: VectorVar,
    pub ld_max: Monomial,
    pub cd0: Monomial,
    pub k: Monomial,
    pub s: Monomial,

    // speeds
    pub v: VectorVar,
    pub m: VectorVar,
    pub v_stall: Monomial,

    // climb
    pub rc: VectorVar,
    pub theta: VectorVar,

    // cruise
    pub z_bre: VectorVar,

    // engine
    pub tsfc: VectorVar,
    pub c1: Monomial,
    pub thrust: Monomial,

    // profile schedule
    pub alt10k: Monomial,
    pub alt1k: Monomial,
    pub climbspeed: Monomial,
    pub climbspeed2: Monomial,
    pub alt_cruise: Monomial,
}

impl MissionVariables {
    pub fn declare(
        registry: &mut Registry,
        layout: &SegmentLayout,
        config: &MissionConfig,
    ) -> Result<Self, ModelError> {
        let nseg = layout.total();
        let nclimb = layout.family_count(Family::Climb);
        let ncruise = layout.family_count(Family::Cruise);
        let aircraft = &config.aircraft;
        let profile = &config.profile;

        Ok(Self {
            g: registry.fixed("g", G, "m/s^2", "Gravitational Acceleration")?,
            gamma: registry.fixed(r"\gamma", GAMMA_AIR, "-", "Air Specific Heat Ratio")?,
            r: registry.fixed("R", R_AIR, "J/kg/K", "Gas Constant for Air")?,

            a: registry.vector("a", nseg, "m/s", "Speed of Sound")?,
            rho: registry.vector(r"\rho", nseg, "kg/m^3", "Air Density")?,
            mu: registry.vector(r"\mu", nseg, "kg/m/s", "Air Kinematic Viscosity")?,
            t: registry.vector("T", nseg, "K", "Air Temperature")?,

            hft: registry.vector("hft", nseg, "feet", "Altitude")?,
            dhft: registry.vector("dhft", nclimb, "feet", "Change in Altitude Per Climb Segment")?,
            h: registry.vector("h", nseg, "m", "Altitude")?,

            tmin: registry.vector("tmin", nseg, "min", "Flight Time in Minutes")?,
            thr: registry.vector("thr", nseg, "hour", "Flight Time in Hours")?,

            rng_climb: registry.vector("RngClimb", nclimb, "miles", "Segment Range During Climb")?,
            rng_cruise: registry.vector(
                "RngCruise",
                ncruise,
                "miles",
                "Segment Range During Cruise",
            )?,
            req_rng_cruise: registry.scalar("ReqRngCruise", "miles", "Required Cruise Range")?,
            req_rng: registry.fixed(
                "ReqRng",
                profile.range_miles,
                "miles",
                "Required Mission Range",
            )?,

            w_e: registry.scalar("W_e", "lbf", "Empty Weight of Aircraft")?,
            w_start: registry.vector("W_start", nseg, "lbf", "Segment Start Weight")?,
            w_fuel: registry.vector("W_fuel", nseg, "lbf", "Segment Fuel Weight")?,
            w_ftotal: registry.scalar("W_ftotal", "lbf", "Total Fuel Weight")?,
            w_end: registry.vector("W_end", nseg, "lbf", "Segment End Weight")?,
            w_payload: registry.scalar("W_payload", "lbf", "Aircraft Payload Weight")?,
            w_total: registry.scalar("W_total", "lbf", "Total Aircraft Weight")?,

            ld: registry.vector("L/D", nseg, "-", "Lift to Drag")?,
            ld_max: registry.fixed("L/D_max", aircraft.ld_max, "-", "Maximum Lift to Drag")?,
            cd0: registry.fixed("C_d0", aircraft.cd0, "-", "Aircraft Cd0")?,
            k: registry.fixed("K", aircraft.k, "-", "K for Parametric Drag Model")?,
            s: registry.fixed("S", aircraft.wing_area_m2, "m^2", "Wing Planform Area")?,

            v: registry.vector("V", nseg, "knots", "Aircraft Flight Speed")?,
            m: registry.vector("M", nseg, "-", "Aircraft Mach Number")?,
            v_stall: registry.fixed(
                "V_stall",
                aircraft.stall_speed_kts,
                "knots",
                "Aircraft Stall Speed",
            )?,

            rc: registry.vector("RC", nseg, "feet/min", "Rate of Climb/Decent")?,
            theta: registry.vector(r"\theta", nseg, "-", "Aircraft Climb Angle")?,

            z_bre: registry.vector("z_bre", nseg, "-", "Breguet Parameter")?,

            tsfc: registry.vector("TSFC", nseg, "lb/hr/lbf", "Thrust Specific Fuel Consumption")?,
            c1: registry.fixed("c1", aircraft.climb_tsfc, "lb/lbf/hr", "Climb TSFC")?,
            thrust: registry.fixed("thrust", aircraft.thrust_n, "N", "Engine Thrust")?,

            alt10k: registry.fixed(
                "alt10k",
                profile.climb1_ceiling_ft,
                "feet",
                "Altitude where 250kt Speed Limit Stops",
            )?,
            alt1k: registry.fixed(
                "alt1k",
                profile.start_altitude_ft,
                "feet",
                "Altitude where Climb Profile Starts",
            )?,
            climbspeed: registry.fixed(
                "climbspeed",
                profile.climb1_speed_limit_kts,
                "kts",
                "Speed Limit Under 10,000 ft",
            )?,
            climbspeed2: registry.fixed(
                "climbspeed2",
                profile.climb2_speed_limit_kts,
                "kts",
                "Speed Limit Above 10,000 ft",
            )?,
            alt_cruise: registry.fixed(
                "alt_cruise",
                profile.cruise_altitude_ft,
                "feet",
                "Cruise Altitude",
            )?,
        })
    }
}
