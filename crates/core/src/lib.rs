//! Core units, constants, and shared primitives for the commercial sizing workspace.

pub mod dimension;

pub use dimension::{Dimension, Unit, UnitError};

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Gravitational acceleration used by the mission model (m/s²).
    pub const G: f64 = 9.81;
    /// Ratio of specific heats for air.
    pub const GAMMA_AIR: f64 = 1.4;
    /// Specific gas constant for air (J/kg/K).
    pub const R_AIR: f64 = 287.0;
}

/// Basic unit conversion helpers.
pub mod units {
    /// Metres per international foot.
    pub const FT_TO_M: f64 = 0.3048;
    /// Metres per statute mile.
    pub const MILE_TO_M: f64 = 1_609.344;
    /// Metres per nautical mile.
    pub const NMI_TO_M: f64 = 1_852.0;
    /// Metres per second per knot.
    pub const KNOT_TO_M_S: f64 = NMI_TO_M / 3_600.0;
    /// Kilograms per avoirdupois pound.
    pub const LB_TO_KG: f64 = 0.453_592_37;
    /// Newtons per pound-force.
    pub const LBF_TO_N: f64 = 4.448_221_615_260_5;

    /// Convert feet to metres.
    #[inline]
    pub fn ft_to_m(v: f64) -> f64 {
        v * FT_TO_M
    }

    /// Convert knots to metres per second.
    #[inline]
    pub fn kts_to_ms(v: f64) -> f64 {
        v * KNOT_TO_M_S
    }

    /// Convert pound-force to newtons.
    #[inline]
    pub fn lbf_to_n(v: f64) -> f64 {
        v * LBF_TO_N
    }
}

/// Truncated series for `exp(z) - 1`, the form used by the discretised Breguet range relation.
///
/// Returns `z + z²/2! + ... + zⁿ/n!` for `nterm = n` terms.
pub fn te_exp_minus1(z: f64, nterm: usize) -> f64 {
    let mut term = 1.0;
    let mut total = 0.0;
    for k in 1..=nterm {
        term *= z / k as f64;
        total += term;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn truncated_exponential_approaches_exp() {
        assert_eq!(te_exp_minus1(0.0, 3), 0.0);
        let z: f64 = 0.1;
        assert_abs_diff_eq!(te_exp_minus1(z, 3), z.exp_m1(), epsilon = 1e-5);
        assert!(te_exp_minus1(z, 3) < z.exp_m1());
        assert_relative_eq!(te_exp_minus1(z, 10), z.exp_m1(), max_relative = 1e-14);
    }

    #[test]
    fn conversions_match_definitions() {
        assert_relative_eq!(units::ft_to_m(10_000.0), 3_048.0, max_relative = 1e-12);
        assert_abs_diff_eq!(units::kts_to_ms(250.0), 128.611, epsilon = 1e-3);
        assert_relative_eq!(units::lbf_to_n(1.0), units::LB_TO_KG * 9.806_65, max_relative = 1e-12);
    }
}
