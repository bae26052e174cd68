//! Common utilities for the Tyndall visualizations
//!
//! This crate provides shared graphics setup, the screen-space camera, and the vertex format
//! used by every scene renderer.

pub mod graphics;
pub mod camera;

pub use graphics::*;
pub use camera::*;

/// Optical constants used by the scattering model
pub mod constants {
    /// Shortest visible wavelength in nm (violet)
    pub const LAMBDA_BLUE: f32 = 450.0;

    /// Longest visible wavelength in nm (red)
    pub const LAMBDA_RED: f32 = 700.0;

    /// Upper particle diameter for a true solution, in nm
    pub const SOLUTION_MAX_NM: f32 = 1.0;

    /// Upper particle diameter for a colloid, in nm; larger particles form suspensions
    pub const COLLOID_MAX_NM: f32 = 1000.0;

    /// Rayleigh ratio of blue to red scattering, (λ_red / λ_blue)^4
    pub fn rayleigh_blue_to_red() -> f32 {
        (LAMBDA_RED / LAMBDA_BLUE).powi(4)
    }
}

#[cfg(test)]
mod tests {
    use super::constants;

    #[test]
    fn test_blue_scatters_more_than_red() {
        let ratio = constants::rayleigh_blue_to_red();
        assert!(ratio > 5.0 && ratio < 6.5);
    }
}
