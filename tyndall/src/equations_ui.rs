//! Equations sidebar and control panel
//!
//! The right sidebar lists the optics behind the current scene; the left panel holds the scene
//! selector, the inputs the scene reads and the live statistics readout.

use crate::scenes::{CupTarget, SceneKind, SceneParams, ViewMode};
use crate::stats::{FrameStats, Headlight};
use egui::{Color32, Context, RichText};

/// An equation with its name and formula
pub struct Equation {
    pub name: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
}

/// Draw the equations sidebar
pub fn draw_equations_sidebar(
    ctx: &Context,
    title: &str,
    equations: &[Equation],
    variables: &[(&str, &str)],
) {
    egui::SidePanel::right("equations_panel")
        .resizable(true)
        .default_width(280.0)
        .show(ctx, |ui| {
            ui.heading(RichText::new(title).color(Color32::LIGHT_BLUE));
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.collapsing(RichText::new("📐 Equations").strong(), |ui| {
                    for eq in equations {
                        ui.group(|ui| {
                            ui.label(RichText::new(eq.name).strong().color(Color32::YELLOW));
                            ui.label(RichText::new(eq.formula).monospace().color(Color32::WHITE));
                            ui.label(RichText::new(eq.description).small().italics());
                        });
                        ui.add_space(4.0);
                    }
                });

                ui.add_space(8.0);

                ui.collapsing(RichText::new("📖 Variables").strong(), |ui| {
                    egui::Grid::new("variables_grid")
                        .num_columns(2)
                        .spacing([10.0, 4.0])
                        .show(ui, |ui| {
                            for (symbol, meaning) in variables {
                                ui.label(RichText::new(*symbol).monospace().color(Color32::LIGHT_GREEN));
                                ui.label(*meaning);
                                ui.end_row();
                            }
                        });
                });
            });
        });
}

// ============================================================================
// Scattering in a beam (cups, lab bench, everyday examples)
// ============================================================================

pub const SCATTERING_EQUATIONS: &[Equation] = &[
    Equation {
        name: "Beer–Lambert Law",
        formula: "I(d) = I₀ · e^(−κ·ρ·d)",
        description: "Beam intensity after travelling d through the medium",
    },
    Equation {
        name: "Beam Divergence",
        formula: "w(d) = w₀ + 2d·tan(θ)",
        description: "Beam width grows with distance from the source",
    },
    Equation {
        name: "Gaussian Beam Profile",
        formula: "g(n) = e^(−k·n²),  n = 2r⊥/w(d)",
        description: "Illumination falls off across the beam",
    },
    Equation {
        name: "Rayleigh Scattering",
        formula: "I ∝ 1/λ⁴",
        description: "Blue light scatters ~5.6× more than red",
    },
    Equation {
        name: "Size Classes",
        formula: "d < 1 nm · 1–1000 nm · d > 1000 nm",
        description: "Solution · colloid · suspension",
    },
];

pub const SCATTERING_VARIABLES: &[(&str, &str)] = &[
    ("I₀", "Source intensity"),
    ("κ", "Extinction coefficient"),
    ("ρ", "Particle density"),
    ("d", "Distance along the beam"),
    ("w₀", "Beam width at the source"),
    ("θ", "Half-angle of the beam"),
    ("r⊥", "Distance from the beam axis"),
    ("k", "Profile sharpness"),
    ("λ", "Wavelength of light"),
];

// ============================================================================
// Headlights in fog
// ============================================================================

pub const FOG_EQUATIONS: &[Equation] = &[
    Equation {
        name: "Visibility (low beam)",
        formula: "V = max(45, 95 − 0.4ρ)",
        description: "Percent of the road visible",
    },
    Equation {
        name: "Visibility (high beam)",
        formula: "V = max(15, 90 − 0.75ρ)",
        description: "Backscatter costs visibility quickly",
    },
    Equation {
        name: "Glare",
        formula: "G = min(25, 5 + 0.2ρ)  ·  min(95, 15 + 0.8ρ)",
        description: "Low beam · high beam",
    },
    Equation {
        name: "Effective Range",
        formula: "R = max(5, 12 − 0.06ρ)  ·  max(2, 18 − 0.16ρ)",
        description: "Metres, low beam · high beam",
    },
    Equation {
        name: "Beam Length in Fog",
        formula: "L = L₀ · (1 − 0.6ρ/100)",
        description: "Extinction shortens the visible beam",
    },
];

pub const FOG_VARIABLES: &[(&str, &str)] = &[
    ("ρ", "Fog density in percent"),
    ("V", "Visibility in percent"),
    ("G", "Glare in percent"),
    ("R", "Effective range in metres"),
    ("L₀", "Beam length in clear air"),
];

/// Equations and variables shown next to `kind`
pub fn equations_for(kind: SceneKind) -> (&'static [Equation], &'static [(&'static str, &'static str)]) {
    match kind {
        SceneKind::Fog => (FOG_EQUATIONS, FOG_VARIABLES),
        _ => (SCATTERING_EQUATIONS, SCATTERING_VARIABLES),
    }
}

/// What the user asked for in the control panel this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelAction {
    SwitchScene(SceneKind),
    Reset,
}

/// Draw the control panel, editing `params` in place
pub fn draw_control_panel(
    ctx: &Context,
    kind: SceneKind,
    params: &mut SceneParams,
    stats: &FrameStats,
    elapsed_seconds: Option<f32>,
) -> Option<PanelAction> {
    let mut action = None;

    egui::SidePanel::left("control_panel")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading(RichText::new("Tyndall Effect").color(Color32::LIGHT_BLUE));
            ui.separator();

            let mut selected = kind;
            egui::ComboBox::from_label("Scene")
                .selected_text(kind.title())
                .show_ui(ui, |ui| {
                    for option in SceneKind::ALL {
                        ui.selectable_value(&mut selected, option, option.title());
                    }
                });
            if selected != kind {
                action = Some(PanelAction::SwitchScene(selected));
            }

            ui.add_space(8.0);
            let light = match kind {
                SceneKind::LabBench => "Laser on",
                SceneKind::Everyday(_) => "Active",
                _ => "Light on",
            };
            ui.checkbox(&mut params.light_on, light);

            match kind {
                SceneKind::TwoCups => {
                    ui.add(egui::Slider::new(&mut params.angle_deg, 30.0..=150.0).text("Angle °"));
                    ui.add(egui::Slider::new(&mut params.distance, 0.0..=100.0).text("Distance"));
                    ui.add(egui::Slider::new(&mut params.intensity, 10.0..=100.0).text("Intensity %"));
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut params.target, CupTarget::Solution, "Solution");
                        ui.radio_value(&mut params.target, CupTarget::Colloid, "Colloid");
                        ui.radio_value(&mut params.target, CupTarget::Both, "Both");
                    });
                    ui.checkbox(&mut params.microscopic, "Microscopic view");
                }
                SceneKind::Fog => {
                    ui.add(egui::Slider::new(&mut params.density, 10.0..=100.0).text("Fog density %"));
                    ui.add(egui::Slider::new(&mut params.speed, 0.0..=100.0).text("Speed"));
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut params.headlight, Headlight::Low, Headlight::Low.name());
                        ui.radio_value(&mut params.headlight, Headlight::High, Headlight::High.name());
                    });
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut params.view, ViewMode::External, "Outside");
                        ui.radio_value(&mut params.view, ViewMode::Driver, "Driver");
                    });
                }
                SceneKind::LabBench => {
                    ui.add(egui::Slider::new(&mut params.intensity, 10.0..=100.0).text("Intensity %"));
                    ui.add(
                        egui::Slider::new(&mut params.time_acceleration, 1.0..=10.0).text("Time ×"),
                    );
                }
                SceneKind::Everyday(_) => {}
            }

            ui.add_space(8.0);
            if ui.button("⟲ Reset").clicked() {
                action = Some(PanelAction::Reset);
            }

            ui.add_space(8.0);
            ui.separator();
            draw_readout(ui, stats, elapsed_seconds);
        });

    action
}

fn draw_readout(ui: &mut egui::Ui, stats: &FrameStats, elapsed_seconds: Option<f32>) {
    egui::Grid::new("stats_grid")
        .num_columns(2)
        .spacing([10.0, 4.0])
        .show(ui, |ui| {
            ui.label("Illuminated");
            ui.label(stats.illuminated.to_string());
            ui.end_row();
            ui.label("Scatter events");
            ui.label(stats.scatter_events.to_string());
            ui.end_row();
            if let Some(visibility) = stats.visibility {
                ui.label("Visibility");
                ui.label(format!("{}%", visibility));
                ui.end_row();
            }
            if let Some(glare) = stats.glare {
                ui.label("Glare");
                ui.label(format!("{}%", glare));
                ui.end_row();
            }
            if let Some(range) = stats.effective_range {
                ui.label("Effective range");
                ui.label(format!("{} m", range));
                ui.end_row();
            }
            if stats.backscatter_events > 0 {
                ui.label("Backscatter");
                ui.label(stats.backscatter_events.to_string());
                ui.end_row();
            }
            if let Some(seconds) = elapsed_seconds {
                ui.label("Elapsed");
                ui.label(format!("{:.0} s", seconds));
                ui.end_row();
            }
        });

    if let Some(message) = stats.danger.message() {
        ui.label(RichText::new(message).strong().color(Color32::RED));
    }
    if stats.wall_of_white {
        ui.label(RichText::new("Wall of white").italics().color(Color32::LIGHT_GRAY));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fog_shows_presentation_formulas() {
        let (equations, _) = equations_for(SceneKind::Fog);
        assert!(equations.iter().any(|eq| eq.formula.contains("90 − 0.75ρ")));
    }

    #[test]
    fn test_beam_scenes_show_beer_lambert() {
        for kind in SceneKind::ALL.into_iter().filter(|k| *k != SceneKind::Fog) {
            let (equations, variables) = equations_for(kind);
            assert!(equations.iter().any(|eq| eq.name.starts_with("Beer")));
            assert!(!variables.is_empty());
        }
    }
}
