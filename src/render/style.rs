//! Palette, fonts, sizes and titles shared by every chart.

use plotters::style::RGBColor;

pub const STEELBLUE: RGBColor = RGBColor(70, 130, 180);
pub const CORAL: RGBColor = RGBColor(255, 127, 80);
pub const LIGHTBLUE: RGBColor = RGBColor(173, 216, 230);
pub const FLIER_GRAY: RGBColor = RGBColor(128, 128, 128);

/// The qualitative "Set2" palette.
pub const SET2: [RGBColor; 8] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
];

/// Five light-to-dark steps of the sequential "Blues" palette.
pub const BLUES: [RGBColor; 5] = [
    RGBColor(219, 233, 246),
    RGBColor(171, 207, 230),
    RGBColor(110, 170, 215),
    RGBColor(55, 135, 192),
    RGBColor(16, 92, 164),
];

pub const TITLE_FONT: u32 = 30;
pub const LABEL_FONT: u32 = 24;
pub const TICK_FONT: u32 = 18;

pub const BAR_HALF_WIDTH: f64 = 0.4;
pub const BOX_HALF_WIDTH: f64 = 0.25;
pub const HISTOGRAM_BINS: usize = 15;

pub const JITTER_SEED: u64 = 42;
pub const JITTER_AMPLITUDE: f64 = 0.2;

pub const DISTANCE_DESC: &str = "Distance to Nearest Recycling Facility (m)";
pub const SUPPORT_TITLE: &str = "Distribution of Support Level for MSW Charging Scheme";
pub const RELATIONSHIP_TITLE: &str = "Relationship: Distance to Recycling Facility vs. Recycling Effort";

// Figure sizes in pixels: inches at 150 dpi.
pub const BAR_SIZE: (u32, u32) = (1500, 900);
pub const PIE_SIZE: (u32, u32) = (1500, 1200);
pub const COMPARISON_SIZE: (u32, u32) = (2100, 900);
pub const GRID_SIZE: (u32, u32) = (2100, 1500);
pub const DISTRICT_SIZE: (u32, u32) = (1800, 900);
pub const CROSS_TAB_SIZE: (u32, u32) = (2100, 1200);
pub const DISTANCE_SIZE: (u32, u32) = (2100, 750);
pub const SCATTER_SIZE: (u32, u32) = (1500, 1050);
