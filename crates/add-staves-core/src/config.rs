use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::LayoutError;

/// DIN A4 width in points.
pub const A4_WIDTH: f64 = 595.0;
/// DIN A4 height in points.
pub const A4_HEIGHT: f64 = 842.0;
/// Largest staff count available in the empty-staff catalog.
pub const MAX_STAVES: u8 = 6;

/// Where the analysis staves go relative to each score system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StaffPosition {
    Above,
    #[default]
    Below,
}

impl FromStr for StaffPosition {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            _ => Err(()),
        }
    }
}

/// How systems are distributed over output pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// Fit as many systems per page as the page height allows.
    #[default]
    Auto,
    /// Put every system on one (possibly very tall) page.
    SinglePage,
    /// Explicit systems-per-page counts; once exhausted the remaining systems
    /// fall back to `Auto`.
    Groups(Vec<usize>),
}

impl Grouping {
    /// Maps the optional plan form: `None` is auto-fit, an empty plan is a
    /// single page, anything else is an explicit grouping.
    pub fn from_plan(plan: Option<Vec<usize>>) -> Self {
        match plan {
            None => Self::Auto,
            Some(groups) if groups.is_empty() => Self::SinglePage,
            Some(groups) => Self::Groups(groups),
        }
    }
}

impl FromStr for Grouping {
    type Err = LayoutError;

    /// Parses comma- and/or whitespace-separated positive counts ("4 5",
    /// "4,5", "4, 5"). Blank text means a single page.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut groups = Vec::new();
        for token in s.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            let count: usize = token
                .parse()
                .map_err(|_| LayoutError::InvalidGrouping(format!("'{}' is not a count", token)))?;
            if count == 0 {
                return Err(LayoutError::InvalidGrouping(
                    "group sizes must be positive".into(),
                ));
            }
            groups.push(count);
        }
        Ok(Self::from_plan(Some(groups)))
    }
}

/// Page geometry and layout policy. All lengths are PDF points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    /// Gap between a score system and its staff block.
    pub inner_spacing: f64,
    /// Gap between two consecutive systems on a page.
    pub outer_spacing: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    pub left_margin: f64,
    /// Nominal page height; pages grow taller when content does not fit.
    pub page_height: f64,
    pub page_width: f64,

    /// Keep nominal outer spacing and leave leftover space at the bottom of
    /// every page but the last.
    pub ragged: bool,
    /// Same as `ragged`, for the last page.
    #[serde(default = "default_ragged_last")]
    pub ragged_last: bool,
    /// Horizontal offset applied to staff blocks only.
    #[serde(default)]
    pub shift: f64,
    /// Suppress the staff block of the first system on the first page.
    #[serde(default)]
    pub drop_first: bool,
    /// Suppress the staff block of the last system on the last page.
    #[serde(default)]
    pub drop_last: bool,

    #[serde(default)]
    pub staff_position: StaffPosition,
    /// Number of staves in the staff block (selects the catalog entry).
    #[serde(default = "default_staves")]
    pub staves: u8,
    #[serde(default)]
    pub grouping: Grouping,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            inner_spacing: 20.0,
            outer_spacing: 30.0,
            top_margin: 30.0,
            bottom_margin: 40.0,
            left_margin: 20.0,
            page_height: A4_HEIGHT,
            page_width: A4_WIDTH,
            ragged: false,
            ragged_last: default_ragged_last(),
            shift: 0.0,
            drop_first: false,
            drop_last: false,
            staff_position: StaffPosition::default(),
            staves: default_staves(),
            grouping: Grouping::default(),
        }
    }
}

impl LayoutConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Page dimensions are not strictly positive
    /// - A spacing, margin or shift is not a finite number
    /// - The staff count is outside the catalog, or a group size is zero
    pub fn validate(&self) -> crate::error::Result<()> {
        let dims_ok = |v: f64| v.is_finite() && v > 0.0;
        if !dims_ok(self.page_width) || !dims_ok(self.page_height) {
            return Err(LayoutError::InvalidDimensions {
                width: self.page_width,
                height: self.page_height,
            });
        }

        let lengths = [
            ("inner_spacing", self.inner_spacing),
            ("outer_spacing", self.outer_spacing),
            ("top_margin", self.top_margin),
            ("bottom_margin", self.bottom_margin),
            ("left_margin", self.left_margin),
            ("shift", self.shift),
        ];
        for (name, value) in lengths {
            if !value.is_finite() {
                return Err(LayoutError::InvalidConfig(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
        }

        if self.staves > MAX_STAVES {
            return Err(LayoutError::InvalidConfig(format!(
                "staves ({}) exceeds the maximum of {}",
                self.staves, MAX_STAVES
            )));
        }

        if let Grouping::Groups(groups) = &self.grouping {
            if groups.contains(&0) {
                return Err(LayoutError::InvalidConfig(
                    "grouping entries must be positive".into(),
                ));
            }
        }

        Ok(())
    }
}

fn default_ragged_last() -> bool {
    true
}
fn default_staves() -> u8 {
    2
}

/// Builder for `LayoutConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct LayoutConfigBuilder {
    cfg: LayoutConfig,
}

impl LayoutConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: LayoutConfig::default(),
        }
    }
    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.cfg.page_width = width;
        self.cfg.page_height = height;
        self
    }
    pub fn inner_spacing(mut self, v: f64) -> Self {
        self.cfg.inner_spacing = v;
        self
    }
    pub fn outer_spacing(mut self, v: f64) -> Self {
        self.cfg.outer_spacing = v;
        self
    }
    pub fn top_margin(mut self, v: f64) -> Self {
        self.cfg.top_margin = v;
        self
    }
    pub fn bottom_margin(mut self, v: f64) -> Self {
        self.cfg.bottom_margin = v;
        self
    }
    pub fn left_margin(mut self, v: f64) -> Self {
        self.cfg.left_margin = v;
        self
    }
    pub fn ragged(mut self, v: bool) -> Self {
        self.cfg.ragged = v;
        self
    }
    pub fn ragged_last(mut self, v: bool) -> Self {
        self.cfg.ragged_last = v;
        self
    }
    pub fn shift(mut self, v: f64) -> Self {
        self.cfg.shift = v;
        self
    }
    pub fn drop_first(mut self, v: bool) -> Self {
        self.cfg.drop_first = v;
        self
    }
    pub fn drop_last(mut self, v: bool) -> Self {
        self.cfg.drop_last = v;
        self
    }
    pub fn staff_position(mut self, v: StaffPosition) -> Self {
        self.cfg.staff_position = v;
        self
    }
    pub fn staves(mut self, v: u8) -> Self {
        self.cfg.staves = v;
        self
    }
    pub fn grouping(mut self, v: Grouping) -> Self {
        self.cfg.grouping = v;
        self
    }
    pub fn build(self) -> LayoutConfig {
        self.cfg
    }
}

impl LayoutConfig {
    /// Create a fluent builder for `LayoutConfig`.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::new()
    }
}
