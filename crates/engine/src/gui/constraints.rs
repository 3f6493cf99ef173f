use super::GuiError;

/// Placement of a child inside its parent. Each coordinate resolves to
/// `round(factor * parent_dimension + offset)`, rounding halves up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuiConstraints {
    x_factor: f64,
    y_factor: f64,
    w_factor: f64,
    h_factor: f64,
    x_offset: i32,
    y_offset: i32,
    w_offset: i32,
    h_offset: i32,
    z_order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offsets {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factors {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Factors {
    pub const NONE: Factors = Factors {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };
    pub const FILL: Factors = Factors {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
}

impl GuiConstraints {
    /// Fills the parent completely.
    pub const FULL: GuiConstraints = GuiConstraints {
        x_factor: 0.0,
        y_factor: 0.0,
        w_factor: 1.0,
        h_factor: 1.0,
        x_offset: 0,
        y_offset: 0,
        w_offset: 0,
        h_offset: 0,
        z_order: 0,
    };

    pub fn new(factors: Factors, offsets: Offsets, z_order: i32) -> Result<Self, GuiError> {
        for (axis, value) in [
            ("x", factors.x),
            ("y", factors.y),
            ("width", factors.width),
            ("height", factors.height),
        ] {
            if !value.is_finite() {
                return Err(GuiError::NonFiniteFactor { axis, value });
            }
        }
        Ok(Self {
            x_factor: factors.x,
            y_factor: factors.y,
            w_factor: factors.width,
            h_factor: factors.height,
            x_offset: offsets.x,
            y_offset: offsets.y,
            w_offset: offsets.width,
            h_offset: offsets.height,
            z_order,
        })
    }

    /// Absolute placement in parent pixels.
    pub fn absolute(x: i32, y: i32, width: i32, height: i32, z_order: i32) -> Self {
        Self {
            x_factor: 0.0,
            y_factor: 0.0,
            w_factor: 0.0,
            h_factor: 0.0,
            x_offset: x,
            y_offset: y,
            w_offset: width,
            h_offset: height,
            z_order,
        }
    }

    /// Full-width row: absolute `x`, `y` and `height`, width equal to the parent's plus
    /// `width_offset`.
    pub const fn row(x: i32, y: i32, width_offset: i32, height: i32, z_order: i32) -> Self {
        Self {
            x_factor: 0.0,
            y_factor: 0.0,
            w_factor: 1.0,
            h_factor: 0.0,
            x_offset: x,
            y_offset: y,
            w_offset: width_offset,
            h_offset: height,
            z_order,
        }
    }

    /// Parses each of `x`, `y`, `width`, `height` as `"<n>%"` (relative), `"<n>px"` or
    /// `"<n>"` (absolute pixels).
    pub fn parse(x: &str, y: &str, width: &str, height: &str, z_order: i32) -> Result<Self, GuiError> {
        let (x_factor, x_offset) = parse_term(x)?;
        let (y_factor, y_offset) = parse_term(y)?;
        let (w_factor, w_offset) = parse_term(width)?;
        let (h_factor, h_offset) = parse_term(height)?;
        Self::new(
            Factors {
                x: x_factor,
                y: y_factor,
                width: w_factor,
                height: h_factor,
            },
            Offsets {
                x: x_offset,
                y: y_offset,
                width: w_offset,
                height: h_offset,
            },
            z_order,
        )
    }

    /// Centres `lines` rows of `text` in the parent, nudged by `(x_offset, y_offset)`.
    /// Text cells are one pixel wide and two pixels tall.
    pub fn centered_text(text: &str, lines: i32, x_offset: i32, y_offset: i32, z_order: i32) -> Self {
        let half_len = text.chars().count() as i32 / 2;
        Self {
            x_factor: 0.5,
            y_factor: 0.5,
            w_factor: 1.0,
            h_factor: 1.0,
            x_offset: x_offset - half_len,
            y_offset: y_offset - lines,
            w_offset: 0,
            h_offset: 0,
            z_order,
        }
    }

    /// Same factors with every offset shifted by the given amounts.
    pub fn offset_by(mut self, dx: i32, dy: i32, dw: i32, dh: i32) -> Self {
        self.x_offset += dx;
        self.y_offset += dy;
        self.w_offset += dw;
        self.h_offset += dh;
        self
    }

    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    pub fn resolve_x(&self, parent_width: u32, _parent_height: u32) -> i32 {
        resolve(self.x_factor, parent_width, self.x_offset)
    }

    pub fn resolve_y(&self, _parent_width: u32, parent_height: u32) -> i32 {
        resolve(self.y_factor, parent_height, self.y_offset)
    }

    pub fn resolve_width(&self, parent_width: u32, _parent_height: u32) -> i32 {
        resolve(self.w_factor, parent_width, self.w_offset)
    }

    /// Uses the height factor and offset against the parent height.
    pub fn resolve_height(&self, _parent_width: u32, parent_height: u32) -> i32 {
        resolve(self.h_factor, parent_height, self.h_offset)
    }
}

fn resolve(factor: f64, dimension: u32, offset: i32) -> i32 {
    (factor * f64::from(dimension) + f64::from(offset) + 0.5).floor() as i32
}

fn parse_term(raw: &str) -> Result<(f64, i32), GuiError> {
    let trimmed = raw.trim();
    let invalid = |reason: &'static str| GuiError::InvalidConstraint {
        input: raw.to_string(),
        reason,
    };
    if let Some(percent) = trimmed.strip_suffix('%') {
        let value: f64 = percent
            .trim()
            .parse()
            .map_err(|_| invalid("expected a number before '%'"))?;
        return Ok((value / 100.0, 0));
    }
    let pixels = trimmed.strip_suffix("px").unwrap_or(trimmed);
    let value: i32 = pixels
        .trim()
        .parse()
        .map_err(|_| invalid("expected an integer pixel count"))?;
    Ok((0.0, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_of_hundred_resolves_to_fifty() {
        let constraints = GuiConstraints::parse("50%", "50%", "50%", "50%", 0).expect("valid");
        assert_eq!(constraints.resolve_x(100, 100), 50);
        assert_eq!(constraints.resolve_width(100, 100), 50);
        assert_eq!(constraints.resolve_height(100, 100), 50);
    }

    #[test]
    fn halves_round_up_consistently() {
        let constraints = GuiConstraints::parse("50%", "-50%", "10", "10px", 0).expect("valid");
        assert_eq!(constraints.resolve_x(5, 5), 3);
        assert_eq!(constraints.resolve_y(5, 5), -2);
        assert_eq!(constraints.resolve_width(5, 5), 10);
        assert_eq!(constraints.resolve_height(5, 5), 10);
    }

    #[test]
    fn height_uses_its_own_factor() {
        let constraints = GuiConstraints::new(
            Factors {
                x: 0.0,
                y: 0.0,
                width: 0.5,
                height: 0.25,
            },
            Offsets {
                x: 0,
                y: 0,
                width: 2,
                height: -1,
            },
            0,
        )
        .expect("finite");
        assert_eq!(constraints.resolve_width(40, 80), 22);
        assert_eq!(constraints.resolve_height(40, 80), 19);

        // Equal factors and offsets give the same height either way.
        let square = GuiConstraints::parse("0", "0", "25%", "25%", 0).expect("valid");
        assert_eq!(square.resolve_height(40, 80), 20);
        assert_eq!(resolve(0.25, 80, 0), square.resolve_height(40, 80));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            GuiConstraints::parse("abc", "0", "0", "0", 0),
            Err(GuiError::InvalidConstraint { .. })
        ));
        assert!(GuiConstraints::parse("1.5px", "0", "0", "0", 0).is_err());
        assert!(matches!(
            GuiConstraints::new(
                Factors {
                    x: f64::NAN,
                    ..Factors::NONE
                },
                Offsets {
                    x: 0,
                    y: 0,
                    width: 0,
                    height: 0
                },
                0
            ),
            Err(GuiError::NonFiniteFactor { axis: "x", .. })
        ));
    }

    #[test]
    fn centered_text_centres_on_parent() {
        let constraints = GuiConstraints::centered_text("hello!", 1, 0, 0, 3);
        assert_eq!(constraints.resolve_x(40, 20), 17);
        assert_eq!(constraints.resolve_y(40, 20), 9);
        assert_eq!(constraints.z_order(), 3);
    }

    #[test]
    fn row_spans_parent_width() {
        let constraints = GuiConstraints::row(2, 2, -2, 4, 0);
        assert_eq!(constraints.resolve_width(30, 8), 28);
        assert_eq!(constraints.resolve_height(30, 8), 4);
    }

    #[test]
    fn absolute_ignores_parent_size() {
        let constraints = GuiConstraints::absolute(1, 2, 3, 4, 0);
        assert_eq!(
            (
                constraints.resolve_x(100, 100),
                constraints.resolve_y(100, 100),
                constraints.resolve_width(100, 100),
                constraints.resolve_height(100, 100)
            ),
            (1, 2, 3, 4)
        );
    }
}
