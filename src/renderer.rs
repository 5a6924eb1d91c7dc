//! # Moon Phase Debug Rendering
//!
//! Draws shadow angles as moon disks so a table can be checked by eye. Two
//! images are available:
//! - an angle grid with synthetic angles (0°, 10°, ... 350°) to check the
//!   disk drawing itself
//! - daily phases, one disk per day computed from the position provider,
//!   each labelled with its date
//!
//! ## Disk Model
//! A disk of radius `r` centered at the origin is split by the terminator,
//! the half-ellipse `x = -cos(a) * sqrt(r² - y²)`. Pixels right of it are
//! lit. Angles above 180° are folded back by 180° and the lit and dark colors
//! swap, which mirrors the phase to the other side of the disk.

use chrono::{DateTime, Duration, Utc};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};
use log::{debug, warn};
use std::f64::consts::PI;
use thiserror::Error;

use crate::canvas::Canvas;
use crate::config::DebugConfig;
use crate::geometry::{compute_shadow_angle, GeometryError};
use crate::provider::{Body, PositionProvider, ProviderError};

const LIT: Rgb888 = Rgb888::new(255, 255, 0);
const DARK: Rgb888 = Rgb888::new(128, 128, 128);
const LABEL: Rgb888 = Rgb888::new(255, 0, 0);

/// Why a phase could not be computed for one day.
#[derive(Error, Debug)]
pub enum PhaseError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Shadow angle in degrees at `instant`, straight from the provider.
pub fn shadow_angle_deg<P: PositionProvider + ?Sized>(
    provider: &P,
    instant: DateTime<Utc>,
) -> Result<f64, PhaseError> {
    let sun = provider.position_at(instant, Body::Sun)?;
    let earth = provider.position_at(instant, Body::Earth)?;
    let moon = provider.position_at(instant, Body::Moon)?;
    Ok(compute_shadow_angle(sun, earth, moon)?.to_degrees())
}

/// Draw a moon disk of `diameter` pixels with its top-left corner at `origin`.
///
/// The integer part of `angle_deg` is written in the corner, with `date` on
/// the line below when given.
pub fn draw_moon<D>(
    target: &mut D,
    origin: Point,
    diameter: u32,
    angle_deg: f64,
    date: Option<&str>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let mut a = angle_deg.to_radians();
    let (mut lit, mut dark) = (LIT, DARK);
    if a > PI {
        a -= PI;
        std::mem::swap(&mut lit, &mut dark);
    }

    let r = f64::from(diameter) / 2.0;
    let cos_a = a.cos();
    let size = diameter as i32;

    let pixels = (0..size).flat_map(move |py| {
        (0..size).filter_map(move |px| {
            // pixel centers relative to the disk center
            let x = f64::from(px) + 0.5 - r;
            let y = f64::from(py) + 0.5 - r;
            let span2 = r * r - y * y;
            if x * x > span2 {
                return None;
            }
            let color = if x >= -cos_a * span2.sqrt() { lit } else { dark };
            Some(Pixel(origin + Point::new(px, py), color))
        })
    });
    target.draw_iter(pixels)?;

    let style = MonoTextStyle::new(&FONT_6X10, LABEL);
    let angle_label = format!("{}", angle_deg as i32);
    Text::with_baseline(&angle_label, origin, style, Baseline::Top).draw(target)?;
    if let Some(date) = date {
        Text::with_baseline(date, origin + Point::new(0, 10), style, Baseline::Top)
            .draw(target)?;
    }

    Ok(())
}

/// Top-left corners of successive cells, filled row by row.
fn cell_origins(config: &DebugConfig) -> impl Iterator<Item = Point> + '_ {
    let mut x = 0u32;
    let mut y = 0u32;
    std::iter::from_fn(move || {
        let cell = Point::new(x as i32, y as i32);
        x += config.cell_spacing;
        if x + config.cell_size > config.width {
            x = 0;
            y += config.cell_spacing;
        }
        Some(cell)
    })
}

/// Grid of synthetic angles from 0° to 350°.
pub fn render_angle_grid(config: &DebugConfig) -> Canvas {
    let mut canvas = Canvas::new(config.width, config.height);
    let step = config.angle_step_deg.max(1) as usize;

    for (angle, origin) in (0..360).step_by(step).zip(cell_origins(config)) {
        draw_moon(&mut canvas, origin, config.cell_size, f64::from(angle), None)
            .unwrap_or_else(|never| match never {});
    }

    canvas
}

/// One disk per day starting at `start`, labelled with the date.
///
/// A day whose angle cannot be computed is logged and left blank.
pub fn render_daily_phases<P: PositionProvider + ?Sized>(
    provider: &P,
    start: DateTime<Utc>,
    config: &DebugConfig,
) -> Canvas {
    let mut canvas = Canvas::new(config.width, config.height);

    for (day, origin) in (0..config.days).zip(cell_origins(config)) {
        let instant = start + Duration::days(i64::from(day));
        let date = instant.format("%Y-%m-%d").to_string();

        match shadow_angle_deg(provider, instant) {
            Ok(angle) => {
                debug!("{date}: shadow angle {angle:.1}°");
                draw_moon(&mut canvas, origin, config.cell_size, angle, Some(&date))
                    .unwrap_or_else(|never| match never {});
            }
            Err(e) => warn!("Skipping {date}: {e}"),
        }
    }

    canvas
}
