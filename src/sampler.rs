//! # Sampler / Table Builder
//!
//! Walks the fixed `start + i * period` schedule, asks the position provider
//! for the three bodies at each instant, derives and quantizes the shadow
//! angle (and optionally the moon's elevation) and assembles the table.
//!
//! ## Failure Policy
//! This is an offline build step. The first sample that cannot be computed
//! aborts the whole run with an error naming the sample index and instant;
//! no partial table is ever returned.
//!
//! ## Parallel Sampling
//! Samples are independent of each other. With the `parallel` feature,
//! [`build_table_parallel`] spreads them over the rayon thread pool and
//! collects each result at its own index, so the output is identical to
//! [`build_table`].

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::geometry::{compute_elevation, compute_shadow_angle};
use crate::provider::{Body, GeodeticLocation, PositionProvider};
use crate::table::{quantize_elevation, quantize_shadow, EphemerisTable, TableError};

/// When and how often to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Unix timestamp of the first sample
    pub start: u64,
    /// Seconds between samples
    pub period: u32,
    /// Number of samples
    pub count: usize,
    /// Also compute the moon elevation for the observer
    pub with_elevation: bool,
}

impl Schedule {
    /// Schedule whose first sample is the current time.
    ///
    /// The clock is read exactly once, so every sample is anchored to the same
    /// `start` value.
    pub fn starting_now(period: u32, count: usize, with_elevation: bool) -> Self {
        let now = Utc::now().timestamp().max(0) as u64;
        Self {
            start: now,
            period,
            count,
            with_elevation,
        }
    }

    /// Instant of sample `index`
    pub fn instant(&self, index: usize) -> Result<DateTime<Utc>, TableError> {
        let overflow = || TableError::InstantOverflow { index };

        let offset = u64::try_from(index)
            .ok()
            .and_then(|i| i.checked_mul(u64::from(self.period)))
            .ok_or_else(overflow)?;
        let unix = self.start.checked_add(offset).ok_or_else(overflow)?;
        let unix = i64::try_from(unix).map_err(|_| overflow())?;

        DateTime::from_timestamp(unix, 0).ok_or_else(overflow)
    }

    fn validate(&self) -> Result<(), TableError> {
        if self.period == 0 {
            return Err(TableError::Layout("period must be positive".into()));
        }
        if self.count == 0 {
            return Err(TableError::Layout("count must be positive".into()));
        }
        Ok(())
    }
}

/// One quantized sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sample {
    shadow: u16,
    elevation: Option<i8>,
}

/// Compute and quantize sample `index` of the schedule.
fn compute_sample<P: PositionProvider + ?Sized>(
    provider: &P,
    schedule: &Schedule,
    observer: &GeodeticLocation,
    index: usize,
) -> Result<Sample, TableError> {
    let instant = schedule.instant(index)?;
    let provider_error = |source| TableError::Provider {
        index,
        instant,
        source,
    };

    let sun = provider
        .position_at(instant, Body::Sun)
        .map_err(provider_error)?;
    let earth = provider
        .position_at(instant, Body::Earth)
        .map_err(provider_error)?;
    let moon = provider
        .position_at(instant, Body::Moon)
        .map_err(provider_error)?;

    let alpha = compute_shadow_angle(sun, earth, moon).map_err(|source| TableError::Geometry {
        index,
        instant,
        source,
    })?;
    let shadow = quantize_shadow(index, alpha)?;

    let elevation = if schedule.with_elevation {
        let horizon = provider
            .horizon_position_at(instant, Body::Moon, observer)
            .map_err(provider_error)?;
        Some(quantize_elevation(index, compute_elevation(&horizon))?)
    } else {
        None
    };

    Ok(Sample { shadow, elevation })
}

/// Split samples into the table's parallel arrays.
fn assemble(schedule: &Schedule, samples: Vec<Sample>) -> Result<EphemerisTable, TableError> {
    let shadow = samples.iter().map(|s| s.shadow).collect();
    let elevation = if schedule.with_elevation {
        Some(samples.iter().filter_map(|s| s.elevation).collect())
    } else {
        None
    };

    EphemerisTable::new(schedule.start, schedule.period, shadow, elevation)
}

/// Build the table by computing every sample in order on the current thread.
///
/// # Errors
/// Fails on the first sample the provider cannot serve, on degenerate body
/// geometry, or on a value outside its encoded range.
pub fn build_table<P: PositionProvider + ?Sized>(
    provider: &P,
    schedule: &Schedule,
    observer: &GeodeticLocation,
) -> Result<EphemerisTable, TableError> {
    schedule.validate()?;
    info!(
        "Sampling {} moon positions every {}s from {}",
        schedule.count, schedule.period, schedule.start
    );

    let mut samples = Vec::with_capacity(schedule.count);
    for index in 0..schedule.count {
        samples.push(compute_sample(provider, schedule, observer, index)?);

        if index > 0 && index % 8760 == 0 {
            debug!("  {index}/{} samples computed", schedule.count);
        }
    }

    assemble(schedule, samples)
}

/// Build the table with samples computed concurrently on the rayon pool.
///
/// The provider is only queried read-only. Results are collected by index,
/// so the table is identical to the one [`build_table`] returns.
#[cfg(feature = "parallel")]
pub fn build_table_parallel<P: PositionProvider + Sync + ?Sized>(
    provider: &P,
    schedule: &Schedule,
    observer: &GeodeticLocation,
) -> Result<EphemerisTable, TableError> {
    use rayon::prelude::*;

    schedule.validate()?;
    info!(
        "Sampling {} moon positions every {}s from {} on {} threads",
        schedule.count,
        schedule.period,
        schedule.start,
        rayon::current_num_threads()
    );

    let samples = (0..schedule.count)
        .into_par_iter()
        .map(|index| compute_sample(provider, schedule, observer, index))
        .collect::<Result<Vec<_>, _>>()?;

    assemble(schedule, samples)
}
