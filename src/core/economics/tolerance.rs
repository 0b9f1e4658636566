#![allow(missing_docs)]
// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

//! Approximate equality of integer-scaled values.

#![forbid(unsafe_code)]

use crate::core::types::{scaled, ScaledAmount};
use thiserror::Error;
use tracing::warn;

/// [`CURRENCY_DELTA`] as a machine integer.
pub const CURRENCY_DELTA_UNITS: u64 = 1_000_000;
/// [`SHARE_DELTA`] as a machine integer.
pub const SHARE_DELTA_UNITS: u64 = 1_000_000_000_000;

/// Tolerance for token amounts, in the token's smallest unit.
pub const CURRENCY_DELTA: ScaledAmount = scaled(CURRENCY_DELTA_UNITS);
/// Tolerance for share amounts, in internal share units.
pub const SHARE_DELTA: ScaledAmount = scaled(SHARE_DELTA_UNITS);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToleranceError {
    #[error(
        "{}: {actual} not within {expected} ± {delta} [{lower}, {upper}]",
        .label.as_deref().unwrap_or("value")
    )]
    OutOfTolerance {
        label: Option<String>,
        actual: ScaledAmount,
        expected: ScaledAmount,
        delta: ScaledAmount,
        lower: ScaledAmount,
        upper: ScaledAmount,
    },
}

/// Accepted range `[center - delta, center + delta]`.
///
/// Bounds saturate at the numeric limits: a band reaching below zero accepts
/// every non-negative value down to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToleranceBand {
    pub center: ScaledAmount,
    pub delta: ScaledAmount,
}

impl ToleranceBand {
    pub fn new(center: ScaledAmount, delta: ScaledAmount) -> Self {
        Self { center, delta }
    }

    pub fn lower(&self) -> ScaledAmount {
        self.center.saturating_sub(self.delta)
    }

    pub fn upper(&self) -> ScaledAmount {
        self.center.saturating_add(self.delta)
    }

    pub fn contains(&self, actual: ScaledAmount) -> bool {
        self.lower() <= actual && actual <= self.upper()
    }
}

/// Succeeds iff `expected - delta <= actual <= expected + delta`.
pub fn check_within_tolerance(
    actual: ScaledAmount,
    expected: ScaledAmount,
    delta: ScaledAmount,
    label: Option<&str>,
) -> Result<(), ToleranceError> {
    let band = ToleranceBand::new(expected, delta);
    if band.contains(actual) {
        return Ok(());
    }
    warn!(
        label = label.unwrap_or("value"),
        %actual,
        %expected,
        %delta,
        "tolerance check failed"
    );
    Err(ToleranceError::OutOfTolerance {
        label: label.map(str::to_string),
        actual,
        expected,
        delta,
        lower: band.lower(),
        upper: band.upper(),
    })
}

/// Token amount check at [`CURRENCY_DELTA`].
pub fn check_currency(
    actual: ScaledAmount,
    expected: ScaledAmount,
    label: &str,
) -> Result<(), ToleranceError> {
    check_within_tolerance(actual, expected, CURRENCY_DELTA, Some(label))
}

/// Share amount check at [`SHARE_DELTA`].
pub fn check_shares(actual: ScaledAmount, expected: ScaledAmount) -> Result<(), ToleranceError> {
    check_within_tolerance(actual, expected, SHARE_DELTA, None)
}
