//! Dominant-mode selection on top of the matrix pencil decomposition.
//!
//! Modes are ranked by descending amplitude magnitude; the `num_modes`
//! strongest are kept and their pole phases (angular frequency · Δt) are
//! returned in ascending order, so single-mode extractions from different
//! records compare directly.

use serde::{Deserialize, Serialize};

use crate::matrix_pencil::{decompose, DecompositionResult, Mode, PencilParameters};
use crate::types::{RescaleError, RescaleResult, TimeSeries};

/// Result of a dominant-mode selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantModes {
    /// Phases of the dominant poles, ascending
    pub phases: Vec<f64>,
    /// Dominant modes, strongest first
    pub dominant: Vec<Mode>,
    /// The underlying decomposition (all poles)
    pub decomposition: DecompositionResult,
}

impl DominantModes {
    /// Number of poles the decomposition retained.
    pub fn modes_found(&self) -> usize {
        self.decomposition.num_modes()
    }

    /// Leading phase (smallest after the ascending sort).
    pub fn leading_phase(&self) -> Option<f64> {
        self.phases.first().copied()
    }

    /// True when the relative least-squares residual exceeds `bound`.
    pub fn exceeds_residual(&self, bound: f64) -> bool {
        self.decomposition.relative_residual > bound
    }
}

/// Select the `num_modes` strongest modes of `series`.
///
/// The pencil length is `pencil_length`; `max_poles` and `cutoff` are passed
/// through to the decomposer.
pub fn select_dominant_modes(
    series: &TimeSeries,
    num_modes: usize,
    pencil_length: usize,
    max_poles: usize,
    cutoff: f64,
) -> RescaleResult<DominantModes> {
    if num_modes == 0 {
        return Err(RescaleError::InvalidParameter(
            "num_modes must be >= 1".to_string(),
        ));
    }

    let decomposition = decompose(series, &PencilParameters::new(pencil_length, max_poles, cutoff))?;

    let mut ranked: Vec<Mode> = decomposition.modes().collect();
    // Stable sort: equal magnitudes keep decomposition order.
    ranked.sort_by(|a, b| {
        b.amplitude
            .norm()
            .partial_cmp(&a.amplitude.norm())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(num_modes);

    let mut phases: Vec<f64> = ranked.iter().map(Mode::phase).collect();
    phases.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    tracing::debug!(
        residual = decomposition.residual,
        relative_residual = decomposition.relative_residual,
        modes_found = decomposition.num_modes(),
        amplitudes = ?ranked.iter().map(|m| m.amplitude.norm()).collect::<Vec<_>>(),
        "dominant mode selection"
    );

    Ok(DominantModes {
        phases,
        dominant: ranked,
        decomposition,
    })
}
