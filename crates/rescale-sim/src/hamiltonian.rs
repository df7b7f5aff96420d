//! # Pauli Hamiltonians
//!
//! Qubit Hamiltonians as weighted sums of Pauli strings. Strings are written
//! left to right from qubit 0, so `"ZII"` is Z on qubit 0 of a 3-qubit system.
//!
//! Computational basis states are indexed with qubit 0 as the most
//! significant bit: state `0b100` of a 3-qubit system has qubit 0 in `|1⟩`.
//!
//! ```rust
//! use rescale_sim::hamiltonian::PauliHamiltonian;
//!
//! let h = PauliHamiltonian::local_z_field(2, 1.0).with_local_z_error(0.1);
//! assert!(h.is_diagonal());
//! // |00⟩: both Z eigenvalues are +1
//! assert!((h.diagonal_energy(0).unwrap() - 2.2).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::{SimError, SimResult};

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pauli {
    I,
    X,
    Y,
    Z,
}

impl Pauli {
    pub fn from_char(c: char) -> SimResult<Self> {
        match c.to_ascii_uppercase() {
            'I' => Ok(Pauli::I),
            'X' => Ok(Pauli::X),
            'Y' => Ok(Pauli::Y),
            'Z' => Ok(Pauli::Z),
            _ => Err(SimError::InvalidPauli(c)),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// True for operators diagonal in the computational basis.
    pub fn is_diagonal(self) -> bool {
        matches!(self, Pauli::I | Pauli::Z)
    }
}

/// Tensor product of single-qubit Paulis, one per qubit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PauliString(Vec<Pauli>);

impl PauliString {
    pub fn identity(num_qubits: usize) -> Self {
        Self(vec![Pauli::I; num_qubits])
    }

    /// `pauli` on `qubit`, identity elsewhere.
    pub fn single(num_qubits: usize, qubit: usize, pauli: Pauli) -> SimResult<Self> {
        check_qubit(qubit, num_qubits)?;
        Ok(Self::placed(num_qubits, &[qubit], pauli))
    }

    /// `pauli` on both `first` and `second`, identity elsewhere.
    pub fn pair(num_qubits: usize, first: usize, second: usize, pauli: Pauli) -> SimResult<Self> {
        check_qubit(first, num_qubits)?;
        check_qubit(second, num_qubits)?;
        Ok(Self::placed(num_qubits, &[first, second], pauli))
    }

    /// `pauli` on every qubit listed in `qubits`; indices past the width are ignored.
    fn placed(num_qubits: usize, qubits: &[usize], pauli: Pauli) -> Self {
        Self(
            (0..num_qubits)
                .map(|q| if qubits.contains(&q) { pauli } else { Pauli::I })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ops(&self) -> &[Pauli] {
        &self.0
    }

    pub fn is_diagonal(&self) -> bool {
        self.0.iter().all(|p| p.is_diagonal())
    }

    /// Eigenvalue (±1) of a diagonal string on basis state `index`.
    ///
    /// Callers must check [`is_diagonal`](Self::is_diagonal) first.
    fn z_eigenvalue(&self, index: usize) -> f64 {
        let n = self.0.len();
        let flips = self
            .0
            .iter()
            .enumerate()
            .filter(|(q, p)| **p == Pauli::Z && (index >> (n - 1 - q)) & 1 == 1)
            .count();
        if flips % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }
}

impl FromStr for PauliString {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars().map(Pauli::from_char).collect::<SimResult<Vec<_>>>().map(Self)
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.0 {
            write!(f, "{}", p.as_char())?;
        }
        Ok(())
    }
}

/// Weighted sum of equal-length Pauli strings.
#[derive(Debug, Clone, PartialEq)]
pub struct PauliHamiltonian {
    num_qubits: usize,
    terms: BTreeMap<PauliString, f64>,
}

impl PauliHamiltonian {
    /// Empty Hamiltonian on `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            terms: BTreeMap::new(),
        }
    }

    /// Build from `(string, coefficient)` pairs, accumulating repeats.
    pub fn from_terms<'a, I>(num_qubits: usize, terms: I) -> SimResult<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut h = Self::new(num_qubits);
        for (label, coefficient) in terms {
            h.add_term(label.parse()?, coefficient)?;
        }
        Ok(h)
    }

    /// Qubit ring model
    ///
    /// H = π·ν_z Σ Z_i + π·ν_x Σ X_i + π·J Σ_bonds (X_i X_j + Y_i Y_j)
    ///
    /// with n−1 bonds: (0,1), (1,2), …, (n−3,n−2) and the closing bond (0,n−1).
    pub fn ring_model(nu_z: f64, nu_x: f64, j: f64, num_qubits: usize) -> Self {
        let mut h = Self::new(num_qubits);
        for q in 0..num_qubits {
            h.accumulate(PauliString::placed(num_qubits, &[q], Pauli::Z), PI * nu_z);
            h.accumulate(PauliString::placed(num_qubits, &[q], Pauli::X), PI * nu_x);
        }
        for (a, b) in ring_bonds(num_qubits) {
            h.accumulate(PauliString::placed(num_qubits, &[a, b], Pauli::X), PI * j);
            h.accumulate(PauliString::placed(num_qubits, &[a, b], Pauli::Y), PI * j);
        }
        h
    }

    /// Uniform longitudinal field: H = h Σ Z_i.
    pub fn local_z_field(num_qubits: usize, h: f64) -> Self {
        Self::z_fields(&vec![h; num_qubits])
    }

    /// Per-qubit longitudinal fields: H = Σ h_i Z_i.
    pub fn z_fields(fields: &[f64]) -> Self {
        let n = fields.len();
        let mut h = Self::new(n);
        for (q, &field) in fields.iter().enumerate() {
            h.accumulate(PauliString::placed(n, &[q], Pauli::Z), field);
        }
        h
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Hilbert space dimension (2^n).
    pub fn dimension(&self) -> usize {
        1usize << self.num_qubits
    }

    pub fn terms(&self) -> impl Iterator<Item = (&PauliString, f64)> {
        self.terms.iter().map(|(s, &c)| (s, c))
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Coefficient of `string` (0 when absent).
    pub fn coefficient(&self, string: &PauliString) -> f64 {
        self.terms.get(string).copied().unwrap_or(0.0)
    }

    /// Add `coefficient` to the term for `string`.
    pub fn add_term(&mut self, string: PauliString, coefficient: f64) -> SimResult<()> {
        if string.len() != self.num_qubits {
            return Err(SimError::QubitCountMismatch {
                expected: self.num_qubits,
                actual: string.len(),
            });
        }
        self.accumulate(string, coefficient);
        Ok(())
    }

    fn accumulate(&mut self, string: PauliString, coefficient: f64) {
        *self.terms.entry(string).or_insert(0.0) += coefficient;
    }

    /// Systematic error model: H + strength·Σ Z_i.
    pub fn with_local_z_error(&self, strength: f64) -> Self {
        let mut h = self.clone();
        for q in 0..self.num_qubits {
            h.accumulate(PauliString::placed(self.num_qubits, &[q], Pauli::Z), strength);
        }
        h
    }

    /// H / c
    pub fn rescaled(&self, c: f64) -> Self {
        Self {
            num_qubits: self.num_qubits,
            terms: self.terms.iter().map(|(s, &v)| (s.clone(), v / c)).collect(),
        }
    }

    pub fn is_diagonal(&self) -> bool {
        self.terms.keys().all(PauliString::is_diagonal)
    }

    /// First term that is not diagonal in the computational basis.
    pub fn first_off_diagonal(&self) -> Option<&PauliString> {
        self.terms.keys().find(|s| !s.is_diagonal())
    }

    /// Energy of computational basis state `index` for an I/Z-only Hamiltonian.
    pub fn diagonal_energy(&self, index: usize) -> SimResult<f64> {
        if let Some(term) = self.first_off_diagonal() {
            return Err(SimError::NonDiagonal(term.to_string()));
        }
        if index >= self.dimension() {
            return Err(SimError::StateIndex {
                index,
                qubits: self.num_qubits,
            });
        }
        Ok(self
            .terms
            .iter()
            .map(|(s, &c)| c * s.z_eigenvalue(index))
            .sum())
    }
}

fn check_qubit(qubit: usize, num_qubits: usize) -> SimResult<()> {
    if qubit >= num_qubits {
        return Err(SimError::QubitIndex { qubit, qubits: num_qubits });
    }
    Ok(())
}

fn ring_bonds(n: usize) -> Vec<(usize, usize)> {
    (0..n.saturating_sub(1))
        .map(|i| {
            if i == 0 {
                (0, 1)
            } else if i + 2 < n {
                (i, i + 1)
            } else {
                (0, n - 1)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let s: PauliString = "xIzY".parse().unwrap();
        assert_eq!(s.ops(), &[Pauli::X, Pauli::I, Pauli::Z, Pauli::Y]);
        assert_eq!(s.to_string(), "XIZY");
        assert_eq!("XQ".parse::<PauliString>(), Err(SimError::InvalidPauli('Q')));
    }

    #[test]
    fn test_ring_model_terms() {
        let h = PauliHamiltonian::ring_model(4.0, 1.0, 4.0, 4);
        // 4 Z + 4 X + 3 bonds × (XX, YY)
        assert_eq!(h.num_terms(), 14);
        assert!((h.coefficient(&"ZIII".parse().unwrap()) - 4.0 * PI).abs() < 1e-12);
        assert!((h.coefficient(&"IIXI".parse().unwrap()) - PI).abs() < 1e-12);
        assert!((h.coefficient(&"XXII".parse().unwrap()) - 4.0 * PI).abs() < 1e-12);
        assert!((h.coefficient(&"IYYI".parse().unwrap()) - 4.0 * PI).abs() < 1e-12);
        assert!((h.coefficient(&"XIIX".parse().unwrap()) - 4.0 * PI).abs() < 1e-12);
        // (2,3) is not a bond
        assert_eq!(h.coefficient(&"IIXX".parse().unwrap()), 0.0);
        assert!(!h.is_diagonal());
    }

    #[test]
    fn test_ring_bonds_small() {
        assert_eq!(ring_bonds(2), vec![(0, 1)]);
        assert_eq!(ring_bonds(3), vec![(0, 1), (0, 2)]);
        assert!(ring_bonds(1).is_empty());
    }

    #[test]
    fn test_local_z_error_adds_and_creates() {
        let h = PauliHamiltonian::from_terms(2, [("ZI", 1.0), ("ZZ", 0.5)]).unwrap();
        let err = h.with_local_z_error(0.1);
        assert!((err.coefficient(&"ZI".parse().unwrap()) - 1.1).abs() < 1e-12);
        assert!((err.coefficient(&"IZ".parse().unwrap()) - 0.1).abs() < 1e-12);
        assert!((err.coefficient(&"ZZ".parse().unwrap()) - 0.5).abs() < 1e-12);
        // input Hamiltonian unchanged
        assert_eq!(h.coefficient(&"IZ".parse().unwrap()), 0.0);
    }

    #[test]
    fn test_rescaled() {
        let h = PauliHamiltonian::local_z_field(3, 2.0).rescaled(4.0);
        for (_, c) in h.terms() {
            assert!((c - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_diagonal_energy_bit_order() {
        let h = PauliHamiltonian::z_fields(&[1.0, 10.0, 100.0]);
        // qubit 0 is the most significant bit
        assert!((h.diagonal_energy(0b000).unwrap() - 111.0).abs() < 1e-12);
        assert!((h.diagonal_energy(0b100).unwrap() - 109.0).abs() < 1e-12);
        assert!((h.diagonal_energy(0b001).unwrap() - (-89.0)).abs() < 1e-12);
        assert!((h.diagonal_energy(0b111).unwrap() + 111.0).abs() < 1e-12);
    }

    #[test]
    fn test_diagonal_energy_zz_term() {
        let h = PauliHamiltonian::from_terms(2, [("ZZ", 1.0), ("II", 0.25)]).unwrap();
        assert!((h.diagonal_energy(0b00).unwrap() - 1.25).abs() < 1e-12);
        assert!((h.diagonal_energy(0b01).unwrap() + 0.75).abs() < 1e-12);
        assert!((h.diagonal_energy(0b11).unwrap() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_diagonal_energy_errors() {
        let ring = PauliHamiltonian::ring_model(1.0, 1.0, 1.0, 2);
        assert!(matches!(ring.diagonal_energy(0), Err(SimError::NonDiagonal(_))));

        let h = PauliHamiltonian::local_z_field(2, 1.0);
        assert_eq!(
            h.diagonal_energy(4),
            Err(SimError::StateIndex { index: 4, qubits: 2 })
        );
    }

    #[test]
    fn test_single_and_pair_constructors() {
        let s = PauliString::single(3, 1, Pauli::X).unwrap();
        assert_eq!(s.to_string(), "IXI");
        let p = PauliString::pair(4, 0, 3, Pauli::Y).unwrap();
        assert_eq!(p.to_string(), "YIIY");
    }

    #[test]
    fn test_qubit_index_out_of_range() {
        assert_eq!(
            PauliString::single(2, 2, Pauli::Z),
            Err(SimError::QubitIndex { qubit: 2, qubits: 2 })
        );
        assert_eq!(
            PauliString::pair(3, 0, 5, Pauli::X),
            Err(SimError::QubitIndex { qubit: 5, qubits: 3 })
        );
        assert!(PauliString::single(0, 0, Pauli::Z).is_err());
    }

    #[test]
    fn test_add_term_width_checked() {
        let mut h = PauliHamiltonian::new(2);
        let err = h.add_term("ZZZ".parse().unwrap(), 1.0).unwrap_err();
        assert_eq!(err, SimError::QubitCountMismatch { expected: 2, actual: 3 });
    }
}
