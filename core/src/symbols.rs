//! Identifier conventions shared by the model and the target graph.
//!
//! Target engines are frequently unable to round-trip non-ASCII identifiers, so unless a run opts
//! into unicode identifiers every derived identifier goes through [canonical]. Element values of a
//! vector carry the identifier of their parent joined to the element index by [INDEX_SEPARATOR].

use alloc::{borrow::Cow, string::String};

/// Separates a vector identifier from an element index, e.g. `pi_0`.
pub const INDEX_SEPARATOR: char = '_';

const GREEK: &[(char, &str)] = &[
    ('α', "alpha"),
    ('β', "beta"),
    ('γ', "gamma"),
    ('δ', "delta"),
    ('ε', "epsilon"),
    ('ζ', "zeta"),
    ('η', "eta"),
    ('θ', "theta"),
    ('ι', "iota"),
    ('κ', "kappa"),
    ('λ', "lambda"),
    ('μ', "mu"),
    ('ν', "nu"),
    ('ξ', "xi"),
    ('ο', "omicron"),
    ('π', "pi"),
    ('ρ', "rho"),
    ('σ', "sigma"),
    ('ς', "sigma"),
    ('τ', "tau"),
    ('υ', "upsilon"),
    ('φ', "phi"),
    ('χ', "chi"),
    ('ψ', "psi"),
    ('ω', "omega"),
    ('Γ', "Gamma"),
    ('Δ', "Delta"),
    ('Θ', "Theta"),
    ('Λ', "Lambda"),
    ('Ξ', "Xi"),
    ('Π', "Pi"),
    ('Σ', "Sigma"),
    ('Φ', "Phi"),
    ('Ψ', "Psi"),
    ('Ω', "Omega"),
];

fn spelled(c: char) -> Option<&'static str> {
    GREEK.iter().find(|(g, _)| *g == c).map(|(_, name)| *name)
}

/// Returns `id` with every Greek letter spelled out in ASCII.
///
/// Borrows when there is nothing to replace.
pub fn canonical(id: &str) -> Cow<'_, str> {
    if !id.chars().any(|c| spelled(c).is_some()) {
        return Cow::Borrowed(id);
    }
    let mut out = String::with_capacity(id.len() + 8);
    for c in id.chars() {
        match spelled(c) {
            Some(name) => out.push_str(name),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Splits an element identifier like `x_3` into `("x", 3)`.
///
/// Only the last separator counts, and the suffix must be a plain decimal index, so `rate_a` and
/// `_3` are not element identifiers.
pub fn split_element_id(id: &str) -> Option<(&str, usize)> {
    let (parent, index) = id.rsplit_once(INDEX_SEPARATOR)?;
    if parent.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((parent, index.parse().ok()?))
}

/// Joins a vector identifier and an element index.
pub fn element_id(parent: &str, index: usize) -> String {
    alloc::format!("{parent}{INDEX_SEPARATOR}{index}")
}
