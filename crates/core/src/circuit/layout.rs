//! Fixed signal layout of the attribute threshold circuit.
//!
//! The order of [`PUBLIC_SIGNALS`] is the order of the Groth16 public-input
//! vector at setup, prove and verify time. [`COMMITMENT_PREIMAGE`] is the
//! order in which the commitment hash absorbs its inputs, both natively and
//! inside the circuit. Reordering either invalidates every key and proof.

/// Public signals, in public-input order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicSignal {
    PolicyId,
    Version,
    Commitment,
    Threshold,
}

/// Private signals, in allocation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivateSignal {
    Name,
    Age,
    Nation,
    Address,
    IdentityId,
    AttrValue,
    Did,
}

/// One element of the commitment preimage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreimageElement {
    Public(PublicSignal),
    Private(PrivateSignal),
}

pub const PUBLIC_SIGNALS: [PublicSignal; 4] = [
    PublicSignal::PolicyId,
    PublicSignal::Version,
    PublicSignal::Commitment,
    PublicSignal::Threshold,
];

pub const PRIVATE_SIGNALS: [PrivateSignal; 7] = [
    PrivateSignal::Name,
    PrivateSignal::Age,
    PrivateSignal::Nation,
    PrivateSignal::Address,
    PrivateSignal::IdentityId,
    PrivateSignal::AttrValue,
    PrivateSignal::Did,
];

pub const COMMITMENT_PREIMAGE: [PreimageElement; 9] = [
    PreimageElement::Public(PublicSignal::PolicyId),
    PreimageElement::Public(PublicSignal::Version),
    PreimageElement::Private(PrivateSignal::Name),
    PreimageElement::Private(PrivateSignal::Age),
    PreimageElement::Private(PrivateSignal::Nation),
    PreimageElement::Private(PrivateSignal::Address),
    PreimageElement::Private(PrivateSignal::IdentityId),
    PreimageElement::Private(PrivateSignal::AttrValue),
    PreimageElement::Private(PrivateSignal::Did),
];

/// The private signal the threshold is compared against (`threshold <= value`).
///
/// It must stay a raw, unhashed integer; see `identity::preprocess`.
pub const COMPARED_SIGNAL: PrivateSignal = PrivateSignal::Age;

impl PublicSignal {
    /// Position in the public-input vector
    pub fn index(self) -> usize {
        match self {
            PublicSignal::PolicyId => 0,
            PublicSignal::Version => 1,
            PublicSignal::Commitment => 2,
            PublicSignal::Threshold => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PublicSignal::PolicyId => "policy_id",
            PublicSignal::Version => "version",
            PublicSignal::Commitment => "commitment",
            PublicSignal::Threshold => "threshold",
        }
    }
}

impl PrivateSignal {
    /// Position among the private signals
    pub fn index(self) -> usize {
        match self {
            PrivateSignal::Name => 0,
            PrivateSignal::Age => 1,
            PrivateSignal::Nation => 2,
            PrivateSignal::Address => 3,
            PrivateSignal::IdentityId => 4,
            PrivateSignal::AttrValue => 5,
            PrivateSignal::Did => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrivateSignal::Name => "name",
            PrivateSignal::Age => "age",
            PrivateSignal::Nation => "nation",
            PrivateSignal::Address => "address",
            PrivateSignal::IdentityId => "identity_id",
            PrivateSignal::AttrValue => "attr_value",
            PrivateSignal::Did => "did",
        }
    }
}

/// Labels of the public inputs in declared order
pub fn public_input_labels() -> Vec<String> {
    PUBLIC_SIGNALS.iter().map(|s| s.label().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_match_declaration_order() {
        for (i, signal) in PUBLIC_SIGNALS.iter().enumerate() {
            assert_eq!(signal.index(), i, "{:?}", signal);
        }
        for (i, signal) in PRIVATE_SIGNALS.iter().enumerate() {
            assert_eq!(signal.index(), i, "{:?}", signal);
        }
    }

    #[test]
    fn test_preimage_covers_every_private_signal_once() {
        for signal in PRIVATE_SIGNALS {
            let count = COMMITMENT_PREIMAGE
                .iter()
                .filter(|e| **e == PreimageElement::Private(signal))
                .count();
            assert_eq!(count, 1, "{:?}", signal);
        }
    }

    #[test]
    fn test_preimage_excludes_commitment_and_threshold() {
        assert!(!COMMITMENT_PREIMAGE.contains(&PreimageElement::Public(PublicSignal::Commitment)));
        assert!(!COMMITMENT_PREIMAGE.contains(&PreimageElement::Public(PublicSignal::Threshold)));
    }

    #[test]
    fn test_public_labels() {
        assert_eq!(
            public_input_labels(),
            vec!["policy_id", "version", "commitment", "threshold"]
        );
    }
}
