use digest::{FixedOutput, Update};
use sha2::Sha256;
use sha3::Sha3_256;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::IonHashError;

/// HashPrimitive is an incremental hash function.
pub trait HashPrimitive {
    /// update feeds bytes into the running hash.
    fn update(&mut self, bytes: &[u8]);
    /// digest returns the hash of everything fed so far. It does not
    /// change the state, so the caller can keep writing and summing.
    fn digest(&self) -> Vec<u8>;
}

/// HashPrimitiveProvider creates a fresh, independent primitive per call.
pub trait HashPrimitiveProvider {
    /// The primitive type handed out.
    type Primitive: HashPrimitive;

    /// new_primitive returns a primitive with no input.
    fn new_primitive(&self) -> Self::Primitive;
}

/// IdentityPrimitive returns its input verbatim as the digest. It also
/// records every individual update so that tests can check framing.
#[derive(Debug, Clone, Default)]
pub struct IdentityPrimitive {
    bytes: Vec<u8>,
    updates: Vec<Vec<u8>>,
}

impl IdentityPrimitive {
    /// updates lists the byte slices passed to update, in order.
    pub fn updates(&self) -> &[Vec<u8>] {
        &self.updates
    }
}

impl HashPrimitive for IdentityPrimitive {
    fn update(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
        self.updates.push(bytes.to_vec());
    }

    fn digest(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// IdentityProvider hands out IdentityPrimitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProvider;

impl HashPrimitiveProvider for IdentityProvider {
    type Primitive = IdentityPrimitive;

    fn new_primitive(&self) -> IdentityPrimitive {
        IdentityPrimitive::default()
    }
}

/// DigestPrimitive adapts any RustCrypto hash to a HashPrimitive.
///
/// You should read the `D` generic as `Digest`; only the subtraits the
/// adapter needs are listed.
#[derive(Clone, Default)]
pub struct DigestPrimitive<D> {
    inner: D,
}

impl<D> HashPrimitive for DigestPrimitive<D>
where
    D: Update + FixedOutput + Clone,
{
    fn update(&mut self, bytes: &[u8]) {
        Update::update(&mut self.inner, bytes);
    }

    fn digest(&self) -> Vec<u8> {
        // Finalize a copy so that the running state is left untouched.
        self.inner.clone().finalize_fixed().to_vec()
    }
}

/// DigestProvider hands out DigestPrimitives over a default-constructed `D`.
pub struct DigestProvider<D> {
    _digest: PhantomData<D>,
}

impl<D> Default for DigestProvider<D> {
    fn default() -> Self {
        DigestProvider {
            _digest: PhantomData,
        }
    }
}

impl<D> HashPrimitiveProvider for DigestProvider<D>
where
    D: Update + FixedOutput + Clone + Default,
{
    type Primitive = DigestPrimitive<D>;

    fn new_primitive(&self) -> DigestPrimitive<D> {
        DigestPrimitive::default()
    }
}

/// SHA-256 primitives.
pub type Sha256Provider = DigestProvider<Sha256>;
/// SHA3-256 primitives.
pub type Sha3_256Provider = DigestProvider<Sha3_256>;

/// Algorithm selects a hash family at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// No hashing: the digest is the canonical serialization.
    Identity,
    #[default]
    Sha256,
    Sha3_256,
}

impl FromStr for Algorithm {
    type Err = IonHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "identity" => Ok(Algorithm::Identity),
            "sha256" | "sha-256" => Ok(Algorithm::Sha256),
            "sha3-256" | "sha3_256" => Ok(Algorithm::Sha3_256),
            _ => Err(IonHashError::invalid_argument("algorithm", s)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Identity => "identity",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha3_256 => "sha3-256",
        })
    }
}

/// AlgorithmPrimitive is the primitive created by an Algorithm.
#[derive(Clone)]
pub enum AlgorithmPrimitive {
    Identity(IdentityPrimitive),
    Sha256(DigestPrimitive<Sha256>),
    Sha3_256(DigestPrimitive<Sha3_256>),
}

impl HashPrimitive for AlgorithmPrimitive {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            AlgorithmPrimitive::Identity(p) => p.update(bytes),
            AlgorithmPrimitive::Sha256(p) => p.update(bytes),
            AlgorithmPrimitive::Sha3_256(p) => p.update(bytes),
        }
    }

    fn digest(&self) -> Vec<u8> {
        match self {
            AlgorithmPrimitive::Identity(p) => p.digest(),
            AlgorithmPrimitive::Sha256(p) => p.digest(),
            AlgorithmPrimitive::Sha3_256(p) => p.digest(),
        }
    }
}

impl HashPrimitiveProvider for Algorithm {
    type Primitive = AlgorithmPrimitive;

    fn new_primitive(&self) -> AlgorithmPrimitive {
        match self {
            Algorithm::Identity => AlgorithmPrimitive::Identity(IdentityPrimitive::default()),
            Algorithm::Sha256 => AlgorithmPrimitive::Sha256(DigestPrimitive::default()),
            Algorithm::Sha3_256 => AlgorithmPrimitive::Sha3_256(DigestPrimitive::default()),
        }
    }
}

impl<P: HashPrimitiveProvider + ?Sized> HashPrimitiveProvider for &P {
    type Primitive = P::Primitive;

    fn new_primitive(&self) -> P::Primitive {
        (**self).new_primitive()
    }
}
