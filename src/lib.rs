#![warn(missing_docs)]
//! A Rust implementation of the Ion Hash algorithm.
//!
//! Ion Hash computes a digest over the logical content of an Ion value, so
//! two encodings of the same value always hash the same. Hashing happens as
//! a side effect of reading: [`HashReader`] wraps any [`IonReader`] and feeds
//! a [`Hasher`] as the caller moves through the values.
//!
//! The canonical serialization is the one defined by [Ion Hash]; the hash
//! function itself is pluggable through [`HashPrimitiveProvider`].
//!
//! # Example
//! ```
//! use ionhash::{Algorithm, Element, ElementReader, HashReader, HashSum, IonReader};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!   let values = [Element::list(vec![Element::from(1i64), Element::from(2i64)])];
//!   let mut hr = HashReader::new(ElementReader::new(&values), Algorithm::Sha256)?;
//!   // The list is hashed in full even though we never step into it.
//!   while hr.next()?.is_some() {}
//!   println!("Result: {}", hex::encode(hr.digest()?));
//!
//!   Ok(())
//! }
//! ```
//!
//! [Ion Hash]: https://amazon-ion.github.io/ion-hash/docs/spec.html

/// `error` holds the error type shared by the crate.
pub mod error;
/// `hash_reader` makes hashing a side effect of reading.
pub mod hash_reader;
/// `hasher` serializes values into nested hashing scopes.
pub mod hasher;
/// `primitive` holds the pluggable hash functions.
pub mod primitive;
/// `reader` defines the reader capability and an in-memory reader.
pub mod reader;
/// `representation` is the canonical byte encoding of scalar values.
pub mod representation;
/// `types` is the Ion value model.
pub mod types;

pub use error::{IonHashError, Result};
pub use hash_reader::{HashReader, HashSum};
pub use hasher::{HashValue, Hasher};
pub use primitive::{
    Algorithm, DigestPrimitive, DigestProvider, HashPrimitive, HashPrimitiveProvider,
    IdentityPrimitive, IdentityProvider, Sha256Provider, Sha3_256Provider,
};
pub use reader::{ElementReader, IonReader};
pub use types::{
    Decimal, Element, Int, IntSize, IonType, Symbol, Timestamp, TimestampPrecision, Value,
};

/// hash_element returns the Ion hash of a single in-memory element.
pub fn hash_element<P: HashPrimitiveProvider>(element: &Element, provider: P) -> Result<Vec<u8>> {
    let mut hr = HashReader::new(ElementReader::new(std::slice::from_ref(element)), provider)?;
    while hr.next()?.is_some() {}
    hr.digest()
}

/// sha256 returns the Ion hash of an element using SHA-256.
pub fn sha256(element: &Element) -> Result<Vec<u8>> {
    hash_element(element, Sha256Provider::default())
}

#[cfg(test)]
pub mod test {
    use super::*;
    use anyhow::Result;

    #[test]
    fn hash_element_matches_reader() -> Result<()> {
        let element = Element::structure(vec![("a", Element::from(1i64))]);
        let mut hr = HashReader::new(
            ElementReader::new(std::slice::from_ref(&element)),
            IdentityProvider,
        )?;
        hr.next()?;
        hr.next()?;
        assert_eq!(hash_element(&element, IdentityProvider)?, hr.digest()?);
        assert_eq!(
            sha256(&element)?,
            hash_element(&element, Algorithm::Sha256)?
        );
        Ok(())
    }

    #[test]
    fn sha256_hashes_the_serialization() -> Result<()> {
        let element = Element::from(5i64);
        let mut p = Sha256Provider::default().new_primitive();
        p.update(&hash_element(&element, IdentityProvider)?);
        assert_eq!(sha256(&element)?, p.digest());
        Ok(())
    }
}
