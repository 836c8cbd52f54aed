use tracing::debug;

use crate::error::{IonHashError, Result};
use crate::hasher::Hasher;
use crate::primitive::HashPrimitiveProvider;
use crate::reader::IonReader;
use crate::types::{Decimal, Int, IntSize, IonType, Symbol, Timestamp, Value};

/// HashSum exposes the hash of the values read so far.
pub trait HashSum {
    /// sum appends the current hash to b and returns the resulting vector.
    /// It does not change the underlying hash state.
    fn sum(&self, b: Vec<u8>) -> Result<Vec<u8>>;

    /// digest returns the current hash.
    fn digest(&self) -> Result<Vec<u8>> {
        self.sum(Vec::new())
    }
}

/// HashReader wraps an IonReader and hashes every value it moves past.
///
/// A value is hashed once the reader leaves it, either through `next` or
/// `step_out`, so after reading a top-level value the caller calls `next`
/// once more before asking for its digest. Containers the caller skips are
/// walked in full so that the digest never depends on how much of a
/// value was inspected.
pub struct HashReader<R, P: HashPrimitiveProvider> {
    reader: R,
    hasher: Hasher<P>,
    // Type of the value the last call to next landed on, if it still
    // has to be hashed.
    pending: Option<IonType>,
}

impl<R: IonReader, P: HashPrimitiveProvider> HashReader<R, P> {
    /// new wraps a reader positioned before its first top-level value.
    pub fn new(reader: R, provider: P) -> Result<Self> {
        if reader.depth() != 0 || reader.ion_type().is_some() {
            return Err(IonHashError::invalid_argument(
                "reader",
                format!(
                    "reader at depth {} with current value {:?}",
                    reader.depth(),
                    reader.ion_type()
                ),
            ));
        }
        Ok(HashReader {
            reader,
            hasher: Hasher::new(provider),
            pending: None,
        })
    }

    /// into_inner returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    // Reads and hashes everything left in the current container.
    fn traverse(&mut self) -> Result<()> {
        while self.next()?.is_some() {}
        Ok(())
    }
}

impl<R: IonReader, P: HashPrimitiveProvider> IonReader for HashReader<R, P> {
    fn next(&mut self) -> Result<Option<IonType>> {
        if let Some(ion_type) = self.pending {
            if ion_type.is_container() && !self.reader.is_null() {
                debug!(%ion_type, depth = self.reader.depth(), "hashing skipped container");
                self.step_in()?;
                self.step_out()?;
            } else {
                self.hasher.scalar(&self.reader)?;
            }
        }

        let next = self.reader.next()?;
        self.pending = next;
        Ok(next)
    }

    fn ion_type(&self) -> Option<IonType> {
        self.reader.ion_type()
    }

    fn is_null(&self) -> bool {
        self.reader.is_null()
    }

    fn depth(&self) -> usize {
        self.reader.depth()
    }

    fn step_in(&mut self) -> Result<()> {
        match self.pending {
            Some(t) if t.is_container() && !self.reader.is_null() => {}
            _ => {
                return Err(IonHashError::invalid_operation(
                    "HashReader",
                    "step_in",
                    "current value is not a non-null container",
                ))
            }
        }

        self.hasher.step_in(&self.reader)?;
        self.reader.step_in()?;
        self.pending = None;
        Ok(())
    }

    fn step_out(&mut self) -> Result<()> {
        if self.reader.depth() == 0 {
            return Err(IonHashError::invalid_operation(
                "HashReader",
                "step_out",
                "already at top level",
            ));
        }

        self.traverse()?;
        self.reader.step_out()?;
        self.hasher.step_out()?;
        self.pending = None;
        Ok(())
    }

    fn field_name(&self) -> Option<&str> {
        self.reader.field_name()
    }

    fn annotations(&self) -> &[String] {
        self.reader.annotations()
    }

    fn read_bool(&self) -> Result<bool> {
        self.reader.read_bool()
    }

    fn int_size(&self) -> Result<IntSize> {
        self.reader.int_size()
    }

    fn read_i64(&self) -> Result<i64> {
        self.reader.read_i64()
    }

    fn read_u64(&self) -> Result<u64> {
        self.reader.read_u64()
    }

    fn read_int(&self) -> Result<Int> {
        self.reader.read_int()
    }

    fn read_f64(&self) -> Result<f64> {
        self.reader.read_f64()
    }

    fn read_decimal(&self) -> Result<Decimal> {
        self.reader.read_decimal()
    }

    fn read_timestamp(&self) -> Result<Timestamp> {
        self.reader.read_timestamp()
    }

    fn read_string(&self) -> Result<String> {
        self.reader.read_string()
    }

    fn read_symbol(&self) -> Result<Symbol> {
        self.reader.read_symbol()
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        self.reader.read_bytes()
    }

    fn read_scalar(&self) -> Result<Value> {
        self.reader.read_scalar()
    }
}

impl<R: IonReader, P: HashPrimitiveProvider> HashSum for HashReader<R, P> {
    fn sum(&self, mut b: Vec<u8>) -> Result<Vec<u8>> {
        b.extend(self.hasher.digest()?);
        Ok(b)
    }
}
