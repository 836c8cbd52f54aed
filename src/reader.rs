use crate::error::{IonHashError, Result};
use crate::types::{Decimal, Element, Int, IntSize, IonType, Symbol, Timestamp, Value};

/// IonReader is a forward-only reader over a stream of Ion values.
///
/// Values are visited one container level at a time: `next` moves to the
/// following sibling, `step_in` descends into the current container and
/// `step_out` returns to the parent level, skipping whatever is left.
pub trait IonReader {
    /// next advances to the next value at the current depth and returns
    /// its type, or None at the end of the container or stream.
    fn next(&mut self) -> Result<Option<IonType>>;

    /// ion_type returns the type of the current value, None if there is none.
    fn ion_type(&self) -> Option<IonType>;

    /// is_null reports whether the current value is a (typed) null.
    fn is_null(&self) -> bool;

    /// depth is the number of containers stepped into.
    fn depth(&self) -> usize;

    /// step_in descends into the current container.
    fn step_in(&mut self) -> Result<()>;

    /// step_out returns to the parent level.
    fn step_out(&mut self) -> Result<()>;

    /// field_name is the current value's field name, inside a struct only.
    fn field_name(&self) -> Option<&str>;

    fn annotations(&self) -> &[String];

    fn read_bool(&self) -> Result<bool>;

    /// int_size returns the narrowest width able to hold the current int.
    fn int_size(&self) -> Result<IntSize>;

    fn read_i64(&self) -> Result<i64>;

    fn read_u64(&self) -> Result<u64>;

    fn read_int(&self) -> Result<Int>;

    fn read_f64(&self) -> Result<f64>;

    fn read_decimal(&self) -> Result<Decimal>;

    fn read_timestamp(&self) -> Result<Timestamp>;

    /// read_string returns the text of a string or a symbol.
    fn read_string(&self) -> Result<String>;

    fn read_symbol(&self) -> Result<Symbol>;

    /// read_bytes returns the content of a blob or a clob.
    fn read_bytes(&self) -> Result<Vec<u8>>;

    /// read_scalar reads the current value as a Value. Containers are
    /// rejected unless null.
    fn read_scalar(&self) -> Result<Value> {
        let ion_type = self.ion_type().ok_or_else(|| {
            IonHashError::invalid_operation("IonReader", "read_scalar", "no current value")
        })?;
        if self.is_null() {
            return Ok(Value::Null(ion_type));
        }
        let value = match ion_type {
            IonType::Null => Value::Null(IonType::Null),
            IonType::Bool => Value::Bool(self.read_bool()?),
            IonType::Int => Value::Int(self.read_int()?),
            IonType::Float => Value::Float(self.read_f64()?),
            IonType::Decimal => Value::Decimal(self.read_decimal()?),
            IonType::Timestamp => Value::Timestamp(self.read_timestamp()?),
            IonType::Symbol => Value::Symbol(self.read_symbol()?),
            IonType::String => Value::String(self.read_string()?),
            IonType::Clob => Value::Clob(self.read_bytes()?),
            IonType::Blob => Value::Blob(self.read_bytes()?),
            IonType::List | IonType::SExp | IonType::Struct => {
                return Err(IonHashError::invalid_operation(
                    "IonReader",
                    "read_scalar",
                    format!("current value is a non-null {ion_type}"),
                ))
            }
        };
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy)]
enum Level<'a> {
    Sequence(&'a [Element]),
    Fields(&'a [(String, Element)]),
}

#[derive(Debug, Clone, Copy)]
struct Entry<'a> {
    field_name: Option<&'a str>,
    element: &'a Element,
}

/// ElementReader reads a slice of in-memory elements as an Ion stream.
#[derive(Debug, Clone)]
pub struct ElementReader<'a> {
    level: Level<'a>,
    cursor: usize,
    current: Option<Entry<'a>>,
    parents: Vec<(Level<'a>, usize)>,
}

impl<'a> ElementReader<'a> {
    /// new returns a reader positioned before the first element.
    pub fn new(elements: &'a [Element]) -> Self {
        ElementReader {
            level: Level::Sequence(elements),
            cursor: 0,
            current: None,
            parents: Vec::new(),
        }
    }

    fn value(&self, method: &'static str) -> Result<&'a Value> {
        match self.current {
            Some(entry) => Ok(entry.element.value()),
            None => Err(IonHashError::invalid_operation(
                "ElementReader",
                method,
                "no current value",
            )),
        }
    }

    fn mismatch(&self, expected: IonType) -> IonHashError {
        let found = match self.current {
            Some(entry) if entry.element.is_null() => format!("null.{}", entry.element.ion_type()),
            Some(entry) => entry.element.ion_type().to_string(),
            None => "nothing".to_string(),
        };
        IonHashError::TypeMismatch { expected, found }
    }

    fn int(&self, method: &'static str) -> Result<&'a Int> {
        match self.value(method)? {
            Value::Int(i) => Ok(i),
            _ => Err(self.mismatch(IonType::Int)),
        }
    }
}

impl<'a> IonReader for ElementReader<'a> {
    fn next(&mut self) -> Result<Option<IonType>> {
        let entry = match self.level {
            Level::Sequence(items) => items.get(self.cursor).map(|element| Entry {
                field_name: None,
                element,
            }),
            Level::Fields(fields) => fields.get(self.cursor).map(|(name, element)| Entry {
                field_name: Some(name.as_str()),
                element,
            }),
        };
        if entry.is_some() {
            self.cursor += 1;
        }
        self.current = entry;
        Ok(self.ion_type())
    }

    fn ion_type(&self) -> Option<IonType> {
        self.current.map(|entry| entry.element.ion_type())
    }

    fn is_null(&self) -> bool {
        self.current.map_or(false, |entry| entry.element.is_null())
    }

    fn depth(&self) -> usize {
        self.parents.len()
    }

    fn step_in(&mut self) -> Result<()> {
        let level = match self.value("step_in")? {
            Value::List(items) | Value::SExp(items) => Level::Sequence(items),
            Value::Struct(fields) => Level::Fields(fields),
            other => {
                return Err(IonHashError::invalid_operation(
                    "ElementReader",
                    "step_in",
                    format!("cannot step into {:?}", other.ion_type()),
                ))
            }
        };
        self.parents.push((self.level, self.cursor));
        self.level = level;
        self.cursor = 0;
        self.current = None;
        Ok(())
    }

    fn step_out(&mut self) -> Result<()> {
        let (level, cursor) = self.parents.pop().ok_or_else(|| {
            IonHashError::invalid_operation("ElementReader", "step_out", "already at top level")
        })?;
        self.level = level;
        self.cursor = cursor;
        self.current = None;
        Ok(())
    }

    fn field_name(&self) -> Option<&str> {
        self.current.and_then(|entry| entry.field_name)
    }

    fn annotations(&self) -> &[String] {
        match self.current {
            Some(entry) => entry.element.annotations(),
            None => &[],
        }
    }

    fn read_bool(&self) -> Result<bool> {
        match self.value("read_bool")? {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.mismatch(IonType::Bool)),
        }
    }

    fn int_size(&self) -> Result<IntSize> {
        Ok(self.int("int_size")?.size())
    }

    fn read_i64(&self) -> Result<i64> {
        let i = self.int("read_i64")?;
        i.as_i64().ok_or_else(|| {
            IonHashError::invalid_operation("ElementReader", "read_i64", "int does not fit in i64")
        })
    }

    fn read_u64(&self) -> Result<u64> {
        let i = self.int("read_u64")?;
        i.as_u64().ok_or_else(|| {
            IonHashError::invalid_operation("ElementReader", "read_u64", "int does not fit in u64")
        })
    }

    fn read_int(&self) -> Result<Int> {
        Ok(self.int("read_int")?.clone())
    }

    fn read_f64(&self) -> Result<f64> {
        match self.value("read_f64")? {
            Value::Float(f) => Ok(*f),
            _ => Err(self.mismatch(IonType::Float)),
        }
    }

    fn read_decimal(&self) -> Result<Decimal> {
        match self.value("read_decimal")? {
            Value::Decimal(d) => Ok(d.clone()),
            _ => Err(self.mismatch(IonType::Decimal)),
        }
    }

    fn read_timestamp(&self) -> Result<Timestamp> {
        match self.value("read_timestamp")? {
            Value::Timestamp(ts) => Ok(ts.clone()),
            _ => Err(self.mismatch(IonType::Timestamp)),
        }
    }

    fn read_string(&self) -> Result<String> {
        match self.value("read_string")? {
            Value::String(s) => Ok(s.clone()),
            Value::Symbol(s) => s.text().map(str::to_string).ok_or_else(|| {
                IonHashError::invalid_operation("ElementReader", "read_string", "symbol has unknown text")
            }),
            _ => Err(self.mismatch(IonType::String)),
        }
    }

    fn read_symbol(&self) -> Result<Symbol> {
        match self.value("read_symbol")? {
            Value::Symbol(s) => Ok(s.clone()),
            _ => Err(self.mismatch(IonType::Symbol)),
        }
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        match self.value("read_bytes")? {
            Value::Blob(bytes) | Value::Clob(bytes) => Ok(bytes.clone()),
            _ => Err(self.mismatch(IonType::Blob)),
        }
    }
}
