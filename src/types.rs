use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use std::fmt;

/// IonType is the type of an Ion value, regardless of its nullness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IonType {
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    Timestamp,
    Symbol,
    String,
    Clob,
    Blob,
    List,
    SExp,
    Struct,
}

impl IonType {
    /// is_container reports whether values of this type own child values.
    pub fn is_container(&self) -> bool {
        matches!(self, IonType::List | IonType::SExp | IonType::Struct)
    }
}

impl fmt::Display for IonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IonType::Null => "null",
            IonType::Bool => "bool",
            IonType::Int => "int",
            IonType::Float => "float",
            IonType::Decimal => "decimal",
            IonType::Timestamp => "timestamp",
            IonType::Symbol => "symbol",
            IonType::String => "string",
            IonType::Clob => "clob",
            IonType::Blob => "blob",
            IonType::List => "list",
            IonType::SExp => "sexp",
            IonType::Struct => "struct",
        };
        f.write_str(name)
    }
}

/// IntSize is the narrowest native width able to hold an int value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntSize {
    Int32,
    Int64,
    Uint64,
    BigInt,
}

/// Int is an arbitrary-precision integer kept as sign and big-endian magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Int {
    negative: bool,
    magnitude: Vec<u8>, // big-endian, no leading zero bytes
}

impl Int {
    /// from_be_bytes builds an int from a sign and a big-endian magnitude.
    /// Leading zero bytes are dropped and zero is never negative.
    pub fn from_be_bytes(negative: bool, magnitude: &[u8]) -> Self {
        let start = magnitude
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(magnitude.len());
        let magnitude = magnitude[start..].to_vec();
        Int {
            negative: negative && !magnitude.is_empty(),
            magnitude,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_empty()
    }

    /// magnitude returns the big-endian absolute value with no leading zeros.
    pub fn magnitude(&self) -> &[u8] {
        &self.magnitude
    }

    fn as_i128(&self) -> Option<i128> {
        if self.magnitude.len() > 8 {
            return None;
        }
        let m = BigEndian::read_u64(&self.magnitude_padded()) as i128;
        Some(if self.negative { -m } else { m })
    }

    fn magnitude_padded(&self) -> [u8; 8] {
        let mut buf = [0u8; 8];
        buf[8 - self.magnitude.len()..].copy_from_slice(&self.magnitude);
        buf
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|v| u64::try_from(v).ok())
    }

    pub fn size(&self) -> IntSize {
        match self.as_i128() {
            Some(v) if i32::try_from(v).is_ok() => IntSize::Int32,
            Some(v) if i64::try_from(v).is_ok() => IntSize::Int64,
            Some(v) if u64::try_from(v).is_ok() => IntSize::Uint64,
            _ => IntSize::BigInt,
        }
    }
}

impl From<u64> for Int {
    fn from(v: u64) -> Self {
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, v);
        Int::from_be_bytes(false, &buf)
    }
}

impl From<i64> for Int {
    fn from(v: i64) -> Self {
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, v.unsigned_abs());
        Int::from_be_bytes(v < 0, &buf)
    }
}

impl From<i32> for Int {
    fn from(v: i32) -> Self {
        Int::from(v as i64)
    }
}

/// Decimal is coefficient * 10^exponent. Unlike Int it keeps a negative zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    coefficient: Int,
    exponent: i64,
    negative_zero: bool,
}

impl Decimal {
    pub fn new(coefficient: impl Into<Int>, exponent: i64) -> Self {
        Decimal {
            coefficient: coefficient.into(),
            exponent,
            negative_zero: false,
        }
    }

    /// negative_zero returns -0 scaled by 10^exponent.
    pub fn negative_zero(exponent: i64) -> Self {
        Decimal {
            coefficient: Int::default(),
            exponent,
            negative_zero: true,
        }
    }

    pub fn coefficient(&self) -> &Int {
        &self.coefficient
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// is_coefficient_negative is true for negative coefficients, including -0.
    pub fn is_coefficient_negative(&self) -> bool {
        self.negative_zero || self.coefficient.is_negative()
    }
}

/// TimestampPrecision is the last field a timestamp specifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimestampPrecision {
    Year,
    Month,
    Day,
    Minute,
    Second,
}

/// Timestamp is an Ion timestamp: a UTC instant, its local offset
/// (None when unknown), and the precision it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timestamp {
    utc: NaiveDateTime,
    offset_minutes: Option<i32>,
    precision: TimestampPrecision,
    fractional_seconds: Option<Decimal>,
}

impl Timestamp {
    /// new builds a timestamp from its UTC fields. Fields beyond the
    /// precision are ignored when hashing.
    pub fn new(
        utc: NaiveDateTime,
        offset_minutes: Option<i32>,
        precision: TimestampPrecision,
    ) -> Self {
        Timestamp {
            utc,
            offset_minutes,
            precision,
            fractional_seconds: None,
        }
    }

    /// with_fractional_seconds attaches fractional seconds, as a decimal
    /// with a negative exponent, to a second-precision timestamp.
    pub fn with_fractional_seconds(mut self, fraction: Decimal) -> Self {
        self.fractional_seconds = Some(fraction);
        self
    }

    pub fn utc(&self) -> &NaiveDateTime {
        &self.utc
    }

    pub fn offset_minutes(&self) -> Option<i32> {
        self.offset_minutes
    }

    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    pub fn fractional_seconds(&self) -> Option<&Decimal> {
        self.fractional_seconds.as_ref()
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        let ts = Timestamp::new(
            dt.naive_utc(),
            Some(dt.offset().local_minus_utc() / 60),
            TimestampPrecision::Second,
        );
        match dt.nanosecond() {
            0 => ts,
            nanos => ts.with_fractional_seconds(Decimal::new(nanos as i64, -9)),
        }
    }
}

/// Symbol is a symbol value; its text may be unknown (`$0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    text: Option<String>,
}

impl Symbol {
    pub fn unknown() -> Self {
        Symbol { text: None }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Symbol {
            text: Some(text.to_string()),
        }
    }
}

/// Value is the content of an Ion value, without annotations.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A typed null, `null.<type>`; `Null(IonType::Null)` is plain `null`.
    Null(IonType),
    Bool(bool),
    Int(Int),
    Float(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    String(String),
    Symbol(Symbol),
    Blob(Vec<u8>),
    Clob(Vec<u8>),
    List(Vec<Element>),
    SExp(Vec<Element>),
    /// Fields in source order; duplicate names are allowed.
    Struct(Vec<(String, Element)>),
}

impl Value {
    pub fn ion_type(&self) -> IonType {
        match self {
            Value::Null(t) => *t,
            Value::Bool(_) => IonType::Bool,
            Value::Int(_) => IonType::Int,
            Value::Float(_) => IonType::Float,
            Value::Decimal(_) => IonType::Decimal,
            Value::Timestamp(_) => IonType::Timestamp,
            Value::String(_) => IonType::String,
            Value::Symbol(_) => IonType::Symbol,
            Value::Blob(_) => IonType::Blob,
            Value::Clob(_) => IonType::Clob,
            Value::List(_) => IonType::List,
            Value::SExp(_) => IonType::SExp,
            Value::Struct(_) => IonType::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// Element is a value together with its ordered annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    annotations: Vec<String>,
    value: Value,
}

impl Element {
    pub fn new(value: Value) -> Self {
        Element {
            annotations: Vec::new(),
            value,
        }
    }

    pub fn with_annotations<I, S>(mut self, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotations = annotations.into_iter().map(Into::into).collect();
        self
    }

    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn ion_type(&self) -> IonType {
        self.value.ion_type()
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn list(items: Vec<Element>) -> Self {
        Element::new(Value::List(items))
    }

    pub fn sexp(items: Vec<Element>) -> Self {
        Element::new(Value::SExp(items))
    }

    pub fn structure<S: Into<String>>(fields: Vec<(S, Element)>) -> Self {
        Element::new(Value::Struct(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }
}

impl From<Value> for Element {
    fn from(v: Value) -> Self {
        Element::new(v)
    }
}

impl From<i64> for Element {
    fn from(v: i64) -> Self {
        Element::new(v.into())
    }
}

impl From<bool> for Element {
    fn from(v: bool) -> Self {
        Element::new(v.into())
    }
}

impl From<&str> for Element {
    fn from(v: &str) -> Self {
        Element::new(v.into())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn int_sizes() {
        assert_eq!(Int::from(5i64).size(), IntSize::Int32);
        assert_eq!(Int::from(i32::MIN).size(), IntSize::Int32);
        assert_eq!(Int::from(1i64 << 40).size(), IntSize::Int64);
        assert_eq!(Int::from(i64::MIN).size(), IntSize::Int64);
        assert_eq!(Int::from(u64::MAX).size(), IntSize::Uint64);
        assert_eq!(Int::from_be_bytes(false, &[1; 9]).size(), IntSize::BigInt);
        assert_eq!(Int::from_be_bytes(true, &[0xff; 8]).size(), IntSize::BigInt);
    }

    #[test]
    fn int_magnitude() {
        let i = Int::from(-258i64);
        assert!(i.is_negative());
        assert_eq!(i.magnitude(), &[0x01, 0x02]);
        assert_eq!(i.as_i64(), Some(-258));
        assert_eq!(i.as_u64(), None);

        let zero = Int::from_be_bytes(true, &[0, 0]);
        assert!(zero.is_zero());
        assert!(!zero.is_negative());

        assert_eq!(Int::from(i64::MIN).as_i64(), Some(i64::MIN));
        assert_eq!(Int::from(u64::MAX).as_u64(), Some(u64::MAX));
    }

    #[test]
    fn timestamp_from_datetime() {
        let dt = DateTime::parse_from_rfc3339("2007-02-23T12:14:33.079-08:00").unwrap();
        let ts = Timestamp::from(dt);
        assert_eq!(ts.offset_minutes(), Some(-480));
        assert_eq!(ts.precision(), TimestampPrecision::Second);
        assert_eq!(ts.utc().to_string(), "2007-02-23 20:14:33.079");
        assert_eq!(
            ts.fractional_seconds(),
            Some(&Decimal::new(79_000_000i64, -9))
        );
    }

    #[test]
    fn element_types() {
        assert_eq!(Element::from(5i64).ion_type(), IonType::Int);
        assert!(Element::new(Value::Null(IonType::Struct)).is_null());
        assert_eq!(Element::new(Value::Null(IonType::List)).ion_type(), IonType::List);
        assert!(IonType::SExp.is_container());
        assert!(!IonType::Blob.is_container());
    }
}
