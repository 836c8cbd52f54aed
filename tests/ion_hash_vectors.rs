use anyhow::{anyhow, Context, Result};
use ionhash::{
    Decimal, Element, ElementReader, HashPrimitive, HashPrimitiveProvider, HashReader, HashSum,
    IdentityPrimitive, IonReader, IonType, Symbol, Timestamp, TimestampPrecision, Value,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type UpdateLog = Rc<RefCell<Vec<Vec<u8>>>>;

// Identity primitives; the first one created, the top-level one, logs
// every update it receives.
#[derive(Default)]
struct RecordingProvider {
    log: UpdateLog,
    created: Cell<usize>,
}

struct RecordingPrimitive {
    inner: IdentityPrimitive,
    log: Option<UpdateLog>,
}

impl HashPrimitive for RecordingPrimitive {
    fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
        if let Some(log) = &self.log {
            log.borrow_mut().push(bytes.to_vec());
        }
    }

    fn digest(&self) -> Vec<u8> {
        self.inner.digest()
    }
}

impl HashPrimitiveProvider for RecordingProvider {
    type Primitive = RecordingPrimitive;

    fn new_primitive(&self) -> RecordingPrimitive {
        let n = self.created.get();
        self.created.set(n + 1);
        RecordingPrimitive {
            inner: IdentityPrimitive::default(),
            log: (n == 0).then(|| self.log.clone()),
        }
    }
}

fn blob(h: &str) -> Element {
    Element::new(Value::Blob(hex::decode(h).expect("vector bytes are hex")))
}

fn vector(name: &str, ion: Element, updates: &[&str]) -> Element {
    let mut identity: Vec<Element> = updates
        .iter()
        .map(|u| blob(u).with_annotations(["update"]))
        .collect();
    identity.push(blob(&updates.concat()).with_annotations(["digest"]));

    Element::structure(vec![
        ("ion", ion),
        (
            "expect",
            Element::structure(vec![("identity", Element::list(identity))]),
        ),
    ])
    .with_annotations([name])
}

fn vectors() -> Vec<Element> {
    let year_2000 = chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date");

    vec![
        vector("int", Element::from(5i64), &["0b", "20", "05", "0e"]),
        vector("zero", Element::from(0i64), &["0b", "20", "0e"]),
        vector("negative int", Element::from(-1i64), &["0b", "30", "01", "0e"]),
        vector("true", Element::from(true), &["0b", "11", "0e"]),
        vector("null", Element::new(Value::Null(IonType::Null)), &["0b", "0f", "0e"]),
        vector(
            "null.struct",
            Element::new(Value::Null(IonType::Struct)),
            &["0b", "df", "0e"],
        ),
        vector(
            "empty struct",
            Element::structure::<&str>(vec![]),
            &["0b", "d0", "0e"],
        ),
        vector(
            "list",
            Element::list(vec![Element::from(1i64), Element::from(2i64)]),
            &["0b", "b0", "0b", "20", "01", "0e", "0b", "20", "02", "0e", "0e"],
        ),
        vector(
            "sexp",
            Element::sexp(vec![Element::new(Value::Symbol(Symbol::from("a")))]),
            &["0b", "c0", "0b", "70", "61", "0e", "0e"],
        ),
        vector(
            "struct",
            Element::structure(vec![("a", Element::from(1i64))]),
            &["0b", "d0", "0c0b70610c0e0c0b20010c0e", "0e"],
        ),
        vector(
            "struct in list",
            Element::list(vec![Element::structure(vec![("a", Element::from(1i64))])]),
            &["0b", "b0", "0b", "d0", "0c0b70610c0e0c0b20010c0e", "0e", "0e"],
        ),
        vector(
            "annotated int",
            Element::from(5i64).with_annotations(["a"]),
            &["0b", "e0", "0b", "70", "61", "0e", "0b", "20", "05", "0e", "0e"],
        ),
        vector("string with marker", Element::from("\u{b}"), &["0b", "80", "0c0b", "0e"]),
        vector(
            "blob with marker",
            blob("0e01"),
            &["0b", "a0", "0c0e01", "0e"],
        ),
        vector(
            "unknown symbol",
            Element::new(Value::Symbol(Symbol::unknown())),
            &["0b", "71", "0e"],
        ),
        vector(
            "decimal",
            Element::new(Value::Decimal(Decimal::new(10i64, -1))),
            &["0b", "50", "c10a", "0e"],
        ),
        vector(
            "float",
            Element::new(Value::Float(1.0)),
            &["0b", "40", "3ff0000000000000", "0e"],
        ),
        vector(
            "timestamp",
            Element::new(Value::Timestamp(Timestamp::new(
                year_2000,
                None,
                TimestampPrecision::Year,
            ))),
            &["0b", "60", "c00fd0", "0e"],
        ),
    ]
}

// Copies the current value out of a reader.
fn read_element<R: IonReader>(r: &mut R) -> Result<Element> {
    let annotations = r.annotations().to_vec();
    let ion_type = r.ion_type().context("no current value")?;

    let value = if ion_type.is_container() && !r.is_null() {
        let mut items = Vec::new();
        let mut fields = Vec::new();
        r.step_in()?;
        while r.next()?.is_some() {
            let name = r.field_name().map(str::to_string);
            let child = read_element(r)?;
            match name {
                Some(name) => fields.push((name, child)),
                None => items.push(child),
            }
        }
        r.step_out()?;
        match ion_type {
            IonType::List => Value::List(items),
            IonType::SExp => Value::SExp(items),
            _ => Value::Struct(fields),
        }
    } else {
        r.read_scalar()?
    };
    Ok(Element::new(value).with_annotations(annotations))
}

fn identity_hash(value: Element) -> Result<(Vec<Vec<u8>>, Vec<u8>)> {
    let provider = RecordingProvider::default();
    let log = provider.log.clone();

    let values = [value];
    let mut hr = HashReader::new(ElementReader::new(&values), provider)?;
    hr.next()?;
    hr.next()?;
    let digest = hr.digest()?;

    let updates = log.borrow().clone();
    Ok((updates, digest))
}

#[test]
fn ion_hash_vectors() -> Result<()> {
    let doc = vectors();
    let mut reader = ElementReader::new(&doc);
    let mut count = 0;

    while reader.next()?.is_some() {
        let name = reader
            .annotations()
            .first()
            .cloned()
            .context("test case without a name")?;
        reader.step_in()?;

        reader.next()?;
        assert_eq!(reader.field_name(), Some("ion"), "{name}");
        let (updates, digest) = identity_hash(read_element(&mut reader)?)?;

        reader.next()?;
        assert_eq!(reader.field_name(), Some("expect"), "{name}");
        reader.step_in()?;
        reader.next()?;
        assert_eq!(reader.field_name(), Some("identity"), "{name}");
        reader.step_in()?;

        let mut expected_updates = Vec::new();
        let mut expected_digest = None;
        while reader.next()?.is_some() {
            match reader.annotations().first().map(String::as_str) {
                Some("update") => expected_updates.push(reader.read_bytes()?),
                Some("digest") => expected_digest = Some(reader.read_bytes()?),
                other => return Err(anyhow!("{name}: unexpected expectation {other:?}")),
            }
        }
        reader.step_out()?;
        reader.step_out()?;
        reader.step_out()?;

        assert_eq!(
            updates,
            expected_updates,
            "{name}: got {:?}",
            updates.iter().map(hex::encode).collect::<Vec<_>>()
        );
        assert_eq!(
            Some(&digest),
            expected_digest.as_ref(),
            "{name}: got {}",
            hex::encode(&digest)
        );
        count += 1;
    }

    assert_eq!(count, 18);
    Ok(())
}

#[test]
fn skipping_matches_reading() -> Result<()> {
    for case in vectors() {
        let Value::Struct(fields) = case.value() else {
            return Err(anyhow!("test case is not a struct"));
        };
        let ion = fields[0].1.clone();

        let values = [ion];
        let mut skipped = HashReader::new(ElementReader::new(&values), ionhash::Algorithm::Sha256)?;
        while skipped.next()?.is_some() {}

        let mut read = HashReader::new(ElementReader::new(&values), ionhash::Algorithm::Sha256)?;
        while read.next()?.is_some() {
            read_element(&mut read)?;
        }

        assert_eq!(skipped.digest()?, read.digest()?);
    }
    Ok(())
}
