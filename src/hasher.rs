use tracing::trace;

use crate::error::{IonHashError, Result};
use crate::primitive::{HashPrimitive, HashPrimitiveProvider};
use crate::reader::IonReader;
use crate::representation::{container_tq, escape, scalar_parts, Markers, ANNOTATION_TQ};
use crate::types::{IonType, Value};

/// HashValue is what the hasher needs to know about the value it is fed.
pub trait HashValue {
    /// current_type is None when there is no current value.
    fn current_type(&self) -> Option<IonType>;
    fn current_is_null(&self) -> bool;
    fn current_field_name(&self) -> Option<&str>;
    fn current_annotations(&self) -> &[String];
    /// current_value reads the current scalar, or typed null.
    fn current_value(&self) -> Result<Value>;
}

impl<R: IonReader + ?Sized> HashValue for R {
    fn current_type(&self) -> Option<IonType> {
        self.ion_type()
    }

    fn current_is_null(&self) -> bool {
        self.is_null()
    }

    fn current_field_name(&self) -> Option<&str> {
        self.field_name()
    }

    fn current_annotations(&self) -> &[String] {
        self.annotations()
    }

    fn current_value(&self) -> Result<Value> {
        self.read_scalar()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    TopLevel,
    Sequence,
    Struct,
}

// Scope accumulates the serialized content of one container level.
//
// A sequence nested in a sequence streams into its parent's primitive:
// the primitive is moved into the child while it is open and handed back
// when it closes. Struct fields are hashed with fresh primitives and only
// their digests reach the struct.
struct Scope<H> {
    kind: ScopeKind,
    primitive: Option<H>,
    field_hashes: Vec<Vec<u8>>,
    annotated: bool,
}

impl<H: HashPrimitive> Scope<H> {
    fn new(kind: ScopeKind, primitive: H, annotated: bool) -> Self {
        Scope {
            kind,
            primitive: Some(primitive),
            field_hashes: Vec::new(),
            annotated,
        }
    }

    fn primitive_mut(&mut self, method: &'static str) -> Result<&mut H> {
        self.primitive.as_mut().ok_or_else(|| {
            IonHashError::invalid_operation("Hasher", method, "scope primitive is held by a child")
        })
    }
}

/// Hasher computes Ion hashes from a stream of scalar, step-in and
/// step-out events.
pub struct Hasher<P: HashPrimitiveProvider> {
    provider: P,
    scopes: Vec<Scope<P::Primitive>>,
    // A top-level value has been hashed; the next one starts afresh.
    top_level_done: bool,
}

impl<P: HashPrimitiveProvider> Hasher<P> {
    /// new returns a hasher at the top level drawing primitives from provider.
    pub fn new(provider: P) -> Self {
        let primitive = provider.new_primitive();
        Hasher {
            provider,
            scopes: vec![Scope::new(ScopeKind::TopLevel, primitive, false)],
            top_level_done: false,
        }
    }

    /// depth is the number of containers currently open.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    fn top(&self) -> &Scope<P::Primitive> {
        &self.scopes[self.scopes.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Scope<P::Primitive> {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn begin_value(&mut self) {
        if self.depth() == 0 && self.top_level_done {
            trace!("hasher: starting a new top-level value");
            self.scopes[0].primitive = Some(self.provider.new_primitive());
            self.top_level_done = false;
        }
    }

    fn end_value(&mut self) {
        if self.depth() == 0 {
            self.top_level_done = true;
        }
    }

    /// scalar hashes the current value, which must not be a non-null container.
    pub fn scalar<V: HashValue + ?Sized>(&mut self, value: &V) -> Result<()> {
        let content = value.current_value()?;
        let annotations = value.current_annotations();
        self.begin_value();

        if self.top().kind == ScopeKind::Struct {
            let mut primitive = self.provider.new_primitive();
            if let Some(name) = value.current_field_name() {
                write_symbol(&mut primitive, name);
            }
            write_scalar(&mut primitive, annotations, &content)?;
            self.top_mut().field_hashes.push(primitive.digest());
        } else {
            write_scalar(self.top_mut().primitive_mut("scalar")?, annotations, &content)?;
        }

        self.end_value();
        Ok(())
    }

    /// step_in opens a scope for the current value, a non-null container.
    pub fn step_in<V: HashValue + ?Sized>(&mut self, value: &V) -> Result<()> {
        let ion_type = match value.current_type() {
            Some(t) if t.is_container() && !value.current_is_null() => t,
            other => {
                return Err(IonHashError::invalid_operation(
                    "Hasher",
                    "step_in",
                    format!("cannot step into {other:?}, only non-null containers"),
                ))
            }
        };
        self.begin_value();

        let in_struct = self.top().kind == ScopeKind::Struct;
        let mut primitive = if in_struct {
            self.provider.new_primitive()
        } else {
            self.top_mut()
                .primitive
                .take()
                .ok_or_else(|| {
                    IonHashError::invalid_operation("Hasher", "step_in", "parent primitive is held")
                })?
        };

        if in_struct {
            if let Some(name) = value.current_field_name() {
                write_symbol(&mut primitive, name);
            }
        }
        let annotated = begin_annotations(&mut primitive, value.current_annotations());
        primitive.update(&[Markers::B]);
        primitive.update(&[container_tq(ion_type)]);

        let kind = match ion_type {
            IonType::Struct => ScopeKind::Struct,
            _ => ScopeKind::Sequence,
        };
        self.scopes.push(Scope::new(kind, primitive, annotated));
        trace!(depth = self.depth(), %ion_type, "hasher: step in");
        Ok(())
    }

    /// step_out closes the innermost scope and folds it into its parent.
    pub fn step_out(&mut self) -> Result<()> {
        if self.depth() == 0 {
            return Err(IonHashError::invalid_operation(
                "Hasher",
                "step_out",
                "Hasher cannot step out any further",
            ));
        }

        let mut scope = self.scopes.pop().ok_or_else(|| {
            IonHashError::invalid_operation("Hasher", "step_out", "no open scope")
        })?;
        let mut primitive = scope.primitive.take().ok_or_else(|| {
            IonHashError::invalid_operation("Hasher", "step_out", "scope primitive is held")
        })?;
        if scope.kind == ScopeKind::Struct {
            // Field order must not matter.
            scope.field_hashes.sort();
            for digest in &scope.field_hashes {
                primitive.update(&escape(digest));
            }
        }
        primitive.update(&[Markers::E]);
        if scope.annotated {
            primitive.update(&[Markers::E]);
        }

        let parent = self.top_mut();
        match parent.kind {
            ScopeKind::Struct => parent.field_hashes.push(primitive.digest()),
            ScopeKind::TopLevel | ScopeKind::Sequence => parent.primitive = Some(primitive),
        }
        trace!(depth = self.depth(), "hasher: step out");

        self.end_value();
        Ok(())
    }

    /// digest returns the current output of the innermost scope's
    /// primitive. At the top level that is the hash of the last completed
    /// value.
    pub fn digest(&self) -> Result<Vec<u8>> {
        self.top()
            .primitive
            .as_ref()
            .map(|p| p.digest())
            .ok_or_else(|| {
                IonHashError::invalid_operation("Hasher", "digest", "scope primitive is held")
            })
    }
}

// Annotation wrappers open with B and the annotation TQ; the matching E
// is written once the wrapped value is complete.
fn begin_annotations<H: HashPrimitive>(primitive: &mut H, annotations: &[String]) -> bool {
    if annotations.is_empty() {
        return false;
    }
    primitive.update(&[Markers::B]);
    primitive.update(&[ANNOTATION_TQ]);
    for annotation in annotations {
        write_symbol(primitive, annotation);
    }
    true
}

fn write_symbol<H: HashPrimitive>(primitive: &mut H, text: &str) {
    primitive.update(&[Markers::B]);
    primitive.update(&[container_tq(IonType::Symbol)]);
    if !text.is_empty() {
        primitive.update(&escape(text.as_bytes()));
    }
    primitive.update(&[Markers::E]);
}

fn write_scalar<H: HashPrimitive>(
    primitive: &mut H,
    annotations: &[String],
    value: &Value,
) -> Result<()> {
    let (tq, repr) = scalar_parts(value)?;
    let annotated = begin_annotations(primitive, annotations);
    primitive.update(&[Markers::B]);
    primitive.update(&[tq]);
    if !repr.is_empty() {
        primitive.update(&escape(&repr));
    }
    primitive.update(&[Markers::E]);
    if annotated {
        primitive.update(&[Markers::E]);
    }
    Ok(())
}
