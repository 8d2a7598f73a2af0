//! Declarative instrument protocol binding.
//!
//! Protocol knowledge for an instrument lives in exactly one place: a static
//! table of [`CommandSpec`]s. [`BoundDevice::bind`] compiles that table once,
//! at device construction, into an immutable mapping from operation name to a
//! pre-parsed operation — no runtime command synthesis, no string evaluation
//! against arbitrary input. Accessors are pure dispatch over the table.
//!
//! Read operations send their template verbatim and return the raw textual
//! response (terminator included). Write operations render the template's
//! single printf-style directive (`%s`, `%d`, `%0.3f`, ...) with the supplied
//! value, honoring width and precision exactly; an attached validator may
//! reject the value first, in which case nothing touches the transport and
//! the call returns `Ok(false)` — a normal outcome, not an error.

use crate::error::{AppResult, DaqError};
use crate::transport::Transport;
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;

/// Whether an operation queries the instrument or commands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Sends the template verbatim and collects one textual response.
    Read,
    /// Renders a value into the template and sends it; no response is read.
    Write,
}

/// A value supplied to a write operation.
///
/// The template's format directive decides the final rendering, so `1` and
/// `1.0` both render as `"1.000"` through a `%0.3f` directive.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandValue {
    /// Textual argument, rendered through `%s`.
    Text(String),
    /// Integer argument.
    Int(i64),
    /// Floating-point argument.
    Float(f64),
}

impl CommandValue {
    /// Numeric view of the value, for validators. `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CommandValue::Float(f) => Some(*f),
            CommandValue::Int(i) => Some(*i as f64),
            CommandValue::Text(_) => None,
        }
    }

    fn as_text(&self) -> String {
        match self {
            CommandValue::Text(s) => s.clone(),
            CommandValue::Int(i) => i.to_string(),
            CommandValue::Float(f) => f.to_string(),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            CommandValue::Text(_) => None,
            CommandValue::Int(i) => Some(*i),
            CommandValue::Float(f) => Some(f.round() as i64),
        }
    }
}

impl From<f64> for CommandValue {
    fn from(value: f64) -> Self {
        CommandValue::Float(value)
    }
}

impl From<i64> for CommandValue {
    fn from(value: i64) -> Self {
        CommandValue::Int(value)
    }
}

impl From<i32> for CommandValue {
    fn from(value: i32) -> Self {
        CommandValue::Int(value.into())
    }
}

impl From<&str> for CommandValue {
    fn from(value: &str) -> Self {
        CommandValue::Text(value.to_string())
    }
}

impl From<String> for CommandValue {
    fn from(value: String) -> Self {
        CommandValue::Text(value)
    }
}

/// Validation predicate attached to a write operation.
///
/// Returning `false` rejects the value: the operation performs no transport
/// write and yields `Ok(false)`.
pub type Validator = fn(&CommandValue) -> bool;

/// Declarative description of one instrument operation.
///
/// Immutable once registered. Device models are distinct static
/// `&[CommandSpec]` tables, not type hierarchies.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Command template, with at most one format directive for writes.
    pub template: &'static str,
    /// Operation name used for dispatch.
    pub name: &'static str,
    /// Read or write.
    pub kind: CommandKind,
    /// Optional value validator (writes only).
    pub validator: Option<Validator>,
}

impl CommandSpec {
    /// A query operation: sends `template` verbatim, returns the raw response.
    pub const fn read(template: &'static str, name: &'static str) -> Self {
        Self {
            template,
            name,
            kind: CommandKind::Read,
            validator: None,
        }
    }

    /// A write operation rendering one value into `template`.
    ///
    /// A template without a format directive describes a fire-and-forget
    /// command taking no argument (dispatched via [`BoundDevice::command`]).
    pub const fn write(template: &'static str, name: &'static str) -> Self {
        Self {
            template,
            name,
            kind: CommandKind::Write,
            validator: None,
        }
    }

    /// A write operation whose value is screened by `validator` first.
    pub const fn write_validated(
        template: &'static str,
        name: &'static str,
        validator: Validator,
    ) -> Self {
        Self {
            template,
            name,
            kind: CommandKind::Write,
            validator: Some(validator),
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("template", &self.template)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

/// Conversion character of a format directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Str,
    Int,
    Float,
}

/// One parsed printf-style directive, e.g. `%0.3f`.
#[derive(Debug, Clone, Copy)]
struct Directive {
    /// Byte range of the directive within the template.
    start: usize,
    end: usize,
    zero_pad: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: Conversion,
}

impl Directive {
    /// Parse the single directive in `template`, if any.
    ///
    /// Errors on an unsupported conversion character or on more than one
    /// directive: a write template carries at most one value slot.
    fn parse(template: &str) -> Result<Option<Directive>, String> {
        let bytes = template.as_bytes();
        let mut found: Option<Directive> = None;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'%' {
                i += 1;
                continue;
            }
            if found.is_some() {
                return Err(format!("more than one format directive in '{}'", template));
            }

            let start = i;
            i += 1;

            let mut zero_pad = false;
            while i < bytes.len() && (bytes[i] == b'0' || bytes[i] == b'-') {
                // Left-justification is accepted and ignored; none of the
                // rig's instruments care about field alignment.
                zero_pad |= bytes[i] == b'0';
                i += 1;
            }

            let width_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let width = if i > width_start {
                template[width_start..i].parse::<usize>().ok()
            } else {
                None
            };

            let mut precision = None;
            if i < bytes.len() && bytes[i] == b'.' {
                i += 1;
                let prec_start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                precision = template[prec_start..i].parse::<usize>().ok().or(Some(0));
            }

            let conversion = match bytes.get(i) {
                Some(b's') => Conversion::Str,
                Some(b'd') => Conversion::Int,
                Some(b'f') => Conversion::Float,
                other => {
                    return Err(format!(
                        "unsupported format directive '%{}' in '{}'",
                        other.map(|b| *b as char).unwrap_or(' '),
                        template
                    ))
                }
            };
            i += 1;

            found = Some(Directive {
                start,
                end: i,
                zero_pad,
                width,
                precision,
                conversion,
            });
        }

        Ok(found)
    }

    /// Render `value` per this directive.
    ///
    /// A text value has no rendering through a numeric conversion; that is a
    /// caller-side type error, never a zero on the wire.
    fn render(&self, value: &CommandValue) -> AppResult<String> {
        let rendered = match self.conversion {
            Conversion::Str => {
                let mut s = value.as_text();
                if let Some(p) = self.precision {
                    s.truncate(p);
                }
                s
            }
            Conversion::Int => value
                .as_i64()
                .ok_or_else(|| {
                    DaqError::Parse(format!("value {:?} does not fit a %d directive", value))
                })?
                .to_string(),
            Conversion::Float => {
                let f = value.as_f64().ok_or_else(|| {
                    DaqError::Parse(format!("value {:?} does not fit a %f directive", value))
                })?;
                // printf defaults %f to six digits after the point.
                format!("{:.*}", self.precision.unwrap_or(6), f)
            }
        };

        let padded = match self.width {
            Some(w) if rendered.len() < w => {
                let pad = if self.zero_pad && self.conversion != Conversion::Str {
                    '0'
                } else {
                    ' '
                };
                let mut padded: String =
                    std::iter::repeat(pad).take(w - rendered.len()).collect();
                padded.push_str(&rendered);
                padded
            }
            _ => rendered,
        };
        Ok(padded)
    }
}

/// One compiled operation: the spec plus its pre-parsed directive.
struct Operation {
    template: &'static str,
    kind: CommandKind,
    validator: Option<Validator>,
    directive: Option<Directive>,
}

/// A live binding of a command table to one transport.
///
/// Owns the transport for its lifetime and serializes all protocol traffic
/// through it. The operation table is built once by [`BoundDevice::bind`] and
/// never mutated afterwards.
pub struct BoundDevice<T: Transport> {
    transport: T,
    ops: HashMap<&'static str, Operation>,
}

impl<T: Transport> BoundDevice<T> {
    /// Compile `specs` into an operation table bound to `transport`.
    ///
    /// Fails on duplicate names, on a read template carrying a directive or
    /// a validator, and on malformed directives — the table is wrong, not
    /// the runtime input.
    pub fn bind(transport: T, specs: &'static [CommandSpec]) -> AppResult<Self> {
        let mut ops: HashMap<&'static str, Operation> = HashMap::with_capacity(specs.len());

        for spec in specs {
            let directive = Directive::parse(spec.template).map_err(DaqError::Binding)?;

            match spec.kind {
                CommandKind::Read => {
                    if directive.is_some() {
                        return Err(DaqError::Binding(format!(
                            "read operation '{}' must not contain a format directive",
                            spec.name
                        )));
                    }
                    if spec.validator.is_some() {
                        return Err(DaqError::Binding(format!(
                            "read operation '{}' must not carry a validator",
                            spec.name
                        )));
                    }
                }
                CommandKind::Write => {
                    if directive.is_none() && spec.validator.is_some() {
                        return Err(DaqError::Binding(format!(
                            "write operation '{}' has a validator but no value slot",
                            spec.name
                        )));
                    }
                }
            }

            if ops
                .insert(
                    spec.name,
                    Operation {
                        template: spec.template,
                        kind: spec.kind,
                        validator: spec.validator,
                        directive,
                    },
                )
                .is_some()
            {
                return Err(DaqError::Binding(format!(
                    "duplicate operation name '{}'",
                    spec.name
                )));
            }
        }

        Ok(Self { transport, ops })
    }

    fn op(&self, name: &str, kind: CommandKind) -> AppResult<&Operation> {
        let op = self
            .ops
            .get(name)
            .ok_or_else(|| DaqError::UnknownOperation(name.to_string()))?;
        if op.kind != kind {
            return Err(DaqError::Binding(format!(
                "operation '{}' is a {:?} operation, dispatched as {:?}",
                name, op.kind, kind
            )));
        }
        Ok(op)
    }

    /// Execute a read operation: send its template verbatim, return the raw
    /// textual response unmodified (trailing terminator included).
    pub fn read(&mut self, name: &str) -> AppResult<String> {
        let template = self.op(name, CommandKind::Read)?.template;
        trace!("read '{}': sending '{}'", name, template);
        self.transport.write_message(template)?;
        self.transport.read_message()
    }

    /// Execute a write operation with one value argument.
    ///
    /// Returns `Ok(false)` without any transport traffic when the operation's
    /// validator rejects the value; `Ok(true)` once the rendered command has
    /// been sent. A text value fed to a numeric directive is a
    /// [`DaqError::Parse`], not a rendered zero.
    pub fn write<V: Into<CommandValue>>(&mut self, name: &str, value: V) -> AppResult<bool> {
        let value = value.into();
        let op = self.op(name, CommandKind::Write)?;
        let directive = op.directive.ok_or_else(|| {
            DaqError::Binding(format!(
                "operation '{}' takes no value; dispatch it as a command",
                name
            ))
        })?;

        if let Some(validator) = op.validator {
            if !validator(&value) {
                debug!("write '{}' rejected value {:?}", name, value);
                return Ok(false);
            }
        }

        let rendered = directive.render(&value)?;
        let mut cmd = String::with_capacity(op.template.len() + 16);
        cmd.push_str(&op.template[..directive.start]);
        cmd.push_str(&rendered);
        cmd.push_str(&op.template[directive.end..]);

        trace!("write '{}': sending '{}'", name, cmd);
        self.transport.write_message(&cmd)?;
        Ok(true)
    }

    /// Execute a fire-and-forget write operation taking no argument.
    pub fn command(&mut self, name: &str) -> AppResult<()> {
        let op = self.op(name, CommandKind::Write)?;
        if op.directive.is_some() {
            return Err(DaqError::Binding(format!(
                "operation '{}' takes a value; dispatch it as a write",
                name
            )));
        }
        let template = op.template;
        trace!("command '{}': sending '{}'", name, template);
        self.transport.write_message(template)
    }

    /// Whether `name` is bound in the operation table.
    pub fn has_operation(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Direct access to the underlying transport, for binary reads that
    /// bypass the textual protocol (the board's sample block).
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the binding and give the transport back.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn never(_: &CommandValue) -> bool {
        false
    }

    fn negative_only(value: &CommandValue) -> bool {
        value.as_f64().is_some_and(|v| v < 0.0)
    }

    #[test]
    fn directive_parses_precision_and_conversion() {
        let d = Directive::parse(":Laser:Current %0.3f").unwrap().unwrap();
        assert_eq!(d.conversion, Conversion::Float);
        assert_eq!(d.precision, Some(3));
        assert!(d.zero_pad);
    }

    #[test]
    fn directive_rejects_unknown_conversion() {
        assert!(Directive::parse("VOLT %q").is_err());
    }

    #[test]
    fn directive_rejects_two_value_slots() {
        assert!(Directive::parse("SET %d %d").is_err());
    }

    #[test]
    fn float_rendering_honors_precision() {
        let d = Directive::parse("%0.3f").unwrap().unwrap();
        assert_eq!(d.render(&CommandValue::Int(1)).unwrap(), "1.000");
        assert_eq!(d.render(&CommandValue::Float(-2.4)).unwrap(), "-2.400");
    }

    #[test]
    fn float_rendering_defaults_to_six_digits() {
        let d = Directive::parse("%f").unwrap().unwrap();
        assert_eq!(d.render(&CommandValue::Float(1.5)).unwrap(), "1.500000");
    }

    #[test]
    fn string_precision_truncates() {
        let d = Directive::parse("%0.3s").unwrap().unwrap();
        assert_eq!(d.render(&CommandValue::Text("TRIANGLE".into())).unwrap(), "TRI");
    }

    #[test]
    fn int_width_zero_pads() {
        let d = Directive::parse("%04d").unwrap().unwrap();
        assert_eq!(d.render(&CommandValue::Int(42)).unwrap(), "0042");
    }

    #[test]
    fn text_through_numeric_directives_is_rejected() {
        for template in ["%0.3f", "%d"] {
            let d = Directive::parse(template).unwrap().unwrap();
            assert!(matches!(
                d.render(&CommandValue::Text("garbage".into())),
                Err(DaqError::Parse(_))
            ));
        }
    }

    #[test]
    fn bind_rejects_read_with_directive() {
        static BAD: &[CommandSpec] = &[CommandSpec::read("CUR %f", "current")];
        let err = BoundDevice::bind(MockTransport::new(), BAD).err();
        assert!(matches!(err, Some(DaqError::Binding(_))));
    }

    #[test]
    fn bind_rejects_duplicate_names() {
        static DUP: &[CommandSpec] = &[
            CommandSpec::read("IDN", "identity"),
            CommandSpec::read("*idn?", "identity"),
        ];
        let err = BoundDevice::bind(MockTransport::new(), DUP).err();
        assert!(matches!(err, Some(DaqError::Binding(_))));
    }

    #[test]
    fn read_returns_raw_response() {
        static TABLE: &[CommandSpec] = &[CommandSpec::read("*idn?", "identity")];
        let mut mock = MockTransport::new();
        mock.push_message("LASER-A\n");
        let mut device = BoundDevice::bind(mock, TABLE).unwrap();

        let response = device.read("identity").unwrap();
        assert_eq!(response, "LASER-A\n");
        assert_eq!(device.transport_mut().writes(), &["*idn?"]);
    }

    #[test]
    fn write_formats_and_sends_once() {
        static TABLE: &[CommandSpec] =
            &[CommandSpec::write(":Laser:Current %0.3f", "laser_current")];
        let mut device = BoundDevice::bind(MockTransport::new(), TABLE).unwrap();

        assert!(device.write("laser_current", 1.0).unwrap());
        assert_eq!(device.transport_mut().writes(), &[":Laser:Current 1.000"]);
    }

    #[test]
    fn write_of_text_through_a_float_slot_is_an_error_not_a_zero() {
        static TABLE: &[CommandSpec] =
            &[CommandSpec::write(":Laser:Current %0.3f", "laser_current")];
        let mut device = BoundDevice::bind(MockTransport::new(), TABLE).unwrap();

        assert!(matches!(
            device.write("laser_current", "garbage"),
            Err(DaqError::Parse(_))
        ));
        assert!(device.transport_mut().writes().is_empty());
    }

    #[test]
    fn rejected_write_touches_nothing() {
        static TABLE: &[CommandSpec] =
            &[CommandSpec::write_validated(":Piezo:Offset %0.3f", "offset", never)];
        let mut device = BoundDevice::bind(MockTransport::new(), TABLE).unwrap();

        assert!(!device.write("offset", 1.0).unwrap());
        assert!(device.transport_mut().writes().is_empty());
    }

    #[test]
    fn validator_boundary_is_exact() {
        static TABLE: &[CommandSpec] = &[CommandSpec::write_validated(
            ":Laser:Current %0.3f",
            "laser_current",
            negative_only,
        )];
        let mut device = BoundDevice::bind(MockTransport::new(), TABLE).unwrap();

        assert!(!device.write("laser_current", 0.0).unwrap());
        assert!(device.write("laser_current", -1.5).unwrap());
        assert_eq!(device.transport_mut().writes().len(), 1);
    }

    #[test]
    fn unknown_operation_is_reported() {
        static TABLE: &[CommandSpec] = &[CommandSpec::read("IDN", "identity")];
        let mut device = BoundDevice::bind(MockTransport::new(), TABLE).unwrap();
        assert!(matches!(
            device.read("identify"),
            Err(DaqError::UnknownOperation(_))
        ));
    }

    #[test]
    fn kind_mismatch_is_a_binding_error() {
        static TABLE: &[CommandSpec] = &[CommandSpec::read("IDN", "identity")];
        let mut device = BoundDevice::bind(MockTransport::new(), TABLE).unwrap();
        assert!(matches!(
            device.write("identity", 1.0),
            Err(DaqError::Binding(_))
        ));
    }
}
