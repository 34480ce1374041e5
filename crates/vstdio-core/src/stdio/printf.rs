//! printf-style template renderer.
//!
//! Expands a template against an ordered sequence of [`FormatArg`] values
//! into bytes. Each directive consumes arguments strictly left to right;
//! there is no positional re-ordering.
//!
//! Reference: ISO C11 7.21.6.1 for flag, width, precision and length rules.
//!
//! Design invariant: expansion is bounded. Width and precision are clamped
//! to [`MAX_FIELD`], so one directive never produces more than
//! `MAX_FIELD * 2 + 64` bytes.

use crate::error::{DirectiveFault, Result, StdioError};

/// Largest width or precision honoured by a single directive.
pub const MAX_FIELD: usize = 4096;

// ---------------------------------------------------------------------------
// Format spec types
// ---------------------------------------------------------------------------

/// Flags parsed from a directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatFlags {
    pub left_justify: bool, // '-'
    pub force_sign: bool,   // '+'
    pub space_sign: bool,   // ' '
    pub alt_form: bool,     // '#'
    pub zero_pad: bool,     // '0'
}

/// Minimum field width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    None,
    Fixed(usize),
    FromArg, // '*'
}

/// Precision: minimum digits for integers, fraction digits for floats,
/// maximum bytes for strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    None,
    Fixed(usize),
    FromArg, // '.*'
}

/// Length modifier. Narrows integer arguments the way C promotion does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMod {
    None,
    Hh,   // 'hh'
    H,    // 'h'
    L,    // 'l'
    Ll,   // 'll'
    Z,    // 'z'
    T,    // 't'
    J,    // 'j'
    BigL, // 'L'
}

/// Conversion kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Signed,       // d i
    Unsigned,     // u
    Octal,        // o
    Hex,          // x
    HexUpper,     // X
    Char,         // c
    Str,          // s
    Pointer,      // p
    Fixed,        // f
    FixedUpper,   // F
    Exp,          // e
    ExpUpper,     // E
    General,      // g
    GeneralUpper, // G
    Percent,      // %
}

impl Conversion {
    #[must_use]
    pub fn from_byte(c: u8) -> Option<Self> {
        Some(match c {
            b'd' | b'i' => Self::Signed,
            b'u' => Self::Unsigned,
            b'o' => Self::Octal,
            b'x' => Self::Hex,
            b'X' => Self::HexUpper,
            b'c' => Self::Char,
            b's' => Self::Str,
            b'p' => Self::Pointer,
            b'f' => Self::Fixed,
            b'F' => Self::FixedUpper,
            b'e' => Self::Exp,
            b'E' => Self::ExpUpper,
            b'g' => Self::General,
            b'G' => Self::GeneralUpper,
            b'%' => Self::Percent,
            _ => return None,
        })
    }

    const fn is_upper(self) -> bool {
        matches!(
            self,
            Self::HexUpper | Self::FixedUpper | Self::ExpUpper | Self::GeneralUpper
        )
    }
}

/// A parsed directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub flags: FormatFlags,
    pub width: Width,
    pub precision: Precision,
    pub length: LengthMod,
    pub conversion: Conversion,
}

impl FormatSpec {
    /// Bare directive of the given kind (`%d`, `%s`, ...).
    #[must_use]
    pub const fn plain(conversion: Conversion) -> Self {
        Self {
            flags: FormatFlags {
                left_justify: false,
                force_sign: false,
                space_sign: false,
                alt_form: false,
                zero_pad: false,
            },
            width: Width::None,
            precision: Precision::None,
            length: LengthMod::None,
            conversion,
        }
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// One typed argument. Replaces a C variadic slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatArg<'a> {
    Signed(i64),
    Unsigned(u64),
    Str(&'a [u8]),
    Char(u8),
    Float(f64),
}

impl<'a> FormatArg<'a> {
    /// Text argument from a `&str`.
    #[must_use]
    pub fn str(s: &'a str) -> Self {
        Self::Str(s.as_bytes())
    }
}

macro_rules! format_arg_from {
    ($variant:ident, $target:ty: $($src:ty),+) => {
        $(
            impl From<$src> for FormatArg<'_> {
                fn from(v: $src) -> Self {
                    Self::$variant(v as $target)
                }
            }
        )+
    };
}

format_arg_from!(Signed, i64: i8, i16, i32, i64, isize);
format_arg_from!(Unsigned, u64: u16, u32, u64, usize);
format_arg_from!(Float, f64: f32, f64);

impl<'a> From<&'a str> for FormatArg<'a> {
    fn from(s: &'a str) -> Self {
        Self::Str(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for FormatArg<'a> {
    fn from(s: &'a [u8]) -> Self {
        Self::Str(s)
    }
}

// ---------------------------------------------------------------------------
// Segment: parsed pieces of a template
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSegment<'a> {
    /// Bytes emitted verbatim.
    Literal(&'a [u8]),
    /// `%%`.
    Percent,
    /// A directive; `offset` is the position of its `%` in the template.
    Spec { spec: FormatSpec, offset: usize },
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecError {
    /// Template ended before the conversion character.
    Unterminated,
    /// Unknown conversion character; `consumed` includes it.
    Unknown { consumed: usize },
}

/// Parse one directive starting after the `%`.
///
/// Returns `(spec, bytes_consumed)` counted from `fmt[0]`.
fn parse_format_spec(fmt: &[u8]) -> core::result::Result<(FormatSpec, usize), SpecError> {
    let mut pos = 0;
    let len = fmt.len();

    // --- flags ---
    let mut flags = FormatFlags::default();
    while pos < len {
        match fmt[pos] {
            b'-' => flags.left_justify = true,
            b'+' => flags.force_sign = true,
            b' ' => flags.space_sign = true,
            b'#' => flags.alt_form = true,
            b'0' => flags.zero_pad = true,
            _ => break,
        }
        pos += 1;
    }
    // '+' overrides ' '; '-' overrides '0'.
    if flags.force_sign {
        flags.space_sign = false;
    }
    if flags.left_justify {
        flags.zero_pad = false;
    }

    // --- width ---
    let width = if pos < len && fmt[pos] == b'*' {
        pos += 1;
        Width::FromArg
    } else {
        let start = pos;
        while pos < len && fmt[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos > start {
            Width::Fixed(parse_decimal(&fmt[start..pos]))
        } else {
            Width::None
        }
    };

    // --- precision ---
    let precision = if pos < len && fmt[pos] == b'.' {
        pos += 1;
        if pos < len && fmt[pos] == b'*' {
            pos += 1;
            Precision::FromArg
        } else {
            let start = pos;
            while pos < len && fmt[pos].is_ascii_digit() {
                pos += 1;
            }
            Precision::Fixed(parse_decimal(&fmt[start..pos]))
        }
    } else {
        Precision::None
    };

    // --- length modifier ---
    let mut length = LengthMod::None;
    if pos < len {
        let (modifier, used) = match (fmt[pos], fmt.get(pos + 1)) {
            (b'h', Some(b'h')) => (LengthMod::Hh, 2),
            (b'h', _) => (LengthMod::H, 1),
            (b'l', Some(b'l')) => (LengthMod::Ll, 2),
            (b'l', _) => (LengthMod::L, 1),
            (b'z', _) => (LengthMod::Z, 1),
            (b't', _) => (LengthMod::T, 1),
            (b'j', _) => (LengthMod::J, 1),
            (b'L', _) => (LengthMod::BigL, 1),
            _ => (LengthMod::None, 0),
        };
        length = modifier;
        pos += used;
    }

    // --- conversion ---
    let Some(&c) = fmt.get(pos) else {
        return Err(SpecError::Unterminated);
    };
    pos += 1;
    let Some(conversion) = Conversion::from_byte(c) else {
        return Err(SpecError::Unknown { consumed: pos });
    };

    Ok((
        FormatSpec {
            flags,
            width,
            precision,
            length,
            conversion,
        },
        pos,
    ))
}

/// Split a template into literal runs and directives.
///
/// A directive cut off by the end of the template is reported as
/// [`DirectiveFault::Unterminated`]. An unknown conversion character is kept
/// as literal text and consumes no argument.
pub fn parse_format_string(fmt: &[u8]) -> Result<Vec<FormatSegment<'_>>> {
    let mut segments = Vec::new();
    let mut pos = 0;
    let len = fmt.len();

    while pos < len {
        let start = pos;
        while pos < len && fmt[pos] != b'%' {
            pos += 1;
        }
        if pos > start {
            segments.push(FormatSegment::Literal(&fmt[start..pos]));
        }
        if pos >= len {
            break;
        }

        let offset = pos;
        pos += 1;
        match parse_format_spec(&fmt[pos..]) {
            Ok((spec, consumed)) => {
                pos += consumed;
                if spec.conversion == Conversion::Percent {
                    segments.push(FormatSegment::Percent);
                } else {
                    segments.push(FormatSegment::Spec { spec, offset });
                }
            }
            Err(SpecError::Unknown { consumed }) => {
                pos += consumed;
                segments.push(FormatSegment::Literal(&fmt[offset..pos]));
            }
            Err(SpecError::Unterminated) => {
                return Err(StdioError::MalformedDirective {
                    offset,
                    fault: DirectiveFault::Unterminated,
                });
            }
        }
    }
    Ok(segments)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Outcome of rendering into a fixed-capacity buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFormat {
    /// Text bytes stored, excluding the terminator.
    pub written: usize,
    /// Length the full rendering would have had.
    pub full_len: usize,
}

impl BufferFormat {
    /// True if output was cut short to fit.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.full_len > self.written
    }
}

/// Render `template` with `args` into a new byte vector.
pub fn render(template: &[u8], args: &[FormatArg<'_>]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(template.len() + 16);
    render_into(template, args, &mut out)?;
    Ok(out)
}

/// Render `template` with `args`, appending to `out`.
///
/// Returns the number of bytes appended. On error nothing is appended.
pub fn render_into(template: &[u8], args: &[FormatArg<'_>], out: &mut Vec<u8>) -> Result<usize> {
    let segments = parse_format_string(template)?;
    let start = out.len();
    let mut args = ArgCursor { args, next: 0 };

    for seg in &segments {
        let step = match seg {
            FormatSegment::Literal(lit) => {
                out.extend_from_slice(lit);
                Ok(())
            }
            FormatSegment::Percent => {
                out.push(b'%');
                Ok(())
            }
            FormatSegment::Spec { spec, offset } => render_spec(spec, *offset, &mut args, out),
        };
        if let Err(err) = step {
            out.truncate(start);
            return Err(err);
        }
    }
    Ok(out.len() - start)
}

/// Render into a caller-supplied fixed-capacity buffer (`snprintf`).
///
/// At most `dst.len() - 1` text bytes are stored, followed by a NUL. The
/// result still reports the full untruncated length so a caller can size a
/// retry buffer. A zero-capacity `dst` receives nothing. On error `dst`
/// holds an empty string.
pub fn format_to_buffer(
    dst: &mut [u8],
    template: &[u8],
    args: &[FormatArg<'_>],
) -> Result<BufferFormat> {
    let rendered = match render(template, args) {
        Ok(r) => r,
        Err(err) => {
            if let Some(first) = dst.first_mut() {
                *first = 0;
            }
            return Err(err);
        }
    };
    let Some(room) = dst.len().checked_sub(1) else {
        return Ok(BufferFormat {
            written: 0,
            full_len: rendered.len(),
        });
    };
    let written = rendered.len().min(room);
    dst[..written].copy_from_slice(&rendered[..written]);
    dst[written] = 0;
    Ok(BufferFormat {
        written,
        full_len: rendered.len(),
    })
}

// ---------------------------------------------------------------------------
// Directive dispatch
// ---------------------------------------------------------------------------

struct ArgCursor<'s, 'a> {
    args: &'s [FormatArg<'a>],
    next: usize,
}

impl<'a> ArgCursor<'_, 'a> {
    fn take(&mut self, offset: usize) -> Result<FormatArg<'a>> {
        let arg = self
            .args
            .get(self.next)
            .copied()
            .ok_or(StdioError::MalformedDirective {
                offset,
                fault: DirectiveFault::MissingArgument,
            })?;
        self.next += 1;
        Ok(arg)
    }
}

fn mismatch(offset: usize) -> StdioError {
    StdioError::MalformedDirective {
        offset,
        fault: DirectiveFault::ArgumentMismatch,
    }
}

/// Integer value for `*` width/precision.
fn star_value(arg: FormatArg<'_>, offset: usize) -> Result<i64> {
    match arg {
        FormatArg::Signed(v) => Ok(v),
        FormatArg::Unsigned(v) => Ok(i64::try_from(v).unwrap_or(i64::MAX)),
        FormatArg::Char(c) => Ok(i64::from(c)),
        FormatArg::Str(_) | FormatArg::Float(_) => Err(mismatch(offset)),
    }
}

fn render_spec(
    spec: &FormatSpec,
    offset: usize,
    args: &mut ArgCursor<'_, '_>,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let mut resolved = *spec;
    if spec.width == Width::FromArg {
        let w = star_value(args.take(offset)?, offset)?;
        if w < 0 {
            resolved.flags.left_justify = true;
            resolved.flags.zero_pad = false;
        }
        resolved.width = Width::Fixed(usize::try_from(w.unsigned_abs()).unwrap_or(MAX_FIELD));
    }
    if spec.precision == Precision::FromArg {
        let p = star_value(args.take(offset)?, offset)?;
        resolved.precision = match usize::try_from(p) {
            Ok(p) => Precision::Fixed(p),
            Err(_) => Precision::None,
        };
    }

    match spec.conversion {
        Conversion::Percent => buf.push(b'%'),
        Conversion::Signed => {
            let v = match args.take(offset)? {
                FormatArg::Signed(v) => v,
                FormatArg::Unsigned(v) => v as i64,
                FormatArg::Char(c) => i64::from(c),
                FormatArg::Str(_) | FormatArg::Float(_) => return Err(mismatch(offset)),
            };
            format_signed(narrow_signed(v, spec.length), &resolved, buf);
        }
        Conversion::Unsigned | Conversion::Octal | Conversion::Hex | Conversion::HexUpper => {
            let v = match args.take(offset)? {
                FormatArg::Unsigned(v) => v,
                FormatArg::Signed(v) => v as u64,
                FormatArg::Char(c) => u64::from(c),
                FormatArg::Str(_) | FormatArg::Float(_) => return Err(mismatch(offset)),
            };
            format_unsigned(narrow_unsigned(v, spec.length), &resolved, buf);
        }
        Conversion::Char => {
            let c = match args.take(offset)? {
                FormatArg::Char(c) => c,
                FormatArg::Signed(v) => v as u8,
                FormatArg::Unsigned(v) => v as u8,
                FormatArg::Str(_) | FormatArg::Float(_) => return Err(mismatch(offset)),
            };
            format_char(c, &resolved, buf);
        }
        Conversion::Str => match args.take(offset)? {
            FormatArg::Str(s) => format_str(s, &resolved, buf),
            _ => return Err(mismatch(offset)),
        },
        Conversion::Pointer => {
            let addr = match args.take(offset)? {
                FormatArg::Unsigned(v) => v,
                FormatArg::Signed(v) => v as u64,
                _ => return Err(mismatch(offset)),
            };
            format_pointer(addr, &resolved, buf);
        }
        Conversion::Fixed
        | Conversion::FixedUpper
        | Conversion::Exp
        | Conversion::ExpUpper
        | Conversion::General
        | Conversion::GeneralUpper => match args.take(offset)? {
            FormatArg::Float(v) => format_float(v, &resolved, buf),
            _ => return Err(mismatch(offset)),
        },
    }
    Ok(())
}

fn narrow_signed(v: i64, length: LengthMod) -> i64 {
    match length {
        LengthMod::Hh => i64::from(v as i8),
        LengthMod::H => i64::from(v as i16),
        LengthMod::None | LengthMod::BigL => i64::from(v as i32),
        LengthMod::L | LengthMod::Ll | LengthMod::Z | LengthMod::T | LengthMod::J => v,
    }
}

fn narrow_unsigned(v: u64, length: LengthMod) -> u64 {
    match length {
        LengthMod::Hh => u64::from(v as u8),
        LengthMod::H => u64::from(v as u16),
        LengthMod::None | LengthMod::BigL => u64::from(v as u32),
        LengthMod::L | LengthMod::Ll | LengthMod::Z | LengthMod::T | LengthMod::J => v,
    }
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Render a signed decimal integer.
pub fn format_signed(value: i64, spec: &FormatSpec, buf: &mut Vec<u8>) {
    let sign = if value < 0 {
        Some(b'-')
    } else {
        sign_flag(spec)
    };
    let digits = integer_digits(value.unsigned_abs(), 10, false, spec.precision);
    emit_integer(sign, b"", &digits, spec, buf);
}

/// Render an unsigned integer in the directive's radix (`u`, `o`, `x`, `X`).
pub fn format_unsigned(value: u64, spec: &FormatSpec, buf: &mut Vec<u8>) {
    let (radix, upper) = match spec.conversion {
        Conversion::Octal => (8, false),
        Conversion::Hex => (16, false),
        Conversion::HexUpper => (16, true),
        _ => (10, false),
    };
    let mut digits = integer_digits(value, radix, upper, spec.precision);

    let prefix: &[u8] = match spec.conversion {
        _ if !spec.flags.alt_form => b"",
        // '#o' forces a leading zero digit, nothing more.
        Conversion::Octal => {
            if digits.first() != Some(&b'0') {
                digits.insert(0, b'0');
            }
            b""
        }
        Conversion::Hex if value != 0 => b"0x",
        Conversion::HexUpper if value != 0 => b"0X",
        _ => b"",
    };
    emit_integer(None, prefix, &digits, spec, buf);
}

/// Render a byte string; precision caps the number of bytes taken.
pub fn format_str(s: &[u8], spec: &FormatSpec, buf: &mut Vec<u8>) {
    let take = match spec.precision {
        Precision::Fixed(p) => s.len().min(p),
        _ => s.len(),
    };
    emit_padded(&s[..take], spec, buf);
}

/// Render a single byte.
pub fn format_char(c: u8, spec: &FormatSpec, buf: &mut Vec<u8>) {
    emit_padded(&[c], spec, buf);
}

/// Render an address as `0x...`, or `(nil)` for zero.
pub fn format_pointer(addr: u64, spec: &FormatSpec, buf: &mut Vec<u8>) {
    if addr == 0 {
        return emit_padded(b"(nil)", spec, buf);
    }
    let mut body = b"0x".to_vec();
    body.extend_from_slice(&integer_digits(addr, 16, false, Precision::None));
    emit_padded(&body, spec, buf);
}

/// Render a floating-point value (`f`, `F`, `e`, `E`, `g`, `G`).
pub fn format_float(value: f64, spec: &FormatSpec, buf: &mut Vec<u8>) {
    let upper = spec.conversion.is_upper();
    let precision = match spec.precision {
        Precision::Fixed(p) => p.min(MAX_FIELD),
        _ => 6,
    };

    if value.is_nan() {
        let s: &[u8] = if upper { b"NAN" } else { b"nan" };
        return emit_padded(s, spec, buf);
    }

    let sign = if value.is_sign_negative() {
        Some(b'-')
    } else {
        sign_flag(spec)
    };

    if value.is_infinite() {
        let mut body = Vec::with_capacity(4);
        body.extend(sign);
        body.extend_from_slice(if upper { b"INF" } else { b"inf" });
        return emit_padded(&body, spec, buf);
    }

    let abs = value.abs();
    let alt = spec.flags.alt_form;
    let body = match spec.conversion {
        Conversion::Exp | Conversion::ExpUpper => format_e(abs, precision, upper, alt),
        Conversion::General | Conversion::GeneralUpper => format_g(abs, precision, upper, alt),
        _ => format_f(abs, precision, alt),
    };

    let content = usize::from(sign.is_some()) + body.len();
    let pad_total = resolve_width(spec).saturating_sub(content);
    let left = spec.flags.left_justify;
    let zero = spec.flags.zero_pad && !left;

    if !left && !zero {
        pad(buf, b' ', pad_total);
    }
    buf.extend(sign);
    if zero {
        pad(buf, b'0', pad_total);
    }
    buf.extend_from_slice(body.as_bytes());
    if left {
        pad(buf, b' ', pad_total);
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn parse_decimal(digits: &[u8]) -> usize {
    digits.iter().fold(0usize, |acc, &d| {
        acc.saturating_mul(10).saturating_add(usize::from(d - b'0'))
    })
}

fn resolve_width(spec: &FormatSpec) -> usize {
    match spec.width {
        Width::Fixed(w) => w.min(MAX_FIELD),
        _ => 0,
    }
}

fn sign_flag(spec: &FormatSpec) -> Option<u8> {
    if spec.flags.force_sign {
        Some(b'+')
    } else if spec.flags.space_sign {
        Some(b' ')
    } else {
        None
    }
}

/// Digits of `value` in `radix`, zero-extended to the precision.
/// Precision 0 with value 0 yields no digits.
fn integer_digits(mut value: u64, radix: u64, upper: bool, precision: Precision) -> Vec<u8> {
    let min_digits = match precision {
        Precision::Fixed(p) => p.min(MAX_FIELD),
        _ => 1,
    };
    let alpha = if upper { b'A' } else { b'a' };
    let mut rev = Vec::with_capacity(min_digits.max(20));
    while value > 0 {
        let d = (value % radix) as u8;
        rev.push(if d < 10 { b'0' + d } else { alpha + d - 10 });
        value /= radix;
    }
    while rev.len() < min_digits {
        rev.push(b'0');
    }
    rev.reverse();
    rev
}

/// Lay out `[pad][sign][prefix][zeros][digits][pad]`.
///
/// The `0` flag is ignored when a precision is given.
fn emit_integer(sign: Option<u8>, prefix: &[u8], digits: &[u8], spec: &FormatSpec, buf: &mut Vec<u8>) {
    let content = usize::from(sign.is_some()) + prefix.len() + digits.len();
    let pad_total = resolve_width(spec).saturating_sub(content);
    let left = spec.flags.left_justify;
    let zero = spec.flags.zero_pad && !left && spec.precision == Precision::None;

    if !left && !zero {
        pad(buf, b' ', pad_total);
    }
    buf.extend(sign);
    buf.extend_from_slice(prefix);
    if zero {
        pad(buf, b'0', pad_total);
    }
    buf.extend_from_slice(digits);
    if left {
        pad(buf, b' ', pad_total);
    }
}

/// Space-pad `body` to the field width. Zero-pad never applies here.
fn emit_padded(body: &[u8], spec: &FormatSpec, buf: &mut Vec<u8>) {
    let pad_total = resolve_width(spec).saturating_sub(body.len());
    if !spec.flags.left_justify {
        pad(buf, b' ', pad_total);
    }
    buf.extend_from_slice(body);
    if spec.flags.left_justify {
        pad(buf, b' ', pad_total);
    }
}

fn pad(buf: &mut Vec<u8>, byte: u8, count: usize) {
    buf.resize(buf.len() + count.min(MAX_FIELD), byte);
}

/// `%f`: fixed-point decimal.
fn format_f(value: f64, precision: usize, alt: bool) -> String {
    let mut s = format!("{value:.precision$}");
    if alt && precision == 0 {
        s.push('.');
    }
    s
}

/// `%e`: `d.ddde±XX`, at least two exponent digits.
fn format_e(value: f64, precision: usize, upper: bool, alt: bool) -> String {
    let (mut mantissa, exp) = split_exp(value, precision);
    if alt && precision == 0 {
        mantissa.push('.');
    }
    join_exp(&mantissa, exp, upper)
}

/// `%g`: `%e` or `%f` depending on the decimal exponent, trailing zeros
/// removed unless `#` is set.
fn format_g(value: f64, precision: usize, upper: bool, alt: bool) -> String {
    let p = precision.max(1);
    let exp = if value == 0.0 {
        0
    } else {
        split_exp(value, p - 1).1
    };

    if exp >= -4 && exp < p as i32 {
        let frac = (p as i32 - 1 - exp).max(0) as usize;
        let mut s = format!("{value:.frac$}");
        if alt {
            if !s.contains('.') {
                s.push('.');
            }
        } else {
            strip_trailing_zeros(&mut s);
        }
        s
    } else {
        let (mut mantissa, exp) = split_exp(value, p - 1);
        if alt {
            if !mantissa.contains('.') {
                mantissa.push('.');
            }
        } else {
            strip_trailing_zeros(&mut mantissa);
        }
        join_exp(&mantissa, exp, upper)
    }
}

/// Rust's `{:e}` rendering split into mantissa text and exponent.
fn split_exp(value: f64, precision: usize) -> (String, i32) {
    let s = format!("{value:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa.to_string(), exp.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn join_exp(mantissa: &str, exp: i32, upper: bool) -> String {
    let e = if upper { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{e}{sign}{:02}", exp.unsigned_abs())
}

fn strip_trailing_zeros(s: &mut String) {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
