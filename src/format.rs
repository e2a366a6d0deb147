//! Positional template formatting.
//!
//! Templates use printf style specifiers of the form
//! `%[index$][flags][width][.precision]conversion`. Supported conversions are
//! `s S d x X o f c b B n %` and the flags `-` (left justify), `0` (zero
//! padding of numbers) and `+` (always print the sign). Specifiers without an
//! explicit index consume the arguments in order. Surplus arguments are
//! ignored.

use std::{convert::TryFrom, fmt, iter::Peekable, str::Chars};
use thiserror::Error;

const CONVERSIONS: &str = "sSdxXofcbBn%";

/// A formattable log argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absent value, rendered as `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Character
    Char(char),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
}

impl Value {
    /// Captures the `Display` rendering of `value` as a string argument.
    pub fn display<T: fmt::Display>(value: T) -> Value {
        Value::Str(value.to_string())
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            // Debug keeps the fraction of whole numbers: 1.0 instead of 1
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! value_from {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

value_from!(Int as i64: i8, i16, i32, i64, isize);
value_from!(UInt as u64: u8, u16, u32, u64, usize);
value_from!(Float as f64: f32, f64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Template formatting failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A specifier refers to an argument that was not supplied. Zero based.
    #[error("Missing format argument {0}")]
    MissingArgument(usize),
    /// Unsupported conversion character
    #[error("Unknown format conversion '{0}'")]
    UnknownConversion(char),
    /// The argument cannot be rendered with the conversion
    #[error("Format conversion '{conversion}' cannot render a {kind}")]
    IllegalConversion {
        /// Conversion character
        conversion: char,
        /// Kind of the offending argument
        kind: &'static str,
    },
    /// Template ends inside a specifier
    #[error("Incomplete format specifier")]
    Incomplete,
    /// Malformed index, width or precision
    #[error("Invalid format specifier: {0}")]
    InvalidSpecifier(String),
}

/// Formats `template` with `args`.
///
/// # Example
///
/// ```
/// # use adapter_logger::{format, Value};
/// let text = format("hello %s, %d%%", &[Value::from("world"), Value::from(100)]).unwrap();
/// assert_eq!(text, "hello world, 100%");
/// ```
pub fn format(template: &str, args: &[Value]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut ordinary = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let spec = Spec::parse(&mut chars)?;
        match spec.conversion {
            '%' => spec.pad_into(&mut out, "%"),
            'n' => out.push('\n'),
            _ => {
                let index = spec.index.unwrap_or_else(|| {
                    let index = ordinary;
                    ordinary += 1;
                    index
                });
                let value = args.get(index).ok_or(FormatError::MissingArgument(index))?;
                let text = spec.render(value)?;
                spec.pad_into(&mut out, &text);
            }
        }
    }

    Ok(out)
}

#[derive(Debug, Default)]
struct Spec {
    index: Option<usize>,
    left: bool,
    zero: bool,
    plus: bool,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

impl Spec {
    fn parse(chars: &mut Peekable<Chars<'_>>) -> Result<Spec, FormatError> {
        let mut spec = Spec::default();

        let mut digits = take_digits(chars);
        if !digits.is_empty() && chars.peek() == Some(&'$') {
            chars.next();
            match parse_number(&digits)? {
                0 => return Err(FormatError::InvalidSpecifier("argument index 0".to_string())),
                position => spec.index = Some(position - 1),
            }
            digits.clear();
        }

        if digits.is_empty() {
            while let Some(&flag) = chars.peek() {
                match flag {
                    '-' => spec.left = true,
                    '0' => spec.zero = true,
                    '+' => spec.plus = true,
                    _ => break,
                }
                chars.next();
            }
            digits = take_digits(chars);
        } else if digits.starts_with('0') {
            // A leading zero of the width is the zero padding flag
            spec.zero = true;
            digits.remove(0);
        }

        if !digits.is_empty() {
            spec.width = parse_number(&digits)?;
        }

        if chars.peek() == Some(&'.') {
            chars.next();
            let digits = take_digits(chars);
            if digits.is_empty() {
                return Err(FormatError::InvalidSpecifier("missing precision".to_string()));
            }
            spec.precision = Some(parse_number(&digits)?);
        }

        spec.conversion = chars.next().ok_or(FormatError::Incomplete)?;
        if !CONVERSIONS.contains(spec.conversion) {
            return Err(FormatError::UnknownConversion(spec.conversion));
        }
        Ok(spec)
    }

    fn render(&self, value: &Value) -> Result<String, FormatError> {
        let illegal = || FormatError::IllegalConversion {
            conversion: self.conversion,
            kind: value.kind(),
        };

        let text = match (self.conversion, value) {
            ('s', _) | ('S', _) => {
                let text = value.to_string();
                let text = match self.precision {
                    Some(precision) => text.chars().take(precision).collect(),
                    None => text,
                };
                if self.conversion == 'S' {
                    text.to_uppercase()
                } else {
                    text
                }
            }
            ('b', _) | ('B', _) => {
                let b = match value {
                    Value::Null => false,
                    Value::Bool(b) => *b,
                    _ => true,
                };
                if self.conversion == 'B' {
                    b.to_string().to_uppercase()
                } else {
                    b.to_string()
                }
            }
            (_, Value::Null) => "null".to_string(),
            ('d', Value::Int(i)) => self.signed(i.to_string(), *i >= 0),
            ('d', Value::UInt(u)) => self.signed(u.to_string(), true),
            ('x', Value::Int(i)) => format!("{:x}", i),
            ('x', Value::UInt(u)) => format!("{:x}", u),
            ('X', Value::Int(i)) => format!("{:X}", i),
            ('X', Value::UInt(u)) => format!("{:X}", u),
            ('o', Value::Int(i)) => format!("{:o}", i),
            ('o', Value::UInt(u)) => format!("{:o}", u),
            ('f', Value::Float(v)) => {
                let text = format!("{:.*}", self.precision.unwrap_or(6), v);
                self.signed(text, *v >= 0.0)
            }
            ('c', Value::Char(c)) => c.to_string(),
            ('c', Value::Int(i)) => u32::try_from(*i)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(illegal)?
                .to_string(),
            ('c', Value::UInt(u)) => u32::try_from(*u)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(illegal)?
                .to_string(),
            _ => return Err(illegal()),
        };
        Ok(text)
    }

    fn signed(&self, text: String, non_negative: bool) -> String {
        if self.plus && non_negative {
            format!("+{}", text)
        } else {
            text
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self.conversion, 'd' | 'x' | 'X' | 'o' | 'f')
    }

    fn pad_into(&self, out: &mut String, text: &str) {
        let len = text.chars().count();
        if len >= self.width {
            out.push_str(text);
            return;
        }

        let fill = self.width - len;
        if self.left {
            out.push_str(text);
            out.extend(std::iter::repeat(' ').take(fill));
        } else if self.zero && self.is_numeric() {
            let (sign, digits) = match text.chars().next() {
                Some('-') | Some('+') => text.split_at(1),
                _ => ("", text),
            };
            out.push_str(sign);
            out.extend(std::iter::repeat('0').take(fill));
            out.push_str(digits);
        } else {
            out.extend(std::iter::repeat(' ').take(fill));
            out.push_str(text);
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

fn parse_number(digits: &str) -> Result<usize, FormatError> {
    digits
        .parse()
        .map_err(|_| FormatError::InvalidSpecifier(format!("number {} out of range", digits)))
}
