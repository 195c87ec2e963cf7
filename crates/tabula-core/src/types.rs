//! SQL scalar type descriptors and the type registry.
//!
//! A [`SqlType`] pairs a canonical dialect name (e.g. `VARCHAR(255)`) with a
//! cast discipline: every value destined for a column of that type is first
//! normalized to a canonical [`SqlValue`] variant, and literal rendering is
//! only defined for values the cast accepts. The [`TypeRegistry`] maps
//! driver-reported type names back to registered descriptors during schema
//! introspection.

use crate::error::{Result, TypeError};
use crate::value::SqlValue;

/// The cast discipline of a SQL type: which canonical variant values are
/// normalized to before binding or literal rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    /// Normalizes to `SqlValue::Int`.
    Int,
    /// Normalizes to `SqlValue::Float`.
    Float,
    /// Normalizes to `SqlValue::Text`.
    Text,
    /// Normalizes to `SqlValue::Bool`.
    Bool,
}

impl CastKind {
    fn cast(self, type_name: &str, value: &SqlValue) -> Result<SqlValue> {
        let reject = || TypeError::Conversion {
            type_name: type_name.to_string(),
            value: format!("{value:?}"),
        };

        match self {
            Self::Int => match value {
                SqlValue::Int(n) => Ok(SqlValue::Int(*n)),
                SqlValue::Bool(b) => Ok(SqlValue::Int(i64::from(*b))),
                SqlValue::Float(f) if f.is_finite() => Ok(SqlValue::Int(f.trunc() as i64)),
                SqlValue::Text(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(SqlValue::Int)
                    .map_err(|_| reject()),
                _ => Err(reject()),
            },
            Self::Float => match value {
                SqlValue::Float(f) => Ok(SqlValue::Float(*f)),
                SqlValue::Int(n) => Ok(SqlValue::Float(*n as f64)),
                SqlValue::Bool(b) => Ok(SqlValue::Float(f64::from(u8::from(*b)))),
                SqlValue::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(SqlValue::Float)
                    .map_err(|_| reject()),
                _ => Err(reject()),
            },
            Self::Text => match value {
                SqlValue::Text(s) => Ok(SqlValue::Text(s.clone())),
                SqlValue::Int(n) => Ok(SqlValue::Text(n.to_string())),
                SqlValue::Float(f) => Ok(SqlValue::Text(f.to_string())),
                SqlValue::Bool(b) => Ok(SqlValue::Text(b.to_string())),
                _ => Err(reject()),
            },
            Self::Bool => match value {
                SqlValue::Bool(b) => Ok(SqlValue::Bool(*b)),
                SqlValue::Int(n) => Ok(SqlValue::Bool(*n != 0)),
                SqlValue::Float(f) => Ok(SqlValue::Bool(*f != 0.0)),
                SqlValue::Text(s) => match s.to_ascii_lowercase().as_str() {
                    "1" | "true" => Ok(SqlValue::Bool(true)),
                    "0" | "false" | "" => Ok(SqlValue::Bool(false)),
                    _ => Err(reject()),
                },
                _ => Err(reject()),
            },
        }
    }
}

/// Descriptor of a scalar SQL type.
///
/// Two descriptors are equal iff their base name and parameterization
/// arguments are equal; the cast discipline, default and tags do not take
/// part in identity. Instances are immutable; [`SqlType::with_args`] yields
/// a fresh descriptor and is only permitted for modifiable types.
#[derive(Debug, Clone)]
pub struct SqlType {
    base: String,
    args: Vec<u32>,
    kind: CastKind,
    default: SqlValue,
    modifiable: bool,
    tags: Vec<String>,
}

impl SqlType {
    /// Creates a custom type descriptor.
    ///
    /// Fails with [`TypeError::Definition`] when the supplied default does
    /// not survive the type's own cast, so every constructible descriptor
    /// carries a self-consistent default.
    pub fn custom(
        base: impl Into<String>,
        args: Vec<u32>,
        kind: CastKind,
        default: SqlValue,
        modifiable: bool,
        tags: Vec<String>,
    ) -> Result<Self> {
        let base = base.into();
        let name = render_name(&base, &args);
        if kind.cast(&name, &default).is_err() {
            return Err(TypeError::Definition(format!(
                "default value {default:?} is not castable to {name}"
            )));
        }
        Ok(Self {
            base,
            args,
            kind,
            default,
            modifiable,
            tags,
        })
    }

    fn builtin(
        base: &str,
        args: Vec<u32>,
        kind: CastKind,
        default: SqlValue,
        modifiable: bool,
        tag: &str,
    ) -> Self {
        Self {
            base: base.to_string(),
            args,
            kind,
            default,
            modifiable,
            tags: vec![tag.to_string()],
        }
    }

    /// `INT`: casts to integer, defaults to 0.
    #[must_use]
    pub fn integer() -> Self {
        Self::builtin("INT", vec![], CastKind::Int, SqlValue::Int(0), false, "INTEGER")
    }

    /// `VARCHAR(size)`: casts to text, defaults to the empty string.
    #[must_use]
    pub fn string(size: u32) -> Self {
        Self::builtin(
            "VARCHAR",
            vec![size],
            CastKind::Text,
            SqlValue::Text(String::new()),
            true,
            "STRING",
        )
    }

    /// `BIT(size)`: casts to integer, defaults to 0.
    #[must_use]
    pub fn bit(size: u32) -> Self {
        Self::builtin("BIT", vec![size], CastKind::Int, SqlValue::Int(0), true, "BIT")
    }

    /// `FLOAT`: casts to float, defaults to 0.
    #[must_use]
    pub fn float() -> Self {
        Self::builtin("FLOAT", vec![], CastKind::Float, SqlValue::Float(0.0), false, "FLOAT")
    }

    /// `DOUBLE(size,dec)`: casts to float, defaults to 0.
    #[must_use]
    pub fn double(size: u32, dec: u32) -> Self {
        Self::builtin(
            "DOUBLE",
            vec![size, dec],
            CastKind::Float,
            SqlValue::Float(0.0),
            true,
            "DOUBLE",
        )
    }

    /// `DECIMAL(size,dec)`: casts to float, defaults to 0.
    #[must_use]
    pub fn decimal(size: u32, dec: u32) -> Self {
        Self::builtin(
            "DECIMAL",
            vec![size, dec],
            CastKind::Float,
            SqlValue::Float(0.0),
            true,
            "DECIMAL",
        )
    }

    /// `BIT(1)` with boolean cast semantics, defaults to false.
    #[must_use]
    pub fn boolean() -> Self {
        Self::builtin("BIT", vec![1], CastKind::Bool, SqlValue::Bool(false), false, "BOOL")
    }

    /// The canonical, parameter-qualified name, e.g. `VARCHAR(255)`.
    #[must_use]
    pub fn name(&self) -> String {
        render_name(&self.base, &self.args)
    }

    /// The base type name without parameterization.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The parameterization arguments.
    #[must_use]
    pub fn args(&self) -> &[u32] {
        &self.args
    }

    /// The cast discipline of this type.
    #[must_use]
    pub fn kind(&self) -> CastKind {
        self.kind
    }

    /// The canonical default value.
    #[must_use]
    pub fn default_value(&self) -> &SqlValue {
        &self.default
    }

    /// Whether [`SqlType::with_args`] may reparameterize this type.
    #[must_use]
    pub fn modifiable(&self) -> bool {
        self.modifiable
    }

    /// Free-form classification tags (used for reverse name lookup).
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Normalizes a value to this type's canonical representation.
    ///
    /// Total over the declared input domain; anything else fails with
    /// [`TypeError::Conversion`]. `Null` is always rejected.
    pub fn cast(&self, value: &SqlValue) -> Result<SqlValue> {
        self.kind.cast(&self.name(), value)
    }

    /// Renders a value as an SQL literal, casting it first.
    ///
    /// Never emits a literal for a value [`SqlType::cast`] rejects. Used
    /// only for schema-definition contexts such as DEFAULT clauses.
    pub fn parse(&self, value: &SqlValue) -> Result<String> {
        let canonical = self.cast(value)?;
        Ok(match canonical {
            SqlValue::Bool(b) => String::from(if b { "1" } else { "0" }),
            other => other.to_sql_inline(),
        })
    }

    /// Returns a fresh descriptor with new parameterization arguments.
    ///
    /// Fails with [`TypeError::Definition`] when the type is not modifiable.
    pub fn with_args(&self, args: Vec<u32>) -> Result<Self> {
        if !self.modifiable {
            return Err(TypeError::Definition(format!(
                "{} does not accept new arguments",
                self.name()
            )));
        }
        let mut reparameterized = self.clone();
        reparameterized.args = args;
        Ok(reparameterized)
    }
}

impl PartialEq for SqlType {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.args == other.args
    }
}

impl Eq for SqlType {}

impl std::hash::Hash for SqlType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.base.hash(state);
        self.args.hash(state);
    }
}

fn render_name(base: &str, args: &[u32]) -> String {
    if args.is_empty() {
        base.to_string()
    } else {
        let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
        format!("{base}({})", rendered.join(","))
    }
}

/// An explicit mapping from canonical type names to registered descriptors.
///
/// Supplied to schema introspection so driver-reported type names can be
/// resolved without hidden process-wide state.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<SqlType>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding all built-in types.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SqlType::integer());
        registry.register(SqlType::string(255));
        registry.register(SqlType::bit(1));
        registry.register(SqlType::float());
        registry.register(SqlType::double(12, 6));
        registry.register(SqlType::decimal(12, 6));
        registry.register(SqlType::boolean());
        registry
    }

    /// Registers a type descriptor.
    pub fn register(&mut self, sql_type: SqlType) {
        self.types.push(sql_type);
    }

    /// Returns the registered descriptors in registration order.
    #[must_use]
    pub fn types(&self) -> &[SqlType] {
        &self.types
    }

    /// Resolves a driver-reported type name to a registered descriptor.
    ///
    /// Exact canonical matches win; otherwise a base-name match on a
    /// modifiable type is reparameterized with the reported arguments.
    /// Anything else fails with [`TypeError::UnrecognizedType`].
    pub fn resolve(&self, driver_name: &str) -> Result<SqlType> {
        let (base, args) = split_driver_name(driver_name)
            .ok_or_else(|| TypeError::UnrecognizedType(driver_name.to_string()))?;

        if let Some(exact) = self
            .types
            .iter()
            .find(|t| t.base().eq_ignore_ascii_case(&base) && t.args() == args.as_slice())
        {
            return Ok(exact.clone());
        }

        for candidate in &self.types {
            if candidate.base().eq_ignore_ascii_case(&base) {
                if candidate.modifiable() {
                    return candidate.with_args(args);
                }
                if args.is_empty() {
                    return Ok(candidate.clone());
                }
            }
        }

        Err(TypeError::UnrecognizedType(driver_name.to_string()))
    }
}

/// Splits `VARCHAR(255)` into `("VARCHAR", [255])`; bare names get no args.
fn split_driver_name(name: &str) -> Option<(String, Vec<u32>)> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let Some(open) = name.find('(') else {
        return Some((name.to_string(), vec![]));
    };
    let close = name.rfind(')')?;
    if close < open {
        return None;
    }
    let base = name[..open].trim().to_string();
    let inner = &name[open + 1..close];
    let mut args = Vec::new();
    for part in inner.split(',') {
        args.push(part.trim().parse::<u32>().ok()?);
    }
    Some((base, args))
}
