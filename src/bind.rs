//! Bind descriptor resolution.
//!
//! [`resolve`] merges scanner output with caller-supplied binds and produces
//! one [`BindDescriptor`] per distinct placeholder, in first-occurrence order.
//! All validation happens here, before anything is sent to the session.
//!
//! Binds come in two shapes:
//! - positional: one entry per distinct placeholder, in text order;
//! - named: keyed by placeholder name (leading `:` optional, unquoted names
//!   are case-insensitive, `"Quoted"` names are exact).
//!
//! Each entry is either a bare [`Value`] (an IN bind whose type is inferred)
//! or a [`BindSpec`] carrying direction, type, max size and value.

use tracing::debug;

use crate::config::BindConfig;
use crate::convert::{infer_type, validate};
use crate::error::{BindSlot, Error, Result};
use crate::scanner::StatementInfo;
use crate::types::{DbType, Value};

/// Bind direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindDirection {
    /// Caller to server.
    In,
    /// Server to caller.
    Out,
    /// Both ways.
    InOut,
}

impl BindDirection {
    /// Numeric code for IN.
    pub const BIND_IN: u32 = 3001;
    /// Numeric code for IN OUT.
    pub const BIND_INOUT: u32 = 3002;
    /// Numeric code for OUT.
    pub const BIND_OUT: u32 = 3003;

    /// Parse a numeric direction code.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            Self::BIND_IN => Ok(BindDirection::In),
            Self::BIND_INOUT => Ok(BindDirection::InOut),
            Self::BIND_OUT => Ok(BindDirection::Out),
            _ => Err(Error::InvalidBindDirection),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            BindDirection::In => Self::BIND_IN,
            BindDirection::InOut => Self::BIND_INOUT,
            BindDirection::Out => Self::BIND_OUT,
        }
    }

    /// Whether the caller sends a value.
    pub fn is_input(&self) -> bool {
        matches!(self, BindDirection::In | BindDirection::InOut)
    }

    /// Whether the server returns a value.
    pub fn is_output(&self) -> bool {
        matches!(self, BindDirection::Out | BindDirection::InOut)
    }
}

/// Caller-supplied bind attributes. Unset fields are defaulted by [`resolve`].
///
/// # Example
///
/// ```
/// use oracle_thin_bind::{BindDirection, BindSpec, DbType};
///
/// let out = BindSpec::output(DbType::Varchar).with_max_size(50);
/// assert_eq!(out.dir, Some(BindDirection::Out));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindSpec {
    pub dir: Option<BindDirection>,
    pub db_type: Option<DbType>,
    pub max_size: Option<u32>,
    pub value: Option<Value>,
    pub max_array_size: Option<u32>,
}

impl BindSpec {
    /// Empty spec. Resolving it fails until at least one attribute is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// IN bind with a value.
    pub fn input(value: impl Into<Value>) -> Self {
        Self::new().with_dir(BindDirection::In).with_value(value)
    }

    /// OUT bind of a type.
    pub fn output(db_type: DbType) -> Self {
        Self::new().with_dir(BindDirection::Out).with_type(db_type)
    }

    /// IN OUT bind with an initial value.
    pub fn in_out(value: impl Into<Value>) -> Self {
        Self::new().with_dir(BindDirection::InOut).with_value(value)
    }

    pub fn with_dir(mut self, dir: BindDirection) -> Self {
        self.dir = Some(dir);
        self
    }

    /// Set the direction from its numeric code.
    pub fn with_dir_code(mut self, code: u32) -> Result<Self> {
        self.dir = Some(BindDirection::from_code(code)?);
        Ok(self)
    }

    pub fn with_type(mut self, db_type: DbType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_max_array_size(mut self, size: u32) -> Self {
        self.max_array_size = Some(size);
        self
    }

    fn is_empty(&self) -> bool {
        self.dir.is_none()
            && self.db_type.is_none()
            && self.max_size.is_none()
            && self.value.is_none()
            && self.max_array_size.is_none()
    }
}

/// One caller-supplied bind.
#[derive(Debug, Clone, PartialEq)]
pub enum BindParam {
    /// Bare value: IN, type inferred.
    Value(Value),
    /// Explicit attributes.
    Spec(BindSpec),
}

impl<T: Into<Value>> From<T> for BindParam {
    fn from(value: T) -> Self {
        BindParam::Value(value.into())
    }
}

impl From<BindSpec> for BindParam {
    fn from(spec: BindSpec) -> Self {
        BindParam::Spec(spec)
    }
}

/// All binds for one execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Binds {
    /// No binds.
    #[default]
    None,
    /// By position.
    Positional(Vec<BindParam>),
    /// By name.
    Named(Vec<(String, BindParam)>),
}

impl Binds {
    /// Positional binds from anything convertible to [`BindParam`].
    pub fn positional<I, P>(params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<BindParam>,
    {
        Binds::Positional(params.into_iter().map(Into::into).collect())
    }

    /// Named binds from `(name, param)` pairs.
    pub fn named<I, K, P>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<BindParam>,
    {
        Binds::Named(
            params
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
        )
    }
}

/// Fully resolved bind, immutable after [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct BindDescriptor {
    /// How the caller identified this slot.
    slot: BindSlot,
    /// Placeholder name as scanned from the text.
    pub placeholder: String,
    pub dir: BindDirection,
    pub db_type: DbType,
    /// Buffer size for variable-length types; 0 for fixed-width types.
    pub max_size: u32,
    /// Value to send (IN and IN OUT). Owned copy of the caller's value.
    pub value: Option<Value>,
    /// Array bind with at most this many elements.
    pub max_array_size: Option<u32>,
    /// Placeholder only appears after `RETURNING ... INTO`.
    pub is_return: bool,
    /// Original type when a long PL/SQL string or raw was promoted to a LOB.
    pub promoted_from: Option<DbType>,
}

impl BindDescriptor {
    /// Bind name, when bound by name.
    pub fn name(&self) -> Option<&str> {
        match &self.slot {
            BindSlot::Name(name) => Some(name),
            BindSlot::Position(_) => None,
        }
    }

    /// 1-based position, when bound by position.
    pub fn position(&self) -> Option<usize> {
        match &self.slot {
            BindSlot::Position(pos) => Some(*pos),
            BindSlot::Name(_) => None,
        }
    }

    pub fn slot(&self) -> &BindSlot {
        &self.slot
    }

    pub fn is_array(&self) -> bool {
        self.max_array_size.is_some()
    }
}

/// Normalize a caller-supplied bind name the way the scanner normalizes
/// placeholders.
pub fn normalize_bind_name(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_prefix(':').unwrap_or(name).trim_start();
    if let Some(quoted) = name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
        quoted.to_string()
    } else if name.chars().all(|c| c.is_numeric()) {
        name.to_string()
    } else {
        name.to_uppercase()
    }
}

/// Resolve caller binds against a scanned statement.
pub fn resolve(info: &StatementInfo, binds: &Binds, config: &BindConfig) -> Result<Vec<BindDescriptor>> {
    let expected = info.bind_names.len();
    let descriptors = match binds {
        Binds::None if expected == 0 => Vec::new(),
        Binds::None => {
            return Err(Error::MissingBindValue {
                name: info.bind_names[0].clone(),
            })
        }
        Binds::Positional(params) => {
            if params.len() != expected {
                return Err(Error::WrongNumberOfPositionalBinds {
                    expected,
                    actual: params.len(),
                });
            }
            params
                .iter()
                .enumerate()
                .map(|(i, param)| {
                    if matches!(param, BindParam::Value(Value::Object(_))) {
                        return Err(Error::MixedBind);
                    }
                    let slot = BindSlot::Position(i + 1);
                    resolve_one(info, &info.bind_names[i], i + 1, slot, param, config)
                })
                .collect::<Result<Vec<_>>>()?
        }
        Binds::Named(params) => {
            let mut by_position: Vec<Option<&BindParam>> = vec![None; expected];
            for (name, param) in params {
                let normalized = normalize_bind_name(name);
                let index = info
                    .position_of(&normalized)
                    .or_else(|| info.position_of(name.trim_start_matches(':')))
                    .ok_or_else(|| Error::InvalidBindName {
                        name: name.trim_start_matches(':').to_string(),
                    })?;
                by_position[index] = Some(param);
            }
            by_position
                .into_iter()
                .enumerate()
                .map(|(i, param)| {
                    let placeholder = &info.bind_names[i];
                    let param = param.ok_or_else(|| Error::MissingBindValue {
                        name: placeholder.clone(),
                    })?;
                    let slot = BindSlot::Name(placeholder.clone());
                    resolve_one(info, placeholder, i + 1, slot, param, config)
                })
                .collect::<Result<Vec<_>>>()?
        }
    };

    debug!(
        binds = descriptors.len(),
        outputs = descriptors.iter().filter(|d| d.dir.is_output()).count(),
        arrays = descriptors.iter().filter(|d| d.is_array()).count(),
        "resolved binds"
    );
    Ok(descriptors)
}

fn resolve_one(
    info: &StatementInfo,
    placeholder: &str,
    position: usize,
    slot: BindSlot,
    param: &BindParam,
    config: &BindConfig,
) -> Result<BindDescriptor> {
    let mut spec = match param {
        BindParam::Value(value) => BindSpec::input(value.clone()),
        BindParam::Spec(spec) if spec.is_empty() => return Err(Error::InvalidBindUnit),
        BindParam::Spec(spec) => spec.clone(),
    };
    let dir = spec.dir.unwrap_or(BindDirection::In);

    if let Some(value) = &spec.value {
        if matches!(value, Value::Object(_)) {
            return Err(Error::InvalidBindDataType { position });
        }
    }

    // OUT binds ignore any value the caller attached.
    let value = if dir.is_input() { spec.value.take() } else { None };
    let value = value.filter(|v| !v.is_null() || spec.max_array_size.is_some());
    let is_array = spec.max_array_size.is_some() || matches!(value, Some(Value::Array(_)));

    let db_type = match (spec.db_type, value.as_ref().and_then(infer_type)) {
        (Some(db_type), _) => db_type,
        (None, Some(inferred)) => inferred,
        (None, None) if dir.is_output() && config.require_out_type => {
            return Err(Error::MissingType { slot });
        }
        (None, None) if dir.is_output() => config.default_out_type,
        (None, None) => DbType::Varchar,
    };

    let max_array_size = if is_array {
        Some(check_array(dir, db_type, &spec, value.as_ref(), &slot)?)
    } else {
        if let Some(value) = &value {
            check_scalar(db_type, value, &slot)?;
        }
        None
    };

    let mut max_size = size_for(dir, db_type, &spec, value.as_ref(), &slot, config)?;
    let mut db_type = db_type;
    let mut promoted_from = None;
    if info.is_plsql() && !is_array && max_size > config.plsql_max_string_size {
        let promoted = match db_type {
            DbType::Varchar | DbType::Char | DbType::Long => Some(DbType::Clob),
            DbType::Raw | DbType::LongRaw => Some(DbType::Blob),
            _ => None,
        };
        if let Some(lob_type) = promoted {
            promoted_from = Some(db_type);
            db_type = lob_type;
        }
    }
    if !db_type.is_variable_length() && promoted_from.is_none() {
        max_size = 0;
    }

    Ok(BindDescriptor {
        slot,
        placeholder: placeholder.to_string(),
        dir,
        db_type,
        max_size,
        value,
        max_array_size,
        is_return: info.is_return_bind(placeholder),
        promoted_from,
    })
}

fn check_scalar(db_type: DbType, value: &Value, slot: &BindSlot) -> Result<()> {
    if matches!(value, Value::Float(f) if f.is_nan()) && db_type.is_numeric() {
        return Err(Error::NanValue);
    }
    if !validate(db_type, value) {
        return Err(Error::BindValueTypeMismatch { slot: slot.clone() });
    }
    Ok(())
}

/// Validate an array bind and return its max array size.
fn check_array(
    dir: BindDirection,
    db_type: DbType,
    spec: &BindSpec,
    value: Option<&Value>,
    slot: &BindSlot,
) -> Result<u32> {
    if db_type.is_lob() || matches!(db_type, DbType::Cursor) {
        return Err(Error::InvalidTypeForArrayBind);
    }
    let items: &[Value] = match value {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => &[],
        Some(_) => return Err(Error::BindValueTypeMismatch { slot: slot.clone() }),
    };

    let max_array_size = match spec.max_array_size {
        Some(0) | None if dir.is_output() => return Err(Error::RequiredMaxArraySize),
        Some(n) => n,
        None => items.len() as u32,
    };
    if dir.is_input() && items.len() > max_array_size as usize {
        return Err(Error::InvalidArraySize);
    }

    for (index, item) in items.iter().enumerate() {
        if matches!(item, Value::Array(_) | Value::Object(_)) {
            return Err(Error::InvalidTypeForArrayBind);
        }
        if matches!(item, Value::Float(f) if f.is_nan()) && db_type.is_numeric() {
            return Err(Error::NanValue);
        }
        if !validate(db_type, item) {
            return Err(Error::IncompatibleArrayElement {
                index,
                slot: slot.clone(),
            });
        }
        if let (Some(max_size), true) = (spec.max_size, db_type.is_variable_length()) {
            if max_size > 0 && item.bind_len() > max_size as usize {
                return Err(Error::MaxSizeTooSmall {
                    slot: slot.clone(),
                    max_size,
                    length: item.bind_len(),
                });
            }
        }
    }
    Ok(max_array_size)
}

/// Buffer size for a variable-length bind.
fn size_for(
    dir: BindDirection,
    db_type: DbType,
    spec: &BindSpec,
    value: Option<&Value>,
    slot: &BindSlot,
    config: &BindConfig,
) -> Result<u32> {
    if !db_type.is_variable_length() {
        return Ok(0);
    }
    let value_len = match value {
        Some(Value::Array(items)) => items.iter().map(Value::bind_len).max().unwrap_or(0),
        Some(v) => v.bind_len(),
        None => 0,
    } as u32;

    let size = match (dir, spec.max_size) {
        (BindDirection::In, declared) => declared.unwrap_or(0).max(value_len),
        (_, Some(0)) => return Err(Error::MissingMaxSize { slot: slot.clone() }),
        (_, Some(declared)) => declared.max(value_len),
        (_, None) => config.default_out_max_size.max(value_len),
    };
    Ok(size.max(1))
}
