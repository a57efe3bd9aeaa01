//! Parameters
//!
//! Hyperparameter introspection for estimators. Every estimator declares its
//! parameters in a static descriptor table; `get_params`, `set_params` and
//! `repr` work against that table. Nested estimators are addressed with a
//! two-level [`ParamKey`] (`parent`, optional `child`), written `parent__child`
//! when flattened into a [`Params`] map.
use crate::errors::DetectorError;
use crate::utils::{format_float, format_float_precision};
use hashbrown::HashMap;
use log::warn;
use std::collections::BTreeMap;
use std::fmt;

/// Separator between a parent parameter and a nested estimator's parameter.
pub const NESTED_DELIMITER: &str = "__";
/// Lines of a repr are wrapped before reaching this width.
pub const REPR_LINE_WIDTH: usize = 75;
/// Single `name=value` renderings longer than this are truncated.
pub const REPR_MAX_VALUE_LEN: usize = 500;
const REPR_HEAD_LEN: usize = 300;
const REPR_TAIL_LEN: usize = 100;

/// Flattened, name sorted parameter map.
pub type Params = BTreeMap<String, ParamValue>;

/// How a parameter is declared by its estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// An explicit, named parameter.
    Named,
    /// A catch-all positional list. Estimators declaring one cannot be introspected.
    VariadicPositional,
}

/// Static declaration of one estimator parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamDescriptor {
    pub const fn named(name: &'static str) -> Self {
        ParamDescriptor {
            name,
            kind: ParamKind::Named,
        }
    }

    pub const fn variadic(name: &'static str) -> Self {
        ParamDescriptor {
            name,
            kind: ParamKind::VariadicPositional,
        }
    }
}

/// Address of a parameter: a top-level name and, for nested estimators, the
/// key inside that estimator. The child may itself be nested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamKey {
    pub name: String,
    pub child: Option<String>,
}

impl ParamKey {
    pub fn new(name: impl Into<String>) -> Self {
        ParamKey {
            name: name.into(),
            child: None,
        }
    }

    pub fn nested(name: impl Into<String>, child: impl Into<String>) -> Self {
        ParamKey {
            name: name.into(),
            child: Some(child.into()),
        }
    }

    /// Split a flattened key on its first delimiter.
    pub fn parse(key: &str) -> Self {
        match key.split_once(NESTED_DELIMITER) {
            Some((name, child)) => ParamKey::nested(name, child),
            None => ParamKey::new(key),
        }
    }
}

impl From<&str> for ParamKey {
    fn from(key: &str) -> Self {
        ParamKey::parse(key)
    }
}

impl From<String> for ParamKey {
    fn from(key: String) -> Self {
        ParamKey::parse(&key)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.child {
            Some(child) => write!(f, "{}{}{}", self.name, NESTED_DELIMITER, child),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Turn a flattened map, e.g. the output of `get_params`, into keyed pairs
/// accepted by `set_params`.
pub fn into_keyed(params: Params) -> Vec<(ParamKey, ParamValue)> {
    params.into_iter().map(|(k, v)| (ParamKey::parse(&k), v)).collect()
}

/// Value of a hyperparameter.
pub enum ParamValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    FloatArray(Vec<f64>),
    /// A nested estimator, owned by its parent.
    Estimator(Box<dyn Estimator>),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::None => "none",
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
            ParamValue::FloatArray(_) => "float array",
            ParamValue::Estimator(_) => "estimator",
        }
    }

    fn mismatch(&self, name: &str, expected: &str) -> DetectorError {
        DetectorError::InvalidParameterValue(name.to_string(), expected.to_string(), self.type_name().to_string())
    }

    /// Read a float parameter, integers are widened.
    pub fn to_f64(&self, name: &str) -> Result<f64, DetectorError> {
        match self {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            _ => Err(self.mismatch(name, "float")),
        }
    }

    pub fn to_i64(&self, name: &str) -> Result<i64, DetectorError> {
        match self {
            ParamValue::Int(v) => Ok(*v),
            _ => Err(self.mismatch(name, "int")),
        }
    }

    /// Read a non-negative integer parameter.
    pub fn to_usize(&self, name: &str) -> Result<usize, DetectorError> {
        let v = self.to_i64(name)?;
        usize::try_from(v)
            .map_err(|_| DetectorError::InvalidParameterValue(name.to_string(), "non-negative int".to_string(), v.to_string()))
    }

    pub fn to_bool(&self, name: &str) -> Result<bool, DetectorError> {
        match self {
            ParamValue::Bool(v) => Ok(*v),
            _ => Err(self.mismatch(name, "bool")),
        }
    }

    pub fn into_string(self, name: &str) -> Result<String, DetectorError> {
        match self {
            ParamValue::Str(v) => Ok(v),
            other => Err(other.mismatch(name, "string")),
        }
    }

    pub fn into_estimator(self, name: &str) -> Result<Box<dyn Estimator>, DetectorError> {
        match self {
            ParamValue::Estimator(e) => Ok(e),
            other => Err(other.mismatch(name, "estimator")),
        }
    }

    /// Text rendering of the value as it appears in a repr.
    pub fn render(&self, options: &PrintOptions) -> Result<String, DetectorError> {
        Ok(match self {
            ParamValue::None => "None".to_string(),
            ParamValue::Bool(v) => v.to_string(),
            ParamValue::Int(v) => v.to_string(),
            ParamValue::Float(v) => format_float(*v),
            ParamValue::Str(v) => format!("{:?}", v),
            ParamValue::FloatArray(v) => options.format_array(v),
            ParamValue::Estimator(e) => e.repr()?,
        })
    }
}

impl Clone for ParamValue {
    fn clone(&self) -> Self {
        match self {
            ParamValue::None => ParamValue::None,
            ParamValue::Bool(v) => ParamValue::Bool(*v),
            ParamValue::Int(v) => ParamValue::Int(*v),
            ParamValue::Float(v) => ParamValue::Float(*v),
            ParamValue::Str(v) => ParamValue::Str(v.clone()),
            ParamValue::FloatArray(v) => ParamValue::FloatArray(v.clone()),
            ParamValue::Estimator(e) => ParamValue::Estimator(e.clone_box()),
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::None, ParamValue::None) => true,
            (ParamValue::Bool(a), ParamValue::Bool(b)) => a == b,
            (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
            (ParamValue::Float(a), ParamValue::Float(b)) => a == b,
            (ParamValue::Str(a), ParamValue::Str(b)) => a == b,
            (ParamValue::FloatArray(a), ParamValue::FloatArray(b)) => a == b,
            // Estimators are equal when they are configured the same way.
            (ParamValue::Estimator(a), ParamValue::Estimator(b)) => {
                a.class_name() == b.class_name()
                    && matches!((a.get_params(false), b.get_params(false)), (Ok(pa), Ok(pb)) if pa == pb)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.render(&PrintOptions::default()) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::FloatArray(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ParamValue::None, Into::into)
    }
}

/// Number formatting used while rendering a repr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    /// Decimals kept for array items.
    pub precision: usize,
    /// Arrays longer than this are summarized.
    pub threshold: usize,
    /// Items kept at each end of a summarized array.
    pub edge_items: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            precision: 5,
            threshold: 64,
            edge_items: 2,
        }
    }
}

impl PrintOptions {
    pub fn format_array(&self, v: &[f64]) -> String {
        let fmt = |x: &f64| format_float_precision(*x, self.precision);
        let items: Vec<String> = if v.len() > self.threshold && v.len() > 2 * self.edge_items {
            v[..self.edge_items]
                .iter()
                .map(fmt)
                .chain(std::iter::once("...".to_string()))
                .chain(v[v.len() - self.edge_items..].iter().map(fmt))
                .collect()
        } else {
            v.iter().map(fmt).collect()
        };
        format!("[{}]", items.join(", "))
    }
}

/// Shorten a rendering to a head and a tail around an ellipsis.
fn truncate_repr(s: String) -> String {
    let n_chars = s.chars().count();
    if n_chars <= REPR_MAX_VALUE_LEN {
        return s;
    }
    let head: String = s.chars().take(REPR_HEAD_LEN).collect();
    let tail: String = s.chars().skip(n_chars - REPR_TAIL_LEN).collect();
    format!("{}...{}", head, tail)
}

/// Render `name=value` pairs, wrapping lines before [`REPR_LINE_WIDTH`].
///
/// * `params` - Parameters, rendered in key order.
/// * `offset` - Characters already on the first line, usually the class name length.
/// * `options` - Number formatting.
pub fn pprint(params: &Params, offset: usize, options: &PrintOptions) -> Result<String, DetectorError> {
    let line_sep = format!(",\n{}", " ".repeat(1 + offset / 2));
    let mut out = String::new();
    let mut line_length = offset;
    for (i, (k, v)) in params.iter().enumerate() {
        let this_repr = truncate_repr(format!("{}={}", k, v.render(options)?));
        let this_len = this_repr.chars().count();
        if i > 0 {
            if line_length + this_len >= REPR_LINE_WIDTH || this_repr.contains('\n') {
                out.push_str(&line_sep);
                line_length = line_sep.len();
            } else {
                out.push_str(", ");
                line_length += 2;
            }
        }
        out.push_str(&this_repr);
        line_length += this_len;
    }
    Ok(out.lines().map(str::trim_end).collect::<Vec<_>>().join("\n"))
}

/// Hyperparameter introspection.
///
/// Implementors declare their parameters once in
/// [`param_descriptors`](Estimator::param_descriptors) and expose plain
/// get/set accessors per name; everything else is provided.
pub trait Estimator {
    /// Name used in reprs and error messages.
    fn class_name(&self) -> &'static str;

    /// Declared constructor parameters.
    fn param_descriptors(&self) -> &'static [ParamDescriptor];

    /// Current value of a declared parameter.
    fn get_param(&self, name: &str) -> Option<ParamValue>;

    /// Replace a declared parameter. Only called with declared names.
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), DetectorError>;

    /// Boxed copy with the same configuration.
    fn clone_box(&self) -> Box<dyn Estimator>;

    /// Sorted parameter names. Fails for estimators declaring variadic parameters.
    fn param_names(&self) -> Result<Vec<&'static str>, DetectorError> {
        let descriptors = self.param_descriptors();
        if descriptors.iter().any(|d| d.kind == ParamKind::VariadicPositional) {
            return Err(DetectorError::VariadicConstructor(self.class_name().to_string()));
        }
        let mut names: Vec<&'static str> = descriptors.iter().map(|d| d.name).collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Parameters of this estimator. With `deep`, parameters of nested
    /// estimators are added as `parent__child`.
    fn get_params(&self, deep: bool) -> Result<Params, DetectorError> {
        let mut out = Params::new();
        for name in self.param_names()? {
            let value = self.get_param(name).unwrap_or(ParamValue::None);
            if deep {
                if let ParamValue::Estimator(nested) = &value {
                    for (k, v) in nested.get_params(true)? {
                        out.insert(format!("{}{}{}", name, NESTED_DELIMITER, k), v);
                    }
                }
            }
            out.insert(name.to_string(), value);
        }
        Ok(out)
    }

    /// Set parameters, routing nested keys to the nested estimator.
    ///
    /// Every top-level name is checked before anything changes. If a value is
    /// rejected part way, the previous values are put back.
    fn set_params(&mut self, params: Vec<(ParamKey, ParamValue)>) -> Result<(), DetectorError> {
        if params.is_empty() {
            return Ok(());
        }
        let names = self.param_names()?;
        for (key, _) in &params {
            if !names.iter().any(|n| *n == key.name) {
                return Err(DetectorError::InvalidParameter {
                    key: key.name.clone(),
                    estimator: self.class_name().to_string(),
                });
            }
        }

        let snapshot = self.get_params(false)?;
        let mut direct = Vec::new();
        let mut nested: HashMap<String, Vec<(ParamKey, ParamValue)>> = HashMap::new();
        for (key, value) in params {
            match key.child {
                Some(child) => nested.entry(key.name).or_default().push((ParamKey::parse(&child), value)),
                None => direct.push((key.name, value)),
            }
        }

        let mut result = Ok(());
        for (name, value) in direct {
            result = self.set_param(&name, value);
            if result.is_err() {
                break;
            }
        }
        if result.is_ok() {
            for (name, sub_params) in nested {
                result = match self.get_param(&name) {
                    Some(ParamValue::Estimator(mut inner)) => inner
                        .set_params(sub_params)
                        .and_then(|_| self.set_param(&name, ParamValue::Estimator(inner))),
                    _ => Err(DetectorError::InvalidParameter {
                        key: format!("{}{}{}", name, NESTED_DELIMITER, sub_params[0].0),
                        estimator: self.class_name().to_string(),
                    }),
                };
                if result.is_err() {
                    break;
                }
            }
        }

        if let Err(err) = result {
            for (name, value) in snapshot {
                if let Err(restore_err) = self.set_param(&name, value) {
                    warn!(
                        "Unable to restore parameter '{}' of {}: {}",
                        name,
                        self.class_name(),
                        restore_err
                    );
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// `ClassName(a=1, b=...)` with sorted, shallow parameters.
    fn repr(&self) -> Result<String, DetectorError> {
        let class_name = self.class_name();
        let params = self.get_params(false)?;
        Ok(format!(
            "{}({})",
            class_name,
            pprint(&params, class_name.len(), &PrintOptions::default())?
        ))
    }
}

impl fmt::Debug for dyn Estimator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.repr() {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{}(...)", self.class_name()),
        }
    }
}
