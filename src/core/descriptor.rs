//! Deployment descriptor handling
//!
//! The descriptor is a serverless-style YAML document with a `functions`
//! mapping. The whole document is kept as a YAML value so that fields rustlift
//! does not know about, and the order of keys, survive the rewrite. Function
//! entries are read through the typed [`FunctionDef`] view.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::config::defaults::{CUSTOM_SECTION, ELIGIBILITY_TAG};
use crate::core::settings::SettingsLayer;
use crate::error::DescriptorError;

const FUNCTIONS_KEY: &str = "functions";
const CUSTOM_KEY: &str = "custom";
const RUNTIME_KEY: &str = "runtime";
const PACKAGE_KEY: &str = "package";
const ARTIFACT_KEY: &str = "artifact";

/// Typed view of one function entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDef {
    /// `<dir>.<name>` locator
    #[serde(default)]
    pub handler: Option<String>,

    /// Runtime identifier
    #[serde(default)]
    pub runtime: Option<String>,

    /// Packaging section
    #[serde(default)]
    pub package: Option<PackageSpec>,

    /// Free-form tags
    #[serde(default)]
    pub tags: Mapping,
}

/// Typed view of a function's `package` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageSpec {
    /// Path of the deployable archive
    #[serde(default)]
    pub artifact: Option<String>,
}

/// A function as seen by the build, eligibility already decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    /// Key of the function in the descriptor
    pub name: String,
    /// `<dir>.<name>` locator, if set
    pub handler: Option<String>,
    /// Whether rustlift builds this function
    pub eligible: bool,
    /// Runtime identifier, if set
    pub runtime: Option<String>,
    /// Current artifact path, if set
    pub artifact: Option<String>,
}

impl FunctionDef {
    /// Whether the function carries the `rust` tag with a value other than `false`
    pub fn is_eligible(&self) -> bool {
        match self.tags.get(ELIGIBILITY_TAG) {
            None | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.eq_ignore_ascii_case("false"),
            Some(_) => true,
        }
    }

    fn into_spec(self, name: String) -> FunctionSpec {
        FunctionSpec {
            eligible: self.is_eligible(),
            name,
            handler: self.handler,
            runtime: self.runtime,
            artifact: self.package.and_then(|p| p.artifact),
        }
    }
}

/// Loaded deployment descriptor
#[derive(Debug, Clone)]
pub struct Descriptor {
    document: Value,
}

impl Descriptor {
    /// Parse a descriptor from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, DescriptorError> {
        let document: Value = serde_yaml::from_str(content)
            .map_err(|e| DescriptorError::ParseError(e.to_string()))?;

        match document {
            Value::Mapping(_) => Ok(Self { document }),
            Value::Null => Ok(Self {
                document: Value::Mapping(Mapping::new()),
            }),
            _ => Err(DescriptorError::ParseError(
                "top level of the descriptor must be a mapping".to_string(),
            )),
        }
    }

    /// Load a descriptor file
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        if !path.exists() {
            return Err(DescriptorError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| DescriptorError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    /// Render the descriptor as YAML
    pub fn to_yaml(&self) -> Result<String, DescriptorError> {
        serde_yaml::to_string(&self.document)
            .map_err(|e| DescriptorError::ParseError(e.to_string()))
    }

    /// Write the descriptor to `path`
    pub fn save(&self, path: &Path) -> Result<(), DescriptorError> {
        let content = self.to_yaml()?;
        fs::write(path, content).map_err(|e| DescriptorError::WriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Service name, when the descriptor declares one
    pub fn service(&self) -> Option<&str> {
        match self.document.get("service")? {
            Value::String(name) => Some(name.as_str()),
            Value::Mapping(m) => m.get("name").and_then(Value::as_str),
            _ => None,
        }
    }

    /// All functions in document order
    pub fn functions(&self) -> Result<Vec<FunctionSpec>, DescriptorError> {
        let Some(functions) = self.functions_mapping()? else {
            return Ok(Vec::new());
        };

        functions
            .iter()
            .map(|(key, value)| -> Result<FunctionSpec, DescriptorError> {
                let name = function_name(key)?;
                let invalid = |e: serde_yaml::Error| DescriptorError::InvalidFunction {
                    function: name.clone(),
                    error: e.to_string(),
                };
                let def = if value.is_null() {
                    FunctionDef::default()
                } else {
                    serde_yaml::from_value::<FunctionDef>(merged(value).map_err(invalid)?)
                        .map_err(invalid)?
                };
                Ok(def.into_spec(name))
            })
            .collect()
    }

    /// Settings from the `custom.rust` section
    pub fn rust_settings(&self) -> Result<SettingsLayer, DescriptorError> {
        let section = self
            .document
            .get(CUSTOM_KEY)
            .and_then(|custom| custom.get(CUSTOM_SECTION));

        match section {
            None | Some(Value::Null) => Ok(SettingsLayer::default()),
            Some(value) => serde_yaml::from_value(value.clone())
                .map_err(|e| DescriptorError::InvalidSettings(e.to_string())),
        }
    }

    /// Point `function` at its built archive
    ///
    /// Sets `package.artifact`, and `runtime` when the function has none.
    pub fn attach_artifact(
        &mut self,
        function: &str,
        artifact: &str,
        default_runtime: &str,
    ) -> Result<(), DescriptorError> {
        let entry = self
            .document
            .get_mut(FUNCTIONS_KEY)
            .and_then(Value::as_mapping_mut)
            .and_then(|functions| functions.get_mut(function))
            .ok_or_else(|| DescriptorError::UnknownFunction(function.to_string()))?;

        if entry.is_null() {
            *entry = Value::Mapping(Mapping::new());
        }
        let def = entry
            .as_mapping_mut()
            .ok_or_else(|| DescriptorError::InvalidFunction {
                function: function.to_string(),
                error: "expected a mapping".to_string(),
            })?;

        // Fields inherited through `<<` merge keys count as set
        let inherited = merged(&Value::Mapping(def.clone())).map_err(|e| {
            DescriptorError::InvalidFunction {
                function: function.to_string(),
                error: e.to_string(),
            }
        })?;

        let has_runtime = inherited.get(RUNTIME_KEY).is_some_and(|v| !v.is_null());
        if !has_runtime {
            def.insert(RUNTIME_KEY.into(), default_runtime.into());
        }

        let package = def.entry(PACKAGE_KEY.into()).or_insert_with(|| {
            inherited
                .get(PACKAGE_KEY)
                .filter(|v| v.is_mapping())
                .cloned()
                .unwrap_or_else(|| Value::Mapping(Mapping::new()))
        });
        if !package.is_mapping() {
            *package = Value::Mapping(Mapping::new());
        }
        if let Some(package) = package.as_mapping_mut() {
            package.insert(ARTIFACT_KEY.into(), artifact.into());
        }

        Ok(())
    }

    fn functions_mapping(&self) -> Result<Option<&Mapping>, DescriptorError> {
        match self.document.get(FUNCTIONS_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Mapping(m)) => Ok(Some(m)),
            Some(_) => Err(DescriptorError::ParseError(
                "`functions` must be a mapping of function name to definition".to_string(),
            )),
        }
    }
}

/// Function keys must be YAML strings
///
/// A key like `123` parses as a number. Rejecting it here keeps it from being
/// built and then missing when the artifact is attached by name.
fn function_name(key: &Value) -> Result<String, DescriptorError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Err(DescriptorError::ParseError(format!(
            "function name {n} is a number, quote it as \"{n}\""
        ))),
        other => Err(DescriptorError::ParseError(format!(
            "function names must be strings, found {other:?}"
        ))),
    }
}

/// Copy of `value` with `<<` merge keys expanded
fn merged(value: &Value) -> Result<Value, serde_yaml::Error> {
    let mut value = value.clone();
    value.apply_merge()?;
    Ok(value)
}
