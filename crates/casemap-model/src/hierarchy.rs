//! Backend-owned case hierarchy
//!
//! Modules nest modules and own cases; cases own scalar properties and an
//! ordered step list. Deserialization is lenient the way the backend payload
//! requires: ids may arrive as numbers, nullable text arrives as `null`, and
//! an unset step list may be an empty object.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// Id the backend uses for the "all cases" root
pub const ALL_ROOT_ID: &str = "all";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from any string-like value
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Value::deserialize(deserializer)?;
                id_text(&value)
                    .map(Self)
                    .ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
            }
        }
    };
}

string_id!(
    /// Case identifier
    CaseId
);

string_id!(
    /// Module identifier
    ModuleId
);

/// Scalar case fields addressable through `caseprop:` addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseField {
    /// Precondition (rich text)
    Precondition,
    /// Remark (rich text)
    Remark,
    /// Text-mode description (rich text)
    TextDescription,
    /// Text-mode expected result (rich text)
    TextResult,
}

impl CaseField {
    /// Every field, in address order
    pub const ALL: [Self; 4] = [
        Self::Precondition,
        Self::Remark,
        Self::TextDescription,
        Self::TextResult,
    ];

    /// Name used in addresses and patches
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precondition => "precondition",
            Self::Remark => "remark",
            Self::TextDescription => "text_description",
            Self::TextResult => "text_result",
        }
    }

    /// Parse an address field segment
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

/// How a case records its procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum CaseMode {
    /// Ordered description/result steps (wire value 0)
    #[default]
    Steps,
    /// Free text description and result (wire value 1)
    Text,
}

impl From<i64> for CaseMode {
    fn from(value: i64) -> Self {
        if value == 1 {
            Self::Text
        } else {
            Self::Steps
        }
    }
}

impl From<CaseMode> for i64 {
    fn from(mode: CaseMode) -> Self {
        match mode {
            CaseMode::Steps => 0,
            CaseMode::Text => 1,
        }
    }
}

/// One step of a steps-mode case
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Step {
    /// What to do
    #[serde(default, deserialize_with = "nullable_text")]
    pub description: String,
    /// What should happen
    #[serde(default, deserialize_with = "nullable_text")]
    pub result: String,
}

impl Step {
    /// A step with both sides empty
    #[inline]
    #[must_use]
    pub fn blank() -> Self {
        Self::default()
    }

    /// Create a step
    #[inline]
    #[must_use]
    pub fn new(description: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            result: result.into(),
        }
    }
}

/// A test case as returned by the hierarchy fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    /// Case id
    pub id: CaseId,
    /// Display code, never edited through the mind-map
    #[serde(default, deserialize_with = "nullable_code")]
    pub code: Option<String>,
    /// Case name
    #[serde(default, deserialize_with = "nullable_text")]
    pub name: String,
    /// Precondition markup
    #[serde(default, deserialize_with = "nullable_text")]
    pub precondition: String,
    /// Remark markup
    #[serde(default, deserialize_with = "nullable_text")]
    pub remark: String,
    /// Procedure mode
    #[serde(default, deserialize_with = "lenient_mode")]
    pub mode: CaseMode,
    /// Steps (steps mode)
    #[serde(default, deserialize_with = "lenient_steps")]
    pub steps: Vec<Step>,
    /// Description markup (text mode)
    #[serde(default, deserialize_with = "nullable_text")]
    pub text_description: String,
    /// Expected result markup (text mode)
    #[serde(default, deserialize_with = "nullable_text")]
    pub text_result: String,
    /// Owning module as reported by the backend, if any
    #[serde(default, deserialize_with = "lenient_module", skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleId>,
}

impl Case {
    /// Create a steps-mode case with no content
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CaseId::new(id),
            code: None,
            name: name.into(),
            precondition: String::new(),
            remark: String::new(),
            mode: CaseMode::Steps,
            steps: Vec::new(),
            text_description: String::new(),
            text_result: String::new(),
            module: None,
        }
    }

    /// With display code
    #[inline]
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// With procedure mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: CaseMode) -> Self {
        self.mode = mode;
        self
    }

    /// With steps
    #[inline]
    #[must_use]
    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    /// With a rich-text field set
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: CaseField, markup: impl Into<String>) -> Self {
        *self.field_mut(field) = markup.into();
        self
    }

    /// Stored markup of a scalar field
    #[must_use]
    pub fn field(&self, field: CaseField) -> &str {
        match field {
            CaseField::Precondition => &self.precondition,
            CaseField::Remark => &self.remark,
            CaseField::TextDescription => &self.text_description,
            CaseField::TextResult => &self.text_result,
        }
    }

    /// Mutable stored markup of a scalar field
    pub fn field_mut(&mut self, field: CaseField) -> &mut String {
        match field {
            CaseField::Precondition => &mut self.precondition,
            CaseField::Remark => &mut self.remark,
            CaseField::TextDescription => &mut self.text_description,
            CaseField::TextResult => &mut self.text_result,
        }
    }

    /// Non-empty display code
    #[must_use]
    pub fn display_code(&self) -> Option<&str> {
        self.code.as_deref().filter(|code| !code.is_empty())
    }
}

/// A module with its nested modules and cases, in backend order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Module id
    pub id: ModuleId,
    /// Module name
    #[serde(default, deserialize_with = "nullable_text")]
    pub name: String,
    /// Child modules
    #[serde(default, deserialize_with = "lenient_list")]
    pub children: Vec<Module>,
    /// Cases directly in this module
    #[serde(default, deserialize_with = "lenient_list")]
    pub cases: Vec<Case>,
}

impl Module {
    /// Create an empty module
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ModuleId::new(id),
            name: name.into(),
            children: Vec::new(),
            cases: Vec::new(),
        }
    }

    /// With child module appended
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: Module) -> Self {
        self.children.push(child);
        self
    }

    /// With case appended
    #[inline]
    #[must_use]
    pub fn with_case(mut self, case: Case) -> Self {
        self.cases.push(case);
        self
    }

    /// Cases in this module and all descendants
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.cases.len() + self.children.iter().map(Module::case_count).sum::<usize>()
    }
}

/// Root object of a hierarchy fetch
///
/// With no module filter the backend returns the synthetic `all` root, which
/// may hold cases directly. With a filter the root is itself a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    /// `all` for the synthetic root, otherwise a module id
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    /// Display name
    #[serde(default, deserialize_with = "nullable_text")]
    pub name: String,
    /// Top-level modules
    #[serde(default, deserialize_with = "lenient_list")]
    pub children: Vec<Module>,
    /// Cases outside any module (synthetic root only)
    #[serde(default, deserialize_with = "lenient_list")]
    pub cases: Vec<Case>,
}

impl Hierarchy {
    /// Synthetic "all cases" root
    #[must_use]
    pub fn all(name: impl Into<String>) -> Self {
        Self {
            id: ALL_ROOT_ID.to_string(),
            name: name.into(),
            children: Vec::new(),
            cases: Vec::new(),
        }
    }

    /// Root that is a single filtered module
    #[must_use]
    pub fn from_module(module: Module) -> Self {
        Self {
            id: module.id.as_str().to_string(),
            name: module.name,
            children: module.children,
            cases: module.cases,
        }
    }

    /// With top-level module appended
    #[inline]
    #[must_use]
    pub fn with_module(mut self, module: Module) -> Self {
        self.children.push(module);
        self
    }

    /// With root-level case appended
    #[inline]
    #[must_use]
    pub fn with_case(mut self, case: Case) -> Self {
        self.cases.push(case);
        self
    }

    /// Whether the root is the synthetic `all` root
    #[inline]
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.id == ALL_ROOT_ID
    }

    /// View a filtered root as the module it is
    #[must_use]
    pub fn as_module(&self) -> Option<Module> {
        if self.is_all() {
            return None;
        }
        Some(Module {
            id: ModuleId::new(self.id.clone()),
            name: self.name.clone(),
            children: self.children.clone(),
            cases: self.cases.clone(),
        })
    }

    /// Every case anywhere in the hierarchy
    #[must_use]
    pub fn cases(&self) -> Vec<&Case> {
        fn walk<'a>(module: &'a Module, out: &mut Vec<&'a Case>) {
            for child in &module.children {
                walk(child, out);
            }
            out.extend(module.cases.iter());
        }
        let mut out = Vec::new();
        for module in &self.children {
            walk(module, &mut out);
        }
        out.extend(self.cases.iter());
        out
    }

    /// Find a module anywhere in the hierarchy
    #[must_use]
    pub fn find_module(&self, id: &ModuleId) -> Option<&Module> {
        fn walk<'a>(module: &'a Module, id: &ModuleId) -> Option<&'a Module> {
            if &module.id == id {
                return Some(module);
            }
            module.children.iter().find_map(|child| walk(child, id))
        }
        self.children.iter().find_map(|module| walk(module, id))
    }

    /// Find a case anywhere in the hierarchy
    #[must_use]
    pub fn find_case(&self, id: &CaseId) -> Option<&Case> {
        self.cases().into_iter().find(|case| &case.id == id)
    }
}

/// Module filter for hierarchy and count fetches
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleFilter {
    /// Selected modules; empty means all
    pub module_ids: Vec<ModuleId>,
}

impl ModuleFilter {
    /// No filter
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter to the given modules (duplicates removed, order kept)
    #[must_use]
    pub fn modules(ids: impl IntoIterator<Item = ModuleId>) -> Self {
        let mut module_ids: Vec<ModuleId> = Vec::new();
        for id in ids {
            if id.as_str() != ALL_ROOT_ID && !module_ids.contains(&id) {
                module_ids.push(id);
            }
        }
        Self { module_ids }
    }

    /// Whether no module is selected
    #[inline]
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.module_ids.is_empty()
    }
}

/// Per-module case totals reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleCounts {
    /// Cases in the whole repository view
    pub total: u64,
    /// Cases per module
    pub per_module: HashMap<ModuleId, u64>,
}

impl ModuleCounts {
    /// Build from the backend's flat map, where `total` sits beside module ids
    #[must_use]
    pub fn from_map(map: &serde_json::Map<String, Value>) -> Self {
        let mut counts = Self::default();
        for (key, value) in map {
            let count = value.as_u64().unwrap_or(0);
            if key == "total" {
                counts.total = count;
            } else {
                counts.per_module.insert(ModuleId::new(key.clone()), count);
            }
        }
        counts
    }

    /// Count for one module (0 when absent)
    #[must_use]
    pub fn get(&self, id: &ModuleId) -> u64 {
        self.per_module.get(id).copied().unwrap_or(0)
    }
}

/// Partial case update; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CasePatch {
    /// New name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New precondition markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precondition: Option<String>,
    /// New remark markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// New text description markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_description: Option<String>,
    /// New text result markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_result: Option<String>,
    /// New mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<CaseMode>,
    /// Whole replacement step list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Step>>,
}

impl CasePatch {
    /// Patch setting only the name
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Patch setting one rich-text field
    #[must_use]
    pub fn field(field: CaseField, markup: impl Into<String>) -> Self {
        Self::default().with_field(field, markup)
    }

    /// Patch replacing the step list
    #[must_use]
    pub fn steps(steps: Vec<Step>) -> Self {
        Self {
            steps: Some(steps),
            ..Self::default()
        }
    }

    /// Patch setting the mode
    #[must_use]
    pub fn mode(mode: CaseMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    /// Also set a rich-text field
    #[must_use]
    pub fn with_field(mut self, field: CaseField, markup: impl Into<String>) -> Self {
        let slot = match field {
            CaseField::Precondition => &mut self.precondition,
            CaseField::Remark => &mut self.remark,
            CaseField::TextDescription => &mut self.text_description,
            CaseField::TextResult => &mut self.text_result,
        };
        *slot = Some(markup.into());
        self
    }

    /// Whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply to a local copy of the case
    pub fn apply_to(&self, case: &mut Case) {
        if let Some(name) = &self.name {
            case.name.clone_from(name);
        }
        for field in CaseField::ALL {
            let value = match field {
                CaseField::Precondition => &self.precondition,
                CaseField::Remark => &self.remark,
                CaseField::TextDescription => &self.text_description,
                CaseField::TextResult => &self.text_result,
            };
            if let Some(value) = value {
                case.field_mut(field).clone_from(value);
            }
        }
        if let Some(mode) = self.mode {
            case.mode = mode;
        }
        if let Some(steps) = &self.steps {
            case.steps.clone_from(steps);
        }
    }
}

/// Payload for creating a case from the action menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCase {
    /// Initial name
    pub name: String,
    /// Owning module; `None` creates it at the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleId>,
    /// Initial mode
    pub mode: CaseMode,
    /// Initial steps
    pub steps: Vec<Step>,
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn required_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    id_text(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

fn nullable_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(Some(&value)))
}

fn nullable_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(Some(value_text(Some(&value))).filter(|code| !code.is_empty()))
}

fn lenient_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CaseMode, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().map(CaseMode::from).unwrap_or_default())
}

fn lenient_steps<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Step>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .map(|item| Step {
            description: value_text(item.get("description")),
            result: value_text(item.get("result")),
        })
        .collect())
}

fn lenient_module<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ModuleId>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let id = match &value {
        Value::Object(map) => map.get("id").and_then(id_text),
        other => id_text(other),
    };
    Ok(id.map(ModuleId))
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}
