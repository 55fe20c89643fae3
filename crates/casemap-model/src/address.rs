//! Node addresses for the mind-map graph
//!
//! Provides [`Address`], the typed identity of every graph node. The colon
//! delimited string form only exists at the boundary with the rendering
//! widget; everything inside the workspace matches on the enum.

use crate::hierarchy::{CaseField, CaseId, ModuleId};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Address of the synthetic root node
pub const ROOT_ADDRESS: &str = "me-root";

const DELIMITER: char = ':';

/// Discriminator of an [`Address`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// Synthetic root
    Root,
    /// A module
    Module,
    /// A case
    Case,
    /// A scalar case property
    CaseProp,
    /// Description of one step
    StepDesc,
    /// Result of one step
    StepRes,
}

impl AddressKind {
    /// Tag used in the string form (`None` for the root, which has no tag)
    #[inline]
    #[must_use]
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Self::Root => None,
            Self::Module => Some("module"),
            Self::Case => Some("case"),
            Self::CaseProp => Some("caseprop"),
            Self::StepDesc => Some("stepdesc"),
            Self::StepRes => Some("stepres"),
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "module" => Some(Self::Module),
            "case" => Some(Self::Case),
            "caseprop" => Some(Self::CaseProp),
            "stepdesc" => Some(Self::StepDesc),
            "stepres" => Some(Self::StepRes),
            _ => None,
        }
    }
}

/// Identity of a graph node
///
/// # Examples
/// - `module:m1` → `Address::Module("m1")`
/// - `caseprop:c1:remark` → `Address::CaseProp { case: "c1", field: Remark }`
/// - `stepres:c1:3` → `Address::StepRes { case: "c1", index: 3 }`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// The synthetic root (`me-root`)
    Root,
    /// `module:<moduleId>`
    Module(ModuleId),
    /// `case:<caseId>`
    Case(CaseId),
    /// `caseprop:<caseId>:<field>`
    CaseProp {
        /// Owning case
        case: CaseId,
        /// Addressed field
        field: CaseField,
    },
    /// `stepdesc:<caseId>:<index>`
    StepDesc {
        /// Owning case
        case: CaseId,
        /// Step index
        index: usize,
    },
    /// `stepres:<caseId>:<index>`
    StepRes {
        /// Owning case
        case: CaseId,
        /// Step index
        index: usize,
    },
}

impl Address {
    /// Decode an address, returning `None` for anything malformed
    #[inline]
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        match raw.parse() {
            Ok(address) => Some(address),
            Err(err) => {
                tracing::debug!(address = raw, error = %err, "ignoring malformed address");
                None
            }
        }
    }

    /// Encode to the widget string form
    #[inline]
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Discriminator
    #[must_use]
    pub fn kind(&self) -> AddressKind {
        match self {
            Self::Root => AddressKind::Root,
            Self::Module(_) => AddressKind::Module,
            Self::Case(_) => AddressKind::Case,
            Self::CaseProp { .. } => AddressKind::CaseProp,
            Self::StepDesc { .. } => AddressKind::StepDesc,
            Self::StepRes { .. } => AddressKind::StepRes,
        }
    }

    /// Case this address belongs to (case, property and step addresses)
    #[must_use]
    pub fn case_id(&self) -> Option<&CaseId> {
        match self {
            Self::Case(case)
            | Self::CaseProp { case, .. }
            | Self::StepDesc { case, .. }
            | Self::StepRes { case, .. } => Some(case),
            Self::Root | Self::Module(_) => None,
        }
    }

    /// Module id for module addresses
    #[must_use]
    pub fn module_id(&self) -> Option<&ModuleId> {
        match self {
            Self::Module(id) => Some(id),
            _ => None,
        }
    }

    /// Step index for step addresses
    #[must_use]
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::StepDesc { index, .. } | Self::StepRes { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Modules and cases are the only structural (movable) nodes
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Module(_) | Self::Case(_))
    }

    /// Nodes whose label may be edited in place
    #[inline]
    #[must_use]
    pub fn is_label_editable(&self) -> bool {
        matches!(
            self,
            Self::Case(_) | Self::CaseProp { .. } | Self::StepDesc { .. } | Self::StepRes { .. }
        )
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str(ROOT_ADDRESS),
            Self::Module(id) => write!(f, "module:{id}"),
            Self::Case(id) => write!(f, "case:{id}"),
            Self::CaseProp { case, field } => write!(f, "caseprop:{case}:{}", field.as_str()),
            Self::StepDesc { case, index } => write!(f, "stepdesc:{case}:{index}"),
            Self::StepRes { case, index } => write!(f, "stepres:{case}:{index}"),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ROOT_ADDRESS {
            return Ok(Self::Root);
        }

        // The tag is everything before the first delimiter and must match
        // exactly, so `case` never matches inside `caseprop`.
        let (tag, rest) = s
            .split_once(DELIMITER)
            .ok_or_else(|| AddressError::MissingTag(s.to_string()))?;
        let kind =
            AddressKind::from_tag(tag).ok_or_else(|| AddressError::UnknownTag(tag.to_string()))?;

        match kind {
            AddressKind::Module => Ok(Self::Module(ModuleId::new(parse_id(rest)?))),
            AddressKind::Case => Ok(Self::Case(CaseId::new(parse_id(rest)?))),
            AddressKind::CaseProp => {
                let (case, field) = split_pair(rest)?;
                let field = CaseField::from_name(field)
                    .ok_or_else(|| AddressError::UnknownField(field.to_string()))?;
                Ok(Self::CaseProp { case, field })
            }
            AddressKind::StepDesc | AddressKind::StepRes => {
                let (case, index) = split_pair(rest)?;
                let index = parse_index(index)?;
                if kind == AddressKind::StepDesc {
                    Ok(Self::StepDesc { case, index })
                } else {
                    Ok(Self::StepRes { case, index })
                }
            }
            AddressKind::Root => Err(AddressError::UnknownTag(tag.to_string())),
        }
    }
}

fn parse_id(raw: &str) -> Result<&str, AddressError> {
    if raw.is_empty() {
        Err(AddressError::EmptyId)
    } else if raw.contains(DELIMITER) {
        Err(AddressError::UnexpectedPart(raw.to_string()))
    } else {
        Ok(raw)
    }
}

fn parse_index(raw: &str) -> Result<usize, AddressError> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::InvalidIndex(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| AddressError::InvalidIndex(raw.to_string()))
}

fn split_pair(rest: &str) -> Result<(CaseId, &str), AddressError> {
    let (case, part) = rest
        .split_once(DELIMITER)
        .ok_or_else(|| AddressError::MissingPart(rest.to_string()))?;
    let case = CaseId::new(parse_id(case)?);
    if part.is_empty() {
        return Err(AddressError::MissingPart(rest.to_string()));
    }
    if part.contains(DELIMITER) {
        return Err(AddressError::UnexpectedPart(part.to_string()));
    }
    Ok((case, part))
}

/// Errors decoding an address
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// No `tag:` prefix
    #[error("address has no tag: {0}")]
    MissingTag(String),

    /// Tag is not one of the known kinds
    #[error("unknown address tag: {0}")]
    UnknownTag(String),

    /// Id segment is empty
    #[error("address id is empty")]
    EmptyId,

    /// Field or step index segment is missing
    #[error("address is missing a segment: {0}")]
    MissingPart(String),

    /// More segments than the kind allows
    #[error("unexpected address segment: {0}")]
    UnexpectedPart(String),

    /// Property field is not a known case field
    #[error("unknown case field: {0}")]
    UnknownField(String),

    /// Step index is not a non-negative integer
    #[error("invalid step index: {0}")]
    InvalidIndex(String),
}
