//! Widget operations
//!
//! The rendering widget reports every completed gesture as one loosely
//! shaped payload. [`RawOperation`] mirrors that payload; [`Operation`] is
//! the typed form everything else matches on.

use crate::error::OperationError;
use casemap_model::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Node reference inside a raw payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Node id (the encoded address)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Node label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Some widget versions wrap the node once more
    #[serde(default, rename = "nodeObj", skip_serializing_if = "Option::is_none")]
    pub node_obj: Option<Box<RawNode>>,
}

impl RawNode {
    /// Node with an id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(Value::String(id.into())),
            ..Self::default()
        }
    }

    /// With label
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    fn inner(&self) -> &RawNode {
        self.node_obj.as_deref().unwrap_or(self)
    }

    fn id_text(&self) -> Option<String> {
        match self.inner().id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Operation payload as emitted by the widget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOperation {
    /// Operation name, e.g. `finishEdit` or `moveNodeIn`
    pub name: String,
    /// Single node (edits, single-node moves)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj: Option<RawNode>,
    /// Moved nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objs: Vec<RawNode>,
    /// Drop target
    #[serde(default, rename = "toObj", skip_serializing_if = "Option::is_none")]
    pub to_obj: Option<RawNode>,
}

impl RawOperation {
    /// Operation with only a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Label commit payload
    #[must_use]
    pub fn finish_edit(id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            obj: Some(RawNode::new(id).with_topic(topic)),
            ..Self::named(FINISH_EDIT)
        }
    }

    /// Move payload for the given placement
    #[must_use]
    pub fn moved<I, S>(placement: Placement, ids: I, target: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            objs: ids.into_iter().map(RawNode::new).collect(),
            to_obj: Some(RawNode::new(target)),
            ..Self::named(placement.operation_name())
        }
    }

    /// Parse a JSON payload
    ///
    /// # Errors
    /// [`OperationError::InvalidPayload`] when the JSON does not match.
    pub fn from_json(raw: &str) -> Result<Self, OperationError> {
        serde_json::from_str(raw).map_err(|err| OperationError::InvalidPayload(err.to_string()))
    }
}

const FINISH_EDIT: &str = "finishEdit";
const MOVE_IN: &str = "moveNodeIn";
const MOVE_BEFORE: &str = "moveNodeBefore";
const MOVE_AFTER: &str = "moveNodeAfter";

/// Where moved nodes land relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Become children of the target
    Into,
    /// Become siblings placed before the target
    Before,
    /// Become siblings placed after the target
    After,
}

impl Placement {
    /// Widget operation name
    #[must_use]
    pub fn operation_name(self) -> &'static str {
        match self {
            Self::Into => MOVE_IN,
            Self::Before => MOVE_BEFORE,
            Self::After => MOVE_AFTER,
        }
    }

    /// Whether the target's container, not the target, receives the nodes
    #[inline]
    #[must_use]
    pub fn is_beside(self) -> bool {
        !matches!(self, Self::Into)
    }
}

/// Drag-reparent gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOperation {
    /// How the target is interpreted
    pub placement: Placement,
    /// Nodes being moved, in widget order
    pub moving: Vec<Address>,
    /// Drop target
    pub target: Address,
}

/// Typed gesture reported by the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// A node label was edited and committed
    FinishEdit {
        /// Edited node
        address: Address,
        /// Committed label
        label: String,
    },
    /// Nodes were dropped on or beside a target
    Move(MoveOperation),
}

impl Operation {
    /// Decode a JSON payload
    ///
    /// # Errors
    /// Any [`OperationError`] from parsing or decoding.
    pub fn from_json(raw: &str) -> Result<Self, OperationError> {
        Self::try_from(RawOperation::from_json(raw)?)
    }

    /// Operation name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FinishEdit { .. } => FINISH_EDIT,
            Self::Move(op) => op.placement.operation_name(),
        }
    }
}

impl TryFrom<RawOperation> for Operation {
    type Error = OperationError;

    fn try_from(raw: RawOperation) -> Result<Self, Self::Error> {
        let placement = match raw.name.as_str() {
            FINISH_EDIT => return decode_finish_edit(&raw),
            MOVE_IN => Placement::Into,
            MOVE_BEFORE => Placement::Before,
            MOVE_AFTER => Placement::After,
            _ => return Err(OperationError::UnknownOperation(raw.name)),
        };

        let operation = placement.operation_name();
        let target_id = raw
            .to_obj
            .as_ref()
            .and_then(RawNode::id_text)
            .ok_or(OperationError::MissingTarget { operation })?;
        let target = parse_address(&target_id)?;

        let nodes: Vec<&RawNode> = if raw.objs.is_empty() {
            raw.obj.iter().collect()
        } else {
            raw.objs.iter().collect()
        };
        let moving = nodes
            .into_iter()
            .filter_map(RawNode::id_text)
            .filter_map(|id| Address::decode(&id))
            .collect();

        Ok(Self::Move(MoveOperation {
            placement,
            moving,
            target,
        }))
    }
}

fn decode_finish_edit(raw: &RawOperation) -> Result<Operation, OperationError> {
    let node = raw.obj.as_ref().ok_or(OperationError::MissingTarget {
        operation: FINISH_EDIT,
    })?;
    let id = node.id_text().ok_or(OperationError::MissingTarget {
        operation: FINISH_EDIT,
    })?;
    let address = parse_address(&id)?;
    let label = node.inner().topic.clone().unwrap_or_default();
    Ok(Operation::FinishEdit { address, label })
}

fn parse_address(id: &str) -> Result<Address, OperationError> {
    id.parse().map_err(|source| {
        debug!(address = id, error = %source, "operation references malformed address");
        OperationError::MalformedAddress {
            address: id.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use casemap_model::{CaseId, ModuleId};
    use serde_json::json;

    #[test]
    fn decodes_finish_edit() {
        let op = Operation::try_from(RawOperation::finish_edit("case:c1", "TC-1 Login")).unwrap();
        assert_eq!(
            op,
            Operation::FinishEdit {
                address: Address::Case(CaseId::new("c1")),
                label: "TC-1 Login".to_string(),
            }
        );
        assert_eq!(op.name(), "finishEdit");
    }

    #[test]
    fn decodes_wrapped_node_object() {
        let payload = json!({
            "name": "finishEdit",
            "obj": {"nodeObj": {"id": "stepres:c1:0", "topic": "ok"}}
        })
        .to_string();
        let op = Operation::from_json(&payload).unwrap();
        assert!(matches!(op, Operation::FinishEdit { ref label, .. } if label == "ok"));
    }

    #[test]
    fn decodes_moves() {
        let payload = json!({
            "name": "moveNodeBefore",
            "objs": [{"id": "case:c1"}, {"id": "bogus"}, {"id": "module:m2"}],
            "toObj": {"id": "case:c9"}
        })
        .to_string();
        let Operation::Move(op) = Operation::from_json(&payload).unwrap() else {
            panic!("expected a move");
        };
        assert_eq!(op.placement, Placement::Before);
        assert_eq!(
            op.moving,
            vec![
                Address::Case(CaseId::new("c1")),
                Address::Module(ModuleId::new("m2"))
            ]
        );
        assert_eq!(op.target, Address::Case(CaseId::new("c9")));
    }

    #[test]
    fn single_obj_move_is_accepted() {
        let payload = json!({
            "name": "moveNodeIn",
            "obj": {"id": "case:c1"},
            "toObj": {"id": "me-root"}
        })
        .to_string();
        let Operation::Move(op) = Operation::from_json(&payload).unwrap() else {
            panic!("expected a move");
        };
        assert_eq!(op.moving.len(), 1);
        assert_eq!(op.target, Address::Root);
    }

    #[test]
    fn rejects_unknown_and_incomplete_payloads() {
        assert!(matches!(
            Operation::try_from(RawOperation::named("removeNodes")),
            Err(OperationError::UnknownOperation(name)) if name == "removeNodes"
        ));
        assert!(matches!(
            Operation::try_from(RawOperation::named("moveNodeIn")),
            Err(OperationError::MissingTarget { .. })
        ));
        assert!(matches!(
            Operation::try_from(RawOperation::finish_edit("case", "x")),
            Err(OperationError::MalformedAddress { .. })
        ));
        assert!(matches!(
            Operation::from_json("not json"),
            Err(OperationError::InvalidPayload(_))
        ));
    }

    #[test]
    fn payload_builders_round_trip_through_json() {
        let raw = RawOperation::moved(Placement::After, ["case:c1"], "module:m1");
        let text = serde_json::to_string(&raw).unwrap();
        assert_eq!(RawOperation::from_json(&text).unwrap(), raw);
        assert!(text.contains("\"toObj\""));
    }
}
