//! Command model and shape validation.
//!
//! The wire shape of a command is a JSON array led by a string tag:
//!
//! ```json
//! ["config", {"total_instructions": 1}]
//! ["create", "user", {"name": "a", "$anchor": "user-a"}]
//! ```
//!
//! Body members whose key starts with `$` are reserved for protocol metadata;
//! every other member is a resource attribute.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::BulkError;

/// Body member holding the client-chosen correlation reference.
pub const ANCHOR_KEY: &str = "$anchor";

/// Body member holding relationship references.
pub const RELATIONSHIPS_KEY: &str = "$relationships";

/// Configuration member declaring the number of commands that follow it.
pub const TOTAL_INSTRUCTIONS_KEY: &str = "total_instructions";

/// Identifies a command within a single batch run.
///
/// The id is the 0-based position of the command's line among the non-empty
/// lines of the batch, issued by the decoder in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(usize);

impl CorrelationId {
    /// Creates an id for the given batch position.
    #[must_use]
    pub const fn new(position: usize) -> Self {
        Self(position)
    }

    /// Returns the batch position.
    #[must_use]
    pub const fn position(self) -> usize {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of operation a command requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Batch-wide settings; leads the batch.
    Configuration,
    /// Create a new resource.
    Create,
    /// Modify an existing resource.
    Update,
    /// Create a resource or modify it when it already exists.
    Upsert,
    /// Remove a resource.
    Delete,
}

impl CommandKind {
    /// Parses a wire tag (case-sensitive).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "config" => Some(Self::Configuration),
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "upsert" => Some(Self::Upsert),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the wire tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Configuration => "config",
            Self::Create => "create",
            Self::Update => "update",
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }

    /// Returns `true` for the configuration kind.
    #[must_use]
    pub const fn is_configuration(self) -> bool {
        matches!(self, Self::Configuration)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Settings carried by the configuration command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Configuration {
    total_instructions: Option<u64>,
    settings: Map<String, Value>,
}

impl Configuration {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares how many non-configuration commands the batch contains.
    #[must_use]
    pub fn with_total_instructions(mut self, total: u64) -> Self {
        self.total_instructions = Some(total);
        self
    }

    /// Adds a free-form setting.
    ///
    /// Values are checked when the command is built with [`Command::new`].
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Returns the declared instruction count, if any.
    #[must_use]
    pub const fn total_instructions(&self) -> Option<u64> {
        self.total_instructions
    }

    /// Returns the free-form settings.
    #[must_use]
    pub const fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    fn from_value(position: usize, value: &Value) -> Result<Self, BulkError> {
        let Value::Object(members) = value else {
            return Err(BulkError::malformed_command(
                position,
                "configuration settings must be a JSON object",
            ));
        };

        let mut configuration = Self::new();
        for (key, member) in members {
            if key == TOTAL_INSTRUCTIONS_KEY {
                let total = member.as_u64().ok_or_else(|| {
                    BulkError::malformed_command(
                        position,
                        format!("'{TOTAL_INSTRUCTIONS_KEY}' must be a non-negative integer"),
                    )
                })?;
                configuration.total_instructions = Some(total);
            } else {
                configuration.settings.insert(key.clone(), member.clone());
            }
        }
        Ok(configuration)
    }

    fn to_value(&self) -> Value {
        let mut members = self.settings.clone();
        if let Some(total) = self.total_instructions {
            members.insert(TOTAL_INSTRUCTIONS_KEY.to_owned(), Value::from(total));
        }
        Value::Object(members)
    }
}

/// Payload of a resource command: attributes plus optional metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Body {
    attributes: Map<String, Value>,
    relationships: Map<String, Value>,
    anchor: Option<String>,
}

impl Body {
    /// Creates a body from an attribute map.
    ///
    /// Keys starting with `$` are reserved; [`Command::new`] rejects them.
    #[must_use]
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            ..Self::default()
        }
    }

    /// Attaches a client correlation reference.
    #[must_use]
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Adds a relationship reference.
    #[must_use]
    pub fn with_relationship(mut self, name: impl Into<String>, target: Value) -> Self {
        self.relationships.insert(name.into(), target);
        self
    }

    /// Returns the resource attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns the relationship references.
    #[must_use]
    pub const fn relationships(&self) -> &Map<String, Value> {
        &self.relationships
    }

    /// Returns the client correlation reference, if any.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    fn from_value(position: usize, value: &Value) -> Result<Self, BulkError> {
        let Value::Object(members) = value else {
            return Err(BulkError::malformed_command(
                position,
                "command body must be a JSON object",
            ));
        };

        let mut body = Self::default();
        for (key, member) in members {
            match key.as_str() {
                ANCHOR_KEY => {
                    let anchor = member.as_str().ok_or_else(|| {
                        BulkError::malformed_command(
                            position,
                            format!("'{ANCHOR_KEY}' must be a string"),
                        )
                    })?;
                    body.anchor = Some(anchor.to_owned());
                }
                RELATIONSHIPS_KEY => {
                    let Value::Object(relationships) = member else {
                        return Err(BulkError::malformed_command(
                            position,
                            format!("'{RELATIONSHIPS_KEY}' must be a JSON object"),
                        ));
                    };
                    body.relationships = relationships.clone();
                }
                reserved if reserved.starts_with('$') => {
                    return Err(BulkError::malformed_command(
                        position,
                        format!("unknown reserved member '{reserved}'"),
                    ));
                }
                _ => {
                    body.attributes.insert(key.clone(), member.clone());
                }
            }
        }
        Ok(body)
    }

    fn to_value(&self) -> Value {
        let mut members = self.attributes.clone();
        if let Some(anchor) = &self.anchor {
            members.insert(ANCHOR_KEY.to_owned(), Value::String(anchor.clone()));
        }
        if !self.relationships.is_empty() {
            members.insert(
                RELATIONSHIPS_KEY.to_owned(),
                Value::Object(self.relationships.clone()),
            );
        }
        Value::Object(members)
    }
}

/// Target of a resource command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    resource_type: String,
    body: Body,
}

impl Resource {
    /// Creates a resource target.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, body: Body) -> Self {
        Self {
            resource_type: resource_type.into(),
            body,
        }
    }

    /// Returns the resource type (for example `user`).
    #[must_use]
    pub const fn resource_type(&self) -> &str {
        self.resource_type.as_str()
    }

    /// Returns the command body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    fn from_values(position: usize, type_value: &Value, body: &Value) -> Result<Self, BulkError> {
        // Kept as written so the typed view agrees with the raw line.
        let resource_type = type_value
            .as_str()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                BulkError::malformed_command(position, "resource type must be a non-empty string")
            })?;
        Ok(Self::new(resource_type, Body::from_value(position, body)?))
    }
}

/// A typed bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Batch configuration.
    Configure(Configuration),
    /// Resource creation.
    Create(Resource),
    /// Resource modification.
    Update(Resource),
    /// Resource creation or modification.
    Upsert(Resource),
    /// Resource removal.
    Delete(Resource),
}

impl Operation {
    /// Returns the operation kind.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Configure(_) => CommandKind::Configuration,
            Self::Create(_) => CommandKind::Create,
            Self::Update(_) => CommandKind::Update,
            Self::Upsert(_) => CommandKind::Upsert,
            Self::Delete(_) => CommandKind::Delete,
        }
    }

    /// Returns the configuration for configure operations.
    #[must_use]
    pub const fn configuration(&self) -> Option<&Configuration> {
        match self {
            Self::Configure(configuration) => Some(configuration),
            Self::Create(_) | Self::Update(_) | Self::Upsert(_) | Self::Delete(_) => None,
        }
    }

    /// Returns the resource target for resource operations.
    #[must_use]
    pub const fn resource(&self) -> Option<&Resource> {
        match self {
            Self::Configure(_) => None,
            Self::Create(resource)
            | Self::Update(resource)
            | Self::Upsert(resource)
            | Self::Delete(resource) => Some(resource),
        }
    }

    fn from_value(position: usize, value: &Value) -> Result<Self, BulkError> {
        let Value::Array(items) = value else {
            return Err(BulkError::malformed_command(
                position,
                "command must be a JSON array",
            ));
        };
        let Some((tag_value, arguments)) = items.split_first() else {
            return Err(BulkError::malformed_command(position, "command array is empty"));
        };
        let tag = tag_value.as_str().ok_or_else(|| {
            BulkError::malformed_command(position, "command tag must be a string")
        })?;
        let kind = CommandKind::from_tag(tag).ok_or_else(|| {
            BulkError::malformed_command(position, format!("unknown command '{tag}'"))
        })?;

        match (kind, arguments) {
            (CommandKind::Configuration, [settings]) => Ok(Self::Configure(
                Configuration::from_value(position, settings)?,
            )),
            (CommandKind::Configuration, _) => Err(BulkError::malformed_command(
                position,
                "'config' takes exactly one settings object",
            )),
            (CommandKind::Create, [resource_type, body]) => Ok(Self::Create(
                Resource::from_values(position, resource_type, body)?,
            )),
            (CommandKind::Update, [resource_type, body]) => Ok(Self::Update(
                Resource::from_values(position, resource_type, body)?,
            )),
            (CommandKind::Upsert, [resource_type, body]) => Ok(Self::Upsert(
                Resource::from_values(position, resource_type, body)?,
            )),
            (CommandKind::Delete, [resource_type, body]) => Ok(Self::Delete(
                Resource::from_values(position, resource_type, body)?,
            )),
            (_, _) => Err(BulkError::malformed_command(
                position,
                format!("'{tag}' takes a resource type and a body"),
            )),
        }
    }

    fn to_value(&self) -> Value {
        let tag = Value::from(self.kind().tag());
        match self {
            Self::Configure(configuration) => Value::Array(vec![tag, configuration.to_value()]),
            Self::Create(resource)
            | Self::Update(resource)
            | Self::Upsert(resource)
            | Self::Delete(resource) => Value::Array(vec![
                tag,
                Value::from(resource.resource_type()),
                resource.body().to_value(),
            ]),
        }
    }
}

/// One requested operation within a bulk batch.
///
/// # Example
///
/// ```
/// use bulk_api::{Command, CommandKind, CorrelationId};
/// use serde_json::json;
///
/// let command = Command::from_value(
///     CorrelationId::new(1),
///     json!(["create", "user", {"name": "a"}]),
/// )?;
/// assert_eq!(command.kind(), CommandKind::Create);
/// assert_eq!(command.raw(), &json!(["create", "user", {"name": "a"}]));
/// # Ok::<(), bulk_api::BulkError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    id: CorrelationId,
    raw: Value,
    operation: Operation,
}

impl Command {
    /// Builds a command from a typed operation, synthesising its raw form.
    ///
    /// The synthesised form is decoded again, so a constructed command always
    /// survives an encode and decode cycle unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::MalformedCommand`] when the operation holds values
    /// the decoder rejects (a blank resource type, an unknown `$` member or a
    /// non-integer `total_instructions` setting) or when attribute keys
    /// collide with reserved members.
    pub fn new(id: CorrelationId, operation: Operation) -> Result<Self, BulkError> {
        let command = Self::from_value(id, operation.to_value())?;
        if command.operation != operation {
            return Err(BulkError::malformed_command(
                id.position(),
                "typed operation does not match its wire form; attribute keys collide with reserved members",
            ));
        }
        Ok(command)
    }

    /// Builds a command from a decoded JSON value, validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::MalformedCommand`] when the value does not match a
    /// recognised command shape.
    pub fn from_value(id: CorrelationId, raw: Value) -> Result<Self, BulkError> {
        let operation = Operation::from_value(id.position(), &raw)?;
        Ok(Self { id, raw, operation })
    }

    /// Returns the correlation id.
    #[must_use]
    pub const fn id(&self) -> CorrelationId {
        self.id
    }

    /// Returns the JSON value the command was built from.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Returns the typed operation.
    #[must_use]
    pub const fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Returns the operation kind.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.operation.kind()
    }

    /// Returns the client correlation reference carried by the body, if any.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        self.operation
            .resource()
            .and_then(|resource| resource.body().anchor())
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}
