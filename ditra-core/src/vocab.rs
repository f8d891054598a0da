//! Directory schema constants used by the subentry administration engine.
//!
//! Centralizes every attribute type, object class, and control OID the
//! engine reads or writes, so callers and storage layers agree on spelling.
//! All attribute lookups are case-insensitive; these constants carry the
//! canonical casing used when the engine creates an attribute.

/// Common attribute types
pub mod attr {
    /// objectClass attribute type
    pub const OBJECT_CLASS: &str = "objectClass";

    /// administrativeRole attribute type (marks administrative points)
    pub const ADMINISTRATIVE_ROLE: &str = "administrativeRole";

    /// subtreeSpecification attribute type (carried by subentries)
    pub const SUBTREE_SPECIFICATION: &str = "subtreeSpecification";

    /// commonName attribute type
    pub const CN: &str = "cn";
}

/// Object classes
pub mod oc {
    /// Marker object class carried by every subentry (2.5.17.0)
    pub const SUBENTRY: &str = "subentry";

    /// Access-control subentry object class
    pub const ACCESS_CONTROL_SUBENTRY: &str = "accessControlSubentry";

    /// Collective-attribute subentry object class
    pub const COLLECTIVE_ATTRIBUTE_SUBENTRY: &str = "collectiveAttributeSubentry";

    /// Subschema subentry object class
    pub const SUBSCHEMA: &str = "subschema";

    /// Trigger-execution subentry object class
    pub const TRIGGER_EXECUTION_SUBENTRY: &str = "triggerExecutionSubentry";
}

/// administrativeRole attribute values
pub mod role_value {
    /// Autonomous administrative area (expands to all four specific areas)
    pub const AUTONOMOUS_AREA: &str = "autonomousArea";

    /// Access-control specific area
    pub const ACCESS_CONTROL_SPECIFIC_AREA: &str = "accessControlSpecificArea";

    /// Access-control inner area
    pub const ACCESS_CONTROL_INNER_AREA: &str = "accessControlInnerArea";

    /// Collective-attribute specific area
    pub const COLLECTIVE_ATTRIBUTE_SPECIFIC_AREA: &str = "collectiveAttributeSpecificArea";

    /// Collective-attribute inner area
    pub const COLLECTIVE_ATTRIBUTE_INNER_AREA: &str = "collectiveAttributeInnerArea";

    /// Subschema admin specific area
    pub const SUBSCHEMA_ADMIN_SPECIFIC_AREA: &str = "subschemaAdminSpecificArea";

    /// Trigger-execution specific area
    pub const TRIGGER_EXECUTION_SPECIFIC_AREA: &str = "triggerExecutionSpecificArea";

    /// Trigger-execution inner area
    pub const TRIGGER_EXECUTION_INNER_AREA: &str = "triggerExecutionInnerArea";
}

/// Operational attributes maintained on selected entries
pub mod op_attr {
    /// Subentries governing an entry for access control
    pub const ACCESS_CONTROL_SUBENTRIES: &str = "accessControlSubentries";

    /// Subentries governing an entry for collective attributes
    pub const COLLECTIVE_ATTRIBUTE_SUBENTRIES: &str = "collectiveAttributeSubentries";

    /// Subentry governing an entry's subschema
    pub const SUBSCHEMA_SUBENTRY: &str = "subschemaSubentry";

    /// Subentries governing an entry for trigger execution
    pub const TRIGGER_EXECUTION_SUBENTRIES: &str = "triggerExecutionSubentries";
}

/// Per-administrative-point sequence-number attributes
pub mod seq_attr {
    /// Access-control membership version
    pub const ACCESS_CONTROL: &str = "accessControlSeqNumber";

    /// Collective-attribute membership version
    pub const COLLECTIVE_ATTRIBUTE: &str = "collectiveAttributeSeqNumber";

    /// Subschema membership version
    pub const SUBSCHEMA: &str = "subSchemaSeqNumber";

    /// Trigger-execution membership version
    pub const TRIGGER_EXECUTION: &str = "triggerExecutionSeqNumber";
}

/// Request controls
pub mod control {
    /// Subentries visibility control (RFC 3672)
    pub const SUBENTRIES_VISIBILITY: &str = "1.3.6.1.4.1.4203.1.10.1";
}
