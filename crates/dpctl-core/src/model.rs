// ── Desired-state model ──
//
// Typed descriptions of what the caller wants on the appliance. These are
// constructed once per invocation (usually from a YAML file) and stay
// immutable through planning. Cross-entity dependencies are explicit
// fields (a profile lists its protections in attachment order) rather
// than implied by list position.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ── Entity kinds ─────────────────────────────────────────────────────

/// The configuration object families the engine knows how to manage.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    /// Connection-limit protection (rate/concurrency attack entry).
    ClProtection,
    /// Connection-limit profile grouping protections.
    ClProfile,
    /// Behavioral DoS (network flood) profile.
    BdosProfile,
    /// DNS flood protection profile.
    DnsProfile,
    /// Security policy rule binding networks to profiles.
    SecurityPolicy,
    /// Network class (named set of address/mask groups).
    NetworkClass,
}

/// Where a kind lives on the wire: its table and the fields the registry
/// needs for name → index resolution.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub table: &'static str,
    pub name_field: &'static str,
    /// Present only for index-keyed tables.
    pub index_field: Option<&'static str>,
}

impl EntityKind {
    /// Wire-level table metadata for this kind.
    pub fn table_spec(self) -> TableSpec {
        match self {
            Self::ClProtection => TableSpec {
                table: "rsIDSConnectionLimitAttackTable",
                name_field: "rsIDSConnectionLimitAttackName",
                index_field: Some("rsIDSConnectionLimitAttackId"),
            },
            Self::ClProfile => TableSpec {
                table: "rsIDSConnectionLimitProfileTable",
                name_field: "rsIDSConnectionLimitProfileName",
                index_field: None,
            },
            Self::BdosProfile => TableSpec {
                table: "rsNetFloodProfileTable",
                name_field: "rsNetFloodProfileName",
                index_field: None,
            },
            Self::DnsProfile => TableSpec {
                table: "rsDnsProtProfileTable",
                name_field: "rsDnsProtProfileName",
                index_field: None,
            },
            Self::SecurityPolicy => TableSpec {
                table: "rsIDSNewRulesTable",
                name_field: "rsIDSNewRulesName",
                index_field: None,
            },
            Self::NetworkClass => TableSpec {
                table: "rsBWMNetworkTable",
                name_field: "rsBWMNetworkName",
                index_field: None,
            },
        }
    }
}

/// Back-reference from an operation to the entity that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub name: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into() }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

// ── Attribute values ─────────────────────────────────────────────────

/// A friendly attribute value as supplied by the caller.
///
/// YAML scalars arrive as strings, numbers, or booleans; the translator
/// stringifies them before enum matching, matching the controller's
/// everything-is-a-string field encoding.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

/// Friendly attribute map. Order-preserving so planned bodies serialize
/// in the order the caller wrote them.
pub type Attributes = IndexMap<String, AttrValue>;

// ── Desired entities ─────────────────────────────────────────────────

/// A connection-limit protection to create or edit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtectionSpec {
    pub name: String,
    /// Table index. Device-assigned on create when omitted (defaults to 0);
    /// required (or name-resolvable) for edits.
    pub index: Option<u32>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// A connection-limit profile and the protections it attaches, in order.
///
/// Attachment order is significant: the controller rejects attaching a
/// protection that does not exist yet, so callers list protections in
/// the same order they are created.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileSpec {
    pub name: String,
    #[serde(default)]
    pub protections: Vec<String>,
}

/// A named entity whose body is just translated attributes
/// (BDOS profiles, DNS profiles, security policies).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamedAttrs {
    pub name: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// One address/mask group inside a network class.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkGroup {
    pub address: String,
    pub mask: String,
}

/// A network class: a name plus its groups, created one group at a time
/// at sub-indices 0..n.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkClassSpec {
    pub name: String,
    pub groups: Vec<NetworkGroup>,
}

// ── Batches ──────────────────────────────────────────────────────────

/// Everything one create/edit invocation wants on a device.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DesiredBatch {
    #[serde(default)]
    pub cl_protections: Vec<ProtectionSpec>,
    #[serde(default)]
    pub cl_profiles: Vec<ProfileSpec>,
    #[serde(default)]
    pub bdos_profiles: Vec<NamedAttrs>,
    #[serde(default)]
    pub dns_profiles: Vec<NamedAttrs>,
    #[serde(default)]
    pub security_policies: Vec<NamedAttrs>,
    #[serde(default)]
    pub network_classes: Vec<NetworkClassSpec>,
}

impl DesiredBatch {
    pub fn is_empty(&self) -> bool {
        self.cl_protections.is_empty()
            && self.cl_profiles.is_empty()
            && self.bdos_profiles.is_empty()
            && self.dns_profiles.is_empty()
            && self.security_policies.is_empty()
            && self.network_classes.is_empty()
    }
}

/// A deletion target: either a live name (resolved against the registry)
/// or a raw table index (attempted as-is in execution mode).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DeleteTarget {
    Index(u32),
    Name(String),
}

/// Remove protections from a profile without deleting the protections.
/// The controller drops the profile itself when its last protection is
/// detached.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileDetachment {
    pub profile_name: String,
    pub protections: Vec<String>,
}

/// One group row of a network class.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupRef {
    pub name: String,
    pub index: u32,
}

/// Everything one delete invocation wants removed from a device.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeleteBatch {
    #[serde(default)]
    pub cl_protections: Vec<DeleteTarget>,
    #[serde(default)]
    pub cl_profile_detachments: Vec<ProfileDetachment>,
    #[serde(default)]
    pub bdos_profiles: Vec<String>,
    #[serde(default)]
    pub dns_profiles: Vec<String>,
    #[serde(default)]
    pub security_policies: Vec<String>,
    #[serde(default)]
    pub network_class_groups: Vec<GroupRef>,
}

impl DeleteBatch {
    pub fn is_empty(&self) -> bool {
        self.cl_protections.is_empty()
            && self.cl_profile_detachments.is_empty()
            && self.bdos_profiles.is_empty()
            && self.dns_profiles.is_empty()
            && self.security_policies.is_empty()
            && self.network_class_groups.is_empty()
    }

    /// Whether planning this batch needs the protection index registry.
    ///
    /// Names always need resolution; raw indices only need the registry
    /// for preview-mode validation.
    pub fn needs_registry(&self, preview: bool) -> bool {
        self.cl_protections.iter().any(|t| match t {
            DeleteTarget::Name(_) => true,
            DeleteTarget::Index(_) => preview,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn desired_batch_parses_from_yaml() {
        let yaml = r"
cl_protections:
  - name: limit_http
    protocol: tcp
    threshold: 100
cl_profiles:
  - name: web_profile
    protections: [limit_http]
network_classes:
  - name: web_servers
    groups:
      - address: 10.0.0.0
        mask: 255.255.255.0
";
        let batch: DesiredBatch = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(batch.cl_protections.len(), 1);
        assert_eq!(
            batch.cl_protections[0].attributes.get("protocol"),
            Some(&AttrValue::from("tcp"))
        );
        assert_eq!(
            batch.cl_protections[0].attributes.get("threshold"),
            Some(&AttrValue::Int(100))
        );
        assert_eq!(batch.cl_profiles[0].protections, vec!["limit_http"]);
        assert_eq!(batch.network_classes[0].groups.len(), 1);
        assert!(!batch.is_empty());
    }

    #[test]
    fn delete_targets_distinguish_names_from_indices() {
        let yaml = r#"
cl_protections: ["limit_http", 450001]
"#;
        let batch: DeleteBatch = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            batch.cl_protections,
            vec![
                DeleteTarget::Name("limit_http".into()),
                DeleteTarget::Index(450_001)
            ]
        );
        assert!(batch.needs_registry(false));
        assert!(DeleteBatch {
            cl_protections: vec![DeleteTarget::Index(1)],
            ..DeleteBatch::default()
        }
        .needs_registry(true));
    }
}
