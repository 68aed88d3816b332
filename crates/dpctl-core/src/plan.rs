// ── Batch operation planner ──
//
// Turns desired-state batches into an ordered list of discrete API
// operations without executing any of them. Planning is deterministic
// and side-effect-free given a registry snapshot; the only read the
// engine performs up front is the registry fetch itself (registry.rs).
//
// Ordering rules:
//   - creates: protections before the profiles that attach them, profile
//     attachments in caller order, policies last (they bind everything
//     else by name)
//   - deletes: policies first, then detachments, then protections, then
//     standalone profiles and class groups
// Within each list, caller order is preserved exactly.

use serde::Serialize;

use dpctl_api::paths;

use crate::model::{DeleteBatch, DeleteTarget, DesiredBatch, EntityKind, EntityRef};
use crate::registry::IndexRegistry;
use crate::translate::{self, ApiAttributes};

/// HTTP verb of a planned operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One concrete API call, fully resolved.
///
/// Never mutated after planning; execution attaches results elsewhere.
/// An operation whose planning failed (enum mismatch, unresolved name)
/// carries the error in `precondition_failure` and is recorded as failed
/// by the executor without any I/O -- emitting it keeps the entity
/// visible in the final report instead of silently vanishing.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedOperation {
    pub method: Method,
    pub path: String,
    pub body: Option<ApiAttributes>,
    pub entity: EntityRef,
    /// Position in the batch; refresh decisions key off this ordering.
    pub sequence_index: usize,
    pub description: String,
    /// Set when planning already failed for this entity.
    pub precondition_failure: Option<String>,
    /// Table to re-read before executing this operation (staleness
    /// workaround; see execute::refresh_table).
    pub refresh_before: Option<&'static str>,
}

impl ResolvedOperation {
    pub fn is_resolved(&self) -> bool {
        self.precondition_failure.is_none()
    }
}

// ── Plan builder ─────────────────────────────────────────────────────

struct PlanBuilder<'a> {
    device: &'a str,
    ops: Vec<ResolvedOperation>,
}

impl<'a> PlanBuilder<'a> {
    fn new(device: &'a str) -> Self {
        Self { device, ops: Vec::new() }
    }

    fn push(
        &mut self,
        method: Method,
        path: String,
        body: Option<ApiAttributes>,
        entity: EntityRef,
        description: String,
    ) {
        let sequence_index = self.ops.len();
        self.ops.push(ResolvedOperation {
            method,
            path,
            body,
            entity,
            sequence_index,
            description,
            precondition_failure: None,
            refresh_before: None,
        });
    }

    fn push_failed(
        &mut self,
        method: Method,
        entity: EntityRef,
        description: String,
        message: String,
    ) {
        let sequence_index = self.ops.len();
        self.ops.push(ResolvedOperation {
            method,
            path: String::new(),
            body: None,
            entity,
            sequence_index,
            description,
            precondition_failure: Some(message),
            refresh_before: None,
        });
    }

    fn config_path(&self, table: &str, segments: &[&str]) -> String {
        paths::config_path(self.device, table, segments)
    }
}

// ── Create / edit planning ───────────────────────────────────────────

/// Plan creation of everything in `batch`, in dependency order.
pub fn plan_create(device: &str, batch: &DesiredBatch) -> Vec<ResolvedOperation> {
    plan_upsert(device, batch, Method::Post)
}

/// Plan edits (PUT) for everything in `batch`.
///
/// Connection-limit protections are addressed by index; when a spec
/// omits its index, the name is resolved through `registry` and an
/// unresolvable name becomes a pre-failed operation.
pub fn plan_edit(
    device: &str,
    batch: &DesiredBatch,
    registry: Option<&IndexRegistry>,
) -> Vec<ResolvedOperation> {
    let mut plan = plan_upsert_protections(device, batch, Method::Put, registry);
    plan.ops
        .extend(plan_upsert_rest(device, batch, Method::Put, plan.ops.len()));
    plan.ops
}

fn plan_upsert(device: &str, batch: &DesiredBatch, method: Method) -> Vec<ResolvedOperation> {
    let mut plan = plan_upsert_protections(device, batch, method, None);
    plan.ops
        .extend(plan_upsert_rest(device, batch, method, plan.ops.len()));
    plan.ops
}

/// Protections come first in every upsert plan.
fn plan_upsert_protections<'a>(
    device: &'a str,
    batch: &DesiredBatch,
    method: Method,
    registry: Option<&IndexRegistry>,
) -> PlanBuilder<'a> {
    let mut plan = PlanBuilder::new(device);
    let spec = EntityKind::ClProtection.table_spec();

    for protection in &batch.cl_protections {
        let entity = EntityRef::new(EntityKind::ClProtection, &protection.name);

        let index = match (method, protection.index, registry) {
            // Creates default to index 0 (the controller assigns the real one).
            (Method::Post, index, _) => index.unwrap_or(0).to_string(),
            (_, Some(index), _) => index.to_string(),
            (_, None, Some(reg)) => match reg.resolve(&protection.name) {
                Some(index) => index.to_owned(),
                None => {
                    plan.push_failed(
                        method,
                        entity.clone(),
                        format!("Edit protection '{}' (NOT FOUND on device)", protection.name),
                        format!(
                            "cl_protection '{}' not found on device for index resolution",
                            protection.name
                        ),
                    );
                    continue;
                }
            },
            (_, None, None) => {
                plan.push_failed(
                    method,
                    entity.clone(),
                    format!("Edit protection '{}'", protection.name),
                    format!(
                        "cl_protection '{}' has no index and no registry was available",
                        protection.name
                    ),
                );
                continue;
            }
        };

        let mut body = match translate::translate(EntityKind::ClProtection, &protection.attributes)
        {
            Ok(body) => body,
            Err(e) => {
                plan.push_failed(
                    method,
                    entity.clone(),
                    format!("Translate attributes for protection '{}'", protection.name),
                    e.to_string(),
                );
                continue;
            }
        };
        body.shift_insert(0, spec.name_field.to_owned(), protection.name.clone());

        let verb = upsert_verb(method);
        plan.push(
            method,
            plan.config_path(spec.table, &[&index]),
            Some(body),
            entity,
            format!("{verb} protection '{}' at index {index}", protection.name),
        );
    }

    // Back-to-back writes to the attack table hit a controller-side read
    // cache; mark every operation after the first for a refresh.
    if method == Method::Post {
        for op in plan.ops.iter_mut().skip(1) {
            if op.is_resolved() {
                op.refresh_before = Some(spec.table);
            }
        }
    }

    plan
}

fn plan_upsert_rest(
    device: &str,
    batch: &DesiredBatch,
    method: Method,
    base_index: usize,
) -> Vec<ResolvedOperation> {
    let mut plan = PlanBuilder::new(device);
    let verb = upsert_verb(method);

    // Profile attachments, one operation per (profile, protection) pair,
    // strictly in caller order.
    let profile_spec = EntityKind::ClProfile.table_spec();
    for profile in &batch.cl_profiles {
        for protection in &profile.protections {
            let mut body = ApiAttributes::new();
            body.insert(profile_spec.name_field.to_owned(), profile.name.clone());
            body.insert(
                "rsIDSConnectionLimitProfileAttackName".to_owned(),
                protection.clone(),
            );
            plan.push(
                method,
                plan.config_path(profile_spec.table, &[&profile.name, protection]),
                Some(body),
                EntityRef::new(EntityKind::ClProfile, &profile.name),
                format!(
                    "{verb} profile '{}' attachment of protection '{protection}'",
                    profile.name
                ),
            );
        }
    }

    // Attribute-bodied profiles.
    for (kind, entries) in [
        (EntityKind::BdosProfile, &batch.bdos_profiles),
        (EntityKind::DnsProfile, &batch.dns_profiles),
    ] {
        let spec = kind.table_spec();
        for entry in entries {
            let entity = EntityRef::new(kind, &entry.name);
            match translate::translate(kind, &entry.attributes) {
                Ok(mut body) => {
                    body.shift_insert(0, spec.name_field.to_owned(), entry.name.clone());
                    plan.push(
                        method,
                        plan.config_path(spec.table, &[&entry.name]),
                        Some(body),
                        entity,
                        format!("{verb} {kind} '{}'", entry.name),
                    );
                }
                Err(e) => plan.push_failed(
                    method,
                    entity,
                    format!("Translate attributes for {kind} '{}'", entry.name),
                    e.to_string(),
                ),
            }
        }
    }

    // Network classes, one operation per group row.
    let class_spec = EntityKind::NetworkClass.table_spec();
    for class in &batch.network_classes {
        for (index, group) in class.groups.iter().enumerate() {
            let index = index.to_string();
            let mut body = ApiAttributes::new();
            body.insert(class_spec.name_field.to_owned(), class.name.clone());
            body.insert("rsBWMNetworkSubIndex".to_owned(), index.clone());
            body.insert("rsBWMNetworkAddress".to_owned(), group.address.clone());
            body.insert("rsBWMNetworkMask".to_owned(), group.mask.clone());
            body.insert("rsBWMNetworkMode".to_owned(), "1".to_owned());
            plan.push(
                method,
                plan.config_path(class_spec.table, &[&class.name, &index]),
                Some(body),
                EntityRef::new(EntityKind::NetworkClass, &class.name),
                format!(
                    "{verb} network class '{}' group {index} ({}/{})",
                    class.name, group.address, group.mask
                ),
            );
        }
    }

    // Policies last: they reference profiles and classes by name.
    let policy_spec = EntityKind::SecurityPolicy.table_spec();
    for policy in &batch.security_policies {
        let entity = EntityRef::new(EntityKind::SecurityPolicy, &policy.name);
        match translate::translate(EntityKind::SecurityPolicy, &policy.attributes) {
            Ok(body) => {
                // Empty binding values would clear profile slots on the
                // device; drop them instead of sending.
                let mut body: ApiAttributes =
                    body.into_iter().filter(|(_, v)| !v.trim().is_empty()).collect();
                body.shift_insert(0, policy_spec.name_field.to_owned(), policy.name.clone());
                plan.push(
                    method,
                    plan.config_path(policy_spec.table, &[&policy.name]),
                    Some(body),
                    entity,
                    format!("{verb} security policy '{}'", policy.name),
                );
            }
            Err(e) => plan.push_failed(
                method,
                entity,
                format!("Translate attributes for security policy '{}'", policy.name),
                e.to_string(),
            ),
        }
    }

    // Re-base sequence indices after the protection block.
    let mut ops = plan.ops;
    for op in &mut ops {
        op.sequence_index += base_index;
    }
    ops
}

fn upsert_verb(method: Method) -> &'static str {
    if method == Method::Put { "Edit" } else { "Create" }
}

// ── Delete planning ──────────────────────────────────────────────────

/// Plan deletion of everything in `batch`.
///
/// Name-based protection deletions resolve through `registry`; a name
/// the registry doesn't know becomes a pre-failed operation so the
/// report shows "not found" instead of dropping the entity. Raw indices
/// are validated against the registry only when `preview` is set --
/// execution mode attempts them regardless, tolerating registry
/// staleness.
pub fn plan_delete(
    device: &str,
    batch: &DeleteBatch,
    registry: Option<&IndexRegistry>,
    preview: bool,
) -> Vec<ResolvedOperation> {
    let mut plan = PlanBuilder::new(device);

    // Policies release their profile bindings first.
    let policy_spec = EntityKind::SecurityPolicy.table_spec();
    for name in &batch.security_policies {
        plan.push(
            Method::Delete,
            plan.config_path(policy_spec.table, &[name]),
            None,
            EntityRef::new(EntityKind::SecurityPolicy, name),
            format!("Delete security policy '{name}'"),
        );
    }

    // Detach protections from profiles (the profile disappears with its
    // last protection; the protections themselves survive).
    let profile_spec = EntityKind::ClProfile.table_spec();
    for detachment in &batch.cl_profile_detachments {
        for protection in &detachment.protections {
            plan.push(
                Method::Delete,
                plan.config_path(profile_spec.table, &[&detachment.profile_name, protection]),
                None,
                EntityRef::new(EntityKind::ClProfile, &detachment.profile_name),
                format!(
                    "Remove '{protection}' from profile '{}'",
                    detachment.profile_name
                ),
            );
        }
    }

    // Protections, by name (resolved) or by index (attempted).
    let attack_spec = EntityKind::ClProtection.table_spec();
    for target in &batch.cl_protections {
        match target {
            DeleteTarget::Name(name) => {
                let entity = EntityRef::new(EntityKind::ClProtection, name);
                match registry.and_then(|r| r.resolve(name)) {
                    Some(index) => {
                        let index = index.to_owned();
                        plan.push(
                            Method::Delete,
                            plan.config_path(attack_spec.table, &[&index]),
                            None,
                            entity,
                            format!("Delete protection '{name}' at index {index}"),
                        );
                    }
                    None => plan.push_failed(
                        Method::Delete,
                        entity,
                        format!("Delete protection '{name}' (NOT FOUND on device)"),
                        format!("cl_protection '{name}' not found on device"),
                    ),
                }
            }
            DeleteTarget::Index(index) => {
                let name = registry
                    .and_then(|r| r.name_for_index(*index))
                    .map_or_else(|| format!("index_{index}"), ToOwned::to_owned);
                let entity = EntityRef::new(EntityKind::ClProtection, &name);

                let known = registry.is_some_and(|r| r.contains_index(*index));
                if preview && registry.is_some() && !known {
                    plan.push_failed(
                        Method::Delete,
                        entity,
                        format!("Delete protection at index {index} (NOT FOUND on device)"),
                        format!("cl_protection index {index} not found on device"),
                    );
                } else {
                    let index = index.to_string();
                    plan.push(
                        Method::Delete,
                        plan.config_path(attack_spec.table, &[&index]),
                        None,
                        entity,
                        format!("Delete protection '{name}' at index {index}"),
                    );
                }
            }
        }
    }

    // Standalone profiles.
    for (kind, names) in [
        (EntityKind::BdosProfile, &batch.bdos_profiles),
        (EntityKind::DnsProfile, &batch.dns_profiles),
    ] {
        let spec = kind.table_spec();
        for name in names {
            plan.push(
                Method::Delete,
                plan.config_path(spec.table, &[name]),
                None,
                EntityRef::new(kind, name),
                format!("Delete {kind} '{name}'"),
            );
        }
    }

    // Network class group rows.
    let class_spec = EntityKind::NetworkClass.table_spec();
    for group in &batch.network_class_groups {
        let index = group.index.to_string();
        plan.push(
            Method::Delete,
            plan.config_path(class_spec.table, &[&group.name, &index]),
            None,
            EntityRef::new(EntityKind::NetworkClass, &group.name),
            format!("Delete network class '{}' group {index}", group.name),
        );
    }

    plan.ops
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::model::{AttrValue, NamedAttrs, NetworkClassSpec, NetworkGroup, ProfileSpec, ProtectionSpec};

    fn protection(name: &str) -> ProtectionSpec {
        ProtectionSpec {
            name: name.into(),
            index: None,
            attributes: [("protocol".to_owned(), AttrValue::from("tcp"))]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn create_preserves_input_order_and_numbers_sequence() {
        let batch = DesiredBatch {
            cl_protections: vec![protection("a"), protection("b"), protection("c")],
            ..DesiredBatch::default()
        };

        let ops = plan_create("10.1.1.1", &batch);
        assert_eq!(ops.len(), 3);
        let names: Vec<_> = ops.iter().map(|op| op.entity.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let seq: Vec<_> = ops.iter().map(|op| op.sequence_index).collect();
        assert_eq!(seq, vec![0, 1, 2]);
    }

    #[test]
    fn sibling_protection_creates_request_refresh() {
        let batch = DesiredBatch {
            cl_protections: vec![protection("a"), protection("b")],
            ..DesiredBatch::default()
        };

        let ops = plan_create("10.1.1.1", &batch);
        assert_eq!(ops[0].refresh_before, None);
        assert_eq!(ops[1].refresh_before, Some("rsIDSConnectionLimitAttackTable"));
    }

    #[test]
    fn profile_attachments_emit_one_op_per_pair_in_order() {
        let batch = DesiredBatch {
            cl_profiles: vec![ProfileSpec {
                name: "web".into(),
                protections: vec!["first".into(), "second".into()],
            }],
            ..DesiredBatch::default()
        };

        let ops = plan_create("10.1.1.1", &batch);
        assert_eq!(ops.len(), 2);
        assert!(ops[0].path.ends_with("/rsIDSConnectionLimitProfileTable/web/first"));
        assert!(ops[1].path.ends_with("/rsIDSConnectionLimitProfileTable/web/second"));
        let body = ops[0].body.as_ref().unwrap();
        assert_eq!(body["rsIDSConnectionLimitProfileName"], "web");
        assert_eq!(body["rsIDSConnectionLimitProfileAttackName"], "first");
    }

    #[test]
    fn invalid_enum_becomes_prefailed_op_not_a_planning_error() {
        let mut bad = protection("bad");
        bad.attributes
            .insert("action".into(), AttrValue::from("obliterate"));
        let batch = DesiredBatch {
            cl_protections: vec![bad, protection("good")],
            ..DesiredBatch::default()
        };

        let ops = plan_create("10.1.1.1", &batch);
        assert_eq!(ops.len(), 2);
        assert!(!ops[0].is_resolved());
        assert!(ops[0].precondition_failure.as_ref().unwrap().contains("obliterate"));
        assert!(ops[1].is_resolved());
    }

    #[test]
    fn network_class_groups_use_sub_indices() {
        let batch = DesiredBatch {
            network_classes: vec![NetworkClassSpec {
                name: "servers".into(),
                groups: vec![
                    NetworkGroup { address: "10.0.0.0".into(), mask: "255.255.255.0".into() },
                    NetworkGroup { address: "10.0.1.0".into(), mask: "255.255.255.0".into() },
                ],
            }],
            ..DesiredBatch::default()
        };

        let ops = plan_create("10.1.1.1", &batch);
        assert!(ops[0].path.ends_with("/rsBWMNetworkTable/servers/0"));
        assert!(ops[1].path.ends_with("/rsBWMNetworkTable/servers/1"));
        assert_eq!(ops[1].body.as_ref().unwrap()["rsBWMNetworkSubIndex"], "1");
        assert_eq!(ops[0].body.as_ref().unwrap()["rsBWMNetworkMode"], "1");
    }

    #[test]
    fn policies_plan_after_everything_else() {
        let batch = DesiredBatch {
            cl_protections: vec![protection("p")],
            security_policies: vec![NamedAttrs {
                name: "pol".into(),
                attributes: [
                    ("action".to_owned(), AttrValue::from("block")),
                    ("bdos_profile".to_owned(), AttrValue::from("")),
                ]
                .into_iter()
                .collect(),
            }],
            ..DesiredBatch::default()
        };

        let ops = plan_create("10.1.1.1", &batch);
        assert_eq!(ops.last().unwrap().entity.kind, EntityKind::SecurityPolicy);
        let body = ops.last().unwrap().body.as_ref().unwrap();
        // Empty bindings are dropped, not sent.
        assert!(!body.contains_key("rsIDSNewRulesProfileNetflood"));
        assert_eq!(body["rsIDSNewRulesAction"], "1");
        assert_eq!(body["rsIDSNewRulesName"], "pol");
    }

    #[test]
    fn delete_by_name_resolves_or_emits_placeholder() {
        let registry = IndexRegistry::from_entries(
            "rsIDSConnectionLimitAttackTable",
            [("known_name", "450001")],
        );
        let batch = DeleteBatch {
            cl_protections: vec![
                DeleteTarget::Name("known_name".into()),
                DeleteTarget::Name("ghost_name".into()),
            ],
            ..DeleteBatch::default()
        };

        let ops = plan_delete("10.1.1.1", &batch, Some(&registry), false);
        assert_eq!(ops.len(), 2);
        assert!(ops[0].path.ends_with("/rsIDSConnectionLimitAttackTable/450001"));
        assert!(!ops[1].is_resolved());
        assert!(ops[1].precondition_failure.as_ref().unwrap().contains("ghost_name"));
    }

    #[test]
    fn delete_by_index_validated_only_in_preview() {
        let registry =
            IndexRegistry::from_entries("rsIDSConnectionLimitAttackTable", [("p", "450001")]);
        let batch = DeleteBatch {
            cl_protections: vec![DeleteTarget::Index(999)],
            ..DeleteBatch::default()
        };

        let previewed = plan_delete("10.1.1.1", &batch, Some(&registry), true);
        assert!(!previewed[0].is_resolved());

        let executed = plan_delete("10.1.1.1", &batch, Some(&registry), false);
        assert!(executed[0].is_resolved());
        assert!(executed[0].path.ends_with("/999"));
    }

    #[test]
    fn edit_resolves_missing_protection_index_via_registry() {
        let registry =
            IndexRegistry::from_entries("rsIDSConnectionLimitAttackTable", [("p", "450007")]);
        let batch = DesiredBatch {
            cl_protections: vec![protection("p"), protection("absent")],
            ..DesiredBatch::default()
        };

        let ops = plan_edit("10.1.1.1", &batch, Some(&registry));
        assert_eq!(ops[0].method, Method::Put);
        assert!(ops[0].path.ends_with("/450007"));
        assert!(!ops[1].is_resolved());
    }

    #[test]
    fn planning_is_deterministic() {
        let batch = DesiredBatch {
            cl_protections: vec![protection("a"), protection("b")],
            ..DesiredBatch::default()
        };
        let a = plan_create("10.1.1.1", &batch);
        let b = plan_create("10.1.1.1", &batch);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.path, y.path);
            assert_eq!(x.body, y.body);
            assert_eq!(x.description, y.description);
        }
    }
}
