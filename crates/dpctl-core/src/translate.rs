// ── Value translator ──
//
// Pure mapping from the friendly parameter vocabulary to the
// controller's field names and numeric enum codes. The tables are
// static data lifted from the vendor MIB names; translation logic is
// the only code here.
//
// Rules:
//   - a key present in the kind's table is renamed to its API field
//   - a key with an enumeration must match one entry (case-insensitive)
//     or translation of that entity fails with `InvalidEnumValue`
//   - keys absent from the table pass through unchanged, so fields the
//     tables don't know about yet can still be sent

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::{Attributes, EntityKind};

/// Translated, wire-ready attribute map. Values are strings because the
/// controller encodes every field as a string, including numerics.
pub type ApiAttributes = IndexMap<String, String>;

/// Friendly-to-API mapping for one entity kind.
pub struct FieldTable {
    fields: &'static [(&'static str, &'static str)],
    enums: &'static [(&'static str, &'static [(&'static str, &'static str)])],
}

impl FieldTable {
    fn api_field(&self, key: &str) -> Option<&'static str> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn enumeration(&self, key: &str) -> Option<&'static [(&'static str, &'static str)]> {
        self.enums.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

/// Translate a friendly attribute map for `kind`.
///
/// Pure and deterministic; input order is preserved in the output.
pub fn translate(kind: EntityKind, attrs: &Attributes) -> Result<ApiAttributes, CoreError> {
    let Some(table) = table_for(kind) else {
        // Kinds with fixed bodies (CL profiles, network classes) have no
        // translation table; everything passes through.
        return Ok(attrs.iter().map(|(k, v)| (k.clone(), v.to_string())).collect());
    };

    let mut out = ApiAttributes::with_capacity(attrs.len());
    for (key, value) in attrs {
        let value = value.to_string();

        let Some(api_key) = table.api_field(key) else {
            out.insert(key.clone(), value);
            continue;
        };

        let api_value = match table.enumeration(key) {
            Some(entries) => {
                let lowered = value.to_lowercase();
                entries
                    .iter()
                    .find(|(friendly, _)| *friendly == lowered)
                    .map(|(_, code)| (*code).to_owned())
                    .ok_or_else(|| CoreError::InvalidEnumValue {
                        kind,
                        key: key.clone(),
                        value: value.clone(),
                        allowed: entries
                            .iter()
                            .map(|(friendly, _)| *friendly)
                            .collect::<Vec<_>>()
                            .join(", "),
                    })?
            }
            None => value,
        };

        out.insert(api_key.to_owned(), api_value);
    }
    Ok(out)
}

/// The translation table for a kind, if one exists.
pub fn table_for(kind: EntityKind) -> Option<&'static FieldTable> {
    match kind {
        EntityKind::ClProtection => Some(&CL_PROTECTION),
        EntityKind::BdosProfile => Some(&BDOS_PROFILE),
        EntityKind::DnsProfile => Some(&DNS_PROFILE),
        EntityKind::SecurityPolicy => Some(&SECURITY_POLICY),
        EntityKind::ClProfile | EntityKind::NetworkClass => None,
    }
}

// ── Static tables ────────────────────────────────────────────────────

const ENABLE_DISABLE: &[(&str, &str)] = &[("enable", "1"), ("disable", "2")];

static CL_PROTECTION: FieldTable = FieldTable {
    fields: &[
        ("protocol", "rsIDSConnectionLimitAttackProtocol"),
        ("app_port_group", "rsIDSConnectionLimitAttackAppPort"),
        ("threshold", "rsIDSConnectionLimitAttackThreshold"),
        ("tracking_type", "rsIDSConnectionLimitAttackTrackingType"),
        ("action", "rsIDSConnectionLimitAttackReportMode"),
        ("packet_report", "rsIDSConnectionLimitAttackPacketReport"),
        ("protection_type", "rsIDSConnectionLimitAttackType"),
    ],
    enums: &[
        ("protocol", &[("tcp", "2"), ("udp", "3")]),
        (
            "tracking_type",
            &[
                ("src_ip", "2"),
                ("dst_ip", "3"),
                ("src_and_dest_ip", "4"),
                ("dst_ip_and_port", "5"),
            ],
        ),
        ("action", &[("report_only", "0"), ("drop", "10")]),
        ("packet_report", ENABLE_DISABLE),
        ("protection_type", &[("cps", "1"), ("concurrent_connections", "2")]),
    ],
};

static BDOS_PROFILE: FieldTable = FieldTable {
    fields: &[
        ("syn_flood", "rsNetFloodProfileTcpSynStatus"),
        ("udp_flood", "rsNetFloodProfileUdpStatus"),
        ("igmp_flood", "rsNetFloodProfileIgmpStatus"),
        ("icmp_flood", "rsNetFloodProfileIcmpStatus"),
        ("tcp_ack_fin_flood", "rsNetFloodProfileTcpFinAckStatus"),
        ("tcp_rst_flood", "rsNetFloodProfileTcpRstStatus"),
        ("tcp_psh_ack_flood", "rsNetFloodProfileTcpPshAckStatus"),
        ("tcp_syn_ack_flood", "rsNetFloodProfileTcpSynAckStatus"),
        ("tcp_frag_flood", "rsNetFloodProfileTcpFragStatus"),
        ("udp_frag_flood", "rsNetFloodProfileUdpFragStatus"),
        ("transparent_optimization", "rsNetFloodProfileTransparentOptimization"),
        ("action", "rsNetFloodProfileAction"),
        ("burst_attack", "rsNetFloodProfileBurstEnabled"),
        ("footprint_strictness", "rsNetFloodProfileFootprintStrictness"),
        ("bdos_rate_limit", "rsNetFloodProfileRateLimit"),
        ("packet_report", "rsNetFloodProfilePacketReportStatus"),
        // API-side spelling is the vendor's, verbatim.
        ("udp_packet_rate_detection_sensitivity", "rsNetFloodProfileLevelOfReuglarzation"),
        ("adv_udp_detection", "rsNetFloodProfileAdvUdpDetection"),
        ("inbound_traffic", "rsNetFloodProfileBandwidthIn"),
        ("outbound_traffic", "rsNetFloodProfileBandwidthOut"),
        ("tcp_in_quota", "rsNetFloodProfileTcpInQuota"),
        ("udp_in_quota", "rsNetFloodProfileUdpInQuota"),
        ("icmp_in_quota", "rsNetFloodProfileIcmpInQuota"),
        ("igmp_in_quota", "rsNetFloodProfileIgmpInQuota"),
        ("tcp_out_quota", "rsNetFloodProfileTcpOutQuota"),
        ("udp_out_quota", "rsNetFloodProfileUdpOutQuota"),
        ("icmp_out_quota", "rsNetFloodProfileIcmpOutQuota"),
        ("igmp_out_quota", "rsNetFloodProfileIgmpOutQuota"),
        ("maximum_interval_between_bursts", "rsNetFloodProfileNoBurstTimeout"),
        (
            "learning_suppression_threshold",
            "rsNetFloodProfileLearningSuppressionThreshold",
        ),
        ("user_defined_rate_limit", "rsNetFloodProfileUserDefinedRateLimit"),
        ("user_defined_rate_limit_unit", "rsNetFloodProfileUserDefinedRateLimitUnit"),
    ],
    enums: &[
        ("syn_flood", ENABLE_DISABLE),
        ("udp_flood", ENABLE_DISABLE),
        ("igmp_flood", ENABLE_DISABLE),
        ("icmp_flood", ENABLE_DISABLE),
        ("tcp_ack_fin_flood", ENABLE_DISABLE),
        ("tcp_rst_flood", ENABLE_DISABLE),
        ("tcp_psh_ack_flood", ENABLE_DISABLE),
        ("tcp_syn_ack_flood", ENABLE_DISABLE),
        ("tcp_frag_flood", ENABLE_DISABLE),
        ("udp_frag_flood", ENABLE_DISABLE),
        ("transparent_optimization", ENABLE_DISABLE),
        ("burst_attack", ENABLE_DISABLE),
        ("adv_udp_detection", ENABLE_DISABLE),
        ("packet_report", ENABLE_DISABLE),
        ("action", &[("report_only", "0"), ("block_and_report", "1")]),
        ("footprint_strictness", &[("low", "0"), ("medium", "1"), ("high", "2")]),
        (
            "bdos_rate_limit",
            &[
                ("disable", "0"),
                ("normal_edge", "1"),
                ("suspect_edge", "2"),
                ("user_defined", "3"),
            ],
        ),
        (
            "udp_packet_rate_detection_sensitivity",
            &[("ignore_or_disable", "1"), ("low", "2"), ("medium", "3"), ("high", "4")],
        ),
        (
            "user_defined_rate_limit_unit",
            &[("kbps", "0"), ("mbps", "1"), ("gbps", "2")],
        ),
    ],
};

static DNS_PROFILE: FieldTable = FieldTable {
    fields: &[
        ("action", "rsDnsProtProfileAction"),
        ("a_status", "rsDnsProtProfileDnsAStatus"),
        ("mx_status", "rsDnsProtProfileDnsMxStatus"),
        ("ptr_status", "rsDnsProtProfileDnsPtrStatus"),
        ("aaaa_status", "rsDnsProtProfileDnsAaaaStatus"),
        ("text_status", "rsDnsProtProfileDnsTextStatus"),
        ("soa_status", "rsDnsProtProfileDnsSoaStatus"),
        ("naptr_status", "rsDnsProtProfileDnsNaptrStatus"),
        ("srv_status", "rsDnsProtProfileDnsSrvStatus"),
        ("other_status", "rsDnsProtProfileDnsOtherStatus"),
        ("expected_qps", "rsDnsProtProfileExpectedQps"),
        ("max_allow_qps", "rsDnsProtProfileMaxAllowQps"),
        ("a_quota", "rsDnsProtProfileDnsAQuota"),
        ("mx_quota", "rsDnsProtProfileDnsMxQuota"),
        ("ptr_quota", "rsDnsProtProfileDnsPtrQuota"),
        ("aaaa_quota", "rsDnsProtProfileDnsAaaaQuota"),
        ("text_quota", "rsDnsProtProfileDnsTextQuota"),
        ("soa_quota", "rsDnsProtProfileDnsSoaQuota"),
        ("naptr_quota", "rsDnsProtProfileDnsNaptrQuota"),
        ("srv_quota", "rsDnsProtProfileDnsSrvQuota"),
        ("other_quota", "rsDnsProtProfileDnsOtherQuota"),
        ("footprint_strictness", "rsDnsProtProfileFootprintStrictness"),
        ("manual_trigger", "rsDnsProtProfileManualTriggerStatus"),
        ("manual_trigger_act_thresh", "rsDnsProtProfileManualTriggerActThresh"),
        ("manual_trigger_term_thresh", "rsDnsProtProfileManualTriggerTermThresh"),
        ("manual_trigger_max_qps_target", "rsDnsProtProfileManualTriggerMaxQpsTarget"),
        ("manual_trigger_act_period", "rsDnsProtProfileManualTriggerActPeriod"),
        ("manual_trigger_term_period", "rsDnsProtProfileManualTriggerTermPeriod"),
        ("manual_trigger_escalate_period", "rsDnsProtProfileManualTriggerEscalatePeriod"),
        ("packet_report", "rsDnsProtProfilePacketReportStatus"),
        ("sig_rate_lim_target", "rsDnsProtProfileSigRateLimTarget"),
        ("query_name_sensitivity", "rsDnsProtProfileQueryNameMonitoringSensitivity"),
        ("subdomains_allow_list", "rsDnsProtProfileSubdomainsWLLearningState"),
        (
            "learning_suppression_threshold",
            "rsDnsProtProfileLearningSuppressionThreshold",
        ),
    ],
    enums: &[
        ("action", &[("report_only", "0"), ("block_and_report", "1")]),
        ("a_status", ENABLE_DISABLE),
        ("mx_status", ENABLE_DISABLE),
        ("ptr_status", ENABLE_DISABLE),
        ("aaaa_status", ENABLE_DISABLE),
        ("text_status", ENABLE_DISABLE),
        ("soa_status", ENABLE_DISABLE),
        ("naptr_status", ENABLE_DISABLE),
        ("srv_status", ENABLE_DISABLE),
        ("other_status", ENABLE_DISABLE),
        ("manual_trigger", ENABLE_DISABLE),
        ("packet_report", ENABLE_DISABLE),
        ("subdomains_allow_list", ENABLE_DISABLE),
        ("footprint_strictness", &[("low", "0"), ("medium", "1"), ("high", "2")]),
    ],
};

static SECURITY_POLICY: FieldTable = FieldTable {
    fields: &[
        ("src_network", "rsIDSNewRulesSource"),
        ("dst_network", "rsIDSNewRulesDestination"),
        ("direction", "rsIDSNewRulesDirection"),
        ("state", "rsIDSNewRulesState"),
        ("action", "rsIDSNewRulesAction"),
        ("packet_reporting", "rsIDSNewRulesPacketReportingStatus"),
        ("priority", "rsIDSNewRulesPriority"),
        ("signature_protection_profile", "rsIDSNewRulesProfileAppsec"),
        ("connection_limit_profile", "rsIDSNewRulesProfileConlmt"),
        ("bdos_profile", "rsIDSNewRulesProfileNetflood"),
        ("syn_protection_profile", "rsIDSNewRulesProfileSynprotection"),
        ("dns_flood_profile", "rsIDSNewRulesProfileDNS"),
        ("https_flood_profile", "rsIDSNewRulesProfileHttpsflood"),
        ("ert_attackers_feed_profile", "rsIDSNewRulesProfileErtAttackersFeed"),
        ("traffic_filters_profile", "rsIDSNewRulesProfileTrafficFilters"),
        ("geo_feed_profile", "rsIDSNewRulesProfileGeoFeed"),
        ("out_of_state_profile", "rsIDSNewRulesProfileStateful"),
    ],
    enums: &[
        (
            "direction",
            &[
                ("oneway", "1"),
                ("one_way", "1"),
                ("twoway", "2"),
                ("two_way", "2"),
                ("bidirectional", "2"),
                ("both", "2"),
            ],
        ),
        (
            "state",
            &[
                ("enable", "1"),
                ("enabled", "1"),
                ("active", "1"),
                ("on", "1"),
                ("disable", "2"),
                ("disabled", "2"),
                ("inactive", "2"),
                ("off", "2"),
            ],
        ),
        (
            "action",
            &[
                ("report_only", "0"),
                ("report", "0"),
                ("block", "1"),
                ("deny", "1"),
                ("drop", "1"),
                ("protect", "1"),
            ],
        ),
        (
            "packet_reporting",
            &[
                ("enable", "1"),
                ("enabled", "1"),
                ("on", "1"),
                ("disable", "2"),
                ("disabled", "2"),
                ("off", "2"),
            ],
        ),
    ],
};

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::model::AttrValue;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), AttrValue::from(*v)))
            .collect()
    }

    #[test]
    fn known_keys_map_to_api_fields_and_codes() {
        let out = translate(
            EntityKind::ClProtection,
            &attrs(&[("protocol", "tcp"), ("action", "drop"), ("threshold", "50")]),
        )
        .unwrap();

        assert_eq!(out["rsIDSConnectionLimitAttackProtocol"], "2");
        assert_eq!(out["rsIDSConnectionLimitAttackReportMode"], "10");
        assert_eq!(out["rsIDSConnectionLimitAttackThreshold"], "50");
    }

    #[test]
    fn enum_matching_is_case_insensitive() {
        let out = translate(EntityKind::BdosProfile, &attrs(&[("syn_flood", "Enable")])).unwrap();
        assert_eq!(out["rsNetFloodProfileTcpSynStatus"], "1");
    }

    #[test]
    fn unknown_keys_pass_through_unchanged() {
        let out = translate(
            EntityKind::BdosProfile,
            &attrs(&[("rsNetFloodProfileSomeNewKnob", "7")]),
        )
        .unwrap();
        assert_eq!(out["rsNetFloodProfileSomeNewKnob"], "7");
    }

    #[test]
    fn invalid_enum_value_lists_allowed_entries() {
        let err = translate(
            EntityKind::ClProtection,
            &attrs(&[("tracking_type", "per_socket")]),
        )
        .unwrap_err();

        match err {
            CoreError::InvalidEnumValue { key, value, allowed, .. } => {
                assert_eq!(key, "tracking_type");
                assert_eq!(value, "per_socket");
                assert!(allowed.contains("src_ip"));
                assert!(allowed.contains("dst_ip_and_port"));
            }
            other => panic!("expected InvalidEnumValue, got {other:?}"),
        }
    }

    #[test]
    fn numeric_and_boolean_values_are_stringified() {
        let mut input = Attributes::new();
        input.insert("priority".into(), AttrValue::Int(100));
        let out = translate(EntityKind::SecurityPolicy, &input).unwrap();
        assert_eq!(out["rsIDSNewRulesPriority"], "100");
    }

    #[test]
    fn translation_is_deterministic_and_order_preserving() {
        let input = attrs(&[("action", "block"), ("src_network", "web_servers")]);
        let a = translate(EntityKind::SecurityPolicy, &input).unwrap();
        let b = translate(EntityKind::SecurityPolicy, &input).unwrap();
        assert_eq!(a, b);
        let keys: Vec<_> = a.keys().collect();
        assert_eq!(keys, vec!["rsIDSNewRulesAction", "rsIDSNewRulesSource"]);
    }

    #[test]
    fn kinds_without_tables_pass_everything_through() {
        let out = translate(EntityKind::NetworkClass, &attrs(&[("address", "10.0.0.0")])).unwrap();
        assert_eq!(out["address"], "10.0.0.0");
    }

    #[test]
    fn policy_direction_synonyms_collapse() {
        for v in ["twoway", "two_way", "bidirectional", "both"] {
            let out = translate(EntityKind::SecurityPolicy, &attrs(&[("direction", v)])).unwrap();
            assert_eq!(out["rsIDSNewRulesDirection"], "2", "synonym {v}");
        }
    }
}
