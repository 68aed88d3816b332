// Resource path construction for the CyberController REST API.
//
// The controller addresses per-device configuration tables positionally:
//   /mgmt/device/byip/{device}/config/{table}/{segment...}
// Segment order depends on the table (single name, name+index, or
// name+sub-name) and is the caller's responsibility -- this module only
// joins and escapes.

/// Fixed namespace prefix for per-device configuration resources.
pub const DEVICE_CONFIG_PREFIX: &str = "/mgmt/device/byip";

/// Login endpoint (controller-level, not device-scoped).
pub const LOGIN_PATH: &str = "/mgmt/system/user/login";

/// Build a device configuration table path.
///
/// ```
/// use dpctl_api::paths::config_path;
/// let p = config_path("10.1.1.1", "rsNetFloodProfileTable", &["MyProfile"]);
/// assert_eq!(p, "/mgmt/device/byip/10.1.1.1/config/rsNetFloodProfileTable/MyProfile");
/// ```
pub fn config_path(device: &str, table: &str, segments: &[&str]) -> String {
    let mut path = format!(
        "{DEVICE_CONFIG_PREFIX}/{}/config/{}",
        escape_segment(device),
        escape_segment(table)
    );
    for segment in segments {
        path.push('/');
        path.push_str(&escape_segment(segment));
    }
    path
}

/// Path for applying pending policy changes on a device.
pub fn update_policies_path(device: &str) -> String {
    format!("{DEVICE_CONFIG_PREFIX}/{}/config/updatepolicies", escape_segment(device))
}

/// Path for acquiring or releasing the device configuration lock.
pub fn device_lock_path(device: &str, lock: bool) -> String {
    let verb = if lock { "lock" } else { "unlock" };
    format!(
        "/mgmt/system/config/tree/device/byip/{}/{verb}",
        escape_segment(device)
    )
}

/// Percent-escape a single path segment.
///
/// Entity names on the controller are free-form, so anything that would
/// break path structure (separators, query markers, whitespace) is
/// encoded. Unreserved characters pass through untouched.
fn escape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b':' => {
                out.push(char::from(byte));
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_name_segment() {
        assert_eq!(
            config_path("10.1.1.1", "rsNetFloodProfileTable", &["MyProfile"]),
            "/mgmt/device/byip/10.1.1.1/config/rsNetFloodProfileTable/MyProfile"
        );
    }

    #[test]
    fn name_and_sub_name_segments_keep_order() {
        assert_eq!(
            config_path(
                "10.0.0.2",
                "rsIDSConnectionLimitProfileTable",
                &["web_profile", "http_limit"]
            ),
            "/mgmt/device/byip/10.0.0.2/config/rsIDSConnectionLimitProfileTable/web_profile/http_limit"
        );
    }

    #[test]
    fn bare_table_path_has_no_trailing_slash() {
        assert_eq!(
            config_path("10.1.1.1", "rsIDSConnectionLimitAttackTable", &[]),
            "/mgmt/device/byip/10.1.1.1/config/rsIDSConnectionLimitAttackTable"
        );
    }

    #[test]
    fn unsafe_characters_are_escaped() {
        assert_eq!(
            config_path("10.1.1.1", "rsBWMNetworkTable", &["web servers", "0"]),
            "/mgmt/device/byip/10.1.1.1/config/rsBWMNetworkTable/web%20servers/0"
        );
        assert!(config_path("10.1.1.1", "t", &["a/b"]).ends_with("/a%2Fb"));
    }

    #[test]
    fn update_and_lock_paths() {
        assert_eq!(
            update_policies_path("10.1.1.1"),
            "/mgmt/device/byip/10.1.1.1/config/updatepolicies"
        );
        assert_eq!(
            device_lock_path("10.1.1.1", true),
            "/mgmt/system/config/tree/device/byip/10.1.1.1/lock"
        );
        assert_eq!(
            device_lock_path("10.1.1.1", false),
            "/mgmt/system/config/tree/device/byip/10.1.1.1/unlock"
        );
    }
}
